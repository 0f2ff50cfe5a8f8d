use std::net::SocketAddr;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use social_auth::SocialAuthConfig;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Registration, login and picture settings handed to the provisioning
    /// service.
    #[serde(default)]
    pub site: SocialAuthConfig,
    #[serde(default)]
    pub files: FilesConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub bootstrap: BootstrapConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.server.port == 0 {
            return Err("server.port must be > 0".into());
        }
        if self.server.body_limit_bytes == 0 {
            return Err("server.body_limit_bytes must be > 0".into());
        }
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(format!("logging.level must be one of {valid_levels:?}"));
        }
        if self.session.cookie_name.trim().is_empty() {
            return Err("session.cookie_name must not be empty".into());
        }
        if let Some(admin) = &self.bootstrap.admin_user
            && admin.username.trim().is_empty()
        {
            return Err("bootstrap.admin_user.username must not be empty".into());
        }
        self.site.validate().map_err(|e| format!("site: {e}"))?;
        Ok(())
    }

    pub fn addr(&self) -> SocketAddr {
        use std::net::{IpAddr, Ipv4Addr};
        let host: IpAddr = self
            .server
            .host
            .parse()
            .unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));
        SocketAddr::from((host, self.server.port))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            body_limit_bytes: default_body_limit(),
        }
    }
}

fn default_body_limit() -> usize {
    64 * 1024
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Where managed files are written.
///
/// A file uri `scheme://dir/name` is stored at `{root}/{scheme}/dir/name`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilesConfig {
    pub root: PathBuf,
    /// Schemes served from `root`.
    pub schemes: Vec<String>,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("files"),
            schemes: vec!["public".to_string(), "private".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Name of the cookie carrying the session id.
    pub cookie_name: String,
    /// Mark the cookie `Secure`. Enable behind TLS.
    pub secure_cookie: bool,
    /// Provider session keys cleared when a login attempt is refused.
    pub keys_to_nullify: Vec<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "social_auth_session".to_string(),
            secure_cookie: false,
            keys_to_nullify: vec!["access_token".to_string(), "oauth2state".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BootstrapConfig {
    /// Super-admin account (id `1`) created at startup.
    #[serde(default)]
    pub admin_user: Option<AdminUserConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminUserConfig {
    pub username: String,
    /// Plain-text password, hashed before storing.
    /// Prefer SOCIAL_AUTH__BOOTSTRAP__ADMIN_USER__PASSWORD over the file.
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

pub mod loader {
    use super::AppConfig;
    use config::{Config, Environment, File};
    use std::path::PathBuf;

    /// Default configuration file, read when no path is given.
    pub const DEFAULT_CONFIG_PATH: &str = "social-auth.toml";

    pub fn load_config(path: Option<&str>) -> Result<AppConfig, String> {
        let mut builder = Config::builder();
        let pathbuf = PathBuf::from(path.unwrap_or(DEFAULT_CONFIG_PATH));
        if pathbuf.exists() {
            builder = builder.add_source(File::from(pathbuf));
        }
        // Environment variable overrides, e.g., SOCIAL_AUTH__SERVER__PORT=9090
        builder = builder.add_source(
            Environment::with_prefix("SOCIAL_AUTH")
                .try_parsing(true)
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("session.keys_to_nullify")
                .with_list_parse_key("site.social_auth.disabled_roles")
                .with_list_parse_key("files.schemes"),
        );
        let cfg = builder
            .build()
            .map_err(|e| format!("config build error: {e}"))?;
        let merged: AppConfig = cfg
            .try_deserialize()
            .map_err(|e| format!("config deserialize error: {e}"))?;
        merged.validate()?;
        Ok(merged)
    }
}
