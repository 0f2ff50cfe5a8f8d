use std::{env, fs};

use social_auth::{RegistrationPolicy, UserAllowed};
use social_auth_server::config::loader::load_config;

#[test]
fn config_parsing_and_env_overrides_and_validation() {
    let dir = tempfile::tempdir().expect("tmp dir");
    let path = dir.path().join("social-auth.toml");

    let toml_content = r#"
[server]
host = "127.0.0.1"
port = 8081

[logging]
level = "debug"

[site.user]
register = "visitors_admin_approval"

[site.social_auth]
user_allowed = "register"
disabled_roles = ["editor"]
post_login = "<front>"
redirect_user_form = true

[site.picture]
file_directory = "pictures/[plugin:id]"
download_timeout = "5s"
max_size = 1048576

[session]
cookie_name = "SESS"
keys_to_nullify = ["access_token"]

[bootstrap.admin_user]
username = "admin"
email = "admin@example.com"
"#;
    fs::write(&path, toml_content).expect("write toml");

    // 1) Valid config parses
    let cfg = load_config(path.to_str()).expect("should parse config");
    assert_eq!(cfg.server.port, 8081);
    assert_eq!(cfg.logging.level, "debug");
    assert_eq!(
        cfg.site.user.register,
        RegistrationPolicy::VisitorsAdminApproval
    );
    assert_eq!(cfg.site.social_auth.disabled_roles, vec!["editor"]);
    assert_eq!(cfg.site.social_auth.post_login, "<front>");
    assert!(cfg.site.social_auth.redirect_user_form);
    assert_eq!(
        cfg.site.picture.download_timeout,
        std::time::Duration::from_secs(5)
    );
    assert_eq!(cfg.site.picture.max_size, 1_048_576);
    assert_eq!(cfg.session.cookie_name, "SESS");
    assert_eq!(
        cfg.bootstrap.admin_user.as_ref().map(|a| a.username.as_str()),
        Some("admin")
    );

    // 2) Env override should win over file
    unsafe {
        env::set_var("SOCIAL_AUTH__SITE__SOCIAL_AUTH__USER_ALLOWED", "login");
    }
    let cfg_env = load_config(path.to_str()).expect("should parse config with env overrides");
    assert_eq!(cfg_env.site.social_auth.user_allowed, UserAllowed::Login);
    assert!(cfg_env.site.is_registration_disabled());
    unsafe {
        env::remove_var("SOCIAL_AUTH__SITE__SOCIAL_AUTH__USER_ALLOWED");
    }

    // 3) Invalid config should error
    let invalid_path = dir.path().join("invalid.toml");
    let invalid_toml = r#"
[logging]
level = "loud"
"#;
    fs::write(&invalid_path, invalid_toml).expect("write invalid toml");
    let err = load_config(invalid_path.to_str()).expect_err("expected validation error");
    assert!(err.contains("logging.level"));

    let bad_site_path = dir.path().join("bad-site.toml");
    let bad_site_toml = r#"
[site.picture]
enabled = true
file_directory = ""
"#;
    fs::write(&bad_site_path, bad_site_toml).expect("write bad site toml");
    let err = load_config(bad_site_path.to_str()).expect_err("expected site validation error");
    assert!(err.contains("picture.file_directory"));
}

#[test]
fn missing_file_uses_defaults() {
    let dir = tempfile::tempdir().expect("tmp dir");
    let path = dir.path().join("absent.toml");

    let cfg = load_config(path.to_str()).expect("defaults should validate");
    assert_eq!(cfg.server.port, 8080);
    assert_eq!(cfg.site.social_auth.post_login, "user.page");
    assert!(cfg.bootstrap.admin_user.is_none());
}
