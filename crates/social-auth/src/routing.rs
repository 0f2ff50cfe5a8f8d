//! Redirect targets and route resolution.
//!
//! The provisioning flow returns [`RedirectTarget`]s naming either a route
//! or a plain path. A [`RouteResolver`] turns route names into URL paths.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Route of the login page.
pub const ROUTE_USER_LOGIN: &str = "user.login";

/// Route of the account edit form; takes the `user` parameter.
pub const ROUTE_USER_EDIT_FORM: &str = "entity.user.edit_form";

/// Route of the account page.
pub const ROUTE_USER_PAGE: &str = "user.page";

/// Resolves route names to URL paths.
pub trait RouteResolver: Send + Sync {
    /// Resolve `name` with `params`, or `None` when the route is unknown or a
    /// parameter is missing.
    fn resolve(&self, name: &str, params: &[(String, String)]) -> Option<String>;

    /// Whether a route with this name exists.
    fn has_route(&self, name: &str) -> bool;
}

/// Where to send the browser after authentication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "target", rename_all = "snake_case")]
pub enum RedirectTarget {
    /// A named route with parameters.
    Route {
        /// Route name.
        name: String,
        /// Route parameters.
        #[serde(default)]
        params: Vec<(String, String)>,
    },
    /// A site-relative path.
    Path(String),
}

impl RedirectTarget {
    /// A route without parameters.
    pub fn route(name: impl Into<String>) -> Self {
        Self::Route {
            name: name.into(),
            params: Vec::new(),
        }
    }

    /// A route with parameters.
    pub fn route_with(name: impl Into<String>, params: Vec<(String, String)>) -> Self {
        Self::Route {
            name: name.into(),
            params,
        }
    }

    /// The login page.
    #[must_use]
    pub fn login() -> Self {
        Self::route(ROUTE_USER_LOGIN)
    }

    /// The edit form of account `user_id`.
    pub fn user_edit_form(user_id: impl Into<String>) -> Self {
        Self::route_with(
            ROUTE_USER_EDIT_FORM,
            vec![("user".to_string(), user_id.into())],
        )
    }

    /// A site-relative path; a leading `/` is added when missing.
    pub fn path(path: impl Into<String>) -> Self {
        Self::Path(normalize_path(path.into()))
    }

    /// Returns `true` for the login page.
    #[must_use]
    pub fn is_login(&self) -> bool {
        matches!(self, Self::Route { name, .. } if name == ROUTE_USER_LOGIN)
    }

    /// Resolves to a URL path. Unknown routes resolve to `/`.
    pub fn to_path(&self, resolver: &dyn RouteResolver) -> String {
        match self {
            Self::Route { name, params } => resolver.resolve(name, params).unwrap_or_else(|| {
                tracing::warn!(route = %name, "Unknown route in redirect target");
                "/".to_string()
            }),
            Self::Path(path) => path.clone(),
        }
    }
}

fn normalize_path(path: String) -> String {
    if path.starts_with('/') {
        path
    } else {
        format!("/{path}")
    }
}

/// Route table mapping names to path templates such as `/user/{user}/edit`.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: HashMap<String, String>,
}

impl RouteTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a table with the account routes.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new()
            .with_route(ROUTE_USER_LOGIN, "/user/login")
            .with_route(ROUTE_USER_PAGE, "/user")
            .with_route(ROUTE_USER_EDIT_FORM, "/user/{user}/edit")
            .with_route("user.register", "/user/register")
            .with_route("<front>", "/")
    }

    /// Adds or replaces a route.
    #[must_use]
    pub fn with_route(mut self, name: impl Into<String>, template: impl Into<String>) -> Self {
        self.routes.insert(name.into(), template.into());
        self
    }
}

impl RouteResolver for RouteTable {
    fn resolve(&self, name: &str, params: &[(String, String)]) -> Option<String> {
        let template = self.routes.get(name)?;
        let mut out = String::with_capacity(template.len());
        let mut rest = template.as_str();

        while let Some(start) = rest.find('{') {
            out.push_str(&rest[..start]);
            let after = &rest[start + 1..];
            let end = after.find('}')?;
            let key = &after[..end];
            let value = params.iter().find(|(k, _)| k == key).map(|(_, v)| v)?;
            out.push_str(value);
            rest = &after[end + 1..];
        }

        out.push_str(rest);
        Some(out)
    }

    fn has_route(&self, name: &str) -> bool {
        self.routes.contains_key(name)
    }
}
