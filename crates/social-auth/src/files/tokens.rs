//! Token replacement for directory templates.
//!
//! Picture directories are configured as templates such as
//! `pictures/[date:custom:Y]-[date:custom:m]`. Recognised tokens are replaced
//! and unknown tokens are left untouched.

use time::OffsetDateTime;

/// Values tokens are resolved from.
#[derive(Debug, Clone)]
pub struct TokenContext {
    /// The provider integration handling the login.
    pub plugin_id: String,
    /// The account the file belongs to.
    pub user_id: Option<String>,
    /// The account name.
    pub user_name: Option<String>,
    /// Reference time for date tokens.
    pub now: OffsetDateTime,
}

impl TokenContext {
    /// Creates a context for `plugin_id` at the current time.
    pub fn new(plugin_id: impl Into<String>) -> Self {
        Self {
            plugin_id: plugin_id.into(),
            user_id: None,
            user_name: None,
            now: OffsetDateTime::now_utc(),
        }
    }

    /// Sets the account the file belongs to.
    #[must_use]
    pub fn with_user(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.user_id = Some(id.into());
        self.user_name = Some(name.into());
        self
    }

    /// Sets the reference time.
    #[must_use]
    pub fn with_now(mut self, now: OffsetDateTime) -> Self {
        self.now = now;
        self
    }
}

/// Replaces `[type:name]` tokens in text.
pub trait TokenReplacer: Send + Sync {
    /// Return `text` with every recognised token replaced.
    fn replace(&self, text: &str, context: &TokenContext) -> String;
}

/// Replacer for date, user and plugin tokens.
///
/// Supported tokens:
/// - `[date:custom:F]` where `F` is one of `Y`, `y`, `m`, `n`, `d`, `j`
/// - `[user:uid]`, `[user:name]`
/// - `[plugin:id]`
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTokenReplacer;

impl DefaultTokenReplacer {
    fn resolve(&self, token: &str, context: &TokenContext) -> Option<String> {
        let now = context.now;
        match token {
            "date:custom:Y" => Some(format!("{:04}", now.year())),
            "date:custom:y" => Some(format!("{:02}", now.year().rem_euclid(100))),
            "date:custom:m" => Some(format!("{:02}", u8::from(now.month()))),
            "date:custom:n" => Some(u8::from(now.month()).to_string()),
            "date:custom:d" => Some(format!("{:02}", now.day())),
            "date:custom:j" => Some(now.day().to_string()),
            "user:uid" => context.user_id.clone(),
            "user:name" => context.user_name.clone(),
            "plugin:id" => Some(context.plugin_id.clone()),
            _ => None,
        }
    }
}

impl TokenReplacer for DefaultTokenReplacer {
    fn replace(&self, text: &str, context: &TokenContext) -> String {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;

        while let Some(start) = rest.find('[') {
            out.push_str(&rest[..start]);
            let after = &rest[start + 1..];
            match after.find(']') {
                Some(end) => {
                    let token = &after[..end];
                    match self.resolve(token, context) {
                        Some(value) => out.push_str(&value),
                        None => {
                            out.push('[');
                            out.push_str(token);
                            out.push(']');
                        }
                    }
                    rest = &after[end + 1..];
                }
                None => {
                    out.push_str(&rest[start..]);
                    rest = "";
                }
            }
        }

        out.push_str(rest);
        out
    }
}
