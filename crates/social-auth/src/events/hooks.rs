//! Hook traits for social login events.
//!
//! Hooks let other modules observe account creation and logins, and adjust
//! the field set of a new account before it is saved.

use async_trait::async_trait;

use super::types::{SocialAuthEventType, UserEvent, UserFieldsEvent};

/// Error type for hook operations.
#[derive(Debug, thiserror::Error)]
pub enum HookError {
    /// Hook execution failed with a message.
    #[error("Hook execution failed: {0}")]
    Execution(String),

    /// Hook failed due to a storage error.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl HookError {
    /// Create an execution error from a string.
    pub fn execution(msg: impl Into<String>) -> Self {
        HookError::Execution(msg.into())
    }

    /// Create a storage error from a string.
    pub fn storage(msg: impl Into<String>) -> Self {
        HookError::Storage(msg.into())
    }
}

/// Observer for social login events.
///
/// Every method has a no-op default, so a hook only implements the events it
/// cares about.
///
/// # Example
///
/// ```ignore
/// struct DefaultRoleHook;
///
/// #[async_trait]
/// impl SocialAuthHook for DefaultRoleHook {
///     fn name(&self) -> &str { "default_role" }
///
///     async fn on_user_fields(&self, event: &mut UserFieldsEvent) -> Result<(), HookError> {
///         event.fields_mut().roles.push("member".to_string());
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait SocialAuthHook: Send + Sync {
    /// Unique name for this hook (for logging).
    fn name(&self) -> &str;

    /// Event types this hook handles.
    ///
    /// Return an empty slice to match all event types.
    fn event_types(&self) -> &[SocialAuthEventType] {
        &[]
    }

    /// Adjust the field set of an account about to be created.
    async fn on_user_fields(&self, _event: &mut UserFieldsEvent) -> Result<(), HookError> {
        Ok(())
    }

    /// React to a newly created account.
    async fn on_user_created(&self, _event: &UserEvent) -> Result<(), HookError> {
        Ok(())
    }

    /// React to a successful login.
    async fn on_user_login(&self, _event: &UserEvent) -> Result<(), HookError> {
        Ok(())
    }

    /// Check if this hook should receive the given event type.
    fn matches(&self, event_type: SocialAuthEventType) -> bool {
        let types = self.event_types();
        types.is_empty() || types.contains(&event_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct LoginOnlyHook;

    #[async_trait]
    impl SocialAuthHook for LoginOnlyHook {
        fn name(&self) -> &str {
            "login_only"
        }

        fn event_types(&self) -> &[SocialAuthEventType] {
            &[SocialAuthEventType::UserLogin]
        }
    }

    struct AllEventsHook;

    #[async_trait]
    impl SocialAuthHook for AllEventsHook {
        fn name(&self) -> &str {
            "all"
        }
    }

    #[test]
    fn test_hook_matches_filter() {
        let hook = LoginOnlyHook;
        assert!(hook.matches(SocialAuthEventType::UserLogin));
        assert!(!hook.matches(SocialAuthEventType::UserCreated));
        assert!(!hook.matches(SocialAuthEventType::UserFields));
    }

    #[test]
    fn test_hook_matches_all_by_default() {
        let hook = AllEventsHook;
        assert!(hook.matches(SocialAuthEventType::UserLogin));
        assert!(hook.matches(SocialAuthEventType::UserCreated));
        assert!(hook.matches(SocialAuthEventType::UserFields));
    }

    #[test]
    fn test_hook_error_display() {
        assert_eq!(
            HookError::execution("boom").to_string(),
            "Hook execution failed: boom"
        );
        assert_eq!(HookError::storage("down").to_string(), "Storage error: down");
    }
}
