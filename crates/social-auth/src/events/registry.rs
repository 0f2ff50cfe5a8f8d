//! Hook registry for social login events.
//!
//! Hooks run in registration order on the caller's task, and each one is
//! awaited before the next starts. A failing or slow hook is logged and
//! skipped; it never aborts the login.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::hooks::{HookError, SocialAuthHook};
use super::types::{SocialAuthEventType, UserEvent, UserFieldsEvent};

/// Default timeout for hook execution.
const DEFAULT_HOOK_TIMEOUT: Duration = Duration::from_secs(5);

/// Registry of social login hooks.
pub struct HookRegistry {
    hooks: RwLock<Vec<Arc<dyn SocialAuthHook>>>,
    timeout: Duration,
}

impl HookRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_HOOK_TIMEOUT)
    }

    /// Create a new registry with custom timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            hooks: RwLock::new(Vec::new()),
            timeout,
        }
    }

    /// Register a hook.
    pub async fn register(&self, hook: Arc<dyn SocialAuthHook>) {
        let name = hook.name().to_string();
        self.hooks.write().await.push(hook);
        debug!(hook = %name, "Registered social auth hook");
    }

    /// Get the number of registered hooks.
    pub async fn hook_count(&self) -> usize {
        self.hooks.read().await.len()
    }

    async fn matching(&self, event_type: SocialAuthEventType) -> Vec<Arc<dyn SocialAuthHook>> {
        let hooks = self.hooks.read().await;
        hooks
            .iter()
            .filter(|h| h.matches(event_type))
            .cloned()
            .collect()
    }

    /// Let hooks adjust the field set of a new account.
    ///
    /// Each hook works on a copy of the event. The copy replaces the event
    /// only when the hook succeeds in time, so a failing or timed-out hook
    /// leaves no partial changes behind. Accepted changes are visible to the
    /// hooks after it and to the caller once this returns.
    pub async fn dispatch_user_fields(&self, event: &mut UserFieldsEvent) {
        for hook in self.matching(SocialAuthEventType::UserFields).await {
            let mut draft = event.clone();
            let result = tokio::time::timeout(self.timeout, hook.on_user_fields(&mut draft)).await;
            if matches!(result, Ok(Ok(()))) {
                *event = draft;
            }
            self.report(hook.name(), SocialAuthEventType::UserFields, result);
        }
    }

    /// Notify hooks that an account was created.
    pub async fn dispatch_user_created(&self, event: &UserEvent) {
        for hook in self.matching(SocialAuthEventType::UserCreated).await {
            let result = tokio::time::timeout(self.timeout, hook.on_user_created(event)).await;
            self.report(hook.name(), SocialAuthEventType::UserCreated, result);
        }
    }

    /// Notify hooks that an account logged in.
    pub async fn dispatch_user_login(&self, event: &UserEvent) {
        for hook in self.matching(SocialAuthEventType::UserLogin).await {
            let result = tokio::time::timeout(self.timeout, hook.on_user_login(event)).await;
            self.report(hook.name(), SocialAuthEventType::UserLogin, result);
        }
    }

    fn report(
        &self,
        hook: &str,
        event_type: SocialAuthEventType,
        result: Result<Result<(), HookError>, tokio::time::error::Elapsed>,
    ) {
        match result {
            Ok(Ok(())) => {
                debug!(hook = %hook, event = %event_type, "Hook executed successfully");
            }
            Ok(Err(e)) => {
                warn!(hook = %hook, event = %event_type, error = %e, "Hook execution failed");
            }
            Err(_) => {
                warn!(
                    hook = %hook,
                    event = %event_type,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Hook execution timed out"
                );
            }
        }
    }
}

impl Default for HookRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookRegistry")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
