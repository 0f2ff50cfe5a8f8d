//! In-memory browser sessions.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use social_auth::AuthResult;
use social_auth::storage::SessionStore;

/// Values of one browser session.
#[derive(Debug, Default)]
pub struct InMemorySession {
    values: DashMap<String, serde_json::Value>,
}

impl InMemorySession {
    /// Creates an empty session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes and returns a value.
    pub fn take(&self, key: &str) -> Option<serde_json::Value> {
        self.values.remove(key).map(|(_, v)| v)
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if the session holds no values.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[async_trait]
impl SessionStore for InMemorySession {
    async fn get(&self, key: &str) -> AuthResult<Option<serde_json::Value>> {
        Ok(self.values.get(key).map(|v| v.clone()))
    }

    async fn set(&self, key: &str, value: Option<serde_json::Value>) -> AuthResult<()> {
        match value {
            Some(v) => {
                self.values.insert(key.to_string(), v);
            }
            None => {
                self.values.remove(key);
            }
        }
        Ok(())
    }
}

/// Sessions keyed by an opaque session id.
#[derive(Debug, Default)]
pub struct InMemorySessionRegistry {
    sessions: DashMap<String, Arc<InMemorySession>>,
}

impl InMemorySessionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new session and returns its id.
    pub fn create(&self) -> (String, Arc<InMemorySession>) {
        let id = uuid::Uuid::new_v4().to_string();
        let session = Arc::new(InMemorySession::new());
        self.sessions.insert(id.clone(), session.clone());
        (id, session)
    }

    /// Returns an existing session.
    pub fn get(&self, id: &str) -> Option<Arc<InMemorySession>> {
        self.sessions.get(id).map(|s| s.clone())
    }

    /// Returns the session for `id`, starting a new one when `id` is absent
    /// or unknown. The returned id is the one to send back to the client.
    pub fn get_or_create(&self, id: Option<&str>) -> (String, Arc<InMemorySession>) {
        if let Some(id) = id {
            if let Some(session) = self.get(id) {
                return (id.to_string(), session);
            }
        }
        self.create()
    }

    /// Ends a session.
    pub fn remove(&self, id: &str) -> bool {
        self.sessions.remove(id).is_some()
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Returns `true` if there are no live sessions.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
