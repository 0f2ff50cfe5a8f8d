//! In-memory user storage.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use time::OffsetDateTime;

use social_auth::storage::{User, UserField, UserFields, UserStorage};
use social_auth::{AuthError, AuthResult};

/// First id handed out by [`InMemoryUserStorage::create`]. Id `1` is kept for
/// the super-admin, which is seeded with [`InMemoryUserStorage::insert`].
pub const FIRST_GENERATED_ID: u64 = 2;

/// User storage backed by concurrent maps.
///
/// Names and emails are unique; both are indexed so lookups by either never
/// scan.
#[derive(Debug)]
pub struct InMemoryUserStorage {
    users: DashMap<String, User>,
    names: DashMap<String, String>,
    emails: DashMap<String, String>,
    next_id: AtomicU64,
}

impl InMemoryUserStorage {
    /// Creates an empty storage.
    pub fn new() -> Self {
        Self::with_first_id(FIRST_GENERATED_ID)
    }

    /// Creates an empty storage that assigns ids starting at `first_id`.
    pub fn with_first_id(first_id: u64) -> Self {
        Self {
            users: DashMap::new(),
            names: DashMap::new(),
            emails: DashMap::new(),
            next_id: AtomicU64::new(first_id),
        }
    }

    /// Inserts a user with a caller-chosen id.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Conflict`] if the id, name or email is taken.
    pub fn insert(&self, user: User) -> AuthResult<()> {
        if self.users.contains_key(&user.id) {
            return Err(AuthError::conflict(format!("User id '{}' exists", user.id)));
        }
        self.claim(&user.id, &user.name, user.email.as_deref())?;
        self.users.insert(user.id.clone(), user);
        Ok(())
    }

    /// Number of stored users.
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Returns `true` if no users are stored.
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    fn next_id(&self) -> String {
        self.next_id.fetch_add(1, Ordering::SeqCst).to_string()
    }

    /// Reserves `name` and `email` for user `id`.
    fn claim(&self, id: &str, name: &str, email: Option<&str>) -> AuthResult<()> {
        match self.names.entry(name.to_string()) {
            Entry::Occupied(_) => {
                return Err(AuthError::conflict(format!("Username '{name}' is taken")));
            }
            Entry::Vacant(v) => {
                v.insert(id.to_string());
            }
        }

        if let Some(email) = email {
            match self.emails.entry(email.to_string()) {
                Entry::Occupied(_) => {
                    self.names.remove(name);
                    return Err(AuthError::conflict(format!("Email '{email}' is taken")));
                }
                Entry::Vacant(v) => {
                    v.insert(id.to_string());
                }
            }
        }

        Ok(())
    }

    fn release(&self, name: &str, email: Option<&str>) {
        self.names.remove(name);
        if let Some(email) = email {
            self.emails.remove(email);
        }
    }
}

impl Default for InMemoryUserStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserStorage for InMemoryUserStorage {
    async fn find_by_field(&self, field: UserField, value: &str) -> AuthResult<Option<User>> {
        let id = match field {
            UserField::Id => Some(value.to_string()),
            UserField::Name => self.names.get(value).map(|id| id.clone()),
            UserField::Mail => self.emails.get(value).map(|id| id.clone()),
        };

        Ok(id.and_then(|id| self.users.get(&id).map(|u| u.clone())))
    }

    async fn create(&self, fields: &UserFields) -> AuthResult<User> {
        if fields.name.trim().is_empty() {
            return Err(AuthError::invalid_request("Username is required"));
        }

        let id = self.next_id();
        self.claim(&id, &fields.name, fields.mail.as_deref())?;

        let user = User::from_fields(id.clone(), fields.clone());
        self.users.insert(id, user.clone());

        tracing::debug!(user_id = %user.id, username = %user.name, "User stored");
        Ok(user)
    }

    async fn save(&self, user: &User) -> AuthResult<()> {
        let previous = self
            .users
            .get(&user.id)
            .map(|u| (u.name.clone(), u.email.clone()))
            .ok_or_else(|| AuthError::not_found(format!("User '{}'", user.id)))?;

        let (old_name, old_email) = previous;
        if old_name != user.name || old_email != user.email {
            self.release(&old_name, old_email.as_deref());
            if let Err(e) = self.claim(&user.id, &user.name, user.email.as_deref()) {
                // Restore the old reservations; they were free a moment ago.
                let _ = self.claim(&user.id, &old_name, old_email.as_deref());
                return Err(e);
            }
        }

        let mut updated = user.clone();
        updated.updated_at = OffsetDateTime::now_utc();
        self.users.insert(user.id.clone(), updated);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use social_auth::storage::UserStatus;

    fn fields(name: &str, mail: Option<&str>) -> UserFields {
        UserFields::new(name, "en")
            .with_mail(mail.map(str::to_string))
            .with_status(UserStatus::Active)
    }

    #[tokio::test]
    async fn test_create_assigns_sequential_ids() {
        let storage = InMemoryUserStorage::new();

        let a = storage.create(&fields("alice", None)).await.unwrap();
        let b = storage.create(&fields("bob", None)).await.unwrap();

        assert_eq!(a.id, "2");
        assert_eq!(b.id, "3");
        assert_eq!(storage.len(), 2);
    }

    #[tokio::test]
    async fn test_find_by_name_and_email() {
        let storage = InMemoryUserStorage::new();
        let created = storage
            .create(&fields("janedoe", Some("jane@example.com")))
            .await
            .unwrap();

        let by_name = storage.find_by_name("janedoe").await.unwrap().unwrap();
        let by_mail = storage
            .find_by_email("jane@example.com")
            .await
            .unwrap()
            .unwrap();
        let by_id = storage.find_by_id(&created.id).await.unwrap().unwrap();

        assert_eq!(by_name.id, created.id);
        assert_eq!(by_mail.id, created.id);
        assert_eq!(by_id.name, "janedoe");
        assert!(storage.find_by_name("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_name_or_email_conflicts() {
        let storage = InMemoryUserStorage::new();
        storage
            .create(&fields("jane", Some("jane@example.com")))
            .await
            .unwrap();

        let err = storage.create(&fields("jane", None)).await.unwrap_err();
        assert!(err.is_conflict());

        let err = storage
            .create(&fields("other", Some("jane@example.com")))
            .await
            .unwrap_err();
        assert!(err.is_conflict());

        // The failed email claim released the name it reserved.
        assert!(storage.find_by_name("other").await.unwrap().is_none());
        storage.create(&fields("other", None)).await.unwrap();
    }

    #[tokio::test]
    async fn test_insert_reserves_super_admin() {
        let storage = InMemoryUserStorage::new();
        storage
            .insert(User::from_fields("1", fields("admin", None)))
            .unwrap();

        let admin = storage.find_by_id("1").await.unwrap().unwrap();
        assert!(admin.is_super_admin());
        assert!(storage.insert(User::from_fields("1", fields("x", None))).is_err());
    }

    #[tokio::test]
    async fn test_save_updates_user_and_indexes() {
        let storage = InMemoryUserStorage::new();
        let mut user = storage
            .create(&fields("jane", Some("jane@example.com")))
            .await
            .unwrap();

        user.picture_file_id = Some("file-1".to_string());
        user.email = Some("jane@new.example.com".to_string());
        storage.save(&user).await.unwrap();

        let stored = storage.find_by_id(&user.id).await.unwrap().unwrap();
        assert_eq!(stored.picture_file_id.as_deref(), Some("file-1"));
        assert!(storage.find_by_email("jane@example.com").await.unwrap().is_none());
        assert!(
            storage
                .find_by_email("jane@new.example.com")
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn test_save_rename_conflict_keeps_old_name() {
        let storage = InMemoryUserStorage::new();
        storage.create(&fields("bob", None)).await.unwrap();
        let mut jane = storage.create(&fields("jane", None)).await.unwrap();

        jane.name = "bob".to_string();
        assert!(storage.save(&jane).await.unwrap_err().is_conflict());
        assert!(storage.find_by_name("jane").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_save_missing_user() {
        let storage = InMemoryUserStorage::new();
        let ghost = User::from_fields("99", fields("ghost", None));
        let err = storage.save(&ghost).await.unwrap_err();
        assert!(matches!(err, AuthError::NotFound { .. }));
    }
}
