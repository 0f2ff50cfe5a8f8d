//! In-memory storage backend for social-auth.
//!
//! This crate implements the storage traits from `social-auth` on top of
//! `dashmap` concurrent maps. Unique constraints (account names, emails and
//! one link per provider identity) are enforced and reported as
//! [`AuthError::Conflict`](social_auth::AuthError::Conflict).
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use social_auth::UserProvisioningService;
//! use social_auth_memory::{InMemoryIdentityLinkStorage, InMemoryUserStorage};
//!
//! let service = UserProvisioningService::new(
//!     Arc::new(InMemoryUserStorage::new()),
//!     Arc::new(InMemoryIdentityLinkStorage::new()),
//! );
//! ```

pub mod links;
pub mod sessions;
pub mod users;

pub use links::InMemoryIdentityLinkStorage;
pub use sessions::{InMemorySession, InMemorySessionRegistry};
pub use users::{FIRST_GENERATED_ID, InMemoryUserStorage};
