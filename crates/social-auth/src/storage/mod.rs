//! Storage traits for social login data.
//!
//! This module defines storage interfaces for:
//!
//! - Local user accounts
//! - Identity links between provider accounts and local users
//! - Browser sessions and login finalization
//!
//! # Implementations
//!
//! Storage implementations are provided in separate crates:
//!
//! - `social-auth-memory` - in-memory backend

pub mod identity;
pub mod session;
pub mod user;

pub use identity::{IdentityLink, IdentityLinkStorage};
pub use session::{
    SESSION_LOGIN_TIME_KEY, SESSION_UID_KEY, SessionAuthenticator, SessionDataHandler,
    SessionStore, SessionUidAuthenticator,
};
pub use user::{SUPER_ADMIN_ID, User, UserField, UserFields, UserStatus, UserStorage};
