//! HTTP host for social login provisioning.
//!
//! Wires the in-memory storages into a [`social_auth::UserProvisioningService`]
//! and exposes the login start and callback endpoints.

pub mod config;
pub mod error;
pub mod handlers;
pub mod observability;
pub mod server;
pub mod state;

pub use config::AppConfig;
pub use error::ApiError;
pub use server::{ServerBuilder, SocialAuthServer, build_app};
pub use state::AppState;
