//! Social login events.
//!
//! Other modules extend the provisioning flow through hooks:
//!
//! - **UserFields**: adjust the field set of an account before it is created
//! - **UserCreated**: react to a new account
//! - **UserLogin**: react to a successful login
//!
//! Hooks are dispatched in-line by the [`HookRegistry`]; the flow continues
//! only after every hook has returned.
//!
//! # Module Structure
//!
//! - [`types`]: Event payloads
//! - [`hooks`]: Hook trait and error type
//! - [`registry`]: Hook registry and dispatch

pub mod hooks;
pub mod registry;
pub mod types;

pub use hooks::{HookError, SocialAuthHook};
pub use registry::HookRegistry;
pub use types::{SocialAuthEventType, UserEvent, UserFieldsEvent};
