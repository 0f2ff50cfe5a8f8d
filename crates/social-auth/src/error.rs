//! Error types for social login provisioning.
//!
//! [`AuthError`] is returned by every collaborator trait (storage, session,
//! downloads). [`ProvisioningError`] classifies the failures the provisioning
//! flow handles locally before converting them into a login redirect.

use std::fmt;

/// Errors returned by collaborators of the provisioning service.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// A storage operation failed.
    #[error("Storage error: {message}")]
    Storage {
        /// Description of the storage error.
        message: String,
    },

    /// A unique constraint was violated (duplicate username, email or link).
    #[error("Conflict: {message}")]
    Conflict {
        /// Description of the conflicting value.
        message: String,
    },

    /// The requested entity does not exist.
    #[error("Not found: {message}")]
    NotFound {
        /// Description of the missing entity.
        message: String,
    },

    /// The request is invalid or missing required data.
    #[error("Invalid request: {message}")]
    InvalidRequest {
        /// Description of why the request is invalid.
        message: String,
    },

    /// A file or directory operation failed.
    #[error("File error: {message}")]
    File {
        /// Description of the file error.
        message: String,
    },

    /// A remote resource could not be fetched.
    #[error("Download error: {url} - {message}")]
    Download {
        /// The URL that was requested.
        url: String,
        /// Description of the error.
        message: String,
    },

    /// The configuration is invalid.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration error.
        message: String,
    },

    /// An unexpected internal error occurred.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl AuthError {
    /// Creates a new `Storage` error.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Creates a new `Conflict` error.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Creates a new `NotFound` error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidRequest` error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Creates a new `File` error.
    #[must_use]
    pub fn file(message: impl Into<String>) -> Self {
        Self::File {
            message: message.into(),
        }
    }

    /// Creates a new `Download` error.
    #[must_use]
    pub fn download(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Download {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Creates a new `Configuration` error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns `true` if this error came from a unique constraint.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    /// Returns `true` if this is a file or download error.
    #[must_use]
    pub fn is_resource_error(&self) -> bool {
        matches!(self, Self::File { .. } | Self::Download { .. })
    }

    /// Returns the error category for logging purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Storage { .. } | Self::Conflict { .. } | Self::NotFound { .. } => {
                ErrorCategory::Persistence
            }
            Self::InvalidRequest { .. } => ErrorCategory::Validation,
            Self::File { .. } | Self::Download { .. } => ErrorCategory::Resource,
            Self::Configuration { .. } => ErrorCategory::Configuration,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }
}

/// Failures handled inside the provisioning flow.
///
/// None of these escape `authenticate`; they are logged and turned into a
/// redirect to the login page.
#[derive(Debug, thiserror::Error)]
pub enum ProvisioningError {
    /// A required field was missing or empty.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Site policy refused the operation.
    #[error("Rejected by policy: {0}")]
    PolicyRejection(PolicyRejection),

    /// A repository create or save failed.
    #[error("Persistence failed: {0}")]
    Persistence(#[source] AuthError),

    /// A directory or download operation failed.
    #[error("Resource unavailable: {0}")]
    Resource(#[source] AuthError),

    /// Something failed that no input or collaborator can explain, such as
    /// password hashing.
    #[error("Internal failure: {0}")]
    Internal(#[source] AuthError),
}

impl ProvisioningError {
    /// Returns the error category for logging purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation(_) => ErrorCategory::Validation,
            Self::PolicyRejection(_) => ErrorCategory::Policy,
            Self::Persistence(_) => ErrorCategory::Persistence,
            Self::Resource(_) => ErrorCategory::Resource,
            Self::Internal(_) => ErrorCategory::Internal,
        }
    }
}

impl From<PolicyRejection> for ProvisioningError {
    fn from(rejection: PolicyRejection) -> Self {
        Self::PolicyRejection(rejection)
    }
}

/// Reasons why site policy refused a login or registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyRejection {
    /// New accounts may only be created by administrators.
    RegistrationDisabled,
    /// The super-admin account may not use social login.
    AdminLoginDisabled,
    /// The account holds a role that may not use social login.
    RoleDisabled(String),
    /// New accounts require administrator approval.
    ApprovalRequired,
    /// The account is blocked or not yet approved.
    AccountBlocked,
}

impl fmt::Display for PolicyRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RegistrationDisabled => write!(f, "registration disabled"),
            Self::AdminLoginDisabled => write!(f, "admin login disabled"),
            Self::RoleDisabled(role) => write!(f, "role '{role}' disabled"),
            Self::ApprovalRequired => write!(f, "approval required"),
            Self::AccountBlocked => write!(f, "account blocked"),
        }
    }
}

/// Categories of errors for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Missing or malformed input.
    Validation,
    /// Site policy refused the operation.
    Policy,
    /// Storage errors.
    Persistence,
    /// Filesystem or network resources.
    Resource,
    /// Configuration errors.
    Configuration,
    /// Internal errors.
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation => write!(f, "validation"),
            Self::Policy => write!(f, "policy"),
            Self::Persistence => write!(f, "persistence"),
            Self::Resource => write!(f, "resource"),
            Self::Configuration => write!(f, "configuration"),
            Self::Internal => write!(f, "internal"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_constructors() {
        let err = AuthError::storage("connection lost");
        assert_eq!(err.to_string(), "Storage error: connection lost");

        let err = AuthError::download("https://example.com/a.jpg", "404");
        assert_eq!(
            err.to_string(),
            "Download error: https://example.com/a.jpg - 404"
        );
    }

    #[test]
    fn test_error_predicates() {
        assert!(AuthError::conflict("name taken").is_conflict());
        assert!(AuthError::file("not writable").is_resource_error());
        assert!(!AuthError::internal("boom").is_resource_error());
    }

    #[test]
    fn test_error_categories() {
        assert_eq!(
            AuthError::storage("x").category(),
            ErrorCategory::Persistence
        );
        assert_eq!(
            AuthError::download("u", "x").category(),
            ErrorCategory::Resource
        );
        assert_eq!(
            AuthError::invalid_request("x").category(),
            ErrorCategory::Validation
        );
        assert_eq!(
            ProvisioningError::from(PolicyRejection::RegistrationDisabled).category(),
            ErrorCategory::Policy
        );
        assert_eq!(
            ProvisioningError::Persistence(AuthError::storage("x")).category(),
            ErrorCategory::Persistence
        );
        assert_eq!(
            ProvisioningError::Resource(AuthError::file("x")).category(),
            ErrorCategory::Resource
        );
        assert_eq!(
            ProvisioningError::Internal(AuthError::internal("x")).category(),
            ErrorCategory::Internal
        );
    }

    #[test]
    fn test_policy_rejection_display() {
        assert_eq!(
            PolicyRejection::RoleDisabled("editor".into()).to_string(),
            "role 'editor' disabled"
        );
        assert_eq!(
            ProvisioningError::from(PolicyRejection::ApprovalRequired).to_string(),
            "Rejected by policy: approval required"
        );
    }

    #[test]
    fn test_category_display() {
        assert_eq!(ErrorCategory::Resource.to_string(), "resource");
        assert_eq!(ErrorCategory::Policy.to_string(), "policy");
    }
}
