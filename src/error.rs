//! Error types for the dirconfig system.
//!
//! This module provides the error hierarchy for every stage of a resource
//! lifecycle: declaration loading, validation, state management, the
//! configuration API, and lifecycle orchestration.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for dirconfig.
#[derive(Debug, Error)]
pub enum DirConfigError {
    /// Declaration file and provider settings errors.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Plan values rejected before any remote call.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// State management errors.
    #[error("State error: {0}")]
    State(#[from] StateError),

    /// Configuration API errors.
    #[error("Configuration API error: {0}")]
    Api(#[from] ApiError),

    /// Resource lifecycle errors.
    #[error("Lifecycle error: {0}")]
    Lifecycle(#[from] LifecycleError),

    /// IO errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Declaration file and provider settings errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The declaration file was not found.
    #[error("Declaration file not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// The declaration file could not be parsed.
    #[error("Failed to parse declarations: {message}")]
    ParseError {
        /// Description of the parse error.
        message: String,
        /// Optional source location.
        location: Option<String>,
    },

    /// Provider settings failed validation.
    #[error("Provider settings are invalid: {message}")]
    InvalidProvider {
        /// Description of the problem.
        message: String,
    },

    /// Environment variable is missing.
    #[error("Missing environment variable: {name}")]
    MissingEnvVar {
        /// Name of the missing variable.
        name: String,
    },

    /// Duplicate resource address.
    #[error("Duplicate resource address: {address}")]
    DuplicateAddress {
        /// The duplicated address.
        address: String,
    },

    /// The resource type is not known.
    #[error("Unknown resource type: {resource_type}")]
    UnknownResourceType {
        /// The unknown type name.
        resource_type: String,
    },

    /// A `${type.name.attribute}` reference could not be understood.
    #[error("Invalid reference '{reference}' in {address}: {message}")]
    InvalidReference {
        /// Address of the declaring resource.
        address: String,
        /// The reference text.
        reference: String,
        /// What is wrong with it.
        message: String,
    },

    /// The declaration file failed validation.
    #[error("Invalid declaration at {field}: {message}")]
    Invalid {
        /// Path of the offending value, e.g. `resources[2].attributes.enabled`.
        field: String,
        /// What is wrong with it.
        message: String,
    },
}

/// Plan values rejected before any remote call is made.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// An enum-typed attribute holds a value outside its allowed set.
    #[error("Invalid value '{value}' for {attribute}; allowed values: {allowed}")]
    InvalidEnumValue {
        /// Attribute name.
        attribute: String,
        /// Offending value.
        value: String,
        /// Comma separated allowed values.
        allowed: String,
    },

    /// The attribute is not part of the resource schema.
    #[error("Unknown attribute '{attribute}' for resource type {resource_type}")]
    UnknownAttribute {
        /// Resource type name.
        resource_type: String,
        /// Attribute name.
        attribute: String,
    },

    /// The attribute value has the wrong shape for its kind.
    #[error("Attribute '{attribute}' expects a {expected} value")]
    KindMismatch {
        /// Attribute name.
        attribute: String,
        /// Expected kind description.
        expected: String,
    },

    /// A required attribute has no value.
    #[error("Missing required attribute '{attribute}'")]
    MissingRequired {
        /// Attribute name.
        attribute: String,
    },
}

/// State management errors.
#[derive(Debug, Error)]
pub enum StateError {
    /// State is corrupted.
    #[error("State is corrupted: {message}")]
    Corrupted {
        /// Description of the corruption.
        message: String,
    },

    /// State lock acquisition failed.
    #[error("Failed to acquire state lock: {message}")]
    LockFailed {
        /// Description of the lock failure.
        message: String,
    },

    /// State lock is held by another process.
    #[error("State is locked by another process (lock holder: {holder}, since: {since})")]
    LockedByOther {
        /// Identifier of the lock holder.
        holder: String,
        /// When the lock was acquired.
        since: String,
    },

    /// State file could not be written.
    #[error("Failed to write state: {message}")]
    WriteFailed {
        /// Description of the write error.
        message: String,
    },

    /// Serialization error.
    #[error("State serialization error: {message}")]
    SerializationError {
        /// Description of the serialization error.
        message: String,
    },

    /// State version mismatch.
    #[error("State version mismatch: expected {expected}, found {found}")]
    VersionMismatch {
        /// Expected state version.
        expected: String,
        /// Found state version.
        found: String,
    },

    /// No resource with this address is tracked.
    #[error("Resource {address} is not in state")]
    NotTracked {
        /// Resource address.
        address: String,
    },
}

/// Configuration API errors.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Authentication failed.
    #[error("Authentication failed: {message}")]
    AuthenticationFailed {
        /// Description of the auth failure.
        message: String,
    },

    /// The API answered with a non-success status.
    #[error("{summary}: {status}{}", detail_suffix(.detail, .body))]
    RequestFailed {
        /// What was being attempted.
        summary: String,
        /// HTTP status code.
        status: u16,
        /// `detail` from the server's JSON error body.
        detail: Option<String>,
        /// Raw response body when it is not a JSON error.
        body: Option<String>,
    },

    /// The object does not exist.
    #[error("Configuration object not found: {path}")]
    NotFound {
        /// Request path.
        path: String,
    },

    /// Network error.
    #[error("Network error communicating with the configuration API: {message}")]
    NetworkError {
        /// Description of the network error.
        message: String,
    },

    /// Invalid response from API.
    #[error("Invalid response from the configuration API: {message}")]
    InvalidResponse {
        /// Description of the response issue.
        message: String,
    },
}

fn detail_suffix(detail: &Option<String>, body: &Option<String>) -> String {
    let non_empty = |s: &&String| !s.trim().is_empty();
    if let Some(detail) = detail.as_ref().filter(non_empty) {
        return format!(" - Detail: {detail}");
    }
    body.as_ref()
        .filter(non_empty)
        .map(|b| format!(" - Response body: {b}"))
        .unwrap_or_default()
}

/// Resource lifecycle errors.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// A delete call succeeded but the object can still be read.
    #[error("{resource_type} '{id}' still exists after delete")]
    StillExists {
        /// Resource type name.
        resource_type: String,
        /// Object identifier.
        id: String,
    },

    /// An import identifier does not match the resource's identity layout.
    #[error("Invalid import id '{id}': expected {expected}")]
    MalformedImportId {
        /// The supplied identifier.
        id: String,
        /// Description of the expected layout.
        expected: String,
    },

    /// An identity attribute had no concrete value when one was needed.
    #[error("Identity attribute '{attribute}' is not known for {resource_type}")]
    MissingIdentity {
        /// Resource type name.
        resource_type: String,
        /// Identity attribute name.
        attribute: String,
    },

    /// An action failed for a specific resource.
    #[error("Failed to {action} {address}: {reason}")]
    ActionFailed {
        /// Action name.
        action: String,
        /// Resource address.
        address: String,
        /// Reason for failure.
        reason: String,
    },
}

/// Result type alias for dirconfig operations.
pub type Result<T> = std::result::Result<T, DirConfigError>;

impl DirConfigError {
    /// Creates a new internal error with the given message.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Returns true if this error means the remote object does not exist.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Api(ApiError::NotFound { .. }))
    }
}

impl ConfigError {
    /// Creates a parse error without a location.
    #[must_use]
    pub fn parse(message: impl Into<String>) -> Self {
        Self::ParseError {
            message: message.into(),
            location: None,
        }
    }
}

impl StateError {
    /// Creates a serialization error with the given message.
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::SerializationError {
            message: message.into(),
        }
    }

    /// Creates a corruption error with the given message.
    #[must_use]
    pub fn corrupted(message: impl Into<String>) -> Self {
        Self::Corrupted {
            message: message.into(),
        }
    }
}

impl ApiError {
    /// Creates a network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::NetworkError {
            message: message.into(),
        }
    }

    /// Creates an invalid response error.
    #[must_use]
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }

    /// Replaces the summary of a failed request with a description of the
    /// action that was being attempted.
    #[must_use]
    pub fn with_summary(self, new_summary: impl Into<String>) -> Self {
        match self {
            Self::RequestFailed {
                status,
                detail,
                body,
                ..
            } => Self::RequestFailed {
                summary: new_summary.into(),
                status,
                detail,
                body,
            },
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_failed_appends_detail() {
        let err = ApiError::RequestFailed {
            summary: String::from("An error occurred while updating the Location"),
            status: 400,
            detail: Some(String::from("The value is not allowed")),
            body: None,
        };
        assert_eq!(
            err.to_string(),
            "An error occurred while updating the Location: 400 - Detail: The value is not allowed"
        );
    }

    #[test]
    fn test_request_failed_without_detail() {
        let err = ApiError::RequestFailed {
            summary: String::from("An error occurred while getting the Location"),
            status: 500,
            detail: None,
            body: None,
        };
        assert_eq!(err.to_string(), "An error occurred while getting the Location: 500");
    }

    #[test]
    fn test_request_failed_with_raw_body() {
        let err = ApiError::RequestFailed {
            summary: String::from("PATCH locations/x"),
            status: 502,
            detail: None,
            body: Some(String::from("Bad Gateway")),
        }
        .with_summary("An error occurred while updating the Location");
        assert_eq!(
            err.to_string(),
            "An error occurred while updating the Location: 502 - Response body: Bad Gateway"
        );
    }

    #[test]
    fn test_not_found_detection() {
        let err = DirConfigError::from(ApiError::NotFound {
            path: String::from("locations/x"),
        });
        assert!(err.is_not_found());
        assert!(!DirConfigError::internal("boom").is_not_found());
    }
}
