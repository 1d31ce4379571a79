//! Unified error types for the authentication gate and the handlers behind it.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use thiserror::Error;

/// Transport-level classification of an error.
///
/// Every [`GateError`] maps onto exactly one class. The gRPC layer turns a
/// class into a status code; nothing else needs to know about codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    /// The caller could not be identified at all.
    Unauthenticated,
    /// The caller sent something unusable (including bad credentials).
    InvalidArgument,
    /// The requested resource does not exist.
    NotFound,
    /// The resource already exists.
    AlreadyExists,
    /// The caller is known but not allowed.
    PermissionDenied,
    /// A dependency is temporarily unavailable.
    Unavailable,
    /// The operation ran out of time.
    DeadlineExceeded,
    /// Anything unclassified.
    Internal,
}

impl std::fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Unauthenticated => "unauthenticated",
            Self::InvalidArgument => "invalid_argument",
            Self::NotFound => "not_found",
            Self::AlreadyExists => "already_exists",
            Self::PermissionDenied => "permission_denied",
            Self::Unavailable => "unavailable",
            Self::DeadlineExceeded => "deadline_exceeded",
            Self::Internal => "internal",
        };
        f.write_str(name)
    }
}

/// Unified error type for Gatekeeper.
///
/// The first group of variants is produced by the authentication gate before
/// a handler runs. The second group is what handlers return; together they
/// form the handler-failure side of the taxonomy.
#[derive(Error, Debug)]
pub enum GateError {
    // ============ Authentication Errors ============
    /// The call carried no incoming metadata.
    #[error("failed to get metadata")]
    MetadataMissing,

    /// The token header was not sent.
    #[error("missing '{header}' header")]
    TokenMissing { header: String },

    /// The token header was sent but is blank.
    #[error("empty '{header}' header")]
    TokenEmpty { header: String },

    /// The verification key could not be obtained or parsed.
    #[error("failed to initialize token authenticator: public key at {location} unavailable: {reason}")]
    KeyUnavailable { location: String, reason: String },

    /// The token failed structural, signature or claim validation.
    #[error("token not valid: {0}")]
    TokenInvalid(String),

    // ============ Handler Errors ============
    /// Resource not found
    #[error("Resource not found: {resource_type} with id {id}")]
    NotFound {
        resource_type: &'static str,
        id: String,
    },

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Conflict error (e.g., duplicate entry)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Caller lacks an identity the handler needs
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Forbidden access
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Dependency unavailable
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// Timeout error
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Generic error wrapper
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl GateError {
    /// Returns the transport classification for this error.
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::MetadataMissing | Self::Unauthorized(_) => ErrorClass::Unauthenticated,
            Self::TokenMissing { .. }
            | Self::TokenEmpty { .. }
            | Self::KeyUnavailable { .. }
            | Self::TokenInvalid(_)
            | Self::Validation(_) => ErrorClass::InvalidArgument,
            Self::NotFound { .. } => ErrorClass::NotFound,
            Self::Conflict(_) => ErrorClass::AlreadyExists,
            Self::Forbidden(_) => ErrorClass::PermissionDenied,
            Self::Unavailable(_) => ErrorClass::Unavailable,
            Self::Timeout(_) => ErrorClass::DeadlineExceeded,
            Self::Configuration(_) | Self::Internal(_) | Self::Other(_) => ErrorClass::Internal,
        }
    }

    /// Returns a machine-readable error code.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::MetadataMissing => "METADATA_MISSING",
            Self::TokenMissing { .. } => "TOKEN_MISSING",
            Self::TokenEmpty { .. } => "TOKEN_EMPTY",
            Self::KeyUnavailable { .. } => "KEY_UNAVAILABLE",
            Self::TokenInvalid(_) => "TOKEN_INVALID",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Conflict(_) => "CONFLICT",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::Unavailable(_) => "UNAVAILABLE",
            Self::Timeout(_) => "TIMEOUT",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::Internal(_) | Self::Other(_) => "INTERNAL_ERROR",
        }
    }

    /// Checks if this error was raised by the authentication gate.
    #[must_use]
    pub const fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            Self::MetadataMissing
                | Self::TokenMissing { .. }
                | Self::TokenEmpty { .. }
                | Self::KeyUnavailable { .. }
                | Self::TokenInvalid(_)
        )
    }

    /// Checks if this error is retriable.
    ///
    /// Authentication failures never are: a rejected token stays rejected.
    #[must_use]
    pub const fn is_retriable(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Timeout(_))
    }

    /// Creates a key-unavailable error for a location.
    #[must_use]
    pub fn key_unavailable<L: ToString, R: ToString>(location: L, reason: R) -> Self {
        Self::KeyUnavailable {
            location: location.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Creates a token-invalid error.
    #[must_use]
    pub fn token_invalid<T: Into<String>>(reason: T) -> Self {
        Self::TokenInvalid(reason.into())
    }

    /// Creates a not found error for a resource.
    #[must_use]
    pub fn not_found<T: ToString>(resource_type: &'static str, id: T) -> Self {
        Self::NotFound {
            resource_type,
            id: id.to_string(),
        }
    }

    /// Creates a validation error.
    #[must_use]
    pub fn validation<T: Into<String>>(message: T) -> Self {
        Self::Validation(message.into())
    }

    /// Creates an unauthorized error.
    #[must_use]
    pub fn unauthorized<T: Into<String>>(message: T) -> Self {
        Self::Unauthorized(message.into())
    }

    /// Creates a forbidden error.
    #[must_use]
    pub fn forbidden<T: Into<String>>(message: T) -> Self {
        Self::Forbidden(message.into())
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal<T: Into<String>>(message: T) -> Self {
        Self::Internal(message.into())
    }
}

impl From<serde_json::Error> for GateError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(format!("JSON serialization error: {}", err))
    }
}
