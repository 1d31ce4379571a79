//! Error to gRPC status translation.

use gatekeeper_core::{ErrorClass, GateError};
use thiserror::Error;
use tonic::{Code, Status};

/// Maps gate and handler errors onto gRPC statuses.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusTranslator;

impl StatusTranslator {
    /// Returns the status code for an error class.
    #[must_use]
    pub const fn code(class: ErrorClass) -> Code {
        match class {
            ErrorClass::Unauthenticated => Code::Unauthenticated,
            ErrorClass::InvalidArgument => Code::InvalidArgument,
            ErrorClass::NotFound => Code::NotFound,
            ErrorClass::AlreadyExists => Code::AlreadyExists,
            ErrorClass::PermissionDenied => Code::PermissionDenied,
            ErrorClass::Unavailable => Code::Unavailable,
            ErrorClass::DeadlineExceeded => Code::DeadlineExceeded,
            ErrorClass::Internal => Code::Internal,
        }
    }

    /// Translates an error into the status returned to the client.
    ///
    /// The message is the error's display text; the cause chain of wrapped
    /// errors is kept as text only.
    #[must_use]
    pub fn translate(err: &GateError) -> Status {
        let message = match err {
            GateError::Other(e) => format!("{:#}", e),
            other => other.to_string(),
        };
        Status::new(Self::code(err.class()), message)
    }
}

/// Converts a gate or handler error into a gRPC status.
pub fn to_status(err: &GateError) -> Status {
    StatusTranslator::translate(err)
}

/// Error returned by a handler behind the interceptor.
///
/// Gate errors are translated by [`StatusTranslator`]. A status built by the
/// handler itself reaches the client unchanged.
#[derive(Error, Debug)]
pub enum HandlerError {
    #[error(transparent)]
    Gate(#[from] GateError),

    #[error("{}: {}", .0.code(), .0.message())]
    Status(#[from] Status),
}

impl HandlerError {
    /// Returns the code logged for the failure.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Gate(e) => e.error_code(),
            Self::Status(_) => "HANDLER_STATUS",
        }
    }

    /// Returns the status sent to the client.
    #[must_use]
    pub fn into_status(self) -> Status {
        match self {
            Self::Gate(e) => StatusTranslator::translate(&e),
            Self::Status(status) => status,
        }
    }
}
