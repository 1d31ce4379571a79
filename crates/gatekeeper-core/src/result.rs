//! Result type aliases for Gatekeeper.

use crate::GateError;

/// A specialized `Result` type for Gatekeeper operations.
pub type GateResult<T> = Result<T, GateError>;
