//! Policy switches for the authentication gate.

use serde::{Deserialize, Serialize};
use std::fmt;

/// What the gate does with a call that carries metadata but no token header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MissingTokenPolicy {
    /// Treat the caller as anonymous and pass the original context through.
    ///
    /// Callers that only attach the token to some RPCs keep working for the
    /// rest.
    #[default]
    Permissive,
    /// Reject the call with an invalid-argument status.
    Strict,
}

impl MissingTokenPolicy {
    /// Returns true if a missing token header rejects the call.
    #[must_use]
    pub const fn is_strict(&self) -> bool {
        matches!(self, Self::Strict)
    }
}

impl fmt::Display for MissingTokenPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Permissive => write!(f, "permissive"),
            Self::Strict => write!(f, "strict"),
        }
    }
}

/// What a cached key provider does when refreshing the key fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum KeyRefreshFailurePolicy {
    /// Keep serving the last key that resolved successfully and log a warning.
    #[default]
    KeepLastGood,
    /// Fail calls until the key resolves again.
    FailCalls,
}

impl fmt::Display for KeyRefreshFailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::KeepLastGood => write!(f, "keep_last_good"),
            Self::FailCalls => write!(f, "fail_calls"),
        }
    }
}
