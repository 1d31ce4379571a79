//! The identity propagated to handlers.

use std::fmt;

/// Authenticated caller, reduced to the one fact handlers rely on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity {
    username: String,
}

impl Identity {
    /// Creates an identity for a username.
    #[must_use]
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
        }
    }

    /// Returns the username.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Returns true if the token carried no username.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.username.is_empty()
    }

    /// Consumes the identity, returning the username.
    #[must_use]
    pub fn into_username(self) -> String {
        self.username
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.username)
    }
}
