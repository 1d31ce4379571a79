//! Verification key resolution.
//!
//! A [`KeyProvider`] hands out the RSA public key tokens are checked
//! against. [`KeyResolver`] reads it from its location on every call;
//! [`CachedKeyProvider`] wraps any provider with a refresh interval.

mod cache;
mod resolver;

pub use cache::*;
pub use resolver::*;

use async_trait::async_trait;
use gatekeeper_config::AuthConfig;
use gatekeeper_core::GateResult;
use jsonwebtoken::DecodingKey;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// RSA public key used to verify token signatures.
#[derive(Clone)]
pub struct VerificationKey {
    decoding_key: DecodingKey,
}

impl VerificationKey {
    /// Parses a PEM encoded RSA public key (`PUBLIC KEY` or `RSA PUBLIC KEY`).
    pub fn from_pem(pem: &[u8]) -> Result<Self, jsonwebtoken::errors::Error> {
        Ok(Self {
            decoding_key: DecodingKey::from_rsa_pem(pem)?,
        })
    }

    /// Returns the key in the form the JWT decoder needs.
    #[must_use]
    pub fn decoding_key(&self) -> &DecodingKey {
        &self.decoding_key
    }
}

impl fmt::Debug for VerificationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerificationKey").finish_non_exhaustive()
    }
}

/// Where a verification key is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyLocation {
    /// Fetched with an HTTP GET.
    Remote(String),
    /// Read from the local filesystem.
    File(PathBuf),
}

impl KeyLocation {
    /// Classifies a configured location string.
    ///
    /// Anything starting with `http` is fetched over the network; everything
    /// else is a filesystem path.
    #[must_use]
    pub fn parse(location: &str) -> Self {
        let location = location.trim();
        if location.starts_with("http") {
            Self::Remote(location.to_string())
        } else {
            Self::File(PathBuf::from(location))
        }
    }

    /// Returns true if the key is fetched over the network.
    #[must_use]
    pub const fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }
}

impl fmt::Display for KeyLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remote(url) => write!(f, "{}", url),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Source of the verification key for one authentication attempt.
#[async_trait]
pub trait KeyProvider: Send + Sync {
    /// Returns the key to verify the current call's token with.
    ///
    /// Fails with [`gatekeeper_core::GateError::KeyUnavailable`].
    async fn verification_key(&self) -> GateResult<Arc<VerificationKey>>;

    /// Returns where the key comes from, for logging.
    fn location(&self) -> &KeyLocation;
}

/// Builds the key provider the configuration asks for.
///
/// Without caching every call resolves the key again.
pub fn key_provider_from_config(config: &AuthConfig) -> GateResult<Arc<dyn KeyProvider>> {
    let resolver = KeyResolver::from_config(config)?;

    if config.key_cache.enabled {
        Ok(Arc::new(CachedKeyProvider::new(resolver, &config.key_cache)))
    } else {
        Ok(Arc::new(resolver))
    }
}
