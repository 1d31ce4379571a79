//! Resolves the verification key from a URL or a file.

use super::{KeyLocation, KeyProvider, VerificationKey};
use async_trait::async_trait;
use gatekeeper_config::AuthConfig;
use gatekeeper_core::{GateError, GateResult};
use reqwest::Client;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Reads the verification key from its location each time it is asked.
#[derive(Clone)]
pub struct KeyResolver {
    client: Client,
    location: KeyLocation,
}

impl KeyResolver {
    /// Creates a resolver for a location string.
    ///
    /// `fetch_timeout` bounds a remote fetch from connect to the last body
    /// byte.
    pub fn new(location: &str, fetch_timeout: Duration) -> GateResult<Self> {
        let client = Client::builder()
            .timeout(fetch_timeout)
            .build()
            .map_err(|e| GateError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            location: KeyLocation::parse(location),
        })
    }

    /// Creates a resolver from the gate configuration.
    pub fn from_config(config: &AuthConfig) -> GateResult<Self> {
        Self::new(&config.public_key_location, config.key_fetch_timeout())
    }

    /// Resolves and parses the key.
    ///
    /// Every failure, including malformed PEM, is `KeyUnavailable`.
    pub async fn resolve(&self) -> GateResult<VerificationKey> {
        let pem = match &self.location {
            KeyLocation::Remote(url) => self.fetch(url).await?,
            KeyLocation::File(path) => self.read(path).await?,
        };

        VerificationKey::from_pem(&pem).map_err(|e| {
            debug!(location = %self.location, "Verification key is not a PEM RSA public key: {}", e);
            GateError::key_unavailable(&self.location, format!("invalid PEM public key: {}", e))
        })
    }

    async fn fetch(&self, url: &str) -> GateResult<Vec<u8>> {
        debug!("Fetching verification key from {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| {
                debug!(location = %url, "Verification key fetch failed: {}", e);
                GateError::key_unavailable(url, e)
            })?;

        let body = response.bytes().await.map_err(|e| {
            debug!(location = %url, "Reading verification key response failed: {}", e);
            GateError::key_unavailable(url, e)
        })?;

        Ok(body.to_vec())
    }

    async fn read(&self, path: &Path) -> GateResult<Vec<u8>> {
        debug!("Reading verification key from {}", path.display());

        tokio::fs::read(path).await.map_err(|e| {
            debug!(location = %path.display(), "Verification key read failed: {}", e);
            GateError::key_unavailable(path.display(), e)
        })
    }
}

#[async_trait]
impl KeyProvider for KeyResolver {
    async fn verification_key(&self) -> GateResult<Arc<VerificationKey>> {
        self.resolve().await.map(Arc::new)
    }

    fn location(&self) -> &KeyLocation {
        &self.location
    }
}

impl std::fmt::Debug for KeyResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyResolver")
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}
