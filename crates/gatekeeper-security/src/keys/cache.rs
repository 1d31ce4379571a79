//! Verification key cache with periodic refresh.

use super::{KeyLocation, KeyProvider, VerificationKey};
use async_trait::async_trait;
use gatekeeper_config::{KeyCacheConfig, KeyRefreshFailurePolicy};
use gatekeeper_core::{GateError, GateResult};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

struct KeySnapshot {
    key: Arc<VerificationKey>,
    refreshed_at: Instant,
}

/// Serves a resolved key until its refresh interval elapses.
///
/// Readers clone an `Arc` out of the current snapshot under a short read
/// lock. Refreshes are serialized: callers that find the snapshot stale
/// queue on the refresh mutex, and only the first of them resolves the key.
pub struct CachedKeyProvider<P = super::KeyResolver> {
    inner: P,
    refresh_interval: Duration,
    on_refresh_failure: KeyRefreshFailurePolicy,
    snapshot: RwLock<Option<KeySnapshot>>,
    refresh: Mutex<()>,
}

impl<P: KeyProvider> CachedKeyProvider<P> {
    /// Wraps a provider with the given cache settings.
    pub fn new(inner: P, config: &KeyCacheConfig) -> Self {
        Self {
            inner,
            refresh_interval: config.refresh_interval(),
            on_refresh_failure: config.on_refresh_failure,
            snapshot: RwLock::new(None),
            refresh: Mutex::new(()),
        }
    }

    fn fresh_key(&self) -> Option<Arc<VerificationKey>> {
        self.snapshot
            .read()
            .as_ref()
            .filter(|s| s.refreshed_at.elapsed() < self.refresh_interval)
            .map(|s| Arc::clone(&s.key))
    }

    async fn refresh(&self) -> GateResult<Arc<VerificationKey>> {
        let _guard = self.refresh.lock().await;

        // Another caller may have refreshed while this one waited
        if let Some(key) = self.fresh_key() {
            return Ok(key);
        }

        match self.inner.verification_key().await {
            Ok(key) => {
                let replaced = self
                    .snapshot
                    .write()
                    .replace(KeySnapshot {
                        key: Arc::clone(&key),
                        refreshed_at: Instant::now(),
                    })
                    .is_some();
                if replaced {
                    debug!(location = %self.inner.location(), "Verification key refreshed");
                } else {
                    info!(location = %self.inner.location(), "Verification key loaded");
                }
                Ok(key)
            }
            Err(e) => self.on_failure(e),
        }
    }

    fn on_failure(&self, error: GateError) ->GateResult<Arc<VerificationKey>> {
        if self.on_refresh_failure == KeyRefreshFailurePolicy::FailCalls {
            return Err(error);
        }

        let mut snapshot = self.snapshot.write();
        match snapshot.as_mut() {
            Some(last_good) => {
                warn!(
                    location = %self.inner.location(),
                    retry_in = ?self.refresh_interval,
                    "Verification key refresh failed, keeping last good key: {}",
                    error
                );
                // Retry after another interval instead of on every call
                last_good.refreshed_at = Instant::now();
                Ok(Arc::clone(&last_good.key))
            }
            None => Err(error),
        }
    }
}

#[async_trait]
impl<P: KeyProvider> KeyProvider for CachedKeyProvider<P> {
    async fn verification_key(&self) -> GateResult<Arc<VerificationKey>> {
        match self.fresh_key() {
            Some(key) => Ok(key),
            None => self.refresh().await,
        }
    }

    fn location(&self) -> &KeyLocation {
        self.inner.location()
    }
}

impl<P> std::fmt::Debug for CachedKeyProvider<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedKeyProvider")
            .field("refresh_interval", &self.refresh_interval)
            .field("on_refresh_failure", &self.on_refresh_failure)
            .finish_non_exhaustive()
    }
}
