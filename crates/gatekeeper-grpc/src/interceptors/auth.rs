//! Authentication gate for gRPC calls.

use super::StatusTranslator;
use crate::CallContext;
use gatekeeper_config::{AuthConfig, MissingTokenPolicy};
use gatekeeper_core::{GateError, GateResult};
use gatekeeper_security::{key_provider_from_config, KeyProvider, TokenAuthenticator};
use std::sync::Arc;
use tonic::Status;
use tracing::{debug, warn};

/// Decides whether a call may proceed and under which identity.
///
/// The gate holds no per-call state. Apart from an optional key cache
/// behind the [`KeyProvider`], it is read-only and can be shared by every
/// concurrent call.
pub struct AuthGate {
    enabled: bool,
    token_header: String,
    missing_token_policy: MissingTokenPolicy,
    keys: Arc<dyn KeyProvider>,
    authenticator: TokenAuthenticator,
}

impl AuthGate {
    /// Creates a gate that resolves keys through `keys`.
    pub fn new(config: &AuthConfig, keys: Arc<dyn KeyProvider>) -> Self {
        Self {
            enabled: config.multi_user_mode,
            token_header: config.token_header_key(),
            missing_token_policy: config.missing_token_policy,
            keys,
            authenticator: TokenAuthenticator::new(config),
        }
    }

    /// Creates a gate with the key provider the configuration describes.
    pub fn from_config(config: &AuthConfig) -> GateResult<Self> {
        Ok(Self::new(config, key_provider_from_config(config)?))
    }

    /// Returns true if calls are authenticated at all.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Metadata key the token is read from.
    #[must_use]
    pub fn token_header(&self) -> &str {
        &self.token_header
    }

    /// Authenticates a call.
    ///
    /// Returns the context the handler should see: the original one when the
    /// gate is disabled or the call is anonymous, otherwise a new context
    /// carrying the caller's username. Rejections are logged here and
    /// nowhere else.
    pub async fn authenticate(&self, ctx: CallContext) -> Result<CallContext, Status> {
        if !self.enabled {
            return Ok(ctx);
        }

        let method = ctx.method().to_string();
        self.check(ctx).await.map_err(|err| {
            warn!(
                method = %method,
                class = %err.class(),
                code = err.error_code(),
                "Call rejected: {}",
                err
            );
            StatusTranslator::translate(&err)
        })
    }

    async fn check(&self, ctx: CallContext) -> GateResult<CallContext> {
        let metadata = ctx.incoming_metadata().ok_or(GateError::MetadataMissing)?;

        let Some(raw) = metadata.get(self.token_header.as_str()) else {
            return match self.missing_token_policy {
                MissingTokenPolicy::Permissive => {
                    debug!(method = %ctx.method(), "No token header, continuing anonymously");
                    Ok(ctx)
                }
                MissingTokenPolicy::Strict => Err(GateError::TokenMissing {
                    header: self.token_header.clone(),
                }),
            };
        };

        let token = raw
            .to_str()
            .map_err(|_| GateError::token_invalid("token header is not valid ASCII"))?;
        if token.trim().is_empty() {
            return Err(GateError::TokenEmpty {
                header: self.token_header.clone(),
            });
        }

        let key = self.keys.verification_key().await?;
        let identity = self.authenticator.authenticate(&key, token)?;

        debug!(method = %ctx.method(), user = %identity, "Caller authenticated");
        ctx.with_user(&identity)
    }
}

impl std::fmt::Debug for AuthGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthGate")
            .field("enabled", &self.enabled)
            .field("token_header", &self.token_header)
            .field("missing_token_policy", &self.missing_token_policy)
            .field("key_location", &self.keys.location().to_string())
            .finish_non_exhaustive()
    }
}
