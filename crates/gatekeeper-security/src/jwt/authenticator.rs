//! JWT authenticator: signature, structure and temporal checks.

use super::TokenClaims;
use crate::{Identity, VerificationKey};
use chrono::Utc;
use gatekeeper_config::AuthConfig;
use gatekeeper_core::{GateError, GateResult};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Algorithm, Validation};
use tracing::debug;

/// Signature algorithms accepted for an RSA verification key.
pub const RSA_ALGORITHMS: [Algorithm; 6] = [
    Algorithm::RS256,
    Algorithm::RS384,
    Algorithm::RS512,
    Algorithm::PS256,
    Algorithm::PS384,
    Algorithm::PS512,
];

/// Validates raw tokens against a verification key.
///
/// Holds no key itself: the key is resolved per call (or per cache
/// refresh) and passed in, so one authenticator serves every call.
#[derive(Clone)]
pub struct TokenAuthenticator {
    validation: Validation,
    require_expiry: bool,
    require_username: bool,
}

impl TokenAuthenticator {
    /// Creates an authenticator from the gate configuration.
    #[must_use]
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.algorithms = RSA_ALGORITHMS.to_vec();
        validation.leeway = config.clock_skew_secs;
        // jsonwebtoken skips exp/nbf values it cannot read as u64, so the
        // temporal claims are checked on the decoded claims instead
        validation.validate_exp = false;
        validation.validate_nbf = false;

        let mut required = Vec::new();
        if let Some(issuer) = &config.issuer {
            validation.set_issuer(&[issuer]);
            required.push("iss");
        }
        match &config.audience {
            Some(audience) => {
                validation.set_audience(&[audience]);
                required.push("aud");
            }
            None => validation.validate_aud = false,
        }
        validation.set_required_spec_claims(&required);

        Self {
            validation,
            require_expiry: config.require_expiry,
            require_username: config.require_username,
        }
    }

    /// Validates a token and returns its claims.
    pub fn validate(&self, key: &VerificationKey, token: &str) -> GateResult<TokenClaims> {
        let token_data = decode::<TokenClaims>(token, key.decoding_key(), &self.validation)
            .map_err(|e| {
                debug!("Token validation failed: {}", e);
                GateError::TokenInvalid(describe(e.kind()))
            })?;
        let claims = token_data.claims;
        self.check_temporal_claims(&claims, Utc::now().timestamp())?;

        Ok(claims)
    }

    fn check_temporal_claims(&self, claims: &TokenClaims, now: i64) -> GateResult<()> {
        let leeway = self.validation.leeway;

        if claims.exp.is_none() && self.require_expiry {
            return Err(GateError::TokenInvalid(describe(&ErrorKind::MissingRequiredClaim(
                "exp".to_string(),
            ))));
        }
        if claims.is_expired(now, leeway) {
            return Err(GateError::TokenInvalid(describe(&ErrorKind::ExpiredSignature)));
        }
        if claims.not_yet_valid(now, leeway) {
            return Err(GateError::TokenInvalid(describe(&ErrorKind::ImmatureSignature)));
        }
        if claims.issued_in_future(now, leeway) {
            return Err(GateError::token_invalid("token used before issued"));
        }

        Ok(())
    }

    /// Validates a token and extracts the caller's identity.
    pub fn authenticate(&self, key: &VerificationKey, token: &str) -> GateResult<Identity> {
        let claims = self.validate(key, token)?;

        if self.require_username && !claims.has_username() {
            return Err(GateError::token_invalid("token has no username claim"));
        }

        Ok(claims.into_identity())
    }
}

fn describe(kind: &ErrorKind) -> String {
    match kind {
        ErrorKind::ExpiredSignature => "token is expired".to_string(),
        ErrorKind::ImmatureSignature => "token is not valid yet".to_string(),
        ErrorKind::InvalidSignature => "signature verification failed".to_string(),
        ErrorKind::InvalidAlgorithm => "signing algorithm not allowed for an RSA key".to_string(),
        ErrorKind::InvalidIssuer => "invalid token issuer".to_string(),
        ErrorKind::InvalidAudience => "invalid token audience".to_string(),
        ErrorKind::MissingRequiredClaim(claim) => format!("missing required claim '{}'", claim),
        ErrorKind::InvalidToken => "malformed token".to_string(),
        other => format!("{:?}", other),
    }
}

impl std::fmt::Debug for TokenAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenAuthenticator")
            .field("algorithms", &self.validation.algorithms)
            .field("leeway", &self.validation.leeway)
            .field("require_expiry", &self.require_expiry)
            .field("require_username", &self.require_username)
            .finish_non_exhaustive()
    }
}
