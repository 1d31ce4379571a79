//! JWT claims structure.

use crate::Identity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Claims carried by tokens the gate accepts.
///
/// Registered claims are optional in the shape; which ones must be present
/// is decided by the authenticator's validation settings. Every identity
/// attribute is optional and absent unless the issuer sets it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Expiration timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,

    /// Not before timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,

    /// Issued at timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    /// Issuer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    /// Subject.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    /// JWT ID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,

    /// Username.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Account type.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub account_type: Option<String>,

    /// Organization the user belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,

    /// Avatar URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,

    /// User's email.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Country or region the user works in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_country: Option<String>,
}

impl TokenClaims {
    /// Returns the username, or an empty string when the claim is absent.
    #[must_use]
    pub fn username(&self) -> &str {
        self.username.as_deref().unwrap_or_default()
    }

    /// Returns true if the username claim is present and not blank.
    #[must_use]
    pub fn has_username(&self) -> bool {
        !self.username().trim().is_empty()
    }

    /// Returns the expiration time, if the token has one.
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|exp| DateTime::from_timestamp(exp, 0))
    }

    /// Returns true if `exp` is present and either non-positive or further
    /// in the past than `leeway_secs`.
    #[must_use]
    pub fn is_expired(&self, now: i64, leeway_secs: u64) -> bool {
        self.exp
            .is_some_and(|exp| exp <= 0 || exp < now.saturating_sub(leeway(leeway_secs)))
    }

    /// Returns true if `nbf` lies further in the future than `leeway_secs`.
    #[must_use]
    pub fn not_yet_valid(&self, now: i64, leeway_secs: u64) -> bool {
        self.nbf
            .is_some_and(|nbf| nbf > now.saturating_add(leeway(leeway_secs)))
    }

    /// Returns true if `iat` lies further in the future than `leeway_secs`.
    #[must_use]
    pub fn issued_in_future(&self, now: i64, leeway_secs: u64) -> bool {
        self.iat
            .is_some_and(|iat| iat > now.saturating_add(leeway(leeway_secs)))
    }

    /// Consumes the claims, keeping only the identity.
    #[must_use]
    pub fn into_identity(self) -> Identity {
        Identity::new(self.username.unwrap_or_default())
    }
}

fn leeway(secs: u64) -> i64 {
    i64::try_from(secs).unwrap_or(i64::MAX)
}
