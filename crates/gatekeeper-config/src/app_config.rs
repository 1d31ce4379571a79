//! Application configuration structures.

use crate::{KeyRefreshFailurePolicy, MissingTokenPolicy};
use gatekeeper_core::telemetry::{LogFormat, TelemetryConfig};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Header carrying the raw token when nothing else is configured.
pub const DEFAULT_TOKEN_HEADER: &str = "x-jwt-token";

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application name and metadata.
    #[serde(default)]
    pub app: AppMetadata,

    /// Authentication gate configuration.
    #[serde(default)]
    pub auth: AuthConfig,

    /// Observability configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Application metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppMetadata {
    /// Application name.
    pub name: String,
    /// Application version.
    pub version: String,
    /// Environment (development, staging, production).
    pub environment: String,
}

impl Default for AppMetadata {
    fn default() -> Self {
        Self {
            name: "gatekeeper".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            environment: "development".to_string(),
        }
    }
}

/// Authentication gate configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Multi-user mode: when false every call passes through unauthenticated.
    pub multi_user_mode: bool,
    /// Metadata key carrying the raw token. Matched case-insensitively.
    pub token_header: String,
    /// Where the PEM public key lives: an `http(s)://` URL or a file path.
    pub public_key_location: String,
    /// Behavior when the token header is absent.
    pub missing_token_policy: MissingTokenPolicy,
    /// Upper bound for fetching the key from a remote location, in seconds.
    pub key_fetch_timeout_secs: u64,
    /// Expected `iss` claim, if any.
    pub issuer: Option<String>,
    /// Expected `aud` claim, if any.
    pub audience: Option<String>,
    /// Allowed clock skew for `exp`, `nbf` and `iat`, in seconds.
    pub clock_skew_secs: u64,
    /// Reject tokens that carry no `exp` claim.
    pub require_expiry: bool,
    /// Reject tokens whose username claim is absent or empty.
    pub require_username: bool,
    /// Verification key caching.
    pub key_cache: KeyCacheConfig,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            multi_user_mode: false,
            token_header: DEFAULT_TOKEN_HEADER.to_string(),
            public_key_location: String::new(),
            missing_token_policy: MissingTokenPolicy::default(),
            key_fetch_timeout_secs: 10,
            issuer: None,
            audience: None,
            clock_skew_secs: 0,
            require_expiry: true,
            require_username: true,
            key_cache: KeyCacheConfig::default(),
        }
    }
}

impl AuthConfig {
    /// Returns the token header normalized to a lowercase metadata key.
    #[must_use]
    pub fn token_header_key(&self) -> String {
        self.token_header.trim().to_ascii_lowercase()
    }

    /// Returns true if the key location is a remote endpoint.
    #[must_use]
    pub fn is_remote_key_location(&self) -> bool {
        self.public_key_location.starts_with("http")
    }

    /// Returns the key fetch timeout as a Duration.
    #[must_use]
    pub const fn key_fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.key_fetch_timeout_secs)
    }

    /// Returns the allowed clock skew as a Duration.
    #[must_use]
    pub const fn clock_skew(&self) -> Duration {
        Duration::from_secs(self.clock_skew_secs)
    }
}

/// Verification key cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyCacheConfig {
    /// Cache the resolved key instead of resolving it on every call.
    pub enabled: bool,
    /// How long a resolved key is served before it is resolved again.
    pub refresh_interval_secs: u64,
    /// Behavior when a refresh fails while a previous key is cached.
    pub on_refresh_failure: KeyRefreshFailurePolicy,
}

impl Default for KeyCacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            refresh_interval_secs: 300, // 5 minutes
            on_refresh_failure: KeyRefreshFailurePolicy::default(),
        }
    }
}

impl KeyCacheConfig {
    /// Returns the refresh interval as a Duration.
    #[must_use]
    pub const fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
    /// Log format (pretty, json).
    pub log_format: LogFormat,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

impl ObservabilityConfig {
    /// Builds the tracing setup for this configuration.
    #[must_use]
    pub fn telemetry(&self) -> TelemetryConfig {
        TelemetryConfig {
            filter: format!("{},gatekeeper=debug", self.log_level.to_lowercase()),
            format: self.log_format,
            ..TelemetryConfig::default()
        }
    }
}
