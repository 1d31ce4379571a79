//! Configuration validation module.
//!
//! Provides validation for all configuration values, failing fast on
//! invalid configuration rather than on the first authenticated call.

use crate::AppConfig;
use std::fmt;
use url::Url;

/// Configuration validation error variants.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValidationError {
    /// Multi-user mode is on but no key location is configured.
    MissingKeyLocation,
    /// URL format is invalid.
    InvalidUrl { url_type: String, message: String },
    /// Token header is not a usable ASCII metadata key.
    InvalidHeaderName { value: String },
    /// Timeout value must be positive.
    NonPositiveTimeout { name: String, value: u64 },
    /// Clock skew exceeds the allowed maximum.
    ClockSkewTooLarge { value: u64, maximum: u64 },
    /// Log level is invalid.
    InvalidLogLevel { value: String },
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingKeyLocation => {
                write!(f, "Public key location required when multi-user mode is enabled")
            }
            Self::InvalidUrl { url_type, message } => {
                write!(f, "Invalid {} URL: {}", url_type, message)
            }
            Self::InvalidHeaderName { value } => {
                write!(
                    f,
                    "Invalid token header '{}' (must be a non-binary ASCII metadata key)",
                    value
                )
            }
            Self::NonPositiveTimeout { name, value } => {
                write!(f, "Timeout '{}' must be positive, got {}", name, value)
            }
            Self::ClockSkewTooLarge { value, maximum } => {
                write!(
                    f,
                    "Clock skew {}s exceeds maximum allowed ({}s)",
                    value, maximum
                )
            }
            Self::InvalidLogLevel { value } => {
                write!(
                    f,
                    "Invalid log level: '{}' (valid: trace, debug, info, warn, error)",
                    value
                )
            }
        }
    }
}

impl std::error::Error for ConfigValidationError {}

/// Result of configuration validation containing all errors found.
#[derive(Debug)]
pub struct ValidationResult {
    errors: Vec<ConfigValidationError>,
}

impl ValidationResult {
    fn new() -> Self {
        Self { errors: Vec::new() }
    }

    fn add_error(&mut self, error: ConfigValidationError) {
        self.errors.push(error);
    }

    /// Converts to Result, returning Err with all errors if any exist.
    pub fn into_result(self) -> Result<(), Vec<ConfigValidationError>> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Maximum tolerated clock skew (10 minutes).
    const MAX_CLOCK_SKEW_SECS: u64 = 600;
    /// Valid log levels.
    const VALID_LOG_LEVELS: &'static [&'static str] = &["trace", "debug", "info", "warn", "error"];

    /// Validates the entire application configuration.
    ///
    /// Returns Ok(()) if valid, or Err with all validation errors found.
    pub fn validate(config: &AppConfig) -> Result<(), Vec<ConfigValidationError>> {
        let mut result = ValidationResult::new();

        Self::validate_auth(&config.auth, &mut result);
        Self::validate_observability(&config.observability, &mut result);

        result.into_result()
    }

    /// Validates authentication gate configuration.
    fn validate_auth(config: &crate::AuthConfig, result: &mut ValidationResult) {
        let header = config.token_header_key();
        let header_ok = !header.is_empty()
            && !header.ends_with("-bin")
            && header
                .bytes()
                .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || matches!(b, b'-' | b'_' | b'.'));
        if !header_ok {
            result.add_error(ConfigValidationError::InvalidHeaderName {
                value: config.token_header.clone(),
            });
        }

        if config.clock_skew_secs > Self::MAX_CLOCK_SKEW_SECS {
            result.add_error(ConfigValidationError::ClockSkewTooLarge {
                value: config.clock_skew_secs,
                maximum: Self::MAX_CLOCK_SKEW_SECS,
            });
        }

        if config.key_cache.enabled && config.key_cache.refresh_interval_secs == 0 {
            result.add_error(ConfigValidationError::NonPositiveTimeout {
                name: "auth.key_cache.refresh_interval_secs".to_string(),
                value: 0,
            });
        }

        // The key is only consulted in multi-user mode
        if !config.multi_user_mode {
            return;
        }

        let location = config.public_key_location.trim();
        if location.is_empty() {
            result.add_error(ConfigValidationError::MissingKeyLocation);
            return;
        }

        if config.is_remote_key_location() {
            if let Err(e) = Url::parse(location) {
                result.add_error(ConfigValidationError::InvalidUrl {
                    url_type: "public_key_location".to_string(),
                    message: format!("{}: {}", location, e),
                });
            }
            if config.key_fetch_timeout_secs == 0 {
                result.add_error(ConfigValidationError::NonPositiveTimeout {
                    name: "auth.key_fetch_timeout_secs".to_string(),
                    value: 0,
                });
            }
        }
    }

    /// Validates observability configuration.
    fn validate_observability(config: &crate::ObservabilityConfig, result: &mut ValidationResult) {
        let level = config.log_level.to_lowercase();
        if !Self::VALID_LOG_LEVELS.contains(&level.as_str()) {
            result.add_error(ConfigValidationError::InvalidLogLevel {
                value: config.log_level.clone(),
            });
        }
    }
}

/// Formats validation errors for display.
pub fn format_validation_errors(errors: &[ConfigValidationError]) -> String {
    let mut output = String::from("Configuration validation failed:\n");
    for (i, error) in errors.iter().enumerate() {
        output.push_str(&format!("  {}. {}\n", i + 1, error));
    }
    output
}
