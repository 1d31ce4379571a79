//! Common test infrastructure for interceptor integration tests.

#![allow(dead_code)]

use chrono::{Duration, Utc};
use gatekeeper_config::AuthConfig;
use gatekeeper_grpc::{ApiServerInterceptor, CallContext};
use gatekeeper_security::TokenClaims;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use std::path::PathBuf;
use tempfile::TempDir;
use tonic::metadata::MetadataMap;

pub const SIGNING_KEY: &[u8] = include_bytes!("../../../../testdata/signing_key.pem");
pub const OTHER_SIGNING_KEY: &[u8] = include_bytes!("../../../../testdata/other_key.pem");
pub const PUBLIC_KEY: &[u8] = include_bytes!("../../../../testdata/signing_key.pub.pem");

pub const TOKEN_HEADER: &str = "x-jwt-token";
pub const METHOD: &str = "/api.v1.RunService/ListRuns";

/// Public key written to a temporary file.
///
/// The directory is removed when the value is dropped.
pub struct PublicKeyFile {
    _dir: TempDir,
    path: PathBuf,
}

impl PublicKeyFile {
    /// Writes the fixture public key to a fresh temporary directory.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("public_key.pem");
        std::fs::write(&path, PUBLIC_KEY).expect("Failed to write public key");
        Self { _dir: dir, path }
    }

    pub fn location(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }
}

/// Claims for a token that is valid for the next hour.
pub fn claims_for(username: &str) -> TokenClaims {
    let now = Utc::now();
    TokenClaims {
        exp: Some((now + Duration::hours(1)).timestamp()),
        iat: Some(now.timestamp()),
        iss: Some("sso.example.com".to_string()),
        username: Some(username.to_string()),
        email: Some(format!("{}@example.com", username)),
        ..TokenClaims::default()
    }
}

pub fn sign_with(private_key_pem: &[u8], claims: &TokenClaims) -> String {
    let key = EncodingKey::from_rsa_pem(private_key_pem).expect("Invalid signing key");
    encode(&Header::new(Algorithm::RS256), claims, &key).expect("Failed to sign token")
}

/// A valid token for `username` signed with the fixture key.
pub fn token_for(username: &str) -> String {
    sign_with(SIGNING_KEY, &claims_for(username))
}

/// Multi-user mode configuration reading the key from `location`.
pub fn auth_config(location: &str) -> AuthConfig {
    AuthConfig {
        multi_user_mode: true,
        public_key_location: location.to_string(),
        ..AuthConfig::default()
    }
}

pub fn interceptor(config: &AuthConfig) -> ApiServerInterceptor {
    ApiServerInterceptor::new(config).expect("Failed to create interceptor")
}

/// Metadata as a typical client sends it, plus the token header.
pub fn metadata_with_token(token: &str) -> MetadataMap {
    let mut metadata = MetadataMap::new();
    metadata.insert("x-request-id", "req-1".parse().unwrap());
    metadata.insert(TOKEN_HEADER, token.parse().expect("Token is not a metadata value"));
    metadata
}

pub fn context_with_token(token: &str) -> CallContext {
    CallContext::new(METHOD, metadata_with_token(token))
}
