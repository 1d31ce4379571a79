//! Integration tests for the API server interceptor.
//!
//! Tokens are signed with the RSA fixtures under `testdata/`; the public key
//! is served from a temporary file or a mock HTTP endpoint.

mod common;

use chrono::Utc;
use common::*;
use gatekeeper_config::{AuthConfig, KeyCacheConfig, MissingTokenPolicy};
use gatekeeper_core::GateError;
use gatekeeper_grpc::{ApiServerInterceptor, CallContext, USER_METADATA_KEY};
use std::sync::atomic::{AtomicUsize, Ordering};
use tonic::metadata::{AsciiMetadataValue, MetadataMap};
use tonic::{Code, Request};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Handler that records how often it ran and echoes the user it saw.
struct EchoHandler {
    calls: AtomicUsize,
}

impl EchoHandler {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }

    async fn handle(&self, ctx: CallContext, request: &str) -> Result<String, GateError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("{}:{}", ctx.user().unwrap_or("anonymous"), request))
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

async fn call(
    interceptor: &ApiServerInterceptor,
    handler: &EchoHandler,
    ctx: CallContext,
) -> Result<String, tonic::Status> {
    interceptor
        .intercept(ctx, "list", |ctx, req| handler.handle(ctx, req))
        .await
}

async fn key_server(expected_fetches: u64) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/public_key"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(PUBLIC_KEY))
        .expect(expected_fetches)
        .mount(&server)
        .await;
    server
}

// =============================================================================
// Gate outcomes
// =============================================================================

#[tokio::test]
async fn test_missing_metadata_is_unauthenticated() {
    let key = PublicKeyFile::new();
    let interceptor = interceptor(&auth_config(&key.location()));
    let handler = EchoHandler::new();

    let status = call(&interceptor, &handler, CallContext::without_metadata(METHOD))
        .await
        .unwrap_err();

    assert_eq!(status.code(), Code::Unauthenticated);
    assert_eq!(handler.calls(), 0);
}

#[tokio::test]
async fn test_missing_token_is_anonymous_under_permissive_policy() {
    let key = PublicKeyFile::new();
    let interceptor = interceptor(&auth_config(&key.location()));
    let handler = EchoHandler::new();

    let mut metadata = MetadataMap::new();
    metadata.insert("x-request-id", "req-1".parse().unwrap());

    let response = interceptor
        .intercept(CallContext::new(METHOD, metadata), (), |ctx, ()| async move {
            let metadata = ctx.incoming_metadata().unwrap();
            assert!(metadata.get(USER_METADATA_KEY).is_none());
            assert_eq!(metadata.get("x-request-id").unwrap(), "req-1");
            Ok::<_, GateError>("ok")
        })
        .await
        .unwrap();
    assert_eq!(response, "ok");

    let response = call(&interceptor, &handler, CallContext::new(METHOD, MetadataMap::new()))
        .await
        .unwrap();
    assert_eq!(response, "anonymous:list");
}

#[tokio::test]
async fn test_missing_token_is_rejected_under_strict_policy() {
    let key = PublicKeyFile::new();
    let config = AuthConfig {
        missing_token_policy: MissingTokenPolicy::Strict,
        ..auth_config(&key.location())
    };
    let interceptor = interceptor(&config);
    let handler = EchoHandler::new();

    let status = call(&interceptor, &handler, CallContext::new(METHOD, MetadataMap::new()))
        .await
        .unwrap_err();

    assert_eq!(status.code(), Code::InvalidArgument);
    assert_eq!(status.message(), "missing 'x-jwt-token' header");
    assert_eq!(handler.calls(), 0);
}

#[tokio::test]
async fn test_whitespace_token_is_empty() {
    let key = PublicKeyFile::new();
    let interceptor = interceptor(&auth_config(&key.location()));
    let handler = EchoHandler::new();

    let status = call(&interceptor, &handler, context_with_token("   "))
        .await
        .unwrap_err();

    assert_eq!(status.code(), Code::InvalidArgument);
    assert_eq!(status.message(), "empty 'x-jwt-token' header");
    assert_eq!(handler.calls(), 0);
}

#[tokio::test]
async fn test_valid_token_propagates_username() {
    let key = PublicKeyFile::new();
    let interceptor = interceptor(&auth_config(&key.location()));
    let original = context_with_token(&token_for("alice"));

    let response = interceptor
        .intercept(original.clone(), 42_u64, |ctx, req| async move {
            let metadata = ctx.incoming_metadata().unwrap();
            assert_eq!(metadata.get(USER_METADATA_KEY).unwrap(), "alice");
            assert_eq!(metadata.get("x-request-id").unwrap(), "req-1");
            assert!(metadata.get(TOKEN_HEADER).is_some());
            Ok::<_, GateError>(vec![req, req + 1])
        })
        .await
        .unwrap();

    assert_eq!(response, vec![42, 43]);
    assert!(original.user().is_none());
}

#[tokio::test]
async fn test_foreign_signature_is_invalid_argument() {
    let key = PublicKeyFile::new();
    let interceptor = interceptor(&auth_config(&key.location()));
    let handler = EchoHandler::new();

    let forged = sign_with(OTHER_SIGNING_KEY, &claims_for("mallory"));
    let status = call(&interceptor, &handler, context_with_token(&forged))
        .await
        .unwrap_err();

    assert_eq!(status.code(), Code::InvalidArgument);
    assert!(status.message().contains("signature verification failed"));
    assert_eq!(handler.calls(), 0);
}

#[tokio::test]
async fn test_expired_token_is_invalid_argument() {
    let key = PublicKeyFile::new();
    let interceptor = interceptor(&auth_config(&key.location()));
    let handler = EchoHandler::new();

    let mut claims = claims_for("alice");
    claims.iat = Some(Utc::now().timestamp() - 7200);
    claims.exp = Some(Utc::now().timestamp() - 3600);

    let status = call(&interceptor, &handler, context_with_token(&sign_with(SIGNING_KEY, &claims)))
        .await
        .unwrap_err();

    assert_eq!(status.code(), Code::InvalidArgument);
    assert!(status.message().contains("expired"));
    assert_eq!(handler.calls(), 0);
}

#[tokio::test]
async fn test_client_supplied_user_is_replaced() {
    let key = PublicKeyFile::new();
    let interceptor = interceptor(&auth_config(&key.location()));
    let handler = EchoHandler::new();

    let mut metadata = metadata_with_token(&token_for("alice"));
    metadata.insert(USER_METADATA_KEY, "admin".parse().unwrap());

    let response = call(&interceptor, &handler, CallContext::new(METHOD, metadata))
        .await
        .unwrap();
    assert_eq!(response, "alice:list");
}

#[tokio::test]
async fn test_single_user_mode_skips_authentication() {
    let config = AuthConfig {
        multi_user_mode: false,
        ..auth_config("/nonexistent/public_key.pem")
    };
    let interceptor = interceptor(&config);
    let handler = EchoHandler::new();

    let response = call(&interceptor, &handler, context_with_token("not-a-jwt"))
        .await
        .unwrap();
    assert_eq!(response, "anonymous:list");

    let response = call(&interceptor, &handler, CallContext::without_metadata(METHOD))
        .await
        .unwrap();
    assert_eq!(response, "anonymous:list");
    assert_eq!(handler.calls(), 2);
}

#[tokio::test]
async fn test_first_token_header_value_is_used() {
    let key = PublicKeyFile::new();
    let interceptor = interceptor(&auth_config(&key.location()));
    let handler = EchoHandler::new();

    let mut metadata = metadata_with_token(&token_for("alice"));
    metadata.append(TOKEN_HEADER, "garbage".parse().unwrap());
    let response = call(&interceptor, &handler, CallContext::new(METHOD, metadata))
        .await
        .unwrap();
    assert_eq!(response, "alice:list");

    let mut metadata = MetadataMap::new();
    metadata.insert(TOKEN_HEADER, "garbage".parse().unwrap());
    metadata.append(TOKEN_HEADER, token_for("bob").parse().unwrap());
    let status = call(&interceptor, &handler, CallContext::new(METHOD, metadata))
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::InvalidArgument);
    assert!(status.message().starts_with("token not valid"));
    assert_eq!(handler.calls(), 1);
}

#[tokio::test]
async fn test_non_ascii_token_is_invalid_argument() {
    let key = PublicKeyFile::new();
    let interceptor = interceptor(&auth_config(&key.location()));
    let handler = EchoHandler::new();

    let mut metadata = MetadataMap::new();
    metadata.insert(
        TOKEN_HEADER,
        AsciiMetadataValue::try_from(&b"\xfftoken"[..]).unwrap(),
    );

    let status = call(&interceptor, &handler, CallContext::new(METHOD, metadata))
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::InvalidArgument);
    assert_eq!(status.message(), "token not valid: token header is not valid ASCII");
    assert_eq!(handler.calls(), 0);
}

// =============================================================================
// Key resolution
// =============================================================================

#[tokio::test]
async fn test_remote_key_is_resolved_on_every_call() {
    let server = key_server(3).await;
    let interceptor = interceptor(&auth_config(&format!("{}/auth/public_key", server.uri())));
    let handler = EchoHandler::new();

    for _ in 0..3 {
        let response = call(&interceptor, &handler, context_with_token(&token_for("bob")))
            .await
            .unwrap();
        assert_eq!(response, "bob:list");
    }
}

#[tokio::test]
async fn test_cached_remote_key_is_resolved_once() {
    let server = key_server(1).await;
    let config = AuthConfig {
        key_cache: KeyCacheConfig {
            enabled: true,
            ..KeyCacheConfig::default()
        },
        ..auth_config(&format!("{}/auth/public_key", server.uri()))
    };
    let interceptor = interceptor(&config);
    let handler = EchoHandler::new();

    for user in ["alice", "bob", "carol"] {
        let response = call(&interceptor, &handler, context_with_token(&token_for(user)))
            .await
            .unwrap();
        assert_eq!(response, format!("{}:list", user));
    }
}

#[tokio::test]
async fn test_unreachable_key_endpoint_never_reaches_handler() {
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let config = AuthConfig {
        key_fetch_timeout_secs: 2,
        ..auth_config(&format!("http://127.0.0.1:{}/auth/public_key", port))
    };
    let interceptor = interceptor(&config);
    let handler = EchoHandler::new();

    let status = call(&interceptor, &handler, context_with_token(&token_for("alice")))
        .await
        .unwrap_err();

    assert_eq!(status.code(), Code::InvalidArgument);
    assert_eq!(handler.calls(), 0);
}

#[tokio::test]
async fn test_key_endpoint_error_status_never_reaches_handler() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let interceptor = interceptor(&auth_config(&server.uri()));
    let handler = EchoHandler::new();

    let status = call(&interceptor, &handler, context_with_token(&token_for("alice")))
        .await
        .unwrap_err();

    assert_eq!(status.code(), Code::InvalidArgument);
    assert_eq!(handler.calls(), 0);
}

#[tokio::test]
async fn test_same_token_gives_same_identity() {
    let key = PublicKeyFile::new();
    let interceptor = interceptor(&auth_config(&key.location()));
    let handler = EchoHandler::new();
    let token = token_for("dave");

    let first = call(&interceptor, &handler, context_with_token(&token)).await.unwrap();
    let second = call(&interceptor, &handler, context_with_token(&token)).await.unwrap();
    assert_eq!(first, second);
}

// =============================================================================
// Handler results
// =============================================================================

#[tokio::test]
async fn test_handler_failure_is_translated() {
    let key = PublicKeyFile::new();
    let interceptor = interceptor(&auth_config(&key.location()));

    let status = interceptor
        .intercept(context_with_token(&token_for("alice")), "r-9", |ctx, run_id| async move {
            assert_eq!(ctx.user(), Some("alice"));
            Err::<(), _>(GateError::forbidden(format!("run {} belongs to another namespace", run_id)))
        })
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::PermissionDenied);

    let status = interceptor
        .intercept(context_with_token(&token_for("alice")), (), |_, ()| async {
            Err::<(), _>(GateError::internal("database connection lost"))
        })
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::Internal);
    assert!(status.message().contains("database connection lost"));
}

#[tokio::test]
async fn test_tonic_request_round_trip() {
    let key = PublicKeyFile::new();
    let interceptor = interceptor(&auth_config(&key.location()));

    let mut request = Request::new("run-7".to_string());
    *request.metadata_mut() = metadata_with_token(&token_for("erin"));

    let response = interceptor
        .intercept_unary(METHOD, request, |req| async move {
            let user = req
                .metadata()
                .get(USER_METADATA_KEY)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            Ok::<_, GateError>((user, req.into_inner()))
        })
        .await
        .unwrap();

    assert_eq!(response.into_inner(), (Some("erin".to_string()), "run-7".to_string()));
}

#[tokio::test]
async fn test_tonic_request_rejected() {
    let key = PublicKeyFile::new();
    let interceptor = interceptor(&auth_config(&key.location()));

    let mut request = Request::new(());
    request.metadata_mut().insert(TOKEN_HEADER, "".parse().unwrap());

    let status = interceptor
        .intercept_unary(METHOD, request, |_| async { Ok::<_, GateError>(()) })
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::InvalidArgument);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_calls_keep_their_own_identity() {
    let key = PublicKeyFile::new();
    let interceptor = interceptor(&auth_config(&key.location()));
    let handler = EchoHandler::new();

    let users: Vec<String> = (0..16).map(|i| format!("user-{}", i)).collect();
    let calls = users
        .iter()
        .map(|user| call(&interceptor, &handler, context_with_token(&token_for(user))));
    let responses = futures::future::join_all(calls).await;

    for (user, response) in users.iter().zip(responses) {
        assert_eq!(response.unwrap(), format!("{}:list", user));
    }
    assert_eq!(handler.calls(), 16);
}
