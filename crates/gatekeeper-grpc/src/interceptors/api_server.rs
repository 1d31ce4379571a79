//! Unary call interceptor for the API server.

use super::{AuthGate, HandlerError};
use crate::CallContext;
use gatekeeper_config::AuthConfig;
use gatekeeper_core::GateResult;
use std::future::Future;
use std::sync::Arc;
use tonic::{Request, Response, Status};
use tracing::{error, info};

/// Wraps every unary call: logging, authentication, error translation.
///
/// Tonic's own interceptors are synchronous, while resolving the
/// verification key may need network I/O, so the interceptor wraps the
/// handler future instead of sitting in front of the service.
#[derive(Clone, Debug)]
pub struct ApiServerInterceptor {
    gate: Arc<AuthGate>,
}

impl ApiServerInterceptor {
    /// Creates an interceptor from the gate configuration.
    pub fn new(config: &AuthConfig) -> GateResult<Self> {
        Ok(Self::with_gate(AuthGate::from_config(config)?))
    }

    /// Creates an interceptor around an existing gate.
    #[must_use]
    pub fn with_gate(gate: AuthGate) -> Self {
        Self {
            gate: Arc::new(gate),
        }
    }

    /// Returns the gate calls pass through.
    #[must_use]
    pub fn gate(&self) -> &AuthGate {
        &self.gate
    }

    /// Runs `handler` for one call.
    ///
    /// The handler is only invoked once the gate admits the call, and it
    /// receives the context the gate produced. Its response is returned
    /// untouched, as is any `Status` it fails with.
    pub async fn intercept<Req, Resp, E, H, Fut>(
        &self,
        ctx: CallContext,
        request: Req,
        handler: H,
    ) -> Result<Resp, Status>
    where
        H: FnOnce(CallContext, Req) -> Fut,
        Fut: Future<Output = Result<Resp, E>>,
        E: Into<HandlerError>,
    {
        let method = ctx.method().to_string();
        info!("{} handler starting", method);

        let ctx = self.gate.authenticate(ctx).await?;

        match handler(ctx, request).await {
            Ok(response) => {
                info!("{} handler finished", method);
                Ok(response)
            }
            Err(e) => {
                let e: HandlerError = e.into();
                error!(method = %method, code = e.error_code(), "{} call failed: {}", method, e);
                Err(e.into_status())
            }
        }
    }

    /// Runs a tonic unary handler for `method`.
    ///
    /// The handler gets the request back with the gate's metadata in place
    /// of the incoming one; extensions and message are kept as they were.
    pub async fn intercept_unary<T, R, E, H, Fut>(
        &self,
        method: &str,
        request: Request<T>,
        handler: H,
    ) -> Result<Response<R>, Status>
    where
        H: FnOnce(Request<T>) -> Fut,
        Fut: Future<Output = Result<R, E>>,
        E: Into<HandlerError>,
    {
        let (metadata, extensions, message) = request.into_parts();
        let ctx = CallContext::new(method, metadata);

        self.intercept(ctx, message, move |ctx, message| {
            let metadata = ctx.into_metadata().unwrap_or_default();
            handler(Request::from_parts(metadata, extensions, message))
        })
        .await
        .map(Response::new)
    }
}
