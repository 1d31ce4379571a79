//! # Gatekeeper gRPC
//!
//! Authentication interceptor for the API server's unary calls.
//!
//! Every call passes through [`ApiServerInterceptor`]: it logs the call,
//! runs the [`AuthGate`] when multi-user mode is on, hands the (possibly
//! augmented) [`CallContext`] to the handler and turns handler errors into
//! gRPC statuses.
//!
//! ```ignore
//! let interceptor = ApiServerInterceptor::new(&config.auth)?;
//!
//! async fn list_runs(&self, request: Request<ListRunsRequest>) -> Result<Response<ListRunsResponse>, Status> {
//!     self.interceptor
//!         .intercept_unary("/api.v1.RunService/ListRuns", request, |req| self.list_runs_inner(req))
//!         .await
//! }
//! ```

pub mod context;
pub mod interceptors;

pub use context::*;
pub use interceptors::*;
