//! gRPC interceptors.

mod api_server;
mod auth;
mod status;

pub use api_server::*;
pub use auth::*;
pub use status::*;
