//! # Gatekeeper Core
//!
//! Error taxonomy, result aliases and tracing setup shared by every
//! Gatekeeper crate. Errors carry their own transport classification so
//! the gRPC layer can translate them without inspecting message text.

pub mod error;
pub mod result;
pub mod telemetry;

pub use error::*;
pub use result::*;
