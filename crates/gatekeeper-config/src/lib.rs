//! # Gatekeeper Config
//!
//! Configuration management for the authentication gate.
//! Supports layered configuration from files, environment variables,
//! and runtime refresh. Everything the gate needs per call, including the
//! multi-user mode flag and the key location, is read from here once and
//! handed to the interceptor explicitly.

mod app_config;
mod loader;
mod policy;
mod validation;

pub use app_config::*;
pub use loader::*;
pub use policy::*;
pub use validation::*;
