//! # Gatekeeper Security
//!
//! Verification key resolution and JWT authentication for the gate:
//! where the RSA public key comes from, how it is cached, and how a raw
//! token becomes an [`Identity`].

pub mod identity;
pub mod jwt;
pub mod keys;

pub use identity::*;
pub use jwt::*;
pub use keys::*;
