//! JWT validation.

mod authenticator;
mod claims;

pub use authenticator::*;
pub use claims::*;
