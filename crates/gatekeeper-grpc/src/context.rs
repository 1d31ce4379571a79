//! Per-call context seen by the gate and the handler.

use gatekeeper_core::{GateError, GateResult};
use gatekeeper_security::Identity;
use tonic::metadata::{MetadataMap, MetadataValue};

/// Metadata key the authenticated username is propagated under.
pub const USER_METADATA_KEY: &str = "user";

/// Method name and incoming metadata of one call.
///
/// A context is never changed in place: augmenting it yields a new context
/// and leaves the original as it was.
#[derive(Debug, Clone)]
pub struct CallContext {
    method: String,
    metadata: Option<MetadataMap>,
}

impl CallContext {
    /// Creates a context for a call that carried metadata.
    pub fn new(method: impl Into<String>, metadata: MetadataMap) -> Self {
        Self {
            method: method.into(),
            metadata: Some(metadata),
        }
    }

    /// Creates a context for a call with no incoming metadata at all.
    pub fn without_metadata(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            metadata: None,
        }
    }

    /// Full gRPC method name, e.g. `/api.v1.RunService/ListRuns`.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Returns the incoming metadata, if the call carried any.
    #[must_use]
    pub fn incoming_metadata(&self) -> Option<&MetadataMap> {
        self.metadata.as_ref()
    }

    /// Returns a new context with the same method and different metadata.
    #[must_use]
    pub fn with_incoming_metadata(&self, metadata: MetadataMap) -> Self {
        Self::new(self.method.clone(), metadata)
    }

    /// Returns a new context whose metadata additionally carries the
    /// caller's username under [`USER_METADATA_KEY`].
    ///
    /// A `user` entry the client sent itself is replaced.
    pub fn with_user(&self, identity: &Identity) -> GateResult<Self> {
        let value = MetadataValue::try_from(identity.username()).map_err(|_| {
            GateError::token_invalid("username is not a valid metadata value")
        })?;

        let mut metadata = self.metadata.clone().unwrap_or_default();
        metadata.insert(USER_METADATA_KEY, value);
        Ok(self.with_incoming_metadata(metadata))
    }

    /// Username propagated by the gate, if any.
    #[must_use]
    pub fn user(&self) -> Option<&str> {
        self.metadata
            .as_ref()?
            .get(USER_METADATA_KEY)
            .and_then(|v| v.to_str().ok())
    }

    /// Consumes the context, returning its metadata.
    #[must_use]
    pub fn into_metadata(self) -> Option<MetadataMap> {
        self.metadata
    }
}
