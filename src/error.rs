//! Error Types
//!
//! Failure taxonomy for the query engine. Unknown types and unsupported
//! projections are rejected before any provider dispatch; primary provider
//! failures abort the query; secondary enrichment failures degrade (see
//! the controller docs for the drop policy).

use crate::resource::ResourceType;
use thiserror::Error;

/// Errors surfaced by the controller entry points.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The requested type has no registered provider set.
    #[error("unknown resource type: {0}")]
    UnknownResourceType(ResourceType),

    /// A requested property is not declared by any provider for the type.
    /// Detected before dispatch; a client error, not retried.
    #[error("unsupported properties for {resource_type}: {}", properties.join(", "))]
    UnsupportedProperty {
        resource_type: ResourceType,
        properties: Vec<String>,
    },

    /// The primary resource provider failed; fatal for this call.
    #[error("resource provider failed: {0}")]
    Provider(#[from] ProviderError),
}

/// Errors raised by provider implementations.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The backend behind this provider could not be reached or answered
    /// with garbage.
    #[error("backend request failed: {message}")]
    Backend { message: String },

    /// The provider does not implement this operation.
    #[error("operation not supported: {operation}")]
    Unsupported { operation: &'static str },

    #[error("inventory read failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed inventory: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl ProviderError {
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }
}
