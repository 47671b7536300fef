//! Error types for document loading.

use thiserror::Error;

/// Errors raised while loading or serializing a document.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The document JSON was malformed or did not match the schema.
    #[error("invalid document JSON: {0}")]
    Json(#[source] serde_json::Error),
}
