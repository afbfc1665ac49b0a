//! Engine-level error type.

use tablekit_forms::CodecError;
use tablekit_protocol::ServiceError;
use tablekit_schema::SchemaError;
use thiserror::Error;

/// Anything an engine flow can fail with: a backend rejection, a value that
/// cannot be serialized, or a schema that fails save-time validation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("table '{slug}' is not loaded")]
    UnknownTable { slug: String },
}
