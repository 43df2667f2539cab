use ecson_core::error::join_errors;
use ecson_core::EcsonError;
use thiserror::Error;

/// A specialized Result type for compilation and decompilation.
pub type IrResult<T> = Result<T, IrError>;

#[derive(Debug, Error)]
pub enum IrError {
    #[error("document failed validation:\n  {}", join_errors(.0))]
    InvalidDocument(Vec<EcsonError>),

    #[error("canonical IR failed validation:\n  {}", join_errors(.0))]
    InvalidIr(Vec<EcsonError>),

    #[error("wire '{wire_id}' references missing entity '{entity_id}'")]
    UnresolvedWire { wire_id: String, entity_id: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Core(#[from] EcsonError),
}
