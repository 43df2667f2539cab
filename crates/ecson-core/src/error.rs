/// Core error types for the ECSON pipeline.
use std::path::PathBuf;

/// A specialized Result type for ECSON operations.
pub type EcsonResult<T> = Result<T, EcsonError>;

/// Top-level error type shared by the document, IR and tooling crates.
#[derive(Debug, thiserror::Error)]
pub enum EcsonError {
    #[error("schema error: {message} (at {path})")]
    Schema { message: String, path: String },

    #[error("IR validation error: {0}")]
    IrValidation(String),

    #[error("registry error: {0}")]
    Registry(String),

    #[error("config error: {message} ({path:?})")]
    Config { message: String, path: PathBuf },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{0}")]
    Other(String),
}

impl EcsonError {
    /// Create a schema error located at a document path (e.g. `entities.e1.parentId`).
    pub fn schema(message: impl Into<String>, path: impl Into<String>) -> Self {
        EcsonError::Schema {
            message: message.into(),
            path: path.into(),
        }
    }

    /// Create a config error.
    pub fn config(message: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        EcsonError::Config {
            message: message.into(),
            path: path.into(),
        }
    }
}

/// Join a batch of validation errors into one line per error.
pub fn join_errors(errors: &[EcsonError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("\n  ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_error_display() {
        let err = EcsonError::schema("parent does not exist", "entities.e1.parentId");
        assert_eq!(
            err.to_string(),
            "schema error: parent does not exist (at entities.e1.parentId)"
        );
    }

    #[test]
    fn test_config_error_display() {
        let err = EcsonError::config("bad value", "/tmp/ecson.toml");
        assert!(err.to_string().contains("bad value"));
    }

    #[test]
    fn test_join_errors() {
        let errors = vec![
            EcsonError::IrValidation("a".into()),
            EcsonError::IrValidation("b".into()),
        ];
        assert_eq!(
            join_errors(&errors),
            "IR validation error: a\n  IR validation error: b"
        );
    }
}
