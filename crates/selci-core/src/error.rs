//! Domain-level error taxonomy for selci.

use std::path::PathBuf;

/// selci domain errors.
#[derive(Debug, thiserror::Error)]
pub enum SelciError {
    #[error("invalid workflow definition: {0}")]
    InvalidWorkflow(String),

    #[error("unknown component: {0}")]
    UnknownComponent(String),

    #[error("component path does not exist in the repository: {0}")]
    ComponentPathMissing(PathBuf),

    #[error("cannot resolve reference '{reference}': {message}")]
    RefResolution { reference: String, message: String },

    #[error("git error: {0}")]
    GitError(String),

    #[error("cache key input not found: {0}")]
    CacheInputMissing(PathBuf),

    #[error("invalid tag pattern '{pattern}': {source}")]
    InvalidTagPattern {
        pattern: String,
        source: regex::Error,
    },

    #[error("workflow file error: {0}")]
    WorkflowParse(#[from] toml::de::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for selci domain operations.
pub type Result<T> = std::result::Result<T, SelciError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SelciError::InvalidWorkflow("components cannot be empty".to_string());
        assert!(err.to_string().contains("invalid workflow definition"));

        let err = SelciError::ComponentPathMissing(PathBuf::from("dsl"));
        assert!(err.to_string().contains("does not exist"));

        let err = SelciError::RefResolution {
            reference: "main".to_string(),
            message: "unknown revision".to_string(),
        };
        assert!(err.to_string().contains("main"));
        assert!(err.to_string().contains("unknown revision"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: SelciError = io.into();
        assert!(matches!(err, SelciError::Io(_)));
    }
}
