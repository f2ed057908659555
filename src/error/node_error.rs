use thiserror::Error;

/// Node-level errors
#[derive(Debug, Error)]
pub enum NodeError {
    /// Raised by `configure` when the input specs do not satisfy the node
    /// (missing column, wrong column type, unconnected input port).
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// Raised by `validate_settings` on missing or out-of-range settings.
    #[error("Invalid settings: {0}")]
    Validation(String),
    #[error("Type mismatch in column '{column}': expected {expected}, got {actual}")]
    TypeMismatch {
        column: String,
        expected: String,
        actual: String,
    },
    #[error("Execution error: {0}")]
    Execution(String),
    /// Cooperative abort; the node observed the cancellation flag and unwound.
    #[error("Execution cancelled")]
    Cancelled,
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for NodeError {
    fn from(e: serde_json::Error) -> Self {
        NodeError::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_error_display() {
        assert_eq!(
            NodeError::Configuration("missing column 'x'".into()).to_string(),
            "Configuration error: missing column 'x'"
        );
        assert_eq!(
            NodeError::Validation("threshold must be positive".into()).to_string(),
            "Invalid settings: threshold must be positive"
        );
        assert_eq!(NodeError::Cancelled.to_string(), "Execution cancelled");
        assert_eq!(
            NodeError::TypeMismatch {
                column: "amount".into(),
                expected: "number".into(),
                actual: "string".into(),
            }
            .to_string(),
            "Type mismatch in column 'amount': expected number, got string"
        );
    }

    #[test]
    fn test_node_error_from_serde() {
        let err = serde_json::from_str::<serde_json::Value>("{{{").unwrap_err();
        let node_err: NodeError = err.into();
        assert!(matches!(node_err, NodeError::Serialization(_)));
    }
}
