// SPDX-License-Identifier: MIT

//! Typed error handling for graphflow-rs
//!
//! `FlowError` covers everything that can go wrong while building or running
//! a graph. `GraphError` holds the structural problems found when a graph
//! definition is turned into a `Graph`.

use thiserror::Error;

/// Top-level error type for graphflow-rs
#[derive(Debug, Error)]
pub enum FlowError {
    /// Step function not registered
    #[error("Function '{name}' not found in tool registry")]
    FunctionNotFound { name: String },

    /// Conditional edge uses an operator outside `< > <= >= == !=`
    #[error("Unknown operator: {0}")]
    UnknownOperator(String),

    /// Ordering comparison between values that have no common ordering
    #[error("Cannot evaluate {left} {op} {right}: type mismatch")]
    TypeMismatch {
        left: String,
        op: String,
        right: String,
    },

    /// Failure raised from inside a step function
    #[error("{0}")]
    Step(String),

    /// Structural problems in a graph definition
    #[error("Invalid graph: {0}")]
    Graph(#[from] GraphError),

    /// Initial state is not a JSON object
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Stored graph or run lookup failed
    #[error("{kind} '{id}' not found")]
    NotFound { kind: String, id: String },

    /// Configuration errors (bad env vars, bad flags)
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    /// Generic error wrapper
    #[error("{0}")]
    Other(String),
}

/// Structural graph errors, detected at construction time
#[derive(Debug, Error, PartialEq)]
pub enum GraphError {
    /// Two nodes share a name
    #[error("Duplicate node name: {0}")]
    DuplicateNode(String),

    /// A node has more than one outgoing edge
    #[error("Node '{0}' has more than one outgoing edge")]
    MultipleOutgoingEdges(String),
}

impl FlowError {
    /// Create a function-not-found error
    pub fn function_not_found(name: impl Into<String>) -> Self {
        Self::FunctionNotFound { name: name.into() }
    }

    /// Create a step failure
    pub fn step(message: impl Into<String>) -> Self {
        Self::Step(message.into())
    }

    /// Create a not-found error for a stored entity
    pub fn not_found(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind: kind.into(),
            id: id.into(),
        }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create from a generic error
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }
}

impl From<&str> for FlowError {
    fn from(s: &str) -> Self {
        Self::Other(s.to_string())
    }
}

impl From<String> for FlowError {
    fn from(s: String) -> Self {
        Self::Other(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_not_found_message() {
        let err = FlowError::function_not_found("lint");
        assert_eq!(
            err.to_string(),
            "Function 'lint' not found in tool registry"
        );
    }

    #[test]
    fn test_graph_error_converts() {
        let err: FlowError = GraphError::DuplicateNode("a".to_string()).into();
        assert_eq!(err.to_string(), "Invalid graph: Duplicate node name: a");
    }

    #[test]
    fn test_not_found_message() {
        let err = FlowError::not_found("Run", "abc");
        assert_eq!(err.to_string(), "Run 'abc' not found");
    }

    #[test]
    fn test_from_str() {
        let err: FlowError = "boom".into();
        assert!(matches!(err, FlowError::Other(ref m) if m == "boom"));
    }
}
