//! Workflow-level error types.

use super::NodeError;
use thiserror::Error;

/// Workflow-level errors
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Workflow document parse error: {0}")]
    DocumentParse(String),
    #[error("Graph build error: {0}")]
    GraphBuild(String),
    #[error("Cycle detected in graph")]
    CycleDetected,
    #[error("Node not found: {0}")]
    NodeNotFound(String),
    #[error("Node type not registered: {0}")]
    NodeTypeNotFound(String),
    #[error("Duplicate node ID: {0}")]
    DuplicateNodeId(String),
    #[error("Edge '{edge_id}' references unknown node: {node_id}")]
    EdgeEndpointNotFound { edge_id: String, node_id: String },
    #[error(
        "Edge '{edge_id}': {direction} port {port} out of range for node '{node_id}' ({limit} ports declared)"
    )]
    PortOutOfRange {
        edge_id: String,
        node_id: String,
        direction: &'static str,
        port: usize,
        limit: usize,
    },
    #[error("Input port {port} of node '{node_id}' has more than one incoming edge")]
    DuplicateInputEdge { node_id: String, port: usize },
    #[error("Malformed port handle '{handle}': expected '{expected_prefix}-<N>'")]
    InvalidHandle {
        handle: String,
        expected_prefix: &'static str,
    },
    #[error("No workflow loaded")]
    NoWorkflow,
    #[error("Node error: {0}")]
    Node(#[from] NodeError),
    #[error("Internal error: {0}")]
    Internal(String),
}
