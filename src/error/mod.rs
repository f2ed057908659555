//! Error taxonomy for the dataflow engine.
//!
//! Two levels mirror the two failure scopes: [`NodeError`] for anything that
//! goes wrong inside a single node (configuration, settings validation,
//! execution, cancellation), and [`WorkflowError`] for graph-level problems
//! (cycles, unknown node types, malformed documents). Node failures never
//! abort a run; they mark the node `Error` and skip its descendants.

mod node_error;
mod workflow_error;

pub use node_error::NodeError;
pub use workflow_error::WorkflowError;

/// Convenience alias for workflow-level results.
pub type WorkflowResult<T> = Result<T, WorkflowError>;
