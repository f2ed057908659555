//! The persisted workflow structure and its runtime form.
//!
//! [`schema`] holds the serde mirror of the external JSON document;
//! [`WorkflowGraph`] is the validated, rehydrated runtime graph the engine
//! executes. Rehydration always goes through the [`NodeRegistry`](crate::node::NodeRegistry):
//! only the stable `factoryId` string is trusted from persisted data, never a
//! live code reference.

pub mod schema;
mod builder;
mod traversal;
mod types;

pub use builder::WorkflowGraph;
pub use traversal::{descendants, topological_order, upstream_closure};
pub use types::{NodeStatus, PortRef, Position, WorkflowEdge, WorkflowNode};
