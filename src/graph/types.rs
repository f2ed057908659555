use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::node::NodeModel;
use crate::settings::NodeSettings;
use crate::table::DataTable;

/// Per-run status of a node instance.
///
/// `idle → running → {success | error}`; `skipped` marks a node whose inputs
/// depend on a failed ancestor. A manual reset returns a node to `idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    #[default]
    Idle,
    Running,
    Success,
    Error,
    Skipped,
}

/// Canvas position, carried through persistence for the host UI.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// A `(node, port)` endpoint, parsed once from the persisted handle strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PortRef {
    pub node_id: String,
    pub port: usize,
}

impl PortRef {
    pub fn new(node_id: impl Into<String>, port: usize) -> Self {
        PortRef {
            node_id: node_id.into(),
            port,
        }
    }
}

/// A directed connection from one output port to one input port.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowEdge {
    pub id: String,
    pub source: PortRef,
    pub target: PortRef,
}

/// One configured node instance in the graph.
///
/// `model` is rehydrated from `type_id` via the registry; it is `None` only
/// when the type is not registered, in which case the node is pre-marked
/// `Error` and its descendants will be skipped. Status and outputs are
/// mutated exclusively by the execution engine.
pub struct WorkflowNode {
    pub id: String,
    pub type_id: String,
    /// Host-side render kind, carried through persistence untouched.
    pub node_kind: String,
    pub label: String,
    pub position: Position,
    pub settings: NodeSettings,
    pub in_ports: usize,
    pub out_ports: usize,
    pub status: NodeStatus,
    pub last_outputs: Option<Vec<Arc<DataTable>>>,
    pub last_error: Option<String>,
    pub(crate) model: Option<Box<dyn NodeModel>>,
}

impl WorkflowNode {
    /// Return to `Idle`, clearing outputs and error.
    pub fn reset(&mut self) {
        self.status = NodeStatus::Idle;
        self.last_outputs = None;
        self.last_error = None;
    }

    /// Output table at the given port, if the node has run successfully.
    pub fn output(&self, port: usize) -> Option<Arc<DataTable>> {
        self.last_outputs
            .as_ref()
            .and_then(|outputs| outputs.get(port).cloned())
    }

    pub(crate) fn model(&self) -> Option<&dyn NodeModel> {
        self.model.as_deref()
    }

    pub(crate) fn model_mut(&mut self) -> Option<&mut (dyn NodeModel + 'static)> {
        self.model.as_deref_mut()
    }
}

impl std::fmt::Debug for WorkflowNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowNode")
            .field("id", &self.id)
            .field("type_id", &self.type_id)
            .field("in_ports", &self.in_ports)
            .field("out_ports", &self.out_ports)
            .field("status", &self.status)
            .field("has_model", &self.model.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_status_serde_lowercase() {
        assert_eq!(
            serde_json::to_string(&NodeStatus::Success).unwrap(),
            "\"success\""
        );
        let s: NodeStatus = serde_json::from_str("\"skipped\"").unwrap();
        assert_eq!(s, NodeStatus::Skipped);
        assert_eq!(NodeStatus::default(), NodeStatus::Idle);
    }
}
