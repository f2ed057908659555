//! Serde mirror of the persisted workflow JSON document.
//!
//! Nodes carry `data.factoryId` (the stable type id) plus an opaque
//! `data.settings` blob and cached port arities; edges encode ports as
//! `"source-<N>"` / `"target-<N>"` handle strings. Handles are parsed exactly
//! once, at load time, into typed [`PortRef`](super::PortRef) pairs; the
//! scheduler never re-parses strings.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::types::{NodeStatus, Position};
use crate::error::WorkflowError;

pub const DOCUMENT_VERSION: &str = "1.0";

/// Top-level persisted document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowDocument {
    pub nodes: Vec<NodeSchema>,
    pub edges: Vec<EdgeSchema>,
    #[serde(default)]
    pub metadata: DocumentMetadata,
}

impl WorkflowDocument {
    pub fn from_json(content: &str) -> Result<Self, WorkflowError> {
        serde_json::from_str(content).map_err(|e| WorkflowError::DocumentParse(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, WorkflowError> {
        serde_json::to_string_pretty(self).map_err(|e| WorkflowError::Internal(e.to_string()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub version: String,
}

impl Default for DocumentMetadata {
    fn default() -> Self {
        DocumentMetadata {
            version: DOCUMENT_VERSION.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSchema {
    pub id: String,
    /// Host-side render kind; opaque to the engine.
    #[serde(rename = "type", default = "default_node_kind")]
    pub node_kind: String,
    #[serde(default)]
    pub position: Position,
    pub data: NodeDataSchema,
}

fn default_node_kind() -> String {
    "customNode".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeDataSchema {
    #[serde(default)]
    pub label: String,
    #[serde(rename = "factoryId")]
    pub factory_id: String,
    /// Opaque settings blob, meaningful only to the node type.
    #[serde(default)]
    pub settings: Value,
    /// Cached arity; recomputed from the factory on load as a consistency
    /// check.
    #[serde(rename = "inputPorts", default)]
    pub input_ports: usize,
    #[serde(rename = "outputPorts", default)]
    pub output_ports: usize,
    #[serde(default)]
    pub status: NodeStatus,
    #[serde(default)]
    pub executed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeSchema {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(rename = "sourceHandle", default)]
    pub source_handle: Option<String>,
    #[serde(rename = "targetHandle", default)]
    pub target_handle: Option<String>,
}

/// Parse a `"<prefix>-<N>"` handle into a port index. A missing handle means
/// port 0 (single-port nodes omit handles).
pub fn parse_port_handle(
    handle: Option<&str>,
    expected_prefix: &'static str,
) -> Result<usize, WorkflowError> {
    let Some(handle) = handle else {
        return Ok(0);
    };
    let malformed = || WorkflowError::InvalidHandle {
        handle: handle.to_string(),
        expected_prefix,
    };
    let port = handle
        .strip_prefix(expected_prefix)
        .and_then(|rest| rest.strip_prefix('-'))
        .ok_or_else(malformed)?;
    port.parse::<usize>().map_err(|_| malformed())
}

/// Render a port index back into its persisted handle string.
pub fn format_port_handle(prefix: &str, port: usize) -> String {
    format!("{}-{}", prefix, port)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_document() {
        let json = r#"{
          "nodes": [
            { "id": "n1", "type": "customNode", "position": {"x": 0, "y": 0},
              "data": { "label": "Filter", "factoryId": "row_filter",
                        "settings": {"column": "amount"},
                        "inputPorts": 1, "outputPorts": 1,
                        "status": "idle", "executed": false } }
          ],
          "edges": [
            { "id": "e1", "source": "n1", "target": "n2",
              "sourceHandle": "source-0", "targetHandle": "target-0" }
          ],
          "metadata": { "version": "1.0" }
        }"#;
        let doc = WorkflowDocument::from_json(json).unwrap();
        assert_eq!(doc.nodes.len(), 1);
        assert_eq!(doc.nodes[0].data.factory_id, "row_filter");
        assert_eq!(doc.nodes[0].data.input_ports, 1);
        assert_eq!(doc.edges[0].source_handle.as_deref(), Some("source-0"));
        assert_eq!(doc.metadata.version, "1.0");
    }

    #[test]
    fn test_parse_document_defaults() {
        let json = r#"{
          "nodes": [ { "id": "n1", "data": { "factoryId": "csv_source" } } ],
          "edges": []
        }"#;
        let doc = WorkflowDocument::from_json(json).unwrap();
        assert_eq!(doc.nodes[0].node_kind, "customNode");
        assert_eq!(doc.nodes[0].data.status, NodeStatus::Idle);
        assert_eq!(doc.metadata.version, DOCUMENT_VERSION);
    }

    #[test]
    fn test_parse_invalid_document() {
        assert!(matches!(
            WorkflowDocument::from_json("{{{"),
            Err(WorkflowError::DocumentParse(_))
        ));
    }

    #[test]
    fn test_parse_port_handle() {
        assert_eq!(parse_port_handle(Some("source-0"), "source").unwrap(), 0);
        assert_eq!(parse_port_handle(Some("target-12"), "target").unwrap(), 12);
        assert_eq!(parse_port_handle(None, "source").unwrap(), 0);
    }

    #[test]
    fn test_parse_port_handle_malformed() {
        for bad in ["source", "source-", "source-x", "target-0", "src-0"] {
            assert!(
                parse_port_handle(Some(bad), "source").is_err(),
                "expected rejection of {:?}",
                bad
            );
        }
    }

    #[test]
    fn test_format_port_handle() {
        assert_eq!(format_port_handle("source", 2), "source-2");
    }
}
