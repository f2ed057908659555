use std::collections::HashMap;

use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::Direction;
use tracing::warn;

use super::schema::{
    format_port_handle, parse_port_handle, DocumentMetadata, EdgeSchema, NodeDataSchema,
    NodeSchema, WorkflowDocument,
};
use super::types::{NodeStatus, PortRef, WorkflowEdge, WorkflowNode};
use crate::error::{WorkflowError, WorkflowResult};
use crate::node::NodeRegistry;
use crate::settings::NodeSettings;

/// Validated runtime workflow graph: rehydrated nodes, typed edges, and a
/// petgraph adjacency index for dependency queries.
///
/// Built from a persisted [`WorkflowDocument`] plus the registry. Port bounds,
/// edge endpoints and the single-producer-per-input-slot invariant are checked
/// here; acyclicity is checked when the engine loads the graph, so a
/// work-in-progress document that is temporarily cyclic can still be loaded
/// and inspected by the tool layer.
pub struct WorkflowGraph {
    nodes: Vec<WorkflowNode>,
    edges: Vec<WorkflowEdge>,
    metadata: DocumentMetadata,
    // Node weight indexes into `nodes`, edge weight into `edges`.
    graph: StableDiGraph<usize, usize>,
    index_map: HashMap<String, NodeIndex>,
}

impl std::fmt::Debug for WorkflowGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowGraph")
            .field("nodes", &self.nodes)
            .field("edges", &self.edges)
            .field("metadata", &self.metadata)
            .finish()
    }
}

impl WorkflowGraph {
    /// Rehydrate a persisted document.
    ///
    /// Every node's model is reconstructed from its `factoryId` via the
    /// registry. An unregistered type is fatal for that node only: it is
    /// loaded without a model and pre-marked `Error`, so a run skips its
    /// descendants but executes independent branches.
    pub fn from_document(
        document: &WorkflowDocument,
        registry: &NodeRegistry,
    ) -> WorkflowResult<Self> {
        let mut nodes = Vec::with_capacity(document.nodes.len());
        let mut seen = std::collections::HashSet::new();

        for schema in &document.nodes {
            if !seen.insert(schema.id.clone()) {
                return Err(WorkflowError::DuplicateNodeId(schema.id.clone()));
            }
            nodes.push(rehydrate_node(schema, registry));
        }

        let mut edges = Vec::with_capacity(document.edges.len());
        for schema in &document.edges {
            edges.push(WorkflowEdge {
                id: schema.id.clone(),
                source: PortRef::new(
                    schema.source.clone(),
                    parse_port_handle(schema.source_handle.as_deref(), "source")?,
                ),
                target: PortRef::new(
                    schema.target.clone(),
                    parse_port_handle(schema.target_handle.as_deref(), "target")?,
                ),
            });
        }

        Self::build(nodes, edges, document.metadata.clone())
    }

    fn build(
        nodes: Vec<WorkflowNode>,
        edges: Vec<WorkflowEdge>,
        metadata: DocumentMetadata,
    ) -> WorkflowResult<Self> {
        let mut graph = StableDiGraph::new();
        let mut index_map = HashMap::new();
        let mut positions = HashMap::new();

        for (position, node) in nodes.iter().enumerate() {
            let idx = graph.add_node(position);
            index_map.insert(node.id.clone(), idx);
            positions.insert(node.id.clone(), position);
        }

        let mut taken_inputs = std::collections::HashSet::new();
        for (edge_position, edge) in edges.iter().enumerate() {
            for (endpoint, limit_of) in [(&edge.source, true), (&edge.target, false)] {
                let Some(&node_position) = positions.get(&endpoint.node_id) else {
                    return Err(WorkflowError::EdgeEndpointNotFound {
                        edge_id: edge.id.clone(),
                        node_id: endpoint.node_id.clone(),
                    });
                };
                let node = &nodes[node_position];
                let limit = if limit_of { node.out_ports } else { node.in_ports };
                if endpoint.port >= limit {
                    return Err(WorkflowError::PortOutOfRange {
                        edge_id: edge.id.clone(),
                        node_id: endpoint.node_id.clone(),
                        direction: if limit_of { "source" } else { "target" },
                        port: endpoint.port,
                        limit,
                    });
                }
            }

            if !taken_inputs.insert((edge.target.node_id.clone(), edge.target.port)) {
                return Err(WorkflowError::DuplicateInputEdge {
                    node_id: edge.target.node_id.clone(),
                    port: edge.target.port,
                });
            }

            let source_idx = index_map[&edge.source.node_id];
            let target_idx = index_map[&edge.target.node_id];
            graph.add_edge(source_idx, target_idx, edge_position);
        }

        Ok(WorkflowGraph {
            nodes,
            edges,
            metadata,
            graph,
            index_map,
        })
    }

    /// Serialize back into the persisted document form.
    pub fn to_document(&self) -> WorkflowDocument {
        WorkflowDocument {
            nodes: self
                .nodes
                .iter()
                .map(|node| NodeSchema {
                    id: node.id.clone(),
                    node_kind: node.node_kind.clone(),
                    position: node.position,
                    data: NodeDataSchema {
                        label: node.label.clone(),
                        factory_id: node.type_id.clone(),
                        settings: node.settings.to_value(),
                        input_ports: node.in_ports,
                        output_ports: node.out_ports,
                        status: node.status,
                        executed: node.status == NodeStatus::Success,
                    },
                })
                .collect(),
            edges: self
                .edges
                .iter()
                .map(|edge| EdgeSchema {
                    id: edge.id.clone(),
                    source: edge.source.node_id.clone(),
                    target: edge.target.node_id.clone(),
                    source_handle: Some(format_port_handle("source", edge.source.port)),
                    target_handle: Some(format_port_handle("target", edge.target.port)),
                })
                .collect(),
            metadata: self.metadata.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node ids in document (insertion) order.
    pub fn node_ids(&self) -> Vec<String> {
        self.nodes.iter().map(|n| n.id.clone()).collect()
    }

    pub fn nodes(&self) -> &[WorkflowNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[WorkflowEdge] {
        &self.edges
    }

    pub fn node(&self, node_id: &str) -> WorkflowResult<&WorkflowNode> {
        self.position(node_id).map(|p| &self.nodes[p])
    }

    pub fn node_mut(&mut self, node_id: &str) -> WorkflowResult<&mut WorkflowNode> {
        let position = self.position(node_id)?;
        Ok(&mut self.nodes[position])
    }

    fn position(&self, node_id: &str) -> WorkflowResult<usize> {
        self.index_map
            .get(node_id)
            .and_then(|idx| self.graph.node_weight(*idx).copied())
            .ok_or_else(|| WorkflowError::NodeNotFound(node_id.to_string()))
    }

    pub(crate) fn node_index(&self, node_id: &str) -> WorkflowResult<NodeIndex> {
        self.index_map
            .get(node_id)
            .copied()
            .ok_or_else(|| WorkflowError::NodeNotFound(node_id.to_string()))
    }

    pub(crate) fn petgraph(&self) -> &StableDiGraph<usize, usize> {
        &self.graph
    }

    pub(crate) fn node_id_at(&self, idx: NodeIndex) -> Option<&str> {
        self.graph
            .node_weight(idx)
            .map(|&position| self.nodes[position].id.as_str())
    }

    /// Incoming edges of a node, ordered by target port. One entry per
    /// connected input slot.
    pub fn incoming_edges(&self, node_id: &str) -> WorkflowResult<Vec<&WorkflowEdge>> {
        let idx = self.node_index(node_id)?;
        let mut incoming: Vec<&WorkflowEdge> = self
            .graph
            .edges_directed(idx, Direction::Incoming)
            .map(|e| &self.edges[*e.weight()])
            .collect();
        incoming.sort_by_key(|e| e.target.port);
        Ok(incoming)
    }

    /// Ids of direct predecessors, in document order.
    pub fn predecessors(&self, node_id: &str) -> WorkflowResult<Vec<String>> {
        self.neighbors(node_id, Direction::Incoming)
    }

    /// Ids of direct successors, in document order.
    pub fn successors(&self, node_id: &str) -> WorkflowResult<Vec<String>> {
        self.neighbors(node_id, Direction::Outgoing)
    }

    fn neighbors(&self, node_id: &str, direction: Direction) -> WorkflowResult<Vec<String>> {
        let idx = self.node_index(node_id)?;
        let mut positions: Vec<usize> = self
            .graph
            .neighbors_directed(idx, direction)
            .filter_map(|n| self.graph.node_weight(n).copied())
            .collect();
        positions.sort_unstable();
        positions.dedup();
        Ok(positions.into_iter().map(|p| self.nodes[p].id.clone()).collect())
    }
}

fn rehydrate_node(schema: &NodeSchema, registry: &NodeRegistry) -> WorkflowNode {
    let settings = NodeSettings::from_value(schema.data.settings.clone());

    match registry.get(&schema.data.factory_id) {
        Some(factory) => {
            let model = factory.create_model();
            let (in_ports, out_ports) = (model.in_ports(), model.out_ports());
            if schema.data.input_ports != in_ports || schema.data.output_ports != out_ports {
                // The persisted arity is a cache; the factory is the source
                // of truth for code.
                warn!(
                    node_id = %schema.id,
                    factory_id = %schema.data.factory_id,
                    cached_in = schema.data.input_ports,
                    cached_out = schema.data.output_ports,
                    "persisted port arity disagrees with factory, using factory"
                );
            }
            WorkflowNode {
                id: schema.id.clone(),
                type_id: schema.data.factory_id.clone(),
                node_kind: schema.node_kind.clone(),
                label: schema.data.label.clone(),
                position: schema.position,
                settings,
                in_ports,
                out_ports,
                // Outputs are not persisted, so every node starts a fresh
                // process idle regardless of its stored status.
                status: NodeStatus::Idle,
                last_outputs: None,
                last_error: None,
                model: Some(model),
            }
        }
        None => {
            let error = WorkflowError::NodeTypeNotFound(schema.data.factory_id.clone());
            warn!(node_id = %schema.id, "{}", error);
            WorkflowNode {
                id: schema.id.clone(),
                type_id: schema.data.factory_id.clone(),
                node_kind: schema.node_kind.clone(),
                label: schema.data.label.clone(),
                position: schema.position,
                settings,
                in_ports: schema.data.input_ports,
                out_ports: schema.data.output_ports,
                status: NodeStatus::Error,
                last_outputs: None,
                last_error: Some(error.to_string()),
                model: None,
            }
        }
    }
}
