//! Ordering and dependency queries over a [`WorkflowGraph`].

use std::collections::{HashMap, HashSet};

use petgraph::Direction;

use super::builder::WorkflowGraph;
use crate::error::{WorkflowError, WorkflowResult};

/// Kahn's-algorithm topological order over the explicit edge list.
///
/// Ties among unordered nodes are broken by document insertion order, so the
/// schedule is deterministic for a given document. A cycle yields
/// [`WorkflowError::CycleDetected`].
pub fn topological_order(graph: &WorkflowGraph) -> WorkflowResult<Vec<String>> {
    let ids = graph.node_ids();
    let mut in_degree: HashMap<&str, usize> = ids.iter().map(|id| (id.as_str(), 0)).collect();
    for edge in graph.edges() {
        if let Some(degree) = in_degree.get_mut(edge.target.node_id.as_str()) {
            *degree += 1;
        }
    }

    let mut order = Vec::with_capacity(ids.len());
    let mut emitted: HashSet<&str> = HashSet::new();

    while order.len() < ids.len() {
        // First not-yet-emitted node with no unresolved predecessors, in
        // insertion order.
        let next = ids
            .iter()
            .map(String::as_str)
            .find(|id| !emitted.contains(id) && in_degree[id] == 0);
        let Some(next) = next else {
            return Err(WorkflowError::CycleDetected);
        };
        emitted.insert(next);
        for edge in graph.edges() {
            if edge.source.node_id == next {
                if let Some(degree) = in_degree.get_mut(edge.target.node_id.as_str()) {
                    *degree -= 1;
                }
            }
        }
        order.push(next.to_string());
    }

    Ok(order)
}

/// The minimal upstream closure of `node_id` (all ancestors plus the node
/// itself), in topological order. This is the execution plan for "run just
/// this node and whatever it needs".
pub fn upstream_closure(graph: &WorkflowGraph, node_id: &str) -> WorkflowResult<Vec<String>> {
    let order = topological_order(graph)?;
    let closure = reachable(graph, node_id, Direction::Incoming)?;
    Ok(order.into_iter().filter(|id| closure.contains(id)).collect())
}

/// Strict descendants of `node_id` (not including the node itself).
pub fn descendants(graph: &WorkflowGraph, node_id: &str) -> WorkflowResult<HashSet<String>> {
    let mut reached = reachable(graph, node_id, Direction::Outgoing)?;
    reached.remove(node_id);
    Ok(reached)
}

fn reachable(
    graph: &WorkflowGraph,
    node_id: &str,
    direction: Direction,
) -> WorkflowResult<HashSet<String>> {
    let start = graph.node_index(node_id)?;
    let petgraph = graph.petgraph();
    let mut visited = HashSet::new();
    let mut stack = vec![start];
    while let Some(idx) = stack.pop() {
        let Some(id) = graph.node_id_at(idx) else {
            continue;
        };
        if !visited.insert(id.to_string()) {
            continue;
        }
        stack.extend(petgraph.neighbors_directed(idx, direction));
    }
    Ok(visited)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::schema::WorkflowDocument;
    use crate::node::create_default_registry;

    fn source(id: &str) -> serde_json::Value {
        serde_json::json!({ "id": id, "data": { "factoryId": "csv_source",
            "settings": {"csv": "x\n1"} } })
    }

    fn filter(id: &str) -> serde_json::Value {
        serde_json::json!({ "id": id, "data": { "factoryId": "row_filter",
            "settings": {"column": "x", "operator": "gt", "value": 0} } })
    }

    fn edge(id: &str, source: &str, target: &str) -> serde_json::Value {
        serde_json::json!({ "id": id, "source": source, "target": target })
    }

    fn graph_of(nodes: Vec<serde_json::Value>, edges: Vec<serde_json::Value>) -> WorkflowGraph {
        let doc: WorkflowDocument =
            serde_json::from_value(serde_json::json!({ "nodes": nodes, "edges": edges })).unwrap();
        WorkflowGraph::from_document(&doc, &create_default_registry()).unwrap()
    }

    #[test]
    fn test_topological_order_linear() {
        let graph = graph_of(
            vec![filter("c"), filter("b"), source("a")],
            vec![edge("e1", "a", "b"), edge("e2", "b", "c")],
        );
        assert_eq!(topological_order(&graph).unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_topological_order_tie_break_is_insertion_order() {
        // d and b are both unordered relative to each other; document order
        // decides.
        let graph = graph_of(
            vec![source("a"), filter("d"), filter("b"), filter("c")],
            vec![
                edge("e1", "a", "d"),
                edge("e2", "a", "b"),
                edge("e3", "b", "c"),
            ],
        );
        assert_eq!(
            topological_order(&graph).unwrap(),
            vec!["a", "d", "b", "c"]
        );
    }

    #[test]
    fn test_cycle_detected() {
        let graph = graph_of(
            vec![filter("a"), filter("b")],
            vec![edge("e1", "a", "b"), edge("e2", "b", "a")],
        );
        assert!(matches!(
            topological_order(&graph),
            Err(WorkflowError::CycleDetected)
        ));
    }

    #[test]
    fn test_upstream_closure() {
        // a -> b -> c, d independent
        let graph = graph_of(
            vec![source("a"), filter("b"), filter("c"), source("d")],
            vec![edge("e1", "a", "b"), edge("e2", "b", "c")],
        );
        assert_eq!(upstream_closure(&graph, "c").unwrap(), vec!["a", "b", "c"]);
        assert_eq!(upstream_closure(&graph, "d").unwrap(), vec!["d"]);
    }

    #[test]
    fn test_descendants() {
        let graph = graph_of(
            vec![source("a"), filter("b"), filter("c"), source("d")],
            vec![edge("e1", "a", "b"), edge("e2", "b", "c")],
        );
        let below_a = descendants(&graph, "a").unwrap();
        assert_eq!(
            below_a,
            ["b", "c"].iter().map(|s| s.to_string()).collect()
        );
        assert!(descendants(&graph, "c").unwrap().is_empty());
        assert!(descendants(&graph, "d").unwrap().is_empty());
    }
}
