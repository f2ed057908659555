//! The workflow execution engine.
//!
//! [`WorkflowExecutionEngine`] drives a validated [`WorkflowGraph`] through a
//! run: nodes execute one at a time in a deterministic topological order,
//! each seeing only the outputs of predecessors that reached `Success`. A
//! node failure is node-scoped: strict descendants are reported `Skipped`
//! while independent branches keep running, and the run always completes with a
//! full per-node [`RunReport`]. Results leave the engine exclusively through
//! the synchronous status callback.

mod report;

pub use report::{NodeRunRecord, RunReport};

use std::sync::Arc;

use tracing::debug;

use crate::context::{
    CancellationSignal, DashboardItem, EngineEvent, EventEmitter, ExecutionContext, StatusEvent,
};
use crate::error::{NodeError, WorkflowError, WorkflowResult};
use crate::graph::{descendants, topological_order, upstream_closure, NodeStatus, WorkflowGraph};
use crate::table::{DataTable, DataTableSpec};

enum Outcome {
    Success {
        outputs: Vec<Arc<DataTable>>,
        dashboard_items: Vec<DashboardItem>,
    },
    Failed(String),
    Blocked {
        upstream: String,
    },
    Cancelled,
}

/// Dependency-aware scheduler for a loaded workflow graph.
pub struct WorkflowExecutionEngine {
    graph: Option<WorkflowGraph>,
    order: Vec<String>,
    emitter: Option<EventEmitter>,
    cancellation: CancellationSignal,
}

impl WorkflowExecutionEngine {
    pub fn new() -> Self {
        WorkflowExecutionEngine {
            graph: None,
            order: Vec::new(),
            emitter: None,
            cancellation: CancellationSignal::new(),
        }
    }

    /// Install the status callback. Invoked synchronously around every node
    /// transition and for every progress update, in production order; this is
    /// the only channel through which node results escape the engine.
    pub fn set_status_callback(&mut self, callback: impl FnMut(EngineEvent) + Send + 'static) {
        self.emitter = Some(EventEmitter::new(callback));
    }

    /// Clone of the run-scoped cancellation flag, for the host to trigger.
    pub fn cancellation_signal(&self) -> CancellationSignal {
        self.cancellation.clone()
    }

    /// Load and validate a graph: rejects cycles up front and fixes the
    /// topological execution order (document-order ties).
    pub fn set_workflow(&mut self, graph: WorkflowGraph) -> WorkflowResult<()> {
        let order = topological_order(&graph)?;
        debug!(nodes = graph.len(), "workflow loaded");
        self.order = order;
        self.graph = Some(graph);
        Ok(())
    }

    pub fn graph(&self) -> Option<&WorkflowGraph> {
        self.graph.as_ref()
    }

    /// Hand the graph back (with updated statuses/outputs) for persistence.
    pub fn take_graph(&mut self) -> Option<WorkflowGraph> {
        self.order.clear();
        self.graph.take()
    }

    /// Return a node and its strict descendants to `Idle`, clearing their
    /// outputs and errors so no stale result can be consumed downstream.
    pub fn reset_node(&mut self, node_id: &str) -> WorkflowResult<()> {
        let graph = self.graph.as_mut().ok_or(WorkflowError::NoWorkflow)?;
        let below = descendants(graph, node_id)?;
        for id in std::iter::once(node_id.to_string()).chain(below) {
            let node = graph.node_mut(&id)?;
            // A node whose type never rehydrated stays in its error state.
            if node.model().is_some() {
                node.reset();
            }
        }
        Ok(())
    }

    /// Execute every node in topological order. All nodes are re-run from a
    /// clean state regardless of previous results.
    pub async fn execute_workflow(&mut self) -> WorkflowResult<RunReport> {
        let plan = self.order.clone();
        {
            let graph = self.graph.as_mut().ok_or(WorkflowError::NoWorkflow)?;
            for id in &plan {
                let node = graph.node_mut(id)?;
                if node.model().is_some() {
                    node.reset();
                }
            }
        }
        self.run_plan(&plan, false).await
    }

    /// Execute the minimal upstream closure of `node_id`, then the node
    /// itself. Ancestors already in `Success` are reused, not re-run; use
    /// [`reset_node`](Self::reset_node) to force recomputation.
    pub async fn execute_node_with_dependencies(
        &mut self,
        node_id: &str,
    ) -> WorkflowResult<RunReport> {
        let graph = self.graph.as_ref().ok_or(WorkflowError::NoWorkflow)?;
        let plan = upstream_closure(graph, node_id)?;
        self.run_plan(&plan, true).await
    }

    async fn run_plan(&mut self, plan: &[String], reuse_success: bool) -> WorkflowResult<RunReport> {
        self.cancellation.reset();
        let emitter = self.emitter.clone();
        let cancellation = self.cancellation.clone();
        let graph = self.graph.as_mut().ok_or(WorkflowError::NoWorkflow)?;

        let mut report = RunReport::new();
        for node_id in plan {
            if cancellation.is_cancelled() {
                // Stop launching new nodes; completed nodes keep results.
                report.cancelled = true;
                report.record(node_id, NodeStatus::Skipped, Some("run cancelled".into()));
                continue;
            }

            if reuse_success && graph.node(node_id)?.status == NodeStatus::Success {
                report.record(node_id, NodeStatus::Success, None);
                continue;
            }

            match Self::run_node(graph, node_id, &emitter, &cancellation).await? {
                Outcome::Success {
                    outputs,
                    dashboard_items,
                } => {
                    report.record(node_id, NodeStatus::Success, None);
                    emit(
                        &emitter,
                        StatusEvent {
                            node_id: node_id.clone(),
                            status: NodeStatus::Success,
                            outputs: Some(outputs),
                            error: None,
                            dashboard_items,
                        },
                    );
                }
                Outcome::Failed(message) => {
                    debug!(node_id = %node_id, error = %message, "node failed");
                    report.record(node_id, NodeStatus::Error, Some(message.clone()));
                    emit(
                        &emitter,
                        StatusEvent {
                            node_id: node_id.clone(),
                            status: NodeStatus::Error,
                            outputs: None,
                            error: Some(message),
                            dashboard_items: Vec::new(),
                        },
                    );
                }
                Outcome::Blocked { upstream } => {
                    let message = format!("upstream node '{}' did not succeed", upstream);
                    report.record(node_id, NodeStatus::Skipped, Some(message.clone()));
                    emit(
                        &emitter,
                        StatusEvent {
                            node_id: node_id.clone(),
                            status: NodeStatus::Skipped,
                            outputs: None,
                            error: Some(message),
                            dashboard_items: Vec::new(),
                        },
                    );
                }
                Outcome::Cancelled => {
                    report.cancelled = true;
                    let message = NodeError::Cancelled.to_string();
                    report.record(node_id, NodeStatus::Error, Some(message.clone()));
                    emit(
                        &emitter,
                        StatusEvent {
                            node_id: node_id.clone(),
                            status: NodeStatus::Error,
                            outputs: None,
                            error: Some(message),
                            dashboard_items: Vec::new(),
                        },
                    );
                }
            }
        }

        Ok(report)
    }

    /// Drive one node through `idle → running → {success | error}`, or mark
    /// it skipped without running when an upstream dependency is missing.
    async fn run_node(
        graph: &mut WorkflowGraph,
        node_id: &str,
        emitter: &Option<EventEmitter>,
        cancellation: &CancellationSignal,
    ) -> WorkflowResult<Outcome> {
        // Gather inputs first, against the immutable graph: one connected
        // edge per input port, every producer already successful.
        let (in_ports, has_model) = {
            let node = graph.node(node_id)?;
            (node.in_ports, node.model().is_some())
        };

        if !has_model {
            // Rehydration already marked the node; surface it per run.
            let message = graph
                .node(node_id)?
                .last_error
                .clone()
                .unwrap_or_else(|| WorkflowError::NodeTypeNotFound(node_id.to_string()).to_string());
            return Ok(Outcome::Failed(message));
        }

        let incoming: Vec<_> = graph
            .incoming_edges(node_id)?
            .into_iter()
            .cloned()
            .collect();
        let mut inputs: Vec<Arc<DataTable>> = Vec::with_capacity(in_ports);
        let mut in_specs: Vec<DataTableSpec> = Vec::with_capacity(in_ports);
        for port in 0..in_ports {
            let Some(edge) = incoming.iter().find(|e| e.target.port == port) else {
                let node = graph.node_mut(node_id)?;
                node.status = NodeStatus::Error;
                let message =
                    NodeError::Configuration(format!("input port {} is not connected", port))
                        .to_string();
                node.last_error = Some(message.clone());
                return Ok(Outcome::Failed(message));
            };
            let upstream = graph.node(&edge.source.node_id)?;
            if upstream.status != NodeStatus::Success {
                let upstream_id = upstream.id.clone();
                let node = graph.node_mut(node_id)?;
                node.status = NodeStatus::Skipped;
                return Ok(Outcome::Blocked {
                    upstream: upstream_id,
                });
            }
            let table = upstream.output(edge.source.port).ok_or_else(|| {
                WorkflowError::Internal(format!(
                    "successful node '{}' has no output at port {}",
                    edge.source.node_id, edge.source.port
                ))
            })?;
            in_specs.push(table.spec().clone());
            inputs.push(table);
        }

        let node = graph.node_mut(node_id)?;
        node.status = NodeStatus::Running;
        emit(emitter, StatusEvent::transition(node_id, NodeStatus::Running));

        let settings = node.settings.clone();
        let out_ports = node.out_ports;

        let result = async {
            let model = node
                .model_mut()
                .ok_or_else(|| NodeError::Execution("node model not initialized".into()))?;
            model.validate_settings(&settings)?;
            model.load_settings(&settings)?;
            let model = &*model;
            model.configure(&in_specs)?;

            let ctx = ExecutionContext::new(node_id, cancellation.clone(), emitter.clone());
            let outputs = model.execute(&inputs, &ctx).await?;
            if outputs.len() != out_ports {
                return Err(NodeError::Execution(format!(
                    "produced {} outputs, {} output ports declared",
                    outputs.len(),
                    out_ports
                )));
            }
            Ok((outputs, ctx.take_dashboard_items()))
        }
        .await;

        match result {
            Ok((outputs, dashboard_items)) => {
                node.status = NodeStatus::Success;
                node.last_outputs = Some(outputs.clone());
                node.last_error = None;
                Ok(Outcome::Success {
                    outputs,
                    dashboard_items,
                })
            }
            Err(error) => {
                node.status = NodeStatus::Error;
                let message = error.to_string();
                node.last_error = Some(message.clone());
                node.last_outputs = None;
                if matches!(error, NodeError::Cancelled) {
                    Ok(Outcome::Cancelled)
                } else {
                    Ok(Outcome::Failed(message))
                }
            }
        }
    }
}

impl Default for WorkflowExecutionEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn emit(emitter: &Option<EventEmitter>, event: StatusEvent) {
    if let Some(emitter) = emitter {
        emitter.emit(EngineEvent::Status(event));
    }
}
