//! Engine events delivered synchronously to the host's status callback.

use std::sync::Arc;

use parking_lot::Mutex;

use super::DashboardItem;
use crate::graph::NodeStatus;
use crate::table::DataTable;

/// One node status transition, with results where the transition is terminal.
///
/// This is the only channel through which node results leave the engine; the
/// host persists dashboard items and streams UI updates from here.
#[derive(Debug, Clone)]
pub struct StatusEvent {
    pub node_id: String,
    pub status: NodeStatus,
    pub outputs: Option<Vec<Arc<DataTable>>>,
    pub error: Option<String>,
    pub dashboard_items: Vec<DashboardItem>,
}

impl StatusEvent {
    pub(crate) fn transition(node_id: &str, status: NodeStatus) -> Self {
        StatusEvent {
            node_id: node_id.to_string(),
            status,
            outputs: None,
            error: None,
            dashboard_items: Vec::new(),
        }
    }
}

/// In-flight progress report from a node's `execute`.
#[derive(Debug, Clone)]
pub struct ProgressUpdate {
    pub node_id: String,
    pub fraction: f64,
    pub message: String,
}

/// Everything the engine reports while driving a run.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    Status(StatusEvent),
    Progress(ProgressUpdate),
}

/// Shared sender for engine events.
///
/// Cloned into each node's [`ExecutionContext`](super::ExecutionContext) so
/// progress and status updates flow through one callback in production order.
#[derive(Clone)]
pub struct EventEmitter {
    sink: Arc<Mutex<dyn FnMut(EngineEvent) + Send>>,
}

impl EventEmitter {
    pub fn new(callback: impl FnMut(EngineEvent) + Send + 'static) -> Self {
        EventEmitter {
            sink: Arc::new(Mutex::new(callback)),
        }
    }

    pub fn emit(&self, event: EngineEvent) {
        (self.sink.lock())(event);
    }
}

impl std::fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("EventEmitter")
    }
}
