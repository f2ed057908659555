//! Per-run services handed to nodes during `execute`.
//!
//! The engine constructs one [`ExecutionContext`] per node invocation. It
//! carries progress reporting, the run-scoped cooperative cancellation flag,
//! table construction, and dashboard-item staging. Staged dashboard items are
//! drained by the engine after a successful execute and forwarded through the
//! status callback; the engine itself never persists anything.

mod event;

pub use event::{EngineEvent, EventEmitter, ProgressUpdate, StatusEvent};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::NodeError;
use crate::table::{DataTableBuilder, DataTableSpec};

/// Kind of artifact a node stages for the dashboard layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DashboardItemKind {
    Table,
    Statistics,
    Chart,
}

/// A derived artifact a node optionally emits for display, independent of its
/// table outputs. Zero emissions is a valid outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardItem {
    pub kind: DashboardItemKind,
    pub payload: Value,
}

impl DashboardItem {
    pub fn new(kind: DashboardItemKind, payload: Value) -> Self {
        DashboardItem { kind, payload }
    }
}

/// Workflow-scoped cooperative cancellation flag.
///
/// Cancelling stops the engine from launching new nodes; an in-flight node
/// must poll [`ExecutionContext::check_cancelled`] to unwind.
#[derive(Debug, Clone, Default)]
pub struct CancellationSignal {
    flag: Arc<AtomicBool>,
}

impl CancellationSignal {
    pub fn new() -> Self {
        CancellationSignal::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// Clear the flag for a fresh run.
    pub(crate) fn reset(&self) {
        self.flag.store(false, Ordering::Relaxed);
    }
}

/// Services available to a node while it executes.
pub struct ExecutionContext {
    node_id: String,
    cancellation: CancellationSignal,
    emitter: Option<EventEmitter>,
    dashboard_items: Mutex<Vec<DashboardItem>>,
}

impl ExecutionContext {
    pub(crate) fn new(
        node_id: impl Into<String>,
        cancellation: CancellationSignal,
        emitter: Option<EventEmitter>,
    ) -> Self {
        ExecutionContext {
            node_id: node_id.into(),
            cancellation,
            emitter,
            dashboard_items: Mutex::new(Vec::new()),
        }
    }

    /// Standalone context for driving a node outside the engine (tests,
    /// ad-hoc invocation). No progress sink, never cancelled.
    pub fn detached(node_id: impl Into<String>) -> Self {
        ExecutionContext::new(node_id, CancellationSignal::new(), None)
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    /// Start building an output table with the given spec.
    pub fn new_table(&self, spec: DataTableSpec) -> DataTableBuilder {
        DataTableBuilder::new(spec)
    }

    /// Report progress. `fraction` is clamped to `[0, 1]`; updates reach the
    /// host through the status callback in the order they are produced.
    pub fn set_progress(&self, fraction: f64, message: impl Into<String>) {
        if let Some(emitter) = &self.emitter {
            emitter.emit(EngineEvent::Progress(ProgressUpdate {
                node_id: self.node_id.clone(),
                fraction: fraction.clamp(0.0, 1.0),
                message: message.into(),
            }));
        }
    }

    /// Cooperative cancellation check; long-running loops must call this
    /// periodically and propagate the error to unwind.
    pub fn check_cancelled(&self) -> Result<(), NodeError> {
        if self.cancellation.is_cancelled() {
            Err(NodeError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Stage a dashboard item for emission after the node completes.
    pub fn push_dashboard_item(&self, item: DashboardItem) {
        self.dashboard_items.lock().push(item);
    }

    pub(crate) fn take_dashboard_items(&self) -> Vec<DashboardItem> {
        std::mem::take(&mut self.dashboard_items.lock())
    }
}
