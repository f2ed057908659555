//! gridflow: a dataflow workflow engine for typed tabular pipelines.
//!
//! A workflow is a directed acyclic graph of processing nodes. Each node
//! declares fixed input/output ports, carries JSON-serializable settings, and
//! implements the [`NodeModel`](node::NodeModel) contract: `configure`
//! computes output table specs from input specs without touching data,
//! `execute` produces the actual tables. The
//! [`WorkflowExecutionEngine`](engine::WorkflowExecutionEngine) runs nodes in
//! a deterministic topological order, feeding each node the outputs of its
//! successful predecessors and skipping the descendants of failures.
//!
//! Graphs round-trip through a JSON document format
//! ([`graph::schema::WorkflowDocument`]) in which nodes reference their type
//! by factory id and are rebuilt from a [`NodeRegistry`](node::NodeRegistry)
//! on load.

pub mod context;
pub mod engine;
pub mod error;
pub mod graph;
pub mod node;
pub mod nodes;
pub mod settings;
pub mod table;

pub use context::{
    CancellationSignal, DashboardItem, DashboardItemKind, EngineEvent, EventEmitter,
    ExecutionContext, ProgressUpdate, StatusEvent,
};
pub use engine::{NodeRunRecord, RunReport, WorkflowExecutionEngine};
pub use error::{NodeError, WorkflowError, WorkflowResult};
pub use graph::{NodeStatus, WorkflowGraph};
pub use node::{create_default_registry, NodeFactory, NodeMetadata, NodeModel, NodeRegistry};
pub use settings::NodeSettings;
pub use table::{
    Cell, CellType, ColumnSpec, DataRow, DataTable, DataTableBuilder, DataTableSpec,
};
