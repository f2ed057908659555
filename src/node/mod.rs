//! Node contracts: the [`NodeModel`] computation trait and the
//! [`NodeFactory`]/[`NodeRegistry`](registry::NodeRegistry) extension point.
//!
//! A node type is an independent value type implementing [`NodeModel`]; the
//! registry maps its stable string id to a factory that constructs fresh
//! models. Adding a node type means registering one factory; nothing else in
//! the engine changes.

mod registry;

pub use registry::{create_default_registry, NodeRegistry};

use std::sync::Arc;

use async_trait::async_trait;

use crate::context::ExecutionContext;
use crate::error::NodeError;
use crate::settings::NodeSettings;
use crate::table::{DataTable, DataTableSpec};

/// Static description of a node type, surfaced to hosts for palettes and
/// search.
#[derive(Debug, Clone)]
pub struct NodeMetadata {
    pub type_id: &'static str,
    pub name: &'static str,
    pub category: &'static str,
    pub keywords: &'static [&'static str],
    pub description: &'static str,
}

/// One unit of computation in the workflow graph.
///
/// Port arity is fixed at construction. `configure` is a pure type-check run
/// before any data flows; `execute` is the computation itself and must poll
/// [`ExecutionContext::check_cancelled`] in long loops. Settings round-trip:
/// whatever `save_settings` writes, `load_settings` must fully reconstruct in
/// a later process.
#[async_trait]
pub trait NodeModel: Send + Sync {
    /// Number of input ports.
    fn in_ports(&self) -> usize;

    /// Number of output ports.
    fn out_ports(&self) -> usize;

    /// Pure type-checking step: validate that required input columns/types
    /// exist and compute the output spec for each output port. Runs before
    /// `execute`; must not touch data.
    fn configure(&self, in_specs: &[DataTableSpec]) -> Result<Vec<DataTableSpec>, NodeError>;

    /// The actual computation, one output table per output port.
    async fn execute(
        &self,
        inputs: &[Arc<DataTable>],
        ctx: &ExecutionContext,
    ) -> Result<Vec<Arc<DataTable>>, NodeError>;

    /// Reconstruct configuration from persisted settings.
    fn load_settings(&mut self, settings: &NodeSettings) -> Result<(), NodeError>;

    /// Write the current configuration into `settings`.
    fn save_settings(&self, settings: &mut NodeSettings);

    /// Check settings for missing or out-of-range fields with a
    /// human-readable reason. Invoked on dialog close and again immediately
    /// before `execute`.
    fn validate_settings(&self, settings: &NodeSettings) -> Result<(), NodeError>;
}

/// Constructor for one node type. The sole extension point: the registry
/// holds factories, and every live model is created through one, never
/// deserialized.
pub trait NodeFactory: Send + Sync {
    fn metadata(&self) -> &NodeMetadata;

    fn create_model(&self) -> Box<dyn NodeModel>;
}
