use std::collections::HashMap;
use std::sync::Arc;

use super::NodeFactory;

/// Registry mapping a stable node type id to its factory.
///
/// Built once at startup and passed by reference to the graph loader and the
/// engine; read-only thereafter, so concurrent reads need no locking.
pub struct NodeRegistry {
    factories: HashMap<String, Arc<dyn NodeFactory>>,
    order: Vec<String>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        NodeRegistry {
            factories: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Register a factory under its metadata `type_id`. Re-registering an id
    /// replaces the previous factory.
    pub fn register(&mut self, factory: Arc<dyn NodeFactory>) {
        let type_id = factory.metadata().type_id.to_string();
        if self.factories.insert(type_id.clone(), factory).is_none() {
            self.order.push(type_id);
        }
    }

    pub fn get(&self, type_id: &str) -> Option<Arc<dyn NodeFactory>> {
        self.factories.get(type_id).cloned()
    }

    /// All registered factories, in registration order.
    pub fn factories(&self) -> impl Iterator<Item = Arc<dyn NodeFactory>> + '_ {
        self.order
            .iter()
            .filter_map(|id| self.factories.get(id).cloned())
    }

    pub fn registered_types(&self) -> Vec<String> {
        self.order.clone()
    }
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Create a registry with every built-in node type registered.
pub fn create_default_registry() -> NodeRegistry {
    let mut registry = NodeRegistry::new();

    registry.register(Arc::new(crate::nodes::CsvSourceFactory));
    registry.register(Arc::new(crate::nodes::RowFilterFactory));
    registry.register(Arc::new(crate::nodes::GroupAggregateFactory));
    registry.register(Arc::new(crate::nodes::ColumnSelectFactory));
    registry.register(Arc::new(crate::nodes::ChartSinkFactory));

    registry
}
