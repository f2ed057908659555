//! Row filter node: keeps rows whose cell in one column satisfies a
//! predicate. Missing cells never match.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::context::ExecutionContext;
use crate::error::NodeError;
use crate::node::{NodeFactory, NodeMetadata, NodeModel};
use crate::settings::NodeSettings;
use crate::table::{Cell, CellType, DataTable, DataTableSpec};

pub struct RowFilterFactory;

static METADATA: NodeMetadata = NodeMetadata {
    type_id: "row_filter",
    name: "Row Filter",
    category: "transform",
    keywords: &["filter", "rows", "predicate", "where"],
    description: "Keeps rows matching a column predicate",
};

impl NodeFactory for RowFilterFactory {
    fn metadata(&self) -> &NodeMetadata {
        &METADATA
    }

    fn create_model(&self) -> Box<dyn NodeModel> {
        Box::new(RowFilterModel::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterOperator {
    Gt,
    Ge,
    Lt,
    Le,
    Eq,
    Ne,
    Contains,
}

impl FilterOperator {
    fn is_ordering(&self) -> bool {
        matches!(
            self,
            FilterOperator::Gt | FilterOperator::Ge | FilterOperator::Lt | FilterOperator::Le
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct RowFilterConfig {
    column: String,
    operator: FilterOperator,
    value: Value,
}

#[derive(Default)]
pub struct RowFilterModel {
    config: Option<RowFilterConfig>,
}

impl RowFilterModel {
    fn config(&self) -> Result<&RowFilterConfig, NodeError> {
        self.config
            .as_ref()
            .ok_or_else(|| NodeError::Configuration("settings not loaded".into()))
    }
}

fn matches(cell: &Cell, operator: FilterOperator, value: &Value) -> bool {
    match operator {
        FilterOperator::Gt | FilterOperator::Ge | FilterOperator::Lt | FilterOperator::Le => {
            let (Some(lhs), Some(rhs)) = (cell.as_number(), value.as_f64()) else {
                return false;
            };
            match operator {
                FilterOperator::Gt => lhs > rhs,
                FilterOperator::Ge => lhs >= rhs,
                FilterOperator::Lt => lhs < rhs,
                FilterOperator::Le => lhs <= rhs,
                _ => unreachable!(),
            }
        }
        FilterOperator::Eq => !cell.is_missing() && cell.to_json() == *value,
        FilterOperator::Ne => !cell.is_missing() && cell.to_json() != *value,
        FilterOperator::Contains => match (cell.as_str(), value.as_str()) {
            (Some(haystack), Some(needle)) => haystack.contains(needle),
            _ => false,
        },
    }
}

#[async_trait]
impl NodeModel for RowFilterModel {
    fn in_ports(&self) -> usize {
        1
    }

    fn out_ports(&self) -> usize {
        1
    }

    fn configure(&self, in_specs: &[DataTableSpec]) -> Result<Vec<DataTableSpec>, NodeError> {
        let [input] = in_specs else {
            return Err(NodeError::Configuration(
                "row filter expects exactly one input".into(),
            ));
        };
        let config = self.config()?;
        let (_, column) = input.require_column(&config.column)?;

        if config.operator.is_ordering() {
            if column.cell_type != CellType::Number {
                return Err(NodeError::Configuration(format!(
                    "operator requires a number column, '{}' is {}",
                    column.name, column.cell_type
                )));
            }
            if config.value.as_f64().is_none() {
                return Err(NodeError::Configuration(
                    "comparison value must be a number".into(),
                ));
            }
        }
        if config.operator == FilterOperator::Contains && column.cell_type != CellType::String {
            return Err(NodeError::Configuration(format!(
                "'contains' requires a string column, '{}' is {}",
                column.name, column.cell_type
            )));
        }

        Ok(vec![input.clone()])
    }

    async fn execute(
        &self,
        inputs: &[Arc<DataTable>],
        ctx: &ExecutionContext,
    ) -> Result<Vec<Arc<DataTable>>, NodeError> {
        let config = self.config()?;
        let input = &inputs[0];
        let column_index = input
            .spec()
            .require_column(&config.column)
            .map(|(i, _)| i)?;

        let total = input.len().max(1);
        let mut builder = ctx.new_table(input.spec().clone());
        for (i, row) in input.iter().enumerate() {
            if i % 1000 == 0 {
                ctx.check_cancelled()?;
                ctx.set_progress(i as f64 / total as f64, "filtering rows");
            }
            let cell = row.cell(column_index).unwrap_or(&Cell::Missing);
            if matches(cell, config.operator, &config.value) {
                builder.add_row(row.clone())?;
            }
        }
        ctx.set_progress(1.0, "done");
        Ok(vec![Arc::new(builder.close())])
    }

    fn load_settings(&mut self, settings: &NodeSettings) -> Result<(), NodeError> {
        self.config = Some(settings.decode()?);
        Ok(())
    }

    fn save_settings(&self, settings: &mut NodeSettings) {
        if let Some(config) = &self.config {
            if let Ok(encoded) = NodeSettings::encode(config) {
                *settings = encoded;
            }
        }
    }

    fn validate_settings(&self, settings: &NodeSettings) -> Result<(), NodeError> {
        let config: RowFilterConfig = settings.decode()?;
        if config.column.is_empty() {
            return Err(NodeError::Validation("column must not be empty".into()));
        }
        if config.value.is_null() {
            return Err(NodeError::Validation(
                "comparison value must not be null".into(),
            ));
        }
        Ok(())
    }
}
