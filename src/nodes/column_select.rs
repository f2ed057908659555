//! Column select node: projects a table onto a named subset of columns,
//! in the requested order.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::context::ExecutionContext;
use crate::error::NodeError;
use crate::node::{NodeFactory, NodeMetadata, NodeModel};
use crate::settings::NodeSettings;
use crate::table::{Cell, ColumnSpec, DataRow, DataTable, DataTableSpec};

pub struct ColumnSelectFactory;

static METADATA: NodeMetadata = NodeMetadata {
    type_id: "column_select",
    name: "Column Select",
    category: "transform",
    keywords: &["columns", "select", "project", "subset"],
    description: "Keeps a named subset of columns",
};

impl NodeFactory for ColumnSelectFactory {
    fn metadata(&self) -> &NodeMetadata {
        &METADATA
    }

    fn create_model(&self) -> Box<dyn NodeModel> {
        Box::new(ColumnSelectModel::default())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ColumnSelectConfig {
    columns: Vec<String>,
}

#[derive(Default)]
pub struct ColumnSelectModel {
    config: Option<ColumnSelectConfig>,
}

impl ColumnSelectModel {
    fn config(&self) -> Result<&ColumnSelectConfig, NodeError> {
        self.config
            .as_ref()
            .ok_or_else(|| NodeError::Configuration("settings not loaded".into()))
    }

    /// Resolve the configured names against the input, keeping config order.
    fn projection(&self, input: &DataTableSpec) -> Result<Vec<usize>, NodeError> {
        let config = self.config()?;
        config
            .columns
            .iter()
            .map(|name| input.require_column(name).map(|(i, _)| i))
            .collect()
    }
}

#[async_trait]
impl NodeModel for ColumnSelectModel {
    fn in_ports(&self) -> usize {
        1
    }

    fn out_ports(&self) -> usize {
        1
    }

    fn configure(&self, in_specs: &[DataTableSpec]) -> Result<Vec<DataTableSpec>, NodeError> {
        let [input] = in_specs else {
            return Err(NodeError::Configuration(
                "column select expects exactly one input".into(),
            ));
        };
        let indices = self.projection(input)?;
        let columns: Vec<ColumnSpec> = indices
            .iter()
            .map(|&i| input.columns()[i].clone())
            .collect();
        Ok(vec![DataTableSpec::new(columns)?])
    }

    async fn execute(
        &self,
        inputs: &[Arc<DataTable>],
        ctx: &ExecutionContext,
    ) -> Result<Vec<Arc<DataTable>>, NodeError> {
        let input = &inputs[0];
        let indices = self.projection(input.spec())?;
        let spec = self.configure(&[input.spec().clone()])?.remove(0);

        let total = input.len().max(1);
        let mut builder = ctx.new_table(spec);
        for (i, row) in input.iter().enumerate() {
            if i % 1000 == 0 {
                ctx.check_cancelled()?;
                ctx.set_progress(i as f64 / total as f64, "projecting rows");
            }
            let cells = indices
                .iter()
                .map(|&col| row.cell(col).cloned().unwrap_or(Cell::Missing))
                .collect();
            builder.add_row(DataRow::new(row.key(), cells))?;
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
        let config: ColumnSelectConfig = settings.decode()?;
        if config.columns.is_empty() {
            return Err(NodeError::Validation(
                "at least one column must be selected".into(),
            ));
        }
        let mut seen = std::collections::HashSet::new();
        for name in &config.columns {
            if !seen.insert(name.as_str()) {
                return Err(NodeError::Validation(format!(
                    "column '{}' selected twice",
                    name
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::CellType;

    fn input_table() -> Arc<DataTable> {
        let spec = DataTableSpec::new(vec![
            ColumnSpec::new("a", CellType::Number),
            ColumnSpec::new("b", CellType::String),
            ColumnSpec::new("c", CellType::Boolean),
        ])
        .unwrap();
        let mut builder = DataTable::builder(spec);
        builder
            .add_row(DataRow::new(
                "r0",
                vec![Cell::Number(1.0), Cell::from("x"), Cell::Boolean(true)],
            ))
            .unwrap();
        Arc::new(builder.close())
    }

    fn model(columns: &[&str]) -> ColumnSelectModel {
        let mut settings = NodeSettings::new();
        settings.set("columns", columns.to_vec());
        let mut model = ColumnSelectModel::default();
        model.load_settings(&settings).unwrap();
        model
    }

    #[test]
    fn test_configure_reorders_columns() {
        let model = model(&["c", "a"]);
        let out = model.configure(&[input_table().spec().clone()]).unwrap();
        assert_eq!(out[0].columns()[0].name, "c");
        assert_eq!(out[0].columns()[1].name, "a");
    }

    #[test]
    fn test_configure_unknown_column() {
        let model = model(&["z"]);
        assert!(model.configure(&[input_table().spec().clone()]).is_err());
    }

    #[tokio::test]
    async fn test_execute_projects_cells_and_keeps_keys() {
        let model = model(&["b"]);
        let ctx = ExecutionContext::detached("sel");
        let outputs = model.execute(&[input_table()], &ctx).await.unwrap();
        let table = &outputs[0];
        assert_eq!(table.spec().len(), 1);
        assert_eq!(table.row(0).unwrap().key(), "r0");
        assert_eq!(table.cell(0, 0).unwrap().as_str(), Some("x"));
    }

    #[test]
    fn test_validate_rejects_empty_and_duplicates() {
        let m = ColumnSelectModel::default();
        assert!(m.validate_settings(&NodeSettings::from_value(
            serde_json::json!({ "columns": [] })
        )).is_err());
        assert!(m.validate_settings(&NodeSettings::from_value(
            serde_json::json!({ "columns": ["a", "a"] })
        )).is_err());
        assert!(m.validate_settings(&NodeSettings::from_value(
            serde_json::json!({ "columns": ["a", "b"] })
        )).is_ok());
    }

    #[test]
    fn test_settings_round_trip() {
        let model = model(&["b", "a"]);
        let mut saved = NodeSettings::new();
        model.save_settings(&mut saved);

        let mut reloaded = ColumnSelectModel::default();
        reloaded.load_settings(&saved).unwrap();
        assert_eq!(reloaded.config, model.config);
    }
}
