//! Group-and-aggregate node: groups rows by one column and reduces a
//! numeric target column per group.
//!
//! Groups appear in the output in first-seen input order. Missing cells in
//! the target column are skipped by the aggregate; a group whose values are
//! all missing yields a missing result (count still reports zero).

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::context::ExecutionContext;
use crate::error::NodeError;
use crate::node::{NodeFactory, NodeMetadata, NodeModel};
use crate::settings::NodeSettings;
use crate::table::{Cell, CellType, ColumnSpec, DataTable, DataTableSpec};

pub struct GroupAggregateFactory;

static METADATA: NodeMetadata = NodeMetadata {
    type_id: "group_aggregate",
    name: "Group & Aggregate",
    category: "transform",
    keywords: &["group", "aggregate", "sum", "avg", "count"],
    description: "Groups rows by a column and aggregates a numeric column",
};

impl NodeFactory for GroupAggregateFactory {
    fn metadata(&self) -> &NodeMetadata {
        &METADATA
    }

    fn create_model(&self) -> Box<dyn NodeModel> {
        Box::new(GroupAggregateModel::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregateFunction {
    Sum,
    Avg,
    Count,
    Min,
    Max,
}

impl AggregateFunction {
    fn needs_target(&self) -> bool {
        !matches!(self, AggregateFunction::Count)
    }

    fn result_name(&self, target: Option<&str>) -> String {
        match (self, target) {
            (AggregateFunction::Count, _) => "count".to_string(),
            (AggregateFunction::Sum, Some(t)) => format!("sum({})", t),
            (AggregateFunction::Avg, Some(t)) => format!("avg({})", t),
            (AggregateFunction::Min, Some(t)) => format!("min({})", t),
            (AggregateFunction::Max, Some(t)) => format!("max({})", t),
            (_, None) => "aggregate".to_string(),
        }
    }
}

/// Running reducer state for one group.
#[derive(Default)]
struct Accumulator {
    sum: f64,
    count: usize,
    min: Option<f64>,
    max: Option<f64>,
}

impl Accumulator {
    fn push(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
        self.min = Some(self.min.map_or(value, |m| m.min(value)));
        self.max = Some(self.max.map_or(value, |m| m.max(value)));
    }

    fn finish(&self, function: AggregateFunction) -> Cell {
        match function {
            AggregateFunction::Count => Cell::Number(self.count as f64),
            AggregateFunction::Sum if self.count > 0 => Cell::Number(self.sum),
            AggregateFunction::Avg if self.count > 0 => {
                Cell::Number(self.sum / self.count as f64)
            }
            AggregateFunction::Min => self.min.map(Cell::Number).unwrap_or(Cell::Missing),
            AggregateFunction::Max => self.max.map(Cell::Number).unwrap_or(Cell::Missing),
            _ => Cell::Missing,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct GroupAggregateConfig {
    group_by: String,
    aggregate: AggregateFunction,
    #[serde(default)]
    target: Option<String>,
    #[serde(default)]
    alias: Option<String>,
}

impl GroupAggregateConfig {
    fn result_column(&self) -> String {
        match &self.alias {
            Some(alias) => alias.clone(),
            None => self.aggregate.result_name(self.target.as_deref()),
        }
    }
}

#[derive(Default)]
pub struct GroupAggregateModel {
    config: Option<GroupAggregateConfig>,
}

impl GroupAggregateModel {
    fn config(&self) -> Result<&GroupAggregateConfig, NodeError> {
        self.config
            .as_ref()
            .ok_or_else(|| NodeError::Configuration("settings not loaded".into()))
    }

    fn output_spec(&self, input: &DataTableSpec) -> Result<DataTableSpec, NodeError> {
        let config = self.config()?;
        let (_, group_column) = input.require_column(&config.group_by)?;

        if config.aggregate.needs_target() {
            let target = config.target.as_deref().ok_or_else(|| {
                NodeError::Configuration("aggregate requires a target column".into())
            })?;
            let (_, target_column) = input.require_column(target)?;
            if target_column.cell_type != CellType::Number {
                return Err(NodeError::TypeMismatch {
                    column: target_column.name.clone(),
                    expected: CellType::Number.to_string(),
                    actual: target_column.cell_type.to_string(),
                });
            }
        }

        DataTableSpec::new(vec![
            ColumnSpec::new(group_column.name.clone(), group_column.cell_type),
            ColumnSpec::new(config.result_column(), CellType::Number),
        ])
    }
}

#[async_trait]
impl NodeModel for GroupAggregateModel {
    fn in_ports(&self) -> usize {
        1
    }

    fn out_ports(&self) -> usize {
        1
    }

    fn configure(&self, in_specs: &[DataTableSpec]) -> Result<Vec<DataTableSpec>, NodeError> {
        let [input] = in_specs else {
            return Err(NodeError::Configuration(
                "group aggregate expects exactly one input".into(),
            ));
        };
        Ok(vec![self.output_spec(input)?])
    }

    async fn execute(
        &self,
        inputs: &[Arc<DataTable>],
        ctx: &ExecutionContext,
    ) -> Result<Vec<Arc<DataTable>>, NodeError> {
        let config = self.config()?;
        let input = &inputs[0];
        let spec = self.output_spec(input.spec())?;

        let group_index = input
            .spec()
            .require_column(&config.group_by)
            .map(|(i, _)| i)?;
        let target_index = match config.target.as_deref() {
            Some(name) => Some(input.spec().require_column(name).map(|(i, _)| i)?),
            None => None,
        };

        // Keys in first-seen order; accumulators looked up by rendered key.
        let mut order: Vec<(String, Cell)> = Vec::new();
        let mut groups: HashMap<String, Accumulator> = HashMap::new();
        let total = input.len().max(1);
        for (i, row) in input.iter().enumerate() {
            if i % 1000 == 0 {
                ctx.check_cancelled()?;
                ctx.set_progress(i as f64 / total as f64, "grouping rows");
            }
            let group_cell = row.cell(group_index).unwrap_or(&Cell::Missing);
            let key = group_cell.to_json().to_string();
            if !groups.contains_key(&key) {
                order.push((key.clone(), group_cell.clone()));
                groups.insert(key.clone(), Accumulator::default());
            }
            let accumulator = groups
                .get_mut(&key)
                .ok_or_else(|| NodeError::Execution("group accumulator vanished".into()))?;
            match target_index {
                Some(col) => {
                    if let Some(value) = row.cell(col).and_then(Cell::as_number) {
                        accumulator.push(value);
                    }
                }
                // Count without a target counts rows.
                None => accumulator.count += 1,
            }
        }

        let mut builder = ctx.new_table(spec);
        for (key, group_cell) in order {
            let accumulator = groups
                .get(&key)
                .ok_or_else(|| NodeError::Execution("group accumulator vanished".into()))?;
            builder.add_cells(vec![group_cell, accumulator.finish(config.aggregate)])?;
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
        let config: GroupAggregateConfig = settings.decode()?;
        if config.group_by.is_empty() {
            return Err(NodeError::Validation("group_by must not be empty".into()));
        }
        if config.aggregate.needs_target()
            && config.target.as_deref().map_or(true, str::is_empty)
        {
            return Err(NodeError::Validation(format!(
                "aggregate '{:?}' requires a target column",
                config.aggregate
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::DataRow;

    fn input_table() -> Arc<DataTable> {
        let spec = DataTableSpec::new(vec![
            ColumnSpec::new("region", CellType::String),
            ColumnSpec::new("amount", CellType::Number),
        ])
        .unwrap();
        let mut builder = DataTable::builder(spec);
        for (key, region, amount) in [
            ("r0", "east", Cell::Number(150.0)),
            ("r1", "west", Cell::Number(120.0)),
            ("r2", "east", Cell::Missing),
            ("r3", "west", Cell::Number(30.0)),
        ] {
            builder
                .add_row(DataRow::new(key, vec![Cell::from(region), amount]))
                .unwrap();
        }
        Arc::new(builder.close())
    }

    fn model(json: serde_json::Value) -> GroupAggregateModel {
        let mut model = GroupAggregateModel::default();
        model
            .load_settings(&NodeSettings::from_value(json))
            .unwrap();
        model
    }

    #[test]
    fn test_output_spec_with_alias() {
        let model = model(serde_json::json!({
            "group_by": "region", "aggregate": "sum",
            "target": "amount", "alias": "total"
        }));
        let out = model.configure(&[input_table().spec().clone()]).unwrap();
        assert_eq!(out[0].columns()[0].name, "region");
        assert_eq!(out[0].columns()[1].name, "total");
        assert_eq!(out[0].columns()[1].cell_type, CellType::Number);
    }

    #[test]
    fn test_output_spec_derived_name() {
        let model = model(serde_json::json!({
            "group_by": "region", "aggregate": "avg", "target": "amount"
        }));
        let out = model.configure(&[input_table().spec().clone()]).unwrap();
        assert_eq!(out[0].columns()[1].name, "avg(amount)");
    }

    #[test]
    fn test_configure_rejects_string_target() {
        let model = model(serde_json::json!({
            "group_by": "amount", "aggregate": "sum", "target": "region"
        }));
        let err = model.configure(&[input_table().spec().clone()]).unwrap_err();
        assert!(matches!(err, NodeError::TypeMismatch { .. }));
    }

    #[tokio::test]
    async fn test_sum_skips_missing_and_keeps_order() {
        let model = model(serde_json::json!({
            "group_by": "region", "aggregate": "sum",
            "target": "amount", "alias": "total"
        }));
        let ctx = ExecutionContext::detached("agg");
        let outputs = model.execute(&[input_table()], &ctx).await.unwrap();
        let table = &outputs[0];
        assert_eq!(table.len(), 2);
        assert_eq!(table.cell(0, 0).unwrap().as_str(), Some("east"));
        assert_eq!(table.cell(0, 1).unwrap().as_number(), Some(150.0));
        assert_eq!(table.cell(1, 0).unwrap().as_str(), Some("west"));
        assert_eq!(table.cell(1, 1).unwrap().as_number(), Some(150.0));
    }

    #[tokio::test]
    async fn test_count_without_target() {
        let model = model(serde_json::json!({
            "group_by": "region", "aggregate": "count"
        }));
        let ctx = ExecutionContext::detached("agg");
        let outputs = model.execute(&[input_table()], &ctx).await.unwrap();
        let table = &outputs[0];
        assert_eq!(table.spec().columns()[1].name, "count");
        assert_eq!(table.cell(0, 1).unwrap().as_number(), Some(2.0));
        assert_eq!(table.cell(1, 1).unwrap().as_number(), Some(2.0));
    }

    #[tokio::test]
    async fn test_min_max() {
        let model = model(serde_json::json!({
            "group_by": "region", "aggregate": "min", "target": "amount"
        }));
        let ctx = ExecutionContext::detached("agg");
        let outputs = model.execute(&[input_table()], &ctx).await.unwrap();
        // east has one non-missing value, west has two.
        assert_eq!(outputs[0].cell(0, 1).unwrap().as_number(), Some(150.0));
        assert_eq!(outputs[0].cell(1, 1).unwrap().as_number(), Some(30.0));
    }

    #[tokio::test]
    async fn test_all_missing_group_yields_missing() {
        let spec = DataTableSpec::new(vec![
            ColumnSpec::new("k", CellType::String),
            ColumnSpec::new("v", CellType::Number),
        ])
        .unwrap();
        let mut builder = DataTable::builder(spec);
        builder
            .add_row(DataRow::new("r0", vec![Cell::from("a"), Cell::Missing]))
            .unwrap();
        let table = Arc::new(builder.close());

        let model = model(serde_json::json!({
            "group_by": "k", "aggregate": "sum", "target": "v"
        }));
        let ctx = ExecutionContext::detached("agg");
        let outputs = model.execute(&[table], &ctx).await.unwrap();
        assert!(outputs[0].cell(0, 1).unwrap().is_missing());
    }

    #[test]
    fn test_validate_requires_target_except_count() {
        let model = GroupAggregateModel::default();
        let missing_target = NodeSettings::from_value(serde_json::json!({
            "group_by": "region", "aggregate": "sum"
        }));
        assert!(model.validate_settings(&missing_target).is_err());

        let count = NodeSettings::from_value(serde_json::json!({
            "group_by": "region", "aggregate": "count"
        }));
        assert!(model.validate_settings(&count).is_ok());
    }

    #[test]
    fn test_settings_round_trip() {
        let model = model(serde_json::json!({
            "group_by": "region", "aggregate": "max",
            "target": "amount", "alias": "peak"
        }));
        let mut saved = NodeSettings::new();
        model.save_settings(&mut saved);

        let mut reloaded = GroupAggregateModel::default();
        reloaded.load_settings(&saved).unwrap();
        assert_eq!(reloaded.config, model.config);
    }
}
