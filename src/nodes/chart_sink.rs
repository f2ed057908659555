//! Chart sink node: terminal node that renders its input table as a
//! dashboard chart item instead of producing a table.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::context::{DashboardItem, DashboardItemKind, ExecutionContext};
use crate::error::NodeError;
use crate::node::{NodeFactory, NodeMetadata, NodeModel};
use crate::settings::NodeSettings;
use crate::table::{Cell, CellType, DataTable, DataTableSpec};

pub struct ChartSinkFactory;

static METADATA: NodeMetadata = NodeMetadata {
    type_id: "chart_sink",
    name: "Chart",
    category: "sink",
    keywords: &["chart", "plot", "dashboard", "visualization"],
    description: "Emits the input table as a dashboard chart",
};

impl NodeFactory for ChartSinkFactory {
    fn metadata(&self) -> &NodeMetadata {
        &METADATA
    }

    fn create_model(&self) -> Box<dyn NodeModel> {
        Box::new(ChartSinkModel::default())
    }
}

fn default_chart_type() -> String {
    "bar".to_string()
}

const CHART_TYPES: &[&str] = &["bar", "line", "pie"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ChartSinkConfig {
    #[serde(default = "default_chart_type")]
    chart_type: String,
    x: String,
    /// Value column; defaults to the first number column that is not `x`.
    #[serde(default)]
    y: Option<String>,
}

#[derive(Default)]
pub struct ChartSinkModel {
    config: Option<ChartSinkConfig>,
}

impl ChartSinkModel {
    fn config(&self) -> Result<&ChartSinkConfig, NodeError> {
        self.config
            .as_ref()
            .ok_or_else(|| NodeError::Configuration("settings not loaded".into()))
    }

    fn resolve_columns(&self, input: &DataTableSpec) -> Result<(usize, usize), NodeError> {
        let config = self.config()?;
        let (x_index, _) = input.require_column(&config.x)?;

        let y_index = match config.y.as_deref() {
            Some(name) => {
                let (index, column) = input.require_column(name)?;
                if column.cell_type != CellType::Number {
                    return Err(NodeError::TypeMismatch {
                        column: column.name.clone(),
                        expected: CellType::Number.to_string(),
                        actual: column.cell_type.to_string(),
                    });
                }
                index
            }
            None => input
                .columns()
                .iter()
                .position(|c| c.cell_type == CellType::Number && c.name != config.x)
                .ok_or_else(|| {
                    NodeError::Configuration(
                        "no number column available for the chart values".into(),
                    )
                })?,
        };
        Ok((x_index, y_index))
    }
}

#[async_trait]
impl NodeModel for ChartSinkModel {
    fn in_ports(&self) -> usize {
        1
    }

    fn out_ports(&self) -> usize {
        0
    }

    fn configure(&self, in_specs: &[DataTableSpec]) -> Result<Vec<DataTableSpec>, NodeError> {
        let [input] = in_specs else {
            return Err(NodeError::Configuration(
                "chart sink expects exactly one input".into(),
            ));
        };
        self.resolve_columns(input)?;
        Ok(Vec::new())
    }

    async fn execute(
        &self,
        inputs: &[Arc<DataTable>],
        ctx: &ExecutionContext,
    ) -> Result<Vec<Arc<DataTable>>, NodeError> {
        let config = self.config()?;
        let input = &inputs[0];
        let (x_index, y_index) = self.resolve_columns(input.spec())?;

        let mut labels = Vec::with_capacity(input.len());
        let mut values = Vec::with_capacity(input.len());
        for (i, row) in input.iter().enumerate() {
            if i % 1000 == 0 {
                ctx.check_cancelled()?;
            }
            let label = row.cell(x_index).unwrap_or(&Cell::Missing);
            labels.push(match label {
                Cell::Missing => json!(null),
                other => other.to_json(),
            });
            values.push(
                row.cell(y_index)
                    .and_then(Cell::as_number)
                    .map(|v| json!(v))
                    .unwrap_or(json!(null)),
            );
        }

        ctx.push_dashboard_item(DashboardItem {
            kind: DashboardItemKind::Chart,
            payload: json!({
                "chartType": config.chart_type,
                "xLabel": config.x,
                "yLabel": input.spec().columns()[y_index].name,
                "labels": labels,
                "values": values,
            }),
        });
        ctx.set_progress(1.0, "done");
        Ok(Vec::new())
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
        let config: ChartSinkConfig = settings.decode()?;
        if config.x.is_empty() {
            return Err(NodeError::Validation("x column must not be empty".into()));
        }
        if !CHART_TYPES.contains(&config.chart_type.as_str()) {
            return Err(NodeError::Validation(format!(
                "unknown chart type '{}', expected one of {:?}",
                config.chart_type, CHART_TYPES
            )));
        }
        Ok(())
    }
}
