//! CSV source node: parses CSV text from its settings into a typed table.
//!
//! The first line is the header; column types are inferred from the data
//! (number, boolean, ISO date, falling back to string). Empty fields become
//! missing cells. The parser splits on the configured delimiter and does not
//! handle quoting.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::context::ExecutionContext;
use crate::error::NodeError;
use crate::node::{NodeFactory, NodeMetadata, NodeModel};
use crate::settings::NodeSettings;
use crate::table::{Cell, CellType, ColumnSpec, DataTable, DataTableSpec};

pub struct CsvSourceFactory;

static METADATA: NodeMetadata = NodeMetadata {
    type_id: "csv_source",
    name: "CSV Source",
    category: "source",
    keywords: &["csv", "input", "source", "table"],
    description: "Parses CSV text into a typed data table",
};

impl NodeFactory for CsvSourceFactory {
    fn metadata(&self) -> &NodeMetadata {
        &METADATA
    }

    fn create_model(&self) -> Box<dyn NodeModel> {
        Box::new(CsvSourceModel::default())
    }
}

fn default_delimiter() -> String {
    ",".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct CsvSourceConfig {
    csv: String,
    #[serde(default = "default_delimiter")]
    delimiter: String,
}

#[derive(Default)]
pub struct CsvSourceModel {
    config: Option<CsvSourceConfig>,
}

impl CsvSourceModel {
    fn config(&self) -> Result<&CsvSourceConfig, NodeError> {
        self.config
            .as_ref()
            .ok_or_else(|| NodeError::Configuration("settings not loaded".into()))
    }

    fn parse(&self) -> Result<(DataTableSpec, Vec<Vec<Cell>>), NodeError> {
        let config = self.config()?;
        let delimiter = config
            .delimiter
            .chars()
            .next()
            .ok_or_else(|| NodeError::Validation("delimiter must not be empty".into()))?;

        let mut lines = config.csv.lines().filter(|l| !l.trim().is_empty());
        let header = lines
            .next()
            .ok_or_else(|| NodeError::Configuration("csv text has no header row".into()))?;
        let names: Vec<String> = header
            .split(delimiter)
            .map(|s| s.trim().to_string())
            .collect();

        let raw_rows: Vec<Vec<String>> = lines
            .map(|line| {
                line.split(delimiter)
                    .map(|s| s.trim().to_string())
                    .collect()
            })
            .collect();
        for (i, row) in raw_rows.iter().enumerate() {
            if row.len() != names.len() {
                return Err(NodeError::Configuration(format!(
                    "csv row {} has {} fields, header declares {}",
                    i + 1,
                    row.len(),
                    names.len()
                )));
            }
        }

        let types: Vec<CellType> = (0..names.len())
            .map(|col| infer_type(raw_rows.iter().map(|r| r[col].as_str())))
            .collect();

        let spec = DataTableSpec::new(
            names
                .iter()
                .zip(&types)
                .map(|(name, t)| ColumnSpec::new(name.clone(), *t))
                .collect(),
        )?;

        let rows = raw_rows
            .iter()
            .map(|raw| {
                raw.iter()
                    .zip(&types)
                    .map(|(field, t)| parse_cell(field, *t))
                    .collect()
            })
            .collect();

        Ok((spec, rows))
    }
}

/// Pick the narrowest type every non-empty value fits.
fn infer_type<'a>(values: impl Iterator<Item = &'a str> + Clone) -> CellType {
    let mut non_empty = values.filter(|v| !v.is_empty()).peekable();
    if non_empty.peek().is_none() {
        return CellType::String;
    }
    if non_empty.clone().all(|v| v.parse::<f64>().is_ok()) {
        return CellType::Number;
    }
    if non_empty.clone().all(|v| v == "true" || v == "false") {
        return CellType::Boolean;
    }
    if non_empty.all(|v| NaiveDate::parse_from_str(v, "%Y-%m-%d").is_ok()) {
        return CellType::Date;
    }
    CellType::String
}

fn parse_cell(field: &str, cell_type: CellType) -> Cell {
    if field.is_empty() {
        return Cell::Missing;
    }
    match cell_type {
        CellType::Number => field.parse::<f64>().map(Cell::Number).unwrap_or(Cell::Missing),
        CellType::Boolean => Cell::Boolean(field == "true"),
        CellType::Date => NaiveDate::parse_from_str(field, "%Y-%m-%d")
            .map(Cell::Date)
            .unwrap_or(Cell::Missing),
        CellType::String => Cell::String(field.to_string()),
    }
}

#[async_trait]
impl NodeModel for CsvSourceModel {
    fn in_ports(&self) -> usize {
        0
    }

    fn out_ports(&self) -> usize {
        1
    }

    fn configure(&self, in_specs: &[DataTableSpec]) -> Result<Vec<DataTableSpec>, NodeError> {
        if !in_specs.is_empty() {
            return Err(NodeError::Configuration(
                "csv source takes no inputs".into(),
            ));
        }
        let (spec, _) = self.parse()?;
        Ok(vec![spec])
    }

    async fn execute(
        &self,
        _inputs: &[Arc<DataTable>],
        ctx: &ExecutionContext,
    ) -> Result<Vec<Arc<DataTable>>, NodeError> {
        let (spec, rows) = self.parse()?;
        let total = rows.len().max(1);
        let mut builder = ctx.new_table(spec);
        for (i, cells) in rows.into_iter().enumerate() {
            ctx.check_cancelled()?;
            builder.add_cells(cells)?;
            if i % 1000 == 0 {
                ctx.set_progress(i as f64 / total as f64, "parsing rows");
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
        let config: CsvSourceConfig = settings.decode()?;
        if config.csv.trim().is_empty() {
            return Err(NodeError::Validation("csv text must not be empty".into()));
        }
        if config.delimiter.chars().count() != 1 {
            return Err(NodeError::Validation(
                "delimiter must be a single character".into(),
            ));
        }
        Ok(())
    }
}
