use std::collections::HashSet;
use std::sync::Arc;

use super::cell::Cell;
use super::row::DataRow;
use super::spec::DataTableSpec;
use crate::error::NodeError;

/// Append-only builder for a [`DataTable`].
///
/// Validates each row against the spec on `add_row`: cell count must match
/// the column count, each cell's type must match its column's declared type
/// (missing cells are accepted anywhere), and row keys must be unique.
pub struct DataTableBuilder {
    spec: Arc<DataTableSpec>,
    rows: Vec<DataRow>,
    keys: HashSet<String>,
}

impl DataTableBuilder {
    pub fn new(spec: DataTableSpec) -> Self {
        DataTableBuilder {
            spec: Arc::new(spec),
            rows: Vec::new(),
            keys: HashSet::new(),
        }
    }

    pub fn spec(&self) -> &DataTableSpec {
        &self.spec
    }

    pub fn add_row(&mut self, row: DataRow) -> Result<(), NodeError> {
        if row.len() != self.spec.len() {
            return Err(NodeError::Execution(format!(
                "row '{}' has {} cells, spec declares {} columns",
                row.key(),
                row.len(),
                self.spec.len()
            )));
        }
        for (idx, cell) in row.cells().iter().enumerate() {
            let column = &self.spec.columns()[idx];
            if let Some(actual) = cell.cell_type() {
                if actual != column.cell_type {
                    return Err(NodeError::TypeMismatch {
                        column: column.name.clone(),
                        expected: column.cell_type.to_string(),
                        actual: actual.to_string(),
                    });
                }
            }
        }
        if !self.keys.insert(row.key().to_string()) {
            return Err(NodeError::Execution(format!(
                "duplicate row key '{}'",
                row.key()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    /// Convenience: add a row with an auto-generated positional key.
    pub fn add_cells(&mut self, cells: Vec<Cell>) -> Result<(), NodeError> {
        let key = format!("row-{}", self.rows.len());
        self.add_row(DataRow::new(key, cells))
    }

    /// Freeze into an immutable table.
    pub fn close(self) -> DataTable {
        DataTable {
            spec: self.spec,
            rows: self.rows,
        }
    }
}

/// Immutable, typed, columnar table produced by a node.
///
/// Shared downstream via `Arc`; multiple consumers read the same allocation.
#[derive(Debug, Clone)]
pub struct DataTable {
    spec: Arc<DataTableSpec>,
    rows: Vec<DataRow>,
}

impl DataTable {
    pub fn builder(spec: DataTableSpec) -> DataTableBuilder {
        DataTableBuilder::new(spec)
    }

    /// An empty table with the given spec.
    pub fn empty(spec: DataTableSpec) -> Self {
        DataTableBuilder::new(spec).close()
    }

    pub fn spec(&self) -> &DataTableSpec {
        &self.spec
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, index: usize) -> Option<&DataRow> {
        self.rows.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DataRow> {
        self.rows.iter()
    }

    /// Cell at (row, column), if both indices are in range.
    pub fn cell(&self, row: usize, column: usize) -> Option<&Cell> {
        self.rows.get(row).and_then(|r| r.cell(column))
    }
}

impl<'a> IntoIterator for &'a DataTable {
    type Item = &'a DataRow;
    type IntoIter = std::slice::Iter<'a, DataRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
