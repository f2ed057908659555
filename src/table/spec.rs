use serde::{Deserialize, Serialize};

use super::cell::CellType;
use crate::error::NodeError;

/// Name and declared type of one table column. Immutable once part of a spec.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub cell_type: CellType,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, cell_type: CellType) -> Self {
        ColumnSpec {
            name: name.into(),
            cell_type,
        }
    }
}

/// Ordered sequence of column specs; column names are unique within a spec.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataTableSpec {
    columns: Vec<ColumnSpec>,
}

impl DataTableSpec {
    /// Build a spec, rejecting duplicate column names.
    pub fn new(columns: Vec<ColumnSpec>) -> Result<Self, NodeError> {
        let mut seen = std::collections::HashSet::new();
        for col in &columns {
            if !seen.insert(col.name.as_str()) {
                return Err(NodeError::Configuration(format!(
                    "duplicate column name '{}'",
                    col.name
                )));
            }
        }
        Ok(DataTableSpec { columns })
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column(&self, index: usize) -> Option<&ColumnSpec> {
        self.columns.get(index)
    }

    /// Index of the column with the given name, if present.
    pub fn find_column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Look up a column by name, with a descriptive configuration error on
    /// absence. Convenience for node `configure` implementations.
    pub fn require_column(&self, name: &str) -> Result<(usize, &ColumnSpec), NodeError> {
        self.find_column_index(name)
            .map(|i| (i, &self.columns[i]))
            .ok_or_else(|| {
                NodeError::Configuration(format!("input table has no column '{}'", name))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> DataTableSpec {
        DataTableSpec::new(vec![
            ColumnSpec::new("region", CellType::String),
            ColumnSpec::new("amount", CellType::Number),
        ])
        .unwrap()
    }

    #[test]
    fn test_find_column_index() {
        let s = spec();
        assert_eq!(s.find_column_index("region"), Some(0));
        assert_eq!(s.find_column_index("amount"), Some(1));
        assert_eq!(s.find_column_index("nope"), None);
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let err = DataTableSpec::new(vec![
            ColumnSpec::new("a", CellType::Number),
            ColumnSpec::new("a", CellType::String),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("duplicate column name 'a'"));
    }

    #[test]
    fn test_require_column() {
        let s = spec();
        let (idx, col) = s.require_column("amount").unwrap();
        assert_eq!(idx, 1);
        assert_eq!(col.cell_type, CellType::Number);
        assert!(s.require_column("missing").is_err());
    }

    #[test]
    fn test_spec_serde_round_trip() {
        let s = spec();
        let json = serde_json::to_value(&s).unwrap();
        let back: DataTableSpec = serde_json::from_value(json).unwrap();
        assert_eq!(back, s);
    }
}
