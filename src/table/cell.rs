use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Declared type of a table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellType {
    Number,
    String,
    Boolean,
    Date,
}

impl CellType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CellType::Number => "number",
            CellType::String => "string",
            CellType::Boolean => "boolean",
            CellType::Date => "date",
        }
    }
}

impl std::fmt::Display for CellType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single tagged value in a row.
///
/// `Missing` stands for an absent value and is accepted in any column;
/// coercion between types happens at node boundaries, never inside a table.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Number(f64),
    String(String),
    Boolean(bool),
    Date(NaiveDate),
    Missing,
}

impl Cell {
    /// The type tag of this cell, or `None` for a missing value.
    pub fn cell_type(&self) -> Option<CellType> {
        match self {
            Cell::Number(_) => Some(CellType::Number),
            Cell::String(_) => Some(CellType::String),
            Cell::Boolean(_) => Some(CellType::Boolean),
            Cell::Date(_) => Some(CellType::Date),
            Cell::Missing => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Cell::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Cell::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Cell::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// JSON projection used for dashboard payloads.
    pub fn to_json(&self) -> Value {
        match self {
            Cell::Number(n) => serde_json::json!(n),
            Cell::String(s) => Value::String(s.clone()),
            Cell::Boolean(b) => Value::Bool(*b),
            Cell::Date(d) => Value::String(d.format("%Y-%m-%d").to_string()),
            Cell::Missing => Value::Null,
        }
    }
}

impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Cell::Number(n) => write!(f, "{}", n),
            Cell::String(s) => f.write_str(s),
            Cell::Boolean(b) => write!(f, "{}", b),
            Cell::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Cell::Missing => f.write_str(""),
        }
    }
}

impl From<f64> for Cell {
    fn from(v: f64) -> Self {
        Cell::Number(v)
    }
}

impl From<&str> for Cell {
    fn from(v: &str) -> Self {
        Cell::String(v.to_string())
    }
}

impl From<String> for Cell {
    fn from(v: String) -> Self {
        Cell::String(v)
    }
}

impl From<bool> for Cell {
    fn from(v: bool) -> Self {
        Cell::Boolean(v)
    }
}

impl From<NaiveDate> for Cell {
    fn from(v: NaiveDate) -> Self {
        Cell::Date(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_type_tags() {
        assert_eq!(Cell::Number(1.0).cell_type(), Some(CellType::Number));
        assert_eq!(Cell::from("x").cell_type(), Some(CellType::String));
        assert_eq!(Cell::Boolean(true).cell_type(), Some(CellType::Boolean));
        assert_eq!(Cell::Missing.cell_type(), None);
        assert!(Cell::Missing.is_missing());
    }

    #[test]
    fn test_cell_accessors() {
        assert_eq!(Cell::Number(2.5).as_number(), Some(2.5));
        assert_eq!(Cell::from("hi").as_str(), Some("hi"));
        assert_eq!(Cell::Boolean(false).as_bool(), Some(false));
        assert_eq!(Cell::from("hi").as_number(), None);
    }

    #[test]
    fn test_cell_to_json() {
        assert_eq!(Cell::Number(1.5).to_json(), serde_json::json!(1.5));
        assert_eq!(Cell::Missing.to_json(), Value::Null);
        let d = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(Cell::Date(d).to_json(), serde_json::json!("2024-03-01"));
    }

    #[test]
    fn test_cell_type_serde_lowercase() {
        assert_eq!(
            serde_json::to_string(&CellType::Number).unwrap(),
            "\"number\""
        );
        let t: CellType = serde_json::from_str("\"date\"").unwrap();
        assert_eq!(t, CellType::Date);
    }
}
