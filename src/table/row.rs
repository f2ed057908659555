use super::cell::Cell;

/// One table row: a unique key plus one cell per column, in spec order.
#[derive(Debug, Clone, PartialEq)]
pub struct DataRow {
    key: String,
    cells: Vec<Cell>,
}

impl DataRow {
    pub fn new(key: impl Into<String>, cells: Vec<Cell>) -> Self {
        DataRow {
            key: key.into(),
            cells,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn cell(&self, index: usize) -> Option<&Cell> {
        self.cells.get(index)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_accessors() {
        let row = DataRow::new("r0", vec![Cell::from("east"), Cell::Number(150.0)]);
        assert_eq!(row.key(), "r0");
        assert_eq!(row.len(), 2);
        assert_eq!(row.cell(1), Some(&Cell::Number(150.0)));
        assert_eq!(row.cell(2), None);
    }
}
