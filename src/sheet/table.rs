/// Row-major table: a header row plus data rows. `None` marks a missing cell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl Table {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Self {
        Self { columns, rows }
    }

    /// Build a table from string literals; empty strings stay as values.
    pub fn from_strings(columns: &[&str], rows: &[&[&str]]) -> Self {
        Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: rows
                .iter()
                .map(|row| row.iter().map(|v| Some(v.to_string())).collect())
                .collect(),
        }
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cell text, with missing cells (and short rows) read as "".
    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .and_then(|c| c.as_deref())
            .unwrap_or("")
    }

    /// Cell text looked up by column name.
    pub fn get(&self, row: usize, column: &str) -> Option<&str> {
        self.column_index(column).map(|col| self.cell(row, col))
    }

    /// Append a column. Short rows are padded so the new value lands under
    /// its header.
    pub fn push_column(&mut self, name: impl Into<String>, values: Vec<String>) {
        let width = self.columns.len();
        self.columns.push(name.into());
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.resize(width, None);
            row.push(Some(value));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_reads_missing_as_empty() {
        let table = Table::new(
            vec!["A".to_string(), "B".to_string()],
            vec![vec![Some("x".to_string())], vec![None, Some("y".to_string())]],
        );
        assert_eq!(table.cell(0, 1), "");
        assert_eq!(table.cell(1, 0), "");
        assert_eq!(table.get(1, "B"), Some("y"));
        assert_eq!(table.get(0, "C"), None);
    }

    #[test]
    fn test_push_column_pads_short_rows() {
        let mut table = Table::new(
            vec!["A".to_string(), "B".to_string()],
            vec![vec![Some("x".to_string())]],
        );
        table.push_column("R", vec!["r".to_string()]);
        assert_eq!(table.rows[0], vec![Some("x".to_string()), None, Some("r".to_string())]);
        assert_eq!(table.get(0, "R"), Some("r"));
    }
}
