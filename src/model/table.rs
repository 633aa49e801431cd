//! Table content.

use serde::{Deserialize, Serialize};

/// Table cell text matrix.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TableData {
    /// Rows of cell texts
    pub rows: Vec<Vec<String>>,

    /// 1-based table sequence number
    pub sequence: u32,
}

impl TableData {
    /// Create an empty table with the given sequence number.
    pub fn new(sequence: u32) -> Self {
        Self {
            rows: Vec::new(),
            sequence,
        }
    }

    /// Append a row of cell texts.
    pub fn add_row(&mut self, cells: Vec<String>) {
        self.rows.push(cells);
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Width of the widest row.
    pub fn column_count(&self) -> usize {
        self.rows.iter().map(|r| r.len()).max().unwrap_or(0)
    }

    /// Check if the table holds no cells.
    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(|r| r.is_empty())
    }

    /// Cells joined by tabs, rows by newlines.
    pub fn plain_text(&self) -> String {
        self.rows
            .iter()
            .map(|r| r.join("\t"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_dimensions() {
        let mut table = TableData::new(2);
        assert!(table.is_empty());
        table.add_row(vec!["指标".into(), "数值".into()]);
        table.add_row(vec!["准确率".into()]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.column_count(), 2);
        assert_eq!(table.plain_text(), "指标\t数值\n准确率");
    }
}
