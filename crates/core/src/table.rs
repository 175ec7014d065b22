//! Tabular content for table shapes.

use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Minimal cell-access capability any tabular source must provide.
///
/// Adapters for data frames, CSV readers and similar sources implement this
/// and are turned into a [`TableContent`] with [`TableContent::from_tabular`].
pub trait Tabular {
    /// Column names, in display order.
    fn column_names(&self) -> Vec<String>;

    /// Number of data rows (not counting the header).
    fn row_count(&self) -> usize;

    /// Text of the cell at a data row and column.
    fn cell(&self, row: usize, column: usize) -> String;
}

/// Column names plus rows of already-stringified scalar values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableContent {
    /// Header row.
    pub columns: Vec<String>,

    /// Data rows. Rows shorter than `columns` are padded with empty cells.
    #[serde(default)]
    pub rows: Vec<Vec<String>>,
}

impl TableContent {
    /// Create table content from column names and rows of displayable values.
    pub fn new<C, V>(
        columns: impl IntoIterator<Item = C>,
        rows: impl IntoIterator<Item = Vec<V>>,
    ) -> Self
    where
        C: Into<String>,
        V: Display,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: rows
                .into_iter()
                .map(|row| row.iter().map(ToString::to_string).collect())
                .collect(),
        }
    }

    /// Copy the content of any tabular source.
    pub fn from_tabular<T: Tabular + ?Sized>(source: &T) -> Self {
        let columns = source.column_names();
        let rows = (0..source.row_count())
            .map(|r| (0..columns.len()).map(|c| source.cell(r, c)).collect())
            .collect();
        Self { columns, rows }
    }

    /// Append a data row.
    pub fn push_row<V: Display>(&mut self, row: impl IntoIterator<Item = V>) {
        self.rows.push(row.into_iter().map(|v| v.to_string()).collect());
    }
}

impl Tabular for TableContent {
    fn column_names(&self) -> Vec<String> {
        self.columns.clone()
    }

    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn cell(&self, row: usize, column: usize) -> String {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .cloned()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Squares;

    impl Tabular for Squares {
        fn column_names(&self) -> Vec<String> {
            vec!["n".to_string(), "n^2".to_string()]
        }

        fn row_count(&self) -> usize {
            3
        }

        fn cell(&self, row: usize, column: usize) -> String {
            let n = row + 1;
            if column == 0 { n.to_string() } else { (n * n).to_string() }
        }
    }

    #[test]
    fn test_new_stringifies_values() {
        let t = TableContent::new(["a", "b"], vec![vec![1, 3], vec![2, 4]]);
        assert_eq!(t.columns, vec!["a", "b"]);
        assert_eq!(t.rows[1], vec!["2", "4"]);
    }

    #[test]
    fn test_from_tabular() {
        let t = TableContent::from_tabular(&Squares);
        assert_eq!(t.row_count(), 3);
        assert_eq!(t.cell(2, 1), "9");
    }

    #[test]
    fn test_ragged_rows_pad_with_empty() {
        let mut t = TableContent::new(["a", "b", "c"], Vec::<Vec<i32>>::new());
        t.push_row([1]);
        assert_eq!(t.cell(0, 0), "1");
        assert_eq!(t.cell(0, 2), "");
        assert_eq!(t.cell(5, 0), "");
    }
}
