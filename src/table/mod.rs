//! In-memory tabular input: typed cells keyed by trimmed header names.

mod columns;
mod read;

use std::fmt;

pub use columns::{resolve_columns, ColumnSelection, KeywordSets, ResolvedColumns, KEYWORDS_V1};
pub use read::{read_table, read_table_from_bytes, TableFormat};

/// A single cell value as it came out of the source file.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Bool(b) => write!(f, "{b}"),
            Cell::Number(n) => write!(f, "{n}"),
            Cell::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self { Cell::Text(value.to_string()) }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self { Cell::Number(value) }
}

/// A rectangular table with a header row.
#[derive(Debug, Clone, Default)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Build a table, trimming header names and padding short rows with empty cells.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let headers: Vec<String> = headers.into_iter()
            .map(|header| header.trim().to_string())
            .collect();
        let width = headers.len();
        let rows = rows.into_iter()
            .map(|mut row| { row.resize(width, Cell::Empty); row })
            .collect();

        Self { headers, rows }
    }

    #[inline] pub fn headers(&self) -> &[String] { &self.headers }

    #[inline] pub fn rows(&self) -> &[Vec<Cell>] { &self.rows }

    #[inline] pub fn len(&self) -> usize { self.rows.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.rows.is_empty() }

    /// Position of a header, matched exactly.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headers_are_trimmed_and_rows_padded() {
        let table = Table::new(
            vec![" Site ".into(), "Lat".into(), " Lon".into()],
            vec![vec!["A".into(), 9.5.into()]],
        );

        assert_eq!(table.headers(), ["Site", "Lat", "Lon"]);
        assert_eq!(table.rows()[0].len(), 3);
        assert_eq!(table.rows()[0][2], Cell::Empty);
        assert_eq!(table.column_index("Lon"), Some(2));
        assert_eq!(table.column_index("lon"), None);
    }
}
