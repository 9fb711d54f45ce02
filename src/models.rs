use crate::colour::Rgba;
use crate::error::{MaterializeError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of value an attribute holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Number,
    Text,
    /// Hex colour string, or data values mapped through a palette.
    Colour,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::Number => write!(f, "number"),
            ValueKind::Text => write!(f, "string"),
            ValueKind::Colour => write!(f, "colour"),
        }
    }
}

/// A single dynamic value from user parameters or a data column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Number(f64),
    Text(String),
}

impl From<f64> for Cell {
    fn from(v: f64) -> Self {
        Cell::Number(v)
    }
}

impl From<&str> for Cell {
    fn from(v: &str) -> Self {
        Cell::Text(v.to_string())
    }
}

impl From<String> for Cell {
    fn from(v: String) -> Self {
        Cell::Text(v)
    }
}

/// One column of values. All variants hold exactly one entry per row.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Number(Vec<f64>),
    Text(Vec<String>),
    /// Multi-valued colour column; serialized as hex or `[r, g, b, a]`.
    Rgba(Vec<Rgba>),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Column::Number(v) => v.len(),
            Column::Text(v) => v.len(),
            Column::Rgba(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Column::Number(_) => ValueKind::Number,
            Column::Text(_) => ValueKind::Text,
            Column::Rgba(_) => ValueKind::Colour,
        }
    }

    /// Column values as dynamic cells. Colours come out as hex strings.
    pub fn cells(&self) -> Vec<Cell> {
        match self {
            Column::Number(v) => v.iter().copied().map(Cell::Number).collect(),
            Column::Text(v) => v.iter().cloned().map(Cell::Text).collect(),
            Column::Rgba(v) => v.iter().map(|c| Cell::Text(c.to_hex())).collect(),
        }
    }
}

/// Base dataset: named columns sharing one row count.
///
/// A table can have rows but no columns, e.g. when only the row count of the
/// host's data frame matters.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataTable {
    nrows: usize,
    columns: Vec<(String, Column)>,
}

impl DataTable {
    /// Build a table from named columns. All columns must share one length.
    pub fn new(columns: Vec<(String, Column)>) -> Result<Self> {
        let nrows = columns.first().map(|(_, c)| c.len()).unwrap_or(0);
        for (name, col) in &columns {
            if col.len() != nrows {
                return Err(MaterializeError::shape_mismatch(name.as_str(), nrows, col.len()));
            }
        }
        Ok(Self { nrows, columns })
    }

    /// A table with `n` rows and no columns.
    pub fn with_rows(n: usize) -> Self {
        Self {
            nrows: n,
            columns: Vec::new(),
        }
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|(n, _)| n == name).map(|(_, c)| c)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(n, _)| n.as_str())
    }

    /// Add or replace a column. Its length must match the row count,
    /// unless the table is still completely empty.
    pub fn insert(&mut self, name: impl Into<String>, column: Column) -> Result<()> {
        let name = name.into();
        if self.columns.is_empty() && self.nrows == 0 {
            self.nrows = column.len();
        } else if column.len() != self.nrows {
            return Err(MaterializeError::shape_mismatch(name, self.nrows, column.len()));
        }
        match self.columns.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = column,
            None => self.columns.push((name, column)),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unequal_columns_are_rejected() {
        let err = DataTable::new(vec![
            ("a".into(), Column::Number(vec![1.0, 2.0])),
            ("b".into(), Column::Text(vec!["x".into()])),
        ])
        .unwrap_err();
        match err {
            MaterializeError::ShapeMismatch {
                attribute,
                expected,
                actual,
            } => {
                assert_eq!(attribute, "b");
                assert_eq!(expected, 2);
                assert_eq!(actual, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn insert_replaces_existing_column() {
        let mut t = DataTable::with_rows(2);
        t.insert("v", Column::Number(vec![1.0, 2.0])).unwrap();
        t.insert("v", Column::Number(vec![3.0, 4.0])).unwrap();
        assert_eq!(t.column_names().count(), 1);
        assert_eq!(t.column("v"), Some(&Column::Number(vec![3.0, 4.0])));
        assert!(t.insert("w", Column::Number(vec![1.0])).is_err());
    }
}
