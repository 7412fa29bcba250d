//! In-memory tabular data shared by the loader and the XML serializer.

use serde::{Deserialize, Serialize};

use crate::value::CellValue;

/// Rows of named fields, in source order.
///
/// The table owns the header; rows only hold values, so every record of one
/// table has the same column set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub headers: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl Table {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    /// Append a row, padding missing trailing cells with [`CellValue::Empty`].
    ///
    /// Cells beyond the header width have no column to live in and are dropped.
    pub fn push_row(&mut self, mut values: Vec<CellValue>) {
        values.resize(self.headers.len(), CellValue::Empty);
        self.rows.push(values);
    }

    pub fn width(&self) -> usize {
        self.headers.len()
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn record(&self, index: usize) -> Option<Record<'_>> {
        self.rows.get(index).map(|values| Record {
            headers: &self.headers,
            values,
        })
    }

    pub fn records(&self) -> impl Iterator<Item = Record<'_>> {
        self.rows.iter().map(|values| Record {
            headers: &self.headers,
            values,
        })
    }

    /// Position of a column, compared case-sensitively.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == name)
    }
}

/// One row of a [`Table`], keyed by column name.
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    headers: &'a [String],
    values: &'a [CellValue],
}

impl<'a> Record<'a> {
    pub fn get(&self, column: &str) -> Option<&'a CellValue> {
        self.headers
            .iter()
            .position(|header| header == column)
            .and_then(|idx| self.values.get(idx))
    }

    /// Column name / value pairs in column order.
    pub fn fields(&self) -> impl Iterator<Item = (&'a str, &'a CellValue)> + use<'a> {
        self.headers
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }

    pub fn values(&self) -> &'a [CellValue] {
        self.values
    }
}
