//! Table model.

use std::ops::Range;
use std::path::{Path, PathBuf};

use super::column::Column;
use super::{DataError, DataResult};

/// A table and its ordered columns.
#[derive(Debug)]
pub struct Table {
    name: String,
    path: PathBuf,
    columns: Vec<Column>,
    /// Index of the first column in the database-wide column space.
    offset: usize,
}

impl Table {
    /// Create a table and attach every column to it.
    ///
    /// The offset stays 0 until the table is placed into a
    /// [`Database`](super::Database).
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>, mut columns: Vec<Column>) -> Self {
        let name = name.into();
        for column in &mut columns {
            column.attach_to(&name);
        }
        Self {
            name,
            path: path.into(),
            columns,
            offset: 0,
        }
    }

    pub(crate) fn set_offset(&mut self, offset: usize) {
        self.offset = offset;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn column(&self, n: usize) -> Option<&Column> {
        self.columns.get(n)
    }

    pub fn column_by_name(&self, label: &str) -> DataResult<&Column> {
        self.columns
            .iter()
            .find(|column| column.label() == label)
            .ok_or_else(|| DataError::ColumnNotFound {
                table: self.name.clone(),
                column: label.to_string(),
            })
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Global column indices covered by this table.
    pub fn column_range(&self) -> Range<usize> {
        self.offset..self.offset + self.columns.len()
    }
}
