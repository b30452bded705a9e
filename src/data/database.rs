//! Database model and global column offsets.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::column::Column;
use super::dependency::{ColumnRef, DatabaseMetadata};
use super::table::Table;
use super::{DataError, DataResult};

/// Which side of a scenario a database is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatabaseSide {
    Source,
    Target,
}

impl fmt::Display for DatabaseSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatabaseSide::Source => write!(f, "source"),
            DatabaseSide::Target => write!(f, "target"),
        }
    }
}

/// A set of tables sharing one global column index space.
#[derive(Debug)]
pub struct Database {
    name: String,
    path: PathBuf,
    tables: Vec<Table>,
    metadata: DatabaseMetadata,
    num_columns: usize,
}

impl Database {
    /// Create a database and assign table offsets.
    ///
    /// Each table's offset is the number of columns in all tables before
    /// it, so the ranges `[offset, offset + num_columns)` partition
    /// `[0, num_columns)` in table order.
    pub fn new(
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        mut tables: Vec<Table>,
    ) -> DataResult<Self> {
        let name = name.into();

        let mut seen = HashSet::new();
        for table in &tables {
            if !seen.insert(table.name().to_string()) {
                return Err(DataError::DuplicateTable {
                    database: name,
                    table: table.name().to_string(),
                });
            }
        }

        let mut offset = 0;
        for table in &mut tables {
            table.set_offset(offset);
            offset += table.num_columns();
        }

        Ok(Self {
            name,
            path: path.into(),
            tables,
            metadata: DatabaseMetadata::default(),
            num_columns: offset,
        })
    }

    /// Attach dependency metadata, checking that every referenced column exists.
    pub fn with_metadata(mut self, metadata: DatabaseMetadata) -> DataResult<Self> {
        let fd_columns = metadata.fds.iter().flat_map(|fd| fd.columns());
        let ucc_columns = metadata.uccs.iter().flat_map(|ucc| ucc.columns.iter());
        for column in fd_columns.chain(ucc_columns) {
            self.resolve(column)
                .map_err(|_| DataError::UnknownDependencyColumn(column.clone()))?;
        }
        self.metadata = metadata;
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn metadata(&self) -> &DatabaseMetadata {
        &self.metadata
    }

    /// Total number of columns over all tables.
    pub fn num_columns(&self) -> usize {
        self.num_columns
    }

    pub fn table_by_name(&self, name: &str) -> DataResult<&Table> {
        self.tables
            .iter()
            .find(|table| table.name() == name)
            .ok_or_else(|| DataError::TableNotFound {
                database: self.name.clone(),
                table: name.to_string(),
            })
    }

    /// Look up a column by its global index.
    pub fn column_by_index(&self, index: usize) -> DataResult<&Column> {
        self.tables
            .iter()
            .find(|table| table.column_range().contains(&index))
            .and_then(|table| table.column(index - table.offset()))
            .ok_or_else(|| DataError::ColumnIndexOutOfRange {
                database: self.name.clone(),
                index,
                num_columns: self.num_columns,
            })
    }

    /// Iterate all columns in global index order.
    pub fn columns(&self) -> impl Iterator<Item = &Column> {
        self.tables.iter().flat_map(|table| table.columns())
    }

    pub fn resolve(&self, column: &ColumnRef) -> DataResult<&Column> {
        self.table_by_name(&column.table)?
            .column_by_name(&column.column)
    }
}
