//! In-memory snapshot of one source table

use crate::schema::Schema;
use crate::value::Row;

/// Errors raised while assembling a dataset
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DatasetError {
    #[error("Row {row} of {table} has {actual} values, schema has {expected} columns")]
    ArityMismatch {
        table: String,
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Row {row} of {table}: value in column '{column}' does not match type {expected}")]
    TypeMismatch {
        table: String,
        row: usize,
        column: String,
        expected: String,
    },
}

/// All rows of one source table together with its resolved schema
///
/// A dataset is produced by a single load and consumed by a single write;
/// it is never cached across tables.
#[derive(Debug, Clone, PartialEq)]
pub struct TableDataset {
    name: String,
    schema: Schema,
    rows: Vec<Row>,
}

impl TableDataset {
    /// Build a dataset, checking every row against the schema
    pub fn new(name: impl Into<String>, schema: Schema, rows: Vec<Row>) -> Result<Self, DatasetError> {
        let name = name.into();

        for (idx, row) in rows.iter().enumerate() {
            if row.len() != schema.len() {
                return Err(DatasetError::ArityMismatch {
                    table: name,
                    row: idx,
                    expected: schema.len(),
                    actual: row.len(),
                });
            }

            for (value, column) in row.iter().zip(&schema.columns) {
                if !value.fits(&column.logical_type) {
                    return Err(DatasetError::TypeMismatch {
                        table: name,
                        row: idx,
                        column: column.name.clone(),
                        expected: column.logical_type.to_string(),
                    });
                }
            }
        }

        Ok(Self { name, schema, rows })
    }

    /// Create a dataset with no rows
    pub fn empty(name: impl Into<String>, schema: Schema) -> Self {
        Self {
            name: name.into(),
            schema,
            rows: Vec::new(),
        }
    }

    /// Source relation name
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Schema rendered for operator output
    pub fn print_schema(&self) -> String {
        self.schema.tree_string()
    }

    /// Split into schema and rows
    pub fn into_parts(self) -> (Schema, Vec<Row>) {
        (self.schema, self.rows)
    }
}
