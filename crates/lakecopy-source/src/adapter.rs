//! Source database traits for enumerating and loading tables

use lakecopy_core::{ConnectionOptions, Schema, TableDataset};
use std::fmt;

/// Identifies a table in the source database
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableIdentifier {
    /// Database name
    pub database: String,

    /// Schema name
    pub schema: String,

    /// Table name
    pub table: String,
}

impl TableIdentifier {
    /// Create a new table identifier
    pub fn new(database: impl Into<String>, schema: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            schema: schema.into(),
            table: table.into(),
        }
    }

    /// Get fully qualified name
    pub fn fqn(&self) -> String {
        format!("{}.{}.{}", self.database, self.schema, self.table)
    }

    /// `"schema"."table"` with identifiers quoted for SQL
    pub fn quoted(&self) -> String {
        format!("{}.{}", quote_ident(&self.schema), quote_ident(&self.table))
    }
}

impl fmt::Display for TableIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.fqn())
    }
}

/// Quote a SQL identifier
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Errors that can occur when talking to the source database
#[derive(Debug, Clone, thiserror::Error)]
pub enum FetchError {
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Query failed: {0}")]
    QueryError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// An open connection to a source database
#[async_trait::async_trait]
pub trait SourceDatabase: Send + Sync {
    /// Get the source name (e.g., "PostgreSQL")
    fn name(&self) -> &'static str;

    /// List the base tables of a schema
    ///
    /// Names are returned in the order the metadata catalog yields them;
    /// views and foreign tables are excluded.
    async fn list_tables(&self, schema: &str) -> Result<Vec<String>, FetchError>;

    /// Fetch the resolved schema of a table
    async fn fetch_schema(&self, table: &TableIdentifier) -> Result<Schema, FetchError>;

    /// Read every row of a table
    async fn load_table(&self, table: &TableIdentifier) -> Result<TableDataset, FetchError>;

    /// Test the connection to the database
    async fn test_connection(&self) -> Result<(), FetchError>;
}

/// Opens [`SourceDatabase`] connections from a connection descriptor
#[async_trait::async_trait]
pub trait SourceConnector: Send + Sync {
    fn name(&self) -> &'static str;

    async fn connect(&self, options: &ConnectionOptions) -> Result<Box<dyn SourceDatabase>, FetchError>;
}
