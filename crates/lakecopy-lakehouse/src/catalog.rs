//! Lakehouse catalog trait and destination addressing

use lakecopy_core::TableDataset;
use std::collections::BTreeMap;
use std::fmt;

/// A catalog-registered destination table, `catalog.namespace.name`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DestinationTable {
    /// Name the catalog is registered under in the session
    pub catalog: String,

    /// Namespace (Glue database)
    pub namespace: String,

    /// Table name
    pub name: String,
}

impl DestinationTable {
    pub fn new(catalog: impl Into<String>, namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            catalog: catalog.into(),
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Get fully qualified name
    pub fn fqn(&self) -> String {
        format!("{}.{}.{}", self.catalog, self.namespace, self.name)
    }
}

impl fmt::Display for DestinationTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.fqn())
    }
}

/// Table format of created tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TableFormat {
    #[default]
    Iceberg,
}

impl fmt::Display for TableFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableFormat::Iceberg => write!(f, "iceberg"),
        }
    }
}

/// How a destination table is created
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSpec {
    pub format: TableFormat,

    pub format_version: u8,

    /// Extra table properties
    pub properties: BTreeMap<String, String>,
}

impl TableSpec {
    pub fn iceberg(format_version: u8) -> Self {
        Self {
            format: TableFormat::Iceberg,
            format_version,
            properties: BTreeMap::new(),
        }
    }

    pub fn with_properties(mut self, properties: BTreeMap<String, String>) -> Self {
        self.properties = properties;
        self
    }
}

/// Errors that can occur when writing to the lakehouse
#[derive(Debug, Clone, thiserror::Error)]
pub enum WriteError {
    #[error("Namespace error: {0}")]
    NamespaceError(String),

    #[error("Catalog error: {0}")]
    CatalogError(String),

    #[error("Schema conversion failed: {0}")]
    SchemaError(String),

    #[error("Data conversion failed: {0}")]
    ConversionError(String),

    #[error("Writing data files failed: {0}")]
    DataFileError(String),

    #[error("Commit failed: {0}")]
    CommitError(String),

    #[error("Unsupported table format: {0}")]
    UnsupportedFormat(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// A catalog that registers tables and stores their data
#[async_trait::async_trait]
pub trait LakehouseCatalog: Send + Sync {
    /// Get the catalog name (e.g., "AWS Glue")
    fn name(&self) -> &'static str;

    /// Make sure `namespace` exists, creating it when `create` is set
    async fn ensure_namespace(&self, namespace: &str, create: bool) -> Result<(), WriteError>;

    /// Whether a table is already registered
    async fn table_exists(&self, table: &DestinationTable) -> Result<bool, WriteError>;

    /// Create `table` and fill it with every row of `data`
    ///
    /// Returns the number of rows written. Callers check
    /// [`table_exists`](Self::table_exists) first; creating a table that
    /// already exists is an error.
    async fn create_table_as(
        &self,
        table: &DestinationTable,
        data: &TableDataset,
        spec: &TableSpec,
    ) -> Result<u64, WriteError>;

    /// Test the connection to the catalog
    async fn test_connection(&self) -> Result<(), WriteError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_destination_table_fqn() {
        let table = DestinationTable::new("glue_catalog", "ecommerce_db_dev", "orders");
        assert_eq!(table.fqn(), "glue_catalog.ecommerce_db_dev.orders");
        assert_eq!(table.to_string(), "glue_catalog.ecommerce_db_dev.orders");
    }

    #[test]
    fn test_table_spec() {
        let spec = TableSpec::iceberg(2)
            .with_properties(BTreeMap::from([("write.format.default".to_string(), "parquet".to_string())]));
        assert_eq!(spec.format.to_string(), "iceberg");
        assert_eq!(spec.format_version, 2);
        assert_eq!(spec.properties.len(), 1);
    }
}
