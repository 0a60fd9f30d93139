//! In-memory lakehouse for testing
//!
//! Keeps created tables (with their rows) in memory and logs every call, so
//! tests can check create-if-absent behavior, row counts and call order
//! without a catalog or object store.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let lakehouse = MemoryLakehouse::new()
//!     .with_namespace("ecommerce_db_dev")
//!     .with_table("ecommerce_db_dev", existing_products);
//!
//! assert_eq!(lakehouse.row_count("ecommerce_db_dev", "products"), Some(10));
//! ```
//!
//! ## Simulating Failures
//!
//! ```rust,ignore
//! let lakehouse = MemoryLakehouse::new()
//!     .with_write_error("orders", WriteError::CommitError("throttled".into()))
//!     .with_connection_failure();
//! ```

use crate::catalog::{DestinationTable, LakehouseCatalog, TableSpec, WriteError};
use crate::session::SUPPORTED_FORMAT_VERSION;
use lakecopy_core::TableDataset;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

/// A call observed by [`MemoryLakehouse`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogCall {
    EnsureNamespace(String),
    /// Existence check for a table name
    TableExists(String),
    /// Create attempt for a table name
    CreateTableAs(String),
    TestConnection,
}

fn table_key(namespace: &str, name: &str) -> String {
    format!("{}.{}", namespace, name)
}

/// In-memory lakehouse catalog
///
/// Clones share tables, namespaces and the call log.
#[derive(Clone, Default)]
pub struct MemoryLakehouse {
    /// Tables by `namespace.name`
    tables: Arc<Mutex<BTreeMap<String, TableDataset>>>,

    namespaces: Arc<Mutex<BTreeSet<String>>>,

    /// Errors to return when creating specific tables
    write_errors: HashMap<String, WriteError>,

    /// Error returned by `ensure_namespace`
    namespace_error: Option<WriteError>,

    /// Simulate connection failure in `test_connection`
    fail_connection: bool,

    calls: Arc<Mutex<Vec<CatalogCall>>>,
}

impl MemoryLakehouse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an existing namespace
    pub fn with_namespace(self, namespace: &str) -> Self {
        if let Ok(mut namespaces) = self.namespaces.lock() {
            namespaces.insert(namespace.to_string());
        }
        self
    }

    /// Seed an existing table (and its namespace)
    pub fn with_table(self, namespace: &str, dataset: TableDataset) -> Self {
        let this = self.with_namespace(namespace);
        if let Ok(mut tables) = this.tables.lock() {
            tables.insert(table_key(namespace, dataset.name()), dataset);
        }
        this
    }

    /// Fail creation of the table with this name
    pub fn with_write_error(mut self, table: &str, error: WriteError) -> Self {
        self.write_errors.insert(table.to_string(), error);
        self
    }

    /// Fail every `ensure_namespace` call
    pub fn with_namespace_error(mut self, error: WriteError) -> Self {
        self.namespace_error = Some(error);
        self
    }

    /// Configure to fail all connection tests
    pub fn with_connection_failure(mut self) -> Self {
        self.fail_connection = true;
        self
    }

    /// Rows stored in a table, if it exists
    pub fn row_count(&self, namespace: &str, name: &str) -> Option<usize> {
        self.tables
            .lock()
            .ok()
            .and_then(|tables| tables.get(&table_key(namespace, name)).map(|t| t.row_count()))
    }

    /// Stored copy of a table
    pub fn table(&self, namespace: &str, name: &str) -> Option<TableDataset> {
        self.tables
            .lock()
            .ok()
            .and_then(|tables| tables.get(&table_key(namespace, name)).cloned())
    }

    /// `namespace.name` of every stored table, sorted
    pub fn table_names(&self) -> Vec<String> {
        self.tables
            .lock()
            .map(|tables| tables.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn has_namespace(&self, namespace: &str) -> bool {
        self.namespaces
            .lock()
            .map(|namespaces| namespaces.contains(namespace))
            .unwrap_or(false)
    }

    /// Every call made so far, in order
    pub fn calls(&self) -> Vec<CatalogCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Names of the tables a create was attempted for, in order
    pub fn create_attempts(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                CatalogCall::CreateTableAs(table) => Some(table),
                _ => None,
            })
            .collect()
    }

    /// Forget recorded calls
    pub fn clear_calls(&self) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.clear();
        }
    }

    fn record(&self, call: CatalogCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

fn poisoned() -> WriteError {
    WriteError::CatalogError("in-memory catalog lock poisoned".to_string())
}

#[async_trait::async_trait]
impl LakehouseCatalog for MemoryLakehouse {
    fn name(&self) -> &'static str {
        "Memory"
    }

    async fn ensure_namespace(&self, namespace: &str, create: bool) -> Result<(), WriteError> {
        self.record(CatalogCall::EnsureNamespace(namespace.to_string()));

        if let Some(error) = &self.namespace_error {
            return Err(error.clone());
        }

        let mut namespaces = self.namespaces.lock().map_err(|_| poisoned())?;
        if namespaces.contains(namespace) {
            return Ok(());
        }
        if !create {
            return Err(WriteError::NamespaceError(format!(
                "Namespace {} does not exist",
                namespace
            )));
        }
        namespaces.insert(namespace.to_string());
        Ok(())
    }

    async fn table_exists(&self, table: &DestinationTable) -> Result<bool, WriteError> {
        self.record(CatalogCall::TableExists(table.name.clone()));

        let tables = self.tables.lock().map_err(|_| poisoned())?;
        Ok(tables.contains_key(&table_key(&table.namespace, &table.name)))
    }

    async fn create_table_as(
        &self,
        table: &DestinationTable,
        data: &TableDataset,
        spec: &TableSpec,
    ) -> Result<u64, WriteError> {
        self.record(CatalogCall::CreateTableAs(table.name.clone()));

        if let Some(error) = self.write_errors.get(&table.name) {
            return Err(error.clone());
        }

        if spec.format_version != SUPPORTED_FORMAT_VERSION {
            return Err(WriteError::UnsupportedFormat(format!(
                "{} format version {}",
                spec.format, spec.format_version
            )));
        }

        if !self.has_namespace(&table.namespace) {
            return Err(WriteError::NamespaceError(format!(
                "Namespace {} does not exist",
                table.namespace
            )));
        }

        let mut tables = self.tables.lock().map_err(|_| poisoned())?;
        let key = table_key(&table.namespace, &table.name);
        if tables.contains_key(&key) {
            return Err(WriteError::CatalogError(format!("Table {} already exists", table)));
        }

        // Stored under the destination name, not the source relation name
        let (schema, rows) = data.clone().into_parts();
        let stored = TableDataset::new(table.name.clone(), schema, rows)
            .map_err(|e| WriteError::ConversionError(e.to_string()))?;
        let count = stored.row_count() as u64;
        tables.insert(key, stored);

        Ok(count)
    }

    async fn test_connection(&self) -> Result<(), WriteError> {
        self.record(CatalogCall::TestConnection);

        if self.fail_connection {
            Err(WriteError::CatalogError(
                "Simulated connection failure".to_string(),
            ))
        } else {
            Ok(())
        }
    }
}
