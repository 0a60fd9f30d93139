//! Mock source database for testing
//!
//! Serves predefined datasets without connecting to any database and keeps
//! a log of every call made against it, so tests can assert how many tables
//! were enumerated and loaded and in which order.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use lakecopy_source::{MockSourceBuilder, SourceConnector};
//!
//! let source = MockSourceBuilder::new()
//!     .with_table("public", orders_dataset)
//!     .with_table("public", customers_dataset)
//!     .build();
//!
//! let db = source.connect(&options).await?;
//! assert_eq!(db.list_tables("public").await?, vec!["orders", "customers"]);
//! ```
//!
//! ## Simulating Failures
//!
//! ```rust,ignore
//! let source = MockSourceBuilder::new()
//!     .with_table("public", orders_dataset)
//!     .with_error("public", "orders", FetchError::PermissionDenied("orders".into()))
//!     .with_latency(20)
//!     .build();
//! ```

use crate::adapter::{FetchError, SourceConnector, SourceDatabase, TableIdentifier};
use lakecopy_core::{ConnectionOptions, Schema, TableDataset};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::RwLock;

/// A call observed by [`MockSource`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceCall {
    /// Connection opened with this URL
    Connect(String),
    ListTables(String),
    FetchSchema(String),
    Load(String),
    TestConnection,
}

fn table_key(schema: &str, table: &str) -> String {
    format!("{}.{}", schema, table)
}

/// Mock source database
///
/// Tables are kept in insertion order per schema; `list_tables` returns
/// them in that order. Clones share the same tables, errors and call log.
#[derive(Clone)]
pub struct MockSource {
    /// Datasets with the schema they live in, in insertion order
    tables: Arc<RwLock<Vec<(String, TableDataset)>>>,

    /// Errors to return when loading specific tables
    errors: Arc<RwLock<HashMap<String, FetchError>>>,

    /// Error returned by `list_tables`
    list_error: Option<FetchError>,

    /// Error returned by `connect`
    connect_error: Option<FetchError>,

    /// Simulate connection failure in `test_connection`
    fail_connection: bool,

    /// Simulate query latency (milliseconds)
    latency_ms: u64,

    /// Name to return from name() method
    source_name: &'static str,

    calls: Arc<Mutex<Vec<SourceCall>>>,
}

impl MockSource {
    /// Create a new mock source with no tables
    pub fn new() -> Self {
        Self {
            tables: Arc::new(RwLock::new(Vec::new())),
            errors: Arc::new(RwLock::new(HashMap::new())),
            list_error: None,
            connect_error: None,
            fail_connection: false,
            latency_ms: 0,
            source_name: "Mock",
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Add a table to a schema, replacing any table with the same name
    pub async fn add_table(&self, schema: &str, dataset: TableDataset) {
        let mut tables = self.tables.write().await;
        if let Some(existing) = tables
            .iter_mut()
            .find(|(s, d)| s == schema && d.name() == dataset.name())
        {
            existing.1 = dataset;
        } else {
            tables.push((schema.to_string(), dataset));
        }
    }

    /// Configure an error to be returned when loading a specific table
    pub async fn add_error_for_table(&self, schema: &str, table: &str, error: FetchError) {
        self.errors.write().await.insert(table_key(schema, table), error);
    }

    /// Fail every `list_tables` call with `error`
    pub fn with_list_error(mut self, error: FetchError) -> Self {
        self.list_error = Some(error);
        self
    }

    /// Fail every `connect` call with `error`
    pub fn with_connect_error(mut self, error: FetchError) -> Self {
        self.connect_error = Some(error);
        self
    }

    /// Configure to fail all connection tests
    pub fn with_connection_failure(mut self) -> Self {
        self.fail_connection = true;
        self
    }

    /// Configure simulated latency for all operations
    pub fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    /// Set a custom source name
    pub fn with_name(mut self, name: &'static str) -> Self {
        self.source_name = name;
        self
    }

    /// Get the number of tables across all schemas
    pub async fn table_count(&self) -> usize {
        self.tables.read().await.len()
    }

    /// Every call made so far, in order
    pub fn calls(&self) -> Vec<SourceCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Names of the tables loaded so far, in order
    pub fn loaded_tables(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                SourceCall::Load(table) => Some(table),
                _ => None,
            })
            .collect()
    }

    /// Number of connections opened
    pub fn connect_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, SourceCall::Connect(_)))
            .count()
    }

    /// Forget recorded calls
    pub fn clear_calls(&self) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.clear();
        }
    }

    fn record(&self, call: SourceCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }

    /// Simulate latency if configured
    async fn simulate_latency(&self) {
        if self.latency_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.latency_ms)).await;
        }
    }

    async fn find(&self, table: &TableIdentifier) -> Result<TableDataset, FetchError> {
        if let Some(error) = self.errors.read().await.get(&table_key(&table.schema, &table.table)) {
            return Err(error.clone());
        }

        self.tables
            .read()
            .await
            .iter()
            .find(|(schema, dataset)| *schema == table.schema && dataset.name() == table.table)
            .map(|(_, dataset)| dataset.clone())
            .ok_or_else(|| FetchError::TableNotFound(table.fqn()))
    }
}

impl Default for MockSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl SourceDatabase for MockSource {
    fn name(&self) -> &'static str {
        self.source_name
    }

    async fn list_tables(&self, schema: &str) -> Result<Vec<String>, FetchError> {
        self.record(SourceCall::ListTables(schema.to_string()));
        self.simulate_latency().await;

        if let Some(error) = &self.list_error {
            return Err(error.clone());
        }

        Ok(self
            .tables
            .read()
            .await
            .iter()
            .filter(|(s, _)| s == schema)
            .map(|(_, dataset)| dataset.name().to_string())
            .collect())
    }

    async fn fetch_schema(&self, table: &TableIdentifier) -> Result<Schema, FetchError> {
        self.record(SourceCall::FetchSchema(table.table.clone()));
        self.simulate_latency().await;
        Ok(self.find(table).await?.schema().clone())
    }

    async fn load_table(&self, table: &TableIdentifier) -> Result<TableDataset, FetchError> {
        self.record(SourceCall::Load(table.table.clone()));
        self.simulate_latency().await;
        self.find(table).await
    }

    async fn test_connection(&self) -> Result<(), FetchError> {
        self.record(SourceCall::TestConnection);
        self.simulate_latency().await;

        if self.fail_connection {
            Err(FetchError::NetworkError(
                "Simulated connection failure".to_string(),
            ))
        } else {
            Ok(())
        }
    }
}

#[async_trait::async_trait]
impl SourceConnector for MockSource {
    fn name(&self) -> &'static str {
        self.source_name
    }

    async fn connect(&self, options: &ConnectionOptions) -> Result<Box<dyn SourceDatabase>, FetchError> {
        self.record(SourceCall::Connect(options.url.clone()));
        self.simulate_latency().await;

        if let Some(error) = &self.connect_error {
            return Err(error.clone());
        }

        Ok(Box::new(self.clone()))
    }
}

/// Builder for creating MockSource with multiple tables
///
/// ```rust,ignore
/// let source = MockSourceBuilder::new()
///     .with_table("public", orders)
///     .with_table("audit", events)
///     .with_list_error(FetchError::PermissionDenied("information_schema".into()))
///     .build();
/// ```
pub struct MockSourceBuilder {
    tables: Vec<(String, TableDataset)>,
    errors: HashMap<String, FetchError>,
    list_error: Option<FetchError>,
    connect_error: Option<FetchError>,
    fail_connection: bool,
    latency_ms: u64,
    source_name: &'static str,
}

impl MockSourceBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            tables: Vec::new(),
            errors: HashMap::new(),
            list_error: None,
            connect_error: None,
            fail_connection: false,
            latency_ms: 0,
            source_name: "Mock",
        }
    }

    /// Add a table to a schema
    pub fn with_table(mut self, schema: &str, dataset: TableDataset) -> Self {
        self.tables.push((schema.to_string(), dataset));
        self
    }

    /// Add a load error for a specific table
    pub fn with_error(mut self, schema: &str, table: &str, error: FetchError) -> Self {
        self.errors.insert(table_key(schema, table), error);
        self
    }

    /// Fail table enumeration
    pub fn with_list_error(mut self, error: FetchError) -> Self {
        self.list_error = Some(error);
        self
    }

    /// Fail connection attempts
    pub fn with_connect_error(mut self, error: FetchError) -> Self {
        self.connect_error = Some(error);
        self
    }

    /// Configure connection failure
    pub fn with_connection_failure(mut self) -> Self {
        self.fail_connection = true;
        self
    }

    /// Configure latency
    pub fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    /// Set source name
    pub fn with_name(mut self, name: &'static str) -> Self {
        self.source_name = name;
        self
    }

    /// Build the MockSource
    pub fn build(self) -> MockSource {
        MockSource {
            tables: Arc::new(RwLock::new(self.tables)),
            errors: Arc::new(RwLock::new(self.errors)),
            list_error: self.list_error,
            connect_error: self.connect_error,
            fail_connection: self.fail_connection,
            latency_ms: self.latency_ms,
            source_name: self.source_name,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl Default for MockSourceBuilder {
    fn default() -> Self {
        Self::new()
    }
}
