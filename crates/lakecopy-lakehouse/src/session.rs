//! Processing session: temporary views and create-if-absent statements
//!
//! A session is opened once per run against a [`LakehouseCatalog`] bound
//! to a warehouse location. Loaded datasets are staged as session-scoped
//! temporary views and materialized with a [`CreateTableAsSelect`]
//! statement. Stopping the session consumes it.

use crate::catalog::{DestinationTable, LakehouseCatalog, TableSpec, WriteError};
use lakecopy_core::{DestinationConfig, TableDataset};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// The only table format version created tables may use
pub const SUPPORTED_FORMAT_VERSION: u8 = 2;

/// Prefix of temporary view names
pub const TEMP_VIEW_PREFIX: &str = "tmp_";

/// Temporary view name for a source table
pub fn temp_view_name(table: &str) -> String {
    format!("{}{}", TEMP_VIEW_PREFIX, table)
}

/// Catalog binding of a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    /// Name the catalog is registered under
    pub catalog_name: String,

    /// Namespace receiving the tables
    pub namespace: String,

    /// Warehouse root, `s3://bucket/prefix`
    pub warehouse: String,

    pub format_version: u8,

    pub create_namespace: bool,

    /// Extra table properties
    pub properties: BTreeMap<String, String>,
}

impl SessionSettings {
    /// Settings for a destination bucket
    pub fn from_config(destination: &DestinationConfig, bucket: &str) -> Self {
        Self {
            catalog_name: destination.catalog_name.clone(),
            namespace: destination.namespace.clone(),
            warehouse: destination.warehouse_location(bucket),
            format_version: destination.format_version,
            create_namespace: destination.create_namespace,
            properties: destination.properties.clone(),
        }
    }

    /// Table spec applied to every created table
    pub fn table_spec(&self) -> TableSpec {
        TableSpec::iceberg(self.format_version).with_properties(self.properties.clone())
    }

    /// Destination address of a table in this session's namespace
    pub fn destination(&self, table: &str) -> DestinationTable {
        DestinationTable::new(&self.catalog_name, &self.namespace, table)
    }
}

/// `CREATE TABLE IF NOT EXISTS target USING format AS SELECT * FROM view`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTableAsSelect {
    pub target: DestinationTable,
    pub source_view: String,
    pub spec: TableSpec,
}

impl fmt::Display for CreateTableAsSelect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CREATE TABLE IF NOT EXISTS {} USING {} TBLPROPERTIES ('format-version' = '{}'",
            self.target.fqn(),
            self.spec.format,
            self.spec.format_version
        )?;
        for (key, value) in &self.spec.properties {
            write!(f, ", '{}' = '{}'", key, value)?;
        }
        write!(f, ") AS SELECT * FROM {}", self.source_view)
    }
}

/// Outcome of executing a [`CreateTableAsSelect`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Materialization {
    /// Table created holding this many rows
    Created { rows: u64 },

    /// Table existed; nothing was written
    AlreadyExists,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum SessionError {
    #[error("Temporary view not found: {0}")]
    ViewNotFound(String),

    #[error("Unsupported table format version {0} (only version 2 is supported)")]
    UnsupportedFormatVersion(u8),

    #[error(transparent)]
    Catalog(#[from] WriteError),
}

/// An open processing session
pub struct LakeSession {
    catalog: Box<dyn LakehouseCatalog>,
    settings: SessionSettings,
    views: HashMap<String, TableDataset>,
}

impl LakeSession {
    /// Open a session, making sure the target namespace exists
    pub async fn open(
        catalog: Box<dyn LakehouseCatalog>,
        settings: SessionSettings,
    ) -> Result<Self, SessionError> {
        if settings.format_version != SUPPORTED_FORMAT_VERSION {
            return Err(SessionError::UnsupportedFormatVersion(settings.format_version));
        }

        catalog
            .ensure_namespace(&settings.namespace, settings.create_namespace)
            .await?;

        tracing::info!(
            catalog = %settings.catalog_name,
            backend = catalog.name(),
            namespace = %settings.namespace,
            warehouse = %settings.warehouse,
            "Session opened"
        );

        Ok(Self {
            catalog,
            settings,
            views: HashMap::new(),
        })
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn catalog(&self) -> &dyn LakehouseCatalog {
        self.catalog.as_ref()
    }

    /// Register `dataset` under `name`, replacing any view with that name
    pub fn create_or_replace_temp_view(&mut self, name: impl Into<String>, dataset: TableDataset) {
        let name = name.into();
        tracing::debug!(view = %name, rows = dataset.row_count(), "Temporary view registered");
        self.views.insert(name, dataset);
    }

    /// Drop a temporary view, releasing its dataset
    ///
    /// Returns whether the view existed.
    pub fn drop_temp_view(&mut self, name: &str) -> bool {
        self.views.remove(name).is_some()
    }

    /// Names of the registered temporary views, sorted
    pub fn temp_view_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.views.keys().cloned().collect();
        names.sort();
        names
    }

    /// Statement materializing `view` into `table` in the session namespace
    pub fn create_table_as_select(&self, table: &str, view: &str) -> CreateTableAsSelect {
        CreateTableAsSelect {
            target: self.settings.destination(table),
            source_view: view.to_string(),
            spec: self.settings.table_spec(),
        }
    }

    /// Execute a create-if-absent statement
    ///
    /// An existing destination table is left untouched.
    pub async fn execute(&self, statement: &CreateTableAsSelect) -> Result<Materialization, SessionError> {
        let view = self
            .views
            .get(&statement.source_view)
            .ok_or_else(|| SessionError::ViewNotFound(statement.source_view.clone()))?;

        tracing::debug!(%statement, "Executing statement");

        if self.catalog.table_exists(&statement.target).await? {
            tracing::info!(table = %statement.target, "Destination table exists, nothing written");
            return Ok(Materialization::AlreadyExists);
        }

        let rows = self
            .catalog
            .create_table_as(&statement.target, view, &statement.spec)
            .await?;

        tracing::info!(table = %statement.target, rows, "Destination table created");
        Ok(Materialization::Created { rows })
    }

    /// Stop the session, dropping any views still registered
    pub fn stop(self) {
        if !self.views.is_empty() {
            tracing::warn!(views = ?self.temp_view_names(), "Stopping session with views still registered");
        }
        tracing::info!(catalog = %self.settings.catalog_name, "Session stopped");
    }
}
