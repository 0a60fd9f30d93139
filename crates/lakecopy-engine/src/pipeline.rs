//! Full-snapshot copy pipeline
//!
//! Control flow is strictly sequential: resolve credentials, connect,
//! enumerate base tables, then load and materialize each table in order.
//! The first failure ends the run; nothing is retried or skipped. The
//! lakehouse session is passed in explicitly and stays owned by the caller,
//! which stops it whether the run succeeded or not.

use crate::error::EtlError;
use crate::observer::{RunObserver, RunPhase};
use lakecopy_core::{
    ConnectionOptions, DatabaseSecret, SourceConfig, TableDataset, TableEntry, TableOutcomeKind,
};
use lakecopy_lakehouse::{temp_view_name, DestinationTable, LakeSession, Materialization};
use lakecopy_secrets::{resolve_credentials, SecretStore};
use lakecopy_source::{SourceConnector, SourceDatabase, TableIdentifier};

/// What a run copies
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Secret holding the source credentials
    pub secret_id: String,

    /// Source schema whose base tables are copied
    pub source_schema: String,

    /// Sort table names instead of keeping source order
    pub sort_tables: bool,
}

impl PipelineOptions {
    pub fn new(secret_id: impl Into<String>) -> Self {
        Self {
            secret_id: secret_id.into(),
            source_schema: "public".to_string(),
            sort_tables: false,
        }
    }

    pub fn from_config(secret_id: impl Into<String>, source: &SourceConfig) -> Self {
        Self {
            secret_id: secret_id.into(),
            source_schema: source.schema.clone(),
            sort_tables: source.sort_tables,
        }
    }
}

/// Result of copying one table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableOutcome {
    /// Source table name
    pub table: String,

    pub destination: DestinationTable,

    /// Rows read from the source
    pub rows_loaded: u64,

    pub materialization: Materialization,
}

impl TableOutcome {
    /// Report entry for this table
    pub fn to_entry(&self) -> TableEntry {
        TableEntry {
            table: self.table.clone(),
            destination: self.destination.fqn(),
            rows_loaded: self.rows_loaded,
            outcome: match self.materialization {
                Materialization::Created { .. } => TableOutcomeKind::Created,
                Materialization::AlreadyExists => TableOutcomeKind::AlreadyExists,
            },
        }
    }
}

/// Result of a successful run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Enumerated tables, in processing order
    pub tables_discovered: Vec<String>,

    /// One outcome per table, in processing order
    pub outcomes: Vec<TableOutcome>,
}

impl RunSummary {
    /// Tables created by this run
    pub fn created_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.materialization, Materialization::Created { .. }))
            .count()
    }

    /// Tables left untouched because they already existed
    pub fn existing_count(&self) -> usize {
        self.outcomes.len() - self.created_count()
    }

    /// Rows written across all created tables
    pub fn rows_written(&self) -> u64 {
        self.outcomes
            .iter()
            .map(|o| match o.materialization {
                Materialization::Created { rows } => rows,
                Materialization::AlreadyExists => 0,
            })
            .sum()
    }
}

/// Fetch and decode the source credentials
pub async fn resolve(store: &dyn SecretStore, secret_id: &str) -> Result<DatabaseSecret, EtlError> {
    resolve_credentials(store, secret_id)
        .await
        .map_err(|source| EtlError::Credential {
            secret_id: secret_id.to_string(),
            source,
        })
}

/// Open a source connection; failures count as enumeration errors
pub async fn connect(
    connector: &dyn SourceConnector,
    options: &ConnectionOptions,
) -> Result<Box<dyn SourceDatabase>, EtlError> {
    tracing::info!(source = connector.name(), url = %options.redacted_url(), "Connecting to source");
    connector
        .connect(options)
        .await
        .map_err(|source| EtlError::Enumeration { source })
}

/// List the base tables of `schema`
pub async fn enumerate(
    source: &dyn SourceDatabase,
    schema: &str,
    sort_tables: bool,
) -> Result<Vec<String>, EtlError> {
    let mut tables = source
        .list_tables(schema)
        .await
        .map_err(|source| EtlError::Enumeration { source })?;

    if sort_tables {
        tables.sort();
    }

    tracing::info!(schema, count = tables.len(), "Tables enumerated");
    Ok(tables)
}

/// Load one table, stage it as a temporary view and materialize it
///
/// The view is dropped before returning, whether or not the write
/// succeeded, so at most one dataset is held at a time.
pub async fn copy_table(
    source: &dyn SourceDatabase,
    session: &mut LakeSession,
    table: &TableIdentifier,
    observer: &mut dyn RunObserver,
) -> Result<TableOutcome, EtlError> {
    let dataset: TableDataset = source
        .load_table(table)
        .await
        .map_err(|source| EtlError::Load {
            table: table.table.clone(),
            source,
        })?;

    let rows_loaded = dataset.row_count() as u64;
    tracing::debug!(table = %table, rows = rows_loaded, "Table loaded");
    observer.table_loaded(&table.table, &dataset);

    let view = temp_view_name(&table.table);
    session.create_or_replace_temp_view(view.as_str(), dataset);

    let statement = session.create_table_as_select(&table.table, &view);
    let result = session.execute(&statement).await;
    session.drop_temp_view(&view);

    let materialization = result.map_err(|source| EtlError::Write {
        table: table.table.clone(),
        source,
    })?;

    let outcome = TableOutcome {
        table: table.table.clone(),
        destination: statement.target,
        rows_loaded,
        materialization,
    };
    observer.table_written(&outcome);
    Ok(outcome)
}

/// Copy pipeline over a secret store and a source connector
pub struct Pipeline {
    secrets: Box<dyn SecretStore>,
    connector: Box<dyn SourceConnector>,
    options: PipelineOptions,
}

impl Pipeline {
    pub fn new(
        secrets: Box<dyn SecretStore>,
        connector: Box<dyn SourceConnector>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            secrets,
            connector,
            options,
        }
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Run the full copy against an open session
    pub async fn run(
        &self,
        session: &mut LakeSession,
        observer: &mut dyn RunObserver,
    ) -> Result<RunSummary, EtlError> {
        observer.phase(&RunPhase::Init);

        match self.run_phases(session, observer).await {
            Ok(summary) => {
                observer.phase(&RunPhase::Shutdown);
                tracing::info!(
                    tables = summary.outcomes.len(),
                    created = summary.created_count(),
                    rows = summary.rows_written(),
                    "Run succeeded"
                );
                Ok(summary)
            }
            Err(err) => {
                observer.phase(&RunPhase::Failed);
                observer.failed(&err);
                tracing::error!(kind = %err.kind(), table = ?err.table(), "Run failed: {}", err);
                Err(err)
            }
        }
    }

    async fn run_phases(
        &self,
        session: &mut LakeSession,
        observer: &mut dyn RunObserver,
    ) -> Result<RunSummary, EtlError> {
        observer.phase(&RunPhase::ResolveCreds);
        let secret = resolve(self.secrets.as_ref(), &self.options.secret_id).await?;
        let options = ConnectionOptions::from_secret(&secret);

        observer.phase(&RunPhase::Enumerate);
        let source = connect(self.connector.as_ref(), &options).await?;
        let tables = enumerate(source.as_ref(), &self.options.source_schema, self.options.sort_tables).await?;
        observer.tables_discovered(&tables);

        let total = tables.len();
        let mut summary = RunSummary {
            tables_discovered: tables.clone(),
            outcomes: Vec::with_capacity(total),
        };

        for (idx, name) in tables.iter().enumerate() {
            observer.phase(&RunPhase::Copy {
                table: name.clone(),
                index: idx + 1,
                total,
            });

            let table = TableIdentifier::new(&secret.dbname, &self.options.source_schema, name.as_str());
            let outcome = copy_table(source.as_ref(), session, &table, observer).await?;
            summary.outcomes.push(outcome);
        }

        Ok(summary)
    }

    /// Resolve credentials and enumerate tables without touching the lakehouse
    pub async fn list_tables(&self) -> Result<Vec<String>, EtlError> {
        let secret = resolve(self.secrets.as_ref(), &self.options.secret_id).await?;
        let options = ConnectionOptions::from_secret(&secret);
        let source = connect(self.connector.as_ref(), &options).await?;
        enumerate(source.as_ref(), &self.options.source_schema, self.options.sort_tables).await
    }

    /// Resolve credentials and test the source connection
    ///
    /// Returns the redacted connection url on success.
    pub async fn check_source(&self) -> Result<String, EtlError> {
        let secret = resolve(self.secrets.as_ref(), &self.options.secret_id).await?;
        let options = ConnectionOptions::from_secret(&secret);
        let source = connect(self.connector.as_ref(), &options).await?;
        source
            .test_connection()
            .await
            .map_err(|source| EtlError::Enumeration { source })?;
        Ok(options.redacted_url())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn outcome(table: &str, materialization: Materialization) -> TableOutcome {
        TableOutcome {
            table: table.to_string(),
            destination: DestinationTable::new("glue_catalog", "ecommerce_db_dev", table),
            rows_loaded: 5,
            materialization,
        }
    }

    #[test]
    fn test_options_from_config() {
        let source = SourceConfig {
            schema: "sales".to_string(),
            sort_tables: true,
            tls: false,
        };
        let options = PipelineOptions::from_config("prod/aurora", &source);
        assert_eq!(options.secret_id, "prod/aurora");
        assert_eq!(options.source_schema, "sales");
        assert!(options.sort_tables);

        assert_eq!(PipelineOptions::new("x").source_schema, "public");
    }

    #[test]
    fn test_summary_counts() {
        let summary = RunSummary {
            tables_discovered: vec!["orders".to_string(), "products".to_string()],
            outcomes: vec![
                outcome("orders", Materialization::Created { rows: 5 }),
                outcome("products", Materialization::AlreadyExists),
            ],
        };
        assert_eq!(summary.created_count(), 1);
        assert_eq!(summary.existing_count(), 1);
        assert_eq!(summary.rows_written(), 5);
    }

    #[test]
    fn test_outcome_entry() {
        let entry = outcome("products", Materialization::AlreadyExists).to_entry();
        assert_eq!(entry.destination, "glue_catalog.ecommerce_db_dev.products");
        assert_eq!(entry.outcome, TableOutcomeKind::AlreadyExists);
        assert_eq!(entry.rows_loaded, 5);
    }
}
