//! Run report (stable v1)
//!
//! Written at the end of a run when requested, including failed runs, so
//! operators can see which tables were copied before the failure.

use serde::{Deserialize, Serialize};

/// Report schema version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportVersion {
    /// Major version (breaking changes)
    pub major: u32,

    /// Minor version (backward-compatible additions)
    pub minor: u32,
}

impl ReportVersion {
    /// Current report schema version
    pub const CURRENT: ReportVersion = ReportVersion { major: 1, minor: 0 };
}

impl std::fmt::Display for ReportVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Final state of the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Succeeded,
    Failed,
}

/// What the materialization did for one table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableOutcomeKind {
    /// Destination created and filled
    Created,

    /// Destination already existed and was left untouched
    AlreadyExists,
}

/// One copied table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableEntry {
    /// Source table name
    pub table: String,

    /// Fully qualified destination table
    pub destination: String,

    /// Rows read from the source
    pub rows_loaded: u64,

    pub outcome: TableOutcomeKind,
}

/// Why the run stopped
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureEntry {
    /// Error kind (credential, enumeration, load, write)
    pub kind: String,

    /// Table being processed, if the failure is per-table
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,

    pub message: String,
}

/// Run report (run-report.json v1)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    /// Schema version
    pub version: ReportVersion,

    /// Start timestamp (ISO 8601)
    pub started_at: String,

    /// End timestamp (ISO 8601), unset while running
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<String>,

    pub status: RunStatus,

    /// Tables enumerated at the source
    pub tables_discovered: usize,

    /// Tables processed, in processing order
    pub tables: Vec<TableEntry>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureEntry>,
}

impl RunReport {
    /// Start a new report stamped with the current time
    pub fn start() -> Self {
        Self {
            version: ReportVersion::CURRENT,
            started_at: chrono::Utc::now().to_rfc3339(),
            finished_at: None,
            status: RunStatus::Running,
            tables_discovered: 0,
            tables: Vec::new(),
            failure: None,
        }
    }

    pub fn record_table(&mut self, entry: TableEntry) {
        self.tables.push(entry);
    }

    /// Mark the run as succeeded
    pub fn succeed(&mut self) {
        self.status = RunStatus::Succeeded;
        self.finished_at = Some(chrono::Utc::now().to_rfc3339());
    }

    /// Mark the run as failed
    pub fn fail(&mut self, failure: FailureEntry) {
        self.status = RunStatus::Failed;
        self.failure = Some(failure);
        self.finished_at = Some(chrono::Utc::now().to_rfc3339());
    }

    /// Number of tables created by this run
    pub fn created_count(&self) -> usize {
        self.tables
            .iter()
            .filter(|t| t.outcome == TableOutcomeKind::Created)
            .count()
    }

    /// Total rows written into newly created tables
    pub fn rows_written(&self) -> u64 {
        self.tables
            .iter()
            .filter(|t| t.outcome == TableOutcomeKind::Created)
            .map(|t| t.rows_loaded)
            .sum()
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Save to file
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let json = self.to_json()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        std::fs::write(path, json)
    }
}

impl Default for RunReport {
    fn default() -> Self {
        Self::start()
    }
}
