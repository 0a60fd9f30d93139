//! Copy-run error taxonomy
//!
//! Every failure is fatal for the run. The variant records the phase it
//! happened in and, for per-table failures, the table.

use lakecopy_core::FailureEntry;
use lakecopy_lakehouse::SessionError;
use lakecopy_secrets::SecretError;
use lakecopy_source::FetchError;
use std::fmt;

/// Phase a run failed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Secret missing, inaccessible or malformed
    Credential,

    /// Source unreachable or metadata query failed
    Enumeration,

    /// Full-table read failed
    Load,

    /// Materialization failed
    Write,

    /// Lakehouse session could not be opened
    Session,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Credential => "credential",
            ErrorKind::Enumeration => "enumeration",
            ErrorKind::Load => "load",
            ErrorKind::Write => "write",
            ErrorKind::Session => "session",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EtlError {
    #[error("Resolving credentials from secret {secret_id} failed: {source}")]
    Credential {
        secret_id: String,
        #[source]
        source: SecretError,
    },

    #[error("Enumerating source tables failed: {source}")]
    Enumeration {
        #[source]
        source: FetchError,
    },

    #[error("Loading table {table} failed: {source}")]
    Load {
        table: String,
        #[source]
        source: FetchError,
    },

    #[error("Writing table {table} failed: {source}")]
    Write {
        table: String,
        #[source]
        source: SessionError,
    },

    #[error("Opening lakehouse session failed: {source}")]
    Session {
        #[source]
        source: SessionError,
    },
}

impl EtlError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EtlError::Credential { .. } => ErrorKind::Credential,
            EtlError::Enumeration { .. } => ErrorKind::Enumeration,
            EtlError::Load { .. } => ErrorKind::Load,
            EtlError::Write { .. } => ErrorKind::Write,
            EtlError::Session { .. } => ErrorKind::Session,
        }
    }

    /// Table being processed when the run failed
    pub fn table(&self) -> Option<&str> {
        match self {
            EtlError::Load { table, .. } | EtlError::Write { table, .. } => Some(table),
            _ => None,
        }
    }

    /// Report entry describing this failure
    pub fn to_failure_entry(&self) -> FailureEntry {
        FailureEntry {
            kind: self.kind().to_string(),
            table: self.table().map(str::to_string),
            message: self.to_string(),
        }
    }
}
