//! Run phases and observer hooks
//!
//! A run moves strictly forward through
//! `Init → ResolveCreds → Enumerate → Copy(t1) … Copy(tn) → Shutdown`,
//! or jumps to `Failed` from any phase.

use crate::error::EtlError;
use crate::pipeline::TableOutcome;
use lakecopy_core::TableDataset;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunPhase {
    Init,
    ResolveCreds,
    Enumerate,
    /// Copying the `index`-th (1-based) of `total` tables
    Copy {
        table: String,
        index: usize,
        total: usize,
    },
    Shutdown,
    Failed,
}

impl RunPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunPhase::Shutdown | RunPhase::Failed)
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunPhase::Init => write!(f, "init"),
            RunPhase::ResolveCreds => write!(f, "resolving credentials"),
            RunPhase::Enumerate => write!(f, "enumerating tables"),
            RunPhase::Copy { table, index, total } => write!(f, "copying {} ({}/{})", table, index, total),
            RunPhase::Shutdown => write!(f, "shutdown"),
            RunPhase::Failed => write!(f, "failed"),
        }
    }
}

/// Receives progress notifications during a run
///
/// Every method has an empty default, so observers only implement what
/// they display.
pub trait RunObserver {
    /// A phase transition
    fn phase(&mut self, _phase: &RunPhase) {}

    /// Enumeration finished with these tables, in processing order
    fn tables_discovered(&mut self, _tables: &[String]) {}

    /// A table was read in full
    fn table_loaded(&mut self, _table: &str, _dataset: &TableDataset) {}

    /// A table was materialized (or found to exist already)
    fn table_written(&mut self, _outcome: &TableOutcome) {}

    /// The run failed
    fn failed(&mut self, _error: &EtlError) {}
}

/// Observer that ignores everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl RunObserver for NoopObserver {}
