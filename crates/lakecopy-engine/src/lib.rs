//! lakecopy engine - copy-run orchestration
//!
//! This crate drives a full-snapshot copy run:
//! - Credential resolution and connection descriptor
//! - Base table enumeration
//! - Per-table load, stage and create-if-absent materialization
//! - Typed errors and phase notifications for the caller

pub mod error;
pub mod observer;
pub mod pipeline;

pub use error::{EtlError, ErrorKind};
pub use observer::{NoopObserver, RunObserver, RunPhase};
pub use pipeline::{Pipeline, PipelineOptions, RunSummary, TableOutcome};
