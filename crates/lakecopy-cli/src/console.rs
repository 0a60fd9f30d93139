//! Console progress reporter
//!
//! Prints one line per phase transition and a success marker per table on
//! stdout, and builds the run report as the run goes.

use colored::Colorize;
use lakecopy_core::{RunReport, TableDataset};
use lakecopy_engine::{EtlError, RunObserver, RunPhase, TableOutcome};
use lakecopy_lakehouse::Materialization;

pub struct ConsoleReporter {
    report: RunReport,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self {
            report: RunReport::start(),
        }
    }

    pub fn report(&self) -> &RunReport {
        &self.report
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl RunObserver for ConsoleReporter {
    fn phase(&mut self, phase: &RunPhase) {
        match phase {
            RunPhase::Init => println!("{}", "Starting copy run".bold()),
            RunPhase::ResolveCreds | RunPhase::Enumerate => {
                println!("{} {}...", "→".cyan(), phase)
            }
            RunPhase::Copy { table, index, total } => {
                println!();
                println!("{} [{}/{}] {}", "Processing table".cyan(), index, total, table.bold());
            }
            RunPhase::Shutdown => {
                self.report.succeed();
                println!();
                println!(
                    "{} {} tables processed, {} created, {} rows written",
                    "✓ Run complete:".green().bold(),
                    self.report.tables.len(),
                    self.report.created_count(),
                    self.report.rows_written()
                );
            }
            // Reported through `failed`
            RunPhase::Failed => {}
        }
    }

    fn tables_discovered(&mut self, tables: &[String]) {
        self.report.tables_discovered = tables.len();
        println!("  Found {} tables: {}", tables.len(), tables.join(", "));
    }

    fn table_loaded(&mut self, table: &str, dataset: &TableDataset) {
        println!("  Loaded {} rows from {}", dataset.row_count(), table);
        println!("{}", dataset.print_schema());
    }

    fn table_written(&mut self, outcome: &TableOutcome) {
        match outcome.materialization {
            Materialization::Created { rows } => println!(
                "  {} wrote {} rows to {}",
                "✓".green(),
                rows,
                outcome.destination
            ),
            Materialization::AlreadyExists => println!(
                "  {} {} already exists, left untouched",
                "✓".green(),
                outcome.destination
            ),
        }
        self.report.record_table(outcome.to_entry());
    }

    fn failed(&mut self, error: &EtlError) {
        self.report.fail(error.to_failure_entry());
        match error.table() {
            Some(table) => println!(
                "{} {} phase failed at table {}",
                "✗".red().bold(),
                error.kind(),
                table
            ),
            None => println!("{} {} phase failed", "✗".red().bold(), error.kind()),
        }
    }
}
