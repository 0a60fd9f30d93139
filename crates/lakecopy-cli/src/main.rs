use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use lakecopy_core::Config;
use lakecopy_engine::{EtlError, Pipeline, PipelineOptions, RunObserver};
use lakecopy_lakehouse::{IcebergLakehouse, LakeSession, LakehouseCatalog, SessionError, SessionSettings};
use lakecopy_secrets::SecretsManagerStore;
use lakecopy_source::PostgresConnector;

mod console;

use console::ConsoleReporter;

const DEFAULT_CONFIG_FILE: &str = "lakecopy.toml";

/// lakecopy - full-snapshot copy of PostgreSQL tables into Iceberg
#[derive(Parser)]
#[command(name = "lakecopy")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: lakecopy.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// AWS region for the secret store and the Glue catalog
    #[arg(long, global = true)]
    region: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct SecretArgs {
    /// Secret holding the source database credentials
    #[arg(long = "secret-id", alias = "AURORA_CREDS_SECRET", env = "AURORA_CREDS_SECRET")]
    secret_id: String,
}

#[derive(Args, Debug)]
struct DestinationArgs {
    /// Bucket backing the Iceberg warehouse
    #[arg(long = "destination-bucket", alias = "DESTINATION_BUCKET", env = "DESTINATION_BUCKET")]
    destination_bucket: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Copy every base table into the lakehouse
    Run {
        #[command(flatten)]
        secret: SecretArgs,

        #[command(flatten)]
        destination: DestinationArgs,

        /// Write a JSON run report to this path
        #[arg(short, long)]
        report: Option<PathBuf>,
    },

    /// List the base tables a run would copy
    ListTables {
        #[command(flatten)]
        secret: SecretArgs,
    },

    /// Test the source and catalog connections
    Check {
        #[command(flatten)]
        secret: SecretArgs,

        #[command(flatten)]
        destination: DestinationArgs,
    },
}

#[tokio::main]
async fn main() {
    // A missing .env is fine
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = dispatch(cli).await {
        eprintln!("{} {:#}", "ERROR:".red().bold(), err);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

async fn dispatch(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref(), cli.verbose)?;
    let region = cli
        .region
        .clone()
        .unwrap_or_else(|| config.secrets.region.clone());

    if cli.verbose {
        eprintln!("{} {}", "Using region:".cyan(), region);
    }

    match cli.command {
        Commands::Run {
            secret,
            destination,
            report,
        } => {
            run_command(
                &config,
                &region,
                &secret.secret_id,
                &destination.destination_bucket,
                report.as_deref(),
                cli.verbose,
            )
            .await
        }
        Commands::ListTables { secret } => list_tables_command(&config, &region, &secret.secret_id).await,
        Commands::Check {
            secret,
            destination,
        } => check_command(&config, &region, &secret.secret_id, &destination.destination_bucket).await,
    }
}

/// Load the config file if given, else `lakecopy.toml` if present, else defaults
fn load_config(path: Option<&Path>, verbose: bool) -> Result<Config> {
    if let Some(path) = path {
        return Config::from_file(path).with_context(|| format!("Failed to load config {}", path.display()));
    }

    let default_path = Path::new(DEFAULT_CONFIG_FILE);
    if default_path.exists() {
        return Config::from_file(default_path)
            .with_context(|| format!("Failed to load config {}", default_path.display()));
    }

    if verbose {
        eprintln!("{}", "No config file found, using defaults".yellow());
    }
    Ok(Config::default())
}

async fn build_pipeline(config: &Config, region: &str, secret_id: &str) -> Pipeline {
    let secrets = SecretsManagerStore::from_region(region).await;
    let connector = PostgresConnector::new().with_tls(config.source.tls);

    Pipeline::new(
        Box::new(secrets),
        Box::new(connector),
        PipelineOptions::from_config(secret_id, &config.source),
    )
}

async fn open_session(settings: SessionSettings, region: &str) -> Result<LakeSession, EtlError> {
    let catalog = IcebergLakehouse::connect_glue(&settings, region)
        .await
        .map_err(|e| EtlError::Session {
            source: SessionError::Catalog(e),
        })?;

    LakeSession::open(Box::new(catalog), settings)
        .await
        .map_err(|source| EtlError::Session { source })
}

/// Run command - copy every base table
async fn run_command(
    config: &Config,
    region: &str,
    secret_id: &str,
    bucket: &str,
    report_path: Option<&Path>,
    verbose: bool,
) -> Result<()> {
    let pipeline = build_pipeline(config, region, secret_id).await;
    let settings = SessionSettings::from_config(&config.destination, bucket);
    let mut reporter = ConsoleReporter::new();

    if verbose {
        eprintln!("{} {}", "Warehouse:".cyan(), settings.warehouse);
    }

    let result = match open_session(settings, region).await {
        Ok(mut session) => {
            let result = pipeline.run(&mut session, &mut reporter).await;
            session.stop();
            result
        }
        Err(err) => {
            reporter.failed(&err);
            Err(err)
        }
    };

    if let Some(path) = report_path {
        write_report(&reporter, path, result.is_err(), verbose)?;
    }

    result.map(|_| ()).map_err(anyhow::Error::from)
}

/// Save the run report
///
/// After a failed run the report error is only logged, so the run's own
/// error is the one returned.
fn write_report(reporter: &ConsoleReporter, path: &Path, run_failed: bool, verbose: bool) -> Result<()> {
    match reporter.report().save_to_file(path) {
        Ok(()) => {
            if verbose {
                eprintln!("{} {}", "Report saved to:".green(), path.display());
            }
            Ok(())
        }
        Err(err) if run_failed => {
            tracing::warn!(path = %path.display(), "Failed to write report: {}", err);
            eprintln!("{} failed to write report {}: {}", "WARN:".yellow().bold(), path.display(), err);
            Ok(())
        }
        Err(err) => Err(err).with_context(|| format!("Failed to write report {}", path.display())),
    }
}

/// List tables command - enumerate without touching the lakehouse
async fn list_tables_command(config: &Config, region: &str, secret_id: &str) -> Result<()> {
    let pipeline = build_pipeline(config, region, secret_id).await;
    let tables = pipeline.list_tables().await?;

    println!(
        "{} {} base tables in schema {}",
        "Found".bold(),
        tables.len(),
        pipeline.options().source_schema
    );
    for (i, table) in tables.iter().enumerate() {
        println!("  {}. {}", i + 1, table);
    }

    Ok(())
}

/// Check command - test source and catalog connectivity
async fn check_command(config: &Config, region: &str, secret_id: &str, bucket: &str) -> Result<()> {
    let pipeline = build_pipeline(config, region, secret_id).await;
    let url = pipeline.check_source().await?;
    println!("{} source reachable at {}", "✓".green(), url);

    let settings = SessionSettings::from_config(&config.destination, bucket);
    let catalog = IcebergLakehouse::connect_glue(&settings, region)
        .await
        .context("Failed to configure the Glue catalog")?;
    catalog
        .test_connection()
        .await
        .context("Catalog connection test failed")?;
    println!(
        "{} catalog {} reachable, warehouse {}",
        "✓".green(),
        settings.catalog_name,
        catalog.warehouse()
    );

    Ok(())
}
