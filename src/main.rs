//! Command-line interface for patient-audit
//!
//! # Usage Examples
//!
//! ```bash
//! # Upload the extract and derive scheduled emails
//! patient-audit upload \
//!   --input test-data.txt \
//!   --mongodb-uri mongodb://localhost:27017 \
//!   --database health
//!
//! # Reconcile the extract against the store and export the report
//! patient-audit report \
//!   --input test-data.txt \
//!   --batch-size 10 \
//!   --output test-result.csv
//! ```

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use flatfile_source::FlatFileSource;
use mongo_store::{MongoOpts, MongoStore};
use patient_audit::{export, upload};
use reconcile::ReconcileEngine;
use tokio_util::sync::CancellationToken;
use tracing::info;

#[derive(Parser)]
#[command(name = "patient-audit")]
#[command(about = "A tool for auditing patient flat-file uploads and email scheduling in MongoDB")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Document-store connection options
#[derive(Args, Clone)]
struct StoreOpts {
    /// MongoDB endpoint URI
    #[arg(
        long,
        default_value = "mongodb://localhost:27017",
        env = "MONGODB_URI"
    )]
    mongodb_uri: String,

    /// Database holding the Patients and Emails collections
    #[arg(long, default_value = "health", env = "MONGODB_DATABASE")]
    database: String,
}

impl From<&StoreOpts> for MongoOpts {
    fn from(opts: &StoreOpts) -> Self {
        Self {
            uri: opts.mongodb_uri.clone(),
            database: opts.database.clone(),
        }
    }
}

/// Flat-file extract options
#[derive(Args, Clone)]
struct ExtractOpts {
    /// Path to the pipe-delimited patient extract
    #[arg(long, default_value = "test-data.txt")]
    input: PathBuf,

    /// Records per batch; bounds memory use and lookup-call granularity
    #[arg(long, default_value = "10")]
    batch_size: usize,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload the extract into the patient collection and derive scheduled emails
    Upload {
        #[command(flatten)]
        extract: ExtractOpts,

        #[command(flatten)]
        store: StoreOpts,
    },

    /// Reconcile the extract against the store and export the discrepancy report
    Report {
        #[command(flatten)]
        extract: ExtractOpts,

        #[command(flatten)]
        store: StoreOpts,

        /// Output CSV path
        #[arg(long, default_value = "test-result.csv")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Upload { extract, store } => {
            let mut source = open_extract(&extract)?;
            let store = connect(&store).await?;

            let result = upload::upload(&store, &mut source).await;
            store.shutdown().await;
            let summary = result?;

            info!(
                uploaded = summary.records_uploaded,
                rejected = summary.records_rejected,
                emails = summary.emails_created,
                "upload finished"
            );
        }
        Commands::Report {
            extract,
            store,
            output,
        } => {
            let mut source = open_extract(&extract)?;
            let store = connect(&store).await?;

            // Ctrl-C aborts the run at the next batch boundary.
            let cancel = CancellationToken::new();
            tokio::spawn({
                let cancel = cancel.clone();
                async move {
                    if tokio::signal::ctrl_c().await.is_ok() {
                        cancel.cancel();
                    }
                }
            });

            let engine = ReconcileEngine::new().with_cancellation(cancel);
            let result = engine.run(&mut source, &store).await;
            // Release the connection on success and failure alike.
            store.shutdown().await;
            let report = result.context("reconciliation aborted, no report produced")?;

            export::write_report(&report, &output)?;
            info!(output = %output.display(), "discrepancy report written");
        }
    }

    Ok(())
}

fn open_extract(
    opts: &ExtractOpts,
) -> anyhow::Result<FlatFileSource<std::io::BufReader<std::fs::File>>> {
    FlatFileSource::open(&opts.input, opts.batch_size)
        .with_context(|| format!("failed to open extract {}", opts.input.display()))
}

async fn connect(opts: &StoreOpts) -> anyhow::Result<MongoStore> {
    MongoStore::connect(&MongoOpts::from(opts))
        .await
        .context("failed to connect to MongoDB")
}
