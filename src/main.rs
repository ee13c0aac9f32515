//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `access_guard` library that handles:
//! - Command-line argument parsing
//! - Environment variable loading (.env file)
//! - Logger initialization
//! - User-facing output formatting
//!
//! All core functionality is implemented in the library crate.

use anyhow::{Context, Result};
use clap::Parser;
use std::process;

use access_guard::initialization::init_logger_with;
use access_guard::{run_analysis, Config, Opt};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file (if it exists)
    // Try loading from current directory first, then from the executable's directory
    if dotenvy::dotenv().is_err() {
        if let Ok(exe_path) = std::env::current_exe() {
            if let Some(exe_dir) = exe_path.parent() {
                let env_path = exe_dir.join(".env");
                if env_path.exists() {
                    let _ = dotenvy::from_path(&env_path);
                }
            }
        }
    }

    let opt = Opt::parse();

    init_logger_with(opt.log_level.clone().into(), opt.log_format.clone())
        .context("Failed to initialize logger")?;

    let config = match Config::try_from(opt) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("access_guard error: {:#}", anyhow::Error::from(e));
            process::exit(1);
        }
    };

    match run_analysis(config).await {
        Ok(report) => {
            let ingestion = &report.ingestion;
            if ingestion.skipped {
                println!(
                    "Store already up to date ({} lines), ingestion skipped",
                    ingestion.lines_seen
                );
            } else {
                println!(
                    "Ingested {} line{} ({} stored, {} failed)",
                    ingestion.lines_seen,
                    if ingestion.lines_seen == 1 { "" } else { "s" },
                    ingestion.records_stored,
                    ingestion.records_failed()
                );
            }
            for decision in &report.offenders {
                println!("{}", decision.comment);
            }
            println!(
                "Blocked {} IP{} during {} in {:.1}s",
                report.offenders.len(),
                if report.offenders.len() == 1 { "" } else { "s" },
                report.window,
                report.elapsed_seconds
            );
            println!("Results saved in {}", report.db_path.display());
            Ok(())
        }
        Err(e) => {
            eprintln!("access_guard error: {:#}", e);
            process::exit(1);
        }
    }
}
