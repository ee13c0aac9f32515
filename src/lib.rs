//! access_guard library: access-log ingestion and request-rate blocking
//!
//! This library loads a pipe-delimited web-server access log into SQLite, counts
//! requests per IP within an hourly or daily window, and replaces the stored
//! block list with every IP that exceeded the threshold.
//!
//! # Example
//!
//! ```no_run
//! use access_guard::{run_analysis, AnalysisMode, Config};
//! use chrono::NaiveDate;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config {
//!     access_log: std::path::PathBuf::from("access.log"),
//!     mode: AnalysisMode::Hourly,
//!     start: NaiveDate::from_ymd_opt(2017, 1, 1)
//!         .unwrap()
//!         .and_hms_opt(13, 0, 0)
//!         .unwrap(),
//!     threshold: 100,
//!     ..Default::default()
//! };
//!
//! let report = run_analysis(config).await?;
//! for decision in &report.offenders {
//!     println!("{}", decision.comment);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Use `#[tokio::main]` in your application
//! or ensure you're calling library functions within an async context.

#![warn(missing_docs)]

mod app;
pub mod analysis;
pub mod blocklist;
pub mod config;
mod error_handling;
pub mod ingest;
pub mod initialization;
pub mod models;
mod parse;
pub mod storage;

// Re-export public API
pub use analysis::FrequencyAnalyzer;
pub use blocklist::BlockListWriter;
pub use config::{AnalysisMode, Config, LogFormat, LogLevel, Opt};
pub use error_handling::{
    ConfigError, ErrorType, IngestError, InitializationError, ParseError, ProcessingStats,
    StoreError,
};
pub use ingest::{FailedLine, IngestionPipeline, IngestionSummary};
pub use models::{AnalysisWindow, BlockDecision, LogRecord, Offender, StoredRecord};
pub use parse::parse_line;
pub use run::{run_analysis, RunReport};
pub use storage::{BlockStore, MemoryStore, RecordStore, SqliteStore};

// Internal run module (contains the batch orchestration)
mod run {
    use anyhow::{Context, Result};
    use std::path::PathBuf;
    use std::sync::Arc;
    use std::time::Instant;

    use log::info;

    use crate::analysis::FrequencyAnalyzer;
    use crate::app::statistics::print_ingestion_summary;
    use crate::blocklist::BlockListWriter;
    use crate::config::Config;
    use crate::ingest::{IngestionPipeline, IngestionSummary};
    use crate::models::{AnalysisWindow, BlockDecision};
    use crate::storage::{init_db_pool_with_path, run_migrations, SqliteStore};

    /// Results of one analysis run.
    #[derive(Debug, Clone)]
    pub struct RunReport {
        /// What the ingestion pass did
        pub ingestion: IngestionSummary,
        /// Every IP blocked by this run; this is now the whole block list
        pub offenders: Vec<BlockDecision>,
        /// The analysed window
        pub window: AnalysisWindow,
        /// Requests allowed per IP within the window
        pub threshold: u64,
        /// Path to the SQLite database holding records and block list
        pub db_path: PathBuf,
        /// Elapsed time in seconds
        pub elapsed_seconds: f64,
    }

    /// Runs one batch: ingest the log, find offenders, replace the block list.
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    /// - The database cannot be opened or migrated
    /// - The access log cannot be read
    /// - The store fails fatally during ingestion, analysis or block-list writes
    ///
    /// Malformed lines and individually rejected inserts are not errors; they
    /// are reported in [`RunReport::ingestion`].
    pub async fn run_analysis(config: Config) -> Result<RunReport> {
        let start_time = Instant::now();
        let window = config.window();
        info!(
            "Analysing {} ({} mode, window {}, threshold {})",
            config.access_log.display(),
            config.mode,
            window,
            config.threshold
        );

        let pool = init_db_pool_with_path(&config.db_path)
            .await
            .context("Failed to initialize database pool")?;
        run_migrations(&pool)
            .await
            .context("Failed to run database migrations")?;
        let store = Arc::new(SqliteStore::new(Arc::clone(&pool)));

        let pipeline = IngestionPipeline::new(store.clone(), config.pool_size);
        let ingestion = pipeline
            .ingest_file(&config.access_log)
            .await
            .context("Failed to ingest access log")?;
        print_ingestion_summary(&ingestion, start_time.elapsed().as_secs_f64());

        let analyzer = FrequencyAnalyzer::new(store.clone());
        let offenders = analyzer
            .block_decisions(&window, config.threshold)
            .await
            .context("Failed to query offending IPs")?;

        let writer = BlockListWriter::new(store);
        let written = writer
            .replace_block_list(&offenders)
            .await
            .context("Failed to replace block list")?;
        info!("Block list now holds {} IPs", written);

        if let Err(e) = sqlx::query("PRAGMA wal_checkpoint(TRUNCATE)")
            .execute(pool.as_ref())
            .await
        {
            log::warn!(
                "Failed to checkpoint WAL file (this is non-critical): {}",
                e
            );
        }
        pool.close().await;

        Ok(RunReport {
            ingestion,
            offenders,
            window,
            threshold: config.threshold,
            db_path: config.db_path.clone(),
            elapsed_seconds: start_time.elapsed().as_secs_f64(),
        })
    }
}
