//! Configuration types and CLI options.
//!
//! This module defines the enums and structs used for command-line argument parsing
//! and the validated run configuration derived from them.

use std::fmt;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{Duration, NaiveDateTime};
use clap::{Parser, ValueEnum};

use crate::config::constants::{DB_PATH, DEFAULT_POOL_SIZE, START_DATE_FORMAT};
use crate::error_handling::ConfigError;
use crate::models::AnalysisWindow;

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Granularity of the analysis window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnalysisMode {
    /// One hour starting at the window start
    Hourly,
    /// One day starting at the window start
    Daily,
}

impl AnalysisMode {
    /// Every accepted mode name, in display order.
    pub const NAMES: [&'static str; 2] = ["hourly", "daily"];

    /// Length of the window this mode covers.
    pub fn span(self) -> Duration {
        match self {
            AnalysisMode::Hourly => Duration::hours(1),
            AnalysisMode::Daily => Duration::days(1),
        }
    }
}

impl FromStr for AnalysisMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hourly" => Ok(AnalysisMode::Hourly),
            "daily" => Ok(AnalysisMode::Daily),
            _ => Err(ConfigError::UnknownMode(s.to_string())),
        }
    }
}

impl fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisMode::Hourly => f.write_str("hourly"),
            AnalysisMode::Daily => f.write_str("daily"),
        }
    }
}

/// Parses a window start given as `yyyy-MM-dd.HH:mm:ss`.
pub fn parse_window_start(value: &str) -> Result<NaiveDateTime, ConfigError> {
    NaiveDateTime::parse_from_str(value.trim(), START_DATE_FORMAT).map_err(|source| {
        ConfigError::InvalidStartDate {
            value: value.to_string(),
            source,
        }
    })
}

/// Command-line options.
///
/// The four run parameters keep their established spelling
/// (`--accesslog`, `--duration`, `--startDate`, `--threshold`). Every option can
/// also be supplied through an `ACCESS_GUARD_*` environment variable, which
/// makes a `.env` file next to the binary a complete configuration.
///
/// # Examples
///
/// ```bash
/// access_guard --accesslog access.log --duration hourly \
///     --startDate 2017-01-01.13:00:00 --threshold 100
/// ```
#[derive(Debug, Parser)]
#[command(
    name = "access_guard",
    version,
    about = "Loads an access log into SQLite and blocks IPs that exceed a request threshold."
)]
pub struct Opt {
    /// Access log to ingest
    #[arg(long = "accesslog", env = "ACCESS_GUARD_ACCESSLOG")]
    pub access_log: PathBuf,

    /// Analysis window: hourly|daily
    #[arg(long, env = "ACCESS_GUARD_DURATION")]
    pub duration: String,

    /// Window start, formatted as yyyy-MM-dd.HH:mm:ss
    #[arg(long = "startDate", env = "ACCESS_GUARD_START_DATE")]
    pub start_date: String,

    /// Requests allowed per IP within the window
    #[arg(long, env = "ACCESS_GUARD_THRESHOLD")]
    pub threshold: u64,

    /// Database path (SQLite file)
    #[arg(long, value_parser, default_value = DB_PATH, env = "ACCESS_GUARD_DB_PATH")]
    pub db_path: PathBuf,

    /// Concurrent insert tasks used while ingesting
    #[arg(long, default_value_t = DEFAULT_POOL_SIZE, env = "ACCESS_GUARD_POOL_SIZE")]
    pub pool_size: usize,

    /// Log level: error|warn|info|debug|trace
    #[arg(long, value_enum, default_value_t = LogLevel::Info, env = "ACCESS_GUARD_LOG_LEVEL")]
    pub log_level: LogLevel,

    /// Log format: plain|json
    #[arg(long, value_enum, default_value_t = LogFormat::Plain, env = "ACCESS_GUARD_LOG_FORMAT")]
    pub log_format: LogFormat,
}

/// Validated run configuration (no CLI dependencies).
///
/// Built from [`Opt`] via `TryFrom`, or constructed directly by library users.
///
/// # Examples
///
/// ```no_run
/// use access_guard::{AnalysisMode, Config};
/// use chrono::NaiveDate;
/// use std::path::PathBuf;
///
/// let config = Config {
///     access_log: PathBuf::from("access.log"),
///     mode: AnalysisMode::Hourly,
///     start: NaiveDate::from_ymd_opt(2017, 1, 1)
///         .unwrap()
///         .and_hms_opt(13, 0, 0)
///         .unwrap(),
///     threshold: 100,
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Access log to ingest
    pub access_log: PathBuf,

    /// Window granularity
    pub mode: AnalysisMode,

    /// Inclusive window start
    pub start: NaiveDateTime,

    /// Requests allowed per IP within the window
    pub threshold: u64,

    /// Database path (SQLite file)
    pub db_path: PathBuf,

    /// Concurrent insert tasks used while ingesting
    pub pool_size: usize,

    /// Log level
    pub log_level: LogLevel,

    /// Log format
    pub log_format: LogFormat,
}

impl Config {
    /// The closed window `[start, start + mode span]` analysed by this run.
    pub fn window(&self) -> AnalysisWindow {
        AnalysisWindow::from_start(self.start, self.mode)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            access_log: PathBuf::from("access.log"),
            mode: AnalysisMode::Hourly,
            start: NaiveDateTime::default(),
            threshold: 100,
            db_path: PathBuf::from(DB_PATH),
            pool_size: DEFAULT_POOL_SIZE,
            log_level: LogLevel::Info,
            log_format: LogFormat::Plain,
        }
    }
}

impl TryFrom<Opt> for Config {
    type Error = ConfigError;

    /// Validates every option before any ingestion work starts.
    fn try_from(opt: Opt) -> Result<Self, Self::Error> {
        let mode = opt.duration.parse::<AnalysisMode>()?;
        let start = parse_window_start(&opt.start_date)?;
        if opt.pool_size == 0 {
            return Err(ConfigError::InvalidPoolSize);
        }
        check_log_source(&opt.access_log)?;

        Ok(Config {
            access_log: opt.access_log,
            mode,
            start,
            threshold: opt.threshold,
            db_path: opt.db_path,
            pool_size: opt.pool_size,
            log_level: opt.log_level,
            log_format: opt.log_format,
        })
    }
}

fn check_log_source(path: &PathBuf) -> Result<(), ConfigError> {
    match File::open(path) {
        Ok(file) => {
            let metadata = file
                .metadata()
                .map_err(|source| ConfigError::LogSourceUnreadable {
                    path: path.clone(),
                    source,
                })?;
            if metadata.is_file() {
                Ok(())
            } else {
                Err(ConfigError::LogSourceUnreadable {
                    path: path.clone(),
                    source: io::Error::new(io::ErrorKind::InvalidInput, "not a regular file"),
                })
            }
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            Err(ConfigError::LogSourceMissing(path.clone()))
        }
        Err(source) => Err(ConfigError::LogSourceUnreadable {
            path: path.clone(),
            source,
        }),
    }
}
