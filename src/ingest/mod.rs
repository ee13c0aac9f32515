//! Access-log ingestion.
//!
//! Loads a log into a [`RecordStore`]. A pass is skipped when the store already
//! holds as many records as the log has lines; otherwise the store is wiped and
//! every line is parsed on the calling task and inserted from a bounded
//! [`WorkerPool`]. Malformed lines and rejected inserts are counted and
//! reported, never fatal. A fatal store error stops dispatch, waits for the
//! in-flight inserts and fails the pass.

mod pool;
mod summary;

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use futures::{pin_mut, Stream, StreamExt};
use log::{debug, error, info, warn};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::app::{log_progress, print_error_statistics, shutdown_gracefully};
use crate::config::LOGGING_INTERVAL;
use crate::error_handling::{ErrorType, IngestError, ParseError, ProcessingStats, StoreError};
use crate::models::LogRecord;
use crate::parse::parse_line;
use crate::storage::RecordStore;

pub use pool::WorkerPool;
pub use summary::{FailedLine, IngestionSummary};

/// Result of one insert task.
struct InsertOutcome {
    line_number: usize,
    line: String,
    result: Result<(), StoreError>,
}

/// Loads access-log lines into a record store.
pub struct IngestionPipeline {
    store: Arc<dyn RecordStore>,
    pool_size: usize,
}

impl IngestionPipeline {
    /// Creates a pipeline writing to `store` with at most `pool_size` concurrent inserts.
    ///
    /// A `pool_size` of 0 is treated as 1.
    pub fn new(store: Arc<dyn RecordStore>, pool_size: usize) -> Self {
        Self {
            store,
            pool_size: pool_size.max(1),
        }
    }

    /// Ingests in-memory lines.
    pub async fn ingest(&self, lines: Vec<String>) -> Result<IngestionSummary, IngestError> {
        let total = lines.len();
        let stream = futures::stream::iter(lines.into_iter().map(|line| Ok(line.into_bytes())));
        self.ingest_stream(total, stream).await
    }

    /// Ingests the file at `path`, streaming it line by line.
    ///
    /// The file is read twice: once to count lines for the skip check, once to
    /// load them.
    pub async fn ingest_file(&self, path: &Path) -> Result<IngestionSummary, IngestError> {
        let total = count_lines(path).await?;
        info!("Total lines in {}: {}", path.display(), total);

        if self.already_loaded(total).await? {
            return Ok(IngestionSummary::skipped(total));
        }

        let file = tokio::fs::File::open(path)
            .await
            .map_err(|source| read_error(path, source))?;
        let lines = futures::stream::try_unfold(BufReader::new(file), |mut reader| async move {
            let next = next_raw_line(&mut reader).await?;
            Ok::<_, std::io::Error>(next.map(|line| (line, reader)))
        })
        .map(|line| line.map_err(|source| read_error(path, source)));

        self.load(total, lines).await
    }

    async fn ingest_stream<S>(&self, total: usize, lines: S) -> Result<IngestionSummary, IngestError>
    where
        S: Stream<Item = Result<Vec<u8>, IngestError>>,
    {
        if self.already_loaded(total).await? {
            return Ok(IngestionSummary::skipped(total));
        }
        self.load(total, lines).await
    }

    // Line count is only an approximation of "same log": a different log with
    // the same number of lines is not reloaded.
    async fn already_loaded(&self, total: usize) -> Result<bool, StoreError> {
        let stored = self.store.count().await?;
        if stored == total as u64 {
            info!(
                "Store already holds {} records, matching the log line count; skipping ingestion",
                stored
            );
            return Ok(true);
        }
        info!(
            "Store holds {} records but the log has {} lines; reloading",
            stored, total
        );
        Ok(false)
    }

    async fn load<S>(&self, total: usize, lines: S) -> Result<IngestionSummary, IngestError>
    where
        S: Stream<Item = Result<Vec<u8>, IngestError>>,
    {
        pin_mut!(lines);

        self.store.delete_all().await?;

        let start_time = Instant::now();
        let stats = ProcessingStats::new();
        let dispatched = Arc::new(AtomicUsize::new(0));
        let cancel = CancellationToken::new();
        let logging_task = spawn_progress_logger(
            start_time,
            Arc::clone(&dispatched),
            total,
            cancel.child_token(),
        );

        let mut pool: WorkerPool<InsertOutcome> = WorkerPool::new(self.pool_size);
        let mut summary = IngestionSummary::new(total);
        let mut fatal: Option<IngestError> = None;
        let mut line_number = 0usize;

        while let Some(line) = lines.next().await {
            let raw = match line {
                Ok(raw) => raw,
                Err(e) => {
                    fatal = Some(e);
                    break;
                }
            };
            line_number += 1;
            dispatched.fetch_add(1, Ordering::SeqCst);

            let (line, parsed) = decode_and_parse(raw);
            match parsed {
                Ok(record) => {
                    let store = Arc::clone(&self.store);
                    let spawned = pool
                        .spawn(async move {
                            debug!("Inserting {}", record);
                            let result = store.insert(&record).await;
                            InsertOutcome {
                                line_number,
                                line,
                                result,
                            }
                        })
                        .await;
                    if spawned.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("Skipping line {}: {} ({})", line_number, e, line);
                    stats.increment_error(e.error_type());
                    summary.record_parse_failure(line_number, &line, e.to_string());
                }
            }

            for finished in pool.reap() {
                if let Some(e) = absorb(finished, &mut summary, &stats) {
                    fatal.get_or_insert(e.into());
                }
            }
            if fatal.is_some() {
                break;
            }
        }

        if fatal.is_some() && pool.pending() > 0 {
            info!("Waiting for {} in-flight inserts", pool.pending());
        }
        for finished in pool.drain().await {
            if let Some(e) = absorb(finished, &mut summary, &stats) {
                fatal.get_or_insert(e.into());
            }
        }
        pool.close();

        shutdown_gracefully(cancel, Some(logging_task)).await;
        log_progress(start_time, &dispatched, total);
        print_error_statistics(&stats);

        if let Some(e) = fatal {
            error!("Ingestion aborted after {} lines: {}", line_number, e);
            return Err(e);
        }
        Ok(summary)
    }
}

/// Folds one task result into the summary. Returns the error if it is fatal.
fn absorb(
    finished: Result<InsertOutcome, JoinError>,
    summary: &mut IngestionSummary,
    stats: &ProcessingStats,
) -> Option<StoreError> {
    match finished {
        Ok(InsertOutcome {
            result: Ok(()), ..
        }) => {
            summary.records_stored += 1;
            None
        }
        Ok(InsertOutcome {
            line_number,
            line,
            result: Err(e),
        }) => {
            stats.increment_error(ErrorType::RecordInsert);
            summary.record_insert_failure(line_number, &line, e.to_string());
            if e.is_fatal() {
                Some(e)
            } else {
                warn!("Failed to store line {}: {}", line_number, e);
                None
            }
        }
        Err(join_error) => {
            warn!("Insert task panicked: {:?}", join_error);
            stats.increment_error(ErrorType::TaskPanicked);
            summary.insert_failures += 1;
            None
        }
    }
}

fn spawn_progress_logger(
    start_time: Instant,
    dispatched: Arc<AtomicUsize>,
    total: usize,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::task::spawn(async move {
        let mut interval =
            tokio::time::interval(std::time::Duration::from_secs(LOGGING_INTERVAL as u64));
        // The first tick fires immediately
        interval.tick().await;
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    log_progress(start_time, &dispatched, total);
                }
                _ = cancel.cancelled() => {
                    break;
                }
            }
        }
    })
}

/// Decodes one raw line and parses it. Undecodable lines are returned lossily
/// alongside the encoding error.
fn decode_and_parse(raw: Vec<u8>) -> (String, Result<LogRecord, ParseError>) {
    match String::from_utf8(raw) {
        Ok(line) => {
            let parsed = parse_line(&line);
            (line, parsed)
        }
        Err(e) => {
            let valid_up_to = e.utf8_error().valid_up_to();
            let line = String::from_utf8_lossy(e.as_bytes()).into_owned();
            (line, Err(ParseError::Encoding { valid_up_to }))
        }
    }
}

/// Next line without its `\n` or `\r\n` terminator, or `None` at end of input.
async fn next_raw_line<R>(reader: &mut R) -> std::io::Result<Option<Vec<u8>>>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    if reader.read_until(b'\n', &mut buf).await? == 0 {
        return Ok(None);
    }
    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    }
    Ok(Some(buf))
}

fn read_error(path: &Path, source: std::io::Error) -> IngestError {
    IngestError::Read {
        path: path.to_path_buf(),
        source,
    }
}

/// Number of lines in the file. A trailing newline does not add an empty line.
/// Bytes are not decoded, so non-UTF-8 lines are counted like any other.
async fn count_lines(path: &Path) -> Result<usize, IngestError> {
    let file = tokio::fs::File::open(path)
        .await
        .map_err(|source| read_error(path, source))?;
    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();
    let mut count = 0usize;
    loop {
        buf.clear();
        let read = reader
            .read_until(b'\n', &mut buf)
            .await
            .map_err(|source| read_error(path, source))?;
        if read == 0 {
            return Ok(count);
        }
        count += 1;
    }
}
