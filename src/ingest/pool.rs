//! Bounded pool of spawned tasks.

use std::future::Future;
use std::sync::Arc;

use futures::stream::FuturesUnordered;
use futures::{FutureExt, StreamExt};
use tokio::sync::{AcquireError, Semaphore};
use tokio::task::{JoinError, JoinHandle};

/// Runs at most `size` futures at a time on the tokio runtime.
///
/// [`spawn`](WorkerPool::spawn) waits for a free slot before spawning, so the
/// caller is throttled to the pool's pace. Results are collected with
/// [`reap`](WorkerPool::reap) while dispatching and [`drain`](WorkerPool::drain)
/// once dispatch is over.
pub struct WorkerPool<T> {
    semaphore: Arc<Semaphore>,
    tasks: FuturesUnordered<JoinHandle<T>>,
}

impl<T: Send + 'static> WorkerPool<T> {
    /// Creates a pool with `size` task slots.
    pub fn new(size: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(size)),
            tasks: FuturesUnordered::new(),
        }
    }

    /// Spawns `fut` once a slot is free.
    ///
    /// Fails only after [`close`](WorkerPool::close); the future is then dropped
    /// without running.
    pub async fn spawn<F>(&mut self, fut: F) -> Result<(), AcquireError>
    where
        F: Future<Output = T> + Send + 'static,
    {
        let permit = Arc::clone(&self.semaphore).acquire_owned().await?;
        self.tasks.push(tokio::spawn(async move {
            let _permit = permit;
            fut.await
        }));
        Ok(())
    }

    /// Results of the tasks that have already finished, without waiting.
    pub fn reap(&mut self) -> Vec<Result<T, JoinError>> {
        let mut finished = Vec::new();
        while let Some(Some(result)) = self.tasks.next().now_or_never() {
            finished.push(result);
        }
        finished
    }

    /// Waits for every spawned task and returns their results in completion order.
    pub async fn drain(&mut self) -> Vec<Result<T, JoinError>> {
        let mut finished = Vec::with_capacity(self.tasks.len());
        while let Some(result) = self.tasks.next().await {
            finished.push(result);
        }
        finished
    }

    /// Spawned tasks whose results have not been collected yet.
    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    /// Refuses further spawns. Tasks already running are unaffected.
    pub fn close(&self) {
        self.semaphore.close();
    }
}
