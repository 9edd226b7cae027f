//! Bounded worker pool with fixed-window batch throttling.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use booksum_chunker::Chunk;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::error::SummarizerError;

/// Runs one job per chunk, at most `workers` at a time, in batches of
/// `batch_size`. After every batch but the last the pool sleeps for what is
/// left of `window`, so no more than one batch is issued per window.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    workers: usize,
    batch_size: usize,
    window: Duration,
}

impl WorkerPool {
    pub fn new(workers: usize, batch_size: usize, window: Duration) -> Self {
        Self {
            workers: workers.max(1),
            batch_size: batch_size.max(1),
            window,
        }
    }

    /// Apply `job` to every chunk and return the results in chunk-id order,
    /// whatever order they completed in. The first failure fails the map:
    /// calls already running are allowed to finish, queued ones are skipped
    /// and later batches never start.
    pub async fn map<F, Fut>(&self, chunks: Vec<Chunk>, mut job: F) -> Result<Vec<String>, SummarizerError>
    where
        F: FnMut(Chunk) -> Fut,
        Fut: Future<Output = Result<String, SummarizerError>> + Send + 'static,
    {
        let total = chunks.len();
        let workers = self.workers.min(total).max(1);
        info!(workers, total_chunks = total, batch_size = self.batch_size, "starting map");

        let semaphore = Arc::new(Semaphore::new(workers));
        let failed = Arc::new(AtomicBool::new(false));
        let mut results: Vec<(usize, String)> = Vec::with_capacity(total);
        let mut remaining = chunks.into_iter().peekable();
        let mut batch_no = 0;

        while remaining.peek().is_some() {
            batch_no += 1;
            let started = Instant::now();
            let mut tasks = JoinSet::new();

            for chunk in remaining.by_ref().take(self.batch_size) {
                let id = chunk.id();
                let work = job(chunk);
                let slots = semaphore.clone();
                let failed = failed.clone();
                tasks.spawn(async move {
                    let _permit = slots
                        .acquire_owned()
                        .await
                        .map_err(|e| SummarizerError::Worker(e.to_string()))?;
                    if failed.load(Ordering::SeqCst) {
                        return Ok(None);
                    }
                    let outcome = work.await;
                    if outcome.is_err() {
                        failed.store(true, Ordering::SeqCst);
                    }
                    outcome.map(|summary| Some((id, summary)))
                });
            }

            let mut first_error = None;
            while let Some(joined) = tasks.join_next().await {
                let outcome = joined.map_err(|e| SummarizerError::Worker(e.to_string()));
                match outcome.and_then(|result| result) {
                    Ok(Some(done)) => results.push(done),
                    Ok(None) => {}
                    Err(e) => {
                        failed.store(true, Ordering::SeqCst);
                        if first_error.is_none() {
                            warn!(batch = batch_no, error = %e, "chunk failed, waiting for running calls");
                            first_error = Some(e);
                        }
                    }
                }
            }
            if let Some(e) = first_error {
                return Err(e);
            }

            if remaining.peek().is_some() {
                let pause = self.window.saturating_sub(started.elapsed());
                if !pause.is_zero() {
                    warn!(
                        batch = batch_no,
                        sleep_secs = pause.as_secs_f64(),
                        "sleeping to stay under the model rate limit"
                    );
                    tokio::time::sleep(pause).await;
                }
            }
        }

        results.sort_by_key(|(id, _)| *id);
        Ok(results.into_iter().map(|(_, summary)| summary).collect())
    }
}
