//! Bounded worker pool that turns batches of jobs into batch results
//!
//! The producer (the caller of [`WorkerPool::run`]) partitions the jobs and
//! feeds them through a bounded batch channel. Each worker pulls one batch
//! at a time, runs its jobs in order on the blocking thread pool and emits
//! a [`BatchResult`]. The result channel is closed only after every worker
//! has been joined, so the consuming loop sees every result before it ends.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{mpsc, Mutex as AsyncMutex};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::error::{BorderbatchError, JobError, Result};
use crate::processing::{ImageJob, JobProcessor, ProcessingResult};

pub mod progress;
pub mod scheduler;
pub mod stats;

pub use progress::*;
pub use scheduler::*;
pub use stats::*;

/// Everything one worker produced for one batch
#[derive(Debug, Clone)]
pub struct BatchResult {
    pub batch_id: usize,
    pub worker_id: usize,
    pub started_at: Instant,
    pub finished_at: Instant,
    /// One entry per job, in batch order
    pub results: Vec<ProcessingResult>,
}

impl BatchResult {
    pub fn elapsed(&self) -> Duration {
        self.finished_at.saturating_duration_since(self.started_at)
    }

    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }
}

/// Fixed-size pool of workers sharing one batch queue and one result sink
pub struct WorkerPool<P: JobProcessor> {
    processor: Arc<P>,
    workers: usize,
    reporter: ProgressReporter,
}

impl<P: JobProcessor> WorkerPool<P> {
    /// Create a pool of `workers` workers (at least one)
    pub fn new(processor: Arc<P>, workers: usize) -> Self {
        Self {
            processor,
            workers: workers.max(1),
            reporter: ProgressReporter::silent(),
        }
    }

    /// Report per-image progress through `reporter`
    pub fn with_reporter(mut self, reporter: ProgressReporter) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Process every job and merge the outcome into `stats`.
    ///
    /// Per-image failures are recorded in `stats`; only a broken pool
    /// (every worker gone while batches remain) is an error.
    pub async fn run(&self, jobs: Vec<ImageJob>, batch_size: usize, stats: &StatsAggregator) -> Result<()> {
        let batch_size = batch_size.max(1);
        let job_count = jobs.len();
        let batches = partition(jobs, batch_size);

        if batches.is_empty() {
            info!("No images to process");
            return Ok(());
        }

        info!(
            "Processing {} images in {} batches with {} workers",
            job_count,
            batches.len(),
            self.workers
        );

        let (batch_tx, batch_rx) = mpsc::channel::<Batch>(self.workers);
        let (result_tx, mut result_rx) = mpsc::channel::<BatchResult>(job_count / batch_size + 1);
        let batch_rx = Arc::new(AsyncMutex::new(batch_rx));

        let mut workers = JoinSet::new();
        for worker_id in 0..self.workers {
            workers.spawn(run_worker(
                worker_id,
                Arc::clone(&batch_rx),
                result_tx.clone(),
                Arc::clone(&self.processor),
                self.reporter.clone(),
            ));
        }
        drop(batch_rx);

        // The result sink closes only after the join barrier.
        let closer = tokio::spawn(async move {
            let mut failed_workers = 0usize;
            while let Some(joined) = workers.join_next().await {
                if let Err(e) = joined {
                    error!("Worker task failed: {}", e);
                    failed_workers += 1;
                }
            }
            drop(result_tx);
            failed_workers
        });

        for batch in batches {
            let batch_id = batch.id;
            if batch_tx.send(batch).await.is_err() {
                return Err(BorderbatchError::parallel(format!(
                    "all workers exited before batch {} was queued",
                    batch_id
                )));
            }
            debug!("Queued batch {}", batch_id);
        }
        drop(batch_tx);

        while let Some(batch_result) = result_rx.recv().await {
            stats.merge(batch_result);
        }

        let failed_workers = closer
            .await
            .map_err(|e| BorderbatchError::parallel(format!("Task join error: {}", e)))?;
        if failed_workers > 0 {
            warn!("{} workers terminated abnormally", failed_workers);
        }

        self.reporter.finish();
        Ok(())
    }
}

async fn run_worker<P: JobProcessor>(
    worker_id: usize,
    batches: Arc<AsyncMutex<mpsc::Receiver<Batch>>>,
    results: mpsc::Sender<BatchResult>,
    processor: Arc<P>,
    reporter: ProgressReporter,
) {
    loop {
        let next = batches.lock().await.recv().await;
        let Some(batch) = next else {
            break;
        };

        let batch_result = process_batch(worker_id, batch, &processor, &reporter).await;
        if results.send(batch_result).await.is_err() {
            warn!("Result channel closed, worker {} stopping", worker_id);
            break;
        }
    }
}

async fn process_batch<P: JobProcessor>(
    worker_id: usize,
    batch: Batch,
    processor: &Arc<P>,
    reporter: &ProgressReporter,
) -> BatchResult {
    debug!("Worker {} starting batch {} ({} jobs)", worker_id, batch.id, batch.len());

    let started_at = Instant::now();
    let mut results = Vec::with_capacity(batch.len());

    for job in batch.jobs {
        let filename = job.filename();
        let processor = Arc::clone(processor);

        let start = Instant::now();
        let outcome = tokio::task::spawn_blocking(move || processor.process(&job)).await;
        let duration = start.elapsed();

        let result = match outcome {
            Ok(Ok(())) => ProcessingResult::succeeded(filename, duration),
            Ok(Err(e)) => {
                warn!("Failed to process {}: {}", filename, e);
                ProcessingResult::failed(filename, duration, e)
            }
            Err(e) => {
                error!("Processing {} panicked: {}", filename, e);
                ProcessingResult::failed(filename, duration, JobError::WorkerPanic(e.to_string()))
            }
        };

        reporter.image_done(&result);
        results.push(result);
    }

    BatchResult {
        batch_id: batch.id,
        worker_id,
        started_at,
        finished_at: Instant::now(),
        results,
    }
}
