//! Thread-safe aggregation of batch results

use std::time::Duration;

use parking_lot::Mutex;
use serde::{Serialize, Serializer};
use tracing::debug;

use super::BatchResult;
use crate::error::ErrorKind;
use crate::processing::ProcessingResult;

/// Running totals shared by the result consumer and report code.
///
/// All access goes through `merge` and `summary`, each a single critical
/// section; the lock is never held across I/O.
#[derive(Debug, Default)]
pub struct StatsAggregator {
    inner: Mutex<ProcessingStats>,
}

#[derive(Debug, Default)]
struct ProcessingStats {
    total_images: usize,
    failed_images: usize,
    total_duration: Duration,
    batch_results: Vec<BatchResult>,
    fastest: Option<ProcessingResult>,
    slowest: Option<ProcessingResult>,
    failures: Vec<FailedImage>,
}

impl ProcessingStats {
    fn record(&mut self, result: &ProcessingResult) {
        if let Some(error) = &result.error {
            self.failed_images += 1;
            self.failures.push(FailedImage {
                filename: result.filename.clone(),
                kind: error.kind(),
                message: error.to_string(),
            });
            return;
        }

        self.total_images += 1;
        self.total_duration += result.duration;

        // ties resolve on filename so the extremes do not depend on arrival order
        let key = extreme_key(result);
        if self.fastest.as_ref().map_or(true, |f| key < extreme_key(f)) {
            self.fastest = Some(result.clone());
        }
        if self.slowest.as_ref().map_or(true, |s| key > extreme_key(s)) {
            self.slowest = Some(result.clone());
        }
    }
}

fn extreme_key(result: &ProcessingResult) -> (Duration, &str) {
    (result.duration, result.filename.as_str())
}

impl StatsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one batch into the totals
    pub fn merge(&self, batch: BatchResult) {
        let mut stats = self.inner.lock();
        for result in &batch.results {
            stats.record(result);
        }
        debug!(
            "Merged batch {} ({} results); {} ok, {} failed so far",
            batch.batch_id,
            batch.results.len(),
            stats.total_images,
            stats.failed_images
        );
        stats.batch_results.push(batch);
    }

    /// Snapshot of the totals
    pub fn summary(&self) -> Summary {
        let stats = self.inner.lock();

        let average_duration = u32::try_from(stats.total_images)
            .ok()
            .filter(|&count| count > 0)
            .map(|count| stats.total_duration / count);

        let mut batches: Vec<BatchSummary> = stats
            .batch_results
            .iter()
            .map(BatchSummary::from)
            .collect();
        batches.sort_by_key(|b| b.batch_id);

        let mut failures = stats.failures.clone();
        failures.sort_by(|a, b| a.filename.cmp(&b.filename));

        Summary {
            total_images: stats.total_images,
            failed_images: stats.failed_images,
            total_duration: stats.total_duration,
            average_duration,
            fastest: stats.fastest.as_ref().map(ImageTiming::from),
            slowest: stats.slowest.as_ref().map(ImageTiming::from),
            batches,
            failures,
        }
    }
}

/// Final report of a run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    /// Successfully processed images
    pub total_images: usize,
    pub failed_images: usize,
    #[serde(serialize_with = "as_secs")]
    pub total_duration: Duration,
    /// `None` when no image succeeded
    #[serde(serialize_with = "as_opt_secs")]
    pub average_duration: Option<Duration>,
    pub fastest: Option<ImageTiming>,
    pub slowest: Option<ImageTiming>,
    /// Per-batch breakdown, ordered by batch id
    pub batches: Vec<BatchSummary>,
    /// Every failed image, ordered by filename
    pub failures: Vec<FailedImage>,
}

impl Summary {
    /// Every image that produced a result, successful or not
    pub fn processed(&self) -> usize {
        self.total_images + self.failed_images
    }

    /// Successful images per second of wall-clock time
    pub fn throughput(&self, wall_time: Duration) -> f64 {
        if wall_time.is_zero() {
            return 0.0;
        }
        self.total_images as f64 / wall_time.as_secs_f64()
    }
}

/// Identifies one image by name and processing time
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageTiming {
    pub filename: String,
    #[serde(serialize_with = "as_secs")]
    pub duration: Duration,
}

impl From<&ProcessingResult> for ImageTiming {
    fn from(result: &ProcessingResult) -> Self {
        Self {
            filename: result.filename.clone(),
            duration: result.duration,
        }
    }
}

/// One image that could not be bordered
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedImage {
    pub filename: String,
    pub kind: ErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSummary {
    pub batch_id: usize,
    pub worker_id: usize,
    pub succeeded: usize,
    pub total: usize,
    /// Wall-clock span from the batch's first job start to its last job end
    #[serde(serialize_with = "as_secs")]
    pub elapsed: Duration,
}

impl BatchSummary {
    pub fn success_ratio(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.succeeded as f64 / self.total as f64
    }
}

impl From<&BatchResult> for BatchSummary {
    fn from(batch: &BatchResult) -> Self {
        Self {
            batch_id: batch.batch_id,
            worker_id: batch.worker_id,
            succeeded: batch.succeeded(),
            total: batch.results.len(),
            elapsed: batch.elapsed(),
        }
    }
}

fn as_secs<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64())
}

fn as_opt_secs<S: Serializer>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error> {
    match duration {
        Some(duration) => serializer.serialize_some(&duration.as_secs_f64()),
        None => serializer.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::JobError;
    use std::sync::Arc;
    use std::time::Instant;

    fn ok(name: &str, millis: u64) -> ProcessingResult {
        ProcessingResult::succeeded(name, Duration::from_millis(millis))
    }

    fn failed(name: &str) -> ProcessingResult {
        ProcessingResult::failed(name, Duration::from_millis(1), JobError::Decode("bad".into()))
    }

    fn batch(id: usize, results: Vec<ProcessingResult>) -> BatchResult {
        let started_at = Instant::now();
        BatchResult {
            batch_id: id,
            worker_id: id * 10,
            started_at,
            finished_at: started_at + Duration::from_millis(id as u64 * 100),
            results,
        }
    }

    fn sample_batches() -> Vec<BatchResult> {
        vec![
            batch(1, vec![ok("a.jpg", 30), ok("b.jpg", 10), failed("c.jpg")]),
            batch(2, vec![ok("d.png", 50), ok("e.png", 10)]),
            batch(3, vec![failed("f.jpg"), failed("g.jpg")]),
            batch(4, vec![ok("h.jpeg", 50), ok("i.jpg", 20), ok("j.jpg", 40)]),
        ]
    }

    #[test]
    fn test_empty_summary() {
        let summary = StatsAggregator::new().summary();
        assert_eq!(summary.total_images, 0);
        assert_eq!(summary.failed_images, 0);
        assert_eq!(summary.average_duration, None);
        assert!(summary.fastest.is_none() && summary.slowest.is_none());
        assert!(summary.batches.is_empty());
        assert_eq!(summary.throughput(Duration::from_secs(1)), 0.0);
    }

    #[test]
    fn test_merge_totals() {
        let stats = StatsAggregator::new();
        for b in sample_batches() {
            stats.merge(b);
        }

        let summary = stats.summary();
        assert_eq!(summary.total_images, 7);
        assert_eq!(summary.failed_images, 3);
        assert_eq!(summary.processed(), 10);
        assert_eq!(summary.total_duration, Duration::from_millis(210));
        assert_eq!(summary.average_duration, Some(Duration::from_millis(30)));

        // 10ms and 50ms ties resolve by filename
        assert_eq!(summary.fastest.as_ref().unwrap().filename, "b.jpg");
        assert_eq!(summary.slowest.as_ref().unwrap().filename, "h.jpeg");
        assert_eq!(summary.slowest.as_ref().unwrap().duration, Duration::from_millis(50));
    }

    #[test]
    fn test_failures_are_listed_by_name() {
        let stats = StatsAggregator::new();
        for b in sample_batches().into_iter().rev() {
            stats.merge(b);
        }

        let summary = stats.summary();
        let names: Vec<&str> = summary.failures.iter().map(|f| f.filename.as_str()).collect();
        assert_eq!(names, ["c.jpg", "f.jpg", "g.jpg"]);
        assert_eq!(summary.failures.len(), summary.failed_images);
        assert_eq!(summary.failures[0].kind, ErrorKind::DecodeError);
        assert_eq!(summary.failures[0].message, "error decoding image: bad");

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["failures"][1]["filename"], "f.jpg");
        assert_eq!(json["failures"][1]["kind"], "DecodeError");
    }

    #[test]
    fn test_failures_never_become_extremes() {
        let stats = StatsAggregator::new();
        stats.merge(batch(1, vec![failed("zero.jpg"), ok("only.jpg", 5)]));

        let summary = stats.summary();
        assert_eq!(summary.fastest.as_ref().unwrap().filename, "only.jpg");
        assert_eq!(summary.slowest.as_ref().unwrap().filename, "only.jpg");
    }

    #[test]
    fn test_first_success_seeds_extremes_even_when_instant() {
        let stats = StatsAggregator::new();
        stats.merge(batch(1, vec![ok("instant.jpg", 0)]));
        stats.merge(batch(2, vec![ok("slow.jpg", 9)]));

        let summary = stats.summary();
        assert_eq!(summary.fastest.unwrap().filename, "instant.jpg");
        assert_eq!(summary.slowest.unwrap().filename, "slow.jpg");
    }

    #[test]
    fn test_merge_order_does_not_matter() {
        let forward = StatsAggregator::new();
        for b in sample_batches() {
            forward.merge(b);
        }

        let orders: [&[usize]; 3] = [&[3, 2, 1, 0], &[2, 0, 3, 1], &[1, 3, 0, 2]];
        for order in orders {
            let batches = sample_batches();
            let shuffled = StatsAggregator::new();
            for &i in order {
                shuffled.merge(batches[i].clone());
            }

            let (a, b) = (forward.summary(), shuffled.summary());
            assert_eq!(a.total_images, b.total_images);
            assert_eq!(a.failed_images, b.failed_images);
            assert_eq!(a.total_duration, b.total_duration);
            assert_eq!(a.fastest, b.fastest);
            assert_eq!(a.slowest, b.slowest);
            let ids: Vec<usize> = b.batches.iter().map(|s| s.batch_id).collect();
            assert_eq!(ids, [1, 2, 3, 4]);
        }
    }

    #[test]
    fn test_extremes_bound_every_success() {
        let stats = StatsAggregator::new();
        let durations = [17u64, 3, 99, 42, 3, 64, 8, 99, 21];
        let results: Vec<ProcessingResult> = durations
            .iter()
            .enumerate()
            .map(|(i, &ms)| ok(&format!("{i}.jpg"), ms))
            .collect();
        stats.merge(batch(1, results.clone()));

        let summary = stats.summary();
        let fastest = summary.fastest.unwrap().duration;
        let slowest = summary.slowest.unwrap().duration;
        for result in &results {
            assert!(fastest <= result.duration && result.duration <= slowest);
        }
    }

    #[test]
    fn test_batch_breakdown() {
        let stats = StatsAggregator::new();
        for b in sample_batches().into_iter().rev() {
            stats.merge(b);
        }

        let summary = stats.summary();
        let first = &summary.batches[0];
        assert_eq!((first.batch_id, first.worker_id), (1, 10));
        assert_eq!((first.succeeded, first.total), (2, 3));
        assert_eq!(first.elapsed, Duration::from_millis(100));
        assert!((first.success_ratio() - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(summary.batches[2].success_ratio(), 0.0);
    }

    #[test]
    fn test_concurrent_merges_keep_counts() {
        let stats = Arc::new(StatsAggregator::new());

        std::thread::scope(|scope| {
            for worker in 0..8 {
                let stats = Arc::clone(&stats);
                scope.spawn(move || {
                    for round in 0..25 {
                        let id = worker * 25 + round + 1;
                        stats.merge(batch(
                            id,
                            vec![ok(&format!("{id}-a.jpg"), id as u64), failed(&format!("{id}-b.jpg"))],
                        ));
                    }
                });
            }
        });

        let summary = stats.summary();
        assert_eq!(summary.total_images, 200);
        assert_eq!(summary.failed_images, 200);
        assert_eq!(summary.batches.len(), 200);
        let results: usize = summary.batches.iter().map(|b| b.total).sum();
        assert_eq!(summary.processed(), results);
        assert_eq!(summary.fastest.unwrap().duration, Duration::from_millis(1));
        assert_eq!(summary.slowest.unwrap().duration, Duration::from_millis(200));
    }

    #[test]
    fn test_summary_serializes_seconds() {
        let stats = StatsAggregator::new();
        stats.merge(batch(1, vec![ok("a.jpg", 1500)]));

        let json = serde_json::to_value(stats.summary()).unwrap();
        assert_eq!(json["total_images"], 1);
        assert_eq!(json["average_duration"], 1.5);
        assert_eq!(json["fastest"]["filename"], "a.jpg");
        assert_eq!(json["batches"][0]["elapsed"], 0.1);

        let empty = serde_json::to_value(StatsAggregator::new().summary()).unwrap();
        assert!(empty["average_duration"].is_null());
    }
}
