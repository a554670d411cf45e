//! Pipeline metrics: counters, daily activity histogram, feedback ratings.
//!
//! A single `Mutex` serializes all updates so that counters stay consistent
//! with store mutations made under the same request. The daily histogram has
//! one bucket per UTC weekday (0 = Monday .. 6 = Sunday), computed lazily
//! from wall-clock time at the moment of each update — no background rollover
//! task, and buckets accumulate indefinitely.

use std::sync::Mutex;

use chrono::{Datelike, Utc};
use serde::Serialize;

use crate::error::GraphError;

/// Fixed weekday labels for the histogram, Monday first.
pub const DAY_LABELS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

#[derive(Default)]
struct MetricsInner {
    files_uploaded: u64,
    graphs_processed: u64,
    processing_jobs: u64,
    last_graph_time_ms: u64,
    last_uploaded_file: Option<String>,
    daily: [u64; 7],
    ratings: Vec<u8>,
}

/// Process-wide metrics aggregator, shared via `Arc` across request handlers.
pub struct MetricsAggregator {
    inner: Mutex<MetricsInner>,
}

/// RAII handle for an in-flight ingestion job. Dropping it decrements the
/// `processing_jobs` counter, so the count cannot leak on early returns or
/// extractor failures.
pub struct JobGuard<'a> {
    metrics: &'a MetricsAggregator,
}

impl Drop for JobGuard<'_> {
    fn drop(&mut self) {
        self.metrics.end_job();
    }
}

impl MetricsAggregator {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MetricsInner::default()),
        }
    }

    /// Mark an ingestion job as started. The returned guard ends the job
    /// when dropped.
    pub fn begin_job(&self) -> JobGuard<'_> {
        self.inner.lock().unwrap().processing_jobs += 1;
        JobGuard { metrics: self }
    }

    /// Decrement the in-flight job count, clamping at zero so unmatched
    /// calls cannot drive it negative.
    pub fn end_job(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.processing_jobs = inner.processing_jobs.saturating_sub(1);
    }

    /// Record a completed row upload: bumps `files_uploaded`, remembers the
    /// filename, and adds `triples_added` (possibly 0) to today's bucket.
    pub fn record_upload(&self, filename: &str, triples_added: u64) {
        let mut inner = self.inner.lock().unwrap();
        inner.files_uploaded += 1;
        inner.last_uploaded_file = Some(filename.to_string());
        inner.daily[today_index()] += triples_added;
    }

    /// Record a completed text analysis. The daily bucket is bumped by
    /// `max(1, activity_delta)` so any successful analysis registers
    /// non-zero pipeline activity even when every candidate was a duplicate.
    pub fn record_graph_processed(&self, elapsed_ms: u64, activity_delta: u64) {
        let mut inner = self.inner.lock().unwrap();
        inner.graphs_processed += 1;
        inner.last_graph_time_ms = elapsed_ms;
        inner.daily[today_index()] += activity_delta.max(1);
    }

    /// Append a feedback rating. Ratings outside `[1, 5]` are rejected.
    pub fn record_feedback(&self, rating: i64) -> Result<(), GraphError> {
        if !(1..=5).contains(&rating) {
            return Err(GraphError::validation(format!(
                "rating must be an integer in 1..=5, got {rating}"
            )));
        }
        self.inner.lock().unwrap().ratings.push(rating as u8);
        Ok(())
    }

    /// Consistent snapshot of all counters, the histogram, and the average
    /// rating (absent while no feedback has been recorded).
    pub fn snapshot(&self) -> MetricsSnapshot {
        let inner = self.inner.lock().unwrap();
        let avg_rating = if inner.ratings.is_empty() {
            None
        } else {
            let sum: u64 = inner.ratings.iter().map(|&r| r as u64).sum();
            Some(sum as f64 / inner.ratings.len() as f64)
        };
        MetricsSnapshot {
            files_uploaded: inner.files_uploaded,
            graphs_processed: inner.graphs_processed,
            processing_jobs: inner.processing_jobs,
            last_graph_time_ms: inner.last_graph_time_ms,
            last_uploaded_file: inner.last_uploaded_file.clone(),
            avg_rating,
            daily: DailyActivity {
                labels: DAY_LABELS,
                counts: inner.daily,
            },
        }
    }
}

impl Default for MetricsAggregator {
    fn default() -> Self {
        Self::new()
    }
}

/// Today's histogram bucket, from the UTC wall clock at call time.
fn today_index() -> usize {
    Utc::now().weekday().num_days_from_monday() as usize
}

/// Point-in-time view of the aggregator.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub files_uploaded: u64,
    pub graphs_processed: u64,
    pub processing_jobs: u64,
    pub last_graph_time_ms: u64,
    pub last_uploaded_file: Option<String>,
    pub avg_rating: Option<f64>,
    pub daily: DailyActivity,
}

/// Seven-bucket weekday histogram with fixed Mon..Sun labels.
#[derive(Debug, Clone, Serialize)]
pub struct DailyActivity {
    pub labels: [&'static str; 7],
    pub counts: [u64; 7],
}
