//! Ingestion pipeline orchestration.
//!
//! Coordinates the flow from raw input to stored triples: extraction (or
//! direct row parsing) → deduplicated store insertion → metrics update →
//! timing capture. Both entry points account for their in-flight job via a
//! [`JobGuard`](crate::metrics::JobGuard), so `processing_jobs` unwinds on
//! every path, including extractor failures.
//!
//! There is no rollback: triples inserted before a failure stay inserted.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::info;

use crate::error::GraphError;
use crate::extract::Extractor;
use crate::metrics::MetricsAggregator;
use crate::models::Triple;
use crate::store::TripleStore;

/// Outcome of a text analysis: the full candidate list (including
/// duplicates the store rejected) and the count actually inserted, so
/// callers can distinguish "what was proposed" from "what was new".
#[derive(Debug, Clone, Serialize)]
pub struct TextIngest {
    pub triples: Vec<Triple>,
    pub added: usize,
}

/// Outcome of a row upload.
#[derive(Debug, Clone, Serialize)]
pub struct RowIngest {
    pub triples_added: usize,
    pub triples_total: usize,
}

/// Orchestrates ingestion against the shared store and metrics.
pub struct IngestionPipeline {
    store: Arc<TripleStore>,
    metrics: Arc<MetricsAggregator>,
}

impl IngestionPipeline {
    pub fn new(store: Arc<TripleStore>, metrics: Arc<MetricsAggregator>) -> Self {
        Self { store, metrics }
    }

    /// Run the extractor over `text` and insert its candidates.
    ///
    /// Records `graphs_processed`, the elapsed time, and daily activity of
    /// `max(1, added)` — a successful analysis always registers, even when
    /// every candidate was a duplicate.
    ///
    /// # Errors
    ///
    /// - [`GraphError::Validation`] — `text` is blank.
    /// - [`GraphError::Ingestion`] — the extractor failed; the job counter
    ///   is unwound before the error surfaces.
    pub fn ingest_text(
        &self,
        text: &str,
        extractor: &dyn Extractor,
    ) -> Result<TextIngest, GraphError> {
        if text.trim().is_empty() {
            return Err(GraphError::validation("text must not be empty"));
        }

        let _job = self.metrics.begin_job();
        let start = Instant::now();

        let candidates = extractor.extract(text).map_err(GraphError::Ingestion)?;

        let added = candidates
            .iter()
            .filter(|t| self.store.insert((*t).clone()))
            .count();

        let elapsed_ms = start.elapsed().as_millis() as u64;
        self.metrics.record_graph_processed(elapsed_ms, added as u64);

        info!(
            candidates = candidates.len(),
            added, elapsed_ms, "analyzed text"
        );

        Ok(TextIngest {
            triples: candidates,
            added,
        })
    }

    /// Insert a batch of pre-parsed rows under `filename`.
    ///
    /// Each row contributes its first three fields, trimmed, as
    /// subject/relation/object; rows with fewer than three fields are
    /// dropped silently. Records `files_uploaded`, the filename, and daily
    /// activity equal to the number of newly inserted triples (possibly 0).
    ///
    /// # Errors
    ///
    /// [`GraphError::Validation`] — blank filename or empty row batch.
    pub fn ingest_rows(
        &self,
        filename: &str,
        rows: &[Vec<String>],
    ) -> Result<RowIngest, GraphError> {
        if filename.trim().is_empty() {
            return Err(GraphError::validation("filename must not be empty"));
        }
        if rows.is_empty() {
            return Err(GraphError::validation("no rows to ingest"));
        }

        let _job = self.metrics.begin_job();

        let mut added = 0usize;
        for row in rows {
            if row.len() < 3 {
                continue;
            }
            let triple = Triple::new(row[0].trim(), row[1].trim(), row[2].trim());
            if self.store.insert(triple) {
                added += 1;
            }
        }

        self.metrics.record_upload(filename, added as u64);

        info!(filename, rows = rows.len(), added, "ingested rows");

        Ok(RowIngest {
            triples_added: added,
            triples_total: self.store.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::PatternExtractor;
    use anyhow::{bail, Result};

    struct FailingExtractor;

    impl Extractor for FailingExtractor {
        fn extract(&self, _text: &str) -> Result<Vec<Triple>> {
            bail!("model unavailable")
        }
    }

    fn pipeline() -> (IngestionPipeline, Arc<TripleStore>, Arc<MetricsAggregator>) {
        let store = Arc::new(TripleStore::new());
        let metrics = Arc::new(MetricsAggregator::new());
        (
            IngestionPipeline::new(store.clone(), metrics.clone()),
            store,
            metrics,
        )
    }

    fn row(fields: &[&str]) -> Vec<String> {
        fields.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_ingest_rows_dedupes_and_drops_short_rows() {
        let (pipeline, _store, _metrics) = pipeline();
        let rows = vec![
            row(&["A", "rel", "B"]),
            row(&["A", "rel", "B"]),
            row(&["C", "rel2"]),
        ];
        let report = pipeline.ingest_rows("facts.csv", &rows).unwrap();
        assert_eq!(report.triples_added, 1);
        assert_eq!(report.triples_total, 1);
    }

    #[test]
    fn test_ingest_rows_trims_fields_and_ignores_extras() {
        let (pipeline, store, _metrics) = pipeline();
        let rows = vec![row(&[" A ", " rel ", " B ", "ignored"])];
        pipeline.ingest_rows("facts.csv", &rows).unwrap();
        assert_eq!(store.all()[0], Triple::new("A", "rel", "B"));
    }

    #[test]
    fn test_ingest_rows_validation() {
        let (pipeline, _store, _metrics) = pipeline();
        assert!(matches!(
            pipeline.ingest_rows("", &[row(&["a", "b", "c"])]),
            Err(GraphError::Validation(_))
        ));
        assert!(matches!(
            pipeline.ingest_rows("facts.csv", &[]),
            Err(GraphError::Validation(_))
        ));
    }

    #[test]
    fn test_ingest_rows_updates_metrics() {
        let (pipeline, _store, metrics) = pipeline();
        pipeline
            .ingest_rows("facts.csv", &[row(&["a", "r", "b"])])
            .unwrap();
        let snap = metrics.snapshot();
        assert_eq!(snap.files_uploaded, 1);
        assert_eq!(snap.last_uploaded_file.as_deref(), Some("facts.csv"));
        assert_eq!(snap.processing_jobs, 0);
        assert_eq!(snap.daily.counts.iter().sum::<u64>(), 1);
    }

    #[test]
    fn test_ingest_text_returns_candidates_and_added() {
        let (pipeline, store, metrics) = pipeline();
        let extractor = PatternExtractor::new();
        let text = "Albert Einstein developed the theory of relativity in 1905.";

        let first = pipeline.ingest_text(text, &extractor).unwrap();
        assert_eq!(first.triples.len(), 2);
        assert_eq!(first.added, 2);

        // Re-analysis proposes the same candidates but adds nothing, and
        // still registers one unit of daily activity.
        let daily_before: u64 = metrics.snapshot().daily.counts.iter().sum();
        let second = pipeline.ingest_text(text, &extractor).unwrap();
        assert_eq!(second.triples.len(), 2);
        assert_eq!(second.added, 0);
        assert_eq!(store.len(), 2);
        let daily_after: u64 = metrics.snapshot().daily.counts.iter().sum();
        assert_eq!(daily_after, daily_before + 1);
        assert_eq!(metrics.snapshot().graphs_processed, 2);
    }

    #[test]
    fn test_ingest_text_blank_is_rejected_without_job() {
        let (pipeline, _store, metrics) = pipeline();
        let err = pipeline
            .ingest_text("   ", &PatternExtractor::new())
            .unwrap_err();
        assert!(matches!(err, GraphError::Validation(_)));
        assert_eq!(metrics.snapshot().processing_jobs, 0);
        assert_eq!(metrics.snapshot().graphs_processed, 0);
    }

    #[test]
    fn test_ingest_text_unwinds_job_on_extractor_failure() {
        let (pipeline, _store, metrics) = pipeline();
        let before = metrics.snapshot().processing_jobs;
        let err = pipeline.ingest_text("some text", &FailingExtractor).unwrap_err();
        assert!(matches!(err, GraphError::Ingestion(_)));
        assert_eq!(metrics.snapshot().processing_jobs, before);
    }
}
