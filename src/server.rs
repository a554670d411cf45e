//! HTTP API server.
//!
//! Exposes the knowledge graph over a JSON HTTP API for presentation layers
//! (dashboards, browser clients). All state is in-memory and scoped to the
//! server process.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/search` | Semantic node search: query + optional k |
//! | `POST` | `/search_node` | All triples touching a node |
//! | `POST` | `/analyze` | Extract triples from raw text and store them |
//! | `POST` | `/upload` | Ingest a batch of pre-parsed rows |
//! | `POST` | `/feedback` | Record a 1–5 relevance rating |
//! | `GET`  | `/stats` | Counters, node/triple totals, average rating |
//! | `GET`  | `/metrics` | Daily activity histogram (Mon..Sun) |
//! | `GET`  | `/recent_triples` | Last 50 stored triples |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! All error responses carry a machine-readable envelope:
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "query must not be empty" } }
//! ```
//!
//! Codes: `bad_request` (400), `not_found` (404), `timeout` (408),
//! `embeddings_disabled` (400), `embedding_error` (500),
//! `ingestion_error` (500).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted to support browser-based
//! dashboards.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::config::Config;
use crate::embedding::{create_embedder, Embedder};
use crate::error::GraphError;
use crate::extract::{Extractor, PatternExtractor};
use crate::ingest::{IngestionPipeline, RowIngest, TextIngest};
use crate::metrics::{DailyActivity, MetricsAggregator};
use crate::models::Triple;
use crate::rank::{search_node, NodeMatches, RankedNodes, SemanticRanker};
use crate::store::TripleStore;

/// How many triples `/recent_triples` returns.
const RECENT_PREVIEW: usize = 50;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    store: Arc<TripleStore>,
    metrics: Arc<MetricsAggregator>,
    pipeline: Arc<IngestionPipeline>,
    ranker: Arc<SemanticRanker>,
    extractor: Arc<dyn Extractor>,
    default_top_k: usize,
}

impl AppState {
    /// Wire up a fresh store, metrics, pipeline, and ranker around the given
    /// embedder and extractor.
    pub fn new(config: &Config, embedder: Arc<dyn Embedder>, extractor: Arc<dyn Extractor>) -> Self {
        let store = Arc::new(TripleStore::new());
        let metrics = Arc::new(MetricsAggregator::new());
        let pipeline = Arc::new(IngestionPipeline::new(store.clone(), metrics.clone()));
        let ranker = Arc::new(SemanticRanker::new(
            embedder,
            Duration::from_secs(config.embedding.timeout_secs),
        ));
        Self {
            store,
            metrics,
            pipeline,
            ranker,
            extractor,
            default_top_k: config.search.top_k,
        }
    }
}

/// Start the HTTP server with the default rule-based extractor.
///
/// Binds to `[server].bind` and runs until the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    run_server_with_extractor(config, Arc::new(PatternExtractor::new())).await
}

/// Start the HTTP server with a custom [`Extractor`] implementation.
pub async fn run_server_with_extractor(
    config: &Config,
    extractor: Arc<dyn Extractor>,
) -> anyhow::Result<()> {
    let embedder: Arc<dyn Embedder> = create_embedder(&config.embedding)?.into();
    let state = AppState::new(config, embedder, extractor);
    let app = app_router(state);

    info!(bind = %config.server.bind, "semgraph server listening");

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the router; separated from [`run_server`] so tests can drive the
/// API without binding a socket.
pub fn app_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/search", post(handle_search))
        .route("/search_node", post(handle_search_node))
        .route("/analyze", post(handle_analyze))
        .route("/upload", post(handle_upload))
        .route("/feedback", post(handle_feedback))
        .route("/stats", get(handle_stats))
        .route("/metrics", get(handle_metrics))
        .route("/recent_triples", get(handle_recent_triples))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state)
}

// ============ Error response ============

/// JSON error envelope.
#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Internal error type that converts into an HTTP response.
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<GraphError> for AppError {
    fn from(err: GraphError) -> Self {
        let message = err.to_string();
        let (status, code) = match &err {
            GraphError::Validation(_) => (StatusCode::BAD_REQUEST, err.code()),
            GraphError::EmptyGraph | GraphError::NotFound(_) => {
                (StatusCode::NOT_FOUND, err.code())
            }
            GraphError::EmbeddingTimeout(_) => (StatusCode::REQUEST_TIMEOUT, err.code()),
            GraphError::Embedding(_) if message.contains("disabled") => {
                (StatusCode::BAD_REQUEST, "embeddings_disabled")
            }
            GraphError::Embedding(_) => (StatusCode::INTERNAL_SERVER_ERROR, err.code()),
            GraphError::Ingestion(_) => (StatusCode::INTERNAL_SERVER_ERROR, err.code()),
        };
        AppError {
            status,
            code: code.to_string(),
            message,
        }
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ GET /stats ============

/// Pipeline counters merged with store-derived totals.
#[derive(Serialize)]
struct StatsResponse {
    files_uploaded: u64,
    triples_total: usize,
    unique_nodes: usize,
    graphs_processed: u64,
    processing_jobs: u64,
    last_graph_time_ms: u64,
    last_uploaded_file: Option<String>,
    avg_rating: Option<f64>,
}

async fn handle_stats(State(state): State<AppState>) -> Json<StatsResponse> {
    let snap = state.metrics.snapshot();
    Json(StatsResponse {
        files_uploaded: snap.files_uploaded,
        triples_total: state.store.len(),
        unique_nodes: state.store.node_count(),
        graphs_processed: snap.graphs_processed,
        processing_jobs: snap.processing_jobs,
        last_graph_time_ms: snap.last_graph_time_ms,
        last_uploaded_file: snap.last_uploaded_file,
        avg_rating: snap.avg_rating,
    })
}

// ============ GET /metrics ============

async fn handle_metrics(State(state): State<AppState>) -> Json<DailyActivity> {
    Json(state.metrics.snapshot().daily)
}

// ============ GET /recent_triples ============

#[derive(Serialize)]
struct RecentTriplesResponse {
    triples: Vec<Triple>,
}

async fn handle_recent_triples(State(state): State<AppState>) -> Json<RecentTriplesResponse> {
    Json(RecentTriplesResponse {
        triples: state.store.recent(RECENT_PREVIEW),
    })
}

// ============ POST /feedback ============

#[derive(Deserialize)]
struct FeedbackRequest {
    rating: i64,
}

#[derive(Serialize)]
struct FeedbackResponse {
    status: String,
}

async fn handle_feedback(
    State(state): State<AppState>,
    Json(req): Json<FeedbackRequest>,
) -> Result<Json<FeedbackResponse>, AppError> {
    state.metrics.record_feedback(req.rating)?;
    Ok(Json(FeedbackResponse {
        status: "ok".to_string(),
    }))
}

// ============ POST /analyze ============

#[derive(Deserialize)]
struct AnalyzeRequest {
    text: String,
}

async fn handle_analyze(
    State(state): State<AppState>,
    Json(req): Json<AnalyzeRequest>,
) -> Result<Json<TextIngest>, AppError> {
    let report = state
        .pipeline
        .ingest_text(&req.text, state.extractor.as_ref())?;
    Ok(Json(report))
}

// ============ POST /upload ============

#[derive(Deserialize)]
struct UploadRequest {
    filename: String,
    rows: Vec<Vec<String>>,
}

async fn handle_upload(
    State(state): State<AppState>,
    Json(req): Json<UploadRequest>,
) -> Result<Json<RowIngest>, AppError> {
    let report = state.pipeline.ingest_rows(&req.filename, &req.rows)?;
    Ok(Json(report))
}

// ============ POST /search ============

#[derive(Deserialize)]
struct SearchRequest {
    query: String,
    #[serde(default)]
    k: Option<usize>,
}

async fn handle_search(
    State(state): State<AppState>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<RankedNodes>, AppError> {
    let k = req.k.unwrap_or(state.default_top_k);
    let ranked = state.ranker.rank(&state.store, &req.query, k).await?;
    Ok(Json(ranked))
}

// ============ POST /search_node ============

#[derive(Deserialize)]
struct SearchNodeRequest {
    node: String,
}

async fn handle_search_node(
    State(state): State<AppState>,
    Json(req): Json<SearchNodeRequest>,
) -> Result<Json<NodeMatches>, AppError> {
    let matches = search_node(&state.store, &req.node)?;
    Ok(Json(matches))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_envelope_codes() {
        let e: AppError = GraphError::validation("nope").into();
        assert_eq!(e.status, StatusCode::BAD_REQUEST);
        assert_eq!(e.code, "bad_request");

        let e: AppError = GraphError::EmptyGraph.into();
        assert_eq!(e.status, StatusCode::NOT_FOUND);

        let e: AppError = GraphError::EmbeddingTimeout(Duration::from_secs(30)).into();
        assert_eq!(e.status, StatusCode::REQUEST_TIMEOUT);
        assert_eq!(e.code, "timeout");

        let e: AppError =
            GraphError::Embedding(anyhow::anyhow!("Embedding provider is disabled")).into();
        assert_eq!(e.status, StatusCode::BAD_REQUEST);
        assert_eq!(e.code, "embeddings_disabled");
    }
}
