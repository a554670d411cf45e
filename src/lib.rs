//! # semgraph
//!
//! An in-memory knowledge graph built from subject–relation–object triples,
//! with embedding-based semantic search over the graph's nodes.
//!
//! Raw text or tabular rows flow through the [`ingest`] pipeline into the
//! deduplicated [`store`]; the [`metrics`] aggregator tracks pipeline
//! activity alongside every mutation; queries go through the [`rank`] engine,
//! which embeds the query and the current node set and returns a scored
//! top-k list plus a preview subgraph.
//!
//! ```text
//! ┌──────────────┐   ┌─────────────┐   ┌─────────────┐
//! │ text / rows  │──▶│  Ingestion  │──▶│ TripleStore │
//! │  (extracted) │   │  Pipeline   │   │  + Metrics  │
//! └──────────────┘   └─────────────┘   └──────┬──────┘
//!                                             │
//!                          ┌──────────────────┤
//!                          ▼                  ▼
//!                    ┌──────────┐       ┌──────────┐
//!                    │   CLI    │       │   HTTP   │
//!                    │(semgraph)│       │  (axum)  │
//!                    └──────────┘       └──────────┘
//! ```
//!
//! All state is memory-only and lives for the process lifetime; there is no
//! persistence across restarts.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`models`] | Core data types |
//! | [`store`] | Deduplicated, insertion-ordered triple store |
//! | [`metrics`] | Pipeline counters, daily histogram, feedback ratings |
//! | [`extract`] | Triple extraction from free text |
//! | [`embedding`] | Embedding provider abstraction |
//! | [`rank`] | Semantic node ranking and node lookup |
//! | [`ingest`] | Ingestion pipeline orchestration |
//! | [`config`] | TOML configuration parsing |
//! | [`server`] | JSON HTTP API |
//! | [`error`] | Domain error taxonomy |

pub mod config;
pub mod embedding;
pub mod error;
pub mod extract;
pub mod ingest;
pub mod metrics;
pub mod models;
pub mod rank;
pub mod server;
pub mod store;
