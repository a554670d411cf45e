//! Semantic ranking of graph nodes against a free-text query.
//!
//! The ranker snapshots the node set from the store, releases the lock, then
//! embeds the nodes (batched) and the query and scores them by cosine
//! similarity. Because embedding happens outside the store lock, a node
//! inserted mid-ranking is simply absent from that ranking's results —
//! search output is eventually consistent with the freshest store state.
//!
//! Ties are broken by the node's first-appearance order in the store (the
//! stable sort preserves [`TripleStore::nodes`] ordering), which keeps
//! rankings deterministic across runs.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use crate::embedding::{cosine_similarity, encode_bounded, Embedder};
use crate::error::GraphError;
use crate::models::Triple;
use crate::store::TripleStore;

/// A ranked node with its cosine similarity score, in `[-1, 1]`.
#[derive(Debug, Clone, Serialize)]
pub struct NodeScore {
    pub name: String,
    pub score: f32,
}

/// Result of a semantic query: the top-k nodes plus a preview subgraph.
#[derive(Debug, Clone, Serialize)]
pub struct RankedNodes {
    pub top_nodes: Vec<NodeScore>,
    pub triples: Vec<Triple>,
}

/// Result of a direct node lookup.
#[derive(Debug, Clone, Serialize)]
pub struct NodeMatches {
    pub triples: Vec<Triple>,
    pub sentences: Vec<String>,
}

/// Ranks graph nodes against queries via the configured [`Embedder`].
pub struct SemanticRanker {
    embedder: Arc<dyn Embedder>,
    timeout: Duration,
}

impl SemanticRanker {
    pub fn new(embedder: Arc<dyn Embedder>, timeout: Duration) -> Self {
        Self { embedder, timeout }
    }

    /// Embed the query and the current node set and return the top
    /// `min(k, |nodes|)` nodes by descending cosine similarity, plus the
    /// induced preview subgraph over those nodes.
    ///
    /// # Errors
    ///
    /// - [`GraphError::Validation`] — blank query.
    /// - [`GraphError::EmptyGraph`] — the store holds no nodes.
    /// - [`GraphError::EmbeddingTimeout`] — the embedder exceeded its bound.
    /// - [`GraphError::Embedding`] — the embedder failed.
    pub async fn rank(
        &self,
        store: &TripleStore,
        query: &str,
        k: usize,
    ) -> Result<RankedNodes, GraphError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(GraphError::validation("query must not be empty"));
        }

        // Snapshot under the store lock, embed outside it.
        let nodes = store.nodes();
        if nodes.is_empty() {
            return Err(GraphError::EmptyGraph);
        }

        let node_vecs = encode_bounded(self.embedder.as_ref(), self.timeout, &nodes).await?;
        let query_vecs =
            encode_bounded(self.embedder.as_ref(), self.timeout, &[query.to_string()]).await?;
        let query_vec = query_vecs
            .first()
            .ok_or_else(|| GraphError::Embedding(anyhow::anyhow!("empty embedding response")))?;

        let mut scored: Vec<NodeScore> = nodes
            .into_iter()
            .zip(node_vecs.iter())
            .map(|(name, vec)| NodeScore {
                name,
                score: cosine_similarity(query_vec, vec),
            })
            .collect();

        // Stable sort: equal scores keep first-appearance order.
        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(k.min(scored.len()));

        debug!(query, results = scored.len(), "ranked nodes");

        let names: Vec<String> = scored.iter().map(|n| n.name.clone()).collect();
        Ok(RankedNodes {
            triples: induced_subgraph(&names),
            top_nodes: scored,
        })
    }
}

/// Preview subgraph for a set of ranked nodes.
///
/// Synthesizes one `related_to` self-loop per node so callers can visualize
/// the ranked set. This is a placeholder carried over from the original
/// behavior, not a semantic inference over stored relations.
pub fn induced_subgraph(nodes: &[String]) -> Vec<Triple> {
    nodes
        .iter()
        .map(|n| Triple::new(n.clone(), "related_to", n.clone()))
        .collect()
}

/// Direct node lookup: every stored triple touching `node`, plus the
/// flattened sentence form of each. No embedding call is made.
///
/// Fails with [`GraphError::NotFound`] only when the identifier is blank;
/// an unknown node succeeds with zero matches.
pub fn search_node(store: &TripleStore, node: &str) -> Result<NodeMatches, GraphError> {
    let node = node.trim();
    if node.is_empty() {
        return Err(GraphError::NotFound("node identifier is empty".to_string()));
    }

    let triples = store.matching(node);
    let sentences = triples.iter().map(Triple::sentence).collect();
    Ok(NodeMatches { triples, sentences })
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;

    /// Deterministic test embedder: letter-frequency vectors, so texts that
    /// share words score higher than unrelated ones.
    struct LetterFreqEmbedder;

    #[async_trait]
    impl Embedder for LetterFreqEmbedder {
        fn model_name(&self) -> &str {
            "letter-freq"
        }
        fn dims(&self) -> usize {
            26
        }
        async fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts
                .iter()
                .map(|t| {
                    let mut v = vec![0.0f32; 26];
                    for c in t.to_lowercase().chars() {
                        if c.is_ascii_lowercase() {
                            v[(c as u8 - b'a') as usize] += 1.0;
                        }
                    }
                    v
                })
                .collect())
        }
    }

    /// Embedder that maps every text to the same vector, forcing ties.
    struct ConstantEmbedder;

    #[async_trait]
    impl Embedder for ConstantEmbedder {
        fn model_name(&self) -> &str {
            "constant"
        }
        fn dims(&self) -> usize {
            3
        }
        async fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![1.0, 0.0, 0.0]).collect())
        }
    }

    fn einstein_store() -> TripleStore {
        let store = TripleStore::new();
        store.insert(Triple::new(
            "Albert Einstein",
            "developed",
            "theory of relativity",
        ));
        store.insert(Triple::new("Albert Einstein", "born_in", "Ulm"));
        store
    }

    fn ranker(embedder: impl Embedder + 'static) -> SemanticRanker {
        SemanticRanker::new(Arc::new(embedder), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_rank_returns_sorted_top_k() {
        let store = einstein_store();
        let result = ranker(LetterFreqEmbedder)
            .rank(&store, "Einstein", 3)
            .await
            .unwrap();

        assert!(result.top_nodes.len() <= 3);
        let known = store.nodes();
        for pair in result.top_nodes.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
        for n in &result.top_nodes {
            assert!(known.contains(&n.name));
            assert!((-1.0..=1.0).contains(&n.score));
        }
        assert_eq!(result.top_nodes[0].name, "Albert Einstein");
    }

    #[tokio::test]
    async fn test_rank_subgraph_is_self_loops() {
        let store = einstein_store();
        let result = ranker(LetterFreqEmbedder)
            .rank(&store, "Einstein", 2)
            .await
            .unwrap();
        assert_eq!(result.triples.len(), result.top_nodes.len());
        for (t, n) in result.triples.iter().zip(&result.top_nodes) {
            assert_eq!(t.subject, n.name);
            assert_eq!(t.relation, "related_to");
            assert_eq!(t.object, n.name);
        }
    }

    #[tokio::test]
    async fn test_rank_empty_store() {
        let store = TripleStore::new();
        let err = ranker(LetterFreqEmbedder)
            .rank(&store, "anything", 5)
            .await
            .unwrap_err();
        assert!(matches!(err, GraphError::EmptyGraph));
    }

    #[tokio::test]
    async fn test_rank_blank_query() {
        let store = einstein_store();
        let err = ranker(LetterFreqEmbedder)
            .rank(&store, "   ", 5)
            .await
            .unwrap_err();
        assert!(matches!(err, GraphError::Validation(_)));
    }

    #[tokio::test]
    async fn test_rank_k_larger_than_node_set() {
        let store = einstein_store();
        let result = ranker(LetterFreqEmbedder)
            .rank(&store, "relativity", 50)
            .await
            .unwrap();
        assert_eq!(result.top_nodes.len(), store.node_count());
    }

    #[tokio::test]
    async fn test_ties_keep_first_appearance_order() {
        let store = TripleStore::new();
        store.insert(Triple::new("alpha", "r", "beta"));
        store.insert(Triple::new("beta", "r", "gamma"));

        let result = ranker(ConstantEmbedder)
            .rank(&store, "query", 10)
            .await
            .unwrap();
        let names: Vec<&str> = result.top_nodes.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "beta", "gamma"]);
    }

    #[test]
    fn test_search_node_empty_identifier() {
        let store = einstein_store();
        let err = search_node(&store, "  ").unwrap_err();
        assert!(matches!(err, GraphError::NotFound(_)));
    }

    #[test]
    fn test_search_node_unknown_succeeds_with_no_matches() {
        let store = einstein_store();
        let matches = search_node(&store, "Newton").unwrap();
        assert!(matches.triples.is_empty());
        assert!(matches.sentences.is_empty());
    }

    #[test]
    fn test_search_node_returns_sentences() {
        let store = einstein_store();
        let matches = search_node(&store, "Ulm").unwrap();
        assert_eq!(matches.triples.len(), 1);
        assert_eq!(matches.sentences, vec!["Albert Einstein born_in Ulm"]);
    }
}
