//! In-memory triple store.
//!
//! An insertion-ordered `Vec<Triple>` behind `std::sync::RwLock`, matching
//! the request-per-call concurrency model: one writer at a time, reads take
//! snapshot copies under the same lock. The store only grows — there is no
//! delete operation — and lives for the process lifetime.
//!
//! Membership checks and node counts are full scans. That is deliberate:
//! recompute-on-read keeps the node-count invariant trivially correct, and
//! the O(n) duplicate check is fine at in-memory demo scale. An index keyed
//! by the identity tuple would remove the hotspot without changing observable
//! behavior.

use std::collections::HashSet;
use std::sync::RwLock;

use crate::models::Triple;

/// Shared, insertion-ordered collection of deduplicated triples.
pub struct TripleStore {
    triples: RwLock<Vec<Triple>>,
}

impl TripleStore {
    pub fn new() -> Self {
        Self {
            triples: RwLock::new(Vec::new()),
        }
    }

    /// Append `triple` unless its `(subject, relation, object)` key is
    /// already present. Returns whether the triple was inserted.
    pub fn insert(&self, triple: Triple) -> bool {
        let mut triples = self.triples.write().unwrap();
        if triples.iter().any(|t| t.key() == triple.key()) {
            return false;
        }
        triples.push(triple);
        true
    }

    /// Snapshot of all triples in insertion order.
    pub fn all(&self) -> Vec<Triple> {
        self.triples.read().unwrap().clone()
    }

    /// The last `n` triples, still in insertion order.
    pub fn recent(&self, n: usize) -> Vec<Triple> {
        let triples = self.triples.read().unwrap();
        let start = triples.len().saturating_sub(n);
        triples[start..].to_vec()
    }

    /// All triples whose subject or object equals `node`.
    pub fn matching(&self, node: &str) -> Vec<Triple> {
        self.triples
            .read()
            .unwrap()
            .iter()
            .filter(|t| t.subject == node || t.object == node)
            .cloned()
            .collect()
    }

    /// The node set in first-appearance order (subjects and objects, scanned
    /// in insertion order). This ordering is the deterministic tie-break for
    /// ranking.
    pub fn nodes(&self) -> Vec<String> {
        let triples = self.triples.read().unwrap();
        let mut seen = HashSet::new();
        let mut nodes = Vec::new();
        for t in triples.iter() {
            for name in [&t.subject, &t.object] {
                if seen.insert(name.clone()) {
                    nodes.push(name.clone());
                }
            }
        }
        nodes
    }

    /// Number of distinct nodes, recomputed by full scan.
    pub fn node_count(&self) -> usize {
        self.nodes().len()
    }

    /// Number of stored triples.
    pub fn len(&self) -> usize {
        self.triples.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for TripleStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_deduplicates() {
        let store = TripleStore::new();
        assert!(store.insert(Triple::new("a", "rel", "b")));
        assert!(!store.insert(Triple::new("a", "rel", "b")));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_identity_is_case_sensitive() {
        let store = TripleStore::new();
        assert!(store.insert(Triple::new("a", "rel", "b")));
        assert!(store.insert(Triple::new("A", "rel", "b")));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_type_annotations_do_not_affect_identity() {
        let store = TripleStore::new();
        let mut typed = Triple::new("a", "rel", "b");
        typed.type_subject = Some("PERSON".to_string());
        assert!(store.insert(typed));
        assert!(!store.insert(Triple::new("a", "rel", "b")));
    }

    #[test]
    fn test_node_count_matches_recomputed_set() {
        let store = TripleStore::new();
        store.insert(Triple::new("a", "r1", "b"));
        store.insert(Triple::new("b", "r2", "c"));
        store.insert(Triple::new("a", "r3", "c"));

        let mut expected: HashSet<String> = HashSet::new();
        for t in store.all() {
            expected.insert(t.subject);
            expected.insert(t.object);
        }
        assert_eq!(store.node_count(), expected.len());
        assert_eq!(store.node_count(), 3);
    }

    #[test]
    fn test_nodes_first_appearance_order() {
        let store = TripleStore::new();
        store.insert(Triple::new("x", "r", "y"));
        store.insert(Triple::new("y", "r", "z"));
        assert_eq!(store.nodes(), vec!["x", "y", "z"]);
    }

    #[test]
    fn test_recent_returns_tail_in_order() {
        let store = TripleStore::new();
        for i in 0..5 {
            store.insert(Triple::new(format!("s{i}"), "r", format!("o{i}")));
        }
        let recent = store.recent(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].subject, "s3");
        assert_eq!(recent[1].subject, "s4");

        // asking for more than stored returns everything
        assert_eq!(store.recent(100).len(), 5);
    }

    #[test]
    fn test_matching_covers_subject_and_object() {
        let store = TripleStore::new();
        store.insert(Triple::new("a", "r1", "b"));
        store.insert(Triple::new("b", "r2", "c"));
        store.insert(Triple::new("c", "r3", "d"));

        let hits = store.matching("b");
        assert_eq!(hits.len(), 2);
        assert!(store.matching("nope").is_empty());
    }
}
