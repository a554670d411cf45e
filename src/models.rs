//! Core data types shared across the crate.

use serde::{Deserialize, Serialize};

/// A subject–relation–object fact, optionally annotated with entity types
/// from the extractor.
///
/// Identity is the exact `(subject, relation, object)` tuple — case-sensitive,
/// no normalization. Type annotations do not participate in identity and are
/// carried for display only. Triples are immutable once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Triple {
    pub subject: String,
    pub relation: String,
    pub object: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_object: Option<String>,
}

impl Triple {
    /// Create an untyped triple.
    pub fn new(
        subject: impl Into<String>,
        relation: impl Into<String>,
        object: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            relation: relation.into(),
            object: object.into(),
            type_subject: None,
            type_object: None,
        }
    }

    /// The identity key used for deduplication.
    pub fn key(&self) -> (&str, &str, &str) {
        (&self.subject, &self.relation, &self.object)
    }

    /// Flattened `"subject relation object"` form, used by node lookup.
    pub fn sentence(&self) -> String {
        format!("{} {} {}", self.subject, self.relation, self.object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_ignores_types() {
        let mut a = Triple::new("Ada", "wrote", "notes");
        let b = a.clone();
        a.type_subject = Some("PERSON".to_string());
        assert_eq!(a.key(), b.key());
    }

    #[test]
    fn test_sentence_flattening() {
        let t = Triple::new("Albert Einstein", "born_in", "Ulm");
        assert_eq!(t.sentence(), "Albert Einstein born_in Ulm");
    }

    #[test]
    fn test_optional_types_omitted_from_json() {
        let t = Triple::new("a", "r", "b");
        let json = serde_json::to_string(&t).unwrap();
        assert!(!json.contains("type_subject"));
    }
}
