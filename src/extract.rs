//! Triple extraction from free text.
//!
//! The extractor is a pluggable collaborator: the pipeline only requires
//! that it is deterministic for a fixed input, so retried ingestions stay
//! idempotent. [`PatternExtractor`] is the default rule-based implementation;
//! a model-backed extractor can be swapped in behind the same trait.

use std::sync::LazyLock;

use anyhow::Result;
use regex::Regex;

use crate::models::Triple;

/// Extracts candidate triples from raw text. May return zero or more
/// candidates, each optionally annotated with entity types.
pub trait Extractor: Send + Sync {
    fn extract(&self, text: &str) -> Result<Vec<Triple>>;
}

// ── Relation patterns ───────────────────────────────────────────────────

static RE_DEVELOPED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<s>.+?)\s+developed\s+(?:the\s+)?(?P<o>.+)$").unwrap()
});

static RE_CREATED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<s>.+?)\s+created\s+(?:the\s+)?(?P<o>.+)$").unwrap()
});

static RE_DISCOVERED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<s>.+?)\s+discovered\s+(?:the\s+)?(?P<o>.+)$").unwrap()
});

static RE_BORN_IN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<s>.+?)\s+(?:was\s+)?born\s+in\s+(?P<o>.+)$").unwrap()
});

static RE_IS_A: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<s>.+?)\s+is\s+(?:an?\s+)?(?P<o>.+)$").unwrap()
});

static RE_TRAILING_YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?P<head>.+?)\s+in\s+(?P<year>\d{4})$").unwrap());

/// Rule-based extractor over a small set of verb patterns.
///
/// Sentences are split on `.`, `!`, and `?`, then matched against the
/// relation patterns in a fixed order; the first match wins per sentence.
/// A trailing `"in <year>"` on the object is lifted into an additional
/// `created_in` triple, typed as a date.
pub struct PatternExtractor;

impl PatternExtractor {
    pub fn new() -> Self {
        Self
    }

    fn extract_sentence(&self, sentence: &str, out: &mut Vec<Triple>) {
        let rules: [(&Regex, &str); 5] = [
            (&*RE_DEVELOPED, "developed"),
            (&*RE_CREATED, "created"),
            (&*RE_DISCOVERED, "discovered"),
            (&*RE_BORN_IN, "born_in"),
            (&*RE_IS_A, "is_a"),
        ];

        for (re, relation) in rules {
            let Some(caps) = re.captures(sentence) else {
                continue;
            };
            let subject = caps["s"].trim().to_string();
            let mut object = caps["o"].trim().to_string();
            if subject.is_empty() || object.is_empty() {
                return;
            }

            // "X developed Y in 1905" also yields (Y, created_in, 1905)
            let mut year_triple = None;
            if let Some(year_caps) = RE_TRAILING_YEAR.captures(&object) {
                let head = year_caps["head"].trim().to_string();
                let year = year_caps["year"].to_string();
                if !head.is_empty() {
                    let mut t = Triple::new(head.clone(), "created_in", year);
                    t.type_object = Some("DATE".to_string());
                    year_triple = Some(t);
                    object = head;
                }
            }

            out.push(Triple::new(subject, relation, object));
            if let Some(t) = year_triple {
                out.push(t);
            }
            return;
        }
    }
}

impl Default for PatternExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Extractor for PatternExtractor {
    fn extract(&self, text: &str) -> Result<Vec<Triple>> {
        let mut triples = Vec::new();
        for sentence in text.split(['.', '!', '?']) {
            let sentence = sentence.trim();
            if !sentence.is_empty() {
                self.extract_sentence(sentence, &mut triples);
            }
        }
        Ok(triples)
    }
}
