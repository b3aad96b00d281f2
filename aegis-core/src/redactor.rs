// aegis-core/src/redactor.rs
//! Replaces candidate spans with stable `[TYPE_N]` placeholder tokens and
//! records the token → original mapping needed to undo it.
//!
//! Tokens are numbered in reading order, per type, and the same original
//! text always receives the same token within one call. The numbering state
//! lives in a [`Counter`] owned by the call, so concurrent redactions never
//! share state.

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::candidate::{log_substitution_debug, Candidate};
use crate::normalize::to_nfc;

/// Links a placeholder token to the text it replaced.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Mapping {
    pub token: String,
    pub original: String,
    #[serde(rename = "type")]
    pub entity_type: String,
}

/// Formats a placeholder token.
pub fn format_token(entity_type: &str, n: usize) -> String {
    format!("[{}_{}]", entity_type, n)
}

/// Per-call token numbering state.
#[derive(Debug, Default)]
pub struct Counter {
    counts: HashMap<String, usize>,
    seen: HashMap<String, String>,
}

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the token for `original`, allocating the next number for
    /// `entity_type` the first time `original` is seen.
    pub fn next(&mut self, entity_type: &str, original: &str) -> String {
        if let Some(token) = self.seen.get(original) {
            return token.clone();
        }
        let count = self.counts.entry(entity_type.to_string()).or_insert(0);
        *count += 1;
        let token = format_token(entity_type, *count);
        self.seen.insert(original.to_string(), token.clone());
        token
    }

    /// Highest number issued for `entity_type`, 0 if none.
    pub fn issued(&self, entity_type: &str) -> usize {
        self.counts.get(entity_type).copied().unwrap_or(0)
    }
}

/// Per-type totals for one redaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySummary {
    #[serde(rename = "type")]
    pub entity_type: String,
    pub occurrences: usize,
    pub distinct_values: usize,
}

/// Result of a [`redact`] call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RedactResult {
    pub original_text: String,
    pub sanitized_text: String,
    pub entities: Vec<Candidate>,
    pub mappings: Vec<Mapping>,
    #[serde(default)]
    pub processing_time_ms: u64,
}

impl RedactResult {
    /// Occurrence and distinct-value counts per entity type, in the order
    /// each type first appears in the text.
    pub fn summary(&self) -> Vec<EntitySummary> {
        let mut summary: Vec<EntitySummary> = Vec::new();
        let mut distinct: Vec<HashSet<&str>> = Vec::new();
        for entity in &self.entities {
            let index = match summary.iter().position(|s| s.entity_type == entity.entity_type) {
                Some(index) => index,
                None => {
                    summary.push(EntitySummary {
                        entity_type: entity.entity_type.clone(),
                        occurrences: 0,
                        distinct_values: 0,
                    });
                    distinct.push(HashSet::new());
                    summary.len() - 1
                }
            };
            summary[index].occurrences += 1;
            distinct[index].insert(entity.text.as_str());
        }
        for (item, values) in summary.iter_mut().zip(&distinct) {
            item.distinct_values = values.len();
        }
        summary
    }
}

/// Replaces every candidate span in `text` with its placeholder token.
///
/// Candidate offsets must refer to the NFC form of `text`; the text is
/// normalized here as well, so `original_text` in the result is the NFC
/// form. When no candidate applies the input is returned untouched.
pub fn redact(text: &str, candidates: &[Candidate]) -> RedactResult {
    let started = Instant::now();

    if candidates.is_empty() {
        return unchanged(text, started);
    }

    let normalized = to_nfc(text);
    let applied = applicable_candidates(&normalized, candidates);
    if applied.is_empty() {
        debug!("None of {} candidates applied; returning input unchanged.", candidates.len());
        return unchanged(text, started);
    }

    // Forward pass: number tokens in reading order.
    let mut counter = Counter::new();
    let tokens: Vec<String> = applied
        .iter()
        .map(|c| counter.next(&c.entity_type, &c.text))
        .collect();

    // Backward pass: later spans are spliced first so earlier offsets stay valid.
    let mut buffer = normalized.to_string();
    for (candidate, token) in applied.iter().zip(&tokens).rev() {
        buffer.replace_range(candidate.start..candidate.end, token);
        log_substitution_debug(module_path!(), &candidate.text, token);
    }

    let mut seen = HashSet::with_capacity(tokens.len());
    let mappings: Vec<Mapping> = applied
        .iter()
        .zip(tokens)
        .filter(|(_, token)| seen.insert(token.clone()))
        .map(|(candidate, token)| Mapping {
            token,
            original: candidate.text.clone(),
            entity_type: candidate.entity_type.clone(),
        })
        .collect();

    debug!(
        "Redacted {} spans using {} distinct tokens.",
        applied.len(),
        mappings.len()
    );

    RedactResult {
        original_text: normalized.into_owned(),
        sanitized_text: buffer,
        entities: applied,
        mappings,
        processing_time_ms: elapsed_ms(started),
    }
}

/// Sorts by start and drops candidates that are invalid for `text` or that
/// overlap an earlier accepted candidate.
fn applicable_candidates(text: &str, candidates: &[Candidate]) -> Vec<Candidate> {
    let mut sorted: Vec<&Candidate> = candidates.iter().collect();
    sorted.sort_by_key(|c| c.start);

    let mut applied: Vec<Candidate> = Vec::with_capacity(sorted.len());
    let mut last_end = 0usize;
    for candidate in sorted {
        if let Err(e) = candidate.validate(text) {
            warn!("Skipping candidate during redaction: {}", e);
            continue;
        }
        if !applied.is_empty() && candidate.start < last_end {
            warn!(
                "Skipping '{}' candidate at {}..{}: overlaps a previous span ending at {}",
                candidate.entity_type, candidate.start, candidate.end, last_end
            );
            continue;
        }
        last_end = candidate.end;
        applied.push(candidate.clone());
    }
    applied
}

fn unchanged(text: &str, started: Instant) -> RedactResult {
    RedactResult {
        original_text: text.to_string(),
        sanitized_text: text.to_string(),
        entities: Vec::new(),
        mappings: Vec::new(),
        processing_time_ms: elapsed_ms(started),
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(start: usize, end: usize, entity_type: &str, text: &str) -> Candidate {
        Candidate::new(start, end, entity_type, text, 0.9, "test")
    }

    #[test]
    fn test_counter_numbers_per_type_and_reuses_tokens() {
        let mut counter = Counter::new();
        assert_eq!(counter.next("PERSON", "Alice"), "[PERSON_1]");
        assert_eq!(counter.next("PERSON", "Bob"), "[PERSON_2]");
        assert_eq!(counter.next("PERSON", "Alice"), "[PERSON_1]");
        assert_eq!(counter.next("EMAIL", "alice@example.com"), "[EMAIL_1]");
        assert_eq!(counter.issued("PERSON"), 2);
        assert_eq!(counter.issued("PHONE"), 0);
    }

    #[test]
    fn test_single_entity() {
        let text = "Call Thomas Schmidt tomorrow.";
        let result = redact(text, &[c(5, 19, "PERSON", "Thomas Schmidt")]);
        assert_eq!(result.sanitized_text, "Call [PERSON_1] tomorrow.");
        assert_eq!(result.mappings.len(), 1);
        assert_eq!(result.mappings[0].token, "[PERSON_1]");
        assert_eq!(result.mappings[0].original, "Thomas Schmidt");
        assert_eq!(result.mappings[0].entity_type, "PERSON");
    }

    #[test]
    fn test_same_text_reuses_token() {
        let text = "Alice and Bob met Alice again.";
        let result = redact(
            text,
            &[
                c(0, 5, "PERSON", "Alice"),
                c(10, 13, "PERSON", "Bob"),
                c(18, 23, "PERSON", "Alice"),
            ],
        );
        assert_eq!(result.sanitized_text, "[PERSON_1] and [PERSON_2] met [PERSON_1] again.");
        assert_eq!(result.mappings.len(), 2);
    }

    #[test]
    fn test_unsorted_candidates_are_numbered_in_reading_order() {
        let text = "AB CD EF";
        let result = redact(text, &[c(6, 8, "X", "EF"), c(0, 2, "X", "AB"), c(3, 5, "X", "CD")]);
        assert_eq!(result.sanitized_text, "[X_1] [X_2] [X_3]");
        assert_eq!(result.mappings[0].original, "AB");
    }

    #[test]
    fn test_multibyte_offsets() {
        let text = "Herr Müller wohnt in Österreich.";
        let mueller_start = "Herr ".len();
        let oesterreich_start = "Herr Müller wohnt in ".len();
        let result = redact(
            text,
            &[
                c(mueller_start, mueller_start + "Müller".len(), "PERSON", "Müller"),
                c(oesterreich_start, oesterreich_start + "Österreich".len(), "LOCATION", "Österreich"),
            ],
        );
        assert_eq!(result.sanitized_text, "Herr [PERSON_1] wohnt in [LOCATION_1].");
    }

    #[test]
    fn test_decomposed_input_uses_composed_offsets() {
        let nfd = "f\u{0075}\u{0308}r 1.234,56 \u{20AC} rest";
        let result = redact(nfd, &[c(5, 17, "FINANCIAL", "1.234,56 \u{20AC}")]);
        assert_eq!(result.sanitized_text, "f\u{00FC}r [FINANCIAL_1] rest");
        assert_eq!(result.original_text, "f\u{00FC}r 1.234,56 \u{20AC} rest");
    }

    #[test]
    fn test_empty_candidates_return_input_unchanged() {
        for text in ["Nothing to redact here.", ""] {
            let result = redact(text, &[]);
            assert_eq!(result.sanitized_text, text);
            assert_eq!(result.original_text, text);
            assert!(result.mappings.is_empty());
        }
    }

    #[test]
    fn test_invalid_and_overlapping_candidates_are_skipped() {
        let text = "Alice and Bob";
        let result = redact(
            text,
            &[
                c(0, 5, "PERSON", "Alice"),
                c(2, 7, "PERSON", "ice a"),
                c(10, 13, "PERSON", "Rob"),
                c(10, 99, "PERSON", "Bob"),
            ],
        );
        assert_eq!(result.sanitized_text, "[PERSON_1] and Bob");
        assert_eq!(result.entities.len(), 1);
    }

    #[test]
    fn test_summary_counts_per_type() {
        let text = "Alice and Bob met Alice at a@b.de";
        let result = redact(
            text,
            &[
                c(0, 5, "PERSON", "Alice"),
                c(10, 13, "PERSON", "Bob"),
                c(18, 23, "PERSON", "Alice"),
                c(27, 33, "EMAIL", "a@b.de"),
            ],
        );
        let summary = result.summary();
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].entity_type, "PERSON");
        assert_eq!(summary[0].occurrences, 3);
        assert_eq!(summary[0].distinct_values, 2);
        assert_eq!(summary[1].entity_type, "EMAIL");
        assert_eq!(summary[1].occurrences, 1);
    }

    #[test]
    fn test_only_invalid_candidates_return_input_unchanged() {
        let nfd = "Mu\u{0308}ller";
        let result = redact(nfd, &[c(0, 99, "PERSON", "Müller")]);
        assert_eq!(result.original_text, nfd);
        assert_eq!(result.sanitized_text, nfd);
        assert!(result.entities.is_empty());
        assert!(result.mappings.is_empty());
    }

    #[test]
    fn test_summary_counts_values_reused_across_types() {
        // "x" is tokenized as PERSON first, so the EMAIL occurrence reuses [PERSON_1].
        let result = redact("x and x", &[c(0, 1, "PERSON", "x"), c(6, 7, "EMAIL", "x")]);
        assert_eq!(result.sanitized_text, "[PERSON_1] and [PERSON_1]");
        let summary = result.summary();
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[1].entity_type, "EMAIL");
        assert_eq!(summary[1].occurrences, 1);
        assert_eq!(summary[1].distinct_values, 1);
        assert_eq!(summary[0].distinct_values, 1);
    }

    #[test]
    fn test_result_wire_shape() {
        let result = redact("Hi Alice", &[c(3, 8, "PERSON", "Alice")]);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["original_text"], "Hi Alice");
        assert_eq!(json["sanitized_text"], "Hi [PERSON_1]");
        assert_eq!(json["entities"][0]["type"], "PERSON");
        assert_eq!(json["mappings"][0]["token"], "[PERSON_1]");
        assert_eq!(json["mappings"][0]["original"], "Alice");
        assert_eq!(json["mappings"][0]["type"], "PERSON");
    }
}
