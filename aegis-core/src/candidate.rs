// aegis-core/src/candidate.rs
//! Provides the `Candidate` data model produced by detectors, its offset
//! validation, and helpers for logging sensitive values without leaking them.

use serde::{Deserialize, Serialize};
use log::debug;

use lazy_static::lazy_static;
use sha2::{Digest, Sha256};
use hex;

use crate::errors::AegisError;

lazy_static! {
    /// A static boolean that is initialized once to determine if PII is allowed in debug logs.
    static ref PII_DEBUG_ALLOWED: bool = {
        std::env::var("AEGIS_ALLOW_DEBUG_PII")
            .map(|s| s.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    };
}

/// A detected span of sensitive text.
///
/// `start` and `end` are a half-open byte range into the NFC-normalized text
/// the detector was given, and `text[start..end]` must equal `self.text`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Candidate {
    pub start: usize,
    pub end: usize,
    /// Category label such as `PERSON` or `EMAIL`. Opaque to the core.
    #[serde(rename = "type")]
    pub entity_type: String,
    pub text: String,
    /// Confidence in `[0.0, 1.0]`.
    pub score: f64,
    /// Provenance tag. Diagnostic only.
    pub detector: String,
}

impl Candidate {
    pub fn new(
        start: usize,
        end: usize,
        entity_type: impl Into<String>,
        text: impl Into<String>,
        score: f64,
        detector: impl Into<String>,
    ) -> Self {
        Self {
            start,
            end,
            entity_type: entity_type.into(),
            text: text.into(),
            score,
            detector: detector.into(),
        }
    }

    /// Builds a candidate whose `text` is taken from `source[start..end]`.
    ///
    /// Returns `None` when the range is empty, out of bounds, or not on a
    /// character boundary.
    pub fn from_span(
        source: &str,
        start: usize,
        end: usize,
        entity_type: impl Into<String>,
        score: f64,
        detector: impl Into<String>,
    ) -> Option<Self> {
        if start >= end {
            return None;
        }
        let text = source.get(start..end)?;
        Some(Self::new(start, end, entity_type, text, score, detector))
    }

    /// Length of the span in bytes.
    pub fn span_len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Returns true if the two half-open ranges intersect.
    pub fn overlaps(&self, other: &Candidate) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Checks the offset invariant against the text the offsets refer to.
    pub fn validate(&self, source: &str) -> Result<(), AegisError> {
        let reason = if self.start >= self.end {
            Some(format!("empty or inverted range (start {} >= end {})", self.start, self.end))
        } else if self.end > source.len() {
            Some(format!("end {} exceeds text length {}", self.end, source.len()))
        } else {
            match source.get(self.start..self.end) {
                None => Some("range does not fall on character boundaries".to_string()),
                Some(slice) if slice != self.text => {
                    Some(format!("span text does not match ({})", get_loggable_content(slice)))
                }
                Some(_) => None,
            }
        };

        match reason {
            None => Ok(()),
            Some(reason) => Err(AegisError::InvalidCandidate {
                entity_type: self.entity_type.clone(),
                detector: self.detector.clone(),
                start: self.start,
                end: self.end,
                reason,
            }),
        }
    }
}

/// Describes a sensitive value without revealing it.
pub fn redact_sensitive(s: &str) -> String {
    let digest = Sha256::digest(s.as_bytes());
    format!("[REDACTED: {} bytes, sha256:{}]", s.len(), &hex::encode(digest)[..8])
}

pub(crate) fn get_loggable_content(sensitive_content: &str) -> String {
    if *PII_DEBUG_ALLOWED {
        sensitive_content.to_string()
    } else {
        redact_sensitive(sensitive_content)
    }
}

pub(crate) fn log_candidate_debug(module_path: &str, candidate: &Candidate) {
    debug!(
        "{} Candidate: Type='{}', Span={}..{}, Score={:.2}, Detector='{}', Text='{}'",
        module_path,
        candidate.entity_type,
        candidate.start,
        candidate.end,
        candidate.score,
        candidate.detector,
        get_loggable_content(&candidate.text)
    );
}

pub(crate) fn log_substitution_debug(module_path: &str, original: &str, token: &str) {
    debug!(
        "{} Substitution: Original='{}', Token='{}'",
        module_path,
        get_loggable_content(original),
        token
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_sensitive_hides_value() {
        let described = redact_sensitive("Thomas Schmidt");
        assert!(described.starts_with("[REDACTED: 14 bytes, sha256:"));
        assert!(!described.contains("Thomas"));
    }

    #[test]
    fn test_redact_sensitive_is_stable() {
        assert_eq!(redact_sensitive("alice@example.com"), redact_sensitive("alice@example.com"));
        assert_ne!(redact_sensitive("alice@example.com"), redact_sensitive("bob@example.com"));
    }

    #[test]
    fn test_validate_accepts_matching_span() {
        let text = "Herr Müller wohnt hier.";
        let c = Candidate::new(5, 12, "PERSON", "Müller", 0.9, "test");
        assert!(c.validate(text).is_ok());
    }

    #[test]
    fn test_validate_rejects_out_of_bounds() {
        let c = Candidate::new(3, 40, "PERSON", "x", 0.9, "test");
        assert!(matches!(c.validate("short"), Err(AegisError::InvalidCandidate { .. })));
    }

    #[test]
    fn test_validate_rejects_split_character() {
        // 'ü' spans bytes 6..8.
        let c = Candidate::new(5, 6, "PERSON", "M", 0.9, "test");
        assert!(c.validate("Herr Müller").is_ok());
        let bad = Candidate::new(6, 7, "PERSON", "ü", 0.9, "test");
        assert!(bad.validate("Herr Müller").is_err());
    }

    #[test]
    fn test_validate_rejects_text_mismatch() {
        let c = Candidate::new(0, 5, "PERSON", "Bobby", 0.9, "test");
        assert!(c.validate("Alice and Bob").is_err());
    }

    #[test]
    fn test_validate_rejects_empty_range() {
        let c = Candidate::new(2, 2, "PERSON", "", 0.9, "test");
        assert!(c.validate("Alice").is_err());
    }

    #[test]
    fn test_from_span() {
        let c = Candidate::from_span("call Alice now", 5, 10, "PERSON", 0.8, "test").unwrap();
        assert_eq!(c.text, "Alice");
        assert!(Candidate::from_span("abc", 1, 9, "X", 0.8, "test").is_none());
    }

    #[test]
    fn test_wire_shape_uses_type_key() {
        let c = Candidate::new(0, 5, "PERSON", "Alice", 0.9, "regex");
        let json = serde_json::to_value(&c).unwrap();
        assert_eq!(json["type"], "PERSON");
        assert_eq!(json["start"], 0);
        assert_eq!(json["end"], 5);
        assert_eq!(json["detector"], "regex");
    }
}
