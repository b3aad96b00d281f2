// aegis-core/src/detectors/regex_detector.rs
//! A `Detector` implementation that uses a single regular expression
//! to find spans of one entity type.
//! License: MIT OR APACHE 2.0

use std::fmt;
use std::sync::Arc;

use regex::Regex;

use crate::candidate::{log_candidate_debug, Candidate};
use crate::detector::Detector;

/// Post-match check; only matches for which it returns true are kept.
pub type Validator = Arc<dyn Fn(&str) -> bool + Send + Sync>;

pub struct RegexDetector {
    regex: Regex,
    entity_type: String,
    score: f64,
    validator: Option<Validator>,
    /// 0 is the whole match; `n > 0` uses capture group `n` as the span.
    extract_group: usize,
    name: String,
    provenance: String,
}

impl fmt::Debug for RegexDetector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegexDetector")
            .field("name", &self.name)
            .field("entity_type", &self.entity_type)
            .field("pattern", &self.regex.as_str())
            .field("score", &self.score)
            .field("extract_group", &self.extract_group)
            .field("validator", &self.validator.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

impl RegexDetector {
    pub fn new(regex: Regex, entity_type: impl Into<String>, score: f64) -> Self {
        let entity_type = entity_type.into();
        Self {
            name: entity_type.to_lowercase(),
            regex,
            entity_type,
            score,
            validator: None,
            extract_group: 0,
            provenance: "regex".to_string(),
        }
    }

    /// Keeps only matches accepted by `validator`.
    pub fn with_validator<F>(mut self, validator: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.validator = Some(Arc::new(validator));
        self
    }

    /// Uses capture group `group` as the candidate span instead of the whole match.
    pub fn with_extract_group(mut self, group: usize) -> Self {
        self.extract_group = group;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Overrides the provenance tag written to `Candidate::detector`.
    pub fn with_provenance(mut self, provenance: impl Into<String>) -> Self {
        self.provenance = provenance.into();
        self
    }

    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    fn accepts(&self, matched: &str) -> bool {
        self.validator.as_ref().map_or(true, |validate| validate(matched))
    }

    fn candidate(&self, text: &str, start: usize, end: usize) -> Option<Candidate> {
        let candidate = Candidate::from_span(
            text,
            start,
            end,
            self.entity_type.as_str(),
            self.score,
            self.provenance.as_str(),
        )?;
        if !self.accepts(&candidate.text) {
            return None;
        }
        log_candidate_debug(module_path!(), &candidate);
        Some(candidate)
    }
}

impl Detector for RegexDetector {
    fn scan(&self, text: &str) -> Vec<Candidate> {
        if self.extract_group == 0 {
            return self
                .regex
                .find_iter(text)
                .filter_map(|m| self.candidate(text, m.start(), m.end()))
                .collect();
        }

        self.regex
            .captures_iter(text)
            .filter_map(|caps| {
                let group = caps.get(self.extract_group)?;
                self.candidate(text, group.start(), group.end())
            })
            .collect()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email_detector() -> RegexDetector {
        RegexDetector::new(
            Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[A-Za-z]{2,}").unwrap(),
            "EMAIL",
            0.99,
        )
    }

    #[test]
    fn test_scan_reports_byte_offsets() {
        let text = "Grüße an test@example.com!";
        let found = email_detector().scan(text);
        assert_eq!(found.len(), 1);
        let c = &found[0];
        assert_eq!(&text[c.start..c.end], "test@example.com");
        assert_eq!(c.text, "test@example.com");
        assert_eq!(c.detector, "regex");
        assert_eq!(c.entity_type, "EMAIL");
    }

    #[test]
    fn test_validator_filters_matches() {
        let detector = RegexDetector::new(Regex::new(r"\b\d{3}-\d{2}-\d{4}\b").unwrap(), "SSN", 0.95)
            .with_validator(|s| !s.starts_with("000") && !s.starts_with("666") && !s.starts_with('9'));
        let found = detector.scan("good 123-45-6789 bad 666-12-3456 bad 900-11-2222");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].text, "123-45-6789");
    }

    #[test]
    fn test_extract_group_uses_group_offsets() {
        let detector = RegexDetector::new(
            Regex::new(r"(?i)(?:SVN|SV-Nummer)[:\s]+(\d{2}\s?\d{6}\s?[A-Z]\s?\d{3})").unwrap(),
            "SSN",
            0.9,
        )
        .with_extract_group(1);
        let text = "Meine SV-Nummer: 12 345678 A 123 bitte.";
        let found = detector.scan(text);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].text, "12 345678 A 123");
        assert_eq!(&text[found[0].start..found[0].end], "12 345678 A 123");
    }

    #[test]
    fn test_missing_group_is_skipped() {
        let detector = RegexDetector::new(Regex::new(r"id(?::(\d+))?").unwrap(), "ID", 0.5)
            .with_extract_group(1);
        let found = detector.scan("id id:42");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].text, "42");
    }

    #[test]
    fn test_empty_matches_are_ignored() {
        let detector = RegexDetector::new(Regex::new(r"x*").unwrap(), "X", 0.5);
        let found = detector.scan("abxxc");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].text, "xx");
    }

    #[test]
    fn test_name_and_provenance() {
        let detector = email_detector().with_name("work_email").with_provenance("custom");
        assert_eq!(detector.name(), "work_email");
        assert_eq!(detector.scan("a@b.de")[0].detector, "custom");
    }
}
