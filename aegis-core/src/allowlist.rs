//! allowlist.rs - Patterns whose matches are never reported.
//!
//! The allowlist is evaluated against each candidate's matched text, not
//! against the surrounding document.
//!
//! License: MIT OR APACHE 2.0

use regex::RegexSet;

use crate::errors::AegisError;

#[derive(Debug, Clone)]
pub struct Allowlist {
    set: RegexSet,
}

impl Default for Allowlist {
    fn default() -> Self {
        Self { set: RegexSet::empty() }
    }
}

impl Allowlist {
    /// Compiles every pattern into one set.
    pub fn new<I, S>(patterns: I) -> Result<Self, AegisError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns: Vec<String> = patterns.into_iter().map(|p| p.as_ref().to_string()).collect();
        let set = RegexSet::new(&patterns)
            .map_err(|e| AegisError::PatternCompilation("allowlist".to_string(), e))?;
        Ok(Self { set })
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    pub fn len(&self) -> usize {
        self.set.len()
    }

    /// Returns true if any pattern matches anywhere in `candidate_text`.
    pub fn is_allowed(&self, candidate_text: &str) -> bool {
        !self.set.is_empty() && self.set.is_match(candidate_text)
    }
}
