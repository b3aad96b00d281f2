// aegis-core/src/detector.rs
//! Defines the core `Detector` trait.
//!
//! A detector is anything that turns text into candidate spans: a regular
//! expression, a checksum-validated pattern, a named-entity model. The merge
//! engine depends only on this trait, so catalogs of concrete detectors can
//! live outside the core.
//!
//! License: MIT OR APACHE 2.0

use crate::candidate::Candidate;

/// A trait that defines the contract every detector must satisfy.
///
/// Detectors run independently of each other and may return overlapping
/// spans. Implementations must be stateless or internally synchronized,
/// since a single merge engine may be shared across threads.
pub trait Detector: Send + Sync {
    /// Scans `text` and returns candidate spans.
    ///
    /// Offsets are byte offsets into exactly the `text` passed in, and
    /// `text[c.start..c.end] == c.text` must hold for every returned candidate.
    /// Candidates violating this are dropped by the merge engine.
    fn scan(&self, text: &str) -> Vec<Candidate>;

    /// A short name used in diagnostics.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

impl<F> Detector for F
where
    F: Fn(&str) -> Vec<Candidate> + Send + Sync,
{
    fn scan(&self, text: &str) -> Vec<Candidate> {
        self(text)
    }
}
