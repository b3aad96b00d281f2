// aegis-core/src/merge.rs
//! The merge engine: runs every detector over NFC-normalized text and turns
//! their combined output into one ordered, non-overlapping candidate list.
//!
//! Overlaps are resolved by a left-to-right sweep over candidates sorted by
//! `(start ascending, span length descending)`. The earliest, longest span
//! wins; `score` plays no part in the tie-break. The allowlist and the
//! post-merge filters run on the surviving candidates only.
//!
//! License: MIT OR APACHE 2.0

use log::{debug, warn};

use crate::allowlist::Allowlist;
use crate::candidate::{get_loggable_content, Candidate};
use crate::detector::Detector;
use crate::errors::AegisError;
use crate::normalize::{decode, to_nfc};

/// Output of a merge: the normalized text the offsets refer to, and the
/// final candidates in ascending `start` order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MergeResult {
    pub text: String,
    pub candidates: Vec<Candidate>,
}

/// Runs `detectors` over the NFC form of `text`, resolves overlaps and applies
/// the allowlist. Offsets in the result refer to the NFC form.
pub fn merge<D>(text: &str, detectors: &[D], allowlist: &Allowlist) -> Vec<Candidate>
where
    D: AsRef<dyn Detector>,
{
    let normalized = to_nfc(text);
    merge_normalized(&normalized, detectors, allowlist)
}

fn merge_normalized<D>(normalized: &str, detectors: &[D], allowlist: &Allowlist) -> Vec<Candidate>
where
    D: AsRef<dyn Detector>,
{
    if normalized.is_empty() {
        return Vec::new();
    }

    let mut all = Vec::new();
    for detector in detectors.iter().map(|d| d.as_ref()) {
        let found = detector.scan(normalized);
        debug!("Detector '{}' produced {} candidates.", detector.name(), found.len());
        all.extend(found.into_iter().filter(|c| keep_valid(c, normalized)));
    }

    let total = all.len();
    let merged = resolve_overlaps(all);
    debug!("Overlap resolution kept {} of {} candidates.", merged.len(), total);

    if allowlist.is_empty() {
        return merged;
    }
    merged
        .into_iter()
        .filter(|c| {
            let allowed = allowlist.is_allowed(&c.text);
            if allowed {
                debug!(
                    "Allowlist dropped '{}' candidate: {}",
                    c.entity_type,
                    get_loggable_content(&c.text)
                );
            }
            !allowed
        })
        .collect()
}

fn keep_valid(candidate: &Candidate, normalized: &str) -> bool {
    match candidate.validate(normalized) {
        Ok(()) => true,
        Err(e) => {
            warn!("Dropping candidate: {}", e);
            false
        }
    }
}

/// Sorts by `(start asc, length desc)` and keeps every candidate that starts
/// at or after the end of everything accepted so far.
pub fn resolve_overlaps(mut candidates: Vec<Candidate>) -> Vec<Candidate> {
    // Stable sort keeps detector order among identical spans.
    candidates.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| b.span_len().cmp(&a.span_len())));

    let mut accepted: Vec<Candidate> = Vec::with_capacity(candidates.len());
    let mut last_end: Option<usize> = None;
    for candidate in candidates {
        if last_end.is_some_and(|end| candidate.start < end) {
            continue;
        }
        last_end = Some(last_end.map_or(candidate.end, |end| end.max(candidate.end)));
        accepted.push(candidate);
    }
    accepted
}

/// Owns a detector set and the filters applied after the merge.
pub struct MergeEngine {
    detectors: Vec<Box<dyn Detector>>,
    allowlist: Allowlist,
    min_score: Option<f64>,
    disabled_types: Vec<String>,
}

impl std::fmt::Debug for MergeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MergeEngine")
            .field("detectors", &self.detectors.iter().map(|d| d.name()).collect::<Vec<_>>())
            .field("allowlist", &self.allowlist.len())
            .field("min_score", &self.min_score)
            .field("disabled_types", &self.disabled_types)
            .finish()
    }
}

impl Default for MergeEngine {
    fn default() -> Self {
        Self::new(Vec::new(), Allowlist::default())
    }
}

impl MergeEngine {
    pub fn new(detectors: Vec<Box<dyn Detector>>, allowlist: Allowlist) -> Self {
        Self {
            detectors,
            allowlist,
            min_score: None,
            disabled_types: Vec::new(),
        }
    }

    pub fn with_detector<D: Detector + 'static>(mut self, detector: D) -> Self {
        self.detectors.push(Box::new(detector));
        self
    }

    pub fn add_detector(&mut self, detector: Box<dyn Detector>) {
        self.detectors.push(detector);
    }

    /// Drops merged candidates scoring below `min_score`.
    pub fn with_min_score(mut self, min_score: Option<f64>) -> Self {
        self.min_score = min_score;
        self
    }

    /// Drops merged candidates of these types.
    pub fn with_disabled_types(mut self, disabled_types: Vec<String>) -> Self {
        self.disabled_types = disabled_types;
        self
    }

    pub fn detector_count(&self) -> usize {
        self.detectors.len()
    }

    /// Normalizes `text`, runs all detectors and returns the final candidates
    /// along with the normalized text their offsets refer to.
    pub fn merge(&self, text: &str) -> MergeResult {
        let normalized = to_nfc(text).into_owned();
        let mut candidates = merge_normalized(&normalized, &self.detectors, &self.allowlist);

        if let Some(min_score) = self.min_score {
            candidates.retain(|c| c.score >= min_score);
        }
        if !self.disabled_types.is_empty() {
            candidates.retain(|c| !self.disabled_types.contains(&c.entity_type));
        }

        MergeResult { text: normalized, candidates }
    }

    /// Like [`MergeEngine::merge`] for raw input; fails before normalization
    /// when the bytes are not UTF-8.
    pub fn merge_bytes(&self, input: &[u8]) -> Result<MergeResult, AegisError> {
        let text = decode(input)?;
        Ok(self.merge(text))
    }
}

impl Detector for MergeEngine {
    /// Offsets refer to the NFC form of `text`.
    fn scan(&self, text: &str) -> Vec<Candidate> {
        self.merge(text).candidates
    }

    fn name(&self) -> &str {
        "merge"
    }
}
