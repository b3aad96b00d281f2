// aegis-core/src/pipeline.rs
//! `pipeline.rs`
//! Convenience facade over the merge engine, redactor and restorer.
//!
//! A `Pipeline` is built once from an `AegisConfig` (plus any catalog
//! detectors the host registers) and can then be shared across threads:
//! every call creates its own token counter and candidate list.

use anyhow::{Context, Result};
use log::info;

use crate::allowlist::Allowlist;
use crate::candidate::Candidate;
use crate::config::AegisConfig;
use crate::detector::Detector;
use crate::detectors::compiler::compile_patterns;
use crate::errors::AegisError;
use crate::merge::MergeEngine;
use crate::redactor::{redact, Mapping, RedactResult};
use crate::restorer::{restore, StreamRestorer};

#[derive(Debug)]
pub struct Pipeline {
    engine: MergeEngine,
}

impl Pipeline {
    /// Builds a pipeline from configuration only (custom patterns, allowlist
    /// and post-merge filters).
    pub fn from_config(config: &AegisConfig) -> Result<Self, AegisError> {
        Self::with_detectors(config, Vec::new())
    }

    /// Builds a pipeline running `detectors` first, then the configured
    /// custom patterns.
    pub fn with_detectors(config: &AegisConfig, mut detectors: Vec<Box<dyn Detector>>) -> Result<Self, AegisError> {
        let scanner = &config.scanner;
        for detector in compile_patterns(&scanner.custom_patterns)? {
            detectors.push(Box::new(detector));
        }
        let allowlist = Allowlist::new(&scanner.allowlist)?;

        info!(
            "Pipeline ready with {} detectors and {} allowlist patterns.",
            detectors.len(),
            allowlist.len()
        );

        let engine = MergeEngine::new(detectors, allowlist)
            .with_min_score(scanner.min_score)
            .with_disabled_types(scanner.disabled_types.clone());
        Ok(Self { engine })
    }

    pub fn from_engine(engine: MergeEngine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &MergeEngine {
        &self.engine
    }

    /// Final candidates for `text`; offsets refer to its NFC form.
    pub fn scan(&self, text: &str) -> Vec<Candidate> {
        self.engine.merge(text).candidates
    }

    pub fn scan_bytes(&self, input: &[u8]) -> Result<Vec<Candidate>, AegisError> {
        Ok(self.engine.merge_bytes(input)?.candidates)
    }

    /// Detects and redacts in one call.
    pub fn redact(&self, text: &str) -> RedactResult {
        let merged = self.engine.merge(text);
        redact(&merged.text, &merged.candidates)
    }

    pub fn redact_bytes(&self, input: &[u8]) -> Result<RedactResult, AegisError> {
        let merged = self.engine.merge_bytes(input)?;
        Ok(redact(&merged.text, &merged.candidates))
    }

    pub fn restore(&self, text: &str, mappings: &[Mapping]) -> String {
        restore(text, mappings)
    }

    /// A fresh restorer for one stream.
    pub fn stream_restorer(&self, mappings: &[Mapping]) -> StreamRestorer {
        StreamRestorer::new(mappings)
    }
}

/// Builds a pipeline and redacts `content` in a single call.
pub fn headless_redact(
    config: &AegisConfig,
    detectors: Vec<Box<dyn Detector>>,
    content: &str,
) -> Result<RedactResult> {
    let pipeline = Pipeline::with_detectors(config, detectors).context("Failed to build redaction pipeline")?;
    Ok(pipeline.redact(content))
}
