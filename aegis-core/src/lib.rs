// aegis-core/src/lib.rs
//! # Aegis Core Library
//!
//! `aegis-core` masks sensitive spans of text (names, identifiers, financial
//! values, secrets) with stable placeholder tokens and restores them later,
//! including when the tokenized text comes back in arbitrary chunks.
//!
//! The library is pure and synchronous. It does not ship a detection
//! catalog: anything implementing [`Detector`] can feed the pipeline.
//!
//! ## Modules
//!
//! * `candidate`: The `Candidate` span model and its offset invariant.
//! * `normalize`: UTF-8 decoding and NFC normalization.
//! * `detector`: The `Detector` trait.
//! * `detectors`: The regex detector and the custom-pattern compiler.
//! * `allowlist`: Patterns whose matches are never reported.
//! * `merge`: Runs detectors and resolves overlapping candidates.
//! * `redactor`: Assigns `[TYPE_N]` tokens and rewrites text.
//! * `restorer`: One-shot and streaming token restoration.
//! * `config`: YAML configuration, validation and merging.
//! * `logger`: `env_logger` setup for hosts.
//! * `pipeline`: A facade bundling the above.
//!
//! ## Usage Example
//!
//! ```rust
//! use aegis_core::{Allowlist, Candidate, MergeEngine, Pipeline};
//!
//! let engine = MergeEngine::new(Vec::new(), Allowlist::default()).with_detector(|text: &str| {
//!     text.match_indices("Alice")
//!         .map(|(start, m)| Candidate::new(start, start + m.len(), "PERSON", m, 0.9, "example"))
//!         .collect::<Vec<_>>()
//! });
//! let pipeline = Pipeline::from_engine(engine);
//!
//! let result = pipeline.redact("Alice and Bob met Alice again.");
//! assert_eq!(result.sanitized_text, "[PERSON_1] and Bob met [PERSON_1] again.");
//!
//! let mut stream = pipeline.stream_restorer(&result.mappings);
//! let mut restored = stream.process("[PERSON_1] and Bob met [PER");
//! restored.push_str(&stream.process("SON_1] again."));
//! restored.push_str(&stream.flush());
//! assert_eq!(restored, "Alice and Bob met Alice again.");
//! ```
//!
//! ## Error Handling
//!
//! Fallible core operations return [`AegisError`]; configuration loading from
//! files returns `anyhow::Result` with context. Invalid candidates are
//! dropped and logged rather than failing a call.
//!
//! ---
//! License: MIT OR Apache-2.0

pub mod allowlist;
pub mod candidate;
pub mod config;
pub mod detector;
pub mod detectors;
pub mod errors;
pub mod logger;
pub mod merge;
pub mod normalize;
pub mod pipeline;
pub mod redactor;
pub mod restorer;

/// Re-exports the span data model.
pub use candidate::{redact_sensitive, Candidate};

/// Re-exports the custom error type for clear error reporting.
pub use errors::AegisError;

/// Re-exports the detector trait and the bundled implementations.
pub use detector::Detector;
pub use detectors::compiler::{compile_pattern, compile_patterns, validate_entity_type};
pub use detectors::regex_detector::RegexDetector;

/// Re-exports the merge engine and its inputs.
pub use allowlist::Allowlist;
pub use merge::{merge, resolve_overlaps, MergeEngine, MergeResult};
pub use normalize::{decode, to_nfc};

/// Re-exports redaction and restoration.
pub use redactor::{format_token, redact, Counter, EntitySummary, Mapping, RedactResult};
pub use restorer::{restore, StreamRestorer};

/// Re-exports configuration types and helpers.
pub use config::{merge_configs, AegisConfig, CustomPattern, LoggingConfig, ScannerConfig, MAX_PATTERN_LENGTH};
pub use logger::init_logger;

/// Re-exports the one-shot facade.
pub use pipeline::{headless_redact, Pipeline};
