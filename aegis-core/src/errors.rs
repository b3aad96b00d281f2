//! errors.rs - Custom error types for the aegis-core library.
//!
//! This module defines a structured error enum for the library, providing
//! specific, actionable error types that can be handled programmatically.
//!
//! License: MIT OR APACHE 2.0

use thiserror::Error;

/// This enum represents all possible error types in the `aegis-core` library.
///
/// Stream misuse has no variant: `StreamRestorer::process` borrows the
/// restorer mutably and `StreamRestorer::flush` consumes it, so both misuse
/// patterns are rejected at compile time.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum AegisError {
    #[error("Input is not valid UTF-8 (first invalid byte at offset {valid_up_to})")]
    InputEncoding { valid_up_to: usize },

    #[error("Candidate '{entity_type}' at {start}..{end} from detector '{detector}' is invalid: {reason}")]
    InvalidCandidate {
        entity_type: String,
        detector: String,
        start: usize,
        end: usize,
        reason: String,
    },

    #[error("Failed to compile pattern '{0}': {1}")]
    PatternCompilation(String, regex::Error),

    #[error("Pattern '{0}': pattern length ({1}) exceeds maximum allowed ({2})")]
    PatternLengthExceeded(String, usize, usize),

    #[error("Invalid entity type '{0}': labels must be non-empty and must not contain '[' or ']'")]
    InvalidEntityType(String),

    #[error("Pattern '{0}': score {1} is outside [0.0, 1.0]")]
    InvalidScore(String, f64),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("An unexpected I/O error occurred: {0}")]
    IoError(#[from] std::io::Error),
}
