//! compiler.rs - Compiles configured custom patterns into detectors.
//!
//! Each `CustomPattern` becomes one `RegexDetector`. All failures are
//! collected so that a broken configuration is reported in one pass rather
//! than one error at a time.
//!
//! License: MIT OR APACHE 2.0

use log::debug;
use regex::RegexBuilder;

use crate::config::{CustomPattern, MAX_PATTERN_LENGTH};
use crate::detectors::regex_detector::RegexDetector;
use crate::errors::AegisError;

/// Compiled regex size cap, in bytes.
const REGEX_SIZE_LIMIT: usize = 10 * (1 << 20);

/// Checks that an entity type can be embedded in a `[TYPE_N]` token.
pub fn validate_entity_type(label: &str) -> Result<(), AegisError> {
    if label.is_empty() || label.contains('[') || label.contains(']') {
        return Err(AegisError::InvalidEntityType(label.to_string()));
    }
    Ok(())
}

/// Compiles a single custom pattern.
pub fn compile_pattern(pattern: &CustomPattern) -> Result<RegexDetector, AegisError> {
    validate_entity_type(&pattern.entity_type)?;

    if !(0.0..=1.0).contains(&pattern.score) {
        return Err(AegisError::InvalidScore(pattern.name.clone(), pattern.score));
    }

    if pattern.pattern.len() > MAX_PATTERN_LENGTH {
        return Err(AegisError::PatternLengthExceeded(
            pattern.name.clone(),
            pattern.pattern.len(),
            MAX_PATTERN_LENGTH,
        ));
    }

    let regex = RegexBuilder::new(&pattern.pattern)
        .size_limit(REGEX_SIZE_LIMIT)
        .build()
        .map_err(|e| AegisError::PatternCompilation(pattern.name.clone(), e))?;

    if pattern.group >= regex.captures_len() {
        return Err(AegisError::Config(format!(
            "Pattern '{}' extracts group {} but only has {} capture group(s)",
            pattern.name,
            pattern.group,
            regex.captures_len() - 1
        )));
    }

    debug!(
        target: "aegis_core::compiler",
        "Pattern '{}' compiled successfully.",
        &pattern.name
    );

    Ok(RegexDetector::new(regex, pattern.entity_type.as_str(), pattern.score)
        .with_extract_group(pattern.group)
        .with_name(pattern.name.as_str()))
}

/// Compiles every custom pattern, or reports every pattern that failed.
pub fn compile_patterns(patterns: &[CustomPattern]) -> Result<Vec<RegexDetector>, AegisError> {
    debug!("Starting compilation of {} custom patterns.", patterns.len());

    let mut detectors = Vec::with_capacity(patterns.len());
    let mut compilation_errors = Vec::new();

    for pattern in patterns {
        match compile_pattern(pattern) {
            Ok(detector) => detectors.push(detector),
            Err(e) => compilation_errors.push(e),
        }
    }

    if !compilation_errors.is_empty() {
        let error_message = compilation_errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<String>>()
            .join("\n");
        return Err(AegisError::Config(format!(
            "Failed to compile {} pattern(s):\n{}",
            compilation_errors.len(),
            error_message
        )));
    }

    debug!("Finished compiling patterns. Total compiled: {}.", detectors.len());
    Ok(detectors)
}
