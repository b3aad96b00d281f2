//! Configuration management for `aegis-core`.
//!
//! This module defines the configuration for the detection pipeline: custom
//! regex patterns, the allowlist, post-merge filters, and the logging level.
//! It handles YAML deserialization and provides utilities for loading,
//! merging, and validating configs.
//!
//! License: MIT OR Apache-2.0

use anyhow::{Context, Result};
use log::{debug, info};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::detectors::compiler::compile_pattern;
use crate::errors::AegisError;

/// Maximum allowed length for a regex pattern string.
pub const MAX_PATTERN_LENGTH: usize = 500;

const VALID_LOG_LEVELS: [&str; 4] = ["debug", "info", "warn", "error"];

/// A user-supplied regex pattern for one entity type.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CustomPattern {
    /// Unique identifier for the pattern (e.g., "employee_id").
    pub name: String,
    /// Entity type label used in tokens (e.g., "EMPLOYEE_ID").
    #[serde(rename = "type")]
    pub entity_type: String,
    /// The regex pattern string.
    pub pattern: String,
    /// Confidence assigned to every match.
    pub score: f64,
    /// Capture group used as the span; 0 is the whole match.
    pub group: usize,
}

impl Default for CustomPattern {
    fn default() -> Self {
        Self {
            name: String::new(),
            entity_type: String::new(),
            pattern: String::new(),
            score: 0.9,
            group: 0,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ScannerConfig {
    pub custom_patterns: Vec<CustomPattern>,
    /// Regexes matched against each candidate's text; matches are dropped.
    pub allowlist: Vec<String>,
    /// Candidates scoring below this are dropped after the merge.
    pub min_score: Option<f64>,
    /// Entity types dropped after the merge.
    pub disabled_types: Vec<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// One of `debug`, `info`, `warn`, `error`. Defaults to `info`.
    pub level: Option<String>,
}

impl LoggingConfig {
    pub fn level(&self) -> &str {
        self.level.as_deref().unwrap_or("info")
    }

    /// Maps the configured level to a `log::LevelFilter`.
    pub fn level_filter(&self) -> Result<log::LevelFilter, AegisError> {
        match self.level() {
            "debug" => Ok(log::LevelFilter::Debug),
            "info" => Ok(log::LevelFilter::Info),
            "warn" => Ok(log::LevelFilter::Warn),
            "error" => Ok(log::LevelFilter::Error),
            other => Err(AegisError::Config(format!(
                "unknown log level '{}' (want {})",
                other,
                VALID_LOG_LEVELS.join("|")
            ))),
        }
    }
}

/// Represents the top-level configuration structure for Aegis.
#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AegisConfig {
    pub scanner: ScannerConfig,
    pub logging: LoggingConfig,
}

impl AegisConfig {
    /// Loads configuration from a YAML file and validates it.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading configuration from: {}", path.display());
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::from_yaml_str(&text)
            .with_context(|| format!("Failed to load config file {}", path.display()))?;

        info!(
            "Loaded {} custom patterns and {} allowlist entries from {}.",
            config.scanner.custom_patterns.len(),
            config.scanner.allowlist.len(),
            path.display()
        );
        Ok(config)
    }

    /// Parses and validates a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: AegisConfig = serde_yml::from_str(yaml).context("Failed to parse configuration YAML")?;
        config.validate()?;
        Ok(config)
    }

    /// Loads the defaults embedded in the crate.
    pub fn load_default() -> Result<Self> {
        debug!("Loading default configuration from embedded string...");
        let default_yaml = include_str!("../config/default_config.yaml");
        Self::from_yaml_str(default_yaml).context("Failed to parse default configuration")
    }

    /// Checks every pattern, allowlist entry, threshold and the log level.
    ///
    /// All problems are reported together.
    pub fn validate(&self) -> Result<(), AegisError> {
        let mut errors = Vec::new();
        let mut names = HashSet::new();

        for (i, pattern) in self.scanner.custom_patterns.iter().enumerate() {
            if pattern.name.is_empty() {
                errors.push(format!("custom_patterns[{}] has an empty `name` field.", i));
            } else if !names.insert(pattern.name.as_str()) {
                errors.push(format!("Duplicate pattern name found: '{}'.", pattern.name));
            }
            if pattern.pattern.is_empty() {
                errors.push(format!("custom_patterns[{}] ({}) has an empty `pattern` field.", i, pattern.name));
                continue;
            }
            if let Err(e) = compile_pattern(pattern) {
                errors.push(format!("custom_patterns[{}]: {}", i, e));
            }
        }

        for (i, entry) in self.scanner.allowlist.iter().enumerate() {
            if let Err(e) = Regex::new(entry) {
                errors.push(format!("allowlist[{}]: invalid regex: {}", i, e));
            }
        }

        if let Some(min_score) = self.scanner.min_score {
            if !(0.0..=1.0).contains(&min_score) {
                errors.push(format!("scanner.min_score {} is outside [0.0, 1.0]", min_score));
            }
        }

        if let Err(e) = self.logging.level_filter() {
            errors.push(e.to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(AegisError::Config(format!("Configuration validation failed:\n{}", errors.join("\n"))))
        }
    }
}

/// Overlays a user configuration onto the defaults.
///
/// Custom patterns are keyed by name (user wins, default order kept), the
/// allowlists and disabled types are concatenated without duplicates, and
/// user scalars override default scalars.
pub fn merge_configs(default_config: AegisConfig, user_config: Option<AegisConfig>) -> AegisConfig {
    let Some(user_cfg) = user_config else {
        debug!("merge_configs called without user config; using defaults.");
        return default_config;
    };

    debug!(
        "Merging {} user patterns into {} default patterns.",
        user_cfg.scanner.custom_patterns.len(),
        default_config.scanner.custom_patterns.len()
    );

    let mut scanner = default_config.scanner;
    let mut index_by_name: HashMap<String, usize> = scanner
        .custom_patterns
        .iter()
        .enumerate()
        .map(|(i, p)| (p.name.clone(), i))
        .collect();

    for user_pattern in user_cfg.scanner.custom_patterns {
        match index_by_name.get(&user_pattern.name) {
            Some(&i) => scanner.custom_patterns[i] = user_pattern,
            None => {
                index_by_name.insert(user_pattern.name.clone(), scanner.custom_patterns.len());
                scanner.custom_patterns.push(user_pattern);
            }
        }
    }

    for entry in user_cfg.scanner.allowlist {
        if !scanner.allowlist.contains(&entry) {
            scanner.allowlist.push(entry);
        }
    }

    for entity_type in user_cfg.scanner.disabled_types {
        if !scanner.disabled_types.contains(&entity_type) {
            scanner.disabled_types.push(entity_type);
        }
    }

    if let Some(min_score) = user_cfg.scanner.min_score {
        debug!("Overriding min_score with user value: {}", min_score);
        scanner.min_score = Some(min_score);
    }

    let logging = LoggingConfig {
        level: user_cfg.logging.level.or(default_config.logging.level),
    };

    AegisConfig { scanner, logging }
}
