//! Validation of author config into an immutable `ResolvedConfig`
//!
//! Invalid configuration is an authoring bug, so every check fails with a
//! descriptive error instead of coercing the value.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;
use tracing::debug;

use crate::config::input::{BreakpointInput, OverlayConfig};
use crate::constants::defaults;
use crate::types::MatchStrategy;

/// Errors raised while normalizing a configuration
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("breakpoint at position {index} needs an id")]
    MissingId { index: usize },

    #[error("duplicate breakpoint id detected: {id}")]
    DuplicateId { id: String },

    #[error("breakpoint {id} needs a min/max width")]
    MissingBounds { id: String },

    #[error("breakpoint {id} does not match required strategy {expected} (inferred {inferred})")]
    StrategyMismatch {
        id: String,
        expected: MatchStrategy,
        inferred: MatchStrategy,
    },

    #[error("breakpoint {id} has an invalid {field} value: {value}")]
    InvalidBound {
        id: String,
        field: &'static str,
        value: f64,
    },

    #[error("breakpoint {id} has minWidth greater than maxWidth")]
    InvertedRange { id: String },

    #[error("debounceMs has an invalid value: {value}")]
    InvalidDebounce { value: f64 },
}

/// Breakpoint with explicit bounds and the strategy its shape implies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedBreakpoint {
    pub id: String,
    pub label: String,
    pub min_width: Option<f64>,
    pub max_width: Option<f64>,
    pub inferred_strategy: MatchStrategy,
}

/// Fully validated configuration used by the runtime.
/// Never mutated; updates build a new one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedConfig {
    pub schema_version: u32,
    /// Author order, which is also resolution priority
    pub breakpoints: Vec<NormalizedBreakpoint>,
    pub hotkey: String,
    pub debounce_ms: f64,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            schema_version: defaults::SCHEMA_VERSION,
            breakpoints: Vec::new(),
            hotkey: defaults::HOTKEY.to_string(),
            debounce_ms: defaults::DEBOUNCE_MS,
        }
    }
}

impl From<&NormalizedBreakpoint> for BreakpointInput {
    fn from(bp: &NormalizedBreakpoint) -> Self {
        Self {
            id: bp.id.clone(),
            label: Some(bp.label.clone()),
            min_width: bp.min_width,
            max_width: bp.max_width,
        }
    }
}

impl From<&ResolvedConfig> for OverlayConfig {
    fn from(config: &ResolvedConfig) -> Self {
        Self {
            match_strategy: None,
            breakpoints: Some(config.breakpoints.iter().map(BreakpointInput::from).collect()),
            hotkey: Some(config.hotkey.clone()),
            debounce_ms: Some(config.debounce_ms),
        }
    }
}

fn infer_strategy(breakpoint: &BreakpointInput) -> Option<MatchStrategy> {
    match (breakpoint.min_width, breakpoint.max_width) {
        (Some(_), Some(_)) => Some(MatchStrategy::Range),
        (Some(_), None) => Some(MatchStrategy::MinWidth),
        (None, Some(_)) => Some(MatchStrategy::MaxWidth),
        (None, None) => None,
    }
}

fn check_bound(value: Option<f64>, field: &'static str, id: &str) -> Result<Option<f64>, ConfigError> {
    match value {
        Some(v) if !v.is_finite() || v < 0.0 => Err(ConfigError::InvalidBound {
            id: id.to_string(),
            field,
            value: v,
        }),
        other => Ok(other),
    }
}

fn normalize_breakpoint(
    breakpoint: &BreakpointInput,
    explicit: Option<MatchStrategy>,
) -> Result<NormalizedBreakpoint, ConfigError> {
    let id = breakpoint.id.as_str();
    let inferred_strategy = infer_strategy(breakpoint)
        .ok_or_else(|| ConfigError::MissingBounds { id: id.to_string() })?;

    if let Some(expected) = explicit
        && expected != inferred_strategy
    {
        return Err(ConfigError::StrategyMismatch {
            id: id.to_string(),
            expected,
            inferred: inferred_strategy,
        });
    }

    let min_width = check_bound(breakpoint.min_width, "minWidth", id)?;
    let max_width = check_bound(breakpoint.max_width, "maxWidth", id)?;

    if let (Some(min), Some(max)) = (min_width, max_width)
        && min > max
    {
        return Err(ConfigError::InvertedRange { id: id.to_string() });
    }

    Ok(NormalizedBreakpoint {
        id: id.to_string(),
        label: breakpoint.label.clone().unwrap_or_else(|| id.to_string()),
        min_width,
        max_width,
        inferred_strategy,
    })
}

/// Validate `config` and fill in defaults.
/// `None` yields the default configuration with no breakpoints.
pub fn normalize(config: Option<&OverlayConfig>) -> Result<ResolvedConfig, ConfigError> {
    let Some(config) = config else {
        return Ok(ResolvedConfig::default());
    };

    let provided = config.breakpoints.as_deref().unwrap_or_default();
    let mut seen = HashSet::with_capacity(provided.len());
    let mut breakpoints = Vec::with_capacity(provided.len());

    for (index, breakpoint) in provided.iter().enumerate() {
        if breakpoint.id.is_empty() {
            return Err(ConfigError::MissingId { index });
        }
        if !seen.insert(breakpoint.id.as_str()) {
            return Err(ConfigError::DuplicateId {
                id: breakpoint.id.clone(),
            });
        }
        breakpoints.push(normalize_breakpoint(breakpoint, config.match_strategy)?);
    }

    let debounce_ms = match config.debounce_ms {
        Some(v) if !v.is_finite() || v < 0.0 => return Err(ConfigError::InvalidDebounce { value: v }),
        Some(v) => v,
        None => defaults::DEBOUNCE_MS,
    };

    debug!(
        breakpoints = breakpoints.len(),
        strategy = ?config.match_strategy,
        "Normalized overlay config"
    );

    Ok(ResolvedConfig {
        schema_version: defaults::SCHEMA_VERSION,
        breakpoints,
        hotkey: config
            .hotkey
            .clone()
            .unwrap_or_else(|| defaults::HOTKEY.to_string()),
        debounce_ms,
    })
}
