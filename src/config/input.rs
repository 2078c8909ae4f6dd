//! Author-facing configuration shape
//!
//! Mirrors what an embedding page hands to `init_overlay`. Every field is
//! optional; the normalizer fills in defaults and rejects invalid input.

use serde::{Deserialize, Serialize};

use crate::types::MatchStrategy;

/// Raw overlay configuration as supplied by the host
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayConfig {
    /// When set, every breakpoint's inferred strategy must equal this one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_strategy: Option<MatchStrategy>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub breakpoints: Option<Vec<BreakpointInput>>,

    /// Keyboard shortcut in `modifier+...+key` form; `""` disables it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hotkey: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debounce_ms: Option<f64>,
}

/// One author-supplied breakpoint. Which bounds are present decides its shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakpointInput {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_width: Option<f64>,
}

impl BreakpointInput {
    /// Breakpoint matching widths `>= min_width`
    pub fn min(id: impl Into<String>, min_width: f64) -> Self {
        Self {
            id: id.into(),
            label: None,
            min_width: Some(min_width),
            max_width: None,
        }
    }

    /// Breakpoint matching widths `<= max_width`
    pub fn max(id: impl Into<String>, max_width: f64) -> Self {
        Self {
            id: id.into(),
            label: None,
            min_width: None,
            max_width: Some(max_width),
        }
    }

    /// Breakpoint matching widths within `[min_width, max_width]`
    pub fn range(id: impl Into<String>, min_width: f64, max_width: f64) -> Self {
        Self {
            id: id.into(),
            label: None,
            min_width: Some(min_width),
            max_width: Some(max_width),
        }
    }

    pub fn labeled(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

impl OverlayConfig {
    pub fn with_breakpoints(breakpoints: Vec<BreakpointInput>) -> Self {
        Self {
            breakpoints: Some(breakpoints),
            ..Self::default()
        }
    }

    /// Parse a JSON document into a config
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
