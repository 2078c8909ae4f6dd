//! Core value types shared across the runtime

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::viewport::DEFAULT_DEVICE_PIXEL_RATIO;

/// How a breakpoint's bounds are interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchStrategy {
    MinWidth,
    MaxWidth,
    Range,
}

impl MatchStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStrategy::MinWidth => "min-width",
            MatchStrategy::MaxWidth => "max-width",
            MatchStrategy::Range => "range",
        }
    }
}

impl fmt::Display for MatchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One reading of the viewport
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewportSnapshot {
    pub width: f64,
    pub height: f64,
    pub device_pixel_ratio: f64,
}

impl ViewportSnapshot {
    /// Snapshot reported when no display environment exists
    pub const FALLBACK: ViewportSnapshot = ViewportSnapshot {
        width: 0.0,
        height: 0.0,
        device_pixel_ratio: DEFAULT_DEVICE_PIXEL_RATIO,
    };

    pub fn new(width: f64, height: f64, device_pixel_ratio: f64) -> Self {
        Self {
            width,
            height,
            device_pixel_ratio,
        }
        .sanitized()
    }

    /// Clamp dimensions to non-negative values and default a missing ratio to 1
    pub fn sanitized(self) -> Self {
        let clamp = |v: f64| if v.is_finite() && v > 0.0 { v } else { 0.0 };
        let device_pixel_ratio = if self.device_pixel_ratio.is_finite() && self.device_pixel_ratio > 0.0 {
            self.device_pixel_ratio
        } else {
            DEFAULT_DEVICE_PIXEL_RATIO
        };
        Self {
            width: clamp(self.width),
            height: clamp(self.height),
            device_pixel_ratio,
        }
    }
}

impl Default for ViewportSnapshot {
    fn default() -> Self {
        Self::FALLBACK
    }
}

/// The breakpoint currently matching the viewport
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakpointMatch {
    pub id: String,
    pub label: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadgeUiState {
    pub expanded: bool,
}

/// Observable overlay status, owned by the [`Store`](crate::state::Store)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeState {
    pub active: bool,
    pub viewport: ViewportSnapshot,
    pub breakpoint: Option<BreakpointMatch>,
    pub badge: BadgeUiState,
    /// Milliseconds since the Unix epoch of the last change
    pub timestamp: u64,
}

impl RuntimeState {
    pub fn with_timestamp(timestamp: u64) -> Self {
        Self {
            active: false,
            viewport: ViewportSnapshot::FALLBACK,
            breakpoint: None,
            badge: BadgeUiState::default(),
            timestamp,
        }
    }

    pub fn breakpoint_id(&self) -> Option<&str> {
        self.breakpoint.as_ref().map(|bp| bp.id.as_str())
    }
}
