//! Configuration management for the breakpoint overlay
//!
//! This module provides three layers:
//! - **input**: `OverlayConfig`, the author-supplied shape (camelCase JSON)
//! - **normalize**: validation into an immutable `ResolvedConfig`
//! - **file**: loading/saving config files and environment overrides

pub mod file;
pub mod input;
pub mod normalize;

// Re-export commonly used types
pub use input::{BreakpointInput, OverlayConfig};
pub use normalize::{normalize, ConfigError, NormalizedBreakpoint, ResolvedConfig};
