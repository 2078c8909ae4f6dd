//! Config file loading for hosts that keep overlay settings on disk
//!
//! The file holds an `OverlayConfig` as JSON. Environment variables override
//! individual fields after the file is read.

use anyhow::{Context, Result};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::config::input::{BreakpointInput, OverlayConfig};
use crate::constants;

impl OverlayConfig {
    /// Default config path: `<config_dir>/breakpoint-overlay/config.json`
    pub fn default_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(constants::config::APP_DIR);
        path.push(constants::config::FILENAME);
        path
    }

    /// Read and parse a config file, then apply env overrides
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        let mut config: OverlayConfig = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse JSON config from {}", path.display()))?;

        info!(
            path = %path.display(),
            breakpoints = config.breakpoints.as_ref().map_or(0, Vec::len),
            "Loaded overlay config"
        );
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from `path` if given, else from the default path.
    /// A missing default file is not an error: an empty config is returned.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_from(path);
        }

        let default_path = Self::default_path();
        if default_path.exists() {
            Self::load_from(&default_path)
        } else {
            info!(path = %default_path.display(), "No config file found, using defaults");
            let mut config = Self::default();
            config.apply_env_overrides();
            Ok(config)
        }
    }

    /// Write the config as pretty JSON, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }
        let contents = serde_json::to_string_pretty(self).context("Failed to serialize config to JSON")?;
        fs::write(path, contents)
            .with_context(|| format!("Failed to write config file to {}", path.display()))?;
        info!(path = %path.display(), "Saved overlay config");
        Ok(())
    }

    /// Starter config written by `bp-overlay init`
    pub fn sample() -> Self {
        Self {
            match_strategy: None,
            breakpoints: Some(vec![
                BreakpointInput::max("mobile", 767.0).labeled("Mobile"),
                BreakpointInput::range("tablet", 768.0, 1199.0).labeled("Tablet"),
                BreakpointInput::min("desktop", 1200.0).labeled("Desktop"),
            ]),
            hotkey: Some(constants::defaults::HOTKEY.to_string()),
            debounce_ms: Some(constants::defaults::DEBOUNCE_MS),
        }
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| env::var(name).ok());
    }

    /// Apply `BP_OVERLAY_*` overrides from `lookup`; bad values are logged and skipped
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(hotkey) = lookup(constants::env::HOTKEY) {
            info!(hotkey = %hotkey, "Hotkey overridden from environment");
            self.hotkey = Some(hotkey);
        }
        if let Some(raw) = lookup(constants::env::DEBOUNCE_MS) {
            match raw.trim().parse::<f64>() {
                Ok(value) if value.is_finite() && value >= 0.0 => self.debounce_ms = Some(value),
                Ok(value) => warn!(var = constants::env::DEBOUNCE_MS, value, "Ignoring out-of-range debounce override"),
                Err(e) => error!(var = constants::env::DEBOUNCE_MS, error = ?e, "failed to parse env var"),
            }
        }
    }
}
