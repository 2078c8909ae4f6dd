//! Application-wide constants
//!
//! This module contains the defaults and string literals used throughout
//! the runtime, providing a single source of truth for constant values.

/// Configuration defaults applied by the normalizer
pub mod defaults {
    /// Version stamped onto every resolved configuration
    pub const SCHEMA_VERSION: u32 = 1;

    /// Hotkey used when the author leaves `hotkey` unset
    pub const HOTKEY: &str = "alt+shift+o";

    /// Debounce interval used when the author leaves `debounceMs` unset
    pub const DEBOUNCE_MS: f64 = 150.0;
}

/// Viewport fallback values for non-interactive hosts
pub mod viewport {
    /// Device pixel ratio reported when the host cannot provide one
    pub const DEFAULT_DEVICE_PIXEL_RATIO: f64 = 1.0;
}

/// Keyboard event constants
pub mod keyboard {
    /// Element tags that accept text input; hotkeys are ignored while focused
    pub const EDITABLE_TAGS: [&str; 3] = ["input", "textarea", "select"];

    /// Separator between tokens in a hotkey string
    pub const COMBO_SEPARATOR: char = '+';

    /// Prefix of the platform key-code for letters (`KeyA`..`KeyZ`)
    pub const LETTER_CODE_PREFIX: &str = "Key";

    /// Prefix of the platform key-code for digits (`Digit0`..`Digit9`)
    pub const DIGIT_CODE_PREFIX: &str = "Digit";
}

/// Config file location
pub mod config {
    /// Directory under the user's config dir
    pub const APP_DIR: &str = "breakpoint-overlay";

    /// Config file name
    pub const FILENAME: &str = "config.json";
}

/// Environment variables read at startup
pub mod env {
    /// Log level for the tracing subscriber
    pub const LOG_LEVEL: &str = "LOG_LEVEL";

    /// Overrides the configured hotkey
    pub const HOTKEY: &str = "BP_OVERLAY_HOTKEY";

    /// Overrides the configured debounce interval
    pub const DEBOUNCE_MS: &str = "BP_OVERLAY_DEBOUNCE_MS";
}
