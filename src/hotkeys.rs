//! Hotkey parsing and keyboard event matching
//!
//! A hotkey is written as `modifier+...+key` (e.g. `alt+shift+o`). The final
//! key must be a single character. Letters and digits also carry a platform
//! key-code hint (`KeyO`, `Digit1`) so layouts that emit a different glyph
//! for the same physical key (such as `Ø` for alt+o) still match.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::constants::keyboard;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HotkeyError {
    #[error("hotkey contains multiple non-modifier keys: \"{first}\" and \"{second}\"")]
    MultipleKeys { first: String, second: String },

    #[error("hotkey must include a non-modifier key")]
    MissingKey,

    #[error("hotkey key token must be a single character, got \"{token}\"")]
    KeyTooLong { token: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Modifier {
    Alt,
    Ctrl,
    Shift,
    Meta,
}

fn modifier_for(token: &str) -> Option<Modifier> {
    match token {
        "alt" | "option" => Some(Modifier::Alt),
        "ctrl" | "control" => Some(Modifier::Ctrl),
        "shift" => Some(Modifier::Shift),
        "meta" | "cmd" | "command" => Some(Modifier::Meta),
        _ => None,
    }
}

/// Modifier keys held during a keyboard event
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub alt: bool,
    pub ctrl: bool,
    pub shift: bool,
    pub meta: bool,
}

/// Element that had focus when a key was pressed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum KeyTarget {
    #[default]
    Document,
    Element { tag: String, content_editable: bool },
}

impl KeyTarget {
    pub fn element(tag: impl Into<String>) -> Self {
        KeyTarget::Element {
            tag: tag.into(),
            content_editable: false,
        }
    }

    /// Text inputs, selects and content-editable elements
    pub fn is_editable(&self) -> bool {
        match self {
            KeyTarget::Document => false,
            KeyTarget::Element { tag, content_editable } => {
                *content_editable || keyboard::EDITABLE_TAGS.iter().any(|t| tag.eq_ignore_ascii_case(t))
            }
        }
    }
}

/// A keydown event as delivered by the host
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyEvent {
    /// Produced character or key name (`"o"`, `"Ø"`, `"Enter"`)
    pub key: String,
    /// Physical key code (`"KeyO"`), when the host reports one
    pub code: Option<String>,
    pub modifiers: Modifiers,
    pub target: KeyTarget,
}

impl KeyEvent {
    pub fn new(key: impl Into<String>, code: Option<&str>, modifiers: Modifiers) -> Self {
        Self {
            key: key.into(),
            code: code.map(str::to_string),
            modifiers,
            target: KeyTarget::Document,
        }
    }

    pub fn with_target(mut self, target: KeyTarget) -> Self {
        self.target = target;
        self
    }
}

/// Parsed form of a hotkey string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HotkeyBinding {
    pub alt: bool,
    pub ctrl: bool,
    pub shift: bool,
    pub meta: bool,
    /// Lowercase key character
    pub key: char,
    pub code: Option<String>,
}

impl HotkeyBinding {
    fn modifiers(&self) -> Modifiers {
        Modifiers {
            alt: self.alt,
            ctrl: self.ctrl,
            shift: self.shift,
            meta: self.meta,
        }
    }

    /// Modifiers must match exactly; the key matches by code or by character
    pub fn matches(&self, event: &KeyEvent) -> bool {
        if event.modifiers != self.modifiers() {
            return false;
        }

        if let (Some(code), Some(event_code)) = (&self.code, &event.code)
            && code == event_code
        {
            return true;
        }

        let mut chars = event.key.chars().flat_map(char::to_lowercase);
        chars.next() == Some(self.key) && chars.next().is_none()
    }
}

fn format_combo(modifiers: Modifiers, key: impl fmt::Display, f: &mut impl fmt::Write) -> fmt::Result {
    for (held, name) in [
        (modifiers.ctrl, "ctrl"),
        (modifiers.alt, "alt"),
        (modifiers.shift, "shift"),
        (modifiers.meta, "meta"),
    ] {
        if held {
            write!(f, "{name}{}", keyboard::COMBO_SEPARATOR)?;
        }
    }
    write!(f, "{key}")
}

impl fmt::Display for HotkeyBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        format_combo(self.modifiers(), self.key, f)
    }
}

fn key_code_for(key: char) -> Option<String> {
    match key {
        'a'..='z' => Some(format!("{}{}", keyboard::LETTER_CODE_PREFIX, key.to_ascii_uppercase())),
        '0'..='9' => Some(format!("{}{}", keyboard::DIGIT_CODE_PREFIX, key)),
        _ => None,
    }
}

/// Parse a hotkey string.
/// Empty or whitespace-only input means no hotkey and yields `Ok(None)`.
pub fn parse_hotkey(text: &str) -> Result<Option<HotkeyBinding>, HotkeyError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let mut modifiers = Modifiers::default();
    let mut key_token: Option<String> = None;

    for raw in trimmed.split(keyboard::COMBO_SEPARATOR) {
        let token = raw.trim().to_lowercase();
        if token.is_empty() {
            continue;
        }

        match modifier_for(&token) {
            Some(Modifier::Alt) => modifiers.alt = true,
            Some(Modifier::Ctrl) => modifiers.ctrl = true,
            Some(Modifier::Shift) => modifiers.shift = true,
            Some(Modifier::Meta) => modifiers.meta = true,
            None => {
                if let Some(first) = key_token {
                    return Err(HotkeyError::MultipleKeys { first, second: token });
                }
                key_token = Some(token);
            }
        }
    }

    let token = key_token.ok_or(HotkeyError::MissingKey)?;
    let mut chars = token.chars();
    let key = match (chars.next(), chars.next()) {
        (Some(key), None) => key,
        _ => return Err(HotkeyError::KeyTooLong { token }),
    };

    Ok(Some(HotkeyBinding {
        alt: modifiers.alt,
        ctrl: modifiers.ctrl,
        shift: modifiers.shift,
        meta: modifiers.meta,
        key,
        code: key_code_for(key),
    }))
}

/// `false` when no binding is configured
pub fn matches_hotkey(event: &KeyEvent, binding: Option<&HotkeyBinding>) -> bool {
    binding.is_some_and(|b| b.matches(event))
}

/// Record a key event as a hotkey string (`ctrl+alt+shift+meta+key` order).
/// Returns `None` for modifier-only presses and named keys like `Enter`.
pub fn hotkey_from_event(event: &KeyEvent) -> Option<String> {
    let mut chars = event.key.chars();
    let key = match (chars.next(), chars.next()) {
        (Some(key), None) => key,
        _ => return None,
    };
    if key.is_whitespace() || key == keyboard::COMBO_SEPARATOR {
        return None;
    }

    let key: String = key.to_lowercase().collect();
    let mut combo = String::new();
    format_combo(event.modifiers, key, &mut combo).ok()?;
    Some(combo)
}
