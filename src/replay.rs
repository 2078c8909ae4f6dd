//! Scripted sessions against a [`SimulatedHost`]
//!
//! A script is a JSON array of steps, e.g.
//!
//! ```json
//! [
//!   { "op": "start" },
//!   { "op": "resize", "width": 500 },
//!   { "op": "frame" },
//!   { "op": "key", "key": "o", "code": "KeyO", "alt": true, "shift": true }
//! ]
//! ```
//!
//! Each step yields one [`ReplayLine`] carrying the state after the step.
//! Timestamps come from a step counter so transcripts are reproducible.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::badge::{format_viewport, Presenter};
use crate::config::OverlayConfig;
use crate::host::{Host, SimulatedHost};
use crate::hotkeys::{KeyEvent, KeyTarget, Modifiers};
use crate::runtime::{OverlayError, RuntimeController};
use crate::state::{Clock, Store};
use crate::types::{RuntimeState, ViewportSnapshot};
use crate::viewport::frame_tracker_factory;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum ReplayStep {
    Start,
    Stop,
    Toggle,
    /// Flip the badge's expanded flag, as a click on the pill would
    Expand,
    /// Change the viewport and fire a resize; nothing is read until `frame`
    Resize {
        width: f64,
        #[serde(default)]
        height: Option<f64>,
    },
    Frame,
    #[serde(rename_all = "camelCase")]
    Key {
        key: String,
        #[serde(default)]
        code: Option<String>,
        #[serde(default)]
        alt: bool,
        #[serde(default)]
        ctrl: bool,
        #[serde(default)]
        shift: bool,
        #[serde(default)]
        meta: bool,
        /// Tag name of the focused element
        #[serde(default)]
        target: Option<String>,
        #[serde(default)]
        content_editable: bool,
    },
    UpdateConfig {
        config: OverlayConfig,
    },
}

impl ReplayStep {
    fn describe(&self) -> String {
        match self {
            ReplayStep::Start => "start".to_string(),
            ReplayStep::Stop => "stop".to_string(),
            ReplayStep::Toggle => "toggle".to_string(),
            ReplayStep::Expand => "expand".to_string(),
            ReplayStep::Resize { width, height } => match height {
                Some(height) => format!("resize {width}x{height}"),
                None => format!("resize {width}"),
            },
            ReplayStep::Frame => "frame".to_string(),
            ReplayStep::Key { key, target, .. } => match target {
                Some(tag) => format!("key {key:?} in <{tag}>"),
                None => format!("key {key:?}"),
            },
            ReplayStep::UpdateConfig { .. } => "updateConfig".to_string(),
        }
    }

    fn key_event(&self) -> Option<KeyEvent> {
        let ReplayStep::Key {
            key,
            code,
            alt,
            ctrl,
            shift,
            meta,
            target,
            content_editable,
        } = self
        else {
            return None;
        };

        let modifiers = Modifiers {
            alt: *alt,
            ctrl: *ctrl,
            shift: *shift,
            meta: *meta,
        };
        let target = match (target, content_editable) {
            (Some(tag), editable) => KeyTarget::Element {
                tag: tag.clone(),
                content_editable: *editable,
            },
            (None, true) => KeyTarget::Element {
                tag: "div".to_string(),
                content_editable: true,
            },
            (None, false) => KeyTarget::Document,
        };
        Some(KeyEvent::new(key.clone(), code.as_deref(), modifiers).with_target(target))
    }
}

pub fn parse_script(json: &str) -> serde_json::Result<Vec<ReplayStep>> {
    serde_json::from_str(json)
}

/// Outcome of one step
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplayLine {
    pub step: usize,
    pub action: String,
    /// For `key` steps: whether the overlay consumed the event
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consumed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub state: RuntimeState,
}

impl fmt::Display for ReplayLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{:<3} {:<24} active={} breakpoint={} viewport={} expanded={}",
            self.step,
            self.action,
            self.state.active,
            self.state.breakpoint_id().unwrap_or("none"),
            format_viewport(&self.state.viewport),
            self.state.badge.expanded
        )?;
        if let Some(consumed) = self.consumed {
            write!(f, " consumed={consumed}")?;
        }
        if let Some(error) = &self.error {
            write!(f, " error={error:?}")?;
        }
        Ok(())
    }
}

/// A controller wired to a simulated host
pub struct ReplaySession {
    host: Rc<SimulatedHost>,
    controller: RuntimeController,
    tick: Rc<Cell<u64>>,
}

impl ReplaySession {
    pub fn new(config: Option<&OverlayConfig>, viewport: ViewportSnapshot) -> Result<Self, OverlayError> {
        let host = SimulatedHost::new(viewport);
        let tick = Rc::new(Cell::new(0));
        let clock_tick = Rc::clone(&tick);
        let clock: Clock = Rc::new(move || clock_tick.get());

        let controller = RuntimeController::with_store(
            config,
            host.clone(),
            frame_tracker_factory(host.clone()),
            Store::with_clock(clock),
        )?;
        Ok(Self {
            host,
            controller,
            tick,
        })
    }

    pub fn attach_presenter(&self, presenter: Box<dyn Presenter>) {
        self.controller.attach_presenter(presenter);
    }

    pub fn host(&self) -> &SimulatedHost {
        &self.host
    }

    pub fn controller(&self) -> &RuntimeController {
        &self.controller
    }

    pub fn apply(&self, index: usize, step: &ReplayStep) -> ReplayLine {
        self.tick.set(index as u64 + 1);
        debug!("replay step {index}: {step:?}");

        let mut consumed = None;
        let mut error = None;
        match step {
            ReplayStep::Start => self.controller.start(),
            ReplayStep::Stop => self.controller.stop(),
            ReplayStep::Toggle => self.controller.toggle(),
            ReplayStep::Expand => self.controller.toggle_badge_expanded(),
            ReplayStep::Resize { width, height } => {
                let height = height.unwrap_or_else(|| self.host.viewport().map_or(0.0, |v| v.height));
                self.host.resize_to(*width, height);
            }
            ReplayStep::Frame => {
                self.host.run_frame();
            }
            ReplayStep::Key { .. } => {
                if let Some(event) = step.key_event() {
                    consumed = Some(self.host.dispatch_key(&event));
                }
            }
            ReplayStep::UpdateConfig { config } => {
                if let Err(e) = self.controller.update_config(config) {
                    error = Some(e.to_string());
                }
            }
        }

        ReplayLine {
            step: index,
            action: step.describe(),
            consumed,
            error,
            state: (*self.controller.state()).clone(),
        }
    }

    pub fn run(&self, steps: &[ReplayStep]) -> Vec<ReplayLine> {
        steps
            .iter()
            .enumerate()
            .map(|(index, step)| self.apply(index, step))
            .collect()
    }
}
