#![forbid(unsafe_code)]

//! Runtime engine for a responsive-design breakpoint overlay.
//!
//! Given a set of named viewport-width breakpoints, the overlay tracks the
//! host viewport, resolves which breakpoint is active and publishes the
//! result through an observable [`Store`]. A keyboard shortcut toggles it
//! and a [`Presenter`] can render the badge.
//!
//! ```no_run
//! use std::rc::Rc;
//! use breakpoint_overlay::{init_overlay, BreakpointInput, OverlayConfig, SimulatedHost, ViewportSnapshot};
//!
//! let host = SimulatedHost::new(ViewportSnapshot::new(1440.0, 900.0, 1.0));
//! let config = OverlayConfig::with_breakpoints(vec![
//!     BreakpointInput::max("mobile", 767.0),
//!     BreakpointInput::min("desktop", 1200.0),
//! ]);
//! let overlay = init_overlay(Some(&config), host.clone()).unwrap();
//! overlay.start();
//! assert_eq!(overlay.state().breakpoint_id(), Some("desktop"));
//! ```

pub mod badge;
pub mod breakpoints;
pub mod config;
pub mod constants;
pub mod host;
pub mod hotkeys;
pub mod registry;
pub mod replay;
pub mod runtime;
pub mod state;
pub mod types;
pub mod viewport;

use std::rc::Rc;

pub use badge::{BadgeBinding, BadgeProps, Presenter, TextBadge};
pub use breakpoints::resolve;
pub use config::{normalize, BreakpointInput, ConfigError, NormalizedBreakpoint, OverlayConfig, ResolvedConfig};
pub use host::{HeadlessHost, Host, SimulatedHost};
pub use hotkeys::{matches_hotkey, parse_hotkey, HotkeyBinding, HotkeyError, KeyEvent, KeyTarget, Modifiers};
pub use registry::OverlayRegistry;
pub use runtime::{OverlayError, OverlayHandle, RuntimeController};
pub use state::{Store, Subscription};
pub use types::{BreakpointMatch, MatchStrategy, RuntimeState, ViewportSnapshot};
pub use viewport::{frame_tracker_factory, FrameTracker, ViewportTracker};

/// Build an overlay for `host` using the frame-coalescing viewport tracker
pub fn init_overlay(config: Option<&OverlayConfig>, host: Rc<dyn Host>) -> Result<OverlayHandle, OverlayError> {
    let factory = frame_tracker_factory(Rc::clone(&host));
    RuntimeController::new(config, host, factory).map(OverlayHandle::new)
}
