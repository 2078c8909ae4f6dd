//! Display environment abstraction
//!
//! The runtime never touches a concrete window system. Everything it needs
//! from the embedding environment (viewport size, resize and keydown
//! notifications, per-frame scheduling) goes through [`Host`].
//!
//! All hosts are single-threaded. Callbacks are plain `Rc` closures and may
//! re-enter the host (e.g. a keydown listener that registers a resize
//! listener), so implementations must not hold internal borrows while
//! invoking them.

mod simulated;

pub use simulated::SimulatedHost;

use std::rc::Rc;

use crate::hotkeys::KeyEvent;
use crate::types::ViewportSnapshot;

/// Handle for a registered resize or keydown listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Handle for a requested frame callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameToken(pub u64);

pub type ResizeListener = Rc<dyn Fn()>;

/// Returns `true` when the event was consumed (the host should suppress
/// its default action)
pub type KeyListener = Rc<dyn Fn(&KeyEvent) -> bool>;

pub type FrameCallback = Box<dyn FnOnce()>;

/// Schedules work for the host's next paint
pub trait FrameScheduler {
    /// Queue `callback` for the next frame. Must never run it synchronously.
    fn request_frame(&self, callback: FrameCallback) -> FrameToken;

    /// Drop a queued callback. Unknown or already-run tokens are ignored.
    fn cancel_frame(&self, token: FrameToken);
}

/// The embedding environment
pub trait Host: FrameScheduler {
    /// Current viewport, or `None` in a non-interactive context
    fn viewport(&self) -> Option<ViewportSnapshot>;

    fn add_resize_listener(&self, listener: ResizeListener) -> ListenerId;
    fn remove_resize_listener(&self, id: ListenerId);

    fn add_keydown_listener(&self, listener: KeyListener) -> ListenerId;
    fn remove_keydown_listener(&self, id: ListenerId);

    /// Whether a display environment exists at all
    fn is_interactive(&self) -> bool {
        self.viewport().is_some()
    }
}

/// Host for non-interactive execution: no viewport, nothing is ever delivered
#[derive(Debug, Default, Clone, Copy)]
pub struct HeadlessHost;

impl FrameScheduler for HeadlessHost {
    fn request_frame(&self, _callback: FrameCallback) -> FrameToken {
        FrameToken(0)
    }

    fn cancel_frame(&self, _token: FrameToken) {}
}

impl Host for HeadlessHost {
    fn viewport(&self) -> Option<ViewportSnapshot> {
        None
    }

    fn add_resize_listener(&self, _listener: ResizeListener) -> ListenerId {
        ListenerId(0)
    }

    fn remove_resize_listener(&self, _id: ListenerId) {}

    fn add_keydown_listener(&self, _listener: KeyListener) -> ListenerId {
        ListenerId(0)
    }

    fn remove_keydown_listener(&self, _id: ListenerId) {}
}
