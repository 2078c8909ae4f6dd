//! Viewport tracking with per-frame coalescing
//!
//! A resize burst cancels and re-requests a single frame callback, so the
//! listener sees at most one snapshot per paint no matter how many resize
//! notifications arrive in between.

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use tracing::{debug, trace};

use crate::host::{FrameToken, Host, ListenerId};
use crate::types::ViewportSnapshot;

pub type ViewportListener = Rc<dyn Fn(ViewportSnapshot)>;

pub trait ViewportTracker {
    /// Begin observing. Idempotent.
    fn start(&self);
    /// Stop observing and drop any pending work. Idempotent.
    fn stop(&self);
    /// Most recently emitted (or initial) snapshot
    fn snapshot(&self) -> ViewportSnapshot;
}

/// Builds a tracker bound to a listener; injected into the runtime
pub type TrackerFactory = Box<dyn Fn(ViewportListener) -> Box<dyn ViewportTracker>>;

/// Factory producing [`FrameTracker`]s for `host`
pub fn frame_tracker_factory(host: Rc<dyn Host>) -> TrackerFactory {
    Box::new(move |listener: ViewportListener| -> Box<dyn ViewportTracker> {
        Box::new(FrameTracker::new(Rc::clone(&host), listener))
    })
}

#[derive(Debug)]
struct TrackerState {
    snapshot: ViewportSnapshot,
    running: bool,
    pending: Option<FrameToken>,
    resize: Option<ListenerId>,
}

struct TrackerInner {
    host: Rc<dyn Host>,
    listener: ViewportListener,
    state: RefCell<TrackerState>,
}

impl TrackerInner {
    fn read(&self) -> ViewportSnapshot {
        self.host
            .viewport()
            .map_or(ViewportSnapshot::FALLBACK, ViewportSnapshot::sanitized)
    }

    fn emit(&self) {
        let snapshot = self.read();
        self.state.borrow_mut().snapshot = snapshot;
        trace!(width = snapshot.width, height = snapshot.height, "Viewport snapshot");
        (self.listener)(snapshot);
    }

    /// Replace any pending frame with a fresh one
    fn schedule(self: &Rc<Self>) {
        let previous = self.state.borrow_mut().pending.take();
        if let Some(token) = previous {
            self.host.cancel_frame(token);
        }

        let weak = Rc::downgrade(self);
        let token = self.host.request_frame(Box::new(move || {
            let Some(inner) = weak.upgrade() else { return };
            let running = {
                let mut state = inner.state.borrow_mut();
                state.pending = None;
                state.running
            };
            if running {
                inner.emit();
            }
        }));
        self.state.borrow_mut().pending = Some(token);
    }
}

/// Tracker driven by host resize notifications and frame callbacks
pub struct FrameTracker {
    inner: Rc<TrackerInner>,
}

impl FrameTracker {
    pub fn new(host: Rc<dyn Host>, listener: ViewportListener) -> Self {
        let snapshot = host
            .viewport()
            .map_or(ViewportSnapshot::FALLBACK, ViewportSnapshot::sanitized);
        Self {
            inner: Rc::new(TrackerInner {
                host,
                listener,
                state: RefCell::new(TrackerState {
                    snapshot,
                    running: false,
                    pending: None,
                    resize: None,
                }),
            }),
        }
    }

    pub fn is_running(&self) -> bool {
        self.inner.state.borrow().running
    }

    pub fn has_pending_frame(&self) -> bool {
        self.inner.state.borrow().pending.is_some()
    }
}

impl ViewportTracker for FrameTracker {
    fn start(&self) {
        if self.is_running() || !self.inner.host.is_interactive() {
            return;
        }
        let weak: Weak<TrackerInner> = Rc::downgrade(&self.inner);
        let id = self.inner.host.add_resize_listener(Rc::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.schedule();
            }
        }));
        {
            let mut state = self.inner.state.borrow_mut();
            state.running = true;
            state.resize = Some(id);
        }
        debug!("Viewport tracking started");

        // The listener may stop us from in here; the resize id is already
        // recorded so `stop` can detach it.
        self.inner.emit();
    }

    fn stop(&self) {
        let (pending, resize) = {
            let mut state = self.inner.state.borrow_mut();
            if !state.running {
                return;
            }
            state.running = false;
            (state.pending.take(), state.resize.take())
        };

        if let Some(id) = resize {
            self.inner.host.remove_resize_listener(id);
        }
        if let Some(token) = pending {
            self.inner.host.cancel_frame(token);
        }
        debug!("Viewport tracking stopped");
    }

    fn snapshot(&self) -> ViewportSnapshot {
        self.inner.state.borrow().snapshot
    }
}

impl Drop for FrameTracker {
    fn drop(&mut self) {
        self.stop();
    }
}
