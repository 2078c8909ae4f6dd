//! Deterministic in-memory host
//!
//! Holds a settable viewport and queues of listeners and frame callbacks.
//! Nothing happens until the owner dispatches: `resize_to`/`dispatch_resize`
//! fire resize listeners, `run_frame` advances one paint, `dispatch_key`
//! delivers a keydown. Used by the test-suite and the `replay` command.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tracing::trace;

use super::{FrameCallback, FrameScheduler, FrameToken, Host, KeyListener, ListenerId, ResizeListener};
use crate::hotkeys::KeyEvent;
use crate::types::ViewportSnapshot;

#[derive(Default)]
struct Registry {
    resize: Vec<(ListenerId, ResizeListener)>,
    keydown: Vec<(ListenerId, KeyListener)>,
    frames: Vec<(FrameToken, FrameCallback)>,
}

pub struct SimulatedHost {
    viewport: Cell<ViewportSnapshot>,
    next_id: Cell<u64>,
    registry: RefCell<Registry>,
    frames_run: Cell<u64>,
}

impl std::fmt::Debug for SimulatedHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulatedHost")
            .field("viewport", &self.viewport.get())
            .field("resize_listeners", &self.resize_listener_count())
            .field("keydown_listeners", &self.keydown_listener_count())
            .field("pending_frames", &self.pending_frame_count())
            .finish()
    }
}

impl SimulatedHost {
    pub fn new(viewport: ViewportSnapshot) -> Rc<Self> {
        Rc::new(Self {
            viewport: Cell::new(viewport.sanitized()),
            next_id: Cell::new(1),
            registry: RefCell::new(Registry::default()),
            frames_run: Cell::new(0),
        })
    }

    fn next_id(&self) -> u64 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id
    }

    /// Change the viewport without notifying anyone
    pub fn set_viewport(&self, viewport: ViewportSnapshot) {
        self.viewport.set(viewport.sanitized());
    }

    /// Change width/height (keeping the pixel ratio) and fire a resize
    pub fn resize_to(&self, width: f64, height: f64) {
        let current = self.viewport.get();
        self.set_viewport(ViewportSnapshot::new(width, height, current.device_pixel_ratio));
        self.dispatch_resize();
    }

    pub fn dispatch_resize(&self) {
        let listeners: Vec<ResizeListener> = self
            .registry
            .borrow()
            .resize
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect();
        trace!(listeners = listeners.len(), "Dispatching resize");
        for listener in listeners {
            listener();
        }
    }

    /// Run every frame callback queued before this call.
    /// Callbacks requested while running land in the next frame.
    pub fn run_frame(&self) -> usize {
        let frames = std::mem::take(&mut self.registry.borrow_mut().frames);
        let count = frames.len();
        self.frames_run.set(self.frames_run.get() + 1);
        for (_, callback) in frames {
            callback();
        }
        count
    }

    /// Deliver a keydown; returns whether any listener consumed it
    pub fn dispatch_key(&self, event: &KeyEvent) -> bool {
        let listeners: Vec<KeyListener> = self
            .registry
            .borrow()
            .keydown
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect();
        let mut consumed = false;
        for listener in listeners {
            consumed |= listener(event);
        }
        consumed
    }

    pub fn resize_listener_count(&self) -> usize {
        self.registry.borrow().resize.len()
    }

    pub fn keydown_listener_count(&self) -> usize {
        self.registry.borrow().keydown.len()
    }

    pub fn pending_frame_count(&self) -> usize {
        self.registry.borrow().frames.len()
    }

    pub fn frames_run(&self) -> u64 {
        self.frames_run.get()
    }
}

impl FrameScheduler for SimulatedHost {
    fn request_frame(&self, callback: FrameCallback) -> FrameToken {
        let token = FrameToken(self.next_id());
        self.registry.borrow_mut().frames.push((token, callback));
        token
    }

    fn cancel_frame(&self, token: FrameToken) {
        self.registry.borrow_mut().frames.retain(|(t, _)| *t != token);
    }
}

impl Host for SimulatedHost {
    fn viewport(&self) -> Option<ViewportSnapshot> {
        Some(self.viewport.get())
    }

    fn add_resize_listener(&self, listener: ResizeListener) -> ListenerId {
        let id = ListenerId(self.next_id());
        self.registry.borrow_mut().resize.push((id, listener));
        id
    }

    fn remove_resize_listener(&self, id: ListenerId) {
        self.registry.borrow_mut().resize.retain(|(i, _)| *i != id);
    }

    fn add_keydown_listener(&self, listener: KeyListener) -> ListenerId {
        let id = ListenerId(self.next_id());
        self.registry.borrow_mut().keydown.push((id, listener));
        id
    }

    fn remove_keydown_listener(&self, id: ListenerId) {
        self.registry.borrow_mut().keydown.retain(|(i, _)| *i != id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hotkeys::Modifiers;

    #[test]
    fn test_frames_run_only_when_advanced() {
        let host = SimulatedHost::new(ViewportSnapshot::new(800.0, 600.0, 1.0));
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        host.request_frame(Box::new(move || counter.set(counter.get() + 1)));

        assert_eq!(hits.get(), 0);
        assert_eq!(host.run_frame(), 1);
        assert_eq!(hits.get(), 1);
        assert_eq!(host.run_frame(), 0);
    }

    #[test]
    fn test_cancelled_frame_never_runs() {
        let host = SimulatedHost::new(ViewportSnapshot::FALLBACK);
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        let token = host.request_frame(Box::new(move || counter.set(counter.get() + 1)));
        host.cancel_frame(token);

        assert_eq!(host.pending_frame_count(), 0);
        host.run_frame();
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn test_frame_requested_during_frame_waits() {
        let host = SimulatedHost::new(ViewportSnapshot::FALLBACK);
        let inner_host = Rc::clone(&host);
        host.request_frame(Box::new(move || {
            inner_host.request_frame(Box::new(|| {}));
        }));

        assert_eq!(host.run_frame(), 1);
        assert_eq!(host.pending_frame_count(), 1);
    }

    #[test]
    fn test_listener_may_reenter_host() {
        let host = SimulatedHost::new(ViewportSnapshot::FALLBACK);
        let inner_host = Rc::clone(&host);
        host.add_keydown_listener(Rc::new(move |_: &KeyEvent| {
            inner_host.add_resize_listener(Rc::new(|| {}));
            true
        }));

        assert!(host.dispatch_key(&KeyEvent::new("a", None, Modifiers::default())));
        assert_eq!(host.resize_listener_count(), 1);
    }

    #[test]
    fn test_resize_to_keeps_pixel_ratio() {
        let host = SimulatedHost::new(ViewportSnapshot::new(800.0, 600.0, 2.0));
        host.resize_to(1024.0, 768.0);
        assert_eq!(host.viewport(), Some(ViewportSnapshot::new(1024.0, 768.0, 2.0)));
    }
}
