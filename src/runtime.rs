//! Runtime controller: the overlay state machine
//!
//! Wires the viewport tracker, breakpoint resolver, hotkey and badge
//! bindings to one [`Store`]. Two externally visible states: inactive
//! (initial) and active.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::badge::{self, BadgeBinding, Presenter};
use crate::breakpoints::resolve;
use crate::config::{normalize, ConfigError, OverlayConfig, ResolvedConfig};
use crate::host::{Host, ListenerId};
use crate::hotkeys::{matches_hotkey, parse_hotkey, HotkeyBinding, HotkeyError, KeyEvent};
use crate::state::{StateListener, Store, Subscription};
use crate::types::{BadgeUiState, RuntimeState, ViewportSnapshot};
use crate::viewport::{TrackerFactory, ViewportListener, ViewportTracker};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum OverlayError {
    #[error("invalid overlay config: {0}")]
    Config(#[from] ConfigError),
    #[error("invalid hotkey: {0}")]
    Hotkey(#[from] HotkeyError),
    #[error("overlay has been destroyed")]
    Destroyed,
}

struct ControllerInner {
    host: Rc<dyn Host>,
    store: Store,
    config: RefCell<Rc<ResolvedConfig>>,
    tracker_factory: TrackerFactory,
    tracker: RefCell<Option<Rc<dyn ViewportTracker>>>,
    hotkey: RefCell<Option<HotkeyBinding>>,
    keydown: Cell<Option<ListenerId>>,
    badges: RefCell<Vec<BadgeBinding>>,
    /// Set while `start` waits for the tracker's first reading
    starting: Cell<bool>,
    destroyed: Cell<bool>,
}

impl ControllerInner {
    fn usable(&self, op: &str) -> bool {
        if self.destroyed.get() {
            warn!("ignoring {op} on a destroyed overlay");
            return false;
        }
        true
    }

    fn current_tracker(&self) -> Option<Rc<dyn ViewportTracker>> {
        self.tracker.borrow().clone()
    }

    fn ensure_tracker(self: &Rc<Self>) -> Rc<dyn ViewportTracker> {
        if let Some(tracker) = self.current_tracker() {
            return tracker;
        }

        let weak: Weak<Self> = Rc::downgrade(self);
        let listener: ViewportListener = Rc::new(move |snapshot: ViewportSnapshot| {
            if let Some(inner) = weak.upgrade() {
                let active = inner.starting.take().then_some(true);
                inner.recompute(snapshot, active);
            }
        });
        let tracker: Rc<dyn ViewportTracker> = Rc::from((self.tracker_factory)(listener));
        *self.tracker.borrow_mut() = Some(Rc::clone(&tracker));
        tracker
    }

    /// Resolve `snapshot` against the current config and publish it.
    /// `active` optionally flips the active flag in the same update.
    fn recompute(&self, snapshot: ViewportSnapshot, active: Option<bool>) {
        let config = Rc::clone(&self.config.borrow());
        let breakpoint = resolve(&snapshot, &config.breakpoints);
        self.store.update(move |state| {
            let active = active.unwrap_or(state.active);
            if state.active == active && state.viewport == snapshot && state.breakpoint == breakpoint {
                return Rc::clone(state);
            }
            Rc::new(RuntimeState {
                active,
                viewport: snapshot,
                breakpoint,
                ..(**state).clone()
            })
        });
    }

    fn start(self: &Rc<Self>) {
        if self.store.state().active {
            return;
        }
        let tracker = self.ensure_tracker();
        self.starting.set(true);
        tracker.start();
        // A tracker that emitted on start has already activated us, and a
        // listener may have stopped us again since.
        if self.starting.take() {
            self.recompute(tracker.snapshot(), Some(true));
        }

        let state = self.store.state();
        info!(
            "overlay started: viewport={}x{}, breakpoint={}",
            state.viewport.width,
            state.viewport.height,
            state.breakpoint_id().unwrap_or("none")
        );
    }

    fn stop(&self) {
        let was_active = self.store.state().active;
        self.store.update(|state| {
            if !state.active {
                return Rc::clone(state);
            }
            Rc::new(RuntimeState {
                active: false,
                badge: BadgeUiState { expanded: false },
                ..(**state).clone()
            })
        });

        if let Some(tracker) = self.current_tracker() {
            tracker.stop();
        }
        if was_active {
            info!("overlay stopped");
        }
    }

    fn toggle(self: &Rc<Self>) {
        if self.store.state().active {
            self.stop();
        } else {
            self.start();
        }
    }

    fn handle_key_event(self: &Rc<Self>, event: &KeyEvent) -> bool {
        let matched = matches_hotkey(event, self.hotkey.borrow().as_ref());
        if !matched || event.target.is_editable() {
            return false;
        }
        debug!("hotkey toggled overlay: key={:?}", event.key);
        self.toggle();
        true
    }

    fn remove_keydown(&self) {
        if let Some(id) = self.keydown.take() {
            self.host.remove_keydown_listener(id);
        }
    }

    /// Replace the keydown listener; none is installed without a binding
    fn install_keydown(self: &Rc<Self>) {
        self.remove_keydown();
        if self.hotkey.borrow().is_none() || !self.host.is_interactive() {
            return;
        }

        let weak: Weak<Self> = Rc::downgrade(self);
        let id = self.host.add_keydown_listener(Rc::new(move |event: &KeyEvent| {
            weak.upgrade()
                .is_some_and(|inner| !inner.destroyed.get() && inner.handle_key_event(event))
        }));
        self.keydown.set(Some(id));
    }

    fn update_config(self: &Rc<Self>, patch: &OverlayConfig) -> Result<(), OverlayError> {
        let config = normalize(Some(patch))?;
        let binding = parse_hotkey(&config.hotkey)?;

        let config = Rc::new(config);
        *self.config.borrow_mut() = Rc::clone(&config);
        *self.hotkey.borrow_mut() = binding;
        self.install_keydown();

        let badges = self.badges.borrow().clone();
        for badge in badges {
            badge.update_config(&config.breakpoints);
        }

        if let Some(tracker) = self.current_tracker() {
            self.recompute(tracker.snapshot(), None);
        }

        info!(
            "config updated: breakpoints={}, hotkey={:?}",
            config.breakpoints.len(),
            config.hotkey
        );
        Ok(())
    }

    fn destroy(&self) {
        self.destroyed.set(true);
        self.stop();
        self.remove_keydown();

        let badges = std::mem::take(&mut *self.badges.borrow_mut());
        for badge in badges {
            badge.destroy();
        }

        let tracker = self.tracker.borrow_mut().take();
        if let Some(tracker) = tracker {
            tracker.stop();
        }
        *self.hotkey.borrow_mut() = None;
        info!("overlay destroyed");
    }
}

/// Owns one overlay instance. Dropping it destroys the overlay.
pub struct RuntimeController {
    inner: Rc<ControllerInner>,
}

impl std::fmt::Debug for RuntimeController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeController")
            .field("state", &self.inner.store.state())
            .field("hotkey", &self.inner.hotkey.borrow())
            .field("destroyed", &self.inner.destroyed.get())
            .finish()
    }
}

impl RuntimeController {
    pub fn new(
        config: Option<&OverlayConfig>,
        host: Rc<dyn Host>,
        tracker_factory: TrackerFactory,
    ) -> Result<Self, OverlayError> {
        Self::with_store(config, host, tracker_factory, Store::new())
    }

    /// Like [`RuntimeController::new`] but publishing into `store`
    pub fn with_store(
        config: Option<&OverlayConfig>,
        host: Rc<dyn Host>,
        tracker_factory: TrackerFactory,
        store: Store,
    ) -> Result<Self, OverlayError> {
        let config = normalize(config)?;
        let hotkey = parse_hotkey(&config.hotkey)?;
        debug!(
            "creating overlay: breakpoints={}, hotkey={:?}, interactive={}",
            config.breakpoints.len(),
            config.hotkey,
            host.is_interactive()
        );

        let inner = Rc::new(ControllerInner {
            host,
            store,
            config: RefCell::new(Rc::new(config)),
            tracker_factory,
            tracker: RefCell::new(None),
            hotkey: RefCell::new(hotkey),
            keydown: Cell::new(None),
            badges: RefCell::new(Vec::new()),
            starting: Cell::new(false),
            destroyed: Cell::new(false),
        });
        inner.install_keydown();

        Ok(Self { inner })
    }

    pub fn start(&self) {
        if self.inner.usable("start") {
            self.inner.start();
        }
    }

    /// Safe to call before any `start`
    pub fn stop(&self) {
        if self.inner.usable("stop") {
            self.inner.stop();
        }
    }

    pub fn toggle(&self) {
        if self.inner.usable("toggle") {
            self.inner.toggle();
        }
    }

    /// Feed a keydown event directly. Returns whether it toggled the overlay,
    /// in which case the host should suppress the default action.
    pub fn handle_key_event(&self, event: &KeyEvent) -> bool {
        !self.inner.destroyed.get() && self.inner.handle_key_event(event)
    }

    /// Replace the configuration wholesale. On error nothing changes.
    pub fn update_config(&self, patch: &OverlayConfig) -> Result<(), OverlayError> {
        if !self.inner.usable("update_config") {
            return Err(OverlayError::Destroyed);
        }
        self.inner.update_config(patch)
    }

    pub fn toggle_badge_expanded(&self) {
        if self.inner.usable("toggle_badge_expanded") {
            badge::toggle_expanded(&self.inner.store);
        }
    }

    /// Bind `presenter` to this overlay's state
    pub fn attach_presenter(&self, presenter: Box<dyn Presenter>) -> Option<BadgeBinding> {
        if !self.inner.usable("attach_presenter") {
            return None;
        }
        let config = self.config();
        let binding = BadgeBinding::new(self.inner.store.clone(), &config.breakpoints, presenter);
        self.inner.badges.borrow_mut().push(binding.clone());
        Some(binding)
    }

    pub fn destroy(&self) {
        if self.inner.destroyed.get() {
            warn!("destroy called on an already destroyed overlay");
            return;
        }
        self.inner.destroy();
    }

    pub fn is_destroyed(&self) -> bool {
        self.inner.destroyed.get()
    }

    pub fn state(&self) -> Rc<RuntimeState> {
        self.inner.store.state()
    }

    pub fn subscribe(&self, listener: StateListener) -> Subscription {
        self.inner.store.subscribe(listener)
    }

    pub fn store(&self) -> &Store {
        &self.inner.store
    }

    pub fn config(&self) -> Rc<ResolvedConfig> {
        Rc::clone(&self.inner.config.borrow())
    }

    pub fn hotkey(&self) -> Option<HotkeyBinding> {
        self.inner.hotkey.borrow().clone()
    }
}

impl Drop for RuntimeController {
    fn drop(&mut self) {
        if !self.inner.destroyed.get() {
            self.inner.destroy();
        }
    }
}

/// The surface handed to embedders
#[derive(Debug)]
pub struct OverlayHandle {
    controller: RuntimeController,
}

impl OverlayHandle {
    pub fn new(controller: RuntimeController) -> Self {
        Self { controller }
    }

    pub fn start(&self) {
        self.controller.start();
    }

    pub fn stop(&self) {
        self.controller.stop();
    }

    pub fn toggle(&self) {
        self.controller.toggle();
    }

    pub fn update_config(&self, patch: &OverlayConfig) -> Result<(), OverlayError> {
        self.controller.update_config(patch)
    }

    pub fn state(&self) -> Rc<RuntimeState> {
        self.controller.state()
    }

    pub fn subscribe(&self, listener: StateListener) -> Subscription {
        self.controller.subscribe(listener)
    }

    pub fn toggle_badge_expanded(&self) {
        self.controller.toggle_badge_expanded();
    }

    pub fn attach_presenter(&self, presenter: Box<dyn Presenter>) -> Option<BadgeBinding> {
        self.controller.attach_presenter(presenter)
    }

    pub fn destroy(&self) {
        self.controller.destroy();
    }

    pub fn controller(&self) -> &RuntimeController {
        &self.controller
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BreakpointInput;
    use crate::host::{HeadlessHost, SimulatedHost};
    use crate::hotkeys::{KeyTarget, Modifiers};
    use crate::types::MatchStrategy;
    use crate::viewport::frame_tracker_factory;

    /// Tracker stand-in that emits only when told to
    #[derive(Clone)]
    struct ScriptedTracker {
        listener: ViewportListener,
        snapshot: Rc<Cell<ViewportSnapshot>>,
        running: Rc<Cell<bool>>,
        starts: Rc<Cell<u32>>,
    }

    impl ScriptedTracker {
        fn emit(&self, width: f64) {
            let snapshot = ViewportSnapshot::new(width, 800.0, 1.0);
            self.snapshot.set(snapshot);
            if self.running.get() {
                (self.listener)(snapshot);
            }
        }
    }

    impl ViewportTracker for ScriptedTracker {
        fn start(&self) {
            if !self.running.replace(true) {
                self.starts.set(self.starts.get() + 1);
                (self.listener)(self.snapshot.get());
            }
        }

        fn stop(&self) {
            self.running.set(false);
        }

        fn snapshot(&self) -> ViewportSnapshot {
            self.snapshot.get()
        }
    }

    type TrackerSlot = Rc<RefCell<Option<ScriptedTracker>>>;

    fn scripted_factory(width: f64) -> (TrackerFactory, TrackerSlot, Rc<Cell<u32>>) {
        let slot: TrackerSlot = Rc::new(RefCell::new(None));
        let created = Rc::new(Cell::new(0));
        let factory_slot = Rc::clone(&slot);
        let factory_created = Rc::clone(&created);
        let factory: TrackerFactory = Box::new(move |listener: ViewportListener| -> Box<dyn ViewportTracker> {
            factory_created.set(factory_created.get() + 1);
            let tracker = ScriptedTracker {
                listener,
                snapshot: Rc::new(Cell::new(ViewportSnapshot::new(width, 800.0, 1.0))),
                running: Rc::new(Cell::new(false)),
                starts: Rc::new(Cell::new(0)),
            };
            *factory_slot.borrow_mut() = Some(tracker.clone());
            Box::new(tracker)
        });
        (factory, slot, created)
    }

    fn two_breakpoints() -> OverlayConfig {
        OverlayConfig::with_breakpoints(vec![
            BreakpointInput::max("mobile", 767.0),
            BreakpointInput::min("desktop", 1200.0),
        ])
    }

    fn hotkey_event() -> KeyEvent {
        KeyEvent::new(
            "Ø",
            Some("KeyO"),
            Modifiers {
                alt: true,
                shift: true,
                ..Modifiers::default()
            },
        )
    }

    #[test]
    fn test_start_resolves_breakpoint_from_tracker() {
        let (factory, slot, created) = scripted_factory(1440.0);
        let controller = RuntimeController::new(Some(&two_breakpoints()), Rc::new(HeadlessHost), factory).unwrap();
        assert_eq!(created.get(), 0, "tracker must be created lazily");

        controller.start();
        let state = controller.state();
        assert!(state.active);
        assert_eq!(state.breakpoint_id(), Some("desktop"));

        let tracker = slot.borrow().clone().unwrap();
        tracker.emit(500.0);
        assert_eq!(controller.state().breakpoint_id(), Some("mobile"));
        tracker.emit(900.0);
        assert_eq!(controller.state().breakpoint, None);
        assert_eq!(controller.state().viewport.width, 900.0);
    }

    #[test]
    fn test_start_is_idempotent() {
        let (factory, slot, created) = scripted_factory(1440.0);
        let controller = RuntimeController::new(None, Rc::new(HeadlessHost), factory).unwrap();

        let notifications = Rc::new(Cell::new(0));
        let counter = Rc::clone(&notifications);
        controller.subscribe(Rc::new(move |_: &RuntimeState| counter.set(counter.get() + 1)));

        controller.start();
        let after_first = notifications.get();
        let state = controller.state();
        controller.start();

        assert_eq!(created.get(), 1);
        assert_eq!(slot.borrow().as_ref().unwrap().starts.get(), 1);
        assert_eq!(notifications.get(), after_first);
        assert!(Rc::ptr_eq(&state, &controller.state()));
    }

    #[test]
    fn test_stop_before_start_is_harmless() {
        let (factory, _slot, created) = scripted_factory(1440.0);
        let controller = RuntimeController::new(None, Rc::new(HeadlessHost), factory).unwrap();
        let before = controller.state();

        controller.stop();
        assert!(!controller.state().active);
        assert!(Rc::ptr_eq(&before, &controller.state()));
        assert_eq!(created.get(), 0);
    }

    #[test]
    fn test_stop_collapses_badge_and_keeps_last_reading() {
        let (factory, slot, _) = scripted_factory(1440.0);
        let controller = RuntimeController::new(Some(&two_breakpoints()), Rc::new(HeadlessHost), factory).unwrap();
        controller.start();
        controller.toggle_badge_expanded();
        assert!(controller.state().badge.expanded);

        controller.stop();
        let state = controller.state();
        assert!(!state.active);
        assert!(!state.badge.expanded);
        assert_eq!(state.breakpoint_id(), Some("desktop"));
        assert_eq!(state.viewport.width, 1440.0);

        slot.borrow().as_ref().unwrap().emit(500.0);
        assert_eq!(controller.state().breakpoint_id(), Some("desktop"));
    }

    #[test]
    fn test_toggle_alternates() {
        let (factory, _slot, _) = scripted_factory(1440.0);
        let controller = RuntimeController::new(None, Rc::new(HeadlessHost), factory).unwrap();
        controller.toggle();
        assert!(controller.state().active);
        controller.toggle();
        assert!(!controller.state().active);
    }

    #[test]
    fn test_rejected_update_leaves_config_untouched() {
        let (factory, _slot, _) = scripted_factory(1440.0);
        let controller = RuntimeController::new(Some(&two_breakpoints()), Rc::new(HeadlessHost), factory).unwrap();
        controller.start();
        let before_config = controller.config();
        let before_hotkey = controller.hotkey();

        let patch = OverlayConfig {
            match_strategy: Some(MatchStrategy::MinWidth),
            ..OverlayConfig::with_breakpoints(vec![BreakpointInput::max("mobile", 767.0)])
        };
        let err = controller.update_config(&patch).unwrap_err();
        assert!(matches!(err, OverlayError::Config(ConfigError::StrategyMismatch { .. })));

        let bad_hotkey = OverlayConfig {
            hotkey: Some("ctrl+k+o".into()),
            ..OverlayConfig::default()
        };
        let err = controller.update_config(&bad_hotkey).unwrap_err();
        assert!(matches!(err, OverlayError::Hotkey(HotkeyError::MultipleKeys { .. })));

        assert!(Rc::ptr_eq(&before_config, &controller.config()));
        assert_eq!(controller.hotkey(), before_hotkey);
        assert_eq!(controller.state().breakpoint_id(), Some("desktop"));
    }

    #[test]
    fn test_update_config_recomputes_immediately() {
        let (factory, _slot, _) = scripted_factory(1440.0);
        let controller = RuntimeController::new(Some(&two_breakpoints()), Rc::new(HeadlessHost), factory).unwrap();
        controller.start();

        let patch = OverlayConfig::with_breakpoints(vec![BreakpointInput::range("wide", 1400.0, 1600.0)]);
        controller.update_config(&patch).unwrap();
        assert_eq!(controller.state().breakpoint_id(), Some("wide"));
    }

    #[test]
    fn test_update_config_without_tracker_only_swaps_config() {
        let (factory, _slot, created) = scripted_factory(1440.0);
        let controller = RuntimeController::new(None, Rc::new(HeadlessHost), factory).unwrap();
        controller
            .update_config(&OverlayConfig::with_breakpoints(vec![BreakpointInput::min("any", 0.0)]))
            .unwrap();

        assert_eq!(created.get(), 0);
        assert_eq!(controller.state().breakpoint, None);
        assert_eq!(controller.config().breakpoints.len(), 1);
    }

    #[test]
    fn test_constructor_rejects_bad_hotkey() {
        let (factory, _, _) = scripted_factory(1440.0);
        let config = OverlayConfig {
            hotkey: Some("alt+enter".into()),
            ..OverlayConfig::default()
        };
        let err = RuntimeController::new(Some(&config), Rc::new(HeadlessHost), factory).unwrap_err();
        assert!(matches!(err, OverlayError::Hotkey(HotkeyError::KeyTooLong { .. })));
    }

    #[test]
    fn test_hotkey_listener_lifecycle() {
        let host = SimulatedHost::new(ViewportSnapshot::new(1440.0, 900.0, 1.0));
        let controller =
            RuntimeController::new(None, host.clone(), frame_tracker_factory(host.clone())).unwrap();
        assert_eq!(host.keydown_listener_count(), 1);

        for hotkey in ["ctrl+k", "", "meta+b"] {
            let patch = OverlayConfig {
                hotkey: Some(hotkey.into()),
                ..OverlayConfig::default()
            };
            controller.update_config(&patch).unwrap();
            let expected = usize::from(!hotkey.is_empty());
            assert_eq!(host.keydown_listener_count(), expected, "hotkey {hotkey:?}");
        }

        controller.destroy();
        assert_eq!(host.keydown_listener_count(), 0);
    }

    #[test]
    fn test_hotkey_toggles_unless_typing() {
        let host = SimulatedHost::new(ViewportSnapshot::new(1440.0, 900.0, 1.0));
        let controller = RuntimeController::new(
            Some(&two_breakpoints()),
            host.clone(),
            frame_tracker_factory(host.clone()),
        )
        .unwrap();

        assert!(host.dispatch_key(&hotkey_event()));
        assert!(controller.state().active);

        for target in [
            KeyTarget::element("INPUT"),
            KeyTarget::element("textarea"),
            KeyTarget::element("select"),
            KeyTarget::Element {
                tag: "div".into(),
                content_editable: true,
            },
        ] {
            assert!(!host.dispatch_key(&hotkey_event().with_target(target)));
            assert!(controller.state().active);
        }

        let with_ctrl = KeyEvent::new(
            "o",
            Some("KeyO"),
            Modifiers {
                alt: true,
                shift: true,
                ctrl: true,
                meta: false,
            },
        );
        assert!(!host.dispatch_key(&with_ctrl));

        assert!(controller.handle_key_event(&hotkey_event()));
        assert!(!controller.state().active);
    }

    #[test]
    fn test_headless_host_gets_no_keydown_listener() {
        let host = Rc::new(HeadlessHost);
        let controller = RuntimeController::new(None, host.clone(), frame_tracker_factory(host)).unwrap();
        controller.start();

        let state = controller.state();
        assert!(state.active);
        assert_eq!(state.viewport, ViewportSnapshot::FALLBACK);
        assert!(controller.handle_key_event(&hotkey_event()));
    }

    #[test]
    fn test_destroy_releases_everything_once() {
        let host = SimulatedHost::new(ViewportSnapshot::new(1440.0, 900.0, 1.0));
        let controller = RuntimeController::new(None, host.clone(), frame_tracker_factory(host.clone())).unwrap();
        controller.start();
        host.resize_to(1000.0, 900.0);
        assert_eq!(host.resize_listener_count(), 1);
        assert_eq!(host.pending_frame_count(), 1);

        controller.destroy();
        controller.destroy();
        assert!(controller.is_destroyed());
        assert!(!controller.state().active);
        assert_eq!(host.resize_listener_count(), 0);
        assert_eq!(host.pending_frame_count(), 0);
        assert_eq!(host.keydown_listener_count(), 0);

        controller.start();
        assert!(!controller.state().active);
        assert_eq!(
            controller.update_config(&OverlayConfig::default()),
            Err(OverlayError::Destroyed)
        );
    }

    #[test]
    fn test_drop_detaches_from_host() {
        let host = SimulatedHost::new(ViewportSnapshot::new(1440.0, 900.0, 1.0));
        {
            let controller =
                RuntimeController::new(None, host.clone(), frame_tracker_factory(host.clone())).unwrap();
            controller.start();
            host.dispatch_resize();
        }
        assert_eq!(host.resize_listener_count(), 0);
        assert_eq!(host.keydown_listener_count(), 0);
        assert_eq!(host.pending_frame_count(), 0);
    }

    #[test]
    fn test_listener_may_stop_from_inside_notification() {
        let host = SimulatedHost::new(ViewportSnapshot::new(1440.0, 900.0, 1.0));
        let controller = Rc::new(
            RuntimeController::new(Some(&two_breakpoints()), host.clone(), frame_tracker_factory(host.clone()))
                .unwrap(),
        );

        let weak = Rc::downgrade(&controller);
        controller.subscribe(Rc::new(move |state: &RuntimeState| {
            if state.active
                && state.breakpoint_id() == Some("mobile")
                && let Some(controller) = weak.upgrade()
            {
                controller.stop();
            }
        }));

        controller.start();
        host.resize_to(500.0, 900.0);
        host.run_frame();
        assert!(!controller.state().active);
        assert_eq!(controller.state().breakpoint_id(), Some("mobile"));
    }

    #[derive(Default)]
    struct MountCounter {
        mounts: Rc<Cell<u32>>,
        mounted: Rc<Cell<bool>>,
    }

    impl Presenter for MountCounter {
        fn mount(&mut self, _: &badge::BadgeProps, _: badge::ExpandToggle) {
            self.mounts.set(self.mounts.get() + 1);
            self.mounted.set(true);
        }

        fn update(&mut self, _: &badge::BadgeProps) {}

        fn unmount(&mut self) {
            self.mounted.set(false);
        }
    }

    #[test]
    fn test_stop_from_listener_reaches_later_subscribers() {
        let host = SimulatedHost::new(ViewportSnapshot::new(1440.0, 900.0, 1.0));
        let controller = Rc::new(
            RuntimeController::new(Some(&two_breakpoints()), host.clone(), frame_tracker_factory(host.clone()))
                .unwrap(),
        );

        let weak = Rc::downgrade(&controller);
        controller.subscribe(Rc::new(move |state: &RuntimeState| {
            if state.active
                && state.breakpoint_id() == Some("mobile")
                && let Some(controller) = weak.upgrade()
            {
                controller.stop();
            }
        }));
        let last_active = Rc::new(Cell::new(None));
        let sink = Rc::clone(&last_active);
        controller.subscribe(Rc::new(move |state: &RuntimeState| sink.set(Some(state.active))));
        let presenter = MountCounter::default();
        let mounted = Rc::clone(&presenter.mounted);
        let binding = controller.attach_presenter(Box::new(presenter)).unwrap();

        controller.start();
        assert!(mounted.get());

        host.resize_to(500.0, 900.0);
        host.run_frame();
        assert!(!controller.state().active);
        assert_eq!(last_active.get(), Some(false));
        assert!(!mounted.get());
        assert!(!binding.is_mounted());
    }

    #[test]
    fn test_stop_during_start_leaks_no_resize_listener() {
        let host = SimulatedHost::new(ViewportSnapshot::new(500.0, 900.0, 1.0));
        let controller = Rc::new(
            RuntimeController::new(Some(&two_breakpoints()), host.clone(), frame_tracker_factory(host.clone()))
                .unwrap(),
        );

        let weak = Rc::downgrade(&controller);
        controller.subscribe(Rc::new(move |state: &RuntimeState| {
            if state.breakpoint_id() == Some("mobile")
                && let Some(controller) = weak.upgrade()
            {
                controller.stop();
            }
        }));

        for _ in 0..2 {
            controller.start();
            assert!(!controller.state().active);
            assert_eq!(host.resize_listener_count(), 0);
            controller.stop();
            assert_eq!(host.resize_listener_count(), 0);
        }
    }

    #[test]
    fn test_start_publishes_reading_and_active_together() {
        let host = SimulatedHost::new(ViewportSnapshot::new(500.0, 900.0, 1.0));
        let controller =
            RuntimeController::new(Some(&two_breakpoints()), host.clone(), frame_tracker_factory(host.clone()))
                .unwrap();

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        controller.subscribe(Rc::new(move |state: &RuntimeState| {
            sink.borrow_mut()
                .push((state.active, state.breakpoint_id().map(str::to_owned)));
        }));
        let presenter = MountCounter::default();
        let mounts = Rc::clone(&presenter.mounts);
        controller.attach_presenter(Box::new(presenter)).unwrap();
        seen.borrow_mut().clear();

        controller.start();
        assert_eq!(*seen.borrow(), [(true, Some("mobile".to_string()))]);
        assert_eq!(mounts.get(), 1);
    }
}
