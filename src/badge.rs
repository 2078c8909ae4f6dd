//! Badge presentation: the props a renderer receives, the binding that keeps a
//! [`Presenter`] in sync with the store, and a plain-text renderer.

use std::cell::{Cell, RefCell};
use std::fmt::Write as _;
use std::io::Write;
use std::rc::{Rc, Weak};

use serde::Serialize;
use tracing::{trace, warn};

use crate::config::NormalizedBreakpoint;
use crate::state::{StateListener, Store, Subscription};
use crate::types::{RuntimeState, ViewportSnapshot};

/// Breakpoint as shown in the expanded badge
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BadgeBreakpoint {
    pub id: String,
    pub label: String,
    pub min_width: Option<f64>,
    pub max_width: Option<f64>,
}

impl From<&NormalizedBreakpoint> for BadgeBreakpoint {
    fn from(bp: &NormalizedBreakpoint) -> Self {
        Self {
            id: bp.id.clone(),
            label: bp.label.clone(),
            min_width: bp.min_width,
            max_width: bp.max_width,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BadgeProps {
    pub viewport: ViewportSnapshot,
    pub breakpoints: Vec<BadgeBreakpoint>,
    pub active_breakpoint_id: Option<String>,
    pub expanded: bool,
}

impl BadgeProps {
    pub fn active_breakpoint(&self) -> Option<&BadgeBreakpoint> {
        let id = self.active_breakpoint_id.as_deref()?;
        self.breakpoints.iter().find(|bp| bp.id == id)
    }
}

/// Callback a presenter invokes when the user asks to expand or collapse
pub type ExpandToggle = Rc<dyn Fn()>;

/// Renders the badge. Only called while the overlay is active.
pub trait Presenter {
    fn mount(&mut self, props: &BadgeProps, toggle: ExpandToggle);
    fn update(&mut self, props: &BadgeProps);
    fn unmount(&mut self);
}

/// Flip `badge.expanded` in `store`
pub fn toggle_expanded(store: &Store) {
    store.update(|state| {
        let mut next = (**state).clone();
        next.badge.expanded = !next.badge.expanded;
        Rc::new(next)
    });
}

pub fn format_viewport(viewport: &ViewportSnapshot) -> String {
    let w = viewport.width.round().max(0.0) as u64;
    let h = viewport.height.round().max(0.0) as u64;
    format!("{w}×{h}")
}

pub fn format_dpr(dpr: f64) -> String {
    if !dpr.is_finite() {
        return "1.0".to_string();
    }
    format!("{dpr:.1}")
}

pub fn format_range(bp: &BadgeBreakpoint) -> String {
    match (bp.min_width, bp.max_width) {
        (Some(min), Some(max)) => format!("{min}px–{max}px"),
        (Some(min), None) => format!("{min}px+"),
        (None, Some(max)) => format!("≤{max}px"),
        (None, None) => String::new(),
    }
}

struct BindingShared {
    store: Store,
    breakpoints: RefCell<Vec<BadgeBreakpoint>>,
    presenter: RefCell<Box<dyn Presenter>>,
    mounted: Cell<bool>,
    subscription: RefCell<Option<Subscription>>,
}

impl BindingShared {
    fn props(&self, state: &RuntimeState) -> BadgeProps {
        BadgeProps {
            viewport: state.viewport,
            breakpoints: self.breakpoints.borrow().clone(),
            active_breakpoint_id: state.breakpoint_id().map(str::to_owned),
            expanded: state.badge.expanded,
        }
    }

    fn sync(&self, state: &RuntimeState) {
        if state.active {
            self.render(state);
        } else {
            self.teardown();
        }
    }

    fn render(&self, state: &RuntimeState) {
        let props = self.props(state);
        // A presenter that toggles from inside mount/update re-enters here;
        // the outer call is already rendering.
        let Ok(mut presenter) = self.presenter.try_borrow_mut() else {
            trace!("skipping nested badge render");
            return;
        };
        if self.mounted.get() {
            presenter.update(&props);
        } else {
            let store = self.store.clone();
            presenter.mount(&props, Rc::new(move || toggle_expanded(&store)));
            self.mounted.set(true);
        }
    }

    fn teardown(&self) {
        if !self.mounted.get() {
            return;
        }
        let Ok(mut presenter) = self.presenter.try_borrow_mut() else {
            return;
        };
        presenter.unmount();
        self.mounted.set(false);
    }
}

/// Keeps one presenter in sync with a store
#[derive(Clone)]
pub struct BadgeBinding {
    shared: Rc<BindingShared>,
}

impl std::fmt::Debug for BadgeBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BadgeBinding")
            .field("mounted", &self.shared.mounted.get())
            .field("breakpoints", &self.shared.breakpoints.borrow().len())
            .finish()
    }
}

impl BadgeBinding {
    pub fn new(store: Store, breakpoints: &[NormalizedBreakpoint], presenter: Box<dyn Presenter>) -> Self {
        let shared = Rc::new(BindingShared {
            store,
            breakpoints: RefCell::new(breakpoints.iter().map(BadgeBreakpoint::from).collect()),
            presenter: RefCell::new(presenter),
            mounted: Cell::new(false),
            subscription: RefCell::new(None),
        });

        let weak: Weak<BindingShared> = Rc::downgrade(&shared);
        let listener: StateListener = Rc::new(move |state: &RuntimeState| {
            if let Some(shared) = weak.upgrade() {
                shared.sync(state);
            }
        });
        let subscription = shared.store.subscribe(listener);
        *shared.subscription.borrow_mut() = Some(subscription);

        Self { shared }
    }

    /// Swap in new breakpoints and re-render against the current state
    pub fn update_config(&self, breakpoints: &[NormalizedBreakpoint]) {
        *self.shared.breakpoints.borrow_mut() = breakpoints.iter().map(BadgeBreakpoint::from).collect();
        let state = self.shared.store.state();
        self.shared.sync(&state);
    }

    pub fn is_mounted(&self) -> bool {
        self.shared.mounted.get()
    }

    pub fn destroy(&self) {
        let subscription = self.shared.subscription.borrow_mut().take();
        if let Some(subscription) = subscription {
            subscription.unsubscribe();
        }
        self.shared.teardown();
    }
}

/// Presenter that writes the badge as text lines
pub struct TextBadge<W: Write> {
    out: W,
    last: Option<String>,
    toggle: Option<ExpandToggle>,
}

impl<W: Write> TextBadge<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            last: None,
            toggle: None,
        }
    }

    /// Act as if the user clicked the pill
    pub fn click(&self) {
        if let Some(toggle) = self.toggle.clone() {
            toggle();
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn render(props: &BadgeProps) -> String {
        let active = props.active_breakpoint();
        let indicator = if active.is_some() { '●' } else { '○' };
        let name = active.map_or("–", |bp| bp.label.as_str());

        let mut text = format!(
            "{indicator} {name}  {} @{}x",
            format_viewport(&props.viewport),
            format_dpr(props.viewport.device_pixel_ratio)
        );

        if props.expanded {
            if props.breakpoints.is_empty() {
                text.push_str("\n  No breakpoints configured");
            }
            for bp in &props.breakpoints {
                let marker = if Some(bp.id.as_str()) == props.active_breakpoint_id.as_deref() {
                    '>'
                } else {
                    ' '
                };
                let _ = write!(text, "\n  {marker} {}  {}", bp.label, format_range(bp));
            }
        }
        text
    }

    fn draw(&mut self, props: &BadgeProps) {
        let text = Self::render(props);
        if self.last.as_ref() == Some(&text) {
            return;
        }
        if let Err(e) = writeln!(self.out, "{text}") {
            warn!("failed to write badge: err={e}");
        }
        self.last = Some(text);
    }
}

impl<W: Write> Presenter for TextBadge<W> {
    fn mount(&mut self, props: &BadgeProps, toggle: ExpandToggle) {
        self.toggle = Some(toggle);
        self.last = None;
        self.draw(props);
    }

    fn update(&mut self, props: &BadgeProps) {
        self.draw(props);
    }

    fn unmount(&mut self) {
        self.toggle = None;
        self.last = None;
    }
}
