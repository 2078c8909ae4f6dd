//! Observable container for [`RuntimeState`]
//!
//! State is held as `Rc<RuntimeState>`. An update that hands back the very
//! same `Rc` is treated as "no change": nothing is stamped and nobody is
//! notified. Updaters should therefore return the input `Rc` untouched
//! when they have nothing to change.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::types::RuntimeState;

pub type StateListener = Rc<dyn Fn(&RuntimeState)>;

/// Source of "now" in milliseconds since the Unix epoch
pub type Clock = Rc<dyn Fn() -> u64>;

pub fn system_clock() -> Clock {
    Rc::new(|| {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    })
}

struct StoreInner {
    state: RefCell<Rc<RuntimeState>>,
    listeners: RefCell<Vec<(u64, StateListener)>>,
    next_id: Cell<u64>,
    clock: Clock,
}

/// Cheap-to-clone handle; all clones share one state
#[derive(Clone)]
pub struct Store {
    inner: Rc<StoreInner>,
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("state", &self.inner.state.borrow())
            .field("listeners", &self.inner.listeners.borrow().len())
            .finish()
    }
}

impl Store {
    /// Store with default state stamped with the current time
    pub fn new() -> Self {
        Self::with_clock(system_clock())
    }

    pub fn with_clock(clock: Clock) -> Self {
        let initial = RuntimeState::with_timestamp(clock());
        Self::with_state(initial, clock)
    }

    pub fn with_state(initial: RuntimeState, clock: Clock) -> Self {
        Self {
            inner: Rc::new(StoreInner {
                state: RefCell::new(Rc::new(initial)),
                listeners: RefCell::new(Vec::new()),
                next_id: Cell::new(0),
                clock,
            }),
        }
    }

    pub fn state(&self) -> Rc<RuntimeState> {
        Rc::clone(&self.inner.state.borrow())
    }

    /// Replace the state with a literal value
    pub fn set_state(&self, next: Rc<RuntimeState>) {
        self.update(move |_| next);
    }

    /// Derive the next state from the current one.
    /// Returning the same `Rc` is a no-op.
    pub fn update<F>(&self, updater: F)
    where
        F: FnOnce(&Rc<RuntimeState>) -> Rc<RuntimeState>,
    {
        let current = self.state();
        let next = updater(&current);
        if Rc::ptr_eq(&next, &current) {
            return;
        }

        let next = if next.timestamp == current.timestamp {
            let mut stamped = Rc::unwrap_or_clone(next);
            stamped.timestamp = (self.inner.clock)();
            Rc::new(stamped)
        } else {
            next
        };

        *self.inner.state.borrow_mut() = Rc::clone(&next);
        self.notify(&next);
    }

    fn notify(&self, state: &Rc<RuntimeState>) {
        let listeners: Vec<StateListener> = self
            .inner
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect();
        for listener in listeners {
            // A listener updated the store; the nested pass already
            // delivered the newer state to everyone.
            if !Rc::ptr_eq(&self.state(), state) {
                break;
            }
            listener(state);
        }
    }

    /// Register `listener` and call it once right away with the current state
    pub fn subscribe(&self, listener: StateListener) -> Subscription {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);
        self.inner
            .listeners
            .borrow_mut()
            .push((id, Rc::clone(&listener)));

        let current = self.state();
        listener(&current);

        Subscription {
            store: Rc::downgrade(&self.inner),
            id,
        }
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.borrow().len()
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

/// Removal capability returned by [`Store::subscribe`].
/// Dropping it does not unsubscribe.
#[derive(Debug, Clone)]
pub struct Subscription {
    store: Weak<StoreInner>,
    id: u64,
}

impl Subscription {
    /// Remove the listener. Safe to call more than once.
    pub fn unsubscribe(&self) {
        if let Some(inner) = self.store.upgrade() {
            inner.listeners.borrow_mut().retain(|(id, _)| *id != self.id);
        }
    }
}
