//! Fan-out of section visibility to UI consumers.
//!
//! Consumers (nav indicator, section components) subscribe once and receive
//! an immutable snapshot after every mapper update.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

/// Visibility state as of one mapper update.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SectionSnapshot {
    /// The focused section, if any section is visible.
    pub active: Option<String>,
    /// Latest intersection ratio per section id, in `[0, 1]`.
    pub progress: BTreeMap<String, f64>,
}

impl SectionSnapshot {
    pub fn progress_of(&self, id: &str) -> f64 {
        self.progress.get(id).copied().unwrap_or(0.0)
    }
}

type Listener = Rc<dyn Fn(&SectionSnapshot)>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    listeners: Vec<(u64, Listener)>,
    last: Option<Rc<SectionSnapshot>>,
}

/// Observable of [`SectionSnapshot`]s.
///
/// Cloning yields another handle to the same subscriber list.
#[derive(Clone, Default)]
pub struct SectionPublisher {
    registry: Rc<RefCell<Registry>>,
}

impl fmt::Debug for SectionPublisher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.registry.borrow();
        f.debug_struct("SectionPublisher")
            .field("subscribers", &registry.listeners.len())
            .field("last", &registry.last)
            .finish()
    }
}

impl SectionPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `listener`. It stays registered until the returned
    /// [`Subscription`] is dropped or unsubscribed.
    pub fn subscribe(&self, listener: impl Fn(&SectionSnapshot) + 'static) -> Subscription {
        let mut registry = self.registry.borrow_mut();
        let id = registry.next_id;
        registry.next_id += 1;
        registry.listeners.push((id, Rc::new(listener)));
        Subscription {
            id,
            registry: Rc::downgrade(&self.registry),
        }
    }

    /// Stores `snapshot` as the latest and delivers it to every subscriber.
    ///
    /// Listeners run with no internal borrow held, so they may subscribe or
    /// unsubscribe while being notified.
    pub fn publish(&self, snapshot: SectionSnapshot) -> Rc<SectionSnapshot> {
        let snapshot = Rc::new(snapshot);
        let listeners: Vec<Listener> = {
            let mut registry = self.registry.borrow_mut();
            registry.last = Some(Rc::clone(&snapshot));
            registry
                .listeners
                .iter()
                .map(|(_, l)| Rc::clone(l))
                .collect()
        };
        for listener in listeners {
            listener(&snapshot);
        }
        snapshot
    }

    pub fn subscriber_count(&self) -> usize {
        self.registry.borrow().listeners.len()
    }

    pub fn last_snapshot(&self) -> Option<Rc<SectionSnapshot>> {
        self.registry.borrow().last.clone()
    }

    /// Drops every subscriber.
    pub fn clear(&self) {
        self.registry.borrow_mut().listeners.clear();
    }
}

/// Keeps a listener registered; dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    id: u64,
    registry: Weak<RefCell<Registry>>,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

impl Subscription {
    pub fn unsubscribe(self) {
        drop(self);
    }

    pub fn is_active(&self) -> bool {
        self.registry.upgrade().is_some_and(|registry| {
            registry
                .borrow()
                .listeners
                .iter()
                .any(|(id, _)| *id == self.id)
        })
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry
                .borrow_mut()
                .listeners
                .retain(|(id, _)| *id != self.id);
        }
    }
}
