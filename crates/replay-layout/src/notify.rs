#![forbid(unsafe_code)]

//! Layout change listeners.
//!
//! Listeners are held weakly: the caller keeps the strong side inside a
//! [`Subscription`] guard, and dropping the guard silences the callback.
//! Dead entries are pruned lazily on the next notification.
//!
//! # Failure Modes
//!
//! - **Re-entrant mutation**: callbacks run after the engine has released its
//!   internal borrow, so a listener may query the engine or even trigger a
//!   new layout. The nested notification is delivered before the outer one
//!   finishes iterating.

use std::rc::{Rc, Weak};

use replay_core::logging::trace;
use web_time::Instant;

use crate::solver::Layout;

type ListenerRc = Rc<dyn Fn(&Layout)>;
type ListenerWeak = Weak<dyn Fn(&Layout)>;

/// Registered listeners in subscription order.
#[derive(Default)]
pub(crate) struct Listeners {
    entries: Vec<ListenerWeak>,
}

impl Listeners {
    pub(crate) fn subscribe(&mut self, callback: impl Fn(&Layout) + 'static) -> Subscription {
        let strong: ListenerRc = Rc::new(callback);
        self.entries.push(Rc::downgrade(&strong));
        Subscription {
            _guard: Box::new(strong),
        }
    }

    /// Prune dead entries and return the live ones.
    ///
    /// Callers invoke the returned callbacks only after releasing any borrow
    /// of the state that owns this set.
    pub(crate) fn live(&mut self) -> Vec<ListenerRc> {
        self.entries.retain(|w| w.strong_count() > 0);
        self.entries.iter().filter_map(Weak::upgrade).collect()
    }

    /// Number of entries, including dead ones not yet pruned.
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

impl std::fmt::Debug for Listeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listeners")
            .field("count", &self.entries.len())
            .finish()
    }
}

/// Deliver `layout` to every callback in order.
pub(crate) fn deliver(callbacks: &[ListenerRc], layout: &Layout) {
    if callbacks.is_empty() {
        return;
    }
    let start = Instant::now();
    for callback in callbacks {
        callback(layout);
    }
    trace!(
        listeners = callbacks.len(),
        duration_us = start.elapsed().as_micros() as u64,
        "layout delivered"
    );
}

/// RAII guard for a layout listener.
///
/// Dropping the guard drops the only strong reference to the callback, so it
/// is never invoked again.
pub struct Subscription {
    _guard: Box<dyn std::any::Any>,
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    use replay_core::geometry::Axis;

    #[test]
    fn dropped_subscription_is_pruned() {
        let mut listeners = Listeners::default();
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        let guard = listeners.subscribe(move |_| counter.set(counter.get() + 1));

        let layout = Layout::empty(Axis::Horizontal, 10);
        deliver(&listeners.live(), &layout);
        assert_eq!(hits.get(), 1);

        drop(guard);
        assert_eq!(listeners.len(), 1);
        deliver(&listeners.live(), &layout);
        assert_eq!(hits.get(), 1);
        assert_eq!(listeners.len(), 0);
    }

    #[test]
    fn listeners_run_in_subscription_order() {
        let mut listeners = Listeners::default();
        let order = Rc::new(std::cell::RefCell::new(Vec::new()));
        let first = Rc::clone(&order);
        let second = Rc::clone(&order);
        let _a = listeners.subscribe(move |_| first.borrow_mut().push("a"));
        let _b = listeners.subscribe(move |_| second.borrow_mut().push("b"));
        deliver(&listeners.live(), &Layout::empty(Axis::Vertical, 0));
        assert_eq!(*order.borrow(), vec!["a", "b"]);
    }
}
