//! Change notification for views observing the editing model
//!
//! Views subscribe a callback and are poked synchronously after every
//! successful mutation; there is no delta payload, observers re-read the
//! current state.

use std::fmt;

/// Token returned by [`Listeners::subscribe`], used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// A list of registered change listeners
#[derive(Default)]
pub struct Listeners {
    next_id: u64,
    callbacks: Vec<(SubscriptionId, Box<dyn FnMut()>)>,
}

impl Listeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, callback: impl FnMut() + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.callbacks.push((id, Box::new(callback)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        self.callbacks.retain(|(existing, _)| *existing != id);
    }

    /// Invoke every registered callback, in subscription order
    pub fn notify(&mut self) {
        for (_, callback) in &mut self.callbacks {
            callback();
        }
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }
}

impl fmt::Debug for Listeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners")
            .field("count", &self.callbacks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_notify_invokes_all() {
        let count = Rc::new(Cell::new(0));
        let mut listeners = Listeners::new();
        for _ in 0..3 {
            let count = Rc::clone(&count);
            listeners.subscribe(move || count.set(count.get() + 1));
        }

        listeners.notify();
        assert_eq!(count.get(), 3);
    }

    #[test]
    fn test_unsubscribe() {
        let count = Rc::new(Cell::new(0));
        let mut listeners = Listeners::new();

        let c1 = Rc::clone(&count);
        let id = listeners.subscribe(move || c1.set(c1.get() + 1));
        let c2 = Rc::clone(&count);
        listeners.subscribe(move || c2.set(c2.get() + 10));

        listeners.unsubscribe(id);
        listeners.notify();
        assert_eq!(count.get(), 10);
        assert_eq!(listeners.len(), 1);
    }
}
