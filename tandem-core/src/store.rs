// tandem-core/src/store.rs

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

/// Handle returned by [`Store::on_change`], used to release the callback again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Subscriber<T> {
    id: SubscriptionId,
    // Cleared on unsubscribe so a snapshot taken mid-notification skips it.
    live: Rc<Cell<bool>>,
    callback: Rc<dyn Fn(&T)>,
}

impl<T> Clone for Subscriber<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            live: self.live.clone(),
            callback: self.callback.clone(),
        }
    }
}

/// An observable value.
///
/// Callbacks run synchronously, in registration order, before [`Store::set`]
/// returns. A `set` issued from inside a callback is queued and applied once the
/// current notification round has finished.
pub struct Store<T> {
    value: RefCell<T>,
    subscribers: RefCell<Vec<Subscriber<T>>>,
    next_id: Cell<u64>,
    notifying: Cell<bool>,
    pending: RefCell<VecDeque<T>>,
}

impl<T> Store<T>
where
    T: Clone + 'static,
{
    /// Create a new store.
    pub fn new(initial: T) -> Self {
        Self {
            value: RefCell::new(initial),
            subscribers: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
            notifying: Cell::new(false),
            pending: RefCell::new(VecDeque::new()),
        }
    }

    pub fn get(&self) -> T {
        self.value.borrow().clone()
    }

    /// Read without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.value.borrow())
    }

    /// Replace the value and notify every subscriber.
    pub fn set(&self, new: T) {
        if self.notifying.get() {
            tracing::debug!("store set during notification; queued");
            self.pending.borrow_mut().push_back(new);
            return;
        }

        self.notifying.set(true);
        let mut next = Some(new);
        while let Some(value) = next {
            *self.value.borrow_mut() = value;

            // Snapshot subscribers before notifying.
            let subscribers = self.subscribers.borrow().clone();
            let current = self.get();
            for sub in subscribers {
                if sub.live.get() {
                    (sub.callback)(&current);
                }
            }
            next = self.pending.borrow_mut().pop_front();
        }
        self.notifying.set(false);
    }

    /// Mutate in place, then notify.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        let mut value = self.get();
        f(&mut value);
        self.set(value);
    }

    /// Register `callback` to run after every `set`.
    pub fn on_change(&self, callback: impl Fn(&T) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.subscribers.borrow_mut().push(Subscriber {
            id,
            live: Rc::new(Cell::new(true)),
            callback: Rc::new(callback),
        });
        id
    }

    /// Release a callback. Returns false when `id` was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subs = self.subscribers.borrow_mut();
        match subs.iter().position(|s| s.id == id) {
            Some(pos) => {
                let sub = subs.remove(pos);
                sub.live.set(false);
                true
            }
            None => false,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.borrow().len()
    }
}

impl<T: Clone + Default + 'static> Default for Store<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Store<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("value", &self.value.borrow())
            .field("subscribers", &self.subscribers.borrow().len())
            .finish()
    }
}
