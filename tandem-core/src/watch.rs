use std::cell::RefCell;
use std::rc::Rc;

use crate::store::{Store, SubscriptionId};

/// Watch a store and call `callback(new, old)` when its value changes.
/// - The current value is the baseline (no callback on registration)
/// - Triggers callback only when `new != old`
///
/// Example:
/// watch(&items, |new, old| { println!("{old:?} -> {new:?}"); });
pub fn watch<T, F>(store: &Store<T>, callback: F) -> SubscriptionId
where
    T: PartialEq + Clone + 'static,
    F: FnMut(&T, &T) + 'static,
{
    let prev: Rc<RefCell<T>> = Rc::new(RefCell::new(store.get()));
    let callback = RefCell::new(callback);

    store.on_change(move |next| {
        // Compare and update before calling user code so the callback can
        // freely write to the store again.
        let old = {
            let mut prev_borrow = prev.borrow_mut();
            if *prev_borrow == *next {
                return;
            }
            std::mem::replace(&mut *prev_borrow, next.clone())
        };
        (callback.borrow_mut())(next, &old);
    })
}
