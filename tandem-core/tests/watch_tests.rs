use std::cell::RefCell as StdRefCell;
use std::rc::Rc;

use tandem_core::{Store, watch};

#[test]
fn watch_triggers_on_change_only() {
    let count = Store::new(0);
    let events: Rc<StdRefCell<Vec<(i32, i32)>>> = Rc::new(StdRefCell::new(vec![]));

    {
        let events_cb = events.clone();
        watch(&count, move |new, old| {
            events_cb.borrow_mut().push((*new, *old));
        });
    }

    // No callback on registration
    assert!(events.borrow().is_empty());

    count.set(1);
    assert_eq!(&*events.borrow(), &vec![(1, 0)]);

    // Setting the same value shouldn't trigger
    count.set(1);
    assert_eq!(&*events.borrow(), &vec![(1, 0)]);

    // Change again
    count.set(2);
    assert_eq!(&*events.borrow(), &vec![(1, 0), (2, 1)]);
}

#[test]
fn watch_callback_can_mutate_store() {
    let count = Rc::new(Store::new(0));
    let seen: Rc<StdRefCell<Vec<i32>>> = Rc::new(StdRefCell::new(vec![]));

    {
        // two separate clones so each closure owns its own Rc
        let count_cb = count.clone();
        let seen_cb = seen.clone();

        watch(&count, move |new, _old| {
            seen_cb.borrow_mut().push(*new);
            if *new < 3 {
                count_cb.set(*new + 1);
            }
        });
    }

    // Kick off the chain
    count.set(1);

    // We should see 1, then 2, then 3 (as the callback increments)
    assert_eq!(&*seen.borrow(), &vec![1, 2, 3]);
}
