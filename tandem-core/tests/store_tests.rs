use std::cell::RefCell as StdRefCell;
use std::rc::Rc;

use pretty_assertions::assert_eq;
use tandem_core::{Store, Value};

#[test]
fn test_store_notifies_subscriber() {
    // Wrap your Store in Rc so you can clone it into the callback
    let count = Rc::new(Store::new(Value::Int(0)));
    let observed = Rc::new(StdRefCell::new(Value::Int(0)));

    {
        let observed_clone = observed.clone();
        count.on_change(move |v| {
            *observed_clone.borrow_mut() = v.clone();
        });
    }

    count.set(Value::Int(42));
    assert_eq!(*observed.borrow(), Value::Int(42));
    assert_eq!(count.get(), Value::Int(42));
}

#[test]
fn callbacks_fire_in_registration_order() {
    let store = Store::new(0);
    let order: Rc<StdRefCell<Vec<&'static str>>> = Rc::new(StdRefCell::new(vec![]));

    for name in ["first", "second", "third"] {
        let order = order.clone();
        store.on_change(move |_| order.borrow_mut().push(name));
    }

    store.set(1);
    assert_eq!(&*order.borrow(), &vec!["first", "second", "third"]);
}

#[test]
fn unsubscribe_stops_notifications() {
    let store = Store::new(0);
    let hits = Rc::new(StdRefCell::new(0));
    let id = {
        let hits = hits.clone();
        store.on_change(move |_| *hits.borrow_mut() += 1)
    };

    store.set(1);
    assert!(store.unsubscribe(id));
    store.set(2);

    assert_eq!(*hits.borrow(), 1);
    assert_eq!(store.subscriber_count(), 0);
    assert!(!store.unsubscribe(id));
}

#[test]
fn unsubscribed_during_round_does_not_fire() {
    let store = Rc::new(Store::new(0));
    let hits = Rc::new(StdRefCell::new(Vec::new()));
    let second: Rc<StdRefCell<Option<tandem_core::SubscriptionId>>> = Rc::new(StdRefCell::new(None));

    {
        let store_cb = store.clone();
        let second = second.clone();
        store.on_change(move |_| {
            if let Some(id) = *second.borrow() {
                store_cb.unsubscribe(id);
            }
        });
    }
    {
        let hits = hits.clone();
        let id = store.on_change(move |v| hits.borrow_mut().push(*v));
        *second.borrow_mut() = Some(id);
    }

    store.set(5);
    assert!(hits.borrow().is_empty());
}

#[test]
fn reentrant_set_is_queued_until_round_finishes() {
    let store = Rc::new(Store::new(0));
    let seen: Rc<StdRefCell<Vec<(i32, i32)>>> = Rc::new(StdRefCell::new(vec![]));

    // First callback bumps the value again while the round is running.
    {
        let store_cb = store.clone();
        let seen = seen.clone();
        store.on_change(move |v| {
            seen.borrow_mut().push((1, *v));
            if *v < 3 {
                store_cb.set(*v + 1);
            }
        });
    }
    {
        let seen = seen.clone();
        store.on_change(move |v| seen.borrow_mut().push((2, *v)));
    }

    store.set(1);

    // Each round completes for every subscriber before the queued value lands.
    assert_eq!(
        &*seen.borrow(),
        &vec![(1, 1), (2, 1), (1, 2), (2, 2), (1, 3), (2, 3)]
    );
    assert_eq!(store.get(), 3);
}

#[test]
fn update_mutates_in_place() {
    let list = Store::new(Value::from(vec!["a"]));
    list.update(|v| {
        if let Value::List(items) = v {
            items.push(Value::from("b"));
        }
    });
    assert_eq!(list.get(), Value::from(vec!["a", "b"]));
}
