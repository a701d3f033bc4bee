use std::collections::HashMap;

use pretty_assertions::assert_eq;
use tandem_dom::{Edit, apply, diff};

fn counts(items: &[&str]) -> HashMap<String, usize> {
    let mut m = HashMap::new();
    for i in items {
        *m.entry(i.to_string()).or_insert(0) += 1;
    }
    m
}

#[test]
fn identical_lists_need_no_edits() {
    let xs = vec!["a", "b", "c"];
    assert!(diff(&xs, &xs).is_empty());
    let empty: Vec<&str> = vec![];
    assert!(diff(&empty, &empty).is_empty());
}

#[test]
fn removals_descend_then_inserts_ascend() {
    let old = vec!["a", "b", "c", "d"];
    let new = vec!["b", "x", "d", "y"];

    let edits = diff(&old, &new);

    assert_eq!(
        edits,
        vec![
            Edit::Remove { index: 2 },
            Edit::Remove { index: 0 },
            Edit::Insert { index: 1, value: "x" },
            Edit::Insert { index: 3, value: "y" },
        ]
    );
}

#[test]
fn applying_edits_reproduces_new_contents() {
    let cases: Vec<(Vec<&str>, Vec<&str>)> = vec![
        (vec![], vec!["a", "b"]),
        (vec!["a", "b"], vec![]),
        (vec!["a", "b", "c"], vec!["c", "d"]),
        (vec!["a", "b", "c"], vec!["x", "a", "y", "c", "z"]),
        (vec!["a", "b"], vec!["b", "a"]),
        (vec!["q"], vec!["r"]),
    ];

    for (old, new) in cases {
        let mut list = old.clone();
        apply(&mut list, &diff(&old, &new));
        assert_eq!(counts(&list), counts(&new), "old={old:?} new={new:?}");
    }
}

#[test]
fn order_preserving_changes_apply_exactly() {
    let old = vec![1, 2, 3, 4, 5];
    let new = vec![0, 2, 4, 6];
    let mut list = old.clone();
    apply(&mut list, &diff(&old, &new));
    assert_eq!(list, new);
}

#[test]
fn reorder_of_present_values_is_invisible_to_set_diff() {
    let edits = diff(&["a", "b"], &["b", "a"]);
    assert!(edits.is_empty());
}
