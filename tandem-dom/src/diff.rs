use std::collections::HashSet;
use std::hash::Hash;

/// One step turning an old list into a new one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit<T> {
    Insert { index: usize, value: T },
    Remove { index: usize },
}

/// Set-based list diff.
///
/// All removals come first, in descending index order, followed by all insertions
/// in ascending index order. Equal values are not told apart, so a reorder of
/// present values produces no edits.
pub fn diff<T>(old: &[T], new: &[T]) -> Vec<Edit<T>>
where
    T: Eq + Hash + Clone,
{
    let old_set: HashSet<&T> = old.iter().collect();
    let new_set: HashSet<&T> = new.iter().collect();

    let mut edits = Vec::new();
    for (index, value) in old.iter().enumerate().rev() {
        if !new_set.contains(value) {
            edits.push(Edit::Remove { index });
        }
    }
    for (index, value) in new.iter().enumerate() {
        if !old_set.contains(value) {
            edits.push(Edit::Insert {
                index,
                value: value.clone(),
            });
        }
    }
    edits
}

/// Apply edits in order. Out-of-range indices are clamped rather than panicking.
pub fn apply<T: Clone>(list: &mut Vec<T>, edits: &[Edit<T>]) {
    for edit in edits {
        match edit {
            Edit::Remove { index } => {
                if *index < list.len() {
                    list.remove(*index);
                }
            }
            Edit::Insert { index, value } => {
                let at = (*index).min(list.len());
                list.insert(at, value.clone());
            }
        }
    }
}
