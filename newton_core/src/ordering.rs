//! Explicit sort-order maintenance for ordered child collections.
//!
//! Every ordered collection (routines, a routine's exercises, an exercise's
//! sets) keeps its `sort_order` fields contiguous from zero. The vectors are
//! also kept in that order, but display code goes through [`sorted`].

use crate::{Error, Exercise, ExerciseSet, Result, Routine};

/// A record positioned by an explicit sort order
pub trait SortOrdered {
    fn sort_order(&self) -> u32;
    fn set_sort_order(&mut self, order: u32);
}

macro_rules! impl_sort_ordered {
    ($($ty:ty),*) => {
        $(
            impl SortOrdered for $ty {
                fn sort_order(&self) -> u32 {
                    self.sort_order
                }

                fn set_sort_order(&mut self, order: u32) {
                    self.sort_order = order;
                }
            }
        )*
    };
}

impl_sort_ordered!(Routine, Exercise, ExerciseSet);

/// Order the vector by its sort field and rewrite the fields as 0..n
pub fn normalize<T: SortOrdered>(items: &mut [T]) {
    items.sort_by_key(|item| item.sort_order());
    renumber(items);
}

/// Rewrite sort fields to match vector positions
pub fn renumber<T: SortOrdered>(items: &mut [T]) {
    for (idx, item) in items.iter_mut().enumerate() {
        item.set_sort_order(idx as u32);
    }
}

/// Append with the next sort order
pub fn push<T: SortOrdered>(items: &mut Vec<T>, mut item: T) {
    item.set_sort_order(items.len() as u32);
    items.push(item);
}

/// Remove the item at `index` and close the gap
pub fn remove<T: SortOrdered>(items: &mut Vec<T>, index: usize) -> Result<T> {
    if index >= items.len() {
        return Err(Error::NotFound(format!(
            "position {} (collection has {} items)",
            index + 1,
            items.len()
        )));
    }
    let removed = items.remove(index);
    renumber(items);
    Ok(removed)
}

/// Move the item at `from` so it ends up at position `to`
pub fn move_item<T: SortOrdered>(items: &mut Vec<T>, from: usize, to: usize) -> Result<()> {
    let len = items.len();
    if from >= len || to >= len {
        return Err(Error::NotFound(format!(
            "cannot move {} to {} (collection has {} items)",
            from + 1,
            to + 1,
            len
        )));
    }
    let item = items.remove(from);
    items.insert(to, item);
    renumber(items);
    Ok(())
}

/// Borrow items in display order
pub fn sorted<T: SortOrdered>(items: &[T]) -> Vec<&T> {
    let mut refs: Vec<&T> = items.iter().collect();
    refs.sort_by_key(|item| item.sort_order());
    refs
}

/// True when the sort fields are a permutation of 0..n
pub fn is_contiguous<T: SortOrdered>(items: &[T]) -> bool {
    let mut orders: Vec<u32> = items.iter().map(|item| item.sort_order()).collect();
    orders.sort_unstable();
    orders
        .iter()
        .enumerate()
        .all(|(idx, order)| *order == idx as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sets(n: usize) -> Vec<ExerciseSet> {
        let mut items = Vec::new();
        for i in 0..n {
            push(&mut items, ExerciseSet::new(100.0 + i as f64, 5));
        }
        items
    }

    fn weights(items: &[ExerciseSet]) -> Vec<f64> {
        sorted(items).iter().map(|s| s.weight).collect()
    }

    #[test]
    fn test_push_assigns_next_order() {
        let items = sets(3);
        assert_eq!(
            items.iter().map(|s| s.sort_order).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
    }

    #[test]
    fn test_remove_closes_gap() {
        let mut items = sets(4);
        let removed = remove(&mut items, 1).unwrap();
        assert_eq!(removed.weight, 101.0);
        assert!(is_contiguous(&items));
        assert_eq!(weights(&items), vec![100.0, 102.0, 103.0]);
    }

    #[test]
    fn test_remove_out_of_range() {
        let mut items = sets(2);
        assert!(matches!(remove(&mut items, 2), Err(Error::NotFound(_))));
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn test_move_forward_and_back() {
        let mut items = sets(4);

        move_item(&mut items, 0, 3).unwrap();
        assert_eq!(weights(&items), vec![101.0, 102.0, 103.0, 100.0]);
        assert!(is_contiguous(&items));

        move_item(&mut items, 3, 0).unwrap();
        assert_eq!(weights(&items), vec![100.0, 101.0, 102.0, 103.0]);
        assert!(is_contiguous(&items));
    }

    #[test]
    fn test_normalize_repairs_gaps_and_order() {
        let mut items = sets(3);
        items[0].sort_order = 7;
        items[1].sort_order = 2;
        items[2].sort_order = 5;

        normalize(&mut items);
        assert!(is_contiguous(&items));
        assert_eq!(weights(&items), vec![101.0, 102.0, 100.0]);
    }

    #[test]
    fn test_is_contiguous_detects_duplicates() {
        let mut items = sets(3);
        items[2].sort_order = 1;
        assert!(!is_contiguous(&items));
    }
}
