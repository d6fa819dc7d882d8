use std::cmp::Ordering;
use std::collections::BinaryHeap;

use ndarray::Array2;

pub mod cosine;
pub mod index_map;
pub mod product_index;
pub mod user_index;

/// An id paired with a score. Ordering puts the better entry first: higher
/// score, then lower id. A `BinaryHeap` of these therefore keeps the worst
/// retained entry on top.
#[derive(PartialEq, Debug, Clone, Copy)]
pub struct Scored<T> {
    pub id: T,
    pub score: f64,
}

impl<T> Scored<T> {
    pub fn new(id: T, score: f64) -> Self {
        Scored { id, score }
    }
}

impl<T: Ord> Eq for Scored<T> {}

impl<T: Ord> Ord for Scored<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        // reverse order by score, ascending by id
        match other.score.partial_cmp(&self.score) {
            Some(Ordering::Equal) | None => self.id.cmp(&other.id),
            Some(ordering) => ordering,
        }
    }
}

impl<T: Ord> PartialOrd for Scored<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Returns the `how_many` best entries, best first.
pub fn top_k<T, I>(candidates: I, how_many: usize) -> Vec<Scored<T>>
where
    T: Ord,
    I: IntoIterator<Item = Scored<T>>,
{
    if how_many == 0 {
        return Vec::new();
    }
    let candidates = candidates.into_iter();
    // sized by what the iterator can yield, never by the caller's count alone
    let capacity = how_many.min(candidates.size_hint().0);
    let mut top_items: BinaryHeap<Scored<T>> = BinaryHeap::with_capacity(capacity);
    for candidate in candidates {
        if top_items.len() < how_many {
            top_items.push(candidate);
        } else if let Some(mut worst) = top_items.peek_mut() {
            if candidate < *worst {
                *worst = candidate;
            }
        }
    }
    top_items.into_sorted_vec()
}

/// Nearest rows of a dense similarity matrix, excluding `row` itself.
/// Out of range rows have no neighbors.
pub(crate) fn nearest_rows(similarities: &Array2<f64>, row: usize, how_many: usize) -> Vec<Scored<usize>> {
    if row >= similarities.nrows() {
        return Vec::new();
    }
    let row_view = similarities.row(row);
    let candidates = row_view
        .indexed_iter()
        .filter(|(other, _)| *other != row)
        .map(|(other, score)| Scored::new(other, *score));
    top_k(candidates, how_many)
}

#[cfg(test)]
mod knn_test {
    use super::*;
    use ndarray::array;

    #[test]
    fn should_order_by_score_then_id() {
        let mut scored = vec![
            Scored::new(3_usize, 0.5),
            Scored::new(1, 0.9),
            Scored::new(0, 0.5),
            Scored::new(2, 0.1),
        ];
        scored.sort();
        let ids: Vec<usize> = scored.iter().map(|s| s.id).collect();
        assert_eq!(vec![1, 0, 3, 2], ids);
    }

    #[test]
    fn should_keep_best_entries_in_top_k() {
        let candidates = vec![
            Scored::new(10_u64, 0.2),
            Scored::new(11, 0.8),
            Scored::new(12, 0.5),
            Scored::new(13, 0.8),
            Scored::new(14, 0.1),
        ];
        let top = top_k(candidates, 3);
        let ids: Vec<u64> = top.iter().map(|s| s.id).collect();
        assert_eq!(vec![11, 13, 12], ids);
    }

    #[test]
    fn should_handle_zero_and_oversized_k() {
        assert!(top_k(vec![Scored::new(1_u64, 1.0)], 0).is_empty());
        assert_eq!(1, top_k(vec![Scored::new(1_u64, 1.0)], 10).len());
    }

    #[test]
    fn should_accept_unbounded_k() {
        let candidates = vec![Scored::new(2_u64, 0.4), Scored::new(1, 0.4), Scored::new(3, 0.9)];
        let ids: Vec<u64> = top_k(candidates, usize::MAX).iter().map(|s| s.id).collect();
        assert_eq!(vec![3, 1, 2], ids);

        let similarities = ndarray::Array2::<f64>::eye(3);
        assert_eq!(2, nearest_rows(&similarities, 1, usize::MAX).len());
    }

    #[test]
    fn should_exclude_self_from_nearest_rows() {
        let similarities = array![[1.0, 0.3, 0.3], [0.3, 1.0, 0.7], [0.3, 0.7, 1.0]];
        let nearest = nearest_rows(&similarities, 0, 5);
        let ids: Vec<usize> = nearest.iter().map(|s| s.id).collect();
        assert_eq!(vec![1, 2], ids);
        assert!(nearest_rows(&similarities, 3, 5).is_empty());
    }
}
