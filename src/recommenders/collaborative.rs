use hashbrown::HashSet;
use tracing::debug;

use crate::io::{ProductId, UserId};
use crate::model::TrainedState;

/// Products wishlisted by the nearest neighbors of `user`, scored with the
/// similarity of the neighbor that contributed them first.
///
/// Neighbors are visited best first and only those with a positive
/// similarity are mined. Collection stops at `2 * how_many` candidates; the
/// stable sort keeps neighbor and wishlist order among equal scores.
pub fn recommend(
    state: &TrainedState,
    user: UserId,
    how_many: usize,
    num_neighbors: usize,
) -> Vec<(ProductId, f64)> {
    if how_many == 0 {
        return Vec::new();
    }
    let max_candidates = how_many.saturating_mul(2);
    // no more candidates can exist than products in the model
    let capacity = max_candidates.min(state.interactions().products().len());

    let owned: HashSet<ProductId> = state.wishlist(user).iter().copied().collect();
    let mut collected: HashSet<ProductId> = HashSet::with_capacity(capacity);
    let mut candidates: Vec<(ProductId, f64)> = Vec::with_capacity(capacity);

    'neighbors: for (neighbor, similarity) in state.top_neighbors(user, num_neighbors) {
        if similarity <= 0.0 {
            break;
        }
        for product in state.wishlist(neighbor) {
            if owned.contains(product) || !collected.insert(*product) {
                continue;
            }
            candidates.push((*product, similarity));
            if candidates.len() >= max_candidates {
                break 'neighbors;
            }
        }
    }

    candidates.sort_by(|(_, left), (_, right)| right.total_cmp(left));
    candidates.truncate(how_many);
    debug!(user, candidates = candidates.len(), "collaborative candidates");
    candidates
}
