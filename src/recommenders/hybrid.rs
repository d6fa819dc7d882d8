use hashbrown::HashMap;
use tracing::debug;

use crate::io::{ProductId, UserId};
use crate::knn::{top_k, Scored};
use crate::model::TrainedState;
use crate::recommenders::{collaborative, content, RecommenderSettings};

/// Blends collaborative and content candidates into one ranking.
///
/// A collaborative candidate adds `collaborative weight * similarity`, a
/// content candidate adds the flat content weight. Both sources are asked
/// for `how_many * candidate_multiplier` candidates.
pub fn combine(
    state: &TrainedState,
    user: UserId,
    how_many: usize,
    settings: &RecommenderSettings,
) -> Vec<Scored<ProductId>> {
    if how_many == 0 {
        return Vec::new();
    }
    let pool_size = how_many.saturating_mul(settings.candidate_multiplier.max(1));

    let from_neighbors =
        collaborative::recommend(state, user, pool_size, settings.num_neighbors);
    let from_content = content::recommend(state, user, pool_size, settings.num_similar_products);

    let mut totals: HashMap<ProductId, f64> =
        HashMap::with_capacity(from_neighbors.len() + from_content.len());
    for (product, similarity) in from_neighbors.iter() {
        *totals.entry(*product).or_insert(0.0) += settings.weights.collaborative * similarity;
    }
    for product in from_content.iter() {
        *totals.entry(*product).or_insert(0.0) += settings.weights.content;
    }

    debug!(
        user,
        collaborative = from_neighbors.len(),
        content = from_content.len(),
        blended = totals.len(),
        "hybrid candidates"
    );

    top_k(
        totals.into_iter().map(|(product, score)| Scored::new(product, score)),
        how_many,
    )
}
