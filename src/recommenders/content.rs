use hashbrown::{HashMap, HashSet};
use tracing::debug;

use crate::io::{ProductId, UserId};
use crate::knn::{top_k, Scored};
use crate::model::TrainedState;

/// Sort key of a product reached through a declared category interest.
const CATEGORY_MATCH_KEY: f64 = 1.0;

/// Products from the categories `user` declared interest in, plus the
/// `num_similar` closest products to every wishlist item, minus the wishlist.
///
/// Each candidate is keyed by its best reason to be there: category products
/// get `CATEGORY_MATCH_KEY`, similar products their highest feature
/// similarity to an originating wishlist item. Similar products with
/// similarity 0 are left out. Output is ordered by key descending and then by
/// product id.
pub fn recommend(
    state: &TrainedState,
    user: UserId,
    how_many: usize,
    num_similar: usize,
) -> Vec<ProductId> {
    if how_many == 0 {
        return Vec::new();
    }
    let owned: HashSet<ProductId> = state.wishlist(user).iter().copied().collect();
    let mut keys: HashMap<ProductId, f64> = HashMap::new();

    for category in state.interested_categories(user) {
        for product in state.products_in_category(*category) {
            keys.insert(*product, CATEGORY_MATCH_KEY);
        }
    }

    for wished in state.wishlist(user) {
        for (similar, similarity) in state.top_similar_scored(*wished, num_similar) {
            // a product sharing neither category nor brand is not similar
            if similarity <= 0.0 {
                continue;
            }
            let key = keys.entry(similar).or_insert(similarity);
            if similarity > *key {
                *key = similarity;
            }
        }
    }

    let candidates = keys
        .into_iter()
        .filter(|(product, _)| !owned.contains(product))
        .map(|(product, key)| Scored::new(product, key));

    let ranked: Vec<ProductId> = top_k(candidates, how_many)
        .into_iter()
        .map(|scored| scored.id)
        .collect();
    debug!(user, candidates = ranked.len(), "content candidates");
    ranked
}

#[cfg(test)]
mod content_test {
    use super::*;
    use crate::io::{InterestEdge, SourceTables, User, WishlistEdge};
    use crate::model::train;
    use crate::test_fixtures::{products, scenario_tables};

    #[test]
    fn should_union_category_products_and_similar_products() {
        let state = train(scenario_tables());

        // 30 through the interest in category A, 20 shares a category with wished 10
        assert_eq!(vec![30, 20], recommend(&state, 1, 5, 5));
        assert_eq!(vec![30], recommend(&state, 1, 1, 5));
    }

    #[test]
    fn should_skip_products_without_shared_attributes() {
        let state = train(scenario_tables());

        // 30 is among the top similar of 10, but at similarity 0
        assert_eq!(vec![20, 30], state.top_similar(10, 5));
        // user 2 already owns 10 and 20 and has no interests
        assert!(recommend(&state, 2, 5, 5).is_empty());
        assert!(recommend(&state, 2, usize::MAX, usize::MAX).is_empty());
    }

    #[test]
    fn should_never_recommend_wishlisted_products() {
        let state = train(scenario_tables());
        for user in [1, 2, 3] {
            let recommendations = recommend(&state, user, 10, 5);
            assert!(recommendations.iter().all(|p| !state.wishlist(user).contains(p)));
        }
    }

    #[test]
    fn should_be_empty_without_interests_or_wishlist() {
        let state = train(scenario_tables());
        assert!(recommend(&state, 3, 5, 5).is_empty());
        assert!(recommend(&state, 99, 5, 5).is_empty());
    }

    #[test]
    fn should_order_by_best_similarity_then_id() {
        let tables = SourceTables {
            users: vec![User { id: 1 }],
            // (id, category, brand)
            products: products(&[(1, 100, 7), (2, 100, 8), (3, 100, 7), (4, 200, 7), (5, 300, 9)]),
            wishlists: vec![WishlistEdge { user_id: 1, product_id: 1 }],
            interests: vec![InterestEdge { user_id: 1, category_id: 300 }],
            ..SourceTables::default()
        };
        let state = train(tables);

        // 3 matches both attributes and ties with 5 from the interest,
        // 2 and 4 tie on one attribute
        assert_eq!(vec![3, 5, 2, 4], recommend(&state, 1, 4, 3));
    }
}
