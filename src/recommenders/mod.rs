use itertools::Itertools;

use crate::error::ConfigError;
use crate::io::{Category, CategoryId, ProductId, UserId};
use crate::knn::Scored;
use crate::model::TrainedState;

pub mod collaborative;
pub mod content;
pub mod hybrid;

pub const DEFAULT_NUM_NEIGHBORS: usize = 10;
pub const DEFAULT_NUM_SIMILAR_PRODUCTS: usize = 5;
pub const DEFAULT_CANDIDATE_MULTIPLIER: usize = 2;
/// Hybrid recommendations whose categories feed `suggested_categories`.
pub const SUGGESTION_BASIS_SIZE: usize = 10;

/// Blend weights of the hybrid ranker.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlendWeights {
    pub collaborative: f64,
    pub content: f64,
}

impl BlendWeights {
    pub fn new(collaborative: f64, content: f64) -> Result<Self, ConfigError> {
        for (key, weight) in [
            ("blend.weight_collaborative", collaborative),
            ("blend.weight_content", content),
        ] {
            if !weight.is_finite() || weight < 0.0 {
                return Err(ConfigError::Invalid {
                    key,
                    reason: format!("expected a non-negative number, got {}", weight),
                });
            }
        }
        Ok(BlendWeights {
            collaborative,
            content,
        })
    }
}

impl Default for BlendWeights {
    fn default() -> Self {
        BlendWeights {
            collaborative: 0.7,
            content: 0.3,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RecommenderSettings {
    pub num_neighbors: usize,
    pub num_similar_products: usize,
    pub candidate_multiplier: usize,
    pub weights: BlendWeights,
}

impl Default for RecommenderSettings {
    fn default() -> Self {
        RecommenderSettings {
            num_neighbors: DEFAULT_NUM_NEIGHBORS,
            num_similar_products: DEFAULT_NUM_SIMILAR_PRODUCTS,
            candidate_multiplier: DEFAULT_CANDIDATE_MULTIPLIER,
            weights: BlendWeights::default(),
        }
    }
}

/// Read-only query surface over one trained state.
pub struct Recommender<'a> {
    state: &'a TrainedState,
    settings: RecommenderSettings,
}

impl<'a> Recommender<'a> {
    pub fn new(state: &'a TrainedState, settings: RecommenderSettings) -> Self {
        Recommender { state, settings }
    }

    pub fn settings(&self) -> &RecommenderSettings {
        &self.settings
    }

    pub fn collaborative(&self, user: UserId, how_many: usize) -> Vec<(ProductId, f64)> {
        collaborative::recommend(self.state, user, how_many, self.settings.num_neighbors)
    }

    pub fn content(&self, user: UserId, how_many: usize) -> Vec<ProductId> {
        content::recommend(self.state, user, how_many, self.settings.num_similar_products)
    }

    pub fn recommend_scored(&self, user: UserId, how_many: usize) -> Vec<Scored<ProductId>> {
        hybrid::combine(self.state, user, how_many, &self.settings)
    }

    /// Hybrid recommendation ids, best first.
    pub fn recommend(&self, user: UserId, how_many: usize) -> Vec<ProductId> {
        self.recommend_scored(user, how_many)
            .into_iter()
            .map(|scored| scored.id)
            .collect()
    }

    /// Categories of the user's top hybrid recommendations together with the
    /// categories its positively similar neighbors declared, ordered by id.
    pub fn suggested_categories(&self, user: UserId) -> Vec<&'a Category> {
        let state = self.state;
        if state.interactions().users().index_of(user).is_none() {
            return Vec::new();
        }

        let recommended = self
            .recommend(user, SUGGESTION_BASIS_SIZE)
            .into_iter()
            .filter_map(move |product| state.product(product).map(|p| p.category_id));

        let declared = state
            .top_neighbors(user, self.settings.num_neighbors)
            .into_iter()
            .filter(|(_, similarity)| *similarity > 0.0)
            .flat_map(move |(neighbor, _)| state.interested_categories(neighbor).iter().copied());

        let category_ids: Vec<CategoryId> = recommended.chain(declared).sorted().dedup().collect();
        state.category_details(&category_ids)
    }
}
