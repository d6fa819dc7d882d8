use std::time::Instant;

use hashbrown::HashMap;
use itertools::Itertools;
use rand::seq::index::sample;
use rand::SeedableRng;
use rand_pcg::Pcg64;
use tracing::info;

use crate::error::RepositoryError;
use crate::interactions::InteractionMatrix;
use crate::io::{Category, CategoryId, Product, ProductId, Repository, SourceTables, UserId};
use crate::knn::product_index::ProductFeatureIndex;
use crate::knn::user_index::UserSimilarityIndex;
use crate::stats::TrainingDataStats;

/// Everything one training pass produces. Immutable once built; a retrain or
/// a snapshot load yields a new value instead of changing this one, so any
/// number of threads may query it without locking.
#[derive(Debug)]
pub struct TrainedState {
    tables: SourceTables,
    interactions: InteractionMatrix,
    user_similarity: UserSimilarityIndex,
    product_similarity: ProductFeatureIndex,
    stats: TrainingDataStats,
    lookups: Lookups,
}

/// Per-entity views over the source tables, derived and never persisted.
#[derive(Debug, Default)]
struct Lookups {
    wishlist_per_user: HashMap<UserId, Vec<ProductId>>,
    categories_per_user: HashMap<UserId, Vec<CategoryId>>,
    products_per_category: HashMap<CategoryId, Vec<ProductId>>,
    product_rows: HashMap<ProductId, usize>,
    category_rows: HashMap<CategoryId, usize>,
}

impl Lookups {
    fn derive(tables: &SourceTables, interactions: &InteractionMatrix) -> Self {
        let mut lookups = Lookups::default();

        for (row, product) in tables.products.iter().enumerate() {
            if lookups.product_rows.contains_key(&product.id) {
                continue;
            }
            lookups.product_rows.insert(product.id, row);
            lookups
                .products_per_category
                .entry(product.category_id)
                .or_insert_with(Vec::new)
                .push(product.id);
        }
        for (row, category) in tables.categories.iter().enumerate() {
            lookups.category_rows.entry(category.id).or_insert(row);
        }

        // Only edges between entities known to the model are kept.
        for edge in tables.wishlists.iter() {
            if interactions.users().index_of(edge.user_id).is_some()
                && interactions.products().index_of(edge.product_id).is_some()
            {
                lookups
                    .wishlist_per_user
                    .entry(edge.user_id)
                    .or_insert_with(Vec::new)
                    .push(edge.product_id);
            }
        }
        for edge in tables.interests.iter() {
            if interactions.users().index_of(edge.user_id).is_some() {
                lookups
                    .categories_per_user
                    .entry(edge.user_id)
                    .or_insert_with(Vec::new)
                    .push(edge.category_id);
            }
        }
        for categories in lookups.categories_per_user.values_mut() {
            *categories = categories.iter().copied().unique().collect();
        }

        lookups
    }
}

/// Builds a trained state from one consistent read of the source tables.
pub fn train(tables: SourceTables) -> TrainedState {
    let start_time = Instant::now();
    let interactions = InteractionMatrix::build(&tables);
    info!(
        cells = interactions.cells().nnz(),
        micros = start_time.elapsed().as_micros() as u64,
        "built interaction matrix"
    );

    let start_time = Instant::now();
    let user_similarity = UserSimilarityIndex::build(&interactions);
    info!(
        users = user_similarity.len(),
        micros = start_time.elapsed().as_micros() as u64,
        "built user similarity index"
    );

    let start_time = Instant::now();
    let product_similarity = ProductFeatureIndex::build(&tables.products, interactions.products());
    info!(
        products = product_similarity.len(),
        features = product_similarity.num_features(),
        micros = start_time.elapsed().as_micros() as u64,
        "built product feature index"
    );

    let stats = TrainingDataStats::compute(&tables, &interactions);
    stats.log();

    TrainedState::assemble(tables, interactions, user_similarity, product_similarity, stats)
}

/// Reads every table once from `repository` and trains on the result.
pub fn train_from<R: Repository + ?Sized>(repository: &R) -> Result<TrainedState, RepositoryError> {
    let tables = SourceTables::fetch(repository)?;
    Ok(train(tables))
}

impl TrainedState {
    pub(crate) fn assemble(
        tables: SourceTables,
        interactions: InteractionMatrix,
        user_similarity: UserSimilarityIndex,
        product_similarity: ProductFeatureIndex,
        stats: TrainingDataStats,
    ) -> Self {
        let lookups = Lookups::derive(&tables, &interactions);
        TrainedState {
            tables,
            interactions,
            user_similarity,
            product_similarity,
            stats,
            lookups,
        }
    }

    pub fn tables(&self) -> &SourceTables {
        &self.tables
    }

    pub fn interactions(&self) -> &InteractionMatrix {
        &self.interactions
    }

    pub fn user_similarity(&self) -> &UserSimilarityIndex {
        &self.user_similarity
    }

    pub fn product_similarity(&self) -> &ProductFeatureIndex {
        &self.product_similarity
    }

    pub fn stats(&self) -> &TrainingDataStats {
        &self.stats
    }

    /// Cosine similarity of two users, `None` when either is unknown.
    pub fn similarity(&self, left: UserId, right: UserId) -> Option<f64> {
        let users = self.interactions.users();
        self.user_similarity
            .similarity(users.index_of(left)?, users.index_of(right)?)
    }

    /// The `n` most similar other users, best first, ties by position.
    /// An unknown user has no neighbors.
    pub fn top_neighbors(&self, user: UserId, n: usize) -> Vec<(UserId, f64)> {
        let users = self.interactions.users();
        let row = match users.index_of(user) {
            Some(row) => row,
            None => return Vec::new(),
        };
        self.user_similarity
            .neighbors_of(row, n)
            .into_iter()
            .filter_map(|scored| Some((users.id_at(scored.id)?, scored.score)))
            .collect()
    }

    /// The `k` products closest in category and brand, with their similarity.
    pub fn top_similar_scored(&self, product: ProductId, k: usize) -> Vec<(ProductId, f64)> {
        let products = self.interactions.products();
        let row = match products.index_of(product) {
            Some(row) => row,
            None => return Vec::new(),
        };
        self.product_similarity
            .similar_to(row, k)
            .into_iter()
            .filter_map(|scored| Some((products.id_at(scored.id)?, scored.score)))
            .collect()
    }

    pub fn top_similar(&self, product: ProductId, k: usize) -> Vec<ProductId> {
        self.top_similar_scored(product, k)
            .into_iter()
            .map(|(id, _)| id)
            .collect()
    }

    /// Wishlist of a known user in stored edge order.
    pub fn wishlist(&self, user: UserId) -> &[ProductId] {
        self.lookups
            .wishlist_per_user
            .get(&user)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn interested_categories(&self, user: UserId) -> &[CategoryId] {
        self.lookups
            .categories_per_user
            .get(&user)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn products_in_category(&self, category: CategoryId) -> &[ProductId] {
        self.lookups
            .products_per_category
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn product(&self, id: ProductId) -> Option<&Product> {
        let row = *self.lookups.product_rows.get(&id)?;
        self.tables.products.get(row)
    }

    pub fn category(&self, id: CategoryId) -> Option<&Category> {
        let row = *self.lookups.category_rows.get(&id)?;
        self.tables.categories.get(row)
    }

    /// Full product records in request order; unknown ids are dropped.
    pub fn product_details(&self, ids: &[ProductId]) -> Vec<&Product> {
        ids.iter().filter_map(|id| self.product(*id)).collect()
    }

    /// Full category records in request order; unknown ids are dropped.
    pub fn category_details(&self, ids: &[CategoryId]) -> Vec<&Category> {
        ids.iter().filter_map(|id| self.category(*id)).collect()
    }

    /// `n` distinct product ids drawn uniformly in random order; the same seed
    /// gives the same sample.
    pub fn sample_products(&self, n: usize, seed: u64) -> Vec<ProductId> {
        let mut rng = Pcg64::seed_from_u64(seed);
        let ids = self.interactions.products().ids();
        sample(&mut rng, ids.len(), n.min(ids.len()))
            .into_iter()
            .map(|position| ids[position])
            .collect()
    }
}
