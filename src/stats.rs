use std::fmt;

use chrono::{NaiveDateTime, Utc};
use hashbrown::HashMap;
use serde_derive::{Deserialize, Serialize};
use tdigest::TDigest;
use tracing::info;

use crate::interactions::InteractionMatrix;
use crate::io::{SourceTables, UserId};

/// Descriptive numbers about one training pass, kept alongside the model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrainingDataStats {
    pub trained_at: NaiveDateTime,
    pub qty_users: usize,
    pub qty_categories: usize,
    pub qty_products: usize,
    pub qty_wishlist_edges: usize,
    pub qty_interest_edges: usize,
    pub qty_interaction_cells: usize,
    pub density: f64,
    pub wishlist_size_p50: u64,
    pub wishlist_size_p90: u64,
    pub wishlist_size_p99: u64,
    pub wishlist_size_p100: u64,
}

impl TrainingDataStats {
    pub fn compute(tables: &SourceTables, interactions: &InteractionMatrix) -> Self {
        let qty_users = interactions.users().len();
        let qty_products = interactions.products().len();
        let qty_interaction_cells = interactions.cells().nnz();
        let density = if qty_users > 0 && qty_products > 0 {
            qty_interaction_cells as f64 / (qty_users as f64 * qty_products as f64)
        } else {
            0.0
        };

        // Users without a wishlist count as size 0.
        let mut wishlist_sizes: HashMap<UserId, usize> = interactions
            .users()
            .ids()
            .iter()
            .map(|user_id| (*user_id, 0))
            .collect();
        for edge in tables.wishlists.iter() {
            if let Some(size) = wishlist_sizes.get_mut(&edge.user_id) {
                *size += 1;
            }
        }
        let sizes: Vec<f64> = wishlist_sizes.values().map(|size| *size as f64).collect();
        let (p50, p90, p99, p100) = if sizes.is_empty() {
            (0, 0, 0, 0)
        } else {
            let digest = TDigest::new_with_size(100).merge_unsorted(sizes);
            (
                digest.estimate_quantile(0.50).round() as u64,
                digest.estimate_quantile(0.90).round() as u64,
                digest.estimate_quantile(0.99).round() as u64,
                digest.estimate_quantile(1.0).round() as u64,
            )
        };

        TrainingDataStats {
            trained_at: Utc::now().naive_utc(),
            qty_users,
            qty_categories: tables.categories.len(),
            qty_products,
            qty_wishlist_edges: tables.wishlists.len(),
            qty_interest_edges: tables.interests.len(),
            qty_interaction_cells,
            density,
            wishlist_size_p50: p50,
            wishlist_size_p90: p90,
            wishlist_size_p99: p99,
            wishlist_size_p100: p100,
        }
    }

    pub fn log(&self) {
        info!(
            users = self.qty_users,
            categories = self.qty_categories,
            products = self.qty_products,
            wishlist_edges = self.qty_wishlist_edges,
            interest_edges = self.qty_interest_edges,
            cells = self.qty_interaction_cells,
            density = self.density,
            "training data loaded"
        );
        info!(
            p50 = self.wishlist_size_p50,
            p90 = self.wishlist_size_p90,
            p99 = self.wishlist_size_p99,
            p100 = self.wishlist_size_p100,
            "wishlist size percentiles"
        );
    }
}

impl fmt::Display for TrainingDataStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Trained at {}", self.trained_at)?;
        writeln!(f, "\tUsers: {}", self.qty_users)?;
        writeln!(f, "\tCategories: {}", self.qty_categories)?;
        writeln!(f, "\tProducts: {}", self.qty_products)?;
        writeln!(f, "\tWishlist edges: {}", self.qty_wishlist_edges)?;
        writeln!(f, "\tInterest edges: {}", self.qty_interest_edges)?;
        writeln!(
            f,
            "\tInteraction cells: {} (density {:.6})",
            self.qty_interaction_cells, self.density
        )?;
        write!(
            f,
            "\tWishlist size percentiles: p50={} p90={} p99={} p100={}",
            self.wishlist_size_p50,
            self.wishlist_size_p90,
            self.wishlist_size_p99,
            self.wishlist_size_p100
        )
    }
}

#[cfg(test)]
mod stats_test {
    use super::*;
    use crate::test_fixtures::scenario_tables;
    use float_cmp::approx_eq;

    #[test]
    fn should_count_tables_and_cells() {
        let tables = scenario_tables();
        let interactions = InteractionMatrix::build(&tables);
        let stats = TrainingDataStats::compute(&tables, &interactions);

        assert_eq!(3, stats.qty_users);
        assert_eq!(2, stats.qty_categories);
        assert_eq!(3, stats.qty_products);
        assert_eq!(3, stats.qty_wishlist_edges);
        assert_eq!(1, stats.qty_interest_edges);
        // (1,10) (1,30) (2,10) (2,20)
        assert_eq!(4, stats.qty_interaction_cells);
        assert!(approx_eq!(f64, 4.0 / 9.0, stats.density));
        assert_eq!(2, stats.wishlist_size_p100);
    }

    #[test]
    fn should_handle_empty_training_data() {
        let tables = SourceTables::default();
        let interactions = InteractionMatrix::build(&tables);
        let stats = TrainingDataStats::compute(&tables, &interactions);

        assert_eq!(0, stats.qty_users);
        assert_eq!(0.0, stats.density);
        assert_eq!(0, stats.wishlist_size_p50);
        assert!(stats.to_string().contains("Users: 0"));
    }
}
