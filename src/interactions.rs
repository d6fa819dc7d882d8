use hashbrown::HashMap;
use itertools::Itertools;
use serde_derive::{Deserialize, Serialize};
use sprs::{CsMat, TriMat};
use tracing::debug;

use crate::io::{CategoryId, ProductId, SourceTables, UserId};
use crate::knn::index_map::IdIndex;

pub const WISHLIST_WEIGHT: f64 = 1.0;
pub const INTEREST_WEIGHT: f64 = 0.5;

/// Sparse user x product weights together with the id <-> position maps of
/// both axes. Users and products are positioned in the order of the users
/// and products tables.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InteractionMatrix {
    users: IdIndex,
    products: IdIndex,
    cells: CsMat<f64>,
}

impl InteractionMatrix {
    /// A wishlist edge adds `WISHLIST_WEIGHT` to its cell. An interest edge adds
    /// `INTEREST_WEIGHT` to the cell of every product in that category.
    /// Edges that mention an unknown user or product are ignored.
    pub fn build(tables: &SourceTables) -> Self {
        let users = IdIndex::from_ids(tables.users.iter().map(|user| user.id));
        let products = IdIndex::from_ids(tables.products.iter().map(|product| product.id));

        let mut columns_per_category: HashMap<CategoryId, Vec<usize>> = HashMap::new();
        for product in tables.products.iter().unique_by(|product| product.id) {
            if let Some(col) = products.index_of(product.id) {
                columns_per_category
                    .entry(product.category_id)
                    .or_insert_with(Vec::new)
                    .push(col);
            }
        }

        let mut triplets = TriMat::new((users.len(), products.len()));
        let mut ignored_edges = 0_usize;

        for edge in tables.wishlists.iter() {
            match (users.index_of(edge.user_id), products.index_of(edge.product_id)) {
                (Some(row), Some(col)) => triplets.add_triplet(row, col, WISHLIST_WEIGHT),
                _ => ignored_edges += 1,
            }
        }

        for edge in tables.interests.iter() {
            match users.index_of(edge.user_id) {
                Some(row) => {
                    if let Some(cols) = columns_per_category.get(&edge.category_id) {
                        for col in cols.iter() {
                            triplets.add_triplet(row, *col, INTEREST_WEIGHT);
                        }
                    }
                }
                None => ignored_edges += 1,
            }
        }

        if ignored_edges > 0 {
            debug!(ignored_edges, "ignored edges referencing unknown users or products");
        }

        // repeated cells are summed by the conversion
        let cells: CsMat<f64> = triplets.to_csr();

        InteractionMatrix {
            users,
            products,
            cells,
        }
    }

    pub fn users(&self) -> &IdIndex {
        &self.users
    }

    pub fn products(&self) -> &IdIndex {
        &self.products
    }

    pub fn cells(&self) -> &CsMat<f64> {
        &self.cells
    }

    /// Weight of a (user, product) cell; 0 when either id is unknown.
    pub fn weight(&self, user: UserId, product: ProductId) -> f64 {
        match (self.users.index_of(user), self.products.index_of(product)) {
            (Some(row), Some(col)) => self.cells.get(row, col).copied().unwrap_or(0.0),
            _ => 0.0,
        }
    }

    /// Shapes and maps agree with each other and every weight is finite and non-negative.
    pub fn is_consistent(&self) -> bool {
        self.users.is_consistent()
            && self.products.is_consistent()
            && self.cells.is_csr()
            && self.cells.rows() == self.users.len()
            && self.cells.cols() == self.products.len()
            && self.cells.data().iter().all(|value| value.is_finite() && *value >= 0.0)
    }
}

#[cfg(test)]
mod interactions_test {
    use super::*;
    use crate::io::{InterestEdge, User, WishlistEdge};
    use crate::test_fixtures::{products, scenario_tables};
    use float_cmp::approx_eq;

    #[test]
    fn should_build_weighted_rows_for_scenario() {
        let matrix = InteractionMatrix::build(&scenario_tables());

        assert_eq!(3, matrix.users().len());
        assert_eq!(3, matrix.products().len());
        // user 1: wishlist 10, interest in the category of 30
        assert!(approx_eq!(f64, 1.0, matrix.weight(1, 10)));
        assert!(approx_eq!(f64, 0.0, matrix.weight(1, 20)));
        assert!(approx_eq!(f64, 0.5, matrix.weight(1, 30)));
        // user 2: wishlist 10 and 20
        assert!(approx_eq!(f64, 1.0, matrix.weight(2, 10)));
        assert!(approx_eq!(f64, 1.0, matrix.weight(2, 20)));
        assert!(approx_eq!(f64, 0.0, matrix.weight(2, 30)));
        assert_eq!(Some(0), matrix.cells().outer_view(2).map(|row| row.nnz()));
        assert!(matrix.is_consistent());
    }

    #[test]
    fn should_accumulate_wishlist_and_interest_on_same_cell() {
        let tables = SourceTables {
            users: vec![User { id: 1 }],
            products: products(&[(10, 5, 1), (11, 5, 2)]),
            wishlists: vec![WishlistEdge { user_id: 1, product_id: 10 }],
            interests: vec![InterestEdge { user_id: 1, category_id: 5 }],
            ..SourceTables::default()
        };
        let matrix = InteractionMatrix::build(&tables);

        assert!(approx_eq!(f64, 1.5, matrix.weight(1, 10)));
        assert!(approx_eq!(f64, 0.5, matrix.weight(1, 11)));
    }

    #[test]
    fn should_skip_edges_with_unknown_entities() {
        let tables = SourceTables {
            users: vec![User { id: 1 }],
            products: products(&[(10, 5, 1)]),
            wishlists: vec![
                WishlistEdge { user_id: 1, product_id: 99 },
                WishlistEdge { user_id: 42, product_id: 10 },
            ],
            interests: vec![
                InterestEdge { user_id: 42, category_id: 5 },
                InterestEdge { user_id: 1, category_id: 77 },
            ],
            ..SourceTables::default()
        };
        let matrix = InteractionMatrix::build(&tables);

        assert_eq!(0, matrix.cells().nnz());
        assert_eq!(0.0, matrix.weight(42, 10));
        assert!(matrix.is_consistent());
    }

    #[test]
    fn should_keep_weights_non_negative() {
        let matrix = InteractionMatrix::build(&scenario_tables());
        assert!(matrix.cells().data().iter().all(|value| *value >= 0.0));
    }
}
