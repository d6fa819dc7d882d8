use itertools::Itertools;
use ndarray::Array2;
use serde_derive::{Deserialize, Serialize};
use sprs::{CsMat, TriMat};

use crate::io::Product;
use crate::knn::cosine::row_cosine_similarities;
use crate::knn::index_map::IdIndex;
use crate::knn::{nearest_rows, Scored};

/// Dense product x product cosine similarity over categorical attributes.
///
/// Every product is encoded as one indicator column for its category plus one
/// for its brand, so two products score 1.0 when both match, 0.5 when exactly
/// one does and 0.0 otherwise.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductFeatureIndex {
    similarities: Array2<f64>,
    num_category_columns: usize,
    num_brand_columns: usize,
}

impl ProductFeatureIndex {
    /// Rows follow `product_positions`; a product id listed twice keeps its first record.
    pub fn build(products: &[Product], product_positions: &IdIndex) -> Self {
        let positioned: Vec<(usize, &Product)> = products
            .iter()
            .unique_by(|product| product.id)
            .filter_map(|product| Some((product_positions.index_of(product.id)?, product)))
            .collect();

        let categories = IdIndex::from_ids(positioned.iter().map(|(_, p)| p.category_id));
        let brands = IdIndex::from_ids(positioned.iter().map(|(_, p)| p.brand_id));
        let brand_offset = categories.len();

        let mut indicators = TriMat::new((product_positions.len(), categories.len() + brands.len()));
        for (row, product) in positioned.iter() {
            if let (Some(category_col), Some(brand_col)) = (
                categories.index_of(product.category_id),
                brands.index_of(product.brand_id),
            ) {
                indicators.add_triplet(*row, category_col, 1.0);
                indicators.add_triplet(*row, brand_col + brand_offset, 1.0);
            }
        }
        let features: CsMat<f64> = indicators.to_csr();

        ProductFeatureIndex {
            similarities: row_cosine_similarities(&features),
            num_category_columns: categories.len(),
            num_brand_columns: brands.len(),
        }
    }

    pub fn len(&self) -> usize {
        self.similarities.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Width of the indicator encoding: distinct categories plus distinct brands.
    pub fn num_features(&self) -> usize {
        self.num_category_columns + self.num_brand_columns
    }

    pub fn similarity(&self, left: usize, right: usize) -> Option<f64> {
        self.similarities.get((left, right)).copied()
    }

    /// The `how_many` products closest to the one at `row`, excluding itself.
    pub fn similar_to(&self, row: usize, how_many: usize) -> Vec<Scored<usize>> {
        nearest_rows(&self.similarities, row, how_many)
    }

    pub fn matrix(&self) -> &Array2<f64> {
        &self.similarities
    }

    pub(crate) fn is_square_of(&self, size: usize) -> bool {
        self.similarities.dim() == (size, size)
    }
}

#[cfg(test)]
mod product_index_test {
    use super::*;
    use crate::test_fixtures::products;

    fn index_for(products: &[Product]) -> ProductFeatureIndex {
        let positions = IdIndex::from_ids(products.iter().map(|p| p.id));
        ProductFeatureIndex::build(products, &positions)
    }

    #[test]
    fn should_score_shared_attributes() {
        // (id, category, brand)
        let catalogue = products(&[(1, 100, 7), (2, 100, 7), (3, 100, 8), (4, 200, 9)]);
        let index = index_for(&catalogue);

        assert_eq!(4, index.len());
        assert_eq!(2 + 3, index.num_features());
        assert_eq!(Some(1.0), index.similarity(0, 1));
        assert_eq!(Some(0.5), index.similarity(0, 2));
        assert_eq!(Some(0.0), index.similarity(0, 3));
        for row in 0..4 {
            assert_eq!(Some(1.0), index.similarity(row, row));
        }
    }

    #[test]
    fn should_return_top_similar_with_index_tie_break() {
        let catalogue = products(&[(1, 100, 7), (2, 200, 7), (3, 100, 8), (4, 100, 7)]);
        let index = index_for(&catalogue);

        let similar: Vec<usize> = index.similar_to(0, 2).iter().map(|s| s.id).collect();
        // product 4 matches both attributes, products 2 and 3 tie at 0.5
        assert_eq!(vec![3, 1], similar);
        assert!(index.similar_to(9, 2).is_empty());
    }

    #[test]
    fn should_keep_first_record_of_duplicate_product() {
        let catalogue = products(&[(1, 100, 7), (1, 200, 8), (2, 100, 7)]);
        let index = index_for(&catalogue);

        assert_eq!(2, index.len());
        assert_eq!(Some(1.0), index.similarity(0, 1));
        // the ignored record of product 1 adds no category or brand column
        assert_eq!(1 + 1, index.num_features());
    }

    #[test]
    fn should_ignore_products_without_a_position() {
        let catalogue = products(&[(1, 100, 7), (2, 300, 9), (3, 100, 7)]);
        let positions = IdIndex::from_ids([1, 3]);
        let index = ProductFeatureIndex::build(&catalogue, &positions);

        assert_eq!(2, index.len());
        assert_eq!(2, index.num_features());
        assert_eq!(Some(1.0), index.similarity(0, 1));
    }
}
