use ndarray::Array2;
use serde_derive::{Deserialize, Serialize};

use crate::interactions::InteractionMatrix;
use crate::knn::cosine::row_cosine_similarities;
use crate::knn::{nearest_rows, Scored};

/// Dense user x user cosine similarity over interaction rows.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserSimilarityIndex {
    similarities: Array2<f64>,
}

impl UserSimilarityIndex {
    pub fn build(interactions: &InteractionMatrix) -> Self {
        UserSimilarityIndex {
            similarities: row_cosine_similarities(interactions.cells()),
        }
    }

    pub fn len(&self) -> usize {
        self.similarities.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn similarity(&self, left: usize, right: usize) -> Option<f64> {
        self.similarities.get((left, right)).copied()
    }

    /// The `how_many` most similar users to the user at `row`, never the user itself.
    pub fn neighbors_of(&self, row: usize, how_many: usize) -> Vec<Scored<usize>> {
        nearest_rows(&self.similarities, row, how_many)
    }

    pub fn matrix(&self) -> &Array2<f64> {
        &self.similarities
    }

    pub(crate) fn is_square_of(&self, size: usize) -> bool {
        self.similarities.dim() == (size, size)
    }
}
