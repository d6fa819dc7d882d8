use ndarray::parallel::prelude::*;
use ndarray::{Array2, Axis};
use sprs::CsMat;

/// Pairwise cosine similarity between the rows of `matrix`, as a dense
/// square matrix.
///
/// A row without any weight has similarity 0 to every row, itself included.
/// Every other row has exactly 1 on the diagonal. With non-negative weights
/// all entries fall in [0, 1].
pub fn row_cosine_similarities(matrix: &CsMat<f64>) -> Array2<f64> {
    let num_rows = matrix.rows();
    let squared_norms: Vec<f64> = matrix
        .outer_iterator()
        .map(|row| row.data().iter().map(|value| value * value).sum())
        .collect();

    // Column-major copy of the same cells, so each row only visits rows it overlaps with.
    let by_column = matrix.to_csc();

    let mut similarities = Array2::<f64>::zeros((num_rows, num_rows));
    similarities
        .axis_iter_mut(Axis(0))
        .into_par_iter()
        .enumerate()
        .for_each(|(row, mut similarity_row)| {
            let row_norm_sq = squared_norms[row];
            if row_norm_sq <= 0.0 {
                return;
            }
            if let Some(cells) = matrix.outer_view(row) {
                for (col, value) in cells.iter() {
                    if let Some(column) = by_column.outer_view(col) {
                        for (other, other_value) in column.iter() {
                            similarity_row[other] += value * other_value;
                        }
                    }
                }
            }
            // one square root of the product keeps indicator rows exact
            for (other, similarity) in similarity_row.iter_mut().enumerate() {
                let other_norm_sq = squared_norms[other];
                *similarity = if other == row {
                    1.0
                } else if other_norm_sq > 0.0 {
                    (*similarity / (row_norm_sq * other_norm_sq).sqrt()).clamp(0.0, 1.0)
                } else {
                    0.0
                };
            }
        });

    similarities
}
