use super::{ColumnImputer, column_mean, create_data_matrix, target_series};
use crate::error::Result;
use polars::prelude::*;
use tracing::debug;

/// Index of the imputed column in the data matrix.
const TARGET_COL: usize = 0;

pub struct KNNImputer {
    n_neighbors: usize,
}

impl KNNImputer {
    /// Create a new KNN imputer with specified number of neighbors
    pub fn new(n_neighbors: usize) -> Self {
        Self {
            n_neighbors: n_neighbors.max(1), // Ensure at least 1 neighbor
        }
    }

    pub fn n_neighbors(&self) -> usize {
        self.n_neighbors
    }

    /// Impute a single missing value using KNN
    fn impute_value(&self, data_matrix: &[Vec<Option<f64>>], target_row: usize) -> Option<f64> {
        // Find all rows that have a non-null value in the target column
        let candidate_rows: Vec<usize> = (0..data_matrix.len())
            .filter(|&row| row != target_row && data_matrix[row][TARGET_COL].is_some())
            .collect();

        if candidate_rows.is_empty() {
            return column_mean(data_matrix, TARGET_COL);
        }

        // Calculate distances to all candidate rows
        let mut distances: Vec<(usize, f64)> = candidate_rows
            .iter()
            .map(|&candidate_row| {
                let distance = self.calculate_distance(
                    &data_matrix[target_row],
                    &data_matrix[candidate_row],
                    TARGET_COL,
                );
                (candidate_row, distance)
            })
            .collect();

        // Sort by distance (ascending)
        distances.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

        // Calculate weighted average of the K nearest neighbors
        let k = self.n_neighbors.min(distances.len());
        let mut weighted_sum = 0.0;
        let mut weight_sum = 0.0;

        for &(neighbor_row, distance) in distances.iter().take(k) {
            if let Some(value) = data_matrix[neighbor_row][TARGET_COL] {
                // Use inverse distance as weight (avoiding division by zero)
                let weight = if distance < 1e-10 {
                    1e10 // Very close neighbor gets very high weight
                } else {
                    1.0 / distance
                };

                weighted_sum += value * weight;
                weight_sum += weight;
            }
        }

        if weight_sum > 0.0 {
            Some(weighted_sum / weight_sum)
        } else {
            // No neighbor shares a predictor with this row
            column_mean(data_matrix, TARGET_COL)
        }
    }

    /// Calculate Euclidean distance between two rows, ignoring the target column and null values
    fn calculate_distance(&self, row1: &[Option<f64>], row2: &[Option<f64>], skip_col: usize) -> f64 {
        let mut sum_squared_diff = 0.0;
        let mut count = 0;

        for (col_idx, (a, b)) in row1.iter().zip(row2).enumerate() {
            if col_idx == skip_col {
                continue; // Skip the column we're imputing
            }

            if let (Some(val1), Some(val2)) = (a, b) {
                let diff = val1 - val2;
                sum_squared_diff += diff * diff;
                count += 1;
            }
        }

        if count > 0 {
            (sum_squared_diff / count as f64).sqrt() // Normalized Euclidean distance
        } else {
            f64::INFINITY // No common non-null features
        }
    }
}

impl ColumnImputer for KNNImputer {
    fn name(&self) -> &'static str {
        "knn"
    }

    fn impute(&self, target: &Series, features: &[Series]) -> Result<Series> {
        let data_matrix = create_data_matrix(target, features)?;

        debug!(
            "KNN imputing '{}' with {} neighbors and {} predictors",
            target.name(),
            self.n_neighbors,
            features.len()
        );

        let imputed_values: Vec<Option<f64>> = (0..data_matrix.len())
            .map(|row_idx| match data_matrix[row_idx][TARGET_COL] {
                Some(value) => Some(value),
                None => self.impute_value(&data_matrix, row_idx),
            })
            .collect();

        Ok(target_series(target.name(), imputed_values))
    }
}
