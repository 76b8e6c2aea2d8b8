//! Imputation module for filling missing numeric values.
//!
//! This module provides the algorithms behind the `imputer` replacement:
//! - KNN imputation
//! - Iterative (round-robin regression) imputation
//! - Statistical imputation (mean, median, most frequent, constant)
//!
//! Every imputer fills the nulls of one target column, optionally using
//! other numeric columns as predictors, and returns a `Float64` series of
//! the same length with observed values untouched.

mod iterative;
mod knn;
mod statistical;

pub use iterative::IterativeImputer;
pub use knn::KNNImputer;
pub use statistical::StatisticalImputer;

use crate::error::Result;
use crate::utils::numeric_values;
use polars::prelude::*;

/// A missing-value imputation algorithm.
pub trait ColumnImputer {
    /// Short algorithm name, used in logs.
    fn name(&self) -> &'static str;

    /// Fill the missing values of `target`, using `features` as predictors
    /// where the algorithm supports it.
    fn impute(&self, target: &Series, features: &[Series]) -> Result<Series>;
}

/// Row-major matrix of the target column (index 0) followed by the features.
pub(crate) fn create_data_matrix(
    target: &Series,
    features: &[Series],
) -> Result<Vec<Vec<Option<f64>>>> {
    let n_rows = target.len();
    let n_cols = features.len() + 1;
    let mut matrix = vec![vec![None; n_cols]; n_rows];

    for (col_idx, series) in std::iter::once(target).chain(features).enumerate() {
        let values = numeric_values(series)?;
        for (row, value) in matrix.iter_mut().zip(values) {
            row[col_idx] = value;
        }
    }

    Ok(matrix)
}

/// Mean of the observed values of one matrix column.
pub(crate) fn column_mean(matrix: &[Vec<Option<f64>>], col_idx: usize) -> Option<f64> {
    let (sum, count) = matrix
        .iter()
        .filter_map(|row| row[col_idx])
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Build the output series from the target column of a filled matrix.
pub(crate) fn target_series(name: &PlSmallStr, values: Vec<Option<f64>>) -> Series {
    Series::new(name.clone(), values)
}
