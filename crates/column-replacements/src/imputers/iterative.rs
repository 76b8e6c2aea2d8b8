//! Iterative imputation.
//!
//! Missing entries start at their column mean, then each column with gaps is
//! regressed (ridge, with intercept) on every other column in turn and its
//! missing entries are replaced by the predictions. Rounds repeat until the
//! largest update falls below `tol` times the largest observed magnitude, or
//! `max_iter` rounds have run. With no predictors the result is the mean
//! fill.

use super::{ColumnImputer, column_mean, create_data_matrix, target_series};
use crate::error::Result;
use polars::prelude::*;
use tracing::debug;

/// L2 penalty of the per-column regressions.
const RIDGE_ALPHA: f64 = 1e-3;

pub struct IterativeImputer {
    max_iter: usize,
    tol: f64,
}

impl IterativeImputer {
    pub fn new(max_iter: usize, tol: f64) -> Self {
        Self {
            max_iter: max_iter.max(1),
            tol,
        }
    }
}

impl ColumnImputer for IterativeImputer {
    fn name(&self) -> &'static str {
        "iterative"
    }

    fn impute(&self, target: &Series, features: &[Series]) -> Result<Series> {
        let matrix = create_data_matrix(target, features)?;
        let n_rows = matrix.len();
        let n_cols = features.len() + 1;

        // Columns without a single observed value cannot be filled or used.
        let means: Vec<Option<f64>> = (0..n_cols).map(|c| column_mean(&matrix, c)).collect();
        if means[0].is_none() {
            let untouched = matrix.iter().map(|row| row[0]).collect();
            return Ok(target_series(target.name(), untouched));
        }
        let usable: Vec<usize> = (0..n_cols).filter(|&c| means[c].is_some()).collect();

        let mut filled: Vec<Vec<f64>> = matrix
            .iter()
            .map(|row| {
                usable
                    .iter()
                    .map(|&c| row[c].or(means[c]).unwrap_or_default())
                    .collect()
            })
            .collect();

        if usable.len() > 1 {
            let scale = matrix
                .iter()
                .flat_map(|row| usable.iter().filter_map(move |&c| row[c]))
                .fold(0.0_f64, |acc, v| acc.max(v.abs()));

            for round in 0..self.max_iter {
                let mut max_change = 0.0_f64;

                for (k, &col) in usable.iter().enumerate() {
                    let (observed, missing): (Vec<usize>, Vec<usize>) =
                        (0..n_rows).partition(|&row| matrix[row][col].is_some());
                    if missing.is_empty() || observed.is_empty() {
                        continue;
                    }

                    let model = RidgeModel::fit(&filled, &observed, k);
                    for &row in &missing {
                        let prediction = model.predict(&filled[row], k);
                        max_change = max_change.max((prediction - filled[row][k]).abs());
                        filled[row][k] = prediction;
                    }
                }

                debug!(
                    "Iterative imputation of '{}': round {} max change {:.6}",
                    target.name(),
                    round + 1,
                    max_change
                );

                if max_change < self.tol * scale {
                    break;
                }
            }
        }

        let values = filled.into_iter().map(|row| Some(row[0])).collect();
        Ok(target_series(target.name(), values))
    }
}

/// Linear model predicting one column of the filled matrix from the others.
struct RidgeModel {
    intercept: f64,
    /// One coefficient per predictor, in column order without the target.
    coefficients: Vec<f64>,
}

impl RidgeModel {
    fn fit(filled: &[Vec<f64>], rows: &[usize], target: usize) -> Self {
        let n_cols = filled[0].len();
        let predictors: Vec<usize> = (0..n_cols).filter(|&c| c != target).collect();
        let p = predictors.len();
        let n = rows.len() as f64;

        let y_mean = rows.iter().map(|&r| filled[r][target]).sum::<f64>() / n;
        let x_means: Vec<f64> = predictors
            .iter()
            .map(|&c| rows.iter().map(|&r| filled[r][c]).sum::<f64>() / n)
            .collect();

        // Normal equations on centered data: (XᵀX + αI) β = Xᵀy
        let mut gram = vec![vec![0.0; p]; p];
        let mut rhs = vec![0.0; p];
        for &r in rows {
            let y = filled[r][target] - y_mean;
            for i in 0..p {
                let xi = filled[r][predictors[i]] - x_means[i];
                rhs[i] += xi * y;
                for j in 0..p {
                    gram[i][j] += xi * (filled[r][predictors[j]] - x_means[j]);
                }
            }
        }
        for (i, row) in gram.iter_mut().enumerate() {
            row[i] += RIDGE_ALPHA;
        }

        let coefficients = solve(gram, rhs).unwrap_or_else(|| vec![0.0; p]);
        let intercept = y_mean
            - coefficients
                .iter()
                .zip(&x_means)
                .map(|(b, m)| b * m)
                .sum::<f64>();

        Self {
            intercept,
            coefficients,
        }
    }

    fn predict(&self, row: &[f64], target: usize) -> f64 {
        let predictors = row
            .iter()
            .enumerate()
            .filter(|(c, _)| *c != target)
            .map(|(_, v)| *v);
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(predictors)
                .map(|(b, x)| b * x)
                .sum::<f64>()
    }
}

/// Gaussian elimination with partial pivoting. `None` if singular.
fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Option<Vec<f64>> {
    let n = b.len();
    for col in 0..n {
        let pivot = (col..n).max_by(|&i, &j| {
            a[i][col]
                .abs()
                .partial_cmp(&a[j][col].abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })?;
        if a[pivot][col].abs() < 1e-12 {
            return None;
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in (col + 1)..n {
            let factor = a[row][col] / a[col][col];
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = ((row + 1)..n).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }
    Some(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value_at(series: &Series, idx: usize) -> f64 {
        series.get(idx).unwrap().try_extract::<f64>().unwrap()
    }

    #[test]
    fn test_single_column_uses_mean() {
        let target = Series::new("d".into(), &[Some(1.1), None, Some(3.0)]);

        let result = IterativeImputer::new(10, 1e-3).impute(&target, &[]).unwrap();

        assert_eq!(result.null_count(), 0);
        assert_eq!(value_at(&result, 0), 1.1);
        assert!((value_at(&result, 1) - 2.05).abs() < 1e-12);
        assert_eq!(value_at(&result, 2), 3.0);
    }

    #[test]
    fn test_linear_relationship_is_recovered() {
        let feature = Series::new("x".into(), &[1.0, 2.0, 3.0, 4.0]);
        let target = Series::new("y".into(), &[Some(2.0), Some(4.0), None, Some(8.0)]);

        let result = IterativeImputer::new(10, 1e-3)
            .impute(&target, &[feature])
            .unwrap();

        assert!((value_at(&result, 2) - 6.0).abs() < 0.01);
        assert_eq!(value_at(&result, 3), 8.0);
    }

    #[test]
    fn test_missing_predictor_values_are_tolerated() {
        let feature = Series::new("x".into(), &[Some(1.0), None, Some(3.0), Some(4.0)]);
        let target = Series::new("y".into(), &[Some(10.0), Some(20.0), None, Some(40.0)]);

        let result = IterativeImputer::new(10, 1e-3)
            .impute(&target, &[feature])
            .unwrap();

        assert_eq!(result.null_count(), 0);
        let imputed = value_at(&result, 2);
        assert!(imputed > 20.0 && imputed < 40.0);
    }

    #[test]
    fn test_all_null_target_is_left_missing() {
        let target = Series::new("y".into(), &[Option::<f64>::None, None]);
        let result = IterativeImputer::new(10, 1e-3).impute(&target, &[]).unwrap();
        assert_eq!(result.null_count(), 2);
    }

    #[test]
    fn test_solve() {
        // 2x + y = 5, x + 3y = 10 => x = 1, y = 3
        let x = solve(vec![vec![2.0, 1.0], vec![1.0, 3.0]], vec![5.0, 10.0]).unwrap();
        assert!((x[0] - 1.0).abs() < 1e-12);
        assert!((x[1] - 3.0).abs() < 1e-12);
        assert!(solve(vec![vec![0.0]], vec![1.0]).is_none());
    }
}
