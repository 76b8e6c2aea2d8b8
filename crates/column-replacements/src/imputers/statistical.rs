//! Statistical imputation methods.
//!
//! Provides mean, median, most-frequent and constant imputation. These are
//! univariate, so predictor columns are ignored.

use super::{ColumnImputer, target_series};
use crate::config::SimpleStrategy;
use crate::error::Result;
use crate::utils::numeric_values;
use polars::prelude::*;
use std::collections::HashMap;
use tracing::debug;

/// Statistical imputation for filling missing values.
pub struct StatisticalImputer {
    strategy: SimpleStrategy,
    fill_value: f64,
}

impl StatisticalImputer {
    pub fn new(strategy: SimpleStrategy, fill_value: f64) -> Self {
        Self {
            strategy,
            fill_value,
        }
    }

    /// Mean imputation.
    pub fn mean() -> Self {
        Self::new(SimpleStrategy::Mean, 0.0)
    }

    /// Compute the value used to fill the column's nulls.
    fn fill_value_for(&self, values: &[Option<f64>]) -> Option<f64> {
        let observed: Vec<f64> = values.iter().flatten().copied().collect();
        let observed_series = Series::new(PlSmallStr::EMPTY, &observed);

        match self.strategy {
            SimpleStrategy::Mean => observed_series.mean(),
            SimpleStrategy::Median => observed_series.median(),
            SimpleStrategy::MostFrequent => most_frequent(observed.into_iter()),
            SimpleStrategy::Constant => Some(self.fill_value),
        }
    }
}

/// Most frequent value; ties resolve to the smallest value.
fn most_frequent(values: impl Iterator<Item = f64>) -> Option<f64> {
    let mut counts: HashMap<u64, (f64, usize)> = HashMap::new();
    for value in values {
        counts.entry(value.to_bits()).or_insert((value, 0)).1 += 1;
    }

    counts
        .into_values()
        .max_by(|(va, ca), (vb, cb)| {
            ca.cmp(cb)
                .then_with(|| vb.partial_cmp(va).unwrap_or(std::cmp::Ordering::Equal))
        })
        .map(|(value, _)| value)
}

impl ColumnImputer for StatisticalImputer {
    fn name(&self) -> &'static str {
        "simple"
    }

    fn impute(&self, target: &Series, _features: &[Series]) -> Result<Series> {
        let values = numeric_values(target)?;
        let fill = self.fill_value_for(&values);

        debug!(
            "Filling '{}' with {}: {:?}",
            target.name(),
            self.strategy.as_str(),
            fill
        );

        let filled = values.into_iter().map(|v| v.or(fill)).collect();
        Ok(target_series(target.name(), filled))
    }
}
