//! Strategy resolvers.
//!
//! Each resolver turns the target column (and, where needed, other columns
//! of the same dataset) into a new column of identical length and order:
//! - [`spaces`]: blank strings
//! - [`strings`]: string matching
//! - [`value_list`]: ordered value rules with optional aggregation
//! - [`imputer`]: statistical imputation

pub mod imputer;
pub mod spaces;
pub mod strings;
pub mod value_list;

use crate::error::Result;
use crate::types::{Cell, apply_patch, column_cells, renamed};
use crate::utils::get_series;
use polars::prelude::*;

/// Everything a resolver may read while building a column.
pub struct ColumnContext<'a> {
    /// Dataset the column belongs to.
    pub df: &'a DataFrame,
    /// Registry id of the dataset, for error messages.
    pub data_id: &'a str,
    /// The column being rewritten.
    pub series: Series,
    /// Name of the produced column.
    pub output_name: &'a str,
}

impl<'a> ColumnContext<'a> {
    pub fn new(
        df: &'a DataFrame,
        data_id: &'a str,
        column: &str,
        output_name: &'a str,
    ) -> Result<Self> {
        let series = get_series(df, data_id, column)?;
        Ok(Self {
            df,
            data_id,
            series,
            output_name,
        })
    }

    /// Name of the column being rewritten.
    pub fn column(&self) -> &str {
        self.series.name().as_str()
    }

    /// Fetch another column of the same dataset.
    pub fn other_column(&self, name: &str) -> Result<Series> {
        get_series(self.df, self.data_id, name)
    }
}

/// Replace every row selected by `mask` with `replacement`.
pub(crate) fn replace_masked(
    ctx: &ColumnContext<'_>,
    mask: &BooleanChunked,
    replacement: &Cell,
) -> Result<Series> {
    let patch: Vec<Option<Cell>> = mask
        .into_iter()
        .map(|selected| selected.unwrap_or(false).then(|| replacement.clone()))
        .collect();

    if patch.iter().all(Option::is_none) {
        return Ok(renamed(&ctx.series, ctx.output_name));
    }

    let cells = column_cells(&ctx.series)?;
    apply_patch(&ctx.series, cells, patch, ctx.output_name)
}


#[cfg(test)]
mod tests {
    use super::test_support::replacements_data;
    use super::*;

    #[test]
    fn test_context_missing_column() {
        let df = replacements_data();
        let err = ColumnContext::new(&df, "1", "zz", "zz").err().unwrap();
        assert!(err.is_lookup());
    }

    #[test]
    fn test_replace_masked_no_match_keeps_series() {
        let df = replacements_data();
        let ctx = ColumnContext::new(&df, "1", "d", "d").unwrap();
        let mask = BooleanChunked::full("d".into(), false, 3);

        let out = replace_masked(&ctx, &mask, &Cell::Missing).unwrap();
        assert!(out.equals_missing(&ctx.series));
    }
}
