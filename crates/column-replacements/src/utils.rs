//! Shared utilities for the replacement resolvers.
//!
//! This module contains dtype checks and column extraction helpers
//! used across multiple modules.

use crate::error::{ReplacementError, Result};
use polars::prelude::*;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Check if a DataType holds text.
#[inline]
pub fn is_string_like_dtype(dtype: &DataType) -> bool {
    matches!(dtype, DataType::String | DataType::Categorical(_, _))
}

// =============================================================================
// Column Utilities
// =============================================================================

/// Fetch a column from a dataset as a materialized `Series`.
pub fn get_series(df: &DataFrame, data_id: &str, column: &str) -> Result<Series> {
    df.column(column)
        .map(|c| c.as_materialized_series().clone())
        .map_err(|_| ReplacementError::ColumnNotFound {
            data_id: data_id.to_string(),
            column: column.to_string(),
        })
}

/// Read a numeric column as `f64` values (nulls and NaN become `None`).
///
/// Fails with a type error for non-numeric columns.
pub fn numeric_values(series: &Series) -> Result<Vec<Option<f64>>> {
    if !is_numeric_dtype(series.dtype()) && series.dtype() != &DataType::Null {
        return Err(ReplacementError::type_mismatch(
            series.name().as_str(),
            format!("expected a numeric column, found {}", series.dtype()),
        ));
    }

    let float_series = series.cast(&DataType::Float64)?;
    let values = float_series
        .f64()?
        .into_iter()
        .map(|v| v.filter(|x| !x.is_nan()))
        .collect();
    Ok(values)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_numeric_dtype() {
        assert!(is_numeric_dtype(&DataType::Int64));
        assert!(is_numeric_dtype(&DataType::Float64));
        assert!(!is_numeric_dtype(&DataType::String));
        assert!(!is_numeric_dtype(&DataType::Boolean));
    }

    #[test]
    fn test_get_series_missing_column() {
        let df = df!["a" => [1, 2]].unwrap();
        let err = get_series(&df, "1", "zz").unwrap_err();
        assert!(err.is_lookup());
        assert!(err.to_string().contains("zz"));
    }

    #[test]
    fn test_numeric_values() {
        let series = Series::new("d".into(), &[Some(1i32), None, Some(3)]);
        assert_eq!(
            numeric_values(&series).unwrap(),
            vec![Some(1.0), None, Some(3.0)]
        );
    }

    #[test]
    fn test_numeric_values_rejects_strings() {
        let series = Series::new("a".into(), &["x", "y"]);
        let err = numeric_values(&series).unwrap_err();
        assert_eq!(err.error_code(), "TYPE_MISMATCH");
    }
}
