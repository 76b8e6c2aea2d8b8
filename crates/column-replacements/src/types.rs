//! Core value types shared by the replacement resolvers.
//!
//! A polars `Series` is typed, but replacement rules are written against
//! individual values of whatever kind a frontend sent. [`Cell`] is the
//! row-level view the resolvers work on; a resolver returns a patch
//! (`Vec<Option<Cell>>`, `None` meaning "keep the original") which
//! [`apply_patch`] folds back into a new `Series` of the same length.

use crate::error::{ReplacementError, Result};
use crate::utils::is_string_like_dtype;
use polars::prelude::*;
use serde_json::Value;

/// Configuration token that stands for the missing-value marker.
///
/// Frontends cannot send a real NaN through JSON, so rule values and
/// replacement values spelled `"nan"` are translated into [`Cell::Missing`]
/// when the configuration is parsed. The token is never applied to string
/// patterns of the `strings` strategy.
pub const MISSING_TOKEN: &str = "nan";

/// A single column value.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// Null (or NaN) value.
    Missing,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// A value of a dtype the resolvers do not rewrite (dates, lists, ...),
    /// kept as its display form. Never matches a rule.
    Other(String),
}

impl Cell {
    /// Convert a polars value into a cell.
    pub fn from_any_value(value: &AnyValue<'_>) -> Self {
        match value {
            AnyValue::Null => Cell::Missing,
            AnyValue::Boolean(b) => Cell::Bool(*b),
            AnyValue::String(s) => Cell::Str((*s).to_string()),
            AnyValue::StringOwned(s) => Cell::Str(s.to_string()),
            AnyValue::Int8(v) => Cell::Int(i64::from(*v)),
            AnyValue::Int16(v) => Cell::Int(i64::from(*v)),
            AnyValue::Int32(v) => Cell::Int(i64::from(*v)),
            AnyValue::Int64(v) => Cell::Int(*v),
            AnyValue::UInt8(v) => Cell::Int(i64::from(*v)),
            AnyValue::UInt16(v) => Cell::Int(i64::from(*v)),
            AnyValue::UInt32(v) => Cell::Int(i64::from(*v)),
            AnyValue::UInt64(v) => match i64::try_from(*v) {
                Ok(v) => Cell::Int(v),
                Err(_) => Cell::Float(*v as f64),
            },
            AnyValue::Float32(v) => Cell::from_f64(f64::from(*v)),
            AnyValue::Float64(v) => Cell::from_f64(*v),
            other => Cell::Other(format!("{}", other)),
        }
    }

    /// NaN is folded into the missing marker.
    fn from_f64(value: f64) -> Self {
        if value.is_nan() {
            Cell::Missing
        } else {
            Cell::Float(value)
        }
    }

    /// Parse a configuration value, translating the [`MISSING_TOKEN`].
    pub fn from_config(value: &Value) -> Result<Self> {
        match value {
            Value::Null => Ok(Cell::Missing),
            Value::Bool(b) => Ok(Cell::Bool(*b)),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Cell::Int(i))
                } else if let Some(f) = n.as_f64() {
                    Ok(Cell::from_f64(f))
                } else {
                    Err(ReplacementError::InvalidConfig(format!(
                        "unsupported number '{}'",
                        n
                    )))
                }
            }
            Value::String(s) if s == MISSING_TOKEN => Ok(Cell::Missing),
            Value::String(s) => Ok(Cell::Str(s.clone())),
            Value::Array(_) | Value::Object(_) => Err(ReplacementError::InvalidConfig(format!(
                "expected a scalar value, got {}",
                value
            ))),
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Cell::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Text form of the cell, used when a column ends up holding mixed kinds.
    pub fn to_text(&self) -> Option<String> {
        match self {
            Cell::Missing => None,
            Cell::Bool(b) => Some(b.to_string()),
            Cell::Int(v) => Some(v.to_string()),
            Cell::Float(v) => Some(v.to_string()),
            Cell::Str(s) | Cell::Other(s) => Some(s.clone()),
        }
    }

    /// Numeric view of the cell (ints and floats only).
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Int(v) => Some(*v as f64),
            Cell::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Rule equality: values only match cells of the same kind.
    ///
    /// Ints and floats compare numerically, missing matches missing, and a
    /// string never matches a number (no coercion).
    pub fn matches(&self, other: &Cell) -> bool {
        match (self, other) {
            (Cell::Missing, Cell::Missing) => true,
            (Cell::Bool(a), Cell::Bool(b)) => a == b,
            (Cell::Str(a), Cell::Str(b)) => a == b,
            (Cell::Other(_), _) | (_, Cell::Other(_)) => false,
            (a, b) => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => x == y,
                _ => false,
            },
        }
    }
}

/// Read every row of a column as a [`Cell`].
///
/// Categorical columns are read through their string representation.
pub fn column_cells(series: &Series) -> Result<Vec<Cell>> {
    let series = if matches!(series.dtype(), DataType::Categorical(_, _)) {
        series.cast(&DataType::String)?
    } else {
        series.clone()
    };

    let mut cells = Vec::with_capacity(series.len());
    for i in 0..series.len() {
        let value = series.get(i)?;
        cells.push(Cell::from_any_value(&value));
    }
    Ok(cells)
}

/// Merge a patch into the original cells and build the output column.
///
/// When the patch is empty the input is returned unchanged (renamed to
/// `name`), so untouched columns keep their exact dtype.
pub fn apply_patch(
    series: &Series,
    cells: Vec<Cell>,
    patch: Vec<Option<Cell>>,
    name: &str,
) -> Result<Series> {
    debug_assert_eq!(cells.len(), patch.len());

    if patch.iter().all(Option::is_none) {
        return Ok(renamed(series, name));
    }

    let merged: Vec<Cell> = cells
        .into_iter()
        .zip(patch)
        .map(|(original, replacement)| replacement.unwrap_or(original))
        .collect();

    cells_to_series(name, &merged, series.dtype())
}

/// Clone of `series` under a new name.
pub fn renamed(series: &Series, name: &str) -> Series {
    let mut out = series.clone();
    out.rename(name.into());
    out
}

/// Build a `Series` from cells, inferring the dtype from their kinds.
///
/// Cells of more than one kind (strings, booleans, numbers) produce a
/// `String` column with the other cells written out as text. `fallback` is
/// used when every cell is missing, and to narrow an all-int result back to
/// the original integer width.
pub fn cells_to_series(name: &str, cells: &[Cell], fallback: &DataType) -> Result<Series> {
    let mut has_str = false;
    let mut has_bool = false;
    let mut has_int = false;
    let mut has_float = false;

    for cell in cells {
        match cell {
            Cell::Missing => {}
            Cell::Bool(_) => has_bool = true,
            Cell::Int(_) => has_int = true,
            Cell::Float(_) => has_float = true,
            Cell::Str(_) => has_str = true,
            Cell::Other(value) => {
                return Err(ReplacementError::type_mismatch(
                    name,
                    format!("cannot rewrite values of dtype {} (e.g. '{}')", fallback, value),
                ));
            }
        }
    }

    let numeric = has_int || has_float;
    let kinds = [has_str, has_bool, numeric].iter().filter(|k| **k).count();

    let series = if kinds > 1 {
        // Mixed kinds are kept as text
        let values: Vec<Option<String>> = cells.iter().map(Cell::to_text).collect();
        Series::new(name.into(), values)
    } else if has_str {
        let values: Vec<Option<&str>> = cells.iter().map(Cell::as_str).collect();
        Series::new(name.into(), values)
    } else if has_bool {
        let values: Vec<Option<bool>> = cells
            .iter()
            .map(|c| match c {
                Cell::Bool(b) => Some(*b),
                _ => None,
            })
            .collect();
        Series::new(name.into(), values)
    } else if has_float {
        let values: Vec<Option<f64>> = cells.iter().map(Cell::as_f64).collect();
        Series::new(name.into(), values)
    } else if has_int {
        let values: Vec<Option<i64>> = cells
            .iter()
            .map(|c| match c {
                Cell::Int(v) => Some(*v),
                _ => None,
            })
            .collect();
        let series = Series::new(name.into(), values);
        if fallback.is_integer() && fallback != &DataType::Int64 {
            // Values outside the original width keep the column Int64
            series.strict_cast(fallback).unwrap_or(series)
        } else {
            series
        }
    } else {
        let dtype = if is_string_like_dtype(fallback) {
            DataType::String
        } else {
            fallback.clone()
        };
        Series::full_null(name.into(), cells.len(), &dtype)
    };

    Ok(series)
}
