//! Replacement driven by an ordered list of value rules.
//!
//! Rules are evaluated in order against the original values and the first
//! rule matching a row wins: rows already replaced by an earlier rule are
//! not reconsidered. The `"nan"` token has been turned into
//! [`Cell::Missing`] by the configuration parser, so it matches null cells
//! and never the string `"nan"`.

use super::ColumnContext;
use crate::config::{Aggregation, RuleAction, ValueListConfig};
use crate::error::{ReplacementError, Result};
use crate::types::{Cell, apply_patch, column_cells};
use crate::utils::is_numeric_dtype;
use polars::prelude::*;
use std::collections::HashMap;
use tracing::debug;

pub fn build_column(cfg: &ValueListConfig, ctx: &ColumnContext<'_>) -> Result<Series> {
    let cells = column_cells(&ctx.series)?;
    let mut patch: Vec<Option<Cell>> = vec![None; cells.len()];

    for (index, rule) in cfg.rules.iter().enumerate() {
        let matched: Vec<bool> = cells.iter().map(|c| c.matches(&rule.value)).collect();
        let pending: Vec<usize> = (0..cells.len())
            .filter(|&i| matched[i] && patch[i].is_none())
            .collect();

        debug!(
            "Rule {} on '{}' ({:?}) matches {} rows",
            index,
            ctx.column(),
            rule.value,
            pending.len()
        );

        if pending.is_empty() {
            continue;
        }

        match &rule.action {
            RuleAction::Replace(replacement) => {
                for i in pending {
                    patch[i] = Some(replacement.clone());
                }
            }
            RuleAction::Aggregate(agg) => {
                let remaining: Vec<&Cell> = cells
                    .iter()
                    .zip(&matched)
                    .filter(|(cell, is_match)| !**is_match && !cell.is_missing())
                    .map(|(cell, _)| cell)
                    .collect();
                let fill = aggregate(ctx, *agg, &remaining)?;
                for i in pending {
                    patch[i] = Some(fill.clone());
                }
            }
            RuleAction::Column(other) => {
                let source = column_cells(&ctx.other_column(other)?)?;
                for i in pending {
                    patch[i] = Some(source[i].clone());
                }
            }
        }
    }

    apply_patch(&ctx.series, cells, patch, ctx.output_name)
}

/// Compute an aggregate over the given cells of the target column.
///
/// Returns [`Cell::Missing`] when there is nothing to aggregate.
fn aggregate(ctx: &ColumnContext<'_>, agg: Aggregation, values: &[&Cell]) -> Result<Cell> {
    if !agg.requires_numeric() {
        return Ok(match agg {
            Aggregation::First => values.first().map(|c| (*c).clone()),
            Aggregation::Last => values.last().map(|c| (*c).clone()),
            _ => mode(values),
        }
        .unwrap_or(Cell::Missing));
    }

    let dtype = ctx.series.dtype();
    if !is_numeric_dtype(dtype) {
        return Err(ReplacementError::type_mismatch(
            ctx.column(),
            format!("cannot compute '{}' of a {} column", agg.as_str(), dtype),
        ));
    }

    // Sum, min and max of an integer column stay integral
    let integral = matches!(agg, Aggregation::Sum | Aggregation::Min | Aggregation::Max);
    if integral && dtype.is_integer() {
        if let Some(cell) = integer_aggregate(ctx, agg, values)? {
            return Ok(cell);
        }
    }

    let numbers: Vec<f64> = values.iter().filter_map(|c| c.as_f64()).collect();
    if numbers.is_empty() {
        return Ok(Cell::Missing);
    }
    let ca = Float64Chunked::from_vec(PlSmallStr::EMPTY, numbers);

    let result = match agg {
        Aggregation::Mean => ca.mean(),
        Aggregation::Median => ca.median(),
        Aggregation::Sum => ca.sum(),
        Aggregation::Min => ca.min(),
        Aggregation::Max => ca.max(),
        Aggregation::Std => ca.std(1),
        Aggregation::Var => ca.var(1),
        Aggregation::Mode | Aggregation::First | Aggregation::Last => None,
    };

    Ok(match result {
        Some(v) if v.is_nan() => Cell::Missing,
        Some(v) => Cell::Float(v),
        None => Cell::Missing,
    })
}

/// Sum, min or max computed in `i64`.
///
/// Returns `None` when a value does not fit in `i64` (large `UInt64`), in
/// which case the float path is used instead.
fn integer_aggregate(
    ctx: &ColumnContext<'_>,
    agg: Aggregation,
    values: &[&Cell],
) -> Result<Option<Cell>> {
    let mut ints = Vec::with_capacity(values.len());
    for cell in values {
        match cell {
            Cell::Int(v) => ints.push(*v),
            _ => return Ok(None),
        }
    }
    if ints.is_empty() {
        return Ok(Some(Cell::Missing));
    }

    let result = match agg {
        Aggregation::Sum => Some(
            ints.iter()
                .try_fold(0i64, |acc, v| acc.checked_add(*v))
                .ok_or_else(|| {
                    ReplacementError::type_mismatch(
                        ctx.column(),
                        "sum overflows the integer column",
                    )
                })?,
        ),
        Aggregation::Min => Int64Chunked::from_vec(PlSmallStr::EMPTY, ints).min(),
        _ => Int64Chunked::from_vec(PlSmallStr::EMPTY, ints).max(),
    };

    Ok(Some(result.map_or(Cell::Missing, Cell::Int)))
}

/// Most frequent cell; ties go to the value seen first.
fn mode(values: &[&Cell]) -> Option<Cell> {
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
    for (position, cell) in values.iter().enumerate() {
        counts
            .entry(format!("{:?}", cell))
            .or_insert((position, 0))
            .1 += 1;
    }

    counts
        .into_values()
        .max_by(|(pa, ca), (pb, cb)| ca.cmp(cb).then_with(|| pb.cmp(pa)))
        .map(|(position, _)| values[position].clone())
}
