//! Replacement of values matching a string.

use super::{ColumnContext, replace_masked};
use crate::config::StringsConfig;
use crate::error::Result;
use crate::matchers::{StringMatcher, string_mask};
use polars::prelude::*;
use tracing::debug;

/// Replace string values equal to (or, with `is_char`, containing) the
/// configured value.
pub fn build_column(cfg: &StringsConfig, ctx: &ColumnContext<'_>) -> Result<Series> {
    let matcher = StringMatcher::new(&cfg.value, cfg.ignore_case, !cfg.is_char)?;
    let mask = string_mask(&ctx.series, &matcher)?;

    debug!(
        "Replacing {} values of '{}' matching '{}' (ignore_case={}, whole_value={})",
        mask.sum().unwrap_or(0),
        ctx.column(),
        matcher.target(),
        matcher.ignore_case(),
        matcher.whole_value()
    );

    replace_masked(ctx, &mask, &cfg.replace)
}
