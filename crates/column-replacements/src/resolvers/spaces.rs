//! Replacement of blank (empty or whitespace-only) strings.

use super::{ColumnContext, replace_masked};
use crate::config::SpacesConfig;
use crate::error::Result;
use crate::matchers::blank_mask;
use polars::prelude::*;
use tracing::debug;

/// Replace blank strings with the configured value (missing by default).
pub fn build_column(cfg: &SpacesConfig, ctx: &ColumnContext<'_>) -> Result<Series> {
    let mask = blank_mask(&ctx.series)?;

    debug!(
        "Replacing {} blank values in '{}' with {:?}",
        mask.sum().unwrap_or(0),
        ctx.column(),
        cfg.replace
    );

    replace_masked(ctx, &mask, &cfg.replace)
}
