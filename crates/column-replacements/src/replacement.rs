//! The column replacement facade.

use crate::code;
use crate::config::{ReplacementRequest, ReplacementStrategy};
use crate::error::{Result, ResultExt};
use crate::registry::DatasetRegistry;
use crate::resolvers::{self, ColumnContext};
use polars::prelude::*;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

/// A replacement of the values of one dataset column.
///
/// The configuration is parsed and validated on construction; the dataset is
/// only looked up when [`build_replacements`](Self::build_replacements) runs,
/// so a replacement can be built before its data is registered.
///
/// # Example
///
/// ```rust,ignore
/// use column_replacements::{ColumnReplacement, InMemoryRegistry};
/// use serde_json::json;
/// use std::sync::Arc;
///
/// let registry = Arc::new(InMemoryRegistry::new());
/// registry.insert("1", df);
///
/// let replacement = ColumnReplacement::new(
///     registry,
///     "1",
///     "a",
///     "strings",
///     &json!({"value": "unknown", "ignoreCase": true}),
/// )?;
///
/// let column = replacement.build_replacements()?;
/// println!("{}", replacement.build_code());
/// ```
pub struct ColumnReplacement {
    registry: Arc<dyn DatasetRegistry>,
    data_id: String,
    col: String,
    name: String,
    strategy: ReplacementStrategy,
}

static_assertions::assert_impl_all!(ColumnReplacement: Send, Sync);

impl ColumnReplacement {
    /// Parse `cfg` for the strategy named by `type_tag`.
    ///
    /// Unknown tags and missing or invalid options are configuration errors.
    pub fn new(
        registry: Arc<dyn DatasetRegistry>,
        data_id: impl Into<String>,
        col: impl Into<String>,
        type_tag: &str,
        cfg: &Value,
    ) -> Result<Self> {
        let strategy = ReplacementStrategy::parse(type_tag, cfg)?;
        Ok(Self::with_strategy(registry, data_id, col, strategy))
    }

    /// Build from an already parsed strategy.
    pub fn with_strategy(
        registry: Arc<dyn DatasetRegistry>,
        data_id: impl Into<String>,
        col: impl Into<String>,
        strategy: ReplacementStrategy,
    ) -> Self {
        let col = col.into();
        Self {
            registry,
            data_id: data_id.into(),
            name: col.clone(),
            col,
            strategy,
        }
    }

    /// Build from a serialized request.
    pub fn from_request(
        registry: Arc<dyn DatasetRegistry>,
        request: ReplacementRequest,
    ) -> Result<Self> {
        let replacement = Self::new(
            registry,
            request.data_id,
            request.col,
            &request.replacement_type,
            &request.cfg,
        )?;
        Ok(match request.name {
            Some(name) => replacement.with_name(name),
            None => replacement,
        })
    }

    /// Name the output column. Default: the input column's name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn data_id(&self) -> &str {
        &self.data_id
    }

    pub fn col(&self) -> &str {
        &self.col
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn strategy(&self) -> &ReplacementStrategy {
        &self.strategy
    }

    /// Compute the replaced column.
    ///
    /// The result has the same length and row order as the input column. The
    /// registered dataset is not modified.
    pub fn build_replacements(&self) -> Result<Series> {
        let df = self.registry.get(&self.data_id)?;
        let ctx = ColumnContext::new(&df, &self.data_id, &self.col, &self.name)?;

        info!(
            "Building {} replacement for '{}' of dataset '{}'",
            self.strategy.replacement_type(),
            self.col,
            self.data_id
        );

        let series = match &self.strategy {
            ReplacementStrategy::Spaces(cfg) => resolvers::spaces::build_column(cfg, &ctx),
            ReplacementStrategy::Strings(cfg) => resolvers::strings::build_column(cfg, &ctx),
            ReplacementStrategy::ValueList(cfg) => resolvers::value_list::build_column(cfg, &ctx),
            ReplacementStrategy::Imputer(cfg) => resolvers::imputer::build_column(cfg, &ctx),
        }
        .context(format!(
            "{} replacement of '{}'",
            self.strategy.replacement_type(),
            self.col
        ))?;

        info!(
            "Replacement of '{}' done: {} -> {} nulls",
            self.col,
            ctx.series.null_count(),
            series.null_count()
        );

        Ok(series)
    }

    /// Render code reproducing this replacement. Never empty.
    pub fn build_code(&self) -> String {
        code::build_code(&self.strategy, &self.col, &self.name)
    }
}
