//! Column Replacements Library
//!
//! Rewrites the values of a single dataset column according to a declared
//! replacement strategy, built on Polars.
//!
//! # Overview
//!
//! Four strategies are available:
//!
//! - **Spaces**: blank and whitespace-only strings become missing (or a given value)
//! - **Strings**: values equal to, or containing, a string are replaced
//! - **Value list**: ordered `value -> replacement` rules, where a replacement
//!   can be a literal, an aggregate of the rest of the column, or another column
//! - **Imputer**: missing numbers are filled by iterative, KNN or simple imputation
//!
//! Every replacement can also render an equivalent pandas snippet with
//! [`ColumnReplacement::build_code`].
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use column_replacements::{ColumnReplacement, InMemoryRegistry};
//! use polars::prelude::*;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let registry = Arc::new(InMemoryRegistry::new());
//! registry.insert("1", df!["e" => [Some("a"), None, Some("b")]]?);
//!
//! let replacement = ColumnReplacement::new(
//!     registry,
//!     "1",
//!     "e",
//!     "value",
//!     &json!({"value": [{"value": "nan", "replace": "for test"}]}),
//! )?;
//!
//! let column = replacement.build_replacements()?; // ["a", "for test", "b"]
//! println!("{}", replacement.build_code());
//! ```
//!
//! # Configuration
//!
//! Strategy options arrive as JSON with camelCase keys and are parsed into
//! [`ReplacementStrategy`] once, on construction. The token `"nan"` stands for
//! the missing value wherever a value or replacement is expected. See the
//! [`config`] module for the options of each strategy.

pub mod code;
pub mod config;
pub mod error;
pub mod imputers;
pub mod matchers;
pub mod registry;
pub mod replacement;
pub mod resolvers;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use config::{
    Aggregation, ImputerAlgorithm, ImputerConfig, ReplacementRequest, ReplacementStrategy,
    ReplacementType, SimpleStrategy, SpacesConfig, StringsConfig, ValueListConfig, ValueRule,
};
pub use error::{ErrorKind, ReplacementError, Result as ReplacementResult, ResultExt};
pub use imputers::{ColumnImputer, IterativeImputer, KNNImputer, StatisticalImputer};
pub use matchers::{is_blank, matches};
pub use registry::{DatasetRegistry, InMemoryRegistry};
pub use replacement::ColumnReplacement;
pub use types::{Cell, MISSING_TOKEN};
