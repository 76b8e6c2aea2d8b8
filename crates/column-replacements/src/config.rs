//! Configuration types for column replacements.
//!
//! A replacement arrives as a strategy tag plus a loosely typed JSON object
//! (keys in camelCase, as sent by a frontend). [`ReplacementStrategy::parse`]
//! turns that pair into one of four typed configurations. Unknown keys are
//! ignored and absent keys take their defaults.
//!
//! # Example
//!
//! ```rust,ignore
//! use column_replacements::config::{ReplacementStrategy, StringsConfig};
//! use serde_json::json;
//!
//! // From a frontend payload
//! let strategy = ReplacementStrategy::parse(
//!     "strings",
//!     &json!({"value": "unknown", "ignoreCase": true}),
//! )?;
//!
//! // Or built directly
//! let strategy = ReplacementStrategy::Strings(
//!     StringsConfig::new("unknown").ignore_case(true).replace("missing"),
//! );
//! ```

use crate::error::{ReplacementError, Result};
use crate::types::Cell;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Default number of neighbors for KNN imputation.
pub const DEFAULT_KNN_NEIGHBORS: usize = 5;

/// Default number of rounds for iterative imputation.
pub const DEFAULT_MAX_ITER: usize = 10;

/// Default convergence tolerance for iterative imputation.
pub const DEFAULT_TOLERANCE: f64 = 1e-3;

/// Tag selecting a replacement strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplacementType {
    /// Blank/whitespace-only strings
    Spaces,
    /// String matching and substitution
    Strings,
    /// Ordered list of value rules
    Value,
    /// Statistical imputation of missing values
    Imputer,
}

impl ReplacementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReplacementType::Spaces => "spaces",
            ReplacementType::Strings => "strings",
            ReplacementType::Value => "value",
            ReplacementType::Imputer => "imputer",
        }
    }
}

impl fmt::Display for ReplacementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReplacementType {
    type Err = ReplacementError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "spaces" => Ok(ReplacementType::Spaces),
            "strings" => Ok(ReplacementType::Strings),
            "value" => Ok(ReplacementType::Value),
            "imputer" => Ok(ReplacementType::Imputer),
            other => Err(ReplacementError::UnknownStrategy(other.to_string())),
        }
    }
}

// =============================================================================
// Spaces
// =============================================================================

/// Replace blank strings with a fixed value.
#[derive(Debug, Clone, PartialEq)]
pub struct SpacesConfig {
    /// Replacement for blank values. Default: missing
    pub replace: Cell,
}

impl Default for SpacesConfig {
    fn default() -> Self {
        Self {
            replace: Cell::Missing,
        }
    }
}

impl SpacesConfig {
    pub fn with_value(value: impl Into<String>) -> Self {
        Self {
            replace: Cell::Str(value.into()),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawSpacesConfig {
    #[serde(default)]
    value: Option<Value>,
}

// =============================================================================
// Strings
// =============================================================================

/// Replace values matching a string.
#[derive(Debug, Clone, PartialEq)]
pub struct StringsConfig {
    /// String to look for.
    pub value: String,

    /// Compare case-insensitively.
    /// Default: false
    pub ignore_case: bool,

    /// When true `value` may occur anywhere in a cell, otherwise the whole
    /// cell must equal it.
    /// Default: false
    pub is_char: bool,

    /// Replacement for matching values.
    /// Default: missing
    pub replace: Cell,
}

impl StringsConfig {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            ignore_case: false,
            is_char: false,
            replace: Cell::Missing,
        }
    }

    pub fn ignore_case(mut self, ignore_case: bool) -> Self {
        self.ignore_case = ignore_case;
        self
    }

    pub fn is_char(mut self, is_char: bool) -> Self {
        self.is_char = is_char;
        self
    }

    pub fn replace(mut self, replace: impl Into<String>) -> Self {
        self.replace = Cell::Str(replace.into());
        self
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawStringsConfig {
    value: String,
    #[serde(default)]
    ignore_case: bool,
    #[serde(default)]
    is_char: bool,
    #[serde(default)]
    replace: Option<Value>,
}

// =============================================================================
// Value list
// =============================================================================

/// Aggregation used to compute a fill value from the rest of the column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    Mean,
    Median,
    Sum,
    Min,
    Max,
    /// Sample standard deviation (ddof = 1)
    Std,
    /// Sample variance (ddof = 1)
    Var,
    /// Most frequent value, first seen wins ties
    Mode,
    First,
    Last,
}

impl Aggregation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Aggregation::Mean => "mean",
            Aggregation::Median => "median",
            Aggregation::Sum => "sum",
            Aggregation::Min => "min",
            Aggregation::Max => "max",
            Aggregation::Std => "std",
            Aggregation::Var => "var",
            Aggregation::Mode => "mode",
            Aggregation::First => "first",
            Aggregation::Last => "last",
        }
    }

    /// Whether the aggregation only makes sense for numbers.
    pub fn requires_numeric(&self) -> bool {
        !matches!(
            self,
            Aggregation::Mode | Aggregation::First | Aggregation::Last
        )
    }
}

/// What a matching row is replaced with.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleAction {
    /// A fixed value.
    Replace(Cell),
    /// An aggregate of the column's non-matching values.
    Aggregate(Aggregation),
    /// The same row's value in another column.
    Column(String),
}

/// A single `{value, replace | agg | col}` rule.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueRule {
    /// Value to match, [`Cell::Missing`] for the `"nan"` token.
    pub value: Cell,
    pub action: RuleAction,
}

impl ValueRule {
    pub fn replace(value: Cell, replace: Cell) -> Self {
        Self {
            value,
            action: RuleAction::Replace(replace),
        }
    }

    pub fn aggregate(value: Cell, agg: Aggregation) -> Self {
        Self {
            value,
            action: RuleAction::Aggregate(agg),
        }
    }

    pub fn from_column(value: Cell, column: impl Into<String>) -> Self {
        Self {
            value,
            action: RuleAction::Column(column.into()),
        }
    }

    /// Parse one rule object. `agg` takes precedence over `col`, which
    /// takes precedence over `replace`.
    fn from_json(raw: &Value, index: usize) -> Result<Self> {
        let obj = raw.as_object().ok_or_else(|| {
            ReplacementError::InvalidConfig(format!("rule {} must be an object", index))
        })?;

        let value = obj
            .get("value")
            .ok_or_else(|| ReplacementError::MissingOption {
                strategy: ReplacementType::Value.to_string(),
                option: format!("value[{}].value", index),
            })?;
        let value = Cell::from_config(value)?;

        let action = if let Some(agg) = obj.get("agg") {
            let agg = Aggregation::deserialize(agg).map_err(|e| {
                ReplacementError::InvalidConfig(format!("rule {}: unknown agg: {}", index, e))
            })?;
            RuleAction::Aggregate(agg)
        } else if let Some(col) = obj.get("col") {
            let col = col.as_str().ok_or_else(|| {
                ReplacementError::InvalidConfig(format!("rule {}: 'col' must be a string", index))
            })?;
            RuleAction::Column(col.to_string())
        } else if let Some(replace) = obj.get("replace") {
            RuleAction::Replace(Cell::from_config(replace)?)
        } else {
            return Err(ReplacementError::InvalidConfig(format!(
                "rule {} needs one of 'replace', 'agg' or 'col'",
                index
            )));
        };

        Ok(Self { value, action })
    }
}

/// Ordered list of value rules; the first matching rule wins.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValueListConfig {
    pub rules: Vec<ValueRule>,
}

impl ValueListConfig {
    pub fn new(rules: Vec<ValueRule>) -> Self {
        Self { rules }
    }
}

// =============================================================================
// Imputer
// =============================================================================

/// Strategy of the simple imputer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SimpleStrategy {
    /// Use the mean of non-null values
    #[default]
    Mean,
    /// Use the median of non-null values
    Median,
    /// Use the most frequent value
    MostFrequent,
    /// Use `fill_value`
    Constant,
}

impl SimpleStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SimpleStrategy::Mean => "mean",
            SimpleStrategy::Median => "median",
            SimpleStrategy::MostFrequent => "most_frequent",
            SimpleStrategy::Constant => "constant",
        }
    }
}

/// Imputation algorithm and its parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum ImputerAlgorithm {
    /// Round-robin regression of each feature on the others.
    Iterative { max_iter: usize, tol: f64 },
    /// Inverse-distance weighted nearest neighbors.
    Knn { n_neighbors: usize },
    /// Univariate statistic.
    Simple {
        strategy: SimpleStrategy,
        fill_value: f64,
    },
}

impl ImputerAlgorithm {
    pub fn name(&self) -> &'static str {
        match self {
            ImputerAlgorithm::Iterative { .. } => "iterative",
            ImputerAlgorithm::Knn { .. } => "knn",
            ImputerAlgorithm::Simple { .. } => "simple",
        }
    }
}

/// Imputation of missing values in a numeric column.
#[derive(Debug, Clone, PartialEq)]
pub struct ImputerConfig {
    pub algorithm: ImputerAlgorithm,

    /// Extra numeric columns used as predictors.
    /// Default: none (the column is imputed on its own)
    pub features: Vec<String>,
}

impl ImputerConfig {
    pub fn new(algorithm: ImputerAlgorithm) -> Self {
        Self {
            algorithm,
            features: Vec::new(),
        }
    }

    pub fn features(mut self, features: Vec<String>) -> Self {
        self.features = features;
        self
    }
}

#[derive(Debug, Deserialize)]
struct RawImputerConfig {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    n_neighbors: Option<usize>,
    #[serde(default)]
    max_iter: Option<usize>,
    #[serde(default)]
    tol: Option<f64>,
    #[serde(default)]
    strategy: Option<SimpleStrategy>,
    #[serde(default)]
    fill_value: Option<f64>,
    #[serde(default)]
    features: Vec<String>,
}

impl TryFrom<RawImputerConfig> for ImputerConfig {
    type Error = ReplacementError;

    fn try_from(raw: RawImputerConfig) -> Result<Self> {
        let algorithm = match raw.kind.as_str() {
            "iterative" => ImputerAlgorithm::Iterative {
                max_iter: raw.max_iter.unwrap_or(DEFAULT_MAX_ITER).max(1),
                tol: raw.tol.unwrap_or(DEFAULT_TOLERANCE),
            },
            "knn" => {
                let n_neighbors = raw.n_neighbors.unwrap_or(DEFAULT_KNN_NEIGHBORS);
                if n_neighbors == 0 {
                    return Err(ReplacementError::InvalidConfig(
                        "n_neighbors must be at least 1".to_string(),
                    ));
                }
                ImputerAlgorithm::Knn { n_neighbors }
            }
            "simple" => ImputerAlgorithm::Simple {
                strategy: raw.strategy.unwrap_or_default(),
                fill_value: raw.fill_value.unwrap_or(0.0),
            },
            other => {
                return Err(ReplacementError::InvalidConfig(format!(
                    "unknown imputer type '{}' (expected iterative, knn or simple)",
                    other
                )));
            }
        };

        Ok(ImputerConfig {
            algorithm,
            features: raw.features,
        })
    }
}

// =============================================================================
// Strategy
// =============================================================================

/// A fully parsed replacement strategy.
///
/// Both execution and code rendering are driven from this value, so the two
/// cannot disagree about what a configuration means.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplacementStrategy {
    Spaces(SpacesConfig),
    Strings(StringsConfig),
    ValueList(ValueListConfig),
    Imputer(ImputerConfig),
}

impl ReplacementStrategy {
    /// Parse a strategy tag and its JSON configuration.
    pub fn parse(tag: &str, cfg: &Value) -> Result<Self> {
        let replacement_type: ReplacementType = tag.parse()?;
        let empty = Map::new();
        let options = match cfg {
            Value::Object(map) => map,
            Value::Null => &empty,
            other => {
                return Err(ReplacementError::InvalidConfig(format!(
                    "configuration for '{}' must be an object, got {}",
                    replacement_type, other
                )));
            }
        };

        match replacement_type {
            ReplacementType::Spaces => {
                let raw: RawSpacesConfig = from_options(replacement_type, options)?;
                let replace = match raw.value {
                    Some(value) => Cell::from_config(&value)?,
                    None => Cell::Missing,
                };
                Ok(ReplacementStrategy::Spaces(SpacesConfig { replace }))
            }
            ReplacementType::Strings => {
                require(replacement_type, options, "value")?;
                let raw: RawStringsConfig = from_options(replacement_type, options)?;
                let replace = match raw.replace {
                    Some(value) => Cell::from_config(&value)?,
                    None => Cell::Missing,
                };
                Ok(ReplacementStrategy::Strings(StringsConfig {
                    value: raw.value,
                    ignore_case: raw.ignore_case,
                    is_char: raw.is_char,
                    replace,
                }))
            }
            ReplacementType::Value => {
                require(replacement_type, options, "value")?;
                let rules = options
                    .get("value")
                    .and_then(Value::as_array)
                    .ok_or_else(|| {
                        ReplacementError::InvalidConfig(
                            "'value' must be a list of rules".to_string(),
                        )
                    })?
                    .iter()
                    .enumerate()
                    .map(|(i, rule)| ValueRule::from_json(rule, i))
                    .collect::<Result<Vec<_>>>()?;
                Ok(ReplacementStrategy::ValueList(ValueListConfig { rules }))
            }
            ReplacementType::Imputer => {
                require(replacement_type, options, "type")?;
                let raw: RawImputerConfig = from_options(replacement_type, options)?;
                Ok(ReplacementStrategy::Imputer(raw.try_into()?))
            }
        }
    }

    pub fn replacement_type(&self) -> ReplacementType {
        match self {
            ReplacementStrategy::Spaces(_) => ReplacementType::Spaces,
            ReplacementStrategy::Strings(_) => ReplacementType::Strings,
            ReplacementStrategy::ValueList(_) => ReplacementType::Value,
            ReplacementStrategy::Imputer(_) => ReplacementType::Imputer,
        }
    }
}

fn require(replacement_type: ReplacementType, options: &Map<String, Value>, key: &str) -> Result<()> {
    match options.get(key) {
        Some(Value::Null) | None => Err(ReplacementError::MissingOption {
            strategy: replacement_type.to_string(),
            option: key.to_string(),
        }),
        Some(_) => Ok(()),
    }
}

fn from_options<T>(replacement_type: ReplacementType, options: &Map<String, Value>) -> Result<T>
where
    T: for<'de> Deserialize<'de>,
{
    serde_json::from_value(Value::Object(options.clone())).map_err(|e| {
        ReplacementError::InvalidConfig(format!("'{}' options: {}", replacement_type, e))
    })
}

/// A replacement request as sent by a serving layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplacementRequest {
    /// Dataset identifier in the registry.
    pub data_id: String,
    /// Column to rewrite.
    pub col: String,
    /// Strategy tag.
    #[serde(rename = "type")]
    pub replacement_type: String,
    /// Strategy options.
    #[serde(default)]
    pub cfg: Value,
    /// Name of the output column. Default: `col`
    #[serde(default)]
    pub name: Option<String>,
}
