//! Code rendering for replacements.
//!
//! Renders a pandas snippet reproducing a replacement, derived from the same
//! parsed [`ReplacementStrategy`] that drives execution. The snippet operates
//! on a dataframe bound to [`DATAFRAME_NAME`] and assigns the result to the
//! output column.

use crate::config::{
    Aggregation, ImputerAlgorithm, ImputerConfig, ReplacementStrategy, RuleAction, SimpleStrategy,
    SpacesConfig, StringsConfig, ValueListConfig,
};
use crate::matchers::BLANK_REGEX;
use crate::types::Cell;

/// Name of the dataframe variable in rendered code.
pub const DATAFRAME_NAME: &str = "df";

/// Render the code equivalent of applying `strategy` to column `col`,
/// writing the result to column `name`.
pub fn build_code(strategy: &ReplacementStrategy, col: &str, name: &str) -> String {
    let mut lines = match strategy {
        ReplacementStrategy::Spaces(cfg) => spaces_code(cfg, col),
        ReplacementStrategy::Strings(cfg) => strings_code(cfg, col),
        ReplacementStrategy::ValueList(cfg) => value_list_code(cfg, col),
        ReplacementStrategy::Imputer(cfg) => imputer_code(cfg, col),
    };
    lines.push(format!("{}[{}] = out", DATAFRAME_NAME, py_str(name)));
    lines.join("\n")
}

/// The value is assigned through `mask`, never used as a regex template.
fn spaces_code(cfg: &SpacesConfig, col: &str) -> Vec<String> {
    vec![
        "import re".to_string(),
        "import numpy as np".to_string(),
        String::new(),
        format!("blank = re.compile({})", py_str(BLANK_REGEX)),
        format!("s = {}[{}]", DATAFRAME_NAME, py_str(col)),
        "matches = s.map(lambda v: isinstance(v, str) and blank.match(v) is not None)"
            .to_string(),
        format!("out = s.mask(matches, {})", py_value(&cfg.replace)),
    ]
}

fn strings_code(cfg: &StringsConfig, col: &str) -> Vec<String> {
    let flags = if cfg.ignore_case { ", re.IGNORECASE" } else { "" };
    let search = if cfg.is_char { "search" } else { "fullmatch" };

    vec![
        "import re".to_string(),
        "import numpy as np".to_string(),
        String::new(),
        format!(
            "regex = re.compile(re.escape({}){})",
            py_str(&cfg.value),
            flags
        ),
        format!("s = {}[{}]", DATAFRAME_NAME, py_str(col)),
        format!(
            "matches = s.map(lambda v: isinstance(v, str) and regex.{}(v) is not None)",
            search
        ),
        format!("out = s.mask(matches, {})", py_value(&cfg.replace)),
    ]
}

fn value_list_code(cfg: &ValueListConfig, col: &str) -> Vec<String> {
    let mut lines = vec![
        "import numpy as np".to_string(),
        "import pandas as pd".to_string(),
        String::new(),
        format!("s = {}[{}]", DATAFRAME_NAME, py_str(col)),
        "out = s.copy()".to_string(),
        "done = pd.Series(False, index=s.index)".to_string(),
    ];

    for rule in &cfg.rules {
        let matches = match &rule.value {
            Cell::Missing => "s.isnull()".to_string(),
            value => format!("s == {}", py_value(value)),
        };
        let fill = match &rule.action {
            RuleAction::Replace(value) => py_value(value),
            RuleAction::Aggregate(agg) => aggregation_code(*agg),
            RuleAction::Column(other) => format!("{}[{}]", DATAFRAME_NAME, py_str(other)),
        };
        lines.push(format!("matches = {}", matches));
        lines.push(format!("out = out.mask(matches & ~done, {})", fill));
        lines.push("done |= matches".to_string());
    }

    if cfg.rules.is_empty() {
        lines.push("# no rules: column is unchanged".to_string());
    }
    lines
}

fn aggregation_code(agg: Aggregation) -> String {
    let rest = "s[~matches].dropna()";
    match agg {
        Aggregation::Mode => format!("{}.mode().iloc[0]", rest),
        Aggregation::First => format!("{}.iloc[0]", rest),
        Aggregation::Last => format!("{}.iloc[-1]", rest),
        other => format!("{}.{}()", rest, other.as_str()),
    }
}

fn imputer_code(cfg: &ImputerConfig, col: &str) -> Vec<String> {
    let (imports, constructor) = match &cfg.algorithm {
        ImputerAlgorithm::Iterative { max_iter, tol } => (
            vec![
                "from sklearn.experimental import enable_iterative_imputer  # noqa: F401"
                    .to_string(),
                "from sklearn.impute import IterativeImputer".to_string(),
            ],
            format!(
                "IterativeImputer(max_iter={}, tol={})",
                max_iter,
                py_float(*tol)
            ),
        ),
        ImputerAlgorithm::Knn { n_neighbors } => (
            vec!["from sklearn.impute import KNNImputer".to_string()],
            format!("KNNImputer(n_neighbors={})", n_neighbors),
        ),
        ImputerAlgorithm::Simple {
            strategy,
            fill_value,
        } => {
            let constructor = match strategy {
                SimpleStrategy::Constant => format!(
                    "SimpleImputer(strategy='constant', fill_value={})",
                    py_float(*fill_value)
                ),
                other => format!("SimpleImputer(strategy='{}')", other.as_str()),
            };
            (
                vec!["from sklearn.impute import SimpleImputer".to_string()],
                constructor,
            )
        }
    };

    let columns: Vec<String> = std::iter::once(col)
        .chain(cfg.features.iter().map(String::as_str).filter(|f| *f != col))
        .map(py_str)
        .collect();

    let mut lines = imports;
    lines.push(String::new());
    lines.push(format!("imputer = {}", constructor));
    lines.push(format!(
        "out = imputer.fit_transform({}[[{}]])[:, 0]",
        DATAFRAME_NAME,
        columns.join(", ")
    ));
    lines
}

/// Python string literal. JSON string escapes are valid Python.
fn py_str(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| format!("'{}'", value))
}

fn py_float(value: f64) -> String {
    if value.is_nan() {
        "np.nan".to_string()
    } else if value.is_infinite() {
        let sign = if value < 0.0 { "-" } else { "" };
        format!("float('{}inf')", sign)
    } else {
        format!("{:?}", value)
    }
}

/// Python literal for a cell.
fn py_value(cell: &Cell) -> String {
    match cell {
        Cell::Missing => "np.nan".to_string(),
        Cell::Bool(true) => "True".to_string(),
        Cell::Bool(false) => "False".to_string(),
        Cell::Int(v) => v.to_string(),
        Cell::Float(v) => py_float(*v),
        Cell::Str(s) | Cell::Other(s) => py_str(s),
    }
}
