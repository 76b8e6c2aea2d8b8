//! Row matchers for blank values and string patterns.
//!
//! Only string cells ever match; numbers, booleans and missing values are
//! skipped rather than coerced to text.

use crate::error::{ReplacementError, Result};
use once_cell::sync::Lazy;
use polars::prelude::*;
use regex::{Regex, RegexBuilder};

/// Pattern of an empty or whitespace-only string.
pub const BLANK_REGEX: &str = r"^\s*$";

static BLANK_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(BLANK_REGEX).expect("Invalid regex: blank"));

/// Check if a string is empty or consists only of whitespace.
///
/// `" "` is blank, `" - "` is not.
pub fn is_blank(value: &str) -> bool {
    BLANK_PATTERN.is_match(value)
}

/// Check if `value` matches `target`.
///
/// With `whole_value` the strings must be equal, otherwise `target` only has
/// to occur somewhere in `value`. `ignore_case` applies Unicode case folding.
pub fn matches(value: &str, target: &str, ignore_case: bool, whole_value: bool) -> bool {
    match StringMatcher::new(target, ignore_case, whole_value) {
        Ok(matcher) => matcher.is_match(value),
        Err(_) => false,
    }
}

/// A compiled string pattern, reused across every row of a column.
#[derive(Debug, Clone)]
pub struct StringMatcher {
    target: String,
    ignore_case: bool,
    whole_value: bool,
    regex: Regex,
}

impl StringMatcher {
    pub fn new(target: &str, ignore_case: bool, whole_value: bool) -> Result<Self> {
        let escaped = regex::escape(target);
        let pattern = if whole_value {
            format!("^{}$", escaped)
        } else {
            escaped
        };
        let regex = RegexBuilder::new(&pattern)
            .case_insensitive(ignore_case)
            .build()
            .map_err(|e| {
                ReplacementError::InvalidConfig(format!("cannot match '{}': {}", target, e))
            })?;

        Ok(Self {
            target: target.to_string(),
            ignore_case,
            whole_value,
            regex,
        })
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn ignore_case(&self) -> bool {
        self.ignore_case
    }

    pub fn whole_value(&self) -> bool {
        self.whole_value
    }

    pub fn is_match(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }
}

/// Per-row mask of blank string values.
///
/// Non-string columns yield an all-false mask.
pub fn blank_mask(series: &Series) -> Result<BooleanChunked> {
    string_mask_with(series, is_blank)
}

/// Per-row mask of values accepted by `matcher`.
pub fn string_mask(series: &Series, matcher: &StringMatcher) -> Result<BooleanChunked> {
    string_mask_with(series, |s| matcher.is_match(s))
}

fn string_mask_with<F>(series: &Series, predicate: F) -> Result<BooleanChunked>
where
    F: Fn(&str) -> bool,
{
    let name = series.name().clone();
    let series = match series.dtype() {
        DataType::String => series.clone(),
        DataType::Categorical(_, _) => series.cast(&DataType::String)?,
        _ => return Ok(BooleanChunked::full(name, false, series.len())),
    };

    let mask: BooleanChunked = series
        .str()?
        .into_iter()
        .map(|v| Some(v.is_some_and(&predicate)))
        .collect();
    Ok(mask.with_name(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_blank() {
        assert!(is_blank(""));
        assert!(is_blank(" "));
        assert!(is_blank("\t \n"));
        assert!(!is_blank(" - "));
        assert!(!is_blank("a"));
    }

    #[test]
    fn test_matches_whole_value() {
        assert!(matches("UNknown", "unknown", true, true));
        assert!(!matches("UNknown", "unknown", false, true));
        assert!(!matches("unknown!", "unknown", true, true));
    }

    #[test]
    fn test_matches_substring() {
        assert!(matches(" - ", "-", false, false));
        assert!(matches("xAbCx", "abc", true, false));
        assert!(!matches("xAbCx", "abc", false, false));
        assert!(!matches("", "-", true, false));
    }

    #[test]
    fn test_matches_escapes_regex_metacharacters() {
        assert!(matches("a.b", ".", false, false));
        assert!(!matches("ab", "a.b", false, true));
        assert!(matches("(x)", "(x)", false, true));
    }

    #[test]
    fn test_blank_mask() {
        let series = Series::new("b".into(), &[Some(""), Some(" "), Some(" - "), None]);
        let mask = blank_mask(&series).unwrap();
        let values: Vec<Option<bool>> = mask.into_iter().collect();
        assert_eq!(values, vec![Some(true), Some(true), Some(false), Some(false)]);
    }

    #[test]
    fn test_blank_mask_categorical() {
        let series = Series::new("b".into(), &[Some(" "), Some("x"), None])
            .cast(&DataType::from_categories(Categories::global()))
            .unwrap();
        let mask = blank_mask(&series).unwrap();
        let values: Vec<Option<bool>> = mask.into_iter().collect();
        assert_eq!(values, vec![Some(true), Some(false), Some(false)]);
    }

    #[test]
    fn test_string_mask_numeric_column_is_all_false() {
        let series = Series::new("d".into(), &[1.0, 2.0]);
        let matcher = StringMatcher::new("1", false, false).unwrap();
        let mask = string_mask(&series, &matcher).unwrap();
        assert!(!mask.any());
    }
}
