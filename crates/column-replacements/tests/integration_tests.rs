//! Integration tests for column replacements.
//!
//! These tests drive every strategy end to end through `ColumnReplacement`
//! and an `InMemoryRegistry`, the way a serving layer would.

use column_replacements::{
    ColumnReplacement, DatasetRegistry, InMemoryRegistry, ReplacementRequest,
};
use polars::prelude::*;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::sync::Arc;

// ============================================================================
// Helper Functions
// ============================================================================

const DATA_ID: &str = "1";

fn replacements_data() -> DataFrame {
    df![
        "a" => ["a", "UNknown", "b"],
        "b" => ["", " ", " - "],
        "c" => ["1", "", "3"],
        "d" => [Some(1.1), None, Some(3.0)],
        "e" => [Some("a"), None, Some("b")],
    ]
    .expect("Failed to build test data")
}

fn registry() -> Arc<InMemoryRegistry> {
    let registry = Arc::new(InMemoryRegistry::new());
    registry.insert(DATA_ID, replacements_data());
    registry
}

/// Build a replacement, checking its code rendering along the way.
fn replace(col: &str, replacement_type: &str, cfg: Value) -> Series {
    let replacement = ColumnReplacement::new(registry(), DATA_ID, col, replacement_type, &cfg)
        .expect("Failed to create replacement");
    assert!(!replacement.build_code().is_empty());

    let series = replacement
        .build_replacements()
        .expect("Failed to build replacements");
    assert_eq!(series.len(), 3);
    series
}

fn strings(series: &Series) -> Vec<Option<String>> {
    series
        .str()
        .expect("Expected a string column")
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect()
}

fn floats(series: &Series) -> Vec<Option<f64>> {
    series
        .f64()
        .expect("Expected a float column")
        .into_iter()
        .collect()
}

fn expected(values: &[Option<&str>]) -> Vec<Option<String>> {
    values.iter().map(|v| v.map(str::to_string)).collect()
}

fn assert_filled_with_median(series: &Series) {
    let values = floats(series);
    assert_eq!(values[0], Some(1.1));
    assert!((values[1].expect("Value was not filled") - 2.05).abs() < 1e-9);
    assert_eq!(values[2], Some(3.0));
}

// ============================================================================
// Spaces
// ============================================================================

#[test]
fn test_spaces() {
    let series = replace("b", "spaces", json!({}));
    assert_eq!(strings(&series), expected(&[None, None, Some(" - ")]));
}

#[test]
fn test_spaces_with_value() {
    let series = replace("b", "spaces", json!({"value": "blah"}));
    assert_eq!(
        strings(&series),
        expected(&[Some("blah"), Some("blah"), Some(" - ")])
    );
}

#[test]
fn test_spaces_nan_token() {
    let series = replace("c", "spaces", json!({"value": "nan"}));
    assert_eq!(strings(&series), expected(&[Some("1"), None, Some("3")]));
}

#[test]
fn test_spaces_number_into_text_column() {
    let series = replace("c", "spaces", json!({"value": 0}));
    assert_eq!(strings(&series), expected(&[Some("1"), Some("0"), Some("3")]));
}

// ============================================================================
// Strings
// ============================================================================

#[test]
fn test_strings_whole_value() {
    let series = replace(
        "a",
        "strings",
        json!({"value": "unknown", "ignoreCase": true}),
    );
    assert_eq!(strings(&series), expected(&[Some("a"), None, Some("b")]));

    let series = replace(
        "a",
        "strings",
        json!({"value": "unknown", "ignoreCase": false}),
    );
    assert_eq!(
        strings(&series),
        expected(&[Some("a"), Some("UNknown"), Some("b")])
    );

    let series = replace(
        "a",
        "strings",
        json!({"value": "unknown", "ignoreCase": true, "replace": "missing"}),
    );
    assert_eq!(
        strings(&series),
        expected(&[Some("a"), Some("missing"), Some("b")])
    );
}

#[test]
fn test_strings_is_char() {
    let series = replace(
        "b",
        "strings",
        json!({"value": "-", "ignoreCase": true, "isChar": true}),
    );
    assert_eq!(strings(&series), expected(&[Some(""), Some(" "), None]));

    let series = replace(
        "b",
        "strings",
        json!({"value": "-", "ignoreCase": true, "isChar": true, "replace": "missing"}),
    );
    assert_eq!(
        strings(&series),
        expected(&[Some(""), Some(" "), Some("missing")])
    );
}

// ============================================================================
// Value list
// ============================================================================

#[test]
fn test_value() {
    let series = replace(
        "e",
        "value",
        json!({"value": [{"value": "nan", "replace": "for test"}]}),
    );
    assert_eq!(
        strings(&series),
        expected(&[Some("a"), Some("for test"), Some("b")])
    );

    let series = replace(
        "e",
        "value",
        json!({"value": [
            {"value": "nan", "replace": "for test"},
            {"value": "a", "replace": "d"},
        ]}),
    );
    assert_eq!(
        strings(&series),
        expected(&[Some("d"), Some("for test"), Some("b")])
    );
}

#[test]
fn test_value_number_into_text_column() {
    let series = replace("e", "value", json!({"value": [{"value": "nan", "replace": 0}]}));
    assert_eq!(strings(&series), expected(&[Some("a"), Some("0"), Some("b")]));
}

#[test]
fn test_value_integer_aggregations() {
    let registry = Arc::new(InMemoryRegistry::new());
    let big = (1i64 << 53) + 1;
    registry.insert(
        "ints",
        df![
            "x" => [Some(big), None, Some(1)],
            "y" => [Some(i64::MAX), Some(i64::MAX), None],
        ]
        .unwrap(),
    );

    let max = ColumnReplacement::new(
        registry.clone(),
        "ints",
        "x",
        "value",
        &json!({"value": [{"value": "nan", "agg": "max"}]}),
    )
    .unwrap()
    .build_replacements()
    .unwrap();
    assert_eq!(max.i64().unwrap().get(1), Some(big));

    let err = ColumnReplacement::new(
        registry,
        "ints",
        "y",
        "value",
        &json!({"value": [{"value": "nan", "agg": "sum"}]}),
    )
    .unwrap()
    .build_replacements()
    .unwrap_err();
    assert_eq!(err.error_code(), "TYPE_MISMATCH");
}

#[test]
fn test_value_aggregation() {
    let series = replace(
        "d",
        "value",
        json!({"value": [{"value": "nan", "agg": "median"}]}),
    );
    assert_filled_with_median(&series);
}

#[test]
fn test_value_overlapping_rules() {
    let series = replace(
        "e",
        "value",
        json!({"value": [
            {"value": "a", "replace": "first"},
            {"value": "a", "replace": "second"},
        ]}),
    );
    assert_eq!(strings(&series)[0], Some("first".to_string()));
}

#[test]
fn test_value_column_rule() {
    let series = replace(
        "e",
        "value",
        json!({"value": [{"value": "nan", "col": "a"}]}),
    );
    assert_eq!(
        strings(&series),
        expected(&[Some("a"), Some("UNknown"), Some("b")])
    );
}

// ============================================================================
// Imputer
// ============================================================================

#[test]
fn test_imputer() {
    for cfg in [
        json!({"type": "iterative"}),
        json!({"type": "knn", "n_neighbors": 3}),
        json!({"type": "simple"}),
    ] {
        let series = replace("d", "imputer", cfg);
        assert_filled_with_median(&series);
    }
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_configuration_errors() {
    let cases = [
        ("regex", json!({}), "UNKNOWN_STRATEGY"),
        ("strings", json!({}), "MISSING_OPTION"),
        ("value", json!({}), "MISSING_OPTION"),
        ("imputer", json!({}), "MISSING_OPTION"),
        ("imputer", json!({"type": "mice"}), "INVALID_CONFIG"),
        ("value", json!({"value": [{"value": "a"}]}), "INVALID_CONFIG"),
    ];

    for (replacement_type, cfg, code) in cases {
        let err = ColumnReplacement::new(registry(), DATA_ID, "a", replacement_type, &cfg)
            .err()
            .expect("Expected a configuration error");
        assert_eq!(err.error_code(), code, "{} {}", replacement_type, cfg);
        assert!(err.is_configuration());
    }
}

#[test]
fn test_lookup_errors() {
    let unknown_dataset =
        ColumnReplacement::new(registry(), "404", "a", "spaces", &json!({})).unwrap();
    let err = unknown_dataset.build_replacements().unwrap_err();
    assert_eq!(err.error_code(), "DATASET_NOT_FOUND");

    let unknown_column =
        ColumnReplacement::new(registry(), DATA_ID, "zz", "spaces", &json!({})).unwrap();
    let err = unknown_column.build_replacements().unwrap_err();
    assert_eq!(err.error_code(), "COLUMN_NOT_FOUND");
    assert!(err.is_lookup());
}

#[test]
fn test_type_errors() {
    let replacement = ColumnReplacement::new(
        registry(),
        DATA_ID,
        "e",
        "value",
        &json!({"value": [{"value": "nan", "agg": "mean"}]}),
    )
    .unwrap();
    let err = replacement.build_replacements().unwrap_err();
    assert_eq!(err.error_code(), "TYPE_MISMATCH");

    let replacement =
        ColumnReplacement::new(registry(), DATA_ID, "a", "imputer", &json!({"type": "knn"}))
            .unwrap();
    let err = replacement.build_replacements().unwrap_err();
    assert_eq!(err.error_code(), "TYPE_MISMATCH");

    let serialized = serde_json::to_value(&err).unwrap();
    assert_eq!(serialized["code"], "TYPE_MISMATCH");
}

// ============================================================================
// Facade
// ============================================================================

#[test]
fn test_dataset_registered_after_construction() {
    let registry = Arc::new(InMemoryRegistry::new());
    let replacement =
        ColumnReplacement::new(registry.clone(), DATA_ID, "b", "spaces", &json!({})).unwrap();

    registry.insert(DATA_ID, replacements_data());
    assert_eq!(replacement.build_replacements().unwrap().null_count(), 2);
}

#[test]
fn test_request_with_output_name() {
    let registry = registry();
    let request: ReplacementRequest = serde_json::from_value(json!({
        "data_id": DATA_ID,
        "col": "d",
        "type": "imputer",
        "cfg": {"type": "simple", "strategy": "median"},
        "name": "d_imputed",
    }))
    .unwrap();

    let replacement = ColumnReplacement::from_request(registry.clone(), request).unwrap();
    let series = replacement.build_replacements().unwrap();
    assert_eq!(series.name().as_str(), "d_imputed");
    assert_filled_with_median(&series);

    // The registered dataset is left untouched
    let df = registry.get(DATA_ID).unwrap();
    assert_eq!(df.column("d").unwrap().null_count(), 1);
    assert!(df.column("d_imputed").is_err());
}

#[test]
fn test_row_order_is_preserved() {
    let registry = Arc::new(InMemoryRegistry::new());
    registry.insert(
        "big",
        df!["x" => (0..100).map(|i| if i % 7 == 0 { None } else { Some(i as f64) }).collect::<Vec<_>>()]
            .unwrap(),
    );

    let replacement = ColumnReplacement::new(
        registry,
        "big",
        "x",
        "value",
        &json!({"value": [{"value": "nan", "replace": -1.0}]}),
    )
    .unwrap();
    let values = floats(&replacement.build_replacements().unwrap());

    assert_eq!(values.len(), 100);
    for (i, value) in values.into_iter().enumerate() {
        let expected = if i % 7 == 0 { -1.0 } else { i as f64 };
        assert_eq!(value, Some(expected));
    }
}
