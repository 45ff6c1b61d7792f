//! The shared post-processing routine, fed aggregated frames directly.

use serde_json::json;
use tabula::data::{Frame, Value};
use tabula::model::{ReportSpec, RowKey};
use tabula::pivot::{pivot, COLUMN_SEPARATOR};
use tabula::planner::{Plan, PlanTarget};

fn frame(records: serde_json::Value) -> Frame {
    Frame::from_records(&records).unwrap()
}

fn plan(rows: &[&str], columns: &[&str], slicers: &[&str], metrics: &[&str]) -> Plan {
    let owned = |names: &[&str]| names.iter().map(|s| s.to_string()).collect();
    Plan {
        target: PlanTarget::Embedded,
        row_keys: owned(rows),
        column_keys: owned(columns),
        slicer_keys: owned(slicers),
        metric_names: owned(metrics),
    }
}

fn row_labels(table: &tabula::model::PivotTable) -> Vec<String> {
    table
        .rows
        .iter()
        .map(|r| match &r.key {
            RowKey::Data(values) => values.iter().map(Value::to_string).collect::<Vec<_>>().join(","),
            RowKey::Total => "Total".to_string(),
        })
        .collect()
}

#[test]
fn test_two_column_dimensions_flatten_in_sorted_order() {
    let aggregated = frame(json!([
        {"g": "A", "d": "Mobile", "c": "ads", "v": 1, "w": 10},
        {"g": "A", "d": "Mobile", "c": "seo", "v": 2, "w": 20},
        {"g": "A", "d": "Desktop", "c": "ads", "v": 3, "w": 30},
        {"g": "B", "d": "Desktop", "c": "seo", "v": 4, "w": 40},
    ]));
    let result = pivot(&aggregated, &plan(&["g"], &["d", "c"], &[], &["v", "w"]), &ReportSpec::new()).unwrap();
    let table = result.single().unwrap();

    assert_eq!(
        table.columns,
        vec![
            "v / Desktop / ads",
            "v / Desktop / seo",
            "v / Mobile / ads",
            "v / Mobile / seo",
            "w / Desktop / ads",
            "w / Desktop / seo",
            "w / Mobile / ads",
            "w / Mobile / seo",
        ]
    );
    let b = RowKey::data(["B"]);
    assert_eq!(table.cell(&b, "w / Desktop / seo"), Some(&Value::Int(40)));
    assert_eq!(table.row(&b).unwrap().cells.iter().filter(|c| c.is_some()).count(), 2);
    assert!(table.columns.iter().all(|c| c.split(COLUMN_SEPARATOR).count() == 3));
}

#[test]
fn test_null_column_values_drop_from_names() {
    let aggregated = frame(json!([
        {"g": "A", "d": "Mobile", "v": 1},
        {"g": "A", "d": null, "v": 2},
    ]));
    let result = pivot(&aggregated, &plan(&["g"], &["d"], &[], &["v"]), &ReportSpec::new()).unwrap();
    let table = result.single().unwrap();
    assert_eq!(table.columns, vec!["v", "v / Mobile"]);
    assert_eq!(table.cell(&RowKey::data(["A"]), "v"), Some(&Value::Int(2)));
}

#[test]
fn test_without_column_dimensions_measures_keep_spec_order() {
    let aggregated = frame(json!([{"g": "A", "zeta": 1, "alpha": 2}]));
    let result = pivot(&aggregated, &plan(&["g"], &[], &[], &["zeta", "alpha"]), &ReportSpec::new()).unwrap();
    assert_eq!(result.single().unwrap().columns, vec!["zeta", "alpha"]);
}

#[test]
fn test_multi_key_sort_is_stable_with_missing_last() {
    let aggregated = frame(json!([
        {"g": "e", "x": null, "y": 0},
        {"g": "d", "x": 1, "y": 5},
        {"g": "c", "x": 2, "y": 3},
        {"g": "b", "x": 2, "y": 1},
        {"g": "a", "x": 1, "y": 5},
    ]));
    let spec = ReportSpec::new()
        .sort_by("no_such_column", true)
        .sort_by("x", false)
        .sort_by("y", true);
    let result = pivot(&aggregated, &plan(&["g"], &[], &[], &["x", "y"]), &spec).unwrap();
    assert_eq!(row_labels(result.single().unwrap()), vec!["b", "c", "a", "d", "e"]);

    let ascending = ReportSpec::new().sort_by("x", true);
    let result = pivot(&aggregated, &plan(&["g"], &[], &[], &["x", "y"]), &ascending).unwrap();
    assert_eq!(row_labels(result.single().unwrap()), vec!["a", "d", "b", "c", "e"]);
}

#[test]
fn test_sort_by_exact_pivoted_name() {
    let aggregated = frame(json!([
        {"g": "A", "d": "Mobile", "v": 1},
        {"g": "A", "d": "Desktop", "v": 9},
        {"g": "B", "d": "Mobile", "v": 5},
        {"g": "B", "d": "Desktop", "v": 2},
    ]));
    let spec = ReportSpec::new().sort_by("v / Mobile", false);
    let result = pivot(&aggregated, &plan(&["g"], &["d"], &[], &["v"]), &spec).unwrap();
    assert_eq!(row_labels(result.single().unwrap()), vec!["B", "A"]);

    // the bare measure name picks its first pivoted column, "v / Desktop"
    let spec = ReportSpec::new().sort_by("v", false);
    let result = pivot(&aggregated, &plan(&["g"], &["d"], &[], &["v"]), &spec).unwrap();
    assert_eq!(row_labels(result.single().unwrap()), vec!["A", "B"]);
}

#[test]
fn test_totals_by_column_type() {
    let aggregated = frame(json!([
        {"g": "a", "n": 1, "f": 0.25, "label": "x", "empty": null},
        {"g": "b", "n": 2, "f": 1,    "label": "y", "empty": null},
        {"g": "c", "n": null, "f": 0.5, "label": null, "empty": null},
    ]));
    let spec = ReportSpec::new().totals(true).topn(1);
    let result = pivot(&aggregated, &plan(&["g"], &[], &[], &["n", "f", "label", "empty"]), &spec).unwrap();
    let table = result.single().unwrap();

    assert_eq!(row_labels(table), vec!["a", "Total"]);
    let total = table.row(&RowKey::Total).unwrap();
    assert_eq!(
        total.cells,
        vec![Some(Value::Int(3)), Some(Value::Float(1.75)), None, Some(Value::Int(0))]
    );
}

#[test]
fn test_totals_over_no_rows() {
    let empty = Frame::from_columns(vec![
        tabula::data::Column::new("g", vec![]),
        tabula::data::Column::new("v", vec![]),
    ])
    .unwrap();
    assert!(empty.is_empty());

    let spec = ReportSpec::new().totals(true);
    let result = pivot(&empty, &plan(&["g"], &[], &[], &["v"]), &spec).unwrap();
    let table = result.single().unwrap();
    assert_eq!(table.data_rows().count(), 0);
    assert_eq!(table.cell(&RowKey::Total, "v"), Some(&Value::Int(0)));
}

#[test]
fn test_topn_zero_keeps_only_totals() {
    let aggregated = frame(json!([{"g": "a", "v": 1}, {"g": "b", "v": 2}]));
    let spec = ReportSpec::new().totals(true).topn(0);
    let result = pivot(&aggregated, &plan(&["g"], &[], &[], &["v"]), &spec).unwrap();
    assert_eq!(row_labels(result.single().unwrap()), vec!["Total"]);
}

#[test]
fn test_slices_ordered_by_key_with_null_last() {
    let aggregated = frame(json!([
        {"s": "z", "g": "a", "v": 1},
        {"s": null, "g": "a", "v": 2},
        {"s": "a", "g": "b", "v": 3},
        {"s": "a", "g": "a", "v": 4},
    ]));
    let spec = ReportSpec::new().totals(true);
    let result = pivot(&aggregated, &plan(&["g"], &[], &["s"], &["v"]), &spec).unwrap();

    let keys: Vec<Vec<Value>> = result.slices.iter().map(|s| s.key.clone()).collect();
    assert_eq!(keys, vec![vec![Value::from("a")], vec![Value::from("z")], vec![Value::Null]]);

    let a = result.get(&[Value::from("a")]).unwrap();
    assert_eq!(row_labels(a), vec!["a", "b", "Total"]);
    assert_eq!(a.cell(&RowKey::Total, "v"), Some(&Value::Int(7)));
    assert_eq!(result.get(&[Value::Null]).unwrap().cell(&RowKey::Total, "v"), Some(&Value::Int(2)));
}

#[test]
fn test_missing_measure_column_is_an_error() {
    let aggregated = frame(json!([{"g": "a", "v": 1}]));
    let err = pivot(&aggregated, &plan(&["g"], &[], &[], &["clicks"]), &ReportSpec::new()).unwrap_err();
    assert!(err.is_validation());
}

#[test]
fn test_result_serializes_for_clients() {
    let aggregated = frame(json!([{"g": "a", "v": 1}]));
    let spec = ReportSpec::new().totals(true);
    let result = pivot(&aggregated, &plan(&["g"], &[], &[], &["v"]), &spec).unwrap();
    assert_eq!(
        serde_json::to_value(&result).unwrap(),
        json!({
            "slicer_names": [],
            "slices": [{
                "key": [],
                "table": {
                    "index_names": ["g"],
                    "columns": ["v"],
                    "rows": [
                        {"key": {"data": ["a"]}, "cells": [1]},
                        {"key": "total", "cells": [1]}
                    ]
                }
            }]
        })
    );
}
