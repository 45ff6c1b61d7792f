//! End-to-end reports through the in-process engine.

use serde_json::json;
use tabula::data::{Dataset, Frame, Value};
use tabula::engine::{report, Engine, LocalEngine};
use tabula::expr::{col, ratio_of_sums, safe_div, sum, ExprExt};
use tabula::model::{Dimension, Measure, ReportSpec, RowAgg, RowKey};
use tabula::planner::{PlanTarget, Planner};

fn ads() -> Dataset {
    Dataset::new(
        Frame::from_records(&json!([
            {"country": "US", "device": "Mobile",  "day": "2024-01-03", "clicks": 10, "impr": 100, "region": "West"},
            {"country": "US", "device": "Desktop", "day": "2024-01-10", "clicks": 5,  "impr": 50,  "region": "West"},
            {"country": "CA", "device": "Mobile",  "day": "2024-02-01", "clicks": 4,  "impr": 80,  "region": "North"},
            {"country": "CA", "device": "Desktop", "day": "2024-02-15", "clicks": 1,  "impr": 0,   "region": "North"},
            {"country": "FR", "device": "Mobile",  "day": "2024-02-20", "clicks": 8,  "impr": 40,  "region": "West"},
            {"country": "US", "device": "Mobile",  "day": "2024-03-05", "clicks": 6,  "impr": 60,  "region": "East"},
        ]))
        .unwrap(),
    )
}

fn clicks() -> Measure {
    Measure::agg("clicks", sum("clicks"))
}

#[test]
fn test_pivot_leaves_absent_combinations_missing() {
    let mut ds = Dataset::new(
        Frame::from_records(&json!([
            {"g": "A", "d": "Mobile", "v": 1},
            {"g": "A", "d": "Desktop", "v": 2},
            {"g": "B", "d": "Mobile", "v": 3},
        ]))
        .unwrap(),
    );
    let spec = ReportSpec::new()
        .row("g")
        .column("d")
        .metric(Measure::agg("v", sum("v")));
    let result = ds.report(&spec).unwrap();
    let table = result.single().unwrap();

    assert_eq!(table.columns, vec!["v / Desktop", "v / Mobile"]);
    assert_eq!(table.cell(&RowKey::data(["A"]), "v / Mobile"), Some(&Value::Int(1)));
    assert_eq!(table.cell(&RowKey::data(["A"]), "v / Desktop"), Some(&Value::Int(2)));
    assert_eq!(table.cell(&RowKey::data(["B"]), "v / Mobile"), Some(&Value::Int(3)));
    assert_eq!(table.cell(&RowKey::data(["B"]), "v / Desktop"), None);
    assert_eq!(
        table.render(),
        "g  v / Desktop  v / Mobile\nA  2            1\nB               3\n"
    );
}

#[test]
fn test_totals_survive_topn_and_limit() {
    let mut ds = ads();
    let base = ReportSpec::new()
        .row("country")
        .metric(clicks())
        .sort_by("clicks", false)
        .totals(true);

    let top = ds.report(&base.clone().topn(2)).unwrap();
    let keys: Vec<RowKey> = top.single().unwrap().rows.iter().map(|r| r.key.clone()).collect();
    assert_eq!(keys, vec![RowKey::data(["US"]), RowKey::data(["FR"]), RowKey::Total]);

    let limited = ds.report(&base.clone().topn(2).limit(1)).unwrap();
    let table = limited.single().unwrap();
    assert_eq!(table.render(), "country  clicks\nUS       21\nTotal    34\n");

    // limit never widens top-N
    let widened = ds.report(&base.topn(1).limit(3)).unwrap();
    assert_eq!(widened.single().unwrap().data_rows().count(), 1);
}

#[test]
fn test_totals_sum_pivoted_columns() {
    let mut ds = ads();
    let spec = ReportSpec::new()
        .row("country")
        .column("device")
        .metric(clicks())
        .totals(true);
    let result = ds.report(&spec).unwrap();
    let table = result.single().unwrap();
    assert_eq!(table.cell(&RowKey::Total, "clicks / Mobile"), Some(&Value::Int(28)));
    assert_eq!(table.cell(&RowKey::Total, "clicks / Desktop"), Some(&Value::Int(6)));
    assert_eq!(table.cell(&RowKey::data(["FR"]), "clicks / Desktop"), None);
}

#[test]
fn test_slicers_partition_the_result() {
    let mut ds = ads();
    let spec = ReportSpec::new().row("device").slicer("region").metric(clicks());
    let result = ds.report(&spec).unwrap();

    assert_eq!(result.slicer_names, vec!["region"]);
    let keys: Vec<Vec<Value>> = result.slices.iter().map(|s| s.key.clone()).collect();
    assert_eq!(
        keys,
        vec![vec![Value::from("East")], vec![Value::from("North")], vec![Value::from("West")]]
    );

    let west = result.get(&[Value::from("West")]).unwrap();
    assert_eq!(west.cell(&RowKey::data(["Mobile"]), "clicks"), Some(&Value::Int(18)));
    assert_eq!(west.cell(&RowKey::data(["Desktop"]), "clicks"), Some(&Value::Int(5)));

    let east = result.get(&[Value::from("East")]).unwrap();
    assert_eq!(east.len(), 1);
    assert!(east.row(&RowKey::data(["Desktop"])).is_none());

    assert!(result.single().unwrap_err().is_validation());
}

#[test]
fn test_month_buckets_as_columns() {
    let mut ds = ads();
    let spec = ReportSpec::new()
        .row("country")
        .column(Dimension::column("day").with_time_grain("month"))
        .metric(clicks());
    let result = ds.report(&spec).unwrap();
    let table = result.single().unwrap();

    assert_eq!(
        table.columns,
        vec!["clicks / 2024-01-01", "clicks / 2024-02-01", "clicks / 2024-03-01"]
    );
    let order: Vec<RowKey> = table.rows.iter().map(|r| r.key.clone()).collect();
    assert_eq!(
        order,
        vec![RowKey::data(["CA"]), RowKey::data(["FR"]), RowKey::data(["US"])]
    );
    assert_eq!(table.cell(&RowKey::data(["US"]), "clicks / 2024-01-01"), Some(&Value::Int(15)));
    assert_eq!(table.cell(&RowKey::data(["US"]), "clicks / 2024-02-01"), None);
    assert!(ds.has_column("__day@month__"));
}

#[test]
fn test_week_buckets_start_monday() {
    let mut ds = ads();
    let spec = ReportSpec::new()
        .row(Dimension::row("day").with_time_grain("week"))
        .filter("country = 'US'")
        .metric(clicks());
    let result = ds.report(&spec).unwrap();
    let table = result.single().unwrap();
    assert_eq!(table.index_names, vec!["__day@week__"]);
    let weeks: Vec<String> = table
        .rows
        .iter()
        .map(|r| match &r.key {
            RowKey::Data(values) => values[0].to_string(),
            RowKey::Total => "Total".into(),
        })
        .collect();
    assert_eq!(weeks, vec!["2024-01-01", "2024-01-08", "2024-03-04"]);
}

#[test]
fn test_having_references_measure_names() {
    let mut ds = ads();
    let spec = ReportSpec::new()
        .row("country")
        .metric(clicks())
        .metric(Measure::agg("ctr", ratio_of_sums("clicks", "impr", 0.0)))
        .having("HAVING clicks > 6 AND ctr >= 0.1");
    let result = ds.report(&spec).unwrap();
    let table = result.single().unwrap();
    let keys: Vec<RowKey> = table.rows.iter().map(|r| r.key.clone()).collect();
    assert_eq!(keys, vec![RowKey::data(["FR"]), RowKey::data(["US"])]);
    assert_eq!(table.cell(&RowKey::data(["FR"]), "ctr"), Some(&Value::Float(0.2)));
    assert_eq!(table.cell(&RowKey::data(["US"]), "ctr"), Some(&Value::Float(0.1)));
}

#[test]
fn test_row_measure_with_safe_division() {
    let mut ds = ads();
    let spec = ReportSpec::new()
        .row("country")
        .filter(col("device").eq("Desktop"))
        .metric(Measure::row(
            "ctr",
            safe_div(col("clicks"), col("impr"), 0.0),
            RowAgg::Mean,
        ));
    let result = ds.report(&spec).unwrap();
    let table = result.single().unwrap();
    assert_eq!(table.cell(&RowKey::data(["CA"]), "ctr"), Some(&Value::Float(0.0)));
    assert_eq!(table.cell(&RowKey::data(["US"]), "ctr"), Some(&Value::Float(0.1)));
}

#[test]
fn test_no_dimensions_no_measures_counts_rows() {
    let mut ds = ads();
    let result = ds.report(&ReportSpec::new()).unwrap();
    assert_eq!(result.len(), 1);
    let table = result.single().unwrap();
    assert_eq!(table.columns, vec!["rows"]);
    assert_eq!(table.cell(&RowKey::Data(vec![]), "rows"), Some(&Value::Int(6)));
}

#[test]
fn test_null_group_keys_sort_last() {
    let mut ds = Dataset::new(
        Frame::from_records(&json!([
            {"g": null, "v": 1},
            {"g": "b", "v": 2},
            {"g": "a", "v": 3},
            {"g": null, "v": 4},
        ]))
        .unwrap(),
    );
    let spec = ReportSpec::new().row("g").metric(Measure::agg("v", sum("v")));
    let result = ds.report(&spec).unwrap();
    let table = result.single().unwrap();
    let keys: Vec<RowKey> = table.rows.iter().map(|r| r.key.clone()).collect();
    assert_eq!(
        keys,
        vec![RowKey::data(["a"]), RowKey::data(["b"]), RowKey::Data(vec![Value::Null])]
    );
    assert_eq!(table.cell(&RowKey::Data(vec![Value::Null]), "v"), Some(&Value::Int(5)));
}

#[test]
fn test_report_leaves_spec_and_base_untouched() {
    let mut ds = ads();
    let spec = ReportSpec::new()
        .row(Dimension::row("day").with_time_grain("quarter"))
        .metric(clicks());
    let before = spec.clone();
    let base_columns: Vec<String> = ds.base().column_names().map(String::from).collect();

    let first = report(&mut ds, &spec, &LocalEngine).unwrap();
    let second = ds.report(&spec).unwrap();

    assert_eq!(spec, before);
    assert_eq!(first, second);
    assert_eq!(
        ds.base().column_names().map(String::from).collect::<Vec<_>>(),
        base_columns
    );
    assert_eq!(ds.derived().len(), 1);
}

#[test]
fn test_errors_before_execution() {
    let mut ds = ads();

    let missing = ReportSpec::new().row("campaign");
    assert!(ds.report(&missing).unwrap_err().is_validation());

    let syntax = ReportSpec::new().filter("clicks >");
    assert!(ds.report(&syntax).unwrap_err().is_syntax());

    let type_error = ReportSpec::new().metric(Measure::agg("total", sum("country")));
    assert!(ds.report(&type_error).unwrap_err().is_validation());
}

#[test]
fn test_engine_metadata() {
    let engine = LocalEngine::new();
    assert_eq!(engine.name(), "local");
    assert_eq!(engine.target(), PlanTarget::Local);

    let mut ds = ads();
    let spec = ReportSpec::new().row("device").metric(clicks());
    let plan = Planner::new(engine.target()).plan(&mut ds, &spec).unwrap();
    let aggregated = engine.aggregate(&ds, &spec, &plan).unwrap();
    assert_eq!(
        aggregated.to_records(),
        json!([{"device": "Mobile", "clicks": 28}, {"device": "Desktop", "clicks": 6}])
    );
}
