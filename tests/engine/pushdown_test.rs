//! Push-down engines against a recording backend.

use std::sync::{Arc, Mutex};

use insta::assert_snapshot;
use serde_json::json;
use sqlparser::dialect::{BigQueryDialect, DuckDbDialect};
use sqlparser::parser::Parser;
use tabula::data::{Dataset, Frame};
use tabula::engine::{
    report, EmbeddedEngine, Engine, LocalEngine, SqlBackend, WarehouseConfig, WarehouseEngine,
    DATASET_TABLE,
};
use tabula::error::BackendError;
use tabula::expr::{ratio_of_sums, sum};
use tabula::model::{Dimension, Measure, ReportSpec};
use tabula::planner::{PlanTarget, Planner};

/// One recorded `execute` call: statement, table names, rows in the first table.
type Call = (String, Vec<String>, usize);

/// Returns a fixed frame and remembers what it was asked to run.
struct RecordingBackend {
    reply: Result<Frame, BackendError>,
    calls: Arc<Mutex<Vec<Call>>>,
}

impl RecordingBackend {
    fn new(reply: Result<Frame, BackendError>) -> (Self, Arc<Mutex<Vec<Call>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let backend = Self {
            reply,
            calls: Arc::clone(&calls),
        };
        (backend, calls)
    }
}

impl SqlBackend for RecordingBackend {
    fn name(&self) -> &str {
        "recording"
    }

    fn execute(&self, sql: &str, tables: &[(&str, &Frame)]) -> Result<Frame, BackendError> {
        let names = tables.iter().map(|(name, _)| name.to_string()).collect();
        let rows = tables.first().map(|(_, frame)| frame.len()).unwrap_or(0);
        self.calls.lock().unwrap().push((sql.to_string(), names, rows));
        self.reply.clone()
    }
}

fn ads() -> Dataset {
    Dataset::new(
        Frame::from_records(&json!([
            {"country": "US", "day": "2024-01-03", "clicks": 10, "impr": 100},
            {"country": "US", "day": "2024-02-10", "clicks": 5,  "impr": 50},
            {"country": "CA", "day": "2024-02-01", "clicks": 4,  "impr": 80},
            {"country": "FR", "day": "2024-01-20", "clicks": 8,  "impr": 0},
        ]))
        .unwrap(),
    )
}

fn spec() -> ReportSpec {
    ReportSpec::new()
        .row("country")
        .column(Dimension::column("day").with_time_grain("month"))
        .metric(Measure::agg("clicks", sum("clicks")))
        .metric(Measure::agg("ctr", ratio_of_sums("clicks", "impr", 0.0)))
        .filter("impr > 0")
        .having("clicks > 6")
}

/// What a correct backend would return: the in-process aggregate.
fn expected_aggregate(spec: &ReportSpec) -> Frame {
    let mut ds = ads();
    let plan = Planner::new(PlanTarget::Local).plan(&mut ds, spec).unwrap();
    LocalEngine.aggregate(&ds, spec, &plan).unwrap()
}

fn warehouse_config() -> WarehouseConfig {
    WarehouseConfig::new("p", "d", "t").with_location("EU")
}

#[test]
fn test_embedded_statement() {
    let sql = EmbeddedEngine::new(None).render_sql(&spec()).unwrap();
    assert_snapshot!(sql, @r#"
    SELECT
      "country" AS "country",
      "__day@month__" AS "__day@month__",
      SUM("clicks") AS "clicks",
      COALESCE((CAST(SUM("clicks") AS DOUBLE) / NULLIF(CAST(SUM("impr") AS DOUBLE), 0)), 0.0) AS "ctr"
    FROM "dataset"
    WHERE ("impr" > 0)
    GROUP BY 1, 2
    HAVING ((SUM("clicks")) > 6)
    "#);
    Parser::parse_sql(&DuckDbDialect {}, &sql).unwrap();
}

#[test]
fn test_warehouse_statement_truncates_in_sql() {
    let sql = WarehouseEngine::new(warehouse_config()).render_sql(&spec()).unwrap();
    assert_snapshot!(sql, @r"
    SELECT
      `country` AS `country`,
      DATE_TRUNC(DATE(`day`), MONTH) AS `__day@month__`,
      SUM(`clicks`) AS `clicks`,
      COALESCE(SAFE_DIVIDE(CAST(SUM(`clicks`) AS FLOAT64), CAST(SUM(`impr`) AS FLOAT64)), 0.0) AS `ctr`
    FROM `p.d.t`
    WHERE (`impr` > 0)
    GROUP BY 1, 2
    HAVING ((SUM(`clicks`)) > 6)
    ");
}

#[test]
fn test_statement_without_keys_or_measures() {
    let sql = WarehouseEngine::new(warehouse_config())
        .render_sql(&ReportSpec::new())
        .unwrap();
    assert_snapshot!(sql, @r"
    SELECT
      COUNT(*) AS `rows`
    FROM `p.d.t`
    ");
    Parser::parse_sql(&BigQueryDialect {}, &sql).unwrap();
}

#[test]
fn test_embedded_sends_dataset_with_buckets() {
    let spec = spec();
    let (backend, calls) = RecordingBackend::new(Ok(expected_aggregate(&spec)));
    let engine = EmbeddedEngine::new(Some("/tmp/reports.duckdb".into())).with_backend(Box::new(backend));
    assert_eq!(engine.location(), Some("/tmp/reports.duckdb"));

    let mut ds = ads();
    let pushed = report(&mut ds, &spec, &engine).unwrap();
    let local = ads().report(&spec).unwrap();
    assert_eq!(pushed, local);

    let calls = calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    let (sql, tables, rows) = &calls[0];
    assert_eq!(sql, &engine.render_sql(&spec).unwrap());
    assert_eq!(tables, &vec![DATASET_TABLE.to_string()]);
    assert_eq!(*rows, 4);
    assert!(ds.has_column("__day@month__"));
}

#[test]
fn test_warehouse_sends_no_tables_and_materializes_nothing() {
    let spec = spec();
    let (backend, calls) = RecordingBackend::new(Ok(expected_aggregate(&spec)));
    let engine = WarehouseEngine::new(warehouse_config()).with_backend(Box::new(backend));
    assert_eq!(engine.config().qualified_table(), "p.d.t");

    let mut ds = ads();
    let pushed = report(&mut ds, &spec, &engine).unwrap();
    assert_eq!(pushed, ads().report(&spec).unwrap());
    assert!(ds.derived().is_empty());

    let calls = calls.lock().unwrap();
    assert_eq!(calls[0].1, Vec::<String>::new());
    assert!(calls[0].0.contains("FROM `p.d.t`"));
}

#[test]
fn test_missing_backend_is_unavailable() {
    let mut ds = ads();
    let err = report(&mut ds, &spec(), &EmbeddedEngine::new(None)).unwrap_err();
    assert!(err.is_backend_unavailable());
    assert_eq!(
        err.to_string(),
        "embedded backend unavailable: no SQL backend configured"
    );

    let err = report(&mut ds, &spec(), &WarehouseEngine::new(warehouse_config())).unwrap_err();
    assert!(err.is_backend_unavailable());

    let err = report(&mut ds, &spec(), &WarehouseEngine::new(WarehouseConfig::default())).unwrap_err();
    assert!(err.is_backend_unavailable());
    assert!(err.to_string().contains("missing project, dataset, table"));
}

#[test]
fn test_backend_errors_pass_through() {
    let failure = BackendError::new("recording", "table dataset does not exist");
    let (backend, _) = RecordingBackend::new(Err(failure.clone()));
    let engine = EmbeddedEngine::new(None).with_backend(Box::new(backend));
    let err = report(&mut ads(), &spec(), &engine).unwrap_err();
    assert_eq!(err, tabula::ReportError::Backend(failure));
    assert!(!err.is_backend_unavailable());
}

#[test]
fn test_invalid_spec_fails_before_backend() {
    let (backend, calls) = RecordingBackend::new(Ok(Frame::default()));
    let engine = EmbeddedEngine::new(None).with_backend(Box::new(backend));
    let bad = spec().having("clicks >");
    let err = report(&mut ads(), &bad, &engine).unwrap_err();
    assert!(err.is_syntax());
    assert!(calls.lock().unwrap().is_empty());
}

#[test]
fn test_engine_targets() {
    assert_eq!(EmbeddedEngine::new(None).target(), PlanTarget::Embedded);
    assert_eq!(WarehouseEngine::new(warehouse_config()).target(), PlanTarget::Warehouse);
    assert_eq!(EmbeddedEngine::new(None).name(), "embedded");
    assert_eq!(WarehouseEngine::new(warehouse_config()).name(), "warehouse");
}
