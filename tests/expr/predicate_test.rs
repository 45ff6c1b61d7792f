//! Predicate evaluation over frames: three-valued logic, patterns, sets and ranges.

use serde_json::json;
use tabula::data::{Frame, Value};
use tabula::expr::{adapt_where, col, lit, ExprExt, Filter, Inclusive, Predicate};
use tabula::sql::sql;

fn frame(records: serde_json::Value) -> Frame {
    Frame::from_records(&records).unwrap()
}

fn names() -> Frame {
    frame(json!([
        {"s": "aXXb"},
        {"s": "ab"},
        {"s": "Xab"},
        {"s": "abX"},
        {"s": null},
    ]))
}

#[test]
fn test_like_wildcards_are_anchored() {
    let hits = col("s").like("a%b").eval(&names()).unwrap();
    assert_eq!(hits, vec![Some(true), Some(true), Some(false), Some(false), None]);
}

#[test]
fn test_like_underscore_and_case() {
    let f = frame(json!([{"s": "Cat"}, {"s": "cot"}, {"s": "coat"}]));
    assert_eq!(
        col("s").like("c_t").eval(&f).unwrap(),
        vec![Some(false), Some(true), Some(false)]
    );
    assert_eq!(
        col("s").ilike("c_t").eval(&f).unwrap(),
        vec![Some(true), Some(true), Some(false)]
    );
    assert_eq!(
        col("s").not_ilike("c_t").eval(&f).unwrap(),
        vec![Some(false), Some(false), Some(true)]
    );
}

#[test]
fn test_like_treats_regex_metacharacters_literally() {
    let f = frame(json!([{"s": "a.b"}, {"s": "axb"}, {"s": "(x)"}]));
    assert_eq!(
        col("s").like("a.b").mask(&f).unwrap(),
        vec![true, false, false]
    );
    assert_eq!(col("s").like("(%)").mask(&f).unwrap(), vec![false, false, true]);
}

#[test]
fn test_contains() {
    let f = frame(json!([{"s": "Big Apple"}, {"s": "pineapple"}, {"s": "pear"}]));
    assert_eq!(
        col("s").contains("apple", false).mask(&f).unwrap(),
        vec![false, true, false]
    );
    assert_eq!(
        col("s").contains("apple", true).mask(&f).unwrap(),
        vec![true, true, false]
    );
}

#[test]
fn test_regex_search_and_flags() {
    let f = frame(json!([{"s": "Order-42"}, {"s": "order-x"}, {"s": null}]));
    assert_eq!(
        col("s").regex(r"-\d+$", "").eval(&f).unwrap(),
        vec![Some(true), Some(false), None]
    );
    assert_eq!(
        col("s").regex("^order", "i").mask(&f).unwrap(),
        vec![true, true, false]
    );
    assert_eq!(
        col("s").not_regex("^order", "").eval(&f).unwrap(),
        vec![Some(true), Some(false), None]
    );
}

#[test]
fn test_regex_rejects_unknown_flag() {
    let f = frame(json!([{"s": "a"}]));
    let err = col("s").regex("a", "x").eval(&f).unwrap_err();
    assert!(err.is_validation());
    assert!(err.to_string().contains("'x'"));
}

#[test]
fn test_kleene_logic() {
    let f = frame(json!([
        {"a": 1, "b": null},
        {"a": 0, "b": null},
        {"a": null, "b": null},
    ]));
    let a = || col("a").eq(1);
    let b = || col("b").eq(1);

    assert_eq!((a() & b()).eval(&f).unwrap(), vec![None, Some(false), None]);
    assert_eq!((a() | b()).eval(&f).unwrap(), vec![Some(true), None, None]);
    assert_eq!((!b()).eval(&f).unwrap(), vec![None, None, None]);
    // a filter keeps only rows that are known to be true
    assert_eq!((a() | b()).mask(&f).unwrap(), vec![true, false, false]);
}

#[test]
fn test_is_null_is_never_unknown() {
    let f = frame(json!([{"x": null}, {"x": 3}]));
    assert_eq!(col("x").is_null().eval(&f).unwrap(), vec![Some(true), Some(false)]);
    assert_eq!(col("x").not_null().eval(&f).unwrap(), vec![Some(false), Some(true)]);
}

#[test]
fn test_in_list() {
    let f = frame(json!([{"c": "US"}, {"c": "FR"}, {"c": null}]));
    assert_eq!(
        col("c").isin(["US", "CA"]).eval(&f).unwrap(),
        vec![Some(true), Some(false), None]
    );
    assert_eq!(
        col("c").isin(Vec::<Value>::new()).eval(&f).unwrap(),
        vec![Some(false), Some(false), Some(false)]
    );
    // a null in the set makes a miss unknown
    assert_eq!(
        col("c").isin([Value::from("US"), Value::Null]).eval(&f).unwrap(),
        vec![Some(true), None, None]
    );
}

#[test]
fn test_between_inclusivity() {
    let f = frame(json!([{"x": 1}, {"x": 3}, {"x": 5}]));
    let run = |inclusive| col("x").between_with(1, 5, inclusive).mask(&f).unwrap();
    assert_eq!(run(Inclusive::Both), vec![true, true, true]);
    assert_eq!(run(Inclusive::Left), vec![true, true, false]);
    assert_eq!(run(Inclusive::Right), vec![false, true, true]);
    assert_eq!(run(Inclusive::Neither), vec![false, true, false]);
}

#[test]
fn test_dates_compare_with_strings() {
    let mut f = frame(json!([{"d": "2024-01-15"}, {"d": "2024-03-01"}]));
    let dates = f
        .column("d")
        .unwrap()
        .values
        .iter()
        .map(|v| Value::Date(v.to_date().unwrap()))
        .collect();
    f.insert(tabula::data::Column::new("d", dates)).unwrap();

    assert_eq!(
        col("d").ge("2024-02-01").mask(&f).unwrap(),
        vec![false, true]
    );
    assert_eq!(
        col("d").between("2024-01-01", "2024-01-31").mask(&f).unwrap(),
        vec![true, false]
    );
}

#[test]
fn test_mismatched_types_compare_unequal() {
    let f = frame(json!([{"x": "1"}]));
    assert_eq!(col("x").eq(1).eval(&f).unwrap(), vec![Some(false)]);
    assert_eq!(col("x").ne(1).eval(&f).unwrap(), vec![Some(true)]);
    assert_eq!(col("x").gt(1).eval(&f).unwrap(), vec![None]);
}

#[test]
fn test_raw_sql_predicate_evaluates_like_the_tree() {
    let f = frame(json!([
        {"country": "US", "impr": 10},
        {"country": "CA", "impr": 0},
        {"country": "FR", "impr": 5},
    ]));
    let text = sql("WHERE country IN ('US', 'CA') AND impr > 0");
    let tree = col("country").isin(["US", "CA"]) & col("impr").gt(0);
    assert_eq!(text.mask(&f).unwrap(), tree.mask(&f).unwrap());
    assert_eq!(text.dependencies(), tree.dependencies());
}

#[test]
fn test_adapt_where_folds_filters() {
    let filters = vec![
        Filter::Equal {
            field: "device".into(),
            value: "Mobile".into(),
        },
        Filter::Include {
            field: "country".into(),
            values: vec!["US".into(), "CA".into()],
        },
        Filter::Predicate(col("impr").gt(0)),
    ];
    let pred = adapt_where(&filters).unwrap();
    assert_eq!(
        pred,
        col("device").eq("Mobile") & col("country").isin(["US", "CA"]) & col("impr").gt(0)
    );
    assert_eq!(adapt_where(&[]), None);
}

#[test]
fn test_dependencies() {
    let pred = (col("a").gt(col("b") + 1) | col("c").like("x%")) & !col("a").is_null();
    let deps: Vec<String> = pred.dependencies().into_iter().collect();
    assert_eq!(deps, vec!["a", "b", "c"]);
    assert!(lit(1).eq(1).dependencies().is_empty());
}

#[test]
fn test_structured_shape() {
    let pred = !col("device").eq("Tablet");
    assert_eq!(
        serde_json::to_value(&pred).unwrap(),
        json!({
            "kind": "not",
            "expr": {
                "kind": "cmp",
                "op": "=",
                "left": {"kind": "column", "name": "device"},
                "right": {"kind": "literal", "value": "Tablet"}
            }
        })
    );
    let back: Predicate = serde_json::from_value(serde_json::to_value(&pred).unwrap()).unwrap();
    assert_eq!(back, pred);
}
