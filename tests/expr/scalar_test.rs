//! Scalar and aggregate expression evaluation.

use serde_json::json;
use tabula::data::{Frame, Value};
use tabula::expr::{
    avg, case_when, coalesce, col, concat, count, count_star, lit, max, min, nunique,
    ratio_of_sums, safe_div, sum, BinaryOp, ExprExt, ScalarExpr,
};

fn frame() -> Frame {
    Frame::from_records(&json!([
        {"n": 10, "d": 4, "s": "a", "x": null},
        {"n": 3, "d": 0, "s": "b", "x": 1.5},
        {"n": null, "d": 2, "s": null, "x": 2},
    ]))
    .unwrap()
}

#[test]
fn test_safe_div_fills_zero_and_null() {
    let expr = safe_div(col("n"), col("d"), -1.0);
    assert_eq!(
        expr.eval(&frame()).unwrap(),
        vec![Value::Float(2.5), Value::Float(-1.0), Value::Float(-1.0)]
    );
}

#[test]
fn test_div_operator_is_safe_with_zero_fill() {
    let out = (col("n") / col("d")).eval(&frame()).unwrap();
    assert_eq!(out, vec![Value::Float(2.5), Value::Float(0.0), Value::Float(0.0)]);
}

#[test]
fn test_binary_division_fills_zero() {
    let expr = ScalarExpr::binary(BinaryOp::Div, col("n"), col("d"));
    assert_eq!(
        expr.eval(&frame()).unwrap(),
        vec![Value::Float(2.5), Value::Float(0.0), Value::Float(0.0)]
    );
    assert_eq!(expr.eval(&frame()).unwrap(), (col("n") / col("d")).eval(&frame()).unwrap());
}

#[test]
fn test_arithmetic_types() {
    let f = frame();
    assert_eq!(
        (col("n") + 1).eval(&f).unwrap(),
        vec![Value::Int(11), Value::Int(4), Value::Null]
    );
    assert_eq!(
        (col("n") * col("x")).eval(&f).unwrap(),
        vec![Value::Null, Value::Float(4.5), Value::Null]
    );
    assert_eq!(
        (col("d") - 2).eval(&f).unwrap(),
        vec![Value::Int(2), Value::Int(-2), Value::Int(0)]
    );
}

#[test]
fn test_arithmetic_on_strings_is_a_type_error() {
    let err = (col("s") + 1).eval(&frame()).unwrap_err();
    assert!(err.is_validation());
}

#[test]
fn test_concat_renders_text() {
    let out = concat(col("s"), concat(lit("-"), col("n"))).eval(&frame()).unwrap();
    assert_eq!(out, vec![Value::from("a-10"), Value::from("b-3"), Value::Null]);
}

#[test]
fn test_coalesce_first_non_null() {
    let f = frame();
    assert_eq!(
        coalesce([col("x"), col("n"), lit(0)]).eval(&f).unwrap(),
        vec![Value::Int(10), Value::Float(1.5), Value::Int(2)]
    );
    assert_eq!(
        coalesce(Vec::<ScalarExpr>::new()).eval(&f).unwrap(),
        vec![Value::Null, Value::Null, Value::Null]
    );
}

#[test]
fn test_case_when_first_match_wins() {
    let expr = case_when(
        [
            (col("n").gt(5), lit("big")),
            (col("n").gt(1), lit("medium")),
            (col("n").gt(0), lit("small")),
        ],
        Some(lit("unknown")),
    );
    assert_eq!(
        expr.eval(&frame()).unwrap(),
        vec![Value::from("big"), Value::from("medium"), Value::from("unknown")]
    );

    let no_default = case_when([(col("d").eq(0), lit(1))], None);
    assert_eq!(
        no_default.eval(&frame()).unwrap(),
        vec![Value::Null, Value::Int(1), Value::Null]
    );
}

#[test]
fn test_case_when_evaluates_results_only_where_selected() {
    let mixed = Frame::from_records(&json!([
        {"kind": "num", "v": 4},
        {"kind": "text", "v": "x"},
        {"kind": null, "v": "y"},
    ]))
    .unwrap();
    let expr = case_when(
        [
            (col("kind").eq("num"), col("v") + 1),
            (col("kind").eq("never"), col("v") * 2),
        ],
        Some(concat(col("v"), lit("!"))),
    );
    assert_eq!(
        expr.eval(&mixed).unwrap(),
        vec![Value::Int(5), Value::from("x!"), Value::from("y!")]
    );

    // a selected branch still reports its own type error
    let err = case_when([(col("kind").eq("text"), col("v") + 1)], None)
        .eval(&mixed)
        .unwrap_err();
    assert!(err.is_validation());
}

#[test]
fn test_fragment_is_not_evaluable() {
    let expr = ScalarExpr::Fragment {
        sql: "SUM(x)".into(),
    };
    assert!(expr.eval(&frame()).unwrap_err().is_validation());
}

#[test]
fn test_dependencies() {
    let expr = case_when([(col("a").gt(0), col("b"))], Some(safe_div(col("c"), col("a"), 0.0)));
    let deps: Vec<String> = expr.dependencies().into_iter().collect();
    assert_eq!(deps, vec!["a", "b", "c"]);
}

#[test]
fn test_aggregates_per_group() {
    let f = frame();
    let groups = vec![vec![0, 1], vec![2]];
    let run = |agg: tabula::expr::AggExpr| agg.aggregate(&f, &groups).unwrap();

    assert_eq!(run(sum("n")), vec![Value::Int(13), Value::Null]);
    assert_eq!(run(avg("d")), vec![Value::Float(2.0), Value::Float(2.0)]);
    assert_eq!(run(min("s")), vec![Value::from("a"), Value::Null]);
    assert_eq!(run(max("x")), vec![Value::Float(1.5), Value::Int(2)]);
    assert_eq!(run(count("x")), vec![Value::Int(1), Value::Int(1)]);
    assert_eq!(run(count_star()), vec![Value::Int(2), Value::Int(1)]);
    assert_eq!(run(nunique("d")), vec![Value::Int(2), Value::Int(1)]);
    assert_eq!(
        run(ratio_of_sums("n", "d", 0.0)),
        vec![Value::Float(3.25), Value::Float(0.0)]
    );
}

#[test]
fn test_aggregate_structured_shape() {
    let agg = ratio_of_sums("clicks", "impr", 0.0);
    assert_eq!(
        serde_json::to_value(&agg).unwrap(),
        json!({
            "kind": "ratio_of_sums",
            "numerator": {"kind": "column", "name": "clicks"},
            "denominator": {"kind": "column", "name": "impr"},
            "fill": 0.0
        })
    );
}
