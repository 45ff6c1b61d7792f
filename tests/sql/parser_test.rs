//! Clause text to predicate trees, through the public parser entry points.

use serde_json::json;
use tabula::data::Value;
use tabula::expr::{col, lit, ExprExt, Predicate};
use tabula::sql::lexer::{tokenize, Keyword, LexemeKind};
use tabula::sql::{parse_predicate, sql, sql_bigquery, SqlPredicate};
use tabula::Dialect;

fn parse(input: &str) -> Predicate {
    parse_predicate(input).unwrap()
}

#[test]
fn test_tokenize_realistic_clause() {
    let kinds: Vec<LexemeKind> = tokenize("\"t\".\"Ad Group\" >= 1.5e2 and /* note */ x in ('a''b', -- tail\n 2)")
        .unwrap()
        .into_iter()
        .map(|l| l.kind)
        .collect();
    assert_eq!(
        kinds,
        vec![
            LexemeKind::Ident("t.Ad Group".into()),
            LexemeKind::Op(">="),
            LexemeKind::Number("1.5e2".into()),
            LexemeKind::Keyword(Keyword::And),
            LexemeKind::Ident("x".into()),
            LexemeKind::Keyword(Keyword::In),
            LexemeKind::LParen,
            LexemeKind::Str("a'b".into()),
            LexemeKind::Comma,
            LexemeKind::Number("2".into()),
            LexemeKind::RParen,
        ]
    );
}

#[test]
fn test_lexeme_text_recovers_source() {
    let input = "price <> 'x'";
    let lexemes = tokenize(input).unwrap();
    let texts: Vec<&str> = lexemes.iter().map(|l| l.text(input)).collect();
    assert_eq!(texts, vec!["price", "<>", "'x'"]);
}

#[test]
fn test_mixed_case_keywords() {
    assert_eq!(
        parse("Country In ('US') aNd NOT clicks between 1 AND 10"),
        col("Country").isin(["US"]) & !col("clicks").between(1, 10)
    );
}

#[test]
fn test_quoted_identifiers_in_both_styles() {
    assert_eq!(parse("\"order\" = 1"), col("order").eq(1));
    assert_eq!(parse("`p`.`d`.`t` = 'x'"), col("p.d.t").eq("x"));
    assert_eq!(parse("\"a\"\"b\" IS NOT NULL"), col("a\"b").not_null());
}

#[test]
fn test_literal_types() {
    assert_eq!(parse("f = TRUE"), col("f").eq(true));
    assert_eq!(parse("n = 1.25"), col("n").eq(1.25));
    assert_eq!(parse("n = 2e3"), col("n").eq(2000.0));
    assert_eq!(parse("n > -7"), col("n").gt(-7));
    assert_eq!(
        parse("n = 99999999999999999999"),
        col("n").eq(lit(Value::Float(1e20)))
    );
    assert_eq!(parse("n = NULL"), col("n").eq(lit(Value::Null)));
}

#[test]
fn test_comparison_aliases_normalize() {
    assert_eq!(parse("a == 1"), parse("a = 1"));
    assert_eq!(parse("a != 1"), parse("a <> 1"));
}

#[test]
fn test_like_with_expression_pattern() {
    assert_eq!(
        parse("name NOT ILIKE prefix + '%'"),
        !col("name").like_expr(col("prefix") + lit("%"), true, false)
    );
}

#[test]
fn test_deeply_nested_groups() {
    let p = parse("((a = 1) OR ((b = 2 AND (c = 3))))");
    assert_eq!(p, col("a").eq(1) | (col("b").eq(2) & col("c").eq(3)));
}

#[test]
fn test_structured_form_of_parsed_tree() {
    let p = parse("clicks / impr > 0.1 AND device IN ('Mobile')");
    assert_eq!(
        serde_json::to_value(&p).unwrap(),
        json!({
            "kind": "bool",
            "op": "and",
            "left": {
                "kind": "cmp",
                "op": ">",
                "left": {
                    "kind": "binary",
                    "op": "/",
                    "left": {"kind": "column", "name": "clicks"},
                    "right": {"kind": "column", "name": "impr"}
                },
                "right": {"kind": "literal", "value": 0.1}
            },
            "right": {
                "kind": "in",
                "expr": {"kind": "column", "name": "device"},
                "values": ["Mobile"]
            }
        })
    );
}

#[test]
fn test_sql_predicate_strips_keyword_and_caches() {
    let p = SqlPredicate::new("  where a = 1", Dialect::Ansi);
    assert_eq!(p.parsed().unwrap(), &col("a").eq(1));
    assert!(std::ptr::eq(p.parsed().unwrap(), p.parsed().unwrap()));

    let having = SqlPredicate::new("HAVING clicks > 10", Dialect::DuckDb);
    assert_eq!(having.parsed().unwrap(), &col("clicks").gt(10));
}

#[test]
fn test_sql_predicates_compare_by_text_and_dialect() {
    assert_eq!(sql("a = 1"), sql("a = 1"));
    assert_ne!(sql("a = 1"), sql("a=1"));
    assert_ne!(sql("a = 1"), sql_bigquery("a = 1"));
}

#[test]
fn test_error_positions() {
    let cases = [
        ("a = ", 4, "expected expression (found end of input)"),
        ("a = 1 b = 2", 6, "unexpected trailing input"),
        ("a IN 1", 5, "expected '(' after IN"),
        ("a IS 1", 5, "expected NULL after IS"),
        ("a = 'open", 4, "unterminated string literal"),
        ("a BETWEEN 1 OR 2", 12, "expected AND in BETWEEN"),
        ("AND a = 1", 0, "unexpected keyword AND"),
    ];
    for (input, offset, message) in cases {
        let err = parse_predicate(input).unwrap_err();
        assert_eq!((err.offset, err.message.as_str()), (offset, message), "{}", input);
    }
}

#[test]
fn test_error_display_and_found_text() {
    let err = parse_predicate("a = 1 )").unwrap_err();
    assert_eq!(err.found.as_deref(), Some(")"));
    assert_eq!(err.to_string(), "unexpected trailing input at 6");
}

#[test]
fn test_raw_sql_error_surfaces_as_syntax_error() {
    let err = SqlPredicate::new("WHERE a = = 1", Dialect::Ansi)
        .parsed()
        .unwrap_err();
    assert!(err.is_syntax());
}
