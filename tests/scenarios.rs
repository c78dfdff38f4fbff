//! The end-to-end scenario table: each row names an input, the AST it
//! should parse to, and the value it should evaluate to.

use ctl::evaluator::Engine;
use ctl::parser::parse_expression;
use ctl::preamble;
use ctl::source_tracker::Tracker;
use ctl::value::Value;

fn parse(text: &str) -> (Tracker, ctl::ast::Expr) {
    let mut tracker = Tracker::new();
    let span = tracker.add_source("t.ctl".into(), text.to_string());
    let expr = parse_expression(&mut tracker, span).unwrap().unwrap();
    (tracker, expr)
}

fn engine() -> Engine {
    let mut engine = Engine::new();
    preamble::install(&mut engine);
    engine
}

#[test]
fn arithmetic_precedence() {
    let (tracker, expr) = parse("1 + 2 * 3");
    assert_eq!(format!("{}", expr.display(&tracker)), "(plus 1 (times 2 3))");
    assert_eq!(engine().evaluate(&tracker, &expr).unwrap(), Value::Int64(7));
}

#[test]
fn parentheses_override_precedence() {
    let (tracker, expr) = parse("(1 + 2) * 3");
    assert_eq!(format!("{}", expr.display(&tracker)), "(times (plus 1 2) 3)");
    match &expr {
        ctl::ast::Expr::Operator { lhs: Some(lhs), .. } => {
            assert!(matches!(**lhs, ctl::ast::Expr::Operator { parenthesized: true, .. }));
        }
        other => panic!("expected a binary operator node, got {other:?}"),
    }
    assert_eq!(engine().evaluate(&tracker, &expr).unwrap(), Value::Int64(9));
}

#[test]
fn chained_comparisons_are_non_associative() {
    let mut tracker = Tracker::new();
    let span = tracker.add_source("t.ctl".into(), "1 < 2 < 3".to_string());
    let err = parse_expression(&mut tracker, span).unwrap_err();
    assert!(err.message.contains("non-associative"));
    assert_eq!(err.notes.len(), 1);
}

#[test]
fn object_literal_sees_earlier_keys() {
    let (tracker, expr) = parse("{ a = 1, b = a + 1 }");
    match engine().evaluate(&tracker, &expr).unwrap() {
        Value::Object(fields) => {
            assert_eq!(fields.get("a"), Some(&Value::Int64(1)));
            assert_eq!(fields.get("b"), Some(&Value::Int64(2)));
        }
        other => panic!("expected an object, got {other:?}"),
    }
}

#[test]
fn string_concatenation_preserves_escape_decoded_bytes() {
    let (tracker, expr) = parse("\"hi\\n\" + \"there\"");
    match engine().evaluate(&tracker, &expr).unwrap() {
        Value::String(s) => {
            assert_eq!(s, "hi\nthere");
            assert_eq!(s.len(), 9);
            assert_eq!(s.as_bytes()[3], 0x0A);
        }
        other => panic!("expected a string, got {other:?}"),
    }
}

#[test]
fn integer_division_truncates_toward_zero() {
    let (tracker, expr) = parse("10 / 3");
    assert_eq!(engine().evaluate(&tracker, &expr).unwrap(), Value::Int64(3));
}

#[test]
fn hex_byte_escape_is_the_single_named_byte() {
    let (tracker, expr) = parse("\"\\xff\"");
    match &expr {
        ctl::ast::Expr::StringLiteral { span } => assert_eq!(tracker.bytes(*span), &[0xFFu8]),
        other => panic!("expected a string literal, got {other:?}"),
    }
}

#[test]
fn standalone_invalid_utf8_byte_escape_errors_on_evaluation() {
    let (tracker, expr) = parse("\"\\xff\"");
    assert!(engine().evaluate(&tracker, &expr).is_err());
}

#[test]
fn integer_overflow_errors_instead_of_wrapping() {
    let (tracker, expr) = parse("9223372036854775807 + 1");
    assert!(engine().evaluate(&tracker, &expr).is_err());
}

#[test]
fn unresolved_identifier_with_no_prelude_binding_errors() {
    let (tracker, expr) = parse("foo");
    let err = engine().evaluate(&tracker, &expr).unwrap_err();
    assert_eq!(err.message, "could not resolve identifier: foo");
}
