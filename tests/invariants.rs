//! Property-style checks for the invariants that must hold for every input,
//! not just the scenario table's fixed examples.

use ctl::ast::Expr;
use ctl::evaluator::Engine;
use ctl::operator::{higher_precedence, Order};
use ctl::parser::parse_expression;
use ctl::preamble;
use ctl::source_tracker::{Span, Tracker};
use proptest::prelude::*;

/// A small arithmetic grammar (integers, `+ - *`, optional parentheses)
/// that's always syntactically valid, so every generated string exercises
/// the parser's precedence climbing without ever hitting a parse error.
fn arithmetic_expr() -> impl Strategy<Value = String> {
    let leaf = (1i64..1000).prop_map(|n| n.to_string());
    leaf.prop_recursive(4, 64, 8, |inner| {
        prop_oneof![
            (inner.clone(), "[+*-]", inner.clone()).prop_map(|(l, op, r)| format!("{l} {op} {r}")),
            inner.prop_map(|e| format!("({e})")),
        ]
    })
}

fn every_span(expr: &Expr, out: &mut Vec<Span>) {
    match expr {
        Expr::Identifier { name } => out.push(*name),
        Expr::IntLiteral { span, .. } | Expr::DoubleLiteral { span, .. } | Expr::StringLiteral { span } => {
            out.push(*span);
        }
        Expr::Operator { op_span, lhs, rhs, .. } => {
            out.push(*op_span);
            if let Some(lhs) = lhs {
                every_span(lhs, out);
            }
            every_span(rhs, out);
        }
        Expr::List { span, items } => {
            out.push(*span);
            for item in items {
                every_span(item, out);
            }
        }
        Expr::Object { span, keys, values } => {
            out.push(*span);
            for key in keys {
                every_span(key, out);
            }
            for value in values {
                every_span(value, out);
            }
        }
    }
}

fn assert_precedence_well_formed(expr: &Expr) {
    if let Expr::Operator { op, rhs, parenthesized: false, lhs, .. } = expr {
        if let Expr::Operator { op: child_op, parenthesized: false, .. } = rhs.as_ref() {
            assert_eq!(
                higher_precedence(*op, *child_op),
                Order::Left,
                "unparenthesized {op:?} should bind tighter than its unparenthesized right child {child_op:?}"
            );
        }
        if let Some(lhs) = lhs {
            assert_precedence_well_formed(lhs);
        }
        assert_precedence_well_formed(rhs);
    }
}

proptest! {
    #[test]
    fn span_containment_holds(text in arithmetic_expr()) {
        let mut tracker = Tracker::new();
        let span = tracker.add_source("t.ctl".into(), text);
        if let Ok(Some(expr)) = parse_expression(&mut tracker, span) {
            let mut spans = Vec::new();
            every_span(&expr, &mut spans);
            for s in spans {
                prop_assert!(s.start >= span.start && s.end <= span.end);
            }
        }
    }

    #[test]
    fn precedence_is_well_formed(text in arithmetic_expr()) {
        let mut tracker = Tracker::new();
        let span = tracker.add_source("t.ctl".into(), text);
        if let Ok(Some(expr)) = parse_expression(&mut tracker, span) {
            assert_precedence_well_formed(&expr);
        }
    }

    #[test]
    fn evaluating_twice_is_pure(text in arithmetic_expr()) {
        let mut tracker = Tracker::new();
        let span = tracker.add_source("t.ctl".into(), text);
        if let Ok(Some(expr)) = parse_expression(&mut tracker, span) {
            let mut engine = Engine::new();
            preamble::install(&mut engine);
            if let Ok(first) = engine.evaluate(&tracker, &expr) {
                let second = engine.evaluate(&tracker, &expr).unwrap();
                prop_assert_eq!(first, second);
            }
        }
    }

    /// Every codepoint the scanner accepts (`< 0x200000`, surrogates
    /// excluded) round-trips through its canonical UTF-8 encoding via a
    /// fixed-width `\U` (8 hex digit) escape, evaluated as a one-character
    /// string.
    #[test]
    fn unicode_escape_round_trips(codepoint in (0u32..0x110000).prop_filter("no surrogates", |c| !(0xD800..=0xDFFF).contains(c))) {
        let c = char::from_u32(codepoint).unwrap();
        let text = format!("\"\\U{codepoint:08x}\"");
        let mut tracker = Tracker::new();
        let span = tracker.add_source("t.ctl".into(), text);
        let expr = parse_expression(&mut tracker, span).unwrap().unwrap();
        let mut engine = Engine::new();
        preamble::install(&mut engine);
        match engine.evaluate(&tracker, &expr).unwrap() {
            ctl::value::Value::String(s) => prop_assert_eq!(s, c.to_string()),
            other => prop_assert!(false, "expected a string, got {other:?}"),
        }
    }
}

#[test]
fn string_decoding_is_a_noop_without_escapes() {
    let mut tracker = Tracker::new();
    let span = tracker.add_source("t.ctl".into(), "\"hello world\"".to_string());
    let expr = parse_expression(&mut tracker, span).unwrap().unwrap();
    match expr {
        Expr::StringLiteral { span } => assert_eq!(tracker.text(span), "hello world"),
        other => panic!("expected a string literal, got {other:?}"),
    }
}
