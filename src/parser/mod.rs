//! Pratt-style precedence-climbing parser, operating directly on source
//! text rather than a separate token stream — mirroring the original's
//! `parser` class working on a `string_view`.
//!
//! The two mutually recursive routines (`parse_atom`/`parse_more`) and the
//! right-spine tree rewriting for precedence are ported from
//! `original_source/src/parse.cpp`; the operator-precedence comparison uses
//! `operator::higher_precedence` (the associativity-aware table from
//! `operator.cpp`) rather than `parse.cpp`'s own simpler, associativity-blind
//! `get_precedence` helper, per the redesign direction in spec.md §9 and
//! `DESIGN.md`.

mod lexer;
mod matcher;

use crate::ast::Expr;
use crate::error::{bail_parse_error, ParseError};
use crate::operator::{higher_precedence, Operator, Order};
use crate::source_tracker::{Span, Tracker};
use matcher::Matcher;

pub struct Parser<'t> {
    tracker: &'t mut Tracker,
    pos: usize,
    end_pos: usize,
}

impl<'t> Parser<'t> {
    pub fn new(tracker: &'t mut Tracker, span: Span) -> Self {
        Parser { tracker, pos: span.start, end_pos: span.end }
    }

    fn parse_expr(&mut self, end: &Matcher) -> Result<Option<Expr>, ParseError> {
        let atom = self.parse_atom(end)?;
        let Some(mut expr) = atom else {
            return Ok(None);
        };
        while self.parse_more(&mut expr, end)? {}
        Ok(Some(expr))
    }

    fn parse_atom(&mut self, end: &Matcher) -> Result<Option<Expr>, ParseError> {
        if matcher::parse_end(self, end, false)?.is_some() {
            return Ok(None);
        }
        let c = self.peek().expect("parse_end(false) found no match, so input remains");

        #[cfg(feature = "show_tokens")]
        colour::green_ln!("token: {:?} at byte {}", c, self.pos);

        match c {
            '(' => {
                let open_start = self.pos;
                self.pos += 1;
                let opener_span = Span::new(open_start, self.pos);
                let close = Matcher::matching_bracket(")", opener_span);
                let inner = self.parse_expr(&close)?;
                let Some(mut inner) = inner else {
                    bail_parse_error!(
                        Span::new(open_start, self.pos + 1),
                        "missing expression between `(' and `)'"
                    );
                };
                if let Expr::Operator { parenthesized, .. } = &mut inner {
                    *parenthesized = true;
                }
                Ok(Some(inner))
            }

            '!' | '~' | '-' | '+' => {
                let op_start = self.pos;
                let op = match c {
                    '!' => Operator::LogicalNot,
                    '~' => Operator::Complement,
                    '-' => Operator::UnaryMinus,
                    '+' => Operator::UnaryPlus,
                    _ => unreachable!(),
                };
                self.pos += 1;
                let op_span = Span::new(op_start, self.pos);
                let sub = self.parse_atom(end)?;
                let Some(sub) = sub else {
                    bail_parse_error!(
                        Span::new(op_start, self.pos + 1),
                        "missing expression after unary `{}' operator",
                        op.as_str()
                    );
                };
                Ok(Some(Expr::Operator { op, op_span, lhs: None, rhs: Box::new(sub), parenthesized: false }))
            }

            c if Self::is_identifier_start(c) => {
                let name = self.parse_identifier().expect("checked is_identifier_start");
                Ok(Some(Expr::Identifier { name }))
            }

            '{' => {
                let open_start = self.pos;
                self.pos += 1;
                let opener_span = Span::new(open_start, self.pos);
                let close = Matcher::matching_bracket("}", opener_span);
                Ok(Some(self.parse_object(opener_span, &close)?))
            }

            '[' => {
                let open_start = self.pos;
                self.pos += 1;
                let opener_span = Span::new(open_start, self.pos);
                let close = Matcher::matching_bracket("]", opener_span);
                Ok(Some(self.parse_list(opener_span, &close)?))
            }

            '"' | '\'' => Ok(Some(self.parse_string_literal()?)),

            c if c.is_ascii_digit() || (c == '.' && self.second_char_is_digit()) => {
                Ok(Some(self.parse_number()?))
            }

            '\\' => bail_parse_error!(Span::new(self.pos, self.pos + 1), "lambdas are not yet implemented"),

            _ => bail_parse_error!(Span::new(self.pos, self.pos), "expected expression"),
        }
    }

    fn second_char_is_digit(&self) -> bool {
        self.remaining().chars().nth(1).is_some_and(|c| c.is_ascii_digit())
    }

    fn is_binary_operator_start(c: char) -> bool {
        matches!(
            c,
            '+' | '-' | '*' | '/' | '%' | '=' | '!' | '>' | '<' | '^' | '&' | '|' | '[' | '(' | '.' | '~'
        )
    }

    fn classify_binary_operator(&self, c: char, op_start: usize) -> Result<(Operator, usize), ParseError> {
        let here = Span::new(op_start, op_start + 1);
        Ok(match c {
            '+' => (Operator::Plus, 1),
            '-' => (Operator::Minus, 1),
            '*' => {
                if self.starts_with("**") {
                    (Operator::Power, 2)
                } else {
                    (Operator::Times, 1)
                }
            }
            '/' => (Operator::Divide, 1),
            '%' => (Operator::Modulo, 1),
            '=' => {
                if self.starts_with("==") {
                    (Operator::Equal, 2)
                } else {
                    return Err(ParseError::new(
                        here,
                        "assignment (`=') cannot be used in expressions (did you mean `=='?)",
                    ));
                }
            }
            '!' => {
                if self.starts_with("!=") {
                    (Operator::Inequal, 2)
                } else {
                    return Err(ParseError::new(here, "`!' can only be used as unary operator"));
                }
            }
            '>' => {
                if self.starts_with(">>") {
                    (Operator::RightShift, 2)
                } else if self.starts_with(">=") {
                    (Operator::GreaterOrEqual, 2)
                } else {
                    (Operator::Greater, 1)
                }
            }
            '<' => {
                if self.starts_with("<<") {
                    (Operator::LeftShift, 2)
                } else if self.starts_with("<=") {
                    (Operator::LessOrEqual, 2)
                } else {
                    (Operator::Less, 1)
                }
            }
            '^' => (Operator::BitXor, 1),
            '&' => {
                if self.starts_with("&&") {
                    (Operator::LogicalAnd, 2)
                } else {
                    (Operator::BitAnd, 1)
                }
            }
            '|' => {
                if self.starts_with("||") {
                    (Operator::LogicalOr, 2)
                } else {
                    (Operator::BitOr, 1)
                }
            }
            '[' => (Operator::Index, 1),
            '(' => (Operator::Call, 1),
            '.' => (Operator::Dot, 1),
            '~' => return Err(ParseError::new(here, "`~' can only be used as unary operator")),
            _ => unreachable!("caller checked is_binary_operator_start"),
        })
    }

    /// Consumes one binary operator and its right-hand side, rewriting
    /// `expr` in place to respect precedence. Returns `false` when `end`
    /// is reached instead.
    fn parse_more(&mut self, expr: &mut Expr, end: &Matcher) -> Result<bool, ParseError> {
        if matcher::parse_end(self, end, true)?.is_some() {
            return Ok(false);
        }
        let c = self.peek().expect("parse_end found no match, so input remains");
        if !Self::is_binary_operator_start(c) {
            bail_parse_error!(Span::new(self.pos, self.pos), "expected binary operator or {}", end.description());
        }

        let op_start = self.pos;
        let (op, op_len) = self.classify_binary_operator(c, op_start)?;
        self.pos = op_start + op_len;
        let op_span = Span::new(op_start, self.pos);

        let rhs = match op {
            Operator::Index | Operator::Call => {
                let closer: &'static str = if op == Operator::Index { "]" } else { ")" };
                let close_matcher = Matcher::matching_bracket(closer, op_span);
                self.parse_list(op_span, &close_matcher)?
            }
            Operator::Dot => match self.parse_identifier() {
                Some(name) => Expr::Identifier { name },
                None => bail_parse_error!(Span::new(op_start, self.pos + 1), "expected identifier after `.'"),
            },
            _ => match self.parse_atom(end)? {
                Some(atom) => atom,
                None => bail_parse_error!(
                    Span::new(op_start, self.pos + 1),
                    "missing expression after `{}' operator",
                    op.as_str()
                ),
            },
        };

        let slot = find_splice_slot(expr, op, op_span)?;
        let existing = std::mem::replace(slot, Expr::IntLiteral { value: 0, span: Span::default() });
        *slot = Expr::Operator { op, op_span, lhs: Some(Box::new(existing)), rhs: Box::new(rhs), parenthesized: false };
        Ok(true)
    }

    fn parse_list(&mut self, open_span: Span, end: &Matcher) -> Result<Expr, ParseError> {
        let mut items = Vec::new();
        loop {
            let item_start = self.pos;
            if matcher::parse_end(self, end, true)?.is_some() {
                break;
            }
            let comma_or_end = Matcher::specific(",").or_before(end.clone());
            let value = self.parse_expr(&comma_or_end)?;
            let Some(value) = value else {
                bail_parse_error!(Span::new(item_start, self.pos + 1), "missing expression");
            };
            items.push(value);
        }
        Ok(Expr::List { span: Span::new(open_span.start, self.pos), items })
    }

    fn parse_object(&mut self, open_span: Span, end: &Matcher) -> Result<Expr, ParseError> {
        let mut keys = Vec::new();
        let mut values = Vec::new();
        loop {
            if matcher::parse_end(self, end, true)?.is_some() {
                break;
            }
            let name = self.parse_identifier();
            let Some(name) = name else {
                bail_parse_error!(Span::new(self.pos, self.pos), "expected identifier or {}", end.description());
            };
            let eq_span = Matcher::specific("=").parse(self, true)?;
            let element_end = Matcher::object_element().or_before(end.clone());
            let value = self.parse_expr(&element_end)?;
            let Some(value) = value else {
                bail_parse_error!(Span::new(eq_span.start, self.pos + 1), "missing expression after `='");
            };
            keys.push(Expr::StringLiteral { span: name });
            values.push(value);
        }
        Ok(Expr::Object { span: Span::new(open_span.start, self.pos), keys, values })
    }
}

/// Walks the right spine of `root`, descending past unparenthesized
/// operator nodes the new operator binds tighter than (or ties with, for a
/// right-associative class), and returns the slot the new node should be
/// spliced into. Raises a non-associative-conflict error if a tie falls in
/// a non-associative class (comparisons, equality).
fn find_splice_slot<'e>(root: &'e mut Expr, new_op: Operator, new_op_span: Span) -> Result<&'e mut Expr, ParseError> {
    let mut slot = root;
    loop {
        let (child_op, child_op_span, parenthesized) = match &*slot {
            Expr::Operator { op, op_span, parenthesized, .. } => (*op, *op_span, *parenthesized),
            _ => return Ok(slot),
        };
        if parenthesized {
            return Ok(slot);
        }
        match higher_precedence(child_op, new_op) {
            Order::Right => match slot {
                Expr::Operator { rhs, .. } => slot = &mut **rhs,
                _ => unreachable!(),
            },
            Order::Left => return Ok(slot),
            Order::Unordered => {
                return Err(ParseError::new(
                    child_op_span,
                    format!("operator `{}' is non-associative", child_op.as_str()),
                )
                .with_note(new_op_span, format!("conflicts with this `{}'", new_op.as_str())));
            }
        }
    }
}

/// Parses a single top-level expression out of `span`, consuming it
/// entirely (trailing non-whitespace content is an error). Returns `Ok(None)`
/// for an empty (whitespace/comments-only) input.
pub fn parse_expression(tracker: &mut Tracker, span: Span) -> Result<Option<Expr>, ParseError> {
    let mut parser = Parser::new(tracker, span);
    let end = Matcher::end_of_file();
    let result = parser.parse_expr(&end)?;

    #[cfg(feature = "show_ast")]
    if let Some(expr) = &result {
        colour::blue_ln!("ast: {}", expr.display(parser.tracker));
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source_tracker::Tracker;

    fn parse(text: &str) -> (Tracker, Expr) {
        let mut tracker = Tracker::new();
        let span = tracker.add_source("t.ctl".into(), text.to_string());
        let expr = parse_expression(&mut tracker, span).unwrap().unwrap();
        (tracker, expr)
    }

    #[test]
    fn precedence_climbs_correctly() {
        let (tracker, expr) = parse("1 + 2 * 3");
        assert_eq!(format!("{}", expr.display(&tracker)), "(plus 1 (times 2 3))");
    }

    #[test]
    fn parentheses_override_precedence() {
        let (tracker, expr) = parse("(1 + 2) * 3");
        assert_eq!(format!("{}", expr.display(&tracker)), "(times (plus 1 2) 3)");
        match &expr {
            Expr::Operator { lhs: Some(lhs), .. } => {
                assert!(matches!(**lhs, Expr::Operator { parenthesized: true, .. }));
            }
            other => panic!("expected operator, got {other:?}"),
        }
    }

    #[test]
    fn power_is_right_associative_in_the_tree() {
        let (tracker, expr) = parse("2 ** 3 ** 4");
        assert_eq!(format!("{}", expr.display(&tracker)), "(power 2 (power 3 4))");
    }

    #[test]
    fn colon_is_not_a_binary_operator() {
        let mut tracker = Tracker::new();
        let span = tracker.add_source("t.ctl".into(), "1 : 2".to_string());
        let err = parse_expression(&mut tracker, span).unwrap_err();
        assert!(err.message.contains("expected binary operator"));
    }

    #[test]
    fn chained_comparisons_are_rejected() {
        let mut tracker = Tracker::new();
        let span = tracker.add_source("t.ctl".into(), "1 < 2 < 3".to_string());
        let err = parse_expression(&mut tracker, span).unwrap_err();
        assert!(err.message.contains("non-associative"));
        assert_eq!(err.notes.len(), 1);
    }

    #[test]
    fn object_literal_parses_keys_and_values() {
        let (_tracker, expr) = parse("{ a = 1, b = 2 }");
        match expr {
            Expr::Object { keys, values, .. } => {
                assert_eq!(keys.len(), 2);
                assert_eq!(values.len(), 2);
            }
            other => panic!("expected object, got {other:?}"),
        }
    }

    #[test]
    fn unmatched_open_paren_at_eof_errors_with_note() {
        let mut tracker = Tracker::new();
        let span = tracker.add_source("t.ctl".into(), "(1 + 2".to_string());
        let err = parse_expression(&mut tracker, span).unwrap_err();
        assert_eq!(err.notes.len(), 1);
    }

    #[test]
    fn list_literal_parses() {
        let (_tracker, expr) = parse("[1, 2, 3]");
        match expr {
            Expr::List { items, .. } => assert_eq!(items.len(), 3),
            other => panic!("expected list, got {other:?}"),
        }
    }

    #[test]
    fn unary_minus_binds_tighter_than_times() {
        let (tracker, expr) = parse("-2 * 3");
        assert_eq!(format!("{}", expr.display(&tracker)), "(times (unary_minus 2) 3)");
    }
}
