//! The parsed expression tree.
//!
//! The original implementation has a small class hierarchy
//! (`expression -> {identifier_expression, operator_expression,
//! literal_expression -> {string_literal_expression, ...}, object_literal_expression,
//! list_literal_expression}`) walked via `dynamic_pointer_cast`. This crate
//! collapses that into one flat tagged `enum`, matched exhaustively instead
//! of downcast, per the redesign guidance.

use crate::operator::Operator;
use crate::source_tracker::Span;
use std::fmt;

/// A parsed expression node. Immutable once built; the parser is the only
/// producer and the evaluator the only consumer.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// A bare name, resolved against the evaluator's context stack.
    Identifier { name: Span },
    IntLiteral { value: i64, span: Span },
    DoubleLiteral { value: f64, span: Span },
    /// `span` covers the already-decoded bytes — either a zero-copy slice
    /// of the source (no escapes) or a buffer built by the tracker's
    /// `StringBuilder` (escapes present), per `source_tracker`.
    StringLiteral { span: Span },
    /// A unary operator has `lhs: None`; a binary operator has `lhs: Some`.
    /// `parenthesized` is true iff this node was the immediate result of a
    /// `(...)` grouping, which the parser consults to avoid rewriting
    /// across explicit grouping during precedence climbing.
    Operator {
        op: Operator,
        op_span: Span,
        lhs: Option<Box<Expr>>,
        rhs: Box<Expr>,
        parenthesized: bool,
    },
    List { span: Span, items: Vec<Expr> },
    /// `keys` and `values` are parallel and always the same length; each
    /// key is itself a `StringLiteral` node (enforced by the parser, since
    /// source syntax only allows bare identifiers as keys).
    Object {
        span: Span,
        keys: Vec<Expr>,
        values: Vec<Expr>,
    },
}

impl Expr {
    /// A span that locates this node in the source, for diagnostics. Not
    /// necessarily the full extent of the subtree — just one span the
    /// node is guaranteed to carry, per the span-containment invariant.
    pub fn span(&self) -> Span {
        match self {
            Expr::Identifier { name } => *name,
            Expr::IntLiteral { span, .. }
            | Expr::DoubleLiteral { span, .. }
            | Expr::StringLiteral { span }
            | Expr::List { span, .. }
            | Expr::Object { span, .. } => *span,
            Expr::Operator { op_span, .. } => *op_span,
        }
    }

    pub fn is_unparenthesized_operator(&self) -> bool {
        matches!(self, Expr::Operator { parenthesized: false, .. })
    }
}

/// Lisp-style pretty printer, e.g. `(plus 1 (times 2 3))`, matching the
/// original's `operator<<(ostream&, expression const&)`.
pub struct Display<'a, 'b> {
    expr: &'a Expr,
    tracker: &'b crate::source_tracker::Tracker,
}

impl Expr {
    pub fn display<'a, 'b>(&'a self, tracker: &'b crate::source_tracker::Tracker) -> Display<'a, 'b> {
        Display { expr: self, tracker }
    }
}

impl fmt::Display for Display<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn write_node(expr: &Expr, tracker: &crate::source_tracker::Tracker, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match expr {
                Expr::Identifier { name } => write!(f, "(ref {})", tracker.text(*name)),
                Expr::IntLiteral { value, .. } => write!(f, "{value}"),
                Expr::DoubleLiteral { value, .. } => write!(f, "{value}"),
                Expr::StringLiteral { span } => write!(f, "{:?}", String::from_utf8_lossy(tracker.bytes(*span))),
                Expr::Operator { op, lhs: None, rhs, .. } => {
                    f.write_str("(")?;
                    f.write_str(op.lisp_name())?;
                    f.write_str(" ")?;
                    write_node(rhs, tracker, f)?;
                    f.write_str(")")
                }
                Expr::Operator { op, lhs: Some(lhs), rhs, .. } => {
                    f.write_str("(")?;
                    f.write_str(op.lisp_name())?;
                    f.write_str(" ")?;
                    write_node(lhs, tracker, f)?;
                    f.write_str(" ")?;
                    write_node(rhs, tracker, f)?;
                    f.write_str(")")
                }
                Expr::List { items, .. } => {
                    f.write_str("(list")?;
                    for item in items {
                        f.write_str(" ")?;
                        write_node(item, tracker, f)?;
                    }
                    f.write_str(")")
                }
                Expr::Object { keys, values, .. } => {
                    f.write_str("(object")?;
                    for (k, v) in keys.iter().zip(values.iter()) {
                        f.write_str(" ")?;
                        write_node(k, tracker, f)?;
                        f.write_str("=")?;
                        write_node(v, tracker, f)?;
                    }
                    f.write_str(")")
                }
            }
        }
        write_node(self.expr, self.tracker, f)
    }
}
