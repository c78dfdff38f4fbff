//! A small statically-shaped configuration expression language: lex + parse
//! source text into an [`ast::Expr`], then walk it against an
//! [`evaluator::Engine`] to produce a [`value::Value`].
//!
//! Module layout follows the dependency chain leaves-first: `operator` and
//! `value` have no internal dependencies, `ast` depends on `operator`,
//! `parser` depends on all three plus `source_tracker`, and `evaluator`
//! depends on `ast`/`value`/`operator`. `source_tracker` and
//! `error_printer` are the "external" collaborators the core is handed
//! rather than owning itself.

pub mod ast;
pub mod error;
pub mod error_printer;
pub mod evaluator;
pub mod operator;
pub mod parser;
pub mod preamble;
pub mod source_tracker;
pub mod value;

use error::{EvaluateError, ParseError};
use source_tracker::{Span, Tracker};
use value::Value;

/// Either half of the two-stage pipeline can fail; a host application that
/// just wants "parse and evaluate this span" in one call needs a single
/// error type to propagate with `?` rather than matching on which stage
/// failed.
#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    Parse(ParseError),
    Evaluate(EvaluateError),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Parse(e) => e.fmt(f),
            Error::Evaluate(e) => e.fmt(f),
        }
    }
}

impl std::error::Error for Error {}

impl From<ParseError> for Error {
    fn from(e: ParseError) -> Self {
        Error::Parse(e)
    }
}

impl From<EvaluateError> for Error {
    fn from(e: EvaluateError) -> Self {
        Error::Evaluate(e)
    }
}

impl Error {
    /// The primary span to point a diagnostic printer at, regardless of
    /// which stage raised the error.
    pub fn span(&self) -> Span {
        match self {
            Error::Parse(e) => e.span,
            Error::Evaluate(e) => e.span,
        }
    }
}

/// Parses and evaluates the source text covered by `span`, against
/// `engine`'s operator tables and prelude. The convenience entry point for
/// a host that doesn't care to keep the intermediate AST around.
pub fn evaluate(tracker: &mut Tracker, span: Span, engine: &evaluator::Engine) -> Result<Value, Error> {
    let expr = parser::parse_expression(tracker, span)?;
    let expr = match expr {
        Some(expr) => expr,
        None => return Err(ParseError::new(span, "empty expression").into()),
    };
    Ok(engine.evaluate(tracker, &expr)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_evaluates_in_one_call() {
        let mut tracker = Tracker::new();
        let span = tracker.add_source("t.ctl".into(), "1 + 2 * 3".to_string());
        let mut engine = evaluator::Engine::new();
        preamble::install(&mut engine);
        assert_eq!(evaluate(&mut tracker, span, &engine).unwrap(), Value::Int64(7));
    }

    #[test]
    fn empty_input_is_a_parse_error_not_a_panic() {
        let mut tracker = Tracker::new();
        let span = tracker.add_source("t.ctl".into(), "   ".to_string());
        let engine = evaluator::Engine::new();
        let err = evaluate(&mut tracker, span, &engine).unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn evaluate_error_propagates_through_the_combined_error_type() {
        let mut tracker = Tracker::new();
        let span = tracker.add_source("t.ctl".into(), "undefined_name".to_string());
        let mut engine = evaluator::Engine::new();
        preamble::install(&mut engine);
        let err = evaluate(&mut tracker, span, &engine).unwrap_err();
        assert!(matches!(err, Error::Evaluate(_)));
    }
}
