//! Terminator strategies: what tells the parser "the current sub-production
//! is done".
//!
//! Grounded directly on `original_source/src/parse.cpp`'s `matcher` class.
//! The original composes matchers via a non-owning `or_before` pointer
//! (with a lifetime comment warning the caller to keep the alternative
//! alive); this crate owns the alternative in a `Box` instead, since
//! matchers here are always short-lived locals built right before use.

use super::Parser;
use crate::error::ParseError;
use crate::source_tracker::Span;

#[derive(Clone, Debug, PartialEq)]
enum MatchMode {
    EndOfFile,
    Specific,
    MatchingBracket { opener_span: Span },
    ObjectElement,
}

#[derive(Clone, Debug)]
pub struct Matcher {
    mode: MatchMode,
    expected: &'static str,
    or_before: Option<Box<Matcher>>,
}

impl Matcher {
    pub fn end_of_file() -> Self {
        Matcher { mode: MatchMode::EndOfFile, expected: "", or_before: None }
    }

    pub fn specific(expected: &'static str) -> Self {
        Matcher { mode: MatchMode::Specific, expected, or_before: None }
    }

    /// `expected` is the closing bracket text (e.g. `")"`); `opener_span`
    /// is where the matching opener sits in the source, cited as a note
    /// if this matcher fails to find its closer.
    pub fn matching_bracket(expected: &'static str, opener_span: Span) -> Self {
        Matcher { mode: MatchMode::MatchingBracket { opener_span }, expected, or_before: None }
    }

    pub fn object_element() -> Self {
        Matcher { mode: MatchMode::ObjectElement, expected: "", or_before: None }
    }

    /// Also succeed, without consuming, if `alt` would match next.
    pub fn or_before(mut self, alt: Matcher) -> Self {
        self.or_before = Some(Box::new(alt));
        self
    }

    pub fn description(&self) -> String {
        let mut desc = match &self.mode {
            MatchMode::EndOfFile => "end of file".to_string(),
            MatchMode::Specific | MatchMode::MatchingBracket { .. } => format!("`{}'", self.expected),
            MatchMode::ObjectElement => "newline or `,' or `;'".to_string(),
        };
        if let Some(alt) = &self.or_before {
            desc.push_str(" or ");
            desc.push_str(&alt.description());
        }
        desc
    }

    /// Try to match at the parser's current position without raising an
    /// error. A hit via `or_before` returns a zero-length span at the
    /// lookahead position rather than consuming anything.
    pub fn try_parse(&self, parser: &mut Parser, consume: bool, eat_whitespace: bool) -> Option<Span> {
        if eat_whitespace {
            let skip_newlines = !matches!(self.mode, MatchMode::ObjectElement);
            parser.skip_whitespace(skip_newlines);
        }

        let start = parser.pos;
        let primary = match &self.mode {
            MatchMode::EndOfFile => parser.at_end().then(|| Span::new(start, start)),
            MatchMode::Specific | MatchMode::MatchingBracket { .. } => {
                if parser.starts_with(self.expected) {
                    let end = start + self.expected.len();
                    if consume {
                        parser.pos = end;
                    }
                    Some(Span::new(start, end))
                } else {
                    None
                }
            }
            MatchMode::ObjectElement => match parser.peek() {
                Some(c @ (',' | ';' | '\n')) => {
                    let end = start + c.len_utf8();
                    if consume {
                        parser.pos = end;
                    }
                    Some(Span::new(start, end))
                }
                _ => None,
            },
        };

        if primary.is_some() {
            return primary;
        }
        if let Some(alt) = &self.or_before {
            if let Some(m) = alt.try_parse(parser, false, false) {
                return Some(Span::new(m.start, m.start));
            }
        }
        None
    }

    pub fn parse(&self, parser: &mut Parser, consume: bool) -> Result<Span, ParseError> {
        self.try_parse(parser, consume, true).ok_or_else(|| self.error(parser))
    }

    pub fn error(&self, parser: &Parser) -> ParseError {
        let pos = parser.pos;
        let mut err = ParseError::new(Span::new(pos, pos), format!("expected {}", self.description()));
        if let MatchMode::MatchingBracket { opener_span } = &self.mode {
            if self.or_before.is_none() {
                let opener_text = parser.tracker.text(*opener_span);
                err = err.with_note(*opener_span, format!("... to match this `{opener_text}'"));
            }
        }
        err
    }
}

/// Consult `end` at the current position: `Ok(Some(span))` if it matches,
/// `Ok(None)` if it doesn't but input remains, `Err` if it doesn't and
/// input is exhausted (so there is nothing left to try instead).
pub fn parse_end(parser: &mut Parser, end: &Matcher, consume: bool) -> Result<Option<Span>, ParseError> {
    match end.try_parse(parser, consume, true) {
        Some(span) => Ok(Some(span)),
        None if parser.at_end() => Err(end.error(parser)),
        None => Ok(None),
    }
}
