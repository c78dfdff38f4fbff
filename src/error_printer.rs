//! Formats a structured error as a source line with carets underneath,
//! grounded on `original_source/src/print_error.cpp`: tabs expand to the
//! next multiple of 8 columns (in lockstep between the source line and the
//! caret line so they stay aligned), trailing blank columns on the caret
//! line are trimmed, and a span that starts exactly at end-of-file prints
//! `<end of file>` instead of an empty line.

use crate::error::{EvaluateError, Note, ParseError};
use crate::source_tracker::{Span, Tracker};

const TAB_WIDTH: usize = 8;

/// An error with a primary message/span and zero or more secondary notes —
/// the shape both [`ParseError`] and [`EvaluateError`] share.
pub trait Diagnostic {
    fn message(&self) -> &str;
    fn span(&self) -> Span;
    fn notes(&self) -> &[Note];
}

impl Diagnostic for ParseError {
    fn message(&self) -> &str {
        &self.message
    }
    fn span(&self) -> Span {
        self.span
    }
    fn notes(&self) -> &[Note] {
        &self.notes
    }
}

impl Diagnostic for EvaluateError {
    fn message(&self) -> &str {
        &self.message
    }
    fn span(&self) -> Span {
        self.span
    }
    fn notes(&self) -> &[Note] {
        &self.notes
    }
}

/// Prints an error's message and every note, each with its own source-line
/// excerpt, to stderr.
pub fn print_error(error: &impl Diagnostic, tracker: &Tracker, color: bool) {
    print_message(error.message(), tracker, error.span(), true, color);
    for note in error.notes() {
        print_message(&note.message, tracker, note.span, false, color);
    }
}

/// Prints one `(message, where_span)` pair: the location prefix, the
/// message (with an `error: ` tag when `is_error`), and — when the span's
/// column could be resolved — the offending source line with carets under
/// the span.
pub fn print_message(message: &str, tracker: &Tracker, where_span: Span, is_error: bool, color: bool) {
    let start = tracker.get(where_span.start);
    let loc = &start.location;

    eprint!("{}:{}:{}: ", loc.file.display(), loc.line, loc.column);
    if is_error {
        if color {
            colour::e_red!("error: ");
        } else {
            eprint!("error: ");
        }
    }
    eprintln!("{message}");

    if loc.column == 0 {
        return;
    }

    let source_start = start.original_source.start;
    let source_end = start.original_source.end;
    let source_text = tracker.text(start.original_source);
    let line_start = where_span.start - (loc.column - 1);

    let mut rendered_line = String::new();
    let mut pointer_line = String::new();
    let mut pos = line_start;
    while pos < source_end && source_text.as_bytes()[pos - source_start] != b'\n' {
        let rel = pos - source_start;
        let c = source_text[rel..].chars().next().expect("valid utf-8 boundary");
        let marked = pos >= where_span.start && pos < where_span.end;
        pointer_line.push(if marked { '^' } else { ' ' });
        if c == '\t' {
            rendered_line.push(' ');
            while pointer_line.len() % TAB_WIDTH != 0 {
                let fill = pointer_line.as_bytes()[pointer_line.len() - 1] as char;
                pointer_line.push(fill);
                rendered_line.push(' ');
            }
        } else {
            rendered_line.push(c);
        }
        pos += c.len_utf8();
    }
    while pointer_line.ends_with(' ') {
        pointer_line.pop();
    }

    if line_start == source_end {
        if color {
            colour::e_blue!("<end of file>");
            eprintln!();
        } else {
            eprintln!("<end of file>");
        }
    } else {
        eprintln!("{rendered_line}");
    }

    if color {
        colour::e_green_ln!("{pointer_line}");
    } else {
        eprintln!("{pointer_line}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source_tracker::Tracker;

    #[test]
    fn resolves_a_location_without_panicking() {
        let mut tracker = Tracker::new();
        tracker.add_source("t.ctl".into(), "1 + \n".to_string());
        let err = ParseError::new(Span::new(4, 5), "unexpected token");
        print_error(&err, &tracker, false);
    }

    #[test]
    fn end_of_file_span_does_not_panic() {
        let mut tracker = Tracker::new();
        let span = tracker.add_source("t.ctl".into(), "1 +".to_string());
        let err = ParseError::new(Span::empty_at(span.end), "expected expression");
        print_error(&err, &tracker, false);
    }

    #[test]
    fn tab_indented_line_does_not_panic() {
        let mut tracker = Tracker::new();
        let span = tracker.add_source("t.ctl".into(), "\t1 + foo".to_string());
        let err = EvaluateError::new(Span::new(span.start + 6, span.start + 9), "could not resolve identifier: foo");
        print_error(&err, &tracker, false);
    }
}
