//! Character-level scanning: whitespace/comments, identifiers, numeric and
//! string literals.
//!
//! The control flow (peek-by-character cursor) follows the teacher's
//! `Peekable<Chars>`-based `TokenStream`
//! (`compiler/parsers/tokenizer/tokens.rs`); the actual escape-sequence and
//! numeric-literal rules are ported from
//! `original_source/src/parse.cpp` (strings) and spec text (numbers — the
//! retrieved original sources didn't include a number scanner).

use super::Parser;
use crate::ast::Expr;
use crate::error::{bail_parse_error, ParseError};
use crate::source_tracker::Span;

impl<'t> Parser<'t> {
    pub(super) fn at_end(&self) -> bool {
        self.pos >= self.end_pos
    }

    pub(super) fn remaining(&self) -> &str {
        self.tracker.text(Span::new(self.pos, self.end_pos))
    }

    pub(super) fn peek(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    pub(super) fn starts_with(&self, s: &str) -> bool {
        self.remaining().starts_with(s)
    }

    /// Skip whitespace and `#`-comments. `skip_newlines` false stops at the
    /// first unconsumed `\n`, for newline-sensitive contexts (object/list
    /// element separators).
    pub(super) fn skip_whitespace(&mut self, skip_newlines: bool) {
        loop {
            while let Some(c) = self.peek() {
                if !c.is_whitespace() {
                    break;
                }
                if !skip_newlines && c == '\n' {
                    return;
                }
                self.pos += c.len_utf8();
            }
            if self.peek() == Some('#') {
                while let Some(c) = self.peek() {
                    if c == '\n' {
                        break;
                    }
                    self.pos += c.len_utf8();
                }
            } else {
                return;
            }
        }
    }

    pub(super) fn is_identifier_start(c: char) -> bool {
        c.is_alphabetic() || c == '_'
    }

    fn is_identifier_continue(c: char) -> bool {
        c.is_alphanumeric() || c == '_'
    }

    /// Consume an identifier at the current position; returns its span, or
    /// `None` (consuming nothing) if the current position isn't one.
    pub(super) fn parse_identifier(&mut self) -> Option<Span> {
        let start = self.pos;
        if !self.peek().is_some_and(Self::is_identifier_start) {
            return None;
        }
        self.pos += self.peek().unwrap().len_utf8();
        while let Some(c) = self.peek() {
            if !Self::is_identifier_continue(c) {
                break;
            }
            self.pos += c.len_utf8();
        }
        Some(Span::new(start, self.pos))
    }

    fn consume_digits(&mut self, radix: u32) -> usize {
        let mut count = 0;
        while let Some(c) = self.peek() {
            if !c.is_digit(radix) {
                break;
            }
            self.pos += c.len_utf8();
            count += 1;
        }
        count
    }

    /// Parses a numeric literal. Must be called with the cursor at a digit,
    /// or at `.` immediately followed by a digit.
    pub(super) fn parse_number(&mut self) -> Result<Expr, ParseError> {
        let start = self.pos;

        let (radix, prefix_len): (u32, usize) = if self.starts_with("0x") || self.starts_with("0X") {
            (16, 2)
        } else if self.starts_with("0o") || self.starts_with("0O") {
            (8, 2)
        } else {
            (10, 0)
        };
        self.pos += prefix_len;
        let digits_start = self.pos;
        self.consume_digits(radix);

        let mut is_double = false;
        if self.peek() == Some('.') {
            is_double = true;
            self.pos += 1;
            self.consume_digits(radix);
        }

        let (exp_lower, exp_upper) = if radix == 16 { ('p', 'P') } else { ('e', 'E') };
        if matches!(self.peek(), Some(c) if c == exp_lower || c == exp_upper) {
            is_double = true;
            self.pos += 1;
            if matches!(self.peek(), Some('+') | Some('-')) {
                self.pos += 1;
            }
            let exponent_start = self.pos;
            self.consume_digits(10);
            if self.pos == exponent_start {
                bail_parse_error!(Span::new(self.pos, self.pos), "missing exponent digits");
            }
        }

        let end = self.pos;
        let text = self.tracker.text(Span::new(start, end)).to_string();
        let digits = self.tracker.text(Span::new(digits_start, end)).to_string();

        if radix == 8 && is_double {
            bail_parse_error!(
                Span::new(start, end),
                "octal literal `{text}' cannot have a fractional part or exponent"
            );
        }

        if is_double {
            let value = parse_float(&digits, radix, start, end)?;
            Ok(Expr::DoubleLiteral { value, span: Span::new(start, end) })
        } else {
            let digits = self.tracker.text(Span::new(digits_start, end));
            let magnitude = u64::from_str_radix(digits, radix)
                .map_err(|_| ParseError::new(Span::new(start, end), format!("integer literal `{text}' overflows")))?;
            if magnitude > i64::MAX as u64 {
                bail_parse_error!(Span::new(start, end), "integer literal `{text}' overflows i64");
            }
            Ok(Expr::IntLiteral { value: magnitude as i64, span: Span::new(start, end) })
        }
    }

    /// Parses a `"`- or `'`-delimited string literal, decoding escapes per
    /// spec. Must be called with the cursor at the opening quote.
    pub(super) fn parse_string_literal(&mut self) -> Result<Expr, ParseError> {
        let literal_start = self.pos;
        let quote = self.peek().expect("caller checked for a quote");
        self.pos += quote.len_utf8();

        let mut builder = self.tracker.builder();
        let mut plain_start = self.pos;

        loop {
            let plain_end = {
                let remaining = self.tracker.text(Span::new(self.pos, self.end_pos));
                let mut len = 0;
                for c in remaining.chars() {
                    if c == quote || c == '\\' {
                        break;
                    }
                    len += c.len_utf8();
                }
                self.pos + len
            };
            self.pos = plain_end;

            if self.pos != plain_start {
                let run = self.tracker.text(Span::new(plain_start, self.pos)).to_string();
                builder.append(&run, Span::new(plain_start, self.pos));
            }

            match self.peek() {
                None => {
                    return Err(ParseError::new(Span::new(literal_start, self.pos), "unterminated string literal"));
                }
                Some(c) if c == quote => {
                    self.pos += quote.len_utf8();
                    break;
                }
                _ => {
                    self.decode_escape(&mut builder)?;
                    plain_start = self.pos;
                }
            }
        }

        let span = if builder.is_empty() {
            Span::new(literal_start + quote.len_utf8(), self.pos - quote.len_utf8())
        } else {
            builder.build(self.tracker)
        };
        Ok(Expr::StringLiteral { span })
    }

    fn decode_escape(&mut self, builder: &mut crate::source_tracker::StringBuilder) -> Result<(), ParseError> {
        let escape_start = self.pos;
        debug_assert_eq!(self.peek(), Some('\\'));
        self.pos += 1;

        let Some(kind) = self.peek() else {
            return Err(ParseError::new(Span::new(escape_start, self.pos), "incomplete escape sequence"));
        };

        match kind {
            '\\' | '"' | 't' | 'n' | 'r' | 'b' | 'a' | 'e' | 'f' | 'v' => {
                let replacement = match kind {
                    '\\' => "\\",
                    '"' => "\"",
                    't' => "\t",
                    'n' => "\n",
                    'r' => "\r",
                    'b' => "\u{0008}",
                    'a' => "\u{0007}",
                    'e' => "\u{001B}",
                    'f' => "\u{000C}",
                    'v' => "\u{000B}",
                    _ => unreachable!(),
                };
                self.pos += kind.len_utf8();
                builder.append(replacement, Span::new(escape_start, self.pos));
                Ok(())
            }
            '\n' => {
                self.pos += 1;
                Ok(())
            }
            'x' => {
                self.pos += 1;
                let a = self.parse_hex_digit()?;
                let b = self.parse_hex_digit()?;
                let byte = (a << 4 | b) as u8;
                builder.append_byte(byte, Span::new(escape_start, self.pos));
                Ok(())
            }
            'u' | 'U' => {
                let n_digits = if kind == 'u' { 4 } else { 8 };
                self.pos += 1;
                let mut codepoint: u32 = 0;
                for _ in 0..n_digits {
                    codepoint = (codepoint << 4) | self.parse_hex_digit()?;
                }
                let escape_span = Span::new(escape_start, self.pos);
                if (0xD800..=0xDFFF).contains(&codepoint) || codepoint >= 0x200000 {
                    return Err(ParseError::new(escape_span, "invalid unicode codepoint"));
                }
                let mut buf = [0u8; 4];
                let n = encode_utf8(codepoint, &mut buf);
                let text = std::str::from_utf8(&buf[..n]).expect("encode_utf8 always produces valid UTF-8");
                builder.append(text, escape_span);
                Ok(())
            }
            '0'..='7' => {
                let mut value: u32 = 0;
                let mut n_digits = 0;
                while n_digits < 3 {
                    match self.peek() {
                        Some(c @ '0'..='7') => {
                            value = (value << 3) | (c as u32 - '0' as u32);
                            self.pos += 1;
                            n_digits += 1;
                        }
                        _ => break,
                    }
                }
                let escape_span = Span::new(escape_start, self.pos);
                if value > 255 {
                    return Err(ParseError::new(escape_span, "octal escape sequence out of range"));
                }
                builder.append_byte(value as u8, escape_span);
                Ok(())
            }
            _ => {
                let end = self.pos + kind.len_utf8();
                Err(ParseError::new(Span::new(escape_start, end), "invalid escape sequence"))
            }
        }
    }

    fn parse_hex_digit(&mut self) -> Result<u32, ParseError> {
        match self.peek().and_then(|c| c.to_digit(16)) {
            Some(v) => {
                self.pos += 1;
                Ok(v)
            }
            None => Err(ParseError::new(
                Span::new(self.pos, self.pos),
                "expected hexadecimal digit (0-9, a-f, A-F)",
            )),
        }
    }
}

/// Encodes `codepoint` as 1-4 UTF-8 bytes, supporting the wider
/// pre-RFC3629 range (`< 0x200000`) the original scanner accepts — beyond
/// `char`'s own `<= 0x10FFFF` ceiling, so this can't go through
/// `char::encode_utf8`. `codepoint` must already be known valid (not a
/// surrogate, `< 0x200000`) by the caller.
fn encode_utf8(codepoint: u32, buffer: &mut [u8; 4]) -> usize {
    if codepoint < 0x80 {
        buffer[0] = codepoint as u8;
        1
    } else if codepoint < 0x800 {
        buffer[0] = 0xC0 | (codepoint >> 6) as u8;
        buffer[1] = 0x80 | (codepoint & 0x3F) as u8;
        2
    } else if codepoint < 0x10000 {
        buffer[0] = 0xE0 | (codepoint >> 12) as u8;
        buffer[1] = 0x80 | ((codepoint >> 6) & 0x3F) as u8;
        buffer[2] = 0x80 | (codepoint & 0x3F) as u8;
        3
    } else {
        buffer[0] = 0xF0 | (codepoint >> 18) as u8;
        buffer[1] = 0x80 | ((codepoint >> 12) & 0x3F) as u8;
        buffer[2] = 0x80 | ((codepoint >> 6) & 0x3F) as u8;
        buffer[3] = 0x80 | (codepoint & 0x3F) as u8;
        4
    }
}

fn parse_float(digits_and_rest: &str, radix: u32, start: usize, end: usize) -> Result<f64, ParseError> {
    if radix == 16 {
        parse_hex_float(digits_and_rest).ok_or_else(|| {
            ParseError::new(Span::new(start, end), "invalid hexadecimal floating-point literal")
        })
    } else {
        digits_and_rest
            .parse::<f64>()
            .map_err(|_| ParseError::new(Span::new(start, end), "invalid floating-point literal"))
    }
}

fn parse_hex_float(text: &str) -> Option<f64> {
    let (mantissa, exponent_text) = match text.find(['p', 'P']) {
        Some(idx) => (&text[..idx], Some(&text[idx + 1..])),
        None => (text, None),
    };
    let (int_part, frac_part) = match mantissa.find('.') {
        Some(idx) => (&mantissa[..idx], Some(&mantissa[idx + 1..])),
        None => (mantissa, None),
    };

    let mut value = 0.0f64;
    for c in int_part.chars() {
        value = value * 16.0 + c.to_digit(16)? as f64;
    }
    if let Some(frac) = frac_part {
        let mut scale = 1.0 / 16.0;
        for c in frac.chars() {
            value += c.to_digit(16)? as f64 * scale;
            scale /= 16.0;
        }
    }
    let exponent: i32 = match exponent_text {
        Some(e) => e.parse().ok()?,
        None => 0,
    };
    Some(value * 2f64.powi(exponent))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source_tracker::Tracker;

    fn parse_one_number(text: &str) -> Expr {
        let mut tracker = Tracker::new();
        let span = tracker.add_source("t.ctl".into(), text.to_string());
        let mut parser = Parser::new(&mut tracker, span);
        parser.parse_number().unwrap()
    }

    #[test]
    fn decimal_integer() {
        assert_eq!(parse_one_number("42"), Expr::IntLiteral { value: 42, span: Span::new(0, 2) });
    }

    #[test]
    fn hex_integer() {
        assert_eq!(parse_one_number("0xFF"), Expr::IntLiteral { value: 255, span: Span::new(0, 4) });
    }

    #[test]
    fn octal_integer() {
        assert_eq!(parse_one_number("0o17"), Expr::IntLiteral { value: 15, span: Span::new(0, 4) });
    }

    #[test]
    fn decimal_double_with_exponent() {
        match parse_one_number("1.5e2") {
            Expr::DoubleLiteral { value, .. } => assert_eq!(value, 150.0),
            other => panic!("expected double, got {other:?}"),
        }
    }

    #[test]
    fn hex_float_with_binary_exponent() {
        match parse_one_number("0x1.8p3") {
            Expr::DoubleLiteral { value, .. } => assert_eq!(value, 12.0),
            other => panic!("expected double, got {other:?}"),
        }
    }

    #[test]
    fn i64_max_parses_and_overflow_rejects() {
        let mut tracker = Tracker::new();
        let span = tracker.add_source("t.ctl".into(), i64::MAX.to_string());
        let mut parser = Parser::new(&mut tracker, span);
        assert_eq!(parser.parse_number().unwrap(), Expr::IntLiteral { value: i64::MAX, span });

        let mut tracker = Tracker::new();
        let too_big = (i64::MAX as u64 + 1).to_string();
        let span = tracker.add_source("t.ctl".into(), too_big);
        let mut parser = Parser::new(&mut tracker, span);
        assert!(parser.parse_number().is_err());
    }

    #[test]
    fn octal_with_fraction_rejects() {
        let mut tracker = Tracker::new();
        let span = tracker.add_source("t.ctl".into(), "0o1.5".to_string());
        let mut parser = Parser::new(&mut tracker, span);
        assert!(parser.parse_number().is_err());
    }

    fn parse_one_string(text: &str) -> String {
        let mut tracker = Tracker::new();
        let span = tracker.add_source("t.ctl".into(), text.to_string());
        let mut parser = Parser::new(&mut tracker, span);
        match parser.parse_string_literal().unwrap() {
            Expr::StringLiteral { span } => tracker.text(span).to_string(),
            other => panic!("expected string literal, got {other:?}"),
        }
    }

    /// Like `parse_one_string`, but returns raw bytes — for escapes that
    /// can decode to a byte sequence that isn't valid UTF-8 on its own.
    fn parse_one_string_bytes(text: &str) -> Vec<u8> {
        let mut tracker = Tracker::new();
        let span = tracker.add_source("t.ctl".into(), text.to_string());
        let mut parser = Parser::new(&mut tracker, span);
        match parser.parse_string_literal().unwrap() {
            Expr::StringLiteral { span } => tracker.bytes(span).to_vec(),
            other => panic!("expected string literal, got {other:?}"),
        }
    }

    #[test]
    fn escape_free_string_is_zero_copy_substring() {
        assert_eq!(parse_one_string("\"hello\""), "hello");
    }

    #[test]
    fn unicode_escape_decodes() {
        assert_eq!(parse_one_string("\"\\u0041\""), "A");
    }

    #[test]
    fn hex_byte_escape_decodes() {
        // `\xff` names exactly the one raw byte 0xFF, not its Latin-1
        // scalar value re-encoded to UTF-8 (which would be two bytes).
        assert_eq!(parse_one_string_bytes("\"\\xff\""), vec![0xFFu8]);
    }

    #[test]
    fn nul_escape_decodes() {
        assert_eq!(parse_one_string("\"\\0\""), "\u{0}");
    }

    #[test]
    fn octal_escape_out_of_range_rejects() {
        let mut tracker = Tracker::new();
        let span = tracker.add_source("t.ctl".into(), "\"\\777\"".to_string());
        let mut parser = Parser::new(&mut tracker, span);
        assert!(parser.parse_string_literal().is_err());
    }

    #[test]
    fn unterminated_string_rejects() {
        let mut tracker = Tracker::new();
        let span = tracker.add_source("t.ctl".into(), "\"abc".to_string());
        let mut parser = Parser::new(&mut tracker, span);
        assert!(parser.parse_string_literal().is_err());
    }
}
