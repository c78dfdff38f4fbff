//! Owns the concatenation of all loaded source text and maps a byte
//! position back to `(file, line, column)`.
//!
//! This is the "external" tracker collaborator from the language spec: the
//! parser and evaluator only ever see [`Span`]s (half-open byte ranges into
//! the tracker's address space) and ask the tracker to resolve them when
//! they need to report something to a human. Spans from different loaded
//! files and from decoded string literals share one flat offset space, so a
//! `Span` is meaningful on its own without also carrying a reference to the
//! tracker that produced it.

use rustc_hash::FxHashMap;
use std::fs;
use std::io;
use std::ops::Range;
use std::path::{Path, PathBuf};

/// A half-open byte range into a [`Tracker`]'s address space.
///
/// Spans do not own text; they borrow meaning from whichever `Tracker`
/// produced them and are only valid for as long as that tracker lives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end);
        Span { start, end }
    }

    /// An empty span at a single position, used for "expected X" errors
    /// that don't have an offending token to point at.
    pub fn empty_at(pos: usize) -> Self {
        Span { start: pos, end: pos }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// A span covering both `self` and `other`, regardless of their order.
    pub fn join(&self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

/// A resolved human-facing location: 1-based line and column.
/// `column` is `0` when it could not be determined (defensive; should not
/// happen for spans this crate produces itself).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Location {
    pub file: PathBuf,
    pub line: usize,
    pub column: usize,
}

/// What `Tracker::get` returns: the location of the pointer, plus the span
/// of the whole source buffer it was found in (used by the diagnostic
/// printer to grab the surrounding line of text).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedPosition {
    pub original_source: Span,
    pub original_char: usize,
    pub location: Location,
}

struct Entry {
    path: PathBuf,
    /// Raw bytes, not necessarily valid UTF-8: a decoded string-literal
    /// buffer can contain a standalone `\xHH`/octal byte escape in the
    /// 0x80-0xFF range with no continuation bytes around it.
    bytes: Vec<u8>,
    base: usize,
    /// Local (entry-relative) byte offset of the start of each line.
    line_starts: Vec<usize>,
}

fn line_starts(bytes: &[u8]) -> Vec<usize> {
    let mut starts = vec![0];
    for (i, &b) in bytes.iter().enumerate() {
        if b == b'\n' {
            starts.push(i + 1);
        }
    }
    starts
}

/// A span in a decoded string literal's buffer is attributed back to the
/// escape sequence (or literal run) in the original source it was built
/// from, so diagnostics about decoded content still point somewhere a user
/// can see.
struct Attribution {
    built: Span,
    original: Span,
}

/// Owns loaded source text and decoded string-literal buffers.
pub struct Tracker {
    entries: Vec<Entry>,
    next_base: usize,
    file_cache: FxHashMap<PathBuf, Span>,
    attributions: Vec<Attribution>,
}

impl Default for Tracker {
    fn default() -> Self {
        Self::new()
    }
}

impl Tracker {
    pub fn new() -> Self {
        Tracker {
            entries: Vec::new(),
            next_base: 0,
            file_cache: FxHashMap::default(),
            attributions: Vec::new(),
        }
    }

    /// Load a file's contents, appending them to the pool.
    ///
    /// Returns `None` if the file can't be read. Loading the same path
    /// twice returns the span from the first load without reading again.
    pub fn add_file(&mut self, path: impl AsRef<Path>) -> Option<Span> {
        let path = path.as_ref();
        if let Some(span) = self.file_cache.get(path) {
            return Some(*span);
        }
        let text = fs::read_to_string(path).ok()?;
        Some(self.add_source(path.to_path_buf(), text))
    }

    /// Like [`Tracker::add_file`] but surfaces the I/O error instead of
    /// collapsing it to `None`; used by the CLI so it can print a real
    /// message rather than a silent failure.
    pub fn add_file_checked(&mut self, path: impl AsRef<Path>) -> io::Result<Span> {
        let path = path.as_ref();
        if let Some(span) = self.file_cache.get(path) {
            return Ok(*span);
        }
        let text = fs::read_to_string(path)?;
        Ok(self.add_source(path.to_path_buf(), text))
    }

    /// Load source text that didn't come from a file (e.g. an in-memory
    /// expression or test fixture).
    pub fn add_source(&mut self, path: PathBuf, text: String) -> Span {
        self.add_bytes(path, text.into_bytes())
    }

    fn add_bytes(&mut self, path: PathBuf, bytes: Vec<u8>) -> Span {
        let base = self.next_base;
        let starts = line_starts(&bytes);
        let len = bytes.len();
        self.next_base += len;
        let span = Span::new(base, base + len);
        self.file_cache.insert(path.clone(), span);
        self.entries.push(Entry {
            path,
            bytes,
            base,
            line_starts: starts,
        });
        span
    }

    fn entry_index_for(&self, offset: usize) -> usize {
        // Index of the last entry whose base is <= offset.
        self.entries.partition_point(|e| e.base <= offset).saturating_sub(1)
    }

    /// The raw bytes a span covers. Unlike [`Tracker::text`], this never
    /// panics — a decoded string-literal buffer may hold a standalone byte
    /// escape that isn't valid UTF-8 on its own.
    pub fn bytes(&self, span: Span) -> &[u8] {
        let entry = &self.entries[self.entry_index_for(span.start)];
        &entry.bytes[span.start - entry.base..span.end - entry.base]
    }

    /// The source text a span covers.
    ///
    /// Panics if the span's bytes aren't valid UTF-8. Safe for any span
    /// that traces back to loaded source text (always valid UTF-8); a
    /// decoded string-literal buffer should go through [`Tracker::bytes`]
    /// and a fallible `String::from_utf8` instead.
    pub fn text(&self, span: Span) -> &str {
        std::str::from_utf8(self.bytes(span)).expect("span does not cover valid utf-8 text")
    }

    /// Resolve a byte pointer (an offset into this tracker's address space)
    /// back to a human-facing location. Pointers inside a decoded string
    /// literal buffer are redirected to the escape sequence they were
    /// decoded from.
    pub fn get(&self, pos: usize) -> ResolvedPosition {
        for attribution in &self.attributions {
            if pos >= attribution.built.start && pos < attribution.built.end {
                let offset_in_run = pos - attribution.built.start;
                let redirected = attribution.original.start
                    + offset_in_run.min(attribution.original.len().saturating_sub(1));
                return self.get(redirected);
            }
        }

        let idx = self.entry_index_for(pos);
        let entry = &self.entries[idx];
        let local = pos.saturating_sub(entry.base);
        let line_idx = entry
            .line_starts
            .partition_point(|&start| start <= local)
            .saturating_sub(1);
        let line_start = entry.line_starts[line_idx];
        let line_bytes = &entry.bytes[line_start..local.min(entry.bytes.len())];
        // Genuine source-file entries are always valid UTF-8 (`fs::read_to_string`);
        // a decoded-buffer entry is never reached here directly, since any position
        // inside one is redirected via `attributions` above before this point.
        let column = std::str::from_utf8(line_bytes).map_or(line_bytes.len(), |s| s.chars().count()) + 1;

        ResolvedPosition {
            original_source: Span::new(entry.base, entry.base + entry.bytes.len()),
            original_char: pos,
            location: Location {
                file: entry.path.clone(),
                line: line_idx + 1,
                column,
            },
        }
    }

    /// Start building a new decoded-string buffer. Unlike `add_file`/`get`,
    /// this doesn't need to borrow the tracker until `build` is called, so
    /// a caller can freely interleave reading source text (via this same
    /// tracker) with appending to the builder.
    pub fn builder(&self) -> StringBuilder {
        StringBuilder {
            buf: Vec::new(),
            attributions: Vec::new(),
        }
    }
}

/// Accumulates decoded string-literal bytes while recording, for each
/// appended run, the span of source it was decoded from. Holds no
/// reference to the `Tracker` that will eventually own it, so scanning
/// source text and appending decoded output can interleave freely.
pub struct StringBuilder {
    buf: Vec<u8>,
    attributions: Vec<(Range<usize>, Span)>,
}

impl StringBuilder {
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Append decoded text, attributing it to `attribution` (the escape
    /// sequence or literal run in the original source it came from).
    pub fn append(&mut self, text: &str, attribution: Span) {
        self.append_bytes(text.as_bytes(), attribution);
    }

    /// Append a single raw byte, attributing it the same way as `append`.
    /// Used for `\xHH` and octal byte escapes, which name one raw byte that
    /// may not be valid UTF-8 on its own (e.g. `\xff`), unlike every other
    /// escape form this scanner produces.
    pub fn append_byte(&mut self, byte: u8, attribution: Span) {
        self.append_bytes(&[byte], attribution);
    }

    fn append_bytes(&mut self, bytes: &[u8], attribution: Span) {
        let start = self.buf.len();
        self.buf.extend_from_slice(bytes);
        self.attributions.push((start..self.buf.len(), attribution));
    }

    /// Finish building, registering the buffer as a new loaded source entry
    /// and recording its attributions, and return the span covering it.
    pub fn build(self, tracker: &mut Tracker) -> Span {
        let StringBuilder { buf, attributions } = self;
        let span = tracker.add_bytes(PathBuf::from("<decoded string literal>"), buf);
        for (local, original) in attributions {
            tracker.attributions.push(Attribution {
                built: Span::new(span.start + local.start, span.start + local.end),
                original,
            });
        }
        span
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_source_returns_contiguous_spans() {
        let mut tracker = Tracker::new();
        let a = tracker.add_source("a.ctl".into(), "abc".to_string());
        let b = tracker.add_source("b.ctl".into(), "defg".to_string());
        assert_eq!(a, Span::new(0, 3));
        assert_eq!(b, Span::new(3, 7));
        assert_eq!(tracker.text(a), "abc");
        assert_eq!(tracker.text(b), "defg");
    }

    #[test]
    fn get_reports_line_and_column() {
        let mut tracker = Tracker::new();
        let span = tracker.add_source("f.ctl".into(), "ab\ncd\nef".to_string());
        let resolved = tracker.get(span.start + 4); // 'd' on the second line
        assert_eq!(resolved.location.line, 2);
        assert_eq!(resolved.location.column, 2);
    }

    #[test]
    fn loading_same_file_twice_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.ctl");
        std::fs::write(&path, "1 + 1").unwrap();

        let mut tracker = Tracker::new();
        let first = tracker.add_file(&path).unwrap();
        let second = tracker.add_file(&path).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn missing_file_returns_none() {
        let mut tracker = Tracker::new();
        assert!(tracker.add_file("/does/not/exist.ctl").is_none());
    }

    #[test]
    fn builder_can_hold_a_standalone_non_utf8_byte() {
        let mut tracker = Tracker::new();
        let src = tracker.add_source("s.ctl".into(), "\"\\xff\"".to_string());
        let escape_span = Span::new(src.start + 1, src.start + 5); // the `\xff`

        let mut builder = tracker.builder();
        builder.append_byte(0xFF, escape_span);
        let built = builder.build(&mut tracker);

        assert_eq!(tracker.bytes(built), &[0xFFu8]);
    }

    #[test]
    fn string_builder_attributes_back_to_escape_sequence() {
        let mut tracker = Tracker::new();
        let src = tracker.add_source("s.ctl".into(), "\"a\\tb\"".to_string());
        let escape_span = Span::new(src.start + 2, src.start + 4); // the `\t`

        let mut builder = tracker.builder();
        builder.append("\t", escape_span);
        let built = builder.build(&mut tracker);

        let resolved = tracker.get(built.start);
        assert_eq!(resolved.location.column, 3); // points at the `\`
    }
}
