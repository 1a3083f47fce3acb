//! The ffmetadata text format.
//!
//! ffmpeg exports tags as one `key=value` directive per line, preceded by a
//! `;FFMETADATA1` header. On export it escapes `=`, `;`, `#`, `\` and
//! newline with a backslash; an escaped newline shows up as a line ending
//! in a lone backslash followed by a continuation line.
//!
//! ```text
//! ;FFMETADATA1
//! title=Test
//! comment=first line\
//! second line
//! [CHAPTER]
//! TIMEBASE=1/1000
//! ```
//!
//! [`Decoder`] consumes this format one line at a time so parsing can start
//! while ffmpeg is still writing. [`escape`] produces tokens for the
//! `-metadata key=value` arguments of the write path. ffmpeg stores those
//! tokens verbatim, so `escape` only touches what would otherwise change
//! how the directive is split: `=`, newline and a leading `;`.

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::error::{Error, Result};
use crate::metadata::Metadata;

/// Escape a key or value for a `-metadata` directive.
///
/// Backslash-prefixes `=`, newline and a leading `;`. Everything else,
/// including `#`, inner `;` and `\`, passes through untouched.
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for (i, c) in raw.chars().enumerate() {
        if c == '=' || c == '\n' || (i == 0 && c == ';') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Remove backslash escapes as ffmpeg writes them on export.
///
/// A dangling backslash at the end decodes to a newline. This reverses
/// [`escape`] for any input without a literal backslash.
pub fn unescape(escaped: &str) -> String {
    unescape_line(escaped).0
}

/// Unescape one line, reporting whether it ended in the escaped-newline marker.
fn unescape_line(line: &str) -> (String, bool) {
    let mut out = String::with_capacity(line.len());
    let mut chars = line.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some(next) => out.push(next),
            None => {
                out.push('\n');
                return (out, true);
            }
        }
    }
    (out, false)
}

/// Byte offset of the first `=` not preceded by an escaping backslash.
fn find_separator(line: &str) -> Option<usize> {
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '=' => return Some(i),
            _ => {}
        }
    }
    None
}

/// Headers that open per-chapter and per-stream sections.
const SECTION_HEADERS: [&str; 2] = ["[CHAPTER]", "[STREAM]"];

fn is_section_header(line: &str) -> bool {
    SECTION_HEADERS.contains(&line.trim_end())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    /// File-level tags
    Global,
    /// `[CHAPTER]`, `[STREAM]` and friends
    Nested,
}

/// Incremental ffmetadata decoder.
///
/// Feed lines with [`push_line`](Self::push_line) and call
/// [`finish`](Self::finish) once the input is exhausted. The decoder keeps
/// only the current key and the record built so far.
#[derive(Debug)]
pub struct Decoder {
    meta: Metadata,
    current: Option<String>,
    section: Section,
    /// Previous line ended in an escaped newline
    continues: bool,
    line: usize,
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder {
    pub fn new() -> Self {
        Self {
            meta: Metadata::new(),
            current: None,
            section: Section::Global,
            continues: false,
            line: 0,
        }
    }

    /// Number of lines consumed so far.
    pub fn lines_read(&self) -> usize {
        self.line
    }

    /// Consume one line, without its line terminator.
    pub fn push_line(&mut self, line: &str) -> Result<()> {
        self.line += 1;
        let line = line.strip_suffix('\r').unwrap_or(line);

        if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
            self.continues = false;
            return Ok(());
        }

        if !self.continues && is_section_header(line) {
            tracing::trace!(line = self.line, "entering section {}", line.trim_end());
            self.section = Section::Nested;
            self.current = None;
            return Ok(());
        }

        if self.section == Section::Nested {
            self.continues = unescape_line(line).1;
            return Ok(());
        }

        match find_separator(line) {
            Some(idx) => {
                let key = unescape(&line[..idx]);
                let (value, continues) = unescape_line(&line[idx + 1..]);
                self.continues = continues;
                self.meta.insert(key.clone(), value);
                self.current = Some(key);
            }
            None => {
                let Some(key) = self.current.as_deref() else {
                    return Err(Error::decode(
                        self.line,
                        "continuation line before any key",
                    ));
                };
                let (tail, continues) = unescape_line(line);
                self.continues = continues;
                if let Some(value) = self.meta.get_mut(key) {
                    value.push_str(&tail);
                }
            }
        }

        Ok(())
    }

    /// Hand over the decoded record.
    pub fn finish(self) -> Metadata {
        self.meta
    }
}

/// Decode a complete ffmetadata document held in memory.
pub fn decode_str(input: &str) -> Result<Metadata> {
    let mut decoder = Decoder::new();
    for line in input.split('\n') {
        decoder.push_line(line)?;
    }
    Ok(decoder.finish())
}

/// Decode ffmetadata as it arrives from an async reader.
///
/// Returns only after the reader reports end of input. Invalid UTF-8 is
/// replaced rather than rejected.
pub async fn decode_reader<R>(mut reader: R) -> Result<Metadata>
where
    R: AsyncBufRead + Unpin,
{
    let mut decoder = Decoder::new();
    let mut buf = Vec::new();

    loop {
        buf.clear();
        let n = reader.read_until(b'\n', &mut buf).await?;
        if n == 0 {
            break;
        }
        let bytes = buf.strip_suffix(b"\n").unwrap_or(&buf);
        decoder.push_line(&String::from_utf8_lossy(bytes))?;
    }

    tracing::debug!(lines = decoder.lines_read(), "ffmetadata stream drained");
    Ok(decoder.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_simple() {
        let meta = decode_str(";FFMETADATA1\ntitle=Test\nartist=Someone\n").unwrap();
        assert_eq!(meta.title(), Some("Test"));
        assert_eq!(meta.artist(), Some("Someone"));
        assert_eq!(meta.len(), 2);
    }

    #[test]
    fn test_blank_and_comment_lines_skipped() {
        let meta = decode_str("\n; comment\n# also comment\n\nalbum=A\n\n").unwrap();
        assert_eq!(meta.album(), Some("A"));
        assert_eq!(meta.len(), 1);
    }

    #[test]
    fn test_value_keeps_later_equals() {
        let meta = decode_str("comment=a=b=c\n").unwrap();
        assert_eq!(meta.get("comment"), Some("a=b=c"));
    }

    #[test]
    fn test_empty_value() {
        let meta = decode_str("label=\n").unwrap();
        assert_eq!(meta.label(), Some(""));
    }

    #[test]
    fn test_last_write_wins() {
        let meta = decode_str("title=One\ntitle=Two\n").unwrap();
        assert_eq!(meta.title(), Some("Two"));
    }

    #[test]
    fn test_continuation_appends_with_newline() {
        let meta = decode_str("comment=first line\\\nsecond line\ntitle=T\n").unwrap();
        assert_eq!(meta.get("comment"), Some("first line\nsecond line"));
        assert_eq!(meta.title(), Some("T"));
    }

    #[test]
    fn test_multiple_continuations() {
        let meta = decode_str("lyrics=a\\\nb\\\nc\n").unwrap();
        assert_eq!(meta.get("lyrics"), Some("a\nb\nc"));
    }

    #[test]
    fn test_continuation_before_key_is_error() {
        let err = decode_str(";FFMETADATA1\norphan\n").unwrap_err();
        match err {
            Error::Decode { line, .. } => assert_eq!(line, 2),
            other => panic!("expected decode error, got {:?}", other),
        }
    }

    #[test]
    fn test_escaped_characters_in_key_and_value() {
        let meta = decode_str("we\\=ird=semi\\;colon \\#hash \\\\slash\n").unwrap();
        assert_eq!(meta.get("we=ird"), Some("semi;colon #hash \\slash"));
    }

    #[test]
    fn test_crlf_tolerated() {
        let meta = decode_str("title=Test\r\nartist=X\r\n").unwrap();
        assert_eq!(meta.title(), Some("Test"));
        assert_eq!(meta.artist(), Some("X"));
    }

    #[test]
    fn test_chapter_sections_skipped() {
        let input = "\
;FFMETADATA1
title=Album Version
[CHAPTER]
TIMEBASE=1/1000
START=0
END=1000
title=Intro
[STREAM]
title=Video
";
        let meta = decode_str(input).unwrap();
        assert_eq!(meta.title(), Some("Album Version"));
        assert_eq!(meta.len(), 1);
    }

    #[test]
    fn test_bracketed_tag_is_not_a_section() {
        let meta = decode_str(";FFMETADATA1\n[mix=remix]\ntitle=T\n").unwrap();
        assert_eq!(meta.get("[mix"), Some("remix]"));
        assert_eq!(meta.title(), Some("T"));

        let meta = decode_str("[intro]=yes\n[CHAPTER]\ntitle=Intro\n").unwrap();
        assert_eq!(meta.get("[intro]"), Some("yes"));
        assert_eq!(meta.title(), None);
    }

    #[test]
    fn test_bracket_line_inside_continuation_is_value() {
        let meta = decode_str("comment=see\\\n[below]\n").unwrap();
        assert_eq!(meta.get("comment"), Some("see\n[below]"));
    }

    #[test]
    fn test_escape_minimum_set() {
        assert_eq!(escape("a=b"), "a\\=b");
        assert_eq!(escape(";lead"), "\\;lead");
        assert_eq!(escape("two\nlines"), "two\\\nlines");
        assert_eq!(escape("plain"), "plain");
    }

    #[test]
    fn test_escape_leaves_ordinary_punctuation() {
        assert_eq!(escape("A; B"), "A; B");
        assert_eq!(escape("Track #1"), "Track #1");
        assert_eq!(escape("C:\\Music"), "C:\\Music");
        assert_eq!(escape("x;y"), "x;y");
    }

    #[test]
    fn test_unescape_reverses_escape() {
        let raw = ";x=1;#\ny";
        assert_eq!(unescape(&escape(raw)), raw);
    }

    #[test]
    fn test_decode_export_escaping() {
        let meta = decode_str("artist=A\\; B\ntitle=Track \\#1\npath=C:\\\\Music\n").unwrap();
        assert_eq!(meta.artist(), Some("A; B"));
        assert_eq!(meta.title(), Some("Track #1"));
        assert_eq!(meta.get("path"), Some("C:\\Music"));
    }

    #[tokio::test]
    async fn test_decode_reader_streams_lines() {
        let input: &[u8] = b";FFMETADATA1\ntitle=Test\ncomment=a\\\nb";
        let meta = decode_reader(input).await.unwrap();
        assert_eq!(meta.title(), Some("Test"));
        assert_eq!(meta.get("comment"), Some("a\nb"));
    }

    #[tokio::test]
    async fn test_decode_reader_lossy_utf8() {
        let input: &[u8] = b"title=caf\xe9\n";
        let meta = decode_reader(input).await.unwrap();
        assert_eq!(meta.title(), Some("caf\u{FFFD}"));
    }
}
