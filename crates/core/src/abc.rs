//! Lightweight scanner for ABC notation.
//!
//! Only the subset needed for scoring exercises is recognised: notes, rests,
//! chords, bar lines, grace groups and quoted annotations. Everything else is
//! skipped. Scanning never fails; malformed constructs are dropped up to the
//! end of their line.

use std::sync::LazyLock;

use regex::Regex;

/// Matches an information field line such as `T:Title` or `K:C`.
static FIELD_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([A-Za-z]):(.*)$").expect("valid regex"));

/// Field letter that terminates the tune header.
const KEY_FIELD: &str = "K";

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

/// Accidental written in front of a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accidental {
    None,
    Sharp,
    DoubleSharp,
    Flat,
    DoubleFlat,
    Natural,
}

/// A single note head.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Note {
    /// Upper-case pitch letter `A`..`G`.
    pub pitch: char,
    pub accidental: Accidental,
    /// 0 for the `C`..`B` octave, +1 for lower-case letters, adjusted by
    /// `'` and `,` marks.
    pub octave: i8,
}

/// A scanned element of the tune body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    Note(Note),
    /// Note inside a `{...}` grace group.
    GraceNote(Note),
    Rest,
    /// Text of a `"..."` annotation or chord symbol, without the quotes.
    Annotation(&'a str),
    ChordStart,
    ChordEnd,
    Bar,
}

// ---------------------------------------------------------------------------
// Header
// ---------------------------------------------------------------------------

/// Strip a trailing `%` comment from a line.
fn strip_comment(line: &str) -> &str {
    match line.find('%') {
        Some(idx) => &line[..idx],
        None => line,
    }
}

/// Parse a field line into `(letter, value)`.
fn field_line(line: &str) -> Option<(&str, &str)> {
    let caps = FIELD_LINE_RE.captures(line)?;
    let letter = caps.get(1)?.as_str();
    let value = caps.get(2)?.as_str().trim();
    Some((letter, value))
}

/// Split a tune into header lines and body lines.
///
/// The header runs up to and including the first `K:` line. A tune without a
/// `K:` line is treated as all body.
pub fn split_header(abc: &str) -> (Vec<&str>, Vec<&str>) {
    let lines: Vec<&str> = abc.lines().map(strip_comment).collect();
    let key_line = lines
        .iter()
        .position(|l| matches!(field_line(l), Some((KEY_FIELD, _))));

    match key_line {
        Some(idx) => {
            let (head, body) = lines.split_at(idx + 1);
            (head.to_vec(), body.to_vec())
        }
        None => (Vec::new(), lines),
    }
}

/// Return the value of the first header field with the given letter.
///
/// ```
/// use harmolyze_core::abc::header_field;
/// assert_eq!(header_field("X:1\nT:Menuett\nK:G\nG2", 'T'), Some("Menuett"));
/// ```
pub fn header_field(abc: &str, letter: char) -> Option<&str> {
    let (header, _) = split_header(abc);
    header.into_iter().find_map(|line| match field_line(line) {
        Some((l, value)) if l.starts_with(letter) => Some(value),
        _ => None,
    })
}

// ---------------------------------------------------------------------------
// Body scanning
// ---------------------------------------------------------------------------

/// Scan the body of a tune into tokens.
pub fn tokenize(abc: &str) -> Vec<Token<'_>> {
    let (_, body) = split_header(abc);
    let mut tokens = Vec::new();
    for line in body {
        if field_line(line).is_some() {
            continue;
        }
        scan_line(line, &mut tokens);
    }
    tokens
}

/// Position of the next `delim` at or after `from`, if any.
fn find_from(bytes: &[u8], from: usize, delim: u8) -> Option<usize> {
    bytes[from..]
        .iter()
        .position(|&b| b == delim)
        .map(|off| from + off)
}

fn scan_line<'a>(line: &'a str, out: &mut Vec<Token<'a>>) {
    let bytes = line.as_bytes();
    let mut i = 0;
    let mut in_grace = false;

    while i < bytes.len() {
        match bytes[i] {
            b'"' => {
                let Some(end) = find_from(bytes, i + 1, b'"') else {
                    return;
                };
                out.push(Token::Annotation(&line[i + 1..end]));
                i = end + 1;
            }
            delim @ (b'!' | b'+') => {
                let Some(end) = find_from(bytes, i + 1, delim) else {
                    return;
                };
                i = end + 1;
            }
            b'[' => {
                let is_inline_field = bytes.get(i + 1).is_some_and(u8::is_ascii_alphabetic)
                    && bytes.get(i + 2) == Some(&b':');
                if is_inline_field {
                    let Some(end) = find_from(bytes, i + 1, b']') else {
                        return;
                    };
                    i = end + 1;
                } else if bytes.get(i + 1) == Some(&b'|') {
                    out.push(Token::Bar);
                    i += 2;
                } else {
                    out.push(Token::ChordStart);
                    i += 1;
                }
            }
            b']' => {
                out.push(Token::ChordEnd);
                i += 1;
            }
            b'|' => {
                out.push(Token::Bar);
                while i < bytes.len() && bytes[i] == b'|' {
                    i += 1;
                }
            }
            b'{' => {
                in_grace = true;
                i += 1;
            }
            b'}' => {
                in_grace = false;
                i += 1;
            }
            b'z' | b'Z' | b'x' | b'X' => {
                out.push(Token::Rest);
                i += 1;
            }
            b'^' | b'_' | b'=' | b'A'..=b'G' | b'a'..=b'g' => {
                let (note, next) = scan_note(bytes, i);
                if let Some(note) = note {
                    out.push(if in_grace {
                        Token::GraceNote(note)
                    } else {
                        Token::Note(note)
                    });
                }
                i = next;
            }
            _ => i += 1,
        }
    }
}

/// Scan a note starting at `start`. Returns the note (if a pitch letter
/// followed the accidentals) and the index after it.
fn scan_note(bytes: &[u8], start: usize) -> (Option<Note>, usize) {
    let mut i = start;
    let mut sharps = 0u8;
    let mut flats = 0u8;
    let mut natural = false;

    while i < bytes.len() {
        match bytes[i] {
            b'^' => sharps += 1,
            b'_' => flats += 1,
            b'=' => natural = true,
            _ => break,
        }
        i += 1;
    }

    let accidental = match (sharps, flats, natural) {
        (0, 0, false) => Accidental::None,
        (0, 0, true) => Accidental::Natural,
        (1, 0, _) => Accidental::Sharp,
        (s, 0, _) if s >= 2 => Accidental::DoubleSharp,
        (0, 1, _) => Accidental::Flat,
        (0, _, _) => Accidental::DoubleFlat,
        _ => Accidental::None,
    };

    let Some(&letter) = bytes.get(i) else {
        return (None, i);
    };
    let mut octave: i8 = match letter {
        b'A'..=b'G' => 0,
        b'a'..=b'g' => 1,
        _ => return (None, i),
    };
    i += 1;

    while i < bytes.len() {
        match bytes[i] {
            b'\'' => octave = octave.saturating_add(1),
            b',' => octave = octave.saturating_sub(1),
            _ => break,
        }
        i += 1;
    }

    let note = Note {
        pitch: letter.to_ascii_uppercase() as char,
        accidental,
        octave,
    };
    (Some(note), i)
}
