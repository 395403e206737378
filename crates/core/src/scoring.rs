//! Point value of an exercise.
//!
//! Every sounding note is worth [`POINTS_PER_NOTE`], every non-empty
//! annotation (the harmonic analysis label a student has to supply) is worth
//! [`POINTS_PER_ANNOTATION`]. Rests, bar lines, grace notes and header fields
//! are worth nothing.

use crate::abc::{tokenize, Token};

/// Points awarded per note head (chord members count individually).
pub const POINTS_PER_NOTE: u32 = 1;

/// Points awarded per non-empty annotation.
pub const POINTS_PER_ANNOTATION: u32 = 2;

/// Compute the point value of an ABC-notation exercise.
///
/// Pure and deterministic; malformed input scores whatever could be scanned.
pub fn calculate_points(abc: &str) -> u32 {
    tokenize(abc)
        .iter()
        .map(|token| match token {
            Token::Note(_) => POINTS_PER_NOTE,
            Token::Annotation(text) if !text.trim().is_empty() => POINTS_PER_ANNOTATION,
            _ => 0,
        })
        .fold(0u32, u32::saturating_add)
}
