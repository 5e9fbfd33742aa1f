//! Notation parser for track parts.
//!
//! A part is a three-letter uppercase instrument id followed by note tokens:
//!
//! ```text
//! GTRA44B44C#516X12
//! ^^^                 instrument id
//!    ^^^              A, octave 4, duration code 4
//!          ^^^^^      C#, octave 5, duration code 16
//!               ^^^   rest, octave 1, duration code 2
//! ```
//!
//! Each token is a pitch letter `A`-`G` or the rest marker `X`, an optional
//! `#`, one octave digit `1`-`8`, then one or two duration digits `1`-`9`
//! (greedy). Anything between tokens that does not form a token is skipped
//! silently; scanning is lenient on purpose so decorated or hand-edited
//! parts still play.

use crate::error::{Result, TuneError};
use crate::types::note::{NoteEvent, PitchClass};

/// Length of the instrument id header
pub const HEADER_LEN: usize = 3;

/// Result of parsing one track part
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPart {
    pub instrument_id: String,
    /// Tokens in left-to-right order
    pub tokens: Vec<NoteEvent>,
}

/// Check that `id` is a valid instrument id: exactly three uppercase ASCII letters
pub fn is_instrument_id(id: &str) -> bool {
    id.len() == HEADER_LEN && id.bytes().all(|b| b.is_ascii_uppercase())
}

/// Parse a raw part into its instrument id and note tokens.
///
/// Fails with `MalformedNotation` only when the header is missing or not
/// three uppercase letters. Unmatched text after the header is never an
/// error.
pub fn parse(raw: &str) -> Result<ParsedPart> {
    let header = raw
        .as_bytes()
        .get(..HEADER_LEN)
        .filter(|bytes| bytes.iter().all(|b| b.is_ascii_uppercase()))
        .ok_or_else(|| TuneError::MalformedNotation {
            notation: raw.to_string(),
        })?;

    // The header is ASCII, so HEADER_LEN is a char boundary
    let instrument_id = String::from_utf8_lossy(header).into_owned();
    let tokens = scan_tokens(&raw[HEADER_LEN..]);

    Ok(ParsedPart {
        instrument_id,
        tokens,
    })
}

/// Scan a notation body (everything after the header) for note tokens.
///
/// Pure: every call starts from the beginning of `body` and returns the
/// complete token list.
pub fn scan_tokens(body: &str) -> Vec<NoteEvent> {
    let bytes = body.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        match match_token(bytes, pos) {
            Some((token, next)) => {
                tokens.push(token);
                pos = next;
            }
            // Lenient: skip one byte and try again
            None => pos += 1,
        }
    }

    tokens
}

/// Try to match a single token starting at `start`.
/// Returns the token and the index just past it.
fn match_token(bytes: &[u8], start: usize) -> Option<(NoteEvent, usize)> {
    let pitch_class = PitchClass::from_char(*bytes.get(start)? as char)?;
    let mut pos = start + 1;

    let sharp = bytes.get(pos) == Some(&b'#');
    if sharp {
        pos += 1;
    }

    let octave = digit_in(bytes.get(pos).copied(), b'1'..=b'8')?;
    pos += 1;

    let first = digit_in(bytes.get(pos).copied(), b'1'..=b'9')?;
    pos += 1;

    let duration_code = match digit_in(bytes.get(pos).copied(), b'1'..=b'9') {
        Some(second) => {
            pos += 1;
            first * 10 + second
        }
        None => first,
    };

    Some((
        NoteEvent::new(pitch_class, sharp, octave, duration_code),
        pos,
    ))
}

fn digit_in(byte: Option<u8>, range: std::ops::RangeInclusive<u8>) -> Option<u8> {
    byte.filter(|b| range.contains(b)).map(|b| b - b'0')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_instrument_header() {
        let part = parse("GTRA44B44").unwrap();
        assert_eq!(part.instrument_id, "GTR");
        assert_eq!(
            part.tokens,
            vec![
                NoteEvent::new(PitchClass::A, false, 4, 4),
                NoteEvent::new(PitchClass::B, false, 4, 4),
            ]
        );
    }

    #[test]
    fn test_header_only() {
        let part = parse("BAS").unwrap();
        assert_eq!(part.instrument_id, "BAS");
        assert!(part.tokens.is_empty());
    }

    #[test]
    fn test_malformed_headers() {
        for raw in ["", "GT", "gtrA44", "G1RA44", "GT#A44", "ÄBCA44"] {
            assert_eq!(
                parse(raw),
                Err(TuneError::MalformedNotation {
                    notation: raw.to_string()
                }),
                "expected {:?} to be rejected",
                raw
            );
        }
    }

    #[test]
    fn test_sharp_and_two_digit_duration() {
        let tokens = scan_tokens("D#216C#899");
        assert_eq!(
            tokens,
            vec![
                NoteEvent::new(PitchClass::D, true, 2, 16),
                NoteEvent::new(PitchClass::C, true, 8, 99),
            ]
        );
    }

    #[test]
    fn test_duration_is_greedy_up_to_two_digits() {
        // "A4123" reads as A, octave 4, duration 12, then a dangling "3"
        let tokens = scan_tokens("A4123");
        assert_eq!(tokens, vec![NoteEvent::new(PitchClass::A, false, 4, 12)]);
    }

    #[test]
    fn test_rest_tokens() {
        let tokens = scan_tokens("X14X#22");
        assert_eq!(tokens.len(), 2);
        assert!(tokens.iter().all(NoteEvent::is_rest));
        assert_eq!(tokens[1].duration_code, 2);
    }

    #[test]
    fn test_zero_digits_never_form_tokens() {
        // Octave 0 and 9 are out of range; a duration cannot start with 0
        assert!(scan_tokens("A04B94C40").is_empty());
        // A trailing zero ends the duration at one digit
        assert_eq!(
            scan_tokens("C420"),
            vec![NoteEvent::new(PitchClass::C, false, 4, 2)]
        );
    }

    #[test]
    fn test_header_letters_are_not_scanned() {
        // The trailing 'A' of the header must not combine with "44"
        let part = parse("GTA44B44").unwrap();
        assert_eq!(part.instrument_id, "GTA");
        assert_eq!(
            part.tokens,
            vec![NoteEvent::new(PitchClass::B, false, 4, 4)]
        );
    }

    #[test]
    fn test_scanning_is_repeatable() {
        let first = parse("LEDC44E44G48").unwrap();
        let second = parse("LEDC44E44G48").unwrap();
        assert_eq!(first, second);
        assert_eq!(first.tokens.len(), 3);
    }
}
