//! Pitch and duration codec — scientific pitch / duration names to and
//! from the notation engine's native tokens.
//!
//! `"C#4"` ⇄ `"c#/4"`, `"quarter"` ⇄ `"q"` (or `"4"` with numeric tokens).
//! Everything here is pure; invalid input yields `None` and the caller
//! picks the fallback.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::model::Duration;

static PITCH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-G])(#|b)?([0-9]+)$").expect("pitch pattern compiles"));

static TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([a-g])(#|b)?/([0-9]+)$").expect("token pattern compiles"));

/// Which spelling the engine uses for the quarter note.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DurationTokenStyle {
    /// `"q"`
    #[default]
    Letter,
    /// `"4"`
    Numeric,
}

/// True if `pitch` is scientific pitch notation: step, optional `#`/`b`, octave.
pub fn is_valid_pitch(pitch: &str) -> bool {
    PITCH_RE.is_match(pitch)
}

/// `"C#4"` → `"c#/4"`. `None` for anything that is not a scientific pitch
/// (chord symbols such as `"Am7"` included).
pub fn pitch_to_token(pitch: &str) -> Option<String> {
    let caps = PITCH_RE.captures(pitch)?;
    let step = caps[1].to_ascii_lowercase();
    let accidental = caps.get(2).map_or("", |m| m.as_str());
    Some(format!("{step}{accidental}/{}", &caps[3]))
}

/// `"c#/4"` → `"C#4"`. This is also the note name the audio synth expects.
pub fn token_to_pitch(token: &str) -> Option<String> {
    let caps = TOKEN_RE.captures(token)?;
    let step = caps[1].to_ascii_uppercase();
    let accidental = caps.get(2).map_or("", |m| m.as_str());
    Some(format!("{step}{accidental}{}", &caps[3]))
}

/// Engine token for a duration.
pub fn duration_token(duration: Duration, style: DurationTokenStyle) -> &'static str {
    match duration {
        Duration::Whole => "w",
        Duration::Half => "h",
        Duration::Quarter => match style {
            DurationTokenStyle::Letter => "q",
            DurationTokenStyle::Numeric => "4",
        },
        Duration::Eighth => "8",
        Duration::Sixteenth => "16",
    }
}

/// Engine token for a duration name; unknown names map to the quarter token.
pub fn duration_to_token(name: &str, style: DurationTokenStyle) -> &'static str {
    let duration = Duration::from_name(name).unwrap_or(Duration::Quarter);
    duration_token(duration, style)
}

/// Inverse of [`duration_token`]; accepts either quarter spelling.
pub fn token_to_duration(token: &str) -> Option<Duration> {
    match token.trim() {
        "w" | "1" => Some(Duration::Whole),
        "h" | "2" => Some(Duration::Half),
        "q" | "4" => Some(Duration::Quarter),
        "8" => Some(Duration::Eighth),
        "16" => Some(Duration::Sixteenth),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pitch_tokens_round_trip() {
        for pitch in ["C4", "C#4", "Bb3", "G10", "A0"] {
            let token = pitch_to_token(pitch).unwrap();
            assert_eq!(token_to_pitch(&token).as_deref(), Some(pitch));
        }
        assert_eq!(pitch_to_token("C#4").as_deref(), Some("c#/4"));
    }

    #[test]
    fn chord_symbols_are_not_pitches() {
        assert!(!is_valid_pitch("Am7"));
        assert!(!is_valid_pitch(""));
        assert!(!is_valid_pitch("c4"));
        assert!(!is_valid_pitch("H4"));
        // octave digits are ASCII only
        assert!(!is_valid_pitch("C\u{664}"));
        assert_eq!(token_to_pitch("c/\u{664}"), None);
        assert_eq!(pitch_to_token("Am7"), None);
        assert_eq!(token_to_pitch("Am7"), None);
    }

    #[test]
    fn duration_tokens() {
        assert_eq!(duration_to_token("quarter", DurationTokenStyle::Letter), "q");
        assert_eq!(duration_to_token("quarter", DurationTokenStyle::Numeric), "4");
        assert_eq!(duration_to_token("sixteenth", DurationTokenStyle::Letter), "16");
        assert_eq!(duration_to_token("breve", DurationTokenStyle::Letter), "q");
        for style in [DurationTokenStyle::Letter, DurationTokenStyle::Numeric] {
            for d in Duration::DESCENDING {
                assert_eq!(token_to_duration(duration_token(d, style)), Some(d));
            }
        }
    }
}
