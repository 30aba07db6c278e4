//! Structural validation of a Score. Produces warnings only; nothing here
//! blocks layout or rendering.

use serde::Serialize;
use thiserror::Error;

use crate::beats::is_non_decreasing;
use crate::model::{key_signature_fifths, Score, TimeSignature};

/// A non-fatal finding about a Score.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ValidationWarning {
    #[error("score has no staves")]
    NoStaves,
    #[error("time signature '{0}' is not N/D")]
    BadTimeSignature(String),
    #[error("unknown key signature '{0}'")]
    UnknownKey(String),
    #[error("staff {staff} measure {measure}: {chords} chords but {positions} chord positions")]
    ChordPositionMismatch { staff: usize, measure: usize, chords: usize, positions: usize },
    #[error("staff {staff} measure {measure}: {lyrics} lyrics but {positions} lyric positions")]
    LyricPositionMismatch { staff: usize, measure: usize, lyrics: usize, positions: usize },
    #[error("staff {staff} measure {measure} note {note}: invalid pitch '{pitch}'")]
    InvalidPitch { staff: usize, measure: usize, note: usize, pitch: String },
    #[error("staff {staff} measure {measure} note {note}: negative beat {beat}")]
    NegativeBeat { staff: usize, measure: usize, note: usize, beat: f64 },
    #[error("staff {staff} measure {measure}: note beats go backwards")]
    BeatsOutOfOrder { staff: usize, measure: usize },
    #[error("staff {staff} measure {measure}: startX {start_x} outside 0..=1")]
    StartXOutOfRange { staff: usize, measure: usize, start_x: f64 },
}

/// Collect every warning for `score`. Pure; calling it twice gives the same list.
pub fn validate(score: &Score) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if score.staves.is_empty() {
        warnings.push(ValidationWarning::NoStaves);
    }
    if TimeSignature::parse(&score.time_signature).is_none() {
        warnings.push(ValidationWarning::BadTimeSignature(score.time_signature.clone()));
    }
    if key_signature_fifths(&score.key_signature).is_none() {
        warnings.push(ValidationWarning::UnknownKey(score.key_signature.clone()));
    }

    for (staff, s) in score.staves.iter().enumerate() {
        for (measure, m) in s.measures.iter().enumerate() {
            if m.chord_positions.len() != m.chords.len() {
                warnings.push(ValidationWarning::ChordPositionMismatch {
                    staff,
                    measure,
                    chords: m.chords.len(),
                    positions: m.chord_positions.len(),
                });
            }
            if m.lyric_positions.len() != m.lyrics.len() {
                warnings.push(ValidationWarning::LyricPositionMismatch {
                    staff,
                    measure,
                    lyrics: m.lyrics.len(),
                    positions: m.lyric_positions.len(),
                });
            }

            for (note, n) in m.notes.iter().enumerate() {
                if !n.has_valid_pitch() {
                    warnings.push(ValidationWarning::InvalidPitch {
                        staff,
                        measure,
                        note,
                        pitch: n.pitch.clone(),
                    });
                }
                if let Some(beat) = n.beat.filter(|b| *b < 0.0) {
                    warnings.push(ValidationWarning::NegativeBeat { staff, measure, note, beat });
                }
            }

            let explicit: Option<Vec<f64>> = m.notes.iter().map(|n| n.beat).collect();
            if let Some(beats) = explicit {
                if !is_non_decreasing(&beats) {
                    warnings.push(ValidationWarning::BeatsOutOfOrder { staff, measure });
                }
            }

            if let Some(start_x) = m.start_x.filter(|x| !(0.0..=1.0).contains(x)) {
                warnings.push(ValidationWarning::StartXOutOfRange { staff, measure, start_x });
            }
        }
    }

    for w in &warnings {
        log::warn!("{w}");
    }

    warnings
}
