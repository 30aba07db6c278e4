//! Beat arithmetic for a single measure: note offsets, beat totals, and
//! the invisible rest padding that keeps a drawn voice full.
//!
//! The declared time signature is only used for diagnostics. A measure is
//! always laid out with its actual beat total, because recognized data is
//! often over- or under-full and an approximate render beats no render.

use serde::Serialize;
use thiserror::Error;

use crate::model::{Duration, Measure};

/// Tolerance for beat comparisons.
pub const BEAT_EPSILON: f64 = 0.01;

/// Durations tried, in order, when filling a voice shortfall.
const PADDING_ORDER: [Duration; 4] =
    [Duration::Half, Duration::Quarter, Duration::Eighth, Duration::Sixteenth];

/// Upper bound on synthesized rests for one measure.
const MAX_PADDING_RESTS: usize = 64;

/// Why a measure could not be turned into a drawable voice.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SkipReason {
    #[error("note {index} has a non-finite beat")]
    NonFiniteBeat { index: usize },
    #[error("note {index} has negative beat {beat}")]
    NegativeBeat { index: usize, beat: f64 },
    #[error("padding left {remainder} beats unfilled")]
    Unconverged { remainder: f64 },
}

/// How notes are positioned horizontally inside the measure.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum NotePlacement {
    /// One beat offset per note: the explicit `beat` when present, the
    /// running cursor otherwise.
    Beats(Vec<f64>),
    /// No note carries a beat; spread by index.
    Even,
}

/// A synthesized invisible rest.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PaddingRest {
    pub duration: Duration,
    pub beat: f64,
}

/// Beat accounting for one measure.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciledMeasure {
    /// Sum of note weights
    pub measure_beats: f64,
    /// Integral voice capacity, `max(1, ceil(measure_beats))`
    pub voice_beats: u32,
    /// Time-signature numerator the score declares
    pub declared_beats: u32,
    /// Latest `beat + duration` over the placed notes and padding
    pub content_end: f64,
    pub placement: NotePlacement,
    pub padding: Vec<PaddingRest>,
}

impl ReconciledMeasure {
    /// Total weight after padding.
    pub fn padded_beats(&self) -> f64 {
        self.measure_beats + self.padding.iter().map(|r| r.duration.beats()).sum::<f64>()
    }

    /// True when the actual content disagrees with the declared meter.
    pub fn mismatches_declared(&self) -> bool {
        (self.measure_beats - self.declared_beats as f64).abs() > BEAT_EPSILON
    }

    /// Beat span used to scale offsets to pixels. Never smaller than the
    /// declared meter, grown for over-full measures and for explicit beats
    /// past the voice so every note lands inside the measure.
    pub fn layout_span(&self) -> f64 {
        (self.declared_beats as f64)
            .max(self.voice_beats as f64)
            .max(self.content_end)
            .max(1.0)
    }
}

/// Sum of the measure's note weights.
pub fn measure_beats(measure: &Measure) -> f64 {
    measure.notes.iter().map(|n| n.duration.beats()).sum()
}

/// `max(1, ceil(measure_beats))`, tolerant of float noise just above an integer.
pub fn voice_beats(measure_beats: f64) -> u32 {
    let whole = (measure_beats - BEAT_EPSILON / 2.0).ceil();
    whole.max(1.0) as u32
}

/// Rests (largest first) filling `shortfall` beats down to `BEAT_EPSILON`.
pub fn padding_durations(shortfall: f64) -> Result<Vec<Duration>, SkipReason> {
    let mut rests = Vec::new();
    let mut remainder = shortfall;
    while remainder >= BEAT_EPSILON {
        let fit = PADDING_ORDER
            .iter()
            .copied()
            .find(|d| d.beats() <= remainder + BEAT_EPSILON);
        match fit {
            Some(d) if rests.len() < MAX_PADDING_RESTS => {
                rests.push(d);
                remainder -= d.beats();
            }
            _ => return Err(SkipReason::Unconverged { remainder }),
        }
    }
    Ok(rests)
}

/// Resolve each note's beat offset. Explicit beats win; missing ones follow
/// the running cursor. Returns `Even` when no note has a beat.
pub fn resolve_note_beats(measure: &Measure) -> Result<NotePlacement, SkipReason> {
    if measure.notes.iter().all(|n| n.beat.is_none()) {
        return Ok(NotePlacement::Even);
    }

    let beats = measure
        .notes
        .iter()
        .enumerate()
        .try_fold((Vec::with_capacity(measure.notes.len()), 0.0f64), |(mut acc, cursor), (index, note)| {
            let beat = match note.beat {
                Some(b) if !b.is_finite() => return Err(SkipReason::NonFiniteBeat { index }),
                Some(b) if b < 0.0 => return Err(SkipReason::NegativeBeat { index, beat: b }),
                Some(b) => b,
                None => cursor,
            };
            acc.push(beat);
            Ok((acc, beat + note.duration.beats()))
        })?
        .0;

    Ok(NotePlacement::Beats(beats))
}

/// Reconcile a measure against the declared numerator.
pub fn reconcile(measure: &Measure, declared_beats: u32) -> Result<ReconciledMeasure, SkipReason> {
    let placement = resolve_note_beats(measure)?;
    let total = measure_beats(measure);
    let capacity = voice_beats(total);

    let shortfall = capacity as f64 - total;
    let mut cursor = total;
    let padding: Vec<PaddingRest> = padding_durations(shortfall)?
        .into_iter()
        .map(|duration| {
            let rest = PaddingRest { duration, beat: cursor };
            cursor += duration.beats();
            rest
        })
        .collect();

    let note_end = match &placement {
        NotePlacement::Beats(beats) => beats
            .iter()
            .zip(&measure.notes)
            .map(|(b, n)| b + n.duration.beats())
            .fold(0.0, f64::max),
        NotePlacement::Even => total,
    };
    let content_end = padding
        .iter()
        .map(|r| r.beat + r.duration.beats())
        .fold(note_end, f64::max);

    let reconciled = ReconciledMeasure {
        measure_beats: total,
        voice_beats: capacity,
        declared_beats,
        content_end,
        placement,
        padding,
    };

    if reconciled.mismatches_declared() {
        log::warn!(
            "measure holds {} beats but the time signature declares {}; drawing actual content",
            total,
            declared_beats
        );
    }

    Ok(reconciled)
}

/// True when `beats` never decreases. Equal neighbours are fine.
pub fn is_non_decreasing(beats: &[f64]) -> bool {
    beats.windows(2).all(|w| w[1] + 1e-9 >= w[0])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Note;

    fn measure_of(durations: &[Duration]) -> Measure {
        Measure {
            notes: durations.iter().map(|&d| Note::pitched("C4", d)).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn three_quarters_in_three_four_needs_nothing() {
        let m = measure_of(&[Duration::Quarter; 3]);
        let r = reconcile(&m, 3).unwrap();
        assert_eq!(r.measure_beats, 3.0);
        assert_eq!(r.voice_beats, 3);
        assert!(r.padding.is_empty());
        assert!(!r.mismatches_declared());
    }

    #[test]
    fn under_full_measure_trusts_actual_beats() {
        let m = measure_of(&[Duration::Quarter, Duration::Quarter]);
        let r = reconcile(&m, 4).unwrap();
        assert_eq!(r.measure_beats, 2.0);
        assert_eq!(r.voice_beats, 2);
        assert!(r.padding.is_empty());
        assert!(r.mismatches_declared());
    }

    #[test]
    fn fractional_total_is_padded_largest_first() {
        // 1 + 0.5 + 0.25 = 1.75 -> capacity 2, one sixteenth
        let m = measure_of(&[Duration::Quarter, Duration::Eighth, Duration::Sixteenth]);
        let r = reconcile(&m, 4).unwrap();
        assert_eq!(r.voice_beats, 2);
        assert_eq!(r.padding, vec![PaddingRest { duration: Duration::Sixteenth, beat: 1.75 }]);

        // 2.25 -> capacity 3, the 0.75 shortfall fills as eighth + sixteenth
        let m = measure_of(&[Duration::Half, Duration::Sixteenth]);
        let r = reconcile(&m, 4).unwrap();
        let durations: Vec<_> = r.padding.iter().map(|p| p.duration).collect();
        assert_eq!(durations, vec![Duration::Eighth, Duration::Sixteenth]);
        assert!((r.padded_beats() - 3.0).abs() < BEAT_EPSILON);
    }

    #[test]
    fn padded_total_always_reaches_capacity() {
        let pool = Duration::DESCENDING;
        for a in pool {
            for b in pool {
                for c in pool {
                    let m = measure_of(&[a, b, c]);
                    let r = reconcile(&m, 4).unwrap();
                    let target = r.measure_beats.ceil().max(1.0);
                    assert!((r.padded_beats() - target).abs() < BEAT_EPSILON);
                }
            }
        }
    }

    #[test]
    fn empty_measure_gets_a_single_rest() {
        let r = reconcile(&Measure::default(), 4).unwrap();
        assert_eq!(r.voice_beats, 1);
        assert_eq!(r.padding.len(), 1);
        assert_eq!(r.padding[0].duration, Duration::Quarter);
    }

    #[test]
    fn explicit_beats_take_precedence_over_cursor() {
        let m = Measure {
            notes: vec![
                Note::pitched("C4", Duration::Quarter).at_beat(0.0),
                Note::pitched("D4", Duration::Quarter),
                Note::pitched("E4", Duration::Quarter).at_beat(3.0),
                Note::pitched("F4", Duration::Eighth),
            ],
            ..Default::default()
        };
        assert_eq!(
            resolve_note_beats(&m).unwrap(),
            NotePlacement::Beats(vec![0.0, 1.0, 3.0, 4.0])
        );
        assert_eq!(resolve_note_beats(&measure_of(&[Duration::Half])).unwrap(), NotePlacement::Even);
    }

    #[test]
    fn late_explicit_beat_widens_the_span() {
        let m = Measure {
            notes: vec![
                Note::pitched("C4", Duration::Quarter).at_beat(0.0),
                Note::pitched("D4", Duration::Quarter).at_beat(9.0),
            ],
            ..Default::default()
        };
        let r = reconcile(&m, 4).unwrap();
        assert_eq!(r.voice_beats, 2);
        assert_eq!(r.content_end, 10.0);
        assert_eq!(r.layout_span(), 10.0);

        // content inside the meter keeps the declared span
        let r = reconcile(&measure_of(&[Duration::Half]), 4).unwrap();
        assert_eq!(r.layout_span(), 4.0);
    }

    #[test]
    fn negative_beat_skips_the_measure() {
        let m = Measure {
            notes: vec![Note::pitched("C4", Duration::Quarter).at_beat(-1.0)],
            ..Default::default()
        };
        assert_eq!(reconcile(&m, 4), Err(SkipReason::NegativeBeat { index: 0, beat: -1.0 }));
    }

    #[test]
    fn non_decreasing_allows_shared_beats() {
        assert!(is_non_decreasing(&[0.0, 0.0, 1.0, 2.5]));
        assert!(!is_non_decreasing(&[0.0, 2.0, 1.0]));
    }
}
