//! Beat → x mapping inside a measure, and pitch → y on a staff.

use crate::model::{Clef, Duration};

/// Highest octave a note token may name and still be drawn.
const MAX_DRAWN_OCTAVE: i32 = 10;

/// Horizontal band notes occupy inside one measure.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct NoteBand {
    pub(super) x: f64,
    pub(super) width: f64,
}

impl NoteBand {
    /// Beat-proportional x: `x + beat / span * width`.
    pub(super) fn beat_x(&self, beat: f64, span: f64) -> f64 {
        self.x + (beat / span.max(1.0)) * self.width
    }

    /// Even spread: item `index` of `count` siblings.
    pub(super) fn even_x(&self, index: usize, count: usize) -> f64 {
        if count == 0 {
            return self.x;
        }
        self.x + (index as f64 / count as f64) * self.width
    }

    /// An annotation with an optional beat: the beat (capped at the span)
    /// when it is usable, otherwise its index among siblings.
    pub(super) fn annotation_x(&self, beat: Option<f64>, span: f64, index: usize, count: usize) -> f64 {
        match beat.filter(|b| b.is_finite() && *b >= 0.0) {
            Some(b) => self.beat_x(b.min(span), span),
            None => self.even_x(index, count),
        }
    }
}

/// Vertical offset of a note token (`"c#/4"`) from the top staff line.
///
/// Each staff step (line → space) is half a line spacing. Returns `None`
/// for anything that is not a well-formed token, or whose octave lies
/// outside `0..=MAX_DRAWN_OCTAVE`.
pub(super) fn token_to_staff_y(token: &str, clef: Clef, line_spacing: f64) -> Option<f64> {
    let (name, octave) = token.split_once('/')?;
    let octave: i32 = octave.parse().ok().filter(|o| (0..=MAX_DRAWN_OCTAVE).contains(o))?;
    let step_index = match name.chars().next()? {
        'c' => 0, 'd' => 1, 'e' => 2, 'f' => 3,
        'g' => 4, 'a' => 5, 'b' => 6,
        _ => return None,
    };
    let note_position = octave * 7 + step_index;

    // (reference pitch position, staff line it sits on counted from the bottom)
    let (ref_position, line) = match clef {
        Clef::Treble => (4 * 7 + 4, 2), // G4
        Clef::Bass => (3 * 7 + 3, 4),   // F3
        Clef::Alto => (4 * 7, 3),       // C4
    };
    let ref_y = (5 - line) as f64 * line_spacing;

    let staff_steps = note_position - ref_position;
    Some(ref_y - staff_steps as f64 * (line_spacing / 2.0))
}

pub(super) fn is_filled_note(duration: Duration) -> bool {
    !matches!(duration, Duration::Whole | Duration::Half)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn beat_x_scales_by_span() {
        let band = NoteBand { x: 100.0, width: 200.0 };
        assert_eq!(band.beat_x(0.0, 4.0), 100.0);
        assert_eq!(band.beat_x(2.0, 4.0), 200.0);
        assert_eq!(band.beat_x(3.0, 4.0), 250.0);
        assert_eq!(band.even_x(1, 4), 150.0);
        assert_eq!(band.even_x(0, 0), 100.0);
    }

    #[test]
    fn unusable_annotation_beat_falls_back_to_index() {
        let band = NoteBand { x: 0.0, width: 100.0 };
        assert_eq!(band.annotation_x(Some(2.0), 4.0, 0, 2), 50.0);
        assert_eq!(band.annotation_x(None, 4.0, 1, 2), 50.0);
        assert_eq!(band.annotation_x(Some(f64::NAN), 4.0, 1, 4), 25.0);
        assert_eq!(band.annotation_x(Some(12.0), 4.0, 0, 1), 100.0);
    }

    #[test]
    fn staff_y_by_clef() {
        // treble: G4 on the second line from the bottom, B4 on the middle line
        assert_eq!(token_to_staff_y("g/4", Clef::Treble, 10.0), Some(30.0));
        assert_eq!(token_to_staff_y("b/4", Clef::Treble, 10.0), Some(20.0));
        assert_eq!(token_to_staff_y("f#/5", Clef::Treble, 10.0), Some(0.0));
        // bass: F3 on the fourth line, alto: C4 on the middle line
        assert_eq!(token_to_staff_y("f/3", Clef::Bass, 10.0), Some(10.0));
        assert_eq!(token_to_staff_y("c/4", Clef::Alto, 10.0), Some(20.0));
        assert_eq!(token_to_staff_y("Am7", Clef::Treble, 10.0), None);
    }

    #[test]
    fn huge_octaves_are_not_drawable() {
        assert_eq!(token_to_staff_y("c/400000000", Clef::Treble, 10.0), None);
        assert_eq!(token_to_staff_y("c/99999999999999999999", Clef::Bass, 10.0), None);
        assert!(token_to_staff_y("c/10", Clef::Treble, 10.0).is_some());
    }
}
