//! Layout configuration. Every field defaults to the value in `constants`.

use serde::{Deserialize, Serialize};

use super::constants::*;
use crate::codec::DurationTokenStyle;
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutConfig {
    pub margin_left: f64,
    pub margin_right: f64,
    pub margin_top: f64,
    pub margin_bottom: f64,
    pub header_height: f64,
    pub title_offset_y: f64,
    pub composer_offset_y: f64,
    pub measures_per_line: usize,
    pub row_height: f64,
    pub staff_spacing: f64,
    pub staff_line_spacing: f64,
    pub clef_space: f64,
    pub key_sharp_space: f64,
    pub key_flat_space: f64,
    pub time_sig_space: f64,
    pub note_padding_left: f64,
    pub measure_margin_right: f64,
    pub min_measure_width: f64,
    pub chord_offset_y: f64,
    pub lyrics_offset_y: f64,
    pub fallback_pitch: String,
    pub duration_tokens: DurationTokenStyle,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            margin_left: PAGE_MARGIN_LEFT,
            margin_right: PAGE_MARGIN_RIGHT,
            margin_top: PAGE_MARGIN_TOP,
            margin_bottom: PAGE_MARGIN_BOTTOM,
            header_height: HEADER_HEIGHT,
            title_offset_y: TITLE_BASELINE,
            composer_offset_y: COMPOSER_BASELINE,
            measures_per_line: MEASURES_PER_LINE,
            row_height: ROW_HEIGHT,
            staff_spacing: STAFF_SPACING,
            staff_line_spacing: STAFF_LINE_SPACING,
            clef_space: CLEF_SPACE,
            key_sharp_space: KEY_SIG_SHARP_SPACE,
            key_flat_space: KEY_SIG_FLAT_SPACE,
            time_sig_space: TIME_SIG_SPACE,
            note_padding_left: NOTE_PADDING_LEFT,
            measure_margin_right: MEASURE_MARGIN_RIGHT,
            min_measure_width: MIN_MEASURE_WIDTH,
            chord_offset_y: CHORD_SYMBOL_OFFSET_Y,
            lyrics_offset_y: LYRICS_OFFSET_Y,
            fallback_pitch: FALLBACK_PITCH_TOKEN.to_string(),
            duration_tokens: DurationTokenStyle::default(),
        }
    }
}

impl LayoutConfig {
    /// Load overrides from JSON; absent fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Five lines, four spaces.
    pub fn staff_height(&self) -> f64 {
        self.staff_line_spacing * 4.0
    }

    pub fn measures_per_line(&self) -> usize {
        self.measures_per_line.max(1)
    }

    /// Width of the key-signature glyph run for a signed accidental count.
    pub fn key_sig_width(&self, fifths: i32) -> f64 {
        if fifths > 0 {
            fifths as f64 * self.key_sharp_space
        } else {
            fifths.unsigned_abs() as f64 * self.key_flat_space
        }
    }
}
