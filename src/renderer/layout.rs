//! Layout computation — wraps measures into rows, sizes them, and turns
//! notes, chords and lyrics into positioned draw commands.

use serde::Serialize;

use super::beat_map::{token_to_staff_y, NoteBand};
use super::config::LayoutConfig;
use super::constants::DEFAULT_CANVAS_WIDTH;
use crate::beats::{reconcile, NotePlacement, ReconciledMeasure, SkipReason};
use crate::codec::{duration_token, pitch_to_token};
use crate::model::{key_signature_fifths, Clef, Measure, Score};

// ═══════════════════════════════════════════════════════════════════════
// Layout structures
// ═══════════════════════════════════════════════════════════════════════

/// One drawing primitive. A surface adapter translates these literally.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DrawCommand {
    /// Reset the surface. Always the first command of a pass.
    Clear { width: f64, height: f64 },
    /// A five-line stave segment. Glyph fields are only set on the first
    /// measure of a row.
    #[serde(rename_all = "camelCase")]
    Stave {
        x: f64,
        y: f64,
        width: f64,
        line_spacing: f64,
        clef: Option<Clef>,
        key_signature: Option<String>,
        time_signature: Option<String>,
    },
    /// A note at an absolute position, named by engine tokens.
    Note {
        x: f64,
        y: f64,
        key: String,
        duration: String,
        style: NoteStyle,
    },
    Text {
        x: f64,
        y: f64,
        text: String,
        role: TextRole,
    },
    #[serde(rename_all = "camelCase")]
    Barline { x: f64, y_top: f64, y_bottom: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum NoteStyle {
    Normal,
    /// Occupies space, draws nothing (rests and padding).
    Invisible,
    /// Stand-in for a pitch that could not be read.
    Placeholder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TextRole {
    Title,
    Composer,
    Chord,
    Lyric,
}

/// Geometry of one laid-out measure.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasureBox {
    pub staff: usize,
    pub measure: usize,
    pub row: usize,
    pub x: f64,
    /// Top staff line
    pub y: f64,
    pub width: f64,
    /// Start of the note band (after the clef/key/time prefix and padding)
    pub note_x: f64,
    pub note_width: f64,
    /// Beat accounting; `None` when the measure was skipped
    pub reconciled: Option<ReconciledMeasure>,
}

/// A measure whose notes were not drawn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutSkip {
    pub staff: usize,
    pub measure: usize,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreLayout {
    pub width: f64,
    pub height: f64,
    pub commands: Vec<DrawCommand>,
    pub measures: Vec<MeasureBox>,
    pub skipped: Vec<LayoutSkip>,
}

/// Horizontal slot of a measure in its row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct Column {
    pub(super) x: f64,
    pub(super) width: f64,
}

// ═══════════════════════════════════════════════════════════════════════
// Entry points
// ═══════════════════════════════════════════════════════════════════════

/// Lay out `score` on a canvas `canvas_width` units wide with default settings.
pub fn layout(score: &Score, canvas_width: f64) -> ScoreLayout {
    layout_with(score, canvas_width, &LayoutConfig::default())
}

/// Lay out `score` with explicit settings. Pure and deterministic.
pub fn layout_with(score: &Score, canvas_width: f64, config: &LayoutConfig) -> ScoreLayout {
    let width = if canvas_width.is_finite() && canvas_width > 0.0 {
        canvas_width
    } else {
        log::warn!("canvas width {canvas_width} is unusable; using {DEFAULT_CANVAS_WIDTH}");
        DEFAULT_CANVAS_WIDTH
    };
    let height = canvas_height(score, config);

    let mut pass = LayoutPass::new(score, config, width);
    pass.commands.push(DrawCommand::Clear { width, height });
    pass.header(score);

    let per_line = config.measures_per_line();
    let available = (width - config.margin_left - config.margin_right).max(1.0);
    let mut y = config.margin_top + config.header_height;

    for (staff_idx, staff) in score.staves.iter().enumerate() {
        for (row_idx, row) in staff.measures.chunks(per_line).enumerate() {
            let columns = row_columns(row, config.margin_left, available, per_line, config.min_measure_width);
            for (col, (measure, column)) in row.iter().zip(columns).enumerate() {
                let slot = Slot {
                    staff: staff_idx,
                    measure: row_idx * per_line + col,
                    row: row_idx,
                    clef: staff.clef,
                    y,
                    column,
                    first_in_row: col == 0,
                };
                pass.measure(measure, &slot);
            }
            y += config.row_height;
        }
        if !staff.measures.is_empty() {
            y += config.staff_spacing;
        }
    }

    ScoreLayout {
        width,
        height,
        commands: pass.commands,
        measures: pass.measures,
        skipped: pass.skipped,
    }
}

fn canvas_height(score: &Score, config: &LayoutConfig) -> f64 {
    let per_line = config.measures_per_line();
    let body: f64 = score
        .staves
        .iter()
        .filter(|s| !s.measures.is_empty())
        .map(|s| s.measures.len().div_ceil(per_line) as f64 * config.row_height + config.staff_spacing)
        .sum();
    config.margin_top + config.header_height + body + config.margin_bottom
}

// ═══════════════════════════════════════════════════════════════════════
// Measure widths
// ═══════════════════════════════════════════════════════════════════════

/// Start and width for each measure of a row.
///
/// A measure is anchored when it has `startX` and so does a neighbour in
/// the same row. Anchored measures start at `left + startX * available`;
/// runs of unanchored measures split the space between anchors evenly.
/// Anything non-monotonic, or a measure narrower than `min_width`, falls
/// back to even widths for the whole row.
pub(super) fn row_columns(
    row: &[Measure],
    left: f64,
    available: f64,
    per_line: usize,
    min_width: f64,
) -> Vec<Column> {
    let even_w = available / per_line.max(1) as f64;
    let even: Vec<Column> = (0..row.len())
        .map(|i| Column { x: left + i as f64 * even_w, width: even_w })
        .collect();

    let anchored: Vec<bool> = (0..row.len())
        .map(|i| {
            let has = |j: usize| row.get(j).is_some_and(|m| m.start_x.is_some());
            has(i) && ((i > 0 && has(i - 1)) || has(i + 1))
        })
        .collect();
    if !anchored.contains(&true) {
        return even;
    }

    let right = left + available;
    let mut starts: Vec<Option<f64>> = row
        .iter()
        .zip(&anchored)
        .map(|(m, &a)| if a { m.start_x.map(|sx| left + sx * available) } else { None })
        .collect();

    let mut i = 0;
    while i < starts.len() {
        if starts[i].is_some() {
            i += 1;
            continue;
        }
        let run_start = i;
        while i < starts.len() && starts[i].is_none() {
            i += 1;
        }
        let from = match run_start.checked_sub(1).and_then(|p| starts[p]) {
            Some(prev) => prev + even_w,
            None => left,
        };
        let to = starts.get(i).copied().flatten().unwrap_or(right);
        let step = (to - from) / (i - run_start) as f64;
        for (k, start) in starts[run_start..i].iter_mut().enumerate() {
            *start = Some(from + k as f64 * step);
        }
    }
    let starts: Vec<f64> = starts.into_iter().flatten().collect();

    let usable = starts.windows(2).all(|w| w[1] > w[0])
        && starts.iter().all(|s| s.is_finite() && *s >= left && *s < right);
    if !usable {
        log::warn!("startX hints in a row are out of order or out of range; spacing evenly");
        return even;
    }

    let columns: Vec<Column> = starts
        .iter()
        .enumerate()
        .map(|(i, &x)| {
            let width = match starts.get(i + 1) {
                Some(next) => next - x,
                None if anchored[i] => even_w.min(right - x),
                None => right - x,
            };
            Column { x, width }
        })
        .collect();

    if let Some(narrow) = columns.iter().find(|c| c.width < min_width) {
        log::warn!(
            "startX hints leave a {:.1}-wide measure (minimum {min_width}); spacing evenly",
            narrow.width
        );
        return even;
    }
    columns
}

// ═══════════════════════════════════════════════════════════════════════
// Per-measure placement
// ═══════════════════════════════════════════════════════════════════════

struct Slot {
    staff: usize,
    measure: usize,
    row: usize,
    clef: Clef,
    y: f64,
    column: Column,
    first_in_row: bool,
}

struct LayoutPass<'a> {
    config: &'a LayoutConfig,
    width: f64,
    declared_beats: u32,
    time_label: String,
    key_label: Option<String>,
    prefix_width: f64,
    commands: Vec<DrawCommand>,
    measures: Vec<MeasureBox>,
    skipped: Vec<LayoutSkip>,
}

impl<'a> LayoutPass<'a> {
    fn new(score: &Score, config: &'a LayoutConfig, width: f64) -> Self {
        let time = score.time();
        let fifths = key_signature_fifths(&score.key_signature);
        if fifths.is_none() {
            log::warn!("unknown key '{}'; drawing without a key signature", score.key_signature);
        }
        Self {
            config,
            width,
            declared_beats: time.beats,
            time_label: time.to_string(),
            key_label: fifths.map(|_| score.key_signature.clone()),
            prefix_width: config.clef_space + config.key_sig_width(fifths.unwrap_or(0)) + config.time_sig_space,
            commands: Vec::new(),
            measures: Vec::new(),
            skipped: Vec::new(),
        }
    }

    fn header(&mut self, score: &Score) {
        let top = self.config.margin_top;
        self.commands.push(DrawCommand::Text {
            x: self.width / 2.0,
            y: top + self.config.title_offset_y,
            text: score.title.clone(),
            role: TextRole::Title,
        });
        if let Some(composer) = score.composer.as_deref().filter(|c| !c.trim().is_empty()) {
            self.commands.push(DrawCommand::Text {
                x: self.width - self.config.margin_right,
                y: top + self.config.composer_offset_y,
                text: composer.to_string(),
                role: TextRole::Composer,
            });
        }
    }

    fn measure(&mut self, measure: &Measure, slot: &Slot) {
        let config = self.config;
        let column = slot.column;
        let prefix = if slot.first_in_row { self.prefix_width } else { 0.0 };
        let inset = prefix + config.note_padding_left;
        let band = NoteBand {
            x: column.x + inset,
            width: (column.width - inset - config.measure_margin_right).max(1.0),
        };

        self.commands.push(DrawCommand::Stave {
            x: column.x,
            y: slot.y,
            width: column.width,
            line_spacing: config.staff_line_spacing,
            clef: slot.first_in_row.then_some(slot.clef),
            key_signature: if slot.first_in_row { self.key_label.clone() } else { None },
            time_signature: slot.first_in_row.then(|| self.time_label.clone()),
        });

        let reconciled = match reconcile(measure, self.declared_beats) {
            Ok(r) => {
                self.notes(measure, &r, band, slot);
                self.annotations(measure, r.layout_span(), band, slot.y);
                Some(r)
            }
            Err(reason) => {
                log::warn!("staff {} measure {}: notes not drawn, {reason}", slot.staff, slot.measure);
                self.skipped.push(LayoutSkip { staff: slot.staff, measure: slot.measure, reason });
                None
            }
        };

        self.commands.push(DrawCommand::Barline {
            x: column.x + column.width,
            y_top: slot.y,
            y_bottom: slot.y + config.staff_height(),
        });

        self.measures.push(MeasureBox {
            staff: slot.staff,
            measure: slot.measure,
            row: slot.row,
            x: column.x,
            y: slot.y,
            width: column.width,
            note_x: band.x,
            note_width: band.width,
            reconciled,
        });
    }

    fn notes(&mut self, measure: &Measure, r: &ReconciledMeasure, band: NoteBand, slot: &Slot) {
        let config = self.config;
        let span = r.layout_span();
        // even spacing shares the band with the padding rests
        let slots = measure.notes.len() + r.padding.len();

        for (i, note) in measure.notes.iter().enumerate() {
            let x = match &r.placement {
                NotePlacement::Beats(beats) => beats
                    .get(i)
                    .map_or_else(|| band.even_x(i, slots), |&b| band.beat_x(b, span)),
                NotePlacement::Even => band.even_x(i, slots),
            };
            let (key, style) = if note.rest {
                (config.fallback_pitch.clone(), NoteStyle::Invisible)
            } else {
                let drawable = pitch_to_token(&note.pitch)
                    .filter(|t| token_to_staff_y(t, slot.clef, config.staff_line_spacing).is_some());
                match drawable {
                    Some(token) => (token, NoteStyle::Normal),
                    None => {
                        log::warn!(
                            "staff {} measure {} note {}: '{}' is not a drawable pitch; drawing a placeholder",
                            slot.staff,
                            slot.measure,
                            i,
                            note.pitch
                        );
                        (config.fallback_pitch.clone(), NoteStyle::Placeholder)
                    }
                }
            };
            let duration = duration_token(note.duration, config.duration_tokens).to_string();
            self.note(x, slot, key, duration, style);
        }

        for (k, rest) in r.padding.iter().enumerate() {
            let x = match r.placement {
                NotePlacement::Beats(_) => band.beat_x(rest.beat, span),
                NotePlacement::Even => band.even_x(measure.notes.len() + k, slots),
            };
            let duration = duration_token(rest.duration, config.duration_tokens).to_string();
            self.note(x, slot, config.fallback_pitch.clone(), duration, NoteStyle::Invisible);
        }
    }

    fn note(&mut self, x: f64, slot: &Slot, key: String, duration: String, style: NoteStyle) {
        let spacing = self.config.staff_line_spacing;
        let offset = token_to_staff_y(&key, slot.clef, spacing).unwrap_or(2.0 * spacing);
        self.commands.push(DrawCommand::Note { x, y: slot.y + offset, key, duration, style });
    }

    fn annotations(&mut self, measure: &Measure, span: f64, band: NoteBand, staff_y: f64) {
        let config = self.config;
        let chord_y = staff_y + config.chord_offset_y;
        for (i, chord) in measure.chords.iter().enumerate() {
            let x = band.annotation_x(measure.chord_positions.get(i).copied(), span, i, measure.chords.len());
            self.commands.push(DrawCommand::Text { x, y: chord_y, text: chord.clone(), role: TextRole::Chord });
        }

        let lyric_y = staff_y + config.staff_height() + config.lyrics_offset_y;
        for (i, syllable) in measure.lyrics.iter().enumerate() {
            let x = band.annotation_x(measure.lyric_positions.get(i).copied(), span, i, measure.lyrics.len());
            self.commands.push(DrawCommand::Text { x, y: lyric_y, text: syllable.clone(), role: TextRole::Lyric });
        }
    }
}
