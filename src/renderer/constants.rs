//! Default layout constants (all in canvas user units).

// ── Page & margins ──────────────────────────────────────────────────
pub(super) const DEFAULT_CANVAS_WIDTH: f64 = 800.0;
pub(super) const PAGE_MARGIN_LEFT: f64 = 10.0;
pub(super) const PAGE_MARGIN_RIGHT: f64 = 10.0;
pub(super) const PAGE_MARGIN_TOP: f64 = 30.0;
pub(super) const PAGE_MARGIN_BOTTOM: f64 = 40.0;
pub(super) const HEADER_HEIGHT: f64 = 60.0; // space for title + composer
pub(super) const TITLE_BASELINE: f64 = 20.0; // below the top margin
pub(super) const COMPOSER_BASELINE: f64 = 42.0;

// ── Rows ────────────────────────────────────────────────────────────
pub(super) const MEASURES_PER_LINE: usize = 4;
pub(super) const ROW_HEIGHT: f64 = 120.0;
pub(super) const STAFF_SPACING: f64 = 40.0; // extra gap after a staff's last row

// ── Staff dimensions ────────────────────────────────────────────────
pub(super) const STAFF_LINE_SPACING: f64 = 10.0; // distance between staff lines

// ── Prefix widths ───────────────────────────────────────────────────
pub(super) const CLEF_SPACE: f64 = 32.0; // horizontal space for clef at row start
pub(super) const KEY_SIG_SHARP_SPACE: f64 = 10.0;
pub(super) const KEY_SIG_FLAT_SPACE: f64 = 8.0;
pub(super) const TIME_SIG_SPACE: f64 = 24.0;

// ── Measure interior ────────────────────────────────────────────────
pub(super) const NOTE_PADDING_LEFT: f64 = 12.0;
pub(super) const MEASURE_MARGIN_RIGHT: f64 = 12.0;
pub(super) const MIN_MEASURE_WIDTH: f64 = 38.0;

// ── Annotations ─────────────────────────────────────────────────────
pub(super) const CHORD_SYMBOL_OFFSET_Y: f64 = -18.0; // above staff
pub(super) const LYRICS_OFFSET_Y: f64 = 28.0; // below the bottom staff line

/// Drawn in place of a pitch that failed to parse.
pub(super) const FALLBACK_PITCH_TOKEN: &str = "b/4";
