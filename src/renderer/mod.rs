//! Score renderer — lays a Score out as draw commands and replays them on
//! a drawing surface.
//!
//! `layout` owns every positioning decision. A `DrawSurface` only turns
//! commands into marks, so surfaces are interchangeable; `SvgSurface`
//! produces a self-contained SVG string.

mod beat_map;
mod config;
mod constants;
mod layout;
mod svg_builder;

pub use config::LayoutConfig;
pub use layout::{
    layout, layout_with, DrawCommand, LayoutSkip, MeasureBox, NoteStyle, ScoreLayout, TextRole,
};
pub use svg_builder::SvgSurface;

use crate::model::{Clef, Score};
use svg_builder::empty_svg;

/// Glyphs drawn at the start of a stave segment.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StaveGlyphs<'a> {
    pub clef: Option<Clef>,
    pub key_signature: Option<&'a str>,
    pub time_signature: Option<&'a str>,
}

/// A target that can draw the primitives a layout produces.
pub trait DrawSurface {
    /// Drop everything drawn so far and resize.
    fn clear(&mut self, width: f64, height: f64);
    fn stave(&mut self, x: f64, y: f64, width: f64, line_spacing: f64, glyphs: StaveGlyphs<'_>);
    /// `key` and `duration` are engine tokens (`"c#/4"`, `"q"`).
    fn note(&mut self, x: f64, y: f64, key: &str, duration: &str, style: NoteStyle);
    fn text(&mut self, x: f64, y: f64, text: &str, role: TextRole);
    fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64);
}

// ═══════════════════════════════════════════════════════════════════════
// Public API
// ═══════════════════════════════════════════════════════════════════════

/// Replay `layout` on `surface`, command by command.
pub fn render<S: DrawSurface + ?Sized>(layout: &ScoreLayout, surface: &mut S) {
    for command in &layout.commands {
        match command {
            DrawCommand::Clear { width, height } => surface.clear(*width, *height),
            DrawCommand::Stave { x, y, width, line_spacing, clef, key_signature, time_signature } => {
                let glyphs = StaveGlyphs {
                    clef: *clef,
                    key_signature: key_signature.as_deref(),
                    time_signature: time_signature.as_deref(),
                };
                surface.stave(*x, *y, *width, *line_spacing, glyphs);
            }
            DrawCommand::Note { x, y, key, duration, style } => surface.note(*x, *y, key, duration, *style),
            DrawCommand::Text { x, y, text, role } => surface.text(*x, *y, text, *role),
            DrawCommand::Barline { x, y_top, y_bottom } => surface.line(*x, *y_top, *x, *y_bottom),
        }
    }
}

/// Render a Score into a complete SVG string.
///
/// `page_width` sets the SVG width in user units; `None` or a non-positive
/// value uses the default (800).
pub fn render_score_to_svg(score: &Score, page_width: Option<f64>) -> String {
    if score.staves.is_empty() {
        return empty_svg("No staves in score");
    }
    let width = page_width.filter(|w| *w > 0.0).unwrap_or(constants::DEFAULT_CANVAS_WIDTH);

    let laid_out = layout(score, width);
    let mut svg = SvgSurface::new();
    render(&laid_out, &mut svg);
    svg.finish()
}
