//! SVG surface — accumulates SVG elements and produces the final string.

use super::beat_map::is_filled_note;
use super::layout::{NoteStyle, TextRole};
use super::{DrawSurface, StaveGlyphs};
use crate::codec::token_to_duration;
use crate::model::{key_signature_fifths, Clef, Duration};

const NOTE_COLOR: &str = "#000";
const PLACEHOLDER_COLOR: &str = "#d0021b";
const STAFF_LINE_COLOR: &str = "#555";
const NOTEHEAD_RX: f64 = 6.0;
const NOTEHEAD_RY: f64 = 4.2;
const STEM_LENGTH: f64 = 32.0;
const KEY_GLYPH_START: f64 = 32.0;
const KEY_GLYPH_STEP: f64 = 9.0;

// ═══════════════════════════════════════════════════════════════════════
// SvgSurface
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Default)]
pub struct SvgSurface {
    elements: Vec<String>,
    width: f64,
    height: f64,
}

impl SvgSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// The finished document.
    pub fn finish(self) -> String {
        let mut svg = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {} {}" width="{}" height="{}" style="font-family: 'Georgia', 'Times New Roman', serif;">"#,
            self.width, self.height, self.width, self.height
        );
        svg.push('\n');
        for el in &self.elements {
            svg.push_str("  ");
            svg.push_str(el);
            svg.push('\n');
        }
        svg.push_str("</svg>\n");
        svg
    }

    fn stroke(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, color: &str, width: f64) {
        self.elements.push(format!(
            r#"<line x1="{:.1}" y1="{:.1}" x2="{:.1}" y2="{:.1}" stroke="{}" stroke-width="{:.1}" stroke-linecap="round"/>"#,
            x1, y1, x2, y2, color, width
        ));
    }

    fn glyph(&mut self, x: f64, y: f64, content: &str, size: f64, anchor: &str) {
        self.elements.push(format!(
            r#"<text x="{:.1}" y="{:.1}" font-size="{:.0}" fill="{}" text-anchor="{}">{}</text>"#,
            x, y, size, NOTE_COLOR, anchor, escape(content)
        ));
    }

    fn notehead(&mut self, cx: f64, cy: f64, filled: bool, color: &str) {
        if filled {
            self.elements.push(format!(
                r#"<ellipse cx="{:.1}" cy="{:.1}" rx="{:.1}" ry="{:.1}" fill="{}" transform="rotate(-15,{:.1},{:.1})"/>"#,
                cx, cy, NOTEHEAD_RX, NOTEHEAD_RY, color, cx, cy
            ));
        } else {
            let sw = 2.0;
            self.elements.push(format!(
                r#"<ellipse cx="{:.1}" cy="{:.1}" rx="{:.1}" ry="{:.1}" fill="none" stroke="{}" stroke-width="{:.1}" transform="rotate(-15,{:.1},{:.1})"/>"#,
                cx, cy, NOTEHEAD_RX - sw / 2.0, NOTEHEAD_RY - sw / 2.0, color, sw, cx, cy
            ));
        }
    }
}

impl DrawSurface for SvgSurface {
    fn clear(&mut self, width: f64, height: f64) {
        self.elements.clear();
        self.width = width;
        self.height = height;
        self.elements.push(format!(
            r#"<rect x="0" y="0" width="{:.1}" height="{:.1}" fill="white"/>"#,
            width, height
        ));
    }

    fn stave(&mut self, x: f64, y: f64, width: f64, line_spacing: f64, glyphs: StaveGlyphs<'_>) {
        for i in 0..5 {
            let ly = y + i as f64 * line_spacing;
            self.stroke(x, ly, x + width, ly, STAFF_LINE_COLOR, 1.0);
        }

        let size = line_spacing * 4.0;
        if let Some(clef) = glyphs.clef {
            let (symbol, baseline) = match clef {
                Clef::Treble => ("\u{1D11E}", y + 3.0 * line_spacing),
                Clef::Bass => ("\u{1D122}", y + line_spacing),
                Clef::Alto => ("\u{1D121}", y + 2.0 * line_spacing),
            };
            self.glyph(x + 4.0, baseline + line_spacing, symbol, size, "start");
        }

        let mut cursor = x + KEY_GLYPH_START;
        if let Some(fifths) = glyphs.key_signature.and_then(key_signature_fifths) {
            let symbol = if fifths > 0 { "\u{266F}" } else { "\u{266D}" };
            for k in 0..fifths.unsigned_abs() {
                let ky = y + line_spacing * (1.0 + (k % 3) as f64 * 0.5);
                self.glyph(cursor, ky, symbol, line_spacing * 2.0, "start");
                cursor += KEY_GLYPH_STEP;
            }
        }

        if let Some((num, den)) = glyphs.time_signature.and_then(|t| t.split_once('/')) {
            let tx = cursor + 8.0;
            self.glyph(tx, y + 2.0 * line_spacing - 1.0, num, size / 2.0, "middle");
            self.glyph(tx, y + 4.0 * line_spacing - 1.0, den, size / 2.0, "middle");
        }
    }

    fn note(&mut self, x: f64, y: f64, key: &str, duration: &str, style: NoteStyle) {
        let duration = token_to_duration(duration).unwrap_or_default();
        let color = match style {
            NoteStyle::Placeholder => PLACEHOLDER_COLOR,
            _ => NOTE_COLOR,
        };
        if style == NoteStyle::Invisible {
            self.elements.push(r#"<g opacity="0">"#.to_string());
        }

        if let Some(accidental) = key.chars().nth(1).filter(|c| matches!(c, '#' | 'b')) {
            let symbol = if accidental == '#' { "\u{266F}" } else { "\u{266D}" };
            self.glyph(x - NOTEHEAD_RX - 9.0, y + 4.0, symbol, 14.0, "start");
        }
        self.notehead(x, y, is_filled_note(duration), color);
        if duration != Duration::Whole {
            let stem_x = x + NOTEHEAD_RX - 0.6;
            self.stroke(stem_x, y, stem_x, y - STEM_LENGTH, color, 1.2);
            let flags = match duration {
                Duration::Eighth => 1,
                Duration::Sixteenth => 2,
                _ => 0,
            };
            for f in 0..flags {
                let fy = y - STEM_LENGTH + f as f64 * 6.0;
                self.stroke(stem_x, fy, stem_x + 7.0, fy + 10.0, color, 1.5);
            }
        }

        if style == NoteStyle::Invisible {
            self.elements.push("</g>".to_string());
        }
    }

    fn text(&mut self, x: f64, y: f64, text: &str, role: TextRole) {
        let (size, weight, anchor, family) = match role {
            TextRole::Title => (22.0, "bold", "middle", ""),
            TextRole::Composer => (12.0, "normal", "end", ""),
            TextRole::Chord => (13.0, "normal", "start", r#" font-family="Times New Roman, serif""#),
            TextRole::Lyric => (12.0, "normal", "middle", ""),
        };
        self.elements.push(format!(
            r#"<text x="{:.1}" y="{:.1}"{} font-size="{:.0}" font-weight="{}" fill="{}" text-anchor="{}">{}</text>"#,
            x, y, family, size, weight, NOTE_COLOR, anchor, escape(text)
        ));
    }

    fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64) {
        self.stroke(x1, y1, x2, y2, NOTE_COLOR, 1.2);
    }
}

fn escape(content: &str) -> String {
    content
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

// ═══════════════════════════════════════════════════════════════════════
// Empty SVG fallback
// ═══════════════════════════════════════════════════════════════════════

pub(super) fn empty_svg(message: &str) -> String {
    format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 400 100\">\
         <text x=\"200\" y=\"50\" text-anchor=\"middle\" font-size=\"14\" fill=\"gray\">{}</text>\
         </svg>",
        escape(message)
    )
}
