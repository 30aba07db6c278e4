//! scorelens — score reconciliation and staff layout for recognized
//! sheet-music pages.
//!
//! Recognized pages arrive as MusicXML (plain `.musicxml`/`.xml` or
//! compressed `.mxl`) from the OMR engine, or as JSON from a generative
//! model. Both decode into one [`Score`], which can be validated, laid out
//! as draw commands, and rendered to SVG.
//!
//! # Example
//! ```no_run
//! use scorelens::{parse_file, render_score_to_svg, validate};
//!
//! let score = parse_file("path/to/page.mxl").unwrap();
//! for warning in validate(&score) {
//!     println!("{warning}");
//! }
//! let svg = render_score_to_svg(&score, Some(800.0));
//! println!("{} measures, {} bytes of SVG", score.measure_count(), svg.len());
//! ```

pub mod beats;
pub mod codec;
pub mod error;
pub mod model;
pub mod model_json;
pub mod mxl;
pub mod parser;
pub mod renderer;
pub mod source;
pub mod validate;

use std::path::Path;

pub use error::{Result, ScoreError};
pub use model::*;
pub use model_json::parse_model_json;
pub use mxl::parse_mxl;
pub use parser::parse_musicxml;
pub use renderer::{layout, layout_with, render, render_score_to_svg, LayoutConfig, ScoreLayout};
pub use source::{decode_first, ScoreSource};
pub use validate::{validate, ValidationWarning};

/// Parse a score file from a path.
/// Detects the format from the extension:
/// - `.musicxml` or `.xml` → uncompressed MusicXML
/// - `.mxl` → compressed MXL (ZIP archive)
/// - `.json` → generative-model JSON
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Score> {
    let path = path.as_ref();
    let data = std::fs::read(path)?;
    parse_bytes(&data, path.extension().and_then(|e| e.to_str()))
}

/// Parse a score from raw bytes with an optional format hint.
/// Without a hint the content is sniffed: `<` means XML, `{` or a code
/// fence means JSON, anything else is tried as MXL.
pub fn parse_bytes(data: &[u8], extension: Option<&str>) -> Result<Score> {
    match extension.map(str::to_ascii_lowercase).as_deref() {
        Some("mxl") => parse_mxl(data),
        Some("musicxml") | Some("xml") => parse_musicxml(utf8(data)?),
        Some("json") => parse_model_json(utf8(data)?),
        _ => {
            if let Ok(text) = std::str::from_utf8(data) {
                let text = strip_bom(text);
                let head = text.trim_start();
                if head.starts_with('<') {
                    return parse_musicxml(text);
                }
                if head.starts_with('{') || head.starts_with("```") {
                    return parse_model_json(text);
                }
            }
            parse_mxl(data)
        }
    }
}

fn utf8(data: &[u8]) -> Result<&str> {
    std::str::from_utf8(data)
        .map(strip_bom)
        .map_err(|e| ScoreError::Format(format!("invalid UTF-8: {e}")))
}

/// Notation exporters often prefix a UTF-8 byte-order mark.
fn strip_bom(text: &str) -> &str {
    text.strip_prefix('\u{feff}').unwrap_or(text)
}

/// Serialize a score in the camelCase JSON shape the model collaborators use.
pub fn score_to_json(score: &Score) -> Result<String> {
    Ok(serde_json::to_string_pretty(score)?)
}

/// Parse a score file and render it to SVG.
pub fn render_file_to_svg<P: AsRef<Path>>(path: P, page_width: Option<f64>) -> Result<String> {
    let score = parse_file(path)?;
    Ok(render_score_to_svg(&score, page_width))
}
