//! Raw score sources — the upstream producers a Score can come from.
//!
//! The OMR engine yields MusicXML (plain or compressed) and the generative
//! model yields JSON. Each producer decodes itself; the orchestration tries
//! them in order and keeps the first Score that decodes.

use crate::error::{Result, ScoreError};
use crate::model::Score;
use crate::{model_json, mxl, parser};

/// A producer of a canonical Score.
pub trait ScoreSource {
    /// Short label for diagnostics.
    fn name(&self) -> &str;

    /// Decode into a Score, or fail for this attempt only.
    fn decode(&self) -> Result<Score>;
}

/// Uncompressed MusicXML text.
pub struct MusicXmlSource<'a> {
    pub xml: &'a str,
}

/// Compressed MusicXML (.mxl) bytes.
pub struct MxlSource<'a> {
    pub data: &'a [u8],
}

/// Generative-model response text, fenced or bare.
pub struct ModelJsonSource<'a> {
    pub text: &'a str,
}

impl ScoreSource for MusicXmlSource<'_> {
    fn name(&self) -> &str {
        "musicxml"
    }

    fn decode(&self) -> Result<Score> {
        parser::parse_musicxml(self.xml)
    }
}

impl ScoreSource for MxlSource<'_> {
    fn name(&self) -> &str {
        "mxl"
    }

    fn decode(&self) -> Result<Score> {
        mxl::parse_mxl(self.data)
    }
}

impl ScoreSource for ModelJsonSource<'_> {
    fn name(&self) -> &str {
        "model-json"
    }

    fn decode(&self) -> Result<Score> {
        model_json::parse_model_json(self.text)
    }
}

/// Try each source in order and return the first Score that decodes.
/// Fails with the last error when every source fails.
pub fn decode_first(sources: &[&dyn ScoreSource]) -> Result<Score> {
    let mut last_err = ScoreError::Format("no score sources given".to_string());
    for source in sources {
        match source.decode() {
            Ok(score) => {
                log::debug!("decoded score from {}", source.name());
                return Ok(score);
            }
            Err(e) => {
                log::warn!("{} source failed: {e}", source.name());
                last_err = e;
            }
        }
    }
    Err(last_err)
}
