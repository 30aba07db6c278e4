//! Decoder for generative-model output: a JSON score, possibly wrapped in
//! a Markdown code fence or surrounded by prose.
//!
//! The same shape comes back from the correction pass, which additionally
//! fills `beat`, `chordPositions` and `lyricPositions`.

use serde_json::Value;

use crate::error::{Result, ScoreError};
use crate::model::Score;

/// Fields every model response must carry.
const REQUIRED_FIELDS: [&str; 4] = ["title", "timeSignature", "keySignature", "staves"];

/// Locate the JSON payload in a model response.
///
/// A fenced block (```` ```json ```` or bare ```` ``` ````) wins; otherwise the
/// span from the first `{` to the last `}`; otherwise the trimmed text.
pub fn extract_json_block(text: &str) -> &str {
    if let Some(body) = fenced_block(text, "```json").or_else(|| fenced_block(text, "```")) {
        return body;
    }
    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => text.trim(),
    }
}

fn fenced_block<'a>(text: &'a str, opener: &str) -> Option<&'a str> {
    let start = text.find(opener)? + opener.len();
    let rest = &text[start..];
    let end = rest.find("```")?;
    Some(rest[..end].trim())
}

/// Decode a model response into a Score.
///
/// Missing, null, or empty required fields are a `Structure` error; a
/// payload that is not JSON at all is a `Json` error.
pub fn parse_model_json(text: &str) -> Result<Score> {
    let value: Value = serde_json::from_str(extract_json_block(text))?;
    let object = value
        .as_object()
        .ok_or_else(|| ScoreError::Structure("top-level value is not an object".to_string()))?;

    for field in REQUIRED_FIELDS {
        let present = match object.get(field) {
            None | Some(Value::Null) => false,
            Some(Value::String(s)) => !s.trim().is_empty(),
            Some(_) => true,
        };
        if !present {
            return Err(ScoreError::Structure(format!("missing required field '{field}'")));
        }
    }

    let score: Score = serde_json::from_value(value)?;
    log::debug!(
        "decoded model JSON '{}': {} staves, {} measures",
        score.title,
        score.staves.len(),
        score.measure_count()
    );
    Ok(score)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fenced_json_is_unwrapped() {
        let text = "Here you go:\n```json\n{\"a\": 1}\n```\nThanks";
        assert_eq!(extract_json_block(text), "{\"a\": 1}");
        let text = "```\n{\"a\": 2}\n```";
        assert_eq!(extract_json_block(text), "{\"a\": 2}");
    }

    #[test]
    fn outermost_braces_without_fence() {
        let text = "result: {\"a\": {\"b\": 1}} done";
        assert_eq!(extract_json_block(text), "{\"a\": {\"b\": 1}}");
    }

    #[test]
    fn missing_field_is_a_structure_error() {
        let err = parse_model_json(r#"{"title": "T", "timeSignature": "4/4", "staves": []}"#)
            .unwrap_err();
        assert!(matches!(err, ScoreError::Structure(ref m) if m.contains("keySignature")));

        let err = parse_model_json(r#"{"title": "", "timeSignature": "4/4", "keySignature": "C", "staves": []}"#)
            .unwrap_err();
        assert!(matches!(err, ScoreError::Structure(_)));
    }

    #[test]
    fn garbage_is_a_json_error() {
        assert!(matches!(parse_model_json("no score here"), Err(ScoreError::Json(_))));
    }
}
