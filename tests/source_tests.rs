//! Integration tests — model JSON decoding, source fallback, validation.

use pretty_assertions::assert_eq;
use scorelens::source::{ModelJsonSource, MusicXmlSource, MxlSource};
use scorelens::{
    decode_first, parse_model_json, score_to_json, validate, Clef, Duration, ScoreError, ScoreSource,
    ValidationWarning,
};

const MODEL_REPLY: &str = r#"Here is the transcription:

```json
{
  "title": "Lullaby",
  "composer": null,
  "timeSignature": "3/4",
  "keySignature": "F",
  "staves": [
    {
      "clef": "bass",
      "measures": [
        {
          "notes": [
            {"pitch": "F3", "duration": "half", "beat": 0},
            {"pitch": null, "duration": "quarter", "rest": true, "beat": 2}
          ],
          "chords": ["F"],
          "chordPositions": [0],
          "lyrics": ["sleep"],
          "lyricPositions": [0],
          "startX": 0.05
        }
      ]
    }
  ]
}
```
Let me know if you need anything else."#;

#[test]
fn fenced_model_reply_decodes() {
    let score = parse_model_json(MODEL_REPLY).unwrap();
    assert_eq!(score.title, "Lullaby");
    assert_eq!(score.composer, None);
    assert_eq!(score.num_beats(), 3);
    assert_eq!(score.staves[0].clef, Clef::Bass);

    let m = &score.staves[0].measures[0];
    assert_eq!(m.notes[1].pitch, "");
    assert!(m.notes[1].rest);
    assert_eq!(m.start_x, Some(0.05));
    assert_eq!(validate(&score), vec![]);
}

#[test]
fn lenient_field_values() {
    let score = parse_model_json(
        r#"{"title": "T", "timeSignature": "4/4", "keySignature": "C",
            "staves": [{"clef": "alto", "measures": [{"notes": [{"pitch": "G4", "duration": "dotted"}]}]}]}"#,
    )
    .unwrap();
    assert_eq!(score.staves[0].clef, Clef::Alto);
    assert_eq!(score.staves[0].measures[0].notes[0].duration, Duration::Quarter);
}

#[test]
fn json_round_trip_keeps_camel_case() {
    let score = parse_model_json(MODEL_REPLY).unwrap();
    let json = score_to_json(&score).unwrap();
    assert!(json.contains("\"timeSignature\": \"3/4\""));
    assert!(json.contains("\"chordPositions\""));
    assert_eq!(parse_model_json(&json).unwrap(), score);
}

#[test]
fn first_decodable_source_wins() {
    let broken_mxl = MxlSource { data: b"PK?" };
    let broken_xml = MusicXmlSource { xml: "<score-partwise>" };
    let model = ModelJsonSource { text: MODEL_REPLY };

    let sources: [&dyn ScoreSource; 3] = [&broken_mxl, &broken_xml, &model];
    assert_eq!(decode_first(&sources).unwrap().title, "Lullaby");
}

#[test]
fn all_sources_failing_returns_the_last_error() {
    let broken_xml = MusicXmlSource { xml: "<opus/>" };
    let model = ModelJsonSource { text: r#"{"title": "T"}"# };

    let sources: [&dyn ScoreSource; 2] = [&broken_xml, &model];
    assert!(matches!(decode_first(&sources), Err(ScoreError::Structure(_))));
    assert!(decode_first(&[]).is_err());
}

#[test]
fn validation_flags_model_mistakes() {
    let score = parse_model_json(
        r#"{"title": "T", "timeSignature": "four", "keySignature": "C",
            "staves": [{"measures": [{"notes": [{"pitch": "Cmaj", "duration": "quarter"}],
                                      "chords": ["C"]}]}]}"#,
    )
    .unwrap();

    let warnings = validate(&score);
    assert_eq!(
        warnings,
        vec![
            ValidationWarning::BadTimeSignature("four".into()),
            ValidationWarning::ChordPositionMismatch { staff: 0, measure: 0, chords: 1, positions: 0 },
            ValidationWarning::InvalidPitch { staff: 0, measure: 0, note: 0, pitch: "Cmaj".into() },
        ]
    );
    assert_eq!(validate(&score), warnings);
}
