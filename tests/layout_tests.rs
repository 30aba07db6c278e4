//! Integration tests — lay out model-JSON scores and check positions.

use pretty_assertions::assert_eq;
use scorelens::renderer::{DrawCommand, NoteStyle, TextRole};
use scorelens::{
    layout, layout_with, parse_model_json, render_score_to_svg, validate, LayoutConfig, Score, ValidationWarning,
};

const CANVAS: f64 = 800.0;

fn score(measures_json: &str) -> Score {
    let text = format!(
        r#"{{"title": "Fixture", "timeSignature": "4/4", "keySignature": "C",
            "staves": [{{"clef": "treble", "measures": {measures_json}}}]}}"#
    );
    parse_model_json(&text).expect("fixture decodes")
}

fn texts(commands: &[DrawCommand], wanted: TextRole) -> Vec<(String, f64)> {
    commands
        .iter()
        .filter_map(|c| match c {
            DrawCommand::Text { x, text, role, .. } if *role == wanted => Some((text.clone(), *x)),
            _ => None,
        })
        .collect()
}

fn note_xs(commands: &[DrawCommand]) -> Vec<(String, f64, NoteStyle)> {
    commands
        .iter()
        .filter_map(|c| match c {
            DrawCommand::Note { x, key, style, .. } => Some((key.clone(), *x, *style)),
            _ => None,
        })
        .collect()
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn chords_sit_at_their_beats() {
    let s = score(r#"[{"notes": [], "chords": ["C", "Am"], "chordPositions": [0, 2]}]"#);
    let out = layout(&s, CANVAS);
    let m = &out.measures[0];

    let chords = texts(&out.commands, TextRole::Chord);
    assert_eq!(chords.len(), 2);
    assert!(close(chords[0].1, m.note_x));
    assert!(close(chords[1].1, m.note_x + 0.5 * m.note_width));
}

#[test]
fn start_x_hints_apportion_widths() {
    let s = score(
        r#"[{"notes": [{"pitch": "C4", "duration": "whole"}], "startX": 0.0},
            {"notes": [{"pitch": "D4", "duration": "whole"}], "startX": 0.5}]"#,
    );
    let config = LayoutConfig::default();
    let available = CANVAS - config.margin_left - config.margin_right;
    let out = layout_with(&s, CANVAS, &config);

    assert!(close(out.measures[0].width, 0.5 * available));
    assert!(close(out.measures[1].x, config.margin_left + 0.5 * available));
    // last measure in the row keeps the even width
    assert!(close(out.measures[1].width, available / 4.0));
}

#[test]
fn note_spacing_follows_beats_not_count() {
    let s = score(
        r#"[{"notes": [
                {"pitch": "C4", "duration": "half", "beat": 0},
                {"pitch": "E4", "duration": "quarter", "beat": 2},
                {"pitch": "G4", "duration": "quarter", "beat": 3}
            ]}]"#,
    );
    let out = layout(&s, CANVAS);
    let m = &out.measures[0];
    let notes = note_xs(&out.commands);

    assert_eq!(notes.len(), 3);
    assert!(close(notes[0].1, m.note_x));
    assert!(close(notes[1].1, m.note_x + 0.5 * m.note_width));
    assert!(close(notes[2].1, m.note_x + 0.75 * m.note_width));
}

#[test]
fn missing_beats_follow_the_running_cursor() {
    let s = score(
        r#"[{"notes": [
                {"pitch": "C4", "duration": "half", "beat": 0},
                {"pitch": "D4", "duration": "quarter"},
                {"pitch": "E4", "duration": "quarter"}
            ]}]"#,
    );
    let out = layout(&s, CANVAS);
    let m = &out.measures[0];
    let notes = note_xs(&out.commands);
    assert!(close(notes[1].1, m.note_x + 0.5 * m.note_width));
    assert!(close(notes[2].1, m.note_x + 0.75 * m.note_width));
}

#[test]
fn chord_symbol_as_pitch_becomes_a_placeholder() {
    let s = score(
        r#"[{"notes": [
                {"pitch": "C4", "duration": "quarter"},
                {"pitch": "Am7", "duration": "quarter"},
                {"pitch": "E4", "duration": "half"}
            ]}]"#,
    );
    let out = layout(&s, CANVAS);
    let notes = note_xs(&out.commands);

    assert_eq!(notes.len(), 3);
    assert_eq!(notes[1].0, "b/4");
    assert_eq!(notes[1].2, NoteStyle::Placeholder);
    assert_eq!(notes[2].0, "e/4");
    assert!(out.skipped.is_empty());
    // the placeholder still counts toward the beat total
    assert_eq!(out.measures[0].reconciled.as_ref().map(|r| r.measure_beats), Some(4.0));
}

#[test]
fn undrawable_octaves_become_placeholders() {
    let s = score(
        r#"[{"notes": [
                {"pitch": "C400000000", "duration": "quarter"},
                {"pitch": "C\u0664", "duration": "quarter"},
                {"pitch": "G4", "duration": "half"}
            ]}]"#,
    );
    let out = layout(&s, CANVAS);
    let notes = note_xs(&out.commands);

    assert_eq!(notes.len(), 3);
    assert_eq!(notes[0].2, NoteStyle::Placeholder);
    assert_eq!(notes[1].2, NoteStyle::Placeholder);
    assert_eq!(notes[2], ("g/4".to_string(), notes[2].1, NoteStyle::Normal));

    // the non-ASCII octave is not a pitch at all
    assert_eq!(
        validate(&s),
        vec![ValidationWarning::InvalidPitch { staff: 0, measure: 0, note: 1, pitch: "C\u{664}".into() }]
    );
}

#[test]
fn under_full_measure_is_padded_invisibly() {
    let s = score(r#"[{"notes": [{"pitch": "C4", "duration": "quarter"}, {"pitch": "D4", "duration": "eighth"}]}]"#);
    let out = layout(&s, CANVAS);
    let r = out.measures[0].reconciled.as_ref().unwrap();
    assert_eq!(r.voice_beats, 2);
    assert!(close(r.padded_beats(), 2.0));

    let notes = note_xs(&out.commands);
    // 1.5 beats in a 2-beat voice: one eighth rest pads it
    assert_eq!(notes.len(), 3);
    assert_eq!(notes[2].2, NoteStyle::Invisible);
}

#[test]
fn over_full_measure_stays_inside_its_box() {
    let s = score(
        r#"[{"notes": [
                {"pitch": "C4", "duration": "whole", "beat": 0},
                {"pitch": "D4", "duration": "half", "beat": 4}
            ]}]"#,
    );
    let out = layout(&s, CANVAS);
    let m = &out.measures[0];
    let notes = note_xs(&out.commands);
    assert!(notes.iter().all(|n| n.1 < m.x + m.width));

    // a stray beat far past the meter, plus a chord position past it
    let s = score(
        r#"[{"notes": [
                {"pitch": "C4", "duration": "quarter", "beat": 0},
                {"pitch": "D4", "duration": "quarter", "beat": 9}
            ],
            "chords": ["G"], "chordPositions": [30]},
           {"notes": [{"pitch": "E4", "duration": "whole"}]}]"#,
    );
    let out = layout(&s, CANVAS);
    let (first, second) = (&out.measures[0], &out.measures[1]);
    let notes = note_xs(&out.commands);
    assert!(close(notes[1].1, first.note_x + 0.9 * first.note_width));
    assert!(notes[1].1 < second.x);
    let chords = texts(&out.commands, TextRole::Chord);
    assert!(chords[0].1 < second.x);
}

#[test]
fn lyrics_without_positions_spread_evenly() {
    let s = score(r#"[{"notes": [], "lyrics": ["a", "b"]}]"#);
    let out = layout(&s, CANVAS);
    let m = &out.measures[0];
    let lyrics = texts(&out.commands, TextRole::Lyric);
    assert!(close(lyrics[0].1, m.note_x));
    assert!(close(lyrics[1].1, m.note_x + 0.5 * m.note_width));
}

#[test]
fn svg_is_produced_for_a_json_score() {
    let s = score(r#"[{"notes": [{"pitch": "C4", "duration": "whole"}], "chords": ["C"], "chordPositions": [0]}]"#);
    let svg = render_score_to_svg(&s, None);
    assert!(svg.contains("Fixture"));
    assert!(svg.contains(">C</text>"));
}
