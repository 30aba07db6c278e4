//! MusicXML parser — converts a MusicXML document into the canonical Score.
//!
//! Time and key signature are taken from the first measure of the first
//! part and applied to the whole score. Beat offsets come from an explicit
//! cursor threaded through each measure, so a measure parses the same way
//! in isolation as it does inside a full document.

use std::collections::HashMap;

use roxmltree::{Document, Node};

use crate::error::{Result, ScoreError};
use crate::model::*;

/// Parse a MusicXML string (partwise or timewise) into a Score.
pub fn parse_musicxml(xml: &str) -> Result<Score> {
    // MusicXML files include a DOCTYPE declaration, so we must allow DTDs
    let options = roxmltree::ParsingOptions {
        allow_dtd: true,
        ..Default::default()
    };
    let doc = Document::parse_with_options(xml, options)
        .map_err(|e| ScoreError::Format(format!("XML parse error: {e}")))?;
    let root = doc.root_element();

    let parts = match root.tag_name().name() {
        "score-partwise" => partwise_parts(&root),
        "score-timewise" => timewise_parts(&root),
        other => {
            return Err(ScoreError::Format(format!(
                "Unsupported root element: '{other}'. Expected 'score-partwise' or 'score-timewise'."
            )))
        }
    };

    if child(&root, "part-list").is_none() {
        log::warn!("MusicXML document has no <part-list>");
    }
    if parts.iter().all(|p| p.measures.is_empty()) {
        return Err(ScoreError::Format("MusicXML document has no measures".to_string()));
    }

    let mut score = Score::new();
    score.title = parse_title(&root);
    score.composer = parse_composer(&root);

    // Global signatures come from the first measure of the first part only
    let first_attrs = parts
        .first()
        .and_then(|p| p.measures.first())
        .map(|m| MeasureAttributes::collect(m))
        .unwrap_or_default();
    score.time_signature = first_attrs.time.unwrap_or_default().to_string();
    score.key_signature =
        key_from_fifths(first_attrs.fifths.unwrap_or(0), first_attrs.mode.as_deref()).to_string();

    for part in &parts {
        score.staves.push(parse_part(part));
    }

    log::debug!(
        "parsed MusicXML '{}': {} staves, {} measures, {} in {}",
        score.title,
        score.staves.len(),
        score.measure_count(),
        score.time_signature,
        score.key_signature
    );

    Ok(score)
}

// ─── Document shape ──────────────────────────────────────────────────

/// The measure nodes belonging to one part, regardless of document layout.
struct PartNodes<'a, 'input> {
    id: String,
    measures: Vec<Node<'a, 'input>>,
}

fn partwise_parts<'a, 'input>(root: &Node<'a, 'input>) -> Vec<PartNodes<'a, 'input>> {
    children(root, "part")
        .map(|part| PartNodes {
            id: part.attribute("id").unwrap_or("").to_string(),
            measures: children(&part, "measure").collect(),
        })
        .collect()
}

/// Timewise documents nest parts inside measures; regroup them per part in
/// order of first appearance.
fn timewise_parts<'a, 'input>(root: &Node<'a, 'input>) -> Vec<PartNodes<'a, 'input>> {
    let mut parts: Vec<PartNodes<'a, 'input>> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for measure in children(root, "measure") {
        for part in children(&measure, "part") {
            let id = part.attribute("id").unwrap_or("").to_string();
            let slot = *index.entry(id.clone()).or_insert_with(|| {
                parts.push(PartNodes { id, measures: Vec::new() });
                parts.len() - 1
            });
            parts[slot].measures.push(part);
        }
    }

    parts
}

// ─── Header ──────────────────────────────────────────────────────────

fn parse_title(root: &Node) -> String {
    child(root, "work")
        .and_then(|work| child_text(&work, "work-title"))
        .or_else(|| child_text(root, "movement-title"))
        .unwrap_or_else(|| DEFAULT_TITLE.to_string())
}

fn parse_composer(root: &Node) -> Option<String> {
    let identification = child(root, "identification")?;
    children(&identification, "creator")
        .find(|c| c.attribute("type") == Some("composer"))
        .and_then(|c| c.text())
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

// ─── Attributes ──────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct MeasureAttributes {
    divisions: Option<f64>,
    time: Option<TimeSignature>,
    fifths: Option<i32>,
    mode: Option<String>,
    clef_sign: Option<String>,
}

impl MeasureAttributes {
    /// Gather every `<attributes>` block in a measure; later blocks win.
    fn collect(measure: &Node) -> Self {
        let mut attrs = Self::default();
        for block in children(measure, "attributes") {
            for c in block.children().filter(|n| n.is_element()) {
                match c.tag_name().name() {
                    "divisions" => attrs.divisions = parse_f64(&c).filter(|d| *d > 0.0),
                    "time" => attrs.time = parse_time(&c),
                    "key" => {
                        attrs.fifths = child(&c, "fifths").and_then(|f| parse_i32(&f));
                        attrs.mode = child_text(&c, "mode");
                    }
                    "clef" => {
                        // First clef only; grand staves are flattened to one staff
                        if attrs.clef_sign.is_none() {
                            attrs.clef_sign = child_text(&c, "sign");
                        }
                    }
                    _ => {}
                }
            }
        }
        attrs
    }
}

fn parse_time(node: &Node) -> Option<TimeSignature> {
    let beats = child(node, "beats").and_then(|b| parse_i32(&b))?;
    let beat_type = child(node, "beat-type").and_then(|b| parse_i32(&b))?;
    if beats <= 0 || beat_type <= 0 {
        return None;
    }
    Some(TimeSignature { beats: beats as u32, beat_type: beat_type as u32 })
}

/// `G` is treble; every other sign is read as bass.
fn clef_from_sign(sign: Option<&str>) -> Clef {
    match sign.map(str::trim) {
        None => Clef::Treble,
        Some(s) if s.eq_ignore_ascii_case("G") => Clef::Treble,
        Some(_) => Clef::Bass,
    }
}

// ─── Part ────────────────────────────────────────────────────────────

fn parse_part(part: &PartNodes) -> Staff {
    let clef_sign = part
        .measures
        .first()
        .and_then(|m| MeasureAttributes::collect(m).clef_sign);
    let mut staff = Staff::new(clef_from_sign(clef_sign.as_deref()));

    let mut divisions = 1.0;
    for measure in &part.measures {
        if let Some(d) = MeasureAttributes::collect(measure).divisions {
            divisions = d;
        }
        staff.measures.push(parse_measure(measure, divisions));
    }

    log::debug!("part '{}': {} measures", part.id, staff.measures.len());
    staff
}

// ─── Measure ─────────────────────────────────────────────────────────

/// Running position inside one measure, in quarter-note beats.
#[derive(Debug, Default)]
struct BeatCursor {
    /// Stream position, moved by notes, `<backup>` and `<forward>`
    position: f64,
    /// Start of the last non-chord note, where `<chord/>` notes land
    last_onset: f64,
    /// The voice whose notes are emitted
    primary_voice: Option<String>,
    /// Beat of the latest emitted note; emitted beats never go below it
    last_emitted: f64,
}

impl BeatCursor {
    fn advance(&mut self, beats: f64) {
        self.position += beats;
    }

    fn rewind(&mut self, beats: f64) {
        self.position = (self.position - beats).max(0.0);
    }
}

/// Parse one `<measure>` with `divisions` ticks per quarter note.
pub(crate) fn parse_measure(node: &Node, divisions: f64) -> Measure {
    let divisions = if divisions > 0.0 { divisions } else { 1.0 };
    let mut cursor = BeatCursor::default();
    let mut measure = Measure::default();

    for c in node.children().filter(|n| n.is_element()) {
        match c.tag_name().name() {
            "note" => parse_note(&c, divisions, &mut cursor, &mut measure),
            "backup" => {
                let ticks = child(&c, "duration").and_then(|d| parse_f64(&d)).unwrap_or(0.0);
                cursor.rewind(ticks / divisions);
            }
            "forward" => {
                let ticks = child(&c, "duration").and_then(|d| parse_f64(&d)).unwrap_or(0.0);
                cursor.advance(ticks / divisions);
            }
            "harmony" => {
                let offset = child(&c, "offset")
                    .and_then(|o| parse_f64(&o))
                    .map_or(0.0, |ticks| ticks / divisions);
                if let Some(symbol) = parse_harmony(&c) {
                    measure.chords.push(symbol);
                    measure.chord_positions.push((cursor.position + offset).max(0.0));
                }
            }
            _ => {}
        }
    }

    measure
}

fn parse_note(node: &Node, divisions: f64, cursor: &mut BeatCursor, measure: &mut Measure) {
    if child(node, "grace").is_some() {
        log::debug!("skipping grace note");
        return;
    }

    let is_chord = child(node, "chord").is_some();
    let ticks = child(node, "duration").and_then(|d| parse_f64(&d)).unwrap_or(0.0);
    let span = ticks / divisions;

    let voice = child_text(node, "voice").unwrap_or_else(|| "1".to_string());
    let primary = cursor.primary_voice.get_or_insert_with(|| voice.clone());
    let emit = *primary == voice;

    let beat = if is_chord { cursor.last_onset } else { cursor.position };
    if !is_chord {
        cursor.last_onset = cursor.position;
        cursor.advance(span);
    }
    if !emit {
        return;
    }
    if beat + 1e-9 < cursor.last_emitted {
        log::debug!(
            "voice {voice}: note at beat {beat} rewinds past beat {}; dropping it",
            cursor.last_emitted
        );
        return;
    }
    cursor.last_emitted = beat;

    let duration = child_text(node, "type")
        .and_then(|t| Duration::from_name(&t))
        .unwrap_or_else(|| Duration::from_beats(span));

    let pitch = child(node, "pitch");
    let note = match pitch {
        Some(p) if child(node, "rest").is_none() => Note::pitched(parse_pitch(&p), duration),
        _ => Note::rest(duration),
    };
    measure.notes.push(note.at_beat(beat));

    for lyric in children(node, "lyric") {
        if let Some(text) = child_text(&lyric, "text") {
            measure.lyrics.push(text);
            measure.lyric_positions.push(beat);
        }
    }
}

/// Scientific pitch string from step + alter + octave.
fn parse_pitch(node: &Node) -> String {
    let step = child_text(node, "step").unwrap_or_else(|| "C".to_string());
    let octave = child(node, "octave").and_then(|o| parse_i32(&o)).unwrap_or(4);
    let alter = child(node, "alter").and_then(|a| parse_f64(&a)).unwrap_or(0.0);
    format!("{step}{}{octave}", accidental(alter))
}

fn accidental(alter: f64) -> &'static str {
    if alter > 0.0 {
        "#"
    } else if alter < 0.0 {
        "b"
    } else {
        ""
    }
}

// ─── Harmony ─────────────────────────────────────────────────────────

/// Chord symbol text: root + accidental + kind suffix (+ "/bass").
fn parse_harmony(node: &Node) -> Option<String> {
    let kind_node = child(node, "kind");
    let kind = kind_node.as_ref().and_then(|k| k.text()).map(str::trim).unwrap_or("major");
    if kind == "none" {
        return Some("N.C.".to_string());
    }

    let root = child(node, "root")?;
    let step = child_text(&root, "root-step")?;
    let alter = child(&root, "root-alter").and_then(|a| parse_f64(&a)).unwrap_or(0.0);

    let suffix = kind_node
        .as_ref()
        .and_then(|k| k.attribute("text"))
        .map(str::to_string)
        .unwrap_or_else(|| kind_suffix(kind).to_string());

    let mut symbol = format!("{step}{}{suffix}", accidental(alter));

    if let Some(bass) = child(node, "bass") {
        if let Some(bass_step) = child_text(&bass, "bass-step") {
            let bass_alter = child(&bass, "bass-alter").and_then(|a| parse_f64(&a)).unwrap_or(0.0);
            symbol.push('/');
            symbol.push_str(&bass_step);
            symbol.push_str(accidental(bass_alter));
        }
    }

    Some(symbol)
}

/// Conventional chord-symbol suffix for a MusicXML `<kind>` value.
/// Unknown kinds pass through verbatim.
fn kind_suffix(kind: &str) -> &str {
    match kind {
        "major" | "" => "",
        "minor" => "m",
        "augmented" => "aug",
        "diminished" => "dim",
        "dominant" => "7",
        "major-seventh" => "maj7",
        "minor-seventh" => "m7",
        "diminished-seventh" => "dim7",
        "augmented-seventh" => "aug7",
        "half-diminished" => "m7b5",
        "major-minor" => "m(maj7)",
        "major-sixth" => "6",
        "minor-sixth" => "m6",
        "dominant-ninth" => "9",
        "major-ninth" => "maj9",
        "minor-ninth" => "m9",
        "dominant-11th" => "11",
        "major-11th" => "maj11",
        "minor-11th" => "m11",
        "dominant-13th" => "13",
        "major-13th" => "maj13",
        "minor-13th" => "m13",
        "suspended-second" => "sus2",
        "suspended-fourth" => "sus4",
        "power" => "5",
        other => other,
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────

fn children<'a, 'input: 'a>(
    node: &Node<'a, 'input>,
    name: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    node.children()
        .filter(move |n| n.is_element() && n.tag_name().name() == name)
}

fn child<'a, 'input>(node: &Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|n| n.is_element() && n.tag_name().name() == name)
}

/// Trimmed, non-empty text of a named child.
fn child_text(node: &Node, name: &str) -> Option<String> {
    child(node, name)
        .and_then(|c| c.text().map(|t| t.trim().to_string()))
        .filter(|t| !t.is_empty())
}

fn parse_i32(node: &Node) -> Option<i32> {
    node.text()?.trim().parse().ok()
}

fn parse_f64(node: &Node) -> Option<f64> {
    node.text()?.trim().parse().ok()
}
