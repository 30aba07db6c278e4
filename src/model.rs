//! Canonical score model shared by every producer and by the layout path.
//!
//! A `Score` is built once per recognition pass (from an interchange
//! document or from generative-model JSON) and is read-only afterwards.
//! Field names serialize in camelCase so the same shape round-trips
//! through the model JSON contract.

use serde::{Deserialize, Deserializer, Serialize};

use crate::codec;

/// Title used when the source carries none.
pub const DEFAULT_TITLE: &str = "Untitled";

/// A complete recognized score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Score {
    /// Title of the piece
    #[serde(default = "default_title")]
    pub title: String,
    /// Composer name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub composer: Option<String>,
    /// Global time signature, "N/D"
    pub time_signature: String,
    /// Global key name, e.g. "D", "Bm", "Eb"
    pub key_signature: String,
    /// Staves in top-to-bottom order
    #[serde(default)]
    pub staves: Vec<Staff>,
}

/// One staff and its measures in performance order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Staff {
    #[serde(default)]
    pub clef: Clef,
    #[serde(default)]
    pub measures: Vec<Measure>,
}

/// One bar. Chord and lyric arrays are parallel-indexed with their
/// beat-position arrays.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Measure {
    #[serde(default)]
    pub notes: Vec<Note>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub chords: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lyrics: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub chord_positions: Vec<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lyric_positions: Vec<f64>,
    /// Horizontal position of the measure in the source image, 0..=1
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_x: Option<f64>,
}

/// A single note or rest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    /// Scientific pitch ("C#4"); empty for rests
    #[serde(default, deserialize_with = "null_as_empty")]
    pub pitch: String,
    #[serde(default)]
    pub duration: Duration,
    #[serde(default)]
    pub rest: bool,
    /// Offset within the measure in quarter-note units
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beat: Option<f64>,
}

/// Notated duration. Unknown names decode as `quarter`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Duration {
    Whole,
    Half,
    #[default]
    Quarter,
    Eighth,
    Sixteenth,
}

/// Staff clef. Unrecognized signs decode as `treble`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Clef {
    #[default]
    Treble,
    Bass,
    Alto,
}

/// A parsed "N/D" time signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSignature {
    /// Numerator (beats per measure)
    pub beats: u32,
    /// Denominator (beat unit)
    pub beat_type: u32,
}

// ─── Key names ───────────────────────────────────────────────────────

/// Major key names indexed by `fifths + 7`.
pub const MAJOR_KEYS: [&str; 15] = [
    "Cb", "Gb", "Db", "Ab", "Eb", "Bb", "F", "C", "G", "D", "A", "E", "B", "F#", "C#",
];

/// Minor key names indexed by `fifths + 7`.
pub const MINOR_KEYS: [&str; 15] = [
    "Abm", "Ebm", "Bbm", "Fm", "Cm", "Gm", "Dm", "Am", "Em", "Bm", "F#m", "C#m", "G#m", "D#m",
    "A#m",
];

/// Map a fifths count and mode to a key name.
/// Out-of-range fifths fall back to C major / A minor.
pub fn key_from_fifths(fifths: i32, mode: Option<&str>) -> &'static str {
    let minor = mode.map(|m| m.trim().eq_ignore_ascii_case("minor")).unwrap_or(false);
    let table = if minor { &MINOR_KEYS } else { &MAJOR_KEYS };
    if (-7..=7).contains(&fifths) {
        table[(fifths + 7) as usize]
    } else if minor {
        "Am"
    } else {
        "C"
    }
}

/// Signed accidental count for a key name, `None` if the name is unknown.
pub fn key_signature_fifths(name: &str) -> Option<i32> {
    MAJOR_KEYS
        .iter()
        .position(|k| *k == name)
        .or_else(|| MINOR_KEYS.iter().position(|k| *k == name))
        .map(|idx| idx as i32 - 7)
}

// ─── Impls ───────────────────────────────────────────────────────────

impl Score {
    /// Create an empty score with default metadata.
    pub fn new() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            composer: None,
            time_signature: "4/4".to_string(),
            key_signature: "C".to_string(),
            staves: Vec::new(),
        }
    }

    /// Number of measures in the longest staff.
    pub fn measure_count(&self) -> usize {
        self.staves.iter().map(|s| s.measures.len()).max().unwrap_or(0)
    }

    /// The time signature, or 4/4 if the string is malformed.
    pub fn time(&self) -> TimeSignature {
        TimeSignature::parse(&self.time_signature).unwrap_or_default()
    }

    /// Declared beats per measure (the time-signature numerator).
    pub fn num_beats(&self) -> u32 {
        self.time().beats
    }
}

impl Default for Score {
    fn default() -> Self {
        Self::new()
    }
}

impl Staff {
    pub fn new(clef: Clef) -> Self {
        Self { clef, measures: Vec::new() }
    }
}

impl Note {
    /// A pitched note.
    pub fn pitched(pitch: impl Into<String>, duration: Duration) -> Self {
        Self { pitch: pitch.into(), duration, rest: false, beat: None }
    }

    /// A rest.
    pub fn rest(duration: Duration) -> Self {
        Self { pitch: String::new(), duration, rest: true, beat: None }
    }

    pub fn at_beat(mut self, beat: f64) -> Self {
        self.beat = Some(beat);
        self
    }

    /// True when this is a rest or the pitch matches scientific notation.
    pub fn has_valid_pitch(&self) -> bool {
        self.rest || codec::is_valid_pitch(&self.pitch)
    }
}

impl Duration {
    /// Largest first; the padding order for under-full voices.
    pub const DESCENDING: [Duration; 5] = [
        Duration::Whole,
        Duration::Half,
        Duration::Quarter,
        Duration::Eighth,
        Duration::Sixteenth,
    ];

    /// Length in quarter-note beats.
    pub fn beats(self) -> f64 {
        match self {
            Duration::Whole => 4.0,
            Duration::Half => 2.0,
            Duration::Quarter => 1.0,
            Duration::Eighth => 0.5,
            Duration::Sixteenth => 0.25,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Duration::Whole => "whole",
            Duration::Half => "half",
            Duration::Quarter => "quarter",
            Duration::Eighth => "eighth",
            Duration::Sixteenth => "sixteenth",
        }
    }

    /// Parse a duration name; accepts the interchange spelling "16th".
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "whole" => Some(Duration::Whole),
            "half" => Some(Duration::Half),
            "quarter" => Some(Duration::Quarter),
            "eighth" => Some(Duration::Eighth),
            "sixteenth" | "16th" => Some(Duration::Sixteenth),
            _ => None,
        }
    }

    /// Largest duration whose beat weight fits in `beats`.
    pub fn from_beats(beats: f64) -> Self {
        if beats >= 4.0 {
            Duration::Whole
        } else if beats >= 2.0 {
            Duration::Half
        } else if beats >= 1.0 {
            Duration::Quarter
        } else if beats >= 0.5 {
            Duration::Eighth
        } else {
            Duration::Sixteenth
        }
    }
}

impl From<String> for Duration {
    fn from(name: String) -> Self {
        Duration::from_name(&name).unwrap_or_else(|| {
            log::warn!("unknown duration '{name}', using quarter");
            Duration::Quarter
        })
    }
}

impl Clef {
    pub fn name(self) -> &'static str {
        match self {
            Clef::Treble => "treble",
            Clef::Bass => "bass",
            Clef::Alto => "alto",
        }
    }
}

impl From<String> for Clef {
    fn from(name: String) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "bass" | "f" => Clef::Bass,
            "alto" | "c" => Clef::Alto,
            _ => Clef::Treble,
        }
    }
}

impl TimeSignature {
    /// Parse "N/D" with positive integers on both sides.
    pub fn parse(s: &str) -> Option<Self> {
        let (n, d) = s.trim().split_once('/')?;
        let beats: u32 = n.trim().parse().ok()?;
        let beat_type: u32 = d.trim().parse().ok()?;
        if beats == 0 || beat_type == 0 {
            return None;
        }
        Some(Self { beats, beat_type })
    }
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self { beats: 4, beat_type: 4 }
    }
}

impl std::fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.beats, self.beat_type)
    }
}

fn default_title() -> String {
    DEFAULT_TITLE.to_string()
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
