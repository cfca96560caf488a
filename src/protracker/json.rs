//! JSON serialization types for MOD data

use super::module::{Module, Note, Pattern, Sample};
use super::period::note_name;
use serde::Serialize;

/// Top-level JSON structure for a MOD file
#[derive(Debug, Clone, Serialize)]
pub struct ModJson {
    pub title: String,
    /// Format tag ("M.K." or "M!K!")
    pub tag: String,
    pub repeat_index: u8,
    /// Pattern indices in play order
    pub pattern_table: Vec<u8>,
    /// Populated sample slots
    pub samples: Vec<SampleJson>,
    pub patterns: Vec<PatternJson>,
}

/// JSON representation of a sample slot
#[derive(Debug, Clone, Serialize)]
pub struct SampleJson {
    /// 1-based slot number, as referenced by notes
    pub slot: usize,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    pub length: usize,
    #[serde(skip_serializing_if = "is_zero_i8")]
    pub fine_tune: i8,
    pub volume: u8,
    #[serde(skip_serializing_if = "is_zero")]
    pub repeat_offset: u32,
    #[serde(skip_serializing_if = "is_zero")]
    pub repeat_length: u32,
}

/// JSON representation of a pattern; empty cells are omitted
#[derive(Debug, Clone, Serialize)]
pub struct PatternJson {
    pub index: usize,
    pub cells: Vec<CellJson>,
}

/// JSON representation of one non-empty cell
#[derive(Debug, Clone, Serialize)]
pub struct CellJson {
    pub row: usize,
    pub channel: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<u16>,
    #[serde(skip_serializing_if = "is_zero_u8")]
    pub sample: u8,
    /// Effect as three hex digits
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effect: Option<String>,
}

fn is_zero(v: &u32) -> bool {
    *v == 0
}

fn is_zero_u8(v: &u8) -> bool {
    *v == 0
}

fn is_zero_i8(v: &i8) -> bool {
    *v == 0
}

impl ModJson {
    pub fn new(module: &Module) -> Self {
        Self {
            title: module.title().to_string(),
            tag: String::from_utf8_lossy(module.tag()).into_owned(),
            repeat_index: module.repeat_index(),
            pattern_table: module.pattern_table().to_vec(),
            samples: module
                .samples
                .iter()
                .enumerate()
                .filter_map(|(i, s)| s.as_ref().map(|s| SampleJson::new(i + 1, s)))
                .collect(),
            patterns: module
                .patterns
                .iter()
                .enumerate()
                .map(|(i, p)| PatternJson::new(i, p))
                .collect(),
        }
    }
}

impl SampleJson {
    fn new(slot: usize, sample: &Sample) -> Self {
        Self {
            slot,
            name: sample.name().to_string(),
            length: sample.data().len(),
            fine_tune: sample.fine_tune(),
            volume: sample.volume(),
            repeat_offset: sample.repeat_offset(),
            repeat_length: sample.repeat_length(),
        }
    }
}

impl PatternJson {
    fn new(index: usize, pattern: &Pattern) -> Self {
        let cells = pattern
            .rows
            .iter()
            .enumerate()
            .flat_map(|(row, notes)| {
                notes
                    .iter()
                    .enumerate()
                    .filter(|(_, n)| !n.is_empty())
                    .map(move |(channel, n)| CellJson::new(row, channel, n))
            })
            .collect();
        Self { index, cells }
    }
}

impl CellJson {
    fn new(row: usize, channel: usize, note: &Note) -> Self {
        Self {
            row,
            channel,
            note: note.note().and_then(note_name),
            period: note.note().map(|_| note.period()),
            sample: note.sample(),
            effect: match note.effect() {
                0 => None,
                e => Some(format!("{:03X}", e)),
            },
        }
    }
}
