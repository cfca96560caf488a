//! SJS sound player modules
//!
//! An SJS module is a 16-bit tick delay, a voice-activity byte, and a stream
//! of (semitone, sample, effect) triples, one per voice per step.

pub mod dump;
pub mod effect;
pub mod reader;

pub use effect::EffectKind;
pub use reader::SjsReader;

use std::collections::BTreeMap;

/// Number of voices in every SJS module
pub const VOICE_COUNT: usize = 4;

/// Scale factor for converting the module delay into BPM
const BPM_NUMERATOR: u32 = 14565 * 122;

/// One voice's event on one row
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourceEvent {
    /// Semitone code (0 = no note)
    pub semitone: u8,
    /// Sample number (0 = no sample)
    pub sample: u8,
    /// Effect code (0 = none)
    pub effect: u8,
}

/// Sparse row-indexed event timeline of one voice
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Voice {
    pub events: BTreeMap<u32, SourceEvent>,
}

impl Voice {
    /// Event at `row`, if the voice has one there
    pub fn get(&self, row: u32) -> Option<&SourceEvent> {
        self.events.get(&row)
    }

    /// Events in row order
    pub fn iter(&self) -> impl Iterator<Item = (u32, &SourceEvent)> {
        self.events.iter().map(|(&row, event)| (row, event))
    }

    /// Events with `start <= row < end`
    pub fn range(&self, start: u32, end: u32) -> impl Iterator<Item = (u32, &SourceEvent)> {
        self.events.range(start..end).map(|(&row, event)| (row, event))
    }
}

/// Decoded SJS module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SjsModule {
    /// Tick delay (little-endian in the file)
    pub delay: u16,
    /// Active voice mask (bit n = voice n)
    pub active: u8,
    pub voices: [Voice; VOICE_COUNT],
    /// Row count shared by all active voices
    pub row_count: u32,
}

impl SjsModule {
    /// Decode a module from raw bytes
    pub fn parse(data: &[u8]) -> crate::Result<Self> {
        SjsReader::new(data).parse()
    }

    /// Tempo in BPM, the same way SoundFX derives it; `None` for a zero delay
    pub fn bpm(&self) -> Option<u32> {
        BPM_NUMERATOR.checked_div(u32::from(self.delay))
    }

    pub fn is_active(&self, voice: usize) -> bool {
        self.active & (1 << voice) != 0
    }
}

/// Map an SJS semitone code (1-based) onto a 0-based chromatic note index
///
/// The SJS note range has no B-3, so codes below 4 sit one step lower.
pub fn semitone_to_note(semitone: u8) -> Option<u8> {
    match semitone {
        0 => None,
        1..=3 => Some(semitone - 1 + 8),
        _ => semitone.checked_add(8),
    }
}
