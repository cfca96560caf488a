//! SJS effect vocabulary and its Protracker translation

use super::SourceEvent;
use crate::error::{Error, Result};

/// Classification of an SJS effect byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectKind {
    /// Does nothing
    NoOp,
    /// Translates to a fixed Protracker effect
    Fixed(u16),
    /// Persistent voice volume (code - 0x03)
    SetVolume,
    /// Stop voice DMA, cutting the previous note
    Cut,
    /// Reserve `code - 0x57` extra rows on the voice
    RowDelay,
    /// Repeat the voice from the start; ends the voice's stream
    Loop,
    /// Not understood well enough to translate
    Unknown,
}

/// An inclusive range of effect codes sharing one classification
#[derive(Debug, Clone, Copy)]
pub struct EffectRange {
    pub first: u8,
    pub last: u8,
    pub kind: EffectKind,
}

const fn range(first: u8, last: u8, kind: EffectKind) -> EffectRange {
    EffectRange { first, last, kind }
}

/// Protracker "set filter off"
pub const PT_FILTER_OFF: u16 = 0xE01;
/// Protracker "set filter on"
pub const PT_FILTER_ON: u16 = 0xE00;
/// Protracker "set volume 0"
pub const PT_CUT: u16 = 0xC00;
/// Protracker "position jump 0"
pub const PT_JUMP_START: u16 = 0xB00;

/// Voice volume assumed before any 0x03..=0x42 effect
pub const DEFAULT_VOICE_VOLUME: u8 = 63;

/// Ordered, gap-free cover of every effect byte; first match wins
pub const EFFECT_TABLE: &[EffectRange] = &[
    range(0x00, 0x00, EffectKind::NoOp),
    range(0x01, 0x01, EffectKind::Fixed(PT_FILTER_OFF)),
    range(0x02, 0x02, EffectKind::Fixed(PT_FILTER_ON)),
    range(0x03, 0x42, EffectKind::SetVolume),
    range(0x43, 0x43, EffectKind::Cut),
    range(0x44, 0x56, EffectKind::NoOp),
    range(0x57, 0x88, EffectKind::RowDelay),
    range(0x89, 0xA6, EffectKind::NoOp),
    range(0xA7, 0xDD, EffectKind::Unknown),
    range(0xDE, 0xDE, EffectKind::Loop),
    range(0xDF, 0xFD, EffectKind::Unknown),
    range(0xFE, 0xFF, EffectKind::NoOp),
];

impl EffectKind {
    /// Look up the classification of an effect byte
    pub fn of(code: u8) -> Self {
        EFFECT_TABLE
            .iter()
            .find(|r| (r.first..=r.last).contains(&code))
            .map(|r| r.kind)
            .unwrap_or(EffectKind::Unknown)
    }
}

/// Extra rows reserved by a row-delay effect, if `code` is one
pub fn row_delay(code: u8) -> Option<u32> {
    match EffectKind::of(code) {
        EffectKind::RowDelay => Some(u32::from(code - 0x57)),
        _ => None,
    }
}

/// Voice volume set by `code`, if it is a volume effect
pub fn voice_volume(code: u8) -> Option<u8> {
    match EffectKind::of(code) {
        EffectKind::SetVolume => Some(code - 0x03),
        _ => None,
    }
}

/// Translate an event's effect into a Protracker effect (0 for none)
///
/// Returns `None` for effect codes without a known translation.
pub fn translate(event: &SourceEvent) -> Option<u16> {
    match EffectKind::of(event.effect) {
        EffectKind::NoOp | EffectKind::SetVolume | EffectKind::RowDelay => Some(0),
        EffectKind::Fixed(code) => Some(code),
        EffectKind::Cut => {
            // Only meaningful when the cell does not also trigger a note
            if event.semitone == 0 || event.sample == 0 {
                Some(PT_CUT)
            } else {
                Some(0)
            }
        }
        EffectKind::Loop => Some(PT_JUMP_START),
        EffectKind::Unknown => None,
    }
}

/// Like [`translate`], reporting unknown effects as an error at `voice`/`row`
pub fn translate_at(event: &SourceEvent, voice: usize, row: u32) -> Result<u16> {
    translate(event).ok_or(Error::UnknownEffect {
        effect: event.effect,
        voice,
        row,
    })
}
