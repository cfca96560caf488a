//! Human-readable listing of an SJS module

use super::{semitone_to_note, EffectKind, SjsModule, SourceEvent, VOICE_COUNT};
use crate::protracker::period::note_name;
use std::io::{self, Write};

/// Write a row-by-row listing of `module`
pub fn dump<W: Write>(module: &SjsModule, out: &mut W) -> io::Result<()> {
    match module.bpm() {
        Some(bpm) => writeln!(out, "delay:  {} ({} bpm)", module.delay, bpm)?,
        None => writeln!(out, "delay:  {} (- bpm)", module.delay)?,
    }

    // Voice 0 first
    let voices: String = (0..VOICE_COUNT)
        .map(|v| if module.is_active(v) { '1' } else { '0' })
        .collect();
    writeln!(out, "voices: {}", voices)?;
    writeln!(out, "rows:   {}", module.row_count)?;

    for row in 0..module.row_count {
        for voice in &module.voices {
            match voice.get(row) {
                Some(event) => write!(out, " | {}", format_event(event))?,
                None => write!(out, " | ... .. .. ...")?,
            }
        }
        writeln!(out)?;
    }

    Ok(())
}

/// Tracker-style notation for one event
pub fn format_event(event: &SourceEvent) -> String {
    let note = match event.semitone {
        0 => "...".to_string(),
        s => semitone_to_note(s)
            .and_then(note_name)
            .unwrap_or_else(|| "???".to_string()),
    };

    let sample = match event.sample {
        0 => "..".to_string(),
        s => format!("{:02}", s),
    };

    format!("{} {} .. {}", note, sample, format_effect(event))
}

fn format_effect(event: &SourceEvent) -> String {
    match EffectKind::of(event.effect) {
        EffectKind::NoOp | EffectKind::RowDelay => "...".to_string(),
        EffectKind::Fixed(code) => format!("{:03X}", code),
        EffectKind::SetVolume => format!("V{:02X}", event.effect - 0x03),
        EffectKind::Cut => match super::effect::translate(event) {
            Some(0) | None => "...".to_string(),
            Some(code) => format!("{:03X}", code),
        },
        EffectKind::Loop => "B00".to_string(),
        EffectKind::Unknown => format!("?{:02X}", event.effect),
    }
}
