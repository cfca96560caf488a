//! Human-readable listing of a MOD module

use super::module::{Module, Note};
use super::period::note_name;
use std::io::{self, Write};

/// Write every pattern of `module`, row by row
pub fn dump<W: Write>(module: &Module, out: &mut W) -> io::Result<()> {
    writeln!(out, "title:    {}", module.title())?;
    writeln!(out, "orders:   {:?}", module.pattern_table())?;
    writeln!(out, "repeat:   {}", module.repeat_index())?;

    for (index, pattern) in module.patterns.iter().enumerate() {
        writeln!(out, "pattern {}:", index)?;
        for row in &pattern.rows {
            for note in row {
                write!(out, " | {}", format_note(note))?;
            }
            writeln!(out)?;
        }
    }

    Ok(())
}

/// Tracker-style notation for one cell
pub fn format_note(note: &Note) -> String {
    let name = note
        .note()
        .and_then(note_name)
        .unwrap_or_else(|| "...".to_string());
    let sample = match note.sample() {
        0 => "..".to_string(),
        s => format!("{:02}", s),
    };
    let effect = match note.effect() {
        0 => "...".to_string(),
        e => format!("{:03X}", e),
    };
    format!("{} {} .. {}", name, sample, effect)
}
