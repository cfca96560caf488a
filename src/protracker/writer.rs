//! MOD file writer

use super::module::{Module, Note, Pattern, Sample, MAX_ORDERS, SAMPLE_NAME_LEN, TITLE_LEN};
use crate::cursor::{string_to_latin1, ByteWriter};
use crate::error::Result;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Size of everything before the pattern data
pub const HEADER_SIZE: usize = TITLE_LEN + 31 * 30 + 2 + MAX_ORDERS + 4;

/// Size of one packed pattern
pub const PATTERN_SIZE: usize = 64 * 4 * 4;

/// MOD file writer
pub struct ModWriter<'a> {
    module: &'a Module,
}

impl<'a> ModWriter<'a> {
    pub fn new(module: &'a Module) -> Self {
        Self { module }
    }

    /// Validate the module and serialize it
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.module.validate()?;

        let module = self.module;
        let body_size: usize = module
            .samples
            .iter()
            .flatten()
            .map(|s| s.data().len())
            .sum();
        let mut out = ByteWriter::with_capacity(
            HEADER_SIZE + module.patterns.len() * PATTERN_SIZE + body_size,
        );

        out.write_padded(&string_to_latin1(module.title()), TITLE_LEN);

        let empty = Sample::default();
        for sample in &module.samples {
            write_sample_header(&mut out, sample.as_ref().unwrap_or(&empty));
        }

        let table = module.pattern_table();
        out.write_u8(table.len() as u8);
        out.write_u8(module.repeat_index());
        out.write_padded(table, MAX_ORDERS);

        out.write_bytes(module.tag());

        for pattern in &module.patterns {
            write_pattern(&mut out, pattern);
        }

        for sample in module.samples.iter().flatten() {
            out.write_bytes(sample.data());
        }

        Ok(out.into_bytes())
    }

    /// Write the module to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        // Serialize first so a failed validation leaves no partial file
        let bytes = self.to_bytes()?;
        let mut file = File::create(path)?;
        file.write_all(&bytes)?;
        file.flush()?;
        Ok(())
    }
}

fn write_sample_header(out: &mut ByteWriter, sample: &Sample) {
    out.write_padded(&string_to_latin1(sample.name()), SAMPLE_NAME_LEN);
    out.write_u16_be((sample.data().len() / 2) as u16);
    out.write_u8(sample.fine_tune() as u8 & 0x0F);
    out.write_u8(sample.volume());
    out.write_u16_be((sample.repeat_offset() / 2) as u16);
    out.write_u16_be((sample.repeat_length() / 2) as u16);
}

fn write_pattern(out: &mut ByteWriter, pattern: &Pattern) {
    for row in &pattern.rows {
        for note in row {
            out.write_bytes(&pack_note(note));
        }
    }
}

/// Pack a cell: sample high nibble and period in the first word,
/// sample low nibble and effect in the second
pub fn pack_note(note: &Note) -> [u8; 4] {
    let period = note.period();
    let sample = note.sample();
    let effect = note.effect();
    [
        (sample & 0xF0) | (period >> 8) as u8,
        period as u8,
        (sample << 4) | (effect >> 8) as u8,
        effect as u8,
    ]
}
