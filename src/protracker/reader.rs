//! MOD file reader
//!
//! Reads back the 31-sample, 4-channel layout produced by the writer.

use super::module::{
    Module, Pattern, Sample, CHANNELS, MAX_ORDERS, ROWS, SAMPLE_NAME_LEN, SAMPLE_SLOTS, TITLE_LEN,
};
use crate::cursor::{latin1_to_string, ByteReader};
use crate::error::{Error, Result};

/// Parsed sample header
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct SampleHeader {
    /// Length in bytes
    length: usize,
    fine_tune: i8,
    volume: u8,
    repeat_offset: u32,
    repeat_length: u32,
}

/// MOD file reader
pub struct ModReader<'a> {
    reader: ByteReader<'a>,
}

impl<'a> ModReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            reader: ByteReader::new(data),
        }
    }

    /// Parse the whole file
    pub fn parse(&mut self) -> Result<Module> {
        let mut module = Module::new();
        module.set_title(&read_text(&mut self.reader, TITLE_LEN)?);

        let mut headers = [SampleHeader::default(); SAMPLE_SLOTS];
        let mut names: [String; SAMPLE_SLOTS] = Default::default();
        for (header, name) in headers.iter_mut().zip(names.iter_mut()) {
            *name = read_text(&mut self.reader, SAMPLE_NAME_LEN)?;
            *header = self.read_sample_header()?;
        }

        let song_length = usize::from(self.reader.read_u8()?);
        let repeat_index = self.reader.read_u8()?;
        let orders = self.reader.read_slice(MAX_ORDERS)?;

        if song_length == 0 || song_length > MAX_ORDERS {
            return Err(Error::ModFormat(format!("bad song length {}", song_length)));
        }

        let tag = self.reader.read_tag()?;
        if &tag != b"M.K." && &tag != b"M!K!" {
            return Err(Error::ModFormat(format!(
                "unsupported format tag {:?}",
                latin1_to_string(&tag)
            )));
        }

        // Every pattern named anywhere in the table is stored
        let pattern_count = orders.iter().map(|&o| usize::from(o) + 1).max().unwrap_or(0);
        for _ in 0..pattern_count {
            let pattern = self.read_pattern()?;
            module.patterns.push(pattern);
        }

        for &order in &orders[..song_length] {
            module.push_order(usize::from(order))?;
        }
        module
            .set_repeat_index(repeat_index)
            .map_err(|_| Error::ModFormat(format!("bad repeat index {}", repeat_index)))?;

        for (slot, (header, name)) in headers.iter().zip(names.iter()).enumerate() {
            // Only an all-zero header is an unused slot
            if name.is_empty() && *header == SampleHeader::default() {
                continue;
            }
            let data = self.reader.read_bytes(header.length)?;
            let mut sample = Sample::new();
            sample.set_name(name);
            sample.set_data(data);
            sample.set_fine_tune(header.fine_tune)?;
            sample.set_volume(header.volume)?;
            sample.set_repeat_offset(header.repeat_offset)?;
            sample.set_repeat_length(header.repeat_length)?;
            module.samples[slot] = Some(sample);
        }

        Ok(module)
    }

    fn read_sample_header(&mut self) -> Result<SampleHeader> {
        let length = usize::from(self.reader.read_u16_be()?) * 2;
        let fine_tune = self.reader.read_u8()? & 0x0F;
        let volume = self.reader.read_u8()?;
        let repeat_offset = u32::from(self.reader.read_u16_be()?) * 2;
        let repeat_length = u32::from(self.reader.read_u16_be()?) * 2;

        // Sign-extend the nibble
        let fine_tune = ((fine_tune << 4) as i8) >> 4;

        Ok(SampleHeader {
            length,
            fine_tune,
            volume,
            repeat_offset,
            repeat_length,
        })
    }

    fn read_pattern(&mut self) -> Result<Pattern> {
        let mut pattern = Pattern::new();
        for row in 0..ROWS {
            for channel in 0..CHANNELS {
                let b = self.reader.read_slice(4)?;
                let period = (u16::from(b[0] & 0x0F) << 8) | u16::from(b[1]);
                let note = pattern.get_mut(row, channel);
                note.set_period(period).map_err(|_| {
                    Error::ModFormat(format!(
                        "period {} at row {} channel {} is not in the period table",
                        period, row, channel
                    ))
                })?;
                note.set_sample((b[0] & 0xF0) | (b[2] >> 4))?;
                note.set_effect((u16::from(b[2] & 0x0F) << 8) | u16::from(b[3]))?;
            }
        }
        Ok(pattern)
    }
}

fn read_text(reader: &mut ByteReader, width: usize) -> Result<String> {
    let bytes = reader.read_slice(width)?;
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(width);
    Ok(latin1_to_string(&bytes[..end]))
}
