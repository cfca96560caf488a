//! IFF 8SVX sample loading

use crate::cursor::{latin1_to_string, ByteReader};
use crate::error::{Error, Result};
use crate::protracker::module::MAX_SAMPLE_LEN;
use crate::protracker::Sample;
use std::path::Path;

/// IFF chunk identifiers
pub mod tag {
    pub const FORM: &[u8; 4] = b"FORM";
    pub const SVX8: &[u8; 4] = b"8SVX";
    pub const VHDR: &[u8; 4] = b"VHDR";
    pub const NAME: &[u8; 4] = b"NAME";
    pub const ANNO: &[u8; 4] = b"ANNO";
    pub const BODY: &[u8; 4] = b"BODY";
}

/// Size of the voice header chunk
const VHDR_SIZE: usize = 20;

/// Full-scale 8SVX volume (16.16 fixed point 1.0)
pub const MAX_VOLUME: u32 = 0x10000;

/// One 8SVX sample
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SampleRecord {
    /// Samples in the high octave's one-shot part
    pub one_shot_length: u32,
    /// Samples in the high octave's repeat part
    pub repeat_length: u32,
    /// Samples per cycle in the high octave (0 or 32)
    pub cycle_samples: u32,
    /// Playback rate in samples per second
    pub rate: u16,
    pub octave_count: u8,
    pub compression: u8,
    /// Volume, 0..=0x10000
    pub volume: u32,
    pub name: Option<String>,
    pub body: Vec<u8>,
}

impl SampleRecord {
    /// Parse a `FORM` container holding an `8SVX` form
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut reader = ByteReader::new(data);

        if &reader.read_tag()? != tag::FORM {
            return Err(Error::IffFormat("missing FORM tag".into()));
        }
        let size = chunk_size(&mut reader)?;
        let form = reader.read_slice(size).map_err(|_| {
            Error::IffFormat(format!("FORM size {} exceeds the file", size))
        })?;

        parse_8svx(form)
    }

    /// Load a sample file
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)?;
        Self::parse(&data)
    }

    /// Sample data covering the one-shot and repeat parts, zero-filled if
    /// the body is shorter
    pub fn trimmed_body(&self) -> Vec<u8> {
        let len = self.one_shot_length as usize + self.repeat_length as usize;
        let mut body = self.body.clone();
        body.resize(len, 0);
        body
    }

    /// Convert into a Protracker sample slot
    pub fn to_protracker(&self) -> Result<Sample> {
        let length = u64::from(self.one_shot_length) + u64::from(self.repeat_length);
        if length > MAX_SAMPLE_LEN as u64 {
            return Err(Error::IffFormat(format!(
                "sample is {} bytes long (max {})",
                length, MAX_SAMPLE_LEN
            )));
        }

        let mut sample = Sample::new();

        if self.repeat_length > 0 {
            sample.set_repeat_offset(self.one_shot_length)?;
            sample.set_repeat_length(self.repeat_length)?;
        }

        // 0x10000 maps to 64
        sample.set_volume((self.volume >> 10) as u8)?;

        if let Some(name) = &self.name {
            sample.set_name(name);
        }

        sample.set_data(self.trimmed_body());

        Ok(sample)
    }
}

fn chunk_size(reader: &mut ByteReader) -> Result<usize> {
    let size = reader.read_i32_be()?;
    usize::try_from(size).map_err(|_| Error::IffFormat(format!("negative chunk size {}", size)))
}

fn parse_8svx(form: &[u8]) -> Result<SampleRecord> {
    let mut reader = ByteReader::new(form);

    if &reader.read_tag()? != tag::SVX8 {
        return Err(Error::IffFormat("FORM is not 8SVX".into()));
    }

    let mut sample = SampleRecord::default();

    while !reader.is_eof() {
        let id = reader.read_tag()?;
        let size = chunk_size(&mut reader)?;
        let chunk = reader.read_slice(size).map_err(|_| {
            Error::IffFormat(format!(
                "{} chunk size {} exceeds its FORM",
                latin1_to_string(&id),
                size
            ))
        })?;

        match &id {
            tag::VHDR => parse_vhdr(chunk, &mut sample)?,
            tag::NAME => sample.name = Some(latin1_to_string(chunk)),
            tag::ANNO => {}
            tag::BODY => sample.body = chunk.to_vec(),
            _ => {
                tracing::warn!(
                    "skipped {} chunk ({} bytes) in sample",
                    latin1_to_string(&id),
                    size
                );
            }
        }
    }

    Ok(sample)
}

fn parse_vhdr(chunk: &[u8], sample: &mut SampleRecord) -> Result<()> {
    if chunk.len() != VHDR_SIZE {
        return Err(Error::IffFormat(format!(
            "VHDR is {} bytes, expected {}",
            chunk.len(),
            VHDR_SIZE
        )));
    }

    let mut reader = ByteReader::new(chunk);
    let one_shot = reader.read_i32_be()?;
    let repeat = reader.read_i32_be()?;
    let cycle = reader.read_i32_be()?;
    let rate = reader.read_u16_be()?;
    let octave_count = reader.read_u8()?;
    let compression = reader.read_u8()?;
    let volume = reader.read_i32_be()?;

    let field = |name: &str, value: i32| {
        u32::try_from(value)
            .map_err(|_| Error::IffFormat(format!("negative {} {}", name, value)))
    };

    sample.one_shot_length = field("one-shot length", one_shot)?;
    sample.repeat_length = field("repeat length", repeat)?;
    sample.cycle_samples = field("cycle sample count", cycle)?;
    sample.rate = rate;
    sample.octave_count = octave_count;
    sample.compression = compression;
    sample.volume = field("volume", volume)?;

    if sample.cycle_samples != 0 && sample.cycle_samples != 32 {
        return Err(Error::IffFormat(format!(
            "unsupported cycle sample count {}",
            sample.cycle_samples
        )));
    }
    if octave_count != 1 {
        return Err(Error::IffFormat(format!(
            "unsupported octave count {}",
            octave_count
        )));
    }
    if compression != 0 {
        return Err(Error::IffFormat(format!(
            "unsupported compression {}",
            compression
        )));
    }
    if sample.volume > MAX_VOLUME {
        return Err(Error::IffFormat(format!("volume 0x{:X} too large", sample.volume)));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(id: &[u8; 4], payload: &[u8]) -> Vec<u8> {
        let mut data = id.to_vec();
        data.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        data.extend_from_slice(payload);
        data
    }

    fn vhdr(
        one_shot: u32,
        repeat: u32,
        cycle: u32,
        octaves: u8,
        compression: u8,
        volume: u32,
    ) -> Vec<u8> {
        let mut v = Vec::new();
        v.extend_from_slice(&one_shot.to_be_bytes());
        v.extend_from_slice(&repeat.to_be_bytes());
        v.extend_from_slice(&cycle.to_be_bytes());
        v.extend_from_slice(&8363u16.to_be_bytes());
        v.push(octaves);
        v.push(compression);
        v.extend_from_slice(&volume.to_be_bytes());
        chunk(tag::VHDR, &v)
    }

    fn form(chunks: &[Vec<u8>]) -> Vec<u8> {
        let mut inner = tag::SVX8.to_vec();
        for c in chunks {
            inner.extend_from_slice(c);
        }
        chunk(tag::FORM, &inner)
    }

    #[test]
    fn test_parse_sample() {
        let data = form(&[
            vhdr(4, 2, 32, 1, 0, 0x10000),
            chunk(tag::NAME, b"bass"),
            chunk(tag::ANNO, b"made by hand"),
            chunk(b"CHAN", &[0, 0, 0, 2]),
            chunk(tag::BODY, &[1, 2, 3, 4, 5, 6, 7, 8]),
        ]);
        let sample = SampleRecord::parse(&data).unwrap();
        assert_eq!(sample.one_shot_length, 4);
        assert_eq!(sample.repeat_length, 2);
        assert_eq!(sample.rate, 8363);
        assert_eq!(sample.name.as_deref(), Some("bass"));
        assert_eq!(sample.body.len(), 8);
        assert_eq!(sample.trimmed_body(), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_to_protracker() {
        let data = form(&[
            vhdr(4, 2, 0, 1, 0, 0x8000),
            chunk(tag::BODY, &[1, 2, 3]),
        ]);
        let sample = SampleRecord::parse(&data).unwrap().to_protracker().unwrap();
        assert_eq!(sample.volume(), 32);
        assert_eq!(sample.repeat_offset(), 4);
        assert_eq!(sample.repeat_length(), 2);
        // Short body is zero-filled to the declared length
        assert_eq!(sample.data(), &[1, 2, 3, 0, 0, 0]);
        assert_eq!(sample.name(), "");
    }

    #[test]
    fn test_no_repeat_window_without_repeat() {
        let data = form(&[vhdr(3, 0, 0, 1, 0, 0x10000), chunk(tag::BODY, &[9; 5])]);
        let sample = SampleRecord::parse(&data).unwrap().to_protracker().unwrap();
        assert_eq!(sample.repeat_offset(), 0);
        assert_eq!(sample.repeat_length(), 0);
        assert_eq!(sample.volume(), 64);
        assert_eq!(sample.data(), &[9, 9, 9, 0]);
    }

    #[test]
    fn test_rejects_bad_header_fields() {
        for bad in [
            vhdr(4, 0, 16, 1, 0, 0),
            vhdr(4, 0, 0, 2, 0, 0),
            vhdr(4, 0, 0, 1, 1, 0),
            vhdr(4, 0, 0, 1, 0, 0x10001),
            vhdr(0x8000_0000, 0, 0, 1, 0, 0),
        ] {
            assert!(matches!(
                SampleRecord::parse(&form(&[bad])),
                Err(Error::IffFormat(_))
            ));
        }
    }

    #[test]
    fn test_rejects_bad_container() {
        let mut data = form(&[chunk(tag::BODY, &[0; 4])]);
        data[0] = b'X';
        assert!(matches!(SampleRecord::parse(&data), Err(Error::IffFormat(_))));

        // Chunk claims more bytes than the FORM holds
        let mut data = form(&[chunk(tag::BODY, &[0; 4])]);
        let body_size = 4 + 4 + 4;
        data[body_size + 4..body_size + 8].copy_from_slice(&100u32.to_be_bytes());
        assert!(matches!(SampleRecord::parse(&data), Err(Error::IffFormat(_))));

        // Negative chunk size
        let mut data = form(&[chunk(tag::BODY, &[0; 4])]);
        data[4..8].copy_from_slice(&(-1i32).to_be_bytes());
        assert!(matches!(SampleRecord::parse(&data), Err(Error::IffFormat(_))));
    }
}
