//! SJS module decoder

use super::{effect, EffectKind, SjsModule, SourceEvent, Voice, VOICE_COUNT};
use crate::cursor::ByteReader;
use crate::error::{Error, Result};

/// Low nibble of the flags byte: one bit per active voice
const VOICE_MASK: u8 = 0x0F;

/// SJS module reader
pub struct SjsReader<'a> {
    reader: ByteReader<'a>,
}

impl<'a> SjsReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            reader: ByteReader::new(data),
        }
    }

    /// Decode the whole module into per-voice timelines
    pub fn parse(&mut self) -> Result<SjsModule> {
        let delay = self.reader.read_u16_le()?;
        let flags = self.reader.read_u8()?;

        if flags & VOICE_MASK == 0 {
            return Err(Error::SjsFormat("module has no voices".into()));
        }
        if flags & !VOICE_MASK != 0 {
            return Err(Error::SjsFormat(format!(
                "module has unknown flags 0x{:02X}",
                flags
            )));
        }

        let active = flags & VOICE_MASK;
        let mut voices: [Voice; VOICE_COUNT] = Default::default();
        let mut row_counts = [0u32; VOICE_COUNT];
        let mut ended = 0u8;

        while ended & active != active {
            for v in 0..VOICE_COUNT {
                let event = self.read_event()?;

                // Ended voices still occupy their slot in the stream
                if ended & (1 << v) != 0 {
                    continue;
                }

                voices[v].events.insert(row_counts[v], event);
                row_counts[v] += 1;

                if let Some(extra) = effect::row_delay(event.effect) {
                    row_counts[v] += extra;
                } else if EffectKind::of(event.effect) == EffectKind::Loop {
                    ended |= 1 << v;
                }
            }
        }

        let row_count = shared_row_count(active, &row_counts)?;

        tracing::debug!(
            "decoded SJS module: delay {}, voices {:04b}, {} rows, {} trailing bytes",
            delay,
            active,
            row_count,
            self.reader.remaining()
        );

        Ok(SjsModule {
            delay,
            active,
            voices,
            row_count,
        })
    }

    fn read_event(&mut self) -> Result<SourceEvent> {
        Ok(SourceEvent {
            semitone: self.reader.read_u8()?,
            sample: self.reader.read_u8()?,
            effect: self.reader.read_u8()?,
        })
    }
}

/// Row count common to every active voice
fn shared_row_count(active: u8, row_counts: &[u32; VOICE_COUNT]) -> Result<u32> {
    let mut counts = row_counts
        .iter()
        .enumerate()
        .filter(|(v, _)| active & (1 << v) != 0)
        .map(|(_, &count)| count);

    let first = counts
        .next()
        .ok_or_else(|| Error::SjsFormat("module has no voices".into()))?;

    if counts.any(|count| count != first) {
        return Err(Error::SjsFormat(format!(
            "voices have mismatched row counts {:?}",
            row_counts
        )));
    }

    Ok(first)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module_bytes(delay: u16, flags: u8, rows: &[[[u8; 3]; 4]]) -> Vec<u8> {
        let mut data = delay.to_le_bytes().to_vec();
        data.push(flags);
        for row in rows {
            for event in row {
                data.extend_from_slice(event);
            }
        }
        data
    }

    #[test]
    fn test_single_voice() {
        let data = module_bytes(
            14215,
            0x01,
            &[
                [[13, 1, 0], [0; 3], [0; 3], [0; 3]],
                [[0, 0, 0], [0; 3], [0; 3], [0; 3]],
                [[15, 1, 0xDE], [0; 3], [0; 3], [0; 3]],
            ],
        );
        let module = SjsModule::parse(&data).unwrap();
        assert_eq!(module.delay, 14215);
        assert_eq!(module.active, 1);
        assert_eq!(module.row_count, 3);
        assert_eq!(module.voices[0].events.len(), 3);
        assert_eq!(module.voices[0].get(2).unwrap().semitone, 15);
    }

    #[test]
    fn test_row_delay_leaves_gaps() {
        // Voice 0 holds for 3 extra rows, voice 1 plays every row
        let data = module_bytes(
            14215,
            0x03,
            &[
                [[13, 1, 0x57 + 3], [1, 2, 0], [0; 3], [0; 3]],
                [[14, 1, 0xDE], [1, 2, 0], [0; 3], [0; 3]],
                [[0; 3], [1, 2, 0], [0; 3], [0; 3]],
                [[0; 3], [1, 2, 0], [0; 3], [0; 3]],
                [[0; 3], [1, 2, 0xDE], [0; 3], [0; 3]],
            ],
        );
        let module = SjsModule::parse(&data).unwrap();
        assert_eq!(module.row_count, 5);
        let rows: Vec<u32> = module.voices[0].events.keys().copied().collect();
        assert_eq!(rows, vec![0, 4]);
        assert_eq!(module.voices[1].events.len(), 5);
    }

    #[test]
    fn test_ended_voice_is_skipped_but_consumed() {
        let data = module_bytes(
            14215,
            0x03,
            &[
                [[13, 1, 0xDE], [1, 2, 0], [0; 3], [0; 3]],
                [[99, 9, 0x01], [1, 2, 0xDE], [0; 3], [0; 3]],
            ],
        );
        // Voice 0 ends after one row, voice 1 after two: mismatch
        let result = SjsModule::parse(&data);
        assert!(matches!(result, Err(Error::SjsFormat(_))));
    }

    #[test]
    fn test_inactive_voice_does_not_count() {
        let data = module_bytes(
            14215,
            0x01,
            &[[[13, 1, 0xDE], [5, 3, 0x60], [0; 3], [0; 3]]],
        );
        let module = SjsModule::parse(&data).unwrap();
        assert_eq!(module.row_count, 1);
        // Events of inactive voices are still recorded
        assert_eq!(module.voices[1].get(0).unwrap().sample, 3);
    }

    #[test]
    fn test_bad_flags() {
        assert!(matches!(
            SjsModule::parse(&module_bytes(1, 0x00, &[])),
            Err(Error::SjsFormat(_))
        ));
        assert!(matches!(
            SjsModule::parse(&module_bytes(1, 0x11, &[])),
            Err(Error::SjsFormat(_))
        ));
    }

    #[test]
    fn test_truncated_stream() {
        let data = module_bytes(14215, 0x01, &[[[13, 1, 0], [0; 3], [0; 3], [0; 3]]]);
        assert!(matches!(
            SjsModule::parse(&data),
            Err(Error::Truncated { .. })
        ));
    }

    #[test]
    fn test_decoding_is_deterministic() {
        let data = module_bytes(
            14215,
            0x0F,
            &[
                [[13, 1, 0x58], [1, 2, 0x58], [3, 3, 0x58], [4, 4, 0x58]],
                [[13, 1, 0xDE], [1, 2, 0xDE], [3, 3, 0xDE], [4, 4, 0xDE]],
            ],
        );
        let a = SjsModule::parse(&data).unwrap();
        let b = SjsModule::parse(&data).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.row_count, 3);
    }
}
