//! SJS to Protracker translation
//!
//! The timeline is cut into 64-row patterns after dropping any leading
//! set-up rows, effects are remapped, the tempo is placed on the first row,
//! identical patterns are shared, and persistent voice volumes are folded
//! into the sample volumes.

pub mod tempo;
pub mod volume;

pub use tempo::Tempo;

use crate::error::{Error, Result};
use crate::protracker::module::{CHANNELS, ROWS, SAMPLE_SLOTS};
use crate::protracker::{period, Module, Note, Pattern, Sample};
use crate::sjs::{effect, semitone_to_note, SjsModule, SourceEvent};

/// Translates one decoded SJS module
pub struct Converter<'a> {
    module: &'a SjsModule,
}

impl<'a> Converter<'a> {
    pub fn new(module: &'a SjsModule) -> Self {
        Self { module }
    }

    /// Number of leading rows that are dropped
    ///
    /// Only the rows in front of the last full 64-row block are candidates,
    /// and only when no voice plays a note in them.
    pub fn collapsed_row_count(&self) -> u32 {
        let candidate = self.module.row_count % ROWS as u32;

        // Nothing would be left to play
        if candidate == self.module.row_count {
            return 0;
        }

        let has_note = self.module.voices.iter().any(|voice| {
            voice
                .range(0, candidate)
                .any(|(_, event)| event.semitone != 0)
        });

        if has_note {
            0
        } else {
            candidate
        }
    }

    /// Tempo for the module's delay
    pub fn tempo(&self) -> Result<Tempo> {
        let bpm = self.module.bpm().ok_or(Error::ZeroDelay)?;
        Tempo::fit(bpm)
    }

    /// Build the Protracker module; `samples[i]` goes into sample slot `i + 1`
    pub fn convert(&self, samples: &[Option<Sample>]) -> Result<Module> {
        if samples.len() > SAMPLE_SLOTS {
            return Err(Error::OutOfRange {
                field: "sample count",
                value: samples.len() as i64,
            });
        }

        let tempo = self.tempo()?;
        let collapsed = self.collapsed_row_count();

        tracing::debug!(
            "tempo {} bpm speed {}, {} leading rows collapsed",
            tempo.bpm,
            tempo.speed,
            collapsed
        );

        let mut target = Module::new();
        for (slot, sample) in target.samples.iter_mut().zip(samples) {
            *slot = sample.clone();
        }

        let mut start = collapsed;
        while start < self.module.row_count {
            let mut pattern = self.build_pattern(start)?;

            if start == collapsed {
                self.place_collapsed_effects(collapsed, &mut pattern)?;
                place_first_row_effects(&tempo.initial_effects(), &mut pattern)?;
            }

            let index = target.intern_pattern(pattern);
            tracing::debug!("rows {}..{} -> pattern {}", start, start + ROWS as u32, index);
            target.push_order(index)?;

            start += ROWS as u32;
        }

        let volumes = volume::sample_volumes(self.module)?;
        volume::apply(&volumes, &mut target)?;

        Ok(target)
    }

    /// Translate the 64 rows starting at `start`
    fn build_pattern(&self, start: u32) -> Result<Pattern> {
        let mut pattern = Pattern::new();

        for (v, voice) in self.module.voices.iter().enumerate() {
            for (row, event) in voice.range(start, start + ROWS as u32) {
                let note = translate_event(event, v, row)?;
                if !note.is_empty() {
                    *pattern.get_mut((row - start) as usize, v) = note;
                }
            }
        }

        Ok(pattern)
    }

    /// Move effects from the dropped rows onto row 0 of the same voice
    fn place_collapsed_effects(&self, collapsed: u32, pattern: &mut Pattern) -> Result<()> {
        for (v, voice) in self.module.voices.iter().enumerate() {
            for (row, event) in voice.range(0, collapsed) {
                let code = effect::translate_at(event, v, row)?;
                if code == 0 {
                    continue;
                }

                let note = pattern.get_mut(0, v);
                match note.effect() {
                    0 => note.set_effect(code)?,
                    existing if existing == code => {}
                    _ => return Err(Error::InitialEffects),
                }
            }
        }
        Ok(())
    }
}

/// Translate one SJS event into a pattern cell
pub fn translate_event(event: &SourceEvent, voice: usize, row: u32) -> Result<Note> {
    let mut note = Note::new();

    if event.semitone != 0 {
        let index = semitone_to_note(event.semitone)
            .filter(|&n| period::period(n).is_some())
            .ok_or(Error::NoteOutOfRange(event.semitone))?;
        note.set_note(Some(index))?;
    }

    note.set_sample(event.sample)?;
    note.set_effect(effect::translate_at(event, voice, row)?)?;

    Ok(note)
}

/// Put each effect into the last channel of row 0 that has none
fn place_first_row_effects(effects: &[u16], pattern: &mut Pattern) -> Result<()> {
    for &code in effects {
        let free = (0..CHANNELS)
            .rev()
            .find(|&c| pattern.get(0, c).effect() == 0)
            .ok_or(Error::InitialEffects)?;
        pattern.get_mut(0, free).set_effect(code)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sjs::{Voice, VOICE_COUNT};

    /// Delay giving exactly 125 BPM
    const DEFAULT_DELAY: u16 = 14215;

    fn module(row_count: u32, delay: u16, events: &[(usize, u32, u8, u8, u8)]) -> SjsModule {
        let mut voices: [Voice; VOICE_COUNT] = Default::default();
        for &(voice, row, semitone, sample, effect) in events {
            voices[voice].events.insert(
                row,
                SourceEvent {
                    semitone,
                    sample,
                    effect,
                },
            );
        }
        SjsModule {
            delay,
            active: 0x0F,
            voices,
            row_count,
        }
    }

    #[test]
    fn test_translate_event() {
        let event = SourceEvent {
            semitone: 4,
            sample: 2,
            effect: 0x01,
        };
        let note = translate_event(&event, 0, 0).unwrap();
        assert_eq!(note.note(), Some(12));
        assert_eq!(note.period(), 856);
        assert_eq!(note.sample(), 2);
        assert_eq!(note.effect(), 0xE01);

        let empty = SourceEvent {
            semitone: 0,
            sample: 0,
            effect: 0x20,
        };
        assert!(translate_event(&empty, 0, 0).unwrap().is_empty());

        let high = SourceEvent {
            semitone: 52,
            sample: 1,
            effect: 0,
        };
        assert!(matches!(
            translate_event(&high, 0, 0),
            Err(Error::NoteOutOfRange(52))
        ));
    }

    #[test]
    fn test_collapse_setup_rows() {
        let m = module(
            70,
            DEFAULT_DELAY,
            &[(0, 0, 0, 0, 0x01), (0, 2, 0, 0, 0x03 + 10), (0, 6, 13, 1, 0)],
        );
        let converter = Converter::new(&m);
        assert_eq!(converter.collapsed_row_count(), 6);

        let target = converter.convert(&[]).unwrap();
        assert_eq!(target.pattern_table(), &[0]);
        let first = &target.patterns[0];
        // Row 6 becomes row 0 and carries the filter effect from row 0
        assert_eq!(first.get(0, 0).note(), Some(21));
        assert_eq!(first.get(0, 0).effect(), 0xE01);
    }

    #[test]
    fn test_no_collapse_when_notes_lead() {
        let m = module(70, DEFAULT_DELAY, &[(2, 3, 13, 1, 0)]);
        let converter = Converter::new(&m);
        assert_eq!(converter.collapsed_row_count(), 0);
        let target = converter.convert(&[]).unwrap();
        assert_eq!(target.pattern_table().len(), 2);
        assert_eq!(target.patterns[0].get(3, 2).note(), Some(21));
    }

    #[test]
    fn test_short_module_is_not_collapsed_away() {
        let m = module(10, DEFAULT_DELAY, &[(0, 9, 0, 0, 0xDE)]);
        assert_eq!(Converter::new(&m).collapsed_row_count(), 0);
        let target = Converter::new(&m).convert(&[]).unwrap();
        assert_eq!(target.pattern_table(), &[0]);
        assert_eq!(target.patterns[0].get(9, 0).effect(), 0xB00);
    }

    #[test]
    fn test_collapsed_effect_collision() {
        let m = module(
            65,
            DEFAULT_DELAY,
            &[(1, 0, 0, 0, 0x01), (1, 1, 13, 1, 0x02)],
        );
        assert_eq!(Converter::new(&m).collapsed_row_count(), 1);
        assert!(matches!(
            Converter::new(&m).convert(&[]),
            Err(Error::InitialEffects)
        ));
    }

    #[test]
    fn test_identical_patterns_are_shared() {
        let mut events = Vec::new();
        for block in 0..3u32 {
            events.push((0, block * 64, 13, 1, 0));
        }
        events.push((1, 64 * 3 + 5, 20, 2, 0));
        let m = module(256, DEFAULT_DELAY, &events);
        let target = Converter::new(&m).convert(&[]).unwrap();
        assert_eq!(target.pattern_table(), &[0, 0, 0, 1]);
        assert_eq!(target.patterns.len(), 2);
    }

    #[test]
    fn test_tempo_effects_only_in_first_pattern() {
        // 300 BPM becomes speed 1 at 50 BPM
        let mut events = Vec::new();
        for block in 0..2u32 {
            events.push((0, block * 64, 13, 1, 0));
        }
        let m = module(128, 5923, &events);
        let target = Converter::new(&m).convert(&[]).unwrap();

        assert_eq!(target.pattern_table(), &[0, 1]);
        let first = &target.patterns[0];
        assert_eq!(first.get(0, 3).effect(), 0xF32);
        assert_eq!(first.get(0, 2).effect(), 0xF01);
        assert_eq!(first.get(0, 0).effect(), 0);
        assert_eq!(target.patterns[1].get(0, 3).effect(), 0);
    }

    #[test]
    fn test_tempo_effects_skip_busy_channels() {
        let m = module(64, 5923, &[(3, 0, 0, 0, 0x01), (2, 0, 0, 0, 0x02)]);
        let target = Converter::new(&m).convert(&[]).unwrap();
        let first = &target.patterns[0];
        assert_eq!(first.get(0, 3).effect(), 0xE01);
        assert_eq!(first.get(0, 2).effect(), 0xE00);
        assert_eq!(first.get(0, 1).effect(), 0xF32);
        assert_eq!(first.get(0, 0).effect(), 0xF01);

        // Only one free channel for two tempo effects
        let m = module(
            64,
            5923,
            &[
                (3, 0, 0, 0, 0x01),
                (2, 0, 0, 0, 0x02),
                (1, 0, 0, 0, 0x43),
            ],
        );
        assert!(matches!(
            Converter::new(&m).convert(&[]),
            Err(Error::InitialEffects)
        ));
    }

    #[test]
    fn test_unknown_effect_aborts() {
        let m = module(64, DEFAULT_DELAY, &[(2, 10, 13, 1, 0xA7)]);
        assert!(matches!(
            Converter::new(&m).convert(&[]),
            Err(Error::UnknownEffect {
                effect: 0xA7,
                voice: 2,
                row: 10
            })
        ));
    }

    #[test]
    fn test_tempo_errors() {
        let m = module(64, 0, &[]);
        assert!(matches!(Converter::new(&m).convert(&[]), Err(Error::ZeroDelay)));
        let m = module(64, 838, &[]);
        assert!(matches!(
            Converter::new(&m).convert(&[]),
            Err(Error::TempoUnrepresentable(_))
        ));
        let m = module(64, 60000, &[]);
        assert!(matches!(
            Converter::new(&m).convert(&[]),
            Err(Error::TempoTooSlow(29))
        ));
    }

    #[test]
    fn test_voice_volume_scales_samples() {
        let m = module(64, DEFAULT_DELAY, &[(0, 0, 13, 1, 0x03 + 21)]);
        let mut sample = Sample::new();
        sample.set_volume(63).unwrap();
        sample.set_data(vec![0; 4]);

        let target = Converter::new(&m).convert(&[Some(sample)]).unwrap();
        assert_eq!(target.samples[0].as_ref().unwrap().volume(), 21);
    }
}
