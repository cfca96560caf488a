//! Protracker module data structures
//!
//! Setters reject out-of-range values immediately. Consistency between
//! fields is only checked by [`Module::validate`], right before saving.

use super::period;
use crate::error::{Error, Result};

/// Rows per pattern
pub const ROWS: usize = 64;
/// Channels per pattern
pub const CHANNELS: usize = 4;
/// Sample slots in the header
pub const SAMPLE_SLOTS: usize = 31;
/// Pattern table capacity
pub const MAX_ORDERS: usize = 128;
/// Patterns addressable by the pattern table
pub const MAX_PATTERNS: usize = 128;
/// Patterns storable under the "M.K." tag
pub const MK_PATTERNS: usize = 64;
/// Title field width
pub const TITLE_LEN: usize = 20;
/// Sample name field width
pub const SAMPLE_NAME_LEN: usize = 22;
/// Longest sample body (16-bit word count)
pub const MAX_SAMPLE_LEN: usize = 0xFFFF * 2;

fn out_of_range(field: &'static str, value: impl Into<i64>) -> Error {
    Error::OutOfRange {
        field,
        value: value.into(),
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// One cell of a pattern
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Note {
    note: Option<u8>,
    sample: u8,
    effect: u16,
}

impl Note {
    pub fn new() -> Self {
        Self::default()
    }

    /// Note index into the period table
    pub fn note(&self) -> Option<u8> {
        self.note
    }

    pub fn set_note(&mut self, note: Option<u8>) -> Result<()> {
        if let Some(n) = note {
            if period::period(n).is_none() {
                return Err(out_of_range("note", n));
            }
        }
        self.note = note;
        Ok(())
    }

    /// Amiga period of the note (0 for none)
    pub fn period(&self) -> u16 {
        self.note.and_then(period::period).unwrap_or(0)
    }

    pub fn set_period(&mut self, period: u16) -> Result<()> {
        if period == 0 {
            self.note = None;
            return Ok(());
        }
        let note = period::note_for_period(period).ok_or_else(|| out_of_range("period", period))?;
        self.note = Some(note);
        Ok(())
    }

    pub fn sample(&self) -> u8 {
        self.sample
    }

    pub fn set_sample(&mut self, sample: u8) -> Result<()> {
        if usize::from(sample) > SAMPLE_SLOTS {
            return Err(out_of_range("sample", sample));
        }
        self.sample = sample;
        Ok(())
    }

    pub fn effect(&self) -> u16 {
        self.effect
    }

    pub fn set_effect(&mut self, effect: u16) -> Result<()> {
        if effect > 0xFFF {
            return Err(out_of_range("effect", effect));
        }
        self.effect = effect;
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// 64 rows of 4 channels
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pattern {
    pub rows: [[Note; CHANNELS]; ROWS],
}

impl Default for Pattern {
    fn default() -> Self {
        Self {
            rows: [[Note::default(); CHANNELS]; ROWS],
        }
    }
}

impl Pattern {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, row: usize, channel: usize) -> &Note {
        &self.rows[row][channel]
    }

    pub fn get_mut(&mut self, row: usize, channel: usize) -> &mut Note {
        &mut self.rows[row][channel]
    }

    /// Check if every cell is empty
    pub fn is_empty(&self) -> bool {
        self.rows.iter().flatten().all(Note::is_empty)
    }
}

/// Sample header plus 8-bit signed PCM body
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sample {
    name: String,
    data: Vec<u8>,
    fine_tune: i8,
    volume: u8,
    repeat_offset: u32,
    repeat_length: u32,
}

impl Sample {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set the name, silently truncated to 22 characters
    pub fn set_name(&mut self, name: &str) {
        self.name = truncate_chars(name, SAMPLE_NAME_LEN);
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Set the body, padded with a zero byte to an even length
    pub fn set_data(&mut self, mut data: Vec<u8>) {
        if data.len() % 2 != 0 {
            data.push(0);
        }
        self.data = data;
    }

    pub fn fine_tune(&self) -> i8 {
        self.fine_tune
    }

    pub fn set_fine_tune(&mut self, fine_tune: i8) -> Result<()> {
        if !(-8..=7).contains(&fine_tune) {
            return Err(out_of_range("fine tune", fine_tune));
        }
        self.fine_tune = fine_tune;
        Ok(())
    }

    pub fn volume(&self) -> u8 {
        self.volume
    }

    pub fn set_volume(&mut self, volume: u8) -> Result<()> {
        if volume > 64 {
            return Err(out_of_range("volume", volume));
        }
        self.volume = volume;
        Ok(())
    }

    pub fn repeat_offset(&self) -> u32 {
        self.repeat_offset
    }

    pub fn set_repeat_offset(&mut self, offset: u32) -> Result<()> {
        if offset as usize > MAX_SAMPLE_LEN || offset % 2 != 0 {
            return Err(out_of_range("repeat offset", offset));
        }
        self.repeat_offset = offset;
        Ok(())
    }

    pub fn repeat_length(&self) -> u32 {
        self.repeat_length
    }

    pub fn set_repeat_length(&mut self, length: u32) -> Result<()> {
        if length as usize > MAX_SAMPLE_LEN || length % 2 != 0 {
            return Err(out_of_range("repeat length", length));
        }
        self.repeat_length = length;
        Ok(())
    }

    fn validate(&self, slot: usize) -> Result<()> {
        let len = self.data.len();
        if len > MAX_SAMPLE_LEN {
            return Err(Error::Invalid(format!(
                "sample {} is {} bytes long",
                slot + 1,
                len
            )));
        }
        if self.repeat_offset as usize > len {
            return Err(Error::Invalid(format!(
                "sample {} repeat offset {} is past its end",
                slot + 1,
                self.repeat_offset
            )));
        }
        if (self.repeat_offset + self.repeat_length) as usize > len {
            return Err(Error::Invalid(format!(
                "sample {} repeat length {} is past its end",
                slot + 1,
                self.repeat_length
            )));
        }
        Ok(())
    }
}

/// A complete 4-channel, 31-sample module
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Module {
    title: String,
    pub samples: [Option<Sample>; SAMPLE_SLOTS],
    pattern_table: Vec<u8>,
    repeat_index: u8,
    pub patterns: Vec<Pattern>,
}

impl Module {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Set the title, silently truncated to 20 characters
    pub fn set_title(&mut self, title: &str) {
        self.title = truncate_chars(title, TITLE_LEN);
    }

    pub fn repeat_index(&self) -> u8 {
        self.repeat_index
    }

    pub fn set_repeat_index(&mut self, index: u8) -> Result<()> {
        if usize::from(index) >= MAX_ORDERS {
            return Err(out_of_range("repeat index", index));
        }
        self.repeat_index = index;
        Ok(())
    }

    pub fn pattern_table(&self) -> &[u8] {
        &self.pattern_table
    }

    /// Append a pattern index to the pattern table
    pub fn push_order(&mut self, pattern: usize) -> Result<()> {
        if self.pattern_table.len() >= MAX_ORDERS {
            return Err(out_of_range(
                "pattern table length",
                self.pattern_table.len() as i64 + 1,
            ));
        }
        let index = u8::try_from(pattern)
            .ok()
            .filter(|&i| usize::from(i) < MAX_PATTERNS)
            .ok_or_else(|| out_of_range("pattern index", pattern as i64))?;
        self.pattern_table.push(index);
        Ok(())
    }

    /// Index of a pattern equal to `pattern`, storing it first if there is none
    pub fn intern_pattern(&mut self, pattern: Pattern) -> usize {
        match self.patterns.iter().position(|p| *p == pattern) {
            Some(index) => index,
            None => {
                self.patterns.push(pattern);
                self.patterns.len() - 1
            }
        }
    }

    /// Format tag for the stored pattern count
    pub fn tag(&self) -> &'static [u8; 4] {
        if self.patterns.len() > MK_PATTERNS {
            b"M!K!"
        } else {
            b"M.K."
        }
    }

    /// Cross-field consistency checks
    pub fn validate(&self) -> Result<()> {
        for (slot, sample) in self.samples.iter().enumerate() {
            if let Some(sample) = sample {
                sample.validate(slot)?;
            }
        }

        if self.pattern_table.is_empty() {
            return Err(Error::Invalid("pattern table is empty".into()));
        }

        if self.patterns.len() > MAX_PATTERNS {
            return Err(Error::Invalid(format!(
                "{} patterns (max {})",
                self.patterns.len(),
                MAX_PATTERNS
            )));
        }

        for (order, &index) in self.pattern_table.iter().enumerate() {
            if usize::from(index) >= self.patterns.len() {
                return Err(Error::Invalid(format!(
                    "pattern table entry {} refers to missing pattern {}",
                    order, index
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_setters() {
        let mut note = Note::new();
        assert!(note.is_empty());
        note.set_note(Some(12)).unwrap();
        assert_eq!(note.period(), 856);
        assert!(note.set_note(Some(60)).is_err());
        assert!(note.set_sample(31).is_ok());
        assert!(note.set_sample(32).is_err());
        assert!(note.set_effect(0xFFF).is_ok());
        assert!(note.set_effect(0x1000).is_err());
        assert!(note.set_period(857).is_err());
        note.set_period(428).unwrap();
        assert_eq!(note.note(), Some(24));
        assert!(!note.is_empty());
    }

    #[test]
    fn test_sample_setters() {
        let mut sample = Sample::new();
        assert!(sample.set_volume(64).is_ok());
        assert!(sample.set_volume(65).is_err());
        assert!(sample.set_fine_tune(-8).is_ok());
        assert!(sample.set_fine_tune(8).is_err());
        assert!(sample.set_repeat_offset(3).is_err());
        assert!(sample.set_repeat_length(0x20000).is_err());
        sample.set_name("a sample name that is far too long");
        assert_eq!(sample.name().len(), 22);
        sample.set_data(vec![1, 2, 3]);
        assert_eq!(sample.data(), &[1, 2, 3, 0]);
    }

    #[test]
    fn test_title_truncation() {
        let mut module = Module::new();
        module.set_title("a title that is longer than twenty");
        assert_eq!(module.title(), "a title that is long");
    }

    #[test]
    fn test_intern_pattern_dedups() {
        let mut module = Module::new();
        let mut a = Pattern::new();
        a.get_mut(0, 0).set_effect(0xF06).unwrap();
        let b = Pattern::new();

        assert_eq!(module.intern_pattern(a.clone()), 0);
        assert_eq!(module.intern_pattern(b.clone()), 1);
        assert_eq!(module.intern_pattern(a.clone()), 0);
        assert_eq!(module.intern_pattern(b), 1);
        assert_eq!(module.patterns.len(), 2);

        // Interning an already-deduplicated list changes nothing
        let before = module.patterns.clone();
        for p in before.clone() {
            module.intern_pattern(p);
        }
        assert_eq!(module.patterns, before);
    }

    #[test]
    fn test_validate_repeat_window() {
        let mut module = Module::new();
        module.patterns.push(Pattern::new());
        module.push_order(0).unwrap();

        let mut sample = Sample::new();
        sample.set_data(vec![0; 8]);
        sample.set_repeat_offset(4).unwrap();
        sample.set_repeat_length(4).unwrap();
        module.samples[0] = Some(sample.clone());
        assert!(module.validate().is_ok());

        sample.set_repeat_length(6).unwrap();
        module.samples[0] = Some(sample);
        assert!(matches!(module.validate(), Err(Error::Invalid(_))));
    }

    #[test]
    fn test_validate_pattern_table() {
        let mut module = Module::new();
        assert!(module.validate().is_err());
        module.push_order(1).unwrap();
        module.patterns.push(Pattern::new());
        assert!(matches!(module.validate(), Err(Error::Invalid(_))));
        module.patterns.push(Pattern::new());
        assert!(module.validate().is_ok());
    }

    #[test]
    fn test_pattern_table_capacity() {
        let mut module = Module::new();
        for _ in 0..MAX_ORDERS {
            module.push_order(0).unwrap();
        }
        assert!(module.push_order(0).is_err());
        assert!(Module::new().push_order(128).is_err());
        assert!(module.set_repeat_index(128).is_err());
    }
}
