//! Amiga period table

/// Periods for five octaves, highest period (lowest pitch) first
pub const PERIOD_TABLE: [u16; 60] = [
    1712, 1616, 1524, 1440, 1356, 1280, 1208, 1140, 1076, 1016, 960, 907, //
    856, 808, 762, 720, 678, 640, 604, 570, 538, 508, 480, 453, //
    428, 404, 381, 360, 339, 320, 302, 285, 269, 254, 240, 226, //
    214, 202, 190, 180, 170, 160, 151, 143, 135, 127, 120, 113, //
    107, 101, 95, 90, 85, 80, 75, 71, 67, 63, 60, 56,
];

const NOTE_NAMES: [&str; 12] = [
    "C-", "C#", "D-", "D#", "E-", "F-", "F#", "G-", "G#", "A-", "A#", "B-",
];

/// Period for a note index
pub fn period(note: u8) -> Option<u16> {
    PERIOD_TABLE.get(usize::from(note)).copied()
}

/// Note index of an exact table period
pub fn note_for_period(period: u16) -> Option<u8> {
    // Table is strictly descending
    PERIOD_TABLE
        .binary_search_by(|probe| period.cmp(probe))
        .ok()
        .map(|i| i as u8)
}

/// Tracker name of a note index, e.g. "C-4"
pub fn note_name(note: u8) -> Option<String> {
    if usize::from(note) >= PERIOD_TABLE.len() {
        return None;
    }
    let octave = note / 12;
    Some(format!(
        "{}{}",
        NOTE_NAMES[usize::from(note % 12)],
        octave + 3
    ))
}
