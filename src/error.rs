use std::io;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Unexpected end of data at offset {offset} (wanted {wanted} bytes)")]
    Truncated { offset: usize, wanted: usize },

    #[error("SJS format error: {0}")]
    SjsFormat(String),

    #[error("8SVX format error: {0}")]
    IffFormat(String),

    #[error("MOD format error: {0}")]
    ModFormat(String),

    #[error("Leveldata error: {0}")]
    LevelData(String),

    #[error("Unknown effect 0x{effect:02X} in voice {voice} at row {row}")]
    UnknownEffect { effect: u8, voice: usize, row: u32 },

    #[error("Semitone {0} is outside the period table")]
    NoteOutOfRange(u8),

    #[error("Sample volume change: sample {sample} used at volume {previous} and {current}")]
    SampleVolumeChange { sample: u8, previous: u8, current: u8 },

    #[error("Module delay is zero")]
    ZeroDelay,

    #[error("Tempo too slow: {0} BPM")]
    TempoTooSlow(u32),

    #[error("Tempo unrepresentable: {0} BPM")]
    TempoUnrepresentable(u32),

    #[error("Irreconcilable initial effects")]
    InitialEffects,

    #[error("{field} is out of range: {value}")]
    OutOfRange { field: &'static str, value: i64 },

    #[error("Invalid module: {0}")]
    Invalid(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
