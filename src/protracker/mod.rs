//! Protracker MOD modules (31 samples, 4 channels)

pub mod dump;
pub mod json;
pub mod module;
pub mod period;
pub mod reader;
pub mod writer;

pub use json::ModJson;
pub use module::{Module, Note, Pattern, Sample};
pub use reader::ModReader;
pub use writer::ModWriter;

/// Speed a player assumes before any Fxx effect
pub const DEFAULT_SPEED: u32 = 6;
/// BPM a player assumes before any Fxx effect
pub const DEFAULT_BPM: u32 = 125;
/// Lowest BPM an Fxx effect can set
pub const MIN_BPM: u32 = 0x20;
/// Highest BPM an Fxx effect can set
pub const MAX_BPM: u32 = 0xFF;
