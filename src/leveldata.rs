//! Sample name lookup in the game's `leveldata` file
//!
//! The tail of the file is a table of 28-byte module entries: a 12-byte
//! NUL-padded module name followed by 16 one-based sample ids. The table is
//! scanned backwards from the last entry. Sample ids index 12-byte name
//! records (11-byte NUL-terminated name plus a flag byte) starting at
//! [`SAMPLE_NAMES_OFFSET`].

use crate::cursor::{latin1_to_string, string_to_latin1, ByteReader};
use crate::error::{Error, Result};

/// Start of the sample name records
pub const SAMPLE_NAMES_OFFSET: usize = 0x1D38;
/// Samples listed per module
pub const SAMPLES_PER_MODULE: usize = 16;

const MODULE_NAME_LEN: usize = 12;
const MODULE_ENTRY_LEN: usize = MODULE_NAME_LEN + SAMPLES_PER_MODULE;
const SAMPLE_NAME_LEN: usize = 11;
const SAMPLE_RECORD_LEN: usize = SAMPLE_NAME_LEN + 1;

/// Sample file names of one module, by sample number - 1
pub type SampleNames = [Option<String>; SAMPLES_PER_MODULE];

/// Look up the sample names of `module_name`, or `None` if it has no entry
pub fn sample_names(data: &[u8], module_name: &str) -> Result<Option<SampleNames>> {
    let mut wanted = string_to_latin1(module_name);
    if wanted.len() >= MODULE_NAME_LEN {
        return Err(Error::LevelData(format!(
            "module name {:?} is too long",
            module_name
        )));
    }
    wanted.resize(MODULE_NAME_LEN, 0);

    let mut reader = ByteReader::new(data);
    let mut max_sample_id = 0usize;
    let Some(mut position) = data.len().checked_sub(MODULE_ENTRY_LEN) else {
        return Ok(None);
    };

    // Entries end where the sample name records begin
    while SAMPLE_NAMES_OFFSET + max_sample_id * SAMPLE_RECORD_LEN <= position {
        reader.seek(position);
        let name = reader.read_slice(MODULE_NAME_LEN)?;
        let ids = reader.read_slice(SAMPLES_PER_MODULE)?;

        if name == wanted.as_slice() {
            let mut names: SampleNames = Default::default();
            for (slot, &id) in names.iter_mut().zip(ids) {
                if id > 0 {
                    *slot = Some(sample_name(&mut reader, id)?);
                }
            }
            tracing::debug!(
                "leveldata entry for {} at offset 0x{:X}",
                module_name,
                position
            );
            return Ok(Some(names));
        }

        let entry_max = ids.iter().copied().max().unwrap_or(0);
        max_sample_id = max_sample_id.max(usize::from(entry_max));

        match position.checked_sub(MODULE_ENTRY_LEN) {
            Some(p) => position = p,
            None => break,
        }
    }

    Ok(None)
}

fn sample_name(reader: &mut ByteReader, id: u8) -> Result<String> {
    reader.seek(SAMPLE_NAMES_OFFSET + (usize::from(id) - 1) * SAMPLE_RECORD_LEN);
    let bytes = reader.read_slice(SAMPLE_NAME_LEN)?;
    let end = bytes.iter().position(|&b| b == 0).ok_or_else(|| {
        Error::LevelData(format!("sample name {} is not terminated", id))
    })?;
    Ok(latin1_to_string(&bytes[..end]))
}
