//! Persistent voice volume reconciliation
//!
//! SJS volume effects set a per-voice volume that lasts until changed.
//! Protracker has no persistent channel volume, but the Lemmings modules
//! never change a sample's volume once it has been played, so the voice
//! volume can be folded into each sample's default volume instead.

use crate::error::{Error, Result};
use crate::protracker::module::SAMPLE_SLOTS;
use crate::protracker::{Module, Sample};
use crate::sjs::effect::{self, DEFAULT_VOICE_VOLUME};
use crate::sjs::SjsModule;

/// Voice volume every sample was played at, by sample number - 1
pub type SampleVolumes = [Option<u8>; SAMPLE_SLOTS];

/// Collect the voice volume each sample is played at
pub fn sample_volumes(module: &SjsModule) -> Result<SampleVolumes> {
    let mut volumes: SampleVolumes = [None; SAMPLE_SLOTS];

    for voice in &module.voices {
        let mut voice_volume = DEFAULT_VOICE_VOLUME;

        for (_, event) in voice.iter() {
            if let Some(volume) = effect::voice_volume(event.effect) {
                voice_volume = volume;
            }

            if event.semitone == 0 || event.sample == 0 {
                continue;
            }

            let slot = volumes
                .get_mut(usize::from(event.sample) - 1)
                .ok_or(Error::OutOfRange {
                    field: "sample",
                    value: i64::from(event.sample),
                })?;

            match *slot {
                None => *slot = Some(voice_volume),
                Some(previous) if previous != voice_volume => {
                    return Err(Error::SampleVolumeChange {
                        sample: event.sample,
                        previous,
                        current: voice_volume,
                    });
                }
                Some(_) => {}
            }
        }
    }

    Ok(volumes)
}

/// Scale each played sample's volume by its voice volume
///
/// Samples that are played but missing get an empty slot at full volume so
/// the notes still refer to something.
pub fn apply(volumes: &SampleVolumes, target: &mut Module) -> Result<()> {
    for (slot, volume) in volumes.iter().enumerate() {
        let Some(volume) = *volume else {
            continue;
        };

        let sample = match &mut target.samples[slot] {
            Some(sample) => sample,
            empty => {
                let mut sample = Sample::new();
                sample.set_volume(DEFAULT_VOICE_VOLUME)?;
                empty.insert(sample)
            }
        };

        let scaled =
            u32::from(sample.volume()) * u32::from(volume) / u32::from(DEFAULT_VOICE_VOLUME);
        sample.set_volume(scaled as u8)?;
    }

    Ok(())
}
