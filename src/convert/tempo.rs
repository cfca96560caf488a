//! Tempo/speed synthesis
//!
//! SJS tempos are usually far faster than an Fxx effect can express, so the
//! speed (ticks per row) is lowered together with the BPM to keep the row
//! rate `bpm / speed` as close as possible.

use crate::error::{Error, Result};
use crate::protracker::{DEFAULT_BPM, DEFAULT_SPEED, MAX_BPM, MIN_BPM};

/// Tempo expressed as Protracker BPM and speed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tempo {
    pub bpm: u32,
    /// Ticks per row
    pub speed: u32,
}

impl Tempo {
    /// Fit `bpm` at the default speed into the settable BPM range
    pub fn fit(bpm: u32) -> Result<Self> {
        let mut speed = DEFAULT_SPEED;
        let mut bpm = bpm;

        if bpm < MIN_BPM {
            return Err(Error::TempoTooSlow(bpm));
        }

        if bpm > MAX_BPM {
            // Exact common divisors keep the row rate unchanged
            let min_divisor = (bpm - 1) / MAX_BPM + 1;
            let mut d = min_divisor;
            while d <= speed {
                if speed % d == 0 && bpm % d == 0 {
                    speed /= d;
                    bpm /= d;
                }
                d += 1;
            }

            if bpm > MAX_BPM {
                let old_speed = speed;
                speed = old_speed * MAX_BPM / bpm;
                if speed == 0 {
                    return Err(Error::TempoUnrepresentable(bpm));
                }
                bpm = bpm * speed / old_speed;
            }
        }

        Ok(Self { bpm, speed })
    }

    /// Fxx effects needed on the first row to establish this tempo
    pub fn initial_effects(&self) -> Vec<u16> {
        let mut effects = Vec::new();
        if self.bpm != DEFAULT_BPM {
            effects.push(0xF00 | self.bpm as u16);
        }
        if self.speed != DEFAULT_SPEED {
            effects.push(0xF00 | self.speed as u16);
        }
        effects
    }
}
