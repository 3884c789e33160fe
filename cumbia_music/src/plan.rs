// Run planning: the global decisions drawn once before any note is written.
//
// Tempo comes from a triangular distribution peaking in the middle of the
// range. The measure count is a target song length in seconds divided by
// the length of one 4/4 measure at that tempo, rounded down. The key root and
// scale are uniform, and each pitched voice gets a General MIDI program from
// its pool.
//
// The plan is frozen after drawing and handed to arrangement.rs.

use crate::config::{BEATS_PER_MEASURE, ComposerConfig};
use crate::scale::{Key, ScaleType};
use cumbia_prng::SongRng;
use serde::{Deserialize, Serialize};

/// Program numbers for the three pitched voices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruments {
    pub bass: u8,
    pub lead: u8,
    pub support: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongPlan {
    pub key: Key,
    pub tempo_bpm: u32,
    pub total_measures: usize,
    pub instruments: Instruments,
}

impl SongPlan {
    /// Draw a fresh plan from the configured ranges.
    pub fn random(config: &ComposerConfig, rng: &mut SongRng) -> Self {
        let p = &config.planner;
        let tempo_bpm = rng.triangular(p.tempo_low, p.tempo_high, p.tempo_mode) as u32;
        let duration_secs = rng.range_u32_inclusive(p.duration_min_secs, p.duration_max_secs);
        let total_measures = measures_for_duration(duration_secs, tempo_bpm);

        let root = rng.range_u32_inclusive(p.root_min as u32, p.root_max as u32) as u8;
        let scale = *rng.choose(&ScaleType::ALL);

        let pools = &config.instruments;
        let instruments = Instruments {
            lead: *rng.choose(&pools.primary),
            support: *rng.choose(&pools.support),
            bass: *rng.choose(&pools.bass),
        };

        SongPlan {
            key: Key::new(root, scale),
            tempo_bpm,
            total_measures,
            instruments,
        }
    }

    /// Song length in seconds at this plan's tempo.
    pub fn duration_secs(&self) -> f64 {
        self.total_measures as f64 * measure_secs(self.tempo_bpm)
    }
}

/// Seconds per 4/4 measure.
pub fn measure_secs(tempo_bpm: u32) -> f64 {
    60.0 / tempo_bpm as f64 * BEATS_PER_MEASURE as f64
}

/// Whole measures that fit in `duration_secs` at `tempo_bpm`.
pub fn measures_for_duration(duration_secs: u32, tempo_bpm: u32) -> usize {
    // duration / (240 / bpm), kept in integers so the floor is exact.
    (duration_secs as u64 * tempo_bpm as u64 / (60 * BEATS_PER_MEASURE as u64)) as usize
}
