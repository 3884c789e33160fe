// Data-driven generator configuration.
//
// Every tunable of a run lives in `ComposerConfig`: timing resolution,
// planner ranges, instrument pools, voice octaves, the motif library and the
// drum kit. All fields have defaults reproducing the stock cumbia generator,
// so an empty JSON object is a valid config and a config file only needs to
// name what it changes.
//
// The measure grid itself (4/4, sixteen steps per measure) is fixed: the
// behavior onset tables in behavior.rs are written against it.
//
// Loaded once by main.rs and passed by reference into plan.rs and
// arrangement.rs. `validate` runs on every load and rejects values that would
// break the measure-duration invariant or make sampling impossible.

use crate::drums::{DrumKit, FILL_LEN};
use crate::error::{ComposerError, Result};
use crate::motif::MotifLibrary;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Sixteenth-note steps per quarter-note beat.
pub const STEPS_PER_BEAT: u32 = 4;
/// Beats per measure (4/4 time).
pub const BEATS_PER_MEASURE: u32 = 4;
/// Steps per measure.
pub const STEPS_PER_MEASURE: usize = (STEPS_PER_BEAT * BEATS_PER_MEASURE) as usize;

/// Slowest tempo whose quarter-note length fits a MIDI tempo event (24 bits
/// of microseconds).
pub const MIN_TEMPO_BPM: f64 = 4.0;

/// Voice octave offsets are limited to this many octaves either way.
pub const MAX_OCTAVE_OFFSET: i32 = 5;

// ---------------------------------------------------------------------------
// Parameter groups
// ---------------------------------------------------------------------------

/// Tick resolution of the event stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// MIDI ticks per quarter note.
    pub ticks_per_beat: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        TimingConfig { ticks_per_beat: 480 }
    }
}

impl TimingConfig {
    pub fn ticks_per_step(&self) -> u32 {
        self.ticks_per_beat / STEPS_PER_BEAT
    }

    pub fn ticks_per_measure(&self) -> u32 {
        self.ticks_per_step() * STEPS_PER_MEASURE as u32
    }
}

/// Ranges the run planner draws tempo, length and key root from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Triangular tempo distribution (BPM): low, high, and mode.
    pub tempo_low: f64,
    pub tempo_high: f64,
    pub tempo_mode: f64,
    /// Target song length in seconds, drawn uniformly (inclusive).
    pub duration_min_secs: u32,
    pub duration_max_secs: u32,
    /// Key root MIDI pitch, drawn uniformly (inclusive).
    pub root_min: u8,
    pub root_max: u8,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        PlannerConfig {
            tempo_low: 80.0,
            tempo_high: 110.0,
            tempo_mode: 95.0,
            duration_min_secs: 60,
            duration_max_secs: 90,
            root_min: 48,
            root_max: 59,
        }
    }
}

/// General MIDI program pools, one per pitched voice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstrumentPools {
    pub primary: Vec<u8>,
    pub support: Vec<u8>,
    pub bass: Vec<u8>,
}

impl Default for InstrumentPools {
    fn default() -> Self {
        InstrumentPools {
            primary: vec![21, 28, 1, 65, 81, 19],
            support: vec![81, 82, 83, 88, 89, 65, 57, 21, 1, 19, 25, 30],
            bass: vec![33, 38, 39, 5, 1],
        }
    }
}

/// Octave offsets relative to the key root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    pub bass_octave: i32,
    pub lead_octave: i32,
    pub support_octave: i32,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        VoiceConfig {
            bass_octave: -1,
            lead_octave: 1,
            support_octave: 1,
        }
    }
}

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposerConfig {
    pub timing: TimingConfig,
    pub planner: PlannerConfig,
    pub instruments: InstrumentPools,
    pub voices: VoiceConfig,
    pub motifs: MotifLibrary,
    pub drums: DrumKit,
}

impl ComposerConfig {
    /// Load and validate a JSON config file.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json(&data)
    }

    /// Parse and validate a JSON config string.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: ComposerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would break timing or sampling.
    pub fn validate(&self) -> Result<()> {
        let tpb = self.timing.ticks_per_beat;
        // Double-rhythm notes are half a step long, so a step must split evenly.
        if tpb == 0 || tpb % (STEPS_PER_BEAT * 2) != 0 {
            return Err(ComposerError::invalid_config(format!(
                "ticks_per_beat must be a positive multiple of {}, got {tpb}",
                STEPS_PER_BEAT * 2
            )));
        }
        if tpb > u16::MAX as u32 >> 1 {
            return Err(ComposerError::invalid_config(format!(
                "ticks_per_beat {tpb} does not fit MIDI metrical timing"
            )));
        }

        let p = &self.planner;
        if !(p.tempo_low >= MIN_TEMPO_BPM && p.tempo_low < p.tempo_high) {
            return Err(ComposerError::invalid_config(format!(
                "tempo range must satisfy {MIN_TEMPO_BPM} <= tempo_low < tempo_high"
            )));
        }
        if !p.tempo_high.is_finite() {
            return Err(ComposerError::invalid_config("tempo_high must be finite"));
        }
        if !(p.tempo_low..=p.tempo_high).contains(&p.tempo_mode) {
            return Err(ComposerError::invalid_config("tempo_mode must lie within the tempo range"));
        }
        if p.duration_min_secs > p.duration_max_secs {
            return Err(ComposerError::invalid_config(
                "duration_min_secs exceeds duration_max_secs",
            ));
        }
        if p.root_min > p.root_max || p.root_max > 127 {
            return Err(ComposerError::invalid_config(
                "root range must be ordered and within 0..=127",
            ));
        }

        let v = &self.voices;
        for (name, octave) in [
            ("bass", v.bass_octave),
            ("lead", v.lead_octave),
            ("support", v.support_octave),
        ] {
            if !(-MAX_OCTAVE_OFFSET..=MAX_OCTAVE_OFFSET).contains(&octave) {
                return Err(ComposerError::invalid_config(format!(
                    "{name}_octave {octave} is outside -{MAX_OCTAVE_OFFSET}..={MAX_OCTAVE_OFFSET}"
                )));
            }
        }

        for (name, pool) in [
            ("primary", &self.instruments.primary),
            ("support", &self.instruments.support),
            ("bass", &self.instruments.bass),
        ] {
            if pool.is_empty() {
                return Err(ComposerError::invalid_config(format!(
                    "{name} instrument pool is empty"
                )));
            }
            if let Some(program) = pool.iter().find(|&&p| p > 127) {
                return Err(ComposerError::invalid_config(format!(
                    "{name} instrument {program} is not a MIDI program"
                )));
            }
        }

        self.motifs.validate()?;

        if self.drums.patterns.is_empty() || self.drums.fills.is_empty() {
            return Err(ComposerError::invalid_config("drum kit needs patterns and fills"));
        }
        if let Some(bad) = self
            .drums
            .patterns
            .iter()
            .find(|p| p.slots.len() != STEPS_PER_MEASURE)
        {
            return Err(ComposerError::invalid_config(format!(
                "drum patterns must have {STEPS_PER_MEASURE} slots, found {}",
                bad.slots.len()
            )));
        }
        if self.drums.fills.iter().any(|f| f.is_empty() || f.len() > FILL_LEN) {
            return Err(ComposerError::invalid_config(format!(
                "drum fills must have 1..={FILL_LEN} slots"
            )));
        }
        Ok(())
    }
}
