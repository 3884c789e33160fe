// Whole-song composition: plan in, four tracks out.
//
// Pipeline, with every random draw taken from the caller's `SongRng`:
//   1. motif sequence (motif.rs)
//   2. drum sequence (drums.rs)
//   3. bass, lead, support tracks (voice.rs + behavior.rs)
//   4. percussion track
//
// The same plan, config and RNG state always produce the same arrangement.
// The result carries everything a file writer needs (midi.rs) and nothing
// about where it will be written.

use crate::assembler::{Role, Track};
use crate::behavior::{BassBehavior, LeadBehavior, SupportBehavior};
use crate::config::{BEATS_PER_MEASURE, ComposerConfig};
use crate::drums::{DrumPattern, build_drum_sequence};
use crate::motif::{MotifSequence, build_motif_sequence};
use crate::plan::SongPlan;
use crate::scale::Key;
use crate::voice::{build_drum_track, build_voice_track};
use cumbia_prng::SongRng;
use tracing::debug;

/// Global metadata for the file writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SongMeta {
    pub tempo_bpm: u32,
    pub ticks_per_beat: u32,
    /// Numerator and denominator.
    pub time_signature: (u8, u8),
    pub key: Key,
    pub total_measures: usize,
}

/// A composed song.
#[derive(Debug, Clone, PartialEq)]
pub struct Arrangement {
    pub meta: SongMeta,
    /// Bass, lead, support, drums, in that order.
    pub tracks: Vec<Track>,
    pub motifs: MotifSequence,
    pub drums: Vec<DrumPattern>,
}

impl Arrangement {
    pub fn track(&self, role: Role) -> &Track {
        self.tracks
            .iter()
            .find(|t| t.role == role)
            .unwrap_or_else(|| panic!("arrangement is missing its {} track", role.name()))
    }
}

/// Compose an arrangement from a frozen plan.
pub fn compose(plan: &SongPlan, config: &ComposerConfig, rng: &mut SongRng) -> Arrangement {
    let timing = &config.timing;
    let voices = &config.voices;
    let key = &plan.key;

    let motifs = build_motif_sequence(&config.motifs, plan.total_measures, rng);
    let drums = build_drum_sequence(&config.drums, plan.total_measures, rng);

    let bass = build_voice_track::<BassBehavior>(
        Role::Bass,
        plan.instruments.bass,
        voices.bass_octave,
        key,
        &motifs,
        timing,
        rng,
    );
    let lead = build_voice_track::<LeadBehavior>(
        Role::Lead,
        plan.instruments.lead,
        voices.lead_octave,
        key,
        &motifs,
        timing,
        rng,
    );
    let support = build_voice_track::<SupportBehavior>(
        Role::Support,
        plan.instruments.support,
        voices.support_octave,
        key,
        &motifs,
        timing,
        rng,
    );
    let percussion = build_drum_track(&drums, timing);

    let tracks = vec![bass, lead, support, percussion];
    debug!(
        measures = plan.total_measures,
        events = tracks.iter().map(|t| t.events.len()).sum::<usize>(),
        "composed arrangement"
    );

    Arrangement {
        meta: SongMeta {
            tempo_bpm: plan.tempo_bpm,
            ticks_per_beat: timing.ticks_per_beat,
            time_signature: (BEATS_PER_MEASURE as u8, 4),
            key: plan.key,
            total_measures: plan.total_measures,
        },
        tracks,
        motifs,
        drums,
    }
}
