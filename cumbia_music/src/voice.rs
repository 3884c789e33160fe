// Track builders: one measure at a time, one voice at a time.
//
// A pitched voice walks the motif sequence, draws a behavior for each
// measure from its catalog (behavior.rs) and renders it. The percussion
// voice walks the drum sequence instead. Both write through a
// `TrackBuilder`, so each measure is checked to last exactly one measure.
//
// Voices share nothing mutable except the RNG; each reads the same frozen
// key, motif sequence and drum sequence.

use crate::assembler::{Role, Track, TrackBuilder};
use crate::behavior::{MeasureContext, VoiceBehavior};
use crate::config::TimingConfig;
use crate::drums::DrumPattern;
use crate::motif::MotifSequence;
use crate::scale::Key;
use cumbia_prng::SongRng;
use tracing::trace;

/// Percussion velocities.
const DRUM_ON_VELOCITY: u8 = 100;
const DRUM_OFF_VELOCITY: u8 = 80;

/// Build a pitched voice's track using behavior catalog `B`.
pub fn build_voice_track<B: VoiceBehavior>(
    role: Role,
    instrument: u8,
    octave: i32,
    key: &Key,
    motifs: &MotifSequence,
    timing: &TimingConfig,
    rng: &mut SongRng,
) -> Track {
    let mut out = TrackBuilder::new(role.channel(), timing.ticks_per_measure());

    for (measure, motif) in motifs.measures.iter().enumerate() {
        let ctx = MeasureContext {
            key,
            motif,
            role,
            octave,
            ticks_per_step: timing.ticks_per_step(),
        };
        let behavior = B::choose(rng);
        trace!(voice = role.name(), measure, behavior = behavior.name(), "render measure");

        out.begin_measure();
        behavior.render(&ctx, &mut out, rng);
        out.end_measure();
    }

    out.finish(role, Some(instrument))
}

/// Render one drum measure: hits last one step, silent slots merge into rests.
pub fn render_drum_measure(pattern: &DrumPattern, out: &mut TrackBuilder, ticks_per_step: u32) {
    for slot in &pattern.slots {
        match slot {
            Some(note) => out.note(*note, DRUM_ON_VELOCITY, DRUM_OFF_VELOCITY, ticks_per_step),
            None => out.rest(ticks_per_step),
        }
    }
}

/// Build the percussion track from a prepared drum sequence.
pub fn build_drum_track(sequence: &[DrumPattern], timing: &TimingConfig) -> Track {
    let mut out = TrackBuilder::new(Role::Drums.channel(), timing.ticks_per_measure());
    for pattern in sequence {
        out.begin_measure();
        render_drum_measure(pattern, &mut out, timing.ticks_per_step());
        out.end_measure();
    }
    out.finish(Role::Drums, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::EventKind;
    use crate::behavior::{BassBehavior, SupportBehavior};
    use crate::drums::DrumKit;
    use crate::motif::{MotifLibrary, build_motif_sequence};
    use crate::scale::ScaleType;

    #[test]
    fn test_drum_measure_events() {
        let kit = DrumKit::cumbia();
        let timing = TimingConfig::default();
        // Kick on every beat, silence between.
        let track = build_drum_track(&kit.patterns[5..6], &timing);
        let step = timing.ticks_per_step();

        assert_eq!(track.channel, 9);
        assert_eq!(track.instrument, None);
        assert_eq!(track.sounding_pitches().collect::<Vec<_>>(), vec![36; 4]);
        // kick on, kick off, rest of 3 steps, repeated 4 times.
        assert_eq!(track.events.len(), 12);
        assert_eq!(track.events[2].delta, 3 * step);
        assert!(track.events[11].is_rest());
        assert_eq!(track.measure_ticks(0), timing.ticks_per_measure());
    }

    #[test]
    fn test_drum_fill_with_trailing_silence() {
        let kit = DrumKit::cumbia();
        let timing = TimingConfig::default();
        let mut pattern = kit.patterns[0].clone();
        pattern.apply_fill(&kit.fills[3]); // crash then three silent slots
        let track = build_drum_track(&[pattern], &timing);
        let last = track.events.last().unwrap();
        assert!(last.is_rest());
        assert_eq!(last.delta, 3 * timing.ticks_per_step());
        assert_eq!(track.measure_ticks(0), timing.ticks_per_measure());
    }

    #[test]
    fn test_voice_track_measures_align() {
        let key = Key::new(52, ScaleType::Minor);
        let timing = TimingConfig::default();
        let mut rng = SongRng::new(2024);
        let motifs = build_motif_sequence(&MotifLibrary::default_library(), 24, &mut rng);

        let bass = build_voice_track::<BassBehavior>(
            Role::Bass,
            33,
            -1,
            &key,
            &motifs,
            &timing,
            &mut rng,
        );
        let support = build_voice_track::<SupportBehavior>(
            Role::Support,
            81,
            1,
            &key,
            &motifs,
            &timing,
            &mut rng,
        );

        for track in [&bass, &support] {
            assert_eq!(track.measure_count(), 24);
            for m in 0..24 {
                assert_eq!(track.measure_ticks(m), timing.ticks_per_measure());
            }
        }
        assert_eq!(bass.instrument, Some(33));
        assert!(bass.events.iter().all(|e| e.channel == 0));
        assert!(support.events.iter().all(|e| e.channel == 2));
    }

    #[test]
    fn test_note_pairs_match() {
        let key = Key::new(50, ScaleType::Major);
        let timing = TimingConfig::default();
        let mut rng = SongRng::new(8);
        let motifs = build_motif_sequence(&MotifLibrary::default_library(), 16, &mut rng);
        let track = build_voice_track::<SupportBehavior>(
            Role::Support,
            1,
            1,
            &key,
            &motifs,
            &timing,
            &mut rng,
        );

        let mut open: Option<u8> = None;
        for e in &track.events {
            match e.kind {
                EventKind::On => {
                    assert!(open.is_none(), "overlapping notes on a monophonic voice");
                    assert_eq!(e.delta, 0);
                    open = Some(e.pitch);
                }
                EventKind::Off if e.is_rest() => assert!(open.is_none()),
                EventKind::Off => assert_eq!(open.take(), Some(e.pitch)),
            }
        }
        assert!(open.is_none());
    }
}
