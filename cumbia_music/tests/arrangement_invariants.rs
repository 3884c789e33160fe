// End-to-end checks on whole arrangements: scale membership, barline
// alignment across voices, and reproducibility from a seed.

use cumbia_music::arrangement::{Arrangement, compose};
use cumbia_music::assembler::{EventKind, Role};
use cumbia_music::config::{ComposerConfig, STEPS_PER_MEASURE};
use cumbia_music::midi::encode_midi;
use cumbia_music::motif::{LibraryEntry, Motif, MotifLibrary};
use cumbia_music::plan::SongPlan;
use cumbia_prng::SongRng;

fn compose_with(config: &ComposerConfig, seed: u64) -> Arrangement {
    let mut rng = SongRng::new(seed);
    let plan = SongPlan::random(config, &mut rng);
    compose(&plan, config, &mut rng)
}

fn assert_invariants(song: &Arrangement, config: &ComposerConfig) {
    let measure_ticks = config.timing.ticks_per_step() * STEPS_PER_MEASURE as u32;
    let key = song.meta.key;

    for track in &song.tracks {
        assert_eq!(track.measure_count(), song.meta.total_measures);
        for m in 0..track.measure_count() {
            assert_eq!(
                track.measure_ticks(m),
                measure_ticks,
                "{} measure {m} is misaligned",
                track.role.name()
            );
        }
        if track.role != Role::Drums {
            for pitch in track.sounding_pitches() {
                assert!(
                    key.contains(pitch as i32),
                    "{} played {pitch}, outside {}",
                    track.role.name(),
                    key.name()
                );
            }
        }
        assert!(track.events.iter().all(|e| e.channel == track.role.channel()));
    }
}

#[test]
fn invariants_hold_across_many_seeds() {
    let config = ComposerConfig::default();
    for seed in 0..40 {
        let song = compose_with(&config, seed);
        assert_invariants(&song, &config);
    }
}

#[test]
fn same_seed_gives_identical_streams_and_bytes() {
    let config = ComposerConfig::default();
    let a = compose_with(&config, 0xC0FFEE);
    let b = compose_with(&config, 0xC0FFEE);
    assert_eq!(a, b);
    assert_eq!(encode_midi(&a).unwrap(), encode_midi(&b).unwrap());
}

#[test]
fn different_seeds_diverge() {
    let config = ComposerConfig::default();
    let a = compose_with(&config, 1);
    let b = compose_with(&config, 2);
    assert_ne!(a.tracks, b.tracks);
}

#[test]
fn odd_length_motifs_stay_aligned() {
    let mut config = ComposerConfig::default();
    config.motifs = MotifLibrary {
        entries: vec![
            LibraryEntry { motif: Motif::new(vec![0, 3, -2, 6, 1]), copies: 4 },
            LibraryEntry { motif: Motif::new(vec![7]), copies: 2 },
        ],
    };
    config.validate().unwrap();
    for seed in 0..10 {
        let song = compose_with(&config, seed);
        assert_invariants(&song, &config);
    }
}

#[test]
fn finer_tick_resolution_stays_aligned() {
    let config = ComposerConfig::from_json(r#"{"timing": {"ticks_per_beat": 96}}"#).unwrap();
    let song = compose_with(&config, 77);
    assert_invariants(&song, &config);
}

#[test]
fn drum_track_plays_exactly_the_drum_sequence() {
    let config = ComposerConfig::default();
    let song = compose_with(&config, 5);
    let drums = song.track(Role::Drums);
    for (m, pattern) in song.drums.iter().enumerate() {
        let played: Vec<u8> = drums
            .measure_events(m)
            .iter()
            .filter(|e| e.kind == EventKind::On)
            .map(|e| e.pitch)
            .collect();
        let expected: Vec<u8> = pattern.slots.iter().flatten().copied().collect();
        assert_eq!(played, expected, "measure {m}");
    }
}

#[test]
fn bass_stays_under_the_root() {
    let config = ComposerConfig::default();
    for seed in 0..10 {
        let song = compose_with(&config, seed);
        let root = song.meta.key.root;
        // One octave down plus at most a seventh of motif rise.
        for pitch in song.track(Role::Bass).sounding_pitches() {
            assert!(pitch < root, "bass {pitch} at or above root {root}");
        }
    }
}

#[test]
fn extreme_octave_offsets_fold_into_scale() {
    let mut config = ComposerConfig::default();
    config.voices.bass_octave = -5;
    config.voices.lead_octave = 5;
    config.voices.support_octave = 5;
    config.validate().unwrap();
    for seed in 0..5 {
        let song = compose_with(&config, seed);
        assert_invariants(&song, &config);
        for track in &song.tracks {
            assert!(track.sounding_pitches().all(|p| p <= 127));
        }
    }
}

#[test]
fn midi_rejects_tempo_below_field_range() {
    let config = ComposerConfig::default();
    let mut song = compose_with(&config, 3);
    song.meta.tempo_bpm = 3;
    assert!(encode_midi(&song).is_err());
    song.meta.tempo_bpm = 4;
    assert!(encode_midi(&song).is_ok());
}
