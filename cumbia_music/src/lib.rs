// Cumbia Arrangement Generator
//
// Procedurally composes a four-part cumbia arrangement (bass, lead, support,
// percussion) in a randomly drawn key, as per-voice streams of timed note
// events. Every pitch is snapped to the key's scale and every voice stays
// locked to the barline, however dense its rhythm for a given measure.
//
// Architecture:
// - scale.rs: Keys, major/minor scales, the directional scale quantizer
// - motif.rs: Motif library, working-set selection, per-measure motif sequence
// - drums.rs: Drum patterns and fills, block-repeated drum sequence
// - assembler.rs: Note events, tracks, and the measure-checked TrackBuilder
// - behavior.rs: Per-voice behavior catalogs and measure rendering
// - voice.rs: Track builders that drive behaviors measure by measure
// - arrangement.rs: Whole-song composition from a plan
// - plan.rs: Tempo, length, key and instrument draws
// - config.rs: All tunables, loadable from JSON
// - midi.rs: Standard MIDI File output
// - output.rs: Auto-numbered output paths
// - error.rs: Error type for config and file I/O
//
// The generator is deterministic given a seed: all randomness flows through
// one `cumbia_prng::SongRng` passed by the caller.

pub mod arrangement;
pub mod assembler;
pub mod behavior;
pub mod config;
pub mod drums;
pub mod error;
pub mod midi;
pub mod motif;
pub mod output;
pub mod plan;
pub mod scale;
pub mod voice;

pub use error::{ComposerError, Result};
