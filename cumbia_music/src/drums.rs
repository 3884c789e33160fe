// Drum pattern sequencing for the percussion track.
//
// A drum pattern is one measure of sixteen slots, each a General MIDI
// percussion note or silent. The sequencer builds the whole run's drum part
// in blocks: pick a pattern, repeat it 2 or 4 times, and give each repeat an
// independent coin flip for a fill over its last four slots. Blocks are
// concatenated until the measure count is reached and the overshoot is
// dropped.
//
// Rendering to events lives in voice.rs (`render_drum_measure`) so all four
// tracks share the same assembler discipline.

use crate::config::STEPS_PER_MEASURE;
use cumbia_prng::SongRng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Number of trailing slots a fill replaces.
pub const FILL_LEN: usize = 4;

/// Chance that a repeated pattern instance gets a fill.
const FILL_PROBABILITY: f64 = 0.5;

/// Block repeat counts, drawn uniformly.
const REPEAT_COUNTS: [usize; 2] = [2, 4];

/// One slot: a percussion note number, or `None` for silence.
pub type DrumSlot = Option<u8>;

/// One measure of percussion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DrumPattern {
    pub slots: Vec<DrumSlot>,
}

impl DrumPattern {
    pub fn new(slots: Vec<DrumSlot>) -> Self {
        DrumPattern { slots }
    }

    /// Overwrite the trailing slots with a fill.
    ///
    /// A fill shorter than `FILL_LEN` still lands flush against the end.
    pub fn apply_fill(&mut self, fill: &[DrumSlot]) {
        let start = self.slots.len().saturating_sub(fill.len());
        let take = fill.len().min(self.slots.len());
        self.slots[start..].copy_from_slice(&fill[fill.len() - take..]);
    }
}

/// Pattern and fill pools for the percussion voice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrumKit {
    pub patterns: Vec<DrumPattern>,
    pub fills: Vec<Vec<DrumSlot>>,
}

impl Default for DrumKit {
    fn default() -> Self {
        DrumKit::cumbia()
    }
}

impl DrumKit {
    /// The built-in cumbia grooves and fills.
    ///
    /// Notes: 36 kick, 38 snare, 41/45 toms, 42 closed hat, 46 open hat,
    /// 49 crash, 51 ride, 56 cowbell, 70 maracas.
    pub fn cumbia() -> Self {
        const X: DrumSlot = None;
        let p = |slots: [DrumSlot; 16]| DrumPattern::new(slots.to_vec());
        DrumKit {
            patterns: vec![
                p([
                    Some(36), X, Some(70), Some(70), Some(38), X, Some(70), Some(70), Some(36), X,
                    Some(70), Some(70), Some(38), X, Some(70), Some(70),
                ]),
                p([
                    Some(56), X, Some(38), Some(42), Some(36), X, Some(41), Some(42), Some(56), X,
                    Some(38), Some(42), Some(36), Some(42), Some(41), Some(42),
                ]),
                p([
                    Some(70), X, Some(70), Some(70), Some(70), X, Some(70), Some(70), Some(70), X,
                    Some(70), Some(70), Some(70), X, Some(70), Some(70),
                ]),
                p([
                    Some(36), X, Some(56), Some(56), Some(56), X, Some(56), Some(56), Some(36), X,
                    Some(56), Some(56), Some(56), X, Some(56), Some(56),
                ]),
                p([
                    Some(36), X, Some(42), X, Some(38), X, Some(42), X, Some(36), X, Some(42),
                    Some(56), Some(38), Some(56), Some(42), Some(56),
                ]),
                p([
                    Some(36), X, X, X, Some(36), X, X, X, Some(36), X, X, X, Some(36), X, X, X,
                ]),
            ],
            fills: vec![
                vec![Some(38), Some(38), Some(38), Some(38)],
                vec![Some(49), Some(42), Some(56), Some(56)],
                vec![Some(41), Some(41), Some(36), X],
                vec![Some(49), X, X, X],
                vec![Some(41), Some(45), Some(41), Some(45)],
                vec![Some(51), Some(46), Some(51), Some(46)],
            ],
        }
    }
}

/// Build the drum part: exactly `total_measures` patterns.
pub fn build_drum_sequence(
    kit: &DrumKit,
    total_measures: usize,
    rng: &mut SongRng,
) -> Vec<DrumPattern> {
    let mut sequence = Vec::with_capacity(total_measures + 3);
    let mut blocks = 0usize;
    let mut fills = 0usize;

    while sequence.len() < total_measures {
        let block = rng.choose(&kit.patterns);
        let repeat = *rng.choose(&REPEAT_COUNTS);
        for _ in 0..repeat {
            let mut measure = block.clone();
            if rng.random_bool(FILL_PROBABILITY) {
                let fill: &Vec<DrumSlot> = rng.choose(&kit.fills);
                measure.apply_fill(fill);
                fills += 1;
            }
            sequence.push(measure);
        }
        blocks += 1;
    }
    sequence.truncate(total_measures);

    debug!(blocks, fills, total_measures, "built drum sequence");
    debug_assert!(sequence.iter().all(|m| m.slots.len() == STEPS_PER_MEASURE));
    sequence
}
