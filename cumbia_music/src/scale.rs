// Key and scale support: the pitch vocabulary every voice draws from.
//
// A run picks one `Key` (root pitch plus major or minor scale) at startup and
// never modulates. Motifs are written as scale-degree offsets that get added
// to the root as raw semitones, so most candidates land off the scale; the
// quantizer walks them back onto it.
//
// The quantizer's walk direction is drawn once per call and then held fixed,
// so given the direction the result is a pure function of the candidate.
// `quantize_toward` exposes that deterministic core for tests and callers
// that already know which way they want to lean.
//
// Used by voice.rs for every melodic pitch and by plan.rs to draw the key.

use cumbia_prng::SongRng;
use serde::{Deserialize, Serialize};

/// The two scale types the generator writes in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScaleType {
    Major,
    Minor,
}

impl ScaleType {
    pub const ALL: [ScaleType; 2] = [ScaleType::Major, ScaleType::Minor];

    /// Semitone offsets from the root for the seven scale degrees.
    pub fn intervals(self) -> [u8; 7] {
        match self {
            ScaleType::Major => [0, 2, 4, 5, 7, 9, 11],
            ScaleType::Minor => [0, 2, 3, 5, 7, 8, 10],
        }
    }

    /// Pitch-class membership table indexed by offset from the root.
    pub fn pitch_classes(self) -> [bool; 12] {
        let mut pcs = [false; 12];
        for &interval in &self.intervals() {
            pcs[interval as usize] = true;
        }
        pcs
    }
}

/// Which way the quantizer walks from an off-scale candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    fn step(self) -> i32 {
        match self {
            Direction::Up => 1,
            Direction::Down => -1,
        }
    }

    pub fn random(rng: &mut SongRng) -> Self {
        if rng.random_sign() > 0 {
            Direction::Up
        } else {
            Direction::Down
        }
    }
}

/// A root pitch plus scale, frozen for the whole arrangement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Key {
    /// MIDI pitch of the root (48..=59 when drawn by the planner).
    pub root: u8,
    pub scale: ScaleType,
}

impl Key {
    pub fn new(root: u8, scale: ScaleType) -> Self {
        Key { root, scale }
    }

    /// Check whether a pitch belongs to this key's scale.
    pub fn contains(&self, pitch: i32) -> bool {
        let offset = (pitch - self.root as i32).rem_euclid(12);
        self.scale.pitch_classes()[offset as usize]
    }

    /// Snap a candidate onto the scale, walking in a randomly drawn direction.
    ///
    /// The direction is drawn even when the candidate is already in scale,
    /// so the number of RNG draws per call is constant.
    pub fn quantize(&self, candidate: i32, rng: &mut SongRng) -> i32 {
        let direction = Direction::random(rng);
        self.quantize_toward(candidate, direction)
    }

    /// Walk one semitone at a time in `direction` until the pitch is in scale.
    ///
    /// A seven-note scale has no gap wider than two semitones, so this takes
    /// at most one step for the built-in scales.
    pub fn quantize_toward(&self, candidate: i32, direction: Direction) -> i32 {
        let mut pitch = candidate;
        while !self.contains(pitch) {
            pitch += direction.step();
        }
        pitch
    }

    /// Pitch of a scale degree (0-based, within one octave) above the root,
    /// shifted by `octave` octaves.
    pub fn degree_pitch(&self, degree: usize, octave: i32) -> i32 {
        let intervals = self.scale.intervals();
        self.root as i32 + intervals[degree % intervals.len()] as i32 + 12 * octave
    }

    pub fn name(&self) -> String {
        let scale = match self.scale {
            ScaleType::Major => "major",
            ScaleType::Minor => "minor",
        };
        format!("{}{} {}", pitch_name(self.root), self.root / 12 - 1, scale)
    }
}

/// Fold a signed pitch into the MIDI range by whole octaves.
///
/// Octave shifts keep the pitch class, so an in-scale pitch stays in scale.
pub fn to_midi_pitch(pitch: i32) -> u8 {
    let folded = if pitch < 0 {
        pitch.rem_euclid(12)
    } else if pitch > 127 {
        127 - (127 - pitch).rem_euclid(12)
    } else {
        pitch
    };
    folded as u8
}

fn pitch_name(pitch: u8) -> &'static str {
    match pitch % 12 {
        0 => "C",
        1 => "C#",
        2 => "D",
        3 => "Eb",
        4 => "E",
        5 => "F",
        6 => "F#",
        7 => "G",
        8 => "Ab",
        9 => "A",
        10 => "Bb",
        _ => "B",
    }
}
