// Motif library and the two-stage motif selection.
//
// A motif is a melodic contour written as scale-degree offsets, one per
// step. The library stores each distinct contour once together with a
// `copies` multiplicity; the working-set draw treats the library as a
// virtual pool where each motif appears `copies` times and samples from it
// without replacement. With four contours at ten copies each that matches a
// flat pool of forty entries without storing the duplicates.
//
// Selection runs in two stages:
// 1. Draw a small working set (3..=10 motifs, weighted toward 6).
// 2. For each measure, pick one working-set motif uniformly, with
//    replacement. Reusing a small set is what makes themes recur.
//
// The motif sequence is read-only input to voice.rs.

use crate::error::{ComposerError, Result};
use cumbia_prng::SongRng;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Working-set sizes and their relative weights.
const WORKING_SET_SIZES: [usize; 8] = [3, 4, 5, 6, 7, 8, 9, 10];
const WORKING_SET_WEIGHTS: [u32; 8] = [1, 3, 6, 8, 6, 4, 2, 1];

/// A melodic contour: one scale-degree offset per step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Motif {
    pub degrees: Vec<i8>,
}

impl Motif {
    pub fn new(degrees: Vec<i8>) -> Self {
        Motif { degrees }
    }

    pub fn len(&self) -> usize {
        self.degrees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.degrees.is_empty()
    }

    /// Degree offset at a step, wrapping around the motif's own length.
    ///
    /// Panics on an empty motif.
    pub fn degree_at(&self, step: usize) -> i32 {
        assert!(!self.degrees.is_empty(), "motif must have at least one degree");
        self.degrees[step % self.degrees.len()] as i32
    }
}

/// One distinct contour plus how many times it sits in the virtual pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryEntry {
    pub motif: Motif,
    #[serde(default = "default_copies")]
    pub copies: u32,
}

fn default_copies() -> u32 {
    10
}

/// Deduplicated motif library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotifLibrary {
    pub entries: Vec<LibraryEntry>,
}

impl Default for MotifLibrary {
    fn default() -> Self {
        MotifLibrary::default_library()
    }
}

impl MotifLibrary {
    /// Load and validate a library from JSON.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let lib: MotifLibrary = serde_json::from_str(&data)?;
        lib.validate()?;
        debug!(contours = lib.len(), pool = lib.pool_size(), "loaded motif library");
        Ok(lib)
    }

    /// The pool must be drawable and every motif must have a degree.
    pub fn validate(&self) -> Result<()> {
        if self.pool_size() == 0 {
            return Err(ComposerError::invalid_config("motif library has no motifs"));
        }
        if self.entries.iter().any(|e| e.motif.is_empty()) {
            return Err(ComposerError::invalid_config("motifs must have at least one degree"));
        }
        Ok(())
    }

    /// The four built-in cumbia contours, ten copies each.
    pub fn default_library() -> Self {
        let contours: [[i8; 16]; 4] = [
            // Rise to the fifth and fall back, twice
            [0, 2, 4, 5, 4, 2, 0, 2, 4, 7, 5, 4, 2, 1, 0, 1],
            // Paired steps up and back, dipping below the root
            [0, 0, 2, 2, 4, 4, 5, 5, 4, 4, 2, 2, 0, 0, -1, -1],
            // Wide arch then descent under the root
            [0, 3, 5, 7, 5, 3, 0, 2, 4, 6, 4, 2, 0, -2, -4, -5],
            // Neighbor-note turn climbing to the sixth
            [0, 1, 0, 2, 3, 2, 4, 5, 4, 5, 4, 2, 3, 2, 1, 0],
        ];
        MotifLibrary {
            entries: contours
                .iter()
                .map(|c| LibraryEntry {
                    motif: Motif::new(c.to_vec()),
                    copies: default_copies(),
                })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Size of the virtual pool the working set is drawn from.
    pub fn pool_size(&self) -> usize {
        self.entries.iter().map(|e| e.copies as usize).sum()
    }

    /// Draw a working set of `k` motifs without replacement from the virtual
    /// pool. Each draw picks a library entry weighted by its remaining copies.
    ///
    /// Panics if `k` exceeds the pool size.
    pub fn draw_working_set(&self, k: usize, rng: &mut SongRng) -> Vec<Motif> {
        assert!(
            k <= self.pool_size(),
            "working set of {k} exceeds motif pool of {}",
            self.pool_size()
        );
        let mut remaining: Vec<u32> = self.entries.iter().map(|e| e.copies).collect();
        let mut chosen = Vec::with_capacity(k);
        for _ in 0..k {
            let idx = rng.weighted_index(&remaining);
            remaining[idx] -= 1;
            chosen.push(self.entries[idx].motif.clone());
        }
        chosen
    }
}

/// Draw the working-set size from 3..=10, weighted toward the middle.
pub fn draw_working_set_size(rng: &mut SongRng) -> usize {
    WORKING_SET_SIZES[rng.weighted_index(&WORKING_SET_WEIGHTS)]
}

/// One motif per measure plus the working set it was drawn from.
#[derive(Debug, Clone, PartialEq)]
pub struct MotifSequence {
    pub working_set: Vec<Motif>,
    pub measures: Vec<Motif>,
}

impl MotifSequence {
    pub fn len(&self) -> usize {
        self.measures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.measures.is_empty()
    }

    pub fn get(&self, measure: usize) -> &Motif {
        &self.measures[measure]
    }
}

/// Build the motif sequence for `total_measures` measures.
///
/// Working-set size is capped at the pool size so small custom libraries
/// still produce a sequence.
pub fn build_motif_sequence(
    library: &MotifLibrary,
    total_measures: usize,
    rng: &mut SongRng,
) -> MotifSequence {
    let k = draw_working_set_size(rng).min(library.pool_size());
    let working_set = library.draw_working_set(k, rng);
    debug!(working_set = k, total_measures, "selected motif working set");

    let measures = (0..total_measures)
        .map(|_| rng.choose(&working_set).clone())
        .collect();

    MotifSequence {
        working_set,
        measures,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_library_is_deduplicated() {
        let lib = MotifLibrary::default_library();
        assert_eq!(lib.len(), 4);
        assert_eq!(lib.pool_size(), 40);
        for (i, a) in lib.entries.iter().enumerate() {
            assert_eq!(a.motif.len(), 16);
            for b in &lib.entries[i + 1..] {
                assert_ne!(a.motif, b.motif);
            }
        }
    }

    #[test]
    fn test_degree_at_wraps_per_motif_length() {
        let m = Motif::new(vec![0, 2, 4]);
        assert_eq!(m.degree_at(0), 0);
        assert_eq!(m.degree_at(4), 2);
        assert_eq!(m.degree_at(17), 4);
    }

    #[test]
    #[should_panic(expected = "at least one degree")]
    fn test_empty_motif_panics() {
        Motif::new(vec![]).degree_at(0);
    }

    #[test]
    fn test_working_set_size_range() {
        let mut rng = SongRng::new(4);
        let mut counts = [0u32; 11];
        for _ in 0..5000 {
            let k = draw_working_set_size(&mut rng);
            assert!((3..=10).contains(&k));
            counts[k] += 1;
        }
        // 6 carries the heaviest weight.
        let max = counts.iter().enumerate().max_by_key(|&(_, c)| *c).map(|(i, _)| i);
        assert_eq!(max, Some(6));
    }

    #[test]
    fn test_working_set_respects_copy_counts() {
        let lib = MotifLibrary {
            entries: vec![
                LibraryEntry { motif: Motif::new(vec![0]), copies: 1 },
                LibraryEntry { motif: Motif::new(vec![1]), copies: 2 },
            ],
        };
        let mut rng = SongRng::new(8);
        for _ in 0..100 {
            let set = lib.draw_working_set(3, &mut rng);
            let zeros = set.iter().filter(|m| m.degrees == [0]).count();
            let ones = set.iter().filter(|m| m.degrees == [1]).count();
            assert_eq!((zeros, ones), (1, 2));
        }
    }

    #[test]
    #[should_panic(expected = "exceeds motif pool")]
    fn test_oversized_working_set_panics() {
        let lib = MotifLibrary::default_library();
        lib.draw_working_set(41, &mut SongRng::new(1));
    }

    #[test]
    fn test_sequence_length_and_membership() {
        let lib = MotifLibrary::default_library();
        let mut rng = SongRng::new(42);
        for measures in [0, 1, 37, 64] {
            let seq = build_motif_sequence(&lib, measures, &mut rng);
            assert_eq!(seq.len(), measures);
            assert!((3..=10).contains(&seq.working_set.len()));
            for m in &seq.measures {
                assert!(seq.working_set.contains(m));
            }
        }
    }

    #[test]
    fn test_library_json_roundtrip() {
        let lib = MotifLibrary::default_library();
        let json = serde_json::to_string(&lib).unwrap();
        let back: MotifLibrary = serde_json::from_str(&json).unwrap();
        assert_eq!(lib, back);
    }

    #[test]
    fn test_copies_default_when_missing() {
        let lib: MotifLibrary =
            serde_json::from_str(r#"{"entries":[{"motif":[0,2,4]}]}"#).unwrap();
        assert_eq!(lib.entries[0].copies, 10);
    }

    #[test]
    fn test_load_valid_library_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("motifs.json");
        std::fs::write(
            &path,
            r#"{"entries":[{"motif":[0,2,4],"copies":3},{"motif":[-1,1]}]}"#,
        )
        .unwrap();
        let lib = MotifLibrary::load(&path).unwrap();
        assert_eq!(lib.len(), 2);
        assert_eq!(lib.pool_size(), 13);
        assert_eq!(lib.entries[1].motif.degree_at(3), 1);
    }

    #[test]
    fn test_load_rejects_empty_motif() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("motifs.json");
        std::fs::write(&path, r#"{"entries":[{"motif":[0,2]},{"motif":[]}]}"#).unwrap();
        let err = MotifLibrary::load(&path).unwrap_err();
        assert!(matches!(err, ComposerError::InvalidConfig(_)));
    }

    #[test]
    fn test_load_rejects_zero_pool() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("motifs.json");
        std::fs::write(&path, r#"{"entries":[{"motif":[0,2],"copies":0}]}"#).unwrap();
        assert!(MotifLibrary::load(&path).is_err());
    }
}
