// Deterministic, portable pseudo-random number generator.
//
// Implements xoshiro256++ (Blackman & Vigna, 2019) with SplitMix64 seeding,
// plus the small sampling toolkit the arrangement generator draws from:
// uniform ranges, Bernoulli trials, uniform choice, weighted choice,
// sampling without replacement, and the triangular distribution used by the
// tempo planner.
//
// This crate is the only source of randomness in `cumbia_music`. Nothing in
// the generator reaches for a process-wide RNG; every generation call takes
// `&mut SongRng`, so a run is fully reproducible from its seed.
//
// **Critical constraint: determinism.** The integer core must produce
// identical output given the same prior state, regardless of platform or
// optimization level. The floating-point helpers (`next_f64`, `triangular`)
// are derived from the integer stream and only use IEEE-exact operations
// plus `sqrt`, which is correctly rounded on every supported target.

use serde::{Deserialize, Serialize};

/// Xoshiro256++ PRNG, the generator's sole source of randomness.
///
/// The CLI creates one `SongRng` per run, seeded from `--seed` or from the
/// clock, and threads it through planning, motif selection, drum sequencing
/// and every voice.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SongRng {
    s: [u64; 4],
}

impl SongRng {
    /// Create a new PRNG seeded from a `u64`.
    ///
    /// Uses SplitMix64 to expand the seed into the 256-bit internal state.
    /// Two `SongRng` instances created with the same seed will produce
    /// identical output sequences.
    pub fn new(seed: u64) -> Self {
        let mut sm = seed;
        Self {
            s: [
                splitmix64(&mut sm),
                splitmix64(&mut sm),
                splitmix64(&mut sm),
                splitmix64(&mut sm),
            ],
        }
    }

    /// Generate the next `u64` in the sequence.
    pub fn next_u64(&mut self) -> u64 {
        let result = (self.s[0].wrapping_add(self.s[3]))
            .rotate_left(23)
            .wrapping_add(self.s[0]);

        let t = self.s[1] << 17;

        self.s[2] ^= self.s[0];
        self.s[3] ^= self.s[1];
        self.s[1] ^= self.s[2];
        self.s[0] ^= self.s[3];

        self.s[2] ^= t;
        self.s[3] = self.s[3].rotate_left(45);

        result
    }

    /// Generate a uniform `f64` in [0, 1) from the upper 53 bits.
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Generate a uniform random integer in `[low, high)`.
    ///
    /// Uses rejection sampling to avoid modulo bias.
    /// Panics if `low >= high`.
    pub fn range_u64(&mut self, low: u64, high: u64) -> u64 {
        assert!(low < high, "range_u64: low must be less than high");
        let range = high - low;
        if range.is_power_of_two() {
            return low + (self.next_u64() & (range - 1));
        }
        let threshold = range.wrapping_neg() % range; // = (2^64 - range) % range
        loop {
            let r = self.next_u64();
            if r >= threshold {
                return low + (r % range);
            }
        }
    }

    /// Generate a uniform random `usize` in `[low, high)`.
    pub fn range_usize(&mut self, low: usize, high: usize) -> usize {
        self.range_u64(low as u64, high as u64) as usize
    }

    /// Generate a uniform random `u32` in `[low, high]` (inclusive on both ends).
    ///
    /// Panics if `low > high`.
    pub fn range_u32_inclusive(&mut self, low: u32, high: u32) -> u32 {
        assert!(low <= high, "range_u32_inclusive: low must be <= high");
        self.range_u64(low as u64, high as u64 + 1) as u32
    }

    /// Return `true` with probability `p`, `false` otherwise.
    ///
    /// `p <= 0.0` always returns false, `p >= 1.0` always returns true.
    pub fn random_bool(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Return `1` or `-1` with equal probability.
    pub fn random_sign(&mut self) -> i32 {
        if self.next_u64() >> 63 == 0 { 1 } else { -1 }
    }

    /// Pick one element uniformly. Panics on an empty slice.
    pub fn choose<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        assert!(!items.is_empty(), "choose: empty slice");
        &items[self.range_usize(0, items.len())]
    }

    /// Pick an index with probability proportional to its weight.
    ///
    /// Panics if the weights are empty or sum to zero.
    pub fn weighted_index(&mut self, weights: &[u32]) -> usize {
        let total: u64 = weights.iter().map(|&w| w as u64).sum();
        assert!(total > 0, "weighted_index: weights must sum to > 0");
        let target = self.range_u64(0, total);
        let mut cumulative = 0u64;
        for (i, &w) in weights.iter().enumerate() {
            cumulative += w as u64;
            if target < cumulative {
                return i;
            }
        }
        unreachable!("weighted_index: target below total always lands in a bucket")
    }

    /// Draw `k` distinct indices from `0..n`, in draw order.
    ///
    /// Partial Fisher-Yates over the index range. Panics if `k > n`.
    pub fn sample_indices(&mut self, n: usize, k: usize) -> Vec<usize> {
        assert!(k <= n, "sample_indices: cannot draw {k} of {n} without replacement");
        let mut pool: Vec<usize> = (0..n).collect();
        for i in 0..k {
            let j = self.range_usize(i, n);
            pool.swap(i, j);
        }
        pool.truncate(k);
        pool
    }

    /// Sample the triangular distribution on `[low, high]` with the given mode.
    ///
    /// Inverse-CDF sampling. Panics unless `low <= mode <= high` and
    /// `low < high`.
    pub fn triangular(&mut self, low: f64, high: f64, mode: f64) -> f64 {
        assert!(low < high, "triangular: low must be less than high");
        assert!(
            (low..=high).contains(&mode),
            "triangular: mode must lie within [low, high]"
        );
        let u = self.next_f64();
        let c = (mode - low) / (high - low);
        if u <= c {
            low + ((high - low) * (mode - low) * u).sqrt()
        } else {
            high - ((high - low) * (high - mode) * (1.0 - u)).sqrt()
        }
    }
}

/// SplitMix64, used only for seeding xoshiro256++ from a single `u64`.
fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn determinism_same_seed_same_output() {
        let mut a = SongRng::new(42);
        let mut b = SongRng::new(42);
        for _ in 0..1000 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn different_seeds_different_output() {
        let mut a = SongRng::new(42);
        let mut b = SongRng::new(43);
        assert_ne!(a.next_u64(), b.next_u64());
    }

    #[test]
    fn f64_in_unit_range() {
        let mut rng = SongRng::new(12345);
        for _ in 0..10_000 {
            let v = rng.next_f64();
            assert!((0.0..1.0).contains(&v), "f64 out of range: {v}");
        }
    }

    #[test]
    fn range_u64_within_bounds() {
        let mut rng = SongRng::new(999);
        for _ in 0..10_000 {
            let v = rng.range_u64(10, 20);
            assert!((10..20).contains(&v), "range_u64 out of range: {v}");
        }
    }

    #[test]
    fn range_u32_inclusive_reaches_both_ends() {
        let mut rng = SongRng::new(666);
        let mut seen = [false; 4];
        for _ in 0..10_000 {
            let v = rng.range_u32_inclusive(60, 63);
            assert!((60..=63).contains(&v));
            seen[(v - 60) as usize] = true;
        }
        assert!(seen.iter().all(|&s| s), "all values should appear: {seen:?}");
    }

    #[test]
    fn random_bool_extremes() {
        let mut rng = SongRng::new(42);
        for _ in 0..100 {
            assert!(!rng.random_bool(0.0));
            assert!(rng.random_bool(1.0));
        }
    }

    #[test]
    fn random_sign_yields_both_signs() {
        let mut rng = SongRng::new(3);
        let mut ups = 0;
        for _ in 0..1000 {
            let s = rng.random_sign();
            assert!(s == 1 || s == -1);
            if s == 1 {
                ups += 1;
            }
        }
        assert!((400..600).contains(&ups), "sign should be ~50/50, got {ups}");
    }

    #[test]
    fn weighted_index_respects_zero_weights() {
        let mut rng = SongRng::new(7);
        for _ in 0..1000 {
            let i = rng.weighted_index(&[0, 5, 0, 3]);
            assert!(i == 1 || i == 3);
        }
    }

    #[test]
    fn weighted_index_distribution() {
        let mut rng = SongRng::new(11);
        let mut counts = [0u32; 2];
        for _ in 0..10_000 {
            counts[rng.weighted_index(&[30, 70])] += 1;
        }
        let pct = counts[1] as f64 / 10_000.0;
        assert!((0.66..0.74).contains(&pct), "expected ~70%, got {pct}");
    }

    #[test]
    fn sample_indices_are_distinct() {
        let mut rng = SongRng::new(21);
        for _ in 0..500 {
            let mut picked = rng.sample_indices(10, 6);
            assert_eq!(picked.len(), 6);
            picked.sort_unstable();
            picked.dedup();
            assert_eq!(picked.len(), 6);
            assert!(picked.iter().all(|&i| i < 10));
        }
    }

    #[test]
    #[should_panic(expected = "without replacement")]
    fn sample_indices_rejects_oversized_draw() {
        let mut rng = SongRng::new(1);
        rng.sample_indices(3, 4);
    }

    #[test]
    fn triangular_within_bounds_and_centered() {
        let mut rng = SongRng::new(95);
        let n = 20_000;
        let mut sum = 0.0;
        for _ in 0..n {
            let v = rng.triangular(80.0, 110.0, 95.0);
            assert!((80.0..=110.0).contains(&v), "triangular out of range: {v}");
            sum += v;
        }
        let mean = sum / n as f64;
        assert!((94.0..96.0).contains(&mean), "mean should be ~95, got {mean}");
    }

    #[test]
    fn choose_returns_member() {
        let mut rng = SongRng::new(5);
        let pool = [2, 4];
        for _ in 0..100 {
            assert!(pool.contains(rng.choose(&pool)));
        }
    }

    #[test]
    fn serialization_roundtrip() {
        let mut rng = SongRng::new(42);
        for _ in 0..100 {
            rng.next_u64();
        }
        let json = serde_json::to_string(&rng).unwrap();
        let mut restored: SongRng = serde_json::from_str(&json).unwrap();
        for _ in 0..100 {
            assert_eq!(rng.next_u64(), restored.next_u64());
        }
    }
}
