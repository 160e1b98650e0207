//! Probabilistic set-membership filters.
//!
//! Two variants share one sizing formula and one index-derivation scheme:
//!
//! - [`MemoryBloomFilter`] - a word-array bit vector held in process.
//! - [`RedisBloomFilter`] - the same bit vector kept in the remote backend,
//!   driven with pipelined single-bit commands.
//!
//! Both admit bounded false positives and never false negatives. Neither
//! supports deletion; clearing bits would corrupt membership answers for
//! every other element that hashed onto them.

mod memory;
mod remote;

pub use memory::MemoryBloomFilter;
pub use remote::RedisBloomFilter;

use xxhash_rust::xxh3::xxh3_64;

/// Mixing constant for deriving per-seed indices from one base hash
/// (the splitmix64 increment).
const SEED_MIX: u64 = 0xBF58_476D_1CE4_E5B9;

/// Bit-array size and hash count derived from a capacity/error-rate target.
///
/// The derivation computes a single 64-bit hash per item and mixes it with
/// each seed via a fixed odd multiplicative constant. That yields k
/// pseudo-independent indices from one hash pass; it is a throughput
/// shortcut, not a cryptographic guarantee, and the observed false-positive
/// rate can drift slightly above the configured target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterParams {
    /// Bit-array size `m`.
    pub size_bits: u64,
    /// Number of hash functions `k`.
    pub hash_count: u32,
}

impl FilterParams {
    /// Sizes a filter for `expected_items` insertions at the target
    /// `false_positive_rate` (must be in the open interval (0, 1)).
    ///
    /// `m = ceil(-n·ln(p) / (ln 2)²)`, `k = round(m/n · ln 2)`, floored to 1.
    #[must_use]
    pub fn for_capacity(expected_items: u64, false_positive_rate: f64) -> Self {
        debug_assert!(expected_items > 0);
        debug_assert!(false_positive_rate > 0.0 && false_positive_rate < 1.0);

        let n = expected_items as f64;
        let ln2 = std::f64::consts::LN_2;
        let m = (-(n * false_positive_rate.ln()) / (ln2 * ln2)).ceil() as u64;
        let k = ((m as f64 / n) * ln2).round() as u32;

        Self {
            size_bits: m.max(1),
            hash_count: k.max(1),
        }
    }

    /// Derives the bit index for `item` under hash seed `seed`.
    #[must_use]
    pub(crate) fn index(&self, item: &str, seed: u32) -> u64 {
        let base = xxh3_64(item.as_bytes());
        (base ^ u64::from(seed).wrapping_mul(SEED_MIX)) % self.size_bits
    }

    /// All `k` bit indices for `item`.
    pub(crate) fn indices(&self, item: &str) -> impl Iterator<Item = u64> + '_ {
        let base = xxh3_64(item.as_bytes());
        (0..self.hash_count)
            .map(move |seed| (base ^ u64::from(seed).wrapping_mul(SEED_MIX)) % self.size_bits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sizing_formula() {
        // n=1000, p=0.01 → m = ceil(1000 * ln(100) / ln²2) = 9586, k = 7.
        let params = FilterParams::for_capacity(1000, 0.01);
        assert_eq!(params.size_bits, 9586);
        assert_eq!(params.hash_count, 7);
    }

    #[test]
    fn test_hash_count_floored_to_one() {
        // A very permissive error rate would otherwise round k to zero.
        let params = FilterParams::for_capacity(1000, 0.99);
        assert_eq!(params.hash_count, 1);
    }

    #[test]
    fn test_indices_are_stable_and_bounded() {
        let params = FilterParams::for_capacity(100, 0.05);
        let first: Vec<u64> = params.indices("alpha").collect();
        let second: Vec<u64> = params.indices("alpha").collect();

        assert_eq!(first, second);
        assert_eq!(first.len(), params.hash_count as usize);
        assert!(first.iter().all(|&i| i < params.size_bits));
    }

    #[test]
    fn test_seed_zero_matches_single_index() {
        let params = FilterParams::for_capacity(100, 0.05);
        assert_eq!(params.index("beta", 0), params.indices("beta").next().unwrap());
    }
}
