//! In-process bloom filter variant.

use parking_lot::RwLock;

use super::FilterParams;

/// Bloom filter backed by a word array in process memory.
///
/// Reads proceed concurrently with other reads; an insertion excludes all
/// other access for the duration of its k bit writes, so `contains` never
/// observes a half-inserted element.
pub struct MemoryBloomFilter {
    params: FilterParams,
    bits: RwLock<Vec<u64>>,
}

impl MemoryBloomFilter {
    /// Creates a filter sized for `expected_items` insertions at the target
    /// `false_positive_rate`.
    #[must_use]
    pub fn new(expected_items: u64, false_positive_rate: f64) -> Self {
        let params = FilterParams::for_capacity(expected_items, false_positive_rate);
        let words = params.size_bits.div_ceil(64) as usize;
        Self {
            params,
            bits: RwLock::new(vec![0u64; words]),
        }
    }

    /// Returns the derived sizing parameters, fixed for the filter's lifetime.
    #[must_use]
    pub fn params(&self) -> FilterParams {
        self.params
    }

    /// Records `item` as a member.
    pub fn add(&self, item: &str) {
        let mut bits = self.bits.write();
        for index in self.params.indices(item) {
            let word = (index / 64) as usize;
            let offset = index % 64;
            bits[word] |= 1 << offset;
        }
    }

    /// Tests membership of `item`.
    ///
    /// `false` is definitive; `true` means possible presence with the
    /// configured false-positive probability.
    #[must_use]
    pub fn contains(&self, item: &str) -> bool {
        let bits = self.bits.read();
        for index in self.params.indices(item) {
            let word = (index / 64) as usize;
            let offset = index % 64;
            if bits[word] & (1 << offset) == 0 {
                return false;
            }
        }
        true
    }
}

impl std::fmt::Debug for MemoryBloomFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryBloomFilter")
            .field("size_bits", &self.params.size_bits)
            .field("hash_count", &self.params.hash_count)
            .finish()
    }
}
