//! Bloom filter guarding the static fingerprint table.
//!
//! The filter exists for one thing: a confirmed negative for absent static
//! paths in a handful of bit probes, before any map probe happens. False
//! positives only cost a map lookup; false negatives are impossible.

/// Sizing bounds in bits. A configured or derived size is clamped here.
pub(crate) const BLOOM_MIN_BITS: usize = 100;
pub(crate) const BLOOM_MAX_BITS: usize = 1_000_000;

/// Bits per expected entry when the size is derived at freeze.
const BITS_PER_ENTRY: usize = 10;

#[derive(Debug, Clone)]
pub(crate) struct BloomFilter {
    bits: Box<[u64]>,
    bit_count: usize,
    hashes: usize,
}

impl BloomFilter {
    /// Builds an empty filter for `expected` entries. `configured_bits`
    /// overrides the derived `10 × expected` size; both are clamped to
    /// `[100, 1_000_000]` bits. `hashes` is assumed pre-clamped to `[1, 10]`
    /// by the configuration layer.
    pub(crate) fn new(expected: usize, configured_bits: Option<usize>, hashes: usize) -> Self {
        let bit_count = configured_bits
            .unwrap_or_else(|| expected.saturating_mul(BITS_PER_ENTRY))
            .clamp(BLOOM_MIN_BITS, BLOOM_MAX_BITS);
        let words = bit_count.div_ceil(64);
        Self {
            bits: vec![0u64; words].into_boxed_slice(),
            bit_count,
            hashes,
        }
    }

    pub(crate) fn insert(&mut self, fingerprint: u64) {
        let (h1, h2) = Self::split(fingerprint);
        for i in 0..self.hashes {
            let bit = self.probe(h1, h2, i);
            self.bits[bit / 64] |= 1u64 << (bit % 64);
        }
    }

    /// `false` means definitely absent; `true` means probe the table.
    pub(crate) fn contains(&self, fingerprint: u64) -> bool {
        let (h1, h2) = Self::split(fingerprint);
        (0..self.hashes).all(|i| {
            let bit = self.probe(h1, h2, i);
            self.bits[bit / 64] & (1u64 << (bit % 64)) != 0
        })
    }

    pub(crate) fn bit_count(&self) -> usize {
        self.bit_count
    }

    pub(crate) fn hash_count(&self) -> usize {
        self.hashes
    }

    /// Double hashing: probe i reads bit `h1 + i * h2`. The second hash is
    /// re-mixed from the fingerprint and forced odd so consecutive probes
    /// never collapse onto one bit.
    #[inline]
    fn probe(&self, h1: u64, h2: u64, i: usize) -> usize {
        (h1.wrapping_add((i as u64).wrapping_mul(h2)) % self.bit_count as u64) as usize
    }

    #[inline]
    fn split(fingerprint: u64) -> (u64, u64) {
        let mut h2 = fingerprint;
        h2 ^= h2 >> 33;
        h2 = h2.wrapping_mul(0xff51_afd7_ed55_8ccd);
        h2 ^= h2 >> 33;
        (fingerprint, h2 | 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiled::fingerprint::fingerprint;

    #[test]
    fn test_no_false_negatives() {
        let mut filter = BloomFilter::new(1_000, None, 3);
        let fingerprints: Vec<u64> = (0..1_000)
            .map(|i| fingerprint(&format!("/static/{i}")))
            .collect();
        for fp in &fingerprints {
            filter.insert(*fp);
        }
        for fp in &fingerprints {
            assert!(filter.contains(*fp));
        }
    }

    #[test]
    fn test_rejects_most_absent_paths() {
        let mut filter = BloomFilter::new(1_000, None, 3);
        for i in 0..1_000 {
            filter.insert(fingerprint(&format!("/static/{i}")));
        }
        let false_positives = (0..10_000)
            .filter(|i| filter.contains(fingerprint(&format!("/missing/{i}"))))
            .count();
        // 10 bits/entry with 3 hashes sits around a 1% false positive rate;
        // 5% leaves slack without letting a broken filter pass.
        assert!(false_positives < 500, "rate too high: {false_positives}");
    }

    #[test]
    fn test_sizing_clamps() {
        assert_eq!(BloomFilter::new(0, None, 3).bit_count(), BLOOM_MIN_BITS);
        assert_eq!(BloomFilter::new(3, None, 3).bit_count(), BLOOM_MIN_BITS);
        assert_eq!(BloomFilter::new(1_000, None, 3).bit_count(), 10_000);
        assert_eq!(
            BloomFilter::new(usize::MAX, None, 3).bit_count(),
            BLOOM_MAX_BITS
        );
        assert_eq!(BloomFilter::new(1_000, Some(64), 3).bit_count(), BLOOM_MIN_BITS);
        assert_eq!(BloomFilter::new(1_000, Some(4_096), 3).bit_count(), 4_096);
    }

    #[test]
    fn test_empty_filter_rejects_everything() {
        let filter = BloomFilter::new(100, None, 3);
        assert!(!filter.contains(fingerprint("/anything")));
    }
}
