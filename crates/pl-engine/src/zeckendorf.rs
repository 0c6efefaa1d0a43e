// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 PhiLattice Project
// Part of PhiLattice — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! Zeckendorf decomposition and the bitset cascade.
//!
//! Every positive integer has exactly one representation as a sum of
//! non-adjacent Fibonacci numbers (indices ≥ 2, consecutive gaps ≥ 2).
//! The greedy largest-first descent below produces that representation in
//! O(log_φ value) selections. [`ZeckBits`] is the Fibbinary view of a
//! representation: bit i set ⇔ F(i+2) selected.

use serde::{Deserialize, Serialize};

use crate::sequence::FibLucas;
use crate::Result;

/// A canonical Zeckendorf representation.
///
/// # Invariants
/// - `indices` is strictly decreasing and every consecutive pair differs
///   by at least 2.
/// - Σ F(index) over `indices` equals `value` exactly.
/// - `value == 0` ⇔ `indices` is empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ZeckendorfRepresentation {
    value: u64,
    indices: Vec<u32>,
}

impl ZeckendorfRepresentation {
    /// The decomposed integer.
    pub fn value(&self) -> u64 {
        self.value
    }

    /// Selected Fibonacci indices, largest first.
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Number of selected terms.
    pub fn term_count(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Fibbinary bitset view: bit i ⇔ index i+2 selected.
    pub fn bits(&self) -> ZeckBits {
        let mut bits = 0u128;
        for &idx in &self.indices {
            bits |= 1u128 << (idx - 2);
        }
        ZeckBits(bits)
    }

    /// Checks the non-adjacency and ordering invariants. Representations
    /// built by [`FibLucas::zeckendorf_decompose`] always pass; this exists
    /// for the validation harness and for data read back from snapshots.
    pub fn is_canonical(&self) -> bool {
        self.indices.windows(2).all(|w| w[0] >= w[1] + 2) && self.indices.iter().all(|&i| i >= 2)
    }
}

impl FibLucas {
    /// Greedy Zeckendorf descent.
    ///
    /// Selects the largest F(k) ≤ remaining, subtracts it, and resumes the
    /// scan at k−2 so adjacent indices can never be chosen. Zero decomposes
    /// to the empty representation rather than an error.
    pub fn zeckendorf_decompose(&mut self, value: u64) -> Result<ZeckendorfRepresentation> {
        if value == 0 {
            return Ok(ZeckendorfRepresentation {
                value,
                indices: Vec::new(),
            });
        }

        let mut k = self.nearest_index(value);
        let mut remaining = value as u128;
        let mut indices = Vec::new();

        while remaining > 0 {
            let f = self.fibonacci(k as i64)?;
            if f <= remaining {
                indices.push(k);
                remaining -= f;
                if remaining == 0 {
                    break;
                }
                // After subtracting F(k) the remainder is below F(k−1), so
                // the next selection lives at k−2 or lower.
                k -= 2;
            } else {
                k -= 1;
            }
        }

        debug_assert!(indices.windows(2).all(|w| w[0] >= w[1] + 2));
        Ok(ZeckendorfRepresentation { value, indices })
    }

    /// Reconstructs the integer a bitset stands for. Test/validation
    /// counterpart of [`Self::zeckendorf_decompose`]; the hot path never
    /// reconstructs.
    pub fn bits_value(&mut self, bits: ZeckBits) -> Result<u128> {
        let mut total = 0u128;
        for pos in bits.positions() {
            total += self.fibonacci((pos + 2) as i64)?;
        }
        Ok(total)
    }
}

/// Fibbinary bitset: bit i stands for F(i+2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ZeckBits(pub u128);

impl ZeckBits {
    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// True when no two adjacent bits are set.
    pub fn is_canonical(self) -> bool {
        self.0 & (self.0 << 1) == 0
    }

    /// Set bit positions, lowest first.
    pub fn positions(self) -> Vec<u32> {
        (0..128).filter(|i| self.0 & (1u128 << i) != 0).collect()
    }

    pub fn count(self) -> u32 {
        self.0.count_ones()
    }

    /// Cascade normalization: while two adjacent bits i, i+1 are set,
    /// collapse the lowest such pair into the single bit i+2
    /// (F(i) + F(i+1) = F(i+2)). Runs to a fixed point and is idempotent.
    pub fn cascade_normalize(self) -> ZeckBits {
        let mut bits = self.0;
        loop {
            let adjacent = bits & (bits << 1);
            if adjacent == 0 {
                break;
            }
            let pos = adjacent.trailing_zeros();
            if pos >= 127 {
                // A pair at the very top of the word has no next index to
                // collapse into; it stays in place.
                break;
            }
            // `pos` is the upper bit of the lowest adjacent pair.
            bits &= !(3u128 << (pos - 1));
            bits |= 1u128 << (pos + 1);
        }
        ZeckBits(bits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_decomposes_to_empty() {
        let mut t = FibLucas::new();
        let repr = t.zeckendorf_decompose(0).unwrap();
        assert!(repr.is_empty());
        assert_eq!(repr.value(), 0);
    }

    #[test]
    fn example_27() {
        // 27 = F(8) + F(5) + F(2) = 21 + 5 + 1.
        let mut t = FibLucas::new();
        let repr = t.zeckendorf_decompose(27).unwrap();
        assert_eq!(repr.indices(), &[8, 5, 2]);
    }

    #[test]
    fn example_100() {
        // 100 = F(11) + F(6) + F(4) = 89 + 8 + 3.
        let mut t = FibLucas::new();
        let repr = t.zeckendorf_decompose(100).unwrap();
        assert_eq!(repr.indices(), &[11, 6, 4]);
    }

    #[test]
    fn decomposition_sums_back_and_stays_non_adjacent() {
        let mut t = FibLucas::new();
        for v in (1u64..=2_000).chain([6765, 10_946, 832_040, u32::MAX as u64]) {
            let repr = t.zeckendorf_decompose(v).unwrap();
            assert!(repr.is_canonical(), "non-canonical indices for {v}");
            let sum: u128 = repr
                .indices()
                .iter()
                .map(|&i| t.fibonacci(i as i64).unwrap())
                .sum();
            assert_eq!(sum, v as u128, "sum mismatch for {v}");
        }
    }

    #[test]
    fn fibonacci_numbers_are_single_terms() {
        let mut t = FibLucas::new();
        let repr = t.zeckendorf_decompose(55).unwrap();
        assert_eq!(repr.indices(), &[10]);
    }

    #[test]
    fn bits_round_trip_through_positions() {
        let mut t = FibLucas::new();
        let repr = t.zeckendorf_decompose(10_000).unwrap();
        let bits = repr.bits();
        assert!(bits.is_canonical());
        assert_eq!(bits.count() as usize, repr.term_count());
        assert_eq!(t.bits_value(bits).unwrap(), 10_000);
    }

    #[test]
    fn cascade_collapses_adjacent_pair() {
        // Bits 1 and 2 (F(3)=2, F(4)=3) collapse to bit 3 (F(5)=5).
        let cascaded = ZeckBits(0b110).cascade_normalize();
        assert_eq!(cascaded, ZeckBits(0b1000));
    }

    #[test]
    fn cascade_preserves_value() {
        let mut t = FibLucas::new();
        // F(2)+F(3) = 1+2 = 3 = F(4).
        let raw = ZeckBits(0b11);
        let cascaded = raw.cascade_normalize();
        assert_eq!(
            t.bits_value(cascaded).unwrap(),
            t.bits_value(raw).unwrap()
        );
        assert!(cascaded.is_canonical());
    }

    #[test]
    fn cascade_is_idempotent() {
        for raw in [0b11u128, 0b1101101, 0b111111, 0x5f3a, (1 << 40) | (1 << 41)] {
            let once = ZeckBits(raw).cascade_normalize();
            let twice = once.cascade_normalize();
            assert_eq!(once, twice, "cascade not idempotent for {raw:#b}");
            assert!(once.is_canonical());
        }
    }

    #[test]
    fn decomposed_bits_are_cascade_fixed_points() {
        let mut t = FibLucas::new();
        for v in [1u64, 27, 100, 5000, 10_000] {
            let bits = t.zeckendorf_decompose(v).unwrap().bits();
            assert_eq!(bits.cascade_normalize(), bits);
        }
    }
}
