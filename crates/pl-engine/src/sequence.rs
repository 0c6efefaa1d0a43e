// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 PhiLattice Project
// Part of PhiLattice — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

use serde::{Deserialize, Serialize};

use crate::{EngineError, Result};

/// Largest index for which both F(n) and L(n) fit in a u128 table entry.
pub const MAX_INDEX: u32 = 184;

/// Largest index for which the Cassini squares L(n)² and 5·F(n)² still fit
/// in u128. Tensor shells stay far below this; the bound only matters for
/// direct validation calls.
pub const CASSINI_MAX_INDEX: u32 = 91;

/// One memoized row of the table: the index together with both sequence
/// values at that index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FibLucasPair {
    pub n: u32,
    pub fib: u128,
    pub lucas: u128,
}

/// Memoized Fibonacci/Lucas table.
///
/// Both sequences grow in lockstep from their seed rows (F(0)=0, F(1)=1,
/// L(0)=2, L(1)=1). Requesting an uncached index fills every missing
/// intermediate entry once, so repeated callers only pay for the rows they
/// have not seen yet; after warm-up a lookup is a bounds-checked array read.
///
/// The table is an explicitly owned object: construct one per engine or
/// encoder and drop it with them. Nothing here is process-global.
#[derive(Debug, Clone)]
pub struct FibLucas {
    fib: Vec<u128>,
    lucas: Vec<u128>,
}

impl Default for FibLucas {
    fn default() -> Self {
        Self::new()
    }
}

impl FibLucas {
    /// Table seeded with the two base rows only.
    pub fn new() -> Self {
        Self {
            fib: vec![0, 1],
            lucas: vec![2, 1],
        }
    }

    /// Table pre-filled up to `n`, clamped to [`MAX_INDEX`]. Useful when a
    /// fixed bound is known upfront and the table will be shared read-only.
    pub fn prefilled(n: u32) -> Self {
        let mut table = Self::new();
        // Infallible after clamping; the expect documents that.
        table
            .ensure(n.min(MAX_INDEX))
            .expect("clamped prefill cannot exceed the ceiling");
        table
    }

    /// Number of memoized rows (always at least the two seed rows).
    pub fn rows(&self) -> usize {
        self.fib.len()
    }

    fn checked_index(n: i64) -> Result<u32> {
        if n < 0 {
            return Err(EngineError::InvalidIndex(n));
        }
        if n > MAX_INDEX as i64 {
            return Err(EngineError::IndexOverflow {
                n,
                max: MAX_INDEX,
            });
        }
        Ok(n as u32)
    }

    fn ensure(&mut self, n: u32) -> Result<()> {
        if n > MAX_INDEX {
            return Err(EngineError::IndexOverflow {
                n: n as i64,
                max: MAX_INDEX,
            });
        }
        while self.fib.len() <= n as usize {
            let k = self.fib.len();
            let f = self.fib[k - 1] + self.fib[k - 2];
            let l = self.lucas[k - 1] + self.lucas[k - 2];
            self.fib.push(f);
            self.lucas.push(l);
        }
        Ok(())
    }

    /// F(n). Rejects negative indices and indices beyond [`MAX_INDEX`].
    pub fn fibonacci(&mut self, n: i64) -> Result<u128> {
        let idx = Self::checked_index(n)?;
        self.ensure(idx)?;
        Ok(self.fib[idx as usize])
    }

    /// L(n). Same index contract as [`Self::fibonacci`].
    pub fn lucas(&mut self, n: i64) -> Result<u128> {
        let idx = Self::checked_index(n)?;
        self.ensure(idx)?;
        Ok(self.lucas[idx as usize])
    }

    /// Both values at `n` as one immutable row.
    pub fn pair(&mut self, n: i64) -> Result<FibLucasPair> {
        let idx = Self::checked_index(n)?;
        self.ensure(idx)?;
        Ok(FibLucasPair {
            n: idx,
            fib: self.fib[idx as usize],
            lucas: self.lucas[idx as usize],
        })
    }

    /// F(i+j) via the Binet addition identity (F(i)L(j) + F(j)L(i)) / 2.
    /// The division is exact; the halved sum equals the table entry at i+j.
    pub fn binet_fibonacci_add(&mut self, i: u32, j: u32) -> Result<u128> {
        let combined = i + j;
        if combined > MAX_INDEX {
            return Err(EngineError::IndexOverflow {
                n: combined as i64,
                max: MAX_INDEX,
            });
        }
        self.ensure(combined.max(i).max(j))?;
        let num = self.fib[i as usize] * self.lucas[j as usize]
            + self.fib[j as usize] * self.lucas[i as usize];
        debug_assert_eq!(num % 2, 0);
        Ok(num / 2)
    }

    /// L(i+j) via (L(i)L(j) + 5·F(i)F(j)) / 2. The doubled result can exceed
    /// u128 slightly before the ceiling does, hence the checked arithmetic.
    pub fn binet_lucas_add(&mut self, i: u32, j: u32) -> Result<u128> {
        let combined = i + j;
        if combined > MAX_INDEX {
            return Err(EngineError::IndexOverflow {
                n: combined as i64,
                max: MAX_INDEX,
            });
        }
        self.ensure(combined.max(i).max(j))?;
        let overflow = || EngineError::IndexOverflow {
            n: combined as i64,
            max: MAX_INDEX,
        };
        let ll = self.lucas[i as usize]
            .checked_mul(self.lucas[j as usize])
            .ok_or_else(overflow)?;
        let ff = self.fib[i as usize]
            .checked_mul(self.fib[j as usize])
            .and_then(|v| v.checked_mul(5))
            .ok_or_else(overflow)?;
        let num = ll.checked_add(ff).ok_or_else(overflow)?;
        debug_assert_eq!(num % 2, 0);
        Ok(num / 2)
    }

    /// F(i−j) via (−1)^j · (F(i)L(j) − F(j)L(i)) / 2. Requires i ≥ j. The
    /// cross products grow like φ^(i+j) even though the result is small,
    /// so the intermediates are checked.
    pub fn binet_fibonacci_subtract(&mut self, i: u32, j: u32) -> Result<u128> {
        if i < j {
            return Err(EngineError::InvalidArgument { i, j });
        }
        self.ensure(i)?;
        let overflow = || EngineError::IndexOverflow {
            n: i as i64 + j as i64,
            max: MAX_INDEX,
        };
        let a = self.fib[i as usize]
            .checked_mul(self.lucas[j as usize])
            .ok_or_else(overflow)?;
        let b = self.fib[j as usize]
            .checked_mul(self.lucas[i as usize])
            .ok_or_else(overflow)?;
        // The sign flip from (−1)^j decides which difference is the
        // non-negative one.
        let num = if j % 2 == 0 { a - b } else { b - a };
        debug_assert_eq!(num % 2, 0);
        Ok(num / 2)
    }

    /// Cassini predicate: L(n)² − 5·F(n)² = 4·(−1)ⁿ.
    ///
    /// A pure validation check, not a hot-path operation. Holds for every
    /// in-range index; the tensor uses it as an admission guard over the
    /// combined shell index.
    pub fn verify_cassini(&mut self, n: i64) -> Result<bool> {
        let idx = Self::checked_index(n)?;
        if idx > CASSINI_MAX_INDEX {
            return Err(EngineError::IndexOverflow {
                n,
                max: CASSINI_MAX_INDEX,
            });
        }
        self.ensure(idx)?;
        let f = self.fib[idx as usize];
        let l = self.lucas[idx as usize];
        let l2 = l * l;
        let f5 = 5 * f * f;
        Ok(if idx % 2 == 0 {
            l2 >= f5 && l2 - f5 == 4
        } else {
            f5 >= l2 && f5 - l2 == 4
        })
    }

    /// Largest index k with F(k) ≤ `value`, by binary search over the table.
    /// This is the ladder encoding used for raw scalar levels: the index is
    /// a log_φ-scale bucket of the value.
    pub fn nearest_index(&mut self, value: u64) -> u32 {
        if value <= 1 {
            // F(1) = F(2) = 1; the canonical bucket for 1 is index 2.
            return if value == 0 { 0 } else { 2 };
        }
        // Every u64 stays below F(94), so a single fill covers any input.
        self.ensure(94)
            .expect("u64 inputs stay below the table ceiling");
        let value = value as u128;
        let (mut lo, mut hi) = (2u32, 93u32);
        while lo < hi {
            let mid = (lo + hi + 1) / 2;
            if self.fib[mid as usize] <= value {
                lo = mid;
            } else {
                hi = mid - 1;
            }
        }
        lo
    }

    /// The Fibonacci ladder around `value`: up to `count` levels below and
    /// above its nearest index. Levels past the table ceiling are dropped.
    pub fn neighbor_levels(&mut self, value: u64, count: u32) -> (Vec<u128>, Vec<u128>) {
        let center = self.nearest_index(value);
        let mut below = Vec::new();
        for step in 1..=count {
            if let Some(idx) = center.checked_sub(step) {
                if idx >= 2 {
                    below.push(self.fib[idx as usize]);
                }
            }
        }
        let mut above = Vec::new();
        for step in 1..=count {
            let idx = center + step;
            if self.ensure(idx).is_ok() {
                above.push(self.fib[idx as usize]);
            }
        }
        (below, above)
    }

    /// True when `value` is itself a Fibonacci number (single-term
    /// Zeckendorf decomposition).
    pub fn is_fibonacci(&mut self, value: u64) -> bool {
        if value == 0 {
            return true;
        }
        let idx = self.nearest_index(value);
        self.fibonacci(idx as i64)
            .map(|f| f == value as u128)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_rows() {
        let mut t = FibLucas::new();
        assert_eq!(t.fibonacci(0).unwrap(), 0);
        assert_eq!(t.fibonacci(1).unwrap(), 1);
        assert_eq!(t.lucas(0).unwrap(), 2);
        assert_eq!(t.lucas(1).unwrap(), 1);
    }

    #[test]
    fn recurrence_holds_across_the_table() {
        let mut t = FibLucas::new();
        t.fibonacci(90).unwrap();
        for n in 2..=90i64 {
            assert_eq!(
                t.fibonacci(n).unwrap(),
                t.fibonacci(n - 1).unwrap() + t.fibonacci(n - 2).unwrap()
            );
            assert_eq!(
                t.lucas(n).unwrap(),
                t.lucas(n - 1).unwrap() + t.lucas(n - 2).unwrap()
            );
        }
    }

    #[test]
    fn known_values() {
        let mut t = FibLucas::new();
        assert_eq!(t.fibonacci(10).unwrap(), 55);
        assert_eq!(t.fibonacci(20).unwrap(), 6765);
        assert_eq!(t.lucas(10).unwrap(), 123);
        assert_eq!(
            t.fibonacci(100).unwrap(),
            354_224_848_179_261_915_075u128
        );
    }

    #[test]
    fn prefilled_table_covers_the_requested_range() {
        let mut t = FibLucas::prefilled(50);
        assert!(t.rows() >= 51);
        assert_eq!(t.fibonacci(50).unwrap(), 12_586_269_025);
        // Requests past the ceiling clamp instead of failing.
        let big = FibLucas::prefilled(u32::MAX);
        assert_eq!(big.rows(), MAX_INDEX as usize + 1);
    }

    #[test]
    fn negative_index_is_rejected_without_mutation() {
        let mut t = FibLucas::new();
        let before = t.rows();
        assert_eq!(t.fibonacci(-1), Err(EngineError::InvalidIndex(-1)));
        assert_eq!(t.lucas(-7), Err(EngineError::InvalidIndex(-7)));
        assert_eq!(t.rows(), before);
    }

    #[test]
    fn ceiling_is_enforced() {
        let mut t = FibLucas::new();
        assert!(t.fibonacci(MAX_INDEX as i64).is_ok());
        assert_eq!(
            t.fibonacci(MAX_INDEX as i64 + 1),
            Err(EngineError::IndexOverflow {
                n: MAX_INDEX as i64 + 1,
                max: MAX_INDEX
            })
        );
    }

    #[test]
    fn binet_addition_matches_table() {
        let mut t = FibLucas::new();
        for i in 0..40u32 {
            for j in 0..40u32 {
                assert_eq!(
                    t.binet_fibonacci_add(i, j).unwrap(),
                    t.fibonacci((i + j) as i64).unwrap(),
                    "F addition identity failed at ({i},{j})"
                );
                assert_eq!(
                    t.binet_lucas_add(i, j).unwrap(),
                    t.lucas((i + j) as i64).unwrap(),
                    "L addition identity failed at ({i},{j})"
                );
            }
        }
    }

    #[test]
    fn binet_subtraction_matches_table() {
        let mut t = FibLucas::new();
        for i in 0..60u32 {
            for j in 0..=i {
                assert_eq!(
                    t.binet_fibonacci_subtract(i, j).unwrap(),
                    t.fibonacci((i - j) as i64).unwrap(),
                    "F subtraction identity failed at ({i},{j})"
                );
            }
        }
    }

    #[test]
    fn binet_subtraction_requires_ordered_arguments() {
        let mut t = FibLucas::new();
        assert_eq!(
            t.binet_fibonacci_subtract(3, 5),
            Err(EngineError::InvalidArgument { i: 3, j: 5 })
        );
    }

    #[test]
    fn cassini_holds_for_all_indices() {
        let mut t = FibLucas::new();
        for n in 0..=CASSINI_MAX_INDEX as i64 {
            assert!(t.verify_cassini(n).unwrap(), "Cassini failed at n={n}");
        }
    }

    #[test]
    fn cassini_example_n5() {
        // L(5)=11, F(5)=5: 121 − 125 = −4 = 4·(−1)⁵.
        let mut t = FibLucas::new();
        assert_eq!(t.lucas(5).unwrap(), 11);
        assert_eq!(t.fibonacci(5).unwrap(), 5);
        assert!(t.verify_cassini(5).unwrap());
    }

    #[test]
    fn nearest_index_brackets_the_value() {
        let mut t = FibLucas::new();
        assert_eq!(t.nearest_index(0), 0);
        assert_eq!(t.nearest_index(1), 2);
        assert_eq!(t.nearest_index(2), 3);
        assert_eq!(t.nearest_index(100), 11); // F(11) = 89 ≤ 100 < F(12) = 144
        let k = t.nearest_index(10_000);
        assert!(t.fibonacci(k as i64).unwrap() <= 10_000);
        assert!(t.fibonacci(k as i64 + 1).unwrap() > 10_000);
    }

    #[test]
    fn neighbor_levels_walk_the_ladder() {
        let mut t = FibLucas::new();
        let (below, above) = t.neighbor_levels(100, 3);
        assert_eq!(below, vec![55, 34, 21]);
        assert_eq!(above, vec![144, 233, 377]);
    }

    #[test]
    fn fibonacci_membership() {
        let mut t = FibLucas::new();
        for v in [1u64, 2, 3, 5, 8, 13, 6765] {
            assert!(t.is_fibonacci(v), "{v} should be Fibonacci");
        }
        for v in [4u64, 6, 7, 100, 6766] {
            assert!(!t.is_fibonacci(v), "{v} should not be Fibonacci");
        }
    }
}
