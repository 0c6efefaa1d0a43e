// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 PhiLattice Project
// Part of PhiLattice — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! Exact-integer Fibonacci/Lucas arithmetic.
//!
//! This crate is the integer-only half of PhiLattice. Everything here is
//! computed with u128 table entries and checked arithmetic; no floating
//! point enters the crate. The approximate φ/ψ domain (lattice sums, phase
//! angles) lives in `pl-encode` and consumes the representations produced
//! here.
//!
//! - [`FibLucas`]: memoized sequence table with Binet addition/subtraction
//!   identities and the Cassini predicate.
//! - [`ZeckendorfRepresentation`] / [`ZeckBits`]: unique non-adjacent
//!   decompositions and their bitset form with cascade normalization.

pub mod sequence;
pub mod zeckendorf;

pub use sequence::{FibLucas, FibLucasPair, CASSINI_MAX_INDEX, MAX_INDEX};
pub use zeckendorf::{ZeckBits, ZeckendorfRepresentation};

use thiserror::Error;

/// Errors produced by the exact-integer engine. Every failure is pure input
/// validation: no table or cache state is mutated on the error path.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum EngineError {
    #[error("sequence index {0} is negative")]
    InvalidIndex(i64),
    #[error("sequence index {n} exceeds the supported ceiling {max}")]
    IndexOverflow { n: i64, max: u32 },
    #[error("subtraction identity requires i >= j (got i={i}, j={j})")]
    InvalidArgument { i: u32, j: u32 },
}

pub type Result<T> = std::result::Result<T, EngineError>;

/// Interference parity of a combined shell index: +1 for even n, -1 for odd.
#[inline]
pub fn phase_parity(n: u32) -> i8 {
    if n % 2 == 0 {
        1
    } else {
        -1
    }
}

/// Discrete phase of an index: 0 (angle 0) for even n, 1 (angle π) for odd.
#[inline]
pub fn phase_angle(n: u32) -> u8 {
    (n % 2) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parity_alternates() {
        assert_eq!(phase_parity(0), 1);
        assert_eq!(phase_parity(1), -1);
        assert_eq!(phase_parity(6), 1);
        assert_eq!(phase_parity(7), -1);
    }

    #[test]
    fn angle_is_index_mod_two() {
        assert_eq!(phase_angle(0), 0);
        assert_eq!(phase_angle(9), 1);
        assert_eq!(phase_angle(10), 0);
    }
}
