// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 PhiLattice Project
// Part of PhiLattice — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

use num_rational::Ratio;
use serde::{Deserialize, Serialize};

const PHI_F64: f64 = 1.618_033_988_749_894_9;
const SQRT5_F64: f64 = 2.236_067_977_499_79;

/// Exact value in the {1, φ, √5} basis: `rational + phi·φ + sqrt5·√5`.
///
/// Closed under addition, subtraction, and rational scalar multiplication —
/// everything the tensor's accumulation and contraction paths need. General
/// multiplication is intentionally absent: the product of two basis values
/// leaves the three-coefficient basis (φ·√5 terms appear), and no call site
/// requires it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SymbolicValue {
    pub rational: Ratio<i64>,
    pub phi: Ratio<i64>,
    pub sqrt5: Ratio<i64>,
}

impl SymbolicValue {
    pub fn new(rational: Ratio<i64>, phi: Ratio<i64>, sqrt5: Ratio<i64>) -> Self {
        Self {
            rational,
            phi,
            sqrt5,
        }
    }

    pub fn zero() -> Self {
        Self::from_integer(0)
    }

    pub fn one() -> Self {
        Self::from_integer(1)
    }

    pub fn from_integer(n: i64) -> Self {
        Self {
            rational: Ratio::from_integer(n),
            phi: Ratio::from_integer(0),
            sqrt5: Ratio::from_integer(0),
        }
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::zero()
    }

    /// Exact coefficient-wise scaling.
    pub fn scale(&self, factor: Ratio<i64>) -> Self {
        Self {
            rational: self.rational * factor,
            phi: self.phi * factor,
            sqrt5: self.sqrt5 * factor,
        }
    }

    /// Approximate real evaluation, for diagnostics and display only. The
    /// exact coefficients remain the source of truth.
    pub fn approximate(&self) -> f64 {
        ratio_f64(self.rational) + ratio_f64(self.phi) * PHI_F64 + ratio_f64(self.sqrt5) * SQRT5_F64
    }
}

fn ratio_f64(r: Ratio<i64>) -> f64 {
    *r.numer() as f64 / *r.denom() as f64
}

impl Default for SymbolicValue {
    fn default() -> Self {
        Self::zero()
    }
}

impl Add for SymbolicValue {
    type Output = SymbolicValue;

    fn add(self, rhs: SymbolicValue) -> SymbolicValue {
        SymbolicValue {
            rational: self.rational + rhs.rational,
            phi: self.phi + rhs.phi,
            sqrt5: self.sqrt5 + rhs.sqrt5,
        }
    }
}

impl AddAssign for SymbolicValue {
    fn add_assign(&mut self, rhs: SymbolicValue) {
        *self = *self + rhs;
    }
}

impl Sub for SymbolicValue {
    type Output = SymbolicValue;

    fn sub(self, rhs: SymbolicValue) -> SymbolicValue {
        SymbolicValue {
            rational: self.rational - rhs.rational,
            phi: self.phi - rhs.phi,
            sqrt5: self.sqrt5 - rhs.sqrt5,
        }
    }
}

impl SubAssign for SymbolicValue {
    fn sub_assign(&mut self, rhs: SymbolicValue) {
        *self = *self - rhs;
    }
}

impl Neg for SymbolicValue {
    type Output = SymbolicValue;

    fn neg(self) -> SymbolicValue {
        SymbolicValue::zero() - self
    }
}
