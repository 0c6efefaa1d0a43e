// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 PhiLattice Project
// Part of PhiLattice — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

use pl_engine::ZeckendorfRepresentation;
use serde::{Deserialize, Serialize};

use crate::{GOLDEN_RATIO, GOLDEN_RATIO_CONJUGATE};

/// Growth/decay components derived from a Zeckendorf representation.
///
/// The φ-component is Σ φ^i and the ψ-component Σ ψ^i over the selected
/// indices. These are deliberately approximate f64 sums — the single
/// crossing from the exact-integer domain into the real domain — and are
/// never used to reconstruct the source integer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BidirectionalLattice {
    /// Growth component Σ φ^i.
    pub phi_component: f64,
    /// Decay component Σ ψ^i; alternating in sign, |ψ^i| < 1 for i ≥ 1.
    pub psi_component: f64,
    /// φ-component − |ψ-component|.
    pub net_balance: f64,
    /// atan2(ψ-component, φ-component).
    pub phase_angle: f64,
    /// Euclidean length of the (φ, ψ) component pair.
    pub magnitude: f64,
}

impl BidirectionalLattice {
    /// Derives the lattice of a representation. Cheap enough to recompute,
    /// but the encoder caches results by representation identity.
    pub fn derive(repr: &ZeckendorfRepresentation) -> Self {
        let mut phi_component = 0.0f64;
        let mut psi_component = 0.0f64;
        for &idx in repr.indices() {
            phi_component += GOLDEN_RATIO.powi(idx as i32);
            psi_component += GOLDEN_RATIO_CONJUGATE.powi(idx as i32);
        }
        Self {
            phi_component,
            psi_component,
            net_balance: phi_component - psi_component.abs(),
            phase_angle: psi_component.atan2(phi_component),
            magnitude: phi_component.hypot(psi_component),
        }
    }

    /// Growth indicator in [−1, 1]: net balance normalized by magnitude.
    /// Zero for the empty lattice.
    pub fn growth_indicator(&self) -> f64 {
        if self.magnitude == 0.0 {
            0.0
        } else {
            self.net_balance / self.magnitude
        }
    }
}

/// A point in the (q, p, θ) phase space spanned by a pair of lattices.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhaseCoord {
    pub q: f64,
    pub p: f64,
    pub theta: f64,
}

impl PhaseCoord {
    /// Maps two lattices into phase space: q from the first lattice's net
    /// balance, p from the second's magnitude, θ their polar angle.
    pub fn from_lattices(a: &BidirectionalLattice, b: &BidirectionalLattice) -> Self {
        let q = a.net_balance;
        let p = b.magnitude;
        Self {
            q,
            p,
            theta: p.atan2(q),
        }
    }

    /// Euclidean distance to another phase-space point.
    pub fn distance(&self, other: &PhaseCoord) -> f64 {
        let dq = self.q - other.q;
        let dp = self.p - other.p;
        let dt = self.theta - other.theta;
        (dq * dq + dp * dp + dt * dt).sqrt()
    }
}
