// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 PhiLattice Project
// Part of PhiLattice — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

use serde::{Deserialize, Serialize};

use crate::encoder::{EncodedState, ZeckendorfStateEncoder};

/// Growth-indicator cutoff for the expansion branch.
pub const GROWTH_CUTOFF: f64 = 0.3;
/// Secondary-channel confirmation cutoff for expansion.
pub const CONFIRM_CUTOFF: f64 = 0.2;
/// Absolute secondary-channel cutoff for the turbulent branch.
pub const TURBULENCE_CUTOFF: f64 = 0.4;

/// Fixed four-way classification of an encoded state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Regime {
    /// Strong primary growth confirmed by the secondary channel.
    Expansion,
    /// Strong primary decay.
    Contraction,
    /// Large secondary swing without a confirmed direction.
    Turbulent,
    /// Everything else.
    Steady,
}

impl ZeckendorfStateEncoder {
    /// Similarity in [0, 1]: the mean of phase-space proximity
    /// (1 / (1 + distance)) and primary-lattice phase alignment
    /// ((1 + cos Δangle) / 2). Exactly 1.0 for identical states.
    pub fn similarity(&self, a: &EncodedState, b: &EncodedState) -> f64 {
        let proximity = 1.0 / (1.0 + a.phase.distance(&b.phase));
        let delta = a.primary().lattice.phase_angle - b.primary().lattice.phase_angle;
        let alignment = (1.0 + delta.cos()) / 2.0;
        (proximity + alignment) / 2.0
    }

    /// Deterministic regime classification over the primary growth
    /// indicator and the secondary channel's own indicator.
    pub fn classify_regime(&self, state: &EncodedState) -> Regime {
        let growth = state.primary().lattice.growth_indicator();
        let secondary = state.secondary().lattice.growth_indicator();
        if growth > GROWTH_CUTOFF && secondary > CONFIRM_CUTOFF {
            Regime::Expansion
        } else if growth < -GROWTH_CUTOFF {
            Regime::Contraction
        } else if secondary.abs() > TURBULENCE_CUTOFF {
            Regime::Turbulent
        } else {
            Regime::Steady
        }
    }
}
