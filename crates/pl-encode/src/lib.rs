// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 PhiLattice Project
// Part of PhiLattice — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! Zeckendorf state encoding.
//!
//! This crate is the approximate-real half of PhiLattice: the one place
//! where φ/ψ exponentials are evaluated as f64 sums. Nothing computed here
//! feeds back into the exact-integer invariants of `pl-engine`; lattices,
//! phase angles and similarity scores are read-only derivations over the
//! representations the engine produced, never used for reconstruction.

pub mod cache;
pub mod encoder;
pub mod lattice;
pub mod regime;

pub use cache::BoundedLru;
pub use encoder::{ChannelSample, ChannelState, EncodedState, ZeckendorfStateEncoder};
pub use lattice::{BidirectionalLattice, PhaseCoord};
pub use regime::Regime;

use thiserror::Error;

/// Golden ratio φ = (1 + √5)/2, the growth base of the lattice sums.
pub const GOLDEN_RATIO: f64 = 1.618_033_988_749_894_9;
/// Algebraic conjugate ψ = (1 − √5)/2. |ψ| < 1, so ψ-power sums decay and
/// alternate in sign — the decay component of a lattice.
pub const GOLDEN_RATIO_CONJUGATE: f64 = -0.618_033_988_749_894_9;

/// Errors produced while normalizing or encoding scalars. Pure input
/// validation; caches are untouched on the error path.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("scalar {0} is not positive and finite")]
    InvalidValue(f64),
    #[error("scaled value {0} exceeds the integer encoding range")]
    ValueOutOfRange(f64),
    #[error(transparent)]
    Engine(#[from] pl_engine::EngineError),
}

pub type Result<T> = std::result::Result<T, EncodeError>;
