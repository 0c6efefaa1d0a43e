// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 PhiLattice Project
// Part of PhiLattice — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! Sparse rank-4 tensor store over Fibonacci/Lucas shell coordinates.
//!
//! Elements live at (phi-shell, psi-shell, time, phase) coordinates packed
//! into a single 64-bit key. The store expands through deterministic wave
//! propagation along the shell axes, admits children through the Cassini
//! identity filter, and stays sparse: absent coordinates are implicit
//! zeros, growth is clipped at the shell bound, and the dense
//! (max_shell·2)⁴ grid is never materialized.
//!
//! Values are exact [`SymbolicValue`] triples in the {1, φ, √5} basis;
//! every aggregate (propagation merge, contraction) is coefficient-wise
//! rational arithmetic, never floating point.

pub mod coord;
pub mod snapshot;
pub mod symbolic;
pub mod tensor;

pub use coord::{Axis, ShellCoord};
pub use snapshot::TensorSnapshot;
pub use symbolic::SymbolicValue;
pub use tensor::{
    Contraction, Rank4Tensor, TensorElement, TensorStatistics, TimeSlice, MAX_SHELL_LIMIT,
};
