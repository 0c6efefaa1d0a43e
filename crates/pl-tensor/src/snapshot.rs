// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 PhiLattice Project
// Part of PhiLattice — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::tensor::{Rank4Tensor, TensorElement, TensorStatistics};

/// A flat, serializable image of the whole store: every element with its
/// exact value triple and metadata, the populated slice times, and the
/// aggregate counters. Re-importing a snapshot reproduces an identical
/// element set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TensorSnapshot {
    pub max_shell: u16,
    /// Elements ordered by packed coordinate key.
    pub elements: Vec<TensorElement>,
    /// Populated time slices, increasing.
    pub slices: Vec<u16>,
    pub statistics: TensorStatistics,
}

impl Rank4Tensor {
    /// Exports the current element set. Ordering is by packed key, so two
    /// equal stores always export byte-identical snapshots.
    pub fn export(&self) -> TensorSnapshot {
        let mut elements: Vec<TensorElement> = self.elements().values().copied().collect();
        elements.sort_unstable_by_key(|e| e.coord.packed());

        let mut slices: Vec<u16> = elements.iter().map(|e| e.coord.time).collect();
        slices.sort_unstable();
        slices.dedup();

        TensorSnapshot {
            max_shell: self.max_shell(),
            elements,
            slices,
            statistics: self.statistics(),
        }
    }

    /// Rebuilds a store from a snapshot. Element flags are restored as
    /// exported, not recomputed, so the imported set is identical to the
    /// exported one; the origin is re-created first in case a snapshot was
    /// produced by tooling that dropped it.
    pub fn import(snapshot: &TensorSnapshot) -> Rank4Tensor {
        let mut tensor = Rank4Tensor::new(snapshot.max_shell);
        for element in &snapshot.elements {
            tensor.restore_element(*element);
        }
        info!(
            elements = snapshot.elements.len(),
            slices = snapshot.slices.len(),
            "imported tensor snapshot"
        );
        tensor
    }
}
