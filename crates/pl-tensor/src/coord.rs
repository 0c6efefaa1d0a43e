// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 PhiLattice Project
// Part of PhiLattice — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

use pl_engine::{phase_angle, phase_parity};
use serde::{Deserialize, Serialize};

/// One coordinate in the rank-4 shell space.
///
/// `phi` and `psi` are the growth/decay shell indices, `time` the expansion
/// step, `phase` the binary interference phase (0 ⇔ angle 0, 1 ⇔ angle π).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ShellCoord {
    pub phi: u16,
    pub psi: u16,
    pub time: u16,
    pub phase: u8,
}

impl ShellCoord {
    pub const ORIGIN: ShellCoord = ShellCoord {
        phi: 0,
        psi: 0,
        time: 0,
        phase: 0,
    };

    pub fn new(phi: u16, psi: u16, time: u16, phase: u8) -> Self {
        debug_assert!(phase <= 1, "phase is binary");
        Self {
            phi,
            psi,
            time,
            phase: phase & 1,
        }
    }

    /// Packs the four bounded fields into one fixed-width key.
    ///
    /// Layout (low to high): phase (1 bit) | time (16) | psi (16) | phi (16).
    /// The packed form is what the sparse map hashes and what snapshot
    /// ordering sorts by.
    pub fn packed(self) -> u64 {
        (self.phase as u64 & 1)
            | (self.time as u64) << 1
            | (self.psi as u64) << 17
            | (self.phi as u64) << 33
    }

    pub fn from_packed(key: u64) -> Self {
        Self {
            phase: (key & 1) as u8,
            time: ((key >> 1) & 0xFFFF) as u16,
            psi: ((key >> 17) & 0xFFFF) as u16,
            phi: ((key >> 33) & 0xFFFF) as u16,
        }
    }

    /// Combined shell index phi + psi, the argument of the Cassini filter
    /// and the Nash parity test.
    pub fn combined_shell(self) -> u32 {
        self.phi as u32 + self.psi as u32
    }

    /// Euclidean norm of the (phi, psi) pair — an approximation of the true
    /// hyperbolic shell distance, and documented as such.
    pub fn shell_distance(self) -> f64 {
        (self.phi as f64).hypot(self.psi as f64)
    }

    /// Constructive-interference flag: even combined shell parity.
    pub fn is_nash_point(self) -> bool {
        phase_parity(self.combined_shell()) == 1
    }

    /// The canonical phase of a shell index.
    pub fn phase_of(shell: u16) -> u8 {
        phase_angle(shell as u32)
    }
}

/// The four contractible dimensions of the tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    Phi,
    Psi,
    Time,
    Phase,
}

impl ShellCoord {
    /// The coordinate with one axis removed (field cleared), used as the
    /// group key during contraction.
    pub fn without(self, axis: Axis) -> ShellCoord {
        let mut reduced = self;
        match axis {
            Axis::Phi => reduced.phi = 0,
            Axis::Psi => reduced.psi = 0,
            Axis::Time => reduced.time = 0,
            Axis::Phase => reduced.phase = 0,
        }
        reduced
    }
}
