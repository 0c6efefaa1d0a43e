// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 PhiLattice Project
// Part of PhiLattice — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

use std::sync::OnceLock;

/// Default capacity of the representation-by-integer LRU cache.
pub const DEFAULT_REPR_CACHE: usize = 1024;
/// Default capacity of the lattice-by-representation LRU cache.
pub const DEFAULT_LATTICE_CACHE: usize = 1024;
/// Default tensor shell bound.
pub const DEFAULT_MAX_SHELL: u32 = 21;

/// Immutable snapshot of the core resource limits.
///
/// Read once from `PHILATTICE_*` environment variables; constructors across
/// the workspace take explicit values and only their `Default` impls consult
/// this snapshot. There is no mutable global configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoreLimits {
    /// Bounded size of the Zeckendorf representation cache.
    pub repr_cache_capacity: usize,
    /// Bounded size of the bidirectional lattice cache.
    pub lattice_cache_capacity: usize,
    /// Default phi/psi shell ceiling for new tensors.
    pub max_shell: u32,
}

impl Default for CoreLimits {
    fn default() -> Self {
        limits().clone()
    }
}

impl CoreLimits {
    /// Builds a snapshot from environment variables, falling back to the
    /// compiled defaults for anything unset or unparseable.
    fn from_env() -> Self {
        Self {
            repr_cache_capacity: parse_env("PHILATTICE_REPR_CACHE", DEFAULT_REPR_CACHE),
            lattice_cache_capacity: parse_env("PHILATTICE_LATTICE_CACHE", DEFAULT_LATTICE_CACHE),
            max_shell: parse_env("PHILATTICE_MAX_SHELL", DEFAULT_MAX_SHELL),
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, fallback: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|raw| raw.trim().parse::<T>().ok())
        .unwrap_or(fallback)
}

static LIMITS: OnceLock<CoreLimits> = OnceLock::new();

/// Returns the lazily initialised limits snapshot.
pub fn limits() -> &'static CoreLimits {
    LIMITS.get_or_init(CoreLimits::from_env)
}

/// Overrides the snapshot before first use. Intended for tests.
pub fn configure(limits: CoreLimits) -> &'static CoreLimits {
    LIMITS.get_or_init(|| limits)
}
