// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 PhiLattice Project
// Part of PhiLattice — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

use pl_config::CoreLimits;
use pl_engine::{FibLucas, ZeckendorfRepresentation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cache::BoundedLru;
use crate::lattice::{BidirectionalLattice, PhaseCoord};
use crate::{EncodeError, Result};

/// One raw scalar channel handed to the encoder: a label, a positive value,
/// and the explicit scale that turns it into an integer.
#[derive(Debug, Clone, Copy)]
pub struct ChannelSample<'a> {
    pub label: &'a str,
    pub value: f64,
    pub scale: f64,
}

impl<'a> ChannelSample<'a> {
    pub fn new(label: &'a str, value: f64, scale: f64) -> Self {
        Self {
            label,
            value,
            scale,
        }
    }
}

/// An encoded channel: the source scalar plus its representation and
/// derived lattice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelState {
    pub label: String,
    pub value: f64,
    pub scale: f64,
    pub representation: ZeckendorfRepresentation,
    pub lattice: BidirectionalLattice,
}

/// One encoded input record. The first two channels are the designated
/// pair that spans the phase-space coordinate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodedState {
    pub channels: Vec<ChannelState>,
    pub phase: PhaseCoord,
}

impl EncodedState {
    pub fn primary(&self) -> &ChannelState {
        &self.channels[0]
    }

    pub fn secondary(&self) -> &ChannelState {
        &self.channels[1]
    }
}

/// Converts positive real scalars into cached Zeckendorf representations
/// and phase-space coordinates.
///
/// The encoder owns its Fibonacci/Lucas table and both bounded caches;
/// dropping the encoder drops every cache with it. Identical inputs always
/// produce value-equal outputs — there is no hidden state beyond the
/// caches, and cache hits and misses are observationally equivalent.
#[derive(Debug)]
pub struct ZeckendorfStateEncoder {
    table: FibLucas,
    repr_cache: BoundedLru<u64, ZeckendorfRepresentation>,
    lattice_cache: BoundedLru<u64, BidirectionalLattice>,
}

impl Default for ZeckendorfStateEncoder {
    fn default() -> Self {
        Self::with_limits(&CoreLimits::default())
    }
}

impl ZeckendorfStateEncoder {
    pub fn new(repr_capacity: usize, lattice_capacity: usize) -> Self {
        Self {
            table: FibLucas::new(),
            repr_cache: BoundedLru::new(repr_capacity),
            lattice_cache: BoundedLru::new(lattice_capacity),
        }
    }

    pub fn with_limits(limits: &CoreLimits) -> Self {
        Self::new(limits.repr_cache_capacity, limits.lattice_cache_capacity)
    }

    /// Maps a positive scalar onto the integer grid: max(1, round(value·scale)).
    /// Rejects non-positive and non-finite values and scales.
    pub fn normalize_to_integer(&self, value: f64, scale: f64) -> Result<u64> {
        if !(value.is_finite() && value > 0.0) {
            return Err(EncodeError::InvalidValue(value));
        }
        if !(scale.is_finite() && scale > 0.0) {
            return Err(EncodeError::InvalidValue(scale));
        }
        let scaled = (value * scale).round();
        if scaled >= u64::MAX as f64 {
            return Err(EncodeError::ValueOutOfRange(scaled));
        }
        Ok((scaled as u64).max(1))
    }

    /// Encodes a scalar into its Zeckendorf representation, keyed in the
    /// bounded cache by the normalized integer.
    pub fn encode_value(&mut self, value: f64, scale: f64) -> Result<ZeckendorfRepresentation> {
        let normalized = self.normalize_to_integer(value, scale)?;
        if let Some(repr) = self.repr_cache.touch(&normalized) {
            return Ok(repr.clone());
        }
        let repr = self.table.zeckendorf_decompose(normalized)?;
        if let Some((evicted, _)) = self.repr_cache.insert(normalized, repr.clone()) {
            debug!(key = evicted, "representation cache evicted entry");
        }
        Ok(repr)
    }

    /// The bidirectional lattice of a representation, cached by the
    /// representation's identity (its source integer).
    pub fn lattice(&mut self, repr: &ZeckendorfRepresentation) -> BidirectionalLattice {
        let key = repr.value();
        if let Some(lattice) = self.lattice_cache.touch(&key) {
            return *lattice;
        }
        let lattice = BidirectionalLattice::derive(repr);
        if let Some((evicted, _)) = self.lattice_cache.insert(key, lattice) {
            debug!(key = evicted, "lattice cache evicted entry");
        }
        lattice
    }

    /// Combines two lattices into one phase-space coordinate.
    pub fn map_to_phase_space(
        &self,
        a: &BidirectionalLattice,
        b: &BidirectionalLattice,
    ) -> PhaseCoord {
        PhaseCoord::from_lattices(a, b)
    }

    /// Encodes a record of scalar channels. Every channel is encoded
    /// independently; the primary/secondary pair spans the phase-space
    /// coordinate. Fails without touching any cache if any channel is
    /// invalid.
    pub fn encode_state(
        &mut self,
        primary: ChannelSample<'_>,
        secondary: ChannelSample<'_>,
        extras: &[ChannelSample<'_>],
    ) -> Result<EncodedState> {
        // Validate the full record first so a bad trailing channel cannot
        // leave a partial cache footprint.
        self.normalize_to_integer(primary.value, primary.scale)?;
        self.normalize_to_integer(secondary.value, secondary.scale)?;
        for extra in extras {
            self.normalize_to_integer(extra.value, extra.scale)?;
        }

        let mut channels = Vec::with_capacity(2 + extras.len());
        for sample in [&primary, &secondary].into_iter().chain(extras.iter()) {
            let representation = self.encode_value(sample.value, sample.scale)?;
            let lattice = self.lattice(&representation);
            channels.push(ChannelState {
                label: sample.label.to_string(),
                value: sample.value,
                scale: sample.scale,
                representation,
                lattice,
            });
        }

        let phase = PhaseCoord::from_lattices(&channels[0].lattice, &channels[1].lattice);
        Ok(EncodedState { channels, phase })
    }

    /// Live entries in the representation cache.
    pub fn repr_cache_len(&self) -> usize {
        self.repr_cache.len()
    }

    /// Live entries in the lattice cache.
    pub fn lattice_cache_len(&self) -> usize {
        self.lattice_cache.len()
    }

    /// Lossy inverse: net balance rescaled back to the input domain. Exact
    /// inversion is unsupported by design.
    pub fn decode_approx(&self, lattice: &BidirectionalLattice, scale: f64) -> Result<f64> {
        if !(scale.is_finite() && scale > 0.0) {
            return Err(EncodeError::InvalidValue(scale));
        }
        Ok(lattice.net_balance / scale)
    }
}
