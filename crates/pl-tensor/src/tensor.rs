// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 PhiLattice Project
// Part of PhiLattice — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

use std::collections::{BTreeMap, HashMap};

use pl_config::CoreLimits;
use pl_encode::Regime;
use pl_engine::FibLucas;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::coord::{Axis, ShellCoord};
use crate::symbolic::SymbolicValue;

/// Hard ceiling on the shell bound: keeps the combined Cassini index of any
/// pair of shells inside the exact-check range of the engine.
pub const MAX_SHELL_LIMIT: u16 = 45;

/// One stored element of the sparse tensor.
///
/// `is_nash` is computed once at creation and never re-evaluated;
/// `is_saturated` marks elements whose shell distance exceeds the tensor's
/// configured bound. Elements are only removed by a full [`Rank4Tensor::reset`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TensorElement {
    pub coord: ShellCoord,
    pub value: SymbolicValue,
    pub is_nash: bool,
    pub is_active: bool,
    pub is_saturated: bool,
    pub shell_distance: f64,
}

/// A cached view of one time slice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSlice {
    pub time: u16,
    /// Member coordinates, ordered by packed key for determinism.
    pub coords: Vec<ShellCoord>,
    pub active_count: usize,
    /// Active count over the per-slice theoretical capacity.
    pub saturation: f64,
    /// Regime of the slice under shell-index-derived cutoffs.
    pub regime: Regime,
}

/// Aggregate counters over the whole store.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TensorStatistics {
    pub total_elements: usize,
    pub active_elements: usize,
    pub nash_points: usize,
    pub slice_count: usize,
    /// 1 − total/(max_shell·2)⁴, clamped to [0, 1).
    pub compression_ratio: f64,
}

/// Exact sums grouped by the coordinate with one axis removed.
#[derive(Debug, Clone, PartialEq)]
pub struct Contraction {
    pub axis: Axis,
    pub groups: BTreeMap<u64, SymbolicValue>,
}

impl Contraction {
    /// Iterates groups as (reduced coordinate, exact sum).
    pub fn iter(&self) -> impl Iterator<Item = (ShellCoord, &SymbolicValue)> {
        self.groups
            .iter()
            .map(|(&key, value)| (ShellCoord::from_packed(key), value))
    }
}

/// Sparse store of rank-4 shell elements.
///
/// The theoretically dense coordinate space stays sparse through bounded
/// deterministic propagation: every expansion step advances one shell axis
/// by one or two, is clipped at the shell bound, and must survive the
/// Cassini admission filter. An absent coordinate is an implicit zero and
/// is never materialized.
#[derive(Debug)]
pub struct Rank4Tensor {
    max_shell: u16,
    table: FibLucas,
    elements: HashMap<u64, TensorElement>,
    slice_cache: HashMap<u16, TimeSlice>,
}

impl Default for Rank4Tensor {
    fn default() -> Self {
        Self::new(CoreLimits::default().max_shell as u16)
    }
}

impl Rank4Tensor {
    /// A store bounded at `max_shell` (clamped to [1, [`MAX_SHELL_LIMIT`]])
    /// with the origin element pre-created as Active + Nash.
    pub fn new(max_shell: u16) -> Self {
        let mut tensor = Self {
            max_shell: max_shell.clamp(1, MAX_SHELL_LIMIT),
            table: FibLucas::new(),
            elements: HashMap::new(),
            slice_cache: HashMap::new(),
        };
        tensor.insert_element(ShellCoord::ORIGIN, SymbolicValue::one());
        tensor
    }

    pub fn max_shell(&self) -> u16 {
        self.max_shell
    }

    /// Theoretical number of coordinates in one time slice.
    pub fn slice_capacity(&self) -> usize {
        let shells = self.max_shell as usize + 1;
        shells * shells * 2
    }

    fn insert_element(&mut self, coord: ShellCoord, value: SymbolicValue) {
        let distance = coord.shell_distance();
        let element = TensorElement {
            coord,
            value,
            is_nash: coord.is_nash_point(),
            is_active: true,
            is_saturated: distance > self.max_shell as f64,
            shell_distance: distance,
        };
        self.elements.insert(coord.packed(), element);
        self.slice_cache.remove(&coord.time);
    }

    /// Stores a value at a coordinate. A fresh coordinate becomes an Active
    /// element with its Nash flag computed once; an existing element keeps
    /// its flags and takes the new value.
    pub fn set(&mut self, coord: ShellCoord, value: SymbolicValue) {
        match self.elements.get_mut(&coord.packed()) {
            Some(element) => {
                element.value = value;
                self.slice_cache.remove(&coord.time);
            }
            None => self.insert_element(coord, value),
        }
    }

    pub fn get(&self, coord: ShellCoord) -> Option<&TensorElement> {
        self.elements.get(&coord.packed())
    }

    pub fn has(&self, coord: ShellCoord) -> bool {
        self.elements.contains_key(&coord.packed())
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Cassini admission filter over the combined shell index. In-range
    /// indices always satisfy the identity, so this doubles as a structural
    /// guard on the sequence table; a failing candidate is dropped silently
    /// by the propagation paths.
    pub fn check_cassini_survival(&mut self, coord: ShellCoord) -> bool {
        self.table
            .verify_cassini(coord.combined_shell() as i64)
            .unwrap_or(false)
    }

    /// Forward/growth expansion: children at phi+1 and phi+2, one time step
    /// ahead, psi unchanged, phase following the new phi shell. Candidates
    /// beyond the shell bound or failing the Cassini filter are silent
    /// no-ops. Returns the admitted child coordinates.
    pub fn fibonacci_propagate(&mut self, coord: ShellCoord) -> Vec<ShellCoord> {
        self.propagate(coord, Axis::Phi)
    }

    /// Backward/decay expansion: the symmetric step advancing psi.
    pub fn lucas_propagate(&mut self, coord: ShellCoord) -> Vec<ShellCoord> {
        self.propagate(coord, Axis::Psi)
    }

    /// Default expansion step: the union of both propagation sets.
    pub fn dual_propagate(&mut self, coord: ShellCoord) -> Vec<ShellCoord> {
        let mut admitted = self.fibonacci_propagate(coord);
        admitted.extend(self.lucas_propagate(coord));
        admitted
    }

    fn propagate(&mut self, coord: ShellCoord, axis: Axis) -> Vec<ShellCoord> {
        let Some(parent) = self.elements.get(&coord.packed()) else {
            // Propagating an implicit zero spreads nothing.
            return Vec::new();
        };
        let carried = parent.value;
        let Some(time) = coord.time.checked_add(1) else {
            return Vec::new();
        };

        let mut admitted = Vec::new();
        for step in [1u16, 2] {
            let child = match axis {
                Axis::Phi => {
                    let phi = coord.phi.saturating_add(step);
                    if phi > self.max_shell {
                        continue;
                    }
                    ShellCoord::new(phi, coord.psi, time, ShellCoord::phase_of(phi))
                }
                Axis::Psi => {
                    let psi = coord.psi.saturating_add(step);
                    if psi > self.max_shell {
                        continue;
                    }
                    ShellCoord::new(coord.phi, psi, time, ShellCoord::phase_of(psi))
                }
                Axis::Time | Axis::Phase => unreachable!("propagation advances shell axes"),
            };
            if !self.check_cassini_survival(child) {
                continue;
            }
            self.admit(child, carried);
            admitted.push(child);
        }
        debug!(
            parent = coord.packed(),
            axis = ?axis,
            admitted = admitted.len(),
            "shell propagation"
        );
        admitted
    }

    /// Admission merges onto an existing element by exact coefficient-wise
    /// addition; a fresh coordinate is created Active.
    fn admit(&mut self, coord: ShellCoord, carried: SymbolicValue) {
        match self.elements.get_mut(&coord.packed()) {
            Some(element) => {
                element.value += carried;
                self.slice_cache.remove(&coord.time);
            }
            None => self.insert_element(coord, carried),
        }
    }

    /// The cached view of time slice `t`, recomputed lazily after any write
    /// into that slice.
    pub fn slice(&mut self, t: u16) -> &TimeSlice {
        if !self.slice_cache.contains_key(&t) {
            let slice = self.compute_slice(t);
            self.slice_cache.insert(t, slice);
        }
        &self.slice_cache[&t]
    }

    fn compute_slice(&self, t: u16) -> TimeSlice {
        let mut keys: Vec<u64> = self
            .elements
            .values()
            .filter(|e| e.coord.time == t)
            .map(|e| e.coord.packed())
            .collect();
        keys.sort_unstable();
        let coords: Vec<ShellCoord> = keys.into_iter().map(ShellCoord::from_packed).collect();

        let active: Vec<&TensorElement> = coords
            .iter()
            .filter_map(|c| self.elements.get(&c.packed()))
            .filter(|e| e.is_active)
            .collect();
        let active_count = active.len();
        let saturation = active_count as f64 / self.slice_capacity() as f64;

        TimeSlice {
            time: t,
            coords,
            active_count,
            saturation,
            regime: self.classify_slice(&active),
        }
    }

    /// The encoder's 4-way scheme with shell-index-derived cutoffs: the
    /// mean phi−psi bias plays the growth indicator against max_shell/3,
    /// the mean |phi−psi| spread plays the secondary indicator against
    /// max_shell/5 and 2·max_shell/5.
    fn classify_slice(&self, active: &[&TensorElement]) -> Regime {
        if active.is_empty() {
            return Regime::Steady;
        }
        let count = active.len() as f64;
        let bias: f64 = active
            .iter()
            .map(|e| e.coord.phi as f64 - e.coord.psi as f64)
            .sum::<f64>()
            / count;
        let spread: f64 = active
            .iter()
            .map(|e| (e.coord.phi as f64 - e.coord.psi as f64).abs())
            .sum::<f64>()
            / count;

        let growth_cut = self.max_shell as f64 / 3.0;
        let confirm_cut = self.max_shell as f64 / 5.0;
        let turbulence_cut = 2.0 * self.max_shell as f64 / 5.0;

        if bias > growth_cut && spread > confirm_cut {
            Regime::Expansion
        } else if bias < -growth_cut {
            Regime::Contraction
        } else if spread > turbulence_cut {
            Regime::Turbulent
        } else {
            Regime::Steady
        }
    }

    /// Marginalization: active elements grouped by their coordinate with
    /// `axis` removed, values summed exactly per group.
    pub fn contract(&self, axis: Axis) -> Contraction {
        let mut groups: BTreeMap<u64, SymbolicValue> = BTreeMap::new();
        for element in self.elements.values().filter(|e| e.is_active) {
            let key = element.coord.without(axis).packed();
            *groups.entry(key).or_insert_with(SymbolicValue::zero) += element.value;
        }
        Contraction { axis, groups }
    }

    /// Partition of all elements by time slice, in increasing time order.
    pub fn fiber_projection(&self) -> BTreeMap<u16, Vec<TensorElement>> {
        let mut fibers: BTreeMap<u16, Vec<TensorElement>> = BTreeMap::new();
        for element in self.elements.values() {
            fibers.entry(element.coord.time).or_default().push(*element);
        }
        for members in fibers.values_mut() {
            members.sort_unstable_by_key(|e| e.coord.packed());
        }
        fibers
    }

    /// Walks increasing time slices, letting `selector` extract one
    /// representative per slice; the picks form the returned trajectory.
    /// Slices where the selector declines contribute nothing.
    pub fn section<F>(&self, mut selector: F) -> Vec<TensorElement>
    where
        F: FnMut(&[TensorElement]) -> Option<TensorElement>,
    {
        self.fiber_projection()
            .values()
            .filter_map(|members| selector(members))
            .collect()
    }

    pub fn statistics(&self) -> TensorStatistics {
        let total_elements = self.elements.len();
        let active_elements = self.elements.values().filter(|e| e.is_active).count();
        let nash_points = self.elements.values().filter(|e| e.is_nash).count();
        let slice_count = {
            let mut times: Vec<u16> = self.elements.values().map(|e| e.coord.time).collect();
            times.sort_unstable();
            times.dedup();
            times.len()
        };
        let dense = (self.max_shell as f64 * 2.0).powi(4);
        let compression_ratio = (1.0 - total_elements as f64 / dense).clamp(0.0, 1.0 - f64::EPSILON);

        TensorStatistics {
            total_elements,
            active_elements,
            nash_points,
            slice_count,
            compression_ratio,
        }
    }

    /// Drops every element and cache and re-creates the origin. The only
    /// way elements are ever physically deleted.
    pub fn reset(&mut self) {
        self.elements.clear();
        self.slice_cache.clear();
        self.insert_element(ShellCoord::ORIGIN, SymbolicValue::one());
    }

    pub(crate) fn elements(&self) -> &HashMap<u64, TensorElement> {
        &self.elements
    }

    pub(crate) fn restore_element(&mut self, element: TensorElement) {
        self.elements.insert(element.coord.packed(), element);
        self.slice_cache.remove(&element.coord.time);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_exists_active_and_nash_from_construction() {
        let tensor = Rank4Tensor::new(8);
        let origin = tensor.get(ShellCoord::ORIGIN).expect("origin pre-created");
        assert!(origin.is_active);
        assert!(origin.is_nash);
        assert!(!origin.is_saturated);
        assert_eq!(origin.value, SymbolicValue::one());
    }

    #[test]
    fn origin_always_survives_the_cassini_filter() {
        let mut tensor = Rank4Tensor::new(8);
        assert!(tensor.check_cassini_survival(ShellCoord::ORIGIN));
    }

    #[test]
    fn absent_coordinates_are_implicit_zero() {
        let tensor = Rank4Tensor::new(8);
        let coord = ShellCoord::new(3, 1, 2, 0);
        assert!(!tensor.has(coord));
        assert!(tensor.get(coord).is_none());
        assert_eq!(tensor.len(), 1);
    }

    #[test]
    fn fibonacci_propagation_advances_phi_and_time() {
        let mut tensor = Rank4Tensor::new(8);
        let children = tensor.fibonacci_propagate(ShellCoord::ORIGIN);
        assert_eq!(
            children,
            vec![
                ShellCoord::new(1, 0, 1, 1),
                ShellCoord::new(2, 0, 1, 0),
            ]
        );
        for child in children {
            let element = tensor.get(child).unwrap();
            assert!(element.is_active);
            assert_eq!(element.value, SymbolicValue::one());
        }
    }

    #[test]
    fn lucas_propagation_is_the_psi_mirror() {
        let mut tensor = Rank4Tensor::new(8);
        let children = tensor.lucas_propagate(ShellCoord::ORIGIN);
        assert_eq!(
            children,
            vec![
                ShellCoord::new(0, 1, 1, 1),
                ShellCoord::new(0, 2, 1, 0),
            ]
        );
    }

    #[test]
    fn dual_propagation_is_the_union() {
        let mut tensor = Rank4Tensor::new(8);
        let children = tensor.dual_propagate(ShellCoord::ORIGIN);
        assert_eq!(children.len(), 4);
    }

    #[test]
    fn propagation_is_clipped_at_the_shell_bound() {
        let mut tensor = Rank4Tensor::new(2);
        let edge = ShellCoord::new(2, 0, 0, 0);
        tensor.set(edge, SymbolicValue::one());
        assert!(tensor.fibonacci_propagate(edge).is_empty());
        let near_edge = ShellCoord::new(1, 0, 0, 1);
        tensor.set(near_edge, SymbolicValue::one());
        // Only phi+1 fits under the bound.
        assert_eq!(
            tensor.fibonacci_propagate(near_edge),
            vec![ShellCoord::new(2, 0, 1, 0)]
        );
    }

    #[test]
    fn propagating_an_absent_coordinate_is_a_no_op() {
        let mut tensor = Rank4Tensor::new(8);
        let before = tensor.len();
        assert!(tensor.dual_propagate(ShellCoord::new(3, 3, 3, 0)).is_empty());
        assert_eq!(tensor.len(), before);
    }

    #[test]
    fn repeated_admission_accumulates_exactly() {
        let mut tensor = Rank4Tensor::new(8);
        tensor.fibonacci_propagate(ShellCoord::ORIGIN);
        tensor.fibonacci_propagate(ShellCoord::ORIGIN);
        let child = tensor.get(ShellCoord::new(1, 0, 1, 1)).unwrap();
        assert_eq!(child.value, SymbolicValue::from_integer(2));
    }

    #[test]
    fn slices_cache_and_invalidate_on_write() {
        let mut tensor = Rank4Tensor::new(8);
        tensor.dual_propagate(ShellCoord::ORIGIN);
        let first = tensor.slice(1).clone();
        assert_eq!(first.active_count, 4);
        // Writing into slice 1 must force recomputation.
        tensor.set(ShellCoord::new(5, 0, 1, 1), SymbolicValue::one());
        let second = tensor.slice(1);
        assert_eq!(second.active_count, 5);
        assert!(second.saturation > first.saturation);
    }

    #[test]
    fn slice_saturation_uses_the_per_slice_capacity() {
        let mut tensor = Rank4Tensor::new(4);
        tensor.dual_propagate(ShellCoord::ORIGIN);
        let capacity = tensor.slice_capacity();
        let slice = tensor.slice(1);
        assert_eq!(slice.saturation, slice.active_count as f64 / capacity as f64);
    }

    #[test]
    fn empty_slice_is_steady_and_unsaturated() {
        let mut tensor = Rank4Tensor::new(8);
        let slice = tensor.slice(7);
        assert_eq!(slice.active_count, 0);
        assert_eq!(slice.saturation, 0.0);
        assert_eq!(slice.regime, Regime::Steady);
    }

    #[test]
    fn phi_heavy_slice_classifies_as_expansion() {
        let mut tensor = Rank4Tensor::new(6);
        for phi in 3..=6u16 {
            tensor.set(
                ShellCoord::new(phi, 0, 1, ShellCoord::phase_of(phi)),
                SymbolicValue::one(),
            );
        }
        assert_eq!(tensor.slice(1).regime, Regime::Expansion);
    }

    #[test]
    fn psi_heavy_slice_classifies_as_contraction() {
        let mut tensor = Rank4Tensor::new(6);
        for psi in 3..=6u16 {
            tensor.set(
                ShellCoord::new(0, psi, 1, ShellCoord::phase_of(psi)),
                SymbolicValue::one(),
            );
        }
        assert_eq!(tensor.slice(1).regime, Regime::Contraction);
    }

    #[test]
    fn contraction_over_time_merges_slices() {
        let mut tensor = Rank4Tensor::new(8);
        let a = ShellCoord::new(1, 0, 0, 1);
        let b = ShellCoord::new(1, 0, 5, 1);
        tensor.set(a, SymbolicValue::from_integer(3));
        tensor.set(b, SymbolicValue::from_integer(4));
        let contraction = tensor.contract(Axis::Time);
        let merged = contraction
            .groups
            .get(&a.without(Axis::Time).packed())
            .expect("group for the shared reduced coordinate");
        assert_eq!(*merged, SymbolicValue::from_integer(7));
    }

    #[test]
    fn fiber_projection_partitions_by_time() {
        let mut tensor = Rank4Tensor::new(8);
        tensor.dual_propagate(ShellCoord::ORIGIN);
        let fibers = tensor.fiber_projection();
        assert_eq!(fibers.len(), 2); // t=0 (origin) and t=1 (children)
        assert_eq!(fibers[&0].len(), 1);
        assert_eq!(fibers[&1].len(), 4);
    }

    #[test]
    fn section_extracts_one_representative_per_slice() {
        let mut tensor = Rank4Tensor::new(8);
        let mut frontier = vec![ShellCoord::ORIGIN];
        for _ in 0..3 {
            let mut next = Vec::new();
            for coord in frontier {
                next.extend(tensor.fibonacci_propagate(coord));
            }
            frontier = next;
        }
        let trajectory = tensor.section(|members| {
            members
                .iter()
                .max_by_key(|e| e.coord.combined_shell())
                .copied()
        });
        assert_eq!(trajectory.len(), 4); // t = 0..=3
        for window in trajectory.windows(2) {
            assert!(window[0].coord.time < window[1].coord.time);
        }
    }

    #[test]
    fn statistics_track_inserts_and_compression_monotonicity() {
        let mut tensor = Rank4Tensor::new(8);
        let initial = tensor.statistics();
        assert_eq!(initial.total_elements, 1);
        assert_eq!(initial.nash_points, 1);
        assert!(initial.compression_ratio > 0.0 && initial.compression_ratio < 1.0);

        let mut previous = initial.compression_ratio;
        let mut frontier = vec![ShellCoord::ORIGIN];
        for _ in 0..4 {
            let mut next = Vec::new();
            for coord in frontier {
                next.extend(tensor.dual_propagate(coord));
            }
            frontier = next;
            let ratio = tensor.statistics().compression_ratio;
            assert!(ratio <= previous, "compression ratio must not increase");
            previous = ratio;
        }
        let stats = tensor.statistics();
        assert!(stats.compression_ratio >= 0.0 && stats.compression_ratio < 1.0);
        assert!(stats.active_elements <= stats.total_elements);
        assert!(stats.slice_count >= 5);
    }

    #[test]
    fn reset_returns_to_the_origin_only_state() {
        let mut tensor = Rank4Tensor::new(8);
        tensor.dual_propagate(ShellCoord::ORIGIN);
        assert!(tensor.len() > 1);
        tensor.reset();
        assert_eq!(tensor.len(), 1);
        assert!(tensor.has(ShellCoord::ORIGIN));
    }

    #[test]
    fn saturation_flag_marks_far_shells_at_insertion() {
        let mut tensor = Rank4Tensor::new(4);
        let far = ShellCoord::new(4, 4, 0, 0);
        tensor.set(far, SymbolicValue::one());
        assert!(tensor.get(far).unwrap().is_saturated); // √32 > 4
        let near = ShellCoord::new(2, 1, 0, 1);
        tensor.set(near, SymbolicValue::one());
        assert!(!tensor.get(near).unwrap().is_saturated);
    }
}
