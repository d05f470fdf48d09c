// Copyright (c) 2025 Felix Kahle.
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! # Partial Solution
//!
//! The branch-and-bound node state: for every machine the stack of operations
//! placed so far, each with the `IntervalSubset` it was fixed to, plus the
//! machine-time and energy budgets left after those placements.
//!
//! ## Charging rules
//!
//! Placing operation `o` (processing time `p`, power `w`) on machine `m` with
//! metering interval length `L` charges only what the window already pins down:
//!
//! | intervals | charged                                              |
//! |-----------|------------------------------------------------------|
//! | 1         | `p` time and `p * w` energy in that interval         |
//! | 2         | nothing; the split is decided by the oracle          |
//! | ≥ 3       | `L` time and `L * w` energy in every inner interval  |
//!
//! A push reports a violation when any charged budget drops below zero
//! (energy compared with tolerance). The push is applied regardless so that
//! the matching `pop` has something to undo.
//!
//! ## Undo
//!
//! Budgets are restored from a `BudgetTrail` of saved old values, so a
//! `push` followed by `pop` leaves every budget bit-identical. `push_scoped`
//! wraps the pair in a guard that pops on drop.

use crate::trail::BudgetTrail;
use fixedbitset::FixedBitSet;
use joule_core::num::tolerance::Tolerance;
use joule_model::index::{MachineIndex, OperationIndex};
use joule_model::instance::Instance;
use joule_model::subset::IntervalSubset;

#[derive(Debug, Clone)]
pub struct PartialSolution {
    num_intervals: usize,
    metering_interval_length: i64,
    tolerance: Tolerance,
    machines: Vec<MachineIndex>,
    processing_times: Vec<i64>,
    power_consumptions: Vec<f64>,
    machine_stacks: Vec<Vec<OperationIndex>>,
    windows: Vec<Option<IntervalSubset>>,
    unplaced: FixedBitSet,
    num_unplaced: usize,
    machine_remaining_processing: Vec<i64>,
    available_time: Vec<i64>,
    available_energy: Vec<f64>,
    trail: BudgetTrail,
}

impl PartialSolution {
    /// An empty partial solution with full budgets.
    pub fn new(instance: &Instance) -> Self {
        let num_operations = instance.total_num_operations();
        let num_machines = instance.num_machines();
        let n = instance.num_metering_intervals();

        let mut unplaced = FixedBitSet::with_capacity(num_operations);
        unplaced.insert_range(..);

        Self {
            num_intervals: n,
            metering_interval_length: instance.metering_interval_length(),
            tolerance: Tolerance::default(),
            machines: instance.operations().iter().map(|op| op.machine_index()).collect(),
            processing_times: instance.operations().iter().map(|op| op.processing_time()).collect(),
            power_consumptions: instance
                .operations()
                .iter()
                .map(|op| op.power_consumption())
                .collect(),
            machine_stacks: (0..num_machines)
                .map(|m| Vec::with_capacity(instance.machine_operations(MachineIndex::new(m)).len()))
                .collect(),
            windows: vec![None; num_operations],
            unplaced,
            num_unplaced: num_operations,
            machine_remaining_processing: (0..num_machines)
                .map(|m| instance.machine_workload(MachineIndex::new(m)))
                .collect(),
            available_time: vec![instance.metering_interval_length(); num_machines * n],
            available_energy: vec![instance.energy_limit(); n],
            trail: BudgetTrail::preallocated(num_operations),
        }
    }

    #[inline]
    pub fn with_tolerance(mut self, tolerance: Tolerance) -> Self {
        self.tolerance = tolerance;
        self
    }

    #[inline]
    pub fn num_machines(&self) -> usize {
        self.machine_stacks.len()
    }

    #[inline]
    pub fn num_operations(&self) -> usize {
        self.windows.len()
    }

    /// Window of every operation, `None` while unplaced. Indexed by operation.
    #[inline]
    pub fn windows(&self) -> &[Option<IntervalSubset>] {
        &self.windows
    }

    #[inline]
    pub fn window(&self, operation: OperationIndex) -> Option<IntervalSubset> {
        self.windows[operation.get()]
    }

    #[inline]
    pub fn is_unplaced(&self, operation: OperationIndex) -> bool {
        self.unplaced.contains(operation.get())
    }

    /// Unplaced operations in identity order.
    #[inline]
    pub fn unplaced_operations(&self) -> impl Iterator<Item = OperationIndex> + '_ {
        self.unplaced.ones().map(OperationIndex::new)
    }

    #[inline]
    pub fn num_unplaced(&self) -> usize {
        self.num_unplaced
    }

    /// `true` once every operation is placed.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.num_unplaced == 0
    }

    /// Number of placements, i.e. the depth in the search tree.
    #[inline]
    pub fn depth(&self) -> usize {
        self.trail.depth()
    }

    /// Operations placed on `machine`, in placement order.
    #[inline]
    pub fn machine_stack(&self, machine: MachineIndex) -> &[OperationIndex] {
        &self.machine_stacks[machine.get()]
    }

    /// Every machine's stack, bottom first.
    #[inline]
    pub fn machine_stacks(&self) -> &[Vec<OperationIndex>] {
        &self.machine_stacks
    }

    /// Most recently placed operation on `machine`.
    #[inline]
    pub fn top(&self, machine: MachineIndex) -> Option<OperationIndex> {
        self.machine_stacks[machine.get()].last().copied()
    }

    /// First interval the next operation on `machine` may occupy: the last
    /// interval of the top operation's window, or `0` on an empty machine.
    #[inline]
    pub fn first_allocable_interval(&self, machine: MachineIndex) -> usize {
        self.top(machine)
            .and_then(|op| self.windows[op.get()])
            .map_or(0, |w| w.last())
    }

    /// Processing time of the unplaced operations of `machine`.
    #[inline]
    pub fn machine_remaining_processing(&self, machine: MachineIndex) -> i64 {
        self.machine_remaining_processing[machine.get()]
    }

    #[inline]
    pub fn available_time(&self, machine: MachineIndex, interval: usize) -> i64 {
        self.available_time[machine.get() * self.num_intervals + interval]
    }

    #[inline]
    pub fn available_energy(&self, interval: usize) -> f64 {
        self.available_energy[interval]
    }

    /// Places `operation` on top of its machine's stack, fixed to `window`,
    /// and charges the budgets. Returns `true` if a charged budget went
    /// negative.
    ///
    /// # Panics
    ///
    /// In debug builds, panics if the operation is already placed or the
    /// window reaches past the horizon.
    pub fn push(&mut self, operation: OperationIndex, window: IntervalSubset) -> bool {
        let i = operation.get();
        debug_assert!(
            self.unplaced.contains(i),
            "called `PartialSolution::push` with already placed operation {}",
            operation
        );
        debug_assert!(
            window.last() < self.num_intervals,
            "called `PartialSolution::push` with window {} beyond the last metering interval {}",
            window,
            self.num_intervals.saturating_sub(1)
        );

        let machine = self.machines[i];
        let p = self.processing_times[i];
        let power = self.power_consumptions[i];
        let length = self.metering_interval_length;

        self.trail.push_frame(operation);
        self.machine_stacks[machine.get()].push(operation);
        self.windows[i] = Some(window);
        self.unplaced.set(i, false);
        self.num_unplaced -= 1;
        self.machine_remaining_processing[machine.get()] -= p;

        match window.count() {
            1 => self.consume(machine, window.first(), p, p as f64 * power),
            2 => false,
            _ => {
                let mut violated = false;
                for interval in window.inner() {
                    violated |= self.consume(machine, interval, length, length as f64 * power);
                }
                violated
            }
        }
    }

    fn consume(&mut self, machine: MachineIndex, interval: usize, time: i64, energy: f64) -> bool {
        let cell = machine.get() * self.num_intervals + interval;
        self.trail.record(
            machine,
            interval,
            self.available_time[cell],
            self.available_energy[interval],
        );
        self.available_time[cell] -= time;
        self.available_energy[interval] -= energy;
        self.available_time[cell] < 0 || self.tolerance.less(self.available_energy[interval], 0.0)
    }

    /// Undoes the most recent push, which must have placed the top operation
    /// of `machine`. Returns the removed operation.
    pub fn pop(&mut self, machine: MachineIndex) -> Option<OperationIndex> {
        let operation = self.machine_stacks[machine.get()].pop()?;

        let num_intervals = self.num_intervals;
        let available_time = &mut self.available_time;
        let available_energy = &mut self.available_energy;
        let undone = self.trail.pop_frame(|entry| {
            available_time[entry.machine_index().get() * num_intervals + entry.interval()] =
                entry.old_time();
            available_energy[entry.interval()] = entry.old_energy();
        });
        debug_assert_eq!(
            undone,
            Some(operation),
            "called `PartialSolution::pop` on {} out of push order",
            machine
        );

        let i = operation.get();
        self.windows[i] = None;
        self.unplaced.insert(i);
        self.num_unplaced += 1;
        self.machine_remaining_processing[machine.get()] += self.processing_times[i];
        Some(operation)
    }

    /// Pushes and returns a guard that pops again when dropped.
    #[inline]
    pub fn push_scoped(&mut self, operation: OperationIndex, window: IntervalSubset) -> PushScope<'_> {
        let machine = self.machines[operation.get()];
        let violated = self.push(operation, window);
        PushScope {
            partial: self,
            machine,
            violated,
        }
    }
}

/// A placement that lasts as long as the guard.
///
/// Dereferences to the `PartialSolution` so the child node can be explored
/// through it.
#[derive(Debug)]
pub struct PushScope<'a> {
    partial: &'a mut PartialSolution,
    machine: MachineIndex,
    violated: bool,
}

impl PushScope<'_> {
    /// `true` if the push drove a budget negative.
    #[inline]
    pub fn is_violated(&self) -> bool {
        self.violated
    }
}

impl std::ops::Deref for PushScope<'_> {
    type Target = PartialSolution;

    #[inline]
    fn deref(&self) -> &Self::Target {
        self.partial
    }
}

impl std::ops::DerefMut for PushScope<'_> {
    #[inline]
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.partial
    }
}

impl Drop for PushScope<'_> {
    fn drop(&mut self) {
        self.partial.pop(self.machine);
    }
}

impl std::fmt::Display for PartialSolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PartialSolution(")?;
        for (m, stack) in self.machine_stacks.iter().enumerate() {
            if m > 0 {
                write!(f, "; ")?;
            }
            write!(f, "M{}:", m)?;
            for op in stack {
                match self.windows[op.get()] {
                    Some(w) => write!(f, " {}{}", op.get(), w)?,
                    None => write!(f, " {}", op.get())?,
                }
            }
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use joule_model::instance::InstanceBuilder;
    use proptest::prelude::*;

    fn m(i: usize) -> MachineIndex {
        MachineIndex::new(i)
    }

    fn op(i: usize) -> OperationIndex {
        OperationIndex::new(i)
    }

    /// Two machines, L = 100, horizon 500, energy limit 150.
    /// Operations: 0 (m0, 80, 1.0), 1 (m0, 250, 0.5), 2 (m1, 120, 1.0).
    fn instance() -> Instance {
        let mut b = InstanceBuilder::new(2, 500, 100, 150.0);
        b.add_job([(m(0), 80, 1.0)]);
        b.add_job([(m(0), 250, 0.5)]);
        b.add_job([(m(1), 120, 1.0)]);
        b.build().unwrap()
    }

    #[test]
    fn test_single_interval_push_charges_processing_time() {
        let inst = instance();
        let mut ps = PartialSolution::new(&inst);
        assert!(!ps.push(op(0), IntervalSubset::new(1, 1)));
        assert_eq!(ps.available_time(m(0), 1), 20);
        assert_eq!(ps.available_energy(1), 70.0);
        assert_eq!(ps.machine_remaining_processing(m(0)), 250);
        assert_eq!(ps.first_allocable_interval(m(0)), 1);
        assert_eq!(ps.first_allocable_interval(m(1)), 0);
        assert_eq!(ps.num_unplaced(), 2);
        assert!(!ps.is_unplaced(op(0)));
    }

    #[test]
    fn test_two_interval_push_charges_nothing() {
        let inst = instance();
        let mut ps = PartialSolution::new(&inst);
        assert!(!ps.push(op(2), IntervalSubset::new(0, 1)));
        assert_eq!(ps.available_time(m(1), 0), 100);
        assert_eq!(ps.available_time(m(1), 1), 100);
        assert_eq!(ps.available_energy(0), 150.0);
        assert_eq!(ps.window(op(2)), Some(IntervalSubset::new(0, 1)));
    }

    #[test]
    fn test_spanning_push_charges_inner_intervals() {
        let inst = instance();
        let mut ps = PartialSolution::new(&inst);
        assert!(!ps.push(op(1), IntervalSubset::new(0, 3)));
        assert_eq!(ps.available_time(m(0), 0), 100);
        assert_eq!(ps.available_time(m(0), 1), 0);
        assert_eq!(ps.available_time(m(0), 2), 0);
        assert_eq!(ps.available_time(m(0), 3), 100);
        assert_eq!(ps.available_energy(1), 100.0);
        assert_eq!(ps.available_energy(2), 100.0);
    }

    #[test]
    fn test_push_reports_budget_violations() {
        let inst = instance();
        let mut ps = PartialSolution::new(&inst);
        // op 1 fully occupies interval 1 on m0, op 0 then needs 80 more there.
        assert!(!ps.push(op(1), IntervalSubset::new(0, 2)));
        assert!(ps.push(op(0), IntervalSubset::new(1, 1)));
        ps.pop(m(0));
        ps.pop(m(0));

        // 80 + 120 energy exceeds the limit of 150 in interval 0.
        assert!(!ps.push(op(0), IntervalSubset::new(0, 0)));
        assert!(ps.push(op(2), IntervalSubset::new(0, 0)));
    }

    #[test]
    fn test_pop_restores_state() {
        let inst = instance();
        let fresh = PartialSolution::new(&inst);
        let mut ps = fresh.clone();
        ps.push(op(0), IntervalSubset::new(0, 0));
        ps.push(op(1), IntervalSubset::new(0, 3));
        assert_eq!(ps.machine_stack(m(0)), &[op(0), op(1)]);
        assert_eq!(ps.depth(), 2);

        assert_eq!(ps.pop(m(0)), Some(op(1)));
        assert_eq!(ps.pop(m(0)), Some(op(0)));
        assert_eq!(ps.pop(m(0)), None);
        assert_eq!(ps.available_time, fresh.available_time);
        assert_eq!(ps.available_energy, fresh.available_energy);
        assert_eq!(ps.windows, fresh.windows);
        assert_eq!(ps.num_unplaced(), 3);
        assert_eq!(ps.machine_remaining_processing(m(0)), 330);
    }

    #[test]
    fn test_push_scoped_pops_on_drop() {
        let inst = instance();
        let mut ps = PartialSolution::new(&inst);
        {
            let scope = ps.push_scoped(op(0), IntervalSubset::new(1, 1));
            assert!(!scope.is_violated());
            assert_eq!(scope.top(m(0)), Some(op(0)));
            assert_eq!(scope.available_time(m(0), 1), 20);
        }
        assert_eq!(ps.top(m(0)), None);
        assert_eq!(ps.available_time(m(0), 1), 100);
        assert!(ps.is_unplaced(op(0)));

        let scope = ps.push_scoped(op(2), IntervalSubset::new(2, 2));
        assert!(scope.is_violated());
        drop(scope);
        assert_eq!(ps.available_time(m(1), 2), 100);
    }

    #[test]
    fn test_display() {
        let inst = instance();
        let mut ps = PartialSolution::new(&inst);
        ps.push(op(0), IntervalSubset::new(0, 0));
        assert_eq!(format!("{}", ps), "PartialSolution(M0: 0[0, 0]; M1:)");
    }

    /// Random stacks of pushes on one machine with fractional powers.
    fn push_sequence() -> impl Strategy<Value = (Vec<(i64, f64)>, Vec<(usize, usize)>)> {
        prop::collection::vec((0i64..400, 0.1f64..3.7), 1..6).prop_flat_map(|ops| {
            let n = ops.len();
            (
                Just(ops),
                prop::collection::vec((0usize..8, 0usize..4), n),
            )
        })
    }

    proptest! {
        #[test]
        fn prop_push_then_pop_is_bit_identical((ops, windows) in push_sequence()) {
            let mut b = InstanceBuilder::new(1, 1000, 100, 97.3);
            for &(p, power) in &ops {
                b.add_job([(MachineIndex::new(0), p, power)]);
            }
            let inst = b.build().unwrap();
            let fresh = PartialSolution::new(&inst);
            let mut ps = fresh.clone();

            let mut snapshots = Vec::new();
            for (i, &(first, extra)) in windows.iter().enumerate() {
                snapshots.push((ps.available_time.clone(), ps.available_energy.clone()));
                let last = (first + extra).min(9);
                ps.push(OperationIndex::new(i), IntervalSubset::new(first, last));
            }
            for i in (0..windows.len()).rev() {
                prop_assert_eq!(ps.pop(MachineIndex::new(0)), Some(OperationIndex::new(i)));
                let (time, energy) = &snapshots[i];
                prop_assert_eq!(&ps.available_time, time);
                let bits: Vec<u64> = ps.available_energy.iter().map(|e| e.to_bits()).collect();
                let expected: Vec<u64> = energy.iter().map(|e| e.to_bits()).collect();
                prop_assert_eq!(bits, expected);
            }
            prop_assert_eq!(ps.machine_remaining_processing(MachineIndex::new(0)),
                fresh.machine_remaining_processing(MachineIndex::new(0)));
            prop_assert!(ps.machine_stack(MachineIndex::new(0)).is_empty());
            prop_assert_eq!(ps.num_unplaced(), ops.len());
        }
    }
}
