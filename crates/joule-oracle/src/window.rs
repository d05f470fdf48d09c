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

//! The growable window of metering intervals modeled by the oracle.
//!
//! The model always covers the intervals `[0, last]`. `last` starts at the
//! smallest index any completion could end in:
//!
//! - on every machine, after its last fixed interval plus the machine's
//!   unfixed work laid back to back, and
//! - not before the interval holding the prior lower bound, if one is given.
//!
//! When the model turns out infeasible the window grows by one interval at a
//! time until it reaches the horizon.
//!
//! Fixed operations whose window leaves no freedom are charged up front:
//! a single-interval operation consumes its full processing time and energy,
//! a spanning operation fully occupies its inner intervals. Only the remaining
//! overlaps become variables.

use crate::request::{OracleRequest, OracleScope};
use joule_core::num::tolerance::Tolerance;
use joule_model::index::{MachineIndex, OperationIndex};
use joule_model::instance::Instance;
use smallvec::SmallVec;

/// Intervals an operation receives overlap variables for.
pub type VariableIntervals = SmallVec<[usize; 4]>;

#[derive(Debug, Clone)]
pub struct ModelWindow {
    last: usize,
    num_intervals: usize,
    first_allocable: Vec<usize>,
    considered: Vec<OperationIndex>,
    remaining_processing: Vec<i64>,
    available_time: Vec<i64>,
    available_energy: Vec<f64>,
}

impl ModelWindow {
    /// Plans the initial window and charges the pre-determined consumption of
    /// fixed operations.
    ///
    /// Returns `None` if those charges alone already exceed a machine-time or
    /// energy budget, i.e. the fixed placement is infeasible.
    pub fn plan(request: &OracleRequest<'_>, tolerance: &Tolerance) -> Option<Self> {
        let instance = request.instance;
        let n = instance.num_metering_intervals();
        let length = instance.metering_interval_length();
        let num_machines = instance.num_machines();

        let considered: Vec<OperationIndex> = instance
            .operations()
            .iter()
            .map(|op| op.id())
            .filter(|id| {
                request.scope == OracleScope::AllOperations
                    || request.fixed_windows[id.get()].is_some()
            })
            .collect();

        let mut first_allocable = vec![0usize; num_machines];
        let mut unfixed_work = vec![0i64; num_machines];
        let mut remaining_processing = vec![0i64; instance.total_num_operations()];
        let mut available_time = vec![length; num_machines * n];
        let mut available_energy = vec![instance.energy_limit(); n];

        for &id in &considered {
            let op = instance.operation(id);
            let m = op.machine_index().get();
            let p = op.processing_time();
            let power = op.power_consumption();

            let Some(window) = request.fixed_windows[id.get()] else {
                unfixed_work[m] += p;
                remaining_processing[id.get()] = p;
                continue;
            };
            debug_assert!(
                window.last() < n,
                "called `ModelWindow::plan` with window {} beyond the last metering interval {}",
                window,
                n.saturating_sub(1)
            );

            first_allocable[m] = first_allocable[m].max(window.last());
            match window.count() {
                1 => {
                    available_time[m * n + window.first()] -= p;
                    available_energy[window.first()] -= p as f64 * power;
                }
                2 => remaining_processing[id.get()] = p,
                count => {
                    for i in window.inner() {
                        available_time[m * n + i] -= length;
                        available_energy[i] -= length as f64 * power;
                    }
                    let remaining = p - (count as i64 - 2) * length;
                    if remaining < 0 {
                        return None;
                    }
                    remaining_processing[id.get()] = remaining;
                }
            }
        }

        if available_time.iter().any(|&t| t < 0)
            || available_energy.iter().any(|&e| tolerance.less(e, 0.0))
        {
            return None;
        }
        for e in &mut available_energy {
            *e = e.max(0.0);
        }

        let mut last = (0..num_machines)
            .map(|m| {
                if unfixed_work[m] == 0 {
                    first_allocable[m]
                } else {
                    first_allocable[m] + (unfixed_work[m] / length) as usize
                }
            })
            .max()
            .unwrap_or(0);
        if let Some(lower_bound) = request.lower_bound
            && lower_bound > 0.0
        {
            let by_bound = (lower_bound / length as f64).ceil() as usize;
            last = last.max(by_bound.saturating_sub(1));
        }
        last = last.min(instance.last_metering_interval_index());

        Some(Self {
            last,
            num_intervals: n,
            first_allocable,
            considered,
            remaining_processing,
            available_time,
            available_energy,
        })
    }

    /// Index of the last modeled interval.
    #[inline]
    pub fn last(&self) -> usize {
        self.last
    }

    /// `true` once the window covers the whole horizon.
    #[inline]
    pub fn is_full_horizon(&self, instance: &Instance) -> bool {
        self.last >= instance.last_metering_interval_index()
    }

    /// Appends one interval; returns `false` at the horizon.
    pub fn widen(&mut self, instance: &Instance) -> bool {
        if self.is_full_horizon(instance) {
            return false;
        }
        self.last += 1;
        true
    }

    /// `true` if some modeled operation is not fixed and still needs time.
    pub fn has_free_operations(&self, request: &OracleRequest<'_>) -> bool {
        self.considered.iter().any(|id| {
            request.fixed_windows[id.get()].is_none() && self.remaining_processing[id.get()] > 0
        })
    }

    /// First interval unfixed operations of `machine` may use.
    #[inline]
    pub fn first_allocable(&self, machine: MachineIndex) -> usize {
        self.first_allocable[machine.get()]
    }

    /// Operations entering the model, in identity order.
    #[inline]
    pub fn considered(&self) -> &[OperationIndex] {
        &self.considered
    }

    /// Processing time still to be distributed over overlap variables.
    #[inline]
    pub fn remaining_processing(&self, id: OperationIndex) -> i64 {
        self.remaining_processing[id.get()]
    }

    /// Machine time left in `interval` after fixed charges.
    #[inline]
    pub fn available_time(&self, machine: MachineIndex, interval: usize) -> i64 {
        self.available_time[machine.get() * self.num_intervals + interval]
    }

    /// Energy left in `interval` after fixed charges, never negative.
    #[inline]
    pub fn available_energy(&self, interval: usize) -> f64 {
        self.available_energy[interval]
    }

    /// Intervals in which `id` receives an overlap variable.
    pub fn variable_intervals(&self, request: &OracleRequest<'_>, id: OperationIndex) -> VariableIntervals {
        match request.fixed_windows[id.get()] {
            Some(window) if window.count() == 1 => VariableIntervals::new(),
            Some(window) => smallvec::smallvec![window.first(), window.last()],
            None if self.remaining_processing[id.get()] == 0 => VariableIntervals::new(),
            None => {
                let machine = request.instance.operation(id).machine_index();
                (self.first_allocable(machine)..=self.last).collect()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::OracleScope;
    use joule_model::instance::InstanceBuilder;
    use joule_model::subset::IntervalSubset;

    fn m(i: usize) -> MachineIndex {
        MachineIndex::new(i)
    }

    fn op(i: usize) -> OperationIndex {
        OperationIndex::new(i)
    }

    /// One machine, L = 100, horizon 500; p = [150, 50, 120], power 1.
    fn instance() -> Instance {
        let mut b = InstanceBuilder::new(1, 500, 100, 100.0);
        b.add_job([(m(0), 150, 1.0)]);
        b.add_job([(m(0), 50, 1.0)]);
        b.add_job([(m(0), 120, 1.0)]);
        b.build().unwrap()
    }

    #[test]
    fn test_spanning_fixed_operation_charges_inner_intervals() {
        let inst = instance();
        let fixed = vec![Some(IntervalSubset::new(0, 2)), None, None];
        let request = OracleRequest::new(&inst, &fixed).with_scope(OracleScope::AllOperations);
        let w = ModelWindow::plan(&request, &Tolerance::default()).unwrap();

        assert_eq!(w.available_time(m(0), 1), 0);
        assert_eq!(w.available_energy(1), 0.0);
        assert_eq!(w.available_time(m(0), 0), 100);
        assert_eq!(w.remaining_processing(op(0)), 50);
        assert_eq!(w.first_allocable(m(0)), 2);
        // 2 + (50 + 120) / 100
        assert_eq!(w.last(), 3);
        assert_eq!(w.variable_intervals(&request, op(0)).as_slice(), &[0, 2]);
        assert_eq!(w.variable_intervals(&request, op(1)).as_slice(), &[2, 3]);
    }

    #[test]
    fn test_only_fixed_scope_ignores_free_operations() {
        let inst = instance();
        let fixed = vec![None, Some(IntervalSubset::new(1, 1)), None];
        let request = OracleRequest::new(&inst, &fixed);
        let w = ModelWindow::plan(&request, &Tolerance::default()).unwrap();
        assert_eq!(w.considered(), &[op(1)]);
        assert_eq!(w.last(), 1);
        assert_eq!(w.available_time(m(0), 1), 50);
        assert_eq!(w.available_energy(1), 50.0);
        assert!(w.variable_intervals(&request, op(1)).is_empty());
    }

    #[test]
    fn test_lower_bound_extends_initial_window() {
        let inst = instance();
        let fixed = vec![None, None, None];
        let request = OracleRequest::new(&inst, &fixed).with_lower_bound(Some(301.0));
        let w = ModelWindow::plan(&request, &Tolerance::default()).unwrap();
        assert_eq!(w.last(), 3);

        let request = OracleRequest::new(&inst, &fixed).with_lower_bound(Some(1e9));
        let w = ModelWindow::plan(&request, &Tolerance::default()).unwrap();
        assert_eq!(w.last(), 4);
        assert!(w.is_full_horizon(&inst));
    }

    #[test]
    fn test_widen_stops_at_horizon() {
        let inst = instance();
        let fixed = vec![None, None, None];
        let request = OracleRequest::new(&inst, &fixed);
        let mut w = ModelWindow::plan(&request, &Tolerance::default()).unwrap();
        assert_eq!(w.last(), 0);
        let mut widened = 0;
        while w.widen(&inst) {
            widened += 1;
        }
        assert_eq!(widened, 4);
        assert_eq!(w.last(), 4);
    }

    #[test]
    fn test_overcharged_fixed_placement_is_rejected() {
        let inst = instance();
        // 150 units cannot fit into one interval of 100.
        let fixed = vec![Some(IntervalSubset::new(0, 0)), None, None];
        let request = OracleRequest::new(&inst, &fixed);
        assert!(ModelWindow::plan(&request, &Tolerance::default()).is_none());

        // Two single-interval operations exceed the energy limit of 100.
        let mut b = InstanceBuilder::new(2, 100, 100, 100.0);
        b.add_job([(m(0), 60, 1.0)]);
        b.add_job([(m(1), 60, 1.0)]);
        let inst = b.build().unwrap();
        let fixed = vec![Some(IntervalSubset::new(0, 0)), Some(IntervalSubset::new(0, 0))];
        let request = OracleRequest::new(&inst, &fixed);
        assert!(ModelWindow::plan(&request, &Tolerance::default()).is_none());
    }
}
