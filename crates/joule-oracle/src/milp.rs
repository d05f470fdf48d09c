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

//! # Overlap MILP oracle
//!
//! `MilpOverlapOracle` models a window `[0, last]` of metering intervals with
//! one variable per (operation, interval) overlap that is not already decided
//! by the operation's fixed window, plus a `tail` variable: the largest
//! machine occupation of the last interval. The model is
//!
//! ```text
//! minimise tail
//!   tail >= sum_{o on m} x[o, last] + (L - avail_time[m, last])   for every machine m
//!   sum_o power[o] * x[o, i]        <= avail_energy[i]            for every interval i
//!   sum_{o on m} x[o, i]            <= avail_time[m, i]           for every machine m, interval i
//!   sum_i x[o, i]                   == remaining[o]               for every operation o
//!   0 <= x <= L, integral when start times must be integral
//! ```
//!
//! and the makespan bound is `start(last) + tail`. An infeasible window is
//! widened by one interval and solved again.
//!
//! Once every operation is fixed the overlaps determine the schedule: a
//! spanning operation starts `x[o, first]` before the end of its first
//! interval, and single-interval operations are packed behind whatever
//! spanning operation ends in the same interval.

use crate::oracle::RelaxationOracle;
use crate::outcome::OracleOutcome;
use crate::request::{OracleRequest, OracleScope, TimeGranularity};
use crate::window::ModelWindow;
use good_lp::solvers::highs::highs;
use good_lp::solvers::SolutionStatus;
use good_lp::*;
use joule_core::num::tolerance::Tolerance;
use joule_model::index::MachineIndex;
use joule_model::start_times::StartTimes;
use joule_search::budget::TimeBudget;
use smallvec::SmallVec;

/// Solved overlaps of one operation as `(interval, overlap)`.
type Overlaps = SmallVec<[(usize, f64); 4]>;

enum WindowAnswer {
    Optimal { tail: f64, overlaps: Vec<Overlaps> },
    Infeasible,
    TimedOut,
}

/// Relaxation oracle backed by `good_lp` and HiGHS.
#[derive(Debug, Clone, Default)]
pub struct MilpOverlapOracle {
    threads: usize,
    tolerance: Tolerance,
}

impl MilpOverlapOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of HiGHS threads; `0` keeps the library default.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn with_tolerance(mut self, tolerance: Tolerance) -> Self {
        self.tolerance = tolerance;
        self
    }

    #[inline]
    pub fn threads(&self) -> usize {
        self.threads
    }

    fn add_overlap_variable(vars: &mut ProblemVariables, integer: bool, upper: f64) -> Variable {
        if integer {
            vars.add(variable().integer().min(0.0).max(upper))
        } else {
            vars.add(variable().min(0.0).max(upper))
        }
    }

    fn solve_window(
        &self,
        request: &OracleRequest<'_>,
        window: &ModelWindow,
        budget: &TimeBudget,
    ) -> WindowAnswer {
        let instance = request.instance;
        let integer = request.granularity == TimeGranularity::Integer;
        let length = instance.metering_interval_length() as f64;
        let last = window.last();
        let width = last + 1;
        let num_machines = instance.num_machines();

        let mut vars = variables!();
        let tail = Self::add_overlap_variable(&mut vars, integer, length);

        let mut overlap_vars: Vec<SmallVec<[(usize, Variable); 4]>> =
            vec![SmallVec::new(); instance.total_num_operations()];
        let mut constraints = Vec::new();
        let mut energy = vec![Expression::from(0.0); width];
        let mut energy_used = vec![false; width];
        let mut time = vec![Expression::from(0.0); num_machines * width];
        let mut time_used = vec![false; num_machines * width];

        for &id in window.considered() {
            let op = instance.operation(id);
            let m = op.machine_index().get();
            let intervals = window.variable_intervals(request, id);
            if intervals.is_empty() {
                continue;
            }

            let mut sum = Expression::from(0.0);
            for i in intervals {
                let x = Self::add_overlap_variable(&mut vars, integer, length);
                sum += x;
                energy[i] += op.power_consumption() * x;
                energy_used[i] = true;
                time[m * width + i] += x;
                time_used[m * width + i] = true;
                overlap_vars[id.get()].push((i, x));
            }
            constraints.push(sum.eq(window.remaining_processing(id) as f64));
        }

        for (i, expr) in energy.into_iter().enumerate() {
            if energy_used[i] {
                constraints.push(expr.leq(window.available_energy(i)));
            }
        }

        let mut last_usage = Vec::with_capacity(num_machines);
        for (k, expr) in time.into_iter().enumerate() {
            let machine = MachineIndex::new(k / width);
            let i = k % width;
            if i == last {
                last_usage.push((machine, expr.clone()));
            }
            if time_used[k] {
                constraints.push(expr.leq(window.available_time(machine, i) as f64));
            }
        }

        for (machine, usage) in last_usage {
            let charged = length - window.available_time(machine, last) as f64;
            constraints.push((usage + charged).leq(tail));
        }

        let mut problem = vars.minimise(tail).using(highs);
        if let Some(left) = budget.remaining() {
            problem = problem.with_time_limit(left.as_secs_f64());
        }
        if self.threads > 0 {
            problem = problem.set_threads(self.threads as u32);
        }
        for constraint in constraints {
            problem.add_constraint(constraint);
        }

        let round = |v: f64| {
            let v = v.clamp(0.0, length);
            if integer { v.round() } else { v }
        };

        match problem.solve() {
            Ok(_) if budget.is_exhausted() => WindowAnswer::TimedOut,
            Ok(solution) if !proven_optimal(solution.status()) => {
                tracing::warn!(status = ?solution.status(), last, "relaxation stopped early; treating as timeout");
                WindowAnswer::TimedOut
            }
            Ok(solution) => WindowAnswer::Optimal {
                tail: round(solution.value(tail)),
                overlaps: overlap_vars
                    .iter()
                    .map(|vs| vs.iter().map(|&(i, x)| (i, round(solution.value(x)))).collect())
                    .collect(),
            },
            Err(ResolutionError::Infeasible) => WindowAnswer::Infeasible,
            Err(err) => {
                if !budget.is_exhausted() {
                    tracing::warn!(error = %err, last, "relaxation solve failed; treating as timeout");
                }
                WindowAnswer::TimedOut
            }
        }
    }

    /// Converts solved overlaps of a fully fixed placement into start times.
    fn start_times(request: &OracleRequest<'_>, overlaps: &[Overlaps]) -> StartTimes {
        let instance = request.instance;
        let n = instance.num_metering_intervals();
        let overlap_at = |id: usize, interval: usize| {
            overlaps[id]
                .iter()
                .find(|&&(i, _)| i == interval)
                .map_or(0.0, |&(_, v)| v)
        };

        let mut fills = vec![0.0; instance.num_machines() * n];
        let mut start_times = StartTimes::for_instance(instance);
        let mut singles = Vec::new();

        for op in instance.operations() {
            let Some(window) = request.fixed_windows[op.id().get()] else {
                continue;
            };
            let m = op.machine_index().get();
            if window.count() == 1 {
                singles.push((op, window.first()));
                continue;
            }
            let head = overlap_at(op.id().get(), window.first());
            let start = instance.metering_interval_end(window.first()) as f64 - head;
            fills[m * n + window.last()] += overlap_at(op.id().get(), window.last());
            start_times.set(op, start);
        }

        // Operations sharing an interval run in placement order.
        let mut position = vec![usize::MAX; instance.total_num_operations()];
        for stack in request.placement_order {
            for (k, id) in stack.iter().enumerate() {
                position[id.get()] = k;
            }
        }
        singles.sort_by_key(|(op, _)| position[op.id().get()]);

        for (op, interval) in singles {
            let fill = &mut fills[op.machine_index().get() * n + interval];
            start_times.set(op, instance.metering_interval_start(interval) as f64 + *fill);
            *fill += op.processing_time() as f64;
        }
        start_times
    }
}

/// Only a proven optimum gives a valid bound; limit-stopped solves do not.
#[inline]
fn proven_optimal(status: SolutionStatus) -> bool {
    matches!(status, SolutionStatus::Optimal)
}

impl RelaxationOracle for MilpOverlapOracle {
    fn name(&self) -> &str {
        "MilpOverlapOracle"
    }

    fn solve(&mut self, request: &OracleRequest<'_>) -> OracleOutcome {
        let budget = TimeBudget::start(request.time_budget);
        if budget.is_exhausted() {
            return OracleOutcome::timed_out();
        }

        let instance = request.instance;
        if instance.num_metering_intervals() == 0 {
            let anything_to_place = match request.scope {
                OracleScope::OnlyFixed => request.fixed_windows.iter().any(Option::is_some),
                OracleScope::AllOperations => instance.total_num_operations() > 0,
            };
            return if anything_to_place {
                OracleOutcome::infeasible()
            } else {
                let start_times = request.all_fixed().then(|| StartTimes::for_instance(instance));
                OracleOutcome::optimal(0.0, start_times)
            };
        }

        let Some(mut window) = ModelWindow::plan(request, &self.tolerance) else {
            tracing::trace!("fixed placement exceeds a budget");
            return OracleOutcome::infeasible();
        };

        loop {
            let window_start = instance.metering_interval_start(window.last()) as f64;
            if let Some(upper_bound) = request.upper_bound
                && self.tolerance.less_or_equal(upper_bound, window_start)
            {
                return OracleOutcome::bound_reached();
            }
            if budget.is_exhausted() {
                return OracleOutcome::timed_out();
            }

            match self.solve_window(request, &window, &budget) {
                WindowAnswer::Optimal { tail, overlaps } => {
                    let objective = window_start + tail;
                    let bound_reached = request
                        .upper_bound
                        .is_some_and(|ub| self.tolerance.less_or_equal(ub, objective));
                    let start_times = request
                        .all_fixed()
                        .then(|| Self::start_times(request, &overlaps));
                    return OracleOutcome::optimal(objective, start_times)
                        .with_bound_reached(bound_reached);
                }
                WindowAnswer::TimedOut => return OracleOutcome::timed_out(),
                WindowAnswer::Infeasible => {
                    if request.scope == OracleScope::OnlyFixed
                        || !window.has_free_operations(request)
                        || !window.widen(instance)
                    {
                        return OracleOutcome::infeasible();
                    }
                    tracing::debug!(last = window.last(), "widening relaxation window");
                }
            }
        }
    }
}
