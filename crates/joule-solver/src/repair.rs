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

//! # Greedy Repair
//!
//! List scheduling that turns a (possibly energy-infeasible) schedule into a
//! feasible one, or builds one from scratch.
//!
//! Operations are placed one at a time. The candidates at each step are the
//! operations whose job predecessor is already placed; under
//! `EarliestStartTimeOverFixedOrder` they must also be next in their machine's
//! order taken from the old schedule. A `PriorityRule` picks one candidate,
//! which starts at the earliest integral time that
//!
//! - is not before its machine becomes free or its job predecessor completes,
//! - and keeps every metering interval it overlaps within the energy limit.
//!
//! When an interval `i` would overflow, the start moves right so that the
//! overlap with `i` is the largest one the remaining energy allows:
//! `end(i) - floor(remaining(i) / power)`. Repair fails if an operation cannot
//! complete within the horizon.

use joule_core::math::overlap::overlap_length;
use joule_core::num::tolerance::Tolerance;
use joule_model::index::OperationIndex;
use joule_model::instance::{Instance, Operation};
use joule_model::start_times::StartTimes;

/// How the next operation is chosen among the candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PriorityRule {
    /// Smallest start time in the old schedule.
    StartTime,
    /// Largest processing time of the job's unplaced suffix.
    MostRemainingWork,
    /// Smallest earliest feasible start; ties by old start time.
    EarliestStartTime,
    /// As `EarliestStartTime`, keeping the old per-machine order.
    EarliestStartTimeOverFixedOrder,
}

impl PriorityRule {
    pub fn name(&self) -> &'static str {
        match self {
            PriorityRule::StartTime => "start-time",
            PriorityRule::MostRemainingWork => "most-remaining-work",
            PriorityRule::EarliestStartTime => "earliest-start-time",
            PriorityRule::EarliestStartTimeOverFixedOrder => "earliest-start-time-over-fixed-order",
        }
    }

    /// `true` if the rule reads the old schedule.
    #[inline]
    pub fn requires_start_times(&self) -> bool {
        !matches!(self, PriorityRule::MostRemainingWork)
    }
}

impl std::fmt::Display for PriorityRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for PriorityRule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start-time" => Ok(PriorityRule::StartTime),
            "most-remaining-work" => Ok(PriorityRule::MostRemainingWork),
            "earliest-start-time" => Ok(PriorityRule::EarliestStartTime),
            "earliest-start-time-over-fixed-order" => Ok(PriorityRule::EarliestStartTimeOverFixedOrder),
            other => Err(format!("unknown priority rule `{}`", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RepairError {
    #[error("{operation} cannot complete within the horizon")]
    CannotRepair { operation: OperationIndex },
    #[error("no operation can be placed after {placed} placements")]
    Stalled { placed: usize },
}

#[derive(Debug)]
pub struct GreedyRepair<'a> {
    instance: &'a Instance,
    old_start_times: Option<&'a StartTimes>,
    rule: PriorityRule,
    tolerance: Tolerance,
    new_start_times: StartTimes,
    energy_consumption: Vec<f64>,
    machine_available: Vec<i64>,
    remaining_work: Vec<i64>,
    machine_orders: Vec<Vec<OperationIndex>>,
    machine_positions: Vec<usize>,
}

impl<'a> GreedyRepair<'a> {
    /// # Panics
    ///
    /// In debug builds, panics if `rule` reads the old schedule and none is given.
    pub fn new(instance: &'a Instance, old_start_times: Option<&'a StartTimes>, rule: PriorityRule) -> Self {
        debug_assert!(
            !rule.requires_start_times() || old_start_times.is_some(),
            "called `GreedyRepair::new` with rule {} but without start times",
            rule
        );

        let mut remaining_work = vec![0i64; instance.total_num_operations()];
        for job in instance.jobs() {
            let mut suffix = 0;
            for &id in job.operations().iter().rev() {
                suffix += instance.operation(id).processing_time();
                remaining_work[id.get()] = suffix;
            }
        }

        let machine_orders = match (rule, old_start_times) {
            (PriorityRule::EarliestStartTimeOverFixedOrder, Some(old)) => {
                old.ordered_operations_on_machines(instance)
            }
            _ => Vec::new(),
        };

        Self {
            instance,
            old_start_times,
            rule,
            tolerance: Tolerance::default(),
            new_start_times: StartTimes::for_instance(instance),
            energy_consumption: vec![0.0; instance.num_metering_intervals()],
            machine_available: vec![0; instance.num_machines()],
            remaining_work,
            machine_positions: vec![0; machine_orders.len()],
            machine_orders,
        }
    }

    #[inline]
    pub fn with_tolerance(mut self, tolerance: Tolerance) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Places every operation and returns the new schedule.
    pub fn repair(mut self) -> Result<StartTimes, RepairError> {
        let total = self.instance.total_num_operations();
        for _ in 0..total {
            let Some((operation, start)) = self.select()? else {
                // Only a machine order contradicting job precedence gets here.
                return Err(RepairError::Stalled {
                    placed: self.new_start_times.len(),
                });
            };
            self.place(operation, start);
        }
        tracing::debug!(
            rule = %self.rule,
            placed = self.new_start_times.len(),
            makespan = self.new_start_times.makespan(),
            "greedy repair finished"
        );
        Ok(self.new_start_times)
    }

    fn is_candidate(&self, op: &Operation) -> bool {
        if self.new_start_times.contains(op.id()) {
            return false;
        }
        if let Some(previous) = self.instance.previous_operation(op)
            && !self.new_start_times.contains(previous.id())
        {
            return false;
        }
        if self.rule == PriorityRule::EarliestStartTimeOverFixedOrder {
            let m = op.machine_index().get();
            return self.machine_orders[m].get(self.machine_positions[m]) == Some(&op.id());
        }
        true
    }

    fn old_start(&self, id: OperationIndex) -> f64 {
        self.old_start_times
            .and_then(|old| old.get(id))
            .unwrap_or(f64::INFINITY)
    }

    /// Picks the next operation and its start time.
    fn select(&self) -> Result<Option<(OperationIndex, i64)>, RepairError> {
        let candidates = self
            .instance
            .operations()
            .iter()
            .filter(|op| self.is_candidate(op));

        let chosen = match self.rule {
            PriorityRule::StartTime => candidates
                .min_by(|a, b| self.old_start(a.id()).total_cmp(&self.old_start(b.id())))
                .map(|op| op.id()),
            PriorityRule::MostRemainingWork => candidates
                .min_by_key(|op| std::cmp::Reverse(self.remaining_work[op.id().get()]))
                .map(|op| op.id()),
            PriorityRule::EarliestStartTime | PriorityRule::EarliestStartTimeOverFixedOrder => {
                let mut best: Option<(i64, f64, OperationIndex)> = None;
                for op in candidates {
                    let start = self.earliest_feasible_start(op)?;
                    let key = (start, self.old_start(op.id()), op.id());
                    let better = match best {
                        None => true,
                        Some((s, old, _)) => key.0 < s || (key.0 == s && key.1 < old),
                    };
                    if better {
                        best = Some(key);
                    }
                }
                return Ok(best.map(|(start, _, id)| (id, start)));
            }
        };

        match chosen {
            Some(id) => {
                let start = self.earliest_feasible_start(self.instance.operation(id))?;
                Ok(Some((id, start)))
            }
            None => Ok(None),
        }
    }

    fn earliest_feasible_start(&self, op: &Operation) -> Result<i64, RepairError> {
        let instance = self.instance;
        let p = op.processing_time();
        let power = op.power_consumption();

        let mut start = self.machine_available[op.machine_index().get()];
        if let Some(previous) = instance.previous_operation(op)
            && let Some(previous_start) = self.new_start_times.get(previous.id())
        {
            start = start.max(previous_start as i64 + previous.processing_time());
        }

        if power > 0.0 && start < instance.horizon() {
            let mut interval = instance.metering_interval_at(start);
            while interval < instance.num_metering_intervals() {
                let overlap = overlap_length(
                    start,
                    start + p,
                    instance.metering_interval_start(interval),
                    instance.metering_interval_end(interval),
                );
                if overlap == 0 {
                    break;
                }
                let consumed = self.energy_consumption[interval];
                if self
                    .tolerance
                    .greater(consumed + overlap as f64 * power, instance.energy_limit())
                {
                    let max_overlap = ((instance.energy_limit() - consumed) / power).floor().max(0.0) as i64;
                    start = instance.metering_interval_end(interval) - max_overlap;
                }
                interval += 1;
            }
        }

        if start + p > instance.horizon() {
            return Err(RepairError::CannotRepair { operation: op.id() });
        }
        Ok(start)
    }

    fn place(&mut self, id: OperationIndex, start: i64) {
        let op = self.instance.operation(id);
        let machine = op.machine_index();
        self.new_start_times.set(op, start as f64);
        self.machine_available[machine.get()] = start + op.processing_time();
        for (interval, overlap) in op.nonzero_overlaps(start as f64, self.instance.metering_interval_length()) {
            self.energy_consumption[interval] += overlap * op.power_consumption();
        }
        if let Some(position) = self.machine_positions.get_mut(machine.get()) {
            *position += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use joule_model::energy::{consumption_in_metering_intervals, energy_limits_satisfied};
    use joule_model::feasibility::FeasibilityChecker;
    use joule_model::index::MachineIndex;
    use joule_model::instance::InstanceBuilder;

    fn m(i: usize) -> MachineIndex {
        MachineIndex::new(i)
    }

    fn op(i: usize) -> OperationIndex {
        OperationIndex::new(i)
    }

    fn assert_feasible(instance: &Instance, st: &StartTimes) {
        let status = FeasibilityChecker::default().check(instance, st, true);
        assert!(status.is_feasible(), "{}", status);
        let consumption = consumption_in_metering_intervals(instance, st);
        assert!(energy_limits_satisfied(instance, &consumption, &Tolerance::default()));
    }

    /// Two machines, L = 100, limit 100: two operations of 60 units at power 1.
    fn parallel() -> Instance {
        let mut b = InstanceBuilder::new(2, 300, 100, 100.0);
        b.add_job([(m(0), 60, 1.0)]);
        b.add_job([(m(1), 60, 1.0)]);
        b.build().unwrap()
    }

    #[test]
    fn test_energy_limit_shifts_second_operation() {
        let inst = parallel();
        let st = GreedyRepair::new(&inst, None, PriorityRule::MostRemainingWork)
            .repair()
            .unwrap();
        assert_eq!(st.get(op(0)), Some(0.0));
        // 40 energy left in interval 0: overlap 40 there, start at 60.
        assert_eq!(st.get(op(1)), Some(60.0));
        assert_feasible(&inst, &st);
    }

    #[test]
    fn test_start_time_rule_repairs_infeasible_schedule() {
        let inst = parallel();
        let mut old = StartTimes::for_instance(&inst);
        old.set(inst.operation(op(0)), 10.0);
        old.set(inst.operation(op(1)), 0.0);
        let st = GreedyRepair::new(&inst, Some(&old), PriorityRule::StartTime)
            .repair()
            .unwrap();
        assert_eq!(st.get(op(1)), Some(0.0));
        assert_eq!(st.get(op(0)), Some(60.0));
        assert_feasible(&inst, &st);
    }

    #[test]
    fn test_precedence_and_machine_availability() {
        let mut b = InstanceBuilder::new(2, 200, 50, 1000.0);
        b.add_job([(m(0), 30, 1.0), (m(1), 20, 1.0)]);
        b.add_job([(m(1), 40, 1.0)]);
        let inst = b.build().unwrap();
        let st = GreedyRepair::new(&inst, None, PriorityRule::MostRemainingWork)
            .repair()
            .unwrap();
        // Job 0 (50 remaining) goes first, then job 1 (40) on m1 at 0,
        // and job 0's second operation waits for m1.
        assert_eq!(st.get(op(0)), Some(0.0));
        assert_eq!(st.get(op(2)), Some(0.0));
        assert_eq!(st.get(op(1)), Some(40.0));
        assert_feasible(&inst, &st);
    }

    #[test]
    fn test_earliest_start_time_rules() {
        let mut b = InstanceBuilder::new(1, 200, 100, 1000.0);
        b.add_job([(m(0), 30, 1.0)]);
        b.add_job([(m(0), 20, 1.0)]);
        let inst = b.build().unwrap();
        let mut old = StartTimes::for_instance(&inst);
        old.set(inst.operation(op(0)), 20.0);
        old.set(inst.operation(op(1)), 0.0);

        let st = GreedyRepair::new(&inst, Some(&old), PriorityRule::EarliestStartTime)
            .repair()
            .unwrap();
        // Both could start at 0; the old start time breaks the tie.
        assert_eq!(st.get(op(1)), Some(0.0));
        assert_eq!(st.get(op(0)), Some(20.0));

        let st = GreedyRepair::new(&inst, Some(&old), PriorityRule::EarliestStartTimeOverFixedOrder)
            .repair()
            .unwrap();
        assert_eq!(st.get(op(1)), Some(0.0));
        assert_eq!(st.get(op(0)), Some(20.0));
        assert_feasible(&inst, &st);
    }

    #[test]
    fn test_cannot_repair_past_horizon() {
        let mut b = InstanceBuilder::new(1, 100, 100, 1000.0);
        b.add_job([(m(0), 60, 1.0)]);
        b.add_job([(m(0), 60, 1.0)]);
        let inst = b.build().unwrap();
        let result = GreedyRepair::new(&inst, None, PriorityRule::MostRemainingWork).repair();
        assert_eq!(result, Err(RepairError::CannotRepair { operation: op(1) }));
    }

    #[test]
    fn test_order_against_precedence_stalls() {
        let mut b = InstanceBuilder::new(1, 300, 100, 100.0);
        b.add_job([(m(0), 10, 1.0), (m(0), 10, 1.0)]);
        let inst = b.build().unwrap();
        // The successor comes first on the machine.
        let mut old = StartTimes::for_instance(&inst);
        old.set(inst.operation(op(0)), 10.0);
        old.set(inst.operation(op(1)), 0.0);
        let result = GreedyRepair::new(&inst, Some(&old), PriorityRule::EarliestStartTimeOverFixedOrder).repair();
        assert_eq!(result, Err(RepairError::Stalled { placed: 0 }));
    }

    #[test]
    fn test_rule_names_round_trip() {
        for rule in [
            PriorityRule::StartTime,
            PriorityRule::MostRemainingWork,
            PriorityRule::EarliestStartTime,
            PriorityRule::EarliestStartTimeOverFixedOrder,
        ] {
            assert_eq!(rule.name().parse::<PriorityRule>(), Ok(rule));
        }
        assert!(!PriorityRule::MostRemainingWork.requires_start_times());
        assert!(PriorityRule::StartTime.requires_start_times());
    }
}
