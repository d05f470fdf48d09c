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

//! Schedule verification.
//!
//! `FeasibilityChecker::check` walks the constraints in a fixed order and
//! reports the first violation:
//!
//! 1. every operation has a start time,
//! 2. job precedence,
//! 3. machine non-overlap,
//! 4. horizon containment (energy limits enabled only),
//! 5. the per-interval energy limit (energy limits enabled only).

use crate::energy::{consumption_in_metering_intervals, first_violated_interval};
use crate::index::{MachineIndex, OperationIndex};
use crate::instance::Instance;
use crate::start_times::StartTimes;
use joule_core::num::tolerance::Tolerance;

/// Result of verifying a schedule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FeasibilityStatus {
    Feasible,
    OperationHasNoStartTime {
        operation: OperationIndex,
    },
    JobPrecedenceViolated {
        operation: OperationIndex,
        successor: OperationIndex,
    },
    OverlappingOperations {
        machine: MachineIndex,
        first: OperationIndex,
        second: OperationIndex,
    },
    OperationOutsideHorizon {
        operation: OperationIndex,
    },
    EnergyLimitViolated {
        interval: usize,
        consumption: f64,
    },
}

impl FeasibilityStatus {
    #[inline]
    pub fn is_feasible(&self) -> bool {
        matches!(self, FeasibilityStatus::Feasible)
    }
}

impl std::fmt::Display for FeasibilityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeasibilityStatus::Feasible => write!(f, "Feasible"),
            FeasibilityStatus::OperationHasNoStartTime { operation } => {
                write!(f, "{} has no start time", operation)
            }
            FeasibilityStatus::JobPrecedenceViolated {
                operation,
                successor,
            } => write!(f, "{} starts before {} completes", successor, operation),
            FeasibilityStatus::OverlappingOperations {
                machine,
                first,
                second,
            } => write!(f, "{} and {} overlap on {}", first, second, machine),
            FeasibilityStatus::OperationOutsideHorizon { operation } => {
                write!(f, "{} is not within the horizon", operation)
            }
            FeasibilityStatus::EnergyLimitViolated {
                interval,
                consumption,
            } => write!(
                f,
                "metering interval {} consumes {} above the energy limit",
                interval, consumption
            ),
        }
    }
}

/// Verifies complete schedules against an instance.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeasibilityChecker {
    tolerance: Tolerance,
}

impl FeasibilityChecker {
    #[inline]
    pub fn new(tolerance: Tolerance) -> Self {
        Self { tolerance }
    }

    pub fn check(
        &self,
        instance: &Instance,
        start_times: &StartTimes,
        with_energy_limits: bool,
    ) -> FeasibilityStatus {
        if let Some(op) = instance
            .operations()
            .iter()
            .find(|op| !start_times.contains(op.id()))
        {
            return FeasibilityStatus::OperationHasNoStartTime { operation: op.id() };
        }

        let start = |id: OperationIndex| start_times.get(id).unwrap_or(0.0);
        let tol = &self.tolerance;

        for op in instance.operations() {
            if let Some(next) = instance.next_operation(op) {
                let completion = start(op.id()) + op.processing_time() as f64;
                if tol.less(start(next.id()), completion) {
                    return FeasibilityStatus::JobPrecedenceViolated {
                        operation: op.id(),
                        successor: next.id(),
                    };
                }
            }
        }

        for (m, ordered) in start_times
            .ordered_operations_on_machines(instance)
            .iter()
            .enumerate()
        {
            let mut previous: Option<(OperationIndex, f64)> = None;
            for &id in ordered {
                let op = instance.operation(id);
                if op.processing_time() == 0 {
                    continue;
                }
                let s = start(id);
                if let Some((prev, completion)) = previous
                    && tol.less(s, completion)
                {
                    return FeasibilityStatus::OverlappingOperations {
                        machine: MachineIndex::new(m),
                        first: prev,
                        second: id,
                    };
                }
                previous = Some((id, s + op.processing_time() as f64));
            }
        }

        if !with_energy_limits {
            return FeasibilityStatus::Feasible;
        }

        let horizon = instance.horizon() as f64;
        for op in instance.operations() {
            let s = start(op.id());
            if tol.less(s, 0.0) || tol.greater(s + op.processing_time() as f64, horizon) {
                return FeasibilityStatus::OperationOutsideHorizon { operation: op.id() };
            }
        }

        let consumption = consumption_in_metering_intervals(instance, start_times);
        match first_violated_interval(instance, &consumption, tol) {
            Some(interval) => FeasibilityStatus::EnergyLimitViolated {
                interval,
                consumption: consumption[interval],
            },
            None => FeasibilityStatus::Feasible,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::InstanceBuilder;

    fn m(i: usize) -> MachineIndex {
        MachineIndex::new(i)
    }

    fn op(i: usize) -> OperationIndex {
        OperationIndex::new(i)
    }

    /// Job 0: (m0, 10) -> (m1, 10); job 1: (m0, 20). Metering intervals of 50.
    fn instance(energy_limit: f64) -> Instance {
        let mut b = InstanceBuilder::new(2, 100, 50, energy_limit);
        b.add_job([(m(0), 10, 1.0), (m(1), 10, 0.5)]);
        b.add_job([(m(0), 20, 0.5)]);
        b.build().unwrap()
    }

    fn schedule(inst: &Instance, starts: [f64; 3]) -> StartTimes {
        let mut st = StartTimes::for_instance(inst);
        for (i, s) in starts.into_iter().enumerate() {
            st.set(inst.operation(op(i)), s);
        }
        st
    }

    #[test]
    fn test_feasible_schedule() {
        let inst = instance(30.0);
        let st = schedule(&inst, [0.0, 10.0, 10.0]);
        let checker = FeasibilityChecker::default();
        assert_eq!(checker.check(&inst, &st, true), FeasibilityStatus::Feasible);
    }

    #[test]
    fn test_missing_start_time_is_reported_first() {
        let inst = instance(30.0);
        let mut st = schedule(&inst, [0.0, 5.0, 0.0]);
        st.remove(op(2));
        assert_eq!(
            FeasibilityChecker::default().check(&inst, &st, true),
            FeasibilityStatus::OperationHasNoStartTime { operation: op(2) }
        );
    }

    #[test]
    fn test_precedence_before_overlap() {
        let inst = instance(30.0);
        let st = schedule(&inst, [0.0, 5.0, 0.0]);
        assert_eq!(
            FeasibilityChecker::default().check(&inst, &st, true),
            FeasibilityStatus::JobPrecedenceViolated {
                operation: op(0),
                successor: op(1)
            }
        );
    }

    #[test]
    fn test_overlap_on_machine() {
        let inst = instance(30.0);
        let st = schedule(&inst, [0.0, 10.0, 5.0]);
        assert_eq!(
            FeasibilityChecker::default().check(&inst, &st, false),
            FeasibilityStatus::OverlappingOperations {
                machine: m(0),
                first: op(0),
                second: op(2)
            }
        );
    }

    #[test]
    fn test_horizon_only_checked_with_energy_limits() {
        let inst = instance(30.0);
        let outside = schedule(&inst, [0.0, 95.0, 10.0]);
        assert!(FeasibilityChecker::default().check(&inst, &outside, false).is_feasible());
        assert_eq!(
            FeasibilityChecker::default().check(&inst, &outside, true),
            FeasibilityStatus::OperationOutsideHorizon { operation: op(1) }
        );
    }

    #[test]
    fn test_energy_limit_violation() {
        // 10 * 1.0 + 10 * 0.5 + 20 * 0.5 = 25 in interval 0.
        let inst = instance(15.0);
        let st = schedule(&inst, [0.0, 10.0, 10.0]);
        assert!(FeasibilityChecker::default().check(&inst, &st, false).is_feasible());
        assert_eq!(
            FeasibilityChecker::default().check(&inst, &st, true),
            FeasibilityStatus::EnergyLimitViolated {
                interval: 0,
                consumption: 25.0
            }
        );
    }
}
