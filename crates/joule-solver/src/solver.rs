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

//! # Top-Level Solve
//!
//! `Solver` checks a `SolverConfig` against an instance, prepares the
//! instance (energy limits on or off, warm start, fixed machine order) and
//! dispatches to the configured `SolverKind`.
//!
//! ```rust,ignore
//! let config = SolverConfig::new().with_time_limit(Duration::from_secs(30));
//! let result = Solver::new(SolverKind::BranchAndBound)
//!     .with_config(config)
//!     .solve(&instance)?;
//! println!("{}", result);
//! ```

use crate::config::SolverConfig;
use crate::error::ConfigurationError;
use crate::kind::SolverKind;
use crate::repair::{GreedyRepair, PriorityRule};
use joule_bnb::bnb::BnbSolver;
use joule_bnb::branching::BranchingRule;
use joule_bnb::monitor::composite::CompositeTreeSearchMonitor;
use joule_bnb::monitor::interrupt::InterruptMonitor;
use joule_bnb::monitor::log::LogMonitor;
use joule_bnb::stats::BnbStatistics;
use joule_model::feasibility::{FeasibilityChecker, FeasibilityStatus};
use joule_model::instance::Instance;
use joule_model::start_times::{IndexedStartTime, StartTimes};
use joule_oracle::milp::MilpOverlapOracle;
use joule_oracle::request::TimeGranularity;
use joule_search::result::SolverStatus;
use std::sync::atomic::AtomicBool;
use std::time::{Duration, Instant};

/// What a run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverResult {
    pub status: SolverStatus,
    /// Present iff `status` has a solution.
    pub start_times: Option<StartTimes>,
    pub time_limit_reached: bool,
    pub running_time: Duration,
    /// Proven lower bound on the optimal makespan, if one is known.
    pub lower_bound: Option<f64>,
    /// Search counters; only branch-and-bound reports them.
    pub statistics: Option<BnbStatistics>,
}

impl SolverResult {
    #[inline]
    pub fn makespan(&self) -> Option<f64> {
        self.start_times.as_ref().map(StartTimes::makespan)
    }

    /// The schedule in position-based form.
    pub fn indexed_start_times(&self, instance: &Instance) -> Option<Vec<IndexedStartTime>> {
        self.start_times.as_ref().map(|st| st.to_indexed(instance))
    }
}

impl std::fmt::Display for SolverResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SolverResult(status: {}, makespan: ", self.status)?;
        match self.makespan() {
            Some(makespan) => write!(f, "{}", makespan)?,
            None => write!(f, "-")?,
        }
        write!(f, ", lower_bound: ")?;
        match self.lower_bound {
            Some(bound) => write!(f, "{}", bound)?,
            None => write!(f, "-")?,
        }
        write!(
            f,
            ", time_limit_reached: {}, running_time: {:.2?})",
            self.time_limit_reached, self.running_time
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct Solver {
    kind: SolverKind,
    config: SolverConfig,
}

impl Solver {
    #[inline]
    pub fn new(kind: SolverKind) -> Self {
        Self {
            kind,
            config: SolverConfig::default(),
        }
    }

    #[inline]
    pub fn with_config(mut self, config: SolverConfig) -> Self {
        self.config = config;
        self
    }

    #[inline]
    pub fn kind(&self) -> SolverKind {
        self.kind
    }

    #[inline]
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    pub fn solve(&self, instance: &Instance) -> Result<SolverResult, ConfigurationError> {
        let never = AtomicBool::new(false);
        self.solve_with_interrupt(instance, &never)
    }

    /// Like `solve`; the search also stops once `stop_flag` is set.
    pub fn solve_with_interrupt(
        &self,
        instance: &Instance,
        stop_flag: &AtomicBool,
    ) -> Result<SolverResult, ConfigurationError> {
        let start = Instant::now();
        self.kind.validate(&self.config, instance)?;

        let relaxed;
        let instance = if self.config.with_energy_limits {
            instance
        } else {
            relaxed = instance.without_energy_limits();
            &relaxed
        };

        let warm_start = self.warm_start(instance)?;

        tracing::info!(
            solver = %self.kind,
            config = %self.config,
            machines = instance.num_machines(),
            operations = instance.total_num_operations(),
            intervals = instance.num_metering_intervals(),
            "solve started"
        );

        let mut result = match self.kind {
            SolverKind::BranchAndBound => self.run_bnb(instance, warm_start, stop_flag)?,
            SolverKind::GreedyRepair(rule) => self.run_greedy(instance, warm_start.as_ref(), rule),
        };
        result.running_time = start.elapsed();

        if let Some(st) = &result.start_times {
            debug_assert!(
                FeasibilityChecker::default()
                    .check(instance, st, true)
                    .is_feasible(),
                "called `Solver::solve` and got an infeasible schedule from {}",
                self.kind
            );
        }

        tracing::info!(
            solver = %self.kind,
            status = %result.status,
            makespan = result.makespan(),
            lower_bound = result.lower_bound,
            time_limit_reached = result.time_limit_reached,
            elapsed = format_args!("{:.2?}", result.running_time),
            "solve finished"
        );
        Ok(result)
    }

    /// Converts and checks the initial start times.
    ///
    /// Branch-and-bound trusts its incumbent, so it needs a fully feasible
    /// schedule. Repair only needs every operation to have a start.
    fn warm_start(&self, instance: &Instance) -> Result<Option<StartTimes>, ConfigurationError> {
        let Some(indexed) = &self.config.initial_start_times else {
            return Ok(None);
        };
        let start_times = StartTimes::from_indexed(instance, indexed)?;
        let status = FeasibilityChecker::default().check(instance, &start_times, true);
        let accepted = match self.kind {
            SolverKind::BranchAndBound => status.is_feasible(),
            SolverKind::GreedyRepair(_) => {
                !matches!(status, FeasibilityStatus::OperationHasNoStartTime { .. })
            }
        };
        if !accepted {
            return Err(ConfigurationError::InfeasibleInitialStartTimes(status));
        }
        Ok(Some(start_times))
    }

    fn branching_rule(&self, instance: &Instance) -> Result<BranchingRule, ConfigurationError> {
        let Some(indexed) = &self.config.fixed_order else {
            return Ok(BranchingRule::LowestMachineFirst);
        };
        let start_times = StartTimes::from_indexed(instance, indexed)?;
        if !start_times.is_complete() {
            return Err(ConfigurationError::InvalidFixedOrder);
        }
        let order = start_times.ordered_operations_on_machines(instance);
        if !BranchingRule::is_valid_order(instance, &order) {
            return Err(ConfigurationError::InvalidFixedOrder);
        }
        Ok(BranchingRule::FixedMachineOrder(order))
    }

    fn run_bnb(
        &self,
        instance: &Instance,
        warm_start: Option<StartTimes>,
        stop_flag: &AtomicBool,
    ) -> Result<SolverResult, ConfigurationError> {
        let granularity = if self.config.continuous_start_times {
            TimeGranularity::Continuous
        } else {
            TimeGranularity::Integer
        };
        let solver = BnbSolver::new()
            .with_time_limit(self.config.time_limit)
            .with_granularity(granularity)
            .with_branching(self.branching_rule(instance)?);
        let mut oracle = MilpOverlapOracle::new().with_threads(self.config.num_workers);

        let mut monitor = CompositeTreeSearchMonitor::with_capacity(2);
        monitor.add_monitor(LogMonitor::default());
        monitor.add_monitor(InterruptMonitor::new(stop_flag));

        let outcome = solver.solve_with_incumbent(instance, &mut oracle, monitor, warm_start);
        tracing::debug!("{}", outcome.statistics);

        Ok(SolverResult {
            status: outcome.status,
            start_times: outcome.start_times,
            time_limit_reached: outcome.time_limit_reached,
            running_time: Duration::ZERO,
            lower_bound: outcome.lower_bound,
            statistics: Some(outcome.statistics),
        })
    }

    fn run_greedy(&self, instance: &Instance, warm_start: Option<&StartTimes>, rule: PriorityRule) -> SolverResult {
        let (status, start_times) = match GreedyRepair::new(instance, warm_start, rule).repair() {
            Ok(start_times) => (SolverStatus::Heuristic, Some(start_times)),
            Err(error) => {
                tracing::info!(%error, rule = %rule, "greedy repair failed");
                (SolverStatus::NoSolution, None)
            }
        };
        SolverResult {
            status,
            start_times,
            time_limit_reached: false,
            running_time: Duration::ZERO,
            lower_bound: None,
            statistics: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use joule_core::num::tolerance::Tolerance;
    use joule_model::energy::{consumption_in_metering_intervals, energy_limits_satisfied};
    use joule_model::index::{JobIndex, MachineIndex};
    use joule_model::instance::InstanceBuilder;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn m(i: usize) -> MachineIndex {
        MachineIndex::new(i)
    }

    fn build(num_machines: usize, horizon: i64, limit: f64, ops: &[(usize, i64, f64)]) -> Instance {
        let mut b = InstanceBuilder::new(num_machines, horizon, 100, limit);
        for &(machine, p, power) in ops {
            b.add_job([(m(machine), p, power)]);
        }
        b.build().unwrap()
    }

    fn start(job: usize, time: f64) -> IndexedStartTime {
        IndexedStartTime::new(JobIndex::new(job), 0, time)
    }

    fn assert_verified(instance: &Instance, start_times: &StartTimes) {
        let status = FeasibilityChecker::default().check(instance, start_times, true);
        assert!(status.is_feasible(), "{}", status);
        let consumption = consumption_in_metering_intervals(instance, start_times);
        assert!(energy_limits_satisfied(instance, &consumption, &Tolerance::default()));
    }

    #[test]
    fn test_bnb_solves_small_instance() {
        let inst = build(2, 100, 1000.0, &[(0, 10, 1.0), (0, 10, 1.0), (1, 10, 1.0)]);
        let result = Solver::new(SolverKind::BranchAndBound).solve(&inst).unwrap();
        assert_eq!(result.status, SolverStatus::Optimal);
        assert!((result.makespan().unwrap() - 20.0).abs() < 1e-6);
        assert!(result.statistics.is_some());
        assert!(!result.time_limit_reached);
        assert_verified(&inst, result.start_times.as_ref().unwrap());

        let indexed = result.indexed_start_times(&inst).unwrap();
        assert_eq!(indexed.len(), 3);
        assert!(indexed.iter().all(|s| s.start_time == s.start_time.round()));
    }

    #[test]
    fn test_disabling_energy_limits() {
        // 20 energy units in an interval that allows 10.
        let inst = build(1, 100, 10.0, &[(0, 10, 2.0)]);
        let kind = SolverKind::BranchAndBound;

        let limited = Solver::new(kind).solve(&inst).unwrap();
        assert_eq!(limited.status, SolverStatus::Infeasible);

        let config = SolverConfig::new().with_energy_limits(false);
        let relaxed = Solver::new(kind).with_config(config).solve(&inst).unwrap();
        assert_eq!(relaxed.status, SolverStatus::Optimal);
        assert!((relaxed.makespan().unwrap() - 10.0).abs() < 1e-6);
    }

    #[test]
    fn test_bnb_rejects_multi_operation_jobs() {
        let mut b = InstanceBuilder::new(1, 100, 100, 100.0);
        b.add_job([(m(0), 10, 1.0), (m(0), 10, 1.0)]);
        let inst = b.build().unwrap();
        let error = Solver::new(SolverKind::BranchAndBound).solve(&inst).unwrap_err();
        assert!(matches!(
            error,
            ConfigurationError::MultiOperationJobsUnsupported { .. }
        ));
    }

    #[test]
    fn test_infeasible_warm_start_is_rejected() {
        let inst = build(1, 200, 1000.0, &[(0, 10, 1.0), (0, 10, 1.0)]);
        let config = SolverConfig::new().with_initial_start_times(vec![start(0, 0.0), start(1, 5.0)]);
        let error = Solver::new(SolverKind::BranchAndBound)
            .with_config(config)
            .solve(&inst)
            .unwrap_err();
        assert!(matches!(
            error,
            ConfigurationError::InfeasibleInitialStartTimes(FeasibilityStatus::OverlappingOperations { .. })
        ));
    }

    #[test]
    fn test_warm_start_survives_zero_time_limit() {
        let inst = build(1, 200, 1000.0, &[(0, 10, 1.0), (0, 10, 1.0)]);
        let config = SolverConfig::new()
            .with_time_limit(Duration::ZERO)
            .with_initial_start_times(vec![start(0, 0.0), start(1, 50.0)]);
        let result = Solver::new(SolverKind::BranchAndBound)
            .with_config(config)
            .solve(&inst)
            .unwrap();
        assert_eq!(result.status, SolverStatus::Heuristic);
        assert!(result.time_limit_reached);
        assert!((result.makespan().unwrap() - 60.0).abs() < 1e-6);
    }

    #[test]
    fn test_interrupt_flag_stops_search() {
        let inst = build(2, 100, 1000.0, &[(0, 10, 1.0), (1, 10, 1.0)]);
        let stop = AtomicBool::new(true);
        let result = Solver::new(SolverKind::BranchAndBound)
            .solve_with_interrupt(&inst, &stop)
            .unwrap();
        assert_eq!(result.status, SolverStatus::NoSolution);
        assert!(!result.time_limit_reached);
    }

    #[test]
    fn test_fixed_order() {
        let inst = build(1, 300, 1000.0, &[(0, 30, 1.0), (0, 20, 1.0)]);
        let config = SolverConfig::new().with_fixed_order(vec![start(0, 100.0), start(1, 0.0)]);
        let result = Solver::new(SolverKind::BranchAndBound)
            .with_config(config)
            .solve(&inst)
            .unwrap();
        assert_eq!(result.status, SolverStatus::Optimal);
        let st = result.start_times.unwrap();
        let first = st.get(inst.job(JobIndex::new(1)).operations()[0]).unwrap();
        let second = st.get(inst.job(JobIndex::new(0)).operations()[0]).unwrap();
        assert!(first < second);

        let incomplete = SolverConfig::new().with_fixed_order(vec![start(0, 0.0)]);
        let error = Solver::new(SolverKind::BranchAndBound)
            .with_config(incomplete)
            .solve(&inst)
            .unwrap_err();
        assert_eq!(error, ConfigurationError::InvalidFixedOrder);
    }

    #[test]
    fn test_greedy_repair_configuration_errors() {
        let inst = build(1, 200, 1000.0, &[(0, 10, 1.0)]);
        let kind = SolverKind::GreedyRepair(PriorityRule::StartTime);

        let error = Solver::new(kind).solve(&inst).unwrap_err();
        assert!(matches!(error, ConfigurationError::MissingInitialStartTimes { .. }));

        let config = SolverConfig::new().with_continuous_start_times(true);
        let error = Solver::new(kind).with_config(config).solve(&inst).unwrap_err();
        assert!(matches!(error, ConfigurationError::ContinuousStartTimesUnsupported { .. }));
    }

    #[test]
    fn test_greedy_repair_fixes_energy_violation() {
        // Parallel starts at 0 need 120 energy in interval 0.
        let inst = build(2, 300, 100.0, &[(0, 60, 1.0), (1, 60, 1.0)]);
        let config = SolverConfig::new().with_initial_start_times(vec![start(0, 0.0), start(1, 0.0)]);
        let result = Solver::new(SolverKind::GreedyRepair(PriorityRule::StartTime))
            .with_config(config)
            .solve(&inst)
            .unwrap();
        assert_eq!(result.status, SolverStatus::Heuristic);
        assert!(result.lower_bound.is_none());
        assert!(result.statistics.is_none());
        assert_verified(&inst, result.start_times.as_ref().unwrap());
    }

    #[test]
    fn test_greedy_repair_reports_no_solution() {
        // Needs 20 energy units where 10 are allowed.
        let inst = build(1, 100, 10.0, &[(0, 10, 2.0)]);
        let result = Solver::new(SolverKind::GreedyRepair(PriorityRule::MostRemainingWork))
            .solve(&inst)
            .unwrap();
        assert_eq!(result.status, SolverStatus::NoSolution);
        assert!(result.start_times.is_none());
    }

    #[test]
    fn test_random_instances_agree_on_feasibility() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        for _ in 0..4 {
            let num_machines = rng.random_range(1..=2);
            let ops: Vec<(usize, i64, f64)> = (0..3)
                .map(|_| {
                    (
                        rng.random_range(0..num_machines),
                        rng.random_range(5..=80),
                        rng.random_range(1..=3) as f64 * 0.5,
                    )
                })
                .collect();
            let limit = rng.random_range(80..=200) as f64;
            let inst = build(num_machines, 300, limit, &ops);

            let greedy = Solver::new(SolverKind::GreedyRepair(PriorityRule::MostRemainingWork))
                .solve(&inst)
                .unwrap();
            let config = SolverConfig::new().with_time_limit(Duration::from_secs(10));
            let exact = Solver::new(SolverKind::BranchAndBound)
                .with_config(config)
                .solve(&inst)
                .unwrap();

            for st in [&greedy.start_times, &exact.start_times].into_iter().flatten() {
                assert_verified(&inst, st);
            }
            if exact.status == SolverStatus::Optimal
                && let Some(heuristic) = greedy.makespan()
            {
                assert!(exact.makespan().unwrap() <= heuristic + 1e-6);
            }
            if exact.status == SolverStatus::Infeasible {
                assert!(greedy.start_times.is_none());
            }
        }
    }
}
