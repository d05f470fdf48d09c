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

//! Branch-and-bound over metering-interval windows.
//!
//! The search builds a schedule machine by machine. A node is a
//! `PartialSolution`; a child extends it by placing one operation of the
//! selected machine on top of that machine's stack, fixed to one of the
//! windows produced by `WindowEnumerator`. Start times are never branched on:
//! once every operation has a window, the relaxation oracle computes the best
//! start times for exactly those windows.
//!
//! At an inner node the oracle is consulted twice:
//!
//! 1. over the fixed operations only, to detect that the placements made so
//!    far cannot be completed at all, and
//! 2. over all operations in continuous time, for the node's lower bound.
//!
//! The bound handed to children is the maximum of the parent's bound and the
//! node's own, so bounds never decrease along a path. With integer start
//! times the bound is rounded up.
//!
//! The search is depth-first and recursive; its depth is the number of
//! operations. Placements are undone by `PushScope` guards.

use crate::branching::BranchingRule;
use crate::enumerate::WindowEnumerator;
use crate::monitor::tree_search_monitor::{PruneReason, TreeSearchMonitor};
use crate::partial::PartialSolution;
use crate::result::BnbOutcome;
use crate::stats::BnbStatistics;
use joule_core::num::tolerance::Tolerance;
use joule_model::instance::Instance;
use joule_model::start_times::StartTimes;
use joule_oracle::oracle::RelaxationOracle;
use joule_oracle::outcome::{OracleOutcome, OracleStatus};
use joule_oracle::request::{OracleRequest, OracleScope, TimeGranularity};
use joule_search::budget::TimeBudget;
use joule_search::command::SearchCommand;
use joule_search::incumbent::Incumbent;
use joule_search::result::{SolverStatus, TerminationReason};
use std::time::Duration;

/// Search parameters of the branch-and-bound.
///
/// The solver itself holds no per-run state and can be reused.
#[derive(Debug, Clone, Default)]
pub struct BnbSolver {
    time_limit: Option<Duration>,
    granularity: TimeGranularity,
    branching: BranchingRule,
    tolerance: Tolerance,
}

impl BnbSolver {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wall-clock budget of a run; `None` runs until the tree is exhausted.
    #[inline]
    pub fn with_time_limit(mut self, time_limit: Option<Duration>) -> Self {
        self.time_limit = time_limit;
        self
    }

    /// Whether returned start times may be fractional.
    #[inline]
    pub fn with_granularity(mut self, granularity: TimeGranularity) -> Self {
        self.granularity = granularity;
        self
    }

    #[inline]
    pub fn with_branching(mut self, branching: BranchingRule) -> Self {
        self.branching = branching;
        self
    }

    #[inline]
    pub fn with_tolerance(mut self, tolerance: Tolerance) -> Self {
        self.tolerance = tolerance;
        self
    }

    #[inline]
    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit
    }

    #[inline]
    pub fn granularity(&self) -> TimeGranularity {
        self.granularity
    }

    #[inline]
    pub fn branching(&self) -> &BranchingRule {
        &self.branching
    }

    /// Searches for a makespan-optimal schedule of `instance`.
    ///
    /// # Panics
    ///
    /// In debug builds, panics if some job has more than one operation.
    pub fn solve<O, M>(&self, instance: &Instance, oracle: &mut O, monitor: M) -> BnbOutcome
    where
        O: RelaxationOracle + ?Sized,
        M: TreeSearchMonitor,
    {
        self.solve_with_incumbent(instance, oracle, monitor, None)
    }

    /// Like `solve`, but starts from a known schedule. The schedule is
    /// trusted; it bounds the search from the first node on and is returned
    /// unless something strictly better is found.
    pub fn solve_with_incumbent<O, M>(
        &self,
        instance: &Instance,
        oracle: &mut O,
        monitor: M,
        incumbent: Option<StartTimes>,
    ) -> BnbOutcome
    where
        O: RelaxationOracle + ?Sized,
        M: TreeSearchMonitor,
    {
        debug_assert!(
            instance.has_single_operation_jobs(),
            "called `BnbSolver::solve` with multi-operation jobs"
        );
        let incumbent = match incumbent {
            Some(start_times) => Incumbent::with_solution(self.tolerance, start_times),
            None => Incumbent::new(self.tolerance),
        };
        let session = SearchSession {
            instance,
            oracle,
            monitor,
            branching: &self.branching,
            granularity: self.granularity,
            tolerance: self.tolerance,
            budget: TimeBudget::start(self.time_limit),
            incumbent,
            stop: None,
            statistics: BnbStatistics::default(),
        };
        session.run()
    }
}

/// Why a run ended before the tree was exhausted.
#[derive(Debug, Clone, PartialEq, Eq)]
enum StopReason {
    TimeLimit,
    Command(String),
}

/// Per-run state of the search.
struct SearchSession<'a, O, M>
where
    O: RelaxationOracle + ?Sized,
    M: TreeSearchMonitor,
{
    instance: &'a Instance,
    oracle: &'a mut O,
    monitor: M,
    branching: &'a BranchingRule,
    granularity: TimeGranularity,
    tolerance: Tolerance,
    budget: TimeBudget,
    incumbent: Incumbent,
    stop: Option<StopReason>,
    statistics: BnbStatistics,
}

impl<O, M> std::fmt::Debug for SearchSession<'_, O, M>
where
    O: RelaxationOracle + ?Sized,
    M: TreeSearchMonitor,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchSession")
            .field("oracle", &self.oracle.name())
            .field("monitor", &self.monitor.name())
            .field("branching", self.branching)
            .field("granularity", &self.granularity)
            .field("incumbent", &self.incumbent.upper_bound())
            .field("stop", &self.stop)
            .finish()
    }
}

impl<O, M> SearchSession<'_, O, M>
where
    O: RelaxationOracle + ?Sized,
    M: TreeSearchMonitor,
{
    fn run(mut self) -> BnbOutcome {
        let mut partial = PartialSolution::new(self.instance).with_tolerance(self.tolerance);
        self.monitor.on_enter_search(self.instance, &self.statistics);
        tracing::debug!(
            oracle = self.oracle.name(),
            branching = %self.branching,
            granularity = ?self.granularity,
            warm_start = ?self.incumbent.upper_bound(),
            "entering branch-and-bound"
        );

        self.explore(&mut partial, 0.0);
        debug_assert_eq!(
            partial.depth(),
            0,
            "branch-and-bound returned with placements left on the stacks"
        );

        self.statistics.set_total_time(self.budget.elapsed());
        self.monitor.on_exit_search(&self.statistics);
        self.finalize()
    }

    fn finalize(self) -> BnbOutcome {
        let has_solution = self.incumbent.has_solution();
        let status = SolverStatus::from_search(self.stop.is_none(), has_solution);
        let termination_reason = match (&self.stop, has_solution) {
            (None, true) => TerminationReason::OptimalityProven,
            (None, false) => TerminationReason::InfeasibilityProven,
            (Some(StopReason::TimeLimit), _) => TerminationReason::Aborted("time limit reached".to_string()),
            (Some(StopReason::Command(reason)), _) => TerminationReason::Aborted(reason.clone()),
        };
        let lower_bound = match status {
            SolverStatus::Optimal => self.incumbent.upper_bound(),
            _ => self.statistics.root_lower_bound,
        };
        tracing::debug!(%status, %termination_reason, ?lower_bound, "leaving branch-and-bound");

        BnbOutcome {
            status,
            time_limit_reached: self.stop == Some(StopReason::TimeLimit),
            termination_reason,
            lower_bound,
            statistics: self.statistics,
            start_times: self.incumbent.into_inner(),
        }
    }

    /// Records the first stop reason; later ones are ignored.
    fn stop(&mut self, reason: StopReason) {
        if self.stop.is_none() {
            tracing::debug!(?reason, nodes = self.statistics.nodes_explored, "stopping search");
            self.stop = Some(reason);
        }
    }

    fn should_stop(&mut self, partial: &PartialSolution) -> bool {
        if self.stop.is_some() {
            return true;
        }
        if self.budget.is_exhausted() {
            self.stop(StopReason::TimeLimit);
            return true;
        }
        if let SearchCommand::Terminate(reason) = self.monitor.search_command(partial, &self.statistics) {
            self.stop(StopReason::Command(reason));
            return true;
        }
        false
    }

    fn prune(&mut self, partial: &PartialSolution, reason: PruneReason) {
        match reason {
            PruneReason::Infeasible => self.statistics.on_pruning_infeasible(),
            PruneReason::BoundDominated => self.statistics.on_pruning_bound(),
            PruneReason::BudgetExceeded => self.statistics.on_pruning_budget(),
        }
        self.monitor.on_prune(partial, reason, &self.statistics);
    }

    fn consult(
        &mut self,
        partial: &PartialSolution,
        granularity: TimeGranularity,
        scope: OracleScope,
        lower_bound: f64,
    ) -> OracleOutcome {
        self.statistics.on_oracle_call();
        let request = OracleRequest::new(self.instance, partial.windows())
            .with_placement_order(partial.machine_stacks())
            .with_granularity(granularity)
            .with_scope(scope)
            .with_time_budget(self.budget.remaining())
            .with_lower_bound(Some(lower_bound))
            .with_upper_bound(self.incumbent.upper_bound());
        self.oracle.solve(&request)
    }

    /// Handles a non-optimal oracle answer. Returns `true` if the node is done.
    fn settle(&mut self, partial: &PartialSolution, outcome: &OracleOutcome) -> bool {
        match outcome.status {
            OracleStatus::Optimal => false,
            OracleStatus::Infeasible => {
                self.prune(partial, PruneReason::Infeasible);
                true
            }
            OracleStatus::NoSolution => {
                if outcome.time_limit_reached {
                    self.stop(StopReason::TimeLimit);
                } else {
                    self.prune(partial, PruneReason::BoundDominated);
                }
                true
            }
        }
    }

    fn explore(&mut self, partial: &mut PartialSolution, inherited_bound: f64) {
        self.statistics.on_node_explored();
        self.statistics.on_depth_update(partial.depth() as u64);
        self.monitor.on_node_entered(partial, &self.statistics);
        if self.should_stop(partial) {
            return;
        }

        if partial.is_complete() {
            self.evaluate_leaf(partial, inherited_bound);
            return;
        }

        let fixed = self.consult(partial, self.granularity, OracleScope::OnlyFixed, inherited_bound);
        if self.settle(partial, &fixed) {
            return;
        }

        let relaxed = self.consult(
            partial,
            TimeGranularity::Continuous,
            OracleScope::AllOperations,
            inherited_bound,
        );
        if self.settle(partial, &relaxed) {
            return;
        }
        let Some(objective) = relaxed.objective else {
            return;
        };

        let mut bound = objective.max(inherited_bound);
        if self.granularity == TimeGranularity::Integer {
            bound = self.tolerance.ceil(bound);
        }
        if partial.depth() == 0 {
            self.statistics.set_root_lower_bound(bound);
        }
        self.monitor.on_lower_bound_computed(partial, bound, &self.statistics);
        if self.incumbent.is_dominated(bound) {
            self.prune(partial, PruneReason::BoundDominated);
            return;
        }

        let candidates = self.branching.candidates(self.instance, partial);
        for operation in candidates {
            let op = self.instance.operation(operation);
            let machine = op.machine_index();
            let windows = WindowEnumerator::new(
                self.instance,
                partial.first_allocable_interval(machine),
                op.processing_time(),
                partial.machine_remaining_processing(machine),
            );

            for window in windows {
                self.statistics.on_decision_generated();
                let mut child = partial.push_scoped(operation, window);
                if child.is_violated() {
                    self.prune(&child, PruneReason::BudgetExceeded);
                    continue;
                }
                self.monitor.on_descend(&child, operation, window, &self.statistics);
                self.explore(&mut child, bound);
                drop(child);

                self.statistics.on_backtrack();
                self.monitor.on_backtrack(partial, &self.statistics);
                if self.stop.is_some() {
                    return;
                }
                // A better incumbent may have made the rest of this node pointless.
                if self.incumbent.is_dominated(bound) {
                    self.prune(partial, PruneReason::BoundDominated);
                    return;
                }
            }
        }
    }

    fn evaluate_leaf(&mut self, partial: &PartialSolution, inherited_bound: f64) {
        self.statistics.on_leaf_reached();
        if self.incumbent.is_dominated(inherited_bound) {
            self.prune(partial, PruneReason::BoundDominated);
            return;
        }

        let outcome = self.consult(partial, self.granularity, OracleScope::OnlyFixed, inherited_bound);
        if self.settle(partial, &outcome) {
            return;
        }
        let Some(start_times) = outcome.start_times else {
            return;
        };
        if self.incumbent.try_install(start_times) {
            self.statistics.on_solution_found();
            if let Some(best) = self.incumbent.snapshot() {
                tracing::debug!(
                    makespan = best.makespan(),
                    nodes = self.statistics.nodes_explored,
                    "installed new incumbent"
                );
                self.monitor.on_solution_found(best, &self.statistics);
            }
        } else {
            self.prune(partial, PruneReason::BoundDominated);
        }
    }
}
