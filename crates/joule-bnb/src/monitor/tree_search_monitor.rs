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

//! Tree search monitoring interface
//!
//! Declares the `TreeSearchMonitor` trait and `PruneReason` for observing and
//! controlling the branch-and-bound. Callbacks follow the search lifecycle,
//! and a monitor can stop the run through `search_command` (default:
//! `Continue`).
//!
//! Lifecycle
//! - enter → node → {lower bound | prune | descend → ... → backtrack} → solution → exit
//! - `BnbStatistics` is passed to every callback.
//!
//! Monitors are driven from the single search thread. Keep callbacks cheap;
//! `on_node_entered` runs once per node.

use crate::partial::PartialSolution;
use crate::stats::BnbStatistics;
use joule_model::index::OperationIndex;
use joule_model::instance::Instance;
use joule_model::start_times::StartTimes;
use joule_model::subset::IntervalSubset;
use joule_search::command::SearchCommand;

/// Reasons for cutting off a node.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PruneReason {
    /// The oracle proved that no completion exists.
    Infeasible,
    /// The node's lower bound cannot beat the incumbent.
    BoundDominated,
    /// A placement drove a machine-time or energy budget negative.
    BudgetExceeded,
}

impl std::fmt::Display for PruneReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PruneReason::Infeasible => write!(f, "Infeasible"),
            PruneReason::BoundDominated => write!(f, "BoundDominated"),
            PruneReason::BudgetExceeded => write!(f, "BudgetExceeded"),
        }
    }
}

pub trait TreeSearchMonitor {
    /// Returns the name of the monitor.
    fn name(&self) -> &str;

    /// Called once before the root node.
    fn on_enter_search(&mut self, instance: &Instance, statistics: &BnbStatistics);

    /// Called once after the search returned.
    fn on_exit_search(&mut self, statistics: &BnbStatistics);

    /// Called on entering every node to decide whether to go on.
    fn search_command(&mut self, _partial: &PartialSolution, _statistics: &BnbStatistics) -> SearchCommand {
        SearchCommand::Continue
    }

    /// Called on entering every node.
    fn on_node_entered(&mut self, _partial: &PartialSolution, _statistics: &BnbStatistics) {}

    /// Called when the relaxation produced the bound of an inner node.
    fn on_lower_bound_computed(
        &mut self,
        _partial: &PartialSolution,
        _lower_bound: f64,
        _statistics: &BnbStatistics,
    ) {
    }

    /// Called when a node or a branch is cut off.
    fn on_prune(&mut self, _partial: &PartialSolution, _reason: PruneReason, _statistics: &BnbStatistics) {}

    /// Called after `operation` was pushed with `window`, before the child is explored.
    fn on_descend(
        &mut self,
        _partial: &PartialSolution,
        _operation: OperationIndex,
        _window: IntervalSubset,
        _statistics: &BnbStatistics,
    ) {
    }

    /// Called after a child was explored and popped again.
    fn on_backtrack(&mut self, _partial: &PartialSolution, _statistics: &BnbStatistics) {}

    /// Called when an improving schedule became the incumbent.
    fn on_solution_found(&mut self, start_times: &StartTimes, statistics: &BnbStatistics);
}

impl std::fmt::Debug for dyn TreeSearchMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TreeSearchMonitor({})", self.name())
    }
}

impl std::fmt::Display for dyn TreeSearchMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TreeSearchMonitor({})", self.name())
    }
}

impl<M> TreeSearchMonitor for &mut M
where
    M: TreeSearchMonitor + ?Sized,
{
    fn name(&self) -> &str {
        (**self).name()
    }

    fn on_enter_search(&mut self, instance: &Instance, statistics: &BnbStatistics) {
        (**self).on_enter_search(instance, statistics)
    }

    fn on_exit_search(&mut self, statistics: &BnbStatistics) {
        (**self).on_exit_search(statistics)
    }

    fn search_command(&mut self, partial: &PartialSolution, statistics: &BnbStatistics) -> SearchCommand {
        (**self).search_command(partial, statistics)
    }

    fn on_node_entered(&mut self, partial: &PartialSolution, statistics: &BnbStatistics) {
        (**self).on_node_entered(partial, statistics)
    }

    fn on_lower_bound_computed(&mut self, partial: &PartialSolution, lower_bound: f64, statistics: &BnbStatistics) {
        (**self).on_lower_bound_computed(partial, lower_bound, statistics)
    }

    fn on_prune(&mut self, partial: &PartialSolution, reason: PruneReason, statistics: &BnbStatistics) {
        (**self).on_prune(partial, reason, statistics)
    }

    fn on_descend(
        &mut self,
        partial: &PartialSolution,
        operation: OperationIndex,
        window: IntervalSubset,
        statistics: &BnbStatistics,
    ) {
        (**self).on_descend(partial, operation, window, statistics)
    }

    fn on_backtrack(&mut self, partial: &PartialSolution, statistics: &BnbStatistics) {
        (**self).on_backtrack(partial, statistics)
    }

    fn on_solution_found(&mut self, start_times: &StartTimes, statistics: &BnbStatistics) {
        (**self).on_solution_found(start_times, statistics)
    }
}
