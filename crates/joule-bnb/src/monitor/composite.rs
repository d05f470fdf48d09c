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

use crate::monitor::tree_search_monitor::{PruneReason, TreeSearchMonitor};
use crate::partial::PartialSolution;
use crate::stats::BnbStatistics;
use joule_model::index::OperationIndex;
use joule_model::instance::Instance;
use joule_model::start_times::StartTimes;
use joule_model::subset::IntervalSubset;
use joule_search::command::SearchCommand;

/// Forwards every callback to a list of monitors, in insertion order.
///
/// `search_command` returns the first non-`Continue` command.
#[derive(Default)]
pub struct CompositeTreeSearchMonitor<'a> {
    monitors: Vec<Box<dyn TreeSearchMonitor + 'a>>,
}

impl<'a> CompositeTreeSearchMonitor<'a> {
    #[inline(always)]
    pub fn new() -> Self {
        Self {
            monitors: Vec::new(),
        }
    }

    #[inline(always)]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            monitors: Vec::with_capacity(capacity),
        }
    }

    #[inline(always)]
    pub fn add_monitor<M>(&mut self, monitor: M)
    where
        M: TreeSearchMonitor + 'a,
    {
        self.monitors.push(Box::new(monitor));
    }

    #[inline(always)]
    pub fn add_monitor_boxed(&mut self, monitor: Box<dyn TreeSearchMonitor + 'a>) {
        self.monitors.push(monitor);
    }

    #[inline(always)]
    pub fn monitors(&self) -> &[Box<dyn TreeSearchMonitor + 'a>] {
        &self.monitors
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.monitors.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.monitors.is_empty()
    }
}

impl std::fmt::Debug for CompositeTreeSearchMonitor<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.monitors.iter().map(|m| m.name()))
            .finish()
    }
}

impl<'a> FromIterator<Box<dyn TreeSearchMonitor + 'a>> for CompositeTreeSearchMonitor<'a> {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = Box<dyn TreeSearchMonitor + 'a>>,
    {
        Self {
            monitors: iter.into_iter().collect(),
        }
    }
}

impl TreeSearchMonitor for CompositeTreeSearchMonitor<'_> {
    fn name(&self) -> &str {
        "CompositeTreeSearchMonitor"
    }

    fn on_enter_search(&mut self, instance: &Instance, statistics: &BnbStatistics) {
        for monitor in &mut self.monitors {
            monitor.on_enter_search(instance, statistics);
        }
    }

    fn on_exit_search(&mut self, statistics: &BnbStatistics) {
        for monitor in &mut self.monitors {
            monitor.on_exit_search(statistics);
        }
    }

    fn search_command(&mut self, partial: &PartialSolution, statistics: &BnbStatistics) -> SearchCommand {
        for monitor in &mut self.monitors {
            let cmd = monitor.search_command(partial, statistics);
            if !matches!(cmd, SearchCommand::Continue) {
                return cmd;
            }
        }
        SearchCommand::Continue
    }

    fn on_node_entered(&mut self, partial: &PartialSolution, statistics: &BnbStatistics) {
        for monitor in &mut self.monitors {
            monitor.on_node_entered(partial, statistics);
        }
    }

    fn on_lower_bound_computed(&mut self, partial: &PartialSolution, lower_bound: f64, statistics: &BnbStatistics) {
        for monitor in &mut self.monitors {
            monitor.on_lower_bound_computed(partial, lower_bound, statistics);
        }
    }

    fn on_prune(&mut self, partial: &PartialSolution, reason: PruneReason, statistics: &BnbStatistics) {
        for monitor in &mut self.monitors {
            monitor.on_prune(partial, reason, statistics);
        }
    }

    fn on_descend(
        &mut self,
        partial: &PartialSolution,
        operation: OperationIndex,
        window: IntervalSubset,
        statistics: &BnbStatistics,
    ) {
        for monitor in &mut self.monitors {
            monitor.on_descend(partial, operation, window, statistics);
        }
    }

    fn on_backtrack(&mut self, partial: &PartialSolution, statistics: &BnbStatistics) {
        for monitor in &mut self.monitors {
            monitor.on_backtrack(partial, statistics);
        }
    }

    fn on_solution_found(&mut self, start_times: &StartTimes, statistics: &BnbStatistics) {
        for monitor in &mut self.monitors {
            monitor.on_solution_found(start_times, statistics);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::interrupt::InterruptMonitor;
    use crate::monitor::no_op::NoOperationMonitor;
    use joule_model::index::MachineIndex;
    use joule_model::instance::InstanceBuilder;
    use std::sync::atomic::AtomicBool;

    #[test]
    fn test_first_terminate_wins() {
        let mut b = InstanceBuilder::new(1, 100, 100, 10.0);
        b.add_job([(MachineIndex::new(0), 5, 1.0)]);
        let inst = b.build().unwrap();
        let ps = PartialSolution::new(&inst);
        let stats = BnbStatistics::default();

        let raised = AtomicBool::new(true);
        let mut composite = CompositeTreeSearchMonitor::new();
        composite.add_monitor(NoOperationMonitor::new());
        assert_eq!(composite.search_command(&ps, &stats), SearchCommand::Continue);

        composite.add_monitor(InterruptMonitor::new(&raised));
        assert_eq!(composite.len(), 2);
        assert!(matches!(
            composite.search_command(&ps, &stats),
            SearchCommand::Terminate(_)
        ));
    }
}
