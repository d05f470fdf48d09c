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

use crate::monitor::tree_search_monitor::TreeSearchMonitor;
use crate::partial::PartialSolution;
use crate::stats::BnbStatistics;
use joule_model::instance::Instance;
use joule_model::start_times::StartTimes;
use std::time::{Duration, Instant};

/// Emits periodic progress lines through `tracing`.
///
/// The clock is only read on nodes whose count has all bits of
/// `clock_check_mask` cleared.
#[derive(Debug, Clone)]
pub struct LogMonitor {
    start_time: Instant,
    last_log_time: Instant,
    log_interval: Duration,
    clock_check_mask: u64,
    best_objective: Option<f64>,
}

impl LogMonitor {
    pub fn new(log_interval: Duration, clock_check_mask: u64) -> Self {
        Self {
            start_time: Instant::now(),
            last_log_time: Instant::now(),
            log_interval,
            clock_check_mask,
            best_objective: None,
        }
    }

    #[inline]
    pub fn best_objective(&self) -> Option<f64> {
        self.best_objective
    }

    fn log_line(&mut self, partial: &PartialSolution, stats: &BnbStatistics) {
        let now = Instant::now();
        tracing::info!(
            elapsed = format_args!("{:.1}s", now.duration_since(self.start_time).as_secs_f32()),
            nodes = stats.nodes_explored,
            depth = partial.depth(),
            best = self.best_objective,
            oracle_calls = stats.oracle_calls,
            backtracks = stats.backtracks,
            pruned_bound = stats.prunings_bound,
            pruned_infeasible = stats.prunings_infeasible,
            "branch-and-bound progress"
        );
        self.last_log_time = now;
    }
}

impl Default for LogMonitor {
    fn default() -> Self {
        Self::new(Duration::from_secs(1), 255)
    }
}

impl std::fmt::Display for LogMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "LogMonitor(log_interval: {}s, clock_check_mask: {})",
            self.log_interval.as_secs(),
            self.clock_check_mask
        )
    }
}

impl TreeSearchMonitor for LogMonitor {
    fn name(&self) -> &str {
        "LogMonitor"
    }

    fn on_enter_search(&mut self, instance: &Instance, _stats: &BnbStatistics) {
        self.start_time = Instant::now();
        self.last_log_time = self.start_time;
        self.best_objective = None;
        tracing::info!(
            machines = instance.num_machines(),
            operations = instance.total_num_operations(),
            metering_intervals = instance.num_metering_intervals(),
            "branch-and-bound started"
        );
    }

    fn on_node_entered(&mut self, partial: &PartialSolution, stats: &BnbStatistics) {
        if (stats.nodes_explored & self.clock_check_mask) == 0
            && self.last_log_time.elapsed() >= self.log_interval
        {
            self.log_line(partial, stats);
        }
    }

    fn on_solution_found(&mut self, start_times: &StartTimes, stats: &BnbStatistics) {
        let makespan = start_times.makespan();
        self.best_objective = Some(makespan);
        tracing::info!(makespan, nodes = stats.nodes_explored, "new incumbent");
    }

    fn on_exit_search(&mut self, stats: &BnbStatistics) {
        tracing::info!(
            nodes = stats.nodes_explored,
            solutions = stats.solutions_found,
            best = self.best_objective,
            elapsed = ?stats.time_total,
            "branch-and-bound finished"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use joule_model::index::{MachineIndex, OperationIndex};
    use joule_model::instance::InstanceBuilder;

    #[test]
    fn test_records_best_objective() {
        let mut b = InstanceBuilder::new(1, 100, 100, 10.0);
        b.add_job([(MachineIndex::new(0), 5, 1.0)]);
        let inst = b.build().unwrap();
        let mut st = StartTimes::for_instance(&inst);
        st.set(inst.operation(OperationIndex::new(0)), 3.0);

        let mut monitor = LogMonitor::default();
        let stats = BnbStatistics::default();
        monitor.on_enter_search(&inst, &stats);
        assert_eq!(monitor.best_objective(), None);
        monitor.on_solution_found(&st, &stats);
        assert_eq!(monitor.best_objective(), Some(8.0));
        assert_eq!(
            monitor.to_string(),
            "LogMonitor(log_interval: 1s, clock_check_mask: 255)"
        );
    }
}
