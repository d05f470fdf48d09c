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

use crate::stats::BnbStatistics;
use joule_model::start_times::StartTimes;
use joule_search::result::{SolverStatus, TerminationReason};

/// Result of one branch-and-bound run.
#[derive(Debug, Clone, PartialEq)]
pub struct BnbOutcome {
    pub status: SolverStatus,
    /// The incumbent, present iff `status` has a solution.
    pub start_times: Option<StartTimes>,
    pub termination_reason: TerminationReason,
    /// The run stopped because the time budget ran out.
    pub time_limit_reached: bool,
    /// Proven lower bound on the optimal makespan: the makespan itself when
    /// optimal, otherwise the root bound if the root was evaluated.
    pub lower_bound: Option<f64>,
    pub statistics: BnbStatistics,
}

impl BnbOutcome {
    #[inline]
    pub fn is_optimal(&self) -> bool {
        self.status == SolverStatus::Optimal
    }

    #[inline]
    pub fn has_solution(&self) -> bool {
        self.start_times.is_some()
    }

    #[inline]
    pub fn makespan(&self) -> Option<f64> {
        self.start_times.as_ref().map(StartTimes::makespan)
    }
}

impl std::fmt::Display for BnbOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BnbOutcome(status: {}, ", self.status)?;
        match self.makespan() {
            Some(makespan) => write!(f, "makespan: {}, ", makespan)?,
            None => write!(f, "makespan: -, ")?,
        }
        write!(f, "termination: {})", self.termination_reason)
    }
}
