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

use joule_model::start_times::StartTimes;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OracleStatus {
    Optimal,
    Infeasible,
    /// No answer; see `time_limit_reached` and `bound_reached` for why.
    NoSolution,
}

impl std::fmt::Display for OracleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OracleStatus::Optimal => write!(f, "Optimal"),
            OracleStatus::Infeasible => write!(f, "Infeasible"),
            OracleStatus::NoSolution => write!(f, "NoSolution"),
        }
    }
}

/// Answer of a `RelaxationOracle`.
///
/// `objective` is set iff the status is `Optimal`. `start_times` is only set
/// for optimal answers in which every operation was fixed.
#[derive(Debug, Clone, PartialEq)]
pub struct OracleOutcome {
    pub status: OracleStatus,
    pub objective: Option<f64>,
    pub start_times: Option<StartTimes>,
    /// The time budget ran out.
    pub time_limit_reached: bool,
    /// The objective cannot beat the given upper bound.
    pub bound_reached: bool,
}

impl OracleOutcome {
    #[inline]
    pub fn optimal(objective: f64, start_times: Option<StartTimes>) -> Self {
        Self {
            status: OracleStatus::Optimal,
            objective: Some(objective),
            start_times,
            time_limit_reached: false,
            bound_reached: false,
        }
    }

    #[inline]
    pub fn infeasible() -> Self {
        Self {
            status: OracleStatus::Infeasible,
            objective: None,
            start_times: None,
            time_limit_reached: false,
            bound_reached: false,
        }
    }

    #[inline]
    pub fn timed_out() -> Self {
        Self {
            status: OracleStatus::NoSolution,
            objective: None,
            start_times: None,
            time_limit_reached: true,
            bound_reached: false,
        }
    }

    /// No solution because the upper bound cannot be beaten.
    #[inline]
    pub fn bound_reached() -> Self {
        Self {
            status: OracleStatus::NoSolution,
            objective: None,
            start_times: None,
            time_limit_reached: false,
            bound_reached: true,
        }
    }

    #[inline]
    pub fn with_bound_reached(mut self, bound_reached: bool) -> Self {
        self.bound_reached = bound_reached;
        self
    }

    #[inline]
    pub fn is_optimal(&self) -> bool {
        self.status == OracleStatus::Optimal
    }

    #[inline]
    pub fn is_infeasible(&self) -> bool {
        self.status == OracleStatus::Infeasible
    }
}
