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

//! Terminal statuses of a solver run.

/// Final status of a run.
///
/// | search exhausted | incumbent | status       |
/// |------------------|-----------|--------------|
/// | yes              | yes       | `Optimal`    |
/// | no               | yes       | `Heuristic`  |
/// | yes              | no        | `Infeasible` |
/// | no               | no        | `NoSolution` |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SolverStatus {
    /// A schedule was found and proven optimal.
    Optimal,
    /// A schedule was found without a proof of optimality.
    Heuristic,
    /// The instance admits no schedule.
    Infeasible,
    /// The run stopped before finding a schedule or proving infeasibility.
    NoSolution,
}

impl SolverStatus {
    /// Derives the status from whether the search ran to completion and
    /// whether it holds a schedule.
    #[inline]
    pub fn from_search(exhausted: bool, has_incumbent: bool) -> Self {
        match (exhausted, has_incumbent) {
            (true, true) => SolverStatus::Optimal,
            (false, true) => SolverStatus::Heuristic,
            (true, false) => SolverStatus::Infeasible,
            (false, false) => SolverStatus::NoSolution,
        }
    }

    /// `true` for the statuses that come with a schedule.
    #[inline]
    pub fn has_solution(&self) -> bool {
        matches!(self, SolverStatus::Optimal | SolverStatus::Heuristic)
    }
}

impl std::fmt::Display for SolverStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SolverStatus::Optimal => write!(f, "Optimal"),
            SolverStatus::Heuristic => write!(f, "Heuristic"),
            SolverStatus::Infeasible => write!(f, "Infeasible"),
            SolverStatus::NoSolution => write!(f, "NoSolution"),
        }
    }
}

/// Why a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminationReason {
    /// The search space was exhausted with a schedule in hand.
    OptimalityProven,
    /// The search space was exhausted without any schedule.
    InfeasibilityProven,
    /// The run was cut short; the string names the limit or signal.
    Aborted(String),
}

impl std::fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TerminationReason::OptimalityProven => write!(f, "Optimality Proven"),
            TerminationReason::InfeasibilityProven => write!(f, "Infeasibility Proven"),
            TerminationReason::Aborted(reason) => write!(f, "Aborted: {}", reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_from_search() {
        assert_eq!(SolverStatus::from_search(true, true), SolverStatus::Optimal);
        assert_eq!(SolverStatus::from_search(false, true), SolverStatus::Heuristic);
        assert_eq!(SolverStatus::from_search(true, false), SolverStatus::Infeasible);
        assert_eq!(SolverStatus::from_search(false, false), SolverStatus::NoSolution);
        assert!(SolverStatus::Heuristic.has_solution());
        assert!(!SolverStatus::NoSolution.has_solution());
    }

    #[test]
    fn test_termination_reason_display() {
        assert_eq!(
            TerminationReason::Aborted("time limit reached".into()).to_string(),
            "Aborted: time limit reached"
        );
    }
}
