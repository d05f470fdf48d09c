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

//! # Incumbent
//!
//! The best complete schedule found so far in one search. It is owned by that
//! search's context, so no synchronization is involved; parallel runs each
//! keep their own.
//!
//! ## Highlights
//!
//! - `upper_bound()` is the incumbent makespan, `None` before the first schedule.
//! - `is_dominated(bound)` answers the pruning question "can a subtree whose
//!   makespan is at least `bound` still improve?" with tolerance.
//! - `try_install` only accepts strictly better schedules.

use joule_core::num::tolerance::Tolerance;
use joule_model::start_times::StartTimes;

#[derive(Debug, Clone, Default)]
pub struct Incumbent {
    best: Option<StartTimes>,
    tolerance: Tolerance,
}

impl Incumbent {
    #[inline]
    pub fn new(tolerance: Tolerance) -> Self {
        Self {
            best: None,
            tolerance,
        }
    }

    /// An incumbent seeded with a known schedule.
    #[inline]
    pub fn with_solution(tolerance: Tolerance, start_times: StartTimes) -> Self {
        Self {
            best: Some(start_times),
            tolerance,
        }
    }

    #[inline]
    pub fn has_solution(&self) -> bool {
        self.best.is_some()
    }

    #[inline]
    pub fn upper_bound(&self) -> Option<f64> {
        self.best.as_ref().map(StartTimes::makespan)
    }

    /// `true` if the incumbent is at least as good as `bound`.
    #[inline]
    pub fn is_dominated(&self, bound: f64) -> bool {
        self.upper_bound()
            .is_some_and(|ub| self.tolerance.less_or_equal(ub, bound))
    }

    /// Installs `candidate` if it strictly improves the makespan.
    pub fn try_install(&mut self, candidate: StartTimes) -> bool {
        if self.is_dominated(candidate.makespan()) {
            return false;
        }
        self.best = Some(candidate);
        true
    }

    #[inline]
    pub fn snapshot(&self) -> Option<&StartTimes> {
        self.best.as_ref()
    }

    #[inline]
    pub fn into_inner(self) -> Option<StartTimes> {
        self.best
    }
}

impl std::fmt::Display for Incumbent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.upper_bound() {
            Some(ub) => write!(f, "Incumbent(upper_bound: {})", ub),
            None => write!(f, "Incumbent(none)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use joule_model::index::{MachineIndex, OperationIndex};
    use joule_model::instance::{Instance, InstanceBuilder};

    fn instance() -> Instance {
        let mut b = InstanceBuilder::new(1, 100, 100, 10.0);
        b.add_job([(MachineIndex::new(0), 10, 0.0)]);
        b.build().unwrap()
    }

    fn schedule(inst: &Instance, start: f64) -> StartTimes {
        let mut st = StartTimes::for_instance(inst);
        st.set(inst.operation(OperationIndex::new(0)), start);
        st
    }

    #[test]
    fn test_installs_only_strict_improvements() {
        let inst = instance();
        let mut inc = Incumbent::default();
        assert!(!inc.is_dominated(0.0));
        assert!(inc.try_install(schedule(&inst, 20.0)));
        assert_eq!(inc.upper_bound(), Some(30.0));
        assert!(!inc.try_install(schedule(&inst, 20.0)));
        assert!(!inc.try_install(schedule(&inst, 25.0)));
        assert!(inc.try_install(schedule(&inst, 5.0)));
        assert_eq!(inc.upper_bound(), Some(15.0));
    }

    #[test]
    fn test_dominance_uses_tolerance() {
        let inst = instance();
        let inc = Incumbent::with_solution(Tolerance::new(1e-6), schedule(&inst, 10.0));
        assert!(inc.is_dominated(20.0));
        assert!(inc.is_dominated(20.0 - 1e-9));
        assert!(!inc.is_dominated(19.5));
    }
}
