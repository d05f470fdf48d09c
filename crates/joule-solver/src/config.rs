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

use joule_model::start_times::IndexedStartTime;
use std::time::Duration;

/// Run parameters shared by every solver kind.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverConfig {
    /// Wall-clock limit; `None` runs to completion.
    pub time_limit: Option<Duration>,
    /// When `false`, the energy limit is replaced by a non-binding one.
    pub with_energy_limits: bool,
    /// Allow fractional start times.
    pub continuous_start_times: bool,
    /// Warm start. Must be a feasible schedule of the instance.
    pub initial_start_times: Option<Vec<IndexedStartTime>>,
    /// A schedule whose per-machine order the search must follow.
    pub fixed_order: Option<Vec<IndexedStartTime>>,
    /// Worker threads of the underlying MILP solver; `0` keeps its default.
    pub num_workers: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            time_limit: None,
            with_energy_limits: true,
            continuous_start_times: false,
            initial_start_times: None,
            fixed_order: None,
            num_workers: 0,
        }
    }
}

impl SolverConfig {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn with_time_limit(mut self, time_limit: Duration) -> Self {
        self.time_limit = Some(time_limit);
        self
    }

    #[inline]
    pub fn with_energy_limits(mut self, with_energy_limits: bool) -> Self {
        self.with_energy_limits = with_energy_limits;
        self
    }

    #[inline]
    pub fn with_continuous_start_times(mut self, continuous: bool) -> Self {
        self.continuous_start_times = continuous;
        self
    }

    #[inline]
    pub fn with_initial_start_times(mut self, start_times: Vec<IndexedStartTime>) -> Self {
        self.initial_start_times = Some(start_times);
        self
    }

    #[inline]
    pub fn with_fixed_order(mut self, order: Vec<IndexedStartTime>) -> Self {
        self.fixed_order = Some(order);
        self
    }

    #[inline]
    pub fn with_num_workers(mut self, num_workers: usize) -> Self {
        self.num_workers = num_workers;
        self
    }
}

impl std::fmt::Display for SolverConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SolverConfig(time_limit: ")?;
        match self.time_limit {
            Some(limit) => write!(f, "{:.2?}", limit)?,
            None => write!(f, "none")?,
        }
        write!(
            f,
            ", energy_limits: {}, continuous: {}, warm_start: {}, fixed_order: {}, workers: {})",
            self.with_energy_limits,
            self.continuous_start_times,
            self.initial_start_times.is_some(),
            self.fixed_order.is_some(),
            self.num_workers
        )
    }
}
