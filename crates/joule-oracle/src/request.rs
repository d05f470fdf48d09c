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

use joule_model::index::OperationIndex;
use joule_model::instance::Instance;
use joule_model::subset::IntervalSubset;
use std::time::Duration;

/// Whether start times may be fractional.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TimeGranularity {
    #[default]
    Continuous,
    Integer,
}

/// Which operations enter the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OracleScope {
    /// Only operations with a fixed window.
    OnlyFixed,
    /// Every operation; unfixed ones are free within their machine's window.
    AllOperations,
}

/// One oracle call.
///
/// `fixed_windows` is indexed by `OperationIndex`; `Some` marks a fixed
/// operation and its window. `placement_order[m]` lists the fixed operations
/// of machine `m` in processing order; when empty, operations sharing an
/// interval are sequenced by index.
#[derive(Debug, Clone, Copy)]
pub struct OracleRequest<'a> {
    pub instance: &'a Instance,
    pub fixed_windows: &'a [Option<IntervalSubset>],
    pub placement_order: &'a [Vec<OperationIndex>],
    pub granularity: TimeGranularity,
    pub scope: OracleScope,
    pub time_budget: Option<Duration>,
    pub lower_bound: Option<f64>,
    pub upper_bound: Option<f64>,
}

impl<'a> OracleRequest<'a> {
    /// A continuous, fixed-only request without budget or bounds.
    ///
    /// # Panics
    ///
    /// In debug builds, panics if `fixed_windows` does not cover every operation.
    pub fn new(instance: &'a Instance, fixed_windows: &'a [Option<IntervalSubset>]) -> Self {
        debug_assert_eq!(
            fixed_windows.len(),
            instance.total_num_operations(),
            "called `OracleRequest::new` with {} windows for {} operations",
            fixed_windows.len(),
            instance.total_num_operations()
        );
        Self {
            instance,
            fixed_windows,
            placement_order: &[],
            granularity: TimeGranularity::Continuous,
            scope: OracleScope::OnlyFixed,
            time_budget: None,
            lower_bound: None,
            upper_bound: None,
        }
    }

    #[inline]
    pub fn with_placement_order(mut self, placement_order: &'a [Vec<OperationIndex>]) -> Self {
        self.placement_order = placement_order;
        self
    }

    #[inline]
    pub fn with_granularity(mut self, granularity: TimeGranularity) -> Self {
        self.granularity = granularity;
        self
    }

    #[inline]
    pub fn with_scope(mut self, scope: OracleScope) -> Self {
        self.scope = scope;
        self
    }

    #[inline]
    pub fn with_time_budget(mut self, budget: Option<Duration>) -> Self {
        self.time_budget = budget;
        self
    }

    #[inline]
    pub fn with_lower_bound(mut self, lower_bound: Option<f64>) -> Self {
        self.lower_bound = lower_bound;
        self
    }

    #[inline]
    pub fn with_upper_bound(mut self, upper_bound: Option<f64>) -> Self {
        self.upper_bound = upper_bound;
        self
    }

    /// `true` if every operation of the instance has a fixed window.
    pub fn all_fixed(&self) -> bool {
        self.fixed_windows.iter().all(Option::is_some)
    }
}
