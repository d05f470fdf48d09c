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

//! Candidate windows of an operation.
//!
//! An operation of processing time `p` overlaps at most
//! `k = ceil(p / L) + 1` metering intervals. Starting at the machine's first
//! allocable interval `f`, the enumerator yields for each `f` the shortened
//! window `[f, f + k - 2]` (when `k >= 2`) and then the full window
//! `[f, f + k - 1]`, and slides `f` right by one. Windows that reach past the
//! last interval are skipped.
//!
//! Sliding stops once even the earliest completion of the operation, followed
//! by the remaining work of its machine, would end after the horizon.

use joule_core::math::overlap::ceil_div;
use joule_model::instance::Instance;
use joule_model::subset::IntervalSubset;

#[derive(Debug, Clone)]
pub struct WindowEnumerator {
    first: usize,
    max_intervals: usize,
    last_interval: usize,
    metering_interval_length: i64,
    horizon: i64,
    processing_time: i64,
    trailing_work: i64,
    full_next: bool,
    exhausted: bool,
}

impl WindowEnumerator {
    /// Windows for an operation of `processing_time` on a machine whose next
    /// free interval is `first_allocable` and whose unplaced work, this
    /// operation included, is `machine_remaining_processing`.
    pub fn new(
        instance: &Instance,
        first_allocable: usize,
        processing_time: i64,
        machine_remaining_processing: i64,
    ) -> Self {
        let length = instance.metering_interval_length();
        debug_assert!(
            processing_time <= machine_remaining_processing,
            "called `WindowEnumerator::new` with processing time {} above the machine's remaining work {}",
            processing_time,
            machine_remaining_processing
        );
        Self {
            first: first_allocable,
            max_intervals: ceil_div(processing_time, length) as usize + 1,
            last_interval: instance.last_metering_interval_index(),
            metering_interval_length: length,
            horizon: instance.horizon(),
            processing_time,
            trailing_work: machine_remaining_processing - processing_time,
            full_next: false,
            exhausted: instance.num_metering_intervals() == 0,
        }
    }

    /// Most intervals any window of this operation spans.
    #[inline]
    pub fn max_intervals(&self) -> usize {
        self.max_intervals
    }

    /// `true` if no completion starting from `first` fits before the horizon.
    fn exceeds_horizon(&self, first: usize) -> bool {
        let shortest_last = first + self.max_intervals.saturating_sub(2);
        let window_start = first as i64 * self.metering_interval_length;
        let earliest_completion = (window_start + self.processing_time)
            .max(shortest_last as i64 * self.metering_interval_length);
        earliest_completion + self.trailing_work > self.horizon
    }
}

impl Iterator for WindowEnumerator {
    type Item = IntervalSubset;

    fn next(&mut self) -> Option<IntervalSubset> {
        loop {
            if self.exhausted {
                return None;
            }
            let first = self.first;
            if !self.full_next
                && (first + self.max_intervals.saturating_sub(2) > self.last_interval
                    || self.exceeds_horizon(first))
            {
                self.exhausted = true;
                return None;
            }

            if self.full_next {
                self.full_next = false;
                self.first += 1;
                let last = first + self.max_intervals - 1;
                if last <= self.last_interval {
                    return Some(IntervalSubset::new(first, last));
                }
            } else {
                self.full_next = true;
                if self.max_intervals >= 2 {
                    return Some(IntervalSubset::new(first, first + self.max_intervals - 2));
                }
            }
        }
    }
}
