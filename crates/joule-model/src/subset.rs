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

//! Contiguous ranges of metering intervals.
//!
//! An `IntervalSubset` records, for a placed operation, the minimal range of
//! metering intervals it may overlap with a non-zero length. The relaxation
//! oracle reuses it for the window of intervals it currently models.

/// An inclusive range `[first, last]` of metering interval indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IntervalSubset {
    first: usize,
    last: usize,
}

impl IntervalSubset {
    /// # Panics
    ///
    /// In debug builds, panics if `first > last`.
    #[inline]
    pub fn new(first: usize, last: usize) -> Self {
        debug_assert!(
            first <= last,
            "called `IntervalSubset::new` with first > last: {} > {}",
            first,
            last
        );
        Self { first, last }
    }

    #[inline]
    pub fn first(&self) -> usize {
        self.first
    }

    #[inline]
    pub fn last(&self) -> usize {
        self.last
    }

    /// Number of intervals in the subset.
    #[inline]
    pub fn count(&self) -> usize {
        self.last - self.first + 1
    }

    #[inline]
    pub fn contains(&self, interval: usize) -> bool {
        self.first <= interval && interval <= self.last
    }

    /// Start time of the first interval.
    #[inline]
    pub fn horizon_start(&self, metering_interval_length: i64) -> i64 {
        self.first as i64 * metering_interval_length
    }

    /// End time of the last interval, `(last + 1) * length`.
    #[inline]
    pub fn horizon_end(&self, metering_interval_length: i64) -> i64 {
        (self.last as i64 + 1) * metering_interval_length
    }

    /// All interval indices in ascending order.
    #[inline]
    pub fn iter(&self) -> std::ops::RangeInclusive<usize> {
        self.first..=self.last
    }

    /// The intervals strictly between `first` and `last`.
    #[inline]
    pub fn inner(&self) -> std::ops::Range<usize> {
        (self.first + 1)..self.last
    }

    /// The subset with one more interval appended at the end.
    #[inline]
    pub fn extended(&self) -> Self {
        Self::new(self.first, self.last + 1)
    }
}

impl std::fmt::Display for IntervalSubset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.first, self.last)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_and_horizon() {
        let s = IntervalSubset::new(2, 4);
        assert_eq!(s.count(), 3);
        assert_eq!(s.horizon_start(50), 100);
        assert_eq!(s.horizon_end(50), 250);
        assert!(s.contains(3));
        assert!(!s.contains(5));
    }

    #[test]
    fn test_inner_intervals() {
        assert_eq!(IntervalSubset::new(1, 4).inner().collect::<Vec<_>>(), vec![2, 3]);
        assert_eq!(IntervalSubset::new(1, 2).inner().count(), 0);
        assert_eq!(IntervalSubset::new(3, 3).inner().count(), 0);
    }

    #[test]
    fn test_extended_and_display() {
        let s = IntervalSubset::new(0, 0).extended();
        assert_eq!(s, IntervalSubset::new(0, 1));
        assert_eq!(format!("{}", s), "[0, 1]");
        assert_eq!(s.iter().collect::<Vec<_>>(), vec![0, 1]);
    }
}
