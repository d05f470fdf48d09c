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

//! Overlap arithmetic on closed-open spans.
//!
//! An operation started at `s` with processing time `p` occupies `[s, s + p)`;
//! metering interval `i` spans `[i * len, (i + 1) * len)`. Their overlap is the
//! length of the intersection, or zero when they are disjoint.

use num_traits::{Num, PrimInt};

/// Length of the intersection of `[a_start, a_end)` and `[b_start, b_end)`.
///
/// # Examples
///
/// ```rust
/// use joule_core::math::overlap::overlap_length;
///
/// assert_eq!(overlap_length(5, 15, 0, 10), 5);
/// assert_eq!(overlap_length(10.0, 20.0, 0.0, 10.0), 0.0);
/// ```
#[inline]
pub fn overlap_length<T>(a_start: T, a_end: T, b_start: T, b_end: T) -> T
where
    T: Num + PartialOrd + Copy,
{
    let start = if a_start > b_start { a_start } else { b_start };
    let end = if a_end < b_end { a_end } else { b_end };
    if end > start { end - start } else { T::zero() }
}

/// Integer division rounding towards positive infinity.
///
/// # Panics
///
/// In debug builds, panics if `divisor` is not positive or `dividend` is negative.
#[inline]
pub fn ceil_div<T>(dividend: T, divisor: T) -> T
where
    T: PrimInt,
{
    debug_assert!(
        divisor > T::zero(),
        "called `ceil_div` with non-positive divisor"
    );
    debug_assert!(
        dividend >= T::zero(),
        "called `ceil_div` with negative dividend"
    );
    let q = dividend / divisor;
    if q * divisor == dividend {
        q
    } else {
        q + T::one()
    }
}
