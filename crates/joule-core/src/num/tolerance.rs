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

//! Tolerance-aware floating point comparisons.
//!
//! Relaxation objectives and energy budgets are real-valued while time is
//! integral, so every comparison that decides pruning or feasibility goes
//! through a `Tolerance`. Two values closer than `epsilon` compare equal.

/// The absolute tolerance used when none is configured.
pub const DEFAULT_EPSILON: f64 = 1e-6;

/// Absolute-epsilon comparator for `f64` values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    epsilon: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::new(DEFAULT_EPSILON)
    }
}

impl Tolerance {
    /// Creates a comparator with the given absolute epsilon.
    ///
    /// # Panics
    ///
    /// In debug builds, panics if `epsilon` is negative or not finite.
    #[inline]
    pub fn new(epsilon: f64) -> Self {
        debug_assert!(
            epsilon.is_finite() && epsilon >= 0.0,
            "called `Tolerance::new` with invalid epsilon: {}",
            epsilon
        );
        Self { epsilon }
    }

    #[inline]
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    #[inline]
    pub fn approx_eq(&self, a: f64, b: f64) -> bool {
        (a - b).abs() <= self.epsilon
    }

    /// `a < b` by more than epsilon.
    #[inline]
    pub fn less(&self, a: f64, b: f64) -> bool {
        a < b - self.epsilon
    }

    #[inline]
    pub fn less_or_equal(&self, a: f64, b: f64) -> bool {
        a <= b + self.epsilon
    }

    /// `a > b` by more than epsilon.
    #[inline]
    pub fn greater(&self, a: f64, b: f64) -> bool {
        a > b + self.epsilon
    }

    #[inline]
    pub fn greater_or_equal(&self, a: f64, b: f64) -> bool {
        a >= b - self.epsilon
    }

    /// Rounds up to the next integer unless `value` is already integral
    /// within epsilon.
    ///
    /// Values slightly above an integer are left untouched rather than pushed
    /// to the next one; callers compare the result with this same tolerance.
    #[inline]
    pub fn ceil(&self, value: f64) -> f64 {
        if self.greater(value, value.floor()) {
            value.ceil()
        } else {
            value
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comparisons_respect_epsilon() {
        let t = Tolerance::new(1e-6);
        assert!(t.approx_eq(1.0, 1.0 + 1e-7));
        assert!(!t.approx_eq(1.0, 1.0 + 1e-5));
        assert!(t.less(1.0, 1.1));
        assert!(!t.less(1.0, 1.0 + 1e-7));
        assert!(t.less_or_equal(1.0 + 1e-7, 1.0));
        assert!(t.greater(1.1, 1.0));
        assert!(!t.greater(1.0 + 1e-7, 1.0));
        assert!(t.greater_or_equal(1.0 - 1e-7, 1.0));
    }

    #[test]
    fn test_ceil_ignores_noise_above_integer() {
        let t = Tolerance::default();
        assert_eq!(t.ceil(19.2), 20.0);
        assert_eq!(t.ceil(19.9999999), 20.0);
        assert_eq!(t.ceil(20.0), 20.0);
        assert_eq!(t.ceil(20.0000001), 20.0000001);
    }
}
