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

//! # Strongly Typed Indices
//!
//! Phantom-typed wrappers around `usize` that keep index spaces apart.
//! Machines, jobs and operations are all addressed by dense integers, and
//! swapping one for another is the classic scheduling bug. `TypedIndex<T>`
//! carries a tag type `T: TypedIndexTag` whose `NAME` is used for
//! `Display`/`Debug` and compiles down to a plain `usize`.
//!
//! ## Usage
//!
//! ```rust
//! use joule_core::utils::index::{TypedIndex, TypedIndexTag};
//!
//! #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
//! struct MachineTag;
//! impl TypedIndexTag for MachineTag { const NAME: &'static str = "MachineIndex"; }
//!
//! type MachineIndex = TypedIndex<MachineTag>;
//! let m = MachineIndex::new(3);
//! assert_eq!(m.get(), 3);
//! assert_eq!(format!("{}", m), "MachineIndex(3)");
//! ```

/// A tag naming an index space.
pub trait TypedIndexTag: Clone {
    const NAME: &'static str;
}

/// A `usize` index bound to the index space `T`.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypedIndex<T> {
    index: usize,
    _marker: std::marker::PhantomData<T>,
}

impl<T> TypedIndex<T> {
    /// Creates a new index.
    #[inline(always)]
    pub const fn new(index: usize) -> Self {
        Self {
            index,
            _marker: std::marker::PhantomData,
        }
    }

    /// Returns the underlying `usize`.
    #[inline(always)]
    pub const fn get(&self) -> usize {
        self.index
    }

    /// Returns `true` if this is the first index of its space.
    #[inline(always)]
    pub const fn is_zero(&self) -> bool {
        self.index == 0
    }

    /// Returns the index directly after this one.
    #[inline(always)]
    pub const fn next(&self) -> Self {
        Self::new(self.index + 1)
    }
}

impl<T: TypedIndexTag> std::fmt::Debug for TypedIndex<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", T::NAME, self.index)
    }
}

impl<T: TypedIndexTag> std::fmt::Display for TypedIndex<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", T::NAME, self.index)
    }
}

impl<T> From<usize> for TypedIndex<T> {
    #[inline(always)]
    fn from(index: usize) -> Self {
        Self::new(index)
    }
}

impl<T> From<TypedIndex<T>> for usize {
    #[inline(always)]
    fn from(index: TypedIndex<T>) -> Self {
        index.index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
    struct JobTag;
    impl TypedIndexTag for JobTag {
        const NAME: &'static str = "JobIndex";
    }
    type JobIndex = TypedIndex<JobTag>;

    #[test]
    fn test_new_get_and_next() {
        let j = JobIndex::new(4);
        assert_eq!(j.get(), 4);
        assert_eq!(j.next().get(), 5);
        assert!(!j.is_zero());
        assert!(JobIndex::new(0).is_zero());
    }

    #[test]
    fn test_display_and_debug_use_tag_name() {
        let j = JobIndex::new(7);
        assert_eq!(format!("{}", j), "JobIndex(7)");
        assert_eq!(format!("{:?}", j), "JobIndex(7)");
    }

    #[test]
    fn test_conversions_and_ordering() {
        let j: JobIndex = 2usize.into();
        let raw: usize = j.into();
        assert_eq!(raw, 2);
        assert!(JobIndex::new(1) < JobIndex::new(2));
    }
}
