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

//! # Joule Model
//!
//! **The domain model of energy-limited makespan scheduling.**
//!
//! A set of jobs, each an ordered chain of operations pinned to machines, has
//! to be scheduled within a horizon that is cut into metering intervals of
//! equal length. Within every metering interval the summed
//! `overlap * power` of all operations must stay below a shared energy limit.
//!
//! ## Architecture
//!
//! * **`index`**: strongly typed `MachineIndex`, `JobIndex` and `OperationIndex`.
//! * **`instance`**: `Operation`, `Job`, the immutable `Instance` and its
//!   validating `InstanceBuilder`.
//! * **`transform`**: instance rewrites (clamping, flooring, relaxing limits).
//! * **`subset`**: `IntervalSubset`, a contiguous range of metering intervals.
//! * **`start_times`**: the `StartTimes` schedule with a lazily cached makespan.
//! * **`energy`**: per-interval energy consumption of a schedule.
//! * **`feasibility`**: the `FeasibilityChecker` used to verify schedules.
//!
//! ## Design Philosophy
//!
//! 1.  **Fail-Fast**: the builder rejects malformed instances, so solvers can
//!     rely on `horizon % metering_interval_length == 0`.
//! 2.  **Flat Storage**: operations live in one vector addressed by
//!     `OperationIndex`; jobs and machines hold index lists into it.

pub mod energy;
pub mod feasibility;
pub mod index;
pub mod instance;
pub mod start_times;
pub mod subset;
pub mod transform;
