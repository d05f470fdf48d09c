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

//! # Joule Oracle
//!
//! Relaxation oracle for branch-and-bound over metering-interval windows.
//!
//! Given operations that are *fixed* to an `IntervalSubset` and operations
//! that are still free, the oracle models the schedule by per-interval
//! overlap variables and solves it as an LP (continuous time) or MIP (integer
//! time). It answers three kinds of questions:
//!
//! - is the fixed part alone still feasible,
//! - what is a lower bound on the makespan of any completion,
//! - and, once everything is fixed, what are the optimal start times.
//!
//! Module map
//! - `oracle`: the `RelaxationOracle` trait.
//! - `request`/`outcome`: call contract (`OracleRequest`, `OracleOutcome`).
//! - `window`: the growable metering-interval window and its budgets.
//! - `milp`: `MilpOverlapOracle`, the `good_lp` + HiGHS implementation.

pub mod milp;
pub mod oracle;
pub mod outcome;
pub mod request;
pub mod window;
