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

//! Joule-BnB: branch-and-bound for makespan scheduling under energy limits
//!
//! Schedules single-operation jobs on parallel machines so that the energy
//! drawn in every metering interval stays below a common limit, minimizing
//! the makespan. The tree branches on *which metering intervals* an operation
//! overlaps, never on start times; a `joule_oracle::oracle::RelaxationOracle`
//! bounds inner nodes and turns complete window assignments into start times.
//!
//! Core flow
//! - Build a `joule_model::instance::Instance`.
//! - Pick a relaxation oracle (usually `joule_oracle::milp::MilpOverlapOracle`).
//! - Configure `bnb::BnbSolver` (time limit, granularity, branching rule).
//! - Run `solve` or `solve_with_incumbent` with a monitor.
//!
//! Design highlights
//! - `partial::PartialSolution` is mutated in place; every push is undone
//!   exactly from a trail of saved budget values.
//! - Bounds are monotone along every path of the tree.
//! - Monitors observe each step and can stop the run.
//!
//! Module map
//! - `bnb`: the solver and its search session.
//! - `branching`: which operations a node branches on.
//! - `enumerate`: candidate windows of an operation.
//! - `partial`: node state with push/pop.
//! - `monitor`: tree-search monitors (log, composite, interrupt).
//! - `result`/`stats`: outcomes and counters.

pub mod bnb;
pub mod branching;
pub mod enumerate;
pub mod monitor;
pub mod partial;
pub mod result;
pub mod stats;
mod trail;
