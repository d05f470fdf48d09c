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

//! # Joule Solver
//!
//! Entry point for energy-limited makespan scheduling. A `solver::Solver`
//! combines a `kind::SolverKind` with a `config::SolverConfig`, validates
//! both against the instance before any work starts and returns a
//! `solver::SolverResult`.
//!
//! Solver kinds
//! - `BranchAndBound`: exact search over metering-interval windows
//!   (`joule_bnb`), bounded by the HiGHS-backed relaxation oracle.
//! - `GreedyRepair(rule)`: list scheduling that shifts operations right until
//!   every metering interval respects the energy limit.
//!
//! Module map
//! - `config`: run parameters.
//! - `error`: `ConfigurationError`.
//! - `kind`: solver variants, parsing and eager checks.
//! - `repair`: the greedy repair heuristic.
//! - `solver`: `Solver` and `SolverResult`.

pub mod config;
pub mod error;
pub mod kind;
pub mod repair;
pub mod solver;
