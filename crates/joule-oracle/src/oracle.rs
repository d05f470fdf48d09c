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

use crate::outcome::OracleOutcome;
use crate::request::OracleRequest;

/// A solver for the overlap relaxation of a partially fixed schedule.
///
/// Implementations must return within `request.time_budget` and always answer
/// with one of the `OracleStatus` values; numerical trouble inside the
/// implementation is reported as a timed-out `NoSolution`.
pub trait RelaxationOracle {
    /// Returns the name of the oracle.
    fn name(&self) -> &str;

    /// Solves the relaxation described by `request`.
    fn solve(&mut self, request: &OracleRequest<'_>) -> OracleOutcome;
}

impl std::fmt::Debug for dyn RelaxationOracle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RelaxationOracle({})", self.name())
    }
}
