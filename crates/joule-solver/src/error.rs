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

use joule_model::feasibility::FeasibilityStatus;
use joule_model::index::JobIndex;
use joule_model::start_times::StartTimesError;

/// A configuration that cannot be run. Detected before any search starts.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("unknown solver kind `{0}`")]
    UnknownSolverKind(String),
    #[error("{solver} only supports single-operation jobs, but {job} has several operations")]
    MultiOperationJobsUnsupported { solver: String, job: JobIndex },
    #[error("{solver} produces integral start times only")]
    ContinuousStartTimesUnsupported { solver: String },
    #[error("{solver} requires initial start times")]
    MissingInitialStartTimes { solver: String },
    #[error("invalid start times: {0}")]
    InvalidStartTimes(#[from] StartTimesError),
    #[error("initial start times are infeasible: {0}")]
    InfeasibleInitialStartTimes(FeasibilityStatus),
    #[error("the fixed order must give every operation exactly one start time")]
    InvalidFixedOrder,
}
