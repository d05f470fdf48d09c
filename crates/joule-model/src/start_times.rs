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

//! Schedules as start times.
//!
//! `StartTimes` maps operations to real-valued start times. The makespan is
//! cached and recomputed lazily after any mutation, since solvers query it far
//! more often than they change a schedule.
//!
//! `IndexedStartTime` is the position-based form used at the boundary to
//! callers that address operations by `(job, position)`.

use crate::index::{JobIndex, MachineIndex, OperationIndex};
use crate::instance::{Instance, Operation};
use std::cell::Cell;

/// Start time of the operation at `operation_index` within job `job_index`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexedStartTime {
    pub job_index: JobIndex,
    pub operation_index: usize,
    pub start_time: f64,
}

impl IndexedStartTime {
    #[inline]
    pub fn new(job_index: JobIndex, operation_index: usize, start_time: f64) -> Self {
        Self {
            job_index,
            operation_index,
            start_time,
        }
    }
}

/// Errors raised when converting indexed start times.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StartTimesError {
    #[error("unknown job {0}")]
    UnknownJob(JobIndex),
    #[error("{job} has no operation at position {position}")]
    UnknownOperation { job: JobIndex, position: usize },
}

/// Start times of (a subset of) the operations of an instance.
#[derive(Debug, Clone)]
pub struct StartTimes {
    starts: Vec<Option<f64>>,
    completions: Vec<f64>,
    num_assigned: usize,
    makespan: Cell<Option<f64>>,
}

impl PartialEq for StartTimes {
    fn eq(&self, other: &Self) -> bool {
        self.starts == other.starts
    }
}

impl StartTimes {
    /// Creates an empty schedule for `num_operations` operations.
    pub fn new(num_operations: usize) -> Self {
        Self {
            starts: vec![None; num_operations],
            completions: vec![0.0; num_operations],
            num_assigned: 0,
            makespan: Cell::new(Some(0.0)),
        }
    }

    /// Creates an empty schedule sized for `instance`.
    #[inline]
    pub fn for_instance(instance: &Instance) -> Self {
        Self::new(instance.total_num_operations())
    }

    /// Builds a schedule from position-based start times.
    pub fn from_indexed(
        instance: &Instance,
        indexed: &[IndexedStartTime],
    ) -> Result<Self, StartTimesError> {
        let mut start_times = Self::for_instance(instance);
        for entry in indexed {
            let job = instance
                .jobs()
                .get(entry.job_index.get())
                .ok_or(StartTimesError::UnknownJob(entry.job_index))?;
            let id = job.operations().get(entry.operation_index).ok_or(
                StartTimesError::UnknownOperation {
                    job: entry.job_index,
                    position: entry.operation_index,
                },
            )?;
            start_times.set(instance.operation(*id), entry.start_time);
        }
        Ok(start_times)
    }

    /// Position-based view of the assigned start times, in identity order.
    pub fn to_indexed(&self, instance: &Instance) -> Vec<IndexedStartTime> {
        self.iter()
            .map(|(id, start)| {
                let op = instance.operation(id);
                IndexedStartTime::new(op.job_index(), op.index(), start)
            })
            .collect()
    }

    /// Total number of operations this schedule has room for.
    #[inline]
    pub fn num_operations(&self) -> usize {
        self.starts.len()
    }

    /// Number of operations with a start time.
    #[inline]
    pub fn len(&self) -> usize {
        self.num_assigned
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.num_assigned == 0
    }

    /// `true` if every operation has a start time.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.num_assigned == self.starts.len()
    }

    #[inline]
    pub fn contains(&self, id: OperationIndex) -> bool {
        self.starts.get(id.get()).is_some_and(Option::is_some)
    }

    #[inline]
    pub fn get(&self, id: OperationIndex) -> Option<f64> {
        self.starts.get(id.get()).copied().flatten()
    }

    /// Sets the start time of `operation`, replacing any previous one.
    ///
    /// # Panics
    ///
    /// In debug builds, panics if the operation does not fit this schedule.
    pub fn set(&mut self, operation: &Operation, start: f64) {
        let i = operation.id().get();
        debug_assert!(
            i < self.starts.len(),
            "called `StartTimes::set` with operation index out of bounds: the len is {} but the index is {}",
            self.starts.len(),
            i
        );
        if self.starts[i].is_none() {
            self.num_assigned += 1;
        }
        self.starts[i] = Some(start);
        self.completions[i] = start + operation.processing_time() as f64;
        self.makespan.set(None);
    }

    /// Removes the start time of `id`, returning it.
    pub fn remove(&mut self, id: OperationIndex) -> Option<f64> {
        let previous = self.starts.get_mut(id.get())?.take();
        if previous.is_some() {
            self.num_assigned -= 1;
            self.makespan.set(None);
        }
        previous
    }

    /// Latest completion time over all assigned operations; `0` when empty.
    pub fn makespan(&self) -> f64 {
        if let Some(makespan) = self.makespan.get() {
            return makespan;
        }
        let makespan = self
            .starts
            .iter()
            .zip(&self.completions)
            .filter(|(start, _)| start.is_some())
            .map(|(_, &completion)| completion)
            .fold(0.0, f64::max);
        self.makespan.set(Some(makespan));
        makespan
    }

    /// Assigned `(operation, start)` pairs in identity order.
    pub fn iter(&self) -> impl Iterator<Item = (OperationIndex, f64)> + '_ {
        self.starts
            .iter()
            .enumerate()
            .filter_map(|(i, start)| start.map(|s| (OperationIndex::new(i), s)))
    }

    /// For every machine, its scheduled operations sorted by start time.
    pub fn ordered_operations_on_machines(&self, instance: &Instance) -> Vec<Vec<OperationIndex>> {
        (0..instance.num_machines())
            .map(|m| {
                let mut ops: Vec<(f64, OperationIndex)> = instance
                    .machine_operations(MachineIndex::new(m))
                    .iter()
                    .filter_map(|&id| self.get(id).map(|s| (s, id)))
                    .collect();
                ops.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
                ops.into_iter().map(|(_, id)| id).collect()
            })
            .collect()
    }
}

impl std::fmt::Display for StartTimes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "StartTimes(makespan: {}, [", self.makespan())?;
        for (n, (id, start)) in self.iter().enumerate() {
            if n > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", id.get(), start)?;
        }
        write!(f, "])")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::InstanceBuilder;

    fn instance() -> Instance {
        let m0 = MachineIndex::new(0);
        let m1 = MachineIndex::new(1);
        let mut b = InstanceBuilder::new(2, 100, 50, 10.0);
        b.add_job([(m0, 10, 1.0), (m1, 20, 1.0)]);
        b.add_job([(m0, 5, 1.0)]);
        b.build().unwrap()
    }

    #[test]
    fn test_makespan_is_recomputed_after_mutation() {
        let inst = instance();
        let mut st = StartTimes::for_instance(&inst);
        assert_eq!(st.makespan(), 0.0);

        st.set(inst.operation(OperationIndex::new(0)), 0.0);
        st.set(inst.operation(OperationIndex::new(1)), 10.0);
        assert_eq!(st.makespan(), 30.0);

        st.set(inst.operation(OperationIndex::new(1)), 40.0);
        assert_eq!(st.makespan(), 60.0);

        assert_eq!(st.remove(OperationIndex::new(1)), Some(40.0));
        assert_eq!(st.makespan(), 10.0);
        assert_eq!(st.len(), 1);
        assert!(!st.is_complete());
    }

    #[test]
    fn test_indexed_conversion() {
        let inst = instance();
        let indexed = vec![
            IndexedStartTime::new(JobIndex::new(0), 0, 0.0),
            IndexedStartTime::new(JobIndex::new(0), 1, 10.0),
            IndexedStartTime::new(JobIndex::new(1), 0, 10.0),
        ];
        let st = StartTimes::from_indexed(&inst, &indexed).unwrap();
        assert!(st.is_complete());
        assert_eq!(st.get(OperationIndex::new(2)), Some(10.0));
        assert_eq!(st.to_indexed(&inst), indexed);
    }

    #[test]
    fn test_indexed_conversion_rejects_unknown_positions() {
        let inst = instance();
        let bad_job = [IndexedStartTime::new(JobIndex::new(5), 0, 0.0)];
        assert_eq!(
            StartTimes::from_indexed(&inst, &bad_job),
            Err(StartTimesError::UnknownJob(JobIndex::new(5)))
        );
        let bad_op = [IndexedStartTime::new(JobIndex::new(1), 1, 0.0)];
        assert_eq!(
            StartTimes::from_indexed(&inst, &bad_op),
            Err(StartTimesError::UnknownOperation {
                job: JobIndex::new(1),
                position: 1
            })
        );
    }

    #[test]
    fn test_ordered_operations_on_machines() {
        let inst = instance();
        let mut st = StartTimes::for_instance(&inst);
        st.set(inst.operation(OperationIndex::new(0)), 5.0);
        st.set(inst.operation(OperationIndex::new(2)), 0.0);
        st.set(inst.operation(OperationIndex::new(1)), 15.0);
        let ordered = st.ordered_operations_on_machines(&inst);
        assert_eq!(
            ordered[0],
            vec![OperationIndex::new(2), OperationIndex::new(0)]
        );
        assert_eq!(ordered[1], vec![OperationIndex::new(1)]);
    }
}
