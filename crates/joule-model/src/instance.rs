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

//! Instances, jobs and operations.
//!
//! An `Instance` is immutable once built. It is assembled through
//! `InstanceBuilder`, which validates every input eagerly and reports the
//! first problem as an `InstanceError`.
//!
//! Metering interval `i` spans `[i * len, (i + 1) * len)` where `len` is the
//! metering interval length; the horizon is always a multiple of `len`.

use crate::index::{JobIndex, MachineIndex, OperationIndex};
use joule_core::math::overlap::{ceil_div, overlap_length};

/// A single operation of a job, processed on one machine without preemption.
///
/// Equality and hashing only consider the identity `id`.
#[derive(Debug, Clone)]
pub struct Operation {
    id: OperationIndex,
    index: usize,
    job_index: JobIndex,
    machine_index: MachineIndex,
    processing_time: i64,
    power_consumption: f64,
}

impl PartialEq for Operation {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Operation {}

impl std::hash::Hash for Operation {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl Operation {
    #[inline]
    pub fn id(&self) -> OperationIndex {
        self.id
    }

    /// Position of the operation within its job.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    #[inline]
    pub fn job_index(&self) -> JobIndex {
        self.job_index
    }

    #[inline]
    pub fn machine_index(&self) -> MachineIndex {
        self.machine_index
    }

    #[inline]
    pub fn processing_time(&self) -> i64 {
        self.processing_time
    }

    #[inline]
    pub fn power_consumption(&self) -> f64 {
        self.power_consumption
    }

    /// Energy drawn over the whole processing time.
    #[inline]
    pub fn total_energy(&self) -> f64 {
        self.processing_time as f64 * self.power_consumption
    }

    /// Upper bound on the number of consecutive metering intervals the
    /// operation can overlap with a non-zero length.
    #[inline]
    pub fn max_num_nonzero_overlap_intervals(&self, metering_interval_length: i64) -> usize {
        ceil_div(self.processing_time, metering_interval_length) as usize + 1
    }

    /// Overlap of the operation started at `start` with metering interval `interval`.
    #[inline]
    pub fn overlap_with_interval(
        &self,
        start: f64,
        interval: usize,
        metering_interval_length: i64,
    ) -> f64 {
        let len = metering_interval_length as f64;
        let interval_start = interval as f64 * len;
        overlap_length(
            start,
            start + self.processing_time as f64,
            interval_start,
            interval_start + len,
        )
    }

    /// The metering intervals with a non-zero overlap when started at `start`,
    /// together with the overlap length.
    ///
    /// Intervals are yielded in ascending order; at most
    /// `max_num_nonzero_overlap_intervals` of them are produced.
    pub fn nonzero_overlaps(
        &self,
        start: f64,
        metering_interval_length: i64,
    ) -> impl Iterator<Item = (usize, f64)> + '_ {
        let first = if start <= 0.0 {
            0
        } else {
            (start / metering_interval_length as f64).floor() as usize
        };
        (first..first + self.max_num_nonzero_overlap_intervals(metering_interval_length))
            .map(move |i| (i, self.overlap_with_interval(start, i, metering_interval_length)))
            .filter(|&(_, overlap)| overlap > 0.0)
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Operation(id: {}, job: {}, index: {}, machine: {}, p: {}, power: {})",
            self.id.get(),
            self.job_index.get(),
            self.index,
            self.machine_index.get(),
            self.processing_time,
            self.power_consumption
        )
    }
}

/// An ordered chain of operations; operation `i + 1` may not start before
/// operation `i` completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    index: JobIndex,
    operations: Vec<OperationIndex>,
}

impl Job {
    #[inline]
    pub fn index(&self) -> JobIndex {
        self.index
    }

    /// Identities of the job's operations in precedence order.
    #[inline]
    pub fn operations(&self) -> &[OperationIndex] {
        &self.operations
    }

    #[inline]
    pub fn num_operations(&self) -> usize {
        self.operations.len()
    }
}

/// Errors reported by `InstanceBuilder::build`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InstanceError {
    #[error("metering interval length must be positive, got {0}")]
    NonPositiveMeteringIntervalLength(i64),
    #[error("horizon must be non-negative, got {0}")]
    NegativeHorizon(i64),
    #[error("horizon {horizon} is not divisible by metering interval length {length}")]
    HorizonNotDivisibleByMeteringIntervalLength { horizon: i64, length: i64 },
    #[error("energy limit must be finite and non-negative, got {0}")]
    InvalidEnergyLimit(f64),
    #[error("{job} operation {position} uses {machine}, but the instance has {num_machines} machines")]
    UnknownMachine {
        job: JobIndex,
        position: usize,
        machine: MachineIndex,
        num_machines: usize,
    },
    #[error("{job} operation {position} has negative processing time {processing_time}")]
    NegativeProcessingTime {
        job: JobIndex,
        position: usize,
        processing_time: i64,
    },
    #[error("{job} operation {position} has invalid power consumption {power}")]
    InvalidPowerConsumption {
        job: JobIndex,
        position: usize,
        power: f64,
    },
}

/// Specification of one operation handed to the builder:
/// `(machine, processing_time, power_consumption)`.
pub type OperationSpec = (MachineIndex, i64, f64);

/// An immutable scheduling instance.
#[derive(Debug, Clone)]
pub struct Instance {
    num_machines: usize,
    jobs: Vec<Job>,
    operations: Vec<Operation>,
    machine_operations: Vec<Vec<OperationIndex>>,
    energy_limit: f64,
    horizon: i64,
    metering_interval_length: i64,
}

impl Instance {
    /// Assembles an instance from already validated parts.
    pub(crate) fn assemble(
        num_machines: usize,
        jobs: Vec<Vec<OperationSpec>>,
        energy_limit: f64,
        horizon: i64,
        metering_interval_length: i64,
    ) -> Self {
        let total: usize = jobs.iter().map(Vec::len).sum();
        let mut operations = Vec::with_capacity(total);
        let mut machine_operations = vec![Vec::new(); num_machines];
        let mut assembled_jobs = Vec::with_capacity(jobs.len());

        for (j, specs) in jobs.into_iter().enumerate() {
            let job_index = JobIndex::new(j);
            let mut ids = Vec::with_capacity(specs.len());
            for (position, (machine, processing_time, power)) in specs.into_iter().enumerate() {
                let id = OperationIndex::new(operations.len());
                operations.push(Operation {
                    id,
                    index: position,
                    job_index,
                    machine_index: machine,
                    processing_time,
                    power_consumption: power,
                });
                machine_operations[machine.get()].push(id);
                ids.push(id);
            }
            assembled_jobs.push(Job {
                index: job_index,
                operations: ids,
            });
        }

        Self {
            num_machines,
            jobs: assembled_jobs,
            operations,
            machine_operations,
            energy_limit,
            horizon,
            metering_interval_length,
        }
    }

    /// Decomposes the instance into builder-shaped job specifications.
    pub(crate) fn job_specs(&self) -> Vec<Vec<OperationSpec>> {
        self.jobs
            .iter()
            .map(|job| {
                job.operations
                    .iter()
                    .map(|&id| {
                        let op = &self.operations[id.get()];
                        (op.machine_index, op.processing_time, op.power_consumption)
                    })
                    .collect()
            })
            .collect()
    }

    #[inline]
    pub fn num_machines(&self) -> usize {
        self.num_machines
    }

    #[inline]
    pub fn num_jobs(&self) -> usize {
        self.jobs.len()
    }

    #[inline]
    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    /// # Panics
    ///
    /// In debug builds, panics if `job` is out of bounds.
    #[inline]
    pub fn job(&self, job: JobIndex) -> &Job {
        debug_assert!(
            job.get() < self.jobs.len(),
            "called `Instance::job` with job index out of bounds: the len is {} but the index is {}",
            self.jobs.len(),
            job.get()
        );
        &self.jobs[job.get()]
    }

    /// All operations ordered by identity.
    #[inline]
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// # Panics
    ///
    /// In debug builds, panics if `id` is out of bounds.
    #[inline]
    pub fn operation(&self, id: OperationIndex) -> &Operation {
        debug_assert!(
            id.get() < self.operations.len(),
            "called `Instance::operation` with operation index out of bounds: the len is {} but the index is {}",
            self.operations.len(),
            id.get()
        );
        &self.operations[id.get()]
    }

    #[inline]
    pub fn total_num_operations(&self) -> usize {
        self.operations.len()
    }

    /// Operations processed on `machine`, in identity order.
    #[inline]
    pub fn machine_operations(&self, machine: MachineIndex) -> &[OperationIndex] {
        debug_assert!(
            machine.get() < self.num_machines,
            "called `Instance::machine_operations` with machine index out of bounds: the len is {} but the index is {}",
            self.num_machines,
            machine.get()
        );
        &self.machine_operations[machine.get()]
    }

    /// Operations of `job` in precedence order.
    pub fn job_operations(&self, job: JobIndex) -> impl Iterator<Item = &Operation> + '_ {
        self.job(job)
            .operations
            .iter()
            .map(move |&id| &self.operations[id.get()])
    }

    #[inline]
    pub fn energy_limit(&self) -> f64 {
        self.energy_limit
    }

    #[inline]
    pub fn horizon(&self) -> i64 {
        self.horizon
    }

    #[inline]
    pub fn metering_interval_length(&self) -> i64 {
        self.metering_interval_length
    }

    #[inline]
    pub fn num_metering_intervals(&self) -> usize {
        (self.horizon / self.metering_interval_length) as usize
    }

    /// Index of the last metering interval; `0` for an empty horizon.
    #[inline]
    pub fn last_metering_interval_index(&self) -> usize {
        self.num_metering_intervals().saturating_sub(1)
    }

    #[inline]
    pub fn metering_interval_start(&self, interval: usize) -> i64 {
        interval as i64 * self.metering_interval_length
    }

    #[inline]
    pub fn metering_interval_end(&self, interval: usize) -> i64 {
        (interval as i64 + 1) * self.metering_interval_length
    }

    /// Metering interval containing time `t`.
    #[inline]
    pub fn metering_interval_at(&self, t: i64) -> usize {
        debug_assert!(
            t >= 0,
            "called `Instance::metering_interval_at` with negative time {}",
            t
        );
        (t / self.metering_interval_length) as usize
    }

    /// The job predecessor of `operation`, if any.
    pub fn previous_operation(&self, operation: &Operation) -> Option<&Operation> {
        let position = operation.index.checked_sub(1)?;
        let id = self.jobs[operation.job_index.get()].operations[position];
        Some(&self.operations[id.get()])
    }

    /// The job successor of `operation`, if any.
    pub fn next_operation(&self, operation: &Operation) -> Option<&Operation> {
        let id = self.jobs[operation.job_index.get()]
            .operations
            .get(operation.index + 1)?;
        Some(&self.operations[id.get()])
    }

    /// Summed processing time of the operations on `machine`.
    pub fn machine_workload(&self, machine: MachineIndex) -> i64 {
        self.machine_operations(machine)
            .iter()
            .map(|&id| self.operations[id.get()].processing_time)
            .sum()
    }

    /// Energy drawn by all operations together.
    pub fn total_energy(&self) -> f64 {
        self.operations.iter().map(Operation::total_energy).sum()
    }

    /// `true` if no job has more than one operation.
    pub fn has_single_operation_jobs(&self) -> bool {
        self.jobs.iter().all(|job| job.operations.len() <= 1)
    }
}

impl std::fmt::Display for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Instance(machines: {}, jobs: {}, operations: {}, horizon: {}, metering interval: {}, energy limit: {})",
            self.num_machines,
            self.jobs.len(),
            self.operations.len(),
            self.horizon,
            self.metering_interval_length,
            self.energy_limit
        )
    }
}

/// Mutable builder for `Instance`.
///
/// ```rust
/// use joule_model::index::MachineIndex;
/// use joule_model::instance::InstanceBuilder;
///
/// let m0 = MachineIndex::new(0);
/// let mut builder = InstanceBuilder::new(1, 100, 50, 10.0);
/// builder.add_job([(m0, 20, 0.5), (m0, 10, 1.0)]);
/// let instance = builder.build().unwrap();
/// assert_eq!(instance.num_metering_intervals(), 2);
/// assert_eq!(instance.total_num_operations(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct InstanceBuilder {
    num_machines: usize,
    horizon: i64,
    metering_interval_length: i64,
    energy_limit: f64,
    jobs: Vec<Vec<OperationSpec>>,
}

impl InstanceBuilder {
    pub fn new(
        num_machines: usize,
        horizon: i64,
        metering_interval_length: i64,
        energy_limit: f64,
    ) -> Self {
        Self {
            num_machines,
            horizon,
            metering_interval_length,
            energy_limit,
            jobs: Vec::new(),
        }
    }

    /// Appends a job made of the given operations, in precedence order.
    pub fn add_job<I>(&mut self, operations: I) -> JobIndex
    where
        I: IntoIterator<Item = OperationSpec>,
    {
        let index = JobIndex::new(self.jobs.len());
        self.jobs.push(operations.into_iter().collect());
        index
    }

    #[inline]
    pub fn num_jobs(&self) -> usize {
        self.jobs.len()
    }

    /// Validates the collected data and builds the instance.
    pub fn build(self) -> Result<Instance, InstanceError> {
        if self.metering_interval_length <= 0 {
            return Err(InstanceError::NonPositiveMeteringIntervalLength(
                self.metering_interval_length,
            ));
        }
        if self.horizon < 0 {
            return Err(InstanceError::NegativeHorizon(self.horizon));
        }
        if self.horizon % self.metering_interval_length != 0 {
            return Err(
                InstanceError::HorizonNotDivisibleByMeteringIntervalLength {
                    horizon: self.horizon,
                    length: self.metering_interval_length,
                },
            );
        }
        if !self.energy_limit.is_finite() || self.energy_limit < 0.0 {
            return Err(InstanceError::InvalidEnergyLimit(self.energy_limit));
        }

        for (j, specs) in self.jobs.iter().enumerate() {
            let job = JobIndex::new(j);
            for (position, &(machine, processing_time, power)) in specs.iter().enumerate() {
                if machine.get() >= self.num_machines {
                    return Err(InstanceError::UnknownMachine {
                        job,
                        position,
                        machine,
                        num_machines: self.num_machines,
                    });
                }
                if processing_time < 0 {
                    return Err(InstanceError::NegativeProcessingTime {
                        job,
                        position,
                        processing_time,
                    });
                }
                if !power.is_finite() || power < 0.0 {
                    return Err(InstanceError::InvalidPowerConsumption {
                        job,
                        position,
                        power,
                    });
                }
            }
        }

        Ok(Instance::assemble(
            self.num_machines,
            self.jobs,
            self.energy_limit,
            self.horizon,
            self.metering_interval_length,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(i: usize) -> MachineIndex {
        MachineIndex::new(i)
    }

    fn two_job_instance() -> Instance {
        let mut b = InstanceBuilder::new(2, 300, 100, 50.0);
        b.add_job([(m(0), 30, 1.0), (m(1), 150, 0.5)]);
        b.add_job([(m(1), 40, 2.0)]);
        b.build().unwrap()
    }

    #[test]
    fn test_builder_assigns_dense_identities() {
        let instance = two_job_instance();
        assert_eq!(instance.total_num_operations(), 3);
        assert_eq!(instance.num_jobs(), 2);
        let ids: Vec<usize> = instance.operations().iter().map(|o| o.id().get()).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert_eq!(
            instance.machine_operations(m(1)),
            &[OperationIndex::new(1), OperationIndex::new(2)]
        );
        assert_eq!(instance.machine_workload(m(1)), 190);
    }

    #[test]
    fn test_metering_interval_arithmetic() {
        let instance = two_job_instance();
        assert_eq!(instance.num_metering_intervals(), 3);
        assert_eq!(instance.last_metering_interval_index(), 2);
        assert_eq!(instance.metering_interval_start(1), 100);
        assert_eq!(instance.metering_interval_end(1), 200);
        assert_eq!(instance.metering_interval_at(199), 1);
        assert_eq!(instance.metering_interval_at(200), 2);
    }

    #[test]
    fn test_previous_and_next_operation() {
        let instance = two_job_instance();
        let first = instance.operation(OperationIndex::new(0));
        let second = instance.operation(OperationIndex::new(1));
        assert_eq!(instance.next_operation(first), Some(second));
        assert_eq!(instance.previous_operation(second), Some(first));
        assert!(instance.previous_operation(first).is_none());
        assert!(instance.next_operation(second).is_none());
        assert!(!instance.has_single_operation_jobs());
    }

    #[test]
    fn test_nonzero_overlaps_of_spanning_operation() {
        let instance = two_job_instance();
        let op = instance.operation(OperationIndex::new(1));
        assert_eq!(op.max_num_nonzero_overlap_intervals(100), 3);
        let overlaps: Vec<(usize, f64)> = op.nonzero_overlaps(80.0, 100).collect();
        assert_eq!(overlaps, vec![(0, 20.0), (1, 100.0), (2, 30.0)]);
        let aligned: Vec<(usize, f64)> = op.nonzero_overlaps(100.0, 100).collect();
        assert_eq!(aligned, vec![(1, 100.0), (2, 50.0)]);
    }

    #[test]
    fn test_operation_equality_uses_identity_only() {
        let instance = two_job_instance();
        let a = instance.operation(OperationIndex::new(0)).clone();
        let b = instance.operation(OperationIndex::new(0));
        assert_eq!(&a, b);
        assert_ne!(&a, instance.operation(OperationIndex::new(2)));
    }

    #[test]
    fn test_builder_rejects_indivisible_horizon() {
        let b = InstanceBuilder::new(1, 250, 100, 1.0);
        assert_eq!(
            b.build().unwrap_err(),
            InstanceError::HorizonNotDivisibleByMeteringIntervalLength {
                horizon: 250,
                length: 100
            }
        );
    }

    #[test]
    fn test_builder_rejects_invalid_operations() {
        let mut b = InstanceBuilder::new(1, 100, 100, 1.0);
        b.add_job([(m(1), 10, 1.0)]);
        assert!(matches!(
            b.build(),
            Err(InstanceError::UnknownMachine { position: 0, .. })
        ));

        let mut b = InstanceBuilder::new(1, 100, 100, 1.0);
        b.add_job([(m(0), -1, 1.0)]);
        assert!(matches!(
            b.build(),
            Err(InstanceError::NegativeProcessingTime { processing_time: -1, .. })
        ));

        let mut b = InstanceBuilder::new(1, 100, 100, 1.0);
        b.add_job([(m(0), 5, f64::NAN)]);
        assert!(matches!(
            b.build(),
            Err(InstanceError::InvalidPowerConsumption { .. })
        ));

        assert!(matches!(
            InstanceBuilder::new(1, 100, 0, 1.0).build(),
            Err(InstanceError::NonPositiveMeteringIntervalLength(0))
        ));
        assert!(matches!(
            InstanceBuilder::new(1, 100, 100, -1.0).build(),
            Err(InstanceError::InvalidEnergyLimit(_))
        ));
    }
}
