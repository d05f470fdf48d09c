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

//! Instance rewrites.
//!
//! Each transform returns a new `Instance` and leaves the input untouched.
//! Transforms that keep the job structure also keep every `OperationIndex`,
//! so schedules of the transformed instance can be read against the original.

use crate::index::MachineIndex;
use crate::instance::{Instance, OperationSpec};

impl Instance {
    fn map_operations<F>(&self, mut f: F) -> Instance
    where
        F: FnMut(OperationSpec) -> OperationSpec,
    {
        let jobs = self
            .job_specs()
            .into_iter()
            .map(|specs| specs.into_iter().map(&mut f).collect())
            .collect();
        Instance::assemble(
            self.num_machines(),
            jobs,
            self.energy_limit(),
            self.horizon(),
            self.metering_interval_length(),
        )
    }

    /// Caps every processing time at `max_processing_time`.
    pub fn clamp_processing_times(&self, max_processing_time: i64) -> Instance {
        debug_assert!(
            max_processing_time >= 0,
            "called `Instance::clamp_processing_times` with negative maximum {}",
            max_processing_time
        );
        self.map_operations(|(machine, p, power)| (machine, p.min(max_processing_time), power))
    }

    /// Rounds every power consumption down to an integer.
    pub fn floor_power_consumption(&self) -> Instance {
        self.map_operations(|(machine, p, power)| (machine, p, power.floor()))
    }

    /// Moves every operation onto a single machine.
    pub fn single_machine(&self) -> Instance {
        let jobs = self
            .job_specs()
            .into_iter()
            .map(|specs| {
                specs
                    .into_iter()
                    .map(|(_, p, power)| (MachineIndex::new(0), p, power))
                    .collect()
            })
            .collect();
        Instance::assemble(
            1,
            jobs,
            self.energy_limit(),
            self.horizon(),
            self.metering_interval_length(),
        )
    }

    /// Splits every operation into a job of its own, dropping precedence.
    ///
    /// Operation identities are preserved because jobs are expanded in order.
    pub fn single_operation_jobs(&self) -> Instance {
        let jobs = self
            .job_specs()
            .into_iter()
            .flatten()
            .map(|spec| vec![spec])
            .collect();
        Instance::assemble(
            self.num_machines(),
            jobs,
            self.energy_limit(),
            self.horizon(),
            self.metering_interval_length(),
        )
    }

    /// Replaces the energy limit by one that no schedule can exceed.
    pub fn without_energy_limits(&self) -> Instance {
        Instance::assemble(
            self.num_machines(),
            self.job_specs(),
            self.total_energy() + 1.0,
            self.horizon(),
            self.metering_interval_length(),
        )
    }
}

#[cfg(test)]
mod tests {
    use crate::index::{MachineIndex, OperationIndex};
    use crate::instance::{Instance, InstanceBuilder};

    fn instance() -> Instance {
        let m0 = MachineIndex::new(0);
        let m1 = MachineIndex::new(1);
        let mut b = InstanceBuilder::new(2, 200, 100, 7.0);
        b.add_job([(m0, 120, 1.5), (m1, 30, 2.7)]);
        b.add_job([(m1, 10, 0.2)]);
        b.build().unwrap()
    }

    #[test]
    fn test_clamp_and_floor() {
        let clamped = instance().clamp_processing_times(50);
        let ps: Vec<i64> = clamped.operations().iter().map(|o| o.processing_time()).collect();
        assert_eq!(ps, vec![50, 30, 10]);

        let floored = instance().floor_power_consumption();
        let powers: Vec<f64> = floored.operations().iter().map(|o| o.power_consumption()).collect();
        assert_eq!(powers, vec![1.0, 2.0, 0.0]);
    }

    #[test]
    fn test_single_machine() {
        let single = instance().single_machine();
        assert_eq!(single.num_machines(), 1);
        assert_eq!(single.machine_operations(MachineIndex::new(0)).len(), 3);
        assert_eq!(single.num_jobs(), 2);
    }

    #[test]
    fn test_single_operation_jobs_preserves_identities() {
        let original = instance();
        let split = original.single_operation_jobs();
        assert_eq!(split.num_jobs(), 3);
        assert!(split.has_single_operation_jobs());
        for op in original.operations() {
            let other = split.operation(op.id());
            assert_eq!(other.machine_index(), op.machine_index());
            assert_eq!(other.processing_time(), op.processing_time());
        }
        assert_eq!(
            split.operation(OperationIndex::new(1)).job_index().get(),
            1
        );
    }

    #[test]
    fn test_without_energy_limits_exceeds_total_energy() {
        let relaxed = instance().without_energy_limits();
        assert!(relaxed.energy_limit() > instance().total_energy());
        assert_eq!(relaxed.horizon(), 200);
    }
}
