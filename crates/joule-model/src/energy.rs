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

//! Per-metering-interval energy consumption of a schedule.

use crate::instance::Instance;
use crate::start_times::StartTimes;
use joule_core::num::tolerance::Tolerance;

/// Energy drawn in every metering interval of the horizon.
///
/// Each scheduled operation contributes `overlap * power` to every interval it
/// overlaps. Overlaps beyond the horizon are not counted.
pub fn consumption_in_metering_intervals(instance: &Instance, start_times: &StartTimes) -> Vec<f64> {
    let length = instance.metering_interval_length();
    let mut consumption = vec![0.0; instance.num_metering_intervals()];
    for (id, start) in start_times.iter() {
        let op = instance.operation(id);
        for (interval, overlap) in op.nonzero_overlaps(start, length) {
            if let Some(slot) = consumption.get_mut(interval) {
                *slot += overlap * op.power_consumption();
            }
        }
    }
    consumption
}

/// The first metering interval whose consumption exceeds the energy limit.
pub fn first_violated_interval(
    instance: &Instance,
    consumption: &[f64],
    tolerance: &Tolerance,
) -> Option<usize> {
    let limit = instance.energy_limit();
    consumption
        .iter()
        .position(|&c| !tolerance.less_or_equal(c, limit))
}

/// `true` if no metering interval exceeds the energy limit.
#[inline]
pub fn energy_limits_satisfied(instance: &Instance, consumption: &[f64], tolerance: &Tolerance) -> bool {
    first_violated_interval(instance, consumption, tolerance).is_none()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{MachineIndex, OperationIndex};
    use crate::instance::InstanceBuilder;
    use proptest::prelude::*;

    #[test]
    fn test_consumption_splits_spanning_operation() {
        let m0 = MachineIndex::new(0);
        let m1 = MachineIndex::new(1);
        let mut b = InstanceBuilder::new(2, 300, 100, 100.0);
        b.add_job([(m0, 150, 0.5)]);
        b.add_job([(m1, 50, 2.0)]);
        let inst = b.build().unwrap();

        let mut st = StartTimes::for_instance(&inst);
        st.set(inst.operation(OperationIndex::new(0)), 80.0);
        st.set(inst.operation(OperationIndex::new(1)), 120.0);

        let c = consumption_in_metering_intervals(&inst, &st);
        assert_eq!(c, vec![10.0, 150.0, 15.0]);

        let tol = Tolerance::default();
        assert_eq!(first_violated_interval(&inst, &c, &tol), Some(1));
        assert!(!energy_limits_satisfied(&inst, &c, &tol));
    }

    #[test]
    fn test_unscheduled_operations_consume_nothing() {
        let mut b = InstanceBuilder::new(1, 100, 100, 1.0);
        b.add_job([(MachineIndex::new(0), 10, 5.0)]);
        let inst = b.build().unwrap();
        let st = StartTimes::for_instance(&inst);
        let c = consumption_in_metering_intervals(&inst, &st);
        assert_eq!(c, vec![0.0]);
        assert!(energy_limits_satisfied(&inst, &c, &Tolerance::default()));
    }

    proptest! {
        #[test]
        fn prop_consumption_sums_to_total_energy(
            p in 0i64..=250,
            power in 0.0f64..5.0,
            start_offset in 0i64..=1000,
            fractional in 0.0f64..1.0,
        ) {
            let mut b = InstanceBuilder::new(1, 500, 100, 1000.0);
            b.add_job([(MachineIndex::new(0), p, power)]);
            let inst = b.build().unwrap();

            let latest = (500 - p) as f64;
            let start = ((start_offset as f64 + fractional) % (latest + 1.0)).min(latest);
            let mut st = StartTimes::for_instance(&inst);
            st.set(inst.operation(OperationIndex::new(0)), start);

            let total: f64 = consumption_in_metering_intervals(&inst, &st).iter().sum();
            prop_assert!((total - p as f64 * power).abs() < 1e-6);
        }
    }
}
