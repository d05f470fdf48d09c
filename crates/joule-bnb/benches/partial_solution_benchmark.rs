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

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use joule_bnb::enumerate::WindowEnumerator;
use joule_bnb::partial::PartialSolution;
use joule_model::index::{MachineIndex, OperationIndex};
use joule_model::instance::{Instance, InstanceBuilder};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::hint::black_box;

/// Random single-operation jobs; metering interval length 60.
fn random_instance(num_machines: usize, num_operations: usize, seed: u64) -> Instance {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut b = InstanceBuilder::new(num_machines, 60 * 200, 60, 500.0);
    for _ in 0..num_operations {
        let machine = MachineIndex::new(rng.random_range(0..num_machines));
        b.add_job([(machine, rng.random_range(1..=240), rng.random_range(0.5..4.0))]);
    }
    b.build().expect("benchmark instance is valid")
}

/// Places every operation of a machine back to back in its first window.
fn fill_machines(instance: &Instance, partial: &mut PartialSolution) -> usize {
    let mut pushed = 0;
    for m in 0..instance.num_machines() {
        let machine = MachineIndex::new(m);
        for &op in instance.machine_operations(machine) {
            let p = instance.operation(op).processing_time();
            let window = WindowEnumerator::new(
                instance,
                partial.first_allocable_interval(machine),
                p,
                partial.machine_remaining_processing(machine),
            )
            .next();
            if let Some(window) = window {
                partial.push(op, window);
                pushed += 1;
            }
        }
    }
    pushed
}

fn unwind(instance: &Instance, partial: &mut PartialSolution) {
    for m in (0..instance.num_machines()).rev() {
        while partial.pop(MachineIndex::new(m)).is_some() {}
    }
}

fn bench_push_pop(c: &mut Criterion) {
    let mut group = c.benchmark_group("partial_solution_push_pop");
    for &(machines, operations) in &[(2usize, 20usize), (5, 50), (10, 120)] {
        let instance = random_instance(machines, operations, 42);
        let mut partial = PartialSolution::new(&instance);
        group.throughput(Throughput::Elements(operations as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}x{}", machines, operations)),
            &instance,
            |b, instance| {
                b.iter(|| {
                    let pushed = fill_machines(instance, &mut partial);
                    unwind(instance, &mut partial);
                    black_box(pushed)
                })
            },
        );
    }
    group.finish();
}

fn bench_window_enumeration(c: &mut Criterion) {
    let instance = random_instance(1, 1, 7);
    c.bench_function("window_enumeration_full_horizon", |b| {
        b.iter(|| {
            let count = WindowEnumerator::new(&instance, 0, black_box(150), 150).count();
            black_box(count)
        })
    });
}

fn bench_scoped_descent(c: &mut Criterion) {
    let instance = random_instance(3, 30, 11);
    let mut partial = PartialSolution::new(&instance);
    let first = OperationIndex::new(0);
    let machine = instance.operation(first).machine_index();
    c.bench_function("push_scoped_single_level", |b| {
        b.iter(|| {
            let windows = WindowEnumerator::new(
                &instance,
                0,
                instance.operation(first).processing_time(),
                instance.machine_workload(machine),
            );
            let mut violated = 0usize;
            for window in windows {
                let child = partial.push_scoped(first, window);
                violated += usize::from(child.is_violated());
            }
            black_box(violated)
        })
    });
}

criterion_group!(
    benches,
    bench_push_pop,
    bench_window_enumeration,
    bench_scoped_descent
);
criterion_main!(benches);
