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

//! Undo log for `PartialSolution` budgets.
//!
//! Every budget cell touched by a push is recorded with its previous value
//! before it is changed; a frame marks where each push's records begin. Popping
//! a frame writes the saved values back, so restored budgets are bit-identical
//! to the ones before the push (floating point energy included).

use joule_model::index::{MachineIndex, OperationIndex};

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TrailEntry {
    machine_index: MachineIndex,
    interval: usize,
    old_time: i64,
    old_energy: f64,
}

impl TrailEntry {
    #[inline]
    pub fn machine_index(&self) -> MachineIndex {
        self.machine_index
    }

    #[inline]
    pub fn interval(&self) -> usize {
        self.interval
    }

    #[inline]
    pub fn old_time(&self) -> i64 {
        self.old_time
    }

    #[inline]
    pub fn old_energy(&self) -> f64 {
        self.old_energy
    }
}

#[derive(Copy, Debug, Clone, PartialEq, Eq, Hash)]
pub struct FrameEntry {
    operation_index: OperationIndex,
    entry_start_index: usize,
}

impl FrameEntry {
    #[inline]
    pub fn operation_index(&self) -> OperationIndex {
        self.operation_index
    }

    #[inline]
    pub fn entry_start_index(&self) -> usize {
        self.entry_start_index
    }
}

#[derive(Debug, Clone, Default)]
pub struct BudgetTrail {
    entries: Vec<TrailEntry>,
    frames: Vec<FrameEntry>,
}

impl BudgetTrail {
    pub fn preallocated(num_operations: usize) -> Self {
        Self {
            entries: Vec::with_capacity(num_operations),
            frames: Vec::with_capacity(num_operations),
        }
    }

    /// Opens the frame of a push of `operation`.
    #[inline]
    pub fn push_frame(&mut self, operation: OperationIndex) {
        self.frames.push(FrameEntry {
            operation_index: operation,
            entry_start_index: self.entries.len(),
        });
    }

    /// Records the value of a budget cell before it is modified.
    #[inline]
    pub fn record(&mut self, machine: MachineIndex, interval: usize, old_time: i64, old_energy: f64) {
        debug_assert!(
            !self.frames.is_empty(),
            "called `BudgetTrail::record` without an open frame"
        );
        self.entries.push(TrailEntry {
            machine_index: machine,
            interval,
            old_time,
            old_energy,
        });
    }

    /// Closes the most recent frame and hands its entries, newest first, to `restore`.
    pub fn pop_frame<F>(&mut self, mut restore: F) -> Option<OperationIndex>
    where
        F: FnMut(&TrailEntry),
    {
        let frame = self.frames.pop()?;
        while self.entries.len() > frame.entry_start_index {
            if let Some(entry) = self.entries.pop() {
                restore(&entry);
            }
        }
        Some(frame.operation_index)
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frames_restore_newest_first() {
        let mut trail = BudgetTrail::default();
        let m = MachineIndex::new(0);
        trail.push_frame(OperationIndex::new(3));
        trail.record(m, 1, 100, 5.0);
        trail.record(m, 1, 40, 2.0);
        trail.push_frame(OperationIndex::new(4));
        assert_eq!(trail.depth(), 2);

        let mut seen = Vec::new();
        assert_eq!(
            trail.pop_frame(|e| seen.push(e.old_time())),
            Some(OperationIndex::new(4))
        );
        assert!(seen.is_empty());

        assert_eq!(
            trail.pop_frame(|e| seen.push(e.old_time())),
            Some(OperationIndex::new(3))
        );
        assert_eq!(seen, vec![40, 100]);
        assert!(trail.is_empty());
        assert_eq!(trail.pop_frame(|_| {}), None);
    }
}
