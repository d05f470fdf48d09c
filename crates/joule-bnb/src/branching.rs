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

//! Operation selection.
//!
//! The search always extends the lowest-indexed machine that still has
//! unplaced operations. Which of that machine's operations are tried next is
//! decided by the `BranchingRule`:
//!
//! - `LowestMachineFirst` tries every unplaced operation of the machine, so
//!   the search enumerates all machine sequences.
//! - `FixedMachineOrder` follows a given sequence per machine and only
//!   branches over windows.

use crate::partial::PartialSolution;
use joule_model::index::{MachineIndex, OperationIndex};
use joule_model::instance::Instance;
use smallvec::SmallVec;

/// Operations to branch on at a node.
pub type Candidates = SmallVec<[OperationIndex; 8]>;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BranchingRule {
    #[default]
    LowestMachineFirst,
    /// `order[m]` is the complete processing sequence of machine `m`.
    FixedMachineOrder(Vec<Vec<OperationIndex>>),
}

impl BranchingRule {
    #[inline]
    pub fn name(&self) -> &str {
        match self {
            BranchingRule::LowestMachineFirst => "LowestMachineFirst",
            BranchingRule::FixedMachineOrder(_) => "FixedMachineOrder",
        }
    }

    /// The machine to extend: the lowest index with unplaced operations.
    pub fn select_machine(&self, instance: &Instance, partial: &PartialSolution) -> Option<MachineIndex> {
        (0..instance.num_machines()).map(MachineIndex::new).find(|&m| {
            partial.machine_stack(m).len() < instance.machine_operations(m).len()
        })
    }

    /// Operations of the selected machine to try at this node, in the order
    /// they are branched on.
    pub fn candidates(&self, instance: &Instance, partial: &PartialSolution) -> Candidates {
        let Some(machine) = self.select_machine(instance, partial) else {
            return Candidates::new();
        };
        match self {
            BranchingRule::LowestMachineFirst => instance
                .machine_operations(machine)
                .iter()
                .copied()
                .filter(|&op| partial.is_unplaced(op))
                .collect(),
            BranchingRule::FixedMachineOrder(order) => order
                .get(machine.get())
                .and_then(|sequence| sequence.get(partial.machine_stack(machine).len()))
                .copied()
                .filter(|&op| partial.is_unplaced(op))
                .into_iter()
                .collect(),
        }
    }

    /// `true` if `order` lists every operation exactly once, on its own machine.
    pub fn is_valid_order(instance: &Instance, order: &[Vec<OperationIndex>]) -> bool {
        if order.len() != instance.num_machines() {
            return false;
        }
        let mut seen = vec![false; instance.total_num_operations()];
        for (m, sequence) in order.iter().enumerate() {
            if sequence.len() != instance.machine_operations(MachineIndex::new(m)).len() {
                return false;
            }
            for &op in sequence {
                let Some(flag) = seen.get_mut(op.get()) else {
                    return false;
                };
                if *flag || instance.operation(op).machine_index().get() != m {
                    return false;
                }
                *flag = true;
            }
        }
        true
    }
}

impl std::fmt::Display for BranchingRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
