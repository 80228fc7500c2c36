// speculation.rs
//
// The speculation stack: one snapshot of the rename table per in-flight
// control-flow instruction (BEQ or JUMP), pushed at issue and popped or
// cleared at write-back. Modeled as a FIFO per the data model (push at
// the back, operate on the front) rather than a true stack, since nothing
// here ever pops from the back.

use std::collections::VecDeque;

use crate::registers::RenameTable;

#[derive(Debug, Clone)]
pub struct Snapshot {
    pub issue_cycle: usize,
    pub rename_table: RenameTable,
}

#[derive(Debug, Clone, Default)]
pub struct SpeculationStack {
    snapshots: VecDeque<Snapshot>,
}

impl SpeculationStack {
    pub fn new() -> Self {
        Self { snapshots: VecDeque::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn push(&mut self, issue_cycle: usize, rename_table: RenameTable) {
        self.snapshots.push_back(Snapshot { issue_cycle, rename_table });
    }

    pub fn front(&self) -> Option<&Snapshot> {
        self.snapshots.front()
    }

    /// Mutable access to the top (most-recently-pushed) snapshot, which is
    /// where Issue writes a speculative destination rename while a
    /// branch or jump is still in flight.
    pub fn top_mut(&mut self) -> Option<&mut Snapshot> {
        self.snapshots.back_mut()
    }

    pub fn pop_front(&mut self) -> Option<Snapshot> {
        self.snapshots.pop_front()
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
    }
}
