use std::collections::VecDeque;

use super::process_table::ProcessTable;
use super::{Pid, Priority};

/// One FIFO queue per priority level, indexed by the level itself so the
/// scan order is always highest level first.
pub(crate) struct ReadyQueue {
    levels: [VecDeque<Pid>; Priority::LEVELS],
}

impl ReadyQueue {
    pub fn new() -> ReadyQueue {
        ReadyQueue {
            levels: Default::default(),
        }
    }

    pub fn enqueue(&mut self, priority: Priority, process_id: Pid) {
        self.levels[priority.index()].push_back(process_id);
    }

    pub fn dequeue(&mut self, priority: Priority) -> Option<Pid> {
        self.levels[priority.index()].pop_front()
    }

    /// Head of the most urgent non-empty level, left in place.
    pub fn peek_highest_ready(&self) -> Option<(Priority, Pid)> {
        Priority::descending()
            .find_map(|priority| self.levels[priority.index()].front().map(|&pid| (priority, pid)))
    }

    pub fn level(&self, priority: Priority) -> &VecDeque<Pid> {
        &self.levels[priority.index()]
    }

    pub fn is_empty(&self) -> bool {
        self.levels.iter().all(VecDeque::is_empty)
    }

    pub fn len(&self) -> usize {
        self.levels.iter().map(VecDeque::len).sum()
    }

    pub fn contains(&self, process_id: Pid) -> bool {
        self.levels.iter().any(|level| level.contains(&process_id))
    }

    pub fn snapshot(&self, processes: &ProcessTable) -> String {
        let mut out = String::new();

        for priority in Priority::descending() {
            out.push_str(&format!("Priority Queue: {}\n\n", priority));

            let level = self.level(priority);
            if level.is_empty() {
                out.push_str("\tReadyQueue is empty!\n");
            }
            for &pid in level {
                out.push_str(&processes.get_pcb_for(pid).get_process_info());
                out.push('\n');
            }
            out.push('\n');
        }

        out
    }
}
