use std::collections::VecDeque;
use std::fmt;

use super::error::KernelError;
use super::process_table::ProcessTable;
use super::Pid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    Disk,
    Other,
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceKind::Disk => f.write_str("Disk"),
            DeviceKind::Other => f.write_str("I/O device"),
        }
    }
}

/// A device and its waiting line. The head is the process being serviced.
#[derive(Debug, Default)]
pub(crate) struct DeviceQueue {
    queue: VecDeque<Pid>,
}

impl DeviceQueue {
    pub fn enqueue(&mut self, process_id: Pid) {
        self.queue.push_back(process_id);
    }

    pub fn dequeue_head(&mut self) -> Option<Pid> {
        self.queue.pop_front()
    }

    pub fn peek_head(&self) -> Option<Pid> {
        self.queue.front().copied()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn contains(&self, process_id: Pid) -> bool {
        self.queue.contains(&process_id)
    }

    fn show_all_processes(&self, processes: &ProcessTable) -> String {
        let mut out = String::new();

        let Some(head) = self.peek_head() else {
            out.push_str("\tQueue is empty!\n");
            return out;
        };

        out.push_str("\tUSING DEVICE: \n\n");
        out.push_str(&processes.get_pcb_for(head).get_process_info());
        out.push('\n');
        out.push_str("\t---------------------------\n");
        if self.len() == 1 {
            out.push_str("\t    No Process Waiting \n");
        } else {
            out.push_str("\t   Processes Waiting\n");
        }
        out.push_str("\t---------------------------\n");

        for &pid in self.queue.iter().skip(1) {
            out.push_str(&processes.get_pcb_for(pid).get_process_info());
            out.push('\n');
        }

        out
    }
}

/// Disk queues and other I/O queues. Both families are sized once.
pub(crate) struct DeviceQueueBank {
    disks: Vec<DeviceQueue>,
    others: Vec<DeviceQueue>,
}

impl DeviceQueueBank {
    pub fn new(num_disks: usize, num_io_devices: usize) -> DeviceQueueBank {
        DeviceQueueBank {
            disks: (0..num_disks).map(|_| DeviceQueue::default()).collect(),
            others: (0..num_io_devices).map(|_| DeviceQueue::default()).collect(),
        }
    }

    pub fn count(&self, kind: DeviceKind) -> usize {
        self.family(kind).len()
    }

    #[cfg(test)]
    pub fn queue(&self, kind: DeviceKind, id: usize) -> Result<&DeviceQueue, KernelError> {
        let family = self.family(kind);
        family.get(id).ok_or(KernelError::UnknownDevice {
            kind,
            id,
            count: family.len(),
        })
    }

    pub fn queue_mut(
        &mut self,
        kind: DeviceKind,
        id: usize,
    ) -> Result<&mut DeviceQueue, KernelError> {
        let count = self.count(kind);
        let family = match kind {
            DeviceKind::Disk => &mut self.disks,
            DeviceKind::Other => &mut self.others,
        };
        family.get_mut(id).ok_or(KernelError::UnknownDevice { kind, id, count })
    }

    /// True if `process_id` is in any device queue of either family.
    pub fn contains(&self, process_id: Pid) -> bool {
        self.disks
            .iter()
            .chain(self.others.iter())
            .any(|queue| queue.contains(process_id))
    }

    pub fn snapshot(&self, kind: DeviceKind, processes: &ProcessTable) -> String {
        let mut out = String::new();
        out.push_str(" ====================================\n");
        match kind {
            DeviceKind::Disk => out.push_str("|         D I S K  Q U E U E         |\n"),
            DeviceKind::Other => out.push_str("|           I / O  Q U E U E         |\n"),
        }
        out.push_str(" ====================================\n\n");

        for (id, queue) in self.family(kind).iter().enumerate() {
            let label = match kind {
                DeviceKind::Disk => "Disk Number",
                DeviceKind::Other => "I/O Device Number",
            };
            out.push_str(&format!("{}: {}\n\n", label, id));
            out.push_str(&queue.show_all_processes(processes));
            out.push('\n');
        }

        out
    }

    fn family(&self, kind: DeviceKind) -> &[DeviceQueue] {
        match kind {
            DeviceKind::Disk => &self.disks,
            DeviceKind::Other => &self.others,
        }
    }
}
