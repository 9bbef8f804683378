use std::fmt;

use super::error::KernelError;

/// Process identifier. Handed out sequentially by the driver and never reused,
/// so a stale `Pid` can never refer to a newer process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pid(u32);

impl Pid {
    pub const FIRST: Pid = Pid(1);

    pub fn next(self) -> Pid {
        Pid(self.0 + 1)
    }
}

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Scheduling priority. Larger numbers are more urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Priority(u8);

impl Priority {
    pub const LOWEST: Priority = Priority(0);
    pub const HIGHEST: Priority = Priority(4);
    pub const LEVELS: usize = Priority::HIGHEST.0 as usize + 1;

    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// All levels from most to least urgent.
    pub fn descending() -> impl Iterator<Item = Priority> {
        (Priority::LOWEST.0..=Priority::HIGHEST.0).rev().map(Priority)
    }
}

impl TryFrom<i64> for Priority {
    type Error = KernelError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match u8::try_from(value) {
            Ok(level) if level <= Priority::HIGHEST.0 => Ok(Priority(level)),
            _ => Err(KernelError::InvalidPriority(value)),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    New,
    Ready,
    Running,
    Waiting,
    Terminated,
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProcessState::New => "New",
            ProcessState::Ready => "Ready",
            ProcessState::Running => "Running",
            ProcessState::Waiting => "Waiting",
            ProcessState::Terminated => "Terminated",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessControlBlock {
    id: Pid,
    priority: Priority,
    memory_size: usize,
    state: ProcessState,
    on_cpu: bool,
}

impl ProcessControlBlock {
    pub fn new(id: Pid, priority: Priority, memory_size: usize) -> ProcessControlBlock {
        ProcessControlBlock {
            id,
            priority,
            memory_size,
            state: ProcessState::New,
            on_cpu: false,
        }
    }

    pub fn get_id(&self) -> Pid {
        self.id
    }

    pub fn get_priority(&self) -> Priority {
        self.priority
    }

    pub fn get_memory_size(&self) -> usize {
        self.memory_size
    }

    pub fn get_state(&self) -> ProcessState {
        self.state
    }

    /// Mirrors `state == Running`; kept because the reports show it separately.
    pub fn is_on_cpu(&self) -> bool {
        self.on_cpu
    }

    pub fn set_state(&mut self, state: ProcessState) {
        self.state = state;
        self.on_cpu = state == ProcessState::Running;
    }

    /// The block of text the reports print for a single process.
    pub fn get_process_info(&self) -> String {
        format!(
            "\tPID >> {}\n\tPriority >> {}\n\tProcess Size >> {}\n\tState >> {}\n\tUsing CPU >> {}\n",
            self.id,
            self.priority,
            self.memory_size,
            self.state,
            if self.is_on_cpu() { "TRUE" } else { "FALSE" }
        )
    }
}
