use thiserror::Error;

use super::DeviceKind;

/// Rejections from the kernel operations. None of them leave partial state behind.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KernelError {
    #[error("Invalid priority level {0}. Expected 0-4")]
    InvalidPriority(i64),

    #[error("Invalid memory size {0}")]
    InvalidMemoryDemand(i64),

    #[error("No memory available for process ({demand} bytes requested, largest hole is {largest_hole} bytes)")]
    OutOfMemory { demand: usize, largest_hole: usize },

    #[error("No process running in CPU")]
    NoProcessRunning,

    #[error("{kind} {id} does not exist ({count} configured)")]
    UnknownDevice {
        kind: DeviceKind,
        id: usize,
        count: usize,
    },

    #[error("Nothing in {kind} {id}")]
    EmptyDeviceQueue { kind: DeviceKind, id: usize },
}

/// Start-of-day configuration failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Memory size must be a positive number of bytes")]
    InvalidMemorySize,

    #[error("Invalid disk count {0}. Expected 1-{max}", max = super::config::MAX_DISKS)]
    InvalidDiskCount(usize),
}
