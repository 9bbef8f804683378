mod config;
mod device_queue;
mod error;
mod memory;
mod process_control_block;
mod process_table;
mod short_term_scheduler;

use device_queue::DeviceQueueBank;
use memory::Memory;
use short_term_scheduler::ReadyQueue;

pub mod driver;

pub use config::{SystemConfig, MAX_DISKS};
pub use device_queue::DeviceKind;
pub use driver::{Driver, SnapshotTarget};
pub use error::{ConfigError, KernelError};
pub use memory::FitStrategy;
pub use process_control_block::{Pid, Priority, ProcessControlBlock, ProcessState};
