use super::error::ConfigError;
use super::FitStrategy;

pub const MAX_DISKS: usize = 10;

/// The modeled system always has five non-disk I/O devices.
pub const NUM_IO_DEVICES: usize = 5;

/// Settings fixed at start-of-day. Immutable once a driver has been built from them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemConfig {
    memory_size: usize,
    num_disks: usize,
    num_io_devices: usize,
    fit_strategy: FitStrategy,
}

impl SystemConfig {
    pub fn new(memory_size: usize, num_disks: usize) -> Result<SystemConfig, ConfigError> {
        if memory_size == 0 {
            return Err(ConfigError::InvalidMemorySize);
        }

        if num_disks == 0 || num_disks > MAX_DISKS {
            return Err(ConfigError::InvalidDiskCount(num_disks));
        }

        Ok(SystemConfig {
            memory_size,
            num_disks,
            num_io_devices: NUM_IO_DEVICES,
            fit_strategy: FitStrategy::FirstFit,
        })
    }

    pub fn with_fit_strategy(mut self, fit_strategy: FitStrategy) -> SystemConfig {
        self.fit_strategy = fit_strategy;
        self
    }

    pub fn memory_size(&self) -> usize {
        self.memory_size
    }

    pub fn num_disks(&self) -> usize {
        self.num_disks
    }

    pub fn num_io_devices(&self) -> usize {
        self.num_io_devices
    }

    pub fn fit_strategy(&self) -> FitStrategy {
        self.fit_strategy
    }
}
