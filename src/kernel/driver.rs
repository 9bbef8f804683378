use tracing::{debug, info};

use super::*;

use super::process_table::ProcessTable;

/// Which report `Driver::snapshot` renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotTarget {
    Ready,
    Disks,
    OtherDevices,
    Memory,
}

/// Holds the simulated system and applies one operation at a time.
/// Every operation either completes, including the promotions and
/// preemptions it causes, or is rejected without changing anything.
pub struct Driver {
    config: SystemConfig,
    processes: ProcessTable,
    memory: Memory,
    ready_queue: ReadyQueue,
    devices: DeviceQueueBank,
    cpu: Option<Pid>,
    next_pid: Pid,
}

impl Driver {
    pub fn new(config: SystemConfig) -> Driver {
        info!(
            "Starting system with {} bytes of memory, {} disks and {} I/O devices",
            config.memory_size(),
            config.num_disks(),
            config.num_io_devices()
        );

        Driver {
            config,
            processes: ProcessTable::new(),
            memory: Memory::new(config.memory_size(), config.fit_strategy()),
            ready_queue: ReadyQueue::new(),
            devices: DeviceQueueBank::new(config.num_disks(), config.num_io_devices()),
            cpu: None,
            next_pid: Pid::FIRST,
        }
    }

    /// Creates a process, gives it memory and runs the preemption check for it.
    /// A process that does not fit in memory is dropped, not queued.
    pub fn admit(&mut self, priority: i64, memory_demand: i64) -> Result<Pid, KernelError> {
        let priority = Priority::try_from(priority)?;
        let memory_size = match usize::try_from(memory_demand) {
            Ok(size) if size > 0 => size,
            _ => return Err(KernelError::InvalidMemoryDemand(memory_demand)),
        };

        let process_id = self.next_pid;
        let address = self.memory.allocate(process_id, memory_size)?;
        self.next_pid = process_id.next();

        self.processes
            .insert(ProcessControlBlock::new(process_id, priority, memory_size));
        info!(
            "Admitted process {} (priority {}, {} bytes at {})",
            process_id, priority, memory_size, address
        );

        self.check_cpu(process_id);
        Ok(process_id)
    }

    /// Terminates the running process, releases its memory and promotes the
    /// most urgent ready process.
    pub fn terminate_running(&mut self) -> Result<Pid, KernelError> {
        let process_id = self.cpu.take().ok_or(KernelError::NoProcessRunning)?;

        let freed = match self.memory.deallocate(process_id) {
            Some(freed) => freed,
            None => panic!("Running process {} holds no memory", process_id),
        };
        let pcb = self.processes.remove(process_id);
        debug_assert_eq!(freed, pcb.get_memory_size());
        info!(
            "Process {} is {}, released {} bytes",
            process_id,
            ProcessState::Terminated,
            freed
        );

        self.get_next_process();
        Ok(process_id)
    }

    /// Moves the running process onto a device queue and promotes the next
    /// ready process.
    pub fn request_device(
        &mut self,
        kind: DeviceKind,
        device_id: usize,
    ) -> Result<Pid, KernelError> {
        let process_id = self.cpu.ok_or(KernelError::NoProcessRunning)?;
        let queue = self.devices.queue_mut(kind, device_id)?;

        queue.enqueue(process_id);
        self.cpu = None;
        self.processes
            .get_pcb_mut_for(process_id)
            .set_state(ProcessState::Waiting);
        info!("Process {} requested {} {}", process_id, kind, device_id);

        self.get_next_process();
        Ok(process_id)
    }

    /// Completes the request at the head of a device queue. The finished
    /// process goes through the same preemption check as a new arrival.
    pub fn device_interrupt(
        &mut self,
        kind: DeviceKind,
        device_id: usize,
    ) -> Result<Pid, KernelError> {
        let queue = self.devices.queue_mut(kind, device_id)?;
        let process_id = queue.dequeue_head().ok_or(KernelError::EmptyDeviceQueue {
            kind,
            id: device_id,
        })?;
        info!("Interrupt from {} {}, process {} finished", kind, device_id, process_id);

        self.check_cpu(process_id);
        Ok(process_id)
    }

    pub fn snapshot(&self, target: SnapshotTarget) -> String {
        match target {
            SnapshotTarget::Ready => self.print_ready_queue(),
            SnapshotTarget::Disks => self.devices.snapshot(DeviceKind::Disk, &self.processes),
            SnapshotTarget::OtherDevices => {
                self.devices.snapshot(DeviceKind::Other, &self.processes)
            }
            SnapshotTarget::Memory => self.memory.snapshot(&self.processes),
        }
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    pub fn running(&self) -> Option<&ProcessControlBlock> {
        self.cpu.map(|pid| self.processes.get_pcb_for(pid))
    }

    /// `None` once the process has terminated.
    pub fn process(&self, process_id: Pid) -> Option<&ProcessControlBlock> {
        self.processes.get(process_id)
    }

    #[cfg(test)]
    pub(crate) fn memory(&self) -> &Memory {
        &self.memory
    }

    #[cfg(test)]
    pub(crate) fn ready_queue(&self) -> &ReadyQueue {
        &self.ready_queue
    }

    #[cfg(test)]
    pub(crate) fn devices(&self) -> &DeviceQueueBank {
        &self.devices
    }

    fn print_ready_queue(&self) -> String {
        let mut out = String::new();
        out.push_str(" ===================================\n");
        out.push_str("|              C P U                |\n");
        out.push_str(" ===================================\n\n");
        match self.running() {
            Some(pcb) => out.push_str(&pcb.get_process_info()),
            None => out.push_str("\tNo Process Running\n"),
        }
        out.push_str("\n\n");
        out.push_str(" ===================================\n");
        out.push_str("|       R E A D Y  Q U E U E        |\n");
        out.push_str(" ===================================\n\n");
        out.push_str(&self.ready_queue.snapshot(&self.processes));
        out
    }

    /// Installs `process_id` if the CPU is idle or it outranks the running
    /// process; otherwise queues it as ready.
    fn check_cpu(&mut self, process_id: Pid) {
        debug_assert!(self.cpu != Some(process_id));
        debug_assert!(!self.ready_queue.contains(process_id));
        debug_assert!(!self.devices.contains(process_id));

        let priority = self.processes.get_pcb_for(process_id).get_priority();

        match self.cpu {
            None => self.set_cpu_process(process_id),
            Some(running) => {
                let running_priority = self.processes.get_pcb_for(running).get_priority();
                if priority > running_priority {
                    info!("Process {} preempts process {}", process_id, running);
                    self.add_to_ready_queue(running);
                    self.set_cpu_process(process_id);
                } else {
                    self.add_to_ready_queue(process_id);
                }
            }
        }
    }

    /// Moves the most urgent ready process onto the idle CPU.
    fn get_next_process(&mut self) {
        debug_assert!(self.cpu.is_none());

        if let Some((priority, process_id)) = self.ready_queue.peek_highest_ready() {
            self.ready_queue.dequeue(priority);
            self.set_cpu_process(process_id);
            debug!("{} processes left in the ready queue", self.ready_queue.len());
        } else {
            debug_assert!(self.ready_queue.is_empty());
            info!("Ready queue is empty, CPU is idle");
        }
    }

    fn set_cpu_process(&mut self, process_id: Pid) {
        self.processes
            .get_pcb_mut_for(process_id)
            .set_state(ProcessState::Running);
        self.cpu = Some(process_id);
        info!("Process {} is running", process_id);
    }

    fn add_to_ready_queue(&mut self, process_id: Pid) {
        let pcb = self.processes.get_pcb_mut_for(process_id);
        pcb.set_state(ProcessState::Ready);
        self.ready_queue.enqueue(pcb.get_priority(), process_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn driver(memory_size: usize, num_disks: usize) -> Driver {
        Driver::new(SystemConfig::new(memory_size, num_disks).unwrap())
    }

    fn state_of(driver: &Driver, pid: Pid) -> ProcessState {
        driver.process(pid).unwrap().get_state()
    }

    fn running_id(driver: &Driver) -> Option<Pid> {
        driver.running().map(ProcessControlBlock::get_id)
    }

    fn holes(driver: &Driver) -> Vec<usize> {
        driver
            .memory()
            .get_blocks()
            .iter()
            .filter(|block| block.is_hole())
            .map(|block| block.get_size())
            .collect()
    }

    /// Every live process is in exactly one of CPU, ready queue or a device queue.
    fn assert_single_residency(driver: &Driver) {
        for pid in std::iter::successors(Some(Pid::FIRST), |pid| Some(pid.next())).take(64) {
            let Some(pcb) = driver.process(pid) else {
                assert!(!driver.ready_queue().contains(pid));
                assert!(!driver.devices().contains(pid));
                continue;
            };

            let places = [
                running_id(driver) == Some(pid),
                driver.ready_queue().contains(pid),
                driver.devices().contains(pid),
            ];
            assert_eq!(places.iter().filter(|&&place| place).count(), 1, "process {}", pid);
            assert_eq!(pcb.is_on_cpu(), running_id(driver) == Some(pid));
        }
    }

    #[test]
    fn test_driver_first_admission_runs() {
        let mut driver = driver(1024, 2);

        let pid = driver.admit(1, 100).unwrap();

        assert_eq!(pid, Pid::FIRST);
        assert_eq!(running_id(&driver), Some(pid));
        assert_eq!(state_of(&driver, pid), ProcessState::Running);
        assert!(driver.running().unwrap().is_on_cpu());
        assert_eq!(driver.memory().address_of(pid), Some(0));
    }

    #[test]
    fn test_driver_admit_validation() {
        let mut driver = driver(1024, 2);

        assert_eq!(driver.admit(5, 10), Err(KernelError::InvalidPriority(5)));
        assert_eq!(driver.admit(-1, 10), Err(KernelError::InvalidPriority(-1)));
        assert_eq!(driver.admit(2, 0), Err(KernelError::InvalidMemoryDemand(0)));
        assert_eq!(driver.admit(2, -8), Err(KernelError::InvalidMemoryDemand(-8)));

        assert!(driver.running().is_none());
        assert_eq!(driver.memory().get_free_size(), 1024);
        assert_eq!(driver.admit(2, 10), Ok(Pid::FIRST));
    }

    #[test]
    fn test_driver_preemption_rule() {
        let mut driver = driver(1024, 1);
        let low = driver.admit(2, 10).unwrap();

        let equal = driver.admit(2, 10).unwrap();
        let lower = driver.admit(1, 10).unwrap();
        assert_eq!(running_id(&driver), Some(low));
        assert_eq!(state_of(&driver, equal), ProcessState::Ready);
        assert_eq!(state_of(&driver, lower), ProcessState::Ready);

        let high = driver.admit(3, 10).unwrap();
        assert_eq!(running_id(&driver), Some(high));
        assert_eq!(state_of(&driver, low), ProcessState::Ready);
        assert!(driver.ready_queue().level(Priority::try_from(2_i64).unwrap()).contains(&low));

        assert_single_residency(&driver);
    }

    #[test]
    fn test_driver_preempted_process_queues_behind_its_level() {
        let mut driver = driver(1024, 1);
        let first = driver.admit(2, 10).unwrap();
        let second = driver.admit(2, 10).unwrap();
        driver.admit(4, 10).unwrap();

        let level: Vec<Pid> = driver
            .ready_queue()
            .level(Priority::try_from(2_i64).unwrap())
            .iter()
            .copied()
            .collect();
        assert_eq!(level, vec![second, first]);
    }

    #[test]
    fn test_driver_out_of_memory_leaves_state_unchanged() {
        let mut driver = driver(100, 1);
        let running = driver.admit(1, 60).unwrap();

        let result = driver.admit(4, 50);

        assert_eq!(result, Err(KernelError::OutOfMemory { demand: 50, largest_hole: 40 }));
        assert_eq!(running_id(&driver), Some(running));
        assert!(driver.ready_queue().is_empty());
        assert_eq!(holes(&driver), vec![40]);

        // The rejected admission did not consume a pid.
        assert_eq!(driver.admit(0, 40).unwrap(), running.next());
    }

    #[test]
    fn test_driver_out_of_memory_due_to_fragmentation() {
        let mut driver = driver(90, 1);
        driver.admit(4, 30).unwrap();
        driver.admit(3, 30).unwrap();
        driver.admit(2, 30).unwrap();
        driver.terminate_running().unwrap();
        driver.request_device(DeviceKind::Disk, 0).unwrap();
        driver.terminate_running().unwrap();
        assert_eq!(holes(&driver), vec![30, 30]);

        assert_eq!(
            driver.admit(1, 45),
            Err(KernelError::OutOfMemory { demand: 45, largest_hole: 30 })
        );
    }

    #[test]
    fn test_driver_terminate_promotes_next_ready() {
        let mut driver = driver(300, 1);
        let low = driver.admit(2, 50).unwrap();
        let high = driver.admit(4, 100).unwrap();
        assert_eq!(running_id(&driver), Some(high));

        assert_eq!(driver.terminate_running(), Ok(high));

        assert_eq!(running_id(&driver), Some(low));
        assert!(driver.process(high).is_none());
        assert!(driver.ready_queue().is_empty());
        assert_eq!(driver.memory().address_of(low), Some(0));
        assert_eq!(holes(&driver), vec![250]);
        assert_single_residency(&driver);
    }

    #[test]
    fn test_driver_terminate_frees_exact_footprint() {
        let mut driver = driver(300, 1);
        driver.admit(1, 50).unwrap();
        driver.admit(0, 70).unwrap();
        driver.admit(4, 80).unwrap();
        assert_eq!(holes(&driver), vec![100]);

        driver.terminate_running().unwrap();
        assert_eq!(holes(&driver), vec![180]);
        driver.terminate_running().unwrap();
        assert_eq!(holes(&driver), vec![50, 180]);
        driver.terminate_running().unwrap();
        assert_eq!(holes(&driver), vec![300]);
        assert!(driver.running().is_none());
    }

    #[test]
    fn test_driver_terminate_with_idle_cpu() {
        let mut driver = driver(100, 1);
        assert_eq!(driver.terminate_running(), Err(KernelError::NoProcessRunning));
    }

    #[test]
    fn test_driver_device_round_trip() {
        let mut driver = driver(1024, 2);
        let pid = driver.admit(2, 10).unwrap();

        assert_eq!(driver.request_device(DeviceKind::Disk, 0), Ok(pid));
        assert_eq!(state_of(&driver, pid), ProcessState::Waiting);
        assert!(driver.running().is_none());
        assert_eq!(
            driver.devices().queue(DeviceKind::Disk, 0).unwrap().peek_head(),
            Some(pid)
        );

        assert_eq!(driver.device_interrupt(DeviceKind::Disk, 0), Ok(pid));
        assert_eq!(running_id(&driver), Some(pid));
        assert!(driver.devices().queue(DeviceKind::Disk, 0).unwrap().is_empty());
    }

    #[test]
    fn test_driver_interrupt_lands_in_ready_behind_higher_priority() {
        let mut driver = driver(1024, 2);
        let waiter = driver.admit(2, 10).unwrap();
        driver.request_device(DeviceKind::Disk, 1).unwrap();
        let runner = driver.admit(3, 10).unwrap();

        driver.device_interrupt(DeviceKind::Disk, 1).unwrap();

        assert_eq!(running_id(&driver), Some(runner));
        assert_eq!(state_of(&driver, waiter), ProcessState::Ready);
        assert_single_residency(&driver);
    }

    #[test]
    fn test_driver_interrupt_preempts_lower_priority() {
        let mut driver = driver(1024, 1);
        let waiter = driver.admit(4, 10).unwrap();
        let other = driver.admit(1, 10).unwrap();
        driver.request_device(DeviceKind::Other, 3).unwrap();
        assert_eq!(running_id(&driver), Some(other));

        driver.device_interrupt(DeviceKind::Other, 3).unwrap();

        assert_eq!(running_id(&driver), Some(waiter));
        assert_eq!(state_of(&driver, other), ProcessState::Ready);
    }

    #[test]
    fn test_driver_request_device_promotes_next_ready() {
        let mut driver = driver(1024, 1);
        let first = driver.admit(3, 10).unwrap();
        let second = driver.admit(1, 10).unwrap();
        let third = driver.admit(2, 10).unwrap();

        driver.request_device(DeviceKind::Disk, 0).unwrap();
        assert_eq!(running_id(&driver), Some(third));

        driver.request_device(DeviceKind::Disk, 0).unwrap();
        assert_eq!(running_id(&driver), Some(second));

        let queue = driver.devices().queue(DeviceKind::Disk, 0).unwrap();
        assert_eq!(queue.peek_head(), Some(first));
        assert_eq!(queue.len(), 2);
        assert_single_residency(&driver);
    }

    #[test]
    fn test_driver_request_device_errors() {
        let mut driver = driver(1024, 2);
        assert_eq!(
            driver.request_device(DeviceKind::Disk, 0),
            Err(KernelError::NoProcessRunning)
        );

        let pid = driver.admit(2, 10).unwrap();
        assert_eq!(
            driver.request_device(DeviceKind::Disk, 2),
            Err(KernelError::UnknownDevice { kind: DeviceKind::Disk, id: 2, count: 2 })
        );
        assert_eq!(
            driver.request_device(DeviceKind::Other, 5),
            Err(KernelError::UnknownDevice { kind: DeviceKind::Other, id: 5, count: 5 })
        );
        assert_eq!(running_id(&driver), Some(pid));
    }

    #[test]
    fn test_driver_interrupt_errors() {
        let mut driver = driver(1024, 1);
        assert_eq!(
            driver.device_interrupt(DeviceKind::Disk, 0),
            Err(KernelError::EmptyDeviceQueue { kind: DeviceKind::Disk, id: 0 })
        );
        assert_eq!(
            driver.device_interrupt(DeviceKind::Disk, 1),
            Err(KernelError::UnknownDevice { kind: DeviceKind::Disk, id: 1, count: 1 })
        );
    }

    #[test]
    fn test_driver_pids_are_never_reused() {
        let mut driver = driver(1024, 1);
        let first = driver.admit(2, 10).unwrap();
        driver.terminate_running().unwrap();

        let second = driver.admit(2, 10).unwrap();
        assert_ne!(first, second);
        assert!(driver.process(first).is_none());
    }

    #[test]
    fn test_driver_memory_is_conserved() {
        let mut driver = driver(700, 3);
        let steps: [(i64, i64); 8] = [
            (1, 120),
            (3, 45),
            (0, 200),
            (4, 60),
            (2, 90),
            (3, 30),
            (1, 75),
            (4, 80),
        ];

        for (i, &(priority, demand)) in steps.iter().enumerate() {
            let _ = driver.admit(priority, demand);
            if i % 3 == 2 {
                let _ = driver.terminate_running();
            }
            if i % 4 == 1 {
                let _ = driver.request_device(DeviceKind::Disk, i % 3);
            }

            let total: usize = driver
                .memory()
                .get_blocks()
                .iter()
                .map(|block| block.get_size())
                .sum();
            assert_eq!(total, driver.memory().get_total_size());
            assert_single_residency(&driver);
        }

        while driver.terminate_running().is_ok() {}
        for disk in 0..3 {
            while driver.device_interrupt(DeviceKind::Disk, disk).is_ok() {
                while driver.terminate_running().is_ok() {}
            }
        }
        assert_eq!(holes(&driver), vec![700]);
    }

    #[test]
    fn test_driver_snapshot_targets() {
        let mut driver = driver(100, 2);
        assert!(driver.snapshot(SnapshotTarget::Ready).contains("No Process Running"));

        let pid = driver.admit(3, 40).unwrap();
        driver.admit(1, 10).unwrap();

        let ready = driver.snapshot(SnapshotTarget::Ready);
        assert!(ready.contains("C P U"));
        assert!(ready.contains("\tPID >> 1\n\tPriority >> 3\n"));
        assert!(ready.contains(
            "\tPID >> 2\n\tPriority >> 1\n\tProcess Size >> 10\n\tState >> Ready\n"
        ));

        driver.request_device(DeviceKind::Disk, 1).unwrap();
        assert!(driver
            .snapshot(SnapshotTarget::Disks)
            .contains("Disk Number: 1\n\n\tUSING DEVICE"));
        assert!(driver.snapshot(SnapshotTarget::OtherDevices).contains("I/O Device Number: 4"));

        let memory = driver.snapshot(SnapshotTarget::Memory);
        assert!(memory.contains("\t0 -> 39\n"));
        assert!(memory.contains("\t50 -> 99\n"));
        assert_eq!(driver.process(pid).unwrap().get_state(), ProcessState::Waiting);
    }

    #[test]
    fn test_driver_independent_instances() {
        let mut one = driver(100, 1);
        let two = driver(100, 1);
        one.admit(2, 50).unwrap();

        assert!(two.running().is_none());
        assert_eq!(two.config().memory_size(), 100);
    }

    #[test]
    fn test_driver_best_fit_config() {
        let config = SystemConfig::new(300, 1).unwrap().with_fit_strategy(FitStrategy::BestFit);
        let mut driver = Driver::new(config);
        driver.admit(4, 100).unwrap();
        driver.admit(0, 10).unwrap();
        driver.admit(3, 50).unwrap();
        driver.admit(0, 10).unwrap();
        driver.terminate_running().unwrap();
        driver.terminate_running().unwrap();
        assert_eq!(holes(&driver), vec![100, 50, 130]);

        let pid = driver.admit(1, 40).unwrap();

        assert_eq!(driver.memory().address_of(pid), Some(110));
        assert_eq!(holes(&driver), vec![100, 10, 130]);
    }
}
