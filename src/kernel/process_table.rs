use std::collections::BTreeMap;

use super::{Pid, ProcessControlBlock};

/// Owns every live process control block. All other components refer to
/// processes by `Pid` only.
#[derive(Debug, Default)]
pub(crate) struct ProcessTable {
    pcb_map: BTreeMap<Pid, ProcessControlBlock>,
}

impl ProcessTable {
    pub fn new() -> ProcessTable {
        ProcessTable {
            pcb_map: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, pcb: ProcessControlBlock) {
        let id = pcb.get_id();
        if self.pcb_map.insert(id, pcb).is_some() {
            panic!("Process {} registered twice", id);
        }
    }

    pub fn remove(&mut self, process_id: Pid) -> ProcessControlBlock {
        match self.pcb_map.remove(&process_id) {
            Some(pcb) => pcb,
            None => panic!("No process found for id: {}", process_id),
        }
    }

    pub fn get(&self, process_id: Pid) -> Option<&ProcessControlBlock> {
        self.pcb_map.get(&process_id)
    }

    pub fn get_pcb_for(&self, process_id: Pid) -> &ProcessControlBlock {
        match self.pcb_map.get(&process_id) {
            Some(pcb) => pcb,
            None => panic!("No process found for id: {}", process_id),
        }
    }

    pub fn get_pcb_mut_for(&mut self, process_id: Pid) -> &mut ProcessControlBlock {
        match self.pcb_map.get_mut(&process_id) {
            Some(pcb) => pcb,
            None => panic!("No process found for id: {}", process_id),
        }
    }
}
