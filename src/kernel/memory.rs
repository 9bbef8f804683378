use std::fmt::Write;

use tracing::{debug, warn};

use super::error::KernelError;
use super::process_table::ProcessTable;
use super::Pid;

/// How a hole is picked for a new process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FitStrategy {
    /// The first hole, in address order, that is large enough.
    #[default]
    FirstFit,
    /// The smallest hole that is large enough. Ties go to the lower address.
    BestFit,
}

/// One contiguous range of memory. `owner` is `None` for a hole.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryBlock {
    size: usize,
    owner: Option<Pid>,
}

impl MemoryBlock {
    fn hole(size: usize) -> MemoryBlock {
        MemoryBlock { size, owner: None }
    }

    pub fn get_size(&self) -> usize {
        self.size
    }

    pub fn is_hole(&self) -> bool {
        self.owner.is_none()
    }
}

/// Contiguous memory, partitioned into blocks laid out from address 0.
/// The block sizes always add up to `total_size`.
pub(crate) struct Memory {
    blocks: Vec<MemoryBlock>,
    total_size: usize,
    strategy: FitStrategy,
}

impl Memory {
    pub fn new(total_size: usize, strategy: FitStrategy) -> Memory {
        if total_size == 0 {
            panic!("Memory size must be positive");
        }

        Memory {
            blocks: vec![MemoryBlock::hole(total_size)],
            total_size,
            strategy,
        }
    }

    /// Places `owner` into a hole and returns the start address of its block.
    /// Nothing changes when no hole is large enough.
    pub fn allocate(&mut self, owner: Pid, size: usize) -> Result<usize, KernelError> {
        if size == 0 {
            panic!("Cannot allocate an empty block for process {}", owner);
        }

        let idx = self.find_hole(size).ok_or_else(|| KernelError::OutOfMemory {
            demand: size,
            largest_hole: self.largest_hole(),
        })?;

        let remainder = self.blocks[idx].size - size;
        self.blocks[idx] = MemoryBlock {
            size,
            owner: Some(owner),
        };
        if remainder > 0 {
            self.blocks.insert(idx + 1, MemoryBlock::hole(remainder));
        }

        let address = self.address_at(idx);
        debug!("Allocated {} bytes at {} for process {}", size, address, owner);

        Ok(address)
    }

    /// Frees the block owned by `owner` and merges adjacent holes.
    /// Returns the number of bytes released, or `None` if `owner` holds no memory.
    pub fn deallocate(&mut self, owner: Pid) -> Option<usize> {
        let Some(block) = self.blocks.iter_mut().find(|block| block.owner == Some(owner)) else {
            warn!("Process {} has no memory to release", owner);
            return None;
        };

        block.owner = None;
        let freed = block.size;

        self.merge();
        debug!("Released {} bytes from process {}", freed, owner);

        Some(freed)
    }

    #[cfg(test)]
    pub fn get_blocks(&self) -> &[MemoryBlock] {
        &self.blocks
    }

    pub fn get_total_size(&self) -> usize {
        self.total_size
    }

    pub fn get_free_size(&self) -> usize {
        self.holes().map(MemoryBlock::get_size).sum()
    }

    pub fn largest_hole(&self) -> usize {
        self.holes().map(MemoryBlock::get_size).max().unwrap_or(0)
    }

    #[cfg(test)]
    pub fn address_of(&self, owner: Pid) -> Option<usize> {
        let idx = self.blocks.iter().position(|block| block.owner == Some(owner))?;
        Some(self.address_at(idx))
    }

    /// Renders every block in address order.
    /// Panics if a block is owned by a process the table does not know.
    pub fn snapshot(&self, processes: &ProcessTable) -> String {
        let mut out = String::new();
        out.push_str(" ===================================\n");
        out.push_str("|       Random Access Memory        |\n");
        out.push_str(" ===================================\n\n");
        let _ = writeln!(
            out,
            "\tTotal Size >> {}\n\tFree >> {}\n",
            self.get_total_size(),
            self.get_free_size()
        );

        let mut start = 0;
        for block in &self.blocks {
            let end = start + block.size - 1;
            out.push_str(" -----------------------------------\n");
            let _ = writeln!(out, "\t{} -> {}", start, end);
            out.push_str(" -----------------------------------\n\n");

            match block.owner {
                None => out.push_str("\tEMPTY\n"),
                Some(pid) => out.push_str(&processes.get_pcb_for(pid).get_process_info()),
            }

            start += block.size;
        }

        out
    }

    fn holes(&self) -> impl Iterator<Item = &MemoryBlock> {
        self.blocks.iter().filter(|block| block.is_hole())
    }

    fn find_hole(&self, size: usize) -> Option<usize> {
        let mut candidates = self
            .blocks
            .iter()
            .enumerate()
            .filter(|(_, block)| block.is_hole() && block.size >= size);

        match self.strategy {
            FitStrategy::FirstFit => candidates.next().map(|(idx, _)| idx),
            FitStrategy::BestFit => candidates
                .min_by_key(|(_, block)| block.size)
                .map(|(idx, _)| idx),
        }
    }

    fn address_at(&self, idx: usize) -> usize {
        self.blocks[..idx].iter().map(MemoryBlock::get_size).sum()
    }

    /// Collapses every run of adjacent holes into a single hole.
    fn merge(&mut self) {
        let mut merged: Vec<MemoryBlock> = Vec::with_capacity(self.blocks.len());

        for block in self.blocks.drain(..) {
            match merged.last_mut() {
                Some(last) if last.is_hole() && block.is_hole() => last.size += block.size,
                _ => merged.push(block),
            }
        }

        self.blocks = merged;
    }
}
