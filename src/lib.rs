//! Simulator of a preemptive priority CPU scheduler, a contiguous memory
//! allocator and per-device FIFO queues, driven one command at a time.

pub mod io;
pub mod kernel;
