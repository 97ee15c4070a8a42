//! Host side of the VBOS simulator.
//!
//! This crate plays the part of the shell: it
//! - loads program files into fresh processes and pulses the kernel until
//!   they finish,
//! - replays disk scripts through the kernel's I/O dispatcher.

pub mod runner;
pub mod script;

pub use runner::{RunSummary, load_programs, run_to_completion};
pub use script::{DiskCommand, execute, parse_script};
