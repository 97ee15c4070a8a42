//! Kernel of the VBOS simulator: processes, round-robin scheduling, swapping,
//! the linked-block file system, device drivers and the interrupt loop.

pub mod config;
pub mod console;
pub mod drivers;
pub mod error;
pub mod fs;
pub mod interrupts;
pub mod kernel;
pub mod process;
pub mod program;
pub mod scheduler;
pub mod trace;

pub use config::{Config, ConfigError};
pub use console::{Console, PROMPT, RecordingConsole, StdConsole};
pub use error::KernelError;
pub use fs::{FileSystem, FsError};
pub use interrupts::Pulse;
pub use kernel::{Devices, IoOperation, IoOutcome, Kernel, KernelStats};
pub use process::{Pcb, ProcessInfo, ProcessState};
pub use trace::{HostLog, TraceEntry};
