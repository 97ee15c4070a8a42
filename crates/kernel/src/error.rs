use thiserror::Error;
use types::Pid;
use vm::{CpuTrap, MemoryFault};

use crate::config::ConfigError;
use crate::fs::FsError;

#[derive(Debug, Error)]
pub enum KernelError {
    #[error("invalid program: {0}")]
    InvalidProgram(String),
    #[error("program is {len} bytes but a partition holds {limit}")]
    ProgramTooLarge { len: usize, limit: usize },
    #[error("out of memory: no free partition and the swap slot is in use")]
    OutOfMemory,
    #[error("no process with PID {0}")]
    NoSuchProcess(Pid),
    #[error("process {0} is already scheduled")]
    AlreadyScheduled(Pid),
    #[error("quantum must be at least 1")]
    InvalidQuantum,
    #[error("unknown I/O operation {0}")]
    InvalidOperation(u8),
    #[error("the machine has halted")]
    Halted,
    #[error(transparent)]
    Fs(#[from] FsError),
    #[error(transparent)]
    Memory(#[from] MemoryFault),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Trap(#[from] CpuTrap),
}
