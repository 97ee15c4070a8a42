use core::fmt;

use crate::Pid;

pub const TIMER_IRQ: u8 = 0;
pub const KEYBOARD_IRQ: u8 = 1;
pub const SYSTEM_CALL_IRQ: u8 = 2;
pub const PROCESS_COMPLETE_IRQ: u8 = 3;
pub const MEMORY_ERROR_IRQ: u8 = 4;
pub const CONTEXT_SWITCH_IRQ: u8 = 5;

/// Raw memory-error codes carried in the first parameter of a `MEMORY_ERROR_IRQ`.
pub const OUT_OF_MEMORY_ERROR: i64 = -1;
pub const ACCESS_VIOLATION_ERROR: i64 = -2;

/// System services a program can request with the `SYS` instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SysCall {
    /// X = 1: print the integer held in Y.
    PrintInteger(u8),
    /// X = 2: print the NUL-terminated string at the address held in Y.
    PrintString(u16),
    /// Any other call number. Ignored by the kernel.
    Unsupported(u32),
}

impl SysCall {
    pub fn number(&self) -> u32 {
        match self {
            SysCall::PrintInteger(_) => 1,
            SysCall::PrintString(_) => 2,
            SysCall::Unsupported(n) => *n,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemoryError {
    AccessViolation { pid: Pid, address: usize },
    OutOfMemory,
}

/// An event crossing the CPU/kernel boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Interrupt {
    Timer,
    Keyboard { key_code: u8, shifted: bool },
    SystemCall(SysCall),
    ProcessComplete(Pid),
    MemoryError(MemoryError),
    ContextSwitch(Pid),
    /// A request whose IRQ number has no handler. Dispatching it is a fatal trap.
    Unrecognized { irq: u8 },
}

impl Interrupt {
    pub fn irq(&self) -> u8 {
        match self {
            Interrupt::Timer => TIMER_IRQ,
            Interrupt::Keyboard { .. } => KEYBOARD_IRQ,
            Interrupt::SystemCall(_) => SYSTEM_CALL_IRQ,
            Interrupt::ProcessComplete(_) => PROCESS_COMPLETE_IRQ,
            Interrupt::MemoryError(_) => MEMORY_ERROR_IRQ,
            Interrupt::ContextSwitch(_) => CONTEXT_SWITCH_IRQ,
            Interrupt::Unrecognized { irq } => *irq,
        }
    }

    /// Builds an interrupt from a host-style IRQ number and parameter list.
    ///
    /// Missing parameters read as zero. Unknown IRQ numbers (and memory-error
    /// codes) become `Unrecognized` so the dispatcher can trap on them.
    pub fn from_raw(irq: u8, params: &[i64]) -> Interrupt {
        let param = |idx: usize| params.get(idx).copied().unwrap_or(0);
        match irq {
            TIMER_IRQ => Interrupt::Timer,
            KEYBOARD_IRQ => Interrupt::Keyboard {
                key_code: param(0) as u8,
                shifted: param(1) != 0,
            },
            SYSTEM_CALL_IRQ => Interrupt::SystemCall(match param(0) {
                1 => SysCall::PrintInteger(param(1) as u8),
                2 => SysCall::PrintString(param(1) as u16),
                other => SysCall::Unsupported(other as u32),
            }),
            PROCESS_COMPLETE_IRQ => Interrupt::ProcessComplete(Pid(param(0) as u32)),
            MEMORY_ERROR_IRQ => match param(0) {
                ACCESS_VIOLATION_ERROR => Interrupt::MemoryError(MemoryError::AccessViolation {
                    pid: Pid(param(1) as u32),
                    address: param(2) as usize,
                }),
                OUT_OF_MEMORY_ERROR => Interrupt::MemoryError(MemoryError::OutOfMemory),
                _ => Interrupt::Unrecognized { irq },
            },
            CONTEXT_SWITCH_IRQ => Interrupt::ContextSwitch(Pid(param(0) as u32)),
            _ => Interrupt::Unrecognized { irq },
        }
    }
}

impl fmt::Display for Interrupt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Interrupt::Timer => write!(f, "IRQ~{} timer", TIMER_IRQ),
            Interrupt::Keyboard { key_code, shifted } => {
                write!(f, "IRQ~{} keyboard [{}, {}]", KEYBOARD_IRQ, key_code, shifted)
            }
            Interrupt::SystemCall(call) => {
                write!(f, "IRQ~{} system call {}", SYSTEM_CALL_IRQ, call.number())
            }
            Interrupt::ProcessComplete(pid) => {
                write!(f, "IRQ~{} process complete pid={}", PROCESS_COMPLETE_IRQ, pid)
            }
            Interrupt::MemoryError(MemoryError::AccessViolation { pid, address }) => write!(
                f,
                "IRQ~{} access violation pid={} addr=0x{:04x}",
                MEMORY_ERROR_IRQ, pid, address
            ),
            Interrupt::MemoryError(MemoryError::OutOfMemory) => {
                write!(f, "IRQ~{} out of memory", MEMORY_ERROR_IRQ)
            }
            Interrupt::ContextSwitch(pid) => {
                write!(f, "IRQ~{} context switch pid={}", CONTEXT_SWITCH_IRQ, pid)
            }
            Interrupt::Unrecognized { irq } => write!(f, "IRQ~{} unrecognized", irq),
        }
    }
}
