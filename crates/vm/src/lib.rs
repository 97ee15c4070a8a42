pub mod cpu;
pub mod decoder;
pub mod host_interface;
pub mod instruction;
pub mod isa;
pub mod memory;
pub mod mmu;
pub mod registers;
pub mod runner;
pub mod sys_call;

pub use cpu::{CpuTrap, StepOutcome, CPU};
pub use host_interface::{MemoryDisplay, NoopDisplay};
pub use instruction::Instruction;
pub use memory::Memory;
pub use mmu::{Frame, MemoryFault, Mmu};
pub use registers::Registers;
pub use sys_call::InterruptSink;
