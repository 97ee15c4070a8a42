use thiserror::Error;
use types::{Interrupt, MemoryError, SysCall};

use crate::decoder::decode;
use crate::instruction::Instruction;
use crate::isa::Opcode;
use crate::mmu::{MemoryFault, Mmu};
use crate::registers::Registers;
use crate::sys_call::{InterruptSink, SYSCALL_PRINT_INTEGER, SYSCALL_PRINT_STRING};

/// Failures that cannot be handed back to the running program.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum CpuTrap {
    #[error("invalid opcode 0x{opcode:02X} at PC 0x{pc:04X}")]
    InvalidOpcode { opcode: u8, pc: u16 },
    #[error(transparent)]
    Memory(#[from] MemoryFault),
}

/// What a single `cycle` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Executed(Instruction),
    /// The CPU was not executing; nothing happened.
    Halted,
    /// The instruction was aborted by a range check and a memory-error
    /// interrupt has been raised.
    Faulted(MemoryFault),
}

/// The virtual 6502-style CPU.
///
/// EDUCATIONAL PURPOSE: this is the classic fetch, decode, execute loop. The
/// CPU owns nothing but its register file; every byte it touches goes
/// through the MMU, which decides (based on the current mode and the active
/// process) which physical byte an address names and whether the access is
/// allowed at all.
///
/// REAL CPU COMPARISON: a real 6502 has a stack pointer, a status register
/// with seven flags and ~150 opcodes. We only keep the accumulator, X, Y and
/// a single zero flag, which is enough to write loops and print results.
#[derive(Debug, Default)]
pub struct CPU {
    pub regs: Registers,

    /// Set while a process is dispatched. Cleared by BRK, by preemption and by
    /// a memory fault.
    pub is_executing: bool,

    /// Print each instruction as it executes.
    pub verbose: bool,
}

impl CPU {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zeroes every register and stops execution.
    pub fn init(&mut self) {
        self.regs = Registers::default();
        self.is_executing = false;
    }

    /// Register snapshot for a PCB.
    pub fn snapshot(&self) -> Registers {
        self.regs
    }

    pub fn restore(&mut self, regs: Registers) {
        self.regs = regs;
    }

    /// Executes one instruction.
    ///
    /// Access violations are recoverable: they stop the CPU, raise a
    /// memory-error interrupt and return `StepOutcome::Faulted`. Anything else
    /// that goes wrong (an unknown opcode, an MMU invariant) is returned as a
    /// `CpuTrap` and is fatal to the machine.
    pub fn cycle(
        &mut self,
        mmu: &mut Mmu,
        irq: &mut dyn InterruptSink,
    ) -> Result<StepOutcome, CpuTrap> {
        if !self.is_executing {
            return Ok(StepOutcome::Halted);
        }

        match self.step(mmu, irq) {
            Ok(instr) => Ok(StepOutcome::Executed(instr)),
            Err(CpuTrap::Memory(fault @ MemoryFault::AccessViolation { pid, address })) => {
                self.is_executing = false;
                irq.raise(Interrupt::MemoryError(MemoryError::AccessViolation {
                    pid,
                    address,
                }));
                Ok(StepOutcome::Faulted(fault))
            }
            Err(trap) => Err(trap),
        }
    }

    fn step(&mut self, mmu: &mut Mmu, irq: &mut dyn InterruptSink) -> Result<Instruction, CpuTrap> {
        // Fetch
        let start = self.regs.pc;
        let byte = self.fetch(mmu)?;

        // Decode
        let opcode = Opcode::try_from(byte)
            .map_err(|opcode| CpuTrap::InvalidOpcode { opcode, pc: start })?;
        let mut operands = [0u8; 2];
        for slot in operands.iter_mut().take(opcode.operand_len()) {
            *slot = self.fetch(mmu)?;
        }
        let instr = decode(opcode, &operands[..opcode.operand_len()])
            .ok_or(CpuTrap::InvalidOpcode { opcode: byte, pc: start })?;

        if self.verbose {
            println!("PC = 0x{:04x}, Instr = {}", start, instr.pretty_print());
        }

        // Execute
        self.execute(instr, mmu, irq)?;
        Ok(instr)
    }

    fn fetch(&mut self, mmu: &Mmu) -> Result<u8, MemoryFault> {
        let byte = mmu.read(self.regs.pc as usize)?;
        self.regs.pc = self.regs.pc.wrapping_add(1);
        Ok(byte)
    }

    fn execute(
        &mut self,
        instr: Instruction,
        mmu: &mut Mmu,
        irq: &mut dyn InterruptSink,
    ) -> Result<(), MemoryFault> {
        match instr {
            Instruction::LdaImm(value) => self.regs.acc = value,
            Instruction::LdaAbs(addr) => self.regs.acc = mmu.read(addr as usize)?,
            Instruction::StaAbs(addr) => mmu.write(addr as usize, self.regs.acc)?,
            Instruction::AdcAbs(addr) => {
                let value = mmu.read(addr as usize)?;
                self.regs.acc = self.regs.acc.wrapping_add(value);
            }
            Instruction::LdxImm(value) => self.regs.x = value,
            Instruction::LdxAbs(addr) => self.regs.x = mmu.read(addr as usize)?,
            Instruction::LdyImm(value) => self.regs.y = value,
            Instruction::LdyAbs(addr) => self.regs.y = mmu.read(addr as usize)?,
            Instruction::Nop => {}
            Instruction::Brk => {
                self.is_executing = false;
                if let Some(pid) = mmu.active() {
                    irq.raise(Interrupt::ProcessComplete(pid));
                }
            }
            Instruction::CpxAbs(addr) => {
                let value = mmu.read(addr as usize)?;
                self.regs.zflag = self.regs.x == value;
            }
            Instruction::Bne(offset) => {
                if !self.regs.zflag {
                    let space = mmu.frame_size().max(1) as i64;
                    let target = (self.regs.pc as i64 + offset as i64).rem_euclid(space);
                    self.regs.pc = target as u16;
                }
            }
            Instruction::IncAbs(addr) => {
                let value = mmu.read(addr as usize)?;
                mmu.write(addr as usize, value.wrapping_add(1))?;
            }
            Instruction::Sys => match self.regs.x {
                SYSCALL_PRINT_INTEGER => {
                    irq.raise(Interrupt::SystemCall(SysCall::PrintInteger(self.regs.y)));
                }
                SYSCALL_PRINT_STRING => {
                    irq.raise(Interrupt::SystemCall(SysCall::PrintString(self.regs.y as u16)));
                }
                _ => {}
            },
        }
        Ok(())
    }
}
