use std::collections::VecDeque;

use types::Interrupt;

use crate::cpu::{CpuTrap, StepOutcome, CPU};
use crate::mmu::Mmu;

impl CPU {
    /// Runs until the CPU stops executing or `max_cycles` is reached, collecting
    /// every interrupt raised on the way. Used for bare-metal runs without a kernel.
    pub fn run_with_trace(
        &mut self,
        mmu: &mut Mmu,
        max_cycles: usize,
    ) -> Result<(usize, VecDeque<Interrupt>), CpuTrap> {
        let mut raised: VecDeque<Interrupt> = VecDeque::new();
        let mut cycles = 0;

        if self.verbose {
            println!("--- Begin execution trace ---");
        }
        while cycles < max_cycles {
            match self.cycle(mmu, &mut raised)? {
                StepOutcome::Halted => break,
                StepOutcome::Executed(_) | StepOutcome::Faulted(_) => cycles += 1,
            }
        }
        if self.verbose {
            println!("--- End execution trace ---");
            println!("{}", self.dump_registers());
        }
        Ok((cycles, raised))
    }

    pub fn dump_registers(&self) -> String {
        format!("Registers: {} running={}", self.regs, self.is_executing)
    }
}
