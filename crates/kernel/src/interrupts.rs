use types::{Interrupt, MemoryError, Mode, Pid, SysCall};

use crate::console::PROMPT;
use crate::kernel::Kernel;

/// What one clock pulse did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pulse {
    /// The oldest pending interrupt was serviced.
    Interrupt(Interrupt),
    /// A ready process was put on the CPU.
    Dispatched(Pid),
    /// The running process executed one instruction.
    Cycle(Pid),
    /// The running process used up its quantum; a context switch is queued.
    Preempted(Pid),
    Idle,
    /// The machine is down; nothing was done.
    Halted,
}

/// Fatal error screen, shown line by line before shutdown.
pub const BSOD: &[&str] = &[
    "A problem has been detected and VBOS has been shut down to prevent",
    "damage to your simulated machine.",
    "",
    "KERNEL_TRAP",
    "",
    "If this is the first time you've seen this stop error screen,",
    "reload the machine. If this screen appears again, check the",
    "program that was running for invalid instructions.",
    "",
    "Technical information:",
];

impl Kernel {
    /// Entry point for every clock tick: one interrupt or one scheduler step.
    pub fn on_clock_pulse(&mut self) -> Pulse {
        if self.halted {
            return Pulse::Halted;
        }
        self.stats.ticks += 1;

        if let Some(interrupt) = self.interrupts.pop_front() {
            self.trace(format!("Handling {}", interrupt));
            self.interrupt_handler(interrupt);
            return Pulse::Interrupt(interrupt);
        }

        match self.do_execute() {
            Ok(pulse) => pulse,
            Err(trap) => {
                self.trap_error(&trap.to_string());
                Pulse::Halted
            }
        }
    }

    pub(crate) fn interrupt_handler(&mut self, interrupt: Interrupt) {
        self.stats.interrupts += 1;
        match interrupt {
            Interrupt::Timer => self.timer_isr(),
            Interrupt::Keyboard { key_code, shifted } => self.keyboard_isr(key_code, shifted),
            Interrupt::SystemCall(call) => self.system_call_isr(call),
            Interrupt::ProcessComplete(pid) => self.terminate(pid),
            Interrupt::MemoryError(error) => self.memory_error_isr(error),
            Interrupt::ContextSwitch(pid) => self.context_switch(pid),
            Interrupt::Unrecognized { irq } => {
                self.trap_error(&format!("Invalid Interrupt Request. irq={}", irq))
            }
        }
    }

    fn timer_isr(&mut self) {
        self.trace("timer tick");
    }

    fn keyboard_isr(&mut self, key_code: u8, shifted: bool) {
        match self.keyboard.translate(key_code, shifted) {
            Some(ch) => self.input.push_back(ch),
            None => self.trace(format!("ignoring key code {}", key_code)),
        }
        self.console.handle_input(&mut self.input);
    }

    fn system_call_isr(&mut self, call: SysCall) {
        match call {
            SysCall::PrintInteger(value) => self.console.put_text(&value.to_string()),
            SysCall::PrintString(offset) => self.print_string(offset),
            SysCall::Unsupported(number) => {
                self.trace(format!("ignoring unsupported system call {}", number))
            }
        }
    }

    /// Prints the NUL-terminated string at `offset` in the active process's
    /// partition. Reads in kernel mode and never past the partition limit.
    fn print_string(&mut self, offset: u16) {
        let Some(pid) = self.active else {
            self.trace("print string with no active process");
            return;
        };
        let Some(frame) = self.mmu.frame_of(pid) else {
            self.trace(format!("print string: process {} has no partition", pid));
            return;
        };
        let start = frame.base + offset as usize;
        if !frame.contains(start) {
            self.raise(Interrupt::MemoryError(MemoryError::AccessViolation {
                pid,
                address: start,
            }));
            return;
        }

        let previous = self.mmu.mode();
        self.mmu.set_mode(Mode::Kernel);
        let mut text = String::new();
        for address in start..=frame.limit {
            match self.mmu.read(address) {
                Ok(0) | Err(_) => break,
                Ok(byte) => text.push(byte as char),
            }
        }
        self.mmu.set_mode(previous);
        self.console.put_text(&text);
    }

    fn memory_error_isr(&mut self, error: MemoryError) {
        match error {
            MemoryError::AccessViolation { pid, address } => {
                self.console.put_text(&format!(
                    "Memory access violation: process {} reached address 0x{:04X} outside its partition. The process was terminated.",
                    pid, address
                ));
                self.terminate(pid);
            }
            MemoryError::OutOfMemory => {
                self.console.put_text(
                    "Out of memory: every partition and the swap slot are in use. Kill a process and try again.",
                );
                self.console.advance_line();
                self.console.put_text(PROMPT);
            }
        }
    }

    /// Fatal trap: log it, show the error screen, and shut down.
    pub(crate) fn trap_error(&mut self, message: &str) {
        self.host_log("OS", format!("🚨 OS ERROR - TRAP: {}", message));
        self.fatal = Some(message.to_string());
        self.status_bar.update_status_message("FATAL ERROR");

        self.console.clear_screen();
        for line in BSOD {
            self.console.put_text(line);
            self.console.advance_line();
        }
        self.console.put_text(&format!("*** STOP: {}", message));
        self.console.advance_line();
        self.shutdown();
    }

    /// Stops the CPU and interrupt processing. Every later pulse is a no-op.
    pub fn shutdown(&mut self) {
        if self.halted {
            return;
        }
        self.host_log("OS", "begin shutdown OS");
        self.cpu.init();
        self.active = None;
        self.mmu.set_active(None);
        self.mmu.set_mode(Mode::Kernel);
        self.interrupts.clear();
        self.halted = true;
        self.host_log("OS", "end shutdown OS");
    }
}
