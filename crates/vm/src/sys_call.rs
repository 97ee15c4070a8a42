use std::collections::VecDeque;

use types::Interrupt;

/// SYS call numbers, selected by the X register.
pub const SYSCALL_PRINT_INTEGER: u8 = 1;
pub const SYSCALL_PRINT_STRING: u8 = 2;

/// Where the CPU posts the software interrupts it raises.
///
/// The CPU never services a request itself: printing, process completion and
/// access violations all leave through here and are handled by the kernel on
/// a later clock pulse.
pub trait InterruptSink {
    fn raise(&mut self, interrupt: Interrupt);
}

impl InterruptSink for VecDeque<Interrupt> {
    fn raise(&mut self, interrupt: Interrupt) {
        self.push_back(interrupt);
    }
}

impl InterruptSink for Vec<Interrupt> {
    fn raise(&mut self, interrupt: Interrupt) {
        self.push(interrupt);
    }
}
