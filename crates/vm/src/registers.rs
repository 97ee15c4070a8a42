use std::fmt;

/// The CPU register file. Saved into and restored from a PCB on every context switch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Registers {
    /// Program counter. Relative to the frame base while in user mode.
    pub pc: u16,
    /// Accumulator
    pub acc: u8,
    pub x: u8,
    pub y: u8,
    /// Zero flag, set by CPX on equality.
    pub zflag: bool,
}

impl fmt::Display for Registers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PC={:04X} ACC={:02X} X={:02X} Y={:02X} Z={}",
            self.pc, self.acc, self.x, self.y, self.zflag as u8
        )
    }
}
