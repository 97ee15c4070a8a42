/// Opcode byte of every instruction the CPU understands.
///
/// EDUCATIONAL PURPOSE: this is a small subset of the MOS 6502 instruction
/// set. Each opcode is a single byte followed by zero, one or two operand
/// bytes. Two-byte operands are memory addresses stored little-endian (low
/// byte first), exactly like on the real chip.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    /// LDA #nn: load the accumulator with a constant
    LdaImm = 0xA9,
    /// LDA abs: load the accumulator from memory
    LdaAbs = 0xAD,
    /// STA abs: store the accumulator in memory
    StaAbs = 0x8D,
    /// ADC abs: add a byte of memory to the accumulator
    AdcAbs = 0x6D,
    LdxImm = 0xA2,
    LdxAbs = 0xAE,
    LdyImm = 0xA0,
    LdyAbs = 0xAC,
    Nop = 0xEA,
    /// BRK: the program is finished
    Brk = 0x00,
    /// CPX abs: Z = (X == memory)
    CpxAbs = 0xEC,
    /// BNE rr: branch by a signed offset when Z is clear
    Bne = 0xD0,
    IncAbs = 0xEE,
    /// SYS: system call selected by the X register
    Sys = 0xFF,
}

impl Opcode {
    /// Number of operand bytes that follow the opcode.
    pub fn operand_len(self) -> usize {
        match self {
            Opcode::Nop | Opcode::Brk | Opcode::Sys => 0,
            Opcode::LdaImm | Opcode::LdxImm | Opcode::LdyImm | Opcode::Bne => 1,
            Opcode::LdaAbs
            | Opcode::StaAbs
            | Opcode::AdcAbs
            | Opcode::LdxAbs
            | Opcode::LdyAbs
            | Opcode::CpxAbs
            | Opcode::IncAbs => 2,
        }
    }
}

impl TryFrom<u8> for Opcode {
    type Error = u8;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        Ok(match byte {
            0xA9 => Opcode::LdaImm,
            0xAD => Opcode::LdaAbs,
            0x8D => Opcode::StaAbs,
            0x6D => Opcode::AdcAbs,
            0xA2 => Opcode::LdxImm,
            0xAE => Opcode::LdxAbs,
            0xA0 => Opcode::LdyImm,
            0xAC => Opcode::LdyAbs,
            0xEA => Opcode::Nop,
            0x00 => Opcode::Brk,
            0xEC => Opcode::CpxAbs,
            0xD0 => Opcode::Bne,
            0xEE => Opcode::IncAbs,
            0xFF => Opcode::Sys,
            other => return Err(other),
        })
    }
}
