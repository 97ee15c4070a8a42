/// A decoded instruction with its operand.
///
/// Absolute operands are addresses as the program sees them: relative to its
/// own partition while it runs in user mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    LdaImm(u8),
    LdaAbs(u16),
    StaAbs(u16),
    AdcAbs(u16),
    LdxImm(u8),
    LdxAbs(u16),
    LdyImm(u8),
    LdyAbs(u16),
    Nop,
    Brk,
    CpxAbs(u16),
    Bne(i8),
    IncAbs(u16),
    Sys,
}

impl Instruction {
    /// Encoded length in bytes, opcode included.
    pub fn size(&self) -> usize {
        match self {
            Instruction::Nop | Instruction::Brk | Instruction::Sys => 1,
            Instruction::LdaImm(_)
            | Instruction::LdxImm(_)
            | Instruction::LdyImm(_)
            | Instruction::Bne(_) => 2,
            _ => 3,
        }
    }

    pub fn pretty_print(&self) -> String {
        match self {
            Instruction::LdaImm(v) => format!("LDA #${:02X}", v),
            Instruction::LdaAbs(a) => format!("LDA ${:04X}", a),
            Instruction::StaAbs(a) => format!("STA ${:04X}", a),
            Instruction::AdcAbs(a) => format!("ADC ${:04X}", a),
            Instruction::LdxImm(v) => format!("LDX #${:02X}", v),
            Instruction::LdxAbs(a) => format!("LDX ${:04X}", a),
            Instruction::LdyImm(v) => format!("LDY #${:02X}", v),
            Instruction::LdyAbs(a) => format!("LDY ${:04X}", a),
            Instruction::Nop => "NOP".to_string(),
            Instruction::Brk => "BRK".to_string(),
            Instruction::CpxAbs(a) => format!("CPX ${:04X}", a),
            Instruction::Bne(off) => format!("BNE {}", off),
            Instruction::IncAbs(a) => format!("INC ${:04X}", a),
            Instruction::Sys => "SYS".to_string(),
        }
    }
}
