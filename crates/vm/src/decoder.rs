use crate::instruction::Instruction;
use crate::isa::Opcode;

/// Builds an instruction from its opcode and the operand bytes that followed it.
///
/// Returns `None` when fewer operand bytes were supplied than the opcode needs.
/// Extra bytes are ignored.
pub fn decode(opcode: Opcode, operands: &[u8]) -> Option<Instruction> {
    let byte = || operands.first().copied();
    let word = || match operands {
        [lo, hi, ..] => Some(u16::from_le_bytes([*lo, *hi])),
        _ => None,
    };

    let instr = match opcode {
        Opcode::LdaImm => Instruction::LdaImm(byte()?),
        Opcode::LdaAbs => Instruction::LdaAbs(word()?),
        Opcode::StaAbs => Instruction::StaAbs(word()?),
        Opcode::AdcAbs => Instruction::AdcAbs(word()?),
        Opcode::LdxImm => Instruction::LdxImm(byte()?),
        Opcode::LdxAbs => Instruction::LdxAbs(word()?),
        Opcode::LdyImm => Instruction::LdyImm(byte()?),
        Opcode::LdyAbs => Instruction::LdyAbs(word()?),
        Opcode::Nop => Instruction::Nop,
        Opcode::Brk => Instruction::Brk,
        Opcode::CpxAbs => Instruction::CpxAbs(word()?),
        Opcode::Bne => Instruction::Bne(byte()? as i8),
        Opcode::IncAbs => Instruction::IncAbs(word()?),
        Opcode::Sys => Instruction::Sys,
    };
    Some(instr)
}

/// Decodes a whole program image, for listings. Stops at the first unknown opcode.
pub fn disassemble(image: &[u8]) -> Vec<(usize, Instruction)> {
    let mut out = Vec::new();
    let mut pc = 0;
    while pc < image.len() {
        let Ok(opcode) = Opcode::try_from(image[pc]) else {
            break;
        };
        let end = (pc + 1 + opcode.operand_len()).min(image.len());
        match decode(opcode, &image[pc + 1..end]) {
            Some(instr) => out.push((pc, instr)),
            None => break,
        }
        pc = end;
    }
    out
}
