use std::collections::VecDeque;

use types::{Interrupt, MemoryError, Mode, Pid, SysCall};
use vm::decoder::disassemble;
use vm::{CpuTrap, Instruction, MemoryFault, Mmu, StepOutcome, CPU};

/// Loads `image` into a fresh partition for `pid` and dispatches it in user mode.
fn boot(pid: Pid, image: &[u8]) -> (CPU, Mmu) {
    let mut mmu = Mmu::new(768, 256);
    mmu.allocate(pid).unwrap();
    mmu.load_frame(pid, image).unwrap();
    mmu.set_active(Some(pid));
    mmu.set_mode(Mode::User);

    let mut cpu = CPU::new();
    cpu.init();
    cpu.is_executing = true;
    (cpu, mmu)
}

#[test]
fn load_store_add_then_break() {
    // LDA #5; STA $0020; ADC $0020; BRK
    let program = [0xA9, 0x05, 0x8D, 0x20, 0x00, 0x6D, 0x20, 0x00, 0x00];
    let (mut cpu, mut mmu) = boot(Pid(0), &program);

    let (cycles, raised) = cpu.run_with_trace(&mut mmu, 100).unwrap();

    assert_eq!(cycles, 4);
    assert_eq!(cpu.regs.acc, 10);
    assert!(!cpu.is_executing);
    assert_eq!(mmu.read(0x20).unwrap(), 5);
    assert_eq!(raised, VecDeque::from([Interrupt::ProcessComplete(Pid(0))]));
    println!("✅ {}", cpu.dump_registers());
}

#[test]
fn counting_loop_with_compare_and_branch() {
    // LDX #3; loop: INC $0010; CPX $0010; BNE loop; BRK
    let program = [
        0xA2, 0x03, 0xEE, 0x10, 0x00, 0xEC, 0x10, 0x00, 0xD0, 0xF8, 0x00,
    ];
    let (mut cpu, mut mmu) = boot(Pid(1), &program);

    let (cycles, raised) = cpu.run_with_trace(&mut mmu, 1000).unwrap();

    assert_eq!(mmu.read(0x10).unwrap(), 3);
    assert!(cpu.regs.zflag);
    // LDX + 3 * (INC, CPX, BNE) + BRK
    assert_eq!(cycles, 1 + 9 + 1);
    assert_eq!(raised.back(), Some(&Interrupt::ProcessComplete(Pid(1))));
}

#[test]
fn branch_to_self_never_finishes() {
    let (mut cpu, mut mmu) = boot(Pid(0), &[0xD0, 0xFE]);
    for _ in 0..50 {
        let outcome = cpu.cycle(&mut mmu, &mut VecDeque::<Interrupt>::new()).unwrap();
        assert_eq!(outcome, StepOutcome::Executed(Instruction::Bne(-2)));
        assert_eq!(cpu.regs.pc, 0);
    }
    assert!(cpu.is_executing);
}

#[test]
fn backward_branch_wraps_around_the_partition() {
    let (mut cpu, mut mmu) = boot(Pid(0), &[0xD0, 0xF0]);
    cpu.cycle(&mut mmu, &mut VecDeque::<Interrupt>::new()).unwrap();
    // PC is 2 after the operand; 2 - 16 wraps to 242.
    assert_eq!(cpu.regs.pc, 242);
}

#[test]
fn branch_not_taken_when_zero_flag_set() {
    let (mut cpu, mut mmu) = boot(Pid(0), &[0xD0, 0x10, 0xEA]);
    cpu.regs.zflag = true;
    cpu.cycle(&mut mmu, &mut VecDeque::<Interrupt>::new()).unwrap();
    assert_eq!(cpu.regs.pc, 2);
}

#[test]
fn sys_raises_print_interrupts() {
    // LDX #1; LDY #42; SYS; LDX #2; LDY #$10; SYS; LDX #9; SYS; BRK
    let program = [
        0xA2, 0x01, 0xA0, 0x2A, 0xFF, 0xA2, 0x02, 0xA0, 0x10, 0xFF, 0xA2, 0x09, 0xFF, 0x00,
    ];
    let (mut cpu, mut mmu) = boot(Pid(2), &program);
    let (_, raised) = cpu.run_with_trace(&mut mmu, 100).unwrap();

    assert_eq!(
        raised,
        VecDeque::from([
            Interrupt::SystemCall(SysCall::PrintInteger(42)),
            Interrupt::SystemCall(SysCall::PrintString(0x10)),
            Interrupt::ProcessComplete(Pid(2)),
        ])
    );
}

#[test]
fn load_from_memory_variants() {
    // LDX $0010; LDY $0011; LDA $0012; BRK; data at 0x10
    let mut program = vec![0xAE, 0x10, 0x00, 0xAC, 0x11, 0x00, 0xAD, 0x12, 0x00, 0x00];
    program.resize(0x10, 0xEA);
    program.extend_from_slice(&[7, 8, 9]);
    let (mut cpu, mut mmu) = boot(Pid(0), &program);

    cpu.run_with_trace(&mut mmu, 100).unwrap();
    assert_eq!((cpu.regs.x, cpu.regs.y, cpu.regs.acc), (7, 8, 9));
}

#[test]
fn arithmetic_wraps() {
    // LDA #$FF; ADC $0010; INC $0011; BRK
    let mut program = vec![0xA9, 0xFF, 0x6D, 0x10, 0x00, 0xEE, 0x11, 0x00, 0x00];
    program.resize(0x10, 0);
    program.extend_from_slice(&[2, 0xFF]);
    let (mut cpu, mut mmu) = boot(Pid(0), &program);

    cpu.run_with_trace(&mut mmu, 100).unwrap();
    assert_eq!(cpu.regs.acc, 1);
    assert_eq!(mmu.read(0x11).unwrap(), 0);
}

#[test]
fn out_of_range_access_raises_memory_error() {
    // LDA $0100: one past the end of a 256 byte partition.
    let (mut cpu, mut mmu) = boot(Pid(5), &[0xAD, 0x00, 0x01]);
    let mut raised: VecDeque<Interrupt> = VecDeque::new();

    let outcome = cpu.cycle(&mut mmu, &mut raised).unwrap();

    let fault = MemoryFault::AccessViolation {
        pid: Pid(5),
        address: 256,
    };
    assert_eq!(outcome, StepOutcome::Faulted(fault));
    assert!(!cpu.is_executing);
    assert_eq!(
        raised,
        VecDeque::from([Interrupt::MemoryError(MemoryError::AccessViolation {
            pid: Pid(5),
            address: 256
        })])
    );
    assert_eq!(cpu.cycle(&mut mmu, &mut raised).unwrap(), StepOutcome::Halted);
}

#[test]
fn store_past_limit_does_not_touch_neighbour() {
    let mut mmu = Mmu::new(768, 256);
    mmu.allocate(Pid(0)).unwrap();
    mmu.allocate(Pid(1)).unwrap();
    // STA $0100 from pid 0 would land on pid 1's first byte.
    mmu.load_frame(Pid(0), &[0xA9, 0x55, 0x8D, 0x00, 0x01]).unwrap();
    mmu.set_active(Some(Pid(0)));
    mmu.set_mode(Mode::User);

    let mut cpu = CPU::new();
    cpu.is_executing = true;
    cpu.run_with_trace(&mut mmu, 10).unwrap();

    mmu.set_mode(Mode::Kernel);
    assert_eq!(mmu.read(256).unwrap(), 0);
}

#[test]
fn unknown_opcode_is_a_trap() {
    let (mut cpu, mut mmu) = boot(Pid(0), &[0xEA, 0x02]);
    let mut raised: VecDeque<Interrupt> = VecDeque::new();
    cpu.cycle(&mut mmu, &mut raised).unwrap();
    assert_eq!(
        cpu.cycle(&mut mmu, &mut raised),
        Err(CpuTrap::InvalidOpcode { opcode: 0x02, pc: 1 })
    );
}

#[test]
fn disassembly_listing() {
    let listing = disassemble(&[0xA9, 0x01, 0x8D, 0x34, 0x12, 0xFF, 0x00]);
    let text: Vec<String> = listing.iter().map(|(_, i)| i.pretty_print()).collect();
    assert_eq!(text, vec!["LDA #$01", "STA $1234", "SYS", "BRK"]);
}
