use kernel::{
    Config, Devices, FsError, Kernel, KernelError, ProcessState, Pulse, RecordingConsole,
};
use types::{Interrupt, MemoryError, Pid};
use vm::Frame;

/// Branches to itself forever.
const SPIN: &str = "D0 FE";

fn boot() -> (Kernel, RecordingConsole) {
    let console = RecordingConsole::new();
    let kernel = Kernel::with_devices(Config::default(), Devices::with_console(console.clone()))
        .expect("default config boots");
    (kernel, console)
}

fn pulses(kernel: &mut Kernel, count: usize) -> Vec<Pulse> {
    (0..count).map(|_| kernel.on_clock_pulse()).collect()
}

/// Pulses until `pid` is on the CPU.
fn run_until_active(kernel: &mut Kernel, pid: Pid) {
    for _ in 0..500 {
        if kernel.active() == Some(pid) {
            return;
        }
        kernel.on_clock_pulse();
    }
    panic!("process {} never dispatched", pid);
}

#[test]
fn process_runs_exactly_one_quantum() {
    let (mut kernel, _) = boot();
    kernel.set_quantum(3).unwrap();
    let pid = kernel.new_process(SPIN).unwrap();
    kernel.schedule(pid).unwrap();

    let seen = pulses(&mut kernel, 14);
    let expected = vec![
        Pulse::Dispatched(pid),
        Pulse::Cycle(pid),
        Pulse::Cycle(pid),
        Pulse::Cycle(pid),
        Pulse::Preempted(pid),
        Pulse::Interrupt(Interrupt::ContextSwitch(pid)),
        Pulse::Dispatched(pid),
        Pulse::Cycle(pid),
        Pulse::Cycle(pid),
        Pulse::Cycle(pid),
        Pulse::Preempted(pid),
        Pulse::Interrupt(Interrupt::ContextSwitch(pid)),
        Pulse::Dispatched(pid),
        Pulse::Cycle(pid),
    ];
    assert_eq!(seen, expected);
    assert_eq!(kernel.stats().cycles, 7);
    assert_eq!(kernel.stats().context_switches, 2);
    println!("✅ quantum of 3 enforced");
}

#[test]
fn quantum_holds_for_any_setting() {
    for quantum in 1..=8u32 {
        let (mut kernel, _) = boot();
        kernel.set_quantum(quantum).unwrap();
        let pid = kernel.new_process(SPIN).unwrap();
        kernel.schedule(pid).unwrap();

        let mut cycles = 0;
        let mut runs = Vec::new();
        for pulse in pulses(&mut kernel, 100) {
            match pulse {
                Pulse::Cycle(_) => cycles += 1,
                Pulse::Preempted(_) => {
                    runs.push(cycles);
                    cycles = 0;
                }
                _ => {}
            }
        }
        assert!(!runs.is_empty());
        assert!(runs.iter().all(|run| *run == quantum), "quantum {}: {:?}", quantum, runs);
    }
}

#[test]
fn ready_processes_take_turns() {
    let (mut kernel, _) = boot();
    kernel.set_quantum(2).unwrap();
    let first = kernel.new_process(SPIN).unwrap();
    let second = kernel.new_process(SPIN).unwrap();
    assert_eq!(kernel.run_all(), vec![first, second]);
    assert_eq!(kernel.ready_queue(), vec![first, second]);

    let order: Vec<Pid> = pulses(&mut kernel, 20)
        .into_iter()
        .filter_map(|pulse| match pulse {
            Pulse::Dispatched(pid) => Some(pid),
            _ => None,
        })
        .collect();
    assert_eq!(order, vec![first, second, first, second]);
}

#[test]
fn context_switch_saves_registers() {
    let (mut kernel, _) = boot();
    kernel.set_quantum(4).unwrap();
    // LDA #7, then spin.
    let pid = kernel.new_process("A9 07 D0 FE").unwrap();
    kernel.schedule(pid).unwrap();

    pulses(&mut kernel, 7);
    assert_eq!(kernel.active(), None);
    let pcb = kernel.pcb(pid).unwrap();
    assert_eq!(pcb.state, ProcessState::Ready);
    assert_eq!(pcb.regs.acc, 7);
    assert_eq!(pcb.regs.pc, 2);
    assert_eq!(kernel.ready_queue(), vec![pid]);

    kernel.on_clock_pulse();
    assert_eq!(kernel.active(), Some(pid));
    assert_eq!(kernel.cpu().regs.acc, 7);
}

#[test]
fn fourth_process_waits_in_swap() {
    let (mut kernel, console) = boot();
    kernel.format().unwrap();
    let spinners: Vec<Pid> = (0..3).map(|_| kernel.new_process(SPIN).unwrap()).collect();
    // LDX #1, LDY #4, SYS, BRK: prints 4.
    let last = kernel.new_process("A2 01 A0 04 FF 00").unwrap();

    assert_eq!(last, Pid(3));
    assert_eq!(kernel.mmu().free_frame_count(), 0);
    assert!(!kernel.pcb(last).unwrap().is_resident());
    assert_eq!(kernel.fs().swap_owner(), Some(last));

    let first_frame = kernel.pcb(spinners[0]).unwrap().frame;
    assert_eq!(first_frame, Some(Frame::new(0, 255)));
    kernel.run_all();

    // Dispatching the swapped process evicts the lowest resident pid.
    run_until_active(&mut kernel, last);
    assert_eq!(kernel.pcb(last).unwrap().frame, first_frame);
    assert!(!kernel.pcb(spinners[0]).unwrap().is_resident());
    assert_eq!(kernel.fs().swap_owner(), Some(spinners[0]));
    assert_eq!(kernel.stats().swaps, 1);

    // Once it finishes, the evicted process comes back into the free partition.
    run_until_active(&mut kernel, spinners[0]);
    assert!(kernel.pcb(last).is_none());
    assert!(kernel.pcb(spinners[0]).unwrap().is_resident());
    assert_eq!(kernel.fs().swap_owner(), None);
    assert_eq!(kernel.stats().swaps, 2);
    assert!(console.output().contains("4\n> "));

    for pid in spinners {
        kernel.kill(pid).unwrap();
    }
    assert_eq!(kernel.mmu().free_frame_count(), 3);
    println!("✅ swap in/out round trip");
}

#[test]
fn swapped_process_keeps_its_image() {
    let (mut kernel, console) = boot();
    kernel.format().unwrap();
    for _ in 0..3 {
        kernel.new_process(SPIN).unwrap();
    }
    // LDX #2, LDY #8, SYS, BRK, then "OK" at offset 8.
    let pid = kernel
        .new_process("A2 02 A0 08 FF 00 00 00 4F 4B 00")
        .unwrap();
    kernel.schedule(pid).unwrap();

    kernel.run(50);
    assert!(kernel.pcb(pid).is_none());
    assert!(console.output().contains("OK"));
}

#[test]
fn memory_and_swap_full_is_out_of_memory() {
    let (mut kernel, console) = boot();
    kernel.format().unwrap();
    for _ in 0..4 {
        kernel.new_process(SPIN).unwrap();
    }

    let err = kernel.new_process(SPIN).unwrap_err();
    assert!(matches!(err, KernelError::OutOfMemory));
    assert_eq!(kernel.pending_interrupts(), 1);
    assert!(!console.output().contains("Out of memory"));

    kernel.on_clock_pulse();
    assert!(console.output().contains("Out of memory"));
    assert!(console.output().ends_with("> "));

    // The failed request did not use up a pid.
    kernel.kill(Pid(0)).unwrap();
    assert_eq!(kernel.new_process(SPIN).unwrap(), Pid(4));
}

#[test]
fn swap_needs_a_formatted_disk() {
    let (mut kernel, console) = boot();
    for _ in 0..3 {
        kernel.new_process(SPIN).unwrap();
    }
    let err = kernel.new_process(SPIN).unwrap_err();
    assert!(matches!(err, KernelError::Fs(FsError::NotFormatted)));

    // The user still hears that memory ran out.
    assert_eq!(kernel.pending_interrupts(), 1);
    assert_eq!(
        kernel.on_clock_pulse(),
        Pulse::Interrupt(Interrupt::MemoryError(MemoryError::OutOfMemory))
    );
    assert!(console.output().contains("Out of memory"));
}

#[test]
fn format_is_refused_while_swap_is_held() {
    let (mut kernel, console) = boot();
    kernel.format().unwrap();
    let spinners: Vec<Pid> = (0..3).map(|_| kernel.new_process(SPIN).unwrap()).collect();
    let last = kernel.new_process("A2 01 A0 04 FF 00").unwrap();

    let err = kernel.format().unwrap_err();
    assert!(matches!(err, KernelError::Fs(FsError::SwapBusy(owner)) if owner == last));
    assert!(console.output().contains("Error: cannot format the disk"));
    assert_eq!(kernel.fs().swap_owner(), Some(last));

    // The swapped process still runs to completion.
    kernel.run_all();
    for _ in 0..500 {
        if kernel.pcb(last).is_none() {
            break;
        }
        kernel.on_clock_pulse();
    }
    assert!(kernel.pcb(last).is_none());
    assert!(console.output().contains("4\n> "));
    assert!(!console.output().contains("could not swap in"));

    for pid in spinners {
        kernel.kill(pid).unwrap();
    }
    assert_eq!(kernel.fs().swap_owner(), None);
    kernel.format().unwrap();
}

#[test]
fn preempted_process_waits_for_its_context_switch() {
    let (mut kernel, _) = boot();
    kernel.set_quantum(3).unwrap();
    // Eight NOPs, then BRK.
    let pid = kernel
        .new_process(&format!("{}00", "EA ".repeat(8)))
        .unwrap();
    kernel.schedule(pid).unwrap();
    assert_eq!(pulses(&mut kernel, 5).last(), Some(&Pulse::Preempted(pid)));

    assert!(matches!(
        kernel.schedule(pid),
        Err(KernelError::AlreadyScheduled(_))
    ));
    assert!(kernel.run_all().is_empty());
    assert!(kernel.ready_queue().is_empty());

    assert_eq!(
        kernel.on_clock_pulse(),
        Pulse::Interrupt(Interrupt::ContextSwitch(pid))
    );
    assert_eq!(kernel.pcb(pid).unwrap().regs.pc, 3);
    assert_eq!(kernel.ready_queue(), vec![pid]);

    assert_eq!(kernel.on_clock_pulse(), Pulse::Dispatched(pid));
    assert_eq!(kernel.cpu().regs.pc, 3);
}

#[test]
fn stale_context_switch_is_ignored() {
    let (mut kernel, _) = boot();
    kernel.raise_irq(5, &[42]);
    assert_eq!(
        kernel.on_clock_pulse(),
        Pulse::Interrupt(Interrupt::ContextSwitch(Pid(42)))
    );
    assert!(kernel.ready_queue().is_empty());
    assert!(kernel.log().contains("ignoring context switch"));

    let pid = kernel.new_process(SPIN).unwrap();
    kernel.schedule(pid).unwrap();
    kernel.raise(Interrupt::ContextSwitch(pid));
    kernel.on_clock_pulse();
    assert_eq!(kernel.ready_queue(), vec![pid]);
    assert_eq!(kernel.stats().context_switches, 0);
}

#[test]
fn pids_are_never_reused() {
    let (mut kernel, _) = boot();
    let first = kernel.new_process("00").unwrap();
    kernel.kill(first).unwrap();
    let second = kernel.new_process("00").unwrap();
    assert_eq!(first, Pid(0));
    assert_eq!(second, Pid(1));
}

#[test]
fn kill_removes_running_and_queued_processes() {
    let (mut kernel, console) = boot();
    let running = kernel.new_process(SPIN).unwrap();
    let queued = kernel.new_process(SPIN).unwrap();
    kernel.run_all();
    pulses(&mut kernel, 2);
    assert_eq!(kernel.active(), Some(running));

    kernel.kill(queued).unwrap();
    assert!(kernel.ready_queue().is_empty());

    kernel.kill(running).unwrap();
    assert_eq!(kernel.active(), None);
    assert_eq!(kernel.mmu().free_frame_count(), 3);
    assert!(kernel.processes().is_empty());
    assert!(console.output().ends_with("> "));

    assert!(matches!(
        kernel.kill(Pid(9)),
        Err(KernelError::NoSuchProcess(Pid(9)))
    ));
    assert_eq!(kernel.on_clock_pulse(), Pulse::Idle);
}

#[test]
fn scheduling_errors() {
    let (mut kernel, _) = boot();
    let pid = kernel.new_process(SPIN).unwrap();
    kernel.schedule(pid).unwrap();
    assert!(matches!(
        kernel.schedule(pid),
        Err(KernelError::AlreadyScheduled(_))
    ));
    kernel.on_clock_pulse();
    assert!(matches!(
        kernel.schedule(pid),
        Err(KernelError::AlreadyScheduled(_))
    ));
    assert!(matches!(
        kernel.schedule(Pid(7)),
        Err(KernelError::NoSuchProcess(_))
    ));
    assert!(matches!(kernel.set_quantum(0), Err(KernelError::InvalidQuantum)));
    assert_eq!(kernel.config().quantum, 6);
}

#[test]
fn process_listing() {
    let (mut kernel, _) = boot();
    kernel.format().unwrap();
    let running = kernel.new_process(SPIN).unwrap();
    let fresh = kernel.new_process(SPIN).unwrap();
    kernel.new_process(SPIN).unwrap();
    let swapped = kernel.new_process(SPIN).unwrap();
    kernel.schedule(running).unwrap();
    kernel.on_clock_pulse();

    let rows = kernel.processes();
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[0].pid, running);
    assert_eq!(rows[0].state, ProcessState::Running);
    assert_eq!(rows[1].pid, fresh);
    assert_eq!(rows[1].state, ProcessState::New);
    assert_eq!(rows[1].frame, Some(Frame::new(256, 511)));
    assert!(!rows[3].resident);

    let line = rows[3].to_string();
    assert!(line.contains("swap"), "{}", line);
    assert!(line.starts_with(&format!("{:>4}", swapped.as_u32())));
    assert!(rows[1].to_string().contains("0100-01FF"));
}

#[test]
fn program_source_is_checked() {
    let (mut kernel, _) = boot();
    assert!(matches!(
        kernel.new_process("A9 3"),
        Err(KernelError::InvalidProgram(_))
    ));
    assert!(matches!(
        kernel.new_process("LDA 03"),
        Err(KernelError::InvalidProgram(_))
    ));
    assert!(matches!(kernel.new_process("  "), Err(KernelError::InvalidProgram(_))));
    assert!(matches!(
        kernel.new_process(&"EA ".repeat(257)),
        Err(KernelError::ProgramTooLarge { len: 257, limit: 256 })
    ));
    assert_eq!(
        kernel::program::parse("A903 8d\n00").unwrap(),
        vec![0xA9, 0x03, 0x8D, 0x00]
    );
    // A full partition is fine.
    kernel.new_process(&"EA ".repeat(256)).unwrap();
}
