use std::collections::VecDeque;

use types::{Interrupt, Mode, Pid};
use vm::CpuTrap;

use crate::error::KernelError;
use crate::interrupts::Pulse;
use crate::kernel::Kernel;
use crate::process::ProcessState;

/// Round-robin bookkeeping: the ready queue and the running process's cycle count.
#[derive(Debug)]
pub struct Scheduler {
    quantum: u32,
    cycles: u32,
    ready_queue: VecDeque<Pid>,
}

impl Scheduler {
    pub fn new(quantum: u32) -> Self {
        Self {
            quantum: quantum.max(1),
            cycles: 0,
            ready_queue: VecDeque::new(),
        }
    }

    pub fn quantum(&self) -> u32 {
        self.quantum
    }

    pub fn set_quantum(&mut self, quantum: u32) -> Result<(), KernelError> {
        if quantum == 0 {
            return Err(KernelError::InvalidQuantum);
        }
        self.quantum = quantum;
        Ok(())
    }

    /// Cycles the running process has used of its quantum.
    pub fn cycles(&self) -> u32 {
        self.cycles
    }

    pub fn reset_cycles(&mut self) {
        self.cycles = 0;
    }

    /// Charges one scheduler tick to the running process. Returns true, and
    /// starts a new count, once it has already had `quantum` cycles.
    pub fn quantum_expired(&mut self) -> bool {
        if self.cycles >= self.quantum {
            self.cycles = 0;
            true
        } else {
            self.cycles += 1;
            false
        }
    }

    /// Appends `pid` unless it is already queued.
    pub fn enqueue(&mut self, pid: Pid) -> bool {
        if self.contains(pid) {
            return false;
        }
        self.ready_queue.push_back(pid);
        true
    }

    pub fn dequeue(&mut self) -> Option<Pid> {
        self.ready_queue.pop_front()
    }

    pub fn remove(&mut self, pid: Pid) -> bool {
        let before = self.ready_queue.len();
        self.ready_queue.retain(|queued| *queued != pid);
        before != self.ready_queue.len()
    }

    pub fn contains(&self, pid: Pid) -> bool {
        self.ready_queue.contains(&pid)
    }

    pub fn ready_queue(&self) -> &VecDeque<Pid> {
        &self.ready_queue
    }

    pub fn is_empty(&self) -> bool {
        self.ready_queue.is_empty()
    }
}

impl Kernel {
    pub fn set_quantum(&mut self, quantum: u32) -> Result<(), KernelError> {
        self.scheduler.set_quantum(quantum)?;
        self.config.quantum = quantum;
        self.trace(format!("quantum set to {}", quantum));
        Ok(())
    }

    /// One scheduler step, taken on pulses with no pending interrupt.
    ///
    /// A running process either executes one cycle or, with its quantum used
    /// up, is stopped and a context switch is queued for it. Otherwise the
    /// next ready process is swapped in if needed and dispatched.
    pub(crate) fn do_execute(&mut self) -> Result<Pulse, CpuTrap> {
        if let Some(pid) = self.active {
            if self.scheduler.quantum_expired() {
                self.cpu.is_executing = false;
                self.interrupts.push_back(Interrupt::ContextSwitch(pid));
                self.active = None;
                self.mmu.set_active(None);
                self.mmu.set_mode(Mode::Kernel);
                self.trace(format!("quantum expired for process {}", pid));
                return Ok(Pulse::Preempted(pid));
            }
            self.trace("CPU cycle");
            self.cpu.cycle(&mut self.mmu, &mut self.interrupts)?;
            self.stats.cycles += 1;
            return Ok(Pulse::Cycle(pid));
        }

        if let Some(pid) = self.scheduler.dequeue() {
            let resident = match self.resident.get(&pid) {
                Some(pcb) => pcb.is_resident(),
                None => {
                    self.trace(format!("dropping stale ready entry {}", pid));
                    return Ok(Pulse::Idle);
                }
            };
            if !resident {
                if let Err(e) = self.swap_in(pid) {
                    self.report_error(&format!("could not swap in process {}: {}", pid, e));
                    self.terminate(pid);
                    return Ok(Pulse::Idle);
                }
            }
            self.do_dispatch(pid);
            return Ok(Pulse::Dispatched(pid));
        }

        self.trace_idle();
        Ok(Pulse::Idle)
    }

    /// Puts `pid` on the CPU in user mode.
    pub(crate) fn do_dispatch(&mut self, pid: Pid) {
        let Some(pcb) = self.resident.get_mut(&pid) else {
            return;
        };
        self.cpu.restore(pcb.regs);
        self.cpu.is_executing = true;
        pcb.state = ProcessState::Running;
        self.pcb_display.update_pcb_display(pcb);

        self.active = Some(pid);
        self.mmu.set_active(Some(pid));
        self.mmu.set_mode(Mode::User);
        self.scheduler.reset_cycles();
        self.status_bar
            .update_status_message(&format!("Running process {}", pid));
        self.trace(format!("dispatched process {}", pid));
    }

    /// Saves the preempted process and sends it to the back of the ready queue.
    ///
    /// Only a process stopped by `do_execute` qualifies: it is off the CPU but
    /// its PCB still says `Running`, and `schedule` refuses it until this runs.
    pub(crate) fn context_switch(&mut self, pid: Pid) {
        if self.active == Some(pid) {
            self.trace(format!("ignoring context switch for process {}", pid));
            return;
        }
        let Some(pcb) = self.resident.get_mut(&pid) else {
            self.trace(format!("ignoring context switch for exited process {}", pid));
            return;
        };
        if pcb.state != ProcessState::Running {
            let state = pcb.state;
            self.trace(format!("ignoring context switch for {} process {}", state, pid));
            return;
        }
        pcb.regs = self.cpu.snapshot();
        pcb.state = ProcessState::Ready;
        self.pcb_display.update_pcb_display(pcb);

        self.cpu.is_executing = false;
        self.scheduler.enqueue(pid);
        self.stats.context_switches += 1;
        self.trace(format!("context switch: process {} to the ready queue", pid));
    }

    /// Brings a swapped-out process into memory.
    ///
    /// Uses a free partition if there is one. Otherwise the lowest resident
    /// pid is written to the swap slot and its partition handed over.
    pub(crate) fn swap_in(&mut self, pid: Pid) -> Result<(), KernelError> {
        let image = self.fs.read_swap(pid)?;

        let frame = if self.mmu.free_frame_count() > 0 {
            let frame = self.mmu.allocate(pid)?;
            self.mmu.load_frame(pid, &image)?;
            self.fs.release_swap(pid);
            self.trace(format!("swapped in process {}", pid));
            frame
        } else {
            let victim = self
                .mmu
                .mappings()
                .map(|(resident, _)| *resident)
                .find(|resident| *resident != pid && self.active != Some(*resident))
                .ok_or(KernelError::OutOfMemory)?;
            let outgoing = self.mmu.read_frame(victim)?;

            self.fs.release_swap(pid);
            self.fs.write_swap(victim, &outgoing)?;
            let frame = self.mmu.transfer(victim, pid)?;
            self.mmu.load_frame(pid, &image)?;

            if let Some(pcb) = self.resident.get_mut(&victim) {
                pcb.frame = None;
            }
            self.trace(format!("swapped out process {}, swapped in {}", victim, pid));
            frame
        };

        if let Some(pcb) = self.resident.get_mut(&pid) {
            pcb.frame = Some(frame);
        }
        self.stats.swaps += 1;
        Ok(())
    }
}
