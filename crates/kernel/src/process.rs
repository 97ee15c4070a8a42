use std::fmt;

use types::{Interrupt, MemoryError, Mode, Pid};
use vm::{Frame, Registers};

use crate::console::PROMPT;
use crate::error::KernelError;
use crate::fs::FsError;
use crate::kernel::Kernel;
use crate::program;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    New,
    Ready,
    Running,
    /// Reserved for I/O blocking; nothing moves a process here yet.
    Waiting,
    Terminated,
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProcessState::New => "New",
            ProcessState::Ready => "Ready",
            ProcessState::Running => "Running",
            ProcessState::Waiting => "Waiting",
            ProcessState::Terminated => "Terminated",
        };
        f.pad(name)
    }
}

/// Process control block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pcb {
    pub pid: Pid,
    pub priority: u32,
    pub state: ProcessState,
    /// Partition in main memory, or `None` while the image sits in the swap slot.
    pub frame: Option<Frame>,
    /// Registers saved at the last context switch.
    pub regs: Registers,
}

impl Pcb {
    pub fn new(pid: Pid, priority: u32) -> Self {
        Self {
            pid,
            priority,
            state: ProcessState::New,
            frame: None,
            regs: Registers::default(),
        }
    }

    pub fn is_resident(&self) -> bool {
        self.frame.is_some()
    }
}

/// One row of the process listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInfo {
    pub pid: Pid,
    pub priority: u32,
    pub state: ProcessState,
    pub resident: bool,
    pub frame: Option<Frame>,
    pub pc: u16,
}

impl fmt::Display for ProcessInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let location = match self.frame {
            Some(frame) => format!("{:04X}-{:04X}", frame.base, frame.limit),
            None => "swap".to_string(),
        };
        write!(
            f,
            "{:>4} {:<10} {:>3} {:<9} PC={:04X}",
            self.pid.as_u32(),
            self.state,
            self.priority,
            location,
            self.pc
        )
    }
}

impl Kernel {
    /// Loads a program and creates its PCB in the New state.
    ///
    /// The image goes into a free partition when one exists, otherwise into
    /// the swap slot. With both taken the request fails with `OutOfMemory`
    /// and a memory-error interrupt is queued so the user hears about it.
    pub fn new_process(&mut self, source: &str) -> Result<Pid, KernelError> {
        if self.halted {
            return Err(KernelError::Halted);
        }
        let image = program::parse(source)?;
        let limit = self.config.address_space;
        if image.len() > limit {
            return Err(KernelError::ProgramTooLarge {
                len: image.len(),
                limit,
            });
        }

        let pid = Pid(self.next_pid);
        let mut pcb = Pcb::new(pid, self.config.default_priority);
        if self.mmu.free_frame_count() > 0 {
            let frame = self.mmu.allocate(pid)?;
            if let Err(fault) = self.mmu.load_frame(pid, &image) {
                self.mmu.deallocate(pid);
                return Err(fault.into());
            }
            pcb.frame = Some(frame);
        } else {
            let mut padded = image;
            padded.resize(limit, 0);
            match self.fs.write_swap(pid, &padded) {
                Ok(()) => self.trace(format!("process {} created in the swap slot", pid)),
                Err(FsError::SwapBusy(owner)) => {
                    self.trace(format!("no room for a new process, swap held by {}", owner));
                    self.raise(Interrupt::MemoryError(MemoryError::OutOfMemory));
                    return Err(KernelError::OutOfMemory);
                }
                Err(e) => {
                    self.trace(format!("no room for a new process, swap unusable: {}", e));
                    self.raise(Interrupt::MemoryError(MemoryError::OutOfMemory));
                    return Err(e.into());
                }
            }
        }

        self.next_pid += 1;
        self.pcb_display.update_pcb_display(&pcb);
        self.resident.insert(pid, pcb);
        self.trace(format!("created process {}", pid));
        Ok(pid)
    }

    /// Moves a New (or otherwise idle) process onto the ready queue.
    pub fn schedule(&mut self, pid: Pid) -> Result<(), KernelError> {
        if self.active == Some(pid) || self.scheduler.contains(pid) {
            return Err(KernelError::AlreadyScheduled(pid));
        }
        let pcb = self
            .resident
            .get_mut(&pid)
            .ok_or(KernelError::NoSuchProcess(pid))?;
        // Preempted but its context switch is still pending.
        if pcb.state == ProcessState::Running {
            return Err(KernelError::AlreadyScheduled(pid));
        }
        pcb.state = ProcessState::Ready;
        self.pcb_display.update_pcb_display(pcb);
        self.scheduler.enqueue(pid);
        self.trace(format!("scheduled process {}", pid));
        Ok(())
    }

    /// Schedules every resident process that is not already queued or running,
    /// in pid order. Returns the pids scheduled.
    pub fn run_all(&mut self) -> Vec<Pid> {
        let idle: Vec<Pid> = self
            .resident
            .keys()
            .copied()
            .filter(|pid| self.active != Some(*pid) && !self.scheduler.contains(*pid))
            .collect();
        idle.into_iter()
            .filter(|pid| self.schedule(*pid).is_ok())
            .collect()
    }

    pub fn kill(&mut self, pid: Pid) -> Result<(), KernelError> {
        if !self.resident.contains_key(&pid) {
            return Err(KernelError::NoSuchProcess(pid));
        }
        self.terminate(pid);
        Ok(())
    }

    /// Process listing, in pid order.
    pub fn processes(&self) -> Vec<ProcessInfo> {
        self.resident
            .values()
            .map(|pcb| {
                let pc = if self.active == Some(pcb.pid) {
                    self.cpu.regs.pc
                } else {
                    pcb.regs.pc
                };
                ProcessInfo {
                    pid: pcb.pid,
                    priority: pcb.priority,
                    state: pcb.state,
                    resident: pcb.is_resident(),
                    frame: pcb.frame,
                    pc,
                }
            })
            .collect()
    }

    /// Removes a process for good: its partition, swap image, queue slot and PCB.
    pub(crate) fn terminate(&mut self, pid: Pid) {
        let Some(mut pcb) = self.resident.remove(&pid) else {
            self.trace(format!("terminate: no process {}", pid));
            return;
        };
        self.scheduler.remove(pid);
        if self.active == Some(pid) {
            pcb.regs = self.cpu.snapshot();
            self.cpu.init();
            self.active = None;
            self.mmu.set_active(None);
            self.mmu.set_mode(Mode::Kernel);
        }
        self.mmu.deallocate(pid);
        self.fs.release_swap(pid);

        pcb.state = ProcessState::Terminated;
        pcb.frame = None;
        self.pcb_display.update_pcb_display(&pcb);
        self.status_bar
            .update_status_message(&format!("Process {} terminated", pid));
        self.trace(format!("terminated process {}", pid));

        self.console.advance_line();
        self.console.put_text(PROMPT);
    }
}
