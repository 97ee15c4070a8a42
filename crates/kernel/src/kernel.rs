use std::collections::{BTreeMap, VecDeque};

use storage::BlockStore;
use types::{Interrupt, Pid};
use vm::{CPU, MemoryDisplay, Mmu, NoopDisplay};

use crate::config::Config;
use crate::console::{Console, StdConsole};
use crate::drivers::{
    DeviceDriver, DriverStatus, Geometry, HddDriver, KeyboardDriver, MemoryDisplayDriver,
    NoopPcbDisplay, NoopStatusBar, PcbDisplay, PcbDisplayDriver, StatusBar, StatusBarDriver,
};
use crate::error::KernelError;
use crate::fs::{FileSystem, FsError, normalize_filename};
use crate::process::Pcb;
use crate::scheduler::Scheduler;
use crate::trace::{HostLog, TRACE_CAPACITY};

/// Counters kept across the life of the machine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KernelStats {
    /// Clock pulses accepted.
    pub ticks: u64,
    /// CPU instructions executed.
    pub cycles: u64,
    pub idle_ticks: u64,
    pub context_switches: u64,
    pub interrupts: u64,
    /// Processes brought back from the swap slot.
    pub swaps: u64,
}

/// The host devices the kernel talks to. Defaults print to stdout and drop
/// display updates.
pub struct Devices {
    pub console: Box<dyn Console>,
    pub memory_display: Box<dyn MemoryDisplay>,
    pub status_bar: Box<dyn StatusBar>,
    pub pcb_display: Box<dyn PcbDisplay>,
    /// Existing disk contents; a blank drive when `None`.
    pub disk: Option<BlockStore>,
}

impl Default for Devices {
    fn default() -> Self {
        Self {
            console: Box::new(StdConsole),
            memory_display: Box::new(NoopDisplay),
            status_bar: Box::new(NoopStatusBar),
            pcb_display: Box::new(NoopPcbDisplay),
            disk: None,
        }
    }
}

impl Devices {
    pub fn with_console(console: impl Console + 'static) -> Self {
        Self {
            console: Box::new(console),
            ..Self::default()
        }
    }
}

/// File operation codes accepted by `perform_io`.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoOperation {
    Create = 0,
    Read = 1,
    Write = 2,
    Delete = 3,
}

impl TryFrom<u8> for IoOperation {
    type Error = KernelError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(IoOperation::Create),
            1 => Ok(IoOperation::Read),
            2 => Ok(IoOperation::Write),
            3 => Ok(IoOperation::Delete),
            other => Err(KernelError::InvalidOperation(other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IoOutcome {
    Created(String),
    Read(Vec<u8>),
    /// Bytes written and the number of blocks now in the file's chain.
    Written { bytes: usize, blocks: usize },
    /// Data blocks returned to the free list.
    Deleted(usize),
}

/// The whole simulated machine: CPU, memory, disk and every piece of kernel
/// state. One call to `on_clock_pulse` performs exactly one unit of work.
#[derive(Debug)]
pub struct Kernel {
    pub(crate) config: Config,
    pub(crate) cpu: CPU,
    pub(crate) mmu: Mmu,
    pub(crate) fs: FileSystem,
    pub(crate) scheduler: Scheduler,
    /// Every created, not yet terminated process.
    pub(crate) resident: BTreeMap<Pid, Pcb>,
    pub(crate) active: Option<Pid>,
    pub(crate) interrupts: VecDeque<Interrupt>,
    pub(crate) input: VecDeque<char>,
    pub(crate) next_pid: u32,
    pub(crate) console: Box<dyn Console>,
    pub(crate) keyboard: KeyboardDriver,
    pub(crate) status_bar: StatusBarDriver,
    pub(crate) pcb_display: PcbDisplayDriver,
    pub(crate) drivers: Vec<(&'static str, DriverStatus)>,
    pub(crate) log: HostLog,
    pub(crate) stats: KernelStats,
    pub(crate) halted: bool,
    pub(crate) fatal: Option<String>,
}

impl Kernel {
    pub fn new(config: Config) -> Result<Self, KernelError> {
        Self::with_devices(config, Devices::default())
    }

    /// Validates `config`, loads every driver and boots an idle machine.
    pub fn with_devices(config: Config, devices: Devices) -> Result<Self, KernelError> {
        config.validate()?;

        let geometry = Geometry {
            tracks: config.tracks,
            sectors: config.sectors,
            blocks: config.blocks,
            block_size: config.block_size,
        };
        let store = devices
            .disk
            .unwrap_or_else(|| BlockStore::new(config.block_size));

        let mut log = HostLog::new(TRACE_CAPACITY, config.verbose);
        log.record(0, "HOST", "bootstrap");

        let mut keyboard = KeyboardDriver::new();
        let mut hdd = HddDriver::with_store(store, geometry);
        let mut memory_display = MemoryDisplayDriver::new(devices.memory_display);
        let mut status_bar = StatusBarDriver::new(devices.status_bar);
        let mut pcb_display = PcbDisplayDriver::new(devices.pcb_display);

        let mut drivers = Vec::new();
        {
            let all: [&mut dyn DeviceDriver; 5] = [
                &mut keyboard,
                &mut hdd,
                &mut memory_display,
                &mut status_bar,
                &mut pcb_display,
            ];
            for driver in all {
                log.record(0, "OS", format!("Loading the {} driver.", driver.name()));
                driver.driver_entry();
                log.record(0, "OS", format!("{} driver {:?}", driver.name(), driver.status()));
                drivers.push((driver.name(), driver.status()));
            }
        }

        let mut cpu = CPU::new();
        cpu.init();
        cpu.verbose = config.verbose;

        let mmu = Mmu::with_display(
            config.memory_size,
            config.address_space,
            Box::new(memory_display),
        );
        let fs = FileSystem::new(hdd, config.swap_blocks());
        let scheduler = Scheduler::new(config.quantum);

        let mut kernel = Self {
            config,
            cpu,
            mmu,
            fs,
            scheduler,
            resident: BTreeMap::new(),
            active: None,
            interrupts: VecDeque::new(),
            input: VecDeque::new(),
            next_pid: 0,
            console: devices.console,
            keyboard,
            status_bar,
            pcb_display,
            drivers,
            log,
            stats: KernelStats::default(),
            halted: false,
            fatal: None,
        };
        kernel.status_bar.update_status_message("Kernel ready");
        kernel.trace("kernel bootstrap complete");
        Ok(kernel)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn cpu(&self) -> &CPU {
        &self.cpu
    }

    pub fn mmu(&self) -> &Mmu {
        &self.mmu
    }

    pub fn fs(&self) -> &FileSystem {
        &self.fs
    }

    pub fn log(&self) -> &HostLog {
        &self.log
    }

    pub fn stats(&self) -> KernelStats {
        self.stats
    }

    pub fn active(&self) -> Option<Pid> {
        self.active
    }

    pub fn pcb(&self, pid: Pid) -> Option<&Pcb> {
        self.resident.get(&pid)
    }

    pub fn ready_queue(&self) -> Vec<Pid> {
        self.scheduler.ready_queue().iter().copied().collect()
    }

    pub fn pending_interrupts(&self) -> usize {
        self.interrupts.len()
    }

    pub fn drivers(&self) -> &[(&'static str, DriverStatus)] {
        &self.drivers
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Message of the trap that brought the machine down, if any.
    pub fn fatal_error(&self) -> Option<&str> {
        self.fatal.as_deref()
    }

    pub fn set_verbose(&mut self, verbose: bool) {
        self.config.verbose = verbose;
        self.cpu.verbose = verbose;
        self.log.set_verbose(verbose);
    }

    /// Queues an interrupt for a later pulse.
    pub fn raise(&mut self, interrupt: Interrupt) {
        self.interrupts.push_back(interrupt);
    }

    /// Queues an interrupt from a raw IRQ number and parameter list.
    pub fn raise_irq(&mut self, irq: u8, params: &[i64]) {
        self.raise(Interrupt::from_raw(irq, params));
    }

    /// True while anything is running, ready or pending.
    pub fn has_work(&self) -> bool {
        self.active.is_some() || !self.scheduler.is_empty() || !self.interrupts.is_empty()
    }

    /// Pulses the clock until there is no work, the machine halts, or
    /// `max_ticks` pulses have been spent. Returns the pulses used.
    pub fn run(&mut self, max_ticks: u64) -> u64 {
        let mut ticks = 0;
        while ticks < max_ticks && !self.halted && self.has_work() {
            self.on_clock_pulse();
            ticks += 1;
        }
        ticks
    }

    /// Lays down a fresh file system. Refused while a live process's image
    /// sits in the swap slot, since formatting would erase it.
    pub fn format(&mut self) -> Result<(), KernelError> {
        if let Some(owner) = self.fs.swap_owner() {
            let e = FsError::SwapBusy(owner);
            self.report_error(&format!("cannot format the disk: {}", e));
            return Err(e.into());
        }
        self.fs.format();
        self.trace("disk formatted");
        self.console.put_text("Disk formatted.");
        self.console.advance_line();
        Ok(())
    }

    pub fn list_files(&mut self) -> Result<Vec<String>, KernelError> {
        match self.fs.list_files() {
            Ok(names) => {
                if names.is_empty() {
                    self.console.put_text("No files.");
                    self.console.advance_line();
                }
                for name in &names {
                    self.console.put_text(name);
                    self.console.advance_line();
                }
                Ok(names)
            }
            Err(e) => {
                self.report_error(&e.to_string());
                Err(e.into())
            }
        }
    }

    /// Runs one file operation and reports the result on the console.
    pub fn perform_io(
        &mut self,
        op: IoOperation,
        filename: &str,
        data: &[u8],
    ) -> Result<IoOutcome, KernelError> {
        let result = self.io(op, filename, data);
        match &result {
            Ok(IoOutcome::Created(name)) => self.console.put_text(&format!("Created {}.", name)),
            Ok(IoOutcome::Read(content)) => {
                self.console.put_text(&String::from_utf8_lossy(content))
            }
            Ok(IoOutcome::Written { bytes, .. }) => self
                .console
                .put_text(&format!("Wrote {} bytes to {}.", bytes, filename.to_uppercase())),
            Ok(IoOutcome::Deleted(_)) => self
                .console
                .put_text(&format!("Deleted {}.", filename.to_uppercase())),
            Err(e) => self.console.put_text(&format!("Error: {}", e)),
        }
        self.console.advance_line();
        result
    }

    fn io(&mut self, op: IoOperation, filename: &str, data: &[u8]) -> Result<IoOutcome, KernelError> {
        if !self.fs.is_formatted() {
            return Err(FsError::NotFormatted.into());
        }
        let name = normalize_filename(filename, self.fs.max_filename_len())?;
        self.trace(format!("I/O {:?} {}", op, name));
        let outcome = match op {
            IoOperation::Create => {
                self.fs.create(&name)?;
                IoOutcome::Created(name)
            }
            IoOperation::Read => IoOutcome::Read(self.fs.read(&name)?),
            IoOperation::Write => IoOutcome::Written {
                bytes: data.len(),
                blocks: self.fs.write(&name, data)?,
            },
            IoOperation::Delete => IoOutcome::Deleted(self.fs.delete(&name)?),
        };
        Ok(outcome)
    }

    pub(crate) fn report_error(&mut self, message: &str) {
        self.console.put_text(&format!("Error: {}", message));
        self.console.advance_line();
    }

    /// Records a host message regardless of the trace switch.
    pub(crate) fn host_log(&mut self, source: &'static str, message: impl Into<String>) {
        self.log.record(self.stats.ticks, source, message);
    }

    pub(crate) fn trace(&mut self, message: impl Into<String>) {
        if self.config.trace {
            self.log.record(self.stats.ticks, "OS", message);
        }
    }

    /// Idle pulses are always counted; only every tenth is echoed.
    pub(crate) fn trace_idle(&mut self) {
        self.stats.idle_ticks += 1;
        if !self.config.trace {
            return;
        }
        if self.stats.idle_ticks % 10 == 0 {
            self.log.record(self.stats.ticks, "OS", "Idle");
        } else {
            self.log.record_quiet(self.stats.ticks, "OS", "Idle");
        }
    }
}
