use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use kernel::{Kernel, KernelStats};
use types::Pid;

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub stats: KernelStats,
    /// Pulses spent by this run.
    pub ticks: u64,
    pub halted: bool,
    pub fatal: Option<String>,
    /// Processes still alive when the run stopped.
    pub unfinished: usize,
}

impl RunSummary {
    /// True when every process finished and the machine is still up.
    pub fn is_clean(&self) -> bool {
        !self.halted && self.unfinished == 0
    }
}

/// Reads each program file and creates a process for it.
///
/// A program the kernel refuses (bad hex, too large, out of memory) is
/// reported and skipped; unreadable files are errors.
pub fn load_programs<P: AsRef<Path>>(kernel: &mut Kernel, paths: &[P]) -> Result<Vec<Pid>> {
    let mut pids = Vec::new();
    for path in paths {
        let path = path.as_ref();
        let source = fs::read_to_string(path)
            .with_context(|| format!("failed to read program {}", path.display()))?;
        match kernel.new_process(&source) {
            Ok(pid) => pids.push(pid),
            Err(e) => eprintln!("⚠️  {}: {}", path.display(), e),
        }
    }
    Ok(pids)
}

/// Schedules every loaded process and pulses until nothing is left to do,
/// the machine halts, or `max_ticks` pulses have been spent.
pub fn run_to_completion(kernel: &mut Kernel, max_ticks: u64) -> RunSummary {
    kernel.run_all();
    let ticks = kernel.run(max_ticks);
    RunSummary {
        stats: kernel.stats(),
        ticks,
        halted: kernel.is_halted(),
        fatal: kernel.fatal_error().map(str::to_string),
        unfinished: kernel.processes().len(),
    }
}
