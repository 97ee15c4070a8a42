use std::collections::VecDeque;
use std::fmt;

/// Entries kept before the oldest are dropped.
pub const TRACE_CAPACITY: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceEntry {
    pub clock: u64,
    pub source: &'static str,
    pub message: String,
}

impl fmt::Display for TraceEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:>6}] {:<4} | {}", self.clock, self.source, self.message)
    }
}

/// Bounded host log. Everything is recorded; only `verbose` logs reach stdout.
#[derive(Debug)]
pub struct HostLog {
    entries: VecDeque<TraceEntry>,
    capacity: usize,
    verbose: bool,
}

impl HostLog {
    pub fn new(capacity: usize, verbose: bool) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(TRACE_CAPACITY)),
            capacity: capacity.max(1),
            verbose,
        }
    }

    pub fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    /// Records and, when verbose, echoes.
    pub fn record(&mut self, clock: u64, source: &'static str, message: impl Into<String>) {
        let verbose = self.verbose;
        let entry = self.push(clock, source, message.into());
        if verbose {
            println!("{}", entry);
        }
    }

    /// Records without echoing.
    pub fn record_quiet(&mut self, clock: u64, source: &'static str, message: impl Into<String>) {
        self.push(clock, source, message.into());
    }

    fn push(&mut self, clock: u64, source: &'static str, message: String) -> &TraceEntry {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(TraceEntry {
            clock,
            source,
            message,
        });
        &self.entries[self.entries.len() - 1]
    }

    pub fn entries(&self) -> impl Iterator<Item = &TraceEntry> {
        self.entries.iter()
    }

    pub fn last(&self) -> Option<&TraceEntry> {
        self.entries.back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True if any retained message contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.entries.iter().any(|e| e.message.contains(needle))
    }
}
