//! Latest `/proc/meminfo` counters.

use crate::error::ProcResult;
use crate::parsers::meminfo::{MeminfoCounters, ProcMeminfoParser};
use crate::source::FileSource;

#[derive(Debug, Clone)]
pub struct MemoryState<F: FileSource> {
    parser: ProcMeminfoParser<F>,
    counters: MeminfoCounters,
}

impl<F: FileSource> MemoryState<F> {
    pub fn new(parser: ProcMeminfoParser<F>) -> Self {
        Self {
            parser,
            counters: MeminfoCounters::default(),
        }
    }

    pub fn update_state(&mut self) -> ProcResult<()> {
        let mut fresh = MeminfoCounters::default();
        self.parser.parse(&mut fresh)?;
        self.counters = fresh;
        Ok(())
    }

    /// Counter value in bytes; 0 for names the kernel did not report.
    pub fn get(&self, key: &str) -> u64 {
        self.counters.get(key).copied().unwrap_or(0)
    }

    pub fn counters(&self) -> &MeminfoCounters {
        &self.counters
    }

    pub fn mem_total(&self) -> u64 {
        self.get("MemTotal")
    }

    pub fn mem_free(&self) -> u64 {
        self.get("MemFree")
    }

    pub fn mem_available(&self) -> u64 {
        self.get("MemAvailable")
    }

    pub fn swap_free(&self) -> u64 {
        self.get("SwapFree")
    }

    /// Free physical memory plus free swap.
    pub fn virtual_memory_free(&self) -> u64 {
        self.mem_free().saturating_add(self.swap_free())
    }
}
