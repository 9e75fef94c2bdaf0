//! Latest `/proc/stat` snapshot.

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::ProcResult;
use crate::parsers::proc_stat::{CpuJiffies, ProcStatData, ProcStatFileParser};
use crate::source::FileSource;

/// Holds the most recent successful `/proc/stat` parse.
///
/// No history is kept; delta computation belongs to
/// [`crate::statistics::CpuUsageAccumulator`].
#[derive(Debug, Clone)]
pub struct CpuState<F: FileSource> {
    parser: ProcStatFileParser<F>,
    data: ProcStatData,
}

impl<F: FileSource> CpuState<F> {
    pub fn new(parser: ProcStatFileParser<F>) -> Self {
        Self {
            parser,
            data: ProcStatData::default(),
        }
    }

    /// Re-reads `/proc/stat`. A failed parse leaves the previous snapshot intact.
    pub fn update_state(&mut self) -> ProcResult<()> {
        let mut fresh = ProcStatData::default();
        self.parser.parse(&mut fresh)?;
        debug!(
            "CpuState updated: total jiffies={}, cores={}",
            fresh.jiffies.total(),
            fresh.per_cpu.len()
        );
        self.data = fresh;
        Ok(())
    }

    pub fn get_cpu_jiffies(&self) -> &CpuJiffies {
        &self.data.jiffies
    }

    pub fn get_per_cpu_jiffies(&self) -> &BTreeMap<usize, CpuJiffies> {
        &self.data.per_cpu
    }

    pub fn get_os_start_time(&self) -> u64 {
        self.data.os_start_time
    }
}
