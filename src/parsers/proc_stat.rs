//! `/proc/stat` parsing.
//!
//! Only two line kinds are consumed: the aggregate `cpu` line, which fills
//! the ten jiffy categories, and `btime`, the kernel boot time. Per-core
//! `cpuN` lines are kept in a separate map for per-socket statistics and
//! never touch the aggregate.

use std::collections::BTreeMap;
use std::ops::{Index, IndexMut};
use std::path::PathBuf;

use tracing::trace;

use crate::error::{ProcError, ProcResult};
use crate::source::FileSource;

pub const DEFAULT_PROC_STAT_PATH: &str = "/proc/stat";

/// Number of jiffy categories reported on a `/proc/stat` cpu line.
pub const CPU_JIFFIES_MAX: usize = 10;

/// Jiffy categories in `/proc/stat` column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JiffyField {
    User = 0,
    Nice = 1,
    System = 2,
    Idle = 3,
    Iowait = 4,
    Irq = 5,
    Softirq = 6,
    Steal = 7,
    Guest = 8,
    GuestNice = 9,
}

impl JiffyField {
    pub const ALL: [JiffyField; CPU_JIFFIES_MAX] = [
        JiffyField::User,
        JiffyField::Nice,
        JiffyField::System,
        JiffyField::Idle,
        JiffyField::Iowait,
        JiffyField::Irq,
        JiffyField::Softirq,
        JiffyField::Steal,
        JiffyField::Guest,
        JiffyField::GuestNice,
    ];
}

/// Cumulative jiffy counters for one cpu line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuJiffies(pub [u64; CPU_JIFFIES_MAX]);

impl CpuJiffies {
    pub fn total(&self) -> u64 {
        self.0.iter().fold(0u64, |acc, v| acc.saturating_add(*v))
    }

    /// Element-wise sum, used when aggregating a subset of cores.
    pub fn accumulate(&mut self, other: &CpuJiffies) {
        for (slot, value) in self.0.iter_mut().zip(other.0.iter()) {
            *slot = slot.saturating_add(*value);
        }
    }
}

impl Index<JiffyField> for CpuJiffies {
    type Output = u64;

    fn index(&self, field: JiffyField) -> &u64 {
        &self.0[field as usize]
    }
}

impl IndexMut<JiffyField> for CpuJiffies {
    fn index_mut(&mut self, field: JiffyField) -> &mut u64 {
        &mut self.0[field as usize]
    }
}

/// Result of one `/proc/stat` parse.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcStatData {
    pub jiffies: CpuJiffies,
    /// Kernel boot time in seconds since the epoch.
    pub os_start_time: u64,
    pub per_cpu: BTreeMap<usize, CpuJiffies>,
}

/// Parses `/proc/stat` content into `data`.
///
/// `data` is reset first. Returns the failure message on malformed numeric
/// tokens or a missing `btime` line.
pub fn parse_proc_stat(content: &str, data: &mut ProcStatData) -> Result<(), String> {
    *data = ProcStatData::default();

    for line in content.lines() {
        let mut tokens = line.split_whitespace();
        let Some(key) = tokens.next() else {
            continue;
        };

        if key == "cpu" {
            trace!("Processing /proc/stat aggregate line: {}", line);
            fill_jiffies(&mut data.jiffies, tokens, line)?;
        } else if key == "btime" {
            let value = tokens.next().unwrap_or("");
            data.os_start_time = value
                .parse::<u64>()
                .map_err(|_| format!("invalid btime value in line: '{}'", line))?;
        } else if let Some(cpu_id) = key.strip_prefix("cpu").and_then(|id| id.parse().ok()) {
            let mut core = CpuJiffies::default();
            fill_jiffies(&mut core, tokens, line)?;
            data.per_cpu.insert(cpu_id, core);
        }
    }

    if data.os_start_time == 0 {
        return Err("empty btime field".to_string());
    }

    Ok(())
}

fn fill_jiffies<'a>(
    jiffies: &mut CpuJiffies,
    tokens: impl Iterator<Item = &'a str>,
    line: &str,
) -> Result<(), String> {
    for (slot, token) in jiffies.0.iter_mut().zip(tokens) {
        *slot = token
            .parse::<u64>()
            .map_err(|_| format!("invalid jiffy value '{}' in line: '{}'", token, line))?;
    }
    Ok(())
}

/// Reads and parses `/proc/stat` through a [`FileSource`].
#[derive(Debug, Clone)]
pub struct ProcStatFileParser<F: FileSource> {
    source: F,
    path: PathBuf,
}

impl<F: FileSource> ProcStatFileParser<F> {
    pub fn new(source: F) -> Self {
        Self::with_path(source, DEFAULT_PROC_STAT_PATH)
    }

    pub fn with_path(source: F, path: impl Into<PathBuf>) -> Self {
        Self {
            source,
            path: path.into(),
        }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    pub fn parse(&self, data: &mut ProcStatData) -> ProcResult<()> {
        let content = self
            .source
            .read_to_string(&self.path)
            .map_err(|e| ProcError::io(&self.path, e))?;

        parse_proc_stat(&content, data).map_err(|msg| ProcError::parse(&self.path, msg))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemoryFileSource;

    const STAT: &str = "cpu  10132153 290696 3084719 46828483 16683 0 25195 0 175628 0\n\
cpu0 1393280 32966 572056 13343292 6130 0 17875 0 23933 0\n\
cpu1 1335168 25740 507880 13385453 3745 0 3224 0 19839 0\n\
intr 1462898 0 0 0\n\
ctxt 2253430\n\
btime 1700000000\n\
processes 40452\n";

    #[test]
    fn test_parse_populates_all_fields_in_order() {
        let mut data = ProcStatData::default();
        parse_proc_stat(STAT, &mut data).unwrap();

        assert_eq!(
            data.jiffies.0,
            [10132153, 290696, 3084719, 46828483, 16683, 0, 25195, 0, 175628, 0]
        );
        assert_eq!(data.jiffies[JiffyField::Idle], 46828483);
        assert_eq!(data.os_start_time, 1700000000);
    }

    #[test]
    fn test_per_core_lines_do_not_overwrite_aggregate() {
        let mut data = ProcStatData::default();
        parse_proc_stat(STAT, &mut data).unwrap();

        assert_eq!(data.jiffies[JiffyField::User], 10132153);
        assert_eq!(data.per_cpu.len(), 2);
        assert_eq!(data.per_cpu[&1][JiffyField::User], 1335168);
    }

    #[test]
    fn test_missing_btime_is_error() {
        let mut data = ProcStatData::default();
        let err = parse_proc_stat("cpu 1 2 3 4 5 6 7 8 9 10\n", &mut data).unwrap_err();
        assert_eq!(err, "empty btime field");
    }

    #[test]
    fn test_malformed_jiffy_names_line() {
        let mut data = ProcStatData::default();
        let err = parse_proc_stat("cpu 1 2 x 4\nbtime 5\n", &mut data).unwrap_err();
        assert!(err.contains("cpu 1 2 x 4"), "unexpected message: {}", err);
    }

    #[test]
    fn test_short_cpu_line_leaves_remaining_zero() {
        let mut data = ProcStatData::default();
        parse_proc_stat("cpu 1 2 3 4\nbtime 9\n", &mut data).unwrap();
        assert_eq!(data.jiffies.0, [1, 2, 3, 4, 0, 0, 0, 0, 0, 0]);
        assert_eq!(data.jiffies.total(), 10);
    }

    #[test]
    fn test_parse_resets_previous_data() {
        let mut data = ProcStatData::default();
        parse_proc_stat(STAT, &mut data).unwrap();
        parse_proc_stat("cpu 1\nbtime 2\n", &mut data).unwrap();
        assert_eq!(data.jiffies.0[0], 1);
        assert_eq!(data.jiffies.0[2], 0);
        assert!(data.per_cpu.is_empty());
    }

    #[test]
    fn test_file_parser_reports_io_and_parse_errors() {
        let missing = ProcStatFileParser::new(MemoryFileSource::new());
        let mut data = ProcStatData::default();
        assert!(!missing.parse(&mut data).unwrap_err().is_parse_error());

        let fs = MemoryFileSource::new().with_file("/proc/stat", "cpu 1 2 3\n");
        let parser = ProcStatFileParser::new(fs);
        let err = parser.parse(&mut data).unwrap_err();
        assert!(err.is_parse_error());
        assert!(err.to_string().contains("empty btime field"));
    }
}
