//! Parsers for kernel text interfaces.
//!
//! This module provides:
//! - `proc_stat`: aggregate and per-core jiffies plus boot time from /proc/stat
//! - `meminfo`: named memory counters from /proc/meminfo
//! - `loadavg`: load averages from /proc/loadavg

pub mod loadavg;
pub mod meminfo;
pub mod proc_stat;

pub use loadavg::{parse_load_average, read_load_average, LoadAverage, DEFAULT_LOADAVG_PATH};
pub use meminfo::{
    parse_meminfo, parse_meminfo_line, unit_multiplier, MeminfoCounters, ProcMeminfoParser,
    DEFAULT_MEMINFO_PATH,
};
pub use proc_stat::{
    parse_proc_stat, CpuJiffies, JiffyField, ProcStatData, ProcStatFileParser, CPU_JIFFIES_MAX,
    DEFAULT_PROC_STAT_PATH,
};
