//! gpp-monitor library
//!
//! Host sampling and process placement core for a general purpose processor
//! device. It reads CPU, memory and network counters from the Linux kernel's
//! text interfaces, derives utilization figures from successive samples, and
//! resolves affinity requests (NIC, socket, CPU, cpuset, cgroup) into CPU
//! masks for a target process.
//!
//! # Usage
//!
//! ```rust,no_run
//! use gpp_monitor::{CpuState, CpuUsageAccumulator, OsFileSource, ProcStatFileParser};
//!
//! let mut state = CpuState::new(ProcStatFileParser::new(OsFileSource::new()));
//! let mut usage = CpuUsageAccumulator::new();
//!
//! state.update_state()?;
//! usage.compute_statistics(&state);
//! std::thread::sleep(std::time::Duration::from_secs(1));
//! state.update_state()?;
//! usage.compute_statistics(&state);
//!
//! println!("idle: {:.1}%", usage.get_idle_percent());
//! # Ok::<(), gpp_monitor::ProcError>(())
//! ```
//!
//! Every reader takes a [`FileSource`], so the same code runs against
//! [`MemoryFileSource`] fixtures in tests.

pub mod affinity;
pub mod error;
pub mod monitor;
pub mod parsers;
pub mod source;
pub mod states;
pub mod statistics;
pub mod thresholds;

// Re-export main types for convenience
pub use affinity::{
    AffinityConfig, AffinityDirective, AffinityDirectives, AffinityResolver, CpuList,
    PropertySet, PropertyValue, Topology,
};
pub use error::{
    AffinityError, AffinityResult, NicAllocationError, NicAllocationResult, ProcError, ProcResult,
};
pub use monitor::{MonitorReport, MonitorSettings, SystemMonitor};
pub use parsers::{CpuJiffies, JiffyField, ProcMeminfoParser, ProcStatFileParser};
pub use source::{FileSource, MemoryFileSource, OsFileSource};
pub use states::{CpuState, MemoryState, NicData, NicState};
pub use statistics::{CpuUsageAccumulator, NicAccumulator, NicAllocation, NicAllocator};
pub use thresholds::{ThresholdReport, ThresholdStatus, Thresholds};
