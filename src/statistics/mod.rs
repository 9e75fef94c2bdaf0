//! Statistics derived from successive state samples.

pub mod cpu_usage;
pub mod nic_allocator;
pub mod nic_throughput;

pub use cpu_usage::CpuUsageAccumulator;
pub use nic_allocator::{NicAllocation, NicAllocator, NicCapacity};
pub use nic_throughput::NicAccumulator;
