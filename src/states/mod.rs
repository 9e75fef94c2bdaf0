//! Sampled host state, refreshed once per polling cycle.
//!
//! - `cpu`: latest /proc/stat snapshot
//! - `memory`: latest /proc/meminfo counters
//! - `nic`: per-interface sysfs counters and addresses

pub mod cpu;
pub mod memory;
pub mod nic;

pub use cpu::CpuState;
pub use memory::MemoryState;
pub use nic::{
    flags_to_string, poll_nic_interfaces, read_field, split_interface, InterfaceAddress,
    InterfaceAddressSource, NicCounter, NicData, NicState, OsInterfaceAddresses,
    StaticInterfaceAddresses, DEFAULT_SYS_CLASS_NET, INVALID_ADDRESS,
};
