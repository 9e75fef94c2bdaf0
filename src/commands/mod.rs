//! CLI command implementations for gpp-monitor.
//!
//! This module provides implementations for all CLI subcommands:
//! - `sample`: Sampling cycles and report output
//! - `affinity`: Process placement
//! - `interrupts`: NIC interrupt to CPU mapping
//! - `check`: System validation
//! - `config`: Configuration file generation

pub mod affinity;
pub mod check;
pub mod config;
pub mod interrupts;
pub mod sample;

// Re-export command functions
pub use affinity::{command_affinity, AffinityRequest};
pub use check::command_check;
pub use config::command_config;
pub use interrupts::command_interrupts;
pub use sample::command_sample;
