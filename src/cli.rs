//! CLI arguments and subcommands for gpp-monitor.
//!
//! This module defines the command-line interface structure using the clap library,
//! including all flags, options, and subcommands.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Log level options for CLI parsing
#[derive(Debug, Clone, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Configuration format options for output
#[derive(Debug, Clone, ValueEnum)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

/// Output format for sampling reports
#[derive(Debug, Clone, ValueEnum)]
pub enum ReportFormat {
    Yaml,
    Json,
}

/// Main CLI arguments structure
#[derive(Parser, Debug)]
#[command(
    name = "gpp-monitor",
    about = "Host utilization sampling and process affinity for general purpose processors",
    long_about = "Host utilization sampling and process affinity for general purpose processors.\n\n\
                  Samples CPU, memory, load and NIC counters from /proc and /sys, evaluates \
                  busy thresholds, and binds processes to NICs, sockets, CPUs, cpusets or cgroups.",
    version,
    propagate_version = true
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Log level (overrides config)
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Config file (YAML/JSON/TOML)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Disable all config file loading
    #[arg(long)]
    pub no_config: bool,

    /// Print effective merged config and exit
    #[arg(long)]
    pub show_config: bool,

    /// Output format for --show-config
    #[arg(long, value_enum, default_value = "yaml")]
    pub config_format: ConfigFormat,

    /// Validate config and exit (return code 1 on error)
    #[arg(long)]
    pub check_config: bool,

    /// Sampling interval in seconds (overrides config)
    #[arg(short = 'i', long)]
    pub interval: Option<u64>,

    /// Root of the proc filesystem (overrides config)
    #[arg(long)]
    pub proc_root: Option<PathBuf>,

    /// Root of the sys filesystem (overrides config)
    #[arg(long)]
    pub sys_root: Option<PathBuf>,

    /// Disable affinity processing
    #[arg(long)]
    pub disable_affinity: bool,
}

/// Subcommands for additional functionality
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run sampling cycles and print each report
    Sample {
        /// Number of sampling cycles
        #[arg(short = 'n', long, default_value_t = 2)]
        iterations: usize,

        /// Output format
        #[arg(long, value_enum, default_value = "yaml")]
        format: ReportFormat,
    },

    /// Bind a process using affinity directives
    Affinity {
        /// Target process id (defaults to this process)
        #[arg(long)]
        pid: Option<i32>,

        /// Bind to the CPUs servicing this interface's interrupts
        #[arg(long)]
        nic: Option<String>,

        /// Bind to a NUMA node list, e.g. "0" or "0-1"
        #[arg(long)]
        socket: Option<String>,

        /// Bind to a CPU list, e.g. "0,2-3"
        #[arg(long)]
        cpu: Option<String>,

        /// Move the process into this cpuset
        #[arg(long)]
        cpuset: Option<String>,

        /// Move the process into this cgroup
        #[arg(long)]
        cgroup: Option<String>,

        /// CPUs that must never be used (overrides config)
        #[arg(long)]
        blacklist: Option<String>,

        /// Print the converted directives without applying them
        #[arg(long)]
        dry_run: bool,
    },

    /// Show which CPUs service an interface's interrupts
    Interrupts {
        /// Interface name, e.g. eth0
        iface: String,
    },

    /// Validate configuration and system requirements
    Check {
        /// Check /proc inputs
        #[arg(long)]
        proc: bool,

        /// Check NUMA and NIC sysfs inputs
        #[arg(long)]
        sys: bool,

        /// Check all system requirements
        #[arg(long)]
        all: bool,
    },

    /// Generate configuration files
    Config {
        /// Output file path
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "yaml")]
        format: ConfigFormat,

        /// Include comments and examples
        #[arg(long)]
        commented: bool,
    },

    /// Print the affinity property definitions (XML)
    Properties,
}
