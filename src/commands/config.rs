//! Config command implementation.
//!
//! Generates configuration files in various formats.

use std::fs;
use std::path::PathBuf;

use crate::cli::ConfigFormat;
use crate::config::{render_config, Config};

/// Generates configuration files.
pub fn command_config(
    output: Option<PathBuf>,
    format: ConfigFormat,
    commented: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::default();
    let output = match output {
        Some(path) => path,
        None => PathBuf::from("gpp-monitor.yaml"),
    };

    let mut content = render_config(&config, &format)?;
    if commented && matches!(format, ConfigFormat::Yaml) {
        content = add_config_comments(content);
    }

    if output.to_string_lossy() == "-" {
        print!("{}", content);
    } else {
        fs::write(&output, content)?;
        println!("✅ Configuration written to: {}", output.display());
    }

    Ok(())
}

/// Adds comments to YAML configuration.
fn add_config_comments(yaml: String) -> String {
    let comments = r#"# GPP Monitor Configuration
# ==========================
#
# Sampling
# --------
# interval_seconds: 1          # Seconds between sampling cycles
# proc_root: "/proc"           # Root of the proc filesystem
# sys_root: "/sys"             # Root of the sys filesystem
# nic_interfaces: []           # Interface regexes (empty = all but lo)
# nic_max_throughput_percent: 80  # Share of link speed NIC allocations may reserve
#
# Logging
# -------
# log_level: "info"            # off, error, warn, info, debug, trace
#
# Thresholds (negative value disables a monitor)
# ----------------------------------------------
# thresholds:
#   cpu_idle: 10.0             # Busy below this idle percent
#   mem_free_mb: 100.0         # Busy below this much free memory
#   load_avg: 80.0             # Busy above this percent of cpu count
#   nic_usage: 900.0           # Busy above this many MB/s per interface
#
# Affinity
# --------
# affinity:
#   enabled: true              # REDHAWK_DISABLE_AFFINITY also disables
#   promote_nic_to_socket: true  # Widen single-cpu NIC binding to its socket
#   cpuset_root: null          # Default REDHAWK_CPUSET_ROOT or /dev/cpuset
#   cgroup_root: null          # Default REDHAWK_CGROUP_ROOT or /cgroup
#   blacklist: null            # CPUs never handed out, e.g. "0-1"
"#;

    format!("{comments}\n{yaml}")
}
