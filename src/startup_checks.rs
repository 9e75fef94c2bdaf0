//! Startup requirement validation for gpp-monitor.
//!
//! This module validates that the monitor can read its kernel inputs and has
//! the privileges affinity processing needs before sampling starts.

use nix::unistd::geteuid;
use std::fs;
use std::path::Path;
use tracing::{error, info, warn};

/// Validate all runtime requirements for sampling
pub fn validate_requirements(proc_root: &Path, sys_root: &Path) -> Result<(), ValidationError> {
    info!("🔍 Validating runtime requirements...");

    for name in ["stat", "meminfo", "loadavg"] {
        check_proc_input(&proc_root.join(name))?;
    }
    check_sys_inputs(sys_root);

    info!("✅ All runtime requirements validated");
    Ok(())
}

/// Validate what affinity processing relies on.
///
/// Nothing here is fatal: a missing input only disables the directives
/// that need it. Returns whether the process runs as root.
pub fn validate_affinity_requirements(proc_root: &Path, sys_root: &Path) -> bool {
    info!("🔍 Validating affinity requirements...");

    let is_root = check_user_privileges();
    let interrupts = proc_root.join("interrupts");
    if interrupts.exists() {
        info!("✅ {} present", interrupts.display());
    } else {
        warn!("⚠️  {} not found - NIC affinity unavailable", interrupts.display());
    }
    check_sys_inputs(sys_root);

    is_root
}

/// Check if running with sufficient privileges to bind other processes
fn check_user_privileges() -> bool {
    if geteuid().is_root() {
        info!("✅ Running as root (uid=0)");
        return true;
    }
    // Not an error - continue but warn
    warn!("⚠️  Not running as root - binding other users' processes may fail");
    warn!("   Recommendation: Run as root or grant CAP_SYS_NICE");
    false
}

/// Check that a /proc input is present and readable
fn check_proc_input(path: &Path) -> Result<(), ValidationError> {
    match fs::read_to_string(path) {
        Ok(_) => {
            info!("✅ {} readable", path.display());
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            error!("❌ Cannot read {} - insufficient permissions", path.display());
            Err(ValidationError::InsufficientPermissions(format!(
                "{}: {}",
                path.display(),
                e
            )))
        }
        Err(e) => {
            error!("❌ Cannot read {}: {}", path.display(), e);
            error!("   Check --proc-root or the proc_root config value");
            Err(ValidationError::MissingInput(format!(
                "{}: {}",
                path.display(),
                e
            )))
        }
    }
}

/// Optional sysfs inputs: missing ones degrade features, never fail startup
fn check_sys_inputs(sys_root: &Path) {
    let net = sys_root.join("class/net");
    if net.exists() {
        info!("✅ {} present", net.display());
    } else {
        warn!("⚠️  {} not found - no NIC statistics", net.display());
    }

    let node = sys_root.join("devices/system/node");
    if node.exists() {
        info!("✅ NUMA topology available at {}", node.display());
    } else {
        warn!("⚠️  {} not found - socket statistics and NUMA affinity disabled", node.display());
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Insufficient permissions: {0}")]
    InsufficientPermissions(String),

    #[error("Required input missing: {0}")]
    MissingInput(String),
}
