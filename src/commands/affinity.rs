//! Affinity command implementation.
//!
//! Builds an affinity property set from the command line and applies it to
//! a process.

use anyhow::{anyhow, Context};
use tracing::{info, warn};

use gpp_monitor::affinity::{
    convert_properties, format_list, parse_list, AffinityDirective, AffinityResolver, SysfsTopology,
};
use gpp_monitor::{OsFileSource, PropertySet};

use crate::config::Config;
use crate::startup_checks::validate_affinity_requirements;

/// Directive flags as given on the command line.
#[derive(Debug, Default)]
pub struct AffinityRequest {
    pub pid: Option<i32>,
    pub nic: Option<String>,
    pub socket: Option<String>,
    pub cpu: Option<String>,
    pub cpuset: Option<String>,
    pub cgroup: Option<String>,
    pub blacklist: Option<String>,
    pub dry_run: bool,
}

impl AffinityRequest {
    /// Property set in the namespaced schema, one pair per directive.
    pub fn to_properties(&self) -> PropertySet {
        let directives: Vec<AffinityDirective> = [
            ("nic", &self.nic),
            ("socket", &self.socket),
            ("cpu", &self.cpu),
            ("cpuset", &self.cpuset),
            ("cgroup", &self.cgroup),
        ]
        .into_iter()
        .filter_map(|(class, value)| value.as_ref().map(|v| AffinityDirective::new(class, v.as_str())))
        .collect();
        PropertySet::from_directives(&directives)
    }
}

/// Applies (or with `dry_run` only prints) the requested affinity.
pub fn command_affinity(request: AffinityRequest, config: &Config) -> anyhow::Result<()> {
    let properties = request.to_properties();
    let directives = convert_properties(&properties).context("No affinity directive given")?;

    let blacklist = match &request.blacklist {
        Some(list) => parse_list(list, &[]).map_err(|e| anyhow!("Invalid --blacklist: {}", e))?,
        None => config.affinity.blacklist().map_err(|e| anyhow!("Invalid affinity.blacklist: {}", e))?,
    };
    let pid = request.pid.unwrap_or_else(|| nix::unistd::getpid().as_raw());

    println!("📌 Affinity request for pid {}", pid);
    for directive in &directives {
        println!("   ├─ {}", directive);
    }
    println!("   └─ blacklist: [{}]", format_list(&blacklist));

    if request.dry_run {
        println!("ℹ️  Dry run - nothing applied");
        return Ok(());
    }

    let files = OsFileSource::new();
    let resolver = AffinityResolver::new(
        config.affinity_config(),
        files,
        SysfsTopology::with_sys_root(files, config.sys_root()),
    );
    if resolver.is_disabled() {
        println!("⚠️  Affinity processing is disabled - nothing applied");
        return Ok(());
    }

    let is_root = validate_affinity_requirements(&config.proc_root(), &config.sys_root());
    if !is_root && pid != nix::unistd::getpid().as_raw() {
        warn!("Binding pid {} without root privileges", pid);
    }

    resolver
        .set_affinity(&properties, pid, &blacklist)
        .with_context(|| format!("Failed to apply affinity to pid {}", pid))?;

    info!("Affinity applied to pid {}", pid);
    println!("✅ Affinity applied");
    Ok(())
}
