//! Sample command implementation.
//!
//! Runs sampling cycles at the configured interval and prints each report.
//! A failed cycle is logged and skipped; the next cycle reads fresh input.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context};
use tracing::{debug, error};

use gpp_monitor::affinity::SysfsTopology;
use gpp_monitor::states::OsInterfaceAddresses;
use gpp_monitor::{MonitorReport, OsFileSource, ProcResult, SystemMonitor};

use crate::cli::ReportFormat;
use crate::config::Config;
use crate::startup_checks::validate_requirements;

/// Samples the host `iterations` times, or until interrupted when `None`.
pub fn command_sample(
    iterations: Option<usize>,
    format: ReportFormat,
    config: &Config,
) -> anyhow::Result<()> {
    validate_requirements(&config.proc_root(), &config.sys_root())?;

    let files = OsFileSource::new();
    let topology = SysfsTopology::with_sys_root(files, config.sys_root());
    let settings = config
        .monitor_settings()
        .context("Invalid nic_interfaces pattern")?;
    let mut monitor = SystemMonitor::new(files, settings, &topology, Arc::new(OsInterfaceAddresses))
        .context("Failed to initialize system monitor")?;

    let interval = Duration::from_secs(config.interval_seconds());
    let succeeded = run_cycles(iterations, interval, || monitor.sample(), |report| {
        print_report(report, &format)
    })?;

    if let Some(n) = iterations {
        if n > 0 && succeeded == 0 {
            bail!("All {} sampling cycles failed", n);
        }
    }
    Ok(())
}

/// Drives `sample` once per `interval` and hands every report to `output`.
///
/// Sampling failures are logged and skipped. Output failures abort.
/// Returns the number of cycles that produced a report.
fn run_cycles<S, O>(
    iterations: Option<usize>,
    interval: Duration,
    mut sample: S,
    mut output: O,
) -> anyhow::Result<usize>
where
    S: FnMut() -> ProcResult<MonitorReport>,
    O: FnMut(&MonitorReport) -> anyhow::Result<()>,
{
    let mut iteration = 0usize;
    let mut succeeded = 0usize;
    while iterations.map_or(true, |n| iteration < n) {
        if iteration > 0 {
            thread::sleep(interval);
        }
        iteration += 1;
        debug!("Sampling cycle {}", iteration);

        match sample() {
            Ok(report) => {
                output(&report)?;
                succeeded += 1;
            }
            Err(e) => error!("Sampling cycle {} failed, skipping: {}", iteration, e),
        }
    }

    Ok(succeeded)
}

fn print_report(report: &MonitorReport, format: &ReportFormat) -> anyhow::Result<()> {
    match format {
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
        ReportFormat::Yaml => println!("---\n{}", serde_yaml::to_string(report)?),
    }
    Ok(())
}
