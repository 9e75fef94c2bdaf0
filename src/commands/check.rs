//! Check command implementation.
//!
//! Validates system requirements and configuration.

use nix::unistd::geteuid;

use gpp_monitor::affinity::{format_list, SysfsTopology, Topology};
use gpp_monitor::parsers::{read_load_average, MeminfoCounters, ProcStatData};
use gpp_monitor::states::poll_nic_interfaces;
use gpp_monitor::{OsFileSource, ProcMeminfoParser, ProcStatFileParser};

use crate::config::{validate_effective_config, Config};

/// Validates system requirements and configuration.
pub fn command_check(
    proc: bool,
    sys: bool,
    all: bool,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 GPP Monitor - System Check");
    println!("=============================");

    let mut all_ok = true;
    let files = OsFileSource::new();
    let proc_root = config.proc_root();
    let sys_root = config.sys_root();

    // Check /proc inputs
    if proc || all {
        println!("\n📁 Checking {} inputs...", proc_root.display());

        let mut stat = ProcStatData::default();
        match ProcStatFileParser::with_path(files, proc_root.join("stat")).parse(&mut stat) {
            Ok(()) => println!(
                "   ✅ stat parsed: {} cpus, boot time {}",
                stat.per_cpu.len(),
                stat.os_start_time
            ),
            Err(e) => {
                println!("   ❌ {}", e);
                all_ok = false;
            }
        }

        let mut meminfo = MeminfoCounters::new();
        match ProcMeminfoParser::with_path(files, proc_root.join("meminfo"))
            .and_then(|parser| parser.parse(&mut meminfo))
        {
            Ok(()) => println!("   ✅ meminfo parsed: {} counters", meminfo.len()),
            Err(e) => {
                println!("   ❌ {}", e);
                all_ok = false;
            }
        }

        match read_load_average(&files, proc_root.join("loadavg")) {
            Ok(load) => println!("   ✅ loadavg parsed: {:.2}", load.one_min),
            Err(e) => {
                println!("   ❌ {}", e);
                all_ok = false;
            }
        }

        let interrupts = proc_root.join("interrupts");
        if interrupts.exists() {
            println!("   ✅ {} present", interrupts.display());
        } else {
            println!("   ⚠️  {} not found - NIC affinity unavailable", interrupts.display());
        }
    }

    // Check /sys inputs
    if sys || all {
        println!("\n🖧  Checking {} inputs...", sys_root.display());

        let interfaces = poll_nic_interfaces(&files, sys_root.join("class/net"));
        if interfaces.is_empty() {
            println!("   ⚠️  No network interfaces with statistics found");
        } else {
            println!("   ✅ Interfaces: {}", interfaces.join(", "));
        }

        let topology = SysfsTopology::with_sys_root(files, &sys_root);
        if topology.is_available() {
            for node in topology.configured_nodes() {
                match topology.cpus_of_node(node) {
                    Ok(cpus) => println!("   ✅ Socket {}: cpus {}", node, format_list(&cpus)),
                    Err(e) => println!("   ⚠️  Socket {}: {}", node, e),
                }
            }
        } else {
            println!("   ⚠️  No NUMA topology - socket, nic and cpu affinity are skipped");
        }

        if geteuid().is_root() {
            println!("   ✅ Running as root");
        } else {
            println!("   ⚠️  Not running as root - binding other processes may fail");
        }
    }

    // Check configuration
    println!("\n⚙️  Checking configuration...");
    match validate_effective_config(config) {
        Ok(_) => {
            println!("   ✅ Configuration is valid");
        }
        Err(e) => {
            println!("   ❌ Configuration invalid: {}", e);
            all_ok = false;
        }
    }

    println!("\n📋 Summary:");
    if all_ok {
        println!("   ✅ All checks passed - system is ready");
        Ok(())
    } else {
        println!("   ❌ Some checks failed - please review warnings");
        std::process::exit(1);
    }
}
