//! Interrupts command implementation.
//!
//! Shows which CPUs service an interface and the socket they belong to.

use gpp_monitor::affinity::{format_list, AffinityResolver, SysfsTopology};
use gpp_monitor::OsFileSource;

use crate::config::Config;

pub fn command_interrupts(iface: &str, config: &Config) -> anyhow::Result<()> {
    let files = OsFileSource::new();
    let resolver = AffinityResolver::new(
        config.affinity_config(),
        files,
        SysfsTopology::with_sys_root(files, config.sys_root()),
    );

    let cpus = resolver.identify_cpus(iface);
    if cpus.is_empty() {
        println!("⚠️  No interrupt activity found for {}", iface);
        return Ok(());
    }

    println!("🖧  {}", iface);
    println!("   ├─ cpus: {}", format_list(&cpus));
    match resolver.find_socket_for_interface(iface, true, &[]) {
        Some(socket) => println!("   └─ socket: {}", socket),
        None => println!("   └─ socket: unknown"),
    }
    Ok(())
}
