//! Integration tests for interface state and throughput.
//!
//! Sysfs trees are served from `MemoryFileSource` fixtures and addresses
//! from a fixed enumeration, so nothing here depends on the host's NICs.

use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use gpp_monitor::states::{
    poll_nic_interfaces, InterfaceAddress, StaticInterfaceAddresses, INVALID_ADDRESS,
};
use gpp_monitor::{MemoryFileSource, NicAccumulator, NicState};

const NET: &str = "/sys/class/net";

/// Helper function to build a sysfs fixture for one interface.
fn sysfs_for(iface: &str, rx: u64, tx: u64) -> MemoryFileSource {
    let base = format!("{}/{}", NET, iface);
    MemoryFileSource::new()
        .with_file(format!("{}/statistics/rx_bytes", base), format!("{}\n", rx))
        .with_file(format!("{}/statistics/tx_bytes", base), format!("{}\n", tx))
        .with_file(format!("{}/mtu", base), "1500\n")
        .with_file(format!("{}/operstate", base), "up\n")
        .with_file(format!("{}/address", base), "52:54:00:12:34:56\n")
}

fn addresses(iface: &str) -> Arc<StaticInterfaceAddresses> {
    Arc::new(StaticInterfaceAddresses(vec![InterfaceAddress {
        name: iface.to_string(),
        flags: (libc::IFF_UP | libc::IFF_MULTICAST) as u32,
        address: Some(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 5))),
        netmask: Some(IpAddr::V4(Ipv4Addr::new(255, 255, 255, 0))),
        broadcast: None,
        scope_id: 0,
    }]))
}

#[test]
fn test_missing_interface_yields_defaults() {
    let mut state = NicState::with_root(
        MemoryFileSource::new(),
        Arc::new(StaticInterfaceAddresses(Vec::new())),
        NET,
        "nosuch0",
    );
    state.update_state();

    let data = state.data();
    assert_eq!(data.rx_bytes, 0);
    assert_eq!(data.mtu, 0);
    assert_eq!(data.state, "");
    assert_eq!(data.v4_address, INVALID_ADDRESS);
    assert!(!data.has_v6_address());
}

#[test]
fn test_vlan_interface_splits_device() {
    let state = NicState::with_root(
        MemoryFileSource::new(),
        Arc::new(StaticInterfaceAddresses(Vec::new())),
        NET,
        "eth0.50",
    );
    assert_eq!(state.get_interface(), "eth0.50");
    assert_eq!(state.get_device(), "eth0");
    assert_eq!(state.get_vlan(), "50");
}

#[test]
fn test_counters_and_addresses_are_read() {
    let mut state = NicState::with_root(sysfs_for("eth1", 4096, 1024), addresses("eth1"), NET, "eth1");
    state.update_state();

    let data = state.data();
    assert_eq!(data.rx_bytes, 4096);
    assert_eq!(data.tx_bytes, 1024);
    assert_eq!(data.mtu, 1500);
    assert_eq!(data.state, "up");
    assert_eq!(data.mac_address, "52:54:00:12:34:56");
    assert_eq!(data.v4_address, "10.0.0.5");
    assert_eq!(data.v4_netmask, "255.255.255.0");
    assert_eq!(data.v4_broadcast, INVALID_ADDRESS);
    assert!(data.is_multicast());
}

#[test]
fn test_poll_lists_interfaces_with_statistics() {
    let fs = sysfs_for("eth0", 1, 1).with_file(format!("{}/bonding_masters", NET), "");
    assert_eq!(poll_nic_interfaces(&fs, NET), vec!["eth0".to_string()]);
}

#[test]
fn test_throughput_between_samples() {
    let mut first = NicState::with_root(sysfs_for("eth0", 0, 0), addresses("eth0"), NET, "eth0");
    first.update_state();
    let mut second = NicState::with_root(
        sysfs_for("eth0", 3 * 1024 * 1024, 1024 * 1024),
        addresses("eth0"),
        NET,
        "eth0",
    );
    second.update_state();

    let start = Instant::now();
    let mut acc = NicAccumulator::new("eth0");
    acc.compute_statistics(first.data(), start);
    assert_eq!(acc.get_throughput_mb_per_sec(), 0.0);

    acc.compute_statistics(second.data(), start + Duration::from_secs(2));
    assert!((acc.get_throughput_mb_per_sec() - 2.0).abs() < 1e-9);
}
