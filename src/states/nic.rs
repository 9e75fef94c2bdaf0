//! Network interface state from `/sys/class/net/<iface>` and interface enumeration.
//!
//! Counter collection is lossy: every bound sysfs file is read on its own and
//! a missing or unreadable file resets only that field to its default value.
//! Addresses come from the OS interface enumeration, not from sysfs, and are
//! resolved once per [`NicState`].

use serde::Serialize;
use std::io;
use std::net::{IpAddr, SocketAddrV4, SocketAddrV6};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::source::FileSource;

pub const DEFAULT_SYS_CLASS_NET: &str = "/sys/class/net";

/// Address placeholder until enumeration resolves a family.
pub const INVALID_ADDRESS: &str = "INVALID";

/// One address entry from the OS interface enumeration.
#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceAddress {
    pub name: String,
    pub flags: u32,
    pub address: Option<IpAddr>,
    pub netmask: Option<IpAddr>,
    pub broadcast: Option<IpAddr>,
    pub scope_id: u32,
}

/// Enumerates every interface address on the host.
pub trait InterfaceAddressSource: Send + Sync {
    fn interface_addresses(&self) -> io::Result<Vec<InterfaceAddress>>;
}

/// `getifaddrs` backed enumeration.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsInterfaceAddresses;

impl InterfaceAddressSource for OsInterfaceAddresses {
    fn interface_addresses(&self) -> io::Result<Vec<InterfaceAddress>> {
        let addrs = nix::ifaddrs::getifaddrs().map_err(io::Error::from)?;
        let mut entries = Vec::new();

        for ifaddr in addrs {
            let mut entry = InterfaceAddress {
                name: ifaddr.interface_name.clone(),
                flags: ifaddr.flags.bits() as u32,
                address: None,
                netmask: None,
                broadcast: None,
                scope_id: 0,
            };

            if let Some(addr) = ifaddr.address.as_ref() {
                if let Some(sin) = addr.as_sockaddr_in() {
                    entry.address = Some(IpAddr::V4(*SocketAddrV4::from(*sin).ip()));
                    entry.netmask = ifaddr
                        .netmask
                        .as_ref()
                        .and_then(|m| m.as_sockaddr_in())
                        .map(|m| IpAddr::V4(*SocketAddrV4::from(*m).ip()));
                    entry.broadcast = ifaddr
                        .broadcast
                        .as_ref()
                        .and_then(|b| b.as_sockaddr_in())
                        .map(|b| IpAddr::V4(*SocketAddrV4::from(*b).ip()));
                } else if let Some(sin6) = addr.as_sockaddr_in6() {
                    let v6 = SocketAddrV6::from(*sin6);
                    entry.address = Some(IpAddr::V6(*v6.ip()));
                    entry.scope_id = v6.scope_id();
                    entry.netmask = ifaddr
                        .netmask
                        .as_ref()
                        .and_then(|m| m.as_sockaddr_in6())
                        .map(|m| IpAddr::V6(*SocketAddrV6::from(*m).ip()));
                }
            }

            entries.push(entry);
        }

        Ok(entries)
    }
}

/// Fixed enumeration result, for hosts without a live network stack and for tests.
#[derive(Debug, Clone, Default)]
pub struct StaticInterfaceAddresses(pub Vec<InterfaceAddress>);

impl InterfaceAddressSource for StaticInterfaceAddresses {
    fn interface_addresses(&self) -> io::Result<Vec<InterfaceAddress>> {
        Ok(self.0.clone())
    }
}

/// Snapshot of one interface.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NicData {
    pub interface: String,
    pub device: String,
    pub vlan: String,
    pub flags: u32,
    pub v4_address: String,
    pub v4_netmask: String,
    pub v4_broadcast: String,
    pub v6_address: String,
    pub v6_netmask: String,
    pub v6_scope_id: u32,
    pub mac_address: String,
    pub speed_mbit_per_sec: u64,
    pub mtu: u64,
    pub state: String,
    pub tx_queue_len: u64,
    pub rx_bytes: u64,
    pub rx_packets: u64,
    pub rx_errors: u64,
    pub rx_dropped: u64,
    pub rx_compressed: u64,
    pub rx_crc_errors: u64,
    pub tx_bytes: u64,
    pub tx_packets: u64,
    pub tx_errors: u64,
    pub tx_dropped: u64,
    pub tx_compressed: u64,
}

impl NicData {
    /// Fresh record; `"eth0.100"` splits into device `eth0` and vlan `100`.
    pub fn new(interface: &str) -> Self {
        let (device, vlan) = split_interface(interface);
        Self {
            interface: interface.to_string(),
            device: device.to_string(),
            vlan: vlan.to_string(),
            flags: 0,
            v4_address: INVALID_ADDRESS.to_string(),
            v4_netmask: INVALID_ADDRESS.to_string(),
            v4_broadcast: INVALID_ADDRESS.to_string(),
            v6_address: INVALID_ADDRESS.to_string(),
            v6_netmask: INVALID_ADDRESS.to_string(),
            v6_scope_id: 0,
            mac_address: String::new(),
            speed_mbit_per_sec: 0,
            mtu: 0,
            state: String::new(),
            tx_queue_len: 0,
            rx_bytes: 0,
            rx_packets: 0,
            rx_errors: 0,
            rx_dropped: 0,
            rx_compressed: 0,
            rx_crc_errors: 0,
            tx_bytes: 0,
            tx_packets: 0,
            tx_errors: 0,
            tx_dropped: 0,
            tx_compressed: 0,
        }
    }

    pub fn has_v4_address(&self) -> bool {
        self.v4_address != INVALID_ADDRESS
    }

    pub fn has_v6_address(&self) -> bool {
        self.v6_address != INVALID_ADDRESS
    }

    pub fn is_multicast(&self) -> bool {
        self.flags & libc::IFF_MULTICAST as u32 != 0
    }
}

/// Splits an interface name on its first `.` into device and vlan.
pub fn split_interface(interface: &str) -> (&str, &str) {
    interface.split_once('.').unwrap_or((interface, ""))
}

/// Per-field read policy: a failed read or unparsable content yields the default.
pub fn read_field<T: FromStr + Default>(read: io::Result<String>) -> T {
    read.ok()
        .and_then(|content| content.trim().parse::<T>().ok())
        .unwrap_or_default()
}

/// Sysfs files tracked for every interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NicCounter {
    RxBytes,
    RxPackets,
    RxErrors,
    RxDropped,
    RxCompressed,
    RxCrcErrors,
    TxBytes,
    TxPackets,
    TxErrors,
    TxDropped,
    TxCompressed,
    TxQueueLen,
    Address,
    Speed,
    Mtu,
    OperState,
}

impl NicCounter {
    pub const ALL: [NicCounter; 16] = [
        NicCounter::RxBytes,
        NicCounter::RxPackets,
        NicCounter::RxErrors,
        NicCounter::RxDropped,
        NicCounter::RxCompressed,
        NicCounter::RxCrcErrors,
        NicCounter::TxBytes,
        NicCounter::TxPackets,
        NicCounter::TxErrors,
        NicCounter::TxDropped,
        NicCounter::TxCompressed,
        NicCounter::TxQueueLen,
        NicCounter::Address,
        NicCounter::Speed,
        NicCounter::Mtu,
        NicCounter::OperState,
    ];

    /// Path relative to `/sys/class/net/<interface>`.
    pub fn suffix(&self) -> &'static str {
        match self {
            NicCounter::RxBytes => "statistics/rx_bytes",
            NicCounter::RxPackets => "statistics/rx_packets",
            NicCounter::RxErrors => "statistics/rx_errors",
            NicCounter::RxDropped => "statistics/rx_dropped",
            NicCounter::RxCompressed => "statistics/rx_compressed",
            NicCounter::RxCrcErrors => "statistics/rx_crc_errors",
            NicCounter::TxBytes => "statistics/tx_bytes",
            NicCounter::TxPackets => "statistics/tx_packets",
            NicCounter::TxErrors => "statistics/tx_errors",
            NicCounter::TxDropped => "statistics/tx_dropped",
            NicCounter::TxCompressed => "statistics/tx_compressed",
            NicCounter::TxQueueLen => "tx_queue_len",
            NicCounter::Address => "address",
            NicCounter::Speed => "speed",
            NicCounter::Mtu => "mtu",
            NicCounter::OperState => "operstate",
        }
    }

    /// Stores a read result into the matching field of `data`.
    pub fn apply(&self, data: &mut NicData, read: io::Result<String>) {
        match self {
            NicCounter::RxBytes => data.rx_bytes = read_field(read),
            NicCounter::RxPackets => data.rx_packets = read_field(read),
            NicCounter::RxErrors => data.rx_errors = read_field(read),
            NicCounter::RxDropped => data.rx_dropped = read_field(read),
            NicCounter::RxCompressed => data.rx_compressed = read_field(read),
            NicCounter::RxCrcErrors => data.rx_crc_errors = read_field(read),
            NicCounter::TxBytes => data.tx_bytes = read_field(read),
            NicCounter::TxPackets => data.tx_packets = read_field(read),
            NicCounter::TxErrors => data.tx_errors = read_field(read),
            NicCounter::TxDropped => data.tx_dropped = read_field(read),
            NicCounter::TxCompressed => data.tx_compressed = read_field(read),
            NicCounter::TxQueueLen => data.tx_queue_len = read_field(read),
            NicCounter::Address => data.mac_address = read_field(read),
            NicCounter::Speed => data.speed_mbit_per_sec = read_field(read),
            NicCounter::Mtu => data.mtu = read_field(read),
            NicCounter::OperState => data.state = read_field(read),
        }
    }
}

/// A sysfs file bound to one [`NicCounter`].
#[derive(Debug, Clone)]
struct FileBinding {
    counter: NicCounter,
    path: PathBuf,
}

/// Live state for one interface.
pub struct NicState<F: FileSource> {
    source: F,
    addresses: Arc<dyn InterfaceAddressSource>,
    bindings: Vec<FileBinding>,
    data: NicData,
}

impl<F: FileSource> NicState<F> {
    /// Binds the default sysfs root and the OS interface enumeration.
    pub fn new(source: F, interface: &str) -> Self {
        Self::with_root(
            source,
            Arc::new(OsInterfaceAddresses),
            DEFAULT_SYS_CLASS_NET,
            interface,
        )
    }

    pub fn with_root(
        source: F,
        addresses: Arc<dyn InterfaceAddressSource>,
        sys_class_net: impl AsRef<Path>,
        interface: &str,
    ) -> Self {
        let base = sys_class_net.as_ref().join(interface);
        let bindings = NicCounter::ALL
            .iter()
            .map(|counter| FileBinding {
                counter: *counter,
                path: base.join(counter.suffix()),
            })
            .collect();

        Self {
            source,
            addresses,
            bindings,
            data: NicData::new(interface),
        }
    }

    /// Re-reads every bound file, then resolves addresses if none are known yet.
    pub fn update_state(&mut self) {
        for binding in &self.bindings {
            let read = self.source.read_to_string(&binding.path);
            if let Err(e) = &read {
                trace!(
                    "NicState {}: {} unavailable ({}), resetting field",
                    self.data.interface,
                    binding.path.display(),
                    e
                );
            }
            binding.counter.apply(&mut self.data, read);
        }

        if !self.data.has_v4_address() && !self.data.has_v6_address() {
            self.resolve_addresses();
        }
    }

    fn resolve_addresses(&mut self) {
        let entries = match self.addresses.interface_addresses() {
            Ok(entries) => entries,
            Err(e) => {
                warn!(
                    "Unable to enumerate interface addresses for {}: {}",
                    self.data.interface, e
                );
                return;
            }
        };

        for entry in entries.iter().filter(|e| e.name == self.data.interface) {
            self.data.flags = entry.flags;
            match entry.address {
                Some(IpAddr::V4(addr)) => {
                    self.data.v4_address = addr.to_string();
                    self.data.v4_netmask = ip_or_invalid(entry.netmask);
                    self.data.v4_broadcast = ip_or_invalid(entry.broadcast);
                }
                Some(IpAddr::V6(addr)) => {
                    self.data.v6_address = addr.to_string();
                    self.data.v6_netmask = ip_or_invalid(entry.netmask);
                    self.data.v6_scope_id = entry.scope_id;
                }
                None => {}
            }
        }

        debug!(
            "NicState {}: v4={} v6={}",
            self.data.interface, self.data.v4_address, self.data.v6_address
        );
    }

    pub fn data(&self) -> &NicData {
        &self.data
    }

    pub fn get_interface(&self) -> &str {
        &self.data.interface
    }

    pub fn get_device(&self) -> &str {
        &self.data.device
    }

    pub fn get_vlan(&self) -> &str {
        &self.data.vlan
    }
}

fn ip_or_invalid(addr: Option<IpAddr>) -> String {
    addr.map(|a| a.to_string())
        .unwrap_or_else(|| INVALID_ADDRESS.to_string())
}

/// Lists interfaces under `sys_class_net` that expose `statistics/rx_bytes`.
pub fn poll_nic_interfaces<F: FileSource>(source: &F, sys_class_net: impl AsRef<Path>) -> Vec<String> {
    let entries = match source.read_dir(sys_class_net.as_ref()) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(
                "Unable to list {}: {}",
                sys_class_net.as_ref().display(),
                e
            );
            return Vec::new();
        }
    };

    let mut interfaces: Vec<String> = entries
        .iter()
        .filter(|path| source.exists(&path.join("statistics/rx_bytes")))
        .filter_map(|path| path.file_name().map(|n| n.to_string_lossy().to_string()))
        .collect();
    interfaces.sort();
    interfaces
}

/// Renders `IFF_*` flags as a space separated list.
pub fn flags_to_string(flags: u32) -> String {
    const NAMES: [(libc::c_int, &str); 16] = [
        (libc::IFF_UP, "UP"),
        (libc::IFF_BROADCAST, "BROADCAST"),
        (libc::IFF_DEBUG, "DEBUG"),
        (libc::IFF_LOOPBACK, "LOOPBACK"),
        (libc::IFF_POINTOPOINT, "POINTOPOINT"),
        (libc::IFF_RUNNING, "RUNNING"),
        (libc::IFF_NOARP, "NOARP"),
        (libc::IFF_PROMISC, "PROMISC"),
        (libc::IFF_NOTRAILERS, "NOTRAILERS"),
        (libc::IFF_ALLMULTI, "ALLMULTI"),
        (libc::IFF_MASTER, "MASTER"),
        (libc::IFF_SLAVE, "SLAVE"),
        (libc::IFF_MULTICAST, "MULTICAST"),
        (libc::IFF_PORTSEL, "PORTSEL"),
        (libc::IFF_AUTOMEDIA, "AUTOMEDIA"),
        (libc::IFF_DYNAMIC, "DYNAMIC"),
    ];

    NAMES
        .iter()
        .filter(|(bit, _)| flags & (*bit as u32) != 0)
        .map(|(_, name)| *name)
        .collect::<Vec<_>>()
        .join(" ")
}
