//! Sampling façade over every state and accumulator.
//!
//! A [`SystemMonitor`] is owned by one polling thread. Each call to
//! [`SystemMonitor::sample`] refreshes CPU, memory, load and NIC state once
//! and returns a serializable [`MonitorReport`].
//!
//! Throughput is tracked per physical device: `eth0` and `eth0.100` share
//! one accumulator, which also backs NIC capacity allocation.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use crate::affinity::{format_list, Topology};
use crate::error::{NicAllocationResult, ProcResult};
use crate::parsers::{read_load_average, LoadAverage, ProcMeminfoParser, ProcStatFileParser};
use crate::source::FileSource;
use crate::states::{poll_nic_interfaces, CpuState, InterfaceAddressSource, MemoryState, NicData, NicState};
use crate::statistics::{
    CpuUsageAccumulator, NicAccumulator, NicAllocation, NicAllocator, NicCapacity,
};
use crate::thresholds::{ThresholdInputs, ThresholdReport, Thresholds};

pub const DEFAULT_MAX_NIC_THROUGHPUT_PERCENT: f64 = 80.0;

const BITS_PER_MBIT: f64 = 1e6;

/// Where to read from and what to watch.
#[derive(Debug, Clone)]
pub struct MonitorSettings {
    pub proc_root: PathBuf,
    pub sys_root: PathBuf,
    /// Interfaces to watch; empty watches every interface except `lo`.
    pub nic_patterns: Vec<Regex>,
    pub thresholds: Thresholds,
    /// Share of a device's link speed NIC allocations may reserve.
    pub max_nic_throughput_percent: f64,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            proc_root: PathBuf::from("/proc"),
            sys_root: PathBuf::from("/sys"),
            nic_patterns: Vec::new(),
            thresholds: Thresholds::default(),
            max_nic_throughput_percent: DEFAULT_MAX_NIC_THROUGHPUT_PERCENT,
        }
    }
}

impl MonitorSettings {
    /// Compiles interface name patterns.
    pub fn with_nic_patterns(mut self, patterns: &[String]) -> Result<Self, regex::Error> {
        self.nic_patterns = patterns
            .iter()
            .map(|p| Regex::new(p))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self)
    }

    fn watches(&self, iface: &str) -> bool {
        if self.nic_patterns.is_empty() {
            return iface != "lo";
        }
        self.nic_patterns.iter().any(|re| re.is_match(iface))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CpuReport {
    pub ncpus: usize,
    pub user_percent: f64,
    pub system_percent: f64,
    pub idle_percent: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SocketReport {
    pub socket: usize,
    pub cpus: String,
    pub user_percent: f64,
    pub system_percent: f64,
    pub idle_percent: f64,
}

/// Memory figures in bytes.
#[derive(Debug, Clone, Serialize)]
pub struct MemoryReport {
    pub total: u64,
    pub free: u64,
    pub available: u64,
    pub swap_free: u64,
    pub virtual_free: u64,
}

/// One watched interface; throughput and allocation are its device's.
#[derive(Debug, Clone, Serialize)]
pub struct NicReport {
    #[serde(flatten)]
    pub data: NicData,
    pub throughput_mb_per_sec: f64,
    pub rate_allocated_mbit_per_sec: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeviceReport {
    pub device: String,
    pub vlans: String,
    pub throughput_mb_per_sec: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonitorReport {
    pub timestamp: DateTime<Utc>,
    pub os_start_time: u64,
    pub cpu: CpuReport,
    pub sockets: Vec<SocketReport>,
    pub memory: MemoryReport,
    pub load_average: LoadAverage,
    pub nics: Vec<NicReport>,
    pub devices: Vec<DeviceReport>,
    pub nic_allocation_status: Vec<NicAllocation>,
    pub thresholds: ThresholdReport,
}

struct SocketUsage {
    socket: usize,
    cpus: Vec<usize>,
    usage: CpuUsageAccumulator,
}

/// Accumulator for one device, fed from the interface at `source`.
struct DeviceUsage {
    source: usize,
    throughput: NicAccumulator,
}

pub struct SystemMonitor<F: FileSource + Clone> {
    settings: MonitorSettings,
    files: F,
    cpu: CpuState<F>,
    cpu_usage: CpuUsageAccumulator,
    sockets: Vec<SocketUsage>,
    memory: MemoryState<F>,
    nics: Vec<NicState<F>>,
    devices: Vec<DeviceUsage>,
    allocator: NicAllocator,
}

impl<F: FileSource + Clone> SystemMonitor<F> {
    /// Builds every state up front; fails if `meminfo` cannot be read.
    pub fn new<T: Topology + ?Sized>(
        files: F,
        settings: MonitorSettings,
        topology: &T,
        addresses: Arc<dyn InterfaceAddressSource>,
    ) -> ProcResult<Self> {
        let cpu = CpuState::new(ProcStatFileParser::with_path(
            files.clone(),
            settings.proc_root.join("stat"),
        ));
        let memory = MemoryState::new(ProcMeminfoParser::with_path(
            files.clone(),
            settings.proc_root.join("meminfo"),
        )?);

        let mut sockets = Vec::new();
        if topology.is_available() {
            for socket in topology.configured_nodes() {
                match topology.cpus_of_node(socket) {
                    Ok(cpus) if !cpus.is_empty() => sockets.push(SocketUsage {
                        socket,
                        usage: CpuUsageAccumulator::for_cpus(cpus.clone()),
                        cpus,
                    }),
                    Ok(_) => debug!("Socket {} has no cpus", socket),
                    Err(e) => debug!("Skipping socket {}: {}", socket, e),
                }
            }
        }

        let net_root = settings.sys_root.join("class/net");
        let nics: Vec<NicState<F>> = poll_nic_interfaces(&files, &net_root)
            .into_iter()
            .filter(|iface| settings.watches(iface))
            .map(|iface| NicState::with_root(files.clone(), Arc::clone(&addresses), &net_root, &iface))
            .collect();
        let devices = group_devices(&nics);

        info!(
            "Monitoring {} socket(s), {} interface(s) on {} device(s)",
            sockets.len(),
            nics.len(),
            devices.len()
        );
        let allocator = NicAllocator::new(settings.max_nic_throughput_percent);

        Ok(Self {
            settings,
            files,
            cpu,
            cpu_usage: CpuUsageAccumulator::new(),
            sockets,
            memory,
            nics,
            devices,
            allocator,
        })
    }

    pub fn settings(&self) -> &MonitorSettings {
        &self.settings
    }

    pub fn interfaces(&self) -> Vec<&str> {
        self.nics.iter().map(|n| n.get_interface()).collect()
    }

    pub fn get_devices(&self) -> Vec<&str> {
        self.devices.iter().map(|d| d.throughput.get_device()).collect()
    }

    /// Latest throughput of `device` in MB/s; 0 for unknown devices.
    pub fn get_throughput_by_device(&self, device: &str) -> f64 {
        self.devices
            .iter()
            .find(|d| d.throughput.get_device() == device)
            .map_or(0.0, |d| d.throughput.get_throughput_mb_per_sec())
    }

    /// What every device offers as of the latest sample.
    pub fn nic_capacities(&self) -> Vec<NicCapacity> {
        self.devices
            .iter()
            .map(|d| {
                let device = d.throughput.get_device();
                let source = self.nics[d.source].data();
                let mut addresses = Vec::new();
                for nic in self.nics.iter().filter(|n| n.get_device() == device) {
                    let data = nic.data();
                    if data.has_v4_address() {
                        addresses.push(data.v4_address.clone());
                    }
                    if data.has_v6_address() {
                        addresses.push(data.v6_address.clone());
                    }
                }
                NicCapacity {
                    device: device.to_string(),
                    speed_mbit_per_sec: source.speed_mbit_per_sec,
                    multicast: source.is_multicast(),
                    addresses,
                    throughput_bps: d.throughput.get_throughput_bps(),
                }
            })
            .collect()
    }

    /// Reserves NIC capacity; `Ok(false)` when no device can take it.
    pub fn allocate_nic_capacity(&mut self, alloc: &NicAllocation) -> NicAllocationResult<bool> {
        let capacities = self.nic_capacities();
        self.allocator.allocate_capacity(alloc, &capacities)
    }

    pub fn deallocate_nic_capacity(&mut self, alloc: &NicAllocation) -> NicAllocationResult<()> {
        self.allocator.deallocate_capacity(alloc)
    }

    pub fn nic_allocator(&self) -> &NicAllocator {
        &self.allocator
    }

    /// Runs one sampling cycle.
    ///
    /// CPU, memory and load failures fail the cycle. NIC reads are lossy.
    pub fn sample(&mut self) -> ProcResult<MonitorReport> {
        self.cpu.update_state()?;
        self.memory.update_state()?;
        let load_average =
            read_load_average(&self.files, self.settings.proc_root.join("loadavg"))?;

        self.cpu_usage.compute_statistics(&self.cpu);
        for socket in &mut self.sockets {
            socket.usage.compute_statistics(&self.cpu);
        }

        for nic in &mut self.nics {
            nic.update_state();
        }
        let now = Instant::now();
        for device in &mut self.devices {
            device
                .throughput
                .compute_statistics(self.nics[device.source].data(), now);
        }

        let nics: Vec<NicReport> = self
            .nics
            .iter()
            .map(|nic| NicReport {
                data: nic.data().clone(),
                throughput_mb_per_sec: self.get_throughput_by_device(nic.get_device()),
                rate_allocated_mbit_per_sec: self
                    .allocator
                    .get_allocated_device_throughput(nic.get_device())
                    / BITS_PER_MBIT,
            })
            .collect();
        let devices: Vec<DeviceReport> = self
            .devices
            .iter()
            .map(|d| DeviceReport {
                device: d.throughput.get_device().to_string(),
                vlans: d.throughput.get_vlans_string(),
                throughput_mb_per_sec: d.throughput.get_throughput_mb_per_sec(),
            })
            .collect();

        let cpu = CpuReport {
            ncpus: self.cpu.get_per_cpu_jiffies().len(),
            user_percent: self.cpu_usage.get_user_percent(),
            system_percent: self.cpu_usage.get_system_percent(),
            idle_percent: self.cpu_usage.get_idle_percent(),
        };

        let sockets = self
            .sockets
            .iter()
            .map(|s| SocketReport {
                socket: s.socket,
                cpus: format_list(&s.cpus),
                user_percent: s.usage.get_user_percent(),
                system_percent: s.usage.get_system_percent(),
                idle_percent: s.usage.get_idle_percent(),
            })
            .collect();

        let memory = MemoryReport {
            total: self.memory.mem_total(),
            free: self.memory.mem_free(),
            available: self.memory.mem_available(),
            swap_free: self.memory.swap_free(),
            virtual_free: self.memory.virtual_memory_free(),
        };

        let available = if memory.available > 0 {
            memory.available
        } else {
            memory.free
        };
        let thresholds = self.settings.thresholds.evaluate(&ThresholdInputs {
            idle_percent: cpu.idle_percent,
            mem_free_bytes: available,
            load_one_min: load_average.one_min,
            ncpus: cpu.ncpus,
            nic_throughput: devices
                .iter()
                .map(|d| (d.device.clone(), d.throughput_mb_per_sec))
                .collect(),
        });

        debug!(
            "Sample: idle {:.1}% free {} bytes load {:.2} status {}",
            cpu.idle_percent, available, load_average.one_min, thresholds.overall_status
        );

        Ok(MonitorReport {
            timestamp: Utc::now(),
            os_start_time: self.cpu.get_os_start_time(),
            cpu,
            sockets,
            memory,
            load_average,
            nics,
            devices,
            nic_allocation_status: self.allocator.get_allocations().into_iter().cloned().collect(),
            thresholds,
        })
    }
}

/// One accumulator per device, in first-seen order.
///
/// The base interface feeds its device when watched, otherwise the first
/// VLAN seen does.
fn group_devices<F: FileSource>(nics: &[NicState<F>]) -> Vec<DeviceUsage> {
    let mut devices: Vec<DeviceUsage> = Vec::new();
    for (index, nic) in nics.iter().enumerate() {
        let device = nic.get_device();
        let is_base = nic.get_interface() == device;
        match devices.iter_mut().find(|d| d.throughput.get_device() == device) {
            Some(existing) => {
                if is_base {
                    existing.source = index;
                }
                existing.throughput.add_vlan(nic.get_vlan());
            }
            None => {
                debug!("Adding NIC accumulator for device {}", device);
                let mut throughput = NicAccumulator::new(device);
                throughput.add_vlan(nic.get_vlan());
                devices.push(DeviceUsage {
                    source: index,
                    throughput,
                });
            }
        }
    }
    devices
}
