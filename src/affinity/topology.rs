//! NUMA topology queries and CPU mask application.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use nix::sched::{sched_setaffinity, CpuSet};
use nix::unistd::Pid;
use tracing::{debug, warn};

use super::cpulist::{parse_list, CpuList};
use crate::error::{AffinityError, AffinityResult};
use crate::source::FileSource;

pub const DEFAULT_NODE_ROOT: &str = "/sys/devices/system/node";
pub const DEFAULT_CPU_ROOT: &str = "/sys/devices/system/cpu";

/// Host topology needed by the affinity resolver.
pub trait Topology: Send + Sync {
    /// False when the host exposes no NUMA information.
    fn is_available(&self) -> bool;

    fn configured_cpus(&self) -> CpuList;

    fn configured_nodes(&self) -> Vec<usize>;

    fn cpus_of_node(&self, node: usize) -> AffinityResult<CpuList>;

    fn node_of_cpu(&self, cpu: usize) -> Option<usize>;

    /// Restricts `pid` to `cpus`.
    fn apply_cpu_mask(&self, pid: libc::pid_t, cpus: &[usize]) -> AffinityResult<()>;
}

impl<T: Topology + ?Sized> Topology for Arc<T> {
    fn is_available(&self) -> bool {
        (**self).is_available()
    }

    fn configured_cpus(&self) -> CpuList {
        (**self).configured_cpus()
    }

    fn configured_nodes(&self) -> Vec<usize> {
        (**self).configured_nodes()
    }

    fn cpus_of_node(&self, node: usize) -> AffinityResult<CpuList> {
        (**self).cpus_of_node(node)
    }

    fn node_of_cpu(&self, cpu: usize) -> Option<usize> {
        (**self).node_of_cpu(cpu)
    }

    fn apply_cpu_mask(&self, pid: libc::pid_t, cpus: &[usize]) -> AffinityResult<()> {
        (**self).apply_cpu_mask(pid, cpus)
    }
}

/// Topology read from sysfs; masks are applied with `sched_setaffinity`.
#[derive(Debug, Clone)]
pub struct SysfsTopology<F: FileSource> {
    files: F,
    node_root: PathBuf,
    cpu_root: PathBuf,
}

impl<F: FileSource> SysfsTopology<F> {
    pub fn new(files: F) -> Self {
        Self::with_roots(files, DEFAULT_NODE_ROOT, DEFAULT_CPU_ROOT)
    }

    /// Uses `<sys_root>/devices/system/{node,cpu}`.
    pub fn with_sys_root(files: F, sys_root: impl AsRef<Path>) -> Self {
        let system = sys_root.as_ref().join("devices/system");
        Self::with_roots(files, system.join("node"), system.join("cpu"))
    }

    pub fn with_roots(files: F, node_root: impl Into<PathBuf>, cpu_root: impl Into<PathBuf>) -> Self {
        Self {
            files,
            node_root: node_root.into(),
            cpu_root: cpu_root.into(),
        }
    }

    fn read_list(&self, path: &Path) -> Option<CpuList> {
        let content = self.files.read_to_string(path).ok()?;
        match parse_list(&content, &[]) {
            Ok(list) => Some(list),
            Err(e) => {
                debug!("Unable to parse {}: {}", path.display(), e);
                None
            }
        }
    }
}

impl<F: FileSource> Topology for SysfsTopology<F> {
    fn is_available(&self) -> bool {
        self.files.exists(&self.node_root)
    }

    fn configured_cpus(&self) -> CpuList {
        if let Some(list) = self.read_list(&self.cpu_root.join("possible")) {
            return list;
        }
        // Fall back to the union of node cpu lists.
        let mut cpus: CpuList = self
            .configured_nodes()
            .into_iter()
            .filter_map(|node| self.cpus_of_node(node).ok())
            .flatten()
            .collect();
        cpus.sort_unstable();
        cpus.dedup();
        cpus
    }

    fn configured_nodes(&self) -> Vec<usize> {
        if let Some(list) = self.read_list(&self.node_root.join("possible")) {
            return list;
        }
        let mut nodes: Vec<usize> = self
            .files
            .read_dir(&self.node_root)
            .unwrap_or_default()
            .iter()
            .filter_map(|p| p.file_name()?.to_str()?.strip_prefix("node")?.parse().ok())
            .collect();
        nodes.sort_unstable();
        nodes
    }

    fn cpus_of_node(&self, node: usize) -> AffinityResult<CpuList> {
        let path = self.node_root.join(format!("node{}", node)).join("cpulist");
        let content = self.files.read_to_string(&path).map_err(|e| AffinityError::Io {
            message: format!("Unable to read cpu list for node {}", node),
            source: e,
        })?;
        // Memory-only nodes report an empty list.
        if content.trim().is_empty() {
            return Ok(CpuList::new());
        }
        parse_list(&content, &[])
            .map_err(|e| AffinityError::failed(format!("Invalid cpu list for node {}: {}", node, e)))
    }

    fn node_of_cpu(&self, cpu: usize) -> Option<usize> {
        self.configured_nodes()
            .into_iter()
            .find(|node| self.cpus_of_node(*node).is_ok_and(|cpus| cpus.contains(&cpu)))
    }

    fn apply_cpu_mask(&self, pid: libc::pid_t, cpus: &[usize]) -> AffinityResult<()> {
        let mut set = CpuSet::new();
        for cpu in cpus {
            set.set(*cpu).map_err(|e| {
                AffinityError::failed(format!("CPU {} cannot be placed in a cpu mask: {}", cpu, e))
            })?;
        }
        sched_setaffinity(Pid::from_raw(pid), &set).map_err(|e| AffinityError::Io {
            message: format!("sched_setaffinity failed for pid {}", pid),
            source: e.into(),
        })
    }
}

/// Topology for hosts without NUMA support; every query is empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoNumaTopology;

impl Topology for NoNumaTopology {
    fn is_available(&self) -> bool {
        false
    }

    fn configured_cpus(&self) -> CpuList {
        CpuList::new()
    }

    fn configured_nodes(&self) -> Vec<usize> {
        Vec::new()
    }

    fn cpus_of_node(&self, node: usize) -> AffinityResult<CpuList> {
        Err(AffinityError::failed(format!(
            "No NUMA topology available to resolve node {}",
            node
        )))
    }

    fn node_of_cpu(&self, _cpu: usize) -> Option<usize> {
        None
    }

    fn apply_cpu_mask(&self, pid: libc::pid_t, _cpus: &[usize]) -> AffinityResult<()> {
        warn!("Ignoring cpu mask for pid {}: no NUMA support", pid);
        Ok(())
    }
}

/// Fixed topology that records applied masks instead of calling the kernel.
///
/// Used by dry runs and tests.
#[derive(Debug, Default)]
pub struct StaticTopology {
    nodes: Vec<(usize, CpuList)>,
    applied: Mutex<Vec<(libc::pid_t, CpuList)>>,
}

impl StaticTopology {
    /// `nodes` maps node id to its cpus.
    pub fn new(nodes: Vec<(usize, CpuList)>) -> Self {
        Self {
            nodes,
            applied: Mutex::new(Vec::new()),
        }
    }

    /// Masks applied so far, in call order.
    pub fn applied(&self) -> Vec<(libc::pid_t, CpuList)> {
        match self.applied.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl Topology for StaticTopology {
    fn is_available(&self) -> bool {
        !self.nodes.is_empty()
    }

    fn configured_cpus(&self) -> CpuList {
        let mut cpus: CpuList = self.nodes.iter().flat_map(|(_, c)| c.iter().copied()).collect();
        cpus.sort_unstable();
        cpus.dedup();
        cpus
    }

    fn configured_nodes(&self) -> Vec<usize> {
        self.nodes.iter().map(|(n, _)| *n).collect()
    }

    fn cpus_of_node(&self, node: usize) -> AffinityResult<CpuList> {
        self.nodes
            .iter()
            .find(|(n, _)| *n == node)
            .map(|(_, cpus)| cpus.clone())
            .ok_or_else(|| AffinityError::failed(format!("Unknown node {}", node)))
    }

    fn node_of_cpu(&self, cpu: usize) -> Option<usize> {
        self.nodes
            .iter()
            .find(|(_, cpus)| cpus.contains(&cpu))
            .map(|(n, _)| *n)
    }

    fn apply_cpu_mask(&self, pid: libc::pid_t, cpus: &[usize]) -> AffinityResult<()> {
        let mut applied = match self.applied.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        applied.push((pid, cpus.to_vec()));
        Ok(())
    }
}
