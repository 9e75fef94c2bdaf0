//! Process placement: NIC, socket, CPU, cpuset and cgroup directives.
//!
//! [`AffinityResolver`] turns an affinity request into a CPU mask (or a
//! control file write) for a target pid. Host access goes through a
//! [`FileSource`] for `/proc/interrupts` and a [`Topology`] for NUMA
//! queries, so every path can be exercised without touching the kernel.
//! Behaviour knobs live in [`AffinityConfig`], which is passed in rather
//! than held in mutable globals.

pub mod cpulist;
pub mod interrupts;
pub mod properties;
pub mod topology;

use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use once_cell::sync::Lazy;
use tracing::{debug, error, info, trace, warn};

use crate::error::{AffinityError, AffinityResult};
use crate::source::{FileSource, OsFileSource};

pub use cpulist::{format_list, parse_list, without, CpuList};
pub use interrupts::{identify_cpus, DEFAULT_INTERRUPTS_PATH};
pub use properties::{
    convert_properties, get_property_definitions, has_affinity, has_nic_affinity,
    AffinityDirective, AffinityDirectives, PropertySet, PropertyValue, AFFINITY_ID,
    EXEC_DIRECTIVE_CLASS, EXEC_DIRECTIVE_VALUE,
};
pub use topology::{NoNumaTopology, StaticTopology, SysfsTopology, Topology};

const LOG_TARGET: &str = "redhawk::affinity";

pub const DISABLE_AFFINITY_ENV: &str = "REDHAWK_DISABLE_AFFINITY";
pub const CPUSET_ROOT_ENV: &str = "REDHAWK_CPUSET_ROOT";
pub const CGROUP_ROOT_ENV: &str = "REDHAWK_CGROUP_ROOT";
pub const DEFAULT_CPUSET_ROOT: &str = "/dev/cpuset";
pub const DEFAULT_CGROUP_ROOT: &str = "/cgroup";

/// Replacement for the whole apply step.
pub type SetAffinityFn =
    Arc<dyn Fn(&[AffinityDirective], libc::pid_t, &[usize]) -> AffinityResult<()> + Send + Sync>;

/// Behaviour switches for affinity processing.
#[derive(Clone)]
pub struct AffinityConfig {
    pub enabled: bool,
    /// Widen a single-cpu (or fully blacklisted) NIC binding to its socket.
    pub promote_nic_to_socket: bool,
    /// Overrides `REDHAWK_CPUSET_ROOT` when set.
    pub cpuset_root: Option<PathBuf>,
    /// Overrides `REDHAWK_CGROUP_ROOT` when set.
    pub cgroup_root: Option<PathBuf>,
    pub interrupts_path: PathBuf,
    pub override_fn: Option<SetAffinityFn>,
}

impl Default for AffinityConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            promote_nic_to_socket: true,
            cpuset_root: None,
            cgroup_root: None,
            interrupts_path: PathBuf::from(DEFAULT_INTERRUPTS_PATH),
            override_fn: None,
        }
    }
}

impl fmt::Debug for AffinityConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AffinityConfig")
            .field("enabled", &self.enabled)
            .field("promote_nic_to_socket", &self.promote_nic_to_socket)
            .field("cpuset_root", &self.cpuset_root)
            .field("cgroup_root", &self.cgroup_root)
            .field("interrupts_path", &self.interrupts_path)
            .field("override_fn", &self.override_fn.is_some())
            .finish()
    }
}

impl AffinityConfig {
    /// Disabled by configuration or by `REDHAWK_DISABLE_AFFINITY` being set.
    pub fn is_disabled(&self) -> bool {
        !self.enabled || std::env::var_os(DISABLE_AFFINITY_ENV).is_some()
    }

    pub fn cpuset_root(&self) -> PathBuf {
        resolve_root(&self.cpuset_root, CPUSET_ROOT_ENV, DEFAULT_CPUSET_ROOT)
    }

    pub fn cgroup_root(&self) -> PathBuf {
        resolve_root(&self.cgroup_root, CGROUP_ROOT_ENV, DEFAULT_CGROUP_ROOT)
    }

    pub fn with_override(mut self, f: SetAffinityFn) -> Self {
        self.override_fn = Some(f);
        self
    }
}

fn resolve_root(configured: &Option<PathBuf>, env: &str, default: &str) -> PathBuf {
    if let Some(path) = configured {
        return path.clone();
    }
    std::env::var_os(env)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(default))
}

static DEFAULT_AFFINITY_CONFIG: Lazy<AffinityConfig> = Lazy::new(AffinityConfig::default);

/// Process-wide default configuration for call sites without their own.
pub fn default_affinity_config() -> &'static AffinityConfig {
    &DEFAULT_AFFINITY_CONFIG
}

/// Kind of control file written for cpuset and cgroup directives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ControlGroup {
    Cpuset,
    Cgroup,
}

/// Resolves and applies affinity directives for a target process.
pub struct AffinityResolver<F: FileSource, T: Topology> {
    config: AffinityConfig,
    files: F,
    topology: T,
}

impl AffinityResolver<OsFileSource, SysfsTopology<OsFileSource>> {
    /// Resolver over the live host with the process-wide default configuration.
    pub fn system() -> Self {
        Self::new(
            default_affinity_config().clone(),
            OsFileSource::new(),
            SysfsTopology::new(OsFileSource::new()),
        )
    }
}

impl<F: FileSource, T: Topology> AffinityResolver<F, T> {
    pub fn new(config: AffinityConfig, files: F, topology: T) -> Self {
        Self {
            config,
            files,
            topology,
        }
    }

    pub fn config(&self) -> &AffinityConfig {
        &self.config
    }

    pub fn topology(&self) -> &T {
        &self.topology
    }

    pub fn is_disabled(&self) -> bool {
        self.config.is_disabled()
    }

    /// CPUs servicing interrupts for `iface`; empty when unknown or disabled.
    pub fn identify_cpus(&self, iface: &str) -> CpuList {
        if self.is_disabled() {
            return CpuList::new();
        }
        match self.files.read_to_string(&self.config.interrupts_path) {
            Ok(content) => {
                let cpus = identify_cpus(&content, iface);
                debug!(
                    target: LOG_TARGET,
                    "Interface {} interrupts serviced by cpus [{}]",
                    iface,
                    format_list(&cpus)
                );
                cpus
            }
            Err(e) => {
                error!(
                    target: LOG_TARGET,
                    "Unable to read {}: {}",
                    self.config.interrupts_path.display(),
                    e
                );
                CpuList::new()
            }
        }
    }

    /// Socket owning the interrupt CPUs of `iface`.
    ///
    /// Interrupt CPUs in `blacklist` are ignored. With `find_first` the
    /// first remaining CPU decides. Otherwise every remaining CPU must sit
    /// on the same socket; a NIC serviced from more than one socket has no
    /// answer.
    pub fn find_socket_for_interface(
        &self,
        iface: &str,
        find_first: bool,
        blacklist: &[usize],
    ) -> Option<usize> {
        if self.is_disabled() || !self.topology.is_available() {
            return None;
        }

        let mut socket = None;
        for cpu in self.identify_cpus(iface) {
            if blacklist.contains(&cpu) {
                continue;
            }
            let node = self.topology.node_of_cpu(cpu)?;
            debug!(
                target: LOG_TARGET,
                "Finding socket for NIC {}: cpu {} on socket {}", iface, cpu, node
            );
            match socket {
                Some(previous) if previous != node => {
                    warn!(target: LOG_TARGET, "More than 1 socket servicing NIC: {}", iface);
                    return None;
                }
                _ => socket = Some(node),
            }
            if find_first {
                break;
            }
        }
        socket
    }

    /// Expands a list string into CPUs.
    ///
    /// `list_type` is `socket` (or `node`) for node lists and `cpu` for CPU
    /// lists. Other types and a disabled or NUMA-less host yield an empty
    /// list.
    pub fn get_cpu_list(&self, list_type: &str, context: &str) -> AffinityResult<CpuList> {
        if self.is_disabled() || !self.topology.is_available() {
            return Ok(CpuList::new());
        }

        match list_type {
            "socket" | "node" => self.cpus_of_nodes(context),
            "cpu" => parse_list(context, &self.topology.configured_cpus()).map_err(|e| {
                AffinityError::failed(format!("Unable to parse cpu list {}: {}", context, e))
            }),
            _ => Ok(CpuList::new()),
        }
    }

    fn cpus_of_nodes(&self, context: &str) -> AffinityResult<CpuList> {
        let nodes = parse_list(context, &self.topology.configured_nodes()).map_err(|e| {
            AffinityError::failed(format!(
                "Processor Socket affinity failed, unable to parse: {} ({})",
                context, e
            ))
        })?;

        let mut cpus = CpuList::new();
        for node in nodes {
            cpus.extend(self.topology.cpus_of_node(node)?);
        }
        cpus.sort_unstable();
        cpus.dedup();
        Ok(cpus)
    }

    pub fn has_nic_affinity(&self, options: &PropertySet) -> bool {
        !self.is_disabled() && has_nic_affinity(options)
    }

    /// Applies the affinity request carried in `options` to `pid`.
    pub fn set_affinity(
        &self,
        options: &PropertySet,
        pid: libc::pid_t,
        blacklist: &[usize],
    ) -> AffinityResult<()> {
        if self.is_disabled() {
            return Ok(());
        }
        let directives = convert_properties(options)?;
        self.set_affinity_directives(&directives, pid, blacklist)
    }

    /// Applies `directives` to `pid` in order, never using `blacklist` CPUs.
    ///
    /// The first failing directive aborts the request.
    pub fn set_affinity_directives(
        &self,
        directives: &[AffinityDirective],
        pid: libc::pid_t,
        blacklist: &[usize],
    ) -> AffinityResult<()> {
        if self.is_disabled() {
            return Ok(());
        }

        if let Some(override_fn) = &self.config.override_fn {
            return override_fn(directives, pid, blacklist);
        }

        trace!(target: LOG_TARGET, "Blacklist: [{}]", format_list(blacklist));

        for directive in directives {
            debug!(target: LOG_TARGET, "Affinity directive {} for pid {}", directive, pid);

            let class = directive.class.as_str();
            let numa_directive = matches!(class, "nic" | "socket" | "node" | "cpu");
            if numa_directive && !self.topology.is_available() {
                warn!(
                    target: LOG_TARGET,
                    "Missing affinity support from NUMA, ignoring directive {}", directive
                );
                continue;
            }

            match class {
                "nic" => self.apply_nic(&directive.value, pid, blacklist)?,
                "socket" | "node" => self.apply_socket(&directive.value, pid, blacklist)?,
                "cpu" => self.apply_cpu(&directive.value, pid, blacklist)?,
                "cpuset" => self.apply_control_group(ControlGroup::Cpuset, &directive.value, pid)?,
                "cgroup" => self.apply_control_group(ControlGroup::Cgroup, &directive.value, pid)?,
                other => warn!(target: LOG_TARGET, "Unknown affinity class '{}' ignored", other),
            }
        }

        Ok(())
    }

    fn apply_nic(&self, iface: &str, pid: libc::pid_t, blacklist: &[usize]) -> AffinityResult<()> {
        let mut cpus = self.identify_cpus(iface);
        if cpus.is_empty() {
            return Err(AffinityError::failed(format!(
                "Binding to NIC, unable to set directive, cannot determine socket or cpu list from interrupt mapping, directive: {}",
                iface
            )));
        }

        // Own process with nothing excluded: bind to every node the NIC touches.
        if blacklist.is_empty() && pid == nix::unistd::getpid().as_raw() {
            let mut nodes: Vec<usize> = cpus
                .iter()
                .filter_map(|c| self.topology.node_of_cpu(*c))
                .collect();
            nodes.sort_unstable();
            nodes.dedup();

            let mut node_cpus = CpuList::new();
            for node in &nodes {
                node_cpus.extend(self.topology.cpus_of_node(*node)?);
            }
            if node_cpus.is_empty() {
                node_cpus = cpus;
            }

            info!(
                target: LOG_TARGET,
                "Binding to NIC with node affinity, pid {} nic {} nodes [{}]",
                pid,
                iface,
                format_list(&nodes)
            );
            return self
                .topology
                .apply_cpu_mask(pid, &node_cpus)
                .map_err(|e| {
                    AffinityError::failed(format!(
                        "Binding to NIC with node affinity, nic={}: {}",
                        iface,
                        e.explanation()
                    ))
                });
        }

        let usable = cpus.iter().filter(|c| !blacklist.contains(c)).count();
        if self.config.promote_nic_to_socket && (cpus.len() == 1 || usable == 0) {
            let cpu = cpus[0];
            let socket = self.topology.node_of_cpu(cpu).ok_or_else(|| {
                AffinityError::failed(format!(
                    "Binding to NIC, unable to find socket for cpu {} of interface {}",
                    cpu, iface
                ))
            })?;
            info!(
                target: LOG_TARGET,
                "Promoting NIC affinity to PID:{} SOCKET:{}", pid, socket
            );
            cpus = self.topology.cpus_of_node(socket)?;
        }

        let allowed = without(&cpus, blacklist);
        if allowed.is_empty() {
            return Err(AffinityError::failed(format!(
                "Binding to NIC, no cpus available all blacklisted : {}",
                iface
            )));
        }

        info!(
            target: LOG_TARGET,
            "Binding to NIC with cpu affinity, pid {} nic {} cpus [{}]",
            pid,
            iface,
            format_list(&allowed)
        );
        self.topology.apply_cpu_mask(pid, &allowed).map_err(|e| {
            AffinityError::failed(format!(
                "Binding to NIC with cpu affinity, nic={}: {}",
                iface,
                e.explanation()
            ))
        })
    }

    fn apply_socket(&self, nodes: &str, pid: libc::pid_t, blacklist: &[usize]) -> AffinityResult<()> {
        let cpus = self.cpus_of_nodes(nodes)?;
        let allowed = without(&cpus, blacklist);
        if allowed.is_empty() {
            return Err(AffinityError::failed(format!(
                "Binding to PROCESSOR SOCKET, no cpus available all blacklisted, socket={}",
                nodes
            )));
        }

        info!(
            target: LOG_TARGET,
            "Binding to PROCESSOR SOCKET, pid {} socket {} cpus [{}]",
            pid,
            nodes,
            format_list(&allowed)
        );
        self.topology.apply_cpu_mask(pid, &allowed).map_err(|e| {
            AffinityError::failed(format!(
                "Binding to PROCESSOR SOCKET, socket={}: {}",
                nodes,
                e.explanation()
            ))
        })
    }

    fn apply_cpu(&self, list: &str, pid: libc::pid_t, blacklist: &[usize]) -> AffinityResult<()> {
        let cpus = parse_list(list, &self.topology.configured_cpus()).map_err(|e| {
            AffinityError::failed(format!("CPU affinity failed, unable to parse: {} ({})", list, e))
        })?;

        let allowed = without(&cpus, blacklist);
        if allowed.is_empty() {
            return Err(AffinityError::failed(format!(
                "Binding to CPU, no cpus available all blacklisted, cpu={}",
                list
            )));
        }

        info!(
            target: LOG_TARGET,
            "Binding to CPU, pid {} cpus [{}]",
            pid,
            format_list(&allowed)
        );
        self.topology.apply_cpu_mask(pid, &allowed).map_err(|e| {
            AffinityError::failed(format!("Binding to CPU: {}: {}", list, e.explanation()))
        })
    }

    fn apply_control_group(&self, kind: ControlGroup, name: &str, pid: libc::pid_t) -> AffinityResult<()> {
        let (root, label) = match kind {
            ControlGroup::Cpuset => (self.config.cpuset_root(), "CPUSET"),
            ControlGroup::Cgroup => (self.config.cgroup_root(), "CGROUP"),
        };
        let task_path = root.join(name).join("task");

        info!(
            target: LOG_TARGET,
            "Binding to {}, pid {} task file {}",
            label,
            pid,
            task_path.display()
        );
        write_task_file(&task_path, pid).map_err(|source| AffinityError::Io {
            message: match kind {
                ControlGroup::Cpuset => {
                    format!("CPUSET affinity failed, could not open cpuset : {}", name)
                }
                ControlGroup::Cgroup => format!("CGROUP affinity failed, for cgroup: {}", name),
            },
            source,
        })
    }
}

fn write_task_file(path: &Path, pid: libc::pid_t) -> std::io::Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)?;
    writeln!(file, "{}", pid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemoryFileSource;
    use std::sync::Mutex;

    const INTERRUPTS: &str = "      CPU0 CPU1 CPU2 CPU3 CPU4 CPU5 CPU6 CPU7\n\
 40:  0  0  0  0  0  9  0  0  PCI-MSI 1-edge  eth0\n\
 41:  7  0  0  0  0  0  0  0  PCI-MSI 2-edge  eth1-rx-0\n\
 42:  0  0  3  0  0  0  0  0  PCI-MSI 3-edge  eth1-rx-1\n";

    fn resolver(config: AffinityConfig) -> AffinityResolver<MemoryFileSource, StaticTopology> {
        let files = MemoryFileSource::new().with_file(DEFAULT_INTERRUPTS_PATH, INTERRUPTS);
        let topology = StaticTopology::new(vec![(0, vec![0, 1, 2, 3]), (1, vec![4, 5, 6, 7])]);
        AffinityResolver::new(config, files, topology)
    }

    // A pid that is never our own, so NIC binding takes the cpu path.
    const OTHER_PID: libc::pid_t = 1;

    #[test]
    fn test_cpu_directive_drops_blacklisted() {
        let r = resolver(AffinityConfig::default());
        r.set_affinity_directives(&[AffinityDirective::new("cpu", "0,2")], OTHER_PID, &[2])
            .unwrap();
        assert_eq!(r.topology().applied(), vec![(OTHER_PID, vec![0])]);
    }

    #[test]
    fn test_cpu_directive_fully_blacklisted_fails() {
        let r = resolver(AffinityConfig::default());
        let err = r
            .set_affinity_directives(&[AffinityDirective::new("cpu", "0,2")], OTHER_PID, &[0, 2])
            .unwrap_err();
        assert!(err.explanation().contains("blacklisted"));
        assert!(r.topology().applied().is_empty());
    }

    #[test]
    fn test_socket_directive_uses_node_cpus() {
        let r = resolver(AffinityConfig::default());
        r.set_affinity_directives(&[AffinityDirective::new("socket", "1")], OTHER_PID, &[7])
            .unwrap();
        assert_eq!(r.topology().applied(), vec![(OTHER_PID, vec![4, 5, 6])]);
    }

    #[test]
    fn test_nic_single_cpu_promoted_to_socket() {
        let r = resolver(AffinityConfig::default());
        r.set_affinity_directives(&[AffinityDirective::new("nic", "eth0")], OTHER_PID, &[])
            .unwrap();
        assert_eq!(r.topology().applied(), vec![(OTHER_PID, vec![4, 5, 6, 7])]);
    }

    #[test]
    fn test_nic_without_promotion_binds_interrupt_cpu() {
        let config = AffinityConfig {
            promote_nic_to_socket: false,
            ..AffinityConfig::default()
        };
        let r = resolver(config);
        r.set_affinity_directives(&[AffinityDirective::new("nic", "eth0")], OTHER_PID, &[])
            .unwrap();
        assert_eq!(r.topology().applied(), vec![(OTHER_PID, vec![5])]);
    }

    #[test]
    fn test_nic_multi_queue_filters_blacklist() {
        let r = resolver(AffinityConfig::default());
        r.set_affinity_directives(&[AffinityDirective::new("nic", "eth1")], OTHER_PID, &[2])
            .unwrap();
        assert_eq!(r.topology().applied(), vec![(OTHER_PID, vec![0])]);
    }

    #[test]
    fn test_nic_all_blacklisted_promotes() {
        let r = resolver(AffinityConfig::default());
        r.set_affinity_directives(&[AffinityDirective::new("nic", "eth1")], OTHER_PID, &[0, 2])
            .unwrap();
        assert_eq!(r.topology().applied(), vec![(OTHER_PID, vec![1, 3])]);
    }

    #[test]
    fn test_nic_promoted_socket_fully_blacklisted_fails() {
        let r = resolver(AffinityConfig::default());
        let err = r
            .set_affinity_directives(
                &[AffinityDirective::new("nic", "eth0")],
                OTHER_PID,
                &[4, 5, 6, 7],
            )
            .unwrap_err();
        assert!(matches!(err, AffinityError::Failed(_)));
        assert!(err.explanation().contains("all blacklisted"));
        assert!(r.topology().applied().is_empty());
    }

    #[test]
    fn test_nic_unknown_interface_fails() {
        let r = resolver(AffinityConfig::default());
        let err = r
            .set_affinity_directives(&[AffinityDirective::new("nic", "eth9")], OTHER_PID, &[])
            .unwrap_err();
        assert!(err.explanation().contains("eth9"));
    }

    #[test]
    fn test_own_pid_nic_binds_nodes() {
        let r = resolver(AffinityConfig::default());
        let me = nix::unistd::getpid().as_raw();
        r.set_affinity_directives(&[AffinityDirective::new("nic", "eth1")], me, &[])
            .unwrap();
        assert_eq!(r.topology().applied(), vec![(me, vec![0, 1, 2, 3])]);
    }

    #[test]
    fn test_disabled_is_noop() {
        let config = AffinityConfig {
            enabled: false,
            ..AffinityConfig::default()
        };
        let r = resolver(config);
        r.set_affinity_directives(&[AffinityDirective::new("cpu", "0")], OTHER_PID, &[])
            .unwrap();
        r.set_affinity(&PropertySet::new(), OTHER_PID, &[]).unwrap();
        assert!(r.topology().applied().is_empty());
        assert!(r.identify_cpus("eth0").is_empty());
        assert!(r.get_cpu_list("cpu", "0-3").unwrap().is_empty());
    }

    #[test]
    fn test_override_replaces_apply() {
        let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let config = AffinityConfig::default().with_override(Arc::new(
            move |d: &[AffinityDirective], pid: libc::pid_t, _: &[usize]| {
                sink.lock().unwrap().push(format!("{}@{}", d[0], pid));
                Ok(())
            },
        ));
        let r = resolver(config);
        r.set_affinity_directives(&[AffinityDirective::new("cpu", "3")], 9, &[])
            .unwrap();

        assert_eq!(*seen.lock().unwrap(), vec!["cpu:3@9".to_string()]);
        assert!(r.topology().applied().is_empty());
    }

    #[test]
    fn test_get_cpu_list_and_socket_lookup() {
        let r = resolver(AffinityConfig::default());
        assert_eq!(r.get_cpu_list("node", "0").unwrap(), vec![0, 1, 2, 3]);
        assert_eq!(r.get_cpu_list("cpu", "6-7").unwrap(), vec![6, 7]);
        assert!(r.get_cpu_list("bogus", "0").unwrap().is_empty());
        assert!(r.get_cpu_list("socket", "5").is_err());

        assert_eq!(r.find_socket_for_interface("eth0", true, &[]), Some(1));
        assert_eq!(r.find_socket_for_interface("eth1", false, &[0]), Some(0));
        assert_eq!(r.find_socket_for_interface("eth1", false, &[0, 2]), None);
    }

    #[test]
    fn test_socket_lookup_across_sockets() {
        // eth2 is serviced by cpu1 (socket 0) and cpu6 (socket 1)
        let interrupts = format!(
            "{} 43:  0  4  0  0  0  0  0  0  PCI-MSI 4-edge  eth2-rx-0\n 44:  0  0  0  0  0  0  8  0  PCI-MSI 5-edge  eth2-rx-1\n",
            INTERRUPTS
        );
        let files = MemoryFileSource::new().with_file(DEFAULT_INTERRUPTS_PATH, interrupts);
        let topology = StaticTopology::new(vec![(0, vec![0, 1, 2, 3]), (1, vec![4, 5, 6, 7])]);
        let r = AffinityResolver::new(AffinityConfig::default(), files, topology);

        assert_eq!(r.find_socket_for_interface("eth2", false, &[]), None);
        assert_eq!(r.find_socket_for_interface("eth2", false, &[1]), Some(1));
        assert_eq!(r.find_socket_for_interface("eth2", true, &[]), Some(0));
        assert_eq!(r.find_socket_for_interface("eth2", true, &[1]), Some(1));
        assert_eq!(r.find_socket_for_interface("eth2", true, &[1, 6]), None);
    }

    #[test]
    fn test_cgroup_writes_pid_to_task_file() {
        let root = tempfile::tempdir().expect("Failed to create temp dir");
        std::fs::create_dir(root.path().join("rt")).expect("Failed to create cgroup dir");
        let config = AffinityConfig {
            cgroup_root: Some(root.path().to_path_buf()),
            ..AffinityConfig::default()
        };
        let r = resolver(config);
        r.set_affinity_directives(&[AffinityDirective::new("cgroup", "rt")], 4242, &[])
            .unwrap();

        let written = std::fs::read_to_string(root.path().join("rt/task")).unwrap();
        assert_eq!(written, "4242\n");
    }

    #[test]
    fn test_missing_cpuset_fails() {
        let root = tempfile::tempdir().expect("Failed to create temp dir");
        let config = AffinityConfig {
            cpuset_root: Some(root.path().to_path_buf()),
            ..AffinityConfig::default()
        };
        let r = resolver(config);
        let err = r
            .set_affinity_directives(&[AffinityDirective::new("cpuset", "missing")], 1, &[])
            .unwrap_err();
        assert!(err
            .explanation()
            .starts_with("CPUSET affinity failed, could not open cpuset : missing"));
    }

    #[test]
    fn test_no_numa_skips_cpu_directives() {
        let files = MemoryFileSource::new().with_file(DEFAULT_INTERRUPTS_PATH, INTERRUPTS);
        let r = AffinityResolver::new(AffinityConfig::default(), files, NoNumaTopology);
        r.set_affinity_directives(
            &[
                AffinityDirective::new("cpu", "0"),
                AffinityDirective::new("nic", "eth0"),
            ],
            OTHER_PID,
            &[],
        )
        .unwrap();
    }
}
