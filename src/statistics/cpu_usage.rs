//! Delta based CPU utilization between two `/proc/stat` samples.

use crate::parsers::proc_stat::{CpuJiffies, JiffyField};
use crate::source::FileSource;
use crate::states::CpuState;

/// Percent utilization per jiffy category over the last sampling interval.
///
/// `compute_statistics` must run once per interval before any getter is
/// read. Every percentage is exactly 0.0 until two samples exist or when no
/// kernel time elapsed between them.
#[derive(Debug, Clone, Default)]
pub struct CpuUsageAccumulator {
    cpus: Option<Vec<usize>>,
    previous: Option<CpuJiffies>,
    current: Option<CpuJiffies>,
}

impl CpuUsageAccumulator {
    /// Accumulator over the aggregate `cpu` line.
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulator over the sum of the listed cores (e.g. one NUMA socket).
    pub fn for_cpus(cpus: Vec<usize>) -> Self {
        Self {
            cpus: Some(cpus),
            previous: None,
            current: None,
        }
    }

    /// Rotates current into previous and takes a fresh sample from `state`.
    pub fn compute_statistics<F: FileSource>(&mut self, state: &CpuState<F>) {
        let sample = match &self.cpus {
            None => *state.get_cpu_jiffies(),
            Some(cpus) => {
                let per_cpu = state.get_per_cpu_jiffies();
                let mut sum = CpuJiffies::default();
                for jiffies in cpus.iter().filter_map(|cpu| per_cpu.get(cpu)) {
                    sum.accumulate(jiffies);
                }
                sum
            }
        };
        self.push_sample(sample);
    }

    /// Rotates current into previous and stores `sample` as current.
    pub fn push_sample(&mut self, sample: CpuJiffies) {
        self.previous = self.current.take();
        self.current = Some(sample);
    }

    /// Number of cores covered; `None` for the aggregate line.
    pub fn get_ncpus(&self) -> Option<usize> {
        self.cpus.as_ref().map(|c| c.len())
    }

    pub fn get_user_percent(&self) -> f64 {
        self.get_field_percent(JiffyField::User)
    }

    pub fn get_system_percent(&self) -> f64 {
        self.get_field_percent(JiffyField::System)
    }

    pub fn get_idle_percent(&self) -> f64 {
        self.get_field_percent(JiffyField::Idle)
    }

    /// Total jiffies elapsed between the last two samples, 0 before two exist.
    pub fn get_delta_cpu_jiffies_total(&self) -> u64 {
        match (&self.previous, &self.current) {
            (Some(previous), Some(current)) => current.total().saturating_sub(previous.total()),
            _ => 0,
        }
    }

    pub fn get_field_percent(&self, field: JiffyField) -> f64 {
        let total = self.get_delta_cpu_jiffies_total();
        if total == 0 {
            return 0.0;
        }
        match (&self.previous, &self.current) {
            (Some(previous), Some(current)) => {
                let delta = current[field].saturating_sub(previous[field]);
                delta as f64 / total as f64 * 100.0
            }
            _ => 0.0,
        }
    }
}
