//! Busy/ok evaluation of sampled host numbers against operator thresholds.
//!
//! A negative threshold disables its monitor. The report status is the
//! worst status among the individual checks.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of one monitored quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThresholdStatus {
    Ok,
    Busy,
}

impl fmt::Display for ThresholdStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThresholdStatus::Ok => write!(f, "ok"),
            ThresholdStatus::Busy => write!(f, "busy"),
        }
    }
}

/// Operator thresholds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Thresholds {
    /// Minimum idle CPU percent.
    pub cpu_idle: f64,
    /// Minimum free memory in MB.
    pub mem_free_mb: f64,
    /// Maximum 1-minute load as a percent of the CPU count.
    pub load_avg: f64,
    /// Maximum per-interface throughput in MB/s.
    pub nic_usage: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            cpu_idle: 10.0,
            mem_free_mb: 100.0,
            load_avg: 80.0,
            nic_usage: 900.0,
        }
    }
}

/// One evaluated monitor.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ThresholdCheck {
    pub name: String,
    pub value: f64,
    /// Effective threshold; `None` when the monitor is disabled.
    pub threshold: Option<f64>,
    pub status: ThresholdStatus,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ThresholdReport {
    pub checks: Vec<ThresholdCheck>,
    pub overall_status: ThresholdStatus,
}

/// Numbers produced by one sampling cycle.
#[derive(Debug, Clone, Default)]
pub struct ThresholdInputs {
    pub idle_percent: f64,
    pub mem_free_bytes: u64,
    pub load_one_min: f64,
    pub ncpus: usize,
    /// Interface name and throughput in MB/s.
    pub nic_throughput: Vec<(String, f64)>,
}

/// Busy when `value` falls below `threshold` (or rises above it when
/// `larger_is_busy`). Negative thresholds never report busy.
pub fn evaluate_status(value: f64, threshold: f64, larger_is_busy: bool) -> ThresholdStatus {
    if threshold < 0.0 {
        return ThresholdStatus::Ok;
    }
    let busy = if larger_is_busy {
        value > threshold
    } else {
        value < threshold
    };
    if busy {
        ThresholdStatus::Busy
    } else {
        ThresholdStatus::Ok
    }
}

fn check(name: &str, value: f64, threshold: f64, larger_is_busy: bool) -> ThresholdCheck {
    ThresholdCheck {
        name: name.to_string(),
        value,
        threshold: (threshold >= 0.0).then_some(threshold),
        status: evaluate_status(value, threshold, larger_is_busy),
    }
}

impl Thresholds {
    /// Evaluates every monitor for one sampling cycle.
    pub fn evaluate(&self, inputs: &ThresholdInputs) -> ThresholdReport {
        let mem_free_mb = inputs.mem_free_bytes as f64 / 1_000_000.0;
        // load threshold scales with the number of cpus
        let load_threshold = if self.load_avg < 0.0 {
            self.load_avg
        } else {
            inputs.ncpus.max(1) as f64 * self.load_avg / 100.0
        };

        let mut checks = vec![
            check("cpu_idle", inputs.idle_percent, self.cpu_idle, false),
            check("mem_free", mem_free_mb, self.mem_free_mb, false),
            check("load_avg", inputs.load_one_min, load_threshold, true),
        ];
        for (iface, mb_per_sec) in &inputs.nic_throughput {
            checks.push(check(
                &format!("nic_usage:{}", iface),
                *mb_per_sec,
                self.nic_usage,
                true,
            ));
        }

        let overall_status = checks
            .iter()
            .map(|c| c.status)
            .max()
            .unwrap_or(ThresholdStatus::Ok);

        ThresholdReport {
            checks,
            overall_status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idle_inputs() -> ThresholdInputs {
        ThresholdInputs {
            idle_percent: 90.0,
            mem_free_bytes: 8_000_000_000,
            load_one_min: 0.5,
            ncpus: 4,
            nic_throughput: vec![("eth0".to_string(), 1.0)],
        }
    }

    #[test]
    fn test_evaluate_status_directions() {
        assert_eq!(evaluate_status(5.0, 10.0, false), ThresholdStatus::Busy);
        assert_eq!(evaluate_status(15.0, 10.0, false), ThresholdStatus::Ok);
        assert_eq!(evaluate_status(15.0, 10.0, true), ThresholdStatus::Busy);
        assert_eq!(evaluate_status(10.0, 10.0, true), ThresholdStatus::Ok);
    }

    #[test]
    fn test_negative_threshold_disables() {
        assert_eq!(evaluate_status(0.0, -1.0, false), ThresholdStatus::Ok);
        let c = check("cpu_idle", 0.0, -1.0, false);
        assert_eq!(c.threshold, None);
        assert_eq!(c.status, ThresholdStatus::Ok);
    }

    #[test]
    fn test_idle_host_is_ok() {
        let report = Thresholds::default().evaluate(&idle_inputs());
        assert_eq!(report.overall_status, ThresholdStatus::Ok);
        assert_eq!(report.checks.len(), 4);
    }

    #[test]
    fn test_worst_status_wins() {
        let inputs = ThresholdInputs {
            idle_percent: 2.0,
            ..idle_inputs()
        };
        let report = Thresholds::default().evaluate(&inputs);
        assert_eq!(report.overall_status, ThresholdStatus::Busy);
        assert_eq!(report.checks[0].status, ThresholdStatus::Busy);
        assert_eq!(report.checks[1].status, ThresholdStatus::Ok);
    }

    #[test]
    fn test_load_threshold_scales_with_cpus() {
        let inputs = ThresholdInputs {
            load_one_min: 3.5,
            ..idle_inputs()
        };
        let report = Thresholds::default().evaluate(&inputs);
        let load = &report.checks[2];
        assert_eq!(load.threshold, Some(3.2));
        assert_eq!(load.status, ThresholdStatus::Busy);
    }

    #[test]
    fn test_nic_usage_per_interface() {
        let inputs = ThresholdInputs {
            nic_throughput: vec![("eth0".to_string(), 950.0), ("eth1".to_string(), 10.0)],
            ..idle_inputs()
        };
        let report = Thresholds::default().evaluate(&inputs);
        assert_eq!(report.checks[3].name, "nic_usage:eth0");
        assert_eq!(report.checks[3].status, ThresholdStatus::Busy);
        assert_eq!(report.checks[4].status, ThresholdStatus::Ok);
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&ThresholdStatus::Busy).unwrap();
        assert_eq!(json, "\"busy\"");
    }
}
