//! Configuration management for gpp-monitor.
//!
//! This module handles loading, merging, and validating configuration from files
//! and CLI arguments. It supports YAML, JSON, and TOML formats.

use crate::cli::{Args, ConfigFormat, LogLevel};
use gpp_monitor::affinity::{parse_list, AffinityConfig, CpuList};
use gpp_monitor::monitor::DEFAULT_MAX_NIC_THROUGHPUT_PERCENT;
use gpp_monitor::{MonitorSettings, Thresholds};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

// Default configuration constants
pub const DEFAULT_INTERVAL_SECONDS: u64 = 1;
pub const DEFAULT_PROC_ROOT: &str = "/proc";
pub const DEFAULT_SYS_ROOT: &str = "/sys";
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Affinity processing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AffinitySettings {
    pub enabled: Option<bool>,
    pub promote_nic_to_socket: Option<bool>,
    pub cpuset_root: Option<String>,
    pub cgroup_root: Option<String>,
    /// CPU list never handed to a bound process, e.g. "0,1".
    pub blacklist: Option<String>,
}

impl Default for AffinitySettings {
    fn default() -> Self {
        Self {
            enabled: Some(true),
            promote_nic_to_socket: Some(true),
            cpuset_root: None,
            cgroup_root: None,
            blacklist: None,
        }
    }
}

impl AffinitySettings {
    pub fn to_affinity_config(&self, proc_root: &Path) -> AffinityConfig {
        AffinityConfig {
            enabled: self.enabled.unwrap_or(true),
            promote_nic_to_socket: self.promote_nic_to_socket.unwrap_or(true),
            cpuset_root: self.cpuset_root.as_ref().map(PathBuf::from),
            cgroup_root: self.cgroup_root.as_ref().map(PathBuf::from),
            interrupts_path: proc_root.join("interrupts"),
            override_fn: None,
        }
    }

    pub fn blacklist(&self) -> Result<CpuList, String> {
        match self.blacklist.as_deref() {
            None => Ok(CpuList::new()),
            Some(s) if s.trim().is_empty() => Ok(CpuList::new()),
            Some(s) => parse_list(s, &[]),
        }
    }
}

/// Enhanced configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Sampling
    pub interval_seconds: Option<u64>,
    pub proc_root: Option<String>,
    pub sys_root: Option<String>,
    pub log_level: Option<String>,

    /// Interface name patterns (regex); empty watches all but `lo`.
    pub nic_interfaces: Option<Vec<String>>,

    /// Share of link speed NIC allocations may reserve, in percent.
    pub nic_max_throughput_percent: Option<f64>,

    #[serde(default)]
    pub thresholds: Thresholds,

    #[serde(default)]
    pub affinity: AffinitySettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            interval_seconds: Some(DEFAULT_INTERVAL_SECONDS),
            proc_root: Some(DEFAULT_PROC_ROOT.to_string()),
            sys_root: Some(DEFAULT_SYS_ROOT.to_string()),
            log_level: Some(DEFAULT_LOG_LEVEL.to_string()),
            nic_interfaces: Some(Vec::new()),
            nic_max_throughput_percent: Some(DEFAULT_MAX_NIC_THROUGHPUT_PERCENT),
            thresholds: Thresholds::default(),
            affinity: AffinitySettings::default(),
        }
    }
}

impl Config {
    pub fn proc_root(&self) -> PathBuf {
        PathBuf::from(self.proc_root.as_deref().unwrap_or(DEFAULT_PROC_ROOT))
    }

    pub fn sys_root(&self) -> PathBuf {
        PathBuf::from(self.sys_root.as_deref().unwrap_or(DEFAULT_SYS_ROOT))
    }

    pub fn interval_seconds(&self) -> u64 {
        self.interval_seconds.unwrap_or(DEFAULT_INTERVAL_SECONDS)
    }

    pub fn nic_max_throughput_percent(&self) -> f64 {
        self.nic_max_throughput_percent
            .unwrap_or(DEFAULT_MAX_NIC_THROUGHPUT_PERCENT)
    }

    pub fn affinity_config(&self) -> AffinityConfig {
        self.affinity.to_affinity_config(&self.proc_root())
    }

    /// Settings for a `SystemMonitor`; fails on an invalid interface pattern.
    pub fn monitor_settings(&self) -> Result<MonitorSettings, regex::Error> {
        MonitorSettings {
            proc_root: self.proc_root(),
            sys_root: self.sys_root(),
            nic_patterns: Vec::new(),
            thresholds: self.thresholds.clone(),
            max_nic_throughput_percent: self.nic_max_throughput_percent(),
        }
        .with_nic_patterns(self.nic_interfaces.as_deref().unwrap_or(&[]))
    }
}

fn parse_log_level(level: &str) -> Option<LogLevel> {
    match level.to_ascii_lowercase().as_str() {
        "off" => Some(LogLevel::Off),
        "error" => Some(LogLevel::Error),
        "warn" => Some(LogLevel::Warn),
        "info" => Some(LogLevel::Info),
        "debug" => Some(LogLevel::Debug),
        "trace" => Some(LogLevel::Trace),
        _ => None,
    }
}

/// Effective log level from config, defaulting to info.
pub fn effective_log_level(cfg: &Config) -> LogLevel {
    cfg.log_level
        .as_deref()
        .and_then(parse_log_level)
        .unwrap_or(LogLevel::Info)
}

/// Validate effective config (used by --check-config and at startup)
pub fn validate_effective_config(cfg: &Config) -> Result<(), Box<dyn std::error::Error>> {
    if cfg.interval_seconds() == 0 {
        return Err("interval_seconds must be greater than 0".into());
    }

    if let Some(level) = cfg.log_level.as_deref() {
        if parse_log_level(level).is_none() {
            return Err(format!(
                "Invalid log_level '{}', expected off/error/warn/info/debug/trace",
                level
            )
            .into());
        }
    }

    for pattern in cfg.nic_interfaces.as_deref().unwrap_or(&[]) {
        if let Err(e) = Regex::new(pattern) {
            return Err(format!("Invalid nic_interfaces pattern '{}': {}", pattern, e).into());
        }
    }

    let thresholds = &cfg.thresholds;
    if thresholds.cpu_idle > 100.0 {
        return Err(format!(
            "thresholds.cpu_idle is a percentage and must not exceed 100 (got {})",
            thresholds.cpu_idle
        )
        .into());
    }
    if thresholds.load_avg > 100.0 {
        return Err(format!(
            "thresholds.load_avg is a percentage and must not exceed 100 (got {})",
            thresholds.load_avg
        )
        .into());
    }

    let nic_percent = cfg.nic_max_throughput_percent();
    if !(0.0..=100.0).contains(&nic_percent) {
        return Err(format!(
            "nic_max_throughput_percent must be between 0 and 100 (got {})",
            nic_percent
        )
        .into());
    }

    if let Err(e) = cfg.affinity.blacklist() {
        return Err(format!("Invalid affinity.blacklist: {}", e).into());
    }

    Ok(())
}

/// Resolves configuration from CLI args, config file, and defaults.
/// This enforces precedence: CLI (if provided) > config file > default.
pub fn resolve_config(args: &Args) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = if args.no_config {
        Config::default()
    } else {
        load_config(args.config.as_deref().and_then(|p| p.to_str()))?
    };

    if let Some(interval) = args.interval {
        config.interval_seconds = Some(interval);
    }
    if let Some(proc_root) = &args.proc_root {
        config.proc_root = Some(proc_root.to_string_lossy().to_string());
    }
    if let Some(sys_root) = &args.sys_root {
        config.sys_root = Some(sys_root.to_string_lossy().to_string());
    }
    if let Some(level) = &args.log_level {
        config.log_level = Some(format!("{:?}", level).to_lowercase());
    }
    if args.disable_affinity {
        config.affinity.enabled = Some(false);
    }

    Ok(config)
}

/// Enhanced configuration loading with multiple format support
pub fn load_config(path: Option<&str>) -> Result<Config, Box<dyn std::error::Error>> {
    let path = if let Some(p) = path {
        PathBuf::from(p)
    } else {
        // Try default locations
        let defaults = [
            "/etc/gpp-monitor/gpp-monitor.yaml",
            "/etc/gpp-monitor/gpp-monitor.yml",
            "/etc/gpp-monitor/gpp-monitor.json",
            "./gpp-monitor.yaml",
            "./gpp-monitor.yml",
            "./gpp-monitor.json",
        ];

        defaults
            .iter()
            .find(|p| Path::new(p).exists())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(""))
    };

    if !path.exists() || path.to_string_lossy().is_empty() {
        return Ok(Config::default());
    }

    let content = fs::read_to_string(&path)?;

    match path.extension().and_then(|s| s.to_str()) {
        Some("json") => {
            let config: Config = serde_json::from_str(&content)?;
            info!("Loaded JSON configuration from: {}", path.display());
            Ok(config)
        }
        Some("toml") => {
            let config: Config = toml::from_str(&content)?;
            info!("Loaded TOML configuration from: {}", path.display());
            Ok(config)
        }
        _ => {
            // Default to YAML
            let config: Config = serde_yaml::from_str(&content)?;
            info!("Loaded YAML configuration from: {}", path.display());
            Ok(config)
        }
    }
}

/// Renders configuration in the requested format
pub fn render_config(config: &Config, format: &ConfigFormat) -> Result<String, Box<dyn std::error::Error>> {
    Ok(match format {
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        ConfigFormat::Toml => toml::to_string_pretty(config)?,
        ConfigFormat::Yaml => serde_yaml::to_string(config)?,
    })
}

/// Shows configuration in requested format
pub fn show_config(config: &Config, format: ConfigFormat) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", render_config(config, &format)?);
    Ok(())
}
