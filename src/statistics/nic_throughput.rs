//! Device throughput between two samples of a [`NicData`].
//!
//! One accumulator covers a physical device; VLAN sub-interfaces share its
//! link and are listed on it instead of being counted again.

use std::time::Instant;

use crate::states::NicData;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// rx+tx byte rate of one device.
#[derive(Debug, Clone)]
pub struct NicAccumulator {
    device: String,
    vlans: Vec<String>,
    previous: Option<(u64, Instant)>,
    throughput_mb_per_sec: f64,
}

impl NicAccumulator {
    pub fn new(device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            vlans: Vec::new(),
            previous: None,
            throughput_mb_per_sec: 0.0,
        }
    }

    pub fn get_device(&self) -> &str {
        &self.device
    }

    /// Records a VLAN carried on this device; empty ids and repeats are ignored.
    pub fn add_vlan(&mut self, vlan: &str) {
        if !vlan.is_empty() && !self.vlans.iter().any(|v| v == vlan) {
            self.vlans.push(vlan.to_string());
        }
    }

    pub fn get_vlans(&self) -> &[String] {
        &self.vlans
    }

    /// VLAN ids joined with `,`, e.g. `"50,100"`.
    pub fn get_vlans_string(&self) -> String {
        self.vlans.join(",")
    }

    /// Updates the rate from `data` observed at `now`.
    ///
    /// The rate stays 0 on the first sample, when no time has passed, and
    /// when the counters went backwards (interface reset).
    pub fn compute_statistics(&mut self, data: &NicData, now: Instant) {
        let bytes = data.rx_bytes.saturating_add(data.tx_bytes);

        self.throughput_mb_per_sec = match self.previous {
            Some((prev_bytes, prev_time)) => {
                let elapsed = now.saturating_duration_since(prev_time).as_secs_f64();
                if elapsed > 0.0 && bytes >= prev_bytes {
                    (bytes - prev_bytes) as f64 / elapsed / BYTES_PER_MB
                } else {
                    0.0
                }
            }
            None => 0.0,
        };

        self.previous = Some((bytes, now));
    }

    pub fn get_throughput_mb_per_sec(&self) -> f64 {
        self.throughput_mb_per_sec
    }

    /// Throughput in bits per second.
    pub fn get_throughput_bps(&self) -> f64 {
        self.throughput_mb_per_sec * 8.0 * BYTES_PER_MB
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn data(rx: u64, tx: u64) -> NicData {
        let mut d = NicData::new("eth0");
        d.rx_bytes = rx;
        d.tx_bytes = tx;
        d
    }

    #[test]
    fn test_first_sample_is_zero() {
        let mut acc = NicAccumulator::new("eth0");
        acc.compute_statistics(&data(1000, 1000), Instant::now());
        assert_eq!(acc.get_throughput_mb_per_sec(), 0.0);
    }

    #[test]
    fn test_throughput_over_interval() {
        let mut acc = NicAccumulator::new("eth0");
        let start = Instant::now();
        acc.compute_statistics(&data(0, 0), start);
        acc.compute_statistics(
            &data(1024 * 1024, 1024 * 1024),
            start + Duration::from_secs(2),
        );

        assert!((acc.get_throughput_mb_per_sec() - 1.0).abs() < 1e-9);
        assert!((acc.get_throughput_bps() - 8.0 * 1024.0 * 1024.0).abs() < 1e-3);
    }

    #[test]
    fn test_vlans_listed_once() {
        let mut acc = NicAccumulator::new("eth0");
        acc.add_vlan("100");
        acc.add_vlan("");
        acc.add_vlan("50");
        acc.add_vlan("100");
        assert_eq!(acc.get_vlans(), &["100".to_string(), "50".to_string()]);
        assert_eq!(acc.get_vlans_string(), "100,50");
    }

    #[test]
    fn test_counter_reset_is_zero() {
        let mut acc = NicAccumulator::new("eth0");
        let start = Instant::now();
        acc.compute_statistics(&data(5000, 0), start);
        acc.compute_statistics(&data(10, 0), start + Duration::from_secs(1));
        assert_eq!(acc.get_throughput_mb_per_sec(), 0.0);
    }
}
