//! NIC capacity reservations.
//!
//! A device can hand out up to `max_throughput_percent` of its link speed.
//! What is left for a new request is that limit minus the larger of the
//! capacity already reserved and the throughput currently measured.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::error::{NicAllocationError, NicAllocationResult};
use crate::states::split_interface;

const BITS_PER_MBIT: f64 = 1e6;

/// A capacity request, and once granted its status entry.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NicAllocation {
    pub identifier: String,
    /// Elements per second.
    pub data_rate: f64,
    /// Bytes per element.
    pub data_size: u32,
    /// `"True"` requires a multicast capable device; empty or `"False"` accepts any.
    pub multicast_support: String,
    /// Address the device must carry; empty accepts any.
    pub ip_addressable: String,
    /// Requested interface or device; empty accepts any. Holds the granted
    /// device once allocated.
    pub interface: String,
}

impl NicAllocation {
    /// Requested throughput in bits per second.
    pub fn required_bps(&self) -> f64 {
        self.data_rate * f64::from(self.data_size) * 8.0
    }

    fn requires_multicast(&self) -> NicAllocationResult<bool> {
        match self.multicast_support.trim().to_ascii_lowercase().as_str() {
            "" | "false" => Ok(false),
            "true" => Ok(true),
            other => Err(NicAllocationError::Invalid {
                identifier: self.identifier.clone(),
                message: format!("multicast_support must be True or False, got '{}'", other),
            }),
        }
    }

    fn validate(&self) -> NicAllocationResult<()> {
        let invalid = |message: &str| NicAllocationError::Invalid {
            identifier: self.identifier.clone(),
            message: message.to_string(),
        };
        if self.identifier.trim().is_empty() {
            return Err(invalid("identifier must not be empty"));
        }
        if !self.data_rate.is_finite() || self.data_rate < 0.0 {
            return Err(invalid("data_rate must be a non-negative number"));
        }
        self.requires_multicast().map(|_| ())
    }
}

/// What one device offers to the allocator at the time of a request.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NicCapacity {
    pub device: String,
    pub speed_mbit_per_sec: u64,
    pub multicast: bool,
    /// Every address assigned to the device or its VLANs.
    pub addresses: Vec<String>,
    /// Measured throughput in bits per second.
    pub throughput_bps: f64,
}

/// Tracks granted reservations per device.
#[derive(Debug, Clone)]
pub struct NicAllocator {
    max_throughput_percent: f64,
    allocations: BTreeMap<String, NicAllocation>,
}

impl NicAllocator {
    pub fn new(max_throughput_percent: f64) -> Self {
        Self {
            max_throughput_percent,
            allocations: BTreeMap::new(),
        }
    }

    pub fn max_throughput_percent(&self) -> f64 {
        self.max_throughput_percent
    }

    /// Reserves capacity on the first device of `devices` that satisfies `alloc`.
    ///
    /// Returns `Ok(false)` when no device matches or none has room left.
    pub fn allocate_capacity(
        &mut self,
        alloc: &NicAllocation,
        devices: &[NicCapacity],
    ) -> NicAllocationResult<bool> {
        alloc.validate()?;
        if self.allocations.contains_key(&alloc.identifier) {
            return Err(NicAllocationError::Duplicate(alloc.identifier.clone()));
        }

        let requires_multicast = alloc.requires_multicast()?;
        let requested_device = split_interface(alloc.interface.trim()).0;
        let required = alloc.required_bps();

        for capacity in devices {
            if !requested_device.is_empty() && requested_device != capacity.device {
                continue;
            }
            if requires_multicast && !capacity.multicast {
                debug!("NIC allocation {}: {} lacks multicast", alloc.identifier, capacity.device);
                continue;
            }
            if !alloc.ip_addressable.is_empty()
                && !capacity.addresses.iter().any(|a| *a == alloc.ip_addressable)
            {
                continue;
            }

            let available = self.available_bps(capacity);
            if required > available {
                debug!(
                    "NIC allocation {}: {} has {:.0} bps left, {:.0} requested",
                    alloc.identifier, capacity.device, available, required
                );
                continue;
            }

            let mut granted = alloc.clone();
            granted.interface = capacity.device.clone();
            info!(
                "NIC allocation {} granted {:.0} bps on {}",
                granted.identifier, required, granted.interface
            );
            self.allocations.insert(granted.identifier.clone(), granted);
            return Ok(true);
        }

        Ok(false)
    }

    /// Releases the reservation held under `alloc.identifier`.
    pub fn deallocate_capacity(&mut self, alloc: &NicAllocation) -> NicAllocationResult<()> {
        match self.allocations.remove(&alloc.identifier) {
            Some(released) => {
                info!(
                    "NIC allocation {} released from {}",
                    released.identifier, released.interface
                );
                Ok(())
            }
            None => Err(NicAllocationError::Unknown(alloc.identifier.clone())),
        }
    }

    /// Capacity still free on `capacity.device`, in bits per second.
    pub fn available_bps(&self, capacity: &NicCapacity) -> f64 {
        let limit = capacity.speed_mbit_per_sec as f64 * BITS_PER_MBIT * self.max_throughput_percent
            / 100.0;
        let used = self
            .get_allocated_device_throughput(&capacity.device)
            .max(capacity.throughput_bps);
        (limit - used).max(0.0)
    }

    /// Reserved bits per second on `device`.
    pub fn get_allocated_device_throughput(&self, device: &str) -> f64 {
        self.allocations
            .values()
            .filter(|a| a.interface == device)
            .map(NicAllocation::required_bps)
            .sum()
    }

    /// Granted allocations ordered by identifier.
    pub fn get_allocations(&self) -> Vec<&NicAllocation> {
        self.allocations.values().collect()
    }
}
