// Telemetry provider seam: GPU and host counter sources, capabilities detected at startup

pub mod units;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The metric is not available on this hardware/driver. Callers null the field.
    #[error("{0} not supported")]
    Unsupported(&'static str),
    #[error("gpu read failed: {0}")]
    Gpu(String),
    #[error("host read failed: {0}")]
    Host(String),
}

pub type Result<T> = std::result::Result<T, TelemetryError>;

/// Turns `Unsupported` into `Ok(None)`; any other error is a real read failure.
pub fn optional<T>(r: Result<T>) -> Result<Option<T>> {
    match r {
        Ok(v) => Ok(Some(v)),
        Err(TelemetryError::Unsupported(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceMemory {
    pub used: u64,
    pub total: u64,
}

/// Bytes/sec in each direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Throughput {
    pub rx: u64,
    pub tx: u64,
}

/// Maximum PCIe link generation and lane count of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcieLink {
    pub generation: u32,
    pub width: u32,
}

/// Cumulative byte counters since boot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IoCounters {
    pub read: u64,
    pub write: u64,
}

/// Per-device GPU counters. Indexes run `0..device_count()`.
///
/// Implementations are blocking; callers on the async runtime go through
/// `spawn_blocking`.
pub trait GpuSource: Send + Sync {
    /// Fixed at construction for the process lifetime.
    fn device_count(&self) -> u32;
    /// Percent of the last sample window the device was busy (0-100).
    fn utilization(&self, index: u32) -> Result<u32>;
    fn memory(&self, index: u32) -> Result<DeviceMemory>;
    fn pcie_throughput(&self, index: u32) -> Result<Throughput>;
    fn pcie_link(&self, index: u32) -> Result<PcieLink>;
    fn nvlink_throughput(&self, index: u32) -> Result<Throughput>;
    /// Speeds (bytes/sec) of the links the driver reports; may be empty.
    fn nvlink_link_speeds(&self, index: u32) -> Result<Vec<u64>>;
}

/// Host (CPU, RAM, disk, network) counters.
pub trait HostSource: Send + Sync {
    /// Global CPU usage since the previous call, 0-100.
    fn cpu_percent(&self) -> Result<f64>;
    fn memory_used(&self) -> Result<u64>;
    fn disk_io(&self) -> Result<IoCounters>;
    fn network_io(&self) -> Result<IoCounters>;
}

/// What the GPU provider could tell us at startup. Immutable afterwards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GpuCapabilities {
    pub device_count: u32,
    /// Device 0's max link; `None` when the driver cannot report it.
    pub pcie: Option<PcieLink>,
    /// Sum of device 0's reported NVLink link speeds, bytes/sec.
    pub nvlink_max_bandwidth: Option<u64>,
}

impl GpuCapabilities {
    /// Run once at startup. Failures degrade to "unavailable" rather than aborting.
    pub fn detect(gpu: &dyn GpuSource) -> Self {
        let device_count = gpu.device_count();
        if device_count == 0 {
            return Self::default();
        }

        let pcie = match gpu.pcie_link(0) {
            Ok(link) => Some(link),
            Err(e) => {
                tracing::info!(error = %e, operation = "detect_pcie", "PCIe link info unavailable");
                None
            }
        };

        let nvlink_max_bandwidth = match gpu.nvlink_link_speeds(0) {
            Ok(speeds) if !speeds.is_empty() => {
                Some(speeds.iter().fold(0u64, |acc, &s| acc.saturating_add(s)))
            }
            Ok(_) => None,
            Err(e) => {
                tracing::info!(error = %e, operation = "detect_nvlink", "NVLink info unavailable");
                None
            }
        };

        Self {
            device_count,
            pcie,
            nvlink_max_bandwidth,
        }
    }

    pub fn has_devices(&self) -> bool {
        self.device_count > 0
    }

    /// Theoretical max per-direction PCIe throughput, bytes/sec.
    pub fn max_pcie_throughput(&self) -> Option<u64> {
        let link = self.pcie?;
        units::pcie_max_throughput(link.generation, link.width)
    }
}
