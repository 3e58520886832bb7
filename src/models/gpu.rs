// GPU endpoint payloads

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GpuUtilization {
    /// Percent per device, device order.
    pub gpu_utilization: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GpuUsage {
    /// Used bytes per device.
    pub memory_usage: Vec<u64>,
    pub total_memory: Vec<u64>,
}

/// One device's share of a [`GpuResource`]. The dashboard reads the first two
/// keys positionally (utilization, then used memory); keep them first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GpuDevice {
    pub utilization: u32,
    pub memory: u64,
    pub memory_total: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pci_rx: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pci_tx: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nvlink_rx: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nvlink_tx: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GpuResource {
    /// Epoch milliseconds.
    pub time: u64,
    /// Mean utilization across devices.
    pub gpu_utilization_total: f64,
    /// Sum used / sum total x 100, two decimals.
    pub gpu_memory_total: f64,
    /// Summed PCIe RX, bytes/sec.
    pub rx_total: u64,
    pub tx_total: u64,
    pub gpu_utilization_individual: Vec<u32>,
    pub gpu_memory_individual: Vec<u64>,
    pub gpu_devices: Vec<GpuDevice>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PciStats {
    pub pci_tx: Vec<Option<u64>>,
    pub pci_rx: Vec<Option<u64>>,
    /// `null` when the link generation is unknown.
    pub max_rxtx_tp: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NvlinkThroughput {
    pub nvlink_rx: Vec<Option<u64>>,
    pub nvlink_tx: Vec<Option<u64>>,
    /// `null` when no link speed is reported.
    pub max_rxtx_bw: Option<u64>,
}
