// Host endpoint payload

use serde::{Deserialize, Serialize};

/// Disk and network figures are cumulative; the dashboard diffs successive reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CpuResource {
    pub time: u64,
    pub cpu_utilization: f64,
    pub memory_usage: u64,
    pub disk_read: u64,
    pub disk_write: u64,
    pub network_read: u64,
    pub network_write: u64,
}
