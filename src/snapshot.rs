// Read-and-aggregate: one stateless snapshot function per endpoint

use crate::models::*;
use crate::telemetry::{
    DeviceMemory, GpuCapabilities, GpuSource, HostSource, Result, optional,
};

/// Wall clock in epoch milliseconds; 0 if the clock is before 1970.
pub fn now_millis() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0)
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Arithmetic mean; 0 for no devices.
pub fn mean_utilization(values: &[u32]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().map(|&v| f64::from(v)).sum::<f64>() / values.len() as f64
}

/// used / total x 100, two decimals, kept within [0, 100]. 0 when total is 0.
pub fn memory_percent(used: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round2((used as f64 / total as f64 * 100.0).clamp(0.0, 100.0))
}

fn memory_all(gpu: &dyn GpuSource) -> Result<Vec<DeviceMemory>> {
    (0..gpu.device_count()).map(|i| gpu.memory(i)).collect()
}

pub fn gpu_utilization(gpu: &dyn GpuSource) -> Result<GpuUtilization> {
    let gpu_utilization = (0..gpu.device_count())
        .map(|i| gpu.utilization(i))
        .collect::<Result<Vec<_>>>()?;
    Ok(GpuUtilization { gpu_utilization })
}

pub fn gpu_usage(gpu: &dyn GpuSource) -> Result<GpuUsage> {
    let memory = memory_all(gpu)?;
    Ok(GpuUsage {
        memory_usage: memory.iter().map(|m| m.used).collect(),
        total_memory: memory.iter().map(|m| m.total).collect(),
    })
}

pub fn gpu_resource(gpu: &dyn GpuSource) -> Result<GpuResource> {
    let time = now_millis();

    // Totals first, then per-device used against that fixed sum.
    let memory = memory_all(gpu)?;
    let total_sum = memory
        .iter()
        .fold(0u64, |acc, m| acc.saturating_add(m.total));

    let mut used_sum: u64 = 0;
    let mut rx_total: u64 = 0;
    let mut tx_total: u64 = 0;
    let mut gpu_devices = Vec::with_capacity(memory.len());
    for (index, mem) in (0u32..).zip(&memory) {
        let utilization = gpu.utilization(index)?;
        let pcie = optional(gpu.pcie_throughput(index))?;
        let nvlink = optional(gpu.nvlink_throughput(index))?;

        used_sum = used_sum.saturating_add(mem.used);
        if let Some(t) = pcie {
            rx_total = rx_total.saturating_add(t.rx);
            tx_total = tx_total.saturating_add(t.tx);
        }
        gpu_devices.push(GpuDevice {
            utilization,
            memory: mem.used,
            memory_total: mem.total,
            pci_rx: pcie.map(|t| t.rx),
            pci_tx: pcie.map(|t| t.tx),
            nvlink_rx: nvlink.map(|t| t.rx),
            nvlink_tx: nvlink.map(|t| t.tx),
        });
    }

    let gpu_utilization_individual: Vec<u32> = gpu_devices.iter().map(|d| d.utilization).collect();
    Ok(GpuResource {
        time,
        gpu_utilization_total: mean_utilization(&gpu_utilization_individual),
        gpu_memory_total: memory_percent(used_sum, total_sum),
        rx_total,
        tx_total,
        gpu_memory_individual: gpu_devices.iter().map(|d| d.memory).collect(),
        gpu_utilization_individual,
        gpu_devices,
    })
}

pub fn pci_stats(gpu: &dyn GpuSource, caps: &GpuCapabilities) -> Result<PciStats> {
    let mut pci_tx = Vec::new();
    let mut pci_rx = Vec::new();
    for index in 0..gpu.device_count() {
        let t = optional(gpu.pcie_throughput(index))?;
        pci_tx.push(t.map(|t| t.tx));
        pci_rx.push(t.map(|t| t.rx));
    }
    Ok(PciStats {
        pci_tx,
        pci_rx,
        max_rxtx_tp: caps.max_pcie_throughput(),
    })
}

pub fn nvlink_throughput(gpu: &dyn GpuSource, caps: &GpuCapabilities) -> Result<NvlinkThroughput> {
    let mut nvlink_rx = Vec::new();
    let mut nvlink_tx = Vec::new();
    for index in 0..gpu.device_count() {
        let t = optional(gpu.nvlink_throughput(index))?;
        nvlink_rx.push(t.map(|t| t.rx));
        nvlink_tx.push(t.map(|t| t.tx));
    }
    Ok(NvlinkThroughput {
        nvlink_rx,
        nvlink_tx,
        max_rxtx_bw: caps.nvlink_max_bandwidth,
    })
}

pub fn cpu_resource(host: &dyn HostSource) -> Result<CpuResource> {
    let time = now_millis();
    let cpu_utilization = host.cpu_percent()?;
    let memory_usage = host.memory_used()?;
    let disk = host.disk_io()?;
    let net = host.network_io()?;
    Ok(CpuResource {
        time,
        cpu_utilization,
        memory_usage,
        disk_read: disk.read,
        disk_write: disk.write,
        network_read: net.read,
        network_write: net.write,
    })
}
