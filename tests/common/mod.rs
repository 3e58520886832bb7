// Shared test helpers: in-memory telemetry providers

#![allow(dead_code)]

use gpudash::telemetry::{
    DeviceMemory, GpuSource, HostSource, IoCounters, PcieLink, Result, TelemetryError, Throughput,
};

#[derive(Debug, Clone, Default)]
pub struct FakeDevice {
    pub utilization: u32,
    pub used: u64,
    pub total: u64,
    pub pcie: Option<Throughput>,
    pub nvlink: Option<Throughput>,
    /// Utilization reads fail as if the device dropped off the bus.
    pub lost: bool,
}

impl FakeDevice {
    pub fn new(utilization: u32, used: u64, total: u64) -> Self {
        Self {
            utilization,
            used,
            total,
            ..Default::default()
        }
    }

    pub fn with_pcie(mut self, rx: u64, tx: u64) -> Self {
        self.pcie = Some(Throughput { rx, tx });
        self
    }

    pub fn with_nvlink(mut self, rx: u64, tx: u64) -> Self {
        self.nvlink = Some(Throughput { rx, tx });
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakeGpu {
    pub devices: Vec<FakeDevice>,
    pub link: Option<PcieLink>,
    pub link_speeds: Vec<u64>,
}

impl FakeGpu {
    pub fn new(devices: Vec<FakeDevice>) -> Self {
        Self {
            devices,
            ..Default::default()
        }
    }

    fn dev(&self, index: u32) -> Result<&FakeDevice> {
        self.devices
            .get(index as usize)
            .ok_or_else(|| TelemetryError::Gpu(format!("no device {}", index)))
    }
}

impl GpuSource for FakeGpu {
    fn device_count(&self) -> u32 {
        self.devices.len() as u32
    }

    fn utilization(&self, index: u32) -> Result<u32> {
        let d = self.dev(index)?;
        if d.lost {
            return Err(TelemetryError::Gpu("GPU is lost".into()));
        }
        Ok(d.utilization)
    }

    fn memory(&self, index: u32) -> Result<DeviceMemory> {
        let d = self.dev(index)?;
        Ok(DeviceMemory {
            used: d.used,
            total: d.total,
        })
    }

    fn pcie_throughput(&self, index: u32) -> Result<Throughput> {
        self.dev(index)?
            .pcie
            .ok_or(TelemetryError::Unsupported("pcie throughput"))
    }

    fn pcie_link(&self, _index: u32) -> Result<PcieLink> {
        self.link.ok_or(TelemetryError::Unsupported("pcie generation"))
    }

    fn nvlink_throughput(&self, index: u32) -> Result<Throughput> {
        self.dev(index)?
            .nvlink
            .ok_or(TelemetryError::Unsupported("nvlink throughput"))
    }

    fn nvlink_link_speeds(&self, _index: u32) -> Result<Vec<u64>> {
        Ok(self.link_speeds.clone())
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakeHost {
    pub cpu: f64,
    pub memory_used: u64,
    pub disk: IoCounters,
    pub net: IoCounters,
    pub fail: bool,
}

impl HostSource for FakeHost {
    fn cpu_percent(&self) -> Result<f64> {
        if self.fail {
            return Err(TelemetryError::Host("cpu counters unreadable".into()));
        }
        Ok(self.cpu)
    }

    fn memory_used(&self) -> Result<u64> {
        Ok(self.memory_used)
    }

    fn disk_io(&self) -> Result<IoCounters> {
        Ok(self.disk)
    }

    fn network_io(&self) -> Result<IoCounters> {
        Ok(self.net)
    }
}

/// The two-device fixture: utilization [20, 60], memory [(100,200),(300,400)].
pub fn two_devices() -> FakeGpu {
    FakeGpu::new(vec![
        FakeDevice::new(20, 100, 200),
        FakeDevice::new(60, 300, 400),
    ])
}

pub fn sample_host() -> FakeHost {
    FakeHost {
        cpu: 12.5,
        memory_used: 8 * 1024 * 1024 * 1024,
        disk: IoCounters {
            read: 1_000,
            write: 2_000,
        },
        net: IoCounters {
            read: 3_000,
            write: 4_000,
        },
        fail: false,
    }
}
