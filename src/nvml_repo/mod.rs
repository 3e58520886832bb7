// GPU counters via NVML

mod fields;

use nvml_wrapper::enum_wrappers::device::PcieUtilCounter;
use nvml_wrapper::error::NvmlError;
use nvml_wrapper::{Device, Nvml};
use nvml_wrapper_sys::bindings::NvmlLib;
use tracing::instrument;

use crate::telemetry::{
    DeviceMemory, GpuSource, PcieLink, Result, TelemetryError, Throughput, units,
};

/// NVML-backed [`GpuSource`]. When NVML cannot be initialised the repo reports
/// zero devices for the rest of the process.
pub struct NvmlRepo {
    nvml: Option<Nvml>,
    /// Second handle on the same library for calls the wrapper can't scope.
    raw: Option<NvmlLib>,
    device_count: u32,
}

#[cfg(target_os = "windows")]
const LIB_PATH: &str = "nvml.dll";

#[cfg(not(target_os = "windows"))]
const LIB_PATH: &str = "libnvidia-ml.so.1";

impl NvmlRepo {
    pub fn init() -> Self {
        let nvml = match Nvml::init() {
            Ok(n) => n,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    operation = "nvml_init",
                    "NVML unavailable, GPU endpoints disabled"
                );
                return Self::unavailable();
            }
        };
        let device_count = match nvml.device_count() {
            Ok(n) => n,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    operation = "device_count",
                    "NVML device count failed, GPU endpoints disabled"
                );
                0
            }
        };
        if let Ok(driver) = nvml.sys_driver_version() {
            tracing::info!(device_count, driver = %driver, "NVML initialised");
        }
        // SAFETY: same library NVML just loaded and initialised; only
        // nvmlDeviceGetFieldValues is called through it.
        let raw = match unsafe { NvmlLib::new(LIB_PATH) } {
            Ok(lib) => Some(lib),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    operation = "nvml_raw_load",
                    "NVLink throughput unavailable"
                );
                None
            }
        };
        Self {
            nvml: Some(nvml),
            raw,
            device_count,
        }
    }

    pub fn unavailable() -> Self {
        Self {
            nvml: None,
            raw: None,
            device_count: 0,
        }
    }

    fn device(&self, index: u32) -> Result<Device<'_>> {
        let nvml = self
            .nvml
            .as_ref()
            .ok_or_else(|| TelemetryError::Gpu("NVML not initialised".into()))?;
        nvml.device_by_index(index).map_err(map_err("device"))
    }
}

/// NotSupported and friends mean "this driver/board can't tell us"; everything
/// else is a read failure.
fn map_err(metric: &'static str) -> impl Fn(NvmlError) -> TelemetryError {
    move |e| match e {
        NvmlError::NotSupported
        | NvmlError::FunctionNotFound
        | NvmlError::FailedToLoadSymbol(_)
        | NvmlError::InvalidArg => TelemetryError::Unsupported(metric),
        other => TelemetryError::Gpu(format!("{}: {}", metric, other)),
    }
}

impl GpuSource for NvmlRepo {
    fn device_count(&self) -> u32 {
        self.device_count
    }

    #[instrument(skip(self), fields(repo = "nvml", operation = "utilization"))]
    fn utilization(&self, index: u32) -> Result<u32> {
        let device = self.device(index)?;
        let rates = device.utilization_rates().map_err(map_err("utilization"))?;
        Ok(rates.gpu)
    }

    #[instrument(skip(self), fields(repo = "nvml", operation = "memory"))]
    fn memory(&self, index: u32) -> Result<DeviceMemory> {
        let device = self.device(index)?;
        let info = device.memory_info().map_err(map_err("memory"))?;
        Ok(DeviceMemory {
            used: info.used,
            total: info.total,
        })
    }

    fn pcie_throughput(&self, index: u32) -> Result<Throughput> {
        let device = self.device(index)?;
        let rx = device
            .pcie_throughput(PcieUtilCounter::Receive)
            .map_err(map_err("pcie throughput"))?;
        let tx = device
            .pcie_throughput(PcieUtilCounter::Send)
            .map_err(map_err("pcie throughput"))?;
        Ok(Throughput {
            rx: units::kib_to_bytes(u64::from(rx)),
            tx: units::kib_to_bytes(u64::from(tx)),
        })
    }

    fn pcie_link(&self, index: u32) -> Result<PcieLink> {
        let device = self.device(index)?;
        let generation = device
            .max_pcie_link_gen()
            .map_err(map_err("pcie generation"))?;
        let width = device
            .max_pcie_link_width()
            .map_err(map_err("pcie width"))?;
        Ok(PcieLink { generation, width })
    }

    #[instrument(skip(self), fields(repo = "nvml", operation = "nvlink_throughput"))]
    fn nvlink_throughput(&self, index: u32) -> Result<Throughput> {
        let lib = self
            .raw
            .as_ref()
            .ok_or(TelemetryError::Unsupported("nvlink throughput"))?;
        let device = self.device(index)?;
        let mut request = fields::nvlink_throughput_request();
        let samples = fields::query_scoped(lib, &device, &mut request)
            .map_err(map_err("nvlink throughput"))?;
        let mut values = samples.into_iter().map(|s| {
            s.map(fields::sample_to_u64)
                .map_err(map_err("nvlink throughput"))
        });
        let rx = values
            .next()
            .ok_or(TelemetryError::Unsupported("nvlink throughput"))??;
        let tx = values
            .next()
            .ok_or(TelemetryError::Unsupported("nvlink throughput"))??;
        Ok(Throughput {
            rx: units::kib_to_bytes(rx),
            tx: units::kib_to_bytes(tx),
        })
    }

    #[instrument(skip(self), fields(repo = "nvml", operation = "nvlink_link_speeds"))]
    fn nvlink_link_speeds(&self, index: u32) -> Result<Vec<u64>> {
        let device = self.device(index)?;
        let samples = device
            .field_values_for(&fields::NVLINK_LINK_SPEEDS)
            .map_err(map_err("nvlink speed"))?;
        // Each link field is checked on its own; absent links are skipped.
        Ok(samples
            .into_iter()
            .filter_map(|s| s.ok().and_then(|sample| sample.value.ok()))
            .map(fields::sample_to_u64)
            .filter(|&mib| mib > 0)
            .map(units::mib_to_bytes)
            .collect())
    }
}
