// Response payloads (snake_case JSON, as the dashboard reads them)

mod gpu;
mod host;

pub use gpu::{
    GpuDevice, GpuResource, GpuUsage, GpuUtilization, NvlinkThroughput, PciStats,
};
pub use host::CpuResource;
