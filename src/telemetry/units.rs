// Unit normalization for raw driver counters

const KIB: u64 = 1024;
const MIB: u64 = 1024 * 1024;

/// NVML reports PCIe and NVLink throughput in KiB(/s).
pub fn kib_to_bytes(kib: u64) -> u64 {
    kib.saturating_mul(KIB)
}

/// NVLink link speed fields are MiB/s.
pub fn mib_to_bytes(mib: u64) -> u64 {
    mib.saturating_mul(MIB)
}

/// Max per-lane, per-direction bandwidth of a PCIe generation, MiB/s.
fn pcie_lane_bandwidth_mib(generation: u32) -> Option<u64> {
    match generation {
        1 => Some(250),
        2 => Some(500),
        3 => Some(985),
        4 => Some(1969),
        5 => Some(3938),
        6 => Some(7877),
        _ => None,
    }
}

/// Lane bandwidth x width, bytes/sec. `None` for generations we have no figure for.
pub fn pcie_max_throughput(generation: u32, width: u32) -> Option<u64> {
    pcie_lane_bandwidth_mib(generation)
        .map(|lane| mib_to_bytes(lane).saturating_mul(u64::from(width)))
}
