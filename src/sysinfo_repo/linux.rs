// Linux-specific helpers: /proc/diskstats.

use crate::telemetry::IoCounters;

/// /proc/diskstats counts in 512-byte sectors regardless of the device's block size.
const SECTOR_SIZE: u64 = 512;

/// Cumulative read/write bytes over whole disks (partitions skipped so nothing
/// is counted twice). `None` off Linux or when /proc is unreadable.
pub(super) fn read_disk_io_linux() -> Option<IoCounters> {
    #[cfg(target_os = "linux")]
    {
        let content = std::fs::read_to_string("/proc/diskstats").ok()?;
        Some(parse_diskstats(&content, is_whole_disk))
    }
    #[cfg(not(target_os = "linux"))]
    None
}

/// Whole disks appear under /sys/block; partitions don't. `/` in a kernel
/// name becomes `!` in sysfs.
#[cfg(target_os = "linux")]
fn is_whole_disk(name: &str) -> bool {
    let path = format!("/sys/block/{}", name.replace('/', "!"));
    std::path::Path::new(&path).exists()
}

#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn parse_diskstats(content: &str, is_disk: impl Fn(&str) -> bool) -> IoCounters {
    let mut counters = IoCounters::default();
    for line in content.lines() {
        let cols: Vec<&str> = line.split_whitespace().collect();
        // major minor name reads merged sectors_read ms writes merged sectors_written ...
        if cols.len() < 10 || !is_disk(cols[2]) {
            continue;
        }
        if let (Ok(read), Ok(written)) = (cols[5].parse::<u64>(), cols[9].parse::<u64>()) {
            counters.read = counters.read.saturating_add(read.saturating_mul(SECTOR_SIZE));
            counters.write = counters
                .write
                .saturating_add(written.saturating_mul(SECTOR_SIZE));
        }
    }
    counters
}
