// Host stats via sysinfo

mod linux;

use std::sync::Mutex;
use std::time::Instant;
use sysinfo::{Disks, Networks, System};
use tracing::instrument;

use crate::telemetry::{HostSource, IoCounters, Result, TelemetryError};

pub struct SysinfoRepo {
    sys: Mutex<System>,
    disks: Mutex<Disks>,
    networks: Mutex<Networks>,
    last_cpu_refresh: Mutex<(Instant, f64)>,
}

impl Default for SysinfoRepo {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<T>(what: &'static str) -> impl Fn(std::sync::PoisonError<T>) -> TelemetryError {
    move |e| TelemetryError::Host(format!("sysinfo {} lock poisoned: {}", what, e))
}

impl SysinfoRepo {
    pub fn new() -> Self {
        let mut sys = System::new();
        // Baseline for the first usage delta.
        sys.refresh_cpu_all();
        sys.refresh_memory();
        Self {
            sys: Mutex::new(sys),
            disks: Mutex::new(Disks::new_with_refreshed_list()),
            networks: Mutex::new(Networks::new_with_refreshed_list()),
            last_cpu_refresh: Mutex::new((Instant::now(), 0.0)),
        }
    }
}

impl HostSource for SysinfoRepo {
    #[instrument(skip(self), fields(repo = "sysinfo", operation = "cpu_percent"))]
    fn cpu_percent(&self) -> Result<f64> {
        let mut sys = self.sys.lock().map_err(poisoned("system"))?;
        let mut last = self.last_cpu_refresh.lock().map_err(poisoned("cpu"))?;

        let now = Instant::now();
        let (prev_ts, prev_usage) = *last;
        if now.duration_since(prev_ts) < sysinfo::MINIMUM_CPU_UPDATE_INTERVAL {
            // Too soon for a meaningful delta; repeat the previous reading.
            return Ok(prev_usage);
        }
        sys.refresh_cpu_all();
        let usage = (sys.global_cpu_usage() as f64).clamp(0.0, 100.0);
        *last = (now, usage);
        Ok(usage)
    }

    #[instrument(skip(self), fields(repo = "sysinfo", operation = "memory_used"))]
    fn memory_used(&self) -> Result<u64> {
        let mut sys = self.sys.lock().map_err(poisoned("system"))?;
        sys.refresh_memory();
        Ok(sys.used_memory())
    }

    #[instrument(skip(self), fields(repo = "sysinfo", operation = "disk_io"))]
    fn disk_io(&self) -> Result<IoCounters> {
        if let Some(counters) = linux::read_disk_io_linux() {
            return Ok(counters);
        }
        let mut disks = self.disks.lock().map_err(poisoned("disks"))?;
        disks.refresh(false);
        let mut seen: Vec<&std::ffi::OsStr> = Vec::new();
        let mut counters = IoCounters::default();
        // Several mounts can sit on one device; count each device once.
        for disk in disks.list() {
            if seen.contains(&disk.name()) {
                continue;
            }
            seen.push(disk.name());
            let usage = disk.usage();
            counters.read = counters.read.saturating_add(usage.total_read_bytes);
            counters.write = counters.write.saturating_add(usage.total_written_bytes);
        }
        Ok(counters)
    }

    #[instrument(skip(self), fields(repo = "sysinfo", operation = "network_io"))]
    fn network_io(&self) -> Result<IoCounters> {
        let mut networks = self.networks.lock().map_err(poisoned("networks"))?;
        networks.refresh(true);
        Ok(networks
            .list()
            .values()
            .fold(IoCounters::default(), |acc, data| IoCounters {
                read: acc.read.saturating_add(data.total_received()),
                write: acc.write.saturating_add(data.total_transmitted()),
            }))
    }
}
