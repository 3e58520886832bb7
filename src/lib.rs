// Library for tests to access modules

pub mod config;
pub mod models;
pub mod nvml_repo;
pub mod routes;
pub mod snapshot;
pub mod sysinfo_repo;
pub mod telemetry;
