// GET handlers: one snapshot per request

use axum::{Json, extract::State};

use super::{ApiError, AppState};
use crate::models::*;
use crate::snapshot;
use crate::telemetry;

/// Runs a blocking provider read off the async workers.
async fn read<T, F>(state: AppState, f: F) -> Result<Json<T>, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&AppState) -> telemetry::Result<T> + Send + 'static,
{
    let value = tokio::task::spawn_blocking(move || f(&state)).await??;
    Ok(Json(value))
}

pub(super) async fn gpu_utilization(
    State(state): State<AppState>,
) -> Result<Json<GpuUtilization>, ApiError> {
    read(state, |s| snapshot::gpu_utilization(s.gpu.as_ref())).await
}

pub(super) async fn gpu_usage(State(state): State<AppState>) -> Result<Json<GpuUsage>, ApiError> {
    read(state, |s| snapshot::gpu_usage(s.gpu.as_ref())).await
}

pub(super) async fn gpu_resource(
    State(state): State<AppState>,
) -> Result<Json<GpuResource>, ApiError> {
    read(state, |s| snapshot::gpu_resource(s.gpu.as_ref())).await
}

pub(super) async fn pci_stats(State(state): State<AppState>) -> Result<Json<PciStats>, ApiError> {
    read(state, |s| snapshot::pci_stats(s.gpu.as_ref(), &s.caps)).await
}

pub(super) async fn nvlink_throughput(
    State(state): State<AppState>,
) -> Result<Json<NvlinkThroughput>, ApiError> {
    read(state, |s| snapshot::nvlink_throughput(s.gpu.as_ref(), &s.caps)).await
}

/// Host snapshot; registered with or without GPUs.
pub(super) async fn cpu_resource(
    State(state): State<AppState>,
) -> Result<Json<CpuResource>, ApiError> {
    read(state, |s| snapshot::cpu_resource(s.host.as_ref())).await
}
