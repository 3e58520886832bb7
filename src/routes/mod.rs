// HTTP routes

mod error;
mod http;

pub use error::ApiError;

use axum::{Router, routing::get};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::DashboardConfig;
use crate::telemetry::{GpuCapabilities, GpuSource, HostSource};

/// Process-wide read-only context handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub(crate) gpu: Arc<dyn GpuSource>,
    pub(crate) host: Arc<dyn HostSource>,
    pub(crate) caps: GpuCapabilities,
}

impl AppState {
    /// Detects GPU capabilities once; the result is fixed for the process lifetime.
    pub fn new(gpu: Arc<dyn GpuSource>, host: Arc<dyn HostSource>) -> Self {
        let caps = GpuCapabilities::detect(gpu.as_ref());
        Self { gpu, host, caps }
    }

    pub fn capabilities(&self) -> &GpuCapabilities {
        &self.caps
    }
}

/// GPU routes exist only when a device was found at startup; cpu_resource always does.
pub fn app(state: AppState, dashboard: &DashboardConfig) -> Router {
    let mut api: Router<AppState> =
        Router::new().route("/cpu_resource", get(http::cpu_resource)); // GET cpu_resource

    if state.caps.has_devices() {
        api = api
            .route("/gpu_utilization", get(http::gpu_utilization)) // GET gpu_utilization
            .route("/gpu_usage", get(http::gpu_usage)) // GET gpu_usage
            .route("/gpu_resource", get(http::gpu_resource)) // GET gpu_resource
            .route("/pci_stats", get(http::pci_stats)) // GET pci_stats
            .route("/nvlink_throughput", get(http::nvlink_throughput)); // GET nvlink_throughput
    } else {
        tracing::info!("No GPU devices detected, serving cpu_resource only");
    }

    let mount = dashboard.mount_path();
    tracing::debug!(mount = %mount, devices = state.caps.device_count, "routes registered");

    Router::new()
        .nest(&mount, api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}
