use anyhow::Result;
use gpudash::*;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let app_config = config::AppConfig::load()?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&app_config.logging.level));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    // NVML init and the capability check are one-shot; the route table is fixed after this.
    let (gpu, host) = tokio::task::spawn_blocking(|| {
        let gpu: Arc<dyn telemetry::GpuSource> = Arc::new(nvml_repo::NvmlRepo::init());
        let host: Arc<dyn telemetry::HostSource> = Arc::new(sysinfo_repo::SysinfoRepo::new());
        (gpu, host)
    })
    .await?;
    let state = routes::AppState::new(gpu, host);
    let caps = *state.capabilities();
    tracing::info!(
        devices = caps.device_count,
        pcie = ?caps.pcie,
        nvlink_max_bandwidth = ?caps.nvlink_max_bandwidth,
        "GPU capabilities"
    );

    let app = routes::app(state, &app_config.dashboard);
    let addr = format!("{}:{}", app_config.server.host, app_config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(
        "Listening on http://{}{}/",
        addr,
        app_config.dashboard.mount_path()
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(s) => s,
                Err(_) => {
                    let _ = tokio::signal::ctrl_c().await;
                    return;
                }
            };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
    tracing::info!("Received shutdown signal");
}
