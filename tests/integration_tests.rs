// Integration tests: HTTP endpoints over fake providers

mod common;

use axum_test::TestServer;
use common::{FakeDevice, FakeGpu, FakeHost, sample_host, two_devices};
use gpudash::config::AppConfig;
use gpudash::models::{CpuResource, GpuResource, GpuUsage, NvlinkThroughput, PciStats};
use gpudash::routes::{self, AppState};
use gpudash::telemetry::PcieLink;
use std::sync::Arc;

const TEST_CONFIG: &str = r#"
[server]
port = 8765
host = "127.0.0.1"
"#;

fn test_server(gpu: FakeGpu, host: FakeHost) -> TestServer {
    let config = AppConfig::load_from_str(TEST_CONFIG).unwrap();
    let state = AppState::new(Arc::new(gpu), Arc::new(host));
    TestServer::new(routes::app(state, &config.dashboard))
}

#[tokio::test]
async fn test_zero_devices_registers_cpu_only() {
    let server = test_server(FakeGpu::default(), sample_host());

    server.get("/GPUDashboard/cpu_resource").await.assert_status_ok();
    for endpoint in [
        "gpu_utilization",
        "gpu_usage",
        "gpu_resource",
        "pci_stats",
        "nvlink_throughput",
    ] {
        server
            .get(&format!("/GPUDashboard/{}", endpoint))
            .await
            .assert_status_not_found();
    }
}

#[tokio::test]
async fn test_gpu_utilization_endpoint() {
    let server = test_server(two_devices(), sample_host());
    let response = server.get("/GPUDashboard/gpu_utilization").await;
    response.assert_status_ok();
    response.assert_json(&serde_json::json!({ "gpu_utilization": [20, 60] }));
}

#[tokio::test]
async fn test_gpu_usage_endpoint() {
    let server = test_server(two_devices(), sample_host());
    let usage: GpuUsage = server.get("/GPUDashboard/gpu_usage").await.json();
    assert_eq!(usage.memory_usage, vec![100, 300]);
    assert_eq!(usage.total_memory, vec![200, 400]);
}

#[tokio::test]
async fn test_gpu_resource_endpoint() {
    let server = test_server(two_devices(), sample_host());
    let response = server.get("/GPUDashboard/gpu_resource").await;
    response.assert_status_ok();

    let json: serde_json::Value = response.json();
    assert_eq!(json["gpu_utilization_total"], 40.0);
    assert_eq!(json["gpu_memory_total"], 66.67);
    assert_eq!(json["rx_total"], 0);
    // No PCIe/NVLink counters on the fixture: keys are omitted, not null.
    let device = json["gpu_devices"][0].as_object().unwrap();
    assert!(!device.contains_key("pci_rx"));
    assert!(!device.contains_key("nvlink_tx"));

    // The dashboard reads utilization then used memory by key position.
    let text = response.text();
    let util = text.find("\"utilization\"").unwrap();
    let mem = text.find("\"memory\"").unwrap();
    assert!(util < mem);

    let typed: GpuResource = response.json();
    assert_eq!(typed.gpu_devices[1].memory, 300);
}

#[tokio::test]
async fn test_pci_stats_endpoint() {
    let mut gpu = FakeGpu::new(vec![FakeDevice::new(0, 0, 1).with_pcie(2048, 1024)]);
    gpu.link = Some(PcieLink {
        generation: 3,
        width: 16,
    });
    let server = test_server(gpu, sample_host());
    let stats: PciStats = server.get("/GPUDashboard/pci_stats").await.json();
    assert_eq!(stats.pci_rx, vec![Some(2048)]);
    assert_eq!(stats.pci_tx, vec![Some(1024)]);
    assert_eq!(stats.max_rxtx_tp, Some(985 * 1024 * 1024 * 16));
}

#[tokio::test]
async fn test_nvlink_unsupported_is_null_not_error() {
    let server = test_server(two_devices(), sample_host());
    let response = server.get("/GPUDashboard/nvlink_throughput").await;
    response.assert_status_ok();
    response.assert_json(&serde_json::json!({
        "nvlink_rx": [null, null],
        "nvlink_tx": [null, null],
        "max_rxtx_bw": null,
    }));
    let typed: NvlinkThroughput = response.json();
    assert_eq!(typed.max_rxtx_bw, None);
}

#[tokio::test]
async fn test_cpu_resource_endpoint() {
    let server = test_server(FakeGpu::default(), sample_host());
    let cpu: CpuResource = server.get("/GPUDashboard/cpu_resource").await.json();
    assert_eq!(cpu.cpu_utilization, 12.5);
    assert_eq!(cpu.disk_write, 2_000);
    assert_eq!(cpu.network_read, 3_000);
    assert!(cpu.time > 0);
}

#[tokio::test]
async fn test_read_failure_is_server_error() {
    let mut gpu = two_devices();
    gpu.devices[0].lost = true;
    let host = FakeHost {
        fail: true,
        ..sample_host()
    };
    let server = test_server(gpu, host);

    let response = server.get("/GPUDashboard/gpu_utilization").await;
    response.assert_status_internal_server_error();
    let json: serde_json::Value = response.json();
    assert!(json["error"].as_str().unwrap().contains("lost"));

    server
        .get("/GPUDashboard/cpu_resource")
        .await
        .assert_status_internal_server_error();
    // Unaffected endpoints keep working.
    server.get("/GPUDashboard/gpu_usage").await.assert_status_ok();
}

#[tokio::test]
async fn test_base_url_prefix() {
    let config = AppConfig::load_from_str(&format!(
        "{}\n[dashboard]\nbase_url = \"/user/alice/\"\n",
        TEST_CONFIG
    ))
    .unwrap();
    let state = AppState::new(Arc::new(two_devices()), Arc::new(sample_host()));
    let server = TestServer::new(routes::app(state, &config.dashboard));

    server
        .get("/user/alice/GPUDashboard/gpu_utilization")
        .await
        .assert_status_ok();
    server
        .get("/GPUDashboard/gpu_utilization")
        .await
        .assert_status_not_found();
}
