// Copyright 2025-Present vnet-telemetry contributors
// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

use tempfile::tempdir;
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;

use vnet_telemetry::{
    buffer_service::{BufferHandle, BufferService},
    client::TelemetryClient,
    config::TelemetryConfig,
    errors::StartError,
    payload::Payload,
    report::HostMetadata,
    server::{ServerState, TelemetryServer},
};

fn test_config(dir: &tempfile::TempDir) -> TelemetryConfig {
    let metadata_cache_path = dir.path().join("metadata.json");
    let metadata = HostMetadata {
        location: "westus2".to_string(),
        vm_name: "vm-0".to_string(),
        ..Default::default()
    };
    std::fs::write(
        &metadata_cache_path,
        serde_json::to_vec(&metadata).expect("failed to serialize metadata"),
    )
    .expect("failed to seed metadata cache");

    TelemetryConfig {
        socket_path: dir.path().join("azure-vnet-telemetry.sock"),
        // Unreachable on purpose: the flush timer never fires within these
        // tests, and metadata comes from the seeded cache file.
        host_report_url: "http://127.0.0.1:1/unused".to_string(),
        metadata_url: "http://127.0.0.1:1/unused".to_string(),
        metadata_cache_path,
        ..Default::default()
    }
}

async fn snapshot_with_len(handle: &BufferHandle, expected: usize) -> Payload {
    let poll = async {
        loop {
            let payload = handle.snapshot().await.expect("snapshot failed");
            if payload.len() == expected {
                break payload;
            }
            sleep(Duration::from_millis(20)).await;
        }
    };

    timeout(Duration::from_secs(5), poll)
        .await
        .expect("timed out waiting for reports to be buffered")
}

#[tokio::test]
async fn server_buffers_classified_reports_with_metadata() {
    let dir = tempdir().expect("failed to create tempdir");
    let config = test_config(&dir);

    let cancel_token = CancellationToken::new();
    let (service, handle) = BufferService::new(&config, cancel_token.clone())
        .expect("failed to create buffer service");
    tokio::spawn(service.run());

    let server = TelemetryServer::bind(&config.socket_path, handle.clone(), cancel_token.clone())
        .expect("failed to bind telemetry endpoint");
    tokio::spawn(server.spin());

    let mut client = TelemetryClient::connect(&config.socket_path)
        .await
        .expect("failed to connect");
    assert!(client.is_connected());

    client
        .write(br#"{"CniSucceeded": true, "Name": "azure-vnet"}"#)
        .await
        .expect("write failed");
    client
        .write(br#"{"NpmVersion": "1.4.1", "NodeName": "node-0"}"#)
        .await
        .expect("write failed");
    // No known marker: silently discarded by the classifier.
    client
        .write(br#"{"Unrelated": 1}"#)
        .await
        .expect("write failed");

    let payload = snapshot_with_len(&handle, 2).await;
    assert_eq!(payload.cni_reports.len(), 1);
    assert_eq!(payload.npm_reports.len(), 1);
    assert_eq!(payload.cni_reports[0].name, "azure-vnet");
    assert_eq!(payload.cni_reports[0].metadata.location, "westus2");
    assert_eq!(payload.npm_reports[0].metadata.vm_name, "vm-0");

    client.close().await.expect("close failed");
    cancel_token.cancel();
}

#[tokio::test]
async fn reports_from_multiple_connections_share_one_buffer() {
    let dir = tempdir().expect("failed to create tempdir");
    let config = test_config(&dir);

    let cancel_token = CancellationToken::new();
    let (service, handle) = BufferService::new(&config, cancel_token.clone())
        .expect("failed to create buffer service");
    tokio::spawn(service.run());

    let server = TelemetryServer::bind(&config.socket_path, handle.clone(), cancel_token.clone())
        .expect("failed to bind telemetry endpoint");
    tokio::spawn(server.spin());

    for i in 0..3 {
        let mut client = TelemetryClient::connect(&config.socket_path)
            .await
            .expect("failed to connect");
        client
            .write(format!(r#"{{"DncPartitionKey": "partition-{i}"}}"#).as_bytes())
            .await
            .expect("write failed");
        client.close().await.expect("close failed");
    }

    let payload = snapshot_with_len(&handle, 3).await;
    assert_eq!(payload.cns_reports.len(), 3);

    cancel_token.cancel();
}

#[tokio::test]
async fn second_instance_sees_already_running() {
    let dir = tempdir().expect("failed to create tempdir");
    let config = test_config(&dir);

    let cancel_token = CancellationToken::new();
    let (_service, handle) = BufferService::new(&config, cancel_token.clone())
        .expect("failed to create buffer service");

    let _server = TelemetryServer::bind(&config.socket_path, handle.clone(), cancel_token.clone())
        .expect("failed to bind telemetry endpoint");

    let mut state = ServerState::default();
    match TelemetryServer::bind(&config.socket_path, handle, cancel_token) {
        Err(StartError::AlreadyRunning) => state.endpoint_already_bound = true,
        Ok(_) => panic!("second bind unexpectedly succeeded"),
        Err(other) => panic!("expected AlreadyRunning, got {other}"),
    }
    // The second instance skips buffering and would idle on cancellation.
    assert!(state.endpoint_already_bound);
}
