// Copyright 2025-Present vnet-telemetry contributors
// SPDX-License-Identifier: Apache-2.0

//! Delivery of the serialized payload to the host net agent.

use tracing::debug;

use crate::errors::PublishError;
use crate::payload::Payload;

/// POSTs the payload wire form to the configured host report URL.
///
/// The clear-on-success / retain-on-failure contract lives with the buffer
/// service; this type never mutates the payload.
#[derive(Clone)]
pub struct HostPublisher {
    client: reqwest::Client,
    host_report_url: String,
}

impl HostPublisher {
    /// `client` carries the request timeout so a hanging host endpoint cannot
    /// stall the buffer service indefinitely.
    pub fn new(client: reqwest::Client, host_report_url: String) -> Self {
        HostPublisher {
            client,
            host_report_url,
        }
    }

    /// Serialize and POST one payload. Any non-2xx status or transport
    /// failure is an error.
    pub async fn send(&self, payload: &Payload) -> Result<(), PublishError> {
        debug!(reports = payload.len(), "sending payload to host");

        let resp = self
            .client
            .post(&self.host_report_url)
            .json(payload)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(PublishError::Status(status.as_u16()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::OverflowPolicy;
    use crate::report::{CNIReport, Report};
    use mockito::Server;

    const REPORT_PATH: &str = "/machine/plugins?comp=netagent&type=payload";

    fn sample_payload() -> Payload {
        let mut payload = Payload::default();
        payload.push(
            Report::Cni(CNIReport {
                cni_succeeded: true,
                ..Default::default()
            }),
            None,
            OverflowPolicy::Drop,
        );
        payload
    }

    #[tokio::test]
    async fn test_send_success() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", REPORT_PATH)
            .match_header("Content-Type", "application/json")
            .with_status(200)
            .create_async()
            .await;

        let publisher = HostPublisher::new(
            reqwest::Client::new(),
            format!("{}{}", server.url(), REPORT_PATH),
        );
        publisher.send(&sample_payload()).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_send_non_2xx_is_status_error() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", REPORT_PATH)
            .with_status(500)
            .create_async()
            .await;

        let publisher = HostPublisher::new(
            reqwest::Client::new(),
            format!("{}{}", server.url(), REPORT_PATH),
        );
        assert!(matches!(
            publisher.send(&sample_payload()).await,
            Err(PublishError::Status(500))
        ));
    }

    #[tokio::test]
    async fn test_send_transport_failure() {
        let publisher = HostPublisher::new(
            reqwest::Client::new(),
            "http://127.0.0.1:1/unreachable".to_string(),
        );
        assert!(matches!(
            publisher.send(&sample_payload()).await,
            Err(PublishError::Transport(_))
        ));
    }

    #[tokio::test]
    async fn test_send_does_not_mutate_payload() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", REPORT_PATH)
            .with_status(500)
            .create_async()
            .await;

        let publisher = HostPublisher::new(
            reqwest::Client::new(),
            format!("{}{}", server.url(), REPORT_PATH),
        );
        let payload = sample_payload();
        let before = payload.clone();
        let _ = publisher.send(&payload).await;
        assert_eq!(payload, before);
    }
}
