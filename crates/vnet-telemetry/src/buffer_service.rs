// Copyright 2025-Present vnet-telemetry contributors
// SPDX-License-Identifier: Apache-2.0

//! The single consumer that owns the payload buffer.
//!
//! Connection readers are unbounded producers feeding one queue; this service
//! is the only task that mutates the [`Payload`]. Three event sources are
//! merged into one select loop: the flush timer, the inbound report queue,
//! and the cancellation token. Flush and append therefore never interleave.

use tokio::sync::{mpsc, oneshot};
use tokio::time::{interval, Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::TelemetryConfig;
use crate::constants::DEFAULT_INTERVAL;
use crate::errors::ConfigError;
use crate::metadata::MetadataCache;
use crate::payload::{OverflowPolicy, Payload};
use crate::publisher::HostPublisher;
use crate::report::Report;

#[derive(Debug)]
pub enum BufferCommand {
    /// A classified report from a connection reader.
    Report(Report),
    /// Snapshot of the current payload, for diagnostics and tests.
    Snapshot(oneshot::Sender<Payload>),
}

/// Sending half used by connection readers to forward classified reports.
#[derive(Clone)]
pub struct BufferHandle {
    tx: mpsc::UnboundedSender<BufferCommand>,
}

impl BufferHandle {
    pub fn send_report(
        &self,
        report: Report,
    ) -> Result<(), mpsc::error::SendError<BufferCommand>> {
        self.tx.send(BufferCommand::Report(report))
    }

    pub async fn snapshot(&self) -> Result<Payload, String> {
        let (response_tx, response_rx) = oneshot::channel();
        self.tx
            .send(BufferCommand::Snapshot(response_tx))
            .map_err(|e| format!("Failed to send snapshot command: {}", e))?;

        response_rx
            .await
            .map_err(|e| format!("Failed to receive snapshot response: {}", e))
    }
}

/// Buffers classified reports and ships them to the host on a timer.
pub struct BufferService {
    payload: Payload,
    metadata: MetadataCache,
    publisher: HostPublisher,
    flush_interval: Duration,
    overflow_policy: OverflowPolicy,
    rx: mpsc::UnboundedReceiver<BufferCommand>,
    cancel_token: CancellationToken,
}

impl BufferService {
    pub fn new(
        config: &TelemetryConfig,
        cancel_token: CancellationToken,
    ) -> Result<(Self, BufferHandle), ConfigError> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()?;

        let (tx, rx) = mpsc::unbounded_channel();

        let service = Self {
            payload: Payload::default(),
            metadata: MetadataCache::new(
                client.clone(),
                config.metadata_url.clone(),
                config.metadata_cache_path.clone(),
            ),
            publisher: HostPublisher::new(client, config.host_report_url.clone()),
            // Requested intervals shorter than the default are raised to it.
            flush_interval: config.flush_interval.max(DEFAULT_INTERVAL),
            overflow_policy: config.overflow_policy,
            rx,
            cancel_token,
        };

        let handle = BufferHandle { tx };

        Ok((service, handle))
    }

    pub async fn run(mut self) {
        info!(
            "buffering telemetry data, flushing to host every {:?}",
            self.flush_interval
        );

        let mut ticker = interval(self.flush_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // A tokio interval fires immediately; consume the first tick so the
        // initial flush happens one full period after startup.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => self.flush().await,
                maybe_command = self.rx.recv() => match maybe_command {
                    Some(BufferCommand::Report(report)) => self.buffer_report(report).await,
                    Some(BufferCommand::Snapshot(response_tx)) => {
                        if response_tx.send(self.payload.clone()).is_err() {
                            error!("failed to send snapshot response - receiver dropped");
                        }
                    }
                    None => break, // all handles dropped
                },
                _ = self.cancel_token.cancelled() => {
                    debug!("buffer service cancelled");
                    break;
                }
            }
        }

        debug!("buffer service stopped");
    }

    /// One flush attempt. On success the payload is cleared; on failure it is
    /// left untouched and the whole batch is retried on the next tick.
    async fn flush(&mut self) {
        match self.publisher.send(&self.payload).await {
            Ok(()) => self.payload.reset(),
            Err(e) => error!("sending payload to host failed: {e}"),
        }
    }

    /// Append one report under the capacity invariant. A metadata resolution
    /// failure is logged and never blocks the append.
    async fn buffer_report(&mut self, report: Report) {
        let metadata = match self.metadata.get().await {
            Ok(metadata) => Some(metadata),
            Err(e) => {
                warn!("resolving host metadata failed: {e}");
                None
            }
        };

        let kind = report.kind();
        if !self.payload.push(report, metadata, self.overflow_policy) {
            warn!(
                "payload at capacity ({} reports), dropping incoming {} report",
                crate::constants::MAX_PAYLOAD_SIZE,
                kind
            );
        }
    }
}

#[cfg(test)]
pub(crate) fn channel_for_tests() -> (BufferHandle, mpsc::UnboundedReceiver<BufferCommand>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (BufferHandle { tx }, rx)
}
