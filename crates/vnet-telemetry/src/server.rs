// Copyright 2025-Present vnet-telemetry contributors
// SPDX-License-Identifier: Apache-2.0

//! The connection acceptor and per-connection report readers.
//!
//! One reader task per accepted connection, all feeding the buffer service's
//! queue. The cancellation token is the teardown path: it stops the accept
//! loop and every reader, and dropping the streams closes the connections.

use std::io;
use std::path::Path;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::net::UnixListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::buffer_service::BufferHandle;
use crate::constants::DELIMITER;
use crate::errors::StartError;
use crate::report::classify;

/// Process-wide endpoint state.
#[derive(Debug, Default, Clone, Copy)]
pub struct ServerState {
    /// Whether the endpoint was already bound by a peer instance.
    pub endpoint_already_bound: bool,
    /// Whether the client-side handle is connected.
    pub connected: bool,
}

/// Accepts plugin connections on the local telemetry endpoint and forwards
/// classified reports to the buffer service.
pub struct TelemetryServer {
    listener: UnixListener,
    buffer_handle: BufferHandle,
    cancel_token: CancellationToken,
}

impl TelemetryServer {
    /// Bind the well-known endpoint. A socket already owned by a peer
    /// instance (or one this process may not touch) surfaces as
    /// [`StartError::AlreadyRunning`]; the caller is expected to skip its own
    /// buffering loop and leave buffering to the peer.
    pub fn bind(
        socket_path: &Path,
        buffer_handle: BufferHandle,
        cancel_token: CancellationToken,
    ) -> Result<Self, StartError> {
        let listener = UnixListener::bind(socket_path).map_err(|e| match e.kind() {
            io::ErrorKind::AddrInUse | io::ErrorKind::PermissionDenied => {
                StartError::AlreadyRunning
            }
            _ => StartError::Bind(e),
        })?;

        Ok(TelemetryServer {
            listener,
            buffer_handle,
            cancel_token,
        })
    }

    /// Accept loop; runs until the cancellation token fires. A failed accept
    /// is logged and never terminates the loop.
    pub async fn spin(self) {
        loop {
            tokio::select! {
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, _addr)) => {
                        debug!("accepted telemetry connection");
                        let handle = self.buffer_handle.clone();
                        let cancel_token = self.cancel_token.clone();
                        tokio::spawn(async move {
                            read_reports(BufReader::new(stream), handle, cancel_token).await;
                        });
                    }
                    Err(e) => error!("accepting telemetry connection failed: {e}"),
                },
                _ = self.cancel_token.cancelled() => break,
            }
        }
        // Dropping the listener closes the endpoint; reader tasks observe the
        // same token and drop their streams on exit.
        debug!("telemetry server stopped");
    }
}

/// Per-connection read loop: delimiter-framed records in, classified reports
/// out. Any read error, EOF, or truncated frame ends the loop for this
/// connection; it must never spin on a broken stream.
async fn read_reports<R>(mut reader: R, handle: BufferHandle, cancel_token: CancellationToken)
where
    R: AsyncBufRead + Unpin,
{
    let mut frame = Vec::new();
    loop {
        frame.clear();
        let read = tokio::select! {
            read = reader.read_until(DELIMITER, &mut frame) => read,
            _ = cancel_token.cancelled() => break,
        };

        match read {
            Ok(0) => break, // client disconnected
            Ok(_) => {
                if frame.last() != Some(&DELIMITER) {
                    // Connection closed mid-frame; nothing usable in the tail.
                    break;
                }
                frame.pop();

                match classify(&frame) {
                    Ok(Some(report)) => {
                        debug!("got {} report", report.kind());
                        if handle.send_report(report).is_err() {
                            // The buffer service is gone; stop reading.
                            break;
                        }
                    }
                    Ok(None) => debug!("discarding record with no known report marker"),
                    Err(e) => warn!("discarding malformed report frame: {e}"),
                }
            }
            Err(e) => {
                warn!("reading telemetry connection failed: {e}");
                break;
            }
        }
    }
}
