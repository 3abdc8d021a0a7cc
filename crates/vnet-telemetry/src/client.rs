// Copyright 2025-Present vnet-telemetry contributors
// SPDX-License-Identifier: Apache-2.0

//! Framed-write helper used by report producers.
//!
//! This is the only path plugins use to emit a report: one JSON record per
//! write, delimiter appended, flushed before returning. Classification and
//! buffering happen on the aggregator side.

use std::io;
use std::path::Path;

use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::net::UnixStream;

use crate::constants::DELIMITER;

pub struct TelemetryClient {
    stream: BufWriter<UnixStream>,
    connected: bool,
}

impl TelemetryClient {
    /// Connect to the aggregator endpoint.
    pub async fn connect(socket_path: &Path) -> io::Result<Self> {
        let stream = UnixStream::connect(socket_path).await?;
        Ok(TelemetryClient {
            stream: BufWriter::new(stream),
            connected: true,
        })
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Write one framed report. Returns the number of bytes written,
    /// delimiter included.
    pub async fn write(&mut self, frame: &[u8]) -> io::Result<usize> {
        self.stream.write_all(frame).await?;
        self.stream.write_all(&[DELIMITER]).await?;
        self.stream.flush().await?;
        Ok(frame.len() + 1)
    }

    /// Close the connection.
    pub async fn close(mut self) -> io::Result<()> {
        self.connected = false;
        self.stream.shutdown().await
    }
}

/// Remove a stale endpoint file. Used when a bind attempt reported the
/// endpoint as already bound but no peer actually accepts connections on it.
pub fn cleanup(socket_path: &Path) -> io::Result<()> {
    std::fs::remove_file(socket_path)
}
