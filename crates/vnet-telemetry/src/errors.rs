// Copyright 2025-Present vnet-telemetry contributors
// SPDX-License-Identifier: Apache-2.0

//! Error taxonomy for the aggregator. No variant here is process-fatal: bind
//! failures drive the already-running fallback, and everything else is logged
//! by the component that observes it.

use std::io;

/// Errors from binding the local telemetry endpoint.
#[derive(Debug, thiserror::Error)]
pub enum StartError {
    /// The endpoint is already owned by another aggregator instance. The
    /// caller is expected to skip its own buffering loop.
    #[error("telemetry endpoint is already in use by another instance")]
    AlreadyRunning,

    #[error("failed to bind telemetry endpoint: {0}")]
    Bind(#[from] io::Error),
}

/// A frame that could not be parsed as a structural record.
///
/// Records that parse but match no known report marker are not errors; they
/// are silently discarded by the classifier.
#[derive(Debug, thiserror::Error)]
#[error("malformed report frame: {0}")]
pub struct ClassifyError(#[from] serde_json::Error);

/// Errors resolving host metadata after both the in-memory copy and the
/// on-disk cache missed.
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error("metadata request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("metadata request failed with HTTP status {0}")]
    Status(u16),

    #[error("metadata response body is empty")]
    EmptyBody,

    #[error("unable to decode metadata response: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Errors delivering the payload to the host net agent. The payload itself is
/// never mutated on failure; the buffer service retries the whole batch on
/// the next flush tick.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("payload POST failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("payload POST returned HTTP status {0}")]
    Status(u16),
}

/// Errors building or validating the aggregator configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}
