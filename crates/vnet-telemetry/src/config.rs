// Copyright 2025-Present vnet-telemetry contributors
// SPDX-License-Identifier: Apache-2.0

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::{
    DEFAULT_HOST_REPORT_URL, DEFAULT_HTTP_TIMEOUT, DEFAULT_INTERVAL, DEFAULT_METADATA_CACHE_PATH,
    DEFAULT_METADATA_URL, DEFAULT_SOCKET_PATH,
};
use crate::errors::ConfigError;
use crate::payload::OverflowPolicy;

/// Configuration for the telemetry aggregator.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Filesystem path of the local telemetry endpoint.
    pub socket_path: PathBuf,
    /// Host net agent URL payloads are POSTed to.
    pub host_report_url: String,
    /// Instance metadata service URL.
    pub metadata_url: String,
    /// On-disk host metadata cache file.
    pub metadata_cache_path: PathBuf,
    /// Requested flush interval; the buffer service floors it to the default.
    pub flush_interval: Duration,
    /// Timeout for publish and metadata HTTP requests.
    pub http_timeout: Duration,
    /// Behavior when the payload buffer is at capacity.
    pub overflow_policy: OverflowPolicy,
    /// Log level (e.g., trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            socket_path: PathBuf::from(DEFAULT_SOCKET_PATH),
            host_report_url: DEFAULT_HOST_REPORT_URL.to_string(),
            metadata_url: DEFAULT_METADATA_URL.to_string(),
            metadata_cache_path: PathBuf::from(DEFAULT_METADATA_CACHE_PATH),
            flush_interval: DEFAULT_INTERVAL,
            http_timeout: DEFAULT_HTTP_TIMEOUT,
            overflow_policy: OverflowPolicy::Drop,
            log_level: "info".to_string(),
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let socket_path = env::var("VNET_TELEMETRY_SOCKET_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_SOCKET_PATH));
        let host_report_url = env::var("VNET_TELEMETRY_HOST_REPORT_URL")
            .unwrap_or_else(|_| DEFAULT_HOST_REPORT_URL.to_string());
        let metadata_url = env::var("VNET_TELEMETRY_METADATA_URL")
            .unwrap_or_else(|_| DEFAULT_METADATA_URL.to_string());
        let metadata_cache_path = env::var("VNET_TELEMETRY_METADATA_CACHE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_METADATA_CACHE_PATH));
        let flush_interval = env::var("VNET_TELEMETRY_FLUSH_INTERVAL_SECS")
            .ok()
            .and_then(|val| val.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_INTERVAL);
        let http_timeout = env::var("VNET_TELEMETRY_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|val| val.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_HTTP_TIMEOUT);
        let log_level = env::var("VNET_TELEMETRY_LOG_LEVEL")
            .map(|val| val.to_lowercase())
            .unwrap_or_else(|_| "info".to_string());

        let config = Self {
            socket_path,
            host_report_url,
            metadata_url,
            metadata_cache_path,
            flush_interval,
            http_timeout,
            overflow_policy: OverflowPolicy::Drop,
            log_level,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.socket_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid(
                "socket path cannot be empty".to_string(),
            ));
        }

        if self.host_report_url.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "host report URL cannot be empty".to_string(),
            ));
        }

        if self.metadata_url.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "metadata URL cannot be empty".to_string(),
            ));
        }

        if self.http_timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "HTTP timeout must be greater than zero".to_string(),
            ));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.log_level.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "invalid log level '{}'. Must be one of: trace, debug, info, warn, error",
                self.log_level
            )));
        }

        Ok(())
    }
}
