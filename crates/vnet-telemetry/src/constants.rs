// Copyright 2025-Present vnet-telemetry contributors
// SPDX-License-Identifier: Apache-2.0

//! Shared constants for the telemetry endpoint, framing, and payload sizing.

use std::time::Duration;

/// Well-known name of the local telemetry endpoint.
pub const SOCKET_NAME: &str = "azure-vnet-telemetry";

/// Default filesystem path of the Unix domain socket realizing [`SOCKET_NAME`].
pub const DEFAULT_SOCKET_PATH: &str = "/var/run/azure-vnet-telemetry.sock";

/// Frame delimiter for socket reads and writes.
pub const DELIMITER: u8 = b'\n';

/// Maximum number of buffered reports across all four sequences (~2MB).
pub const MAX_PAYLOAD_SIZE: usize = 2097;

/// Floor for the flush interval; shorter requested intervals are raised to it.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(60);

/// Default host net agent URL payloads are POSTed to.
pub const DEFAULT_HOST_REPORT_URL: &str =
    "http://169.254.169.254/machine/plugins?comp=netagent&type=payload";

/// Default instance metadata service URL.
pub const DEFAULT_METADATA_URL: &str =
    "http://169.254.169.254/metadata/instance?api-version=2017-08-01&format=json";

/// Default location of the on-disk host metadata cache.
pub const DEFAULT_METADATA_CACHE_PATH: &str = "/var/run/azure-vnet-telemetry.metadata.json";

/// Timeout applied to publish and metadata HTTP requests.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);
