// Copyright 2025-Present vnet-telemetry contributors
// SPDX-License-Identifier: Apache-2.0

//! Host metadata resolution with a two-level cache.
//!
//! Resolution order: in-memory copy, on-disk cache file, remote metadata
//! service. A successful remote fetch is written back to the cache file so
//! later process restarts avoid the network round-trip. The write-back is
//! best-effort; a file write failure is logged and never surfaced as a fetch
//! failure.

use std::io;
use std::path::PathBuf;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::errors::MetadataError;
use crate::report::HostMetadata;

/// Wire wrapper around the instance metadata response.
#[derive(Debug, Deserialize)]
struct MetadataWrapper {
    compute: HostMetadata,
}

/// Resolves and caches the single host identity record.
///
/// Owned exclusively by the buffer service; the resolved record is handed out
/// by value on each [`get`](MetadataCache::get).
pub struct MetadataCache {
    client: reqwest::Client,
    metadata_url: String,
    cache_path: PathBuf,
    cached: Option<HostMetadata>,
}

impl MetadataCache {
    pub fn new(client: reqwest::Client, metadata_url: String, cache_path: PathBuf) -> Self {
        MetadataCache {
            client,
            metadata_url,
            cache_path,
            cached: None,
        }
    }

    /// Fetch-or-cache resolution of the host metadata.
    pub async fn get(&mut self) -> Result<HostMetadata, MetadataError> {
        if let Some(metadata) = &self.cached {
            return Ok(metadata.clone());
        }

        if let Some(metadata) = self.read_cache_file() {
            self.cached = Some(metadata.clone());
            return Ok(metadata);
        }

        let metadata = self.fetch_remote().await?;
        if let Err(e) = self.write_cache_file(&metadata) {
            warn!("writing host metadata cache file failed: {e}");
        }
        self.cached = Some(metadata.clone());
        Ok(metadata)
    }

    fn read_cache_file(&self) -> Option<HostMetadata> {
        let content = std::fs::read(&self.cache_path).ok()?;
        match serde_json::from_slice(&content) {
            Ok(metadata) => {
                debug!("returning host metadata from cache file");
                Some(metadata)
            }
            Err(e) => {
                // Treated as a cache miss; the remote fetch overwrites it.
                debug!("host metadata cache file is unreadable: {e}");
                None
            }
        }
    }

    fn write_cache_file(&self, metadata: &HostMetadata) -> io::Result<()> {
        let data = serde_json::to_vec(metadata).map_err(io::Error::other)?;
        std::fs::write(&self.cache_path, data)
    }

    async fn fetch_remote(&self) -> Result<HostMetadata, MetadataError> {
        let resp = self
            .client
            .get(&self.metadata_url)
            .header("Metadata", "True")
            .send()
            .await?;

        let status = resp.status();
        if status != reqwest::StatusCode::OK {
            return Err(MetadataError::Status(status.as_u16()));
        }

        let body = resp.text().await?;
        if body.is_empty() {
            return Err(MetadataError::EmptyBody);
        }

        let wrapper: MetadataWrapper =
            serde_json::from_str(&body).map_err(MetadataError::Decode)?;
        Ok(wrapper.compute)
    }
}
