// Copyright 2025-Present vnet-telemetry contributors
// SPDX-License-Identifier: Apache-2.0

//! Report shapes emitted by the network plugins and the structural classifier
//! that tells them apart.
//!
//! Each plugin owns the schema of its own report; the aggregator only needs
//! to recognize which shape a frame is and which payload sequence it belongs
//! to. Recognition is structural: one discriminating key per shape, checked
//! in a fixed priority order.

use serde::{Deserialize, Serialize};

use crate::errors::ClassifyError;

/// Host identity record attached to every buffered report.
///
/// Field names follow the instance metadata service wire format; the same
/// shape is persisted to the on-disk cache file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostMetadata {
    #[serde(rename = "location")]
    pub location: String,
    #[serde(rename = "name")]
    pub vm_name: String,
    #[serde(rename = "offer")]
    pub offer: String,
    #[serde(rename = "osType")]
    pub os_type: String,
    #[serde(rename = "placementGroupId")]
    pub placement_group_id: String,
    #[serde(rename = "platformFaultDomain")]
    pub platform_fault_domain: String,
    #[serde(rename = "platformUpdateDomain")]
    pub platform_update_domain: String,
    #[serde(rename = "publisher")]
    pub publisher: String,
    #[serde(rename = "resourceGroupName")]
    pub resource_group_name: String,
    #[serde(rename = "sku")]
    pub sku: String,
    #[serde(rename = "subscriptionId")]
    pub subscription_id: String,
    #[serde(rename = "version")]
    pub os_version: String,
    #[serde(rename = "vmId")]
    pub vm_id: String,
    #[serde(rename = "vmSize")]
    pub vm_size: String,
    #[serde(rename = "KernelVersion")]
    pub kernel_version: String,
}

/// Controller allocation report. Discriminating key: `Allocations`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct DNCReport {
    pub is_new_instance: bool,
    pub cpu_usage: String,
    pub memory_usage: String,
    pub processes: String,
    pub event_message: String,
    pub partition_key: String,
    pub allocations: String,
    pub num_allocations: i64,
    pub error_message: String,
    pub timestamp: String,
    pub metadata: HostMetadata,
}

/// Network interface plugin report. Discriminating key: `CniSucceeded`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct CNIReport {
    pub cni_succeeded: bool,
    pub name: String,
    pub version: String,
    pub error_message: String,
    pub event_message: String,
    pub operation_type: String,
    pub operation_duration: i64,
    pub context: String,
    pub sub_context: String,
    pub vnet_address_space: Vec<String>,
    pub timestamp: String,
    pub metadata: HostMetadata,
}

/// Network policy manager report. Discriminating key: `NpmVersion`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct NPMReport {
    #[serde(rename = "ClusterID")]
    pub cluster_id: String,
    pub node_name: String,
    pub instance_name: String,
    pub npm_version: String,
    pub kubernetes_version: String,
    pub error_message: String,
    pub event_message: String,
    pub up_time: String,
    pub timestamp: String,
    pub metadata: HostMetadata,
}

/// Partitioning service report. Discriminating key: `DncPartitionKey`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct CNSReport {
    pub is_new_instance: bool,
    pub cpu_usage: String,
    pub memory_usage: String,
    pub processes: String,
    pub event_message: String,
    pub dnc_partition_key: String,
    pub error_message: String,
    pub timestamp: String,
    pub metadata: HostMetadata,
}

/// A classified telemetry report, one variant per producing plugin.
#[derive(Debug, Clone, PartialEq)]
pub enum Report {
    Dnc(DNCReport),
    Cni(CNIReport),
    Npm(NPMReport),
    Cns(CNSReport),
}

impl Report {
    /// Short name of the variant, for log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            Report::Dnc(_) => "DNC",
            Report::Cni(_) => "CNI",
            Report::Npm(_) => "NPM",
            Report::Cns(_) => "CNS",
        }
    }

    /// Replace the metadata attachment. Producers never populate metadata;
    /// the buffer service does, right before the report is appended.
    pub fn set_metadata(&mut self, metadata: HostMetadata) {
        match self {
            Report::Dnc(report) => report.metadata = metadata,
            Report::Cni(report) => report.metadata = metadata,
            Report::Npm(report) => report.metadata = metadata,
            Report::Cns(report) => report.metadata = metadata,
        }
    }
}

/// Classify one delimiter-stripped frame into a typed report.
///
/// The discriminating keys are checked in a fixed priority order: `NpmVersion`,
/// `CniSucceeded`, `Allocations`, `DncPartitionKey`. A record carrying more
/// than one marker takes the first match, so classification is deterministic
/// on ambiguous records. A record matching none of the markers yields
/// `Ok(None)` and is discarded by the caller; a frame that is not a JSON
/// object at all is a [`ClassifyError`].
pub fn classify(frame: &[u8]) -> Result<Option<Report>, ClassifyError> {
    let record: serde_json::Map<String, serde_json::Value> = serde_json::from_slice(frame)?;

    let report = if record.contains_key("NpmVersion") {
        Some(Report::Npm(serde_json::from_slice(frame)?))
    } else if record.contains_key("CniSucceeded") {
        Some(Report::Cni(serde_json::from_slice(frame)?))
    } else if record.contains_key("Allocations") {
        Some(Report::Dnc(serde_json::from_slice(frame)?))
    } else if record.contains_key("DncPartitionKey") {
        Some(Report::Cns(serde_json::from_slice(frame)?))
    } else {
        None
    };

    Ok(report)
}
