// Copyright 2025-Present vnet-telemetry contributors
// SPDX-License-Identifier: Apache-2.0

//! The in-memory aggregation unit: four ordered report sequences, bounded by
//! [`MAX_PAYLOAD_SIZE`] across all of them.

use serde::{Deserialize, Serialize};

use crate::constants::MAX_PAYLOAD_SIZE;
use crate::report::{CNIReport, CNSReport, DNCReport, HostMetadata, NPMReport, Report};

/// Behavior when a report arrives while the buffer is at capacity.
///
/// Blocking would stall the single consumer that also drives flushes, and
/// spilling to disk is out of scope, so dropping the incoming report is the
/// only shipped policy. It stays a configuration point so the choice is
/// explicit at the call sites that enforce it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[non_exhaustive]
pub enum OverflowPolicy {
    /// Drop the incoming report; the caller logs the drop.
    #[default]
    Drop,
}

/// Aggregate of buffered reports awaiting delivery to the host.
///
/// Insertion order is preserved per sequence; the serialized form is the wire
/// format POSTed to the host net agent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Payload {
    #[serde(rename = "DNCReports")]
    pub dnc_reports: Vec<DNCReport>,
    #[serde(rename = "CNIReports")]
    pub cni_reports: Vec<CNIReport>,
    #[serde(rename = "NPMReports")]
    pub npm_reports: Vec<NPMReport>,
    #[serde(rename = "CNSReports")]
    pub cns_reports: Vec<CNSReport>,
}

impl Payload {
    /// Total number of buffered reports across all four sequences.
    pub fn len(&self) -> usize {
        self.dnc_reports.len()
            + self.cni_reports.len()
            + self.npm_reports.len()
            + self.cns_reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append a report to its sequence, attaching `metadata` when resolution
    /// succeeded. The capacity invariant `len() < MAX_PAYLOAD_SIZE` is checked
    /// before the append; at capacity the report is handled per `policy` and
    /// `false` is returned so the caller can log the drop.
    pub fn push(
        &mut self,
        mut report: Report,
        metadata: Option<HostMetadata>,
        policy: OverflowPolicy,
    ) -> bool {
        if self.len() >= MAX_PAYLOAD_SIZE {
            match policy {
                OverflowPolicy::Drop => return false,
            }
        }

        if let Some(metadata) = metadata {
            report.set_metadata(metadata);
        }

        match report {
            Report::Dnc(report) => self.dnc_reports.push(report),
            Report::Cni(report) => self.cni_reports.push(report),
            Report::Npm(report) => self.npm_reports.push(report),
            Report::Cns(report) => self.cns_reports.push(report),
        }

        true
    }

    /// Clear all four sequences after a successful publish.
    pub fn reset(&mut self) {
        self.dnc_reports.clear();
        self.cni_reports.clear();
        self.npm_reports.clear();
        self.cns_reports.clear();
    }
}
