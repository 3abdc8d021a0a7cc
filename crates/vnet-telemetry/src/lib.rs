// Copyright 2025-Present vnet-telemetry contributors
// SPDX-License-Identifier: Apache-2.0

//! Local telemetry aggregator for host network plugins.
//!
//! Network plugins on the host emit newline-delimited JSON reports over a
//! Unix domain socket. This crate accepts those connections, classifies each
//! frame into one of the known report shapes, buffers the reports with host
//! identity metadata attached, and periodically ships the accumulated payload
//! to the host net agent over HTTP.

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

pub mod buffer_service;
pub mod client;
pub mod config;
pub mod constants;
pub mod errors;
pub mod metadata;
pub mod payload;
pub mod publisher;
pub mod report;
pub mod server;
