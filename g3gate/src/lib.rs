/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

//! Per-request geo access control.
//!
//! The gate runs a fixed pipeline for each incoming request: resolve the
//! client address from the request metadata, resolve that address to a
//! [`GeoRecord`](g3_geoip_mmdb::GeoRecord) through an offline MaxMind
//! database, then evaluate the configured allow/block rules to a final
//! [`AclAction`](acl::AclAction) verdict. The resolved attributes are
//! available to the caller whatever the verdict is.

pub mod acl;

pub mod config;
pub use config::GateConfig;

mod client;
pub use client::{ClientAddrError, X_FORWARDED_FOR, resolve_client_ip};

mod resolve;
pub use resolve::GeoResolver;

mod gate;
pub use gate::{GeoGate, RequestContext};
