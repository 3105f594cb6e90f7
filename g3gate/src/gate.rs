/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::net::IpAddr;
use std::sync::Arc;

use anyhow::Context;
use http::HeaderMap;
use slog::{Logger, slog_warn};

use g3_geoip_mmdb::{GeoDb, GeoRecord};

use crate::acl::{AclAction, AclGeoRule};
use crate::config::GateConfig;
use crate::resolve::GeoResolver;

/// Per-request evaluation result, exclusively owned by the request that
/// produced it.
pub struct RequestContext {
    pub client_ip: Option<IpAddr>,
    pub record: GeoRecord,
    pub action: AclAction,
}

impl RequestContext {
    #[inline]
    pub fn permitted(&self) -> bool {
        !self.action.forbid()
    }
}

/// The access gate: an open database handle, the frozen rule set and the
/// injected logger. Immutable after construction, shared across concurrent
/// requests without locking. All per-request state lives in the
/// [`RequestContext`] returned by [`evaluate`](Self::evaluate).
pub struct GeoGate {
    resolver: GeoResolver,
    rule: AclGeoRule,
    logger: Logger,
}

impl GeoGate {
    pub fn new(config: GateConfig, logger: Logger) -> anyhow::Result<Self> {
        let db = GeoDb::open(&config.db_path).context("failed to open geoip database")?;
        Ok(GeoGate {
            resolver: GeoResolver::new(Arc::new(db), logger.clone()),
            rule: config.rule,
            logger,
        })
    }

    /// Evaluate one request: client address -> geo record -> verdict.
    ///
    /// An unresolvable client address is not an error at this level, it is
    /// logged and routed through the sentinel record path, where it will
    /// match no IP rule entry.
    pub fn evaluate(&self, headers: &HeaderMap, peer_addr: &str) -> RequestContext {
        let client_ip = match crate::client::resolve_client_ip(headers, peer_addr) {
            Ok(ip) => Some(ip),
            Err(e) => {
                slog_warn!(self.logger, "unable to resolve client address";
                    "peer" => peer_addr,
                    "error" => %e,
                );
                None
            }
        };
        let record = self.resolver.resolve(client_ip);
        let action = self.rule.check(record.country_code.as_str(), client_ip);
        RequestContext {
            client_ip,
            record,
            action,
        }
    }
}
