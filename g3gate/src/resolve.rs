/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::net::IpAddr;
use std::sync::Arc;

use slog::{Logger, slog_warn};

use g3_geoip_mmdb::{GeoDb, GeoRecord};

/// Maps a resolved client address to a [`GeoRecord`].
///
/// Resolution never fails: lookup errors and missing entries are logged to
/// the injected logger and degrade to a sentinel record.
pub struct GeoResolver {
    db: Arc<GeoDb>,
    logger: Logger,
}

impl GeoResolver {
    pub fn new(db: Arc<GeoDb>, logger: Logger) -> Self {
        GeoResolver { db, logger }
    }

    pub fn resolve(&self, ip: Option<IpAddr>) -> GeoRecord {
        let mut record = match ip {
            Some(ip) => match self.db.lookup(ip) {
                Ok(Some(record)) => record,
                Ok(None) => GeoRecord::default(),
                Err(e) => {
                    slog_warn!(self.logger, "geoip lookup failed";
                        "ip" => %ip,
                        "error" => %e,
                    );
                    GeoRecord::default()
                }
            },
            None => GeoRecord::default(),
        };
        if record.country_code.is_empty() {
            record.fill_unresolved(ip);
        }
        record.update_geohash();
        record
    }
}
