/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::net::IpAddr;
use std::path::{Path, PathBuf};

use maxminddb::{MaxMindDbError, Reader, geoip2};
use smol_str::SmolStr;
use thiserror::Error;

use crate::GeoRecord;

#[derive(Debug, Error)]
pub enum GeoDbError {
    #[error("failed to open database {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: MaxMindDbError,
    },
    #[error("lookup failed: {0}")]
    Lookup(#[source] MaxMindDbError),
    #[error("invalid record data: {0}")]
    Decode(#[source] MaxMindDbError),
}

/// Read-only handle to a MaxMind city database.
///
/// Opened once at startup and shared across concurrent lookups without
/// locking, the underlying reader is never mutated.
pub struct GeoDb {
    reader: Reader<Vec<u8>>,
}

impl GeoDb {
    pub fn open(path: &Path) -> Result<GeoDb, GeoDbError> {
        let reader = Reader::open_readfile(path).map_err(|e| GeoDbError::Open {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(GeoDb { reader })
    }

    /// Build from an in-memory database image.
    pub fn from_bytes(data: Vec<u8>) -> Result<GeoDb, GeoDbError> {
        let reader = Reader::from_source(data).map_err(|e| GeoDbError::Open {
            path: PathBuf::new(),
            source: e,
        })?;
        Ok(GeoDb { reader })
    }

    /// Query the database for the given address.
    ///
    /// Returns `Ok(None)` if the database has no entry for the address.
    /// Names are taken from the English variant.
    pub fn lookup(&self, ip: IpAddr) -> Result<Option<GeoRecord>, GeoDbError> {
        let result = self.reader.lookup(ip).map_err(GeoDbError::Lookup)?;
        if !result.has_data() {
            return Ok(None);
        }
        let Some(city) = result
            .decode::<geoip2::City>()
            .map_err(GeoDbError::Decode)?
        else {
            return Ok(None);
        };

        let mut record = GeoRecord {
            country_code: city.country.iso_code.map(SmolStr::new).unwrap_or_default(),
            country_geoname_id: city.country.geoname_id.unwrap_or_default(),
            is_in_european_union: city.country.is_in_european_union.unwrap_or_default(),
            city_geoname_id: city.city.geoname_id.unwrap_or_default(),
            latitude: city.location.latitude.unwrap_or_default(),
            longitude: city.location.longitude.unwrap_or_default(),
            ..Default::default()
        };
        if let Some(name) = city.country.names.english {
            record.country_name = name.to_string();
        }
        if let Some(name) = city.city.names.english {
            record.city_name = name.to_string();
        }
        if let Some(tz) = city.location.time_zone {
            record.time_zone = tz.to_string();
        }
        Ok(Some(record))
    }
}
