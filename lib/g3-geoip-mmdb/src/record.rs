/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::net::IpAddr;

use smol_str::SmolStr;

/// Sentinel country code for loopback client addresses.
pub const COUNTRY_CODE_LOOPBACK: &str = "**";
/// Sentinel country code for addresses the database can not resolve.
pub const COUNTRY_CODE_UNKNOWN: &str = "!!";

const GEOHASH_PRECISION: usize = 12;

/// The resolved geo attributes for a single lookup.
///
/// A record is built fresh for each request and is not mutated after the
/// resolver hands it out. Fields with no database data keep their zero
/// values, except for the country/city names which are synthesized.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GeoRecord {
    pub country_code: SmolStr,
    pub country_name: String,
    pub country_geoname_id: u32,
    pub is_in_european_union: bool,
    pub city_name: String,
    pub city_geoname_id: u32,
    pub latitude: f64,
    pub longitude: f64,
    pub time_zone: String,
    pub geohash: String,
}

impl GeoRecord {
    /// Fill in sentinel values for an address without a usable database
    /// entry. Only the country code and the display names are replaced,
    /// location fields already decoded are kept as is.
    pub fn fill_unresolved(&mut self, ip: Option<IpAddr>) {
        if ip.is_some_and(|ip| ip.is_loopback()) {
            self.country_code = SmolStr::new_static(COUNTRY_CODE_LOOPBACK);
            self.country_name = "Loopback".to_string();
            self.city_name = "Loopback".to_string();
        } else {
            self.country_code = SmolStr::new_static(COUNTRY_CODE_UNKNOWN);
            self.country_name = "No Country".to_string();
            self.city_name = "No City".to_string();
        }
    }

    /// Derive the geohash from the current coordinates.
    ///
    /// Zero-valued coordinates hash the origin, which is accepted behavior
    /// for records without location data.
    pub fn update_geohash(&mut self) {
        self.geohash = geohash::encode(
            geohash::Coord {
                x: self.longitude,
                y: self.latitude,
            },
            GEOHASH_PRECISION,
        )
        .unwrap_or_default();
    }

    /// Export the named string attributes for downstream logging and
    /// templating. Always available, whatever the final verdict is.
    pub fn attributes(&self) -> Vec<(&'static str, String)> {
        vec![
            ("country_code", self.country_code.to_string()),
            ("country_name", self.country_name.clone()),
            ("country_eu", self.is_in_european_union.to_string()),
            ("country_geoname_id", self.country_geoname_id.to_string()),
            ("city_name", self.city_name.clone()),
            ("city_geoname_id", self.city_geoname_id.to_string()),
            ("latitude", format!("{:.6}", self.latitude)),
            ("longitude", format!("{:.6}", self.longitude)),
            ("geohash", self.geohash.clone()),
            ("time_zone", self.time_zone.clone()),
        ]
    }
}
