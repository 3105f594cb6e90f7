/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

mod record;
pub use record::{COUNTRY_CODE_LOOPBACK, COUNTRY_CODE_UNKNOWN, GeoRecord};

mod db;
pub use db::{GeoDb, GeoDbError};
