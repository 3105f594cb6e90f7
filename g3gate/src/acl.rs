/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::fmt;
use std::net::IpAddr;

use rustc_hash::FxHashSet;
use smol_str::SmolStr;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AclAction {
    Permit,
    Forbid,
}

impl AclAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AclAction::Permit => "Permit",
            AclAction::Forbid => "Forbid",
        }
    }

    #[inline]
    pub fn forbid(&self) -> bool {
        matches!(self, AclAction::Forbid)
    }
}

impl fmt::Display for AclAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Allow/block rule set keyed on country code and literal IP address.
///
/// Country codes match case-sensitive exact, addresses match exact on the
/// canonical parsed form. There is no CIDR or case folding. Built once from
/// config and shared read-only across concurrent requests.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AclGeoRule {
    allow_only: bool,
    block_country: FxHashSet<SmolStr>,
    block_ip: FxHashSet<IpAddr>,
    allow_country: FxHashSet<SmolStr>,
    allow_ip: FxHashSet<IpAddr>,
}

impl AclGeoRule {
    #[inline]
    pub fn set_allow_only(&mut self, enable: bool) {
        self.allow_only = enable;
    }

    #[inline]
    pub fn add_blocked_country(&mut self, code: &str) {
        self.block_country.insert(SmolStr::new(code));
    }

    #[inline]
    pub fn add_blocked_ip(&mut self, ip: IpAddr) {
        self.block_ip.insert(ip.to_canonical());
    }

    #[inline]
    pub fn add_allowed_country(&mut self, code: &str) {
        self.allow_country.insert(SmolStr::new(code));
    }

    #[inline]
    pub fn add_allowed_ip(&mut self, ip: IpAddr) {
        self.allow_ip.insert(ip.to_canonical());
    }

    /// Evaluate the rule set for one request.
    ///
    /// Without `allow_only`, a request that matches no block-list entry is
    /// permitted without consulting the allow list; on any block-list match
    /// the allow list runs as an override, so an entry present in both
    /// lists is permitted. With `allow_only`, only the allow list runs.
    pub fn check(&self, country_code: &str, ip: Option<IpAddr>) -> AclAction {
        if !self.allow_only && !self.check_blocked(country_code, ip) {
            return AclAction::Permit;
        }
        self.check_allowed(country_code, ip)
    }

    fn check_blocked(&self, country_code: &str, ip: Option<IpAddr>) -> bool {
        self.block_country.contains(country_code)
            || ip.is_some_and(|ip| self.block_ip.contains(&ip))
    }

    fn check_allowed(&self, country_code: &str, ip: Option<IpAddr>) -> AclAction {
        if self.allow_country.contains(country_code)
            || ip.is_some_and(|ip| self.allow_ip.contains(&ip))
        {
            AclAction::Permit
        } else {
            AclAction::Forbid
        }
    }
}
