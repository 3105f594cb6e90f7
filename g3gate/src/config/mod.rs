/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, anyhow};
use yaml_rust::{Yaml, YamlLoader};

use crate::acl::AclGeoRule;

/// Static gate configuration: the database path and the rule set.
pub struct GateConfig {
    pub(crate) db_path: PathBuf,
    pub(crate) rule: AclGeoRule,
}

impl GateConfig {
    /// Load from a yaml config file. A relative database path is resolved
    /// against the directory of the config file.
    pub fn load(path: &Path) -> anyhow::Result<GateConfig> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| anyhow!("failed to read config file {}: {e}", path.display()))?;
        let docs = YamlLoader::load_from_str(&contents)
            .map_err(|e| anyhow!("invalid yaml file {}: {e}", path.display()))?;
        let doc = docs
            .first()
            .ok_or_else(|| anyhow!("no yaml document found in {}", path.display()))?;
        let lookup_dir = path.parent().unwrap_or_else(|| Path::new("."));
        GateConfig::parse_yaml(doc, lookup_dir)
    }

    pub fn parse_yaml(v: &Yaml, lookup_dir: &Path) -> anyhow::Result<GateConfig> {
        let Yaml::Hash(map) = v else {
            return Err(anyhow!("the yaml value type for gate config should be map"));
        };

        let mut db_path: Option<PathBuf> = None;
        let mut rule = AclGeoRule::default();
        for (k, v) in map.iter() {
            let Yaml::String(k) = k else {
                return Err(anyhow!("key in hash should be string"));
            };
            match normalize_key(k).as_str() {
                "database" | "db" => {
                    let path = as_file_path(v, lookup_dir)
                        .context(format!("invalid value for key {k}"))?;
                    db_path = Some(path);
                }
                "block_list" => {
                    parse_block_list(v, &mut rule)
                        .context(format!("invalid value for key {k}"))?;
                }
                "allow_list" => {
                    parse_allow_list(v, &mut rule)
                        .context(format!("invalid value for key {k}"))?;
                }
                _ => return Err(anyhow!("invalid key {k}")),
            }
        }

        let db_path = db_path.ok_or_else(|| anyhow!("no database path set"))?;
        Ok(GateConfig { db_path, rule })
    }
}

fn parse_block_list(v: &Yaml, rule: &mut AclGeoRule) -> anyhow::Result<()> {
    let Yaml::Hash(map) = v else {
        return Err(anyhow!("the yaml value type for block list should be map"));
    };
    for (k, v) in map.iter() {
        let Yaml::String(k) = k else {
            return Err(anyhow!("key in hash should be string"));
        };
        match normalize_key(k).as_str() {
            "country" => foreach_str(v, |s| {
                rule.add_blocked_country(s);
                Ok(())
            })?,
            "ip" => foreach_str(v, |s| {
                rule.add_blocked_ip(as_ip_addr(s)?);
                Ok(())
            })?,
            _ => return Err(anyhow!("invalid key {k}")),
        }
    }
    Ok(())
}

fn parse_allow_list(v: &Yaml, rule: &mut AclGeoRule) -> anyhow::Result<()> {
    let Yaml::Hash(map) = v else {
        return Err(anyhow!("the yaml value type for allow list should be map"));
    };
    for (k, v) in map.iter() {
        let Yaml::String(k) = k else {
            return Err(anyhow!("key in hash should be string"));
        };
        match normalize_key(k).as_str() {
            "allow_only" => {
                let enable = as_bool(v).context(format!("invalid value for key {k}"))?;
                rule.set_allow_only(enable);
            }
            "country" => foreach_str(v, |s| {
                rule.add_allowed_country(s);
                Ok(())
            })?,
            "ip" => foreach_str(v, |s| {
                rule.add_allowed_ip(as_ip_addr(s)?);
                Ok(())
            })?,
            _ => return Err(anyhow!("invalid key {k}")),
        }
    }
    Ok(())
}

fn normalize_key(raw: &str) -> String {
    raw.to_lowercase().replace('-', "_")
}

fn as_ip_addr(s: &str) -> anyhow::Result<IpAddr> {
    let ip = IpAddr::from_str(s).map_err(|e| anyhow!("invalid ip address {s}: {e}"))?;
    Ok(ip)
}

fn as_bool(v: &Yaml) -> anyhow::Result<bool> {
    match v {
        Yaml::Boolean(value) => Ok(*value),
        Yaml::String(s) => match s.to_lowercase().as_str() {
            "on" | "true" | "1" => Ok(true),
            "off" | "false" | "0" => Ok(false),
            _ => Err(anyhow!("invalid yaml string value for boolean: {s}")),
        },
        Yaml::Integer(i) => Ok(*i != 0),
        _ => Err(anyhow!("invalid yaml value type for boolean")),
    }
}

fn as_file_path(v: &Yaml, lookup_dir: &Path) -> anyhow::Result<PathBuf> {
    let Yaml::String(s) = v else {
        return Err(anyhow!("the yaml value type for file path should be string"));
    };
    let path = Path::new(s);
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(lookup_dir.join(path))
    }
}

/// Walk a scalar string value or a sequence of them.
fn foreach_str<F>(v: &Yaml, mut f: F) -> anyhow::Result<()>
where
    F: FnMut(&str) -> anyhow::Result<()>,
{
    match v {
        Yaml::String(s) => f(s),
        Yaml::Array(seq) => {
            for (i, v) in seq.iter().enumerate() {
                if let Yaml::String(s) = v {
                    f(s).context(format!("invalid value for element #{i}"))?;
                } else {
                    return Err(anyhow!("invalid yaml value type for element #{i}"));
                }
            }
            Ok(())
        }
        _ => Err(anyhow!("the yaml value type should be string or sequence")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acl::AclAction;

    fn parse(content: &str) -> anyhow::Result<GateConfig> {
        let docs = YamlLoader::load_from_str(content).unwrap();
        GateConfig::parse_yaml(&docs[0], Path::new("/etc/g3gate"))
    }

    #[test]
    fn full_config() {
        let config = parse(
            r#"
database: GeoLite2-City.mmdb
block_list:
  country: [TW]
  ip: 35.100.100.0
allow_list:
  allow_only: false
  country: US
  ip:
    - 120.100.100.0
"#,
        )
        .unwrap();

        assert_eq!(config.db_path, Path::new("/etc/g3gate/GeoLite2-City.mmdb"));
        let ip = IpAddr::from_str("35.100.100.0").unwrap();
        assert_eq!(config.rule.check("TW", None), AclAction::Forbid);
        assert_eq!(config.rule.check("US", Some(ip)), AclAction::Permit);
        assert_eq!(config.rule.check("SE", None), AclAction::Permit);
    }

    #[test]
    fn allow_only_config() {
        let config = parse(
            r#"
database: /usr/share/GeoIP/GeoLite2-City.mmdb
allow-list:
  allow-only: true
  country:
    - US
"#,
        )
        .unwrap();

        assert_eq!(
            config.db_path,
            Path::new("/usr/share/GeoIP/GeoLite2-City.mmdb")
        );
        assert_eq!(config.rule.check("US", None), AclAction::Permit);
        assert_eq!(config.rule.check("SE", None), AclAction::Forbid);
    }

    #[test]
    fn database_required() {
        assert!(
            parse(
                r#"
block_list:
  country: [TW]
"#
            )
            .is_err()
        );
    }

    #[test]
    fn invalid_keys() {
        assert!(parse("data_dir: /tmp").is_err());
        assert!(
            parse(
                r#"
database: a.mmdb
block_list:
  networks: [10.0.0.0/8]
"#
            )
            .is_err()
        );
    }

    #[test]
    fn invalid_ip_value() {
        assert!(
            parse(
                r#"
database: a.mmdb
block_list:
  ip: [10.0.0.0/8]
"#
            )
            .is_err()
        );
    }
}
