use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::docker::ResourceType;

/// Auto-refresh period: `off` or a number of seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interval {
    Off,
    Every(u64),
}

impl Interval {
    pub fn as_duration(self) -> Option<Duration> {
        match self {
            Interval::Off => None,
            Interval::Every(secs) => Some(Duration::from_secs(secs)),
        }
    }
}

impl Serialize for Interval {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Interval::Off => serializer.serialize_str("off"),
            Interval::Every(n) => serializer.serialize_u64(*n),
        }
    }
}

impl<'de> Deserialize<'de> for Interval {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct IntervalVisitor;

        impl<'de> Visitor<'de> for IntervalVisitor {
            type Value = Interval;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("\"off\" or a positive number of seconds")
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> Result<Interval, E> {
                if value == 0 {
                    return Ok(Interval::Off);
                }
                Ok(Interval::Every(value))
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> Result<Interval, E> {
                if value < 0 {
                    return Err(E::custom("interval must not be negative"));
                }
                self.visit_u64(value as u64)
            }

            fn visit_bool<E: de::Error>(self, value: bool) -> Result<Interval, E> {
                // `auto_refresh: false` reads as off.
                if value {
                    Err(E::custom("use a number of seconds to enable auto-refresh"))
                } else {
                    Ok(Interval::Off)
                }
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<Interval, E> {
                if value.eq_ignore_ascii_case("off") {
                    Ok(Interval::Off)
                } else {
                    value
                        .parse::<u64>()
                        .map_err(|_| E::custom("interval must be \"off\" or a number of seconds"))
                        .and_then(|n| self.visit_u64(n))
                }
            }
        }

        deserializer.deserialize_any(IntervalVisitor)
    }
}

/// Per-kind cache lifetimes in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheTtl {
    pub containers: u64,
    pub images: u64,
    pub networks: u64,
    pub volumes: u64,
}

impl Default for CacheTtl {
    fn default() -> Self {
        Self {
            containers: 15,
            images: 60,
            networks: 120,
            volumes: 120,
        }
    }
}

impl CacheTtl {
    pub fn for_kind(&self, kind: ResourceType) -> Duration {
        Duration::from_secs(match kind {
            ResourceType::Container => self.containers,
            ResourceType::Image => self.images,
            ResourceType::Network => self.networks,
            ResourceType::Volume => self.volumes,
        })
    }
}

/// A user palette: a built-in base plus colour overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomTheme {
    pub base: String,
    pub colors: BTreeMap<String, String>,
}

impl Default for CustomTheme {
    fn default() -> Self {
        Self {
            base: "dark".to_string(),
            colors: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Docker command line, e.g. `docker`, `sudo -n docker` or `podman`.
    pub docker_binary: String,
    pub theme: String,
    pub themes: BTreeMap<String, CustomTheme>,
    pub cache_ttl: CacheTtl,
    pub auto_refresh: Interval,
    pub log_tail: usize,
    pub notification_timeout_ms: u64,
    pub max_notifications: usize,
    pub pull_timeout_secs: u64,
    /// Deadline for every docker command except `pull`.
    pub command_timeout_secs: u64,
    pub log_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            docker_binary: "docker".to_string(),
            theme: "light".to_string(),
            themes: BTreeMap::new(),
            cache_ttl: CacheTtl::default(),
            auto_refresh: Interval::Every(30),
            log_tail: 200,
            notification_timeout_ms: 5000,
            max_notifications: 5,
            pull_timeout_secs: 600,
            command_timeout_secs: 60,
            log_dir: None,
        }
    }
}

impl Config {
    pub fn notification_timeout(&self) -> Duration {
        Duration::from_millis(self.notification_timeout_ms)
    }

    pub fn pull_timeout(&self) -> Duration {
        Duration::from_secs(self.pull_timeout_secs)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_yaml_gives_defaults() {
        let cfg: Config = serde_yaml::from_str("{}").unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.cache_ttl.for_kind(ResourceType::Image), Duration::from_secs(60));
    }

    #[test]
    fn partial_cache_ttl_keeps_other_defaults() {
        let cfg: Config = serde_yaml::from_str("cache_ttl:\n  containers: 5\n").unwrap();
        assert_eq!(cfg.cache_ttl.containers, 5);
        assert_eq!(cfg.cache_ttl.volumes, 120);
    }

    #[test]
    fn command_timeout_defaults_and_floors_at_one_second() {
        assert_eq!(Config::default().command_timeout(), Duration::from_secs(60));
        let cfg: Config = serde_yaml::from_str("command_timeout_secs: 0\n").unwrap();
        assert_eq!(cfg.command_timeout(), Duration::from_secs(1));
    }

    #[test]
    fn interval_accepts_off_and_seconds() {
        let parse = |s: &str| serde_yaml::from_str::<Interval>(s);
        assert_eq!(parse("off").unwrap(), Interval::Off);
        assert_eq!(parse("\"OFF\"").unwrap(), Interval::Off);
        assert_eq!(parse("0").unwrap(), Interval::Off);
        assert_eq!(parse("45").unwrap(), Interval::Every(45));
        assert_eq!(parse("\"10\"").unwrap(), Interval::Every(10));
        assert!(parse("-3").is_err());
        assert!(parse("soon").is_err());
        assert_eq!(Interval::Every(2).as_duration(), Some(Duration::from_secs(2)));
        assert_eq!(Interval::Off.as_duration(), None);
    }

    #[test]
    fn custom_theme_section() {
        let yaml = "theme: ember\nthemes:\n  ember:\n    colors:\n      accent: \"#ff8800\"\n";
        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        let ember = &cfg.themes["ember"];
        assert_eq!(ember.base, "dark");
        assert_eq!(ember.colors["accent"], "#ff8800");
    }
}
