use std::{
    net::{IpAddr, Ipv4Addr},
    num::NonZeroUsize,
};

use crate::storage::DEFAULT_CAPACITY;

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: '{value}'")]
    InvalidValue { name: &'static str, value: String },
}

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: IpAddr,
    /// Port to bind, also shown on the dashboard as the webhook URL.
    pub port: u16,
    /// Maximum number of webhooks kept in memory.
    pub capacity: NonZeroUsize,
    pub max_body_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            capacity: NonZeroUsize::new(DEFAULT_CAPACITY).unwrap_or(NonZeroUsize::MIN),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl Config {
    /// Loads configuration from `HOST`, `PORT`, `WEBHOOK_CAPACITY` and
    /// `MAX_BODY_BYTES`, using defaults for unset variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            host: parse_var(&lookup, "HOST")?.unwrap_or(defaults.host),
            port: parse_var(&lookup, "PORT")?.unwrap_or(defaults.port),
            capacity: parse_var(&lookup, "WEBHOOK_CAPACITY")?.unwrap_or(defaults.capacity),
            max_body_bytes: parse_var(&lookup, "MAX_BODY_BYTES")?
                .unwrap_or(defaults.max_body_bytes),
        })
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(name) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { name, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.port, 5000);
        assert_eq!(config.capacity.get(), 50);
        assert_eq!(config.host.to_string(), "0.0.0.0");
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "9999"),
            ("WEBHOOK_CAPACITY", "10"),
            ("MAX_BODY_BYTES", "2048"),
        ])
        .unwrap();
        assert_eq!(config.host.to_string(), "127.0.0.1");
        assert_eq!(config.port, 9999);
        assert_eq!(config.capacity.get(), 10);
        assert_eq!(config.max_body_bytes, 2048);
    }

    #[test]
    fn test_invalid_values() {
        for (name, value) in [
            ("PORT", "not-a-port"),
            ("PORT", "70000"),
            ("WEBHOOK_CAPACITY", "0"),
            ("HOST", "localhost:80"),
        ] {
            let err = load(&[(name, value)]).unwrap_err();
            assert!(
                matches!(&err, ConfigError::InvalidValue { name: n, .. } if *n == name),
                "{err}"
            );
        }
    }
}
