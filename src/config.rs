use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use thiserror::Error;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Clone, Debug)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub database_url: String,
    pub max_connections: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // No shape check here; a bad URL shows up when the pool connects.
        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let port = parse_or("PORT", lookup("PORT"), DEFAULT_PORT)?;
        let host = parse_or("HOST", lookup("HOST"), IpAddr::V4(Ipv4Addr::UNSPECIFIED))?;
        let max_connections = parse_or(
            "DATABASE_MAX_CONNECTIONS",
            lookup("DATABASE_MAX_CONNECTIONS"),
            DEFAULT_MAX_CONNECTIONS,
        )?;

        Ok(Self {
            host,
            port,
            database_url,
            max_connections,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn parse_or<T: std::str::FromStr>(
    name: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn database_url_is_required() {
        let err = Config::from_lookup(lookup(&[("PORT", "8080")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("DATABASE_URL"));
    }

    #[test]
    fn defaults_apply() {
        let config = Config::from_lookup(lookup(&[("DATABASE_URL", "sqlite://todos.db")])).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.addr().to_string(), "0.0.0.0:3000");
    }

    #[test]
    fn port_is_overridable() {
        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "sqlite://todos.db"),
            ("PORT", "8080"),
            ("HOST", "127.0.0.1"),
        ]))
        .unwrap();
        assert_eq!(config.addr().to_string(), "127.0.0.1:8080");
    }

    #[test]
    fn bad_port_is_rejected() {
        let err = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "sqlite://todos.db"),
            ("PORT", "http"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "PORT", .. }));
    }
}
