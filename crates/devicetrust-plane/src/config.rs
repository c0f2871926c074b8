//! Service configuration from environment variables
//!
//! | Variable                        | Default   |
//! |---------------------------------|-----------|
//! | `DEVICE_TRUST_BIND_ADDR`        | `0.0.0.0` |
//! | `DEVICE_TRUST_PORT`             | `3000`    |
//! | `DEVICE_TRUST_LOG_LEVEL`        | `info`    |
//! | `DEVICE_TRUST_CANONICALIZATION` | `deep`    |
//! | `DEVICE_TRUST_DUPLICATE_POLICY` | `overwrite` |

use devicetrust_core::{canonical::ParsePolicyError, CanonicalizationPolicy};
use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use thiserror::Error;
use tracing::Level;

use crate::registry::{DuplicatePolicy, ParseDuplicatePolicyError};

pub const ENV_BIND_ADDR: &str = "DEVICE_TRUST_BIND_ADDR";
pub const ENV_PORT: &str = "DEVICE_TRUST_PORT";
pub const ENV_LOG_LEVEL: &str = "DEVICE_TRUST_LOG_LEVEL";
pub const ENV_CANONICALIZATION: &str = "DEVICE_TRUST_CANONICALIZATION";
pub const ENV_DUPLICATE_POLICY: &str = "DEVICE_TRUST_DUPLICATE_POLICY";

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("DEVICE_TRUST_BIND_ADDR must be an IP address, got '{0}'")]
    InvalidBindAddr(String),

    #[error("DEVICE_TRUST_PORT must be a valid port number, got '{0}'")]
    InvalidPort(String),

    #[error("DEVICE_TRUST_LOG_LEVEL must be a tracing level, got '{0}'")]
    InvalidLogLevel(String),

    #[error("DEVICE_TRUST_CANONICALIZATION: {0}")]
    InvalidCanonicalization(#[from] ParsePolicyError),

    #[error("DEVICE_TRUST_DUPLICATE_POLICY: {0}")]
    InvalidDuplicatePolicy(#[from] ParseDuplicatePolicyError),
}

/// Device trust plane configuration
#[derive(Debug, Clone)]
pub struct PlaneConfig {
    pub bind_addr: IpAddr,
    pub port: u16,
    pub log_level: Level,
    /// Canonicalization applied to every verified payload
    pub canonicalization: CanonicalizationPolicy,
    /// Behaviour on re-registration of a known device id
    pub duplicate_policy: DuplicatePolicy,
}

impl Default for PlaneConfig {
    fn default() -> Self {
        Self {
            bind_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 3000,
            log_level: Level::INFO,
            canonicalization: CanonicalizationPolicy::default(),
            duplicate_policy: DuplicatePolicy::default(),
        }
    }
}

impl PlaneConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read configuration through `lookup`; unset variables take defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_BIND_ADDR) {
            config.bind_addr = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidBindAddr(raw.clone()))?;
        }
        if let Some(raw) = lookup(ENV_PORT) {
            config.port = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidPort(raw.clone()))?;
        }
        if let Some(raw) = lookup(ENV_LOG_LEVEL) {
            config.log_level = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidLogLevel(raw.clone()))?;
        }
        if let Some(raw) = lookup(ENV_CANONICALIZATION) {
            config.canonicalization = raw.parse()?;
        }
        if let Some(raw) = lookup(ENV_DUPLICATE_POLICY) {
            config.duplicate_policy = raw.parse()?;
        }

        Ok(config)
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }
}
