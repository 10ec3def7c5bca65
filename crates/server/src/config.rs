//! Server configuration loaded from the environment

use std::net::SocketAddr;

use thiserror::Error;
use topology::{SelectionStrategy, TopologyConfig};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
    #[error("Invalid listen address {0}")]
    InvalidAddress(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Allow any origin; meant for local dashboards
    pub cors_permissive: bool,
    pub topology: TopologyConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            cors_permissive: false,
            topology: TopologyConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Read `TOPOLOGY_HOST`, `TOPOLOGY_PORT`, `TOPOLOGY_PATH_SELECTION` and
    /// `TOPOLOGY_CORS_PERMISSIVE`, falling back to defaults for unset keys
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(host) = lookup("TOPOLOGY_HOST") {
            config.host = host.trim().to_string();
        }

        if let Some(port) = lookup("TOPOLOGY_PORT") {
            config.port = port.trim().parse::<u16>().map_err(|_| ConfigError::InvalidValue {
                key: "TOPOLOGY_PORT",
                value: port.clone(),
            })?;
        }

        if let Some(selection) = lookup("TOPOLOGY_PATH_SELECTION") {
            let strategy =
                SelectionStrategy::parse(&selection).ok_or_else(|| ConfigError::InvalidValue {
                    key: "TOPOLOGY_PATH_SELECTION",
                    value: selection.clone(),
                })?;
            config.topology = config.topology.with_selection(strategy);
        }

        if let Some(cors) = lookup("TOPOLOGY_CORS_PERMISSIVE") {
            config.cors_permissive =
                cors.trim().parse::<bool>().map_err(|_| ConfigError::InvalidValue {
                    key: "TOPOLOGY_CORS_PERMISSIVE",
                    value: cors.clone(),
                })?;
        }

        Ok(config)
    }

    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| ConfigError::InvalidAddress(format!("{}:{}", self.host, self.port)))
    }
}
