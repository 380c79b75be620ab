use crate::{env_optional, env_or_default, ConfigError, FromEnv};
use std::net::Ipv4Addr;

/// Port variable set by the Azure Functions host for custom handlers
pub const FUNCTIONS_PORT_VAR: &str = "FUNCTIONS_CUSTOMHANDLER_PORT";

/// Server configuration for HTTP APIs
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Maximum accepted request body, in bytes (image uploads)
    pub body_limit: usize,
}

impl ServerConfig {
    pub fn new(host: String, port: u16) -> Self {
        Self {
            host,
            port,
            ..Self::default()
        }
    }

    /// Get the server address as "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_port(key: &str, raw: &str) -> Result<u16, ConfigError> {
    raw.parse().map_err(|e| ConfigError::ParseError {
        key: key.to_string(),
        details: format!("{}", e),
    })
}

impl FromEnv for ServerConfig {
    /// Reads from environment variables with sensible defaults:
    /// - HOST: defaults to 0.0.0.0
    /// - FUNCTIONS_CUSTOMHANDLER_PORT, then PORT: defaults to 8080
    /// - MAX_BODY_BYTES: defaults to 20 MiB
    fn from_env() -> Result<Self, ConfigError> {
        let host = env_or_default("HOST", &Ipv4Addr::UNSPECIFIED.to_string());

        let port = match env_optional(FUNCTIONS_PORT_VAR) {
            Some(raw) => parse_port(FUNCTIONS_PORT_VAR, &raw)?,
            None => parse_port("PORT", &env_or_default("PORT", "8080"))?,
        };

        let body_limit = crate::env_parse_or("MAX_BODY_BYTES", 20 * 1024 * 1024)?;

        Ok(Self {
            host,
            port,
            body_limit,
        })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: Ipv4Addr::UNSPECIFIED.to_string(),
            port: 8080,
            body_limit: 20 * 1024 * 1024,
        }
    }
}
