// Configuration Management Module
// Handles shop.toml loading, defaults, environment overrides and validation

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use tracing::{info, warn};

/// Environment variable that overrides the listening port
pub const PORT_ENV: &str = "PORT";

/// Main Secure Shop configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShopConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub shop: ShopSettings,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopSettings {
    /// Largest quantity the secure shops accept in one add-to-cart
    #[serde(default = "default_max_quantity")]
    pub secure_max_quantity: u32,

    /// Simulated payment gateway latency before a deferred order completes
    #[serde(default = "default_payment_delay")]
    pub payment_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `json` or `pretty`
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_port() -> u16 { 8080 }
fn default_bind_addr() -> String { "0.0.0.0".to_string() }
fn default_max_quantity() -> u32 { 10 }
fn default_payment_delay() -> u64 { 3000 }
fn default_log_format() -> String { "json".to_string() }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind_addr: default_bind_addr(),
        }
    }
}

impl Default for ShopSettings {
    fn default() -> Self {
        Self {
            secure_max_quantity: default_max_quantity(),
            payment_delay_ms: default_payment_delay(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: default_log_format(),
        }
    }
}

impl ServerConfig {
    /// Socket address to listen on
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.bind_addr, self.port)
            .parse()
            .with_context(|| format!("Invalid bind address {}:{}", self.bind_addr, self.port))
    }
}

impl ShopConfig {
    /// Load configuration from file or use defaults, then apply environment overrides
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::from_file(path)?;
        config.apply_env_overrides(std::env::var(PORT_ENV).ok().as_deref())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse the file if it exists, defaults otherwise. No validation.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if path.exists() {
            info!("Loading configuration from {}", path.display());
            let contents = std::fs::read_to_string(path)
                .context("Failed to read configuration file")?;

            toml::from_str(&contents).context("Failed to parse configuration file")
        } else {
            warn!("Configuration file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Apply the value of the `PORT` variable, if set
    pub fn apply_env_overrides(&mut self, port: Option<&str>) -> Result<()> {
        if let Some(port) = port {
            self.server.port = port
                .trim()
                .parse()
                .with_context(|| format!("{PORT_ENV} must be a port number, got {port:?}"))?;
            info!(port = self.server.port, "Port overridden from environment");
        }
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            anyhow::bail!("Server port cannot be 0");
        }

        self.server.socket_addr()?;

        if self.shop.secure_max_quantity == 0 {
            anyhow::bail!("secure_max_quantity must be at least 1");
        }

        match self.logging.format.as_str() {
            "json" | "pretty" => {}
            other => anyhow::bail!("Unknown log format {other:?}, expected \"json\" or \"pretty\""),
        }

        Ok(())
    }
}
