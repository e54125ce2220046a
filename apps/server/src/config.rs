//! # Server Configuration
//!
//! Deployment settings for the server process. Business settings (store
//! name, currency, tax rate, threshold) are not here; they live in the
//! database and are served by [`SettingsContext`](crate::state::SettingsContext).
//!
//! ## Load Order (later overrides earlier)
//! 1. Default values
//! 2. TOML file (`--config`, `LINUS_CONFIG`, or the platform config dir)
//! 3. `LINUS_*` environment variables
//! 4. Validation
//!
//! ## Example Config File
//! ```toml
//! [server]
//! bind_addr = "0.0.0.0"
//! port = 8080
//!
//! [database]
//! path = "/var/lib/linus/linus.db"
//! max_connections = 5
//!
//! [inventory]
//! stock_policy = "guarded"
//!
//! [poller]
//! interval_secs = 30
//!
//! [bootstrap]
//! admin_name = "Admin"
//! admin_password = "123"
//! ```

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use linus_db::StockPolicy;

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("No data directory available; set database.path")]
    NoDataDir,
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Sections
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpSettings {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for HttpSettings {
    fn default() -> Self {
        HttpSettings {
            bind_addr: default_bind_addr(),
            port: default_port(),
        }
    }
}

impl HttpSettings {
    pub fn socket_addr(&self) -> ConfigResult<SocketAddr> {
        format!("{}:{}", self.bind_addr, self.port)
            .parse()
            .map_err(|_| {
                ConfigError::Invalid(format!(
                    "server.bind_addr '{}' is not an IP address",
                    self.bind_addr
                ))
            })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite file. Defaults to `linus.db` in the platform data dir.
    #[serde(default)]
    pub path: Option<PathBuf>,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: None,
            max_connections: default_max_connections(),
        }
    }
}

impl DatabaseSettings {
    /// The configured path, or the platform default.
    ///
    /// - Linux: `~/.local/share/pos/linus.db`
    /// - macOS: `~/Library/Application Support/com.linus.pos/linus.db`
    /// - Windows: `%APPDATA%\linus\pos\data\linus.db`
    pub fn resolved_path(&self) -> ConfigResult<PathBuf> {
        if let Some(path) = &self.path {
            return Ok(path.clone());
        }
        directories::ProjectDirs::from("com", "linus", "pos")
            .map(|dirs| dirs.data_dir().join("linus.db"))
            .ok_or(ConfigError::NoDataDir)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InventorySettings {
    /// How a sale commit treats insufficient stock.
    #[serde(default)]
    pub stock_policy: StockPolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollerSettings {
    #[serde(default = "default_poll_interval")]
    pub interval_secs: u64,
}

fn default_poll_interval() -> u64 {
    30
}

impl Default for PollerSettings {
    fn default() -> Self {
        PollerSettings {
            interval_secs: default_poll_interval(),
        }
    }
}

impl PollerSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

/// Used only when the user table is empty at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BootstrapSettings {
    #[serde(default = "default_admin_name")]
    pub admin_name: String,

    #[serde(default = "default_admin_password")]
    pub admin_password: String,
}

fn default_admin_name() -> String {
    "Admin".to_string()
}

fn default_admin_password() -> String {
    "123".to_string()
}

impl Default for BootstrapSettings {
    fn default() -> Self {
        BootstrapSettings {
            admin_name: default_admin_name(),
            admin_password: default_admin_password(),
        }
    }
}

// =============================================================================
// Server Configuration
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: HttpSettings,

    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub inventory: InventorySettings,

    #[serde(default)]
    pub poller: PollerSettings,

    #[serde(default)]
    pub bootstrap: BootstrapSettings,
}

impl ServerConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// An explicit path (argument or `LINUS_CONFIG`) must exist. The
    /// platform default path is optional.
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let explicit = config_path.or_else(|| std::env::var_os("LINUS_CONFIG").map(PathBuf::from));

        let mut config = match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound(path));
                }
                Self::from_file(&path)?
            }
            None => match Self::default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                Some(path) => {
                    debug!(?path, "Config file not found, using defaults");
                    Self::default()
                }
                None => Self::default(),
            },
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    fn from_file(path: &Path) -> ConfigResult<Self> {
        info!(?path, "Loading server config from file");
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&contents)?)
    }

    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "linus", "pos")
            .map(|dirs| dirs.config_dir().join("server.toml"))
    }

    /// Applies `LINUS_*` overrides. Unparseable values are ignored with a
    /// warning.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup("LINUS_BIND_ADDR") {
            self.server.bind_addr = addr;
        }

        if let Some(port) = lookup("LINUS_PORT") {
            match port.parse::<u16>() {
                Ok(p) => {
                    debug!(port = p, "Overriding port from environment");
                    self.server.port = p;
                }
                Err(_) => warn!(value = %port, "Ignoring invalid LINUS_PORT"),
            }
        }

        if let Some(path) = lookup("LINUS_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = Some(PathBuf::from(path));
        }

        if let Some(max) = lookup("LINUS_DB_MAX_CONNECTIONS") {
            match max.parse::<u32>() {
                Ok(m) => self.database.max_connections = m,
                Err(_) => warn!(value = %max, "Ignoring invalid LINUS_DB_MAX_CONNECTIONS"),
            }
        }

        if let Some(policy) = lookup("LINUS_STOCK_POLICY") {
            match policy.to_lowercase().as_str() {
                "guarded" => self.inventory.stock_policy = StockPolicy::Guarded,
                "clamp" => self.inventory.stock_policy = StockPolicy::Clamp,
                _ => warn!(value = %policy, "Unknown stock policy in environment"),
            }
        }

        if let Some(secs) = lookup("LINUS_POLL_INTERVAL_SECS") {
            match secs.parse::<u64>() {
                Ok(s) => self.poller.interval_secs = s,
                Err(_) => warn!(value = %secs, "Ignoring invalid LINUS_POLL_INTERVAL_SECS"),
            }
        }

        if let Some(name) = lookup("LINUS_ADMIN_NAME") {
            self.bootstrap.admin_name = name;
        }

        if let Some(password) = lookup("LINUS_ADMIN_PASSWORD") {
            self.bootstrap.admin_password = password;
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        self.server.socket_addr()?;

        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be greater than 0".into(),
            ));
        }

        if self.poller.interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "poller.interval_secs must be greater than 0".into(),
            ));
        }

        if self.bootstrap.admin_password.is_empty() {
            return Err(ConfigError::Invalid(
                "bootstrap.admin_password must not be empty".into(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.poller.interval(), Duration::from_secs(30));
        assert_eq!(config.inventory.stock_policy, StockPolicy::Guarded);
        assert_eq!(config.bootstrap.admin_password, "123");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: ServerConfig = toml::from_str(
            r#"
            [server]
            port = 9000

            [inventory]
            stock_policy = "clamp"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.bind_addr, "0.0.0.0");
        assert_eq!(config.inventory.stock_policy, StockPolicy::Clamp);
        assert_eq!(config.poller.interval_secs, 30);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("LINUS_PORT", "7000"),
            ("LINUS_DB_PATH", "/tmp/pos.db"),
            ("LINUS_STOCK_POLICY", "CLAMP"),
            ("LINUS_POLL_INTERVAL_SECS", "not-a-number"),
        ]
        .into_iter()
        .collect();

        let mut config = ServerConfig::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.server.port, 7000);
        assert_eq!(config.database.path, Some(PathBuf::from("/tmp/pos.db")));
        assert_eq!(config.inventory.stock_policy, StockPolicy::Clamp);
        assert_eq!(config.poller.interval_secs, 30);
    }

    #[test]
    fn test_validation() {
        let mut config = ServerConfig::default();
        config.server.bind_addr = "localhost".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = ServerConfig::default();
        config.poller.interval_secs = 0;
        assert!(config.validate().is_err());

        let mut config = ServerConfig::default();
        config.bootstrap.admin_password = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let result = ServerConfig::load(Some(PathBuf::from("/nonexistent/linus/server.toml")));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_explicit_path_wins_over_default() {
        let config = DatabaseSettings {
            path: Some(PathBuf::from("shop.db")),
            ..Default::default()
        };
        assert_eq!(config.resolved_path().unwrap(), PathBuf::from("shop.db"));
    }
}
