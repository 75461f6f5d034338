//! # Configuration Management Module
//!
//! All runtime settings for the admin core live in one TOML file. Sections:
//!
//! - [`ServerConfig`] - server name, owning-thread tick cadence, map directory
//! - [`MenuConfig`] - page size and client display time for paged menus
//! - [`StorageConfig`] - where ban / kick / map-change records are kept
//! - [`AdminsConfig`] - path of the admin privilege roster
//! - [`LoggingConfig`] - log level and optional log / security log files
//!
//! ## Usage
//!
//! ```rust,no_run
//! use gsadmin::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?;
//!     println!("Server: {} (tick {}ms)", config.server.name, config.server.tick_ms);
//!     Ok(())
//! }
//! ```
//!
//! ## File Format
//!
//! ```toml
//! [server]
//! name = "GoldSrc Admin"
//! tick_ms = 50
//! maps_dir = "maps"
//! map_list = "directory"        # or "mapcycle"
//! mapcycle_file = "mapcycle.txt"
//! start_map = "crossfire"
//!
//! [menu]
//! items_per_page = 8
//! display_time_secs = 0
//!
//! [storage]
//! data_dir = "data"
//!
//! [admins]
//! file = "admins.toml"
//!
//! [logging]
//! level = "info"
//! ```

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tokio::fs;

use crate::menu::MAX_ITEMS_PER_PAGE;

/// Smallest accepted owning-thread tick.
pub const MIN_TICK_MS: u64 = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub menu: MenuConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub admins: AdminsConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub name: String,
    /// Interval (ms) at which completed background work is joined back on the owning thread.
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
    /// Directory scanned for `*.bsp` files by the `maps` command.
    pub maps_dir: String,
    /// Where `maps` takes its candidates from.
    #[serde(default)]
    pub map_list: MapListSource,
    /// Read when `map_list = "mapcycle"`.
    #[serde(default = "default_mapcycle_file")]
    pub mapcycle_file: String,
    /// Level loaded by the local console engine at startup.
    #[serde(default = "default_start_map")]
    pub start_map: String,
}

fn default_tick_ms() -> u64 {
    50
}

fn default_start_map() -> String {
    "crossfire".to_string()
}

fn default_mapcycle_file() -> String {
    "mapcycle.txt".to_string()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MapListSource {
    /// Every `*.bsp` in `maps_dir`.
    #[default]
    Directory,
    /// Lines of `mapcycle_file`.
    Mapcycle,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuConfig {
    /// Items per page, clamped to 1..=8 (keys 9 and 0 are reserved for back/next).
    pub items_per_page: usize,
    /// Seconds a menu stays on the client; 0 keeps it until answered.
    pub display_time_secs: u32,
}

impl Default for MenuConfig {
    fn default() -> Self {
        Self {
            items_per_page: MAX_ITEMS_PER_PAGE,
            display_time_secs: 0,
        }
    }
}

impl MenuConfig {
    pub fn display_time(&self) -> Option<Duration> {
        match self.display_time_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs as u64)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: String,
}

impl StorageConfig {
    /// Location of the sled record database.
    pub fn records_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join("records")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminsConfig {
    pub file: String,
}

impl Default for AdminsConfig {
    fn default() -> Self {
        Self {
            file: "admins.toml".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
    #[serde(default)]
    pub security_file: Option<String>,
}

impl Config {
    /// Load configuration from a file
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;

        config.validate()?;
        Ok(config)
    }

    /// Create a default configuration file
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.tick_ms < MIN_TICK_MS {
            return Err(anyhow!(
                "server.tick_ms must be at least {}ms (got {})",
                MIN_TICK_MS,
                self.server.tick_ms
            ));
        }
        if self.storage.data_dir.trim().is_empty() {
            return Err(anyhow!("storage.data_dir must not be empty"));
        }
        if self.menu.items_per_page == 0 || self.menu.items_per_page > MAX_ITEMS_PER_PAGE {
            log::warn!(
                "menu.items_per_page={} out of range, clamping to 1..={}",
                self.menu.items_per_page,
                MAX_ITEMS_PER_PAGE
            );
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.server.tick_ms.max(MIN_TICK_MS))
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                name: "GoldSrc Admin".to_string(),
                tick_ms: default_tick_ms(),
                maps_dir: "maps".to_string(),
                map_list: MapListSource::Directory,
                mapcycle_file: default_mapcycle_file(),
                start_map: default_start_map(),
            },
            menu: MenuConfig::default(),
            storage: StorageConfig {
                data_dir: "./data".to_string(),
            },
            admins: AdminsConfig::default(),
            logging: LoggingConfig {
                level: "info".to_string(),
                file: Some("gsadmin.log".to_string()),
                security_file: Some("gsadmin-security.log".to_string()),
            },
        }
    }
}
