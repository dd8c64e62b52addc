//! Configuration handling for db_schema_sync

use serde::{Deserialize, Serialize};
use sqlx::mysql::MySqlConnectOptions;
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::time::Duration;

use crate::error::{Error, Result};

/// Load configuration from a YAML file
///
/// Both `new_db` and `old_db` must be present. Nothing is returned unless the
/// whole document parses.
pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
    let path = path.as_ref();
    let display = path.display().to_string();

    let config_str = fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => Error::ConfigNotFound(display.clone()),
        _ => Error::IoError(e),
    })?;

    parse_config(&config_str, &display)
}

/// Parse configuration from YAML text; `origin` names the source in errors.
pub fn parse_config(config_str: &str, origin: &str) -> Result<Config> {
    serde_yaml::from_str(config_str).map_err(|e| Error::ConfigInvalid {
        path: origin.to_string(),
        reason: e.to_string(),
    })
}

/// Represents the complete db_schema_sync configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    pub new_db: ConnectionProfile,
    pub old_db: ConnectionProfile,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub dump: DumpConfig,
    pub logging: Option<LoggingConfig>,
}

/// Connection parameters for one of the two databases
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ConnectionProfile {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub user: String,
    #[serde(default)]
    pub password: String,
    pub db: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_port() -> u16 {
    3306
}

fn default_timeout_seconds() -> u64 {
    30
}

impl ConnectionProfile {
    /// sqlx connect options for this profile
    pub fn connect_options(&self) -> MySqlConnectOptions {
        MySqlConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.db)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// `user@host:port/db`, safe to log
    pub fn display_name(&self) -> String {
        format!("{}@{}:{}/{}", self.user, self.host, self.port, self.db)
    }
}

impl fmt::Debug for ConnectionProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionProfile")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"********")
            .field("db", &self.db)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

/// Where the dated run directories are written
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OutputConfig {
    #[serde(default = "default_output_directory")]
    pub directory: String,
}

fn default_output_directory() -> String {
    "sql".to_string()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_directory(),
        }
    }
}

/// External dump utility used to extract `CREATE TABLE` statements
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DumpConfig {
    #[serde(default = "default_dump_binary")]
    pub binary: String,
    #[serde(default)]
    pub extra_args: Vec<String>,
}

fn default_dump_binary() -> String {
    "mysqldump".to_string()
}

impl Default for DumpConfig {
    fn default() -> Self {
        Self {
            binary: default_dump_binary(),
            extra_args: Vec::new(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    pub file: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
        }
    }
}
