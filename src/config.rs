// Connection configuration: defaults, environment overrides, JSON persistence

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::helpers::uri::database_from_uri;

#[cfg(debug_assertions)]
const APP_NAME: &str = "mongo-facade-dev";

#[cfg(not(debug_assertions))]
const APP_NAME: &str = "mongo-facade";

const CONFIG_FILE: &str = "connection.json";

pub const DEFAULT_URI: &str = "mongodb://localhost:27017";
pub const DEFAULT_DATABASE: &str = "test";

/// Settings for a `ConnectionManager`.
///
/// Every field has a default, so a partial JSON file or an empty environment is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    pub uri: String,
    /// Database used by stores and raw collection access.
    pub database: String,
    pub app_name: Option<String>,
    pub connect_timeout_ms: u64,
    pub server_selection_timeout_ms: u64,
    /// Connection attempts made by `connect()` before the last error is returned.
    pub max_connect_attempts: u32,
    /// Fixed delay between connection attempts.
    pub retry_delay_ms: u64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            uri: DEFAULT_URI.to_string(),
            database: DEFAULT_DATABASE.to_string(),
            app_name: None,
            connect_timeout_ms: 10_000,
            server_selection_timeout_ms: 30_000,
            max_connect_attempts: 1,
            retry_delay_ms: 1_000,
        }
    }
}

impl ConnectionConfig {
    /// Config for `uri`, taking the database from the URI path when it names one.
    pub fn new(uri: impl Into<String>) -> Self {
        let uri = uri.into();
        let database = database_from_uri(&uri).unwrap_or_else(|| DEFAULT_DATABASE.to_string());
        Self { uri, database, ..Self::default() }
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    pub fn with_retry(mut self, max_connect_attempts: u32, retry_delay: Duration) -> Self {
        self.max_connect_attempts = max_connect_attempts;
        // Saturate delays beyond u64 milliseconds instead of wrapping.
        self.retry_delay_ms = u64::try_from(retry_delay.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn server_selection_timeout(&self) -> Duration {
        Duration::from_millis(self.server_selection_timeout_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Build a config from `MONGODB_*` environment variables over the defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source (environment, map, ...).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = match lookup("MONGODB_URI") {
            Some(uri) => Self::new(uri),
            None => Self::default(),
        };

        if let Some(database) = lookup("MONGODB_DATABASE") {
            config.database = database;
        }
        if let Some(app_name) = lookup("MONGODB_APP_NAME") {
            config.app_name = Some(app_name);
        }
        if let Some(raw) = lookup("MONGODB_CONNECT_TIMEOUT_MS") {
            config.connect_timeout_ms =
                raw.parse().with_context(|| format!("Invalid MONGODB_CONNECT_TIMEOUT_MS: {raw}"))?;
        }
        if let Some(raw) = lookup("MONGODB_MAX_CONNECT_ATTEMPTS") {
            config.max_connect_attempts = raw
                .parse()
                .with_context(|| format!("Invalid MONGODB_MAX_CONNECT_ATTEMPTS: {raw}"))?;
        }
        if let Some(raw) = lookup("MONGODB_RETRY_DELAY_MS") {
            config.retry_delay_ms =
                raw.parse().with_context(|| format!("Invalid MONGODB_RETRY_DELAY_MS: {raw}"))?;
        }

        Ok(config)
    }

    /// Platform-specific location of the persisted config file
    pub fn default_path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|p| p.join(APP_NAME).join(CONFIG_FILE))
            .context("Could not determine config directory")
    }

    /// Load a config from a JSON file. Missing file yields `None`.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let data = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let config: Self = serde_json::from_str(&data)
            .with_context(|| format!("Failed to deserialize {}", path.display()))?;

        Ok(Some(config))
    }

    /// Save the config as JSON (atomic via temp + rename).
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent()
            && !dir.as_os_str().is_empty()
            && !dir.exists()
        {
            fs::create_dir_all(dir).context("Failed to create config directory")?;
        }

        let json = serde_json::to_string_pretty(self)
            .with_context(|| format!("Failed to serialize {}", path.display()))?;

        atomic_write(path, json.as_bytes())
            .with_context(|| format!("Failed to write {}", path.display()))?;

        Ok(())
    }
}

fn atomic_write(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    std::io::Write::write_all(&mut tmp, data)?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
