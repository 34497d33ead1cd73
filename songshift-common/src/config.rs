//! Bootstrap configuration loading and config file discovery
//!
//! The TOML file is the lowest-priority configuration tier. Every field is
//! optional so that command-line arguments and environment variables can fill
//! in whatever the file leaves out:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Name of the per-user configuration directory
const CONFIG_DIR_NAME: &str = "songshift";

/// Name of the configuration file inside the configuration directory
const CONFIG_FILE_NAME: &str = "config.toml";

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TomlConfig {
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Batch sizes, pacing and playlist selection
    #[serde(default)]
    pub transfer: TransferSection,

    /// Source catalog (Spotify) credentials and endpoints
    #[serde(default)]
    pub spotify: ServiceSection,

    /// Destination catalog (YouTube) credentials and endpoints
    #[serde(default)]
    pub youtube: ServiceSection,

    /// Session construction flags
    #[serde(default)]
    pub session: SessionSection,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// `[transfer]` table
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TransferSection {
    /// Tracks per destination search query
    pub search_batch_size: Option<usize>,
    /// Item ids per grouped destination insert
    pub upload_batch_size: Option<usize>,
    /// Fixed delay after every external batch call, in milliseconds
    pub pacing_ms: Option<u64>,
    /// Only transfer playlists with these names (empty = all)
    #[serde(default)]
    pub playlists: Vec<String>,
    /// Description written to created playlists; `{name}` and `{date}` are substituted
    pub description: Option<String>,
    /// Visibility of created playlists: private, unlisted or public
    pub privacy: Option<String>,
}

/// `[spotify]` / `[youtube]` tables
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ServiceSection {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    /// Pre-issued access token (used when no refresh token is configured)
    pub access_token: Option<String>,
    /// Long-lived refresh token exchanged for an access token at startup
    pub refresh_token: Option<String>,
    /// Override for the service API base URL
    pub api_base_url: Option<String>,
    /// Override for the OAuth token endpoint
    pub token_url: Option<String>,
}

/// `[session]` table
///
/// Both flags default to the secure behavior.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize)]
pub struct SessionSection {
    /// Permit plain `http://` API and token endpoints
    #[serde(default)]
    pub allow_insecure_transport: bool,
    /// Accept tokens whose granted scope lacks the required scope
    #[serde(default)]
    pub relax_token_scope: bool,
}

/// Default per-user configuration file path (`~/.config/songshift/config.toml` on Linux)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Load TOML configuration from an explicit path
///
/// # Errors
/// Returns `Error::Config` if the file cannot be read or parsed
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read TOML {} failed: {}", path.display(), e)))?;

    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML {} failed: {}", path.display(), e)))?;

    info!("Configuration loaded from {}", path.display());
    Ok(config)
}

/// Find the TOML file to load, if any
///
/// An explicitly requested file must exist. Without one, the default
/// per-user file is used when present.
pub fn locate_config_file(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
    if let Some(path) = explicit {
        if !path.try_exists()? {
            return Err(Error::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        return Ok(Some(path.to_path_buf()));
    }

    let Some(path) = default_config_path() else {
        return Ok(None);
    };
    Ok(path.try_exists()?.then_some(path))
}

/// Resolve and load the TOML tier
///
/// Returns the loaded configuration and the file it came from; built-in
/// defaults apply when no file is found.
pub fn resolve_toml_config(explicit: Option<&Path>) -> Result<(TomlConfig, Option<PathBuf>)> {
    match locate_config_file(explicit)? {
        Some(path) => Ok((load_toml_config(&path)?, Some(path))),
        None => {
            debug!("No config file found, using built-in defaults");
            Ok((TomlConfig::default(), None))
        }
    }
}

/// User-Agent header value for outbound API requests
pub fn get_user_agent() -> String {
    format!("songshift/{}", env!("CARGO_PKG_VERSION"))
}
