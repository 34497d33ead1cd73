//! Configuration resolution for songshift
//!
//! Resolves every setting with CLI → ENV → TOML → default priority. The TOML
//! tier is loaded by [`songshift_common::config`]; this module merges it with
//! the other tiers and validates the result.

use crate::auth::{Credentials, SessionOptions, GOOGLE_TOKEN_URL, SPOTIFY_TOKEN_URL};
use crate::clients::spotify::SPOTIFY_API_URL;
use crate::clients::youtube::{MAX_SEARCH_RESULTS, YOUTUBE_API_URL};
use crate::services::destination_writer::DEFAULT_DESCRIPTION_TEMPLATE;
use crate::services::{DEFAULT_PACING_DELAY, DEFAULT_SEARCH_BATCH_SIZE, DEFAULT_UPLOAD_BATCH_SIZE};
use crate::types::Privacy;
use songshift_common::config::{ServiceSection, TomlConfig};
use songshift_common::{Error, Result};
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

/// Environment variable prefix
const ENV_PREFIX: &str = "SONGSHIFT";

/// Overrides supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub search_batch_size: Option<usize>,
    pub upload_batch_size: Option<usize>,
    pub pacing_ms: Option<u64>,
    pub playlists: Vec<String>,
    pub dry_run: bool,
    pub log_level: Option<String>,
}

/// Endpoints and credentials for one catalog service
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub credentials: Credentials,
    pub api_base_url: String,
    pub token_url: String,
}

/// Fully resolved settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub search_batch_size: usize,
    pub upload_batch_size: usize,
    pub pacing: Duration,
    /// Playlist names to transfer (empty = all)
    pub playlists: Vec<String>,
    pub description_template: String,
    pub privacy: Privacy,
    pub log_level: String,
    pub dry_run: bool,
    pub spotify: ServiceSettings,
    pub youtube: ServiceSettings,
    pub session: SessionOptions,
}

impl Settings {
    /// Resolve settings from CLI overrides, the process environment and TOML
    pub fn resolve(cli: &CliOverrides, toml: &TomlConfig) -> Result<Self> {
        Self::resolve_with_env(cli, toml, |key| std::env::var(key).ok())
    }

    /// Resolve settings with an explicit environment lookup
    pub fn resolve_with_env<E>(cli: &CliOverrides, toml: &TomlConfig, env: E) -> Result<Self>
    where
        E: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            env(&format!("{}_{}", ENV_PREFIX, name)).filter(|v| !v.trim().is_empty())
        };

        let search_batch_size = cli
            .search_batch_size
            .or(parse_env(&var, "SEARCH_BATCH_SIZE")?)
            .or(toml.transfer.search_batch_size)
            .unwrap_or(DEFAULT_SEARCH_BATCH_SIZE);
        let upload_batch_size = cli
            .upload_batch_size
            .or(parse_env(&var, "UPLOAD_BATCH_SIZE")?)
            .or(toml.transfer.upload_batch_size)
            .unwrap_or(DEFAULT_UPLOAD_BATCH_SIZE);
        let pacing = cli
            .pacing_ms
            .or(parse_env(&var, "PACING_MS")?)
            .or(toml.transfer.pacing_ms)
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_PACING_DELAY);

        let playlists = if !cli.playlists.is_empty() {
            cli.playlists.clone()
        } else if let Some(list) = var("PLAYLISTS") {
            list.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        } else {
            toml.transfer.playlists.clone()
        };

        let description_template = var("DESCRIPTION")
            .or_else(|| toml.transfer.description.clone())
            .unwrap_or_else(|| DEFAULT_DESCRIPTION_TEMPLATE.to_string());

        let privacy = match var("PRIVACY").or_else(|| toml.transfer.privacy.clone()) {
            Some(value) => Privacy::from_str(&value).map_err(Error::Config)?,
            None => Privacy::default(),
        };

        let log_level = cli
            .log_level
            .clone()
            .or_else(|| var("LOG_LEVEL"))
            .unwrap_or_else(|| toml.logging.level.clone());

        let session = SessionOptions {
            allow_insecure_transport: parse_flag(&var, "ALLOW_INSECURE_TRANSPORT")?
                .unwrap_or(toml.session.allow_insecure_transport),
            relax_token_scope: parse_flag(&var, "RELAX_TOKEN_SCOPE")?
                .unwrap_or(toml.session.relax_token_scope),
        };

        let settings = Self {
            search_batch_size: validate_search_batch_size(search_batch_size)?,
            upload_batch_size: validate_batch_size("upload_batch_size", upload_batch_size)?,
            pacing,
            playlists,
            description_template,
            privacy,
            log_level,
            dry_run: cli.dry_run,
            spotify: service_settings(&var, "SPOTIFY", &toml.spotify, SPOTIFY_API_URL, SPOTIFY_TOKEN_URL),
            youtube: service_settings(&var, "YOUTUBE", &toml.youtube, YOUTUBE_API_URL, GOOGLE_TOKEN_URL),
            session,
        };

        Ok(settings)
    }
}

fn parse_env<V, T>(var: &V, name: &str) -> Result<Option<T>>
where
    V: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    var(name)
        .map(|raw| {
            raw.trim().parse::<T>().map_err(|e| {
                Error::Config(format!("{}_{}={:?} is invalid: {}", ENV_PREFIX, name, raw, e))
            })
        })
        .transpose()
}

fn parse_flag<V>(var: &V, name: &str) -> Result<Option<bool>>
where
    V: Fn(&str) -> Option<String>,
{
    match var(name).map(|v| v.trim().to_ascii_lowercase()) {
        None => Ok(None),
        Some(v) if matches!(v.as_str(), "1" | "true" | "yes" | "on") => Ok(Some(true)),
        Some(v) if matches!(v.as_str(), "0" | "false" | "no" | "off") => Ok(Some(false)),
        Some(v) => Err(Error::Config(format!(
            "{}_{}={:?} is not a boolean",
            ENV_PREFIX, name, v
        ))),
    }
}

fn service_settings<V>(
    var: &V,
    service: &str,
    section: &ServiceSection,
    default_api: &str,
    default_token: &str,
) -> ServiceSettings
where
    V: Fn(&str) -> Option<String>,
{
    let pick = |key: &str, toml_value: &Option<String>| {
        var(&format!("{}_{}", service, key)).or_else(|| toml_value.clone())
    };

    ServiceSettings {
        credentials: Credentials {
            client_id: pick("CLIENT_ID", &section.client_id),
            client_secret: pick("CLIENT_SECRET", &section.client_secret),
            access_token: pick("ACCESS_TOKEN", &section.access_token),
            refresh_token: pick("REFRESH_TOKEN", &section.refresh_token),
        },
        api_base_url: pick("API_BASE_URL", &section.api_base_url)
            .unwrap_or_else(|| default_api.to_string()),
        token_url: pick("TOKEN_URL", &section.token_url)
            .unwrap_or_else(|| default_token.to_string()),
    }
}

fn validate_batch_size(name: &str, value: usize) -> Result<usize> {
    if value == 0 {
        return Err(Error::Config(format!("{} must be at least 1", name)));
    }
    Ok(value)
}

/// The search endpoint returns at most 50 results per call
fn validate_search_batch_size(value: usize) -> Result<usize> {
    let value = validate_batch_size("search_batch_size", value)?;
    if value > MAX_SEARCH_RESULTS {
        warn!(
            requested = value,
            max = MAX_SEARCH_RESULTS,
            "search_batch_size exceeds search result cap, clamping"
        );
        return Ok(MAX_SEARCH_RESULTS);
    }
    Ok(value)
}
