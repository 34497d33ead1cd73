//! Session construction
//!
//! Interactive consent flows are out of scope: sessions are built from
//! credentials supplied by configuration. A refresh token is exchanged for an
//! access token through the provider's OAuth2 token endpoint; otherwise a
//! pre-issued access token is used as-is. Each session is verified with one
//! cheap authenticated call before the transfer starts.
//!
//! Transport and scope relaxations are explicit [`SessionOptions`] and default
//! to the secure behavior.

use crate::clients::{build_http_client, send_json, SpotifyClient, YouTubeClient};
use crate::config::ServiceSettings;
use crate::types::CatalogError;
use reqwest::Client;
use serde::Deserialize;
use songshift_common::config::SessionSection;
use std::fmt;
use thiserror::Error;
use tracing::{info, warn};

/// Spotify OAuth2 token endpoint
pub const SPOTIFY_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";

/// Google OAuth2 token endpoint
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Scopes that allow reading private playlists
const SPOTIFY_SCOPES: &[&str] = &["playlist-read-private"];

/// Scopes that allow managing playlists
const YOUTUBE_SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/youtube",
    "https://www.googleapis.com/auth/youtube.force-ssl",
];

/// Session construction error
#[derive(Debug, Error)]
pub enum AuthError {
    /// Plain-http endpoint while insecure transport is not allowed
    #[error("Refusing insecure transport to {0} (allow_insecure_transport is off)")]
    InsecureTransport(String),

    /// Neither an access token nor a usable refresh token is configured
    #[error("Missing {0} credentials: configure an access token, or a refresh token with client id and secret")]
    MissingCredentials(&'static str),

    /// Token endpoint rejected the exchange
    #[error("{service} token exchange failed: {source}")]
    TokenExchange {
        service: &'static str,
        #[source]
        source: CatalogError,
    },

    /// Granted scope does not cover what the transfer needs
    #[error("{service} token lacks required scope {required} (granted: {granted})")]
    ScopeMismatch {
        service: &'static str,
        required: String,
        granted: String,
    },

    /// Authenticated verification call failed
    #[error("{service} session verification failed: {source}")]
    Verification {
        service: &'static str,
        #[source]
        source: CatalogError,
    },

    /// HTTP client could not be constructed
    #[error("HTTP client error: {0}")]
    Client(String),
}

/// Explicit session construction flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionOptions {
    /// Permit plain `http://` API and token endpoints
    pub allow_insecure_transport: bool,
    /// Accept tokens whose granted scope lacks the required scope
    pub relax_token_scope: bool,
}

impl From<SessionSection> for SessionOptions {
    fn from(section: SessionSection) -> Self {
        Self {
            allow_insecure_transport: section.allow_insecure_transport,
            relax_token_scope: section.relax_token_scope,
        }
    }
}

/// OAuth client credentials and tokens for one service
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn redact(v: &Option<String>) -> &'static str {
            if v.is_some() {
                "<set>"
            } else {
                "<unset>"
            }
        }
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &redact(&self.client_secret))
            .field("access_token", &redact(&self.access_token))
            .field("refresh_token", &redact(&self.refresh_token))
            .finish()
    }
}

/// OAuth2 provider description
#[derive(Debug, Clone)]
pub struct OAuthProvider {
    pub service: &'static str,
    pub token_url: String,
    /// Any one of these scopes is sufficient
    pub accepted_scopes: &'static [&'static str],
}

impl OAuthProvider {
    pub fn spotify(token_url: impl Into<String>) -> Self {
        Self {
            service: "Spotify",
            token_url: token_url.into(),
            accepted_scopes: SPOTIFY_SCOPES,
        }
    }

    pub fn google(token_url: impl Into<String>) -> Self {
        Self {
            service: "YouTube",
            token_url: token_url.into(),
            accepted_scopes: YOUTUBE_SCOPES,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    scope: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// Reject plain-http URLs unless explicitly allowed
pub fn ensure_secure_url(url: &str, options: &SessionOptions) -> Result<(), AuthError> {
    if url.starts_with("https://") {
        return Ok(());
    }
    if options.allow_insecure_transport && url.starts_with("http://") {
        warn!(url = %url, "Using insecure transport");
        return Ok(());
    }
    Err(AuthError::InsecureTransport(url.to_string()))
}

/// Whether a space-separated granted scope string contains an accepted scope
pub fn scope_satisfied(granted: &str, accepted: &[&str]) -> bool {
    granted
        .split_whitespace()
        .any(|scope| accepted.contains(&scope))
}

/// Obtain an access token for `provider`
///
/// Prefers the refresh-token grant; falls back to a configured access token.
/// A token response that omits `scope` is accepted.
pub async fn obtain_access_token(
    http: &Client,
    provider: &OAuthProvider,
    credentials: &Credentials,
    options: &SessionOptions,
) -> Result<String, AuthError> {
    let refresh = match (
        &credentials.refresh_token,
        &credentials.client_id,
        &credentials.client_secret,
    ) {
        (Some(token), Some(id), Some(secret)) => Some((token, id, secret)),
        _ => None,
    };

    let Some((refresh_token, client_id, client_secret)) = refresh else {
        return credentials
            .access_token
            .clone()
            .filter(|t| !t.trim().is_empty())
            .ok_or(AuthError::MissingCredentials(provider.service));
    };

    ensure_secure_url(&provider.token_url, options)?;

    let form = [
        ("grant_type", "refresh_token"),
        ("refresh_token", refresh_token.as_str()),
        ("client_id", client_id.as_str()),
        ("client_secret", client_secret.as_str()),
    ];
    let token: TokenResponse = send_json(http.post(&provider.token_url).form(&form))
        .await
        .map_err(|source| AuthError::TokenExchange {
            service: provider.service,
            source,
        })?;

    if let Some(granted) = &token.scope {
        if !scope_satisfied(granted, provider.accepted_scopes) {
            if options.relax_token_scope {
                warn!(service = provider.service, granted = %granted, "Token scope relaxed");
            } else {
                return Err(AuthError::ScopeMismatch {
                    service: provider.service,
                    required: provider.accepted_scopes.join(" or "),
                    granted: granted.clone(),
                });
            }
        }
    }

    info!(
        service = provider.service,
        expires_in = ?token.expires_in,
        "Access token obtained"
    );
    Ok(token.access_token)
}

/// Build and verify the Spotify source session
pub async fn connect_spotify(
    settings: &ServiceSettings,
    options: &SessionOptions,
) -> Result<SpotifyClient, AuthError> {
    let http = build_http_client().map_err(|e| AuthError::Client(e.to_string()))?;
    let provider = OAuthProvider::spotify(settings.token_url.clone());
    let token = obtain_access_token(&http, &provider, &settings.credentials, options).await?;

    let client = SpotifyClient::new(token, &settings.api_base_url, options)?;
    let user = client
        .current_user()
        .await
        .map_err(|source| AuthError::Verification {
            service: "Spotify",
            source,
        })?;

    info!(
        user = %user.display_name.as_deref().unwrap_or(&user.id),
        "Authenticated with Spotify"
    );
    Ok(client)
}

/// Build and verify the YouTube destination session
pub async fn connect_youtube(
    settings: &ServiceSettings,
    options: &SessionOptions,
) -> Result<YouTubeClient, AuthError> {
    let http = build_http_client().map_err(|e| AuthError::Client(e.to_string()))?;
    let provider = OAuthProvider::google(settings.token_url.clone());
    let token = obtain_access_token(&http, &provider, &settings.credentials, options).await?;

    let client = YouTubeClient::new(token, &settings.api_base_url, options)?;
    let channel = client
        .verify()
        .await
        .map_err(|source| AuthError::Verification {
            service: "YouTube",
            source,
        })?;

    info!(channel = %channel, "Authenticated with YouTube");
    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secure_by_default() {
        let options = SessionOptions::default();
        assert!(ensure_secure_url("https://api.spotify.com/v1", &options).is_ok());
        assert!(matches!(
            ensure_secure_url("http://127.0.0.1:8000", &options),
            Err(AuthError::InsecureTransport(_))
        ));
    }

    #[test]
    fn test_insecure_allowed_only_for_http() {
        let options = SessionOptions {
            allow_insecure_transport: true,
            relax_token_scope: false,
        };
        assert!(ensure_secure_url("http://127.0.0.1:8000", &options).is_ok());
        assert!(ensure_secure_url("ftp://example.test", &options).is_err());
    }

    #[test]
    fn test_scope_satisfied() {
        assert!(scope_satisfied(
            "user-library-read playlist-read-private",
            SPOTIFY_SCOPES
        ));
        assert!(!scope_satisfied("user-library-read", SPOTIFY_SCOPES));
        assert!(scope_satisfied(
            "https://www.googleapis.com/auth/youtube.force-ssl",
            YOUTUBE_SCOPES
        ));
        assert!(!scope_satisfied(
            "https://www.googleapis.com/auth/youtube.readonly",
            YOUTUBE_SCOPES
        ));
    }

    #[tokio::test]
    async fn test_access_token_used_without_refresh_token() {
        let http = build_http_client().unwrap();
        let credentials = Credentials {
            access_token: Some("preissued".into()),
            ..Default::default()
        };
        let token = obtain_access_token(
            &http,
            &OAuthProvider::spotify(SPOTIFY_TOKEN_URL),
            &credentials,
            &SessionOptions::default(),
        )
        .await
        .unwrap();
        assert_eq!(token, "preissued");
    }

    #[tokio::test]
    async fn test_missing_credentials() {
        let http = build_http_client().unwrap();
        let credentials = Credentials {
            refresh_token: Some("rt".into()),
            ..Default::default()
        };
        let err = obtain_access_token(
            &http,
            &OAuthProvider::google(GOOGLE_TOKEN_URL),
            &credentials,
            &SessionOptions::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AuthError::MissingCredentials("YouTube")));
    }

    #[tokio::test]
    async fn test_insecure_token_url_refused() {
        let http = build_http_client().unwrap();
        let credentials = Credentials {
            client_id: Some("id".into()),
            client_secret: Some("secret".into()),
            refresh_token: Some("rt".into()),
            access_token: None,
        };
        let err = obtain_access_token(
            &http,
            &OAuthProvider::spotify("http://127.0.0.1:9/api/token"),
            &credentials,
            &SessionOptions::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AuthError::InsecureTransport(_)));
    }

    #[test]
    fn test_credentials_debug_redacts_secrets() {
        let credentials = Credentials {
            client_id: Some("client".into()),
            client_secret: Some("hunter2".into()),
            access_token: Some("ya29.secret".into()),
            refresh_token: None,
        };
        let text = format!("{:?}", credentials);
        assert!(text.contains("client"));
        assert!(!text.contains("hunter2"));
        assert!(!text.contains("ya29.secret"));
        assert!(text.contains("<unset>"));
    }
}
