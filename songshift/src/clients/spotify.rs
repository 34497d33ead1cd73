//! Spotify Web API source session
//!
//! Lists the current user's playlists and a playlist's items, one page per
//! call. Pagination cursors are the absolute `next` URLs the API returns.
//!
//! # API Reference
//! - `GET /me/playlists?limit=50`
//! - `GET /playlists/{id}/tracks?limit=100`
//! - `GET /me` (session verification)

use crate::auth::{ensure_secure_url, AuthError, SessionOptions};
use crate::clients::{build_http_client, send_json};
use crate::types::{CatalogError, PlaylistStub, SourceItem, SourcePage, SourceSession};
use governor::{Quota, RateLimiter};
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fmt;
use std::num::NonZeroU32;
use tracing::debug;

/// Spotify Web API base URL
pub const SPOTIFY_API_URL: &str = "https://api.spotify.com/v1";

/// Playlists per listing page (API maximum)
const PLAYLIST_PAGE_LIMIT: u32 = 50;

/// Items per playlist-items page (API maximum)
const TRACK_PAGE_LIMIT: u32 = 100;

/// Client-side request ceiling
const DEFAULT_REQUESTS_PER_SECOND: u32 = 10;

#[derive(Debug, Deserialize)]
struct PlaylistPage {
    #[serde(default)]
    items: Vec<SpotifyPlaylist>,
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SpotifyPlaylist {
    id: String,
    name: String,
    #[serde(default)]
    tracks: Option<TracksRef>,
}

#[derive(Debug, Deserialize)]
struct TracksRef {
    total: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct TrackPage {
    #[serde(default)]
    items: Vec<SourceItem>,
    next: Option<String>,
}

/// Authenticated Spotify user
#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyUser {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Spotify source session
pub struct SpotifyClient {
    client: Client,
    base_url: String,
    /// Parsed `base_url`, the only origin cursors may point at
    base: Url,
    access_token: String,
    rate_limiter: RateLimiter<
        governor::state::direct::NotKeyed,
        governor::state::InMemoryState,
        governor::clock::DefaultClock,
    >,
}

impl SpotifyClient {
    /// Create a client for `base_url` using an already obtained access token
    ///
    /// # Errors
    /// Refuses a non-https `base_url` unless insecure transport is allowed.
    pub fn new(
        access_token: impl Into<String>,
        base_url: &str,
        options: &SessionOptions,
    ) -> Result<Self, AuthError> {
        let base_url = base_url.trim_end_matches('/').to_string();
        ensure_secure_url(&base_url, options)?;
        let base = Url::parse(&base_url)
            .map_err(|e| AuthError::Client(format!("invalid base URL {}: {}", base_url, e)))?;

        let client = build_http_client().map_err(|e| AuthError::Client(e.to_string()))?;
        let rate_limiter = RateLimiter::direct(Quota::per_second(
            NonZeroU32::new(DEFAULT_REQUESTS_PER_SECOND).unwrap_or(NonZeroU32::MIN),
        ));

        Ok(Self {
            client,
            base_url,
            base,
            access_token: access_token.into(),
            rate_limiter,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the authenticated user's profile
    pub async fn current_user(&self) -> Result<SpotifyUser, CatalogError> {
        let url = format!("{}/me", self.base_url);
        self.get_json(&url).await
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, CatalogError> {
        self.rate_limiter.until_ready().await;
        debug!(url = %url, "Spotify request");

        send_json(self.client.get(url).bearer_auth(&self.access_token))
            .await
            .map_err(|e| match e {
                // Spotify answers 403 for tokens lacking the playlist scopes
                CatalogError::Api { status: 403, message } => CatalogError::Auth(message),
                other => other,
            })
    }

    /// First-page URL, or the continuation cursor if it points at this API
    fn page_url(&self, cursor: Option<&str>, first: String) -> Result<String, CatalogError> {
        match cursor {
            None => Ok(first),
            Some(next) if cursor_within(&self.base, next) => Ok(next.to_string()),
            Some(next) => Err(CatalogError::Parse(format!(
                "pagination cursor outside {}: {}",
                self.base_url, next
            ))),
        }
    }
}

impl fmt::Debug for SpotifyClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpotifyClient")
            .field("base_url", &self.base_url)
            .field("access_token", &"<set>")
            .finish_non_exhaustive()
    }
}

/// Whether `next` has the same origin as `base` and a path under its path
fn cursor_within(base: &Url, next: &str) -> bool {
    let Ok(next) = Url::parse(next) else {
        return false;
    };

    if next.scheme() != base.scheme()
        || next.host_str() != base.host_str()
        || next.port_or_known_default() != base.port_or_known_default()
    {
        return false;
    }

    let base_path = base.path().trim_end_matches('/');
    match next.path().strip_prefix(base_path) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

#[async_trait::async_trait]
impl SourceSession for SpotifyClient {
    async fn list_playlists_page(
        &self,
        cursor: Option<&str>,
    ) -> Result<SourcePage<PlaylistStub>, CatalogError> {
        let url = self.page_url(
            cursor,
            format!("{}/me/playlists?limit={}", self.base_url, PLAYLIST_PAGE_LIMIT),
        )?;
        let page: PlaylistPage = self.get_json(&url).await?;

        Ok(SourcePage {
            items: page
                .items
                .into_iter()
                .map(|p| PlaylistStub {
                    id: p.id,
                    name: p.name,
                    total_tracks: p.tracks.and_then(|t| t.total),
                })
                .collect(),
            next: page.next,
        })
    }

    async fn list_tracks_page(
        &self,
        playlist_id: &str,
        cursor: Option<&str>,
    ) -> Result<SourcePage<SourceItem>, CatalogError> {
        let url = self.page_url(
            cursor,
            format!(
                "{}/playlists/{}/tracks?limit={}",
                self.base_url, playlist_id, TRACK_PAGE_LIMIT
            ),
        )?;
        let page: TrackPage = self.get_json(&url).await?;

        Ok(SourcePage {
            items: page.items,
            next: page.next,
        })
    }
}
