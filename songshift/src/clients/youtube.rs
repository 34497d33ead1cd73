//! YouTube Data API v3 destination session
//!
//! # API Reference
//! - `GET /search?part=id,snippet&type=video&videoCategoryId=10`
//! - `POST /playlists?part=snippet,status`
//! - `POST /playlistItems?part=snippet`
//! - `GET /channels?part=id&mine=true` (session verification)
//!
//! Grouped inserts use the trait's sequential default: the API has no
//! multi-item insert endpoint.

use crate::auth::{ensure_secure_url, AuthError, SessionOptions};
use crate::clients::{build_http_client, send_json};
use crate::types::{CatalogError, DestinationSession, NewPlaylist, SearchCandidate};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::fmt;
use tracing::debug;

/// YouTube Data API base URL
pub const YOUTUBE_API_URL: &str = "https://www.googleapis.com/youtube/v3";

/// "Music" video category
const MUSIC_CATEGORY_ID: &str = "10";

/// Largest `maxResults` the search endpoint accepts
pub const MAX_SEARCH_RESULTS: usize = 50;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchItemId,
    #[serde(default)]
    snippet: Option<Snippet>,
}

#[derive(Debug, Deserialize)]
struct SearchItemId {
    #[serde(rename = "videoId", default)]
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Snippet {
    #[serde(default)]
    title: String,
}

#[derive(Debug, Deserialize)]
struct Resource {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ResourceList {
    #[serde(default)]
    items: Vec<Resource>,
}

/// YouTube destination session
pub struct YouTubeClient {
    client: Client,
    base_url: String,
    access_token: String,
}

impl YouTubeClient {
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

        let client = build_http_client().map_err(|e| AuthError::Client(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            access_token: access_token.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolve the authenticated user's channel id
    pub async fn verify(&self) -> Result<String, CatalogError> {
        let url = format!("{}/channels", self.base_url);
        let channels: ResourceList = send_json(
            self.client
                .get(&url)
                .bearer_auth(&self.access_token)
                .query(&[("part", "id"), ("mine", "true")]),
        )
        .await?;

        channels
            .items
            .into_iter()
            .next()
            .map(|c| c.id)
            .ok_or_else(|| CatalogError::Auth("no channel for authenticated user".to_string()))
    }
}

impl fmt::Debug for YouTubeClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("YouTubeClient")
            .field("base_url", &self.base_url)
            .field("access_token", &"<set>")
            .finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl DestinationSession for YouTubeClient {
    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<SearchCandidate>, CatalogError> {
        let max_results = max_results.clamp(1, MAX_SEARCH_RESULTS).to_string();
        let url = format!("{}/search", self.base_url);
        debug!(query_len = query.len(), max_results = %max_results, "YouTube search");

        let response: SearchResponse = send_json(
            self.client
                .get(&url)
                .bearer_auth(&self.access_token)
                .query(&[
                    ("part", "id,snippet"),
                    ("type", "video"),
                    ("videoCategoryId", MUSIC_CATEGORY_ID),
                    ("maxResults", max_results.as_str()),
                    ("q", query),
                ]),
        )
        .await?;

        Ok(response
            .items
            .into_iter()
            .filter_map(|item| {
                let id = item.id.video_id?;
                let title = item.snippet.map(|s| s.title).unwrap_or_default();
                Some(SearchCandidate { id, title })
            })
            .collect())
    }

    async fn create_playlist(&self, playlist: &NewPlaylist) -> Result<String, CatalogError> {
        let url = format!("{}/playlists", self.base_url);
        let body = json!({
            "snippet": {
                "title": playlist.title,
                "description": playlist.description,
            },
            "status": {
                "privacyStatus": playlist.privacy.as_str(),
            }
        });

        let created: Resource = send_json(
            self.client
                .post(&url)
                .bearer_auth(&self.access_token)
                .query(&[("part", "snippet,status")])
                .json(&body),
        )
        .await?;

        Ok(created.id)
    }

    async fn insert_item(&self, playlist_id: &str, item_id: &str) -> Result<(), CatalogError> {
        let url = format!("{}/playlistItems", self.base_url);
        let body = json!({
            "snippet": {
                "playlistId": playlist_id,
                "resourceId": {
                    "kind": "youtube#video",
                    "videoId": item_id,
                }
            }
        });

        let _: serde_json::Value = send_json(
            self.client
                .post(&url)
                .bearer_auth(&self.access_token)
                .query(&[("part", "snippet")])
                .json(&body),
        )
        .await?;

        debug!(playlist_id = %playlist_id, item_id = %item_id, "Inserted playlist item");
        Ok(())
    }
}
