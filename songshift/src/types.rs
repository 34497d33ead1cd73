//! Core Types and Trait Definitions for songshift
//!
//! Defines the data model shared by the transfer pipeline and the two
//! session traits the pipeline talks to:
//! - **SourceSession:** paginated playlist and track listing
//! - **DestinationSession:** search, playlist creation, item insertion
//!
//! Concrete HTTP implementations live in [`crate::clients`]; tests use
//! in-memory fakes.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Album placeholder for tracks whose source entry carries no album
pub const UNKNOWN_ALBUM: &str = "N/A";

// ============================================================================
// Source-side Types
// ============================================================================

/// A track as read from the source catalog
///
/// Identity for matching purposes is `(name, artist, album)`; see [`MatchKey`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Track {
    pub name: String,
    /// Primary (first-listed) artist only
    pub artist: String,
    /// Album title, or [`UNKNOWN_ALBUM`]
    pub album: String,
}

impl Track {
    pub fn new(
        name: impl Into<String>,
        artist: impl Into<String>,
        album: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            artist: artist.into(),
            album: album.into(),
        }
    }

    /// Key used to correlate this track with its destination match
    pub fn match_key(&self) -> MatchKey {
        MatchKey::from(self)
    }
}

/// Playlist entry from the source playlist listing (tracks not yet read)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistStub {
    /// Source-service-scoped playlist id
    pub id: String,
    pub name: String,
    /// Track total as advertised by the listing, if any
    pub total_tracks: Option<u32>,
}

/// Playlist with its tracks materialized
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Playlist {
    pub id: String,
    pub name: String,
    pub tracks: Vec<Track>,
}

impl Playlist {
    pub fn from_stub(stub: PlaylistStub, tracks: Vec<Track>) -> Self {
        Self {
            id: stub.id,
            name: stub.name,
            tracks,
        }
    }
}

/// One page of a paginated source listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePage<T> {
    pub items: Vec<T>,
    /// Continuation cursor; `None` means this was the last page
    pub next: Option<String>,
}

impl<T> SourcePage<T> {
    pub fn last(items: Vec<T>) -> Self {
        Self { items, next: None }
    }

    pub fn with_next(items: Vec<T>, next: impl Into<String>) -> Self {
        Self {
            items,
            next: Some(next.into()),
        }
    }
}

/// Raw playlist item as returned by the source listing API
///
/// `track` is absent for entries the source cannot dereference (removed
/// items, local files).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceItem {
    #[serde(default)]
    pub track: Option<SourceTrack>,
}

/// Track payload inside a [`SourceItem`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceTrack {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub artists: Vec<SourceArtist>,
    #[serde(default)]
    pub album: Option<SourceAlbum>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceArtist {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceAlbum {
    #[serde(default)]
    pub name: Option<String>,
}

impl SourceItem {
    /// Build a fully populated item (test and fixture convenience)
    pub fn track(name: &str, artists: &[&str], album: Option<&str>) -> Self {
        Self {
            track: Some(SourceTrack {
                name: Some(name.to_string()),
                artists: artists
                    .iter()
                    .map(|a| SourceArtist {
                        name: Some(a.to_string()),
                    })
                    .collect(),
                album: album.map(|a| SourceAlbum {
                    name: Some(a.to_string()),
                }),
            }),
        }
    }
}

// ============================================================================
// Matching Types
// ============================================================================

/// Deterministic correlation key: `"{name} {artist} {album}"`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MatchKey(String);

impl MatchKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&Track> for MatchKey {
    fn from(track: &Track) -> Self {
        Self(format!("{} {} {}", track.name, track.artist, track.album))
    }
}

impl fmt::Display for MatchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Mapping from [`MatchKey`] to destination item id
///
/// Unmatched tracks are simply absent. A key is written at most once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchResult {
    matches: HashMap<MatchKey, String>,
}

impl MatchResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `key -> item_id` unless the key is already resolved
    ///
    /// Returns `true` if the mapping was written.
    pub fn insert_first(&mut self, key: MatchKey, item_id: impl Into<String>) -> bool {
        if self.matches.contains_key(&key) {
            return false;
        }
        self.matches.insert(key, item_id.into());
        true
    }

    pub fn get(&self, track: &Track) -> Option<&str> {
        self.get_key(&track.match_key())
    }

    pub fn get_key(&self, key: &MatchKey) -> Option<&str> {
        self.matches.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// Destination ids in source track order, `None` for unmatched tracks
    pub fn ordered_ids(&self, tracks: &[Track]) -> Vec<Option<String>> {
        tracks
            .iter()
            .map(|t| self.get(t).map(str::to_string))
            .collect()
    }
}

/// Ranked search result from the destination catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchCandidate {
    pub id: String,
    pub title: String,
}

impl SearchCandidate {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
        }
    }
}

// ============================================================================
// Destination-side Types
// ============================================================================

/// Visibility of a created destination playlist
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Privacy {
    #[default]
    Private,
    Unlisted,
    Public,
}

impl Privacy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Privacy::Private => "private",
            Privacy::Unlisted => "unlisted",
            Privacy::Public => "public",
        }
    }
}

impl FromStr for Privacy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "private" => Ok(Privacy::Private),
            "unlisted" => Ok(Privacy::Unlisted),
            "public" => Ok(Privacy::Public),
            other => Err(format!("unknown privacy status '{}'", other)),
        }
    }
}

/// Playlist creation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPlaylist {
    pub title: String,
    pub description: String,
    pub privacy: Privacy,
}

// ============================================================================
// Session Traits
// ============================================================================

/// Error returned by catalog sessions
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CatalogError {
    /// Transport failure (connect, timeout, TLS)
    #[error("Network error: {0}")]
    Network(String),

    /// Credentials rejected or expired
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Provider quota or rate limit hit
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Non-success HTTP status with provider message
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Response body did not have the expected shape
    #[error("Parse error: {0}")]
    Parse(String),
}

impl CatalogError {
    /// Whether a later attempt could plausibly succeed
    ///
    /// Informational only: the pipeline never retries.
    pub fn is_retryable(&self) -> bool {
        match self {
            CatalogError::Network(_) | CatalogError::RateLimited(_) => true,
            CatalogError::Api { status, .. } => *status >= 500,
            CatalogError::Auth(_) | CatalogError::Parse(_) => false,
        }
    }
}

/// Source catalog capability
#[async_trait::async_trait]
pub trait SourceSession: Send + Sync {
    /// Fetch one page of the current user's playlists
    ///
    /// `cursor` is `None` for the first page, then the previous page's `next`.
    async fn list_playlists_page(
        &self,
        cursor: Option<&str>,
    ) -> Result<SourcePage<PlaylistStub>, CatalogError>;

    /// Fetch one page of items of playlist `playlist_id`
    async fn list_tracks_page(
        &self,
        playlist_id: &str,
        cursor: Option<&str>,
    ) -> Result<SourcePage<SourceItem>, CatalogError>;
}

/// Destination catalog capability
#[async_trait::async_trait]
pub trait DestinationSession: Send + Sync {
    /// Full-text search returning at most `max_results` ranked candidates
    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<SearchCandidate>, CatalogError>;

    /// Create a playlist and return its destination id
    async fn create_playlist(&self, playlist: &NewPlaylist) -> Result<String, CatalogError>;

    /// Insert a single item into a playlist
    async fn insert_item(&self, playlist_id: &str, item_id: &str) -> Result<(), CatalogError>;

    /// Insert a group of items as one logical request
    ///
    /// The default issues singular inserts in order and fails the group on
    /// the first error. Items inserted before the failure stay in place.
    async fn insert_items(
        &self,
        playlist_id: &str,
        item_ids: &[String],
    ) -> Result<(), CatalogError> {
        for item_id in item_ids {
            self.insert_item(playlist_id, item_id).await?;
        }
        Ok(())
    }
}
