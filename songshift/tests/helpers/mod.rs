//! Test Helper Utilities
//!
//! In-memory source and destination sessions that record every call, so
//! pipeline tests run without network access.

#![allow(dead_code)]

use songshift::types::{
    CatalogError, DestinationSession, NewPlaylist, PlaylistStub, SearchCandidate, SourceItem,
    SourcePage, SourceSession, Track,
};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

// =============================================================================
// Source
// =============================================================================

/// Source session serving fixed playlists split into pages
#[derive(Default)]
pub struct FakeSource {
    playlists: Vec<PlaylistStub>,
    items: HashMap<String, Vec<SourceItem>>,
    page_size: usize,
    failing: HashSet<String>,
    pub track_page_calls: Mutex<Vec<(String, Option<String>)>>,
}

impl FakeSource {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            ..Default::default()
        }
    }

    pub fn with_playlist(mut self, id: &str, name: &str, items: Vec<SourceItem>) -> Self {
        self.playlists.push(PlaylistStub {
            id: id.to_string(),
            name: name.to_string(),
            total_tracks: Some(items.len() as u32),
        });
        self.items.insert(id.to_string(), items);
        self
    }

    /// Listing items of `id` fails with an auth error
    pub fn failing_playlist(mut self, id: &str) -> Self {
        self.failing.insert(id.to_string());
        self
    }

    pub fn track_page_count(&self, playlist_id: &str) -> usize {
        self.track_page_calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _)| id == playlist_id)
            .count()
    }

    fn page<T: Clone>(&self, all: &[T], cursor: Option<&str>) -> SourcePage<T> {
        let offset: usize = cursor.map(|c| c.parse().unwrap()).unwrap_or(0);
        let end = (offset + self.page_size).min(all.len());
        let items = all[offset..end].to_vec();
        if end < all.len() {
            SourcePage::with_next(items, end.to_string())
        } else {
            SourcePage::last(items)
        }
    }
}

#[async_trait::async_trait]
impl SourceSession for FakeSource {
    async fn list_playlists_page(
        &self,
        cursor: Option<&str>,
    ) -> Result<SourcePage<PlaylistStub>, CatalogError> {
        Ok(self.page(&self.playlists, cursor))
    }

    async fn list_tracks_page(
        &self,
        playlist_id: &str,
        cursor: Option<&str>,
    ) -> Result<SourcePage<SourceItem>, CatalogError> {
        self.track_page_calls
            .lock()
            .unwrap()
            .push((playlist_id.to_string(), cursor.map(str::to_string)));

        if self.failing.contains(playlist_id) {
            return Err(CatalogError::Auth("playlist not readable".to_string()));
        }
        let items = self
            .items
            .get(playlist_id)
            .ok_or_else(|| CatalogError::Api {
                status: 404,
                message: "playlist not found".to_string(),
            })?;
        Ok(self.page(items, cursor))
    }
}

// =============================================================================
// Destination
// =============================================================================

/// Destination session backed by a fixed catalog of titled items
///
/// `search` understands the matcher's `"name" "artist" OR ...` queries and
/// returns catalog entries whose title contains both terms of any clause.
#[derive(Default)]
pub struct FakeDestination {
    catalog: Vec<SearchCandidate>,
    /// Scripted results per search call index (overrides the catalog)
    scripted: HashMap<usize, Result<Vec<SearchCandidate>, CatalogError>>,
    fail_create: Option<CatalogError>,
    /// Grouped insert call indexes that fail
    fail_inserts: HashMap<usize, CatalogError>,
    pub searches: Mutex<Vec<(String, usize)>>,
    pub created: Mutex<Vec<NewPlaylist>>,
    pub insert_calls: Mutex<Vec<(String, Vec<String>)>>,
}

impl FakeDestination {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_catalog(mut self, entries: &[(&str, &str)]) -> Self {
        self.catalog = entries
            .iter()
            .map(|(id, title)| SearchCandidate::new(*id, *title))
            .collect();
        self
    }

    pub fn with_search_result(
        mut self,
        call: usize,
        result: Result<Vec<SearchCandidate>, CatalogError>,
    ) -> Self {
        self.scripted.insert(call, result);
        self
    }

    pub fn failing_create(mut self, error: CatalogError) -> Self {
        self.fail_create = Some(error);
        self
    }

    pub fn failing_insert(mut self, call: usize, error: CatalogError) -> Self {
        self.fail_inserts.insert(call, error);
        self
    }

    pub fn search_count(&self) -> usize {
        self.searches.lock().unwrap().len()
    }

    pub fn insert_call_count(&self) -> usize {
        self.insert_calls.lock().unwrap().len()
    }

    pub fn create_count(&self) -> usize {
        self.created.lock().unwrap().len()
    }
}

/// Split a matcher query into its `(name, artist)` clauses
pub fn parse_clauses(query: &str) -> Vec<(String, String)> {
    query
        .split(" OR ")
        .filter_map(|clause| {
            let terms: Vec<&str> = clause.split('"').skip(1).step_by(2).collect();
            match terms.as_slice() {
                [name, artist] => Some((name.to_lowercase(), artist.to_lowercase())),
                _ => None,
            }
        })
        .collect()
}

#[async_trait::async_trait]
impl DestinationSession for FakeDestination {
    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<SearchCandidate>, CatalogError> {
        let call = {
            let mut searches = self.searches.lock().unwrap();
            searches.push((query.to_string(), max_results));
            searches.len() - 1
        };

        if let Some(result) = self.scripted.get(&call) {
            return result.clone();
        }

        let clauses = parse_clauses(query);
        Ok(self
            .catalog
            .iter()
            .filter(|c| {
                let title = c.title.to_lowercase();
                clauses
                    .iter()
                    .any(|(name, artist)| title.contains(name) && title.contains(artist))
            })
            .take(max_results)
            .cloned()
            .collect())
    }

    async fn create_playlist(&self, playlist: &NewPlaylist) -> Result<String, CatalogError> {
        if let Some(error) = &self.fail_create {
            return Err(error.clone());
        }
        let mut created = self.created.lock().unwrap();
        created.push(playlist.clone());
        Ok(format!("dest-{}", created.len()))
    }

    async fn insert_item(&self, playlist_id: &str, item_id: &str) -> Result<(), CatalogError> {
        self.insert_items(playlist_id, &[item_id.to_string()]).await
    }

    async fn insert_items(
        &self,
        playlist_id: &str,
        item_ids: &[String],
    ) -> Result<(), CatalogError> {
        let call = {
            let mut calls = self.insert_calls.lock().unwrap();
            calls.push((playlist_id.to_string(), item_ids.to_vec()));
            calls.len() - 1
        };

        match self.fail_inserts.get(&call) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

// =============================================================================
// Fixtures
// =============================================================================

/// `count` distinct fully-populated source items
pub fn numbered_items(count: usize) -> Vec<SourceItem> {
    (0..count)
        .map(|i| {
            let artist = format!("Artist {:03}", i);
            let album = format!("Album {:03}", i);
            SourceItem::track(&format!("Song {:03}", i), &[artist.as_str()], Some(album.as_str()))
        })
        .collect()
}

/// `count` distinct tracks
pub fn numbered_tracks(count: usize) -> Vec<Track> {
    (0..count)
        .map(|i| {
            Track::new(
                format!("Song {:03}", i),
                format!("Artist {:03}", i),
                format!("Album {:03}", i),
            )
        })
        .collect()
}

/// Destination catalog entries matching [`numbered_tracks`]
pub fn numbered_catalog(count: usize) -> Vec<(String, String)> {
    (0..count)
        .map(|i| {
            (
                format!("vid-{:03}", i),
                format!("Artist {:03} - Song {:03} (Official Audio)", i, i),
            )
        })
        .collect()
}

pub fn as_pairs(entries: &[(String, String)]) -> Vec<(&str, &str)> {
    entries
        .iter()
        .map(|(a, b)| (a.as_str(), b.as_str()))
        .collect()
}
