//! Source Catalog Reader
//!
//! Walks the source's paginated listing API and materializes complete
//! playlist and track collections. Callers only ever see whole collections:
//! a failure on any page fails the whole listing.
//!
//! **Track extraction policy:**
//! - Items without a resolvable name, or without a resolvable first artist,
//!   are dropped (they cannot be searched for)
//! - Only the first-listed artist is kept; featured artists are discarded
//! - A missing album becomes [`UNKNOWN_ALBUM`]

use crate::error::{TransferError, TransferResult};
use crate::types::{
    CatalogError, PlaylistStub, SourceItem, SourcePage, SourceSession, Track, UNKNOWN_ALBUM,
};
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info};

/// Source Catalog Reader
pub struct SourceReader {
    session: Arc<dyn SourceSession>,
}

impl SourceReader {
    pub fn new(session: Arc<dyn SourceSession>) -> Self {
        Self { session }
    }

    /// List every playlist of the authenticated user, across all pages
    pub async fn list_playlists(&self) -> TransferResult<Vec<PlaylistStub>> {
        let playlists = collect_pages(|cursor| async move {
            self.session.list_playlists_page(cursor.as_deref()).await
        })
        .await
        .map_err(TransferError::Read)?;

        for playlist in &playlists {
            debug!(
                playlist_id = %playlist.id,
                name = %playlist.name,
                total_tracks = ?playlist.total_tracks,
                "Found source playlist"
            );
        }
        info!(count = playlists.len(), "Source playlists listed");

        Ok(playlists)
    }

    /// List every searchable track of `playlist_id`, in playlist order
    pub async fn list_tracks(&self, playlist_id: &str) -> TransferResult<Vec<Track>> {
        let items = collect_pages(|cursor| async move {
            self.session
                .list_tracks_page(playlist_id, cursor.as_deref())
                .await
        })
        .await
        .map_err(TransferError::Read)?;

        let total = items.len();
        let tracks: Vec<Track> = items.iter().filter_map(extract_track).collect();

        if tracks.len() < total {
            debug!(
                playlist_id = %playlist_id,
                dropped = total - tracks.len(),
                "Dropped unsearchable playlist items"
            );
        }

        Ok(tracks)
    }
}

/// Follow continuation cursors until the service reports no further page
///
/// A cursor that repeats is reported as a parse error instead of looping.
pub async fn collect_pages<T, F, Fut>(mut fetch: F) -> Result<Vec<T>, CatalogError>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<SourcePage<T>, CatalogError>>,
{
    let mut items = Vec::new();
    let mut seen = HashSet::new();
    let mut cursor: Option<String> = None;

    loop {
        let page = fetch(cursor.take()).await?;
        items.extend(page.items);

        match page.next {
            Some(next) => {
                if !seen.insert(next.clone()) {
                    return Err(CatalogError::Parse(format!(
                        "pagination cursor repeated: {}",
                        next
                    )));
                }
                cursor = Some(next);
            }
            None => break,
        }
    }

    Ok(items)
}

/// Apply the extraction policy to one raw listing item
pub fn extract_track(item: &SourceItem) -> Option<Track> {
    let track = item.track.as_ref()?;

    let name = non_blank(track.name.as_deref())?;
    let artist = non_blank(track.artists.first()?.name.as_deref())?;
    let album = track
        .album
        .as_ref()
        .and_then(|a| non_blank(a.name.as_deref()))
        .unwrap_or(UNKNOWN_ALBUM);

    Some(Track::new(name, artist, album))
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SourceAlbum, SourceArtist, SourceTrack};

    #[test]
    fn test_extract_keeps_primary_artist_only() {
        let item = SourceItem::track("Song", &["Lead", "Featured"], Some("LP"));
        let track = extract_track(&item).unwrap();
        assert_eq!(track, Track::new("Song", "Lead", "LP"));
    }

    #[test]
    fn test_extract_defaults_album() {
        let item = SourceItem::track("Song", &["Artist"], None);
        assert_eq!(extract_track(&item).unwrap().album, UNKNOWN_ALBUM);

        let blank_album = SourceItem {
            track: Some(SourceTrack {
                name: Some("Song".into()),
                artists: vec![SourceArtist {
                    name: Some("Artist".into()),
                }],
                album: Some(SourceAlbum { name: None }),
            }),
        };
        assert_eq!(extract_track(&blank_album).unwrap().album, UNKNOWN_ALBUM);
    }

    #[test]
    fn test_extract_drops_unsearchable_items() {
        assert!(extract_track(&SourceItem { track: None }).is_none());
        assert!(extract_track(&SourceItem::track("", &["Artist"], None)).is_none());
        assert!(extract_track(&SourceItem::track("   ", &["Artist"], None)).is_none());
        assert!(extract_track(&SourceItem::track("Song", &[], None)).is_none());

        let nameless_artist = SourceItem {
            track: Some(SourceTrack {
                name: Some("Song".into()),
                artists: vec![SourceArtist { name: None }],
                album: None,
            }),
        };
        assert!(extract_track(&nameless_artist).is_none());
    }

    #[tokio::test]
    async fn test_collect_pages_follows_cursor() {
        let pages = vec![
            SourcePage::with_next(vec![1, 2], "p2"),
            SourcePage::with_next(vec![3], "p3"),
            SourcePage::last(vec![4, 5]),
        ];
        let mut calls = Vec::new();
        let mut iter = pages.into_iter();

        let items = collect_pages(|cursor| {
            calls.push(cursor);
            let page = iter.next().unwrap();
            async move { Ok::<_, CatalogError>(page) }
        })
        .await
        .unwrap();

        assert_eq!(items, vec![1, 2, 3, 4, 5]);
        assert_eq!(
            calls,
            vec![None, Some("p2".to_string()), Some("p3".to_string())]
        );
    }

    #[tokio::test]
    async fn test_collect_pages_rejects_repeated_cursor() {
        let result = collect_pages(|_cursor| async move {
            Ok::<_, CatalogError>(SourcePage::with_next(vec![1], "same"))
        })
        .await;

        assert!(matches!(result, Err(CatalogError::Parse(_))));
    }

    #[tokio::test]
    async fn test_collect_pages_propagates_page_error() {
        let mut call = 0;
        let result: Result<Vec<u8>, _> = collect_pages(|_cursor| {
            call += 1;
            let page = if call == 1 {
                Ok(SourcePage::with_next(vec![1], "p2"))
            } else {
                Err(CatalogError::Auth("token expired".into()))
            };
            async move { page }
        })
        .await;

        assert_eq!(result, Err(CatalogError::Auth("token expired".into())));
    }
}
