//! Batch Matcher
//!
//! Resolves source tracks to destination item ids with one search call per
//! batch instead of one per track.
//!
//! **Algorithm:**
//! 1. Partition tracks into contiguous batches of at most `batch_size`
//! 2. Build one disjunctive query per batch: `"name" "artist" OR "name" "artist" ...`
//! 3. Request at most `batch_size` ranked candidates
//! 4. For each candidate, in rank order, accept it for every still-unresolved
//!    track whose lower-cased name and artist both occur in the lower-cased
//!    candidate title (first match wins, never best score)
//! 5. Pause for the pacing interval after every search call, success or not
//!
//! Substring containment is deliberately coarse: it admits generic-word false
//! positives and misses retitled uploads. Album plays no part in the test, so
//! the [`UNKNOWN_ALBUM`](crate::types::UNKNOWN_ALBUM) placeholder cannot
//! suppress a match.

use crate::services::pacing::Pacer;
use crate::types::{DestinationSession, MatchResult, SearchCandidate, Track};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Default number of tracks per search query
pub const DEFAULT_SEARCH_BATCH_SIZE: usize = 50;

/// Result of matching a track list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchOutcome {
    /// Resolved keys across all successful batches
    pub result: MatchResult,
    /// Search calls issued
    pub searches: usize,
    /// Batches whose search call failed
    pub failed_batches: usize,
}

/// Batch Matcher
pub struct BatchMatcher {
    session: Arc<dyn DestinationSession>,
    batch_size: usize,
    pacer: Pacer,
}

impl BatchMatcher {
    /// Create a matcher; a batch size of zero is treated as one
    pub fn new(session: Arc<dyn DestinationSession>, batch_size: usize, pacer: Pacer) -> Self {
        Self {
            session,
            batch_size: batch_size.max(1),
            pacer,
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Match `tracks` against the destination catalog
    ///
    /// Per-batch search failures are logged and skipped; keys resolved by
    /// earlier batches are kept.
    pub async fn match_tracks(&self, tracks: &[Track]) -> MatchOutcome {
        let mut outcome = MatchOutcome::default();
        let batch_count = tracks.len().div_ceil(self.batch_size);

        for (index, batch) in tracks.chunks(self.batch_size).enumerate() {
            let query = build_batch_query(batch);
            debug!(
                batch = index + 1,
                of = batch_count,
                tracks = batch.len(),
                "Searching destination for batch"
            );

            outcome.searches += 1;
            match self.session.search(&query, batch.len()).await {
                Ok(candidates) if candidates.is_empty() => {
                    info!(batch = index + 1, "No results found for batch");
                }
                Ok(candidates) => {
                    let resolved = resolve_candidates(batch, &candidates, &mut outcome.result);
                    info!(
                        batch = index + 1,
                        candidates = candidates.len(),
                        resolved,
                        "Batch search complete"
                    );
                }
                Err(e) => {
                    outcome.failed_batches += 1;
                    warn!(batch = index + 1, error = %e, "Batch search failed, continuing");
                }
            }

            self.pacer.pause().await;
        }

        outcome
    }
}

/// Build the disjunctive search query for one batch
///
/// Embedded double quotes are removed so each term stays a single phrase.
pub fn build_batch_query(batch: &[Track]) -> String {
    batch
        .iter()
        .map(|t| format!("\"{}\" \"{}\"", phrase(&t.name), phrase(&t.artist)))
        .collect::<Vec<_>>()
        .join(" OR ")
}

fn phrase(term: &str) -> String {
    term.replace('"', "")
}

/// Apply the substring heuristic to one batch's candidates
///
/// Writes into `result` only for keys not already resolved and returns the
/// number of keys newly written.
pub fn resolve_candidates(
    batch: &[Track],
    candidates: &[SearchCandidate],
    result: &mut MatchResult,
) -> usize {
    let needles: Vec<(String, String)> = batch
        .iter()
        .map(|t| (t.name.to_lowercase(), t.artist.to_lowercase()))
        .collect();

    let mut resolved = 0;
    for candidate in candidates {
        let title = candidate.title.to_lowercase();

        for (track, (name, artist)) in batch.iter().zip(&needles) {
            // An empty needle would be contained in every title
            if name.is_empty() || artist.is_empty() {
                continue;
            }
            if !(title.contains(name.as_str()) && title.contains(artist.as_str())) {
                continue;
            }
            if result.insert_first(track.match_key(), candidate.id.as_str()) {
                resolved += 1;
                debug!(
                    track = %track.name,
                    artist = %track.artist,
                    candidate = %candidate.title,
                    item_id = %candidate.id,
                    "Matched"
                );
            }
        }
    }

    resolved
}
