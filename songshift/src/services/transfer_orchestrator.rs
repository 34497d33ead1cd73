//! Transfer Orchestrator
//!
//! Runs each source playlist through the pipeline, strictly one at a time:
//!
//! ```text
//! FETCH_TRACKS -> CREATE_DEST_PLAYLIST -> MATCH -> BULK_ADD -> REPORT
//! ```
//!
//! A failed or empty read and a failed creation both jump straight to REPORT
//! with zero matched/added counts. One playlist's failure never affects the
//! next. A destination playlist, once created, is never deleted or recreated.

use crate::error::TransferResult;
use crate::services::batch_matcher::BatchMatcher;
use crate::services::destination_writer::DestinationWriter;
use crate::services::source_reader::SourceReader;
use crate::types::{Playlist, PlaylistStub};
use std::fmt;
use tracing::{info, warn};

/// How a playlist's transfer ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferStatus {
    /// All stages ran (individual batches may still have failed)
    Completed,
    /// Source tracks could not be read
    ReadFailed,
    /// Source playlist had no searchable tracks
    Empty,
    /// Destination playlist could not be created
    CreateFailed,
    /// Matched only; nothing was created or written
    DryRun,
}

impl fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TransferStatus::Completed => "completed",
            TransferStatus::ReadFailed => "read failed",
            TransferStatus::Empty => "no tracks",
            TransferStatus::CreateFailed => "playlist creation failed",
            TransferStatus::DryRun => "dry run",
        };
        f.write_str(label)
    }
}

/// Outcome of one playlist's transfer, produced once and never mutated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReport {
    pub name: String,
    pub track_count: usize,
    pub matched_count: usize,
    pub added_count: usize,
    pub status: TransferStatus,
    pub destination_id: Option<String>,
    /// Search batches lost to errors
    pub failed_searches: usize,
    /// Write batches lost to errors
    pub failed_writes: usize,
}

impl TransferReport {
    fn skipped(name: &str, track_count: usize, status: TransferStatus) -> Self {
        Self {
            name: name.to_string(),
            track_count,
            matched_count: 0,
            added_count: 0,
            status,
            destination_id: None,
            failed_searches: 0,
            failed_writes: 0,
        }
    }
}

impl fmt::Display for TransferReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}/{} transferred ({} matched)",
            self.name, self.added_count, self.track_count, self.matched_count
        )?;
        if self.status != TransferStatus::Completed {
            write!(f, " [{}]", self.status)?;
        }
        Ok(())
    }
}

/// Reports of a whole run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferSummary {
    pub reports: Vec<TransferReport>,
}

impl TransferSummary {
    pub fn total_tracks(&self) -> usize {
        self.reports.iter().map(|r| r.track_count).sum()
    }

    pub fn total_matched(&self) -> usize {
        self.reports.iter().map(|r| r.matched_count).sum()
    }

    pub fn total_added(&self) -> usize {
        self.reports.iter().map(|r| r.added_count).sum()
    }

    /// Playlists that ended before matching
    pub fn skipped(&self) -> usize {
        self.reports
            .iter()
            .filter(|r| {
                matches!(
                    r.status,
                    TransferStatus::ReadFailed | TransferStatus::Empty | TransferStatus::CreateFailed
                )
            })
            .count()
    }
}

impl fmt::Display for TransferSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for report in &self.reports {
            writeln!(f, "{}", report)?;
        }
        write!(
            f,
            "Total: {}/{} tracks transferred ({} matched) across {} playlists, {} skipped",
            self.total_added(),
            self.total_tracks(),
            self.total_matched(),
            self.reports.len(),
            self.skipped()
        )
    }
}

/// Transfer Orchestrator
pub struct TransferOrchestrator {
    reader: SourceReader,
    matcher: BatchMatcher,
    writer: DestinationWriter,
    playlist_filter: Vec<String>,
    dry_run: bool,
}

impl TransferOrchestrator {
    pub fn new(reader: SourceReader, matcher: BatchMatcher, writer: DestinationWriter) -> Self {
        Self {
            reader,
            matcher,
            writer,
            playlist_filter: Vec::new(),
            dry_run: false,
        }
    }

    /// Only transfer playlists whose name is in `names` (empty = all)
    pub fn with_playlist_filter(mut self, names: Vec<String>) -> Self {
        self.playlist_filter = names;
        self
    }

    /// Read and match only; create and write nothing
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Transfer every selected source playlist
    ///
    /// # Errors
    /// Fails only if the source playlist listing itself cannot be read.
    pub async fn run(&self) -> TransferResult<TransferSummary> {
        let playlists = self.reader.list_playlists().await?;
        let selected: Vec<&PlaylistStub> = playlists
            .iter()
            .filter(|p| self.is_selected(&p.name))
            .collect();

        if selected.len() < playlists.len() {
            info!(
                selected = selected.len(),
                listed = playlists.len(),
                "Applied playlist filter"
            );
        }

        let mut summary = TransferSummary::default();
        for playlist in selected {
            let report = self.transfer_playlist(playlist).await;
            info!("{}", report);
            summary.reports.push(report);
        }

        Ok(summary)
    }

    /// Run one playlist through the pipeline
    pub async fn transfer_playlist(&self, stub: &PlaylistStub) -> TransferReport {
        info!(name = %stub.name, playlist_id = %stub.id, "Processing playlist");

        let tracks = match self.reader.list_tracks(&stub.id).await {
            Ok(tracks) => tracks,
            Err(e) => {
                warn!(name = %stub.name, error = %e, "Could not read playlist tracks, skipping");
                return TransferReport::skipped(&stub.name, 0, TransferStatus::ReadFailed);
            }
        };

        if tracks.is_empty() {
            info!(name = %stub.name, "No tracks found in playlist, skipping");
            return TransferReport::skipped(&stub.name, 0, TransferStatus::Empty);
        }

        let playlist = Playlist::from_stub(stub.clone(), tracks);
        info!(name = %playlist.name, tracks = playlist.tracks.len(), "Read source tracks");

        let destination_id = if self.dry_run {
            None
        } else {
            match self.writer.create_playlist(&playlist.name).await {
                Ok(id) => Some(id),
                Err(e) => {
                    warn!(name = %playlist.name, error = %e, "Skipping playlist");
                    return TransferReport::skipped(
                        &playlist.name,
                        playlist.tracks.len(),
                        TransferStatus::CreateFailed,
                    );
                }
            }
        };

        let matched = self.matcher.match_tracks(&playlist.tracks).await;
        let matched_count = playlist
            .tracks
            .iter()
            .filter(|t| matched.result.get(t).is_some())
            .count();

        let (added_count, failed_writes, status) = match &destination_id {
            Some(id) => {
                let item_ids = matched.result.ordered_ids(&playlist.tracks);
                let added = self.writer.bulk_add_items(id, &item_ids).await;
                (
                    added.added,
                    added.failed_batches.len(),
                    TransferStatus::Completed,
                )
            }
            None => (0, 0, TransferStatus::DryRun),
        };

        TransferReport {
            track_count: playlist.tracks.len(),
            name: playlist.name,
            matched_count,
            added_count,
            status,
            destination_id,
            failed_searches: matched.failed_batches,
            failed_writes,
        }
    }

    fn is_selected(&self, name: &str) -> bool {
        self.playlist_filter.is_empty() || self.playlist_filter.iter().any(|n| n == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(name: &str, tracks: usize, matched: usize, added: usize, status: TransferStatus) -> TransferReport {
        TransferReport {
            name: name.to_string(),
            track_count: tracks,
            matched_count: matched,
            added_count: added,
            status,
            destination_id: None,
            failed_searches: 0,
            failed_writes: 0,
        }
    }

    #[test]
    fn test_report_display() {
        let r = report("Road Trip", 2, 1, 1, TransferStatus::Completed);
        assert_eq!(r.to_string(), "Road Trip: 1/2 transferred (1 matched)");

        let r = report("Broken", 10, 0, 0, TransferStatus::CreateFailed);
        assert_eq!(
            r.to_string(),
            "Broken: 0/10 transferred (0 matched) [playlist creation failed]"
        );
    }

    #[test]
    fn test_summary_totals() {
        let summary = TransferSummary {
            reports: vec![
                report("A", 10, 8, 7, TransferStatus::Completed),
                report("B", 5, 0, 0, TransferStatus::CreateFailed),
                report("C", 0, 0, 0, TransferStatus::ReadFailed),
            ],
        };

        assert_eq!(summary.total_tracks(), 15);
        assert_eq!(summary.total_matched(), 8);
        assert_eq!(summary.total_added(), 7);
        assert_eq!(summary.skipped(), 2);

        let text = summary.to_string();
        assert!(text.contains("A: 7/10 transferred (8 matched)"));
        assert!(text.ends_with("Total: 7/15 tracks transferred (8 matched) across 3 playlists, 2 skipped"));
    }
}
