//! Destination Catalog Writer
//!
//! Creates the destination playlist and inserts matched items in grouped
//! batches. Nothing here fails the overall transfer: creation failure is
//! returned to the orchestrator, insert failures are classified, logged and
//! counted.

use crate::error::{TransferError, TransferResult};
use crate::services::pacing::Pacer;
use crate::types::{CatalogError, DestinationSession, NewPlaylist, Privacy};
use chrono::Local;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Default number of item ids per grouped insert
pub const DEFAULT_UPLOAD_BATCH_SIZE: usize = 50;

/// Default description template for created playlists
pub const DEFAULT_DESCRIPTION_TEMPLATE: &str = "Transferred from Spotify by songshift on {date}.";

/// Known categories of destination insert failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteErrorKind {
    /// Playlist items not accessible to the caller
    NotAccessible,
    /// Item id does not exist
    NotFound,
    /// Permission denied
    Forbidden,
    /// Quota or rate limit exhausted
    QuotaExceeded,
    /// Anything unrecognized
    Other,
}

impl fmt::Display for WriteErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            WriteErrorKind::NotAccessible => "item not accessible",
            WriteErrorKind::NotFound => "item not found",
            WriteErrorKind::Forbidden => "forbidden",
            WriteErrorKind::QuotaExceeded => "quota exceeded",
            WriteErrorKind::Other => "unrecognized error",
        };
        f.write_str(label)
    }
}

/// One failed grouped insert
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchFailure {
    /// Zero-based batch index
    pub batch_index: usize,
    /// Items in the failed batch (none of them counted)
    pub items: usize,
    pub kind: WriteErrorKind,
    pub message: String,
}

/// Result of a bulk insert
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkAddOutcome {
    /// Items in batches that succeeded
    pub added: usize,
    /// Grouped insert calls issued
    pub batches: usize,
    pub failed_batches: Vec<BatchFailure>,
}

/// Destination Catalog Writer
pub struct DestinationWriter {
    session: Arc<dyn DestinationSession>,
    batch_size: usize,
    pacer: Pacer,
    description_template: String,
    privacy: Privacy,
}

impl DestinationWriter {
    /// Create a writer; a batch size of zero is treated as one
    pub fn new(session: Arc<dyn DestinationSession>, batch_size: usize, pacer: Pacer) -> Self {
        Self {
            session,
            batch_size: batch_size.max(1),
            pacer,
            description_template: DEFAULT_DESCRIPTION_TEMPLATE.to_string(),
            privacy: Privacy::default(),
        }
    }

    pub fn with_description_template(mut self, template: impl Into<String>) -> Self {
        self.description_template = template.into();
        self
    }

    pub fn with_privacy(mut self, privacy: Privacy) -> Self {
        self.privacy = privacy;
        self
    }

    /// Create the destination playlist named `name`
    pub async fn create_playlist(&self, name: &str) -> TransferResult<String> {
        let request = NewPlaylist {
            title: name.to_string(),
            description: render_description(&self.description_template, name),
            privacy: self.privacy,
        };

        info!(name = %name, privacy = self.privacy.as_str(), "Creating destination playlist");
        match self.session.create_playlist(&request).await {
            Ok(id) => {
                info!(name = %name, playlist_id = %id, "Destination playlist created");
                Ok(id)
            }
            Err(e) => {
                warn!(name = %name, error = %e, "Could not create destination playlist");
                Err(TransferError::Create(e))
            }
        }
    }

    /// Insert `item_ids` into `playlist_id` in grouped batches
    ///
    /// `None` entries (unmatched tracks) are filtered out before batching and
    /// never produce a write call. A failed batch contributes nothing to
    /// `added`; later batches still run.
    pub async fn bulk_add_items(
        &self,
        playlist_id: &str,
        item_ids: &[Option<String>],
    ) -> BulkAddOutcome {
        let present: Vec<String> = item_ids.iter().flatten().cloned().collect();
        let mut outcome = BulkAddOutcome::default();

        if present.is_empty() {
            debug!(playlist_id = %playlist_id, "Nothing to add");
            return outcome;
        }

        for (index, batch) in present.chunks(self.batch_size).enumerate() {
            info!(
                playlist_id = %playlist_id,
                batch = index + 1,
                items = batch.len(),
                "Adding batch to playlist"
            );

            outcome.batches += 1;
            match self.session.insert_items(playlist_id, batch).await {
                Ok(()) => {
                    outcome.added += batch.len();
                }
                Err(e) => {
                    let kind = classify_write_error(&e);
                    warn!(
                        playlist_id = %playlist_id,
                        batch = index + 1,
                        kind = %kind,
                        error = %e,
                        "Batch insert failed, continuing"
                    );
                    outcome.failed_batches.push(BatchFailure {
                        batch_index: index,
                        items: batch.len(),
                        kind,
                        message: e.to_string(),
                    });
                }
            }

            self.pacer.pause().await;
        }

        outcome
    }
}

/// Map a destination error to a known failure category
pub fn classify_write_error(error: &CatalogError) -> WriteErrorKind {
    match error {
        CatalogError::RateLimited(_) => WriteErrorKind::QuotaExceeded,
        CatalogError::Api { status, message } => {
            let message = message.to_lowercase();
            if message.contains("playlistitemsnotaccessible") {
                WriteErrorKind::NotAccessible
            } else if message.contains("videonotfound") {
                WriteErrorKind::NotFound
            } else if message.contains("quotaexceeded") {
                WriteErrorKind::QuotaExceeded
            } else if message.contains("forbidden") || *status == 403 {
                WriteErrorKind::Forbidden
            } else {
                WriteErrorKind::Other
            }
        }
        CatalogError::Network(_) | CatalogError::Auth(_) | CatalogError::Parse(_) => {
            WriteErrorKind::Other
        }
    }
}

/// Substitute `{name}` and `{date}` in a description template
pub fn render_description(template: &str, playlist_name: &str) -> String {
    template
        .replace("{name}", playlist_name)
        .replace("{date}", &Local::now().format("%Y-%m-%d").to_string())
}
