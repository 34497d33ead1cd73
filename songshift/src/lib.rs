//! songshift library interface
//!
//! Cross-catalog playlist transfer: read playlists from a source catalog,
//! match their tracks against a destination catalog with batched searches,
//! and write matched items into newly created destination playlists.

pub mod auth;
pub mod clients;
pub mod config;
pub mod error;
pub mod services;
pub mod types;

pub use crate::error::{TransferError, TransferResult};

use crate::config::Settings;
use crate::services::{
    BatchMatcher, DestinationWriter, Pacer, SourceReader, TransferOrchestrator,
};
use crate::types::{DestinationSession, SourceSession};
use std::sync::Arc;

/// Wire the pipeline components around two sessions
pub fn build_orchestrator(
    source: Arc<dyn SourceSession>,
    destination: Arc<dyn DestinationSession>,
    settings: &Settings,
) -> TransferOrchestrator {
    let pacer = Pacer::new(settings.pacing);

    let reader = SourceReader::new(source);
    let matcher = BatchMatcher::new(destination.clone(), settings.search_batch_size, pacer);
    let writer = DestinationWriter::new(destination, settings.upload_batch_size, pacer)
        .with_description_template(settings.description_template.clone())
        .with_privacy(settings.privacy);

    TransferOrchestrator::new(reader, matcher, writer)
        .with_playlist_filter(settings.playlists.clone())
        .with_dry_run(settings.dry_run)
}
