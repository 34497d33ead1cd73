//! Transfer pipeline services
//!
//! Leaves first: pacing, source reader, batch matcher, destination writer,
//! then the orchestrator that sequences them per playlist.

pub mod batch_matcher;
pub mod destination_writer;
pub mod pacing;
pub mod source_reader;
pub mod transfer_orchestrator;

pub use batch_matcher::{BatchMatcher, MatchOutcome, DEFAULT_SEARCH_BATCH_SIZE};
pub use destination_writer::{
    BatchFailure, BulkAddOutcome, DestinationWriter, WriteErrorKind, DEFAULT_UPLOAD_BATCH_SIZE,
};
pub use pacing::{Pacer, DEFAULT_PACING_DELAY};
pub use source_reader::SourceReader;
pub use transfer_orchestrator::{
    TransferOrchestrator, TransferReport, TransferStatus, TransferSummary,
};
