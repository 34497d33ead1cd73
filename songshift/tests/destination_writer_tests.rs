//! Destination writer tests: creation, batching, and failure accounting

mod helpers;

use helpers::FakeDestination;
use songshift::error::TransferError;
use songshift::services::{DestinationWriter, Pacer, WriteErrorKind};
use songshift::types::{CatalogError, Privacy};
use std::sync::Arc;

fn ids(values: &[Option<&str>]) -> Vec<Option<String>> {
    values.iter().map(|v| v.map(str::to_string)).collect()
}

#[tokio::test]
async fn test_create_playlist_uses_name_privacy_and_description() {
    let destination = Arc::new(FakeDestination::new());
    let writer = DestinationWriter::new(destination.clone(), 50, Pacer::disabled())
        .with_description_template("Copied {name}")
        .with_privacy(Privacy::Unlisted);

    let id = writer.create_playlist("Road Trip").await.unwrap();

    assert_eq!(id, "dest-1");
    let created = destination.created.lock().unwrap().clone();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].title, "Road Trip");
    assert_eq!(created[0].description, "Copied Road Trip");
    assert_eq!(created[0].privacy, Privacy::Unlisted);
}

#[tokio::test]
async fn test_create_failure_is_reported() {
    let destination = Arc::new(
        FakeDestination::new().failing_create(CatalogError::Auth("token expired".into())),
    );
    let writer = DestinationWriter::new(destination, 50, Pacer::disabled());

    let err = writer.create_playlist("Road Trip").await.unwrap_err();
    assert!(matches!(err, TransferError::Create(CatalogError::Auth(_))));
}

#[tokio::test]
async fn test_absent_ids_never_reach_the_destination() {
    let destination = Arc::new(FakeDestination::new());
    let writer = DestinationWriter::new(destination.clone(), 2, Pacer::disabled());

    // Five entries but only three present: two grouped writes, not three
    let outcome = writer
        .bulk_add_items("dest-1", &ids(&[Some("a"), None, Some("b"), None, Some("c")]))
        .await;

    assert_eq!(outcome.added, 3);
    assert_eq!(outcome.batches, 2);
    let calls = destination.insert_calls.lock().unwrap().clone();
    assert_eq!(calls[0].1, vec!["a", "b"]);
    assert_eq!(calls[1].1, vec!["c"]);
}

#[tokio::test]
async fn test_failed_batch_gets_no_credit_and_later_batches_run() {
    let destination = Arc::new(FakeDestination::new().failing_insert(
        0,
        CatalogError::Api {
            status: 404,
            message: "videoNotFound: Video not found.".into(),
        },
    ));
    let writer = DestinationWriter::new(destination.clone(), 2, Pacer::disabled());

    let outcome = writer
        .bulk_add_items(
            "dest-1",
            &ids(&[Some("a"), Some("b"), Some("c"), Some("d"), Some("e")]),
        )
        .await;

    assert_eq!(destination.insert_call_count(), 3);
    assert_eq!(outcome.batches, 3);
    assert_eq!(outcome.added, 3);
    assert_eq!(outcome.failed_batches.len(), 1);

    let failure = &outcome.failed_batches[0];
    assert_eq!(failure.batch_index, 0);
    assert_eq!(failure.items, 2);
    assert_eq!(failure.kind, WriteErrorKind::NotFound);
}

#[tokio::test]
async fn test_all_absent_makes_no_calls() {
    let destination = Arc::new(FakeDestination::new());
    let writer = DestinationWriter::new(destination.clone(), 50, Pacer::disabled());

    let outcome = writer.bulk_add_items("dest-1", &ids(&[None, None])).await;
    assert_eq!(outcome.added, 0);
    assert_eq!(outcome.batches, 0);

    let outcome = writer.bulk_add_items("dest-1", &[]).await;
    assert_eq!(outcome.added, 0);

    assert_eq!(destination.insert_call_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_batches_are_paced() {
    let destination = Arc::new(FakeDestination::new());
    let writer = DestinationWriter::new(
        destination,
        1,
        Pacer::new(std::time::Duration::from_secs(1)),
    );

    let start = tokio::time::Instant::now();
    let outcome = writer
        .bulk_add_items("dest-1", &ids(&[Some("a"), Some("b"), Some("c")]))
        .await;

    assert_eq!(outcome.added, 3);
    assert!(start.elapsed() >= std::time::Duration::from_secs(3));
}
