//! Contract tests for `InMemoryEventStore`.

use eventide_core::error::StoreError;
use eventide_core::store::{EventData, EventStore, ExpectedVersion};
use eventide_event_store::InMemoryEventStore;
use uuid::Uuid;

fn event(event_type: &str, n: u32) -> EventData {
    EventData {
        event_id: Uuid::new_v4(),
        event_type: event_type.to_owned(),
        data: serde_json::json!({ "n": n }),
        metadata: serde_json::json!({ "aggregate_id": "Order-1" }),
    }
}

async fn append(
    store: &InMemoryEventStore,
    stream: &str,
    expected: ExpectedVersion,
    events: Vec<EventData>,
) -> Result<(), StoreError> {
    store.stream_writer(stream).append(expected, events).await
}

#[tokio::test]
async fn test_append_to_new_stream_assigns_positions_from_zero() {
    // Arrange
    let store = InMemoryEventStore::new();

    // Act
    append(
        &store,
        "order-Order-1",
        ExpectedVersion::NoStream,
        vec![event("OrderCreated", 1), event("OrderShipped", 2)],
    )
    .await
    .unwrap();

    // Assert
    let events = store.read_all("order-Order-1").unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].stream_position, 0);
    assert_eq!(events[0].event_type, "OrderCreated");
    assert_eq!(events[1].stream_position, 1);
    assert_eq!(store.stream_head("order-Order-1").unwrap(), Some(1));
}

#[tokio::test]
async fn test_reader_yields_events_then_no_more_events() {
    let store = InMemoryEventStore::new();
    let written = vec![event("OrderCreated", 1), event("OrderShipped", 2)];
    let ids: Vec<_> = written.iter().map(|e| e.event_id).collect();
    append(&store, "s", ExpectedVersion::NoStream, written)
        .await
        .unwrap();

    let mut reader = store.stream_reader("s");
    let first = reader.next().await.unwrap();
    let second = reader.next().await.unwrap();
    let end = reader.next().await.unwrap_err();

    assert_eq!([first.event_id, second.event_id], [ids[0], ids[1]]);
    assert_eq!(first.metadata["aggregate_id"], "Order-1");
    assert!(matches!(end, StoreError::NoMoreEvents));
}

#[tokio::test]
async fn test_reader_on_missing_stream_reports_not_found() {
    let store = InMemoryEventStore::new();

    let err = store.stream_reader("missing").next().await.unwrap_err();

    assert!(matches!(err, StoreError::NotFound { stream } if stream == "missing"));
}

#[tokio::test]
async fn test_exact_version_must_match_head() {
    // Arrange
    let store = InMemoryEventStore::new();
    append(&store, "s", ExpectedVersion::NoStream, vec![event("A", 1)])
        .await
        .unwrap();

    // Act
    let stale = append(&store, "s", ExpectedVersion::Exact(5), vec![event("B", 2)]).await;
    let fresh = append(&store, "s", ExpectedVersion::Exact(0), vec![event("B", 2)]).await;

    // Assert
    assert!(matches!(
        stale,
        Err(StoreError::WrongExpectedVersion {
            expected: ExpectedVersion::Exact(5),
            actual: Some(0),
            ..
        })
    ));
    assert!(fresh.is_ok());
    assert_eq!(store.stream_head("s").unwrap(), Some(1));
}

#[tokio::test]
async fn test_no_stream_fails_when_stream_exists() {
    let store = InMemoryEventStore::new();
    append(&store, "s", ExpectedVersion::NoStream, vec![event("A", 1)])
        .await
        .unwrap();

    let err = append(&store, "s", ExpectedVersion::NoStream, vec![event("A", 2)])
        .await
        .unwrap_err();

    assert!(matches!(err, StoreError::WrongExpectedVersion { actual: Some(0), .. }));
}

#[tokio::test]
async fn test_exact_version_fails_on_missing_stream() {
    let store = InMemoryEventStore::new();

    let err = append(&store, "s", ExpectedVersion::Exact(0), vec![event("A", 1)])
        .await
        .unwrap_err();

    assert!(matches!(err, StoreError::WrongExpectedVersion { actual: None, .. }));
    assert_eq!(store.stream_head("s").unwrap(), None);
}

#[tokio::test]
async fn test_any_appends_regardless_of_head() {
    let store = InMemoryEventStore::new();

    append(&store, "s", ExpectedVersion::Any, vec![event("A", 1)])
        .await
        .unwrap();
    append(&store, "s", ExpectedVersion::Any, vec![event("A", 2)])
        .await
        .unwrap();

    assert_eq!(store.stream_head("s").unwrap(), Some(1));
}

#[tokio::test]
async fn test_rejected_append_writes_nothing() {
    let store = InMemoryEventStore::new();
    append(&store, "s", ExpectedVersion::NoStream, vec![event("A", 1)])
        .await
        .unwrap();

    let result = append(
        &store,
        "s",
        ExpectedVersion::Exact(3),
        vec![event("B", 1), event("B", 2), event("B", 3)],
    )
    .await;

    assert!(result.is_err());
    assert_eq!(store.read_all("s").unwrap().len(), 1);
}

#[tokio::test]
async fn test_deleted_stream_cannot_be_read_or_written() {
    let store = InMemoryEventStore::new();
    append(&store, "s", ExpectedVersion::NoStream, vec![event("A", 1)])
        .await
        .unwrap();

    store.delete_stream("s").unwrap();

    assert!(matches!(
        store.stream_reader("s").next().await,
        Err(StoreError::Deleted { .. })
    ));
    assert!(matches!(
        append(&store, "s", ExpectedVersion::Any, vec![event("A", 2)]).await,
        Err(StoreError::Deleted { .. })
    ));
    assert!(matches!(store.delete_stream("other"), Err(StoreError::NotFound { .. })));
}

#[tokio::test]
async fn test_concurrent_appends_with_same_expected_version_admit_one_winner() {
    // Arrange
    let store = InMemoryEventStore::new();
    append(&store, "s", ExpectedVersion::NoStream, vec![event("A", 0)])
        .await
        .unwrap();

    // Act
    let mut tasks = Vec::new();
    for n in 1..=8 {
        let store = store.clone();
        tasks.push(tokio::spawn(async move {
            append(&store, "s", ExpectedVersion::Exact(0), vec![event("B", n), event("C", n)]).await
        }));
    }
    let mut winners = 0;
    for task in tasks {
        if task.await.unwrap().is_ok() {
            winners += 1;
        }
    }

    // Assert
    assert_eq!(winners, 1);
    let events = store.read_all("s").unwrap();
    assert_eq!(events.len(), 3);
    assert_eq!(events[1].data, events[2].data);
}

#[tokio::test]
async fn test_clones_share_streams() {
    let store = InMemoryEventStore::new();
    let other = store.clone();

    append(&other, "s", ExpectedVersion::NoStream, vec![event("A", 1)])
        .await
        .unwrap();

    assert_eq!(store.stream_head("s").unwrap(), Some(0));
}
