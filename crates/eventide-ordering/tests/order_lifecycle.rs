//! End-to-end order lifecycle through the repository, store and bus.

use std::sync::Arc;

use eventide_core::aggregate::{Aggregate, AggregateKind};
use eventide_core::bus::{EventBus, InProcessEventBus};
use eventide_core::error::{RepositoryError, StoreError};
use eventide_core::event::AGGREGATE_ID_HEADER;
use eventide_core::repository::{Repository, RepositoryExt};
use eventide_event_store::InMemoryEventStore;
use eventide_ordering::domain::aggregates::{Order, OrderStatus};
use eventide_ordering::domain::events::{OrderCreated, OrderShipped};
use eventide_ordering::wiring::{order_repository, subscribe_to_order_events};
use eventide_test_support::{FailingEventStore, FixedClock, RecordingEventHandler};
use uuid::Uuid;

struct Harness {
    store: InMemoryEventStore,
    handler: Arc<RecordingEventHandler>,
    repository: eventide_core::repository::EventSourcedRepository,
    clock: FixedClock,
}

fn harness() -> Harness {
    let store = InMemoryEventStore::new();
    let handler = Arc::new(RecordingEventHandler::new("recorder"));
    let mut bus = InProcessEventBus::new();
    subscribe_to_order_events(&mut bus, handler.clone());
    let bus: Arc<dyn EventBus> = Arc::new(bus);
    let repository = order_repository(Arc::new(store.clone()), Some(bus)).unwrap();
    Harness {
        store,
        handler,
        repository,
        clock: FixedClock::reference(),
    }
}

#[tokio::test]
async fn test_created_and_shipped_order_round_trips_through_the_store() {
    // Arrange
    let h = harness();
    let mut order = Order::with_id("Order-1".into());
    order.create("Ada", Uuid::new_v4(), &h.clock).unwrap();
    order.ship("Parcelforce", Uuid::new_v4(), &h.clock).unwrap();
    assert_eq!(order.changes().len(), 2);

    // Act
    h.repository.save(&mut order, Some(-1)).await.unwrap();
    let loaded = h.repository.load("order", "Order-1").await.unwrap();

    // Assert
    let stream = h.store.read_all("order-Order-1").unwrap();
    assert_eq!(stream.len(), 2);
    assert_eq!(stream[0].stream_position, 0);
    assert_eq!(stream[0].event_type, "OrderCreated");
    assert_eq!(stream[1].stream_position, 1);
    assert_eq!(stream[1].event_type, "OrderShipped");
    assert_eq!(stream[1].metadata[AGGREGATE_ID_HEADER], "Order-1");

    assert_eq!(loaded.current_version(), 1);
    assert_eq!(loaded.original_version(), 1);
    assert!(loaded.changes().is_empty());
    let loaded = eventide_core::downcast::AsAny::as_any(&*loaded)
        .downcast_ref::<Order>()
        .unwrap();
    assert_eq!(loaded.status(), OrderStatus::Shipped);
    assert_eq!(loaded.customer(), Some("Ada"));
    assert_eq!(loaded.carrier(), Some("Parcelforce"));
}

#[tokio::test]
async fn test_save_publishes_committed_events_in_order() {
    let h = harness();
    let mut order = Order::with_id("Order-1".into());
    order.create("Ada", Uuid::new_v4(), &h.clock).unwrap();
    order.ship("Parcelforce", Uuid::new_v4(), &h.clock).unwrap();

    h.repository.save(&mut order, Some(-1)).await.unwrap();

    let handled = h.handler.handled();
    assert_eq!(h.handler.handled_types(), vec!["OrderCreated", "OrderShipped"]);
    assert!(handled.iter().all(|e| e.committed()));
    assert_eq!(handled[0].version(), Some(0));
    assert_eq!(handled[1].version(), Some(1));
    assert_eq!(
        handled[1].payload_as::<OrderShipped>().map(|e| e.carrier.as_str()),
        Some("Parcelforce")
    );
    assert!(order.changes().is_empty());
}

#[tokio::test]
async fn test_replayed_events_are_committed_and_carry_positions() {
    let h = harness();
    let mut order = Order::with_id("Order-1".into());
    order.create("Ada", Uuid::new_v4(), &h.clock).unwrap();
    h.repository.save(&mut order, Some(-1)).await.unwrap();

    let mut loaded = h.repository.load_as::<Order>("Order-1").await.unwrap();
    loaded.ship("Parcelforce", Uuid::new_v4(), &h.clock).unwrap();

    assert_eq!(loaded.original_version(), 0);
    assert_eq!(loaded.current_version(), 1);
    assert_eq!(loaded.changes()[0].version(), Some(1));
    assert_eq!(
        loaded.placed_at(),
        h.handler.handled()[0]
            .payload_as::<OrderCreated>()
            .map(|e| e.placed_at)
    );
}

#[tokio::test]
async fn test_concurrent_writers_one_wins_other_gets_concurrency_violation() {
    // Arrange
    let h = harness();
    let mut order = Order::with_id("Order-1".into());
    order.create("Ada", Uuid::new_v4(), &h.clock).unwrap();
    h.repository.save(&mut order, Some(-1)).await.unwrap();

    let mut first = h.repository.load_as::<Order>("Order-1").await.unwrap();
    let mut second = h.repository.load_as::<Order>("Order-1").await.unwrap();
    first.ship("Parcelforce", Uuid::new_v4(), &h.clock).unwrap();
    second.cancel("duplicate", Uuid::new_v4(), &h.clock).unwrap();

    // Act
    let first_expected = first.original_version();
    let second_expected = second.original_version();
    h.repository
        .save(&mut first, Some(first_expected))
        .await
        .unwrap();
    let err = h
        .repository
        .save(&mut second, Some(second_expected))
        .await
        .unwrap_err();

    // Assert
    assert!(err.is_concurrency_violation());
    assert!(matches!(
        err,
        RepositoryError::ConcurrencyViolation { ref stream_name, .. } if stream_name == "order-Order-1"
    ));
    assert_eq!(second.changes().len(), 1);
    let stream = h.store.read_all("order-Order-1").unwrap();
    assert_eq!(stream.len(), 2);
    assert_eq!(stream[1].event_type, "OrderShipped");
    assert_eq!(h.handler.handled_types(), vec!["OrderCreated", "OrderShipped"]);
}

#[tokio::test]
async fn test_reload_and_retry_after_concurrency_violation() {
    let h = harness();
    let mut order = Order::with_id("Order-1".into());
    order.create("Ada", Uuid::new_v4(), &h.clock).unwrap();
    h.repository.save(&mut order, Some(-1)).await.unwrap();
    let mut stale = Order::with_id("Order-1".into());
    stale.create("Ada", Uuid::new_v4(), &h.clock).unwrap();
    stale.cancel("duplicate", Uuid::new_v4(), &h.clock).unwrap();
    let err = h.repository.save(&mut stale, Some(-1)).await.unwrap_err();
    assert!(err.is_concurrency_violation());

    let mut fresh = h.repository.load_as::<Order>("Order-1").await.unwrap();
    fresh.cancel("duplicate", Uuid::new_v4(), &h.clock).unwrap();
    let expected = fresh.original_version();
    h.repository.save(&mut fresh, Some(expected)).await.unwrap();

    let reloaded = h.repository.load_as::<Order>("Order-1").await.unwrap();
    assert_eq!(reloaded.status(), OrderStatus::Cancelled);
    assert_eq!(reloaded.current_version(), 1);
}

#[tokio::test]
async fn test_loading_unknown_order_is_not_found() {
    let h = harness();

    let err = h.repository.load("order", "Order-404").await.unwrap_err();

    assert!(matches!(err, RepositoryError::AggregateNotFound { .. }));
}

#[tokio::test]
async fn test_loading_deleted_order_is_unexpected() {
    let h = harness();
    let mut order = Order::with_id("Order-1".into());
    order.create("Ada", Uuid::new_v4(), &h.clock).unwrap();
    h.repository.save(&mut order, Some(-1)).await.unwrap();
    h.store.delete_stream("order-Order-1").unwrap();

    let err = h.repository.load("order", "Order-1").await.unwrap_err();

    let RepositoryError::Unexpected(source) = err else {
        panic!("expected Unexpected, got {err:?}");
    };
    assert!(source.downcast_ref::<StoreError>().is_some());
}

#[tokio::test]
async fn test_failed_append_leaves_stream_and_aggregate_untouched() {
    // Arrange
    let h = harness();
    let mut order = Order::with_id("Order-1".into());
    order.create("Ada", Uuid::new_v4(), &h.clock).unwrap();
    h.repository.save(&mut order, Some(-1)).await.unwrap();
    let flaky = FailingEventStore::on_append(h.store.clone(), || StoreError::TemporarilyUnavailable);
    let repository = order_repository(Arc::new(flaky), None).unwrap();
    let mut loaded = repository.load_as::<Order>("Order-1").await.unwrap();
    loaded.ship("Parcelforce", Uuid::new_v4(), &h.clock).unwrap();

    // Act
    let expected = loaded.original_version();
    let err = repository
        .save(&mut loaded, Some(expected))
        .await
        .unwrap_err();

    // Assert
    assert!(err.is_retryable());
    assert_eq!(loaded.changes().len(), 1);
    assert_eq!(h.store.stream_head("order-Order-1").unwrap(), Some(0));
}

#[tokio::test]
async fn test_unauthorized_store_is_reported() {
    let repository = order_repository(Arc::new(FailingEventStore::unauthorized()), None).unwrap();

    let err = repository.load("order", "Order-1").await.unwrap_err();

    assert!(matches!(err, RepositoryError::Unauthorized));
}
