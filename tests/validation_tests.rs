//! Schedule validation against the store: overlap exclusion and the
//! event-bounds policy.

mod common;

use common::{event_at, minutes, stream_at, t0, InMemoryStreamStore};
use muxy::config::{OverlapScope, ValidationPolicy};
use muxy::error::AppError;
use muxy::services::validation::validate_stream;

const PER_EVENT: ValidationPolicy = ValidationPolicy {
    overlap_scope: OverlapScope::PerEvent,
    enforce_event_bounds: true,
};

const GLOBAL: ValidationPolicy = ValidationPolicy {
    overlap_scope: OverlapScope::Global,
    enforce_event_bounds: true,
};

#[tokio::test]
async fn overlapping_stream_is_rejected() {
    let store = InMemoryStreamStore::new();
    let event = event_at(1, t0(), t0() + minutes(120));
    store.insert_stream(stream_at(7, &event, t0(), t0() + minutes(30), "a"));
    store.insert_event(event.clone());

    let err = validate_stream(&store, &event, t0() + minutes(15), t0() + minutes(45), None, PER_EVENT)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::OverlapConflict(_)));
}

#[tokio::test]
async fn adjacent_stream_is_accepted() {
    let store = InMemoryStreamStore::new();
    let event = event_at(1, t0(), t0() + minutes(120));
    store.insert_stream(stream_at(7, &event, t0(), t0() + minutes(30), "a"));
    store.insert_event(event.clone());

    // Half-open ranges: touching at 18:30 is not an overlap.
    validate_stream(&store, &event, t0() + minutes(30), t0() + minutes(60), None, PER_EVENT)
        .await
        .unwrap();
}

#[tokio::test]
async fn update_excludes_the_record_itself() {
    let store = InMemoryStreamStore::new();
    let event = event_at(1, t0(), t0() + minutes(120));
    store.insert_stream(stream_at(7, &event, t0(), t0() + minutes(30), "a"));
    store.insert_event(event.clone());

    // Shifting stream 7 within its own slot must not conflict with itself.
    validate_stream(&store, &event, t0() + minutes(5), t0() + minutes(30), Some(7), PER_EVENT)
        .await
        .unwrap();
}

#[tokio::test]
async fn overlap_scope_decides_cross_event_conflicts() {
    let store = InMemoryStreamStore::new();
    let event_a = event_at(1, t0(), t0() + minutes(120));
    let event_b = event_at(2, t0(), t0() + minutes(120));
    store.insert_stream(stream_at(7, &event_a, t0(), t0() + minutes(30), "a"));
    store.insert_event(event_a);
    store.insert_event(event_b.clone());

    // Same slot, different event: fine per-event, a conflict globally.
    validate_stream(&store, &event_b, t0(), t0() + minutes(30), None, PER_EVENT)
        .await
        .unwrap();

    let err = validate_stream(&store, &event_b, t0(), t0() + minutes(30), None, GLOBAL)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::OverlapConflict(_)));
}

#[tokio::test]
async fn stream_outside_event_window_is_policy_dependent() {
    let store = InMemoryStreamStore::new();
    let event = event_at(1, t0(), t0() + minutes(120));
    store.insert_event(event.clone());

    let err = validate_stream(
        &store,
        &event,
        t0() + minutes(100),
        t0() + minutes(130),
        None,
        PER_EVENT,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::OutOfEventBounds(_)));

    let lax = ValidationPolicy {
        enforce_event_bounds: false,
        ..PER_EVENT
    };
    validate_stream(&store, &event, t0() + minutes(100), t0() + minutes(130), None, lax)
        .await
        .unwrap();
}

#[tokio::test]
async fn inverted_stream_window_is_rejected() {
    let store = InMemoryStreamStore::new();
    let event = event_at(1, t0(), t0() + minutes(120));
    store.insert_event(event.clone());

    let err = validate_stream(&store, &event, t0() + minutes(30), t0(), None, PER_EVENT)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidSchedule(_)));
}
