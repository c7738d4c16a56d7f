#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};

use muxy::config::OverlapScope;
use muxy::db::StreamStore;
use muxy::error::Result;
use muxy::models::{Event, Stream};
use muxy::services::validation;

/// In-memory stand-in for the Postgres store, implementing the same
/// narrow contract the admission core depends on.
#[derive(Default)]
pub struct InMemoryStreamStore {
    inner: Mutex<State>,
}

#[derive(Default)]
struct State {
    events: HashMap<i64, Event>,
    streams: Vec<Stream>,
}

impl InMemoryStreamStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_event(&self, event: Event) {
        self.inner.lock().unwrap().events.insert(event.id, event);
    }

    pub fn insert_stream(&self, stream: Stream) {
        self.inner.lock().unwrap().streams.push(stream);
    }

    /// Current liveness timestamp of the stream with the given key.
    pub fn live_at(&self, key: &str) -> Option<DateTime<Utc>> {
        self.inner
            .lock()
            .unwrap()
            .streams
            .iter()
            .find(|s| s.key == key)
            .and_then(|s| s.live_at)
    }
}

#[async_trait]
impl StreamStore for InMemoryStreamStore {
    async fn find_by_key(&self, key: &str) -> Result<Option<(Stream, Event)>> {
        let state = self.inner.lock().unwrap();
        let Some(stream) = state.streams.iter().find(|s| s.key == key).cloned() else {
            return Ok(None);
        };
        let event = state
            .events
            .get(&stream.event_id)
            .cloned()
            .expect("stream fixture references a known event");
        Ok(Some((stream, event)))
    }

    async fn set_live_at(&self, key: &str, at: Option<DateTime<Utc>>) -> Result<()> {
        let mut state = self.inner.lock().unwrap();
        if let Some(stream) = state.streams.iter_mut().find(|s| s.key == key) {
            stream.live_at = at;
        }
        Ok(())
    }

    async fn find_overlapping(
        &self,
        scope: OverlapScope,
        event_id: i64,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
        exclude_id: Option<i64>,
    ) -> Result<Vec<Stream>> {
        let state = self.inner.lock().unwrap();
        let streams = state
            .streams
            .iter()
            .filter(|s| scope == OverlapScope::Global || s.event_id == event_id)
            .filter(|s| Some(s.id) != exclude_id)
            .filter(|s| validation::overlaps(s.starts_at, s.ends_at, starts_at, ends_at))
            .cloned()
            .collect();
        Ok(streams)
    }
}

/// Reference instant all fixed-time fixtures hang off.
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 21, 18, 0, 0).unwrap()
}

pub fn minutes(m: i64) -> Duration {
    Duration::minutes(m)
}

pub fn event_at(id: i64, starts_at: DateTime<Utc>, ends_at: DateTime<Utc>) -> Event {
    Event {
        id,
        name: format!("Event #{id}"),
        description: None,
        url: None,
        starts_at,
        ends_at,
        active: true,
        preparation_time: 10,
        rtmp_url: None,
        public_rtmp_url: None,
        test_rtmp_url: None,
        contact_email: None,
        created_at: starts_at,
        updated_at: starts_at,
    }
}

pub fn stream_at(
    id: i64,
    event: &Event,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
    key: &str,
) -> Stream {
    Stream {
        id,
        event_id: event.id,
        publisher_name: format!("Performer #{id}"),
        publisher_email: format!("performer{id}@example.com"),
        description: None,
        starts_at,
        ends_at,
        key: key.to_string(),
        live_at: None,
        created_at: starts_at,
        updated_at: starts_at,
    }
}
