//! Public/private projections
//!
//! API responses come in two shapes: the private view (organizer
//! tooling, sees everything) and the public view (embeddable schedule,
//! must not leak stream keys, publisher emails, or forwarding targets).
//! The reduction is an explicit function of a capability flag rather
//! than dispatch on caller identity.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{Event, Stream};

#[derive(Debug, Clone, Serialize)]
pub struct EventView {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub url: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub active: bool,
    pub preparation_time: i64,
    pub public_rtmp_url: Option<String>,
    pub contact_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rtmp_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_rtmp_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StreamView {
    pub id: i64,
    pub event_id: i64,
    pub publisher_name: String,
    pub description: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub live_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

/// Project an event for serialization, dropping forwarding targets from
/// the public view.
pub fn event_view(event: &Event, is_public_view: bool) -> EventView {
    EventView {
        id: event.id,
        name: event.name.clone(),
        description: event.description.clone(),
        url: event.url.clone(),
        starts_at: event.starts_at,
        ends_at: event.ends_at,
        active: event.active,
        preparation_time: event.preparation_time,
        public_rtmp_url: event.public_rtmp_url.clone(),
        contact_email: event.contact_email.clone(),
        rtmp_url: (!is_public_view).then(|| event.rtmp_url.clone()).flatten(),
        test_rtmp_url: (!is_public_view)
            .then(|| event.test_rtmp_url.clone())
            .flatten(),
    }
}

/// Project a stream, dropping the key and publisher email from the
/// public view.
pub fn stream_view(stream: &Stream, is_public_view: bool) -> StreamView {
    StreamView {
        id: stream.id,
        event_id: stream.event_id,
        publisher_name: stream.publisher_name.clone(),
        description: stream.description.clone(),
        starts_at: stream.starts_at,
        ends_at: stream.ends_at,
        live_at: stream.live_at,
        publisher_email: (!is_public_view).then(|| stream.publisher_email.clone()),
        key: (!is_public_view).then(|| stream.key.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixtures() -> (Event, Stream) {
        let t0 = Utc.with_ymd_and_hms(2025, 6, 21, 18, 0, 0).unwrap();
        let event = Event {
            id: 1,
            name: "Solstice".into(),
            description: None,
            url: None,
            starts_at: t0,
            ends_at: t0 + chrono::Duration::hours(2),
            active: true,
            preparation_time: 5,
            rtmp_url: Some("rtmp://downstream/{key}".into()),
            public_rtmp_url: Some("rtmp://ingest/live".into()),
            test_rtmp_url: Some("rtmp://test/{key}".into()),
            contact_email: Some("org@example.com".into()),
            created_at: t0,
            updated_at: t0,
        };
        let stream = Stream {
            id: 2,
            event_id: 1,
            publisher_name: "Performer".into(),
            publisher_email: "p@example.com".into(),
            description: None,
            starts_at: t0,
            ends_at: t0 + chrono::Duration::minutes(30),
            key: "k".into(),
            live_at: None,
            created_at: t0,
            updated_at: t0,
        };
        (event, stream)
    }

    #[test]
    fn public_view_hides_secrets() {
        let (event, stream) = fixtures();

        let ev = serde_json::to_value(event_view(&event, true)).unwrap();
        assert!(ev.get("rtmp_url").is_none());
        assert!(ev.get("test_rtmp_url").is_none());
        assert_eq!(ev["public_rtmp_url"], "rtmp://ingest/live");

        let sv = serde_json::to_value(stream_view(&stream, true)).unwrap();
        assert!(sv.get("key").is_none());
        assert!(sv.get("publisher_email").is_none());
    }

    #[test]
    fn private_view_is_complete() {
        let (event, stream) = fixtures();

        let ev = serde_json::to_value(event_view(&event, false)).unwrap();
        assert_eq!(ev["rtmp_url"], "rtmp://downstream/{key}");

        let sv = serde_json::to_value(stream_view(&stream, false)).unwrap();
        assert_eq!(sv["key"], "k");
        assert_eq!(sv["publisher_email"], "p@example.com");
    }
}
