//! Data model and temporal logic
//!
//! `Event` and `Stream` mirror their database rows. The temporal
//! predicates here are pure functions of `(stream, event, now)` and are
//! the single source of truth for admission decisions; nothing about a
//! stream's phase is ever stored. All ranges are half-open `[start, end)`
//! so a boundary instant belongs to the later range, never both.

pub mod views;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A scheduled occasion owning zero or more streams.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub url: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    /// Organizer-controlled flag, independent of the time window.
    pub active: bool,
    /// Lead time in minutes during which publishers may connect early.
    pub preparation_time: i64,
    /// Downstream forwarding target template; `{id}` and `{key}` are
    /// substituted per stream. When unset, ingest is accepted locally.
    pub rtmp_url: Option<String>,
    /// Ingest URL advertised to publishers in notification emails.
    pub public_rtmp_url: Option<String>,
    /// Holding/test target for publishers outside their window.
    pub test_rtmp_url: Option<String>,
    pub contact_email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One performer's time-boxed publishing slot, identified by a secret key.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Stream {
    pub id: i64,
    pub event_id: i64,
    pub publisher_name: String,
    pub publisher_email: String,
    pub description: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub key: String,
    /// Best-effort marker of observed publishing, set on publish-start
    /// and cleared on publish-stop. Never an input to admission.
    pub live_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Phase of a stream relative to a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamPhase {
    Upcoming,
    Preparing,
    Active,
    Ended,
}

impl Event {
    /// True when the event is flagged active and `at` falls in its window.
    pub fn is_active_at(&self, at: DateTime<Utc>) -> bool {
        self.active && self.starts_at <= at && at < self.ends_at
    }

    pub fn preparation(&self) -> Duration {
        Duration::minutes(self.preparation_time)
    }

    pub fn resolved_rtmp_url(&self, stream: &Stream) -> Option<String> {
        self.rtmp_url
            .as_deref()
            .map(|tpl| resolve_rtmp_template(tpl, stream))
    }

    pub fn resolved_test_rtmp_url(&self, stream: &Stream) -> Option<String> {
        self.test_rtmp_url
            .as_deref()
            .map(|tpl| resolve_rtmp_template(tpl, stream))
    }
}

impl Stream {
    /// `[starts_at, ends_at)` — the slot itself.
    pub fn active_range(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        (self.starts_at, self.ends_at)
    }

    /// `[starts_at - preparation_time, starts_at)` — early-connect window.
    pub fn preparing_range(&self, event: &Event) -> (DateTime<Utc>, DateTime<Utc>) {
        (self.starts_at - event.preparation(), self.starts_at)
    }

    /// Union of the preparing and active ranges.
    pub fn valid_range(&self, event: &Event) -> (DateTime<Utc>, DateTime<Utc>) {
        (self.preparing_range(event).0, self.ends_at)
    }

    /// A stream is never active while its event is not.
    pub fn is_active_at(&self, event: &Event, at: DateTime<Utc>) -> bool {
        event.is_active_at(at) && self.starts_at <= at && at < self.ends_at
    }

    /// Preparing-ness is independent of the event's active flag: a
    /// publisher may stage before go-live even while the event is
    /// momentarily flagged off.
    pub fn is_preparing_at(&self, event: &Event, at: DateTime<Utc>) -> bool {
        let (begin, end) = self.preparing_range(event);
        begin <= at && at < end
    }

    pub fn is_valid_at(&self, event: &Event, at: DateTime<Utc>) -> bool {
        self.is_preparing_at(event, at) || self.is_active_at(event, at)
    }

    /// Derive the current phase from wall-clock time alone.
    pub fn phase(&self, event: &Event, at: DateTime<Utc>) -> StreamPhase {
        if self.is_active_at(event, at) {
            StreamPhase::Active
        } else if self.is_preparing_at(event, at) {
            StreamPhase::Preparing
        } else if at < self.preparing_range(event).0 {
            StreamPhase::Upcoming
        } else {
            StreamPhase::Ended
        }
    }
}

/// Substitute `{id}` and `{key}` placeholders in an RTMP URL template.
pub fn resolve_rtmp_template(template: &str, stream: &Stream) -> String {
    template
        .replace("{id}", &stream.id.to_string())
        .replace("{key}", &stream.key)
}

/// Generate an opaque stream key.
pub fn generate_stream_key() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Kinds of publisher notifications, recorded after each send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Created,
    Preparing,
    Removed,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Created => "created",
            NotificationKind::Preparing => "preparing",
            NotificationKind::Removed => "removed",
        }
    }
}

/// Record of a notification email sent for a stream.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StreamNotification {
    pub id: i64,
    pub stream_id: i64,
    pub kind: String,
    pub sent_at: DateTime<Utc>,
}
