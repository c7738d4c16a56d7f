//! Admission control for publish callbacks
//!
//! nginx-rtmp calls back on publish-start, publish-stop and on a fixed
//! update interval; this service answers whether the stream behind a key
//! may publish right now, and where its media should go. Every decision
//! is recomputed from `(stream, event, now)`; the only persisted side
//! effect is the `live_at` liveness timestamp.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

use crate::db::StreamStore;
use crate::error::{AppError, Result};
use crate::models::StreamPhase;

/// Outcome of an allowed publish attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishDecision {
    /// Accept ingest locally, no downstream forwarding.
    Allow,
    /// Accept and redirect the publisher to the resolved RTMP target.
    Redirect(String),
}

#[derive(Clone)]
pub struct AdmissionService {
    store: Arc<dyn StreamStore>,
    /// Grace window between two on-update callbacks; compensates for
    /// clock skew between the media server and this service.
    update_timeout: Duration,
}

impl AdmissionService {
    pub fn new(store: Arc<dyn StreamStore>, update_timeout_secs: u64) -> Self {
        Self {
            store,
            update_timeout: Duration::seconds(update_timeout_secs as i64),
        }
    }

    pub fn store(&self) -> &Arc<dyn StreamStore> {
        &self.store
    }

    /// Publish-start. The publisher is connecting; decide admission and
    /// the redirect target. nginx-rtmp evaluates redirects only at this
    /// point, never during an established session.
    pub async fn on_publish(&self, key: &str, now: DateTime<Utc>) -> Result<PublishDecision> {
        let (stream, event) = self
            .store
            .find_by_key(key)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("no stream with key {}", key)))?;

        if !stream.is_valid_at(&event, now) {
            // Escape hatch: an out-of-window publisher can still be
            // parked on the test target instead of a hard reject.
            if let Some(url) = event.resolved_test_rtmp_url(&stream) {
                warn!(stream_id = stream.id, %now, "stream not valid, redirecting to test target");
                return Ok(PublishDecision::Redirect(url));
            }
            warn!(stream_id = stream.id, %now, "stream not valid, rejecting publish");
            return Err(AppError::Forbidden("stream is not valid now".into()));
        }

        if let Some(url) = event.resolved_rtmp_url(&stream) {
            if stream.is_preparing_at(&event, now) {
                // Test destinations take priority over a silent local
                // accept even while preparing.
                if let Some(test_url) = event.resolved_test_rtmp_url(&stream) {
                    info!(stream_id = stream.id, "stream preparing, redirecting to test target");
                    return Ok(PublishDecision::Redirect(test_url));
                }
                info!(stream_id = stream.id, "stream preparing, accepting without redirect");
                return Ok(PublishDecision::Allow);
            }

            // Active: mark liveness and forward downstream.
            self.store.set_live_at(key, Some(now)).await?;
            info!(stream_id = stream.id, "stream active, redirecting downstream");
            return Ok(PublishDecision::Redirect(url));
        }

        info!(stream_id = stream.id, "stream valid, accepting without redirect");
        Ok(PublishDecision::Allow)
    }

    /// Publish-stop. Clears liveness; idempotent, and an unknown key is
    /// a no-op because nginx-rtmp ignores this callback's response.
    pub async fn on_publish_done(&self, key: &str) -> Result<()> {
        self.store.set_live_at(key, None).await?;
        info!(%key, "stream stopped publishing");
        Ok(())
    }

    /// Periodic heartbeat while publishing. Returning an error here
    /// makes nginx-rtmp drop the connection, which is the only lever to
    /// force a reconnect (and thereby a fresh redirect decision).
    pub async fn on_update(&self, key: &str, now: DateTime<Utc>) -> Result<()> {
        let (stream, event) = self
            .store
            .find_by_key(key)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("no stream with key {}", key)))?;

        let last = now - self.update_timeout;

        if stream.is_preparing_at(&event, last) && stream.is_active_at(&event, now) {
            info!(stream_id = stream.id, "stream crossed into active, forcing reconnect");
            return Err(AppError::Forbidden(
                "stream was preparing and is now active; reconnect to get redirected".into(),
            ));
        }

        if stream.is_active_at(&event, last) && !stream.is_active_at(&event, now) {
            info!(stream_id = stream.id, "stream no longer active, disconnecting");
            return Err(AppError::Forbidden(
                "stream was active and is no longer; disconnect".into(),
            ));
        }

        if !stream.is_valid_at(&event, now) && event.test_rtmp_url.is_none() {
            warn!(stream_id = stream.id, %now, "stream not valid, disconnecting");
            return Err(AppError::Forbidden("stream is not valid now".into()));
        }

        Ok(())
    }

    /// Side-effect-free status report for a stream key, with the window
    /// that matters for the current phase.
    pub async fn check_key(&self, key: &str, now: DateTime<Utc>) -> Result<String> {
        let (stream, event) = self
            .store
            .find_by_key(key)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("there is no stream with the key {}", key)))?;

        let report = match stream.phase(&event, now) {
            StreamPhase::Preparing => {
                let (begin, end) = stream.preparing_range(&event);
                format!(
                    "Stream is preparing ({}). You can start streaming now (from {} to {}), \
                     but stream will not be published to end server yet.",
                    fmt(now),
                    fmt(begin),
                    fmt(end)
                )
            }
            StreamPhase::Active => {
                let (begin, end) = stream.active_range();
                format!(
                    "Stream is active now ({}). You can stream now! (from {} to {})",
                    fmt(now),
                    fmt(begin),
                    fmt(end)
                )
            }
            StreamPhase::Upcoming | StreamPhase::Ended => {
                let (begin, end) = stream.valid_range(&event);
                format!(
                    "Stream is not valid now ({}). You are allowed to stream from {} to {}",
                    fmt(now),
                    fmt(begin),
                    fmt(end)
                )
            }
        };

        Ok(report)
    }
}

fn fmt(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S %Z").to_string()
}
