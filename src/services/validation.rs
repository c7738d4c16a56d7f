//! Validation engine
//!
//! Gates every Event/Stream write before persistence. The checks are
//! pure; the overlap candidates come from the store as a range query and
//! are judged here. Nothing in this module mutates state.

use chrono::{DateTime, Utc};

use crate::config::ValidationPolicy;
use crate::db::StreamStore;
use crate::error::{AppError, Result};
use crate::models::{Event, Stream};

/// Event schedule sanity: the window must not be inverted, and the
/// preparation lead must fit inside the event measured in whole minutes
/// (truncated, matching the minute granularity of `preparation_time`).
pub fn validate_event_times(
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
    preparation_time: i64,
) -> Result<()> {
    if ends_at < starts_at {
        return Err(AppError::InvalidSchedule("event ends before starting".into()));
    }

    if preparation_time < 0 {
        return Err(AppError::InvalidSchedule(
            "preparation time must not be negative".into(),
        ));
    }

    let duration_minutes = (ends_at - starts_at).num_minutes();
    if preparation_time > duration_minutes {
        return Err(AppError::InvalidSchedule(format!(
            "preparation time ({}) is longer than the duration of the event ({})",
            preparation_time, duration_minutes
        )));
    }

    Ok(())
}

/// Pure half-open interval intersection test. Adjacent ranges
/// (`a_end == b_start`) do not overlap.
pub fn overlaps(
    a_start: DateTime<Utc>,
    a_end: DateTime<Utc>,
    b_start: DateTime<Utc>,
    b_end: DateTime<Utc>,
) -> bool {
    a_start < b_end && a_end > b_start
}

/// Stream-level time checks that need no storage round-trip.
pub fn validate_stream_times(
    event: &Event,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
    policy: ValidationPolicy,
) -> Result<()> {
    if ends_at < starts_at {
        return Err(AppError::InvalidSchedule(
            "stream ends before starting".into(),
        ));
    }

    if policy.enforce_event_bounds && (starts_at < event.starts_at || ends_at > event.ends_at) {
        return Err(AppError::OutOfEventBounds(format!(
            "stream ({} - {}) does not fit within event \"{}\" ({} - {})",
            starts_at.to_rfc3339(),
            ends_at.to_rfc3339(),
            event.name,
            event.starts_at.to_rfc3339(),
            event.ends_at.to_rfc3339()
        )));
    }

    Ok(())
}

/// Full stream validation: time checks plus the overlap-exclusion query
/// against the store, excluding the record being updated by identity.
pub async fn validate_stream(
    store: &dyn StreamStore,
    event: &Event,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
    exclude_id: Option<i64>,
    policy: ValidationPolicy,
) -> Result<()> {
    validate_stream_times(event, starts_at, ends_at, policy)?;

    let others = store
        .find_overlapping(policy.overlap_scope, event.id, starts_at, ends_at, exclude_id)
        .await?;
    ensure_no_overlap(&others)?;

    Ok(())
}

fn ensure_no_overlap(others: &[Stream]) -> Result<()> {
    if others.is_empty() {
        return Ok(());
    }

    let described: Vec<String> = others
        .iter()
        .map(|s| {
            format!(
                "{} ({} - {})",
                s.publisher_name,
                s.starts_at.to_rfc3339(),
                s.ends_at.to_rfc3339()
            )
        })
        .collect();

    Err(AppError::OverlapConflict(format!(
        "overlaps with other streams: {}",
        described.join(", ")
    )))
}
