//! Stream queries

use chrono::{DateTime, Duration, Utc};
use sqlx::{PgPool, QueryBuilder};

use crate::config::OverlapScope;
use crate::error::Result;
use crate::models::Stream;

const STREAM_COLUMNS: &str = "id, event_id, publisher_name, publisher_email, description, \
     starts_at, ends_at, key, live_at, created_at, updated_at";

pub struct NewStream<'a> {
    pub event_id: i64,
    pub publisher_name: &'a str,
    pub publisher_email: &'a str,
    pub description: Option<&'a str>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub key: &'a str,
}

pub struct StreamUpdate<'a> {
    pub publisher_name: &'a str,
    pub publisher_email: &'a str,
    pub description: Option<&'a str>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

/// Optional filters for stream listing.
#[derive(Debug, Default)]
pub struct StreamFilter {
    pub event_id: Option<i64>,
    pub publisher_name: Option<String>,
    pub publisher_email: Option<String>,
    pub key: Option<String>,
}

pub async fn create(pool: &PgPool, new: NewStream<'_>) -> Result<Stream> {
    let stream = sqlx::query_as::<_, Stream>(&format!(
        r#"
        INSERT INTO streams (event_id, publisher_name, publisher_email, description,
                             starts_at, ends_at, key)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING {STREAM_COLUMNS}
        "#
    ))
    .bind(new.event_id)
    .bind(new.publisher_name)
    .bind(new.publisher_email)
    .bind(new.description)
    .bind(new.starts_at)
    .bind(new.ends_at)
    .bind(new.key)
    .fetch_one(pool)
    .await?;

    Ok(stream)
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Stream>> {
    let stream = sqlx::query_as::<_, Stream>(&format!(
        "SELECT {STREAM_COLUMNS} FROM streams WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(stream)
}

pub async fn find_by_key(pool: &PgPool, key: &str) -> Result<Option<Stream>> {
    let stream = sqlx::query_as::<_, Stream>(&format!(
        "SELECT {STREAM_COLUMNS} FROM streams WHERE key = $1"
    ))
    .bind(key)
    .fetch_optional(pool)
    .await?;

    Ok(stream)
}

/// List streams ordered by owning event start, then slot start, the
/// order a schedule reads in.
pub async fn list(pool: &PgPool, filter: &StreamFilter) -> Result<Vec<Stream>> {
    let mut qb: QueryBuilder<sqlx::Postgres> = QueryBuilder::new(format!(
        "SELECT s.{} FROM streams s JOIN events e ON e.id = s.event_id WHERE TRUE",
        STREAM_COLUMNS.replace(", ", ", s.")
    ));

    if let Some(event_id) = filter.event_id {
        qb.push(" AND s.event_id = ").push_bind(event_id);
    }
    if let Some(name) = &filter.publisher_name {
        qb.push(" AND s.publisher_name = ").push_bind(name);
    }
    if let Some(email) = &filter.publisher_email {
        qb.push(" AND s.publisher_email = ").push_bind(email);
    }
    if let Some(key) = &filter.key {
        qb.push(" AND s.key = ").push_bind(key);
    }
    qb.push(" ORDER BY e.starts_at DESC, s.starts_at ASC");

    let streams = qb.build_query_as::<Stream>().fetch_all(pool).await?;
    Ok(streams)
}

pub async fn update(pool: &PgPool, id: i64, update: StreamUpdate<'_>) -> Result<Option<Stream>> {
    let stream = sqlx::query_as::<_, Stream>(&format!(
        r#"
        UPDATE streams
        SET publisher_name = $1, publisher_email = $2, description = $3,
            starts_at = $4, ends_at = $5, updated_at = NOW()
        WHERE id = $6
        RETURNING {STREAM_COLUMNS}
        "#
    ))
    .bind(update.publisher_name)
    .bind(update.publisher_email)
    .bind(update.description)
    .bind(update.starts_at)
    .bind(update.ends_at)
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(stream)
}

pub async fn delete(pool: &PgPool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM streams WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Single-field liveness update, isolated from concurrent CRUD edits to
/// the rest of the row. Unknown keys affect zero rows.
pub async fn set_live_at(pool: &PgPool, key: &str, at: Option<DateTime<Utc>>) -> Result<()> {
    sqlx::query("UPDATE streams SET live_at = $1 WHERE key = $2")
        .bind(at)
        .bind(key)
        .execute(pool)
        .await?;

    Ok(())
}

/// Classic half-open interval intersection: `starts_at < $ends AND
/// ends_at > $starts`. Adjacent slots touch but do not overlap.
pub async fn find_overlapping(
    pool: &PgPool,
    scope: OverlapScope,
    event_id: i64,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
    exclude_id: Option<i64>,
) -> Result<Vec<Stream>> {
    let mut qb: QueryBuilder<sqlx::Postgres> = QueryBuilder::new(format!(
        "SELECT {STREAM_COLUMNS} FROM streams WHERE starts_at < "
    ));
    qb.push_bind(ends_at);
    qb.push(" AND ends_at > ").push_bind(starts_at);
    if scope == OverlapScope::PerEvent {
        qb.push(" AND event_id = ").push_bind(event_id);
    }
    if let Some(id) = exclude_id {
        qb.push(" AND id <> ").push_bind(id);
    }

    let streams = qb.build_query_as::<Stream>().fetch_all(pool).await?;
    Ok(streams)
}

/// Streams starting within the lookahead window that have no recorded
/// `preparing` notification yet.
pub async fn find_needing_preparing_notice(
    pool: &PgPool,
    now: DateTime<Utc>,
    lookahead: Duration,
) -> Result<Vec<Stream>> {
    let streams = sqlx::query_as::<_, Stream>(&format!(
        r#"
        SELECT {STREAM_COLUMNS} FROM streams s
        WHERE s.starts_at > $1
          AND s.starts_at <= $2
          AND NOT EXISTS (
              SELECT 1 FROM stream_notifications n
              WHERE n.stream_id = s.id AND n.kind = 'preparing'
          )
        ORDER BY s.starts_at ASC
        "#
    ))
    .bind(now)
    .bind(now + lookahead)
    .fetch_all(pool)
    .await?;

    Ok(streams)
}
