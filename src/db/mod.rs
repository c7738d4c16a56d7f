//! Persistence layer
//!
//! Plain repository modules (free async fns over `&PgPool`) back the
//! CRUD surface. The admission core depends only on the narrow
//! [`StreamStore`] contract so it can be exercised against an in-memory
//! store in tests.

pub mod event_repo;
pub mod notification_repo;
pub mod stream_repo;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::config::OverlapScope;
use crate::error::Result;
use crate::models::{Event, Stream};

pub async fn connect(database_url: &str) -> std::result::Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
}

/// The storage contract the admission core and validation engine need.
#[async_trait]
pub trait StreamStore: Send + Sync {
    /// Look up a stream and its owning event by stream key.
    async fn find_by_key(&self, key: &str) -> Result<Option<(Stream, Event)>>;

    /// Atomically set or clear the liveness timestamp of the stream with
    /// the given key. Touches only that field; unknown keys are a no-op.
    async fn set_live_at(&self, key: &str, at: Option<DateTime<Utc>>) -> Result<()>;

    /// Streams whose `[starts_at, ends_at)` intersects the given range,
    /// excluding `exclude_id` when updating an existing record.
    async fn find_overlapping(
        &self,
        scope: OverlapScope,
        event_id: i64,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
        exclude_id: Option<i64>,
    ) -> Result<Vec<Stream>>;
}

/// Postgres-backed [`StreamStore`].
#[derive(Clone)]
pub struct PgStreamStore {
    pool: PgPool,
}

impl PgStreamStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StreamStore for PgStreamStore {
    async fn find_by_key(&self, key: &str) -> Result<Option<(Stream, Event)>> {
        let Some(stream) = stream_repo::find_by_key(&self.pool, key).await? else {
            return Ok(None);
        };
        let event = event_repo::find_by_id(&self.pool, stream.event_id)
            .await?
            .ok_or_else(|| sqlx::Error::RowNotFound)?;
        Ok(Some((stream, event)))
    }

    async fn set_live_at(&self, key: &str, at: Option<DateTime<Utc>>) -> Result<()> {
        stream_repo::set_live_at(&self.pool, key, at).await
    }

    async fn find_overlapping(
        &self,
        scope: OverlapScope,
        event_id: i64,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
        exclude_id: Option<i64>,
    ) -> Result<Vec<Stream>> {
        stream_repo::find_overlapping(&self.pool, scope, event_id, starts_at, ends_at, exclude_id)
            .await
    }
}
