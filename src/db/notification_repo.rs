//! Notification send-log queries

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::error::Result;
use crate::models::{NotificationKind, StreamNotification};

/// Record a sent notification so it is never sent twice.
pub async fn record(
    pool: &PgPool,
    stream_id: i64,
    kind: NotificationKind,
    sent_at: DateTime<Utc>,
) -> Result<StreamNotification> {
    let notification = sqlx::query_as::<_, StreamNotification>(
        r#"
        INSERT INTO stream_notifications (stream_id, kind, sent_at)
        VALUES ($1, $2, $3)
        RETURNING id, stream_id, kind, sent_at
        "#,
    )
    .bind(stream_id)
    .bind(kind.as_str())
    .bind(sent_at)
    .fetch_one(pool)
    .await?;

    Ok(notification)
}

pub async fn exists(pool: &PgPool, stream_id: i64, kind: NotificationKind) -> Result<bool> {
    let row: (bool,) = sqlx::query_as(
        "SELECT EXISTS(SELECT 1 FROM stream_notifications WHERE stream_id = $1 AND kind = $2)",
    )
    .bind(stream_id)
    .bind(kind.as_str())
    .fetch_one(pool)
    .await?;

    Ok(row.0)
}
