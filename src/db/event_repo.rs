//! Event queries

use chrono::{DateTime, Utc};
use sqlx::{PgPool, QueryBuilder};

use crate::error::Result;
use crate::models::Event;

const EVENT_COLUMNS: &str = "id, name, description, url, starts_at, ends_at, active, \
     preparation_time, rtmp_url, public_rtmp_url, test_rtmp_url, contact_email, \
     created_at, updated_at";

pub struct NewEvent<'a> {
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub url: Option<&'a str>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub active: bool,
    pub preparation_time: i64,
    pub rtmp_url: Option<&'a str>,
    pub public_rtmp_url: Option<&'a str>,
    pub test_rtmp_url: Option<&'a str>,
    pub contact_email: Option<&'a str>,
}

pub async fn create(pool: &PgPool, new: NewEvent<'_>) -> Result<Event> {
    let event = sqlx::query_as::<_, Event>(&format!(
        r#"
        INSERT INTO events (name, description, url, starts_at, ends_at, active,
                            preparation_time, rtmp_url, public_rtmp_url,
                            test_rtmp_url, contact_email)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        RETURNING {EVENT_COLUMNS}
        "#
    ))
    .bind(new.name)
    .bind(new.description)
    .bind(new.url)
    .bind(new.starts_at)
    .bind(new.ends_at)
    .bind(new.active)
    .bind(new.preparation_time)
    .bind(new.rtmp_url)
    .bind(new.public_rtmp_url)
    .bind(new.test_rtmp_url)
    .bind(new.contact_email)
    .fetch_one(pool)
    .await?;

    Ok(event)
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Event>> {
    let event = sqlx::query_as::<_, Event>(&format!(
        "SELECT {EVENT_COLUMNS} FROM events WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(event)
}

/// List events, newest first, optionally filtered by exact name.
pub async fn list(pool: &PgPool, name: Option<&str>) -> Result<Vec<Event>> {
    let mut qb: QueryBuilder<sqlx::Postgres> =
        QueryBuilder::new(format!("SELECT {EVENT_COLUMNS} FROM events WHERE TRUE"));

    if let Some(name) = name {
        qb.push(" AND name = ").push_bind(name);
    }
    qb.push(" ORDER BY starts_at DESC");

    let events = qb.build_query_as::<Event>().fetch_all(pool).await?;
    Ok(events)
}

pub async fn update(pool: &PgPool, id: i64, new: NewEvent<'_>) -> Result<Option<Event>> {
    let event = sqlx::query_as::<_, Event>(&format!(
        r#"
        UPDATE events
        SET name = $1, description = $2, url = $3, starts_at = $4, ends_at = $5,
            active = $6, preparation_time = $7, rtmp_url = $8, public_rtmp_url = $9,
            test_rtmp_url = $10, contact_email = $11, updated_at = NOW()
        WHERE id = $12
        RETURNING {EVENT_COLUMNS}
        "#
    ))
    .bind(new.name)
    .bind(new.description)
    .bind(new.url)
    .bind(new.starts_at)
    .bind(new.ends_at)
    .bind(new.active)
    .bind(new.preparation_time)
    .bind(new.rtmp_url)
    .bind(new.public_rtmp_url)
    .bind(new.test_rtmp_url)
    .bind(new.contact_email)
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(event)
}

pub async fn delete(pool: &PgPool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM events WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
