//! Stream CRUD endpoints and the key status check

use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::PgPool;
use tracing::warn;
use validator::Validate;

use crate::config::AppConfig;
use crate::db::stream_repo::{self, NewStream, StreamFilter, StreamUpdate};
use crate::db::event_repo;
use crate::error::AppError;
use crate::models::views::stream_view;
use crate::models::generate_stream_key;
use crate::services::{validation, AdmissionService, Notifier};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateStreamPayload {
    pub event: i64,
    pub publisher_name: String,
    #[validate(email)]
    pub publisher_email: String,
    pub description: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    /// Optional caller-supplied key; generated when absent.
    pub key: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateStreamPayload {
    pub publisher_name: String,
    #[validate(email)]
    pub publisher_email: String,
    pub description: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct StreamListQuery {
    pub event_id: Option<i64>,
    pub publisher_name: Option<String>,
    pub publisher_email: Option<String>,
    pub key: Option<String>,
    #[serde(default)]
    pub public: bool,
}

#[derive(Debug, Deserialize)]
pub struct ViewQuery {
    #[serde(default)]
    pub public: bool,
}

#[derive(Debug, Deserialize)]
pub struct CheckKeyQuery {
    pub key: Option<String>,
}

pub async fn list_streams(
    pool: web::Data<PgPool>,
    query: web::Query<StreamListQuery>,
) -> Result<HttpResponse, AppError> {
    let filter = StreamFilter {
        event_id: query.event_id,
        publisher_name: query.publisher_name.clone(),
        publisher_email: query.publisher_email.clone(),
        key: query.key.clone(),
    };
    let streams = stream_repo::list(&pool, &filter).await?;
    let views: Vec<_> = streams.iter().map(|s| stream_view(s, query.public)).collect();
    Ok(HttpResponse::Ok().json(views))
}

pub async fn create_stream(
    pool: web::Data<PgPool>,
    config: web::Data<AppConfig>,
    admission: web::Data<AdmissionService>,
    notifier: web::Data<Notifier>,
    payload: web::Json<CreateStreamPayload>,
) -> Result<HttpResponse, AppError> {
    payload.validate()?;

    let event = event_repo::find_by_id(&pool, payload.event)
        .await?
        .ok_or_else(|| AppError::BadRequest(format!("unknown event {}", payload.event)))?;

    validation::validate_stream(
        admission.store().as_ref(),
        &event,
        payload.starts_at,
        payload.ends_at,
        None,
        config.validation_policy(),
    )
    .await?;

    let key = payload.key.clone().unwrap_or_else(generate_stream_key);
    let stream = stream_repo::create(
        &pool,
        NewStream {
            event_id: event.id,
            publisher_name: &payload.publisher_name,
            publisher_email: &payload.publisher_email,
            description: payload.description.as_deref(),
            starts_at: payload.starts_at,
            ends_at: payload.ends_at,
            key: &key,
        },
    )
    .await?;

    // Notification failures must not roll back the signup.
    if let Err(e) = notifier.stream_created(&stream, &event).await {
        warn!(stream_id = stream.id, error = %e, "failed to send creation notification");
    }

    Ok(HttpResponse::Created().json(stream_view(&stream, false)))
}

pub async fn get_stream(
    pool: web::Data<PgPool>,
    path: web::Path<i64>,
    query: web::Query<ViewQuery>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let stream = stream_repo::find_by_id(&pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("no stream with id {}", id)))?;

    Ok(HttpResponse::Ok().json(stream_view(&stream, query.public)))
}

pub async fn update_stream(
    pool: web::Data<PgPool>,
    config: web::Data<AppConfig>,
    admission: web::Data<AdmissionService>,
    path: web::Path<i64>,
    payload: web::Json<UpdateStreamPayload>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    payload.validate()?;

    let existing = stream_repo::find_by_id(&pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("no stream with id {}", id)))?;
    let event = event_repo::find_by_id(&pool, existing.event_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("no event with id {}", existing.event_id)))?;

    validation::validate_stream(
        admission.store().as_ref(),
        &event,
        payload.starts_at,
        payload.ends_at,
        Some(id),
        config.validation_policy(),
    )
    .await?;

    let stream = stream_repo::update(
        &pool,
        id,
        StreamUpdate {
            publisher_name: &payload.publisher_name,
            publisher_email: &payload.publisher_email,
            description: payload.description.as_deref(),
            starts_at: payload.starts_at,
            ends_at: payload.ends_at,
        },
    )
    .await?
    .ok_or_else(|| AppError::NotFound(format!("no stream with id {}", id)))?;

    Ok(HttpResponse::Ok().json(stream_view(&stream, false)))
}

pub async fn delete_stream(
    pool: web::Data<PgPool>,
    notifier: web::Data<Notifier>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let stream = stream_repo::find_by_id(&pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("no stream with id {}", id)))?;
    let event = event_repo::find_by_id(&pool, stream.event_id).await?;

    if !stream_repo::delete(&pool, id).await? {
        return Err(AppError::NotFound(format!("no stream with id {}", id)));
    }

    if let Some(event) = event {
        if let Err(e) = notifier.stream_removed(&stream, &event).await {
            warn!(stream_id = stream.id, error = %e, "failed to send removal notification");
        }
    }

    Ok(HttpResponse::NoContent().finish())
}

/// Diagnostic status for a stream key: current phase and the window
/// boundaries that matter for it, as human-readable text.
pub async fn check_key(
    admission: web::Data<AdmissionService>,
    query: web::Query<CheckKeyQuery>,
) -> Result<HttpResponse, AppError> {
    let key = query
        .key
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::BadRequest("missing key parameter".into()))?;

    let report = admission.check_key(key, Utc::now()).await?;
    Ok(HttpResponse::Ok().body(report))
}

pub fn register_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/streams")
            .route("", web::get().to(list_streams))
            .route("", web::post().to(create_stream))
            .route("/check-key", web::get().to(check_key))
            .route("/{id}", web::get().to(get_stream))
            .route("/{id}", web::put().to(update_stream))
            .route("/{id}", web::delete().to(delete_stream)),
    );
}
