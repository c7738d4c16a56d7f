//! Event CRUD endpoints

use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::PgPool;
use validator::Validate;

use crate::db::event_repo::{self, NewEvent};
use crate::error::AppError;
use crate::models::views::event_view;
use crate::services::validation;

fn default_preparation_time() -> i64 {
    5
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Deserialize, Validate)]
pub struct EventPayload {
    pub name: String,
    pub description: Option<String>,
    #[validate(url)]
    pub url: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default = "default_preparation_time")]
    pub preparation_time: i64,
    pub rtmp_url: Option<String>,
    pub public_rtmp_url: Option<String>,
    pub test_rtmp_url: Option<String>,
    #[validate(email)]
    pub contact_email: Option<String>,
}

impl EventPayload {
    fn as_new_event(&self) -> NewEvent<'_> {
        NewEvent {
            name: &self.name,
            description: self.description.as_deref(),
            url: self.url.as_deref(),
            starts_at: self.starts_at,
            ends_at: self.ends_at,
            active: self.active,
            preparation_time: self.preparation_time,
            rtmp_url: self.rtmp_url.as_deref(),
            public_rtmp_url: self.public_rtmp_url.as_deref(),
            test_rtmp_url: self.test_rtmp_url.as_deref(),
            contact_email: self.contact_email.as_deref(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct EventListQuery {
    pub name: Option<String>,
    /// Request the reduced public projection.
    #[serde(default)]
    pub public: bool,
}

#[derive(Debug, Deserialize)]
pub struct ViewQuery {
    #[serde(default)]
    pub public: bool,
}

pub async fn list_events(
    pool: web::Data<PgPool>,
    query: web::Query<EventListQuery>,
) -> Result<HttpResponse, AppError> {
    let events = event_repo::list(&pool, query.name.as_deref()).await?;
    let views: Vec<_> = events.iter().map(|e| event_view(e, query.public)).collect();
    Ok(HttpResponse::Ok().json(views))
}

pub async fn create_event(
    pool: web::Data<PgPool>,
    payload: web::Json<EventPayload>,
) -> Result<HttpResponse, AppError> {
    payload.validate()?;
    validation::validate_event_times(payload.starts_at, payload.ends_at, payload.preparation_time)?;

    let event = event_repo::create(&pool, payload.as_new_event()).await?;
    Ok(HttpResponse::Created().json(event_view(&event, false)))
}

pub async fn get_event(
    pool: web::Data<PgPool>,
    path: web::Path<i64>,
    query: web::Query<ViewQuery>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let event = event_repo::find_by_id(&pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("no event with id {}", id)))?;

    Ok(HttpResponse::Ok().json(event_view(&event, query.public)))
}

pub async fn update_event(
    pool: web::Data<PgPool>,
    path: web::Path<i64>,
    payload: web::Json<EventPayload>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    payload.validate()?;
    validation::validate_event_times(payload.starts_at, payload.ends_at, payload.preparation_time)?;

    let event = event_repo::update(&pool, id, payload.as_new_event())
        .await?
        .ok_or_else(|| AppError::NotFound(format!("no event with id {}", id)))?;

    Ok(HttpResponse::Ok().json(event_view(&event, false)))
}

pub async fn delete_event(
    pool: web::Data<PgPool>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    if !event_repo::delete(&pool, id).await? {
        return Err(AppError::NotFound(format!("no event with id {}", id)));
    }
    Ok(HttpResponse::NoContent().finish())
}

pub fn register_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/events")
            .route("", web::get().to(list_events))
            .route("", web::post().to(create_event))
            .route("/{id}", web::get().to(get_event))
            .route("/{id}", web::put().to(update_event))
            .route("/{id}", web::delete().to(delete_event)),
    );
}
