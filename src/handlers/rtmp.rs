//! nginx-rtmp callback endpoints
//!
//! nginx-rtmp posts form-encoded bodies and makes the stream key
//! available via the `name` field. A 2xx response allows the publish, a
//! 3xx with an `rtmp://` Location redirects it, and anything else drops
//! the connection.

use actix_web::http::header;
use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::Deserialize;

use crate::error::AppError;
use crate::metrics;
use crate::services::{AdmissionService, PublishDecision};

/// nginx-rtmp makes the stream key available via the `name` field and
/// the publisher address via `addr`; the other posted fields are
/// ignored.
#[derive(Debug, Deserialize)]
pub struct CallbackForm {
    pub name: Option<String>,
    pub addr: Option<String>,
}

impl CallbackForm {
    fn stream_key(&self) -> Result<&str, AppError> {
        self.name
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AppError::BadRequest("missing stream name".into()))
    }

    fn remote(&self) -> &str {
        self.addr.as_deref().unwrap_or("-")
    }
}

pub async fn on_publish(
    admission: web::Data<AdmissionService>,
    form: web::Form<CallbackForm>,
) -> Result<HttpResponse, AppError> {
    let key = form.stream_key()?;
    tracing::debug!(remote = form.remote(), "publish callback");

    match admission.on_publish(key, Utc::now()).await {
        Ok(PublishDecision::Allow) => {
            metrics::record_decision("publish", "allow");
            Ok(HttpResponse::Ok().body("OK"))
        }
        Ok(PublishDecision::Redirect(url)) => {
            metrics::record_decision("publish", "redirect");
            Ok(HttpResponse::Found()
                .insert_header((header::LOCATION, url))
                .finish())
        }
        Err(e) => {
            metrics::record_decision("publish", outcome_label(&e));
            Err(e)
        }
    }
}

pub async fn on_publish_done(
    admission: web::Data<AdmissionService>,
    form: web::Form<CallbackForm>,
) -> Result<HttpResponse, AppError> {
    let key = form.stream_key()?;

    admission.on_publish_done(key).await?;
    metrics::record_decision("publish_done", "ok");

    // Response is ignored by nginx-rtmp.
    Ok(HttpResponse::Ok().body("OK"))
}

pub async fn on_update(
    admission: web::Data<AdmissionService>,
    form: web::Form<CallbackForm>,
) -> Result<HttpResponse, AppError> {
    let key = form.stream_key()?;

    match admission.on_update(key, Utc::now()).await {
        Ok(()) => {
            metrics::record_decision("update", "ok");
            Ok(HttpResponse::Ok().body("OK"))
        }
        Err(e) => {
            metrics::record_decision("update", outcome_label(&e));
            Err(e)
        }
    }
}

fn outcome_label(e: &AppError) -> &'static str {
    match e {
        AppError::NotFound(_) => "not_found",
        AppError::Forbidden(_) => "forbidden",
        AppError::Database(_) => "unavailable",
        _ => "error",
    }
}

pub fn register_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/rtmp")
            .route("/on-publish", web::post().to(on_publish))
            .route("/on-publish-done", web::post().to(on_publish_done))
            .route("/on-update", web::post().to(on_update)),
    );
}
