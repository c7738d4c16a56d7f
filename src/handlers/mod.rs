//! HTTP surface
//!
//! Three groups of routes: the Event/Stream CRUD consumed by organizer
//! tooling, the nginx-rtmp callbacks, and the health/metrics endpoints.

pub mod events;
pub mod rtmp;
pub mod streams;

use actix_web::{web, HttpResponse};

use crate::metrics;

async fn health() -> HttpResponse {
    HttpResponse::Ok().body("ok")
}

pub fn register_routes(cfg: &mut web::ServiceConfig) {
    events::register_routes(cfg);
    streams::register_routes(cfg);
    rtmp::register_routes(cfg);
    cfg.route("/health", web::get().to(health))
        .route("/metrics", web::get().to(metrics::serve_metrics));
}
