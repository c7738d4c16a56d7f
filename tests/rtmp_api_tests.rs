//! HTTP-level tests for the nginx-rtmp callback endpoints, backed by
//! the in-memory store.

mod common;

use std::sync::Arc;

use actix_web::http::header;
use actix_web::{test, web, App};
use chrono::{Duration, Utc};
use common::{event_at, stream_at, InMemoryStreamStore};
use muxy::db::StreamStore;
use muxy::handlers::{rtmp, streams};
use muxy::services::AdmissionService;

/// Store with an event running around the wall clock (the handlers take
/// `now` from the wall clock) and one stream slot positioned relative
/// to it.
fn admission_with_slot(
    slot_starts_in_min: i64,
    slot_len_min: i64,
    rtmp_url: Option<&str>,
) -> AdmissionService {
    let now = Utc::now();
    let store = Arc::new(InMemoryStreamStore::new());

    let mut event = event_at(1, now - Duration::minutes(60), now + Duration::minutes(60));
    event.rtmp_url = rtmp_url.map(String::from);

    let starts = now + Duration::minutes(slot_starts_in_min);
    let stream = stream_at(7, &event, starts, starts + Duration::minutes(slot_len_min), "s3cret");
    store.insert_event(event);
    store.insert_stream(stream);

    AdmissionService::new(store as Arc<dyn StreamStore>, 30)
}

macro_rules! callback_app {
    ($admission:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($admission))
                .configure(rtmp::register_routes)
                .route("/streams/check-key", web::get().to(streams::check_key)),
        )
        .await
    };
}

#[actix_web::test]
async fn on_publish_unknown_key_returns_404() {
    let app = callback_app!(admission_with_slot(-5, 30, None));

    let req = test::TestRequest::post()
        .uri("/rtmp/on-publish")
        .set_form([("name", "nope")])
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 404);
}

#[actix_web::test]
async fn on_publish_missing_name_returns_400() {
    let app = callback_app!(admission_with_slot(-5, 30, None));

    let req = test::TestRequest::post()
        .uri("/rtmp/on-publish")
        .set_form([("app", "live")])
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 400);
}

#[actix_web::test]
async fn on_publish_active_stream_redirects_downstream() {
    let app = callback_app!(admission_with_slot(-5, 30, Some("rtmp://downstream/{key}")));

    let req = test::TestRequest::post()
        .uri("/rtmp/on-publish")
        .set_form([("name", "s3cret")])
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 302);
    let location = resp
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap();
    assert_eq!(location, "rtmp://downstream/s3cret");
}

#[actix_web::test]
async fn on_publish_preparing_stream_is_accepted_without_redirect() {
    let app = callback_app!(admission_with_slot(5, 30, Some("rtmp://downstream/{key}")));

    let req = test::TestRequest::post()
        .uri("/rtmp/on-publish")
        .set_form([("name", "s3cret")])
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 200);
}

#[actix_web::test]
async fn on_publish_done_is_ok_even_for_unknown_keys() {
    let app = callback_app!(admission_with_slot(-5, 30, None));

    let req = test::TestRequest::post()
        .uri("/rtmp/on-publish-done")
        .set_form([("name", "nope")])
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 200);
}

#[actix_web::test]
async fn on_update_after_crossing_into_active_returns_403() {
    // Slot started seconds ago: the previous heartbeat was still in the
    // preparing window.
    let now = Utc::now();
    let store = Arc::new(InMemoryStreamStore::new());
    let mut event = event_at(1, now - Duration::minutes(60), now + Duration::minutes(60));
    event.rtmp_url = Some("rtmp://downstream/{key}".into());
    let starts = now - Duration::seconds(5);
    store.insert_stream(stream_at(7, &event, starts, starts + Duration::minutes(30), "s3cret"));
    store.insert_event(event);
    let admission = AdmissionService::new(store as Arc<dyn StreamStore>, 30);

    let app = callback_app!(admission);
    let req = test::TestRequest::post()
        .uri("/rtmp/on-update")
        .set_form([("name", "s3cret")])
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 403);
}

#[actix_web::test]
async fn on_update_mid_slot_returns_200() {
    let app = callback_app!(admission_with_slot(-15, 30, Some("rtmp://downstream/{key}")));

    let req = test::TestRequest::post()
        .uri("/rtmp/on-update")
        .set_form([("name", "s3cret")])
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 200);
}

#[actix_web::test]
async fn check_key_without_key_parameter_returns_400() {
    let app = callback_app!(admission_with_slot(-5, 30, None));

    let req = test::TestRequest::get()
        .uri("/streams/check-key")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 400);
}

#[actix_web::test]
async fn check_key_reports_active_phase() {
    let app = callback_app!(admission_with_slot(-5, 30, None));

    let req = test::TestRequest::get()
        .uri("/streams/check-key?key=s3cret")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 200);
    let body = test::read_body(resp).await;
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("Stream is active now"));
}
