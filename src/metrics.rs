use actix_web::HttpResponse;
use once_cell::sync::Lazy;
use prometheus::{Encoder, IntCounterVec, Opts, TextEncoder};

static PUBLISH_DECISIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let counter = IntCounterVec::new(
        Opts::new(
            "muxy_publish_decisions_total",
            "Admission decisions returned to the media server",
        ),
        &["operation", "outcome"],
    )
    .expect("failed to create muxy_publish_decisions_total");
    prometheus::default_registry()
        .register(Box::new(counter.clone()))
        .expect("failed to register muxy_publish_decisions_total");
    counter
});

pub fn record_decision(operation: &str, outcome: &str) {
    PUBLISH_DECISIONS_TOTAL
        .with_label_values(&[operation, outcome])
        .inc();
}

pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}
