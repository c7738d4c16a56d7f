use std::sync::Arc;

use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::Context;
use tracing::info;

use muxy::config::AppConfig;
use muxy::db::{self, PgStreamStore, StreamStore};
use muxy::handlers;
use muxy::jobs::preparing_notifier::start_preparing_notifier;
use muxy::services::{AdmissionService, EmailService, Notifier};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=info".into()),
        )
        .init();

    let config = AppConfig::from_env()?;

    let pool = db::connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;

    let store: Arc<dyn StreamStore> = Arc::new(PgStreamStore::new(pool.clone()));
    let admission = AdmissionService::new(store, config.update_timeout_secs);
    let notifier = Arc::new(Notifier::new(
        EmailService::new(config.email.clone()),
        pool.clone(),
    ));

    tokio::spawn(start_preparing_notifier(pool.clone(), notifier.clone()));

    let bind_addr = config.bind_addr();
    info!(%bind_addr, "starting muxy control plane");

    let pool_data = web::Data::new(pool);
    let config_data = web::Data::new(config);
    let admission_data = web::Data::new(admission);
    let notifier_data = web::Data::from(notifier);

    HttpServer::new(move || {
        App::new()
            .app_data(pool_data.clone())
            .app_data(config_data.clone())
            .app_data(admission_data.clone())
            .app_data(notifier_data.clone())
            .wrap(Logger::default())
            .configure(handlers::register_routes)
    })
    .bind(&bind_addr)
    .with_context(|| format!("Failed to bind on {bind_addr}"))?
    .run()
    .await
    .context("HTTP server error")?;

    Ok(())
}
