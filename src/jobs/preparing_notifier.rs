//! Preparing-notifier background job
//!
//! Once a minute, emails publishers whose streams start within the next
//! ten minutes. The `stream_notifications` log keeps the job from
//! mailing anyone twice.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use sqlx::PgPool;
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::db::{event_repo, stream_repo};
use crate::error::Result;
use crate::services::Notifier;

const CHECK_INTERVAL: Duration = Duration::from_secs(60);
const LOOKAHEAD_MINUTES: i64 = 10;

pub async fn start_preparing_notifier(db: PgPool, notifier: Arc<Notifier>) {
    info!(
        "Starting preparing-notifier background job (check_interval={}s, lookahead={}min)",
        CHECK_INTERVAL.as_secs(),
        LOOKAHEAD_MINUTES
    );

    loop {
        sleep(CHECK_INTERVAL).await;

        match notify_upcoming_streams(&db, &notifier).await {
            Ok(0) => {}
            Ok(sent) => info!(sent, "preparing notifications sent"),
            Err(e) => error!(error = %e, "preparing-notifier cycle failed"),
        }
    }
}

/// One job cycle; returns how many notifications went out.
pub async fn notify_upcoming_streams(db: &PgPool, notifier: &Notifier) -> Result<usize> {
    let now = Utc::now();
    let lookahead = chrono::Duration::minutes(LOOKAHEAD_MINUTES);
    let candidates = stream_repo::find_needing_preparing_notice(db, now, lookahead).await?;

    let mut sent = 0;
    for stream in candidates {
        let Some(event) = event_repo::find_by_id(db, stream.event_id).await? else {
            continue;
        };

        match notifier.stream_preparing(&stream, &event).await {
            Ok(()) => sent += 1,
            // Keep going: one bad mailbox must not starve the rest.
            Err(e) => warn!(stream_id = stream.id, error = %e, "failed to notify publisher"),
        }
    }

    Ok(sent)
}
