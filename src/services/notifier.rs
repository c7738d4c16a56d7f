//! Publisher notifications
//!
//! Emails are sent by explicit calls from whatever triggered them (the
//! CRUD handler on create/remove, the background job on preparing) —
//! there is no hidden dispatch. Each successful send is recorded in the
//! `stream_notifications` log, which doubles as the dedup check for the
//! preparing job. Bodies are plain-text templates with `$variable`
//! placeholders.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::info;

use crate::db::notification_repo;
use crate::error::Result;
use crate::models::{Event, NotificationKind, Stream};
use crate::services::email::EmailService;

const CREATED_TEMPLATE: &str = include_str!("../../templates/emails/stream_create.txt");
const PREPARING_TEMPLATE: &str = include_str!("../../templates/emails/stream_preparing.txt");
const REMOVED_TEMPLATE: &str = include_str!("../../templates/emails/stream_removed.txt");

const CREATED_SUBJECT: &str = "$event_name: Thank you for signing up!";
const PREPARING_SUBJECT: &str = "$event_name: Your stream \"$name\" is about to start!";
const REMOVED_SUBJECT: &str = "$event_name: Your stream has been removed";

pub struct Notifier {
    email: EmailService,
    pool: PgPool,
}

impl Notifier {
    pub fn new(email: EmailService, pool: PgPool) -> Self {
        Self { email, pool }
    }

    pub async fn stream_created(&self, stream: &Stream, event: &Event) -> Result<()> {
        self.notify(NotificationKind::Created, CREATED_SUBJECT, CREATED_TEMPLATE, stream, event)
            .await
    }

    pub async fn stream_preparing(&self, stream: &Stream, event: &Event) -> Result<()> {
        self.notify(
            NotificationKind::Preparing,
            PREPARING_SUBJECT,
            PREPARING_TEMPLATE,
            stream,
            event,
        )
        .await
    }

    pub async fn stream_removed(&self, stream: &Stream, event: &Event) -> Result<()> {
        self.notify(NotificationKind::Removed, REMOVED_SUBJECT, REMOVED_TEMPLATE, stream, event)
            .await
    }

    async fn notify(
        &self,
        kind: NotificationKind,
        subject: &str,
        template: &str,
        stream: &Stream,
        event: &Event,
    ) -> Result<()> {
        let now = Utc::now();
        let vars = template_vars(stream, event, now);

        let subject = render(subject, &vars);
        let body = render(template, &vars);

        self.email.send(
            &stream.publisher_email,
            event.contact_email.as_deref(),
            &subject,
            body,
        )?;

        // Removal mail goes out after the stream row is deleted, so
        // there is no row left to log against.
        if kind != NotificationKind::Removed {
            notification_repo::record(&self.pool, stream.id, kind, now).await?;
        }
        info!(
            stream_id = stream.id,
            kind = kind.as_str(),
            to = %stream.publisher_email,
            "notification sent"
        );

        Ok(())
    }
}

/// Substitute `$variable` placeholders; unknown placeholders are left
/// alone, like the original templates did.
pub fn render(template: &str, vars: &[(&str, String)]) -> String {
    let mut out = template.to_string();
    for (name, value) in vars {
        out = out.replace(&format!("${}", name), value);
    }
    out
}

fn template_vars(stream: &Stream, event: &Event, now: DateTime<Utc>) -> Vec<(&'static str, String)> {
    let starts_in = (stream.starts_at - now).num_minutes().max(0);

    vec![
        ("event_name", event.name.clone()),
        ("name", stream.publisher_name.clone()),
        ("starts_at", fmt(stream.starts_at)),
        ("ends_at", fmt(stream.ends_at)),
        ("starts_in", starts_in.to_string()),
        (
            "rtmp_url",
            event
                .public_rtmp_url
                .clone()
                .unwrap_or_else(|| "(not configured)".to_string()),
        ),
        ("key", stream.key.clone()),
        (
            "contact_email",
            event
                .contact_email
                .clone()
                .unwrap_or_else(|| "the event organizers".to_string()),
        ),
        ("preparation_time", event.preparation_time.to_string()),
    ]
}

fn fmt(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S %Z").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_substitutes_all_placeholders() {
        let vars = vec![
            ("name", "Ada".to_string()),
            ("event_name", "Solstice".to_string()),
        ];
        assert_eq!(
            render("$event_name: hi $name ($name)", &vars),
            "Solstice: hi Ada (Ada)"
        );
    }

    #[test]
    fn render_leaves_unknown_placeholders() {
        assert_eq!(render("hello $nobody", &[]), "hello $nobody");
    }
}
