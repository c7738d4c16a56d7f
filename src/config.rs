//! Configuration loading
//!
//! All knobs come from the environment (plus an optional `.env` file
//! loaded in `main`) and are read once at startup. Nothing here is
//! global state: the loaded config is passed into the services that
//! need it.

use anyhow::{anyhow, Context};
use std::env;

use crate::services::email::EmailConfig;

/// Scope of the stream-overlap exclusion check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlapScope {
    /// Streams may not overlap other streams of the same event.
    PerEvent,
    /// Streams may not overlap any other stream in the system.
    Global,
}

impl OverlapScope {
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "per-event" | "per_event" | "event" => Ok(OverlapScope::PerEvent),
            "global" => Ok(OverlapScope::Global),
            _ => Err(format!("unknown overlap scope: {}", s)),
        }
    }
}

/// Policy knobs consumed by the validation engine.
#[derive(Debug, Clone, Copy)]
pub struct ValidationPolicy {
    pub overlap_scope: OverlapScope,
    /// Reject streams whose active range is not contained in the event window.
    pub enforce_event_bounds: bool,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Grace window for the periodic on-update callback, in seconds.
    /// Matches nginx-rtmp's `notify_update_timeout`.
    pub update_timeout_secs: u64,
    pub overlap_scope: OverlapScope,
    pub enforce_event_bounds: bool,
    pub email: EmailConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port: u16 = env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(8000);

        let database_url = env::var("DATABASE_URL")
            .ok()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| anyhow!("DATABASE_URL must be set"))?;

        let update_timeout_secs = env::var("RTMP_UPDATE_TIMEOUT")
            .ok()
            .map(|s| s.parse().context("RTMP_UPDATE_TIMEOUT must be an integer"))
            .transpose()?
            .unwrap_or(30);

        let overlap_scope = match env::var("STREAM_OVERLAP_SCOPE") {
            Ok(s) => OverlapScope::parse(&s).map_err(|e| anyhow!(e))?,
            Err(_) => OverlapScope::PerEvent,
        };

        let enforce_event_bounds = env::var("ENFORCE_EVENT_BOUNDS")
            .map(|s| matches!(s.to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(true);

        Ok(AppConfig {
            host,
            port,
            database_url,
            update_timeout_secs,
            overlap_scope,
            enforce_event_bounds,
            email: EmailConfig::from_env(),
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn validation_policy(&self) -> ValidationPolicy {
        ValidationPolicy {
            overlap_scope: self.overlap_scope,
            enforce_event_bounds: self.enforce_event_bounds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlap_scope_parsing() {
        assert_eq!(
            OverlapScope::parse("per-event").unwrap(),
            OverlapScope::PerEvent
        );
        assert_eq!(OverlapScope::parse("GLOBAL").unwrap(), OverlapScope::Global);
        assert!(OverlapScope::parse("everywhere").is_err());
    }
}
