//! Live status capability: ambient countdown display and background grants.
//!
//! The session manager pushes rest-period updates here fire-and-forget. An
//! implementation may refuse (for example when the user has denied
//! notifications) by returning [`Error::Permission`](crate::Error); the
//! manager then stops publishing for the rest of the workout.

use crate::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// What the ambient display shows during a rest period
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LiveSnapshot {
    pub routine_name: String,
    pub label: String,
    pub ends_at: DateTime<Utc>,
    pub remaining_seconds: u32,
}

/// Platform surface for live status and background execution
pub trait LiveStatus: Send {
    fn request_background_run(&mut self) -> Result<()>;
    fn renew_background_run(&mut self) -> Result<()>;
    fn end_background_run(&mut self) -> Result<()>;
    fn publish_live_status(&mut self, snapshot: &LiveSnapshot) -> Result<()>;
    fn end_live_status(&mut self) -> Result<()>;
}

/// For platforms without an ambient display
#[derive(Debug, Default)]
pub struct NoopLiveStatus;

impl LiveStatus for NoopLiveStatus {
    fn request_background_run(&mut self) -> Result<()> {
        Ok(())
    }

    fn renew_background_run(&mut self) -> Result<()> {
        Ok(())
    }

    fn end_background_run(&mut self) -> Result<()> {
        Ok(())
    }

    fn publish_live_status(&mut self, _snapshot: &LiveSnapshot) -> Result<()> {
        Ok(())
    }

    fn end_live_status(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Reports live status through tracing
#[derive(Debug, Default)]
pub struct LoggingLiveStatus {
    last_published: Option<LiveSnapshot>,
}

impl LoggingLiveStatus {
    pub fn last_published(&self) -> Option<&LiveSnapshot> {
        self.last_published.as_ref()
    }
}

impl LiveStatus for LoggingLiveStatus {
    fn request_background_run(&mut self) -> Result<()> {
        tracing::debug!("Background run requested");
        Ok(())
    }

    fn renew_background_run(&mut self) -> Result<()> {
        tracing::debug!("Background run renewed");
        Ok(())
    }

    fn end_background_run(&mut self) -> Result<()> {
        tracing::debug!("Background run ended");
        Ok(())
    }

    fn publish_live_status(&mut self, snapshot: &LiveSnapshot) -> Result<()> {
        // Only log when the end time moves; per-second updates go to debug
        let moved = self
            .last_published
            .as_ref()
            .map_or(true, |last| last.ends_at != snapshot.ends_at);
        if moved {
            tracing::info!(
                "Rest for {} ({}) until {}",
                snapshot.label,
                snapshot.routine_name,
                snapshot.ends_at.format("%H:%M:%S")
            );
        } else {
            tracing::debug!("Rest remaining: {}s", snapshot.remaining_seconds);
        }
        self.last_published = Some(snapshot.clone());
        Ok(())
    }

    fn end_live_status(&mut self) -> Result<()> {
        tracing::debug!("Live status ended");
        self.last_published = None;
        Ok(())
    }
}
