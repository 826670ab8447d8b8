use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

/// Time-based validity flag gating whether a refresh re-fetches from the
/// daemon or reuses the last fetched list.
#[derive(Debug, Clone)]
pub struct TtlCache {
    ttl: Duration,
    fetched_at: Option<Instant>,
    updated_at: Option<DateTime<Utc>>,
    valid: bool,
}

/// Snapshot of a cache's state for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStatus {
    pub valid: bool,
    /// Time since the last successful fetch, if there was one.
    pub age: Option<Duration>,
    /// Wall-clock time of the last successful fetch.
    pub last_update: Option<DateTime<Utc>>,
    pub ttl: Duration,
}

impl TtlCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            fetched_at: None,
            updated_at: None,
            valid: false,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn is_valid_at(&self, now: Instant) -> bool {
        match (self.valid, self.fetched_at) {
            (true, Some(at)) => now.saturating_duration_since(at) < self.ttl,
            _ => false,
        }
    }

    pub fn mark_fresh(&mut self, now: Instant) {
        self.fetched_at = Some(now);
        self.updated_at = Some(Utc::now());
        self.valid = true;
    }

    /// Invalidate without forgetting when the last fetch happened.
    pub fn invalidate(&mut self) {
        self.valid = false;
    }

    pub fn status_at(&self, now: Instant) -> CacheStatus {
        CacheStatus {
            valid: self.is_valid_at(now),
            age: self.fetched_at.map(|at| now.saturating_duration_since(at)),
            last_update: self.updated_at,
            ttl: self.ttl,
        }
    }
}
