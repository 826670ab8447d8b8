//! Toast notifications shown in the corner of the screen.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use tracing::debug;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_MAX_VISIBLE: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Warning,
    Error,
    Info,
}

impl NotificationKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::Warning => "Warning",
            Self::Error => "Error",
            Self::Info => "Info",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub id: u64,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    created: Instant,
    /// `None` means sticky: only `dismiss`/`clear` remove it.
    timeout: Option<Duration>,
}

impl Notification {
    pub fn is_expired(&self, now: Instant) -> bool {
        self.timeout
            .is_some_and(|t| now.saturating_duration_since(self.created) >= t)
    }

    pub fn is_sticky(&self) -> bool {
        self.timeout.is_none()
    }
}

/// Bounded stack of notifications; the oldest is evicted when full.
#[derive(Debug)]
pub struct NotificationCenter {
    items: VecDeque<Notification>,
    next_id: u64,
    max_visible: usize,
    default_timeout: Duration,
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_VISIBLE, DEFAULT_TIMEOUT)
    }
}

impl NotificationCenter {
    pub fn new(max_visible: usize, default_timeout: Duration) -> Self {
        Self {
            items: VecDeque::new(),
            next_id: 1,
            max_visible: max_visible.max(1),
            default_timeout,
        }
    }

    /// Show a notification and return its id.
    ///
    /// `timeout: None` uses the default; `Some(Duration::ZERO)` is sticky.
    pub fn show(
        &mut self,
        message: impl Into<String>,
        kind: NotificationKind,
        title: Option<&str>,
        timeout: Option<Duration>,
    ) -> u64 {
        self.show_at(message, kind, title, timeout, Instant::now())
    }

    pub fn show_at(
        &mut self,
        message: impl Into<String>,
        kind: NotificationKind,
        title: Option<&str>,
        timeout: Option<Duration>,
        now: Instant,
    ) -> u64 {
        while self.items.len() >= self.max_visible {
            if let Some(old) = self.items.pop_front() {
                debug!(id = old.id, "evicting oldest notification");
            }
        }

        let id = self.next_id;
        self.next_id += 1;
        let timeout = match timeout.unwrap_or(self.default_timeout) {
            t if t.is_zero() => None,
            t => Some(t),
        };
        self.items.push_back(Notification {
            id,
            kind,
            title: title.unwrap_or(kind.label()).to_string(),
            message: message.into(),
            created: now,
            timeout,
        });
        id
    }

    pub fn success(&mut self, message: impl Into<String>) -> u64 {
        self.show(message, NotificationKind::Success, None, None)
    }

    pub fn error(&mut self, message: impl Into<String>) -> u64 {
        self.show(message, NotificationKind::Error, None, None)
    }

    pub fn warning(&mut self, message: impl Into<String>) -> u64 {
        self.show(message, NotificationKind::Warning, None, None)
    }

    pub fn info(&mut self, message: impl Into<String>) -> u64 {
        self.show(message, NotificationKind::Info, None, None)
    }

    /// Remove one notification. Returns false if it was already gone.
    pub fn dismiss(&mut self, id: u64) -> bool {
        let before = self.items.len();
        self.items.retain(|n| n.id != id);
        self.items.len() != before
    }

    /// Remove the newest notification, if any.
    pub fn dismiss_latest(&mut self) -> bool {
        self.items.pop_back().is_some()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Drop timed-out notifications; returns how many were removed.
    pub fn expire(&mut self, now: Instant) -> usize {
        let before = self.items.len();
        self.items.retain(|n| !n.is_expired(now));
        before - self.items.len()
    }

    /// Oldest first.
    pub fn visible(&self) -> impl Iterator<Item = &Notification> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
