//! Display helpers shared by every resource view.

use chrono::{DateTime, Utc};

const SIZE_UNITS: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];

/// Format a byte count with 1024-based units: `0 B`, `512 B`, `1.5 KB`.
pub fn format_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{size:.1} {}", SIZE_UNITS[unit])
    }
}

/// Describe how long ago `then` was, relative to `now`.
pub fn format_relative(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = now.signed_duration_since(then);
    let days = diff.num_days();
    let secs = diff.num_seconds();

    if days <= 0 {
        return match secs {
            s if s < 60 => "just now".to_string(),
            s if s < 3600 => format!("{} min ago", s / 60),
            s => format!("{} h ago", s / 3600),
        };
    }

    match days {
        1 => "yesterday".to_string(),
        d if d < 7 => format!("{d} days ago"),
        d if d < 30 => plural(d / 7, "week"),
        d if d < 365 => plural(d / 30, "month"),
        d => plural(d / 365, "year"),
    }
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("1 {unit} ago")
    } else {
        format!("{n} {unit}s ago")
    }
}

/// Relative creation date, or `unknown` when the daemon didn't report one.
pub fn format_created(created: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    created
        .map(|dt| format_relative(dt, now))
        .unwrap_or_else(|| "unknown".to_string())
}

/// Truncate to at most `max` characters, appending "…" if shortened.
pub fn truncate_text(s: &str, max: usize) -> String {
    let char_count = s.chars().count();
    if char_count <= max || max == 0 {
        return s.to_string();
    }
    let truncated: String = s.chars().take(max.saturating_sub(1)).collect();
    format!("{truncated}…")
}

/// First 12 characters of an id, the length the CLI prints by default.
pub fn short_id(id: &str) -> &str {
    let id = id.strip_prefix("sha256:").unwrap_or(id);
    match id.char_indices().nth(12) {
        Some((idx, _)) => &id[..idx],
        None => id,
    }
}

/// Coarse status bucket driving the colour and icon of a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Running,
    Stopped,
    Paused,
    Created,
    Exited,
    Dead,
    Removing,
    Default,
}

impl StatusKind {
    /// Classify a state word (`running`) or a human status line
    /// (`Up 2 hours`, `Exited (0) 3 days ago`).
    pub fn from_status(status: &str) -> Self {
        let lower = status.trim().to_ascii_lowercase();
        let first = lower.split_whitespace().next().unwrap_or("");
        match first {
            "running" | "up" if lower.contains("(paused)") => Self::Paused,
            "running" | "up" => Self::Running,
            "stopped" => Self::Stopped,
            "paused" => Self::Paused,
            "created" => Self::Created,
            "exited" => Self::Exited,
            "dead" => Self::Dead,
            "removing" | "removal" => Self::Removing,
            _ => Self::Default,
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Self::Running => "▶",
            Self::Stopped => "■",
            Self::Paused => "‖",
            Self::Created => "+",
            Self::Exited => "○",
            Self::Dead => "✗",
            Self::Removing => "…",
            Self::Default => "?",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn sizes() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(1023), "1023 B");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(43_200_000), "41.2 MB");
        assert_eq!(format_size(5 * 1024 * 1024 * 1024), "5.0 GB");
    }

    #[test]
    fn huge_sizes_stop_at_petabytes() {
        assert!(format_size(u64::MAX).ends_with(" PB"));
    }

    #[test]
    fn relative_dates() {
        let now = Utc::now();
        assert_eq!(format_relative(now - Duration::seconds(10), now), "just now");
        assert_eq!(format_relative(now - Duration::minutes(5), now), "5 min ago");
        assert_eq!(format_relative(now - Duration::hours(3), now), "3 h ago");
        assert_eq!(format_relative(now - Duration::days(1), now), "yesterday");
        assert_eq!(format_relative(now - Duration::days(4), now), "4 days ago");
        assert_eq!(format_relative(now - Duration::days(7), now), "1 week ago");
        assert_eq!(format_relative(now - Duration::days(20), now), "2 weeks ago");
        assert_eq!(format_relative(now - Duration::days(95), now), "3 months ago");
        assert_eq!(format_relative(now - Duration::days(800), now), "2 years ago");
    }

    #[test]
    fn future_dates_read_as_just_now() {
        let now = Utc::now();
        assert_eq!(format_relative(now + Duration::minutes(2), now), "just now");
    }

    #[test]
    fn created_unknown_when_missing() {
        assert_eq!(format_created(None, Utc::now()), "unknown");
    }

    #[test]
    fn truncation_is_char_safe() {
        assert_eq!(truncate_text("hello", 10), "hello");
        assert_eq!(truncate_text("hello world", 6), "hello…");
        assert_eq!(truncate_text("ünïcödé", 4), "ünï…");
        assert_eq!(truncate_text("anything", 0), "anything");
    }

    #[test]
    fn short_ids() {
        assert_eq!(short_id("sha256:0123456789abcdef"), "0123456789ab");
        assert_eq!(short_id("abc"), "abc");
    }

    #[test]
    fn status_classification() {
        assert_eq!(StatusKind::from_status("running"), StatusKind::Running);
        assert_eq!(StatusKind::from_status("Up 2 hours"), StatusKind::Running);
        assert_eq!(StatusKind::from_status("Up 2 hours (Paused)"), StatusKind::Paused);
        assert_eq!(StatusKind::from_status("Exited (0) 3 days ago"), StatusKind::Exited);
        assert_eq!(StatusKind::from_status("Created"), StatusKind::Created);
        assert_eq!(StatusKind::from_status("Removal In Progress"), StatusKind::Removing);
        assert_eq!(StatusKind::from_status(""), StatusKind::Default);
    }
}
