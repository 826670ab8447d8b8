use ratatui::style::{Modifier, Style};
use ratatui::widgets::{Block, Borders};

use crate::notify::NotificationKind;
use crate::ui::theme::Palette;

// ── Icon constants ────────────────────────────────────────────────────
pub const ICON_MARKED: &str = "●";
pub const ICON_UNMARKED: &str = " ";
pub const ICON_BUILTIN: &str = "⚙";
pub const ICON_LOADING: &str = "◌";

// ── Helpers ───────────────────────────────────────────────────────────

pub fn notification_icon(kind: NotificationKind) -> &'static str {
    match kind {
        NotificationKind::Success => "✓",
        NotificationKind::Warning => "!",
        NotificationKind::Error => "✗",
        NotificationKind::Info => "i",
    }
}

/// Base style for the whole screen.
pub fn base(p: &Palette) -> Style {
    Style::default().fg(p.text).bg(p.background)
}

pub fn muted(p: &Palette) -> Style {
    Style::default().fg(p.muted)
}

pub fn header(p: &Palette) -> Style {
    Style::default().fg(p.accent).add_modifier(Modifier::BOLD)
}

pub fn selected(p: &Palette) -> Style {
    Style::default().bg(p.selection).add_modifier(Modifier::BOLD)
}

pub fn make_block<'a>(title: &'a str, focused: bool, p: &Palette) -> Block<'a> {
    let style = if focused {
        Style::default().fg(p.accent).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(p.border)
    };

    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(style)
}
