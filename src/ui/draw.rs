use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Tabs};

use crate::app::{App, Section};
use crate::ui::overlay::{draw_confirm, draw_overlay};
use crate::ui::panels::{
    draw_dashboard, draw_notifications, draw_prompt, draw_resources, draw_status_bar,
};
use crate::ui::style::{base, muted};

pub fn draw(frame: &mut Frame, app: &App) {
    let size = frame.area();
    let p = app.themes.palette();

    frame.render_widget(Block::default().style(base(p)), size);

    let prompt_height = u16::from(app.prompt.is_some());
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(prompt_height),
            Constraint::Length(1),
        ])
        .split(size);

    // ── Section tabs ──────────────────────────────────────────────────
    let titles: Vec<Line> = Section::ALL
        .iter()
        .map(|s| Line::from(format!("{} {}", s.index() + 1, s.title())))
        .collect();
    let tabs = Tabs::new(titles)
        .select(app.section.index())
        .style(muted(p))
        .highlight_style(Style::default().fg(p.accent).add_modifier(Modifier::BOLD))
        .divider(Span::raw(" │ "));
    frame.render_widget(tabs, vertical[0]);

    // ── Main content ──────────────────────────────────────────────────
    match app.section {
        Section::Dashboard => draw_dashboard(frame, app, vertical[1]),
        _ => draw_resources(frame, app, vertical[1]),
    }

    if let Some(prompt) = &app.prompt {
        draw_prompt(frame, app, prompt, vertical[2]);
    }
    draw_status_bar(frame, app, vertical[3]);

    // ── Popups ────────────────────────────────────────────────────────
    if let Some(overlay) = &app.overlay {
        draw_overlay(frame, app, overlay, size);
    }
    if let Some(confirm) = &app.confirm {
        draw_confirm(frame, app, confirm, size);
    }
    draw_notifications(frame, app, vertical[1]);
}
