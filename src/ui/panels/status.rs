use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use crate::app::{App, Prompt};
use crate::format::truncate_text;
use crate::ui::style::{ICON_LOADING, muted, notification_icon};

/// Bottom bar: Docker indicator, message, progress and key hint.
pub fn draw_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let p = app.themes.palette();
    let bar = &app.status;

    let docker_color = if bar.connected { p.success } else { p.error };
    let message_style = match bar.tone {
        Some(kind) => Style::default().fg(p.notification_color(kind)),
        None => Style::default().fg(p.text),
    };

    let mut spans = vec![
        Span::styled("● ", Style::default().fg(docker_color)),
        Span::styled(bar.docker_message.clone(), muted(p)),
        Span::raw("  │  "),
    ];
    if bar.loading {
        spans.push(Span::styled(format!("{ICON_LOADING} "), Style::default().fg(p.info)));
    }
    spans.push(Span::styled(bar.message.clone(), message_style));
    if let Some(fraction) = bar.progress {
        spans.push(Span::raw(format!("  {:>3.0}%", fraction * 100.0)));
    }
    if !bar.progress_text.is_empty() {
        let budget = (area.width as usize).saturating_sub(60).max(10);
        spans.push(Span::styled(
            format!("  {}", truncate_text(&bar.progress_text, budget)),
            muted(p),
        ));
    }

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(14)])
        .split(area);

    frame.render_widget(Paragraph::new(Line::from(spans)), chunks[0]);
    frame.render_widget(
        Paragraph::new(Span::styled("? help  q quit", muted(p))),
        chunks[1],
    );
}

/// One-line input for search, filters and other prompts.
pub fn draw_prompt(frame: &mut Frame, app: &App, prompt: &Prompt, area: Rect) {
    let p = app.themes.palette();
    let line = Line::from(vec![
        Span::styled(
            format!("{}: ", prompt.kind.label()),
            Style::default().fg(p.accent).add_modifier(Modifier::BOLD),
        ),
        Span::raw(prompt.buffer.clone()),
        Span::styled("▏", Style::default().fg(p.accent)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

/// Toasts stacked in the top-right corner, newest at the bottom.
pub fn draw_notifications(frame: &mut Frame, app: &App, area: Rect) {
    let p = app.themes.palette();
    let width = 48.min(area.width);
    let mut y = area.y + 1;

    for n in app.notifications.visible() {
        let height = 3u16;
        if y + height > area.y + area.height {
            break;
        }
        let rect = Rect {
            x: area.x + area.width.saturating_sub(width + 1),
            y,
            width,
            height,
        };
        let color = p.notification_color(n.kind);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(color))
            .title(Span::styled(
                format!(" {} {} ", notification_icon(n.kind), n.title),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ))
            .style(Style::default().bg(p.surface).fg(p.text));

        frame.render_widget(Clear, rect);
        frame.render_widget(
            Paragraph::new(truncate_text(&n.message, (width as usize).saturating_sub(2)))
                .block(block)
                .wrap(Wrap { trim: true }),
            rect,
        );
        y += height;
    }
}
