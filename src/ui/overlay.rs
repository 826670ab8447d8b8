use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use crate::app::{App, Confirm, Overlay};
use crate::docker::ContainerStats;
use crate::ui::theme::Palette;

pub fn draw_overlay(frame: &mut Frame, app: &App, overlay: &Overlay, area: Rect) {
    let p = app.themes.palette();
    match overlay {
        Overlay::Help => draw_help_overlay(frame, area, p),
        Overlay::Logs { title, text } => {
            let lines: Vec<Line> = if text.trim().is_empty() {
                vec![Line::from(Span::styled(
                    "No log output",
                    Style::default().fg(p.muted),
                ))]
            } else {
                text.lines().map(|l| Line::raw(l.to_string())).collect()
            };
            draw_text_popup(frame, area, p, title, lines, app.overlay_scroll, 90, 85);
        }
        Overlay::Stats { title, stats } => {
            draw_text_popup(frame, area, p, title, stats_lines(stats, p), 0, 50, 40);
        }
        Overlay::Loading { title } => {
            let lines = vec![Line::from(Span::styled(
                "Loading…",
                Style::default().fg(p.muted),
            ))];
            draw_text_popup(frame, area, p, title, lines, 0, 40, 20);
        }
    }
}

fn confirm_width(question: &str, available: u16) -> u16 {
    u16::try_from(question.chars().count())
        .unwrap_or(u16::MAX)
        .saturating_add(6)
        .max(30)
        .min(available)
}

/// Centered popup with a `y`/`n` question.
pub fn draw_confirm(frame: &mut Frame, app: &App, confirm: &Confirm, area: Rect) {
    let p = app.themes.palette();
    let question = confirm.question();
    let width = confirm_width(&question, area.width);
    let popup = centered_rect(width, 6, area);

    frame.render_widget(Clear, popup);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(p.warning))
        .title(" Confirm ")
        .style(Style::default().bg(p.surface).fg(p.text));

    let lines = vec![
        Line::raw(""),
        Line::from(Span::styled(
            question,
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::raw(""),
        Line::from(vec![
            Span::styled("y", Style::default().fg(p.error).add_modifier(Modifier::BOLD)),
            Span::raw(" confirm   "),
            Span::styled("n / Esc", Style::default().fg(p.accent).add_modifier(Modifier::BOLD)),
            Span::raw(" cancel"),
        ]),
    ];
    frame.render_widget(
        Paragraph::new(lines)
            .block(block)
            .alignment(Alignment::Center),
        popup,
    );
}

fn stats_lines(stats: &ContainerStats, p: &Palette) -> Vec<Line<'static>> {
    let row = |key: &str, value: String| {
        Line::from(vec![
            Span::styled(
                format!("{key:<10}"),
                Style::default().fg(p.muted).add_modifier(Modifier::BOLD),
            ),
            Span::raw(value),
        ])
    };
    vec![
        row("CPU", format!("{:.2}%", stats.cpu_percent)),
        row(
            "Memory",
            format!("{} ({:.2}%)", stats.mem_usage, stats.mem_percent),
        ),
        row("Net I/O", stats.net_io.clone()),
        row("Block I/O", stats.block_io.clone()),
        row("PIDs", stats.pids.to_string()),
    ]
}

#[allow(clippy::too_many_arguments)]
fn draw_text_popup(
    frame: &mut Frame,
    area: Rect,
    p: &Palette,
    title: &str,
    lines: Vec<Line<'_>>,
    scroll: u16,
    width_pct: u16,
    height_pct: u16,
) {
    let pct = |total: u16, pct: u16| (u32::from(total) * u32::from(pct) / 100) as u16;
    let popup = centered_rect(pct(area.width, width_pct), pct(area.height, height_pct), area);
    frame.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(p.accent))
        .title(format!(" {title} "))
        .title_bottom(Line::from(" j/k scroll · Esc close ").right_aligned())
        .style(Style::default().bg(p.surface).fg(p.text));

    frame.render_widget(
        Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: false })
            .scroll((scroll, 0)),
        popup,
    );
}

/// Draw the help overlay centered on the screen.
pub fn draw_help_overlay(frame: &mut Frame, area: Rect, p: &Palette) {
    let popup = centered_rect(72, 26, area);

    frame.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(p.info))
        .title(" Keybindings ")
        .style(Style::default().bg(p.surface).fg(p.text));

    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    // Two-column layout.
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(inner);

    let nav_lines = keybinding_lines(
        &[
            ("Navigation", None),
            ("j / ↓", Some("Move down")),
            ("k / ↑", Some("Move up")),
            ("g / Home", Some("Jump to first")),
            ("G / End", Some("Jump to last")),
            ("Tab / l", Some("Next section")),
            ("S-Tab / h", Some("Previous section")),
            ("1-5", Some("Jump to section")),
            ("", None),
            ("List", None),
            ("/", Some("Search")),
            ("f", Some("Filter key=value")),
            ("c", Some("Clear search/filters")),
            ("Space", Some("Mark for batch delete")),
            ("r", Some("Refresh (forced)")),
            ("t", Some("Toggle theme")),
        ],
        p,
    );

    let action_lines = keybinding_lines(
        &[
            ("Actions", None),
            ("d / Del", Some("Delete selected/marked")),
            ("P", Some("Prune unused")),
            ("s / S / R", Some("Start / stop / restart")),
            ("L / i", Some("Container logs / stats")),
            ("p", Some("Pull image")),
            ("T", Some("Tag image")),
            ("n", Some("New network/volume")),
            ("C / D", Some("Connect / disconnect")),
            ("x", Some("Cancel pull")),
            ("Esc", Some("Dismiss notification")),
            ("q", Some("Quit")),
            ("?", Some("Toggle this help")),
        ],
        p,
    );

    let dismiss = vec![Line::from(Span::styled(
        "Press any key to close",
        Style::default().fg(p.muted).add_modifier(Modifier::ITALIC),
    ))];

    // Navigation column.
    let nav_area = Rect {
        height: columns[0].height.saturating_sub(1),
        ..columns[0]
    };
    frame.render_widget(Paragraph::new(nav_lines), nav_area);

    // Actions column.
    let act_area = Rect {
        height: columns[1].height.saturating_sub(1),
        ..columns[1]
    };
    frame.render_widget(Paragraph::new(action_lines), act_area);

    // Dismiss hint at the bottom.
    let dismiss_area = Rect {
        x: inner.x,
        y: inner.y + inner.height.saturating_sub(1),
        width: inner.width,
        height: 1,
    };
    frame.render_widget(
        Paragraph::new(dismiss).alignment(Alignment::Center),
        dismiss_area,
    );
}

fn keybinding_lines(items: &[(&str, Option<&str>)], p: &Palette) -> Vec<Line<'static>> {
    items
        .iter()
        .map(|(key, action)| match action {
            None => Line::from(Span::styled(
                key.to_string(),
                Style::default().fg(p.warning).add_modifier(Modifier::BOLD),
            )),
            Some(desc) => Line::from(vec![
                Span::styled(
                    format!("  {key:<12}"),
                    Style::default().fg(p.accent).add_modifier(Modifier::BOLD),
                ),
                Span::styled(desc.to_string(), Style::default().fg(p.text)),
            ]),
        })
        .collect()
}

/// Return a centered `Rect` of the given fixed size within `area`.
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let w = width.min(area.width);
    let h = height.min(area.height);
    Rect {
        x: area.x + (area.width.saturating_sub(w)) / 2,
        y: area.y + (area.height.saturating_sub(h)) / 2,
        width: w,
        height: h,
    }
}
