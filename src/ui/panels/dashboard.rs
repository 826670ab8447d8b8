use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Wrap};

use crate::app::App;
use crate::format::{format_size, truncate_text};
use crate::ui::style::{make_block, muted};
use crate::ui::theme::Palette;

/// Status cards per resource kind, then daemon info and disk usage.
pub fn draw_dashboard(frame: &mut Frame, app: &App, area: Rect) {
    let p = app.themes.palette();

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(7), Constraint::Min(0)])
        .split(area);

    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 4); 4])
        .split(rows[0]);

    let c = app.containers.counts();
    draw_card(
        frame,
        cards[0],
        p,
        "Containers",
        c.total,
        vec![
            stat("running", c.running, p.success),
            stat("stopped", c.stopped, p.error),
        ],
    );

    let i = app.images.counts();
    draw_card(
        frame,
        cards[1],
        p,
        "Images",
        i.total,
        vec![
            stat("dangling", i.dangling, p.warning),
            Line::from(vec![
                Span::styled("size     ", muted(p)),
                Span::raw(format_size(i.total_size)),
            ]),
        ],
    );

    let n = app.networks.counts();
    draw_card(
        frame,
        cards[2],
        p,
        "Networks",
        n.total,
        vec![
            stat("builtin", n.builtin, p.muted),
            stat("custom", n.custom, p.accent),
            Line::from(Span::styled(
                truncate_text(&drivers_line(app), usize::from(cards[2].width.saturating_sub(2))),
                muted(p),
            )),
        ],
    );

    let v = app.volumes.counts();
    draw_card(
        frame,
        cards[3],
        p,
        "Volumes",
        v.total,
        vec![
            stat("in use", v.used, p.success),
            stat("unused", v.unused, p.warning),
        ],
    );

    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[1]);

    draw_system(frame, app, bottom[0], p);
    draw_disk(frame, app, bottom[1], p);
}

/// `bridge 2 · host 1 · null 1`
fn drivers_line(app: &App) -> String {
    app.networks
        .by_driver()
        .iter()
        .map(|(driver, n)| format!("{driver} {n}"))
        .collect::<Vec<_>>()
        .join(" · ")
}

fn stat(label: &str, value: usize, color: ratatui::style::Color) -> Line<'static> {
    Line::from(vec![
        Span::raw(format!("{label:<9}")),
        Span::styled(value.to_string(), Style::default().fg(color)),
    ])
}

fn draw_card(
    frame: &mut Frame,
    area: Rect,
    p: &Palette,
    title: &str,
    total: usize,
    mut lines: Vec<Line<'static>>,
) {
    let title = format!(" {title} ");
    let block = make_block(&title, false, p);
    lines.insert(
        0,
        Line::from(Span::styled(
            total.to_string(),
            Style::default().fg(p.accent).add_modifier(Modifier::BOLD),
        )),
    );
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn kv(key: &str, value: String, p: &Palette) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{key:<12}"), muted(p)),
        Span::raw(value),
    ])
}

fn draw_system(frame: &mut Frame, app: &App, area: Rect, p: &Palette) {
    let block = make_block(" System ", false, p);
    let d = &app.dashboard;

    let lines = match (&d.info, &d.error) {
        (Some(info), _) => vec![
            kv("Version", info.server_version.clone(), p),
            kv("OS", info.operating_system.clone(), p),
            kv("CPUs", info.cpus.to_string(), p),
            kv("Memory", format_size(info.mem_total), p),
            Line::raw(""),
            kv("Containers", info.containers.to_string(), p),
            kv("  running", info.containers_running.to_string(), p),
            kv("  paused", info.containers_paused.to_string(), p),
            kv("  stopped", info.containers_stopped.to_string(), p),
            kv("Images", info.images.to_string(), p),
        ],
        (None, Some(error)) => vec![Line::from(Span::styled(
            format!("Docker unavailable: {error}"),
            Style::default().fg(p.error),
        ))],
        (None, None) if d.loading => vec![Line::from(Span::styled("Loading…", muted(p)))],
        (None, None) => vec![Line::from(Span::styled("No data (r to refresh)", muted(p)))],
    };

    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
        area,
    );
}

fn draw_disk(frame: &mut Frame, app: &App, area: Rect, p: &Palette) {
    let block = make_block(" Disk usage ", false, p);

    if app.dashboard.disk.is_empty() {
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled("No data", muted(p)))).block(block),
            area,
        );
        return;
    }

    let mut lines = vec![Line::from(Span::styled(
        format!("{:<14}{:>7}{:>8}{:>11}{:>13}", "TYPE", "TOTAL", "ACTIVE", "SIZE", "RECLAIMABLE"),
        muted(p),
    ))];
    lines.extend(app.dashboard.disk.iter().map(|e| {
        Line::raw(format!(
            "{:<14}{:>7}{:>8}{:>11}{:>13}",
            e.kind,
            e.total,
            e.active,
            format_size(e.size_bytes),
            format_size(e.reclaimable_bytes)
        ))
    }));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}
