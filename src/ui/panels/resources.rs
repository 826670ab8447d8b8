use chrono::Utc;
use ratatui::Frame;
use ratatui::layout::{Constraint, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Cell, Paragraph, Row, Table, TableState};

use crate::app::{App, Section};
use crate::docker::ResourceType;
use crate::format::truncate_text;
use crate::resource::ResourceList;
use crate::ui::style::{
    ICON_BUILTIN, ICON_LOADING, ICON_MARKED, ICON_UNMARKED, header, make_block, muted, selected,
};
use crate::ui::theme::Palette;

/// Draw the table for the current resource section.
pub fn draw_resources(frame: &mut Frame, app: &App, area: Rect) {
    let Some(kind) = app.section.resource() else {
        return;
    };
    let p = app.themes.palette();
    let manager = app.manager(kind);
    let title = block_title(app.section, manager);
    let block = make_block(&title, true, p);

    if manager.filtered_len() == 0 {
        let msg = if manager.is_loading() {
            format!("Loading {}…", kind.plural())
        } else if manager.total() > 0 {
            "Nothing matches the current search or filters (c clears them)".to_string()
        } else {
            format!("No {}", kind.plural())
        };
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(msg, muted(p)))).block(block),
            area,
        );
        return;
    }

    let (head, widths, rows) = match kind {
        ResourceType::Container => container_rows(app, p),
        ResourceType::Image => image_rows(app, p),
        ResourceType::Network => network_rows(app, p),
        ResourceType::Volume => volume_rows(app, p),
    };

    let table = Table::new(rows, widths)
        .header(Row::new(head).style(header(p)))
        .block(block)
        .row_highlight_style(selected(p));

    let mut state = TableState::default();
    state.select(Some(app.selected_index()));
    frame.render_stateful_widget(table, area, &mut state);
}

fn block_title(section: Section, manager: &dyn ResourceList) -> String {
    let mut title = format!(
        " {} ({}/{}) ",
        section.title(),
        manager.filtered_len(),
        manager.total()
    );
    if !manager.search_query().is_empty() {
        title.push_str(&format!("/{} ", manager.search_query()));
    }
    for (k, v) in manager.filters() {
        title.push_str(&format!("[{k}={v}] "));
    }
    if manager.is_busy() {
        title.push_str(&format!("{ICON_LOADING} "));
    } else {
        let status = manager.cache_status();
        if let (Some(age), Some(at)) = (status.age, status.last_update) {
            let at = at.with_timezone(&chrono::Local).format("%H:%M:%S");
            title.push_str(&format!("· {}s ago ({at}) ", age.as_secs()));
        }
    }
    title
}

fn mark_cell(app: &App, kind: ResourceType, id: &str, p: &Palette) -> Cell<'static> {
    if app.is_marked(kind, id) {
        Cell::from(Span::styled(ICON_MARKED, Style::default().fg(p.accent)))
    } else {
        Cell::from(ICON_UNMARKED)
    }
}

type TableParts = (Vec<&'static str>, Vec<Constraint>, Vec<Row<'static>>);

fn container_rows(app: &App, p: &Palette) -> TableParts {
    let rows = app
        .containers
        .rows(Utc::now())
        .into_iter()
        .map(|r| {
            let color = p.status_color(r.status_kind);
            Row::new(vec![
                mark_cell(app, ResourceType::Container, &r.id, p),
                Cell::from(Span::styled(
                    r.status_kind.icon(),
                    Style::default().fg(color),
                )),
                Cell::from(truncate_text(&r.name, 28)),
                Cell::from(truncate_text(&r.image, 32)),
                Cell::from(Span::styled(r.status, Style::default().fg(color))),
                Cell::from(truncate_text(&r.ports, 30)),
                Cell::from(Span::styled(r.created, muted(p))),
            ])
        })
        .collect();
    (
        vec!["", "", "NAME", "IMAGE", "STATUS", "PORTS", "CREATED"],
        vec![
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Percentage(20),
            Constraint::Percentage(25),
            Constraint::Percentage(20),
            Constraint::Percentage(20),
            Constraint::Percentage(15),
        ],
        rows,
    )
}

fn image_rows(app: &App, p: &Palette) -> TableParts {
    let rows = app
        .images
        .rows(Utc::now())
        .into_iter()
        .map(|r| {
            let repo_style = if r.dangling {
                muted(p)
            } else {
                Style::default()
            };
            Row::new(vec![
                mark_cell(app, ResourceType::Image, &r.id, p),
                Cell::from(Span::styled(truncate_text(&r.repository, 40), repo_style)),
                Cell::from(Span::styled(truncate_text(&r.tag, 20), repo_style)),
                Cell::from(r.short_id),
                Cell::from(r.size),
                Cell::from(Span::styled(r.created, muted(p))),
            ])
        })
        .collect();
    (
        vec!["", "REPOSITORY", "TAG", "ID", "SIZE", "CREATED"],
        vec![
            Constraint::Length(1),
            Constraint::Percentage(35),
            Constraint::Percentage(15),
            Constraint::Length(12),
            Constraint::Length(10),
            Constraint::Percentage(20),
        ],
        rows,
    )
}

fn network_rows(app: &App, p: &Palette) -> TableParts {
    let rows = app
        .networks
        .rows(Utc::now())
        .into_iter()
        .map(|r| {
            let kind_cell = if r.builtin {
                Cell::from(Span::styled(ICON_BUILTIN, muted(p)))
            } else {
                Cell::from("")
            };
            Row::new(vec![
                mark_cell(app, ResourceType::Network, &r.id, p),
                kind_cell,
                Cell::from(truncate_text(&r.name, 30)),
                Cell::from(r.driver),
                Cell::from(r.scope),
                Cell::from(truncate_text(&r.subnet, 36)),
                Cell::from(r.containers.to_string()),
                Cell::from(r.short_id),
            ])
        })
        .collect();
    (
        vec!["", "", "NAME", "DRIVER", "SCOPE", "SUBNET", "CTRS", "ID"],
        vec![
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Percentage(25),
            Constraint::Length(8),
            Constraint::Length(6),
            Constraint::Percentage(30),
            Constraint::Length(4),
            Constraint::Length(12),
        ],
        rows,
    )
}

fn volume_rows(app: &App, p: &Palette) -> TableParts {
    let rows = app
        .volumes
        .rows(Utc::now())
        .into_iter()
        .map(|r| {
            let usage_style = if r.in_use {
                Style::default().fg(p.success)
            } else {
                muted(p)
            };
            Row::new(vec![
                mark_cell(app, ResourceType::Volume, &r.name, p),
                Cell::from(truncate_text(&r.name, 40)),
                Cell::from(r.driver.clone()),
                Cell::from(Span::styled(r.usage(), usage_style)),
                Cell::from(Span::styled(truncate_text(&r.mountpoint, 60), muted(p))),
                Cell::from(Span::styled(r.created.clone(), muted(p))),
            ])
        })
        .collect();
    (
        vec!["", "NAME", "DRIVER", "USAGE", "MOUNTPOINT", "CREATED"],
        vec![
            Constraint::Length(1),
            Constraint::Percentage(30),
            Constraint::Length(8),
            Constraint::Length(7),
            Constraint::Percentage(40),
            Constraint::Percentage(15),
        ],
        rows,
    )
}
