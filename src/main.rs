use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tracing::{info, warn};

use dockdeck::app::{App, Overlay, PromptKind, Section};
use dockdeck::config::{self, Config};
use dockdeck::docker::{DockerCli, ensure_available};
use dockdeck::logging;
use dockdeck::ui::{self, theme::ThemeManager};

/// Terminal dashboard for Docker containers, images, networks and volumes.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Config file to use instead of `.dockdeck.yaml` / the user config dir.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Theme to start with (`light`, `dark` or a custom theme name).
    #[arg(short, long)]
    theme: Option<String>,

    /// Docker command line, e.g. `"sudo -n docker"` or `podman`.
    #[arg(long)]
    docker: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let cwd = std::env::current_dir()?;
    let (cfg, config_path) = config::load(cli.config.as_deref(), &cwd)?;

    let log_dir = cfg.log_dir.clone().unwrap_or_else(logging::default_log_dir);
    let _log_guard = logging::init(&log_dir)?;
    info!(config = ?config_path, "starting dockdeck");

    // Ensure terminal is restored on panic.
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = restore_terminal();
        original_hook(info);
    }));

    let app = build_app(&cli, &cfg)?;

    let mut terminal = setup_terminal()?;
    let result = run(&mut terminal, app);
    restore_terminal()?;
    result
}

fn build_app(cli: &Cli, cfg: &Config) -> Result<App> {
    let command = cli.docker.as_deref().unwrap_or(&cfg.docker_binary);
    let client = DockerCli::from_command_line(command)?
        .with_pull_timeout(cfg.pull_timeout())
        .with_command_timeout(cfg.command_timeout());

    let mut themes = ThemeManager::new();
    for (name, error) in themes.register_all(&cfg.themes) {
        warn!(theme = %name, %error, "skipping custom theme");
    }
    let wanted = cli.theme.as_deref().unwrap_or(&cfg.theme);
    if let Err(error) = themes.apply(wanted) {
        warn!(%error, "falling back to the default theme");
    }

    let mut app = App::new(Arc::new(client), cfg, themes);
    match ensure_available(app.client()) {
        Ok(version) => app.status.set_docker_status(true, Some(&version)),
        Err(error) => {
            warn!(error = %format!("{error:#}"), "docker unavailable");
            app.status.set_docker_status(false, Some("unavailable"));
            app.notifications.error(format!("{error:#}"));
        }
    }
    app.refresh_all(false);
    Ok(app)
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn restore_terminal() -> Result<()> {
    terminal::disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen)?;
    Ok(())
}

fn run(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, mut app: App) -> Result<()> {
    while app.running {
        terminal.draw(|frame| ui::draw(frame, &app))?;

        // Short timeout while background work is pending so results show
        // promptly, longer when idle.
        let poll_timeout = if app.is_busy() {
            Duration::from_millis(50)
        } else {
            Duration::from_millis(200)
        };
        if event::poll(poll_timeout)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            handle_key(&mut app, key);
            app.clamp_indices();
        }

        app.tick();
    }

    if app.cancel_pull() {
        info!("cancelled pull on exit");
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.running = false;
        return;
    }

    // ── Modal input ───────────────────────────────────────────────────
    if app.prompt.is_some() {
        match key.code {
            KeyCode::Enter => app.submit_prompt(),
            KeyCode::Esc => app.cancel_prompt(),
            KeyCode::Backspace => app.prompt_backspace(),
            KeyCode::Char(c) => app.prompt_push(c),
            _ => {}
        }
        return;
    }

    if app.confirm.is_some() {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => app.confirm_yes(),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => app.confirm_no(),
            _ => {}
        }
        return;
    }

    if let Some(overlay) = &app.overlay {
        let help = matches!(overlay, Overlay::Help);
        let scrollable = matches!(overlay, Overlay::Logs { .. });
        match key.code {
            _ if help => close_overlay(app),
            KeyCode::Esc | KeyCode::Char('q') => close_overlay(app),
            KeyCode::Down | KeyCode::Char('j') if scrollable => {
                app.overlay_scroll = app.overlay_scroll.saturating_add(1);
            }
            KeyCode::Up | KeyCode::Char('k') if scrollable => {
                app.overlay_scroll = app.overlay_scroll.saturating_sub(1);
            }
            KeyCode::PageDown if scrollable => {
                app.overlay_scroll = app.overlay_scroll.saturating_add(20);
            }
            KeyCode::PageUp if scrollable => {
                app.overlay_scroll = app.overlay_scroll.saturating_sub(20);
            }
            KeyCode::Char('g') if scrollable => app.overlay_scroll = 0,
            _ => {}
        }
        return;
    }

    // ── Global keys ───────────────────────────────────────────────────
    match key.code {
        KeyCode::Char('q') => {
            app.running = false;
            return;
        }
        KeyCode::Char('?') => {
            app.overlay = Some(Overlay::Help);
            return;
        }
        KeyCode::Char('t') => {
            app.toggle_theme();
            return;
        }
        KeyCode::Char('r') => {
            app.refresh_current(true);
            return;
        }
        KeyCode::Char('x') => {
            if !app.cancel_pull() {
                app.notifications.info("No pull in progress");
            }
            return;
        }
        KeyCode::Esc => {
            app.notifications.dismiss_latest();
            return;
        }
        KeyCode::Tab | KeyCode::Right | KeyCode::Char('l') => {
            app.set_section(app.section.next());
            return;
        }
        KeyCode::BackTab | KeyCode::Left | KeyCode::Char('h') => {
            app.set_section(app.section.prev());
            return;
        }
        KeyCode::Char(c @ '1'..='5') => {
            if let Some(section) = Section::from_index((c as usize) - ('1' as usize)) {
                app.set_section(section);
            }
            return;
        }
        KeyCode::Char('P') => {
            app.request_prune();
            return;
        }
        _ => {}
    }

    if app.section == Section::Dashboard {
        return;
    }

    // ── List keys ─────────────────────────────────────────────────────
    match key.code {
        KeyCode::Down | KeyCode::Char('j') => app.move_selection(1),
        KeyCode::Up | KeyCode::Char('k') => app.move_selection(-1),
        KeyCode::PageDown => app.move_selection(10),
        KeyCode::PageUp => app.move_selection(-10),
        KeyCode::Home | KeyCode::Char('g') => app.select_first(),
        KeyCode::End | KeyCode::Char('G') => app.select_last(),
        KeyCode::Char('/') => app.open_prompt(PromptKind::Search),
        KeyCode::Char('f') => app.open_prompt(PromptKind::Filter),
        KeyCode::Char('c') => app.clear_search_and_filters(),
        KeyCode::Char(' ') => {
            app.toggle_mark();
            app.move_selection(1);
        }
        KeyCode::Char('d') | KeyCode::Delete => app.request_delete(),
        _ => section_key(app, key.code),
    }
}

fn close_overlay(app: &mut App) {
    app.overlay = None;
    app.overlay_scroll = 0;
}

fn section_key(app: &mut App, code: KeyCode) {
    match (app.section, code) {
        (Section::Containers, KeyCode::Char('s')) => app.start_selected(),
        (Section::Containers, KeyCode::Char('S')) => app.stop_selected(),
        (Section::Containers, KeyCode::Char('R')) => app.restart_selected(),
        (Section::Containers, KeyCode::Char('L') | KeyCode::Enter) => app.show_logs(),
        (Section::Containers, KeyCode::Char('i')) => app.show_stats(),
        (Section::Images, KeyCode::Char('p')) => app.open_prompt(PromptKind::Pull),
        (Section::Images, KeyCode::Char('T')) => app.open_tag_prompt(),
        (Section::Networks, KeyCode::Char('n')) => app.open_prompt(PromptKind::CreateNetwork),
        (Section::Networks, KeyCode::Char('C')) => app.open_connect_prompt(true),
        (Section::Networks, KeyCode::Char('D')) => app.open_connect_prompt(false),
        (Section::Volumes, KeyCode::Char('n')) => app.open_prompt(PromptKind::CreateVolume),
        _ => {}
    }
}
