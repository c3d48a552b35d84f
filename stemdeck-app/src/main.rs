//! stemdeck - terminal stem mixer
//!
//! Plays separated stems of one song in lockstep with per-stem mute, solo
//! and volume, a master transport and a CRT-style terminal view.

mod audio;
mod cli;
mod stems;

use std::fs::{self, File};
use std::io::{self, stdout};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context};
use crossbeam_channel::bounded;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout, Rect},
    Terminal,
};
use tracing_subscriber::EnvFilter;

use stemdeck_audio::{
    format_clock, CommandReport, DeckBackend, MixerSession, SessionBuilder, SessionConfig,
    StemSource,
};
use stemdeck_input::{Dispatcher, Key, PromptInput};
use stemdeck_library::{Config, StemFile, TrackLoader};
use stemdeck_tui::{
    App, ChannelStripWidget, LegendWidget, StatusBarWidget, Theme, TransportWidget,
};

use crate::audio::run_audio_thread;
use crate::cli::CliOptions;
use crate::stems::gather_stems;

/// Frame rate for UI updates
const FPS: u64 = 30;

type Session = MixerSession<DeckBackend<TrackLoader>>;

fn main() -> anyhow::Result<()> {
    let cli = CliOptions::parse()?;
    let log_path = init_logging();

    let mut config = Config::load();
    let stems = gather_stems(&cli, &mut config)?;

    // Open the device first: stems are resampled to its rate
    let (rate_tx, rate_rx) = bounded(1);
    let (renderer_tx, renderer_rx) = bounded(1);
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_audio = shutdown.clone();
    let audio_handle = thread::spawn(move || {
        run_audio_thread(rate_tx, renderer_rx, shutdown_audio);
    });

    let sample_rate = rate_rx
        .recv()
        .context("Audio thread exited before reporting a device")?
        .map_err(|e| anyhow!(e))?;

    let session_config = SessionConfig {
        drift_tolerance: config
            .drift_tolerance()
            .map(|d| d.as_secs_f64())
            .unwrap_or(SessionConfig::default().drift_tolerance),
        ..SessionConfig::default()
    };
    let backend = DeckBackend::new(TrackLoader::with_sample_rate(sample_rate));
    let renderer = backend.renderer();
    let mut builder = SessionBuilder::new(backend).with_config(session_config);

    let mut kinds = Vec::new();
    for stem in &stems {
        eprintln!("Loading {} ...", stem.label);
        match builder.load(StemSource::Path(stem.path.clone()), stem.label.clone()) {
            Ok(_) => kinds.push(stem.kind),
            Err(e) => eprintln!("  skipped: {}", e),
        }
    }

    let session = builder.start().context("Cannot start the mixer")?;
    let _ = renderer_tx.send(renderer);

    let mut app = App::new(kinds);
    if let Some(name) = cli.theme.as_deref().or(config.theme.as_deref()) {
        app.set_theme(name);
    }
    app.set_message(format!(
        "{} stems loaded from {} | log: {}",
        session.channel_count(),
        describe_origin(&stems),
        log_path.display()
    ));

    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let result = run_app(&mut terminal, session, &mut app, shutdown.clone());

    shutdown.store(true, Ordering::SeqCst);
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    let _ = audio_handle.join();

    result
}

/// Log to a file; the terminal belongs to the UI while the mixer runs
fn init_logging() -> PathBuf {
    let dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("stemdeck");
    let path = dir.join("stemdeck.log");
    let filter = EnvFilter::try_from_env("STEMDECK_LOG").unwrap_or_else(|_| EnvFilter::new("info"));

    let file = fs::create_dir_all(&dir).and_then(|_| File::create(&path));
    match file {
        Ok(file) => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init(),
        Err(_) => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::sink)
            .init(),
    }
    path
}

fn describe_origin(stems: &[StemFile]) -> String {
    stems
        .first()
        .and_then(|s| s.path.parent())
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| ".".to_string())
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    mut session: Session,
    app: &mut App,
    shutdown: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    let mut dispatcher = Dispatcher::new();
    let frame_duration = Duration::from_millis(1000 / FPS);

    tracing::info!(channels = session.channel_count(), "mixer running");

    loop {
        if shutdown.load(Ordering::Relaxed) || app.should_quit {
            break;
        }

        let frame_start = Instant::now();
        let report = session.tick(frame_start);
        show_failures(app, &report);
        app.update(session.snapshot());

        terminal.draw(|frame| {
            render_ui(frame, app);
        })?;

        let timeout = frame_duration.saturating_sub(frame_start.elapsed());
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                handle_key(key, app, &mut dispatcher, &mut session);
            }
        }
    }

    session.dispose();
    Ok(())
}

fn handle_key(key: KeyEvent, app: &mut App, dispatcher: &mut Dispatcher, session: &mut Session) {
    if key.kind == KeyEventKind::Release {
        return;
    }
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.quit();
        return;
    }

    if app.prompt.is_open() {
        match app.prompt.handle_key(key) {
            PromptInput::Editing => {}
            PromptInput::Cancelled => {
                dispatcher.set_text_focus(false);
                app.clear_message();
            }
            PromptInput::Submitted(seconds) => {
                dispatcher.set_text_focus(false);
                match session.seek(seconds) {
                    Ok(report) if report.is_clean() => {
                        app.set_success(format!("Seek to {}", format_clock(seconds)));
                    }
                    Ok(report) => show_failures(app, &report),
                    Err(e) => app.set_error(e.to_string()),
                }
            }
            PromptInput::Invalid(e) => app.set_error(e.to_string()),
        }
        return;
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Char('Q') => app.quit(),
        KeyCode::Char('g') | KeyCode::Char('G') => {
            app.prompt.open();
            dispatcher.set_text_focus(true);
        }
        _ => {
            if let Some(key) = Key::from_event(&key) {
                let outcome = dispatcher.dispatch(key, session);
                app.apply_dispatch(&outcome);
            }
        }
    }
}

fn show_failures(app: &mut App, report: &CommandReport) {
    if report.is_clean() {
        return;
    }
    app.set_warning(report.summary());
}

fn render_ui(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let theme = &app.theme;

    let block = ratatui::widgets::Block::default().style(theme.normal());
    frame.render_widget(block, area);

    let channel_count = app.snapshot.channel_count() as u16;
    let chunks = if app.expanded {
        Layout::vertical([
            Constraint::Length(1), // Title
            Constraint::Length(5), // Transport
            Constraint::Min(6),    // Strips
            Constraint::Length(1), // Status bar
        ])
        .split(area)
    } else {
        Layout::vertical([
            Constraint::Length(1),                 // Title
            Constraint::Length(5),                 // Transport
            Constraint::Length(channel_count + 2), // Strips
            Constraint::Min(4),                    // Legend
            Constraint::Length(1),                 // Status bar
        ])
        .split(area)
    };

    render_title(frame, chunks[0], theme);
    frame.render_widget(TransportWidget::new(&app.snapshot, theme), chunks[1]);

    if app.expanded {
        render_expanded_strips(frame, chunks[2], app);
    } else {
        render_compact_strips(frame, chunks[2], app);
        let columns = if chunks[3].width >= 90 { 2 } else { 1 };
        frame.render_widget(LegendWidget::new(theme).columns(columns), chunks[3]);
    }

    let status_idx = chunks.len() - 1;
    let status = StatusBarWidget::new(theme)
        .prompt(app.prompt.is_open().then(|| app.prompt.buffer()))
        .message(app.message.as_deref(), app.message_type)
        .expanded(app.expanded);
    frame.render_widget(status, chunks[status_idx]);
}

fn render_compact_strips(frame: &mut ratatui::Frame, area: Rect, app: &App) {
    let theme = &app.theme;
    let block = ratatui::widgets::Block::default()
        .borders(ratatui::widgets::Borders::ALL)
        .border_style(theme.border())
        .title(ratatui::text::Span::styled(" STEMS ", theme.title()));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    for (i, channel) in app.snapshot.channels.iter().enumerate() {
        let y = inner.y + i as u16;
        if y >= inner.bottom() {
            break;
        }
        let row = Rect::new(inner.x, y, inner.width, 1);
        let strip = ChannelStripWidget::new(channel, app.kind(i), theme)
            .soloed(app.snapshot.soloed);
        frame.render_widget(strip, row);
    }
}

fn render_expanded_strips(frame: &mut ratatui::Frame, area: Rect, app: &App) {
    let count = app.snapshot.channel_count().max(1);
    let columns = if count > 4 && area.width >= 120 { 2 } else { 1 };
    let rows = count.div_ceil(columns);

    let row_areas = Layout::vertical(vec![Constraint::Ratio(1, rows as u32); rows]).split(area);
    for (i, channel) in app.snapshot.channels.iter().enumerate() {
        let row_area = row_areas[i / columns];
        let cell = if columns == 1 {
            row_area
        } else {
            Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)])
                .split(row_area)[i % columns]
        };
        let strip = ChannelStripWidget::new(channel, app.kind(i), &app.theme)
            .soloed(app.snapshot.soloed)
            .expanded(true);
        frame.render_widget(strip, cell);
    }
}

fn render_title(frame: &mut ratatui::Frame, area: Rect, theme: &Theme) {
    use ratatui::text::{Line, Span};
    use ratatui::widgets::Paragraph;

    let title_text = " STEMDECK ";
    let width = area.width as usize;
    let padding = width.saturating_sub(title_text.len()) / 2;
    let rest = width.saturating_sub(padding + title_text.len());
    let padded = format!(
        "{:═<pad$}{}{:═<rest$}",
        "",
        title_text,
        "",
        pad = padding,
        rest = rest
    );

    let line = Line::from(Span::styled(padded, theme.title()));
    frame.render_widget(Paragraph::new(line), area);
}
