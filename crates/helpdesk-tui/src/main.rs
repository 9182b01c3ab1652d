use std::any::Any;
use std::fs::OpenOptions;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use helpdesk_service::{BlockingHttpService, SessionStore};
use helpdesk_tui::app::{App, Screen};
use helpdesk_tui::config::Config;
use ratatui::prelude::*;
use tracing::info;

fn main() -> Result<()> {
    let config = Config::parse();
    init_logging(&config.log_path())?;

    // Panics are caught in the event loop; keep the payload off the screen.
    panic::set_hook(Box::new(|info| {
        tracing::error!("panic: {info}");
    }));

    info!("helpdesk starting");
    info!("server: {}", config.server_url);

    let session = Arc::new(SessionStore::open(config.session_path()));
    if config.logout {
        session.clear();
    }
    let service = BlockingHttpService::with_connect_timeout(
        &config.server_url,
        session,
        config.connect_timeout(),
    )
    .context("failed to create http client")?;

    run_tui(service)
}

fn init_logging(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(Arc::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn run_tui(service: BlockingHttpService) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, service);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(ref e) = result {
        eprintln!("Error: {e}");
    }

    result
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    service: BlockingHttpService,
) -> Result<()> {
    let mut app = App::new(service);

    loop {
        let drawn = panic::catch_unwind(AssertUnwindSafe(|| {
            terminal.draw(|frame| app.render(frame)).map(|_| ())
        }));
        match drawn {
            Ok(result) => result?,
            Err(payload) => {
                // Drawing the crash screen itself failed; nothing left to show.
                if matches!(app.screen(), Screen::Crashed { .. }) {
                    anyhow::bail!("render failed: {}", panic_message(&*payload));
                }
                app.crash(&panic_message(&*payload));
                continue;
            }
        }

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            // Ctrl+C always quits
            if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                break;
            }
            // q quits unless we're in an input mode
            if key.code == KeyCode::Char('q') && !app.is_input_mode() {
                break;
            }
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| app.handle_key(key))) {
                app.crash(&panic_message(&*payload));
            }
        }
    }

    info!("helpdesk exiting");
    Ok(())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".into()
    }
}
