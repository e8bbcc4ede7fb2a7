//! tickerboard: terminal market dashboard with vim-style navigation.
//!
//! Panels:
//! 1. Overview: KPI cards, price chart, volume chart
//! 2. Summary: one row per symbol with period change
//! 3. Help: keyboard shortcuts

mod app;
mod input;
mod persistence;
mod theme;
mod ui;
mod worker;

use std::io::{self, stdout};
use std::path::PathBuf;
use std::sync::mpsc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{self, Event};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tracing::{info, warn};

use tickerboard_runner::{logging, Dashboard, DashboardConfig};

use crate::app::{AppState, ErrorCategory};
use crate::worker::WorkerCommand;

fn main() -> Result<()> {
    // Install a panic hook that restores the terminal before printing the panic.
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stderr(), LeaveAlternateScreen);
        default_hook(info);
    }));

    // Paths
    let app_dir = dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tickerboard");
    let state_path = app_dir.join("state.json");
    let log_path = dirs::data_local_dir()
        .map(|d| d.join("tickerboard"))
        .unwrap_or_else(|| app_dir.clone())
        .join("tui.log");

    // The terminal belongs to the UI, so logs go to a file.
    logging::init_file(&log_path)
        .with_context(|| format!("failed to open log file {}", log_path.display()))?;
    info!(log = %log_path.display(), "tickerboard starting");

    // A broken config file should not keep the dashboard from starting.
    let (config, config_error) = match DashboardConfig::load(None) {
        Ok(config) => (config, None),
        Err(e) => {
            warn!(error = %e, "falling back to default configuration");
            (DashboardConfig::default(), Some(e.to_string()))
        }
    };

    let dashboard = Dashboard::from_config(&config).context("failed to build data provider")?;

    // Worker channels
    let (cmd_tx, cmd_rx) = mpsc::channel();
    let (resp_tx, resp_rx) = mpsc::channel();
    let worker_handle =
        worker::spawn_worker(dashboard, cmd_rx, resp_tx).context("failed to spawn worker thread")?;

    // Build app state and apply persisted settings
    let mut app = AppState::new(config, local_today, cmd_tx.clone(), resp_rx, state_path.clone());
    persistence::apply(&mut app, persistence::load(&state_path));
    if let Some(message) = config_error {
        let context = DashboardConfig::default_path()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        app.push_error(ErrorCategory::Config, message, context);
    }
    app.request_load(false);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    // Run the main event loop
    let result = run_app(&mut terminal, &mut app);

    // Save state before exit
    let persisted = persistence::extract(&app);
    if let Err(e) = persistence::save(&app.state_path, &persisted) {
        warn!(error = %e, "failed to save state");
    }

    // Shutdown worker
    let _ = cmd_tx.send(WorkerCommand::Shutdown);
    let _ = worker_handle.join();

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    info!("tickerboard stopped");
    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut AppState,
) -> Result<()> {
    loop {
        // 1. Render
        terminal.draw(|f| ui::draw(f, app))?;

        // 2. Drain worker responses (non-blocking)
        while let Ok(resp) = app.worker_rx.try_recv() {
            app.apply_response(resp);
        }

        // 3. Poll for input events (50ms timeout for ~20 FPS tick)
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                input::handle_key(app, key);
            }
        }

        // 4. Check quit
        if !app.running {
            break;
        }
    }
    Ok(())
}

fn local_today() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}
