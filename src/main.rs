mod app;
mod backend;
mod config;
mod dispatcher;
mod error;
mod logging;
mod notifier;
mod poller;
mod renderer;
mod surface;
mod types;
mod ui;

use std::io;
use std::path::Path;
use std::process::exit;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;
use crossterm::event::{self, Event, KeyEventKind};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{error, info};

use app::App;
use backend::{build_backend, Backend};
use config::{load_config, reset_config, save_config, Cli, Settings};
use poller::{PollEvent, Poller};
use surface::FRAME;
use types::{PipelineStatus, StatsSnapshot};
use ui::Tui;

fn display_startup_info(settings: &Settings, log_path: Option<&Path>) {
    eprintln!("🚀 Starting pipedash...");
    match &settings.api_url {
        Some(url) => eprintln!("🔌 API: {}", url),
        None => eprintln!("🔌 API: built-in mock data"),
    }
    eprintln!("⏱️  Auto-refresh every {}s", settings.refresh_period.as_secs());
    if let Some(path) = log_path {
        eprintln!("📝 Log file: {}", path.display());
    }
    eprintln!();
    eprintln!("🎯 Tip: 'r' refresh, 'p' run pipeline, '1'-'4' quick actions, ←/→ + Enter for step details, 'q' to quit");
    eprintln!();
}

/// One poll cycle as printed by `--json`.
#[derive(Serialize)]
struct JsonReport {
    stats: StatsSnapshot,
    status: Option<PipelineStatus>,
    failed: bool,
}

async fn run_json(backend: Arc<dyn Backend>) -> Result<(), io::Error> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut poller = Poller::new(backend, tx);
    poller.refresh_all();

    let mut report = JsonReport {
        stats: StatsSnapshot::default(),
        status: None,
        failed: false,
    };
    while let Some(event) = rx.recv().await {
        match event {
            PollEvent::Stats { snapshot, .. } => report.stats = snapshot,
            PollEvent::Status { status, .. } => report.status = Some(status),
            PollEvent::CycleFinished { failed, .. } => {
                report.failed = failed;
                break;
            }
            PollEvent::FetchFailed { .. } | PollEvent::RunSettled(_) => {}
        }
    }

    let json = serde_json::to_string_pretty(&report).map_err(io::Error::other)?;
    println!("{}", json);
    Ok(())
}

fn run_dashboard(app: &mut App, terminal: &mut Tui) -> Result<(), io::Error> {
    let tick_rate = FRAME;
    let mut last_tick = Instant::now();

    loop {
        // --- Draw UI ---
        ui::render_ui(app, terminal, Instant::now())?;

        // --- Input Handling ---
        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);

        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if ui::input::handle_key_event(app, key, Instant::now()) {
                        break;
                    }
                }
                Event::Mouse(mouse) => {
                    let area = terminal.size()?;
                    ui::input::handle_mouse_event(app, mouse, area, Instant::now());
                }
                _ => {}
            }
        }

        // --- Tick-based updates ---
        if last_tick.elapsed() >= tick_rate {
            app.on_tick(Instant::now());
            last_tick = Instant::now();
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), io::Error> {
    let cli = Cli::parse();

    // Handle reset flag first
    if cli.reset {
        match reset_config() {
            Ok(true) => println!("✅ Saved configuration has been reset."),
            Ok(false) => println!("ℹ️  No saved configuration found to reset."),
            Err(e) => {
                eprintln!("❌ Error resetting configuration: {}", e);
                exit(1);
            }
        }
        return Ok(());
    }

    let mut log_guard = None;
    let mut log_path = None;
    if cli.json {
        if let Err(e) = logging::init_stderr_logging() {
            eprintln!("⚠️  Logging disabled: {}", e);
        }
    } else {
        match logging::init_file_logging() {
            Ok((guard, path)) => {
                log_guard = Some(guard);
                log_path = Some(path);
            }
            Err(e) => eprintln!("⚠️  Logging disabled: {}", e),
        }
    }

    let saved = load_config();
    let settings = Settings::resolve(&cli, saved.as_ref());
    if cli.save {
        match save_config(&settings.to_saved()) {
            Ok(path) => eprintln!("✅ Saved configuration to {}", path.display()),
            Err(e) => eprintln!("❌ Error saving configuration: {}", e),
        }
    }

    let backend = match build_backend(settings.api_url.as_deref()) {
        Ok(backend) => backend,
        Err(e) => {
            error!(error = %e, "Could not create API client");
            eprintln!("❌ Could not create API client: {}", e);
            exit(1);
        }
    };

    if cli.json {
        return run_json(backend).await;
    }

    display_startup_info(&settings, log_path.as_deref());

    // Small delay to let user read the information
    tokio::time::sleep(Duration::from_millis(1500)).await;

    let mut app = App::new(backend, settings.refresh_period);
    let mut terminal = ui::setup_terminal()?;
    app.start(Instant::now());

    let result = run_dashboard(&mut app, &mut terminal);

    app.shutdown();
    ui::restore_terminal(&mut terminal)?;
    info!("Dashboard closed");
    drop(log_guard);
    result
}
