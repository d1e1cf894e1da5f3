use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tokio::sync::mpsc;

use sf_core::models::{PlatformConfig, SiteListing};
use sf_core::services::config_loader::{self, CONFIG_FILENAME};
use sf_core::services::lifecycle::{RepairOutcome, SiteManager};
use sf_core::FleetError;

use sf_tui::app::{App, Mode};
use sf_tui::event::{spawn_input_task, spawn_tick_task, AppEvent};
use sf_tui::{keys, outcome, ui};

#[derive(Parser)]
#[command(name = "sitefleet", version, about = "Provision and run tenant sites behind pm2 and Caddy")]
struct Cli {
    /// Platform config file. Defaults to the nearest sitefleet.yaml above the
    /// working directory.
    #[arg(long, global = true, env = "SITEFLEET_CONFIG")]
    config: Option<PathBuf>,

    /// Write a debug log to .sitefleet-debug.log.
    #[arg(long)]
    debug: bool,

    /// Drive the UI from a script and print frames to stdout.
    #[arg(long, value_name = "SCRIPT")]
    headless: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// List every site with its process state.
    List {
        #[arg(long)]
        json: bool,
    },
    /// Provision a new site.
    Create { name: String },
    /// Move a site to a new id, keeping its port.
    Rename { id: String, new_name: String },
    /// Stop a site's process and mark it paused.
    Pause { id: String },
    /// Start a paused site again.
    Resume { id: String },
    /// Remove a site and everything it owns.
    Delete {
        id: String,
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
    /// Rebuild the shared-directory symlinks of a site.
    Relink { id: String },
    /// Finish an interrupted operation or regenerate a site's artifacts.
    Repair { id: String },
    /// Build and reload a site from its repository. Called by the deploy hook.
    Deploy {
        id: String,
        /// Port baked into the hook; only used to detect stale hooks.
        #[arg(long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> color_eyre::Result<ExitCode> {
    color_eyre::install()?;
    let cli = Cli::parse();

    if let Some(command) = cli.command {
        setup_stderr_logging();
        let config = load_config(cli.config.as_deref())?;
        return run_command(config, command).await;
    }

    // The TUI owns the terminal, so logs only ever go to a file.
    let _guard = if cli.debug || cli.headless.is_some() {
        Some(setup_debug_logging())
    } else {
        None
    };

    let config = load_config(cli.config.as_deref())?;
    let manager = Arc::new(SiteManager::new(config));
    match cli.headless {
        Some(script_path) => run_headless(script_path, manager).await?,
        None => run_interactive(manager).await?,
    }
    Ok(ExitCode::SUCCESS)
}

fn load_config(explicit: Option<&Path>) -> Result<PlatformConfig, FleetError> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let cwd = std::env::current_dir()?;
            config_loader::discover(&cwd)
                .ok_or_else(|| FleetError::ConfigNotFound(cwd.join(CONFIG_FILENAME)))?
        }
    };
    config_loader::load(&path)
}

/// Subcommands log to stderr so stdout stays machine-readable.
fn setup_stderr_logging() {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

/// Configure file-based tracing to `.sitefleet-debug.log` in CWD.
/// Returns the guard that must be held alive for the duration of the program.
fn setup_debug_logging() -> tracing_appender::non_blocking::WorkerGuard {
    let file_appender = tracing_appender::rolling::never(".", ".sitefleet-debug.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
        )
        .with_ansi(false)
        .init();

    guard
}

// ─── Subcommands ────────────────────────────────────────────────────────

async fn run_command(config: PlatformConfig, command: Command) -> color_eyre::Result<ExitCode> {
    let streamed = matches!(command, Command::Deploy { .. });
    let manager = SiteManager::new(config).with_streamed_output(streamed);

    let result = match command {
        Command::List { json } => match manager.list().await {
            Ok(sites) if json => {
                println!("{}", serde_json::to_string_pretty(&sites)?);
                Ok(())
            }
            Ok(sites) => {
                print_sites(&sites);
                Ok(())
            }
            Err(e) => Err(e),
        },
        Command::Create { name } => manager.create(&name).await.map(|record| {
            println!("created {} on port {}", record.id, record.port);
            println!("  url:  {}", record.url.as_deref().unwrap_or_default());
            println!("  push: {}", record.repo);
        }),
        Command::Rename { id, new_name } => manager
            .rename(&id, &new_name)
            .await
            .map(|record| println!("renamed {id} to {} (port {})", record.id, record.port)),
        Command::Pause { id } => manager
            .pause(&id)
            .await
            .map(|record| println!("{} is {}", record.id, record.status)),
        Command::Resume { id } => manager
            .resume(&id)
            .await
            .map(|record| println!("{} is {}", record.id, record.status)),
        Command::Delete { id, yes } => {
            if !yes && !confirm(&format!("Delete site '{id}' and all of its data?"))? {
                println!("aborted");
                return Ok(ExitCode::SUCCESS);
            }
            manager.delete(&id).await.map(|()| println!("deleted {id}"))
        }
        Command::Relink { id } => manager.relink(&id).await.map(|report| {
            println!(
                "relinked {id}: {} created, {} unchanged, {} skipped",
                report.created(),
                report.unchanged(),
                report.skipped()
            )
        }),
        Command::Repair { id } => manager.repair(&id).await.map(|repaired| match repaired {
            RepairOutcome::Restored(record) => {
                println!("repaired {} on port {}", record.id, record.port)
            }
            RepairOutcome::Deleted(id) => println!("finished deleting {id}"),
        }),
        Command::Deploy { id, port } => {
            let status = outcome::deploy_status(&id, manager.deploy(&id, port).await);
            return Ok(ExitCode::from(status.code()));
        }
    };

    let status = match result {
        Ok(()) => outcome::Status::Success,
        Err(e) => outcome::report_error(&e),
    };
    Ok(ExitCode::from(status.code()))
}

fn print_sites(sites: &[SiteListing]) {
    if sites.is_empty() {
        println!("no sites");
        return;
    }
    println!("{:<28} {:>5}  {:<7} {:<8} URL", "ID", "PORT", "STATUS", "HEALTH");
    for site in sites {
        let pending = site
            .pending
            .map(|op| format!("  ({op} pending)"))
            .unwrap_or_default();
        println!(
            "{:<28} {:>5}  {:<7} {:<8} {}{pending}",
            site.record.id,
            site.record.port,
            site.record.status.to_string(),
            site.health().to_string(),
            site.url
        );
    }
}

fn confirm(question: &str) -> io::Result<bool> {
    print!("{question} [y/N] ");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

// ─── Interactive UI ─────────────────────────────────────────────────────

/// Run the normal interactive TUI with crossterm backend.
async fn run_interactive(manager: Arc<SiteManager>) -> color_eyre::Result<()> {
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<AppEvent>();
    let _input_task = spawn_input_task(event_tx.clone());
    let _tick_task = spawn_tick_task(event_tx.clone());

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new();

    loop {
        terminal.draw(|f| ui::render(f, &app, None))?;

        if let Ok(event) = event_rx.try_recv() {
            process_event(&mut app, event, &manager, &event_tx);
        } else {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }

        if app.should_quit {
            break;
        }
    }

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    Ok(())
}

/// Run headless mode: read scripted input, render to TestBackend, dump frames to stdout.
async fn run_headless(script_path: PathBuf, manager: Arc<SiteManager>) -> color_eyre::Result<()> {
    use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyEventState, KeyModifiers};
    use ratatui::backend::TestBackend;

    let script = std::fs::read_to_string(&script_path)?;

    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<AppEvent>();
    // No spawn_input_task: input comes from the script
    let _tick_task = spawn_tick_task(event_tx.clone());

    let backend = TestBackend::new(120, 40);
    let mut terminal = Terminal::new(backend)?;
    let mut app = App::new();

    for raw_line in script.lines() {
        let line = raw_line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }

        if line == "quit" {
            break;
        }

        if line == "screenshot" {
            headless_screenshot(&mut terminal, &app, None)?;
            continue;
        }

        if let Some(label) = line.strip_prefix("screenshot:") {
            headless_screenshot(&mut terminal, &app, Some(label.trim()))?;
            continue;
        }

        if let Some(ms_str) = line.strip_prefix("wait:") {
            let ms: u64 = ms_str.trim().parse().unwrap_or(100);
            headless_wait(&mut app, &mut event_rx, &manager, &event_tx, ms).await;
            continue;
        }

        if let Some(text) = line.strip_prefix("type:") {
            for ch in text.chars() {
                let key_event = KeyEvent::new(KeyCode::Char(ch), KeyModifiers::NONE);
                keys::handle_key(&mut app, key_event, &manager, &event_tx);
            }
            continue;
        }

        if let Some(key_str) = line.strip_prefix("key:") {
            let trimmed = key_str.trim();
            let (modifiers, key_name) = if let Some(rest) = trimmed.strip_prefix("ctrl+") {
                (KeyModifiers::CONTROL, rest)
            } else {
                (KeyModifiers::NONE, trimmed)
            };

            let key_code = match key_name {
                "enter" => KeyCode::Enter,
                "esc" => KeyCode::Esc,
                "tab" => KeyCode::Tab,
                "up" => KeyCode::Up,
                "down" => KeyCode::Down,
                "backspace" => KeyCode::Backspace,
                s if s.chars().count() == 1 => match s.chars().next() {
                    Some(ch) => KeyCode::Char(ch),
                    None => continue,
                },
                other => {
                    eprintln!("headless: unknown key '{other}'");
                    continue;
                }
            };

            let key_event = KeyEvent {
                code: key_code,
                modifiers,
                kind: KeyEventKind::Press,
                state: KeyEventState::NONE,
            };
            keys::handle_key(&mut app, key_event, &manager, &event_tx);
            continue;
        }

        eprintln!("headless: unknown command '{line}'");
    }

    Ok(())
}

/// Render the current app state to the TestBackend and dump frame text to stdout.
fn headless_screenshot(
    terminal: &mut Terminal<ratatui::backend::TestBackend>,
    app: &App,
    label: Option<&str>,
) -> color_eyre::Result<()> {
    if let Some(label) = label {
        println!("=== {label} ===");
    }
    terminal.draw(|f| ui::render(f, app, None))?;
    let buf = terminal.backend().buffer();
    for y in 0..buf.area.height {
        let mut line = String::new();
        for x in 0..buf.area.width {
            line.push_str(buf[(x, y)].symbol());
        }
        println!("{}", line.trim_end());
    }
    Ok(())
}

/// Process async events during a `wait:` command.
async fn headless_wait(
    app: &mut App,
    event_rx: &mut mpsc::UnboundedReceiver<AppEvent>,
    manager: &Arc<SiteManager>,
    event_tx: &mpsc::UnboundedSender<AppEvent>,
    ms: u64,
) {
    let deadline = tokio::time::Instant::now() + std::time::Duration::from_millis(ms);
    while tokio::time::Instant::now() < deadline {
        while let Ok(event) = event_rx.try_recv() {
            process_event(app, event, manager, event_tx);
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
}

/// Process a single AppEvent, updating app state accordingly.
fn process_event(
    app: &mut App,
    event: AppEvent,
    manager: &Arc<SiteManager>,
    event_tx: &mpsc::UnboundedSender<AppEvent>,
) {
    match event {
        AppEvent::Key(key) => {
            if key.kind == crossterm::event::KeyEventKind::Press {
                keys::handle_key(app, key, manager, event_tx);
            }
        }
        AppEvent::Tick => keys::spawn_refresh(app, manager, event_tx),
        AppEvent::Error(msg) => {
            tracing::debug!(error = %msg, "event_error");
            app.set_status(format!("Error: {msg}"));
            if matches!(app.mode, Mode::Loading(_)) {
                app.mode = Mode::SiteList;
            }
            keys::spawn_refresh(app, manager, event_tx);
        }
        AppEvent::Info(msg) => {
            tracing::debug!(info = %msg, "event_info");
            app.set_status(msg);
            if matches!(app.mode, Mode::Loading(_)) {
                app.mode = Mode::SiteList;
            }
            keys::spawn_refresh(app, manager, event_tx);
        }
        AppEvent::SitesLoaded(result) => {
            app.refreshing = false;
            match result {
                Ok(sites) => {
                    tracing::debug!(count = sites.len(), "sites_loaded");
                    app.set_sites(sites);
                }
                Err(msg) => app.set_status(format!("Error: {msg}")),
            }
        }
    }
}
