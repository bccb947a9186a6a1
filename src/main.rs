use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use zikr_companion::{
    AppConfig, Clock, Corpus, FileStore, HijriApiClient, Layout, Preferences, PullGesture,
    SessionController, SessionTimings, SystemClock, TaskScheduler,
    app::{Command as Input, Flow, Message, ZikrApp},
    azkar_period, classify, format_clock, resolve_hijri,
    corpus::MORNING_EVENING_AZKAR,
};

#[derive(Parser, Debug)]
#[command(name = "zikr-companion")]
#[command(about = "Devotional counter with Hijri date and time-of-day selection")]
struct Args {
    #[command(subcommand)]
    command: Option<Cmd>,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Print the Hijri date
    Hijri {
        /// Gregorian date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Skip the remote date service
        #[arg(long)]
        offline: bool,
    },
    /// Print the current time slot and azkar period
    Slot,
    /// Show, set or toggle the stored layout
    Layout {
        #[arg(value_enum)]
        action: Option<LayoutAction>,
    },
    /// List morning/evening azkar and update read markers
    Azkar {
        #[arg(long)]
        mark: Vec<String>,
        #[arg(long)]
        unmark: Vec<String>,
    },
    /// Interactive counter session (default)
    Run,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum LayoutAction {
    Light,
    Dark,
    Toggle,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let command = args.command.unwrap_or(Cmd::Run);

    // Interactive mode shares the terminal, so keep logging quiet there
    let directives = if matches!(command, Cmd::Run) {
        "zikr_companion=warn"
    } else {
        "zikr_companion=debug"
    };
    let filter = EnvFilter::builder()
        .with_default_directive(tracing::level_filters::LevelFilter::INFO.into())
        .parse_lossy(directives);

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;
    let config = Arc::new(config);

    match command {
        Cmd::Hijri { date, offline } => {
            let rt = tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;
            rt.block_on(print_hijri(&config, date, offline))
        }
        Cmd::Slot => {
            print_slot(&SystemClock);
            Ok(())
        }
        Cmd::Layout { action } => run_layout(&config, action),
        Cmd::Azkar { mark, unmark } => run_azkar(&config, &mark, &unmark),
        Cmd::Run => {
            let rt = tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;
            let result = rt.block_on(run_session(config));
            // The stdin reader may still be parked in a blocking read
            rt.shutdown_background();
            result
        }
    }
}

fn open_preferences(config: &AppConfig) -> Result<Preferences<FileStore>> {
    let path = config
        .store
        .path
        .clone()
        .unwrap_or_else(FileStore::default_path);
    let store = FileStore::open(&path).context("Failed to open preferences store")?;
    tracing::debug!(path = %store.path().display(), "Preferences store opened");
    Ok(Preferences::new(store))
}

fn date_service_client(config: &AppConfig) -> Result<Option<HijriApiClient>> {
    if !config.date_service.enabled {
        return Ok(None);
    }
    let client = HijriApiClient::new(config.date_service.base_url.clone(), &config.network)?;
    Ok(Some(client))
}

async fn print_hijri(config: &AppConfig, date: Option<NaiveDate>, offline: bool) -> Result<()> {
    let date = date.unwrap_or_else(|| SystemClock.now_local().date_naive());
    let client = if offline {
        None
    } else {
        date_service_client(config)?
    };

    let hijri = resolve_hijri(client.as_ref(), date).await;
    println!("{}  ({})", hijri, date);
    Ok(())
}

fn print_slot(clock: &dyn Clock) {
    let now = clock.now_local();
    println!("{}  {}", format_clock(&now), classify(&now));
    if let Some(period) = azkar_period(&now) {
        println!("{}", period.title());
    }
}

fn run_layout(config: &AppConfig, action: Option<LayoutAction>) -> Result<()> {
    let prefs = open_preferences(config)?;
    let layout = match action {
        None => prefs.layout()?,
        Some(LayoutAction::Toggle) => prefs.toggle_layout()?,
        Some(LayoutAction::Light) => {
            prefs.set_layout(Layout::Light)?;
            Layout::Light
        }
        Some(LayoutAction::Dark) => {
            prefs.set_layout(Layout::Dark)?;
            Layout::Dark
        }
    };
    println!("{:?}", layout);
    Ok(())
}

fn run_azkar(config: &AppConfig, mark: &[String], unmark: &[String]) -> Result<()> {
    let known = |id: &str| MORNING_EVENING_AZKAR.iter().any(|z| z.id == id);
    if let Some(unknown) = mark.iter().chain(unmark).find(|id| !known(id)) {
        bail!("Unknown azkar id '{}'", unknown);
    }

    let prefs = open_preferences(config)?;
    for id in mark {
        prefs.set_read(id, true)?;
    }
    for id in unmark {
        prefs.set_read(id, false)?;
    }

    let read = prefs.read_azkar()?;
    for zikr in MORNING_EVENING_AZKAR {
        let marker = if read.contains(zikr.id) { "x" } else { " " };
        println!("[{}] {:<10} {}", marker, zikr.id, zikr.arabic);
    }
    Ok(())
}

/// Interactive session: one event loop fed by stdin, timers and the date lookup.
async fn run_session(config: Arc<AppConfig>) -> Result<()> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let read_azkar = open_preferences(&config)?.read_azkar()?;

    let session = SessionController::with_entropy(
        Corpus::standard(),
        clock.clone(),
        SessionTimings::from(&config.timings),
    );

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut app = ZikrApp::new(
        session,
        TaskScheduler::new(tx.clone()),
        clock.clone(),
        Duration::from_secs(config.timings.clock_refresh_secs),
        read_azkar,
    )
    .with_gesture(PullGesture::new(config.gesture));

    let client = date_service_client(&config)?;
    let today = clock.now_local().date_naive();
    let hijri_tx = tx.clone();
    let hijri_task = tokio::spawn(async move {
        let hijri = resolve_hijri(client.as_ref(), today).await;
        let _ = hijri_tx.send(Message::HijriResolved(hijri));
    });

    let input_tx = tx;
    let input_task = tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            match line.parse::<Input>() {
                Ok(command) => {
                    if input_tx.send(Message::Input(command)).is_err() {
                        return;
                    }
                }
                Err(e) => eprintln!("{}", e),
            }
        }
        // EOF ends the session
        let _ = input_tx.send(Message::Input(Input::Quit));
    });

    app.start();
    render(&app);

    while let Some(message) = rx.recv().await {
        match app.update(message) {
            Flow::Redraw => render(&app),
            Flow::Idle => {}
            Flow::Exit => break,
        }
    }

    app.shutdown();
    input_task.abort();
    hijri_task.abort();
    tracing::info!("Session ended");
    Ok(())
}

fn render(app: &ZikrApp) {
    print!("\x1b[2J\x1b[H{}", app.view());
    println!();
}
