use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use ratatui::Terminal;
use ratatui::crossterm::event;
use ratatui::crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use ratatui::crossterm::execute;
use ratatui::crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::prelude::CrosstermBackend;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;
use typeahead_core::config_file::{
    self, ConfigFile, DisplaySection, SearchSection, TypeaheadSection,
};
use typeahead_core::{HttpSearch, LookupOutcome};

mod action;
mod app;
mod input;
mod theme;
mod view;

use app::App;

/// Fields shown for each result when no `label_fields` are configured.
const DEFAULT_LABEL_FIELDS: &[&str] = &[
    "disasterType",
    "disasterNumber",
    "title",
    "declaredCountyArea",
    "state",
];

/// Typeahead TUI: search a JSON endpoint as you type and collect matches.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Search endpoint URL (queried as `<src>?q=<query>`)
    #[arg(long)]
    src: Option<String>,

    /// Minimum query length before searching
    #[arg(long)]
    min_chars: Option<usize>,

    /// Select the first result as soon as results arrive
    #[arg(long)]
    select_first: bool,

    /// Keep at most this many results per response
    #[arg(long)]
    limit: Option<usize>,

    /// Wait this long after the last keystroke before searching
    #[arg(long)]
    debounce_ms: Option<u64>,

    /// Per-request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Result field to show in the list (repeatable)
    #[arg(long = "label-field")]
    label_fields: Vec<String>,

    /// Color theme: hacker (default) or modern
    #[arg(long)]
    theme: Option<String>,

    /// Log file (default: <cache_dir>/typeahead/typeahead.log)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Write the resolved settings to the platform config file and exit
    #[arg(long)]
    save_config: bool,
}

/// Layer CLI flags and environment over the on-disk config.
fn resolve(args: &Args, file: ConfigFile) -> ConfigFile {
    let cli = ConfigFile {
        search: Some(SearchSection {
            src: args
                .src
                .clone()
                .or_else(|| std::env::var("TYPEAHEAD_SRC").ok()),
            timeout_secs: args.timeout,
            ..Default::default()
        }),
        typeahead: Some(TypeaheadSection {
            min_chars: args.min_chars,
            select_first: args.select_first.then_some(true),
            limit: args.limit,
            debounce_ms: args.debounce_ms,
        }),
        display: Some(DisplaySection {
            theme: args.theme.clone(),
            label_fields: (!args.label_fields.is_empty()).then(|| args.label_fields.clone()),
        }),
    };
    config_file::merge(file, cli)
}

/// Route tracing output to a file; the terminal belongs to ratatui.
fn init_logging(
    log_file: Option<PathBuf>,
) -> anyhow::Result<tracing_appender::non_blocking::WorkerGuard> {
    let path = match log_file {
        Some(p) => p,
        None => dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("could not determine cache directory; pass --log-file"))?
            .join("typeahead")
            .join("typeahead.log"),
    };
    let dir = path
        .parent()
        .filter(|d| !d.as_os_str().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    let file_name = path
        .file_name()
        .ok_or_else(|| anyhow::anyhow!("log file path has no file name: {}", path.display()))?;
    std::fs::create_dir_all(&dir)?;

    let appender = tracing_appender::rolling::never(&dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(writer)
        .with_ansi(false)
        .init();
    Ok(guard)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    // CLI flags > env vars > config file > defaults
    let settings = resolve(&args, config_file::load_config());

    if args.save_config {
        let path = config_file::save_config(&settings)?;
        println!("Saved config to {}", path.display());
        return Ok(());
    }

    let _log_guard = init_logging(args.log_file.clone())?;

    let search_config = settings.search_config();
    if search_config.src.is_empty() {
        anyhow::bail!("no search endpoint configured: pass --src or set TYPEAHEAD_SRC");
    }
    let backend = Arc::new(HttpSearch::new(search_config)?);

    let display = settings.display.clone().unwrap_or_default();
    let theme = theme::Theme::by_name(display.theme.as_deref().unwrap_or("hacker"));
    let label_fields = display
        .label_fields
        .unwrap_or_else(|| DEFAULT_LABEL_FIELDS.iter().map(|s| s.to_string()).collect());

    let typeahead_config = settings.typeahead_config();
    tracing::info!(
        min_chars = typeahead_config.min_chars,
        debounce_ms = typeahead_config.debounce_ms,
        "starting typeahead"
    );

    let (outcome_tx, mut outcome_rx) = mpsc::unbounded_channel::<LookupOutcome>();
    let mut app = App::new(typeahead_config, backend, theme, label_fields)
        .with_lookup_sender(outcome_tx);

    // Initialize terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

    // Install panic hook that restores terminal before printing panic
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        original_hook(panic_info);
    }));

    let backend_terminal = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend_terminal)?;

    // Drain any stray input events (e.g. Enter keypress from launching the command)
    while event::poll(Duration::from_millis(50)).unwrap_or(false) {
        let _ = event::read();
    }

    let tick_rate = Duration::from_millis(80);

    loop {
        terminal.draw(|f| app.view(f))?;

        tokio::select! {
            Some(outcome) = outcome_rx.recv() => {
                app.handle_outcome(outcome);
                while let Ok(outcome) = outcome_rx.try_recv() {
                    app.handle_outcome(outcome);
                }
            }
            _ = async {
                if event::poll(tick_rate).unwrap_or(false)
                    && let Ok(evt) = event::read()
                {
                    app.update(input::map_event(&evt));
                }
            } => {}
        }

        app.update(action::Action::Tick);

        if app.should_quit {
            break;
        }
    }

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;

    for item in &app.extracts {
        println!("{}", serde_json::to_string(item)?);
    }

    Ok(())
}
