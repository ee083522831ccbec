//! CLI binary for ani-tracker.

use ani_tracker::config::parse_duration;
use ani_tracker::diff::display::print_colored;
use ani_tracker::lifecycle::marker;
use ani_tracker::{Conductor, LifecycleWatcher, LockFile, Scheduler, TrackerConfig};
use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;

/// Periodically compare recorded playlists with their remote versions.
#[derive(Parser)]
#[command(name = "ani-tracker", version, about)]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Working directory; relative file paths resolve against it.
    #[arg(short = 'd', long, global = true)]
    working_dir: Option<PathBuf>,

    /// Log to stderr instead of the log file.
    #[arg(long, global = true)]
    no_daemon: bool,

    /// Log file path.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Lifecycle marker path.
    #[arg(long, global = true)]
    lock_file: Option<PathBuf>,

    /// Time between checks (e.g. 90s, 15m, 1h30m).
    #[arg(short = 'i', long, global = true, value_parser = duration_arg)]
    interval: Option<Duration>,

    /// Attempts per check before exiting.
    #[arg(long, global = true)]
    attempt: Option<u32>,

    /// Retry `k` waits `k * backoff-multiplier`.
    #[arg(long, global = true, value_parser = duration_arg)]
    backoff_multiplier: Option<Duration>,

    /// History file path.
    #[arg(long, global = true)]
    history_file: Option<PathBuf>,

    /// Bookmark file path.
    #[arg(long, global = true)]
    bookmark_file: Option<PathBuf>,

    /// Diff export path.
    #[arg(long, global = true)]
    diff_file: Option<PathBuf>,

    /// Only track bookmarked playlists.
    #[arg(long, global = true)]
    bookmarks_only: bool,

    /// Do not send notifications.
    #[arg(long, global = true)]
    silent: bool,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Option<Command>,
}

/// Available commands.
#[derive(Subcommand, Clone, Copy)]
enum Command {
    /// Run the periodic comparison (default).
    Run,

    /// Print the last exported diff with colours.
    ShowDiff,

    /// Stop a running tracker by removing its lock file.
    Kill {
        /// Required to actually remove the lock file.
        #[arg(long)]
        confirm: bool,
    },
}

fn duration_arg(text: &str) -> Result<Duration, String> {
    parse_duration(text).map_err(|e| e.to_string())
}

impl Cli {
    /// Defaults, then the config file, then flags.
    fn tracker_config(&self) -> anyhow::Result<TrackerConfig> {
        let mut config = match &self.config {
            Some(path) => TrackerConfig::from_file(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => TrackerConfig::default(),
        };

        if let Some(dir) = &self.working_dir {
            config.working_dir = dir.clone();
        }
        if self.no_daemon {
            config.daemon = false;
        }
        if self.bookmarks_only {
            config.use_bookmarks_only = true;
        }
        if self.silent {
            config.notify.silent = true;
        }
        if let Some(interval) = self.interval {
            config.schedule.interval = interval;
        }
        if let Some(attempt) = self.attempt {
            config.schedule.max_attempts = attempt;
        }
        if let Some(unit) = self.backoff_multiplier {
            config.schedule.backoff_unit = unit;
        }

        let files = &mut config.files;
        for (flag, slot) in [
            (&self.log_file, &mut files.log),
            (&self.lock_file, &mut files.lock),
            (&self.history_file, &mut files.history),
            (&self.bookmark_file, &mut files.bookmarks),
            (&self.diff_file, &mut files.diff),
        ] {
            if let Some(path) = flag {
                *slot = path.clone();
            }
        }

        config.validate()?;
        Ok(config)
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ani_tracker=info"))
}

/// Install the subscriber. In daemon mode logs go to the log file and the
/// returned guard must live until exit.
fn init_logging(config: &TrackerConfig) -> anyhow::Result<Option<WorkerGuard>> {
    if !config.daemon {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter())
            .with_writer(std::io::stderr)
            .init();
        return Ok(None);
    }

    let log_path = std::path::absolute(config.log_path())
        .with_context(|| format!("resolving log path {}", config.log_path().display()))?;
    let file_name = log_path
        .file_name()
        .and_then(|name| name.to_str())
        .with_context(|| format!("invalid log file name {}", log_path.display()))?;
    let directory = log_path
        .parent()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name)
        .build(&directory)
        .with_context(|| format!("opening log file {}", log_path.display()))?;
    let (writer, guard) = tracing_appender::non_blocking(appender);

    println!("Start logging at: \"{}\"", log_path.display());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(writer)
        .with_ansi(false)
        .init();
    Ok(Some(guard))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.tracker_config()?;

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => run(config).await,
        Command::ShowDiff => {
            let path = config.diff_path();
            print_colored(&path).with_context(|| format!("reading {}", path.display()))
        }
        Command::Kill { confirm } => kill(&config, confirm),
    }
}

async fn run(config: TrackerConfig) -> anyhow::Result<()> {
    if !config.working_dir.is_dir() {
        anyhow::bail!(
            "working directory {} does not exist",
            config.working_dir.display()
        );
    }

    let _log_guard = init_logging(&config)?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        working_dir = %config.working_dir.display(),
        interval = ?config.schedule.interval,
        "ani-tracker starting"
    );

    let lock = LockFile::create(config.lock_path())
        .with_context(|| format!("creating lock file {}", config.lock_path().display()))?;

    let cancel = CancellationToken::new();
    let watcher = LifecycleWatcher::new(lock.path(), cancel.clone())
        .with_poll_interval(config.watcher.poll_interval)
        .with_termination_signals()
        .start()?;
    info!("program is running in background");

    let scheduler = Scheduler::from_config(&config.schedule, cancel.clone());
    let conductor = Conductor::from_config(&config).await;
    let result = scheduler.run(&conductor).await;

    cancel.cancel();
    watcher.join().await;
    drop(lock);

    match result {
        Ok(()) => {
            info!("ani-tracker stopped");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "scheduler stopped with error");
            Err(e.into())
        }
    }
}

fn kill(config: &TrackerConfig, confirm: bool) -> anyhow::Result<()> {
    let path = config.lock_path();
    if !confirm {
        anyhow::bail!(
            "refusing to remove {} without --confirm",
            path.display()
        );
    }

    if marker::remove(&path)? {
        println!("Removed {}; the running tracker will stop shortly.", path.display());
    } else {
        println!("No running tracker found ({} does not exist).", path.display());
    }
    Ok(())
}
