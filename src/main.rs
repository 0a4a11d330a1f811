// buildtail - main.rs
//
// Binary entry point. Handles:
// 1. CLI argument parsing
// 2. Config loading + logging initialisation
// 3. Watch session start and the render loop

use buildtail::app::watcher::{WatchConfig, WatchManager};
use buildtail::core::model::{Category, WatchEvent};
use buildtail::platform;
use buildtail::ui::console::{ColorChoice, ConsoleRenderer};
use buildtail::util;

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// buildtail - build-log tailing and annotation for CI.
///
/// Point buildtail at the log file a build tool writes (it does not need to
/// exist yet) and it re-emits the log to stdout with noise lines removed,
/// section headers highlighted, and severities colourised for a CI log
/// viewer.
#[derive(Parser, Debug)]
#[command(name = "buildtail", version, about)]
struct Cli {
    /// Path of the build log file to tail.
    log_path: PathBuf,

    /// Success sentinel substring (overrides config).
    #[arg(short = 's', long = "success-string")]
    success_string: Option<String>,

    /// Poll interval in milliseconds (overrides config).
    #[arg(short = 'i', long = "poll-interval-ms")]
    poll_interval_ms: Option<u64>,

    /// Stop grace period in milliseconds (overrides config).
    #[arg(long = "stop-grace-ms")]
    stop_grace_ms: Option<u64>,

    /// Additional exclusion regex; repeatable, appended to config patterns.
    #[arg(short = 'x', long = "exclude", value_name = "REGEX")]
    exclude: Vec<String>,

    /// When to emit ANSI colour codes.
    #[arg(long = "color", value_enum)]
    color: Option<ColorChoice>,

    /// Stop (after the grace period) and exit once a success line is seen.
    #[arg(long = "stop-on-success")]
    stop_on_success: bool,

    /// Enable debug logging (equivalent to RUST_LOG=debug).
    #[arg(short = 'd', long = "debug")]
    debug: bool,
}

fn main() {
    let cli = Cli::parse();

    // Config first: [logging] level feeds logging::init. Config-load
    // warnings are collected as strings and surfaced right after init.
    let paths = platform::config::PlatformPaths::resolve();
    let (config, warnings) = platform::config::load_config(&paths.config_dir);

    util::logging::init(cli.debug, config.log_level.as_deref());

    tracing::info!(
        version = util::constants::APP_VERSION,
        file = %cli.log_path.display(),
        "buildtail starting"
    );
    for warning in &warnings {
        tracing::warn!("{warning}");
    }

    cli.color.unwrap_or(config.color).apply();

    // CLI overrides config overrides defaults.
    let mut watch_config = WatchConfig::new(cli.log_path);
    watch_config.poll_interval =
        Duration::from_millis(cli.poll_interval_ms.unwrap_or(config.poll_interval_ms));
    watch_config.stop_grace =
        Duration::from_millis(cli.stop_grace_ms.unwrap_or(config.stop_grace_ms));
    watch_config.success_sentinel = cli.success_string.unwrap_or(config.success_sentinel);
    watch_config.extra_exclude_patterns = config.exclude_patterns;
    watch_config.extra_exclude_patterns.extend(cli.exclude);

    let mut manager = match WatchManager::start(watch_config) {
        Ok(manager) => manager,
        Err(e) => {
            tracing::error!(error = %e, "Failed to start watch");
            eprintln!("Error: {e}");
            std::process::exit(2);
        }
    };

    let Some(rx) = manager.event_rx.take() else {
        // start() always populates the receiver.
        tracing::error!("Watch started without an event channel");
        std::process::exit(2);
    };

    let renderer = ConsoleRenderer::new();
    let mut stopping = false;

    // Render loop: events arrive in file order. Runs until the watch stops
    // (stop-on-success) or the process is terminated.
    while let Ok(event) = rx.recv() {
        match event {
            WatchEvent::Started => {}
            WatchEvent::Line(line) => {
                let success = line.category == Category::Success;
                renderer.render(&line);
                if success && cli.stop_on_success && !stopping {
                    tracing::info!("Success line seen; stopping after grace period");
                    stopping = true;
                    // Blocks through the grace period and join; events the
                    // final polls queued are drained by this loop afterwards.
                    manager.stop();
                }
            }
            WatchEvent::TailError { path, message } => {
                tracing::error!(file = %path.display(), "{message}");
            }
            WatchEvent::Stopped => break,
        }
    }
}
