//! faderlink - Main Entry Point
//!
//! Connects to the control surface described by the config file, logs
//! slider moves, runs button actions, and follows config file edits.

use anyhow::Context;
use clap::Parser;
use faderlink::{
    actions::{ActionTrigger, ButtonMap, LoggingKeyInput},
    config::{self, watcher::DEFAULT_POLL_INTERVAL, ConfigWatcher},
    serial::SerialPortOpener,
    Config, FrameProcessor, ReloadCoordinator, SerialConnection,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Bridge a serial slider/button surface to host actions
#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = config::DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Log every line read from the serial link
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _log_guard = init_logging(cli.verbose);

    tracing::info!("Starting faderlink");

    let config = Config::load(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;

    let button_map = ButtonMap::new(config.button_mapping());
    tracing::info!("Button mapping: {}", button_map);

    let trigger = ActionTrigger::new(button_map, Arc::new(LoggingKeyInput));
    let processor = Arc::new(FrameProcessor::new(
        trigger,
        config.invert_sliders,
        config.noise_reduction,
    ));

    // Stand-in consumer for the volume side
    let sliders = processor.subscribe_sliders();
    std::thread::Builder::new()
        .name("slider-log".to_string())
        .spawn(move || {
            for event in sliders.iter() {
                tracing::info!("Slider {} -> {:.2}", event.slider_id, event.percent_value);
            }
        })?;

    let connection = Arc::new(SerialConnection::new(
        config.connection_parameters(),
        Arc::new(SerialPortOpener),
        processor,
    ));

    // A failed first connect is not fatal; fixing the port in the config reconnects
    if let Err(e) = connection.start() {
        tracing::warn!("Initial connection failed: {}", e);
    }

    let mut watcher = ConfigWatcher::new(&cli.config, DEFAULT_POLL_INTERVAL);
    ReloadCoordinator::new(connection).spawn(watcher.subscribe())?;

    // Runs until the process exits
    watcher.run();

    Ok(())
}

/// Console logging plus a daily log file under the app data directory
fn init_logging(verbose: bool) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let default_filter = if verbose {
        "info,faderlink=trace"
    } else {
        "info,faderlink=debug"
    };
    let filter = || {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter))
    };

    let (file_layer, guard) = match config::log_dir() {
        Some(dir) if std::fs::create_dir_all(&dir).is_ok() => {
            let appender = tracing_appender::rolling::daily(dir, "faderlink.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        _ => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter())
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();

    guard
}
