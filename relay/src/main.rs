//! gesture-relay - hand gesture classification relayed over a serial link.
//!
//! Reads hand landmarks from a detector process (or a recorded session),
//! turns finger poses into motion commands and writes each new command
//! to the remote device as a single byte.

mod config;
mod display;
mod error;
mod hand;
mod pipeline;
mod source;
mod transport;

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use clap::Parser;
use tracing::{info, warn};

use config::Config;
use display::{HeadlessOverlay, Overlay, TerminalOverlay};
use pipeline::{Emitter, Relay};
use source::SourceKind;
use transport::{CommandSink, SerialLink};

#[derive(Parser, Debug)]
#[command(
    name = "gesture-relay",
    version,
    about = "Relay hand gestures to a serial device as motion commands"
)]
struct Cli {
    /// Config file (default: ~/.gesture_relay/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Serial device path
    #[arg(long)]
    serial_port: Option<PathBuf>,

    /// Run detect-only, without opening the serial link
    #[arg(long)]
    no_serial: bool,

    /// Serial line speed
    #[arg(long)]
    baud: Option<u32>,

    /// Replay a recorded landmark session instead of running the detector
    #[arg(long)]
    replay: Option<PathBuf>,

    /// Pace the replay at this frame rate (default: as fast as possible)
    #[arg(long, requires = "replay")]
    replay_fps: Option<f32>,

    /// Run without the terminal overlay
    #[arg(long)]
    headless: bool,

    /// Detector command line, split on whitespace
    #[arg(long)]
    detector_cmd: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,

    /// Write the effective configuration to this path and exit
    #[arg(long)]
    write_config: Option<PathBuf>,
}

impl Cli {
    /// Layer command-line overrides on top of the loaded configuration.
    fn apply(&self, config: &mut Config) {
        if let Some(port) = &self.serial_port {
            config.serial.port = port.clone();
        }
        if self.no_serial {
            config.serial.enabled = false;
        }
        if let Some(baud) = self.baud {
            config.serial.baud_rate = baud;
        }
        if self.headless {
            config.display.headless = true;
        }
        if let Some(cmd) = &self.detector_cmd {
            config.detector.command = cmd.split_whitespace().map(str::to_string).collect();
        }
    }

    fn source_kind(&self) -> SourceKind {
        match &self.replay {
            Some(path) => SourceKind::Replay {
                path: path.clone(),
                fps: self.replay_fps,
            },
            None => SourceKind::Detector,
        }
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_default()?,
    };
    cli.apply(&mut config);
    config.validate()?;
    Ok(config)
}

/// Open the serial link, or fall back to detect-only.
fn open_sink(config: &Config) -> Option<Box<dyn CommandSink>> {
    if !config.serial.enabled {
        info!("Serial link disabled, running detect-only");
        return None;
    }
    match SerialLink::open(&config.serial) {
        Ok(link) => Some(Box::new(link)),
        Err(e) => {
            warn!("Error initializing serial connection: {}", e);
            warn!("Continuing in detect-only mode");
            None
        }
    }
}

fn open_overlay(config: &Config) -> Box<dyn Overlay> {
    if config.display.headless {
        return Box::new(HeadlessOverlay::new());
    }
    match TerminalOverlay::new(config.display.plot_cols, config.display.plot_rows) {
        Ok(overlay) => Box::new(overlay),
        Err(e) => {
            warn!("Terminal overlay unavailable ({}), running headless", e);
            Box::new(HeadlessOverlay::new())
        }
    }
}

/// Append-mode log file, creating its directory if needed.
fn open_log_file(path: &Path) -> anyhow::Result<File> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    Ok(file)
}

/// Logs go to `log` when given, otherwise to stderr.
fn init_tracing(verbose: bool, log: Option<&File>) -> anyhow::Result<()> {
    let default_filter = if verbose {
        "gesture_relay=debug"
    } else {
        "gesture_relay=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    match log {
        Some(file) => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file.try_clone()?))
            .init(),
        None => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init(),
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    if cli.print_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }
    if let Some(path) = &cli.write_config {
        config.save(path)?;
        eprintln!("Configuration written to {}", path.display());
        return Ok(());
    }

    // The terminal overlay owns the tty, so logs and detector stderr go
    // to a file instead of scribbling over it.
    let log = if config.display.headless {
        None
    } else {
        let path = &config.display.log_file;
        eprintln!("Logging to {}", path.display());
        Some(open_log_file(path)?)
    };
    init_tracing(cli.verbose, log.as_ref())?;

    info!("gesture-relay v{} starting", env!("CARGO_PKG_VERSION"));

    let sink = open_sink(&config);
    let source = source::open(&cli.source_kind(), &config.detector, log.as_ref())?;
    let overlay = open_overlay(&config);

    let relay = Relay::new(source, overlay, Emitter::new(sink), &config);
    relay.run()?;

    info!("Program terminated successfully");
    Ok(())
}
