//! # Garden Humidity
//!
//! Record soil humidity sensor telemetry into hourly ZIP archives.
//!
//! # Control Flow
//!
//! 1. **Initialization**
//!    - Parse command line, load optional TOML configuration
//!    - Set up logging with tracing subscriber
//!    - Pick the serial port (argument, config, or auto-detect)
//!
//! 2. **Main Loop**
//!    - Synchronize on the sensor stream once
//!    - Decode readings and append them to the current archive
//!    - Open a new archive at every hour boundary
//!
//! 3. **Graceful Shutdown**
//!    - Ctrl+C stops the loop after the current reading
//!    - The open archive is finalized and totals are logged
//!
//! Expected output:
//! ```text
//! INFO garden_humidity::serial: Opened sensor at /dev/ttyACM0 (19200 baud)
//! INFO garden_humidity::protocol::sync: Stream synchronized (0 bytes skipped)
//! INFO garden_humidity::archive: Writing to /home/pi/.garden/metrics/pots/humidity/2024-05-01/12-17-45.zip
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn, Level};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use garden_humidity::clock::SystemClock;
use garden_humidity::config::Config;
use garden_humidity::pipeline::{Pipeline, Shutdown};
use garden_humidity::serial::{self, SensorSerial};

/// Log file name prefix inside `logging.dir`
const LOG_FILE_NAME: &str = "garden-humidity.log";

/// Exit code after a forced abort (128 + SIGINT)
const ABORT_EXIT_CODE: i32 = 130;

/// Humidity sensor recorder
#[derive(Parser, Debug)]
#[command(name = "garden-humidity", version, about = "Humidity sensor", long_about = None)]
struct Cli {
    /// Serial port to read (auto-detected when omitted)
    port: Option<String>,

    /// Serial port baud rate [default: 19200]
    #[arg(short, long, value_parser = parse_baud_rate)]
    baudrate: Option<u32>,

    /// List available serial ports and exit
    #[arg(short, long)]
    list: bool,

    /// Show more messages, print every reading as JSON
    #[arg(short, long)]
    verbose: bool,

    /// Suppress informational messages
    #[arg(short, long)]
    quiet: bool,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Archive root directory
    #[arg(short, long = "output-dir")]
    output_dir: Option<PathBuf>,
}

impl Cli {
    fn log_level(&self) -> Level {
        if self.quiet {
            Level::WARN
        } else if self.verbose {
            Level::DEBUG
        } else {
            Level::INFO
        }
    }

    /// Merge command line overrides into the file configuration
    fn apply_to(&self, config: &mut Config) {
        if let Some(port) = &self.port {
            config.serial.port = Some(port.clone());
        }
        if let Some(baud_rate) = self.baudrate {
            config.serial.baud_rate = baud_rate;
        }
        if let Some(dir) = &self.output_dir {
            config.archive.root_dir = Some(dir.clone());
        }
    }
}

fn parse_baud_rate(value: &str) -> std::result::Result<u32, String> {
    let rate: u32 = value
        .parse()
        .map_err(|_| format!("`{}` is not a number", value))?;

    if serial::is_valid_baud_rate(rate) {
        Ok(rate)
    } else {
        let choices: Vec<String> = serial::BAUD_RATES.iter().map(u32::to_string).collect();
        Err(format!("{} is not one of: {}", rate, choices.join(", ")))
    }
}

/// Main entry point for Garden Humidity
///
/// # Errors
///
/// Returns error if:
/// - Configuration cannot be loaded
/// - Serial port cannot be opened
/// - The stream or an archive fails while recording
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load configuration {}", path.display()))?,
        None => Config::default(),
    };
    cli.apply_to(&mut config);
    config.validate()?;

    let _log_guard = init_logging(cli.log_level(), config.logging.dir.as_deref());

    if cli.list {
        for port in serial::list_ports()? {
            println!("{}", serial::describe_port(&port, cli.verbose));
        }
        return Ok(());
    }

    let port = match config.serial.port.clone() {
        Some(port) => port,
        None => match serial::suggest_port(&config.serial.manufacturer)? {
            Some(port) => port,
            None => {
                println!("Device not found");
                return Ok(());
            }
        },
    };

    let root = config.archive_root()?;
    info!("Garden Humidity v{} starting...", env!("CARGO_PKG_VERSION"));

    let sensor = SensorSerial::open(&port, config.serial.baud_rate)?;

    let shutdown = Shutdown::new();
    spawn_shutdown_listener(shutdown.clone());
    info!("Press Ctrl+C to exit");

    let mut pipeline =
        Pipeline::new(sensor.into_source(), SystemClock, root, shutdown).with_echo(cli.verbose);
    let summary = pipeline.run().await?;

    info!(
        "Recorded {} readings into {} archives",
        summary.readings, summary.archives
    );

    Ok(())
}

/// Set up stderr logging, plus a daily rolling file when `log_dir` is given
///
/// The returned guard must be held until exit so buffered file logs are flushed.
fn init_logging(level: Level, log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::from_default_env().add_directive(level.into());
    let stderr_layer = fmt::layer().with_writer(std::io::stderr);

    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_NAME);
            let (writer, guard) = tracing_appender::non_blocking(appender);

            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .with(fmt::layer().with_ansi(false).with_writer(writer))
                .init();

            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .init();

            None
        }
    }
}

/// Turn the first Ctrl+C into a shutdown request
///
/// The pipeline only sees the request between readings, so a silent device
/// would never stop; a second Ctrl+C aborts the process instead.
fn spawn_shutdown_listener(shutdown: Shutdown) {
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            return;
        }
        info!("Received Ctrl+C, closing archive after the current reading...");
        shutdown.trigger();

        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Received second Ctrl+C, aborting");
            std::process::exit(ABORT_EXIT_CODE);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use garden_humidity::serial::DEFAULT_BAUD_RATE;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["garden-humidity"]).unwrap();
        assert!(cli.port.is_none());
        assert!(cli.baudrate.is_none());
        assert!(!cli.list && !cli.verbose && !cli.quiet);
        assert_eq!(cli.log_level(), Level::INFO);

        let mut config = Config::default();
        cli.apply_to(&mut config);
        assert_eq!(config.serial.baud_rate, DEFAULT_BAUD_RATE);
        assert!(config.serial.port.is_none());
    }

    #[test]
    fn test_cli_overrides_config() {
        let cli = Cli::try_parse_from([
            "garden-humidity",
            "/dev/ttyUSB1",
            "-b",
            "9600",
            "--output-dir",
            "/tmp/garden",
        ])
        .unwrap();

        let mut config = Config::parse("[serial]\nport = \"/dev/ttyACM0\"\nbaud_rate = 115200\n").unwrap();
        cli.apply_to(&mut config);

        assert_eq!(config.serial.port.as_deref(), Some("/dev/ttyUSB1"));
        assert_eq!(config.serial.baud_rate, 9600);
        assert_eq!(config.archive.root_dir, Some(PathBuf::from("/tmp/garden")));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_cli_rejects_unsupported_baud_rate() {
        assert!(Cli::try_parse_from(["garden-humidity", "-b", "12345"]).is_err());
        assert!(Cli::try_parse_from(["garden-humidity", "--baudrate", "fast"]).is_err());
    }

    #[test]
    fn test_parse_baud_rate() {
        assert_eq!(parse_baud_rate("19200"), Ok(19200));
        assert!(parse_baud_rate("420000").unwrap_err().contains("19200"));
        assert!(parse_baud_rate("-1").is_err());
    }

    #[test]
    fn test_log_levels() {
        let quiet = Cli::try_parse_from(["garden-humidity", "-q"]).unwrap();
        assert_eq!(quiet.log_level(), Level::WARN);

        let verbose = Cli::try_parse_from(["garden-humidity", "-v"]).unwrap();
        assert_eq!(verbose.log_level(), Level::DEBUG);

        let both = Cli::try_parse_from(["garden-humidity", "-v", "-q"]).unwrap();
        assert_eq!(both.log_level(), Level::WARN);
    }

    #[test]
    fn test_list_flag() {
        let cli = Cli::try_parse_from(["garden-humidity", "-l", "-v"]).unwrap();
        assert!(cli.list);
        assert!(cli.verbose);
    }
}
