// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Result, anyhow, Context};
use log::{warn, info, LevelFilter, Log, Metadata, Record, Level, SetLoggerError};
use std::path::{Path, PathBuf};
use std::io::Write;
use clap::{Parser, ValueEnum, CommandFactory, Subcommand};
use clap_complete::{generate, Shell};

use dji_telemetry::app_config::{self, Config, OutputFormat};
use dji_telemetry::app_controller::{Controller, RunOutcome};

/// CLI Wrapper for OutputFormat to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliOutputFormat {
    Json,
    Jsonl,
}

impl From<CliOutputFormat> for OutputFormat {
    fn from(cli_format: CliOutputFormat) -> Self {
        match cli_format {
            CliOutputFormat::Json => OutputFormat::Json,
            CliOutputFormat::Jsonl => OutputFormat::Jsonl,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Extract telemetry from a video file or a directory of videos (default command)
    Extract(ExtractArgs),

    /// Print the normalized container metadata of a video as JSON
    Probe {
        /// Video file to probe
        #[arg(value_name = "VIDEO")]
        video: PathBuf,

        /// Configuration file path
        #[arg(short, long, default_value = "conf.json")]
        config_path: String,

        /// Set logging level
        #[arg(short, long, value_enum)]
        log_level: Option<CliLogLevel>,
    },

    /// Generate shell completions for dji-telemetry
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct ExtractArgs {
    /// Input video file or directory to process
    #[arg(value_name = "INPUT_PATH")]
    input_path: PathBuf,

    /// Force overwrite of existing output files
    #[arg(short, long)]
    force_overwrite: bool,

    /// Directory to write output files to (defaults to each video's directory)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum)]
    format: Option<CliOutputFormat>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// dji-telemetry - flight telemetry from DJI video subtitles
///
/// Reads the GPS, distance, elevation and speed readouts DJI drones embed as
/// subtitles and writes them as timestamped JSON records.
#[derive(Parser, Debug)]
#[command(name = "dji-telemetry")]
#[command(version)]
#[command(about = "Extract flight telemetry embedded in DJI video subtitles")]
#[command(long_about = "dji-telemetry probes DJI videos with ffprobe, extracts their subtitle track with ffmpeg
and turns every subtitle frame into a timestamped position record.

EXAMPLES:
    dji-telemetry DJI_0001.MP4                    # Write DJI_0001.telemetry.json next to the video
    dji-telemetry -f DJI_0001.MP4                 # Overwrite an existing output file
    dji-telemetry --format jsonl /flights/        # Process a directory, JSON lines output
    dji-telemetry -o out/ /flights/               # Write all outputs into out/
    dji-telemetry probe DJI_0001.MP4              # Print container metadata only
    dji-telemetry completions bash > dji.bash     # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically.

REQUIREMENTS:
    ffmpeg and ffprobe must be installed, or their paths set in the configuration.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Input video file or directory to process
    #[arg(value_name = "INPUT_PATH")]
    input_path: Option<PathBuf>,

    /// Force overwrite of existing output files
    #[arg(short, long)]
    force_overwrite: bool,

    /// Directory to write output files to (defaults to each video's directory)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum)]
    format: Option<CliOutputFormat>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(LevelFilter::Trace));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Marker and ANSI colour for log level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("❌", "1;31"),
            Level::Warn => ("🚧", "1;33"),
            Level::Info => (" ", "1;32"),
            Level::Debug => ("🔍", "1;36"),
            Level::Trace => ("📋", "1;35"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level && metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (marker, colour) = Self::style_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "\x1B[{}m{} {} {}\x1B[0m",
                colour, now, marker, record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

fn main() -> Result<()> {
    // Info until the configuration says otherwise
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "dji-telemetry", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Probe { video, config_path, log_level }) => {
            run_probe(&video, &config_path, log_level)
        }
        Some(Commands::Extract(args)) => run_extract(args),
        None => {
            // Default behavior - top-level args act as `extract`
            let input_path = cli.input_path.ok_or_else(|| {
                anyhow!("INPUT_PATH is required when no subcommand is specified")
            })?;

            run_extract(ExtractArgs {
                input_path,
                force_overwrite: cli.force_overwrite,
                output_dir: cli.output_dir,
                format: cli.format,
                config_path: cli.config_path,
                log_level: cli.log_level,
            })
        }
    }
}

/// Load the configuration file, creating a default one if it is missing,
/// then apply the log level from the command line or the file.
fn load_config(config_path: &str, log_level: Option<CliLogLevel>) -> Result<Config> {
    if let Some(level) = &log_level {
        let level: app_config::LogLevel = level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    let mut config = if Path::new(config_path).exists() {
        Config::from_file(config_path)?
    } else {
        warn!("Config file not found at '{}', creating default config.", config_path);
        let config = Config::default();
        config.save(config_path)?;
        config
    };

    match log_level {
        Some(level) => config.log_level = level.into(),
        None => log::set_max_level(config.log_level.to_level_filter()),
    }

    Ok(config)
}

fn run_probe(video: &Path, config_path: &str, log_level: Option<CliLogLevel>) -> Result<()> {
    let config = load_config(config_path, log_level)?;
    let controller = Controller::with_config(config)?;

    let metadata = controller.probe(video)?;
    let json = serde_json::to_string_pretty(&metadata)
        .context("Failed to serialize metadata")?;
    println!("{}", json);

    Ok(())
}

fn run_extract(options: ExtractArgs) -> Result<()> {
    let mut config = load_config(&options.config_path, options.log_level)?;

    if let Some(format) = options.format {
        config.output.format = format.into();
    }

    let controller = Controller::with_config(config)?;

    if options.input_path.is_file() {
        let output_dir = match &options.output_dir {
            Some(dir) => dir.clone(),
            None => options.input_path.parent().unwrap_or(Path::new(".")).to_path_buf(),
        };

        match controller.run(&options.input_path, &output_dir, options.force_overwrite)? {
            RunOutcome::Written(path) => info!("Success: {:?}", path),
            RunOutcome::Skipped(path) => info!("Kept existing output: {:?}", path),
        }
    } else if options.input_path.is_dir() {
        let summary = controller.run_folder(
            &options.input_path,
            options.output_dir.as_deref(),
            options.force_overwrite,
        )?;

        if summary.failed > 0 {
            return Err(anyhow!("{} of {} files failed", summary.failed,
                summary.processed + summary.skipped + summary.failed));
        }
    } else {
        return Err(anyhow!("Input path does not exist: {:?}", options.input_path));
    }

    Ok(())
}
