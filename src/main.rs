// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{error, info, warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use submod::app_config::{Config, LogLevel, TranslationProvider};
use submod::Controller;

/// Successful run with output written
const EXIT_OK: u8 = 0;
/// Run completed but no subtitles were rewritten
const EXIT_NOTHING_REWRITTEN: u8 = 1;
/// Fatal configuration, load or write error
const EXIT_FATAL: u8 = 2;

/// CLI Wrapper for TranslationProvider to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliTranslationProvider {
    #[value(name = "openai")]
    OpenAI,
    Anthropic,
    #[value(name = "lmstudio")]
    LMStudio,
}

impl From<CliTranslationProvider> for TranslationProvider {
    fn from(cli_provider: CliTranslationProvider) -> Self {
        match cli_provider {
            CliTranslationProvider::OpenAI => TranslationProvider::OpenAI,
            CliTranslationProvider::Anthropic => TranslationProvider::Anthropic,
            CliTranslationProvider::LMStudio => TranslationProvider::LMStudio,
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

impl From<CliLogLevel> for LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => LogLevel::Error,
            CliLogLevel::Warn => LogLevel::Warn,
            CliLogLevel::Info => LogLevel::Info,
            CliLogLevel::Debug => LogLevel::Debug,
            CliLogLevel::Trace => LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate shell completions for submod
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// submod - rewrite subtitle dialogue into modern phrasing
///
/// Sends the dialogue of an SRT file to a text-completion service in
/// numbered batches and writes the rewritten file with timings untouched.
#[derive(Parser, Debug)]
#[command(name = "submod")]
#[command(version)]
#[command(about = "Rewrite SRT subtitle dialogue into modern phrasing")]
#[command(long_about = "submod rewrites the dialogue of SRT subtitle files with a text-completion service, keeping every timing and index.

EXAMPLES:
    submod episode.srt                          # Rewrite using default config
    submod -o out.srt episode.srt               # Choose the output path
    submod -p anthropic -m claude-3-5-haiku-latest episode.srt
    submod -b 20 --delay-ms 0 episode.srt       # Smaller batches, no pause between them
    submod --log-level debug /subtitles/        # Process an entire directory
    submod --check episode.srt                  # Only test the provider connection
    submod completions bash > submod.bash       # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config. If the config file doesn't exist, a default one
    will be created automatically. Command line options override the file.

EXIT CODES:
    0  output written
    1  nothing was rewritten
    2  configuration, load or write error

SUPPORTED PROVIDERS:
    openai    - OpenAI API (default: gpt-4o, requires API key)
    anthropic - Anthropic API (requires API key)
    lmstudio  - LM Studio local server (OpenAI-compatible on http://localhost:1234/v1)")]
#[command(args_conflicts_with_subcommands = true)]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Input SRT file or directory to process
    #[arg(value_name = "INPUT_PATH")]
    input_path: Option<PathBuf>,

    /// Output file (default: <input stem>.modern.srt next to the input)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long = "config", default_value = "conf.json")]
    config_path: String,

    /// Provider to use
    #[arg(short, long, value_enum)]
    provider: Option<CliTranslationProvider>,

    /// Model name to use
    #[arg(short, long)]
    model: Option<String>,

    /// Subtitle entries per request
    #[arg(short, long)]
    batch_size: Option<usize>,

    /// Sampling temperature
    #[arg(long)]
    temperature: Option<f32>,

    /// Per-request timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Pause after every batch in milliseconds
    #[arg(long)]
    delay_ms: Option<u64>,

    /// API key for the selected provider
    #[arg(long, env = "SUBMOD_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Directory for raw responses of skipped batches
    #[arg(long)]
    log_dir: Option<String>,

    /// Sort and renumber the output entries from 1
    #[arg(long)]
    reindex: bool,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,

    /// Test the provider connection and exit
    #[arg(long)]
    check: bool,
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

    // @initializes: Global logger, later level changes go through log::set_max_level
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(LevelFilter::Trace));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Emoji for log level
    fn get_emoji_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "❌ ",
            Level::Warn => "🚧 ",
            Level::Info => " ",
            Level::Debug => "🔍 ",
            Level::Trace => "📋 ",
        }
    }

    // @returns: ANSI colour for log level
    fn get_color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
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
            let level = record.level();

            let _ = writeln!(
                std::io::stderr(),
                "{}{} {} {}\x1B[0m",
                Self::get_color_for_level(level),
                now,
                Self::get_emoji_for_level(level),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Info until the configuration says otherwise
    if let Err(e) = CustomLogger::init(LevelFilter::Info) {
        eprintln!("Failed to initialize logger: {}", e);
    }

    let cli = CommandLineOptions::parse();

    if let Some(Commands::Completions { shell }) = cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(shell, &mut cmd, "submod", &mut std::io::stdout());
        return ExitCode::from(EXIT_OK);
    }

    match run_rewrite(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            error!("{:#}", e);
            ExitCode::from(EXIT_FATAL)
        }
    }
}

async fn run_rewrite(options: CommandLineOptions) -> Result<u8> {
    if let Some(cmd_log_level) = &options.log_level {
        let level: LogLevel = cmd_log_level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    let mut config = load_or_create_config(&options.config_path)?;
    apply_overrides(&mut config, &options);
    log::set_max_level(config.log_level.to_level_filter());

    let controller = Controller::with_config(config).context("Configuration validation failed")?;

    if options.check {
        controller.test_connection().await.context("Connection test failed")?;
        return Ok(EXIT_OK);
    }

    let input_path = options
        .input_path
        .as_deref()
        .context("INPUT_PATH is required")?;

    if input_path.is_dir() {
        if options.output.is_some() {
            warn!("--output is ignored in folder mode, outputs are written next to their inputs");
        }
        let summary = controller.run_folder(input_path).await?;
        return Ok(if summary.written > 0 {
            EXIT_OK
        } else if summary.is_fatal() {
            EXIT_FATAL
        } else {
            EXIT_NOTHING_REWRITTEN
        });
    }

    let summary = controller.run(input_path, options.output.as_deref()).await?;
    if summary.has_output() {
        Ok(EXIT_OK)
    } else {
        info!("Skipped {} of {} batches", summary.skipped_batches, summary.total_batches);
        Ok(EXIT_NOTHING_REWRITTEN)
    }
}

/// Load the configuration file, writing a default one when it is missing
fn load_or_create_config(config_path: &str) -> Result<Config> {
    if Path::new(config_path).exists() {
        let file = File::open(config_path)
            .with_context(|| format!("Failed to open config file: {}", config_path))?;
        let reader = BufReader::new(file);
        return serde_json::from_reader(reader)
            .with_context(|| format!("Failed to parse config file: {}", config_path));
    }

    warn!("Config file not found at '{}', creating default config.", config_path);
    let config = Config::default();
    let config_json = serde_json::to_string_pretty(&config)
        .context("Failed to serialize default config to JSON")?;
    std::fs::write(config_path, config_json)
        .with_context(|| format!("Failed to write default config to file: {}", config_path))?;

    Ok(config)
}

/// Command line options win over the configuration file
fn apply_overrides(config: &mut Config, options: &CommandLineOptions) {
    if let Some(provider) = &options.provider {
        config.translation.provider = provider.clone().into();
    }

    let provider_config = config.translation.active_provider_config_mut();
    if let Some(model) = &options.model {
        provider_config.model = model.clone();
    }
    if let Some(api_key) = &options.api_key {
        provider_config.api_key = api_key.clone();
    }
    if let Some(timeout_secs) = options.timeout_secs {
        provider_config.timeout_secs = timeout_secs;
    }

    let common = &mut config.translation.common;
    if let Some(temperature) = options.temperature {
        common.temperature = temperature;
    }
    if let Some(delay_ms) = options.delay_ms {
        common.inter_batch_delay_ms = delay_ms;
    }

    if let Some(batch_size) = options.batch_size {
        config.subtitles.batch_size = batch_size;
    }
    if let Some(log_dir) = &options.log_dir {
        config.subtitles.log_dir = log_dir.clone();
    }
    if options.reindex {
        config.subtitles.reindex = true;
    }
    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }
}
