// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Result, anyhow, Context};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{info, warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

use lexiscribe::app_config::{self, Config, ModelProvider};
use lexiscribe::app_controller::Controller;

/// CLI Wrapper for ModelProvider to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliModelProvider {
    Gemini,
    Ollama,
    Anthropic,
}

impl From<CliModelProvider> for ModelProvider {
    fn from(cli_provider: CliModelProvider) -> Self {
        match cli_provider {
            CliModelProvider::Gemini => ModelProvider::Gemini,
            CliModelProvider::Ollama => ModelProvider::Ollama,
            CliModelProvider::Anthropic => ModelProvider::Anthropic,
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
    /// Extract dictionary entries from a scanned document (default command)
    #[command(alias = "extract")]
    Run(RunArgs),

    /// Check that the configured provider is reachable
    Check(CheckArgs),

    /// Generate shell completions for lexiscribe
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Options shared by every command that talks to a provider
#[derive(Args, Debug, Clone)]
struct ProviderOptions {
    /// AI provider to use
    #[arg(short, long, value_enum)]
    provider: Option<CliModelProvider>,

    /// Model name to use for extraction
    #[arg(short, long)]
    model: Option<String>,

    /// API key for the provider
    #[arg(short = 'k', long, env = "LEXISCRIBE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// Options of an extraction run
#[derive(Args, Debug, Clone)]
struct RunOptions {
    /// First page to process (1-based)
    #[arg(short, long)]
    start_page: Option<u32>,

    /// Last page to process (defaults to the config, then the last page)
    #[arg(short, long)]
    end_page: Option<u32>,

    /// Directory for the exported files
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Pause between model calls, in milliseconds
    #[arg(long)]
    pacing_ms: Option<u64>,

    /// Continue from the checkpoint of an earlier run
    #[arg(short, long)]
    resume: bool,

    /// Skip the deduplicated and filtered export
    #[arg(long)]
    no_refined: bool,

    #[command(flatten)]
    provider: ProviderOptions,
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// Scanned dictionary (.pdf, or .txt with form-feed separated pages)
    #[arg(value_name = "INPUT_PATH")]
    input_path: PathBuf,

    #[command(flatten)]
    options: RunOptions,
}

#[derive(Parser, Debug)]
struct CheckArgs {
    #[command(flatten)]
    provider: ProviderOptions,
}

/// Lexiscribe - dictionary digitization with AI
///
/// Reads the pages of a scanned bilingual dictionary, asks an AI model to
/// extract the lexical entries, and exports them as CSV and XLSX tables.
#[derive(Parser, Debug)]
#[command(name = "lexiscribe")]
#[command(version)]
#[command(about = "AI-powered dictionary digitization tool")]
#[command(long_about = "Lexiscribe extracts entries from scanned bilingual dictionaries using AI providers.

EXAMPLES:
    lexiscribe bertonio.pdf                        # Process the configured page range
    lexiscribe -s 40 -e 60 bertonio.pdf            # Process pages 40 to 60
    lexiscribe --resume bertonio.pdf               # Continue after the last checkpoint
    lexiscribe -p ollama -m llama3.2:3b scan.txt   # Use a local model on a pdftotext dump
    lexiscribe check -p anthropic                  # Check that the provider is reachable
    lexiscribe completions bash > lexiscribe.bash  # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically. The API key can also be given through the
    LEXISCRIBE_API_KEY environment variable.

SUPPORTED PROVIDERS:
    gemini    - Google Gemini API (default: gemini-1.5-flash, requires API key)
    ollama    - Local Ollama server (default: llama3.2:3b)
    anthropic - Anthropic Claude API (requires API key)")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Scanned dictionary (.pdf, or .txt with form-feed separated pages)
    #[arg(value_name = "INPUT_PATH")]
    input_path: Option<PathBuf>,

    #[command(flatten)]
    options: RunOptions,
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
        let logger = Box::new(CustomLogger::new(level));
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

    // @returns: ANSI color for log level
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
        // HTTP and PDF libraries stay quiet
        metadata.level() <= self.level && metadata.target().starts_with("lexiscribe")
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let level = record.level();

            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "{}{} {} {}\x1B[0m",
                Self::get_color_for_level(level), now, Self::get_emoji_for_level(level), record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

fn level_filter(level: &app_config::LogLevel) -> LevelFilter {
    match level {
        app_config::LogLevel::Error => LevelFilter::Error,
        app_config::LogLevel::Warn => LevelFilter::Warn,
        app_config::LogLevel::Info => LevelFilter::Info,
        app_config::LogLevel::Debug => LevelFilter::Debug,
        app_config::LogLevel::Trace => LevelFilter::Trace,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize the logger once with the most verbose level,
    // the effective level is set through log::set_max_level
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    // Parse command line arguments using clap
    let cli = CommandLineOptions::parse();

    // Handle subcommands
    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "lexiscribe", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Check(args)) => {
            let config = load_config(&args.provider)?;
            Controller::with_config(config)?.check_provider().await
        }
        Some(Commands::Run(args)) => run_extraction(args).await,
        None => {
            // Default behavior - use top-level args
            let input_path = cli.input_path.ok_or_else(|| {
                anyhow!("INPUT_PATH is required when no subcommand is specified")
            })?;
            run_extraction(RunArgs { input_path, options: cli.options }).await
        }
    }
}

async fn run_extraction(args: RunArgs) -> Result<()> {
    let options = &args.options;
    let mut config = load_config(&options.provider)?;

    // Override config with CLI options if provided
    if let Some(start_page) = options.start_page {
        config.processing.start_page = start_page;
    }
    if let Some(end_page) = options.end_page {
        config.processing.end_page = Some(end_page);
    }
    if let Some(output_dir) = &options.output_dir {
        config.output.directory = output_dir.to_string_lossy().to_string();
    }
    if let Some(pacing_ms) = options.pacing_ms {
        config.processing.pacing_delay_ms = pacing_ms;
    }
    if options.no_refined {
        config.output.write_refined = false;
    }

    // Validate the configuration after loading and overriding
    config.validate()
        .context("Configuration validation failed")?;

    if !args.input_path.is_file() {
        return Err(anyhow!("Input file does not exist: {:?}", args.input_path));
    }

    let controller = Controller::with_config(config)?;
    let report = controller.run(&args.input_path, options.resume).await?;

    if !report.result.errored_pages.is_empty() {
        warn!(
            "{} pages failed: {:?}",
            report.result.errored_pages.len(),
            report.result.errored_pages
        );
    }
    info!("Done: {} raw entries, {} refined", report.statistics.total_entries, report.refined_count);

    Ok(())
}

/// Load the configuration file, creating a default one if missing, and apply provider options
fn load_config(options: &ProviderOptions) -> Result<Config> {
    // If log level is set via command line, apply it immediately
    if let Some(cmd_log_level) = &options.log_level {
        log::set_max_level(level_filter(&cmd_log_level.clone().into()));
    }

    let config_path = &options.config_path;
    let mut config = if Path::new(config_path).exists() {
        // Load existing configuration
        let file = File::open(config_path)
            .context(format!("Failed to open config file: {}", config_path))?;

        let reader = BufReader::new(file);
        serde_json::from_reader(reader)
            .context(format!("Failed to parse config file: {}", config_path))?
    } else {
        // Create default configuration if not exists
        warn!("Config file not found at '{}', creating default config.", config_path);

        let config = Config::default();
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;

        std::fs::write(config_path, config_json)
            .context(format!("Failed to write default config to file: {}", config_path))?;

        config
    };

    if let Some(provider) = &options.provider {
        config.extraction.provider = provider.clone().into();
    }
    if let Some(model) = &options.model {
        config.extraction.active_provider_config_mut().model = model.clone();
    }
    if let Some(api_key) = &options.api_key {
        config.extraction.active_provider_config_mut().api_key = api_key.clone();
    }

    // Update log level in config if specified via command line
    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    } else {
        log::set_max_level(level_filter(&config.log_level));
    }

    Ok(config)
}
