// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Result, anyhow, Context};
use log::{error, warn, info, LevelFilter, Log, Metadata, Record, Level, SetLoggerError};
use std::path::{Path, PathBuf};
use std::io::Write;
use clap::{Args, Parser, ValueEnum, CommandFactory, Subcommand};
use clap_complete::{generate, Shell};

use sheetlate::app_config::{self, Config, LanguageModel, TranslationBackend};
use sheetlate::app_controller::{self, Controller};
use sheetlate::language_utils;

/// CLI Wrapper for TranslationBackend to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliBackend {
    Local,
    Remote,
}

impl From<CliBackend> for TranslationBackend {
    fn from(cli_backend: CliBackend) -> Self {
        match cli_backend {
            CliBackend::Local => TranslationBackend::Local,
            CliBackend::Remote => TranslationBackend::Remote,
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
    /// Translate the source column of a sheet export (default command)
    Translate(TranslateArgs),

    /// List the configured target languages and their models
    Languages {
        /// Configuration file path
        #[arg(short, long, default_value = "conf.json")]
        config_path: String,
    },

    /// Test the backend connection of every selected language
    Check(TranslateArgs),

    /// Generate shell completions for sheetlate
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Debug)]
struct TranslateArgs {
    /// Delimited text export of the sheet (tab-separated by default)
    #[arg(value_name = "INPUT_FILE")]
    input_file: Option<PathBuf>,

    /// Target languages, as codes ('de') or identifiers ('German (de)')
    #[arg(short = 'l', long = "language", value_name = "LANG", num_args = 1..)]
    languages: Vec<String>,

    /// Translation backend to use
    #[arg(short, long, value_enum)]
    backend: Option<CliBackend>,

    /// Model identifier, applied to every selected language
    #[arg(short, long)]
    model: Option<String>,

    /// Backend endpoint URL
    #[arg(long)]
    endpoint: Option<String>,

    /// API key for the remote backend
    #[arg(long, env = "SHEETLATE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Zero-based index of the source column
    #[arg(long)]
    column: Option<usize>,

    /// The first line is data, not a header
    #[arg(long)]
    no_header: bool,

    /// Output file (default: <stem>_Translated_<date>.<ext> next to the input)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Rows sent to the backend in one call
    #[arg(long)]
    rows_per_request: Option<usize>,

    /// Languages translated at the same time
    #[arg(long)]
    concurrency: Option<usize>,

    /// Set logging level
    #[arg(long, value_enum)]
    log_level: Option<CliLogLevel>,

    /// Use an in-process mock backend; nothing is sent over the network
    #[arg(long)]
    dry_run: bool,
}

/// Sheetlate - markup-preserving spreadsheet translation
///
/// Translates the English source column of a sheet export into several
/// languages while keeping tags, placeholders and pipe directives intact.
#[derive(Parser, Debug)]
#[command(name = "sheetlate")]
#[command(version)]
#[command(about = "Markup-preserving spreadsheet translation")]
#[command(args_conflicts_with_subcommands = true)]
#[command(long_about = "Sheetlate translates the source column of a delimited sheet export into one or more
languages and appends one column per language.

EXAMPLES:
    sheetlate strings.tsv -l de fr                 # Translate into German and French
    sheetlate strings.tsv -l ja --column 1         # Source text in the second column
    sheetlate strings.tsv -l de -b remote          # Use the remote inference API
    sheetlate strings.tsv -l de --dry-run          # Check the pipeline without a backend
    sheetlate languages                            # List configured languages
    sheetlate check -l de fr                       # Test backend connections
    sheetlate completions bash > sheetlate.bash    # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically.

BACKENDS:
    local  - Local inference server (default: http://localhost:8080), batched requests
    remote - Hosted inference API (requires API key, SHEETLATE_API_KEY)")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    translate: TranslateArgs,
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
        metadata.level() <= self.level && metadata.level() <= log::max_level()
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

#[tokio::main]
async fn main() -> Result<()> {
    // Install the logger at the most verbose level; the effective level is
    // set through log::set_max_level once the config is known
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "sheetlate", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Languages { config_path }) => list_languages(&config_path),
        Some(Commands::Check(args)) => run_check(args).await,
        Some(Commands::Translate(args)) => run_translate(args).await,
        None => run_translate(cli.translate).await,
    }
}

fn list_languages(config_path: &str) -> Result<()> {
    let config = load_or_create_config(config_path)?;
    let mut stdout = std::io::stdout();
    for (id, model) in app_controller::configured_languages(&config) {
        writeln!(stdout, "{:<24} {}", id, model)?;
    }
    Ok(())
}

// @loads: Config from file, writing the defaults first if it does not exist
fn load_or_create_config(config_path: &str) -> Result<Config> {
    if Path::new(config_path).exists() {
        return Config::from_file(Path::new(config_path));
    }

    warn!("Config file not found at '{}', creating default config.", config_path);
    let config = Config::default();

    let config_json = serde_json::to_string_pretty(&config)
        .context("Failed to serialize default config to JSON")?;
    std::fs::write(config_path, config_json)
        .context(format!("Failed to write default config to file: {}", config_path))?;

    Ok(config)
}

/// Map a CLI language argument to the configured identifier
///
/// `de` and `German (de)` both select the configured `German (de)` entry.
/// Unconfigured languages keep a display identifier built from the code so
/// the translator reports the missing model for that language alone.
fn resolve_language_id(config: &Config, requested: &str) -> String {
    let code = language_utils::language_code(requested);
    if let Some(language) = config.languages.iter().find(|l| language_utils::language_code(&l.id) == code) {
        return language.id.clone();
    }
    if requested.contains('(') {
        return requested.trim().to_string();
    }
    language_utils::display_id(&code).unwrap_or_else(|_| requested.trim().to_string())
}

// @applies: CLI overrides on top of the loaded config
fn apply_overrides(config: &mut Config, options: &TranslateArgs) -> Result<()> {
    if let Some(backend) = &options.backend {
        config.translation.backend = backend.clone().into();
    }

    if let Some(endpoint) = &options.endpoint {
        config.translation.active_backend_config_mut().endpoint = endpoint.clone();
    }

    if let Some(api_key) = &options.api_key {
        if config.translation.backend == TranslationBackend::Remote {
            config.translation.active_backend_config_mut().api_key = api_key.clone();
        }
    }

    if !options.languages.is_empty() {
        config.target_languages = options
            .languages
            .iter()
            .map(|l| resolve_language_id(config, l))
            .collect();
    }

    if let Some(model) = &options.model {
        for language in config.target_languages.clone() {
            match config.languages.iter_mut().find(|l| l.id == language) {
                Some(entry) => entry.model = model.clone(),
                None => config.languages.push(LanguageModel::new(language, model.clone())),
            }
        }
    }

    if let Some(column) = options.column {
        config.input.source_column = column;
    }
    if options.no_header {
        config.input.has_header = false;
    }
    if let Some(rows) = options.rows_per_request {
        config.translation.rows_per_request = rows;
    }
    if let Some(concurrency) = options.concurrency {
        config.translation.concurrent_languages = concurrency;
    }
    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }

    if config.target_languages.is_empty() {
        return Err(anyhow!("No target language selected (use -l, or set target_languages in the config)"));
    }

    Ok(())
}

async fn run_check(options: TranslateArgs) -> Result<()> {
    let mut config = load_or_create_config(&options.config_path)?;
    apply_overrides(&mut config, &options)?;
    config.validate()
        .context("Configuration validation failed")?;

    let controller = Controller::with_config(config)?.with_dry_run(options.dry_run);
    let mut failed = 0;
    for (language, result) in controller.check_backends().await {
        match result {
            Ok(()) => info!("{}: backend reachable", language),
            Err(e) => {
                error!("{}: {}", language, e);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        return Err(anyhow!("{} language(s) failed the connection check", failed));
    }
    Ok(())
}

async fn run_translate(options: TranslateArgs) -> Result<()> {
    // If log level is set via command line, apply it immediately
    if let Some(cmd_log_level) = &options.log_level {
        let config_log_level: app_config::LogLevel = cmd_log_level.clone().into();
        log::set_max_level(config_log_level.to_level_filter());
    }

    let input_file = options
        .input_file
        .clone()
        .ok_or_else(|| anyhow!("INPUT_FILE is required when no subcommand is specified"))?;

    let mut config = load_or_create_config(&options.config_path)?;
    apply_overrides(&mut config, &options)?;

    // Validate the configuration after loading and overriding
    config.validate()
        .context("Configuration validation failed")?;

    log::set_max_level(config.log_level.to_level_filter());

    if !app_controller::is_supported_input(&input_file) {
        warn!("Unexpected input extension, reading {:?} as delimited text", input_file);
    }

    let controller = Controller::with_config(config)?.with_dry_run(options.dry_run);
    let summary = controller.run(input_file, options.output.clone()).await?;

    if !summary.failed_languages.is_empty() {
        error!("Failed languages: {}", summary.failed_languages.join(", "));
    }
    info!("{} rows translated into {}", summary.rows, summary.translated_languages.join(", "));

    if summary.cancelled {
        return Err(anyhow!("Translation was cancelled; {} contains partial results", summary.output_path.display()));
    }

    Ok(())
}
