use anyhow::{Result, anyhow};
use futures::stream::{self, Stream, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, warn, info, debug};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::app_config::Config;
use crate::errors::{AppError, TranslationError};
use crate::file_utils::FileManager;
use crate::language_utils;
use crate::providers::mock::MockProvider;
use crate::translation::{BatchTranslator, CancellationFlag, ProgressEvent, TranslationResults, Translator};
use crate::translation::pipeline::ProgressCallback;

// @module: Application controller for sheet translation

/// What a finished run produced
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Written output file
    pub output_path: PathBuf,
    /// Data rows read from the input
    pub rows: usize,
    /// Languages with an output column
    pub translated_languages: Vec<String>,
    /// Languages rejected by configuration errors
    pub failed_languages: Vec<String>,
    /// Stopped before all rows were translated
    pub cancelled: bool,
}

/// Main application controller for sheet translation
pub struct Controller {
    // @field: App configuration
    config: Config,

    // @field: Use the in-process mock backend instead of real requests
    dry_run: bool,

    // @field: Cancellation shared with the running batch
    cancel: CancellationFlag,
}

impl Controller {
    /// Create a new controller for test purposes with default configuration
    pub fn new_for_test() -> Result<Self> {
        Self::with_config(Config::default())
    }

    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        Ok(Self {
            config,
            dry_run: false,
            cancel: CancellationFlag::new(),
        })
    }

    /// Translate with the mock backend; no request leaves the process
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Flag that stops the current run between row groups
    pub fn cancellation(&self) -> CancellationFlag {
        self.cancel.clone()
    }

    /// Check if the controller has something to translate into
    pub fn is_initialized(&self) -> bool {
        !self.config.source_language.is_empty() && !self.config.target_languages.is_empty()
    }

    /// Resolve a translator per selected language, in selection order
    pub fn build_translators(&self) -> Vec<(String, Result<Translator, TranslationError>)> {
        self.config
            .target_languages
            .iter()
            .map(|language| {
                let translator = if self.dry_run {
                    Self::dry_run_translator(&self.config, language)
                } else {
                    Translator::from_config(&self.config, language)
                };
                (language.clone(), translator)
            })
            .collect()
    }

    fn dry_run_translator(config: &Config, language: &str) -> Result<Translator, TranslationError> {
        language_utils::normalize_to_part2t(language)
            .map_err(|e| TranslationError::configuration(language, e.to_string()))?;
        let label = language_utils::language_code(language);
        let provider = MockProvider::working().with_label(label);
        Ok(Translator::new(Arc::new(provider), config.translation.get_fallback_policy()).for_language(language))
    }

    /// Translate source cells into every selected language
    pub async fn translate_rows(&self, rows: &[String], progress: Option<ProgressCallback>) -> TranslationResults {
        let mut batch = BatchTranslator::from_config(&self.config).with_cancellation(self.cancel.clone());
        if let Some(progress) = progress {
            batch = batch.with_progress(progress);
        }
        batch.translate_rows(rows, self.build_translators()).await
    }

    /// Run the workflow for one input file
    ///
    /// The output goes to `output_path`, or next to the input when `None`.
    pub async fn run(&self, input_file: PathBuf, output_path: Option<PathBuf>) -> Result<RunSummary> {
        let start_time = std::time::Instant::now();

        if !self.is_initialized() {
            return Err(anyhow!("No target languages selected"));
        }
        if !FileManager::file_exists(&input_file) {
            return Err(anyhow!("Input file does not exist: {:?}", input_file));
        }

        let input = &self.config.input;
        let mut table = FileManager::read_table(&input_file, input.delimiter, input.has_header)?;
        if table.width() <= input.source_column {
            return Err(anyhow!(
                "Input must have at least {} columns to read the source column, found {}",
                input.source_column + 1,
                table.width()
            ));
        }
        let rows = table.column(input.source_column);

        info!("Sheetlate: {} - {} rows, {} languages",
            self.config.translation.backend.display_name(),
            rows.len(),
            self.config.target_languages.len());
        debug!("Source column {}, languages: {}", input.source_column, self.config.target_languages.join(", "));

        let progress_bar = Self::create_progress_bar();
        let pb = progress_bar.clone();
        let progress: ProgressCallback = Arc::new(move |event: ProgressEvent| {
            pb.set_position(event.percent().round() as u64);
            pb.set_message(format!("language {}/{}", event.language_index + 1, event.language_count));
        });

        // Ctrl+C stays captured until the output is written
        let interrupt = self.spawn_interrupt_handler();
        let results = self.translate_rows(&rows, Some(progress)).await;
        progress_bar.finish_and_clear();

        for (language, reason) in &results.failed_languages {
            error!("{} was not translated: {}", language, reason);
        }

        let mut translated_languages = Vec::new();
        for language in &self.config.target_languages {
            if let Some(outputs) = results.outputs.get(language) {
                table.append_column(language, outputs);
                translated_languages.push(language.clone());
            }
        }

        if translated_languages.is_empty() {
            interrupt.abort();
            return Err(anyhow!("No language could be translated"));
        }
        if results.cancelled {
            warn!("Translation cancelled, writing the rows completed so far");
        }

        let output_path = output_path.unwrap_or_else(|| FileManager::generate_output_path(&input_file));
        let written = FileManager::write_table(&output_path, &table, input.delimiter);
        interrupt.abort();
        written?;

        info!("Success: {} ({})", output_path.display(), Self::format_duration(start_time.elapsed()));

        Ok(RunSummary {
            output_path,
            rows: rows.len(),
            translated_languages,
            failed_languages: results.failed_languages.keys().cloned().collect(),
            cancelled: results.cancelled,
        })
    }

    /// Test connectivity of every selected language's backend
    pub async fn check_backends(&self) -> Vec<(String, Result<(), AppError>)> {
        let mut checks = Vec::new();
        for (language, translator) in self.build_translators() {
            let result = match translator {
                Ok(translator) => translator.test_connection().await.map_err(AppError::from),
                Err(e) => Err(AppError::from(e)),
            };
            checks.push((language, result));
        }
        checks
    }

    fn create_progress_bar() -> ProgressBar {
        let progress_bar = ProgressBar::new(100);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}% {msg} {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}% {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(style.progress_chars("█▓▒░"));
        progress_bar
    }

    /// Cancel the run on Ctrl+C
    fn spawn_interrupt_handler(&self) -> tokio::task::JoinHandle<()> {
        let cancel = self.cancel.clone();
        let signals = stream::unfold((), |()| async {
            tokio::signal::ctrl_c().await.ok().map(|_| ((), ()))
        });
        tokio::spawn(Self::watch_interrupts(cancel, Box::pin(signals)))
    }

    /// First interrupt cancels between row groups, a second one exits
    async fn watch_interrupts<S>(cancel: CancellationFlag, mut signals: S)
    where
        S: Stream<Item = ()> + Unpin,
    {
        if signals.next().await.is_some() {
            warn!("Interrupt received, finishing the current rows...");
            cancel.cancel();
        }
        if signals.next().await.is_some() {
            warn!("Second interrupt received, exiting");
            std::process::exit(130);
        }
    }

    // Format duration in a human-readable format (HH:MM:SS)
    fn format_duration(duration: std::time::Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}

/// Configured languages as `(id, model)` pairs, for listing
pub fn configured_languages(config: &Config) -> Vec<(String, String)> {
    config
        .languages
        .iter()
        .map(|l| (l.id.clone(), l.model.clone()))
        .collect()
}

/// Whether a path looks like something the controller can read
pub fn is_supported_input(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()).map(str::to_lowercase).as_deref(),
        Some("tsv" | "txt" | "csv" | "tab")
    )
}
