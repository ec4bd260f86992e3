/*!
 * Multi-language batch processing.
 *
 * Rows are prepared once, then every selected language runs the pipeline
 * over the shared prepared rows. Languages run concurrently up to a bound;
 * each one owns its translator and output slot.
 */

use std::collections::BTreeMap;
use std::time::Instant;

use futures::stream::{self, StreamExt};
use log::{error, info, warn};

use crate::app_config::Config;
use crate::errors::TranslationError;
use super::core::{TranslationStats, Translator};
use super::pipeline::{CancellationFlag, LanguageRun, ProgressCallback, RowPipeline, RunContext};

/// Outputs of a multi-language run
#[derive(Debug, Clone, Default)]
pub struct TranslationResults {
    /// Per-language outputs in row order, keyed by language identifier
    pub outputs: BTreeMap<String, Vec<String>>,
    /// Languages rejected before any row was processed, with the reason
    pub failed_languages: BTreeMap<String, String>,
    /// Translator counters per language
    pub stats: BTreeMap<String, TranslationStats>,
    /// At least one language stopped early
    pub cancelled: bool,
}

impl TranslationResults {
    /// Output of one language
    pub fn language(&self, language: &str) -> Option<&[String]> {
        self.outputs.get(language).map(Vec::as_slice)
    }

    /// Whether every requested language produced output for every row
    pub fn is_complete(&self) -> bool {
        !self.cancelled && self.failed_languages.is_empty()
    }
}

/// Runs the row pipeline for several languages
pub struct BatchTranslator {
    /// Shared language-independent pipeline
    pipeline: RowPipeline,

    /// Maximum number of languages translated at the same time
    concurrent_languages: usize,

    /// Progress callback
    progress: Option<ProgressCallback>,

    /// Cancellation shared with the caller
    cancel: CancellationFlag,
}

impl BatchTranslator {
    /// Create a batch translator
    pub fn new(pipeline: RowPipeline, concurrent_languages: usize) -> Self {
        Self {
            pipeline,
            concurrent_languages: concurrent_languages.max(1),
            progress: None,
            cancel: CancellationFlag::new(),
        }
    }

    /// Batch translator using the configured pipeline and concurrency
    pub fn from_config(config: &Config) -> Self {
        Self::new(RowPipeline::from_config(config), config.translation.concurrent_languages)
    }

    /// Report progress through a callback
    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Use an external cancellation flag
    pub fn with_cancellation(mut self, cancel: CancellationFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancellation(&self) -> CancellationFlag {
        self.cancel.clone()
    }

    pub fn pipeline(&self) -> &RowPipeline {
        &self.pipeline
    }

    /// Translate rows into every language that has a translator
    ///
    /// `translators` holds the resolution result per language in selection
    /// order. A language whose translator could not be built is reported in
    /// `failed_languages` and the others still run.
    pub async fn translate_rows<S: AsRef<str>>(
        &self,
        rows: &[S],
        translators: Vec<(String, Result<Translator, TranslationError>)>,
    ) -> TranslationResults {
        let start_time = Instant::now();
        let prepared = self.pipeline.prepare_rows(rows);
        let language_count = translators.len();
        let mut results = TranslationResults::default();

        let mut jobs = Vec::new();
        for (language_index, (language, translator)) in translators.into_iter().enumerate() {
            match translator {
                Ok(translator) => jobs.push((language_index, language, translator)),
                Err(e) => {
                    error!("Skipping {}: {}", language, e);
                    results.failed_languages.insert(language, e.to_string());
                }
            }
        }

        let runs: Vec<LanguageRun> = stream::iter(jobs)
            .map(|(language_index, language, translator)| {
                let context = RunContext {
                    language_index,
                    language_count,
                    progress: self.progress.clone(),
                    cancel: self.cancel.clone(),
                };
                let prepared = &prepared;
                let pipeline = &self.pipeline;

                async move {
                    info!("Translating {} rows to {}", prepared.len(), language);
                    let run = pipeline.run_language(prepared, &language, &translator, &context).await;
                    info!("{}: {}", language, run.stats.summary());
                    if let Some(hit_rate) = translator.cache_hit_rate() {
                        info!("{}: cache hit rate {:.1}%", language, hit_rate * 100.0);
                    }
                    run
                }
            })
            .buffer_unordered(self.concurrent_languages)
            .collect()
            .await;

        for run in runs {
            if run.cancelled {
                warn!("{} stopped after {} of {} rows", run.language, run.outputs.len(), prepared.len());
                results.cancelled = true;
            }
            results.stats.insert(run.language.clone(), run.stats);
            results.outputs.insert(run.language, run.outputs);
        }

        info!(
            "Translated {} rows into {} languages in {:.1}s",
            prepared.len(),
            results.outputs.len(),
            start_time.elapsed().as_secs_f64()
        );

        results
    }

    /// Resolve translators from configuration, then translate
    pub async fn translate_with_config<S: AsRef<str>>(
        &self,
        rows: &[S],
        languages: &[String],
        config: &Config,
    ) -> TranslationResults {
        let translators = languages
            .iter()
            .map(|language| (language.clone(), Translator::from_config(config, language)))
            .collect();
        self.translate_rows(rows, translators).await
    }
}
