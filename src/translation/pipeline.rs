/*!
 * Per-cell translation pipeline.
 *
 * Every cell goes through the same steps for each target language:
 *
 * 1. clean the raw value
 * 2. pass skipped literals through (region codes, abbreviations)
 * 3. answer lexicon tokens directly
 * 4. split into spans, translate the units, reassemble
 *
 * Steps 1, 2 and the split do not depend on the language, so they run once
 * per row ([`PreparedRow`]) and the result is shared by every language.
 */

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, info};

use crate::app_config::Config;
use super::cleaner::clean_text;
use super::core::{TranslationStats, Translator};
use super::lexicon::ExactMatchLexicon;
use super::reassembly::reassemble;
use super::segments::{Span, TranslationUnit, collect_units, split_segments};
use super::skip::SkipClassifier;

/// Progress of one language run, reported after each row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressEvent {
    /// Zero-based position of the language among the selected ones
    pub language_index: usize,
    /// Number of selected languages
    pub language_count: usize,
    /// Rows of this language completed so far
    pub row_index: usize,
    /// Rows per language
    pub total_rows: usize,
}

impl ProgressEvent {
    /// Overall completion across all languages, 0 to 100
    pub fn percent(&self) -> f64 {
        if self.language_count == 0 {
            return 100.0;
        }
        let row_fraction = if self.total_rows == 0 {
            1.0
        } else {
            self.row_index as f64 / self.total_rows as f64
        };
        let percent = (self.language_index as f64 + row_fraction) / self.language_count as f64 * 100.0;
        percent.min(100.0)
    }
}

/// Callback receiving progress events
pub type ProgressCallback = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// Cooperative cancellation shared between the caller and running languages
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; running languages stop before their next row group
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Language-independent preparation of one source cell
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRow {
    /// Cleaned cell value
    cleaned: String,
    /// What to do with it
    plan: RowPlan,
}

/// Outcome of preparation
#[derive(Debug, Clone, PartialEq)]
pub enum RowPlan {
    /// Emit this value for every language
    Passthrough(String),
    /// Split result, translated per language unless the lexicon answers
    Segmented {
        spans: Vec<Span>,
        units: Vec<TranslationUnit>,
    },
}

impl PreparedRow {
    pub fn cleaned(&self) -> &str {
        &self.cleaned
    }

    pub fn plan(&self) -> &RowPlan {
        &self.plan
    }

    /// Number of units this row sends to a backend when the lexicon misses
    pub fn unit_count(&self) -> usize {
        match &self.plan {
            RowPlan::Passthrough(_) => 0,
            RowPlan::Segmented { units, .. } => units.len(),
        }
    }
}

/// Where a language run sits among all selected languages
#[derive(Clone)]
pub struct RunContext {
    pub language_index: usize,
    pub language_count: usize,
    pub progress: Option<ProgressCallback>,
    pub cancel: CancellationFlag,
}

impl RunContext {
    /// Context for a single language with no progress reporting
    pub fn single() -> Self {
        Self {
            language_index: 0,
            language_count: 1,
            progress: None,
            cancel: CancellationFlag::new(),
        }
    }

    fn report(&self, row_index: usize, total_rows: usize) {
        if let Some(progress) = &self.progress {
            progress(ProgressEvent {
                language_index: self.language_index,
                language_count: self.language_count,
                row_index,
                total_rows,
            });
        }
    }
}

/// Outputs of one language over all rows
#[derive(Debug, Clone)]
pub struct LanguageRun {
    /// Target language identifier
    pub language: String,
    /// One output per completed row, in row order
    pub outputs: Vec<String>,
    /// Stopped early because of cancellation
    pub cancelled: bool,
    /// Translator counters for this run
    pub stats: TranslationStats,
}

/// Row whose units are waiting for the current group's translator call
struct PendingRow<'a> {
    position: usize,
    spans: &'a [Span],
    first_unit: usize,
    unit_count: usize,
}

/// Clean, skip, lexicon, split, translate, reassemble
#[derive(Debug, Clone)]
pub struct RowPipeline {
    skip: SkipClassifier,
    lexicon: ExactMatchLexicon,
    rows_per_request: usize,
}

impl Default for RowPipeline {
    fn default() -> Self {
        Self::new(SkipClassifier::default(), ExactMatchLexicon::with_defaults())
    }
}

impl RowPipeline {
    pub fn new(skip: SkipClassifier, lexicon: ExactMatchLexicon) -> Self {
        Self { skip, lexicon, rows_per_request: 1 }
    }

    /// Rows whose units share one translator call
    pub fn with_rows_per_request(mut self, rows_per_request: usize) -> Self {
        self.rows_per_request = rows_per_request.max(1);
        self
    }

    /// Pipeline using the configured region codes, lexicon and grouping
    pub fn from_config(config: &Config) -> Self {
        let skip = SkipClassifier::new(&config.skip.region_codes);
        let mut lexicon = if config.lexicon.use_defaults {
            ExactMatchLexicon::with_defaults()
        } else {
            ExactMatchLexicon::empty()
        };
        lexicon.extend(&config.lexicon.entries);

        Self::new(skip, lexicon).with_rows_per_request(config.translation.rows_per_request)
    }

    pub fn rows_per_request(&self) -> usize {
        self.rows_per_request
    }

    pub fn lexicon(&self) -> &ExactMatchLexicon {
        &self.lexicon
    }

    /// Run the language-independent steps for one raw cell
    pub fn prepare(&self, raw: &str) -> PreparedRow {
        let cleaned = clean_text(raw);

        let plan = match self.skip.passthrough(&cleaned) {
            Some(value) => RowPlan::Passthrough(value),
            None => {
                let spans = split_segments(&cleaned);
                let units = collect_units(&spans);
                RowPlan::Segmented { spans, units }
            }
        };

        PreparedRow { cleaned, plan }
    }

    /// Prepare every row
    pub fn prepare_rows<S: AsRef<str>>(&self, rows: &[S]) -> Vec<PreparedRow> {
        rows.iter().map(|r| self.prepare(r.as_ref())).collect()
    }

    /// Output of a prepared row that needs no backend call for this language
    fn resolve_without_backend(&self, row: &PreparedRow, language: &str) -> Option<String> {
        match &row.plan {
            RowPlan::Passthrough(value) => Some(value.clone()),
            RowPlan::Segmented { units, .. } => {
                if let Some(fixed) = self.lexicon.lookup(language, &row.cleaned) {
                    Some(fixed.to_string())
                } else if units.is_empty() {
                    Some(row.cleaned.clone())
                } else {
                    None
                }
            }
        }
    }

    /// Translate a single raw cell into one language
    pub async fn translate_cell(&self, raw: &str, language: &str, translator: &Translator) -> String {
        let row = self.prepare(raw);
        let run = self
            .run_language(std::slice::from_ref(&row), language, translator, &RunContext::single())
            .await;
        run.outputs.into_iter().next().unwrap_or_default()
    }

    /// Translate prepared rows into one language
    ///
    /// Rows are processed in groups of `rows_per_request`. The units of a
    /// group go to the translator in a single call and are scattered back to
    /// their rows by position. Cancellation is checked before each group.
    pub async fn run_language(
        &self,
        rows: &[PreparedRow],
        language: &str,
        translator: &Translator,
        context: &RunContext,
    ) -> LanguageRun {
        let total_rows = rows.len();
        let mut outputs: Vec<String> = Vec::with_capacity(total_rows);
        let mut cancelled = false;

        for (group_index, group) in rows.chunks(self.rows_per_request).enumerate() {
            if context.cancel.is_cancelled() {
                info!("Translation to {} cancelled after {} of {} rows", language, outputs.len(), total_rows);
                cancelled = true;
                break;
            }

            let group_start = group_index * self.rows_per_request;
            let mut group_outputs: Vec<Option<String>> = Vec::with_capacity(group.len());
            let mut pending: Vec<PendingRow<'_>> = Vec::new();
            let mut units: Vec<String> = Vec::new();

            for (position, row) in group.iter().enumerate() {
                match self.resolve_without_backend(row, language) {
                    Some(value) => group_outputs.push(Some(value)),
                    None => {
                        if let RowPlan::Segmented { spans, units: row_units } = &row.plan {
                            pending.push(PendingRow {
                                position,
                                spans: spans.as_slice(),
                                first_unit: units.len(),
                                unit_count: row_units.len(),
                            });
                            units.extend(row_units.iter().map(|u| u.text.clone()));
                        }
                        group_outputs.push(None);
                    }
                }
            }

            if !units.is_empty() {
                debug!("{}: rows {}-{}, {} units", language, group_start + 1, group_start + group.len(), units.len());
                let translations = translator.translate(&units).await;
                for row in pending {
                    let slice = &translations[row.first_unit..row.first_unit + row.unit_count];
                    group_outputs[row.position] = Some(reassemble(row.spans, slice));
                }
            }

            for (position, output) in group_outputs.into_iter().enumerate() {
                outputs.push(output.unwrap_or_else(|| group[position].cleaned.clone()));
                context.report(outputs.len(), total_rows);
            }
        }

        LanguageRun {
            language: language.to_string(),
            outputs,
            cancelled,
            stats: translator.stats(),
        }
    }
}
