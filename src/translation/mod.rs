/*!
 * Markup-preserving cell translation.
 *
 * This module contains the translation core. It is split into several submodules:
 *
 * - `cleaner`: Normalization of raw cell text
 * - `skip`: Pass-through detection for region codes and abbreviations
 * - `lexicon`: Fixed per-language answers for short tokens
 * - `segments`: Splitting text into preserved and translatable spans
 * - `core`: Translator with its fallback policy
 * - `reassembly`: Rebuilding a cell from translated spans
 * - `pipeline`: The per-cell pipeline over prepared rows
 * - `batch`: Running the pipeline for several languages
 * - `cache`: Caching of unit translations
 */

// Re-export main types for easier usage
pub use self::batch::{BatchTranslator, TranslationResults};
pub use self::core::{FallbackPolicy, Translator};
pub use self::pipeline::{CancellationFlag, PreparedRow, ProgressEvent, RowPipeline};

// Submodules
pub mod batch;
pub mod cache;
pub mod cleaner;
pub mod core;
pub mod lexicon;
pub mod pipeline;
pub mod reassembly;
pub mod segments;
pub mod skip;
