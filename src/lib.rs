/*!
 * # Sheetlate - markup-preserving spreadsheet translation
 *
 * A Rust library for translating English spreadsheet cells into several
 * target languages with seq2seq translation models.
 *
 * ## Features
 *
 * - HTML-like tags, `${...}` placeholders and `[pipe:...]` directives never
 *   reach the model and come back exactly where they were
 * - Region codes and short abbreviations pass through untranslated
 * - Fixed per-language answers for tokens such as "yes" and "no"
 * - Two backends:
 *   - a local inference server, one batched request per call
 *   - a remote inference API, one request per string
 * - Explicit fallback policy when a backend call fails
 * - Several languages translated concurrently from shared prepared rows
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `translation`: The translation core:
 *   - `translation::cleaner`: Cell text normalization
 *   - `translation::skip`: Pass-through detection
 *   - `translation::lexicon`: Per-language fixed answers
 *   - `translation::segments`: Markup-aware splitting
 *   - `translation::core`: Translator and fallback policy
 *   - `translation::reassembly`: Rebuilding translated cells
 *   - `translation::pipeline`: Per-row pipeline with progress and cancellation
 *   - `translation::batch`: Multi-language runs
 *   - `translation::cache`: Unit translation cache
 * - `file_utils`: Delimited file reading and writing
 * - `app_controller`: Main application controller
 * - `language_utils`: ISO language code utilities
 * - `providers`: Backend clients:
 *   - `providers::local`: Local inference server
 *   - `providers::inference_api`: Remote inference API
 *   - `providers::mock`: In-process backend for tests and dry runs
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod file_utils;
pub mod translation;
pub mod app_controller;
pub mod language_utils;
pub mod providers;
pub mod errors;

// Re-export main types for easier usage
pub use app_config::Config;
pub use translation::{BatchTranslator, FallbackPolicy, RowPipeline, TranslationResults, Translator};
pub use language_utils::{language_codes_match, normalize_to_part2t, get_language_name};
pub use errors::{AppError, ProviderError, TranslationError};
