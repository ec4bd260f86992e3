/*!
 * Cell text normalization.
 *
 * Spreadsheet cells arrive with stray bullets, leading dashes, doubled
 * punctuation and ragged whitespace. Everything that is sent to a backend,
 * and every cell that is passed through untranslated, goes through
 * [`clean_text`] first.
 */

use once_cell::sync::Lazy;
use regex::Regex;

/// Leading run of whitespace, periods, hyphens and bullets
static LEADING_NOISE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[\s.\-•–]+").unwrap()
});

/// Two or more bullet or en-dash characters
static BULLET_RUN_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[•–]{2,}").unwrap()
});

/// Two or more periods
static PERIOD_RUN_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\.{2,}").unwrap()
});

/// Two or more whitespace characters
static WHITESPACE_RUN_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\s{2,}").unwrap()
});

/// Normalize raw cell text
///
/// Rules, in order: trim, strip leading noise (whitespace, `.`, `-`, `•`,
/// `–`), collapse bullet runs to `-`, collapse period runs to `.`, collapse
/// whitespace runs to a single space. Never fails.
pub fn clean_text(text: &str) -> String {
    let text = text.trim();
    let text = LEADING_NOISE_REGEX.replace(text, "");
    let text = BULLET_RUN_REGEX.replace_all(&text, "-");
    let text = PERIOD_RUN_REGEX.replace_all(&text, ".");
    WHITESPACE_RUN_REGEX.replace_all(&text, " ").into_owned()
}
