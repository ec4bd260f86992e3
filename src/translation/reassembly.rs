/*!
 * Reassembly of translated spans into a single cell value.
 */

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::cleaner::clean_text;
use super::segments::{PreservedMarkerKind, Span, SpanKind};

/// Two or more whitespace characters
static WHITESPACE_RUN_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\s{2,}").unwrap()
});

/// An opening or closing tag together with the whitespace around it
static TAG_WITH_SPACING_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\s*)(</?\w+[^>]*>)(\s*)").unwrap()
});

/// Rebuild a cell from its spans and the translations of its units
///
/// `translations` holds one string per non-blank translatable span, in span
/// order. If it runs short, the remaining units are emitted as their cleaned
/// source text.
pub fn reassemble<S: AsRef<str>>(spans: &[Span], translations: &[S]) -> String {
    let mut result = String::new();
    let mut next = translations.iter();

    for span in spans {
        match span.kind {
            SpanKind::Translatable if span.is_unit() => {
                let translated: Cow<'_, str> = match next.next() {
                    Some(t) => Cow::Borrowed(t.as_ref()),
                    None => Cow::Owned(clean_text(&span.value)),
                };
                if span.value.starts_with(char::is_whitespace) {
                    result.push(' ');
                }
                result.push_str(translated.trim());
                if span.value.ends_with(char::is_whitespace) {
                    result.push(' ');
                }
            }
            SpanKind::Translatable => result.push_str(&span.value),
            SpanKind::Preserved => {
                if PreservedMarkerKind::of(&span.value).needs_padding() {
                    result.push(' ');
                    result.push_str(&span.value);
                    result.push(' ');
                } else {
                    result.push_str(&span.value);
                }
            }
        }
    }

    normalize_whitespace(&result)
}

/// Whitespace post-processing of a joined cell
///
/// Collapses whitespace runs, turns whitespace next to an HTML tag into
/// exactly one space on that side, then trims. Idempotent.
pub fn normalize_whitespace(text: &str) -> String {
    let collapsed = WHITESPACE_RUN_REGEX.replace_all(text, " ");
    let spaced = TAG_WITH_SPACING_REGEX.replace_all(&collapsed, |caps: &Captures<'_>| {
        let before = if caps[1].is_empty() { "" } else { " " };
        let after = if caps[3].is_empty() { "" } else { " " };
        format!("{}{}{}", before, &caps[2], after)
    });
    spaced.trim().to_string()
}
