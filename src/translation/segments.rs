/*!
 * Markup-aware segmentation of cell text.
 *
 * A cell is cut into an ordered list of [`Span`]s: markup that must reach
 * the output untouched (HTML-like tags, `${...}` placeholders and
 * `[pipe:...]` directives) and the translatable text between them.
 * Concatenating the span values in order gives back the input exactly.
 *
 * Nothing here parses markup. An unterminated `<`, `${` or `[pipe:` is
 * ordinary text.
 */

use once_cell::sync::Lazy;
use regex::Regex;

use super::cleaner::clean_text;

/// Tags, placeholders and pipe directives, each non-greedy up to its closer
static PRESERVED_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<[^>]+>|\$\{[^}]+\}|\[pipe:[^\]]+\]").unwrap()
});

/// Whether a span goes to the backend or is copied through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanKind {
    Translatable,
    Preserved,
}

/// Markup category of a preserved span
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreservedMarkerKind {
    /// `<b>`, `</b>`, `<a href="...">`
    HtmlTag,
    /// `${name}`
    Placeholder,
    /// `[pipe:upper]`
    PipeDirective,
}

impl PreservedMarkerKind {
    /// Classify a preserved value by its opening delimiter
    pub fn of(value: &str) -> Self {
        if value.starts_with("${") {
            Self::Placeholder
        } else if value.starts_with("[pipe:") {
            Self::PipeDirective
        } else {
            Self::HtmlTag
        }
    }

    /// Placeholders and pipe directives get a space on each side when reassembled
    pub fn needs_padding(self) -> bool {
        matches!(self, Self::Placeholder | Self::PipeDirective)
    }
}

/// A contiguous piece of the source text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub kind: SpanKind,
    pub value: String,
}

impl Span {
    pub fn translatable(value: impl Into<String>) -> Self {
        Self { kind: SpanKind::Translatable, value: value.into() }
    }

    pub fn preserved(value: impl Into<String>) -> Self {
        Self { kind: SpanKind::Preserved, value: value.into() }
    }

    /// Marker category, `None` for translatable spans
    pub fn marker_kind(&self) -> Option<PreservedMarkerKind> {
        match self.kind {
            SpanKind::Preserved => Some(PreservedMarkerKind::of(&self.value)),
            SpanKind::Translatable => None,
        }
    }

    /// Translatable with something other than whitespace in it
    pub fn is_unit(&self) -> bool {
        self.kind == SpanKind::Translatable && !self.value.trim().is_empty()
    }
}

/// Cleaned text of one translatable span, queued for a backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationUnit {
    /// Index of the originating span
    pub span_index: usize,
    /// Cleaned span text
    pub text: String,
}

/// Split text into preserved and translatable spans
///
/// Empty pieces between adjacent matches are dropped.
pub fn split_segments(text: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut last_end = 0;

    for m in PRESERVED_REGEX.find_iter(text) {
        if m.start() > last_end {
            spans.push(Span::translatable(&text[last_end..m.start()]));
        }
        spans.push(Span::preserved(m.as_str()));
        last_end = m.end();
    }

    if last_end < text.len() {
        spans.push(Span::translatable(&text[last_end..]));
    }

    spans
}

/// Units for every non-blank translatable span, in span order
pub fn collect_units(spans: &[Span]) -> Vec<TranslationUnit> {
    spans
        .iter()
        .enumerate()
        .filter(|(_, span)| span.is_unit())
        .map(|(span_index, span)| TranslationUnit {
            span_index,
            text: clean_text(&span.value),
        })
        .collect()
}

/// Concatenate span values back into the source text
pub fn join_spans(spans: &[Span]) -> String {
    spans.iter().map(|s| s.value.as_str()).collect()
}
