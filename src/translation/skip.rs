/*!
 * Pass-through detection for literal cell values.
 *
 * Region codes and short uppercase abbreviations are emitted as-is instead
 * of being sent to a backend, which would happily "translate" `US` or `CH`.
 */

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;

/// Whole-string match for 2-3 uppercase ASCII letters
static ABBREVIATION_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Z]{2,3}$").unwrap()
});

/// Region codes passed through when no configuration overrides them
pub const DEFAULT_REGION_CODES: [&str; 9] = ["US", "UK", "CA", "DE", "FR", "IT", "JP", "CH", "IN"];

/// Why a cell is passed through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Case-insensitive member of the region-code set
    RegionCode,
    /// Entire value is 2-3 uppercase letters
    Abbreviation,
}

/// Decides whether a cleaned cell should bypass translation
#[derive(Debug, Clone)]
pub struct SkipClassifier {
    /// Uppercased region codes
    region_codes: BTreeSet<String>,
}

impl Default for SkipClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_REGION_CODES.iter().copied())
    }
}

impl SkipClassifier {
    /// Create a classifier for the given region codes
    pub fn new<I, S>(region_codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            region_codes: region_codes
                .into_iter()
                .map(|c| c.as_ref().trim().to_uppercase())
                .filter(|c| !c.is_empty())
                .collect(),
        }
    }

    /// Classify a cleaned value
    pub fn classify(&self, text: &str) -> Option<SkipReason> {
        if self.region_codes.contains(&text.to_uppercase()) {
            Some(SkipReason::RegionCode)
        } else if ABBREVIATION_REGEX.is_match(text) {
            Some(SkipReason::Abbreviation)
        } else {
            None
        }
    }

    /// Whether the value bypasses translation
    pub fn should_skip(&self, text: &str) -> bool {
        self.classify(text).is_some()
    }

    /// Output for a skipped value, or `None` if it is not skipped
    ///
    /// Region codes are emitted in their canonical uppercase form.
    pub fn passthrough(&self, text: &str) -> Option<String> {
        self.classify(text).map(|reason| match reason {
            SkipReason::RegionCode => text.to_uppercase(),
            SkipReason::Abbreviation => text.to_string(),
        })
    }

    /// Configured region codes, uppercased and sorted
    pub fn region_codes(&self) -> impl Iterator<Item = &str> {
        self.region_codes.iter().map(String::as_str)
    }
}
