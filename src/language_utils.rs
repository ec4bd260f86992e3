use anyhow::{Result, anyhow};
use isolang::Language;
use once_cell::sync::Lazy;
use regex::Regex;

/// Language utilities for target language identifiers
///
/// Target languages are selected by display identifiers such as
/// `"German (de)"`. The ISO code inside the parentheses is what the rest
/// of the crate keys on; a bare code (`"de"`) is accepted as well.
static LANGUAGE_ID_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:(.*?)\s*)?\(([A-Za-z]{2,3}(?:-[A-Za-z]{2,4})?)\)\s*$").unwrap()
});

/// ISO 639-2/B codes that differ from their ISO 639-2/T counterpart
fn part2b_to_part2t(code: &str) -> Option<&'static str> {
    match code {
        "fre" => Some("fra"),
        "ger" => Some("deu"),
        "dut" => Some("nld"),
        "gre" => Some("ell"),
        "chi" => Some("zho"),
        "cze" => Some("ces"),
        "ice" => Some("isl"),
        "alb" => Some("sqi"),
        "arm" => Some("hye"),
        "baq" => Some("eus"),
        "bur" => Some("mya"),
        "per" => Some("fas"),
        "geo" => Some("kat"),
        "may" => Some("msa"),
        "mac" => Some("mkd"),
        "rum" => Some("ron"),
        "slo" => Some("slk"),
        "wel" => Some("cym"),
        _ => None,
    }
}

/// Extract the language code from a display identifier
///
/// `"German (de)"` yields `"de"`, `"Chinese (zh-TW)"` yields `"zh-tw"` and a
/// bare `"fr"` yields `"fr"`. The result is lowercased but not validated.
pub fn language_code(language_id: &str) -> String {
    if let Some(caps) = LANGUAGE_ID_REGEX.captures(language_id) {
        return caps[2].to_lowercase();
    }
    language_id.trim().to_lowercase()
}

/// Primary subtag of a code (`zh-tw` -> `zh`)
fn primary_subtag(code: &str) -> &str {
    code.split('-').next().unwrap_or(code)
}

/// Normalize a language code to ISO 639-2/T (3-letter) format
pub fn normalize_to_part2t(code: &str) -> Result<String> {
    let normalized_code = language_code(code);
    let primary = primary_subtag(&normalized_code);

    if primary.len() == 2 {
        if let Some(lang) = Language::from_639_1(primary) {
            return Ok(lang.to_639_3().to_string());
        }
    } else if primary.len() == 3 {
        if let Some(part2t) = part2b_to_part2t(primary) {
            return Ok(part2t.to_string());
        }
        if Language::from_639_3(primary).is_some() {
            return Ok(primary.to_string());
        }
    }

    Err(anyhow!("Cannot normalize invalid language code: {}", code))
}

/// Normalize a language code to ISO 639-1 (2-letter) format if possible
/// Falls back to ISO 639-2/T if no ISO 639-1 code exists
pub fn normalize_to_part1_or_part2t(code: &str) -> Result<String> {
    let part2t = normalize_to_part2t(code)?;
    let lang = Language::from_639_3(&part2t)
        .ok_or_else(|| anyhow!("Cannot normalize invalid language code: {}", code))?;

    Ok(lang
        .to_639_1()
        .map(|c| c.to_string())
        .unwrap_or(part2t))
}

/// Check if two language identifiers or codes represent the same language
pub fn language_codes_match(code1: &str, code2: &str) -> bool {
    match (normalize_to_part2t(code1), normalize_to_part2t(code2)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Get the English language name from a code or display identifier
pub fn get_language_name(code: &str) -> Result<String> {
    let normalized = normalize_to_part2t(code)?;
    let lang = Language::from_639_3(&normalized)
        .ok_or_else(|| anyhow!("Failed to get language from code: {}", normalized))?;

    Ok(lang.to_name().to_string())
}

/// Build the display identifier for a code, e.g. `"de"` -> `"German (de)"`
pub fn display_id(code: &str) -> Result<String> {
    let name = get_language_name(code)?;
    Ok(format!("{} ({})", name, language_code(code)))
}
