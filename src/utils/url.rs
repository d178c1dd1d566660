// src/utils/url.rs

//! Hints hidden in document URLs and link text.

use std::sync::LazyLock;

use regex::Regex;

static ISO_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{4})[-./](\d{2})[-./](\d{2})").expect("valid regex"));

static LANGUAGE_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)_([est])\.pdf$").expect("valid regex"));

/// Last path segment of a URL, without query or fragment.
///
/// # Examples
/// ```
/// use catalog_sync::utils::url::file_name;
///
/// assert_eq!(
///     file_name("https://documents.gov.lk/files/egz/2025/1/2417-01_E.pdf?x=1"),
///     Some("2417-01_E.pdf".to_string())
/// );
/// ```
pub fn file_name(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next()?;
    let last = path.trim_end_matches('/').rsplit('/').next()?;
    (!last.is_empty() && !last.contains(':')).then(|| last.to_string())
}

/// First `YYYY-MM-DD`-shaped date in free text, with `-` separators.
///
/// The result is not checked against the calendar.
pub fn find_date(text: &str) -> Option<String> {
    ISO_DATE
        .captures(text)
        .map(|caps| format!("{}-{}-{}", &caps[1], &caps[2], &caps[3]))
}

/// Language code implied by a `_E`/`_S`/`_T` filename suffix.
pub fn language_from_filename(url: &str) -> Option<&'static str> {
    let name = file_name(url)?;
    let caps = LANGUAGE_SUFFIX.captures(&name)?;
    match caps[1].to_ascii_uppercase().as_str() {
        "E" => Some("en"),
        "S" => Some("si"),
        "T" => Some("ta"),
        _ => None,
    }
}

/// Language code for a language name or code as written in link text.
pub fn language_code(text: &str) -> Option<String> {
    let lower = text.trim().to_lowercase();
    let code = match lower.as_str() {
        "" => return None,
        "english" | "eng" | "e" => "en",
        "sinhala" | "sinhalese" | "sin" | "s" => "si",
        "tamil" | "tam" | "t" => "ta",
        other if other.len() == 2 && other.chars().all(|c| c.is_ascii_alphabetic()) => other,
        _ => return None,
    };
    Some(code.to_string())
}
