//! Free-text cleanup for producer-written fields

use once_cell::sync::Lazy;
use regex::Regex;

static LINE_BREAKS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\[nrt]|[\r\n\t]").expect("valid line break regex"));

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Clean one free-text value
///
/// Literal and escaped newlines/tabs become spaces, escaped quotes are
/// unescaped, whitespace runs collapse to one space and the ends are trimmed.
#[must_use]
pub fn sanitize_text(raw: &str) -> String {
    let spaced = LINE_BREAKS.replace_all(raw, " ");
    let unquoted = spaced.replace(r#"\""#, "\"").replace(r"\'", "'");
    WHITESPACE_RUN.replace_all(&unquoted, " ").trim().to_string()
}

/// Clean every entry, dropping entries that end up empty
#[must_use]
pub fn sanitize_list<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    raw.into_iter()
        .map(|s| sanitize_text(s.as_ref()))
        .filter(|s| !s.is_empty())
        .collect()
}
