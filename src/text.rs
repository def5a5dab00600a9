//! Text normalisation used to compare a query against listing titles.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

/// Numeric value followed by a size/count unit, e.g. `12 oz`, `1.5l`, `24pack`.
static UNIT_TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"([0-9]+[0-9.,]*\s?(?:oz|ounce|fl\s?oz|lb|lbs|pound|ct|count|pk|pack|g|kg|l|ml|quart|qt|pt|liter|litre|dozen|dz))\b",
    )
    .expect("Invalid unit token regex")
});

/// Bare 1-3 digit numbers. Four digits and up are left out so years don't count as sizes.
static BARE_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[0-9]{1,3}\b").expect("Invalid bare number regex"));

static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("Invalid whitespace regex"));

const BRAND_STOP_WORDS: &[&str] = &[
    "the", "and", "with", "for", "of", "in", "to", "a", "an", "by", "on", "at", "from", "new",
];

/// Lowercases `text`, turns every non-alphanumeric character into a separator and
/// returns the remaining words in order.
pub fn tokenize(text: &str) -> Vec<String> {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { ' ' })
        .collect();

    cleaned.split_whitespace().map(str::to_string).collect()
}

/// Extracts size and count tokens such as `12oz` or `2ct`, followed by bare 1-3 digit
/// numbers that are not part of a unit-tagged token. Duplicates are dropped.
pub fn extract_numeric_tokens(text: &str) -> Vec<String> {
    let text = text.to_lowercase();
    let mut tokens: Vec<String> = Vec::new();
    let mut unit_spans = Vec::new();

    for captures in UNIT_TOKEN_RE.captures_iter(&text) {
        let Some(m) = captures.get(1) else { continue };
        unit_spans.push(m.range());
        let token = WHITESPACE_RE.replace_all(m.as_str(), "").into_owned();
        if !tokens.contains(&token) {
            tokens.push(token);
        }
    }

    for m in BARE_NUMBER_RE.find_iter(&text) {
        let inside_unit = unit_spans
            .iter()
            .any(|span| m.start() < span.end && span.start < m.end());
        if inside_unit {
            continue;
        }
        let token = m.as_str().to_string();
        if !tokens.contains(&token) {
            tokens.push(token);
        }
    }

    tokens
}

/// Heuristic brand guess: the first token that is not a stop word, does not start with a
/// digit and is at least three characters long.
pub fn guess_brand_token(tokens: &[String]) -> Option<String> {
    tokens
        .iter()
        .filter(|t| !BRAND_STOP_WORDS.contains(&t.as_str()))
        .filter(|t| !t.starts_with(|c: char| c.is_ascii_digit()))
        .find(|t| t.chars().count() >= 3)
        .cloned()
}

/// Jaccard similarity of two token collections treated as sets.
pub fn jaccard(a: &[String], b: &[String]) -> f64 {
    let a: HashSet<&str> = a.iter().map(String::as_str).collect();
    let b: HashSet<&str> = b.iter().map(String::as_str).collect();

    let union = a.union(&b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(&b).count() as f64 / union as f64
}
