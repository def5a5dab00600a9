//! Canonical price extraction from raw element text.

use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::LazyLock;

/// A dollar amount with optional thousands grouping and up to two decimals.
static PRICE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$?(?:[0-9]{1,3}(?:,[0-9]{3})+|[0-9]+)(?:\.[0-9]{1,2})?")
        .expect("Invalid price regex")
});

static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("Invalid whitespace regex"));

/// Turns raw element text (or a `content` attribute value) into a `$`-prefixed price.
///
/// A clean currency match is preferred. Failing that, any text that still contains a
/// digit is treated as price-like, which tolerates prices split across several nodes.
/// Returns `None` when the text carries no usable price.
pub fn parse_price(raw: &str) -> Option<String> {
    let condensed = WHITESPACE_RE.replace_all(raw.trim(), "");
    if condensed.is_empty() {
        return None;
    }

    if let Some(m) = PRICE_RE.find(&condensed) {
        return Some(with_dollar(m.as_str()));
    }

    if condensed.chars().any(|c| c.is_ascii_digit()) {
        return Some(with_dollar(&condensed));
    }

    None
}

/// Numeric value of a canonical price string, e.g. `$1,299.99` -> `1299.99`.
pub fn price_amount(price: &str) -> Option<Decimal> {
    let m = PRICE_RE.find(price)?;
    let digits: String = m
        .as_str()
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    Decimal::from_str(&digits).ok()
}

fn with_dollar(text: &str) -> String {
    if text.starts_with('$') {
        text.to_string()
    } else {
        format!("${}", text)
    }
}
