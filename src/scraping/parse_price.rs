use std::sync::LazyLock;

use regex::Regex;

static LEADING_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-+]?(\d+(\.\d*)?|\.\d+)").unwrap());

const CURRENCY_MARKERS: [&str; 3] = ["лв.", "лв", "€"];

/// Parses a displayed price such as `"12,99 лв."` into a number.
///
/// Currency markers and whitespace (including thousands separators) are removed and the
/// decimal comma becomes a dot. Only the leading number is read, so trailing text like
/// `"/кг"` is ignored. Returns `None` when nothing numeric remains.
pub fn parse_price(text: &str) -> Option<f64> {
    let mut cleaned = text.to_string();
    for marker in CURRENCY_MARKERS {
        cleaned = cleaned.replace(marker, "");
    }
    let cleaned: String = cleaned
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect();

    LEADING_NUMBER
        .find(&cleaned)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|price| price.is_finite())
}
