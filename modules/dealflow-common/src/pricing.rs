use std::sync::LazyLock;

use regex::Regex;

static PERCENT_OFF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d{1,3})\s*%\s*off").expect("valid discount regex"));

/// Pull a `"NN% OFF"` label out of free card text such as `"Up to 60% off"`.
/// Returns an empty string when no percentage is present.
pub fn discount_label(text: &str) -> String {
    PERCENT_OFF
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| format!("{}% OFF", m.as_str()))
        .unwrap_or_default()
}

/// Compute a discount label from display prices, e.g. `"₹1,099"` vs `"₹4,490"`.
/// Empty when either price is unusable or there is no reduction.
pub fn derive_discount(price: &str, mrp: &str) -> String {
    let (Some(price), Some(mrp)) = (parse_amount(price), parse_amount(mrp)) else {
        return String::new();
    };
    if price <= 0.0 || mrp <= price {
        return String::new();
    }
    let pct = ((mrp - price) / mrp * 100.0).round();
    if pct < 1.0 {
        return String::new();
    }
    format!("{pct:.0}% OFF")
}

/// Digits and the decimal point survive; currency symbols and separators do not.
fn parse_amount(text: &str) -> Option<f64> {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    let cleaned = cleaned.trim_matches('.');
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse().ok()
}
