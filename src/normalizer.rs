//! Cleanup of raw model output before it is handed to the JSON parser.

use regex::{Captures, Regex};
use std::sync::LazyLock;

/// A fraction in a value position: preceded by a quote, a colon or whitespace.
static FRACTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(["':\s])(\d+\s*/\s*\d+)"#).expect("fraction pattern is valid")
});

/// Strips a markdown code fence and rewrites fraction literals as decimals.
///
/// Never fails: anything that cannot be converted is passed through as-is.
pub fn extract_json_block(text: &str) -> String {
    let unfenced = strip_code_fence(text);
    replace_fractions(&unfenced)
}

/// Drops the first and last line when the text opens with a ``` fence.
pub fn strip_code_fence(text: &str) -> String {
    if !text.starts_with("```") {
        return text.to_string();
    }

    let lines: Vec<&str> = text.lines().collect();
    if lines.len() < 2 {
        return String::new();
    }
    lines[1..lines.len() - 1].join("\n")
}

pub fn replace_fractions(text: &str) -> String {
    FRACTION
        .replace_all(text, |caps: &Captures| {
            let fraction = &caps[2];
            let decimal = fraction_to_decimal(fraction).unwrap_or_else(|| fraction.to_string());
            format!("{}{}", &caps[1], decimal)
        })
        .into_owned()
}

/// `None` when the literal is not a plain `<digits>/<digits>` pair.
fn fraction_to_decimal(fraction: &str) -> Option<String> {
    let (numerator, denominator) = fraction.split_once('/')?;
    if !is_plain_digits(numerator) || !is_plain_digits(denominator) {
        return None;
    }

    let numerator: f64 = numerator.parse().ok()?;
    let denominator: f64 = denominator.parse().ok()?;
    if denominator == 0.0 {
        return Some("0.0".to_string());
    }

    let decimal = numerator / denominator;
    if !decimal.is_finite() {
        return None;
    }
    // Debug keeps a trailing ".0" on whole numbers and prints the shortest round-trip form.
    Some(format!("{:?}", decimal))
}

fn is_plain_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}
