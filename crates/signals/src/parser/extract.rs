//! Low-level numeric token extraction shared by both parser tiers.

use once_cell::sync::Lazy;
use regex::Regex;

/// A numeric token, possibly carrying thousands-separators ("95,093").
pub const NUM: &str = r"\d[\d,]*(?:\.\d+)?";

static NUM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(NUM).unwrap());
static INT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());
static RANGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"({NUM})\s*-\s*({NUM})")).unwrap());

/// Parses one numeric token, tolerating thousands-separators. Anything that
/// does not survive as a finite float is treated as absent, not as an error.
pub fn parse_num(token: &str) -> Option<f64> {
    let cleaned = token.trim().replace(',', "");
    match cleaned.parse::<f64>() {
        Ok(v) if v.is_finite() => Some(v),
        _ => None,
    }
}

pub fn first_number(text: &str) -> Option<f64> {
    NUM_RE.find(text).and_then(|m| parse_num(m.as_str()))
}

pub fn first_int(text: &str) -> Option<u32> {
    INT_RE.find(text).and_then(|m| m.as_str().parse().ok())
}

/// First `A-B` numeric range in the text, in literal order.
pub fn number_range(text: &str) -> Option<(f64, f64)> {
    let caps = RANGE_RE.captures(text)?;
    Some((parse_num(&caps[1])?, parse_num(&caps[2])?))
}

/// First numeric token appearing after the first occurrence of `label`.
/// Both sides are expected lowercased by the caller.
pub fn number_after_label(text: &str, label: &str) -> Option<f64> {
    let at = text.find(label)?;
    first_number(&text[at + label.len()..])
}
