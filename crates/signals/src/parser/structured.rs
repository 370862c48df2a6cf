//! Tier 1: line-labeled signal format.
//!
//! The first line must read `SYMBOL LONG|SHORT [trailing words]`. Every
//! following line is inspected independently, so label order does not
//! matter. Labels match on case-insensitive substrings.

use common::models::Side;
use once_cell::sync::Lazy;
use regex::Regex;

use super::extract::{first_int, first_number, number_after_label, number_range};
use super::Extracted;

static HEADER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*\$?([A-Za-z]{2,10})\s+(LONG|SHORT)\b").unwrap());

// The optional tail swallows an enumeration index ("Take Profit 1:") but
// only when a separator follows it, so a bare "Take Profit 110" keeps its
// price.
static TP_LABEL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:(?:take[\s-]*)?profits?|targets?)(?:\s*\d{1,2}\s*[:=)])?").unwrap()
});

/// Returns None when the header line does not look like a signal at all.
/// A returned value may still be incomplete; the caller decides whether to
/// fall through to the free-form tier.
pub(super) fn extract(text: &str) -> Option<Extracted> {
    let mut lines = text.lines();
    let caps = HEADER_RE.captures(lines.next()?)?;

    let mut fields = Extracted {
        symbol: Some(caps[1].to_string()),
        side: Some(match caps[2].to_uppercase().as_str() {
            "LONG" => Side::Long,
            _ => Side::Short,
        }),
        ..Extracted::default()
    };

    for line in lines {
        let lower = line.to_lowercase();
        if lower.contains("entry") {
            if fields.entry.is_none() {
                fields.entry = number_after_label(&lower, "entry");
            }
        } else if lower.contains("stop") {
            if fields.stop.is_none() {
                fields.stop = number_after_label(&lower, "stop");
            }
        } else if lower.contains("lev") {
            if fields.leverage.is_none() {
                // A range like "10-25x" keeps the lower bound, which is
                // also the first integer on the line.
                fields.leverage = first_int(&lower);
            }
        } else if lower.contains("profit") || lower.contains("target") {
            // One target per labeled line, or two for a range; later lines
            // extend the list ("Take Profit 1: ...", "Take Profit 2: ...").
            if let Some(m) = TP_LABEL_RE.find(&lower) {
                let rest = &lower[m.end()..];
                let found = match number_range(rest) {
                    Some((a, b)) => vec![a, b],
                    None => first_number(rest).into_iter().collect(),
                };
                for v in found {
                    if !fields.targets.contains(&v) {
                        fields.targets.push(v);
                    }
                }
            }
        }
    }

    Some(fields)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_requires_symbol_then_side() {
        assert!(extract("BTC LONG\n").is_some());
        assert!(extract("$sol short scalp\n").is_some());
        assert!(extract("LONG BTC\n").is_none());
        assert!(extract("good morning traders\n").is_none());
    }

    #[test]
    fn labeled_lines_are_order_independent() {
        let f = extract("BTC LONG\nTake Profit: 110\nEntry: 100\nStop Loss: 90").unwrap();
        assert_eq!(f.entry, Some(100.0));
        assert_eq!(f.stop, Some(90.0));
        assert_eq!(f.targets, vec![110.0]);
    }

    #[test]
    fn entry_line_ignores_current_price_suffix() {
        let f = extract("BTC LONG\nEntry: 95,093 / Current Price 95,337.89").unwrap();
        assert_eq!(f.entry, Some(95093.0));
    }

    #[test]
    fn numbered_profit_lines_accumulate_without_the_index() {
        let f = extract("BTC LONG\nEntry: 100\nTake Profit 1: 110\nTake Profit 2: 120").unwrap();
        assert_eq!(f.targets, vec![110.0, 120.0]);
    }

    #[test]
    fn unseparated_profit_number_is_the_price() {
        let f = extract("BTC LONG\nTake Profit 110").unwrap();
        assert_eq!(f.targets, vec![110.0]);
    }

    #[test]
    fn missing_stop_leaves_field_unset() {
        let f = extract("BTC LONG\nEntry: 100\nTake Profit: 110").unwrap();
        assert!(f.stop.is_none());
        assert!(!f.is_complete());
    }
}
