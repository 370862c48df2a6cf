//! Tier 2: generic free-form scan over the whole message.
//!
//! Works on the lowercased message as a single blob, so it also handles
//! one-liners like `ETH SHORT @ 3500 | TP: 3400, 3300 | SL: 3600`.

use common::models::Side;
use once_cell::sync::Lazy;
use regex::Regex;

use super::extract::{parse_num, NUM};
use super::Extracted;

static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b[a-z]{2,10}\b").unwrap());
static SIDE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(long|buy|short|sell)\b").unwrap());
static ENTRY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?:\b(?:entry|enter|price)\b|@)[^\d]*?({NUM})")).unwrap()
});
static STOP_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"\b(?:sl|stop[\s-]*loss|stop)\b[^\d]*?({NUM})")).unwrap()
});
static LEVERAGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\blev(?:erage)?\b[^\d]*?(\d+)").unwrap());

/// Take-profit anchors; a trailing index digit belongs to the anchor, not
/// the value ("tp1: 3400" targets 3400).
static TP_ANCHOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:tp\d*|take[\s-]*profits?\d*|targets?\d*)\b").unwrap());
static TP_FIRST_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"^[\s:=@-]*({NUM})")).unwrap());
static TP_NEXT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"^[\s,/-]+({NUM})")).unwrap());

/// Words that can never be an instrument symbol; without this filter a
/// message like "buy btc ..." would extract "buy" as the symbol.
const RESERVED: &[&str] = &[
    "long", "short", "buy", "sell", "entry", "enter", "price", "tp", "take", "profit",
    "profits", "target", "targets", "sl", "stop", "loss", "lev", "leverage", "at", "and",
];

pub(super) fn extract(text: &str) -> Extracted {
    let blob = text.to_lowercase();

    Extracted {
        symbol: symbol(&blob),
        side: side(&blob),
        entry: ENTRY_RE
            .captures(&blob)
            .and_then(|c| parse_num(&c[1])),
        stop: STOP_RE.captures(&blob).and_then(|c| parse_num(&c[1])),
        targets: targets(&blob),
        leverage: LEVERAGE_RE
            .captures(&blob)
            .and_then(|c| c[1].parse().ok()),
    }
}

fn symbol(blob: &str) -> Option<String> {
    WORD_RE
        .find_iter(blob)
        .map(|m| m.as_str())
        .find(|w| !RESERVED.contains(w))
        .map(str::to_string)
}

fn side(blob: &str) -> Option<Side> {
    SIDE_RE.captures(blob).map(|c| match &c[1] {
        "long" | "buy" => Side::Long,
        _ => Side::Short,
    })
}

/// Every numeric token following any take-profit anchor, in order of first
/// appearance, de-duplicated. Comma/slash-separated runs after one anchor
/// are all captured; an unrelated token ends the run.
fn targets(blob: &str) -> Vec<f64> {
    let mut out: Vec<f64> = Vec::new();
    for anchor in TP_ANCHOR_RE.find_iter(blob) {
        let mut rest = &blob[anchor.end()..];
        let Some(caps) = TP_FIRST_RE.captures(rest) else {
            continue;
        };
        let mut push = |caps: &regex::Captures| {
            if let Some(v) = parse_num(&caps[1]) {
                if !out.contains(&v) {
                    out.push(v);
                }
            }
        };
        push(&caps);
        rest = &rest[caps.get(0).unwrap().end()..];
        while let Some(caps) = TP_NEXT_RE.captures(rest) {
            push(&caps);
            rest = &rest[caps.get(0).unwrap().end()..];
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comma_separated_targets_on_one_line() {
        let f = extract("eth short @ 3500 | tp: 3400, 3300 | sl: 3600");
        assert_eq!(f.targets, vec![3400.0, 3300.0]);
        assert_eq!(f.entry, Some(3500.0));
        assert_eq!(f.stop, Some(3600.0));
    }

    #[test]
    fn indexed_anchors_collect_across_message() {
        let f = extract("btc long entry 100 tp1 110 tp2 120 stop 90");
        assert_eq!(f.targets, vec![110.0, 120.0]);
    }

    #[test]
    fn target_run_stops_at_unrelated_token() {
        let f = extract("tp 3400, 3300 sl 3600");
        assert_eq!(f.targets, vec![3400.0, 3300.0]);
        assert_eq!(f.stop, Some(3600.0));
    }

    #[test]
    fn side_keywords_never_become_the_symbol() {
        let f = extract("sell sol @ 200 tp 190 sl 210");
        assert_eq!(f.symbol.as_deref(), Some("sol"));
        assert_eq!(f.side, Some(Side::Short));
    }

    #[test]
    fn no_side_keyword_leaves_side_unset() {
        assert!(extract("btc looking strong above 95k").side.is_none());
    }
}
