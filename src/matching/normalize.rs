// src/matching/normalize.rs - Facility name normalization
use once_cell::sync::Lazy;
use regex::Regex;

/// "(Site 1007)", "( Site  42 )" and similar site-number qualifiers.
static SITE_NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s*\(\s*Site\s+\d+\s*\)").unwrap());

/// Any remaining parenthetical group. These are assumed to be location
/// qualifiers like "(Boston)".
static PARENTHETICAL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*\([^)]*\)\s*").unwrap());

/// Normalize a raw facility name for comparison and display.
///
/// Steps, in order: pass the "N/A" sentinel and empty input through unchanged;
/// strip site-number parentheticals; strip all remaining parenthetical groups
/// (aggressive, and occasionally drops legitimate disambiguating content - an
/// accepted precision/recall trade-off); fold en/em dashes to ASCII hyphens;
/// collapse whitespace runs and trim. Never returns null-ish output: empty in,
/// empty out.
pub fn normalize_institution_name(name: &str) -> String {
    if name.is_empty() || name == "N/A" {
        return name.to_string();
    }

    let stripped = SITE_NUMBER_RE.replace_all(name, "");
    let stripped = PARENTHETICAL_RE.replace_all(&stripped, " ");
    let dashed = stripped.replace('\u{2013}', "-").replace('\u{2014}', "-");

    dashed.split_whitespace().collect::<Vec<_>>().join(" ")
}
