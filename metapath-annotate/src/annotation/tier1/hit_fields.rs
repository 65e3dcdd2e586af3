// Tier 1: Field helpers shared by the hit parsers
//
// Concept: Column-level interpretation rules that every parser applies the same way
// Synchronization: Pure functions over &str

use regex::Regex;
use std::sync::OnceLock;

fn ko_pattern() -> &'static Regex {
    static KO_PATTERN: OnceLock<Regex> = OnceLock::new();
    KO_PATTERN.get_or_init(|| Regex::new(r"K\d{5}").expect("KO pattern is a valid regex"))
}

/// True if the identifier is empty or made only of placeholder characters
///
/// Tools emit runs of '-', '.' or '*' in the name column for summary and
/// alignment rows; those never name a real protein.
pub fn is_placeholder_id(id: &str) -> bool {
    let id = id.trim();
    id.is_empty() || id.chars().all(|c| matches!(c, '-' | '.' | '*'))
}

/// First KEGG ortholog identifier (K + 5 digits) found in `text`
pub fn extract_ko(text: &str) -> Option<String> {
    ko_pattern().find(text).map(|m| m.as_str().to_string())
}

/// Score column value; unparseable scores become the least confident value
pub fn parse_score(value: &str) -> f64 {
    match value.trim().parse::<f64>() {
        Ok(score) if !score.is_nan() => score,
        _ => f64::NEG_INFINITY,
    }
}

/// First entry of a comma-separated annotation column; '-' means absent
pub fn first_listed(value: &str) -> Option<&str> {
    value
        .split(',')
        .map(str::trim)
        .find(|entry| !entry.is_empty() && *entry != "-")
}
