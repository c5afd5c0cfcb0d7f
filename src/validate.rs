//! Status and priority normalization.
//!
//! Stored status/priority columns are free text. Reads go through the same
//! three-tier resolution the binary uses for user input: exact match, then
//! synonym lookup, then an error carrying the closest suggestion.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

// ── Valid value sets ─────────────────────────────────────────

pub static VALID_STATUSES: LazyLock<HashSet<&str>> =
    LazyLock::new(|| ["pending", "in_progress", "completed"].into_iter().collect());

pub static VALID_PRIORITIES: LazyLock<HashSet<&str>> =
    LazyLock::new(|| ["low", "medium", "high"].into_iter().collect());

// ── Synonym maps ─────────────────────────────────────────────

pub static STATUS_SYNONYMS: LazyLock<HashMap<&str, &str>> = LazyLock::new(|| {
    [
        ("done", "completed"),
        ("complete", "completed"),
        ("finished", "completed"),
        ("closed", "completed"),
        ("won", "completed"),
        ("wip", "in_progress"),
        ("in-progress", "in_progress"),
        ("in progress", "in_progress"),
        ("inprogress", "in_progress"),
        ("active", "in_progress"),
        ("started", "in_progress"),
        ("open", "pending"),
        ("new", "pending"),
        ("todo", "pending"),
    ]
    .into_iter()
    .collect()
});

pub static PRIORITY_SYNONYMS: LazyLock<HashMap<&str, &str>> = LazyLock::new(|| {
    [
        ("critical", "high"),
        ("urgent", "high"),
        ("important", "high"),
        ("normal", "medium"),
        ("default", "medium"),
        ("med", "medium"),
        ("minor", "low"),
        ("trivial", "low"),
    ]
    .into_iter()
    .collect()
});

/// Normalize a status string via exact match or synonym lookup.
///
/// Returns the canonical status, or an error with the original input
/// and an optional suggestion.
pub fn normalize_status(input: &str) -> Result<&'static str, (String, Option<String>)> {
    normalize(input, &VALID_STATUSES, &STATUS_SYNONYMS)
}

/// Normalize a priority string via exact match or synonym lookup.
pub fn normalize_priority(input: &str) -> Result<&'static str, (String, Option<String>)> {
    normalize(input, &VALID_PRIORITIES, &PRIORITY_SYNONYMS)
}

fn normalize(
    input: &str,
    valid: &HashSet<&'static str>,
    synonyms: &HashMap<&'static str, &'static str>,
) -> Result<&'static str, (String, Option<String>)> {
    let lower = input.trim().to_lowercase();

    // Tier 1: exact match
    if let Some(&canonical) = valid.get(lower.as_str()) {
        return Ok(canonical);
    }

    // Tier 2: synonym lookup
    if let Some(&canonical) = synonyms.get(lower.as_str()) {
        return Ok(canonical);
    }

    // Tier 3: closest suggestion
    let suggestion = find_closest_match(&lower, valid, synonyms);
    Err((input.to_string(), suggestion))
}

/// Find the closest matching value across valid set and synonyms.
fn find_closest_match(
    input: &str,
    valid: &HashSet<&str>,
    synonyms: &HashMap<&str, &str>,
) -> Option<String> {
    let mut best: Option<(&str, usize)> = None;

    for &v in valid.iter().chain(synonyms.keys()) {
        let dist = levenshtein_distance(input, v);
        if dist <= 3 && best.is_none_or(|(_, d)| dist < d) {
            // Synonyms suggest what they map to
            let shown = synonyms.get(v).copied().unwrap_or(v);
            best = Some((shown, dist));
        }
    }

    best.map(|(v, _)| v.to_string())
}

/// Edit distance between two strings, one DP row at a time.
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut row: Vec<usize> = (0..=b.len()).collect();

    for (i, ca) in a.chars().enumerate() {
        let mut diagonal = row[0];
        row[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let above = row[j + 1];
            row[j + 1] = if ca == cb {
                diagonal
            } else {
                1 + diagonal.min(above).min(row[j])
            };
            diagonal = above;
        }
    }

    row[b.len()]
}
