//! Input validation with synonym recovery.
//!
//! Provides O(1) validation sets and synonym maps so users can type
//! "wip" or "fixed" and still land on a valid status. Three-tier
//! resolution: exact match → synonym lookup → error with suggestion.

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::error::Error;
use crate::model::{Severity, Status};

// ── Synonym maps ─────────────────────────────────────────────

pub static STATUS_SYNONYMS: LazyLock<HashMap<&str, Status>> = LazyLock::new(|| {
    [
        ("new", Status::Open),
        ("todo", Status::Open),
        ("reopen", Status::Open),
        ("reopened", Status::Open),
        ("in_progress", Status::InProgress),
        ("inprogress", Status::InProgress),
        ("in progress", Status::InProgress),
        ("wip", Status::InProgress),
        ("working", Status::InProgress),
        ("started", Status::InProgress),
        ("fixed", Status::Resolved),
        ("solved", Status::Resolved),
        ("done", Status::Closed),
        ("complete", Status::Closed),
        ("completed", Status::Closed),
        ("wontfix", Status::Closed),
    ]
    .into_iter()
    .collect()
});

pub static SEVERITY_SYNONYMS: LazyLock<HashMap<&str, Severity>> = LazyLock::new(|| {
    [
        ("crit", Severity::Critical),
        ("blocker", Severity::Critical),
        ("urgent", Severity::Critical),
        ("p0", Severity::Critical),
        ("major", Severity::High),
        ("important", Severity::High),
        ("p1", Severity::High),
        ("normal", Severity::Medium),
        ("moderate", Severity::Medium),
        ("med", Severity::Medium),
        ("p2", Severity::Medium),
        ("minor", Severity::Low),
        ("trivial", Severity::Low),
        ("p3", Severity::Low),
    ]
    .into_iter()
    .collect()
});

/// Normalize a status string via exact match or synonym lookup.
///
/// Returns the status, or the original input and an optional suggestion.
pub fn normalize_status(input: &str) -> Result<Status, (String, Option<String>)> {
    let lower = input.trim().to_lowercase();

    // Tier 1: exact match
    if let Some(status) = Status::parse(&lower) {
        return Ok(status);
    }

    // Tier 2: synonym lookup
    if let Some(&status) = STATUS_SYNONYMS.get(lower.as_str()) {
        return Ok(status);
    }

    // Tier 3: find closest suggestion
    let valid: Vec<(&str, &str)> = Status::ALL
        .iter()
        .map(|s| (s.as_str(), s.as_str()))
        .chain(STATUS_SYNONYMS.iter().map(|(k, v)| (*k, v.as_str())))
        .collect();
    Err((input.to_string(), find_closest_match(&lower, &valid)))
}

/// Normalize a severity string via exact match or synonym lookup.
pub fn normalize_severity(input: &str) -> Result<Severity, (String, Option<String>)> {
    let lower = input.trim().to_lowercase();

    if let Some(severity) = Severity::parse(&lower) {
        return Ok(severity);
    }

    if let Some(&severity) = SEVERITY_SYNONYMS.get(lower.as_str()) {
        return Ok(severity);
    }

    let valid: Vec<(&str, &str)> = Severity::ALL
        .iter()
        .map(|s| (s.as_str(), s.as_str()))
        .chain(SEVERITY_SYNONYMS.iter().map(|(k, v)| (*k, v.as_str())))
        .collect();
    Err((input.to_string(), find_closest_match(&lower, &valid)))
}

/// Parse a status for a command, mapping failures to `Error::InvalidStatus`.
pub fn parse_status_arg(input: &str) -> crate::Result<Status> {
    normalize_status(input)
        .map_err(|(value, suggestion)| Error::InvalidStatus { value, suggestion })
}

/// Parse a severity for a command, mapping failures to `Error::InvalidSeverity`.
pub fn parse_severity_arg(input: &str) -> crate::Result<Severity> {
    normalize_severity(input)
        .map_err(|(value, suggestion)| Error::InvalidSeverity { value, suggestion })
}

/// Find the closest canonical value among `(candidate, canonical)` pairs.
fn find_closest_match(input: &str, candidates: &[(&str, &str)]) -> Option<String> {
    let mut best: Option<(&str, usize)> = None;

    for &(candidate, canonical) in candidates {
        let dist = levenshtein_distance(input, candidate);
        if dist <= 3 && best.is_none_or(|(_, d)| dist < d) {
            best = Some((canonical, dist));
        }
    }

    best.map(|(v, _)| v.to_string())
}

// ── Levenshtein distance ─────────────────────────────────────

/// Compute the Levenshtein edit distance between two strings.
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let a_len = a.len();
    let b_len = b.len();

    if a_len == 0 {
        return b_len;
    }
    if b_len == 0 {
        return a_len;
    }

    // Single-row optimization (O(min(m,n)) space)
    let mut prev: Vec<usize> = (0..=b_len).collect();
    let mut curr = vec![0; b_len + 1];

    for i in 1..=a_len {
        curr[0] = i;
        for j in 1..=b_len {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            curr[j] = (prev[j] + 1) // deletion
                .min(curr[j - 1] + 1) // insertion
                .min(prev[j - 1] + cost); // substitution
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_len]
}

/// Find existing IDs similar to the searched ID.
///
/// Returns up to `max` suggestions with edit distance ≤ 3,
/// sorted by distance then alphabetically.
pub fn find_similar_ids(searched: &str, existing: &[String], max: usize) -> Vec<String> {
    let mut candidates: Vec<(usize, &str)> = existing
        .iter()
        .map(|id| (levenshtein_distance(searched, id), id.as_str()))
        .filter(|(dist, _)| *dist <= 3)
        .collect();

    candidates.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1)));

    candidates
        .into_iter()
        .take(max)
        .map(|(_, id)| id.to_string())
        .collect()
}

/// Build the not-found error for `id`, with suggestions when any are close.
#[must_use]
pub fn not_found(id: &str, existing: &[String]) -> Error {
    let similar = find_similar_ids(id, existing, 3);
    if similar.is_empty() {
        Error::BugNotFound { id: id.to_string() }
    } else {
        Error::BugNotFoundSimilar {
            id: id.to_string(),
            similar,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_status() {
        assert_eq!(normalize_status("open"), Ok(Status::Open));
        assert_eq!(normalize_status("In-Progress"), Ok(Status::InProgress));
        assert_eq!(normalize_status("wip"), Ok(Status::InProgress));
        assert_eq!(normalize_status("fixed"), Ok(Status::Resolved));
        assert_eq!(normalize_status("done"), Ok(Status::Closed));
        assert!(normalize_status("nonsense").is_err());
    }

    #[test]
    fn test_normalize_status_suggests() {
        let (value, suggestion) = normalize_status("resolvd").unwrap_err();
        assert_eq!(value, "resolvd");
        assert_eq!(suggestion.as_deref(), Some("resolved"));
    }

    #[test]
    fn test_normalize_severity() {
        assert_eq!(normalize_severity("critical"), Ok(Severity::Critical));
        assert_eq!(normalize_severity("HIGH"), Ok(Severity::High));
        assert_eq!(normalize_severity("minor"), Ok(Severity::Low));
        assert_eq!(normalize_severity("p1"), Ok(Severity::High));
        assert!(normalize_severity("catastrophic").is_err());
    }

    #[test]
    fn test_parse_args_map_errors() {
        assert!(matches!(
            parse_status_arg("zzz"),
            Err(Error::InvalidStatus { .. })
        ));
        assert!(matches!(
            parse_severity_arg("zzz"),
            Err(Error::InvalidSeverity { .. })
        ));
    }

    #[test]
    fn test_levenshtein() {
        assert_eq!(levenshtein_distance("", ""), 0);
        assert_eq!(levenshtein_distance("abc", "abc"), 0);
        assert_eq!(levenshtein_distance("abc", "abd"), 1);
        assert_eq!(levenshtein_distance("kitten", "sitting"), 3);
    }

    #[test]
    fn test_find_similar_ids() {
        let ids = vec![
            "bug_a1b2c3d4e5f6".to_string(),
            "bug_a1b2c3d4e5f7".to_string(),
            "bug_ffffffffffff".to_string(),
        ];
        let result = find_similar_ids("bug_a1b2c3d4e5f0", &ids, 3);
        assert_eq!(result.len(), 2);
        assert_eq!(result[0], "bug_a1b2c3d4e5f6");
    }

    #[test]
    fn test_not_found_without_candidates() {
        let err = not_found("bug_x", &[]);
        assert!(matches!(err, Error::BugNotFound { .. }));
    }
}
