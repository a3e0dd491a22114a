//! Content hashing for report change detection.
//!
//! The report carries a generation timestamp that changes on every render,
//! so hashes skip that line. Two reports describing the same bugs hash the
//! same no matter when they were written.

use sha2::{Digest, Sha256};

use crate::sync::render::GENERATED_PREFIX;

/// SHA256 of a report, ignoring the `_Generated:` line.
///
/// Only the first such line in the preamble (before any `##` heading) is
/// skipped; the same text inside a bug section still counts.
#[must_use]
pub fn report_hash(report: &str) -> String {
    let mut hasher = Sha256::new();
    let mut in_preamble = true;
    for line in report.lines() {
        if line.starts_with("##") {
            in_preamble = false;
        }
        if in_preamble && line.trim_start().starts_with(GENERATED_PREFIX) {
            in_preamble = false;
            continue;
        }
        hasher.update(line.as_bytes());
        hasher.update(b"\n");
    }
    format!("{:x}", hasher.finalize())
}

/// Check if content has changed against a previously stored hash.
///
/// Returns `true` if there is no stored hash or the hashes differ.
#[must_use]
pub fn has_changed(current_hash: &str, stored_hash: Option<&str>) -> bool {
    stored_hash.is_none_or(|h| h != current_hash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BugRecord, Severity};
    use crate::sync::render::render_report_at;
    use chrono::Duration;

    #[test]
    fn test_hash_ignores_generation_time() {
        let bugs = vec![BugRecord::new(None, "x", Severity::Low)];
        let now = crate::model::now_millis();

        let a = render_report_at(&bugs, now);
        let b = render_report_at(&bugs, now + Duration::hours(3));
        assert_ne!(a, b);
        assert_eq!(report_hash(&a), report_hash(&b));
        assert_eq!(report_hash(&a).len(), 64);
    }

    #[test]
    fn test_hash_tracks_content() {
        let mut bug = BugRecord::new(None, "x", Severity::Low);
        let before = report_hash(&render_report_at(std::slice::from_ref(&bug), bug.created_at));
        bug.description = "y".into();
        let after = report_hash(&render_report_at(&[bug.clone()], bug.created_at));
        assert_ne!(before, after);
    }

    #[test]
    fn test_generated_text_inside_a_bug_counts() {
        let now = crate::model::now_millis();
        let a = BugRecord::new(
            Some(crate::model::Location::new("/notes.md", 0, 0)),
            "stamp",
            Severity::Low,
        )
        .with_code("_Generated: monday_");
        let mut b = a.clone();
        b.code = "_Generated: tuesday_".into();

        let ha = report_hash(&render_report_at(&[a], now));
        let hb = report_hash(&render_report_at(&[b], now));
        assert_ne!(ha, hb);
    }

    #[test]
    fn test_has_changed() {
        assert!(has_changed("abc", None));
        assert!(has_changed("abc", Some("def")));
        assert!(!has_changed("abc", Some("abc")));
    }
}
