//! Course-code resolution.
//!
//! Course codes follow the pattern of one letter followed by five digits
//! (e.g., C10302). Crawled records are not always trustworthy: the code
//! field may be malformed or missing, so resolution falls back to the
//! source URL and then the source filename.

use crate::course::CourseRecord;
use regex::Regex;
use std::sync::OnceLock;

/// Course-code pattern: one letter followed by five digits.
pub const COURSE_CODE_PATTERN: &str = r"[A-Za-z]\d{5}";

fn exact_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(&format!("^{}$", COURSE_CODE_PATTERN)).expect("valid regex"))
}

fn hint_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(&format!(r"\b{}\b", COURSE_CODE_PATTERN)).expect("valid regex"))
}

fn embedded_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(COURSE_CODE_PATTERN).expect("valid regex"))
}

/// Extract a course-code hint from a user question, normalized to uppercase.
/// Word boundaries avoid matching fragments of longer identifiers.
pub fn extract_course_code(text: &str) -> Option<String> {
    hint_re().find(text).map(|m| m.as_str().to_uppercase())
}

/// Find a course code embedded anywhere in a filename or URL, normalized to
/// uppercase. No boundary requirement: codes sit between underscores and
/// path segments where `\b` does not apply.
pub fn find_course_code(text: &str) -> Option<String> {
    embedded_re().find(text).map(|m| m.as_str().to_uppercase())
}

/// Resolve the course code for a record.
///
/// Priority: well-formed value in the record, then a pattern match in the
/// source URL, then a pattern match in the uniqueness token (filename), then
/// the raw record value uppercased even if malformed, then "UNKNOWN".
pub fn resolve_course_code(record: &CourseRecord, uniqueness_token: &str) -> String {
    if let Some(code) = record.course_code.as_deref().map(str::trim) {
        if exact_re().is_match(code) {
            return code.to_uppercase();
        }
    }

    if let Some(code) = find_course_code(record.source_url()) {
        return code;
    }

    if let Some(code) = find_course_code(uniqueness_token) {
        return code;
    }

    match record.course_code.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => raw.to_uppercase(),
        _ => "UNKNOWN".to_string(),
    }
}
