//! Best-effort classification from unstructured messages.
//!
//! Platform exceptions only tell us what happened through their message
//! text. These predicates are the single place where that text is
//! inspected, so the heuristics can be tested and tightened independently
//! of the classifier's ordering.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Cross-origin marker: "cors" or "cross-origin" anywhere, any case
    pub static ref CROSS_ORIGIN_PATTERN: Regex = Regex::new(
        r"(?i)cors|cross[-\s]?origin"
    ).unwrap();

    /// Deadline wording used by HTTP clients ("timeout of 5000ms exceeded")
    /// and async timers ("deadline has elapsed")
    pub static ref TIMEOUT_PATTERN: Regex = Regex::new(
        r"(?i)time[-\s]?out|timed\s+out|deadline\s+(has\s+)?(elapsed|exceeded)"
    ).unwrap();
}

/// Transport codes that signal an elapsed deadline.
pub const TIMEOUT_CODES: &[&str] = &["ECONNABORTED", "ETIMEDOUT", "ERR_TIMEOUT", "ESOCKETTIMEDOUT"];

/// Check if a failure message names a blocked cross-origin request.
pub fn is_cross_origin_message(message: &str) -> bool {
    CROSS_ORIGIN_PATTERN.is_match(message)
}

/// Check if a failure message describes an elapsed deadline.
pub fn is_timeout_message(message: &str) -> bool {
    TIMEOUT_PATTERN.is_match(message)
}

/// Check if a transport code signals an elapsed deadline.
pub fn is_timeout_code(code: &str) -> bool {
    TIMEOUT_CODES
        .iter()
        .any(|candidate| candidate.eq_ignore_ascii_case(code))
}
