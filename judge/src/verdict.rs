//! Verdict classification: a pure function from an execution record, the
//! clamped timeout, and the expected output to a [`VerdictStatus`].

use std::time::Duration;

use once_cell::sync::Lazy;
use regex::RegexSet;
use sandbox::ExecutionRecord;

use crate::model::VerdictStatus;

/// Fraction of the address-space cap above which peak RSS is classified as
/// MLE, per `spec.md` §4.E.
pub const MLE_RSS_FRACTION: f64 = 0.9;

/// Exit code reserved for a timed-out child.
pub const TIMEOUT_EXIT_CODE: i32 = 124;

static SYNTAX_MARKERS: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([
        r"(?i)syntaxerror",
        r"(?i)parseerror",
        r"(?i)unexpected token",
        r"(?i)error: expected",
        r"(?i)cannot find symbol",
        r"(?i)compilation failed",
        r"(?i)\berror:.*\n.*\^",
    ])
    .expect("static syntax marker patterns must compile")
});

static RUNTIME_MARKERS: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([
        r"(?i)traceback \(most recent call last\)",
        r"(?i)exception in thread",
        r"(?i)unhandled exception",
        r"segmentation fault",
        r"(?i)core dumped",
        r"(?i)panicked at",
        r"(?i)nullreferenceexception",
        r"(?i)indexoutofboundsexception",
    ])
    .expect("static runtime marker patterns must compile")
});

/// Strip only trailing whitespace (spaces, tabs, newlines) from `s`.
/// Internal whitespace, encoding, and line separators are preserved.
/// Idempotent: `normalize(normalize(x)) == normalize(x)`.
pub fn normalize(s: &str) -> &str {
    s.trim_end_matches(|c: char| c.is_whitespace())
}

/// Classify a single test's execution against the clamped timeout and the
/// expected output. Total precedence order: tle, mle, syntax_error,
/// runtime_error, error, passed/failed.
pub fn classify(
    record: &ExecutionRecord,
    timeout: Duration,
    expected: &str,
    address_space_cap_bytes: u64,
) -> VerdictStatus {
    let timeout_ms = timeout.as_millis() as u64;

    if record.exit_code == TIMEOUT_EXIT_CODE || record.wall_time.as_millis() as u64 >= timeout_ms {
        return VerdictStatus::Tle;
    }

    let mle_threshold = (address_space_cap_bytes as f64 * MLE_RSS_FRACTION) as u64;
    if record.peak_rss_bytes >= mle_threshold {
        return VerdictStatus::Mle;
    }

    if record.exit_code != 0 {
        let stderr = String::from_utf8_lossy(&record.stderr);
        if SYNTAX_MARKERS.is_match(&stderr) {
            return VerdictStatus::SyntaxError;
        }
        if RUNTIME_MARKERS.is_match(&stderr) {
            return VerdictStatus::RuntimeError;
        }
        return VerdictStatus::Error;
    }

    let stdout = String::from_utf8_lossy(&record.stdout);
    if normalize(&stdout) == normalize(expected) {
        VerdictStatus::Passed
    } else {
        VerdictStatus::Failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(exit_code: i32, wall_ms: u64, rss: u64, stdout: &str, stderr: &str) -> ExecutionRecord {
        ExecutionRecord {
            stdout: stdout.as_bytes().to_vec(),
            stderr: stderr.as_bytes().to_vec(),
            exit_code,
            timed_out: exit_code == TIMEOUT_EXIT_CODE,
            wall_time: Duration::from_millis(wall_ms),
            peak_cpu_percent: 0.0,
            peak_rss_bytes: rss,
        }
    }

    const AS_CAP: u64 = 256 * 1024 * 1024;

    #[test]
    fn exact_match_passes() {
        let r = record(0, 5, 1024, "5\n", "");
        assert_eq!(classify(&r, Duration::from_secs(2), "5", AS_CAP), VerdictStatus::Passed);
    }

    #[test]
    fn trailing_whitespace_only_difference_still_passes() {
        let r = record(0, 5, 1024, "5\n\n  ", "");
        assert_eq!(classify(&r, Duration::from_secs(2), "5", AS_CAP), VerdictStatus::Passed);
    }

    #[test]
    fn mismatched_output_fails() {
        let r = record(0, 5, 1024, "1\n", "");
        assert_eq!(classify(&r, Duration::from_secs(2), "2", AS_CAP), VerdictStatus::Failed);
    }

    #[test]
    fn timeout_exit_code_is_tle_even_with_matching_output() {
        let r = record(TIMEOUT_EXIT_CODE, 2000, 1024, "5", "Time Limit Exceeded");
        assert_eq!(classify(&r, Duration::from_secs(2), "5", AS_CAP), VerdictStatus::Tle);
    }

    #[test]
    fn wall_time_at_or_above_timeout_is_tle_regardless_of_exit_code() {
        let r = record(0, 2000, 1024, "5", "");
        assert_eq!(classify(&r, Duration::from_secs(2), "5", AS_CAP), VerdictStatus::Tle);
    }

    #[test]
    fn peak_rss_over_mle_threshold_wins_over_nonzero_exit() {
        let r = record(1, 5, (AS_CAP as f64 * 0.95) as u64, "", "some nonsense error");
        assert_eq!(classify(&r, Duration::from_secs(2), "5", AS_CAP), VerdictStatus::Mle);
    }

    #[test]
    fn syntax_marker_in_stderr_classifies_syntax_error() {
        let r = record(1, 5, 1024, "", "  File \"main.py\", line 1\nSyntaxError: invalid syntax");
        assert_eq!(classify(&r, Duration::from_secs(2), "5", AS_CAP), VerdictStatus::SyntaxError);
    }

    #[test]
    fn runtime_marker_in_stderr_classifies_runtime_error() {
        let r = record(1, 5, 1024, "", "Traceback (most recent call last):\nZeroDivisionError");
        assert_eq!(classify(&r, Duration::from_secs(2), "5", AS_CAP), VerdictStatus::RuntimeError);
    }

    #[test]
    fn unrecognized_nonzero_exit_classifies_as_error() {
        let r = record(2, 5, 1024, "", "");
        assert_eq!(classify(&r, Duration::from_secs(2), "5", AS_CAP), VerdictStatus::Error);
    }

    #[test]
    fn normalize_is_idempotent() {
        let s = "hello world   \n\n";
        assert_eq!(normalize(normalize(s)), normalize(s));
    }

    #[test]
    fn normalize_preserves_internal_whitespace() {
        assert_eq!(normalize("a  b\nc   "), "a  b\nc");
    }
}
