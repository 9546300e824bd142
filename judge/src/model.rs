//! The request-scoped data model: submissions, test cases, verdicts, and the
//! response bundle returned to callers. Every value here is owned by a
//! single request and is never mutated after first fill.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{ErrorKind, Result};

/// Lower bound of the clamped per-test wall-clock timeout.
pub const MIN_TIMEOUT_SECS: u64 = 1;

/// Upper bound of the clamped per-test wall-clock timeout.
pub const MAX_TIMEOUT_SECS: u64 = 10;

/// Timeout used when a request omits one entirely.
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Clamp a caller-supplied timeout (in seconds) to `[1, 10]`.
pub fn clamp_timeout_secs(requested: Option<u64>) -> Duration {
    let secs = requested.unwrap_or(DEFAULT_TIMEOUT_SECS);
    Duration::from_secs(secs.clamp(MIN_TIMEOUT_SECS, MAX_TIMEOUT_SECS))
}

/// Maximum accepted source length, in bytes. Matches the Static Validator's
/// hard cap so both layers agree on the boundary.
pub const MAX_SOURCE_BYTES: usize = 100 * 1024;

/// Where a test case's text came from on the wire, before it is resolved
/// into an owned string.
#[derive(Clone, Debug)]
pub enum FieldSource {
    Inline(String),
    FileRef(PathBuf),
}

/// One test case as it arrives on the wire, prior to materialization.
#[derive(Clone, Debug)]
pub struct RawTestCase {
    pub id: Option<String>,
    pub input: FieldSource,
    pub expected_output: FieldSource,
}

/// A test case, fully materialized: every field is an owned string, whether
/// it originated inline or from a whitelisted file. Invariant: a `TestCase`
/// is never constructed except via [`resolve`], which enforces the
/// whitelist.
#[derive(Clone, Debug, Serialize)]
pub struct TestCase {
    pub id: String,
    pub input: String,
    pub expected_output: String,
}

/// Resolve a batch of raw test cases into materialized ones, synthesizing
/// `test_{n}` identifiers (1-based) for any that omit one. File references
/// are only honored when their parent directory is within `whitelist`.
pub fn resolve(raw: Vec<RawTestCase>, whitelist: &[PathBuf]) -> Result<Vec<TestCase>> {
    raw.into_iter()
        .enumerate()
        .map(|(index, case)| {
            let id = case.id.unwrap_or_else(|| format!("test_{}", index + 1));
            let input = resolve_field(case.input, whitelist)?;
            let expected_output = resolve_field(case.expected_output, whitelist)?;
            Ok(TestCase { id, input, expected_output })
        })
        .collect()
}

fn resolve_field(field: FieldSource, whitelist: &[PathBuf]) -> Result<String> {
    match field {
        FieldSource::Inline(text) => Ok(text),
        FieldSource::FileRef(path) => {
            if !is_whitelisted(&path, whitelist) {
                return Err(ErrorKind::DisallowedFileReference(path.display().to_string()).into());
            }
            std::fs::read_to_string(&path)
                .map_err(|e| ErrorKind::FileReferenceUnreadable(path.display().to_string(), e.to_string()).into())
        }
    }
}

fn is_whitelisted(path: &Path, whitelist: &[PathBuf]) -> bool {
    let canonical = match path.canonicalize() {
        Ok(p) => p,
        Err(_) => return false,
    };
    whitelist.iter().any(|prefix| {
        let prefix = match prefix.canonicalize() {
            Ok(p) => p,
            Err(_) => return false,
        };
        canonical.starts_with(prefix)
    })
}

/// A fully specified request to judge a program against a set of test
/// cases. The test list is already the one the caller wants executed for
/// this operation (the sample subset for `run-sample`, the full list
/// otherwise) — picking which list applies is the orchestrator's job, not
/// this type's.
#[derive(Clone, Debug)]
pub struct Submission {
    pub language: String,
    pub source: String,
    pub test_cases: Vec<TestCase>,
    pub timeout: Duration,
    pub user_id: Option<String>,
    pub question_id: Option<String>,
}

/// The closed set of per-test verdict statuses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictStatus {
    Passed,
    Failed,
    Tle,
    Mle,
    SyntaxError,
    RuntimeError,
    Error,
}

/// The per-test judging outcome, plus enough of the raw execution record to
/// let a caller understand why.
#[derive(Clone, Debug, Serialize)]
pub struct Verdict {
    pub test_id: String,
    pub status: VerdictStatus,
    pub passed: bool,
    pub exit_code: i32,
    pub wall_ms: u64,
    pub peak_cpu_percent: f64,
    pub peak_rss_bytes: u64,
    pub stdout: String,
    pub stderr: String,
}

impl Verdict {
    /// Construct a verdict, enforcing `passed ⇔ status = passed`.
    pub fn new(
        test_id: String,
        status: VerdictStatus,
        exit_code: i32,
        wall_ms: u64,
        peak_cpu_percent: f64,
        peak_rss_bytes: u64,
        stdout: String,
        stderr: String,
    ) -> Self {
        Verdict {
            test_id,
            passed: status == VerdictStatus::Passed,
            status,
            exit_code,
            wall_ms,
            peak_cpu_percent,
            peak_rss_bytes,
            stdout,
            stderr,
        }
    }
}

/// Integer-counted, two-decimal-rounded summary of a verdict list.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct Summary {
    pub total: u32,
    pub passed: u32,
    pub failed: u32,
    pub all_passed: bool,
    pub pass_percentage: f64,
}

impl Summary {
    pub fn from_verdicts(verdicts: &[Verdict]) -> Self {
        let total = verdicts.len() as u32;
        let passed = verdicts.iter().filter(|v| v.passed).count() as u32;
        let failed = total - passed;
        let pass_percentage = if total == 0 {
            0.0
        } else {
            (passed as f64 / total as f64 * 100.0 * 100.0).round() / 100.0
        };
        Summary {
            total,
            passed,
            failed,
            all_passed: total > 0 && passed == total,
            pass_percentage,
        }
    }
}

/// Metadata attached to every [`ResponseBundle`].
#[derive(Clone, Debug, Serialize)]
pub struct ResponseMetadata {
    pub replica: String,
    pub host: String,
    pub clamped_timeout_secs: u64,
    pub total_wall_ms: u64,
    pub average_cpu_percent: f64,
    pub peak_rss_bytes: u64,
    pub endpoint: String,
    pub test_type: String,
}

/// What a single request reports back to its caller.
#[derive(Clone, Debug, Serialize)]
pub struct ResponseBundle {
    pub execution_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub summary: Summary,
    pub verdicts: Vec<Verdict>,
    pub metadata: ResponseMetadata,
    /// Present only for the `submit` operation.
    pub submission_id: Option<String>,
    /// Present only for the `submit` operation.
    pub saved_to_db: Option<bool>,
}

impl ResponseBundle {
    pub fn metrics_from(verdicts: &[Verdict]) -> (u64, f64, u64) {
        let total_wall_ms = verdicts.iter().map(|v| v.wall_ms).sum();
        let average_cpu_percent = if verdicts.is_empty() {
            0.0
        } else {
            verdicts.iter().map(|v| v.peak_cpu_percent).sum::<f64>() / verdicts.len() as f64
        };
        let peak_rss_bytes = verdicts.iter().map(|v| v.peak_rss_bytes).max().unwrap_or(0);
        (total_wall_ms, average_cpu_percent, peak_rss_bytes)
    }
}

/// What gets handed to the persistence sink for `submit` requests.
#[derive(Clone, Debug, Serialize)]
pub struct PersistenceRecord {
    pub submission_id: String,
    pub user_id: String,
    pub question_id: String,
    pub language: String,
    pub source: String,
    pub verdicts: Vec<Verdict>,
    pub summary: Summary,
    pub execution_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_clamps_to_spec_bounds() {
        assert_eq!(clamp_timeout_secs(Some(0)), Duration::from_secs(1));
        assert_eq!(clamp_timeout_secs(Some(999)), Duration::from_secs(10));
        assert_eq!(clamp_timeout_secs(Some(2)), Duration::from_secs(2));
        assert_eq!(clamp_timeout_secs(None), Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    #[test]
    fn synthesizes_ids_for_unnamed_test_cases() {
        let raw = vec![
            RawTestCase { id: None, input: FieldSource::Inline("1".into()), expected_output: FieldSource::Inline("1".into()) },
            RawTestCase { id: Some("custom".into()), input: FieldSource::Inline("2".into()), expected_output: FieldSource::Inline("2".into()) },
        ];
        let resolved = resolve(raw, &[]).unwrap();
        assert_eq!(resolved[0].id, "test_1");
        assert_eq!(resolved[1].id, "custom");
    }

    #[test]
    fn file_reference_outside_whitelist_is_rejected() {
        let raw = vec![RawTestCase {
            id: None,
            input: FieldSource::FileRef(PathBuf::from("/etc/passwd")),
            expected_output: FieldSource::Inline("x".into()),
        }];
        assert!(resolve(raw, &[PathBuf::from("/var/judge/data")]).is_err());
    }

    #[test]
    fn summary_rounds_pass_percentage_to_two_decimals() {
        let verdicts = vec![
            Verdict::new("t1".into(), VerdictStatus::Passed, 0, 1, 0.0, 0, String::new(), String::new()),
            Verdict::new("t2".into(), VerdictStatus::Passed, 0, 1, 0.0, 0, String::new(), String::new()),
            Verdict::new("t3".into(), VerdictStatus::Failed, 0, 1, 0.0, 0, String::new(), String::new()),
        ];
        let summary = Summary::from_verdicts(&verdicts);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.passed, 2);
        assert_eq!(summary.failed, 1);
        assert!(!summary.all_passed);
        assert!((summary.pass_percentage - 66.67).abs() < 0.01);
    }
}
