//! Component E: the Request Orchestrator. Implements the pipeline shared by
//! all three request shapes: iterate tests **sequentially** invoking the
//! matching language adapter, classify each `ExecutionRecord` into a
//! `Verdict`, then aggregate into a `ResponseBundle`.
//!
//! `run_tests` is synchronous end to end — no `.await` anywhere in it — by
//! design: per `spec.md` §5, the only suspension points in the whole
//! system are inside the Process Supervisor (stdin write, child wait, the
//! 10 ms sampling sleep), none of which are tokio await points. Callers
//! run this function inside `tokio::task::spawn_blocking` so it doesn't
//! stall the async runtime's worker threads.

use std::time::Duration;

use chrono::Utc;
use uuid::Uuid;

use judge::languages::{self, Adapter};
use judge::model::{
    PersistenceRecord, ResponseBundle, ResponseMetadata, Submission, Summary, TestCase, Verdict,
    VerdictStatus,
};
use judge::validator;
use judge::verdict::classify;

use crate::error::AppError;

/// Validate `source` against the Static Validator (Component D). The first
/// stage of the shared pipeline; a rejection here is a tier-1
/// request-rejection and never reaches execution.
pub fn validate_source(source: &str, language: &str) -> Result<(), AppError> {
    validator::validate(source, language).map_err(|rejection| AppError::Validation(rejection.to_string()))
}

/// Look up the adapter for `language`, turning an unknown tag into a
/// tier-1 request-rejection per `spec.md` §4.E / §9.
pub fn require_adapter(language: &str) -> Result<&'static dyn Adapter, AppError> {
    languages::adapter_for(language)
        .ok_or_else(|| AppError::Validation(format!("unknown language tag: '{}'", language)))
}

/// Run every test case in `submission.test_cases`, in input order, against
/// the adapter for `submission.language`. Never fails the whole request for
/// a single test's fault (tier 3): an adapter-internal error becomes a
/// single `error` verdict and the loop continues.
pub fn run_tests(submission: &Submission) -> Result<Vec<Verdict>, AppError> {
    let adapter = require_adapter(&submission.language)?;
    let limits = adapter.resource_limits();

    let verdicts = submission
        .test_cases
        .iter()
        .map(|test| run_one_test(adapter, &submission.source, test, submission.timeout, limits.address_space_bytes))
        .collect();

    Ok(verdicts)
}

fn run_one_test(
    adapter: &dyn Adapter,
    source: &str,
    test: &TestCase,
    timeout: Duration,
    address_space_cap_bytes: u64,
) -> Verdict {
    match adapter.run(source, test.input.as_bytes(), timeout) {
        Ok(record) => {
            let status = classify(&record, timeout, &test.expected_output, address_space_cap_bytes);
            Verdict::new(
                test.id.clone(),
                status,
                record.exit_code,
                record.wall_time.as_millis() as u64,
                record.peak_cpu_percent,
                record.peak_rss_bytes,
                String::from_utf8_lossy(&record.stdout).into_owned(),
                String::from_utf8_lossy(&record.stderr).into_owned(),
            )
        }
        Err(err) => {
            log::warn!("adapter fault on test '{}' ({}): {}", test.id, adapter.tag(), err);
            Verdict::new(
                test.id.clone(),
                VerdictStatus::Error,
                -1,
                0,
                0.0,
                0,
                String::new(),
                format!("judge error: {}", err),
            )
        }
    }
}

/// Assemble the `ResponseBundle` shared by all three operations. `submit`
/// fills in `submission_id`/`saved_to_db` afterwards. `endpoint` is the
/// route tag (`"run"`/`"runall"`/`"submit"`); `test_type` is `"sample"` for
/// `/run` and `"all"` for `/runall` and `/submit`, per `spec.md` §6.
pub fn build_response(
    verdicts: Vec<Verdict>,
    timeout: Duration,
    endpoint: &str,
    test_type: &str,
    replica: &str,
    host: &str,
) -> ResponseBundle {
    let summary = Summary::from_verdicts(&verdicts);
    let (total_wall_ms, average_cpu_percent, peak_rss_bytes) = ResponseBundle::metrics_from(&verdicts);

    ResponseBundle {
        execution_id: Uuid::new_v4(),
        timestamp: Utc::now(),
        summary,
        verdicts,
        metadata: ResponseMetadata {
            replica: replica.to_string(),
            host: host.to_string(),
            clamped_timeout_secs: timeout.as_secs(),
            total_wall_ms,
            average_cpu_percent,
            peak_rss_bytes,
            endpoint: endpoint.to_string(),
            test_type: test_type.to_string(),
        },
        submission_id: None,
        saved_to_db: None,
    }
}

/// Build the record handed to the persistence sink for `submit` requests.
pub fn build_persistence_record(
    submission_id: String,
    submission: &Submission,
    verdicts: &[Verdict],
    execution_id: Uuid,
) -> PersistenceRecord {
    PersistenceRecord {
        submission_id,
        user_id: submission.user_id.clone().unwrap_or_default(),
        question_id: submission.question_id.clone().unwrap_or_default(),
        language: submission.language.clone(),
        source: submission.source.clone(),
        verdicts: verdicts.to_vec(),
        summary: Summary::from_verdicts(verdicts),
        execution_id,
        created_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_language_is_a_validation_error() {
        assert!(matches!(require_adapter("brainfuck"), Err(AppError::Validation(_))));
    }

    #[test]
    fn known_language_resolves() {
        assert!(require_adapter("python").is_ok());
    }
}
