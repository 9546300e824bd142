//! The HTTP surface: three POST endpoints and one GET health probe, per
//! `spec.md` §6. Each POST handler runs the shared Request Orchestrator
//! pipeline (`crate::orchestrator`) and differs only in which test list it
//! executes, whether it persists, and the `endpoint`/`test_type` tags
//! stamped onto the response metadata.

use std::env;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use judge::model::{clamp_timeout_secs, resolve, RawTestCase, ResponseBundle, Submission};

use crate::config::{file_reference_whitelist, AppConfig};
use crate::error::AppError;
use crate::orchestrator;
use crate::persistence::PersistenceSink;
use crate::wire::{HealthResponse, RunAllRequest, RunRequest, SubmitRequest, WireTestCase};

/// Service version reported by `/health`, pinned to the crate version.
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub persistence: Option<Arc<PersistenceSink>>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/run", post(run))
        .route("/runall", post(runall))
        .route("/submit", post(submit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse { status: "healthy", version: VERSION, replica: state.config.replica_name.clone() })
}

fn into_raw_test_cases(wire: Vec<WireTestCase>) -> Result<Vec<RawTestCase>, AppError> {
    wire.into_iter()
        .map(|tc| tc.into_raw().map_err(|e| AppError::Validation(e.to_string())))
        .collect()
}

/// Pull a request-required field out of its wire `Option`, turning an
/// absent value into a tier-1 request-rejection (400) rather than the 422
/// a non-`Option` field would get from serde. See the comment above the
/// wire DTOs in `crate::wire`. `code` is deliberately not trimmed here: an
/// all-whitespace source is not "missing", and whether it is rejected is
/// the Static Validator's call (`spec.md` §4.D's byte-level empty check).
fn require_field(value: Option<String>, name: &str) -> Result<String, AppError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(AppError::Validation(format!("missing required field: '{}'", name))),
    }
}

/// Same as [`require_field`], but also rejects whitespace-only values —
/// appropriate for identifiers (`language`, `user_id`, `question_id`)
/// where blank-but-present is as meaningless as absent.
fn require_nonblank_field(value: Option<String>, name: &str) -> Result<String, AppError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(AppError::Validation(format!("missing required field: '{}'", name))),
    }
}

/// Shared pipeline body: validate -> resolve test cases -> build Submission
/// -> run tests -> build response. `spec.md` §4.E's sequencing, factored out
/// of the three thin handlers below. `endpoint` is the route tag, `test_type`
/// is `"sample"` for `/run` and `"all"` for `/runall`/`/submit`.
async fn execute(
    state: &AppState,
    language: String,
    code: String,
    raw_test_cases: Vec<WireTestCase>,
    user_id: Option<String>,
    question_id: Option<String>,
    timeout: Option<u64>,
    endpoint: &'static str,
    test_type: &'static str,
) -> Result<ResponseBundle, AppError> {
    orchestrator::require_adapter(&language)?;
    orchestrator::validate_source(&code, &language)?;

    if raw_test_cases.is_empty() {
        return Err(AppError::Validation("at least one test case is required".to_string()));
    }

    let raw = into_raw_test_cases(raw_test_cases)?;
    let whitelist = file_reference_whitelist();
    let test_cases = resolve(raw, &whitelist)?;

    let clamped_timeout = clamp_timeout_secs(timeout);
    let submission = Submission { language, source: code, test_cases, timeout: clamped_timeout, user_id, question_id };

    let verdicts = {
        let submission = submission.clone();
        tokio::task::spawn_blocking(move || orchestrator::run_tests(&submission))
            .await
            .map_err(|e| AppError::internal("judging task panicked", e))??
    };

    Ok(orchestrator::build_response(
        verdicts,
        clamped_timeout,
        endpoint,
        test_type,
        &state.config.replica_name,
        &state.config.hostname,
    ))
}

async fn run(State(state): State<AppState>, Json(req): Json<RunRequest>) -> Result<Json<ResponseBundle>, AppError> {
    let language = require_nonblank_field(req.language, "language")?;
    let code = require_field(req.code, "code")?;
    let bundle = execute(
        &state,
        language,
        code,
        req.sample_test_cases,
        req.user_id,
        req.question_id,
        req.timeout,
        "run",
        "sample",
    )
    .await?;
    Ok(Json(bundle))
}

async fn runall(State(state): State<AppState>, Json(req): Json<RunAllRequest>) -> Result<Json<ResponseBundle>, AppError> {
    let language = require_nonblank_field(req.language, "language")?;
    let code = require_field(req.code, "code")?;
    let bundle = execute(
        &state,
        language,
        code,
        req.test_cases,
        req.user_id,
        req.question_id,
        req.timeout,
        "runall",
        "all",
    )
    .await?;
    Ok(Json(bundle))
}

async fn submit(State(state): State<AppState>, Json(req): Json<SubmitRequest>) -> Result<Json<ResponseBundle>, AppError> {
    let language = require_nonblank_field(req.language, "language")?;
    let code = require_field(req.code, "code")?;
    let user_id = require_nonblank_field(req.user_id, "user_id")?;
    let question_id = require_nonblank_field(req.question_id, "question_id")?;

    let mut bundle = execute(
        &state,
        language.clone(),
        code.clone(),
        req.test_cases,
        Some(user_id.clone()),
        Some(question_id.clone()),
        req.timeout,
        "submit",
        "all",
    )
    .await?;

    let submission_id = Uuid::new_v4().to_string();
    bundle.submission_id = Some(submission_id.clone());

    let saved = match &state.persistence {
        Some(sink) => {
            let submission = Submission {
                language,
                source: code,
                test_cases: Vec::new(),
                timeout: Duration::from_secs(bundle.metadata.clamped_timeout_secs),
                user_id: Some(user_id),
                question_id: Some(question_id),
            };
            let record = orchestrator::build_persistence_record(
                submission_id,
                &submission,
                &bundle.verdicts,
                bundle.execution_id,
            );
            match sink.persist(&record).await {
                Ok(()) => true,
                Err(e) => {
                    log::warn!("persistence failed for submission {}: {}", record.submission_id, e);
                    false
                }
            }
        }
        None => {
            log::warn!("no persistence sink configured; submission {} was judged but not saved", bundle.submission_id.as_deref().unwrap_or(""));
            false
        }
    };
    bundle.saved_to_db = Some(saved);

    Ok(Json(bundle))
}
