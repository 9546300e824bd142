//! Smoke tests driving the Axum `Router` in-process, without binding a real
//! socket (`tower::ServiceExt::oneshot`). Encodes the scenarios catalogued
//! in `spec.md` §8 as requests to `/run`, `/runall`, `/health`.
//!
//! These spawn the real language toolchains (`python3`, `g++`, ...) the
//! same way the sandbox crate's own tests spawn `/bin/cat`/`/bin/sleep`:
//! they assume a POSIX host with those interpreters/compilers on `PATH`.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use judge_service::config::AppConfig;
use judge_service::routes::{self, AppState};

fn test_app() -> axum::Router {
    let config = AppConfig {
        port: 0,
        database_url: None,
        replica_name: "test-replica".to_string(),
        hostname: "test-host".to_string(),
    };
    routes::router(AppState { config: Arc::new(config), persistence: None })
}

async fn post_json(app: axum::Router, path: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(path)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn health_reports_replica() {
    let app = test_app();
    let request = Request::builder().method("GET").uri("/health").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["replica"], "test-replica");
}

#[tokio::test]
async fn run_python_addition_passes() {
    let app = test_app();
    let body = json!({
        "language": "python",
        "code": "print(int(input())+int(input()))",
        "sample_test_cases": [
            { "input": "2\n3", "expected_output": "5" }
        ]
    });
    let (status, json) = post_json(app, "/run", body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["summary"]["total"], 1);
    assert_eq!(json["verdicts"][0]["status"], "passed");
    assert_eq!(json["metadata"]["endpoint"], "run");
    assert_eq!(json["metadata"]["test_type"], "sample");
}

#[tokio::test]
async fn run_python_wrong_output_fails() {
    let app = test_app();
    let body = json!({
        "language": "python",
        "code": "print('1')",
        "sample_test_cases": [ { "input": "", "expected_output": "2" } ]
    });
    let (status, json) = post_json(app, "/run", body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["verdicts"][0]["status"], "failed");
    assert_eq!(json["verdicts"][0]["passed"], false);
}

#[tokio::test]
async fn run_python_syntax_error() {
    let app = test_app();
    let body = json!({
        "language": "python",
        "code": "print(",
        "sample_test_cases": [ { "input": "", "expected_output": "" } ]
    });
    let (status, json) = post_json(app, "/run", body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["verdicts"][0]["status"], "syntax_error");
}

#[tokio::test]
async fn run_python_timeout_is_tle() {
    let app = test_app();
    let body = json!({
        "language": "python",
        "code": "while True: pass",
        "sample_test_cases": [ { "input": "", "expected_output": "" } ],
        "timeout": 1
    });
    let (status, json) = post_json(app, "/run", body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["verdicts"][0]["status"], "tle");
}

#[tokio::test]
async fn empty_source_is_rejected() {
    let app = test_app();
    let body = json!({
        "language": "python",
        "code": "",
        "sample_test_cases": [ { "input": "", "expected_output": "" } ]
    });
    let (status, _json) = post_json(app, "/run", body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn empty_test_case_list_is_rejected() {
    let app = test_app();
    let body = json!({
        "language": "python",
        "code": "print('hi')",
        "sample_test_cases": []
    });
    let (status, _json) = post_json(app, "/run", body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_language_is_rejected() {
    let app = test_app();
    let body = json!({
        "language": "brainfuck",
        "code": "++++",
        "sample_test_cases": [ { "input": "", "expected_output": "" } ]
    });
    let (status, _json) = post_json(app, "/run", body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn submit_without_user_id_is_rejected() {
    let app = test_app();
    let request = Request::builder()
        .method("POST")
        .uri("/submit")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({
                "language": "python",
                "code": "print('hi')",
                "test_cases": [ { "input": "", "expected_output": "hi" } ],
                "user_id": "",
                "question_id": "q1"
            })
            .to_string(),
        ))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn submit_without_persistence_reports_not_saved() {
    let app = test_app();
    let body = json!({
        "language": "python",
        "code": "print(int(input())+int(input()))",
        "test_cases": [ { "input": "2\n3", "expected_output": "5" } ],
        "user_id": "u1",
        "question_id": "q1"
    });
    let (status, json) = post_json(app, "/submit", body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["saved_to_db"], false);
    assert!(json["submission_id"].is_string());
    assert_eq!(json["metadata"]["endpoint"], "submit");
    assert_eq!(json["metadata"]["test_type"], "all");
}

#[tokio::test]
async fn runall_reports_all_test_type() {
    let app = test_app();
    let body = json!({
        "language": "python",
        "code": "print(int(input())+int(input()))",
        "test_cases": [ { "input": "2\n3", "expected_output": "5" } ]
    });
    let (status, json) = post_json(app, "/runall", body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["metadata"]["endpoint"], "runall");
    assert_eq!(json["metadata"]["test_type"], "all");
}

#[tokio::test]
async fn run_with_missing_language_field_is_400_not_422() {
    let app = test_app();
    let body = json!({
        "code": "print('hi')",
        "sample_test_cases": [ { "input": "", "expected_output": "hi" } ]
    });
    let (status, _json) = post_json(app, "/run", body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn run_with_missing_code_field_is_400_not_422() {
    let app = test_app();
    let body = json!({
        "language": "python",
        "sample_test_cases": [ { "input": "", "expected_output": "hi" } ]
    });
    let (status, _json) = post_json(app, "/run", body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn submit_with_missing_question_id_field_is_400_not_422() {
    let app = test_app();
    let body = json!({
        "language": "python",
        "code": "print('hi')",
        "test_cases": [ { "input": "", "expected_output": "hi" } ],
        "user_id": "u1"
    });
    let (status, _json) = post_json(app, "/submit", body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
