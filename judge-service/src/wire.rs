//! Wire-level request/response shapes for the three POST endpoints and the
//! health probe, per `spec.md` §6. Deliberately kept separate from
//! `judge::model`'s request-scoped types: the wire shape is the external
//! contract callers depend on, the model types are this service's and
//! `judge`'s internal working representation.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use judge::model::{FieldSource, RawTestCase};

/// `{id?, input | input_file, expected_output | expected_output_file}`.
#[derive(Debug, Deserialize)]
pub struct WireTestCase {
    pub id: Option<String>,
    pub input: Option<String>,
    pub input_file: Option<String>,
    pub expected_output: Option<String>,
    pub expected_output_file: Option<String>,
}

/// Why a [`WireTestCase`] could not be turned into a [`RawTestCase`]: it
/// named neither or both of a field's inline/file-reference variants.
#[derive(Debug)]
pub enum TestCaseShapeError {
    MissingInput,
    AmbiguousInput,
    MissingExpectedOutput,
    AmbiguousExpectedOutput,
}

impl std::fmt::Display for TestCaseShapeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TestCaseShapeError::MissingInput => write!(f, "test case is missing 'input' or 'input_file'"),
            TestCaseShapeError::AmbiguousInput => write!(f, "test case has both 'input' and 'input_file'"),
            TestCaseShapeError::MissingExpectedOutput => {
                write!(f, "test case is missing 'expected_output' or 'expected_output_file'")
            }
            TestCaseShapeError::AmbiguousExpectedOutput => {
                write!(f, "test case has both 'expected_output' and 'expected_output_file'")
            }
        }
    }
}

impl WireTestCase {
    pub fn into_raw(self) -> Result<RawTestCase, TestCaseShapeError> {
        let input = match (self.input, self.input_file) {
            (Some(text), None) => FieldSource::Inline(text),
            (None, Some(path)) => FieldSource::FileRef(PathBuf::from(path)),
            (None, None) => return Err(TestCaseShapeError::MissingInput),
            (Some(_), Some(_)) => return Err(TestCaseShapeError::AmbiguousInput),
        };
        let expected_output = match (self.expected_output, self.expected_output_file) {
            (Some(text), None) => FieldSource::Inline(text),
            (None, Some(path)) => FieldSource::FileRef(PathBuf::from(path)),
            (None, None) => return Err(TestCaseShapeError::MissingExpectedOutput),
            (Some(_), Some(_)) => return Err(TestCaseShapeError::AmbiguousExpectedOutput),
        };
        Ok(RawTestCase { id: self.id, input, expected_output })
    }
}

// `language`/`code` (and, for `submit`, `user_id`/`question_id`) are
// request-required per `spec.md` §6/§7, but are kept `Option` here rather
// than bare `String`: a body that is valid JSON but simply omits one of
// them is a tier-1 *request-rejection* (400), not a serde data error. Axum
// maps a missing non-`Option` field to `422 Unprocessable Entity`; keeping
// these optional and checking presence in the handler keeps that case a
// `400` instead, per `spec.md` §6 ("400 … on missing required fields").

#[derive(Debug, Deserialize)]
pub struct RunRequest {
    pub language: Option<String>,
    pub code: Option<String>,
    #[serde(default)]
    pub sample_test_cases: Vec<WireTestCase>,
    pub user_id: Option<String>,
    pub question_id: Option<String>,
    pub timeout: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct RunAllRequest {
    pub language: Option<String>,
    pub code: Option<String>,
    #[serde(default)]
    pub test_cases: Vec<WireTestCase>,
    /// Accepted on the wire per `spec.md` §6 but unused by `/runall`.
    #[serde(default)]
    #[allow(dead_code)]
    pub sample_test_cases: Vec<WireTestCase>,
    pub user_id: Option<String>,
    pub question_id: Option<String>,
    pub timeout: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    pub language: Option<String>,
    pub code: Option<String>,
    #[serde(default)]
    pub test_cases: Vec<WireTestCase>,
    pub user_id: Option<String>,
    pub question_id: Option<String>,
    pub timeout: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub replica: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_test_case_converts() {
        let wire = WireTestCase {
            id: Some("t1".into()),
            input: Some("1 2".into()),
            input_file: None,
            expected_output: Some("3".into()),
            expected_output_file: None,
        };
        let raw = wire.into_raw().unwrap();
        assert_eq!(raw.id.as_deref(), Some("t1"));
    }

    #[test]
    fn ambiguous_input_is_rejected() {
        let wire = WireTestCase {
            id: None,
            input: Some("1".into()),
            input_file: Some("/tmp/x".into()),
            expected_output: Some("1".into()),
            expected_output_file: None,
        };
        assert!(matches!(wire.into_raw(), Err(TestCaseShapeError::AmbiguousInput)));
    }

    #[test]
    fn missing_expected_output_is_rejected() {
        let wire = WireTestCase {
            id: None,
            input: Some("1".into()),
            input_file: None,
            expected_output: None,
            expected_output_file: None,
        };
        assert!(matches!(wire.into_raw(), Err(TestCaseShapeError::MissingExpectedOutput)));
    }
}
