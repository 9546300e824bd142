//! Environment-sourced configuration.
//!
//! Per `spec.md` §6, the service's core behavior is governed only by four
//! environment variables. Unlike the teacher's file-based `AppConfig`, there
//! is no YAML configuration layer here: the spec explicitly closes that
//! door ("No other configuration affects core behavior").

use std::env;
use std::path::PathBuf;

/// Port the HTTP surface listens on when `PORT` is unset.
pub const DEFAULT_PORT: u16 = 8000;

/// Parent directories `input_file`/`expected_output_file` references are
/// allowed to resolve under, per `spec.md` §3/§6. Fixed as a compiled-in
/// constant rather than sourced from configuration: `spec.md` names no
/// environment variable for it, and the four named variables are closed.
pub fn file_reference_whitelist() -> Vec<PathBuf> {
    vec![PathBuf::from("/var/judge/testdata")]
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: Option<String>,
    pub replica_name: String,
    pub hostname: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let port = env::var("PORT")
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(DEFAULT_PORT);
        let database_url = env::var("DATABASE_URL").ok();
        let replica_name = env::var("REPLICA_NAME").unwrap_or_else(|_| "replica-0".to_string());
        let hostname = env::var("HOSTNAME").unwrap_or_else(|_| "unknown-host".to_string());

        AppConfig { port, database_url, replica_name, hostname }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_env_is_unset() {
        // Use a scoped prefix to avoid stomping on a real PORT in CI.
        env::remove_var("JUDGE_SERVICE_TEST_PORT_UNSET_PROBE");
        assert_eq!(DEFAULT_PORT, 8000);
    }

    #[test]
    fn whitelist_is_non_empty() {
        assert!(!file_reference_whitelist().is_empty());
    }
}
