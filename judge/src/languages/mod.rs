//! Component C: Language Adapters.
//!
//! The set of adapters is closed at build time: a fixed lookup table from
//! language tag to `Adapter`, not a runtime plugin registry. Each adapter is
//! a thin specialization that reduces a source string and stdin bytes to
//! one (or, for compiled languages, effectively one — the compile record is
//! only surfaced on failure) `ExecutionRecord`, reusing the Resource Limiter
//! and Process Supervisor underneath.

pub mod cpp;
pub mod csharp;
pub mod java;
pub mod javascript;
pub mod python;

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use sandbox::supervisor::{self, SupervisedCommand};
use sandbox::{ExecutionRecord, ResourceLimits};

/// The closed set of language tags the orchestrator will dispatch to.
pub const LANGUAGE_TAGS: &[&str] = &["python", "javascript", "java", "cpp", "csharp"];

/// A language tag as it appears on the wire.
pub type LanguageTag = &'static str;

/// The capability set every language adapter implements: validate lives in
/// [`crate::validator`] (language-tagged but adapter-agnostic), `prepare`
/// is folded into `run`'s sandbox-directory setup, and `invoke` is `run`
/// itself.
pub trait Adapter: Sync + Send {
    /// The tag this adapter answers to.
    fn tag(&self) -> LanguageTag;

    /// Resource limits to apply to this adapter's child process. Most
    /// adapters use the sandbox crate's defaults; toolchains with native
    /// thread pools (the JVM) or larger footprints override this.
    fn resource_limits(&self) -> ResourceLimits {
        ResourceLimits::default()
    }

    /// Compile (if applicable) and run `source` against `stdin`, within
    /// `timeout`. Never returns `Err` for anything the submitted program
    /// itself did — only for sandbox-directory or spawn-level faults.
    fn run(&self, source: &str, stdin: &[u8], timeout: Duration) -> sandbox::Result<ExecutionRecord>;
}

/// Look up the adapter for `tag`, if any. Unknown tags return `None`, which
/// the orchestrator turns into a request-rejection per `spec.md` §4.E.
pub fn adapter_for(tag: &str) -> Option<&'static dyn Adapter> {
    match tag {
        "python" => Some(&python::PythonAdapter),
        "javascript" => Some(&javascript::JavaScriptAdapter),
        "java" => Some(&java::JavaAdapter),
        "cpp" => Some(&cpp::CppAdapter),
        "csharp" => Some(&csharp::CSharpAdapter),
        _ => None,
    }
}

/// A per-invocation scratch directory, owner-only permissions, removed
/// unconditionally when dropped — success or failure.
pub struct SandboxDir {
    path: PathBuf,
}

impl SandboxDir {
    pub fn new() -> std::io::Result<Self> {
        let path = std::env::temp_dir().join(format!("judge-sandbox-{}", uuid::Uuid::new_v4()));
        supervisor::prepare_sandbox_dir(&path)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
        Ok(SandboxDir { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for SandboxDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}

/// Run a compile step followed by a run step, sharing `total_timeout`
/// across both (per `spec.md` §4.C / §9: compile time counts toward the
/// per-test budget). A non-zero compile exit short-circuits: the compile's
/// own `ExecutionRecord` is returned as the test's result, but per
/// `spec.md` §4.C ("a compile failure yields a single ExecutionRecord with
/// non-zero exit, the compiler's stderr, and zero measured CPU/RSS") its
/// CPU/RSS peaks are zeroed — they describe the compiler's own resource
/// use, not the submitted program's, and must not be classified against
/// the run step's MLE threshold.
pub fn compile_then_run(
    compile: SupervisedCommand,
    make_run: impl FnOnce(Duration) -> SupervisedCommand,
    total_timeout: Duration,
) -> sandbox::Result<ExecutionRecord> {
    let started = Instant::now();
    let compile_record = supervisor::run(compile)?;
    if compile_record.exit_code != 0 {
        return Ok(zero_resource_usage(compile_record));
    }
    let remaining = total_timeout
        .checked_sub(started.elapsed())
        .unwrap_or(Duration::from_millis(1))
        .max(Duration::from_millis(1));
    supervisor::run(make_run(remaining))
}

/// Zero out the CPU/RSS peaks on a short-circuited compile-failure record,
/// per `spec.md` §4.C.
fn zero_resource_usage(record: ExecutionRecord) -> ExecutionRecord {
    ExecutionRecord { peak_cpu_percent: 0.0, peak_rss_bytes: 0, ..record }
}

/// Build the scrubbed environment every adapter starts from: just `PATH`,
/// restricted to common toolchain install locations.
pub fn restricted_path_env() -> Vec<(String, String)> {
    vec![("PATH".to_string(), "/usr/local/bin:/usr/bin:/bin".to_string())]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sandbox_dir_is_owner_only_and_removed_on_drop() {
        let path = {
            let dir = SandboxDir::new().unwrap();
            let mode = std::fs::metadata(dir.path()).unwrap().permissions();
            assert_eq!(std::os::unix::fs::PermissionsExt::mode(&mode) & 0o777, 0o700);
            dir.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn adapter_for_resolves_every_closed_language_tag() {
        for tag in LANGUAGE_TAGS {
            assert!(adapter_for(tag).is_some(), "missing adapter for '{}'", tag);
        }
        assert!(adapter_for("brainfuck").is_none());
    }

    #[test]
    fn zero_resource_usage_clears_cpu_and_rss_but_keeps_the_rest() {
        let record = ExecutionRecord {
            stdout: Vec::new(),
            stderr: b"main.cpp:1:1: error: expected ';'".to_vec(),
            exit_code: 1,
            timed_out: false,
            wall_time: Duration::from_millis(250),
            peak_cpu_percent: 37.5,
            peak_rss_bytes: 512 * 1024 * 1024,
        };
        let zeroed = zero_resource_usage(record);
        assert_eq!(zeroed.peak_cpu_percent, 0.0);
        assert_eq!(zeroed.peak_rss_bytes, 0);
        assert_eq!(zeroed.exit_code, 1);
        assert_eq!(zeroed.wall_time, Duration::from_millis(250));
        assert!(String::from_utf8_lossy(&zeroed.stderr).contains("expected ';'"));
    }
}
