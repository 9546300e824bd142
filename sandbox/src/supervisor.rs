//! Component B: the Process Supervisor.
//!
//! Spawns a single child, wires the Resource Limiter into its `pre_exec`
//! hook, feeds it stdin, captures bounded stdout/stderr, and hands the wait
//! loop off to [`crate::daemon::supervise`]. Produces a normalized
//! [`ExecutionRecord`] regardless of how the child ended.

use std::io::{Read, Write};
use std::os::unix::process::CommandExt;
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use nix::unistd::Pid;

use crate::daemon::{self, ChildOutcome};
use crate::limiter::ResourceLimits;
use crate::{ErrorKind, Result};

/// Ceiling on how much of a stream we retain, in bytes. Excess bytes are
/// discarded but still drained from the pipe so the child never blocks on a
/// full buffer.
pub const MAX_CAPTURED_BYTES: usize = 8 * 1024 * 1024;

/// Exit code reported when the wall-clock timeout fires, matching common
/// shell convention for a killed process.
pub const TIMEOUT_EXIT_CODE: i32 = 124;

/// A single program to run under supervision.
pub struct SupervisedCommand {
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: std::path::PathBuf,
    pub env: Vec<(String, String)>,
    pub stdin: Vec<u8>,
    pub timeout: Duration,
    pub limits: ResourceLimits,
}

/// The normalized outcome of running one [`SupervisedCommand`] to
/// completion (or to a timeout).
#[derive(Clone, Debug)]
pub struct ExecutionRecord {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub exit_code: i32,
    pub timed_out: bool,
    pub wall_time: Duration,
    pub peak_cpu_percent: f64,
    pub peak_rss_bytes: u64,
}

fn drain_bounded(mut reader: impl Read) -> Vec<u8> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 64 * 1024];
    loop {
        match reader.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => {
                if buf.len() < MAX_CAPTURED_BYTES {
                    let take = n.min(MAX_CAPTURED_BYTES - buf.len());
                    buf.extend_from_slice(&chunk[..take]);
                }
            }
            Err(_) => break,
        }
    }
    buf
}

/// Run `cmd` to completion under supervision. Never returns an `Err` for
/// things the child itself did (non-zero exit, crash, timeout) — those are
/// all represented in the returned [`ExecutionRecord`]. Only failures to
/// spawn the child at all are surfaced as an `Err`.
pub fn run(cmd: SupervisedCommand) -> Result<ExecutionRecord> {
    let limits = cmd.limits;

    let mut command = Command::new(&cmd.program);
    command
        .args(&cmd.args)
        .current_dir(&cmd.working_dir)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    command.env_clear();
    for (k, v) in &cmd.env {
        command.env(k, v);
    }

    unsafe {
        command.pre_exec(move || {
            limits.apply();
            Ok(())
        });
    }

    let mut child = command
        .spawn()
        .map_err(|e| ErrorKind::Spawn(cmd.program.clone(), e.to_string()))?;

    let pid = Pid::from_raw(child.id() as i32);

    let mut stdin = child.stdin.take();
    let stdin_bytes = cmd.stdin;
    let stdin_thread = std::thread::spawn(move || {
        if let Some(mut handle) = stdin.take() {
            // A child that never reads stdin (or exits early) will make this
            // write fail with a broken pipe; that's an expected outcome, not
            // a supervisor bug.
            let _ = handle.write_all(&stdin_bytes);
        }
    });

    let stdout_pipe = child.stdout.take();
    let stdout_thread = std::thread::spawn(move || drain_bounded(stdout_pipe.unwrap()));

    let stderr_pipe = child.stderr.take();
    let stderr_thread = std::thread::spawn(move || drain_bounded(stderr_pipe.unwrap()));

    let result = daemon::supervise(pid, cmd.timeout);

    let _ = stdin_thread.join();
    let stdout = stdout_thread.join().unwrap_or_default();
    let stderr = stderr_thread.join().unwrap_or_default();

    let (exit_code, timed_out) = match result.outcome {
        ChildOutcome::Exited(code) => (code, false),
        ChildOutcome::Signaled(sig) => (128 + sig as i32, false),
        ChildOutcome::TimedOut => (TIMEOUT_EXIT_CODE, true),
    };

    let stderr = if timed_out {
        let mut augmented = stderr;
        if !augmented.is_empty() {
            augmented.push(b'\n');
        }
        augmented.extend_from_slice(b"Time Limit Exceeded");
        augmented
    } else {
        stderr
    };

    Ok(ExecutionRecord {
        stdout,
        stderr,
        exit_code,
        timed_out,
        wall_time: result.wall_time,
        peak_cpu_percent: result.peaks.peak_cpu_percent,
        peak_rss_bytes: result.peaks.peak_rss_bytes,
    })
}

/// Create a private scratch directory for one execution, mode `0700`.
pub fn prepare_sandbox_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path)
        .map_err(|e| ErrorKind::Spawn(path.display().to_string(), e.to_string()))?;
    let mut perms = std::fs::metadata(path)
        .map_err(|e| ErrorKind::Spawn(path.display().to_string(), e.to_string()))?
        .permissions();
    std::os::unix::fs::PermissionsExt::set_mode(&mut perms, 0o700);
    std::fs::set_permissions(path, perms)
        .map_err(|e| ErrorKind::Spawn(path.display().to_string(), e.to_string()))?;
    Ok(())
}

// Kept for parity with the teacher's `ProcessBuilder`, which exposed a
// shared `Arc<Mutex<_>>` handle to in-flight executions; unused internally
// but a natural extension point for future concurrent-execution metrics.
#[allow(dead_code)]
type SharedOutcome = Arc<Mutex<Option<ExecutionRecord>>>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::limiter::ResourceLimits;
    use std::os::unix::fs::PermissionsExt;

    fn run_echo(stdin: &[u8], args: Vec<String>, timeout: Duration) -> ExecutionRecord {
        let dir = tempfile::tempdir().unwrap();
        run(SupervisedCommand {
            program: "/bin/cat".to_string(),
            args,
            working_dir: dir.path().to_path_buf(),
            env: vec![],
            stdin: stdin.to_vec(),
            timeout,
            limits: ResourceLimits::default(),
        })
        .unwrap()
    }

    #[test]
    fn captures_stdout_from_cat() {
        let record = run_echo(b"hello world", vec![], Duration::from_secs(5));
        assert_eq!(record.exit_code, 0);
        assert!(!record.timed_out);
        assert_eq!(record.stdout, b"hello world");
    }

    #[test]
    fn wall_clock_timeout_kills_and_marks_124() {
        let dir = tempfile::tempdir().unwrap();
        let record = run(SupervisedCommand {
            program: "/bin/sleep".to_string(),
            args: vec!["5".to_string()],
            working_dir: dir.path().to_path_buf(),
            env: vec![],
            stdin: vec![],
            timeout: Duration::from_millis(100),
            limits: ResourceLimits::default(),
        })
        .unwrap();
        assert!(record.timed_out);
        assert_eq!(record.exit_code, TIMEOUT_EXIT_CODE);
        assert!(record.stderr.ends_with(b"Time Limit Exceeded"));
    }

    #[test]
    fn sandbox_dir_is_created_with_owner_only_perms() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("case-1");
        prepare_sandbox_dir(&target).unwrap();
        let mode = std::fs::metadata(&target).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o700);
    }
}
