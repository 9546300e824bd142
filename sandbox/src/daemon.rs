//! The sampling / wait loop at the heart of the Process Supervisor.
//!
//! This mirrors the teacher's daemon-thread design (a loop alternating
//! `waitpid(WNOHANG)` with a resource-usage snapshot, sleeping 10 ms between
//! iterations) but samples *instantaneous* CPU percent in addition to the
//! teacher's monotonic peak tracking, since `spec.md` requires both a peak
//! CPU percent and a peak RSS per execution.

use std::time::{Duration, Instant};

use nix::sys::signal::{self, Signal};
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::Pid;

use crate::misc::duration_from_ticks;

/// Cadence at which the child is polled for resource usage and liveness.
pub const SAMPLE_INTERVAL: Duration = Duration::from_millis(10);

/// How the supervised child eventually stopped.
#[derive(Clone, Copy, Debug)]
pub enum ChildOutcome {
    /// Exited on its own, with the given exit code.
    Exited(i32),
    /// Killed by the delivery of a signal.
    Signaled(Signal),
    /// The wall-clock timeout fired; the child was terminated by the
    /// supervisor.
    TimedOut,
}

/// Resource usage peaks observed across the lifetime of a supervised child.
#[derive(Clone, Copy, Debug, Default)]
pub struct UsagePeaks {
    pub peak_cpu_percent: f64,
    pub peak_rss_bytes: u64,
}

/// Result of supervising a single child to completion.
pub struct SupervisionResult {
    pub outcome: ChildOutcome,
    pub peaks: UsagePeaks,
    pub wall_time: Duration,
}

/// One CPU-time/wall-time snapshot, used to compute instantaneous CPU%.
struct Sample {
    cpu_time: Duration,
    at: Instant,
}

fn read_usage(pid: Pid) -> Option<(Duration, u64)> {
    let proc = procfs::process::Process::new(pid.as_raw()).ok()?;
    let stat = proc.stat().ok()?;
    let cpu_time = duration_from_ticks(stat.utime + stat.stime);
    let page_size = procfs::page_size();
    let rss_bytes = (stat.rss as u64).saturating_mul(page_size);
    Some((cpu_time, rss_bytes))
}

/// Poll `pid` at [`SAMPLE_INTERVAL`] cadence, track CPU%/RSS peaks, and
/// enforce `timeout`. Blocks the calling thread until the child exits or is
/// killed by the timeout; never leaves a zombie behind on any exit path.
pub fn supervise(pid: Pid, timeout: Duration) -> SupervisionResult {
    let start = Instant::now();
    let mut peaks = UsagePeaks::default();
    let mut last_sample: Option<Sample> = None;
    let mut timed_out = false;

    loop {
        match waitpid(pid, Some(WaitPidFlag::WNOHANG)) {
            Ok(WaitStatus::Exited(_, code)) => {
                return SupervisionResult {
                    outcome: ChildOutcome::Exited(code),
                    peaks,
                    wall_time: start.elapsed(),
                };
            }
            Ok(WaitStatus::Signaled(_, sig, _)) => {
                return SupervisionResult {
                    outcome: ChildOutcome::Signaled(sig),
                    peaks,
                    wall_time: start.elapsed(),
                };
            }
            Ok(WaitStatus::StillAlive) | Ok(_) => {
                // Fall through to sampling below.
            }
            Err(nix::errno::Errno::ECHILD) => {
                // The child has already been reaped by someone else (should
                // not happen in practice, but sampling is best-effort).
                return SupervisionResult {
                    outcome: ChildOutcome::Exited(-1),
                    peaks,
                    wall_time: start.elapsed(),
                };
            }
            Err(e) => {
                log::warn!("waitpid({}) failed: {}", pid, e);
            }
        }

        if let Some((cpu_time, rss_bytes)) = read_usage(pid) {
            if let Some(last) = &last_sample {
                let delta_wall = last.at.elapsed();
                if delta_wall > Duration::ZERO {
                    let delta_cpu = cpu_time.saturating_sub(last.cpu_time);
                    let cpu_pct = delta_cpu.as_secs_f64() / delta_wall.as_secs_f64() * 100.0;
                    if cpu_pct > peaks.peak_cpu_percent {
                        peaks.peak_cpu_percent = cpu_pct;
                    }
                }
            }
            if rss_bytes > peaks.peak_rss_bytes {
                peaks.peak_rss_bytes = rss_bytes;
            }
            last_sample = Some(Sample { cpu_time, at: Instant::now() });
        }

        if !timed_out && start.elapsed() >= timeout {
            timed_out = true;
            terminate(pid);
        }

        std::thread::sleep(SAMPLE_INTERVAL);

        if timed_out {
            // Give the signal a moment to land, then force-reap.
            match waitpid(pid, None) {
                Ok(_) => {
                    return SupervisionResult {
                        outcome: ChildOutcome::TimedOut,
                        peaks,
                        wall_time: start.elapsed(),
                    };
                }
                Err(e) => {
                    log::warn!("blocking waitpid after timeout kill failed: {}", e);
                    return SupervisionResult {
                        outcome: ChildOutcome::TimedOut,
                        peaks,
                        wall_time: start.elapsed(),
                    };
                }
            }
        }
    }
}

/// Gracefully-then-forcefully terminate the child: SIGTERM, then SIGKILL if
/// it hasn't died shortly after.
fn terminate(pid: Pid) {
    if signal::kill(pid, Signal::SIGTERM).is_err() {
        return;
    }
    std::thread::sleep(Duration::from_millis(50));
    match waitpid(pid, Some(WaitPidFlag::WNOHANG)) {
        Ok(WaitStatus::StillAlive) => {
            let _ = signal::kill(pid, Signal::SIGKILL);
        }
        _ => {}
    }
}
