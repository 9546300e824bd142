//! Miscellaneous helpers shared by the supervisor and its sampling daemon.

use std::time::Duration;

/// Number of clock ticks per second, as reported by `sysconf(_SC_CLK_TCK)`.
/// Falls back to the POSIX-mandated 100 on failure.
pub fn clock_ticks_per_sec() -> i64 {
    const FALLBACK: i64 = 100;
    let ret = unsafe { libc::sysconf(libc::_SC_CLK_TCK) };
    if ret <= 0 {
        log::warn!("sysconf(_SC_CLK_TCK) failed, falling back to {} ticks/sec", FALLBACK);
        FALLBACK
    } else {
        ret
    }
}

/// Convert a number of clock ticks (as reported by `/proc/[pid]/stat`) into
/// a `Duration`.
pub fn duration_from_ticks(ticks: u64) -> Duration {
    Duration::from_secs_f64(ticks as f64 / clock_ticks_per_sec() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticks_per_sec_is_positive() {
        assert!(clock_ticks_per_sec() > 0);
    }

    #[test]
    fn duration_from_ticks_scales_linearly() {
        let one = duration_from_ticks(clock_ticks_per_sec() as u64);
        assert!((one.as_secs_f64() - 1.0).abs() < 1e-6);
    }
}
