//! Component A: the Resource Limiter.
//!
//! `ResourceLimits::apply` is invoked inside the child, between `fork` and
//! `exec`, via [`std::process::Command::pre_exec`]. A failure to set any
//! individual limit is logged and otherwise ignored: the limiter runs in
//! untrusted child context, so aborting here would let a single failed
//! `setrlimit` call turn into an unobserved, unkilled child.

use crate::rlimits::{self, Resource};

/// Default CPU time limit, in seconds.
pub const DEFAULT_CPU_SECONDS: u64 = 10;

/// Default address-space cap, in bytes (256 MiB).
pub const DEFAULT_ADDRESS_SPACE_BYTES: u64 = 256 * 1024 * 1024;

/// Address-space cap used by toolchains that legitimately need more room
/// (documented per adapter in `judge::languages`), in bytes (1 GiB).
pub const RAISED_ADDRESS_SPACE_BYTES: u64 = 1024 * 1024 * 1024;

/// Default cap on the number of processes/threads the child's user may own.
pub const DEFAULT_MAX_PROCESSES: u64 = 10;

/// Raised process cap for toolchains with native thread pools (e.g. the
/// JVM's GC and JIT threads).
pub const RAISED_MAX_PROCESSES: u64 = 50;

/// Maximum size, in bytes, of any file the child may create (10 MiB).
pub const DEFAULT_MAX_FILE_SIZE_BYTES: u64 = 10 * 1024 * 1024;

/// Maximum number of open file descriptors.
pub const DEFAULT_MAX_OPEN_FILES: u64 = 64;

/// Resource limits to apply to a single supervised child.
#[derive(Clone, Copy, Debug)]
pub struct ResourceLimits {
    pub cpu_seconds: u64,
    pub address_space_bytes: u64,
    pub max_processes: u64,
    pub max_file_size_bytes: u64,
    pub max_open_files: u64,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        ResourceLimits {
            cpu_seconds: DEFAULT_CPU_SECONDS,
            address_space_bytes: DEFAULT_ADDRESS_SPACE_BYTES,
            max_processes: DEFAULT_MAX_PROCESSES,
            max_file_size_bytes: DEFAULT_MAX_FILE_SIZE_BYTES,
            max_open_files: DEFAULT_MAX_OPEN_FILES,
        }
    }
}

impl ResourceLimits {
    /// Apply every limit to the calling process. Must only be called from
    /// the child side of a fork, before `exec`. Every individual
    /// `setrlimit` failure is logged and otherwise swallowed.
    ///
    /// This function only uses async-signal-safe operations: no heap
    /// allocation beyond what `log` itself performs, no locking.
    pub fn apply(&self) {
        try_set(Resource::CpuTime, self.cpu_seconds);
        try_set(Resource::AddressSpace, self.address_space_bytes);
        try_set(Resource::NumProcesses, self.max_processes);
        try_set(Resource::FileSize, self.max_file_size_bytes);
        // Core dumps are always disabled regardless of configuration.
        try_set(Resource::CoreDumpSize, 0);
        try_set(Resource::OpenFiles, self.max_open_files);
    }
}

fn try_set(resource: Resource, value: u64) {
    if let Err(e) = rlimits::setrlimit_hard(resource, value) {
        log::warn!("failed to set resource limit {:?} to {}: {}", resource, value, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_limits_match_spec_table() {
        let limits = ResourceLimits::default();
        assert_eq!(limits.cpu_seconds, 10);
        assert_eq!(limits.address_space_bytes, 256 * 1024 * 1024);
        assert_eq!(limits.max_processes, 10);
        assert_eq!(limits.max_file_size_bytes, 10 * 1024 * 1024);
        assert_eq!(limits.max_open_files, 64);
    }
}
