//! Rust friendly bindings to the native `setrlimit` mechanism.
//!
//! These are applied in the child process after `fork` and before `exec`
//! (see [`crate::limiter`]), so failures here must never be allowed to
//! propagate an exception into the parent's decision logic.

use libc::rlimit;

/// A resource governed by `setrlimit`.
#[repr(i32)]
#[derive(Clone, Copy, Debug)]
pub enum Resource {
    /// Maximum size of the process's virtual address space. `RLIMIT_AS`.
    AddressSpace = libc::RLIMIT_AS as i32,

    /// CPU time, in seconds, the process may consume. `RLIMIT_CPU`.
    CpuTime = libc::RLIMIT_CPU as i32,

    /// Maximum number of processes/threads the user may have. `RLIMIT_NPROC`.
    NumProcesses = libc::RLIMIT_NPROC as i32,

    /// Maximum size of any file the process creates. `RLIMIT_FSIZE`.
    FileSize = libc::RLIMIT_FSIZE as i32,

    /// Maximum size of a core dump file. `RLIMIT_CORE`.
    CoreDumpSize = libc::RLIMIT_CORE as i32,

    /// Maximum number of open file descriptors. `RLIMIT_NOFILE`.
    OpenFiles = libc::RLIMIT_NOFILE as i32,
}

/// A soft/hard limit pair for some resource.
#[derive(Clone, Copy, Debug)]
pub struct ResourceLimit {
    pub soft_limit: u64,
    pub hard_limit: u64,
}

impl ResourceLimit {
    fn as_native(&self) -> rlimit {
        rlimit {
            rlim_cur: self.soft_limit,
            rlim_max: self.hard_limit,
        }
    }
}

/// Set resource limit for the calling process.
pub fn setrlimit(resource: Resource, limit: &ResourceLimit) -> std::io::Result<()> {
    let ret = unsafe { libc::setrlimit(resource as u32, &limit.as_native()) };
    if ret == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error())
    }
}

/// Set resource limit for the calling process, using the same value for the
/// soft and hard limit.
pub fn setrlimit_hard(resource: Resource, limit: u64) -> std::io::Result<()> {
    setrlimit(
        resource,
        &ResourceLimit {
            soft_limit: limit,
            hard_limit: limit,
        },
    )
}
