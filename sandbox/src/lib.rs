//! Resource limiting and process supervision.
//!
//! This crate implements Component A (the Resource Limiter) and Component B
//! (the Process Supervisor): given a program to run, the limits to apply to
//! it, and a wall-clock budget, it runs the program to completion (or to a
//! timeout) and reports exactly what happened, never what *should* have
//! happened.

#[macro_use]
extern crate error_chain;

pub mod daemon;
pub mod limiter;
pub mod misc;
pub mod rlimits;
pub mod supervisor;

pub use limiter::ResourceLimits;
pub use supervisor::{ExecutionRecord, SupervisedCommand};

error_chain! {
    errors {
        /// The child process could not be spawned at all (missing
        /// interpreter/compiler binary, permission denied, bad working
        /// directory, ...).
        Spawn(program: String, reason: String) {
            description("failed to spawn supervised process")
            display("failed to spawn '{}': {}", program, reason)
        }
    }
}
