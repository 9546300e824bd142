//! The judge service: HTTP surface and Request Orchestrator (Component E)
//! on top of the `judge` and `sandbox` crates. Exposed as a library so
//! integration tests can drive the `axum::Router` in-process
//! (`tower::ServiceExt::oneshot`) without a real socket; `src/main.rs` is
//! a thin binary wrapper around [`routes::router`].

pub mod config;
pub mod error;
pub mod logging;
pub mod orchestrator;
pub mod persistence;
pub mod routes;
pub mod wire;
