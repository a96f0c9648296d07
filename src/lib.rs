//! AgroSense irrigation agent library.
//!
//! Utility-based decision engine plus the stateful orchestration around
//! it: per-device shadows, safety guardrails, actuation diagnostics,
//! best-effort external tools and impact metrics.  Transport lives
//! outside this crate; feed [`app::service::AppService`] raw payloads.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod diagnostics;
pub mod engine;
pub mod history;
pub mod metrics;
pub mod orchestrator;
pub mod safety;
pub mod scenario;
pub mod shadow;
pub mod telemetry;
pub mod views;

mod error;

pub use error::{Error, IngestError, Result, SafetyFault, ToolError};
