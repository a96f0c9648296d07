//! Port traits: the hexagonal boundary between the agent core and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (forecast provider, insight generator, event sinks,
//! config storage, clocks) implement these traits.  The
//! [`AppService`](super::service::AppService) consumes the tool ports via
//! generics, so the decision core never performs I/O itself.
//!
//! ## Tool ports
//!
//! Both tools are best-effort.  The service drives every call under a
//! timeout and treats an `Err` or a timeout as "no signal".  Implementations
//! should not retry internally.

use core::future::Future;

use serde::{Deserialize, Serialize};

use crate::config::AgentConfig;
use crate::engine::types::{Decision, SensorReading};
use crate::error::ToolError;

// ───────────────────────────────────────────────────────────────
// Forecast port (driven adapter: weather provider → domain)
// ───────────────────────────────────────────────────────────────

/// Answer from a weather-forecast provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RainForecast {
    pub rain_expected: bool,
    /// Minutes until rain, if the provider knows.
    pub eta_minutes: Option<u32>,
}

pub trait ForecastPort {
    /// Rain outlook for the field the device sits in.
    fn rain_forecast(
        &self,
        device_id: &str,
    ) -> impl Future<Output = Result<RainForecast, ToolError>>;
}

// ───────────────────────────────────────────────────────────────
// Insight port (driven adapter: domain → text generator)
// ───────────────────────────────────────────────────────────────

/// Context handed to the insight generator after a decision is final.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsightRequest {
    pub device_id: String,
    pub sensors: SensorReading,
    pub decision: Decision,
    pub rain_expected: bool,
    pub reasons: Vec<String>,
}

pub trait InsightPort {
    /// Short free-text agronomic note for the operator.
    fn insight(&self, request: &InsightRequest) -> impl Future<Output = Result<String, ToolError>>;
}

impl<T: ForecastPort + ?Sized> ForecastPort for &T {
    fn rain_forecast(
        &self,
        device_id: &str,
    ) -> impl Future<Output = Result<RainForecast, ToolError>> {
        (**self).rain_forecast(device_id)
    }
}

impl<T: InsightPort + ?Sized> InsightPort for &T {
    fn insight(&self, request: &InsightRequest) -> impl Future<Output = Result<String, ToolError>> {
        (**self).insight(request)
    }
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists agent configuration.
///
/// Implementations MUST validate before persisting and reject invalid
/// ranges with [`ConfigError::ValidationFailed`], never clamp silently.
pub trait ConfigPort {
    /// Returns [`AgentConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<AgentConfig, ConfigError>;

    fn save(&self, config: &AgentConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Source of "now" for callers that drive the service.  The engine itself
/// never reads a clock; time is always passed in.
pub trait ClockPort {
    fn now(&self) -> chrono::DateTime<chrono::Utc>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Stored config failed to deserialize.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl std::error::Error for ConfigError {}
