//! Unified error types for the AgroSense agent.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! service boundary's error handling uniform.  Out-of-bounds sensor values
//! are *not* errors: they are a deterministic `EMERGENCY_STOP` decision.
//! Errors only exist where a request cannot be processed at all.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;

// ---------------------------------------------------------------------------
// Top-level agent error
// ---------------------------------------------------------------------------

/// Every fallible public operation funnels into this type.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// A telemetry or control payload was rejected at the boundary.
    Ingest(IngestError),
    /// Configuration is invalid or could not be loaded.
    Config(ConfigError),
    /// A query or command named a device the shadow store has never seen.
    UnknownDevice(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ingest(e) => write!(f, "ingest: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::UnknownDevice(id) => write!(f, "unknown device '{id}'"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Ingest errors
// ---------------------------------------------------------------------------

/// Boundary rejections.  When one of these is returned the device shadow
/// has not been touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestError {
    /// Payload is not valid JSON or misses a required field.
    Malformed(String),
    /// The device identifier is absent or blank.
    MissingDeviceId,
}

impl fmt::Display for IngestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed(msg) => write!(f, "malformed payload: {msg}"),
            Self::MissingDeviceId => write!(f, "missing device id"),
        }
    }
}

impl std::error::Error for IngestError {}

impl From<IngestError> for Error {
    fn from(e: IngestError) -> Self {
        Self::Ingest(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// External tool errors
// ---------------------------------------------------------------------------

/// Failure of a best-effort external tool (forecast, insight).
///
/// These never escape the ingest path: the service downgrades them to
/// "no signal" and records them in the device's diagnostic log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolError {
    /// No provider is wired in for this tool.
    Unavailable(&'static str),
    /// The provider did not answer within its time budget.
    Timeout,
    /// The provider answered with an error.
    Failed(String),
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable(tool) => write!(f, "{tool} unavailable"),
            Self::Timeout => write!(f, "timed out"),
            Self::Failed(msg) => write!(f, "failed: {msg}"),
        }
    }
}

impl std::error::Error for ToolError {}

// ---------------------------------------------------------------------------
// Safety faults
// ---------------------------------------------------------------------------

/// Safety faults force `EMERGENCY_STOP` for the call in which they are
/// observed.  They are tracked per device in a bitmask (see
/// [`FaultLatch`](crate::safety::FaultLatch)) so that set/clear transitions
/// can be reported, but they never latch a stop across calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum SafetyFault {
    /// Soil moisture reading outside 0–100 %.
    SoilOutOfBounds = 0b0000_0001,
    /// Temperature reading outside -10–60 °C.
    TemperatureOutOfBounds = 0b0000_0010,
    /// Irrigation was commanded but soil moisture did not rise.
    ActuationNoEffect = 0b0000_0100,
    /// Operator reported a pump failure.
    PumpFailure = 0b0000_1000,
}

impl SafetyFault {
    pub const ALL: [Self; 4] = [
        Self::SoilOutOfBounds,
        Self::TemperatureOutOfBounds,
        Self::ActuationNoEffect,
        Self::PumpFailure,
    ];

    /// Return the bitmask for this fault.
    pub const fn mask(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for SafetyFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SoilOutOfBounds => write!(f, "soil sensor out of bounds"),
            Self::TemperatureOutOfBounds => write!(f, "temperature sensor out of bounds"),
            Self::ActuationNoEffect => write!(f, "irrigation had no effect"),
            Self::PumpFailure => write!(f, "pump failure"),
        }
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
