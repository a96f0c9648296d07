//! Request boundary: JSON telemetry and scenario-control payloads.
//!
//! Everything that reaches the service core has been parsed and validated
//! here first.  A payload that fails to parse is rejected with
//! [`IngestError`] and never touches a device shadow.
//!
//! Telemetry wire format:
//!
//! ```json
//! {
//!   "device_id": "esp32_demo",
//!   "sensors": { "soil": 24.0, "temp": 30.0, "light": 2700 },
//!   "rain_minutes": 88
//! }
//! ```
//!
//! `temperature` and `temp` are both accepted.  `rain_minutes` is optional:
//! positive = rain in N minutes, `0` = raining now, negative = rained N
//! minutes ago.

use core::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::engine::types::SensorReading;
use crate::error::IngestError;
use crate::scenario::ScenarioMode;

/// One telemetry sample addressed to a device shadow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestRequest {
    pub device_id: String,
    pub sensors: SensorReading,
    #[serde(default)]
    pub rain_minutes: Option<i32>,
}

impl IngestRequest {
    pub fn validate(&self) -> Result<(), IngestError> {
        if self.device_id.trim().is_empty() {
            return Err(IngestError::MissingDeviceId);
        }
        Ok(())
    }

    pub fn rain_hint(&self) -> Option<RainHint> {
        self.rain_minutes.map(RainHint::from_minutes)
    }
}

/// Device-side rain hint decoded from `rain_minutes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RainHint {
    /// Rain forecast in this many minutes.
    InMinutes(u32),
    /// Raining now.
    Now,
    /// Rain already happened; not an expectation of future rain.
    Recent { minutes_ago: u32 },
}

impl RainHint {
    pub fn from_minutes(minutes: i32) -> Self {
        match minutes.cmp(&0) {
            Ordering::Greater => Self::InMinutes(minutes.unsigned_abs()),
            Ordering::Equal => Self::Now,
            Ordering::Less => Self::Recent {
                minutes_ago: minutes.unsigned_abs(),
            },
        }
    }

    /// Short operator-facing description.
    pub fn describe(&self) -> String {
        match *self {
            Self::InMinutes(m) if m >= 60 => format!("In {}h {}m", m / 60, m % 60),
            Self::InMinutes(m) => format!("In {m} minutes"),
            Self::Now => "Rain occurring now".to_owned(),
            Self::Recent { .. } => "Rained recently".to_owned(),
        }
    }
}

/// Operator request to change a device's scenario mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioRequest {
    pub device_id: String,
    pub mode: ScenarioMode,
}

/// Parse and validate a telemetry payload.
pub fn parse_ingest(payload: &[u8]) -> Result<IngestRequest, IngestError> {
    let request: IngestRequest =
        serde_json::from_slice(payload).map_err(|e| IngestError::Malformed(e.to_string()))?;
    request.validate()?;
    Ok(request)
}

/// Parse and validate a scenario-control payload.  Unknown modes are rejected.
pub fn parse_scenario(payload: &[u8]) -> Result<ScenarioRequest, IngestError> {
    let request: ScenarioRequest =
        serde_json::from_slice(payload).map_err(|e| IngestError::Malformed(e.to_string()))?;
    if request.device_id.trim().is_empty() {
        return Err(IngestError::MissingDeviceId);
    }
    Ok(request)
}
