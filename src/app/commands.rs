//! Inbound commands to the application service.
//!
//! These represent operator actions (dashboard scenario control, manual
//! reset) that the [`AppService`](super::service::AppService) interprets.

use crate::scenario::ScenarioMode;
use crate::telemetry::ScenarioRequest;

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    /// Switch the scenario override.  RAIN arms the rain ETA, NORMAL also
    /// zeroes the impact metrics.
    SetScenario { device_id: String, mode: ScenarioMode },

    /// Forget everything about a device.
    ResetDevice { device_id: String },
}

impl From<ScenarioRequest> for AppCommand {
    fn from(req: ScenarioRequest) -> Self {
        Self::SetScenario {
            device_id: req.device_id,
            mode: req.mode,
        }
    }
}
