//! Operator-set scenario override.
//!
//! The operator can force a rain forecast (`RAIN`) or report a pump
//! failure (`PUMP_FAIL`) for a device.  While in `RAIN`, the ETA counts
//! down by a fixed step on every ingest and stops at zero.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::config::OverrideConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScenarioMode {
    #[default]
    Normal,
    Rain,
    PumpFail,
}

impl fmt::Display for ScenarioMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => f.write_str("NORMAL"),
            Self::Rain => f.write_str("RAIN"),
            Self::PumpFail => f.write_str("PUMP_FAIL"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScenarioOverride {
    pub mode: ScenarioMode,
    pub rain_eta_minutes: Option<u32>,
}

impl ScenarioOverride {
    /// Switch mode.  RAIN arms the configured ETA, other modes clear it.
    pub fn set_mode(&mut self, mode: ScenarioMode, config: &OverrideConfig) {
        self.mode = mode;
        self.rain_eta_minutes = match mode {
            ScenarioMode::Rain => Some(config.rain_scenario_eta_minutes),
            ScenarioMode::Normal | ScenarioMode::PumpFail => None,
        };
    }

    /// Advance the rain countdown by one ingest.
    pub fn advance(&mut self, step_minutes: u32) {
        if self.mode != ScenarioMode::Rain {
            return;
        }
        if let Some(eta) = self.rain_eta_minutes.as_mut() {
            *eta = eta.saturating_sub(step_minutes);
        }
    }

    pub fn rain_expected(&self) -> bool {
        self.mode == ScenarioMode::Rain
    }

    pub fn pump_failed(&self) -> bool {
        self.mode == ScenarioMode::PumpFail
    }
}
