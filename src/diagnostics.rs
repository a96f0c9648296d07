//! Actuation diagnostics and the per-device diagnostic log.
//!
//! The evaluator is a one-sided detector: it can say "irrigation appears
//! to have had no effect", but absence of a result means *no diagnosis*,
//! not *healthy*.  It only fires when the previous command was IRRIGATE
//! and at least [`LOOKBACK_SAMPLES`] soil readings are available.
//!
//! The diagnostic log keeps the most recent [`DIAGNOSTIC_LOG_CAPACITY`]
//! notable events (faults, degraded tools) for the state query.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::types::Decision;
use crate::error::SafetyFault;
use crate::history::BoundedHistory;
use crate::shadow::SoilHistory;

/// Samples spanned by the no-effect check: the newest reading is compared
/// with the oldest of the last `LOOKBACK_SAMPLES`.
pub const LOOKBACK_SAMPLES: usize = 3;

pub const DIAGNOSTIC_LOG_CAPACITY: usize = 16;

/// Suspected actuation fault.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActuationFault {
    pub fault: SafetyFault,
    /// Soil moisture at the start of the lookback window.
    pub earlier_soil: f64,
    /// Newest soil moisture.
    pub latest_soil: f64,
    pub description: String,
}

/// Check whether the last irrigation command moved soil moisture at all.
///
/// `history` must already include the reading being evaluated.
pub fn evaluate(history: &SoilHistory, last_command: Option<Decision>) -> Option<ActuationFault> {
    if last_command != Some(Decision::Irrigate) || history.len() < LOOKBACK_SAMPLES {
        return None;
    }
    let latest = *history.latest()?;
    let earlier = *history.nth_from_latest(LOOKBACK_SAMPLES - 1)?;

    if latest > earlier {
        return None;
    }
    Some(ActuationFault {
        fault: SafetyFault::ActuationNoEffect,
        earlier_soil: earlier,
        latest_soil: latest,
        description: format!(
            "Pump fault suspected: soil moisture did not rise after irrigation ({earlier}% -> {latest}%)"
        ),
    })
}

// ---------------------------------------------------------------------------
// Diagnostic log
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    SensorBounds,
    ActuationFault,
    PumpFailure,
    ToolDegraded,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticEntry {
    pub timestamp: DateTime<Utc>,
    pub kind: DiagnosticKind,
    pub message: String,
}

pub type DiagnosticLog = BoundedHistory<DiagnosticEntry, DIAGNOSTIC_LOG_CAPACITY>;
