//! Value types produced and consumed by the decision engine.

use core::fmt;
use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Sensor reading
// ---------------------------------------------------------------------------

/// One telemetry sample from the field device.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    /// Soil moisture (%).
    pub soil: f64,
    /// Air temperature (°C).
    #[serde(alias = "temp")]
    pub temperature: f64,
    /// Ambient light (raw LDR units, 0 – 4095 on the reference board).
    pub light: u32,
}

// ---------------------------------------------------------------------------
// Decision
// ---------------------------------------------------------------------------

/// The four possible pump commands.  Consumers match exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    Irrigate,
    Delay,
    Hold,
    EmergencyStop,
}

impl Decision {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Irrigate => "IRRIGATE",
            Self::Delay => "DELAY",
            Self::Hold => "HOLD",
            Self::EmergencyStop => "EMERGENCY_STOP",
        }
    }

    /// True if this command switches the pump on.
    pub const fn runs_pump(self) -> bool {
        match self {
            Self::Irrigate => true,
            Self::Delay | Self::Hold | Self::EmergencyStop => false,
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which evaluation stage produced a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionBasis {
    /// A sensor violated its physical bounds.
    Guardrail,
    /// The hysteresis window repeated the previous command.
    Cooldown,
    /// The utility model scored the reading.
    Scored,
}

// ---------------------------------------------------------------------------
// Utility breakdown
// ---------------------------------------------------------------------------

/// Intermediate terms of the utility score, kept for auditing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UtilityScore {
    pub soil_deficit: f64,
    /// 0 – 100.
    pub soil_urgency: f64,
    pub temp_penalty: f64,
    pub light_factor: f64,
    /// `urgency × penalty × factor`, rounded to 2 dp.
    pub utility: f64,
}

// ---------------------------------------------------------------------------
// Decision output
// ---------------------------------------------------------------------------

/// Result of one engine evaluation.
///
/// `reasons` is append-only for the duration of the evaluation and
/// records every factor that shaped the decision, in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionOutput {
    pub decision: Decision,
    /// 0.0 – 1.0.
    pub confidence: f64,
    /// ≥ 0.
    pub utility: f64,
    pub reasons: Vec<String>,
    pub basis: DecisionBasis,
    /// Present only for [`DecisionBasis::Scored`].
    pub score: Option<UtilityScore>,
    pub timestamp: DateTime<Utc>,
}

impl DecisionOutput {
    /// Human-readable rendering of the decision and its trace.
    pub fn explain(&self) -> String {
        render_explanation(self.decision, self.confidence, self.utility, &self.reasons)
    }
}

/// `AI Decision: <D> | Confidence: <pct>% | Utility: <u>` followed by one
/// bullet per reason.
pub fn render_explanation<S: AsRef<str>>(
    decision: Decision,
    confidence: f64,
    utility: f64,
    reasons: &[S],
) -> String {
    let pct = (confidence * 100.0).round() as i64;
    let mut out = format!("AI Decision: {decision} | Confidence: {pct}% | Utility: {utility}\nReasoning:");
    for reason in reasons {
        let _ = write!(out, "\n- {}", reason.as_ref());
    }
    out
}
