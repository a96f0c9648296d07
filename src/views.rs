//! Per-category dashboard views of one decision.
//!
//! The dashboard shows one panel per agent (field, climate, decision,
//! farmer assistant), derived from the reading, the rain outlook and the
//! orchestrated decision.  Views are plain data and never feed back into
//! the decision path.

use serde::{Deserialize, Serialize};

use crate::engine::types::{Decision, DecisionBasis, SensorReading};
use crate::orchestrator::{OrchestratedDecision, OverrideSource, RainOutlook};

const SOIL_CRITICAL_PERCENT: f64 = 25.0;
const SOIL_LOW_PERCENT: f64 = 35.0;
const HEAT_STRESS_C: f64 = 32.0;

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SoilStatus {
    Critical,
    Low,
    Ok,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Level {
    High,
    Moderate,
    Normal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PumpState {
    On,
    Off,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldView {
    pub soil_moisture: f64,
    pub soil_status: SoilStatus,
    pub temperature: f64,
    pub heat_stress: Level,
    pub pump_state: PumpState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClimateView {
    pub rain_expected: bool,
    pub rain_eta_minutes: Option<u32>,
    pub evaporation_risk: Level,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionView {
    pub decision: Decision,
    pub confidence: f64,
    pub utility_score: f64,
    pub reason: String,
    pub override_source: Option<OverrideSource>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssistantView {
    pub message: String,
    /// Free-text insight from the insight tool, when it answered in time.
    pub insight: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentViews {
    pub field_agent: FieldView,
    pub climate_agent: ClimateView,
    pub decision_agent: DecisionView,
    pub farmer_assistant: AssistantView,
}

impl AgentViews {
    pub fn build(
        reading: &SensorReading,
        rain: &RainOutlook,
        decision: &OrchestratedDecision,
    ) -> Self {
        let hot = reading.temperature > HEAT_STRESS_C;
        let soil_status = if reading.soil < SOIL_CRITICAL_PERCENT {
            SoilStatus::Critical
        } else if reading.soil < SOIL_LOW_PERCENT {
            SoilStatus::Low
        } else {
            SoilStatus::Ok
        };

        Self {
            field_agent: FieldView {
                soil_moisture: round1(reading.soil),
                soil_status,
                temperature: round1(reading.temperature),
                heat_stress: if hot { Level::High } else { Level::Normal },
                pump_state: if decision.decision().runs_pump() {
                    PumpState::On
                } else {
                    PumpState::Off
                },
            },
            climate_agent: ClimateView {
                rain_expected: rain.expected,
                rain_eta_minutes: rain.eta_minutes,
                evaporation_risk: if hot { Level::High } else { Level::Moderate },
            },
            decision_agent: DecisionView {
                decision: decision.decision(),
                confidence: decision.confidence(),
                utility_score: decision.utility(),
                reason: decision.final_reason().to_owned(),
                override_source: decision.applied.as_ref().map(|o| o.source),
            },
            farmer_assistant: AssistantView {
                message: assistant_message(decision, rain),
                insight: None,
            },
        }
    }
}

fn assistant_message(decision: &OrchestratedDecision, rain: &RainOutlook) -> String {
    match decision.applied.as_ref().map(|o| o.source) {
        Some(OverrideSource::DiagnosticFault) => {
            return "Irrigation had no measurable effect on soil moisture. Check the pump \
                    and water lines; irrigation is stopped."
                .to_owned();
        }
        Some(OverrideSource::PumpFailScenario) => {
            return "Pump failure detected. Please check the water pump and tank. The \
                    system has locked irrigation for safety."
                .to_owned();
        }
        Some(OverrideSource::RainExpected) | None => {}
    }

    if decision.base.basis == DecisionBasis::Guardrail {
        return "A sensor reported a physically impossible value. Irrigation is stopped \
                until readings are plausible again."
            .to_owned();
    }

    if rain.expected {
        let when = match rain.eta_minutes {
            Some(0) => "Rain is falling now.".to_owned(),
            Some(m) => format!("Rain is expected in {m} minutes."),
            None => "Rain is expected soon.".to_owned(),
        };
        return format!("{when} Irrigation is delayed to save water and avoid unnecessary pump usage.");
    }

    match decision.decision() {
        Decision::Irrigate => "Soil moisture is critically low. Irrigation has been activated \
                               to maintain crop health."
            .to_owned(),
        Decision::Delay => "Soil is moderately dry. Irrigation is deferred to a better window."
            .to_owned(),
        Decision::Hold | Decision::EmergencyStop => "Soil moisture is adequate. System is \
                                                     monitoring field and climate conditions."
            .to_owned(),
    }
}
