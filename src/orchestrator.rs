//! Tool orchestrator: merges the engine decision with external signals.
//!
//! Override precedence, highest first:
//!
//! | # | Signal                                  | Final decision   |
//! |---|-----------------------------------------|------------------|
//! | 1 | Diagnostic fault (no-effect irrigation) | EMERGENCY_STOP   |
//! | 2 | Scenario `PUMP_FAIL`                    | EMERGENCY_STOP   |
//! | 3 | Rain expected and soil below threshold  | HOLD             |
//! | 4 | none                                    | engine decision  |
//!
//! An override never replaces the engine's reasons: the result keeps the
//! base [`DecisionOutput`] intact and carries the override separately, so
//! every final decision can be traced back to the raw scoring.  Confidence
//! and utility are not recomputed.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::app::ports::RainForecast;
use crate::config::OverrideConfig;
use crate::diagnostics::ActuationFault;
use crate::engine::types::{render_explanation, Decision, DecisionBasis, DecisionOutput};
use crate::scenario::{ScenarioMode, ScenarioOverride};
use crate::telemetry::RainHint;

const PUMP_FAIL_REASON: &str = "Pump failure reported by operator, irrigation locked for safety";

// ---------------------------------------------------------------------------
// Rain outlook
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RainSource {
    Scenario,
    TelemetryHint,
    Forecast,
}

/// Merged view of every rain signal available for one ingest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RainOutlook {
    pub expected: bool,
    pub eta_minutes: Option<u32>,
    pub source: Option<RainSource>,
}

impl RainOutlook {
    /// First source that expects rain wins: operator scenario, then the
    /// device's own hint, then the forecast provider.
    pub fn resolve(
        scenario: &ScenarioOverride,
        hint: Option<RainHint>,
        forecast: Option<&RainForecast>,
    ) -> Self {
        if scenario.rain_expected() {
            return Self::expected(scenario.rain_eta_minutes, RainSource::Scenario);
        }
        match hint {
            Some(RainHint::InMinutes(m)) => {
                return Self::expected(Some(m), RainSource::TelemetryHint);
            }
            Some(RainHint::Now) => return Self::expected(Some(0), RainSource::TelemetryHint),
            Some(RainHint::Recent { .. }) | None => {}
        }
        match forecast {
            Some(f) if f.rain_expected => Self::expected(f.eta_minutes, RainSource::Forecast),
            _ => Self::default(),
        }
    }

    fn expected(eta_minutes: Option<u32>, source: RainSource) -> Self {
        Self {
            expected: true,
            eta_minutes,
            source: Some(source),
        }
    }

    fn hold_reason(&self, soil: f64) -> String {
        match self.eta_minutes {
            Some(0) => format!("Rain occurring now, holding irrigation despite dry soil ({soil}%)"),
            Some(m) => format!("Rain expected in {m} minutes, holding irrigation despite dry soil ({soil}%)"),
            None => format!("Rain expected soon, holding irrigation despite dry soil ({soil}%)"),
        }
    }
}

// ---------------------------------------------------------------------------
// Overrides
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverrideSource {
    DiagnosticFault,
    PumpFailScenario,
    RainExpected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Override {
    pub source: OverrideSource,
    pub decision: Decision,
    pub reason: String,
}

/// Signals gathered around one engine evaluation.
#[derive(Debug, Clone, Default)]
pub struct ExternalSignals {
    pub fault: Option<ActuationFault>,
    pub scenario: ScenarioMode,
    pub rain: RainOutlook,
}

/// Final decision: the untouched engine output plus at most one override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestratedDecision {
    pub base: DecisionOutput,
    pub applied: Option<Override>,
}

impl OrchestratedDecision {
    pub fn decision(&self) -> Decision {
        self.applied
            .as_ref()
            .map_or(self.base.decision, |o| o.decision)
    }

    pub fn confidence(&self) -> f64 {
        self.base.confidence
    }

    pub fn utility(&self) -> f64 {
        self.base.utility
    }

    /// Engine reasons followed by the override reason, if any.
    pub fn reasons(&self) -> Vec<String> {
        let mut out = self.base.reasons.clone();
        if let Some(o) = &self.applied {
            out.push(o.reason.clone());
        }
        out
    }

    /// The reason that determined the final label.
    pub fn final_reason(&self) -> &str {
        match &self.applied {
            Some(o) => &o.reason,
            None => self.base.reasons.last().map_or("", String::as_str),
        }
    }

    /// True if this decision starts a fresh actuation.  A cooldown echo of
    /// IRRIGATE is not a new actuation and does not re-arm the window.
    pub fn actuated(&self) -> bool {
        self.decision() == Decision::Irrigate && self.base.basis == DecisionBasis::Scored
    }

    pub fn explain(&self) -> String {
        render_explanation(
            self.decision(),
            self.confidence(),
            self.utility(),
            &self.reasons(),
        )
    }
}

/// Applies the override precedence table.
#[derive(Debug, Clone)]
pub struct ToolOrchestrator {
    rain_hold_soil_percent: f64,
}

impl ToolOrchestrator {
    pub fn new(config: &OverrideConfig) -> Self {
        Self {
            rain_hold_soil_percent: config.rain_hold_soil_percent,
        }
    }

    pub fn orchestrate(
        &self,
        base: DecisionOutput,
        soil: f64,
        signals: &ExternalSignals,
    ) -> OrchestratedDecision {
        let applied = self.select_override(&base, soil, signals);
        if let Some(o) = &applied {
            debug!(
                "Override {:?}: {} -> {} ({})",
                o.source, base.decision, o.decision, o.reason
            );
        }
        OrchestratedDecision { base, applied }
    }

    fn select_override(
        &self,
        base: &DecisionOutput,
        soil: f64,
        signals: &ExternalSignals,
    ) -> Option<Override> {
        // ── 1. Diagnostic fault ───────────────────────────────
        if let Some(fault) = &signals.fault {
            return Some(Override {
                source: OverrideSource::DiagnosticFault,
                decision: Decision::EmergencyStop,
                reason: fault.description.clone(),
            });
        }

        // ── 2. Operator-reported pump failure ─────────────────
        if signals.scenario == ScenarioMode::PumpFail {
            return Some(Override {
                source: OverrideSource::PumpFailScenario,
                decision: Decision::EmergencyStop,
                reason: PUMP_FAIL_REASON.to_owned(),
            });
        }

        // ── 3. Rain hold, whatever the engine decided ─────────
        if signals.rain.expected && soil < self.rain_hold_soil_percent {
            return Some(Override {
                source: OverrideSource::RainExpected,
                decision: Decision::Hold,
                reason: signals.rain.hold_reason(soil),
            });
        }

        None
    }
}
