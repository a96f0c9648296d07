//! Utility-based decision engine.
//!
//! Scores one sensor reading against the configured thresholds and the
//! device's hysteresis memory.  The engine is a pure function of its
//! inputs: the current time is passed in, nothing is mutated, and it is
//! safe to call from any number of threads.
//!
//! ```text
//!  reading ──▶ 1. bounds guardrail ──▶ EMERGENCY_STOP
//!                  │ ok
//!                  ▼
//!              2. cooldown window  ──▶ repeat last command
//!                  │ expired / none
//!                  ▼
//!              3. utility score (urgency × temp penalty × light factor)
//!                  │
//!                  ▼
//!              4. policy: ≥ irrigate cutoff → IRRIGATE
//!                         ≥ delay cutoff    → DELAY
//!                         otherwise         → HOLD
//! ```
//!
//! The first applicable stage wins.

pub mod types;

use chrono::{DateTime, Utc};

use crate::config::{AgentConfig, Thresholds, UtilityModel};
use crate::safety;
use crate::shadow::AgentMemory;
use types::{Decision, DecisionBasis, DecisionOutput, SensorReading, UtilityScore};

/// Fixed confidence for a DELAY decision.
const DELAY_CONFIDENCE: f64 = 0.7;
/// Fixed confidence for a HOLD decision.
const HOLD_CONFIDENCE: f64 = 0.9;

/// Round to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Stateless scorer.  Holds only a copy of the configuration.
#[derive(Debug, Clone)]
pub struct DecisionEngine {
    thresholds: Thresholds,
    utility: UtilityModel,
}

impl DecisionEngine {
    pub fn new(config: &AgentConfig) -> Self {
        Self {
            thresholds: config.thresholds.clone(),
            utility: config.utility.clone(),
        }
    }

    /// Evaluate `reading` at instant `now`.
    pub fn evaluate(
        &self,
        reading: &SensorReading,
        memory: &AgentMemory,
        now: DateTime<Utc>,
    ) -> DecisionOutput {
        // ── 1. Physical bounds ────────────────────────────────
        if let Some(fault) = safety::check_bounds(reading) {
            return DecisionOutput {
                decision: Decision::EmergencyStop,
                confidence: 1.0,
                utility: 0.0,
                reasons: vec![safety::bounds_reason(fault, reading)],
                basis: DecisionBasis::Guardrail,
                score: None,
                timestamp: now,
            };
        }

        // ── 2. Hysteresis ─────────────────────────────────────
        if let Some(elapsed) = self.cooldown_elapsed(memory, now) {
            // An emergency stop is never carried over by the cooldown.
            let decision = match memory.last_decision {
                Some(Decision::EmergencyStop) | None => Decision::Hold,
                Some(d @ (Decision::Irrigate | Decision::Delay | Decision::Hold)) => d,
            };
            return DecisionOutput {
                decision,
                confidence: 1.0,
                utility: 0.0,
                reasons: vec![format!("Cooldown active ({elapsed}s since last action)")],
                basis: DecisionBasis::Cooldown,
                score: None,
                timestamp: now,
            };
        }

        // ── 3. Utility ────────────────────────────────────────
        let mut reasons = Vec::with_capacity(5);
        let score = self.score(reading, &mut reasons);

        // ── 4. Policy ─────────────────────────────────────────
        let (decision, confidence) = if score.utility >= self.utility.irrigate_cutoff {
            reasons.push(format!("Soil critically dry ({}%)", reading.soil));
            (Decision::Irrigate, self.distance_confidence(reading.soil))
        } else if score.utility >= self.utility.delay_cutoff {
            reasons.push("Moderate dryness, delaying irrigation".to_owned());
            (Decision::Delay, DELAY_CONFIDENCE)
        } else {
            reasons.push("Soil moisture within acceptable range".to_owned());
            (Decision::Hold, HOLD_CONFIDENCE)
        };

        DecisionOutput {
            decision,
            confidence: round2(confidence),
            utility: score.utility,
            reasons,
            basis: DecisionBasis::Scored,
            score: Some(score),
            timestamp: now,
        }
    }

    /// Seconds since the last actuation, if still inside the window.
    /// An absent `last_action_time` means no cooldown.
    fn cooldown_elapsed(&self, memory: &AgentMemory, now: DateTime<Utc>) -> Option<i64> {
        let last = memory.last_action_time?;
        let elapsed = (now - last).num_seconds();
        (elapsed < self.thresholds.min_interval_secs).then_some(elapsed.max(0))
    }

    /// Compute the utility terms, appending one reason per factor applied.
    pub fn score(&self, reading: &SensorReading, reasons: &mut Vec<String>) -> UtilityScore {
        let dry = self.thresholds.soil_dry_percent;

        let soil_deficit = (dry - reading.soil).clamp(0.0, dry);
        let soil_urgency = soil_deficit / dry * 100.0;
        reasons.push(format!(
            "Soil urgency {:.2}/100 ({:.1}% below the {:.1}% dry threshold)",
            soil_urgency, soil_deficit, dry
        ));

        let temp_penalty = if reading.temperature > self.thresholds.temp_high_c {
            reasons.push(format!(
                "High temperature ({}°C) increases evaporation risk",
                reading.temperature
            ));
            self.utility.temp_penalty
        } else {
            1.0
        };

        let light_factor = if reading.light >= self.thresholds.light_day {
            1.0
        } else {
            reasons.push("Low light detected (non-ideal irrigation window)".to_owned());
            self.utility.low_light_factor
        };

        let utility = round2(soil_urgency * temp_penalty * light_factor);
        reasons.push(format!(
            "Utility {utility:.2} = urgency {soil_urgency:.2} x temperature penalty {temp_penalty:.2} x light factor {light_factor:.2}"
        ));

        UtilityScore {
            soil_deficit,
            soil_urgency,
            temp_penalty,
            light_factor,
            utility,
        }
    }

    /// Confidence grows with distance from the dry threshold.
    fn distance_confidence(&self, soil: f64) -> f64 {
        let distance = (soil - self.thresholds.soil_dry_percent).abs();
        (distance / self.utility.confidence_span).clamp(0.0, 1.0)
    }
}
