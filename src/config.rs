//! Agent configuration parameters
//!
//! All tunable parameters for the AgroSense agent.  Defaults are the
//! field-calibrated values; a JSON file can override any subset of them
//! (see [`JsonConfigAdapter`](crate::adapters::json_config::JsonConfigAdapter)).

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;

/// Sensor thresholds the decision engine scores against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Soil moisture (%) at and above which there is no irrigation urgency
    pub soil_dry_percent: f64,
    /// Soil moisture (%) considered saturated
    pub soil_wet_percent: f64,
    /// Air temperature (°C) above which evaporation losses are penalised
    pub temp_high_c: f64,
    /// Light level (LDR units) at and above which it is daytime
    pub light_day: u32,
    /// Minimum seconds between two actuations (hysteresis window)
    pub min_interval_secs: i64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            soil_dry_percent: 30.0,
            soil_wet_percent: 80.0,
            temp_high_c: 35.0,
            light_day: 2000,
            min_interval_secs: 300, // 5 min
        }
    }
}

/// Utility model weights and policy cutoffs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UtilityModel {
    /// Utility at or above which the agent irrigates
    pub irrigate_cutoff: f64,
    /// Utility at or above which the agent delays (below irrigate)
    pub delay_cutoff: f64,
    /// Soil distance (%) from the dry threshold that maps to full confidence
    pub confidence_span: f64,
    /// Multiplier applied to urgency in high temperature
    pub temp_penalty: f64,
    /// Multiplier applied to urgency below daylight
    pub low_light_factor: f64,
}

impl Default for UtilityModel {
    fn default() -> Self {
        Self {
            irrigate_cutoff: 60.0,
            delay_cutoff: 35.0,
            confidence_span: 40.0,
            temp_penalty: 0.5,
            low_light_factor: 0.6,
        }
    }
}

/// Parameters of the external-signal override layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverrideConfig {
    /// Rain forces HOLD only while soil is below this moisture (%)
    pub rain_hold_soil_percent: f64,
    /// Minutes the scenario rain ETA counts down per ingest
    pub rain_eta_step_minutes: u32,
    /// ETA armed when the operator switches to the RAIN scenario
    pub rain_scenario_eta_minutes: u32,
}

impl Default for OverrideConfig {
    fn default() -> Self {
        Self {
            rain_hold_soil_percent: 35.0,
            rain_eta_step_minutes: 3,
            rain_scenario_eta_minutes: 90,
        }
    }
}

/// Impact accounting.  Savings are a fixed per-call unit, not a
/// measurement of true elapsed pump time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// A held cycle counts as avoided only while soil is below this (%)
    pub savings_soil_percent: f64,
    /// Nominal pump flow rate
    pub flow_rate_liters_per_minute: f64,
    /// Pump run time credited per avoided cycle
    pub unit_time_minutes: f64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            savings_soil_percent: 30.0,
            flow_rate_liters_per_minute: 8.0,
            unit_time_minutes: 3.0,
        }
    }
}

impl MetricsConfig {
    /// Litres credited for one avoided pump cycle.
    pub fn liters_per_cycle(&self) -> f64 {
        self.flow_rate_liters_per_minute * self.unit_time_minutes
    }
}

/// Time budgets for best-effort external tools.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    pub forecast_timeout_ms: u64,
    pub insight_timeout_ms: u64,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            forecast_timeout_ms: 1500,
            insight_timeout_ms: 2000,
        }
    }
}

/// Core agent configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub thresholds: Thresholds,
    pub utility: UtilityModel,
    pub overrides: OverrideConfig,
    pub metrics: MetricsConfig,
    pub tools: ToolConfig,
}

impl AgentConfig {
    /// Reject incoherent or dangerous values.  Never clamps.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.thresholds;
        let u = &self.utility;

        if !(t.soil_dry_percent > 0.0 && t.soil_dry_percent <= 100.0) {
            return Err(ConfigError::ValidationFailed(
                "thresholds.soil_dry_percent must be in (0, 100]",
            ));
        }
        if t.soil_wet_percent <= t.soil_dry_percent || t.soil_wet_percent > 100.0 {
            return Err(ConfigError::ValidationFailed(
                "thresholds.soil_wet_percent must be above the dry threshold and at most 100",
            ));
        }
        if t.min_interval_secs < 0 {
            return Err(ConfigError::ValidationFailed(
                "thresholds.min_interval_secs must not be negative",
            ));
        }
        if u.delay_cutoff < 0.0 || u.delay_cutoff >= u.irrigate_cutoff {
            return Err(ConfigError::ValidationFailed(
                "utility.delay_cutoff must be non-negative and below irrigate_cutoff",
            ));
        }
        if u.confidence_span <= 0.0 {
            return Err(ConfigError::ValidationFailed(
                "utility.confidence_span must be positive",
            ));
        }
        for factor in [u.temp_penalty, u.low_light_factor] {
            if !(factor > 0.0 && factor <= 1.0) {
                return Err(ConfigError::ValidationFailed(
                    "utility penalty factors must be in (0, 1]",
                ));
            }
        }
        if !(0.0..=100.0).contains(&self.overrides.rain_hold_soil_percent) {
            return Err(ConfigError::ValidationFailed(
                "overrides.rain_hold_soil_percent must be in [0, 100]",
            ));
        }
        if self.metrics.flow_rate_liters_per_minute < 0.0 || self.metrics.unit_time_minutes < 0.0 {
            return Err(ConfigError::ValidationFailed(
                "metrics flow rate and unit time must not be negative",
            ));
        }
        if self.tools.forecast_timeout_ms == 0 || self.tools.insight_timeout_ms == 0 {
            return Err(ConfigError::ValidationFailed(
                "tool timeouts must be non-zero",
            ));
        }
        Ok(())
    }
}
