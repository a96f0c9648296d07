//! Impact metrics and the decision timeline.
//!
//! A pump cycle counts as *avoided* when the agent held off irrigating dry
//! soil because rain was on the way.  Each avoided cycle credits a fixed
//! volume (`flow rate × unit time`); this is a per-call approximation, not
//! a measurement of real pump time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::MetricsConfig;
use crate::engine::types::Decision;
use crate::history::BoundedHistory;

pub const TIMELINE_CAPACITY: usize = 30;

/// Cumulative counters.  Only reset by an explicit return to NORMAL.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ImpactMetrics {
    pub water_saved_liters: f64,
    pub pump_cycles_avoided: u32,
}

/// One decision as seen on the dashboard timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub timestamp: DateTime<Utc>,
    pub soil: f64,
    pub decision: Decision,
    pub reason: String,
    /// Cumulative metrics *after* this decision.
    pub metrics: ImpactMetrics,
}

pub type Timeline = BoundedHistory<TimelineEntry, TIMELINE_CAPACITY>;

/// Inputs the recorder needs from one orchestrated decision.
#[derive(Debug, Clone, Copy)]
pub struct DecisionSample<'a> {
    pub timestamp: DateTime<Utc>,
    pub soil: f64,
    pub decision: Decision,
    pub reason: &'a str,
    pub rain_expected: bool,
}

#[derive(Debug, Clone)]
pub struct MetricsRecorder {
    savings_soil_percent: f64,
    liters_per_cycle: f64,
}

impl MetricsRecorder {
    pub fn new(config: &MetricsConfig) -> Self {
        Self {
            savings_soil_percent: config.savings_soil_percent,
            liters_per_cycle: config.liters_per_cycle(),
        }
    }

    /// Update `metrics` and append a timeline entry.  Returns `true` if the
    /// sample counted as an avoided pump cycle.
    pub fn record(
        &self,
        metrics: &mut ImpactMetrics,
        timeline: &mut Timeline,
        sample: &DecisionSample<'_>,
    ) -> bool {
        let avoided = sample.soil < self.savings_soil_percent
            && sample.decision == Decision::Hold
            && sample.rain_expected;

        if avoided {
            metrics.pump_cycles_avoided = metrics.pump_cycles_avoided.saturating_add(1);
            metrics.water_saved_liters += self.liters_per_cycle;
        }

        timeline.push(TimelineEntry {
            timestamp: sample.timestamp,
            soil: sample.soil,
            decision: sample.decision,
            reason: sample.reason.to_owned(),
            metrics: *metrics,
        });
        avoided
    }
}
