//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them (log line, message bus, dashboard push).

use crate::engine::types::Decision;
use crate::error::ToolError;
use crate::orchestrator::OverrideSource;
use crate::scenario::ScenarioMode;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// One ingest produced a final decision.
    DecisionMade {
        device_id: String,
        decision: Decision,
        confidence: f64,
        utility: f64,
        reason: String,
        override_source: Option<OverrideSource>,
    },

    /// One or more safety faults were raised (bitmask of new faults).
    FaultDetected { device_id: String, faults: u8 },

    /// Safety faults cleared on this ingest (bitmask).
    FaultCleared { device_id: String, faults: u8 },

    /// A best-effort tool failed or timed out; the ingest went on without it.
    ToolDegraded {
        device_id: String,
        tool: &'static str,
        error: ToolError,
    },

    /// The operator changed a device's scenario mode.
    ScenarioChanged {
        device_id: String,
        from: ScenarioMode,
        to: ScenarioMode,
    },

    /// Impact metrics were zeroed by a return to NORMAL.
    MetricsReset { device_id: String },

    /// The device shadow was dropped.
    DeviceReset { device_id: String },
}
