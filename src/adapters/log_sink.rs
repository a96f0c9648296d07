//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the `log` facade.  A message-bus or dashboard-push adapter would
//! implement the same trait.

use log::{error, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] as a single line.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::DecisionMade {
                device_id,
                decision,
                confidence,
                utility,
                reason,
                override_source,
            } => {
                info!(
                    "DECIDE | {} | {} | conf={:.2} utility={:.2} | override={:?} | {}",
                    device_id, decision, confidence, utility, override_source, reason
                );
            }
            AppEvent::FaultDetected { device_id, faults } => {
                error!("FAULT | {} | detected, flags=0b{:08b}", device_id, faults);
            }
            AppEvent::FaultCleared { device_id, faults } => {
                info!("FAULT | {} | cleared, flags=0b{:08b}", device_id, faults);
            }
            AppEvent::ToolDegraded {
                device_id,
                tool,
                error,
            } => {
                warn!("TOOL  | {} | {} degraded: {}", device_id, tool, error);
            }
            AppEvent::ScenarioChanged {
                device_id,
                from,
                to,
            } => {
                info!("SCENE | {} | {} -> {}", device_id, from, to);
            }
            AppEvent::MetricsReset { device_id } => {
                info!("METRC | {} | reset", device_id);
            }
            AppEvent::DeviceReset { device_id } => {
                info!("RESET | {} | shadow dropped", device_id);
            }
        }
    }
}
