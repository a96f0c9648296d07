//! Application service: the hexagonal core.
//!
//! [`AppService`] owns the device shadows, the decision pipeline and the
//! tool adapters.  It exposes a transport-agnostic API: feed it raw
//! telemetry bytes and operator commands, query it for dashboard state.
//!
//! ```text
//!  ForecastPort ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!                   │          AppService           │
//!   InsightPort ◀──▶│ Engine · Diagnostics · Orch.  │
//!                   │        ShadowStore            │
//!                   └──────────────────────────────┘
//! ```
//!
//! One ingest runs in three phases.  The forecast tool is called first,
//! outside any lock.  All decision logic then runs inside a single
//! [`ShadowStore::update`] so the device's memory is read and written
//! atomically.  The insight tool is called last, again outside the lock,
//! and only decorates the response.

use core::future::Future;

use chrono::{DateTime, Utc};
use embassy_time::{Duration, TimeoutError, with_timeout};
use futures_lite::future::block_on;
use log::{debug, info, warn};
use serde::Serialize;

use crate::config::AgentConfig;
use crate::diagnostics::{self, DiagnosticEntry, DiagnosticKind, DiagnosticLog};
use crate::engine::DecisionEngine;
use crate::engine::types::{Decision, SensorReading, render_explanation};
use crate::error::{Error, IngestError, SafetyFault, ToolError};
use crate::metrics::{DecisionSample, ImpactMetrics, MetricsRecorder, TimelineEntry};
use crate::orchestrator::{ExternalSignals, OrchestratedDecision, RainOutlook, ToolOrchestrator};
use crate::safety::{self, FaultTransition};
use crate::scenario::{ScenarioMode, ScenarioOverride};
use crate::shadow::{AgentMemory, DeviceRecord, LatestSnapshot, ShadowStore};
use crate::telemetry::{self, IngestRequest};
use crate::views::AgentViews;

use super::commands::AppCommand;
use super::events::AppEvent;
use super::ports::{EventSink, ForecastPort, InsightPort, InsightRequest, RainForecast};

const FORECAST_TOOL: &str = "forecast";
const INSIGHT_TOOL: &str = "insight";

// ───────────────────────────────────────────────────────────────
// Responses
// ───────────────────────────────────────────────────────────────

/// Everything the dashboard needs after one ingest.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestResponse {
    pub device_id: String,
    pub timestamp: DateTime<Utc>,
    pub decision: Decision,
    pub confidence: f64,
    pub utility: f64,
    /// Engine reasons followed by the override reason, if any.
    pub explanation: Vec<String>,
    pub agents: AgentViews,
    pub metrics: ImpactMetrics,
    pub scenario: ScenarioMode,
    /// Bitmask of safety faults active after this ingest.
    pub fault_flags: u8,
}

impl IngestResponse {
    pub fn explain(&self) -> String {
        render_explanation(self.decision, self.confidence, self.utility, &self.explanation)
    }
}

/// Read-only view of one device shadow.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateSnapshot {
    pub device_id: String,
    pub timestamp: Option<DateTime<Utc>>,
    pub sensors: Option<SensorReading>,
    pub decision: Option<Decision>,
    pub agents: Option<AgentViews>,
    pub explanation: Vec<String>,
    pub diagnostics: Vec<DiagnosticEntry>,
    pub memory: AgentMemory,
    pub scenario: ScenarioOverride,
    pub metrics: ImpactMetrics,
    pub fault_flags: u8,
}

impl StateSnapshot {
    fn capture(device_id: &str, record: &DeviceRecord) -> Self {
        let latest = record.latest.as_ref();
        Self {
            device_id: device_id.to_owned(),
            timestamp: latest.map(|l| l.timestamp),
            sensors: latest.map(|l| l.sensors),
            decision: latest.map(|l| l.decision.decision()),
            agents: latest.map(|l| l.agents.clone()),
            explanation: latest.map(|l| l.decision.reasons()).unwrap_or_default(),
            diagnostics: record.diagnostics.to_vec(),
            memory: record.memory.clone(),
            scenario: record.scenario,
            metrics: record.metrics,
            fault_flags: record.faults.faults(),
        }
    }
}

/// Result of the locked phase of one ingest.
struct Decided {
    decision: OrchestratedDecision,
    rain: RainOutlook,
    agents: AgentViews,
    metrics: ImpactMetrics,
    scenario: ScenarioMode,
    faults: u8,
    transition: FaultTransition,
    avoided: bool,
}

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct AppService<F, I> {
    config: AgentConfig,
    engine: DecisionEngine,
    orchestrator: ToolOrchestrator,
    recorder: MetricsRecorder,
    shadows: ShadowStore,
    forecast: F,
    insight: I,
}

impl<F: ForecastPort, I: InsightPort> AppService<F, I> {
    /// Construct the service.  `config` is expected to have passed
    /// [`AgentConfig::validate`] already.
    pub fn new(config: AgentConfig, forecast: F, insight: I) -> Self {
        Self {
            engine: DecisionEngine::new(&config),
            orchestrator: ToolOrchestrator::new(&config.overrides),
            recorder: MetricsRecorder::new(&config.metrics),
            shadows: ShadowStore::new(),
            config,
            forecast,
            insight,
        }
    }

    // ── Ingest ────────────────────────────────────────────────

    /// Parse a raw telemetry payload and run one decision cycle.
    ///
    /// A payload that fails to parse is rejected before any device state
    /// is touched.
    pub fn ingest(
        &self,
        payload: &[u8],
        now: DateTime<Utc>,
        sink: &mut impl EventSink,
    ) -> Result<IngestResponse, IngestError> {
        let request = telemetry::parse_ingest(payload).inspect_err(|e| {
            warn!("Rejected telemetry payload: {}", e);
        })?;
        Ok(self.ingest_request(&request, now, sink))
    }

    /// Run one decision cycle for an already-validated request.
    pub fn ingest_request(
        &self,
        request: &IngestRequest,
        now: DateTime<Utc>,
        sink: &mut impl EventSink,
    ) -> IngestResponse {
        let device_id = request.device_id.as_str();
        let mut degraded: Vec<(&'static str, ToolError)> = Vec::new();

        // 1. Forecast, outside the lock.  A RAIN scenario outranks the
        //    provider, so the call is skipped while one is active.
        let scenario_rain = self
            .shadows
            .read(device_id, |record| record.scenario.rain_expected())
            .unwrap_or(false);
        let forecast = if scenario_rain {
            debug!("[{}] RAIN scenario active, forecast not queried", device_id);
            None
        } else {
            match call_tool(
                self.forecast.rain_forecast(device_id),
                self.config.tools.forecast_timeout_ms,
            ) {
                Ok(f) => Some(f),
                Err(e) => {
                    note_tool_failure(device_id, FORECAST_TOOL, &e, &mut degraded);
                    None
                }
            }
        };

        // 2. Atomic shadow update
        let forecast_failure = degraded.first().cloned();
        let mut decided = self.shadows.update(device_id, |record| {
            if let Some((tool, e)) = &forecast_failure {
                log_tool_degraded(&mut record.diagnostics, now, tool, e);
            }
            self.decide(record, request, forecast.as_ref(), now)
        });

        // 3. Insight, outside the lock
        let insight_request = InsightRequest {
            device_id: device_id.to_owned(),
            sensors: request.sensors,
            decision: decided.decision.decision(),
            rain_expected: decided.rain.expected,
            reasons: decided.decision.reasons(),
        };
        match call_tool(
            self.insight.insight(&insight_request),
            self.config.tools.insight_timeout_ms,
        ) {
            Ok(text) => decided.agents.farmer_assistant.insight = Some(text),
            Err(e) => {
                let before = degraded.len();
                note_tool_failure(device_id, INSIGHT_TOOL, &e, &mut degraded);
                if degraded.len() > before {
                    self.shadows.update_existing(device_id, |record| {
                        log_tool_degraded(&mut record.diagnostics, now, INSIGHT_TOOL, &e);
                    });
                }
            }
        }

        // 4. Events
        self.emit_ingest_events(device_id, &decided, degraded, sink);

        IngestResponse {
            device_id: device_id.to_owned(),
            timestamp: now,
            decision: decided.decision.decision(),
            confidence: decided.decision.confidence(),
            utility: decided.decision.utility(),
            explanation: decided.decision.reasons(),
            agents: decided.agents,
            metrics: decided.metrics,
            scenario: decided.scenario,
            fault_flags: decided.faults,
        }
    }

    /// The locked phase.  Must not block or call tools.
    fn decide(
        &self,
        record: &mut DeviceRecord,
        request: &IngestRequest,
        forecast: Option<&RainForecast>,
        now: DateTime<Utc>,
    ) -> Decided {
        let reading = &request.sensors;

        record
            .scenario
            .advance(self.config.overrides.rain_eta_step_minutes);
        let rain = RainOutlook::resolve(&record.scenario, request.rain_hint(), forecast);

        let base = self.engine.evaluate(reading, &record.memory, now);

        record.memory.observe(reading.soil);
        let fault = diagnostics::evaluate(&record.memory.soil_history, record.memory.last_decision);

        // ── Fault bookkeeping ─────────────────────────────────
        let bounds = safety::check_bounds(reading);
        let mut active = Vec::with_capacity(3);
        active.extend(bounds);
        active.extend(fault.as_ref().map(|f| f.fault));
        if record.scenario.pump_failed() {
            active.push(SafetyFault::PumpFailure);
        }
        let transition = record.faults.evaluate(&active);
        for raised in active.iter().filter(|f| transition.raised & f.mask() != 0) {
            let (kind, message) = match raised {
                SafetyFault::SoilOutOfBounds | SafetyFault::TemperatureOutOfBounds => (
                    DiagnosticKind::SensorBounds,
                    safety::bounds_reason(*raised, reading),
                ),
                SafetyFault::ActuationNoEffect => (
                    DiagnosticKind::ActuationFault,
                    fault
                        .as_ref()
                        .map_or_else(|| raised.to_string(), |f| f.description.clone()),
                ),
                SafetyFault::PumpFailure => {
                    (DiagnosticKind::PumpFailure, "Pump failure reported by operator".to_owned())
                }
            };
            record.diagnostics.push(DiagnosticEntry {
                timestamp: now,
                kind,
                message,
            });
        }

        // ── Orchestration and commit ──────────────────────────
        let signals = ExternalSignals {
            fault,
            scenario: record.scenario.mode,
            rain,
        };
        let decision = self.orchestrator.orchestrate(base, reading.soil, &signals);
        record.memory.commit(&decision, now);

        let avoided = self.recorder.record(
            &mut record.metrics,
            &mut record.timeline,
            &DecisionSample {
                timestamp: now,
                soil: reading.soil,
                decision: decision.decision(),
                reason: decision.final_reason(),
                rain_expected: rain.expected,
            },
        );

        let agents = AgentViews::build(reading, &rain, &decision);
        record.latest = Some(LatestSnapshot {
            timestamp: now,
            sensors: *reading,
            decision: decision.clone(),
            agents: agents.clone(),
        });

        Decided {
            decision,
            rain,
            agents,
            metrics: record.metrics,
            scenario: record.scenario.mode,
            faults: record.faults.faults(),
            transition,
            avoided,
        }
    }

    fn emit_ingest_events(
        &self,
        device_id: &str,
        decided: &Decided,
        degraded: Vec<(&'static str, ToolError)>,
        sink: &mut impl EventSink,
    ) {
        let decision = &decided.decision;
        if decided.avoided {
            info!(
                "[{}] Pump cycle avoided, {:.1} L saved so far",
                device_id, decided.metrics.water_saved_liters
            );
        }

        if decided.transition.raised != 0 {
            sink.emit(&AppEvent::FaultDetected {
                device_id: device_id.to_owned(),
                faults: decided.transition.raised,
            });
        }
        if decided.transition.cleared != 0 {
            sink.emit(&AppEvent::FaultCleared {
                device_id: device_id.to_owned(),
                faults: decided.transition.cleared,
            });
        }
        for (tool, error) in degraded {
            sink.emit(&AppEvent::ToolDegraded {
                device_id: device_id.to_owned(),
                tool,
                error,
            });
        }
        sink.emit(&AppEvent::DecisionMade {
            device_id: device_id.to_owned(),
            decision: decision.decision(),
            confidence: decision.confidence(),
            utility: decision.utility(),
            reason: decision.final_reason().to_owned(),
            override_source: decision.applied.as_ref().map(|o| o.source),
        });
    }

    // ── Command handling ──────────────────────────────────────

    /// Process an operator command.
    pub fn handle_command(&self, cmd: AppCommand, sink: &mut impl EventSink) -> crate::Result<()> {
        match cmd {
            AppCommand::SetScenario { device_id, mode } => {
                if device_id.trim().is_empty() {
                    return Err(IngestError::MissingDeviceId.into());
                }
                let (from, reset) = self.shadows.update(&device_id, |record| {
                    let from = record.scenario.mode;
                    record.scenario.set_mode(mode, &self.config.overrides);
                    let reset = mode == ScenarioMode::Normal;
                    if reset {
                        record.metrics = ImpactMetrics::default();
                    }
                    (from, reset)
                });
                sink.emit(&AppEvent::ScenarioChanged {
                    device_id: device_id.clone(),
                    from,
                    to: mode,
                });
                if reset {
                    sink.emit(&AppEvent::MetricsReset { device_id });
                }
            }
            AppCommand::ResetDevice { device_id } => {
                if self.shadows.remove(&device_id).is_none() {
                    return Err(Error::UnknownDevice(device_id));
                }
                sink.emit(&AppEvent::DeviceReset { device_id });
            }
        }
        Ok(())
    }

    /// Parse a scenario-control payload and apply it.
    pub fn control(&self, payload: &[u8], sink: &mut impl EventSink) -> crate::Result<()> {
        let request = telemetry::parse_scenario(payload)?;
        self.handle_command(request.into(), sink)
    }

    // ── Queries ───────────────────────────────────────────────

    /// Latest snapshot of one device.  Never mutates.
    pub fn state(&self, device_id: &str) -> crate::Result<StateSnapshot> {
        self.shadows
            .read(device_id, |record| StateSnapshot::capture(device_id, record))
            .ok_or_else(|| Error::UnknownDevice(device_id.to_owned()))
    }

    /// Recent decisions, oldest first.
    pub fn timeline(&self, device_id: &str) -> crate::Result<Vec<TimelineEntry>> {
        self.shadows
            .read(device_id, |record| record.timeline.to_vec())
            .ok_or_else(|| Error::UnknownDevice(device_id.to_owned()))
    }

    pub fn metrics(&self, device_id: &str) -> crate::Result<ImpactMetrics> {
        self.shadows
            .read(device_id, |record| record.metrics)
            .ok_or_else(|| Error::UnknownDevice(device_id.to_owned()))
    }

    pub fn scenario(&self, device_id: &str) -> crate::Result<ScenarioOverride> {
        self.shadows
            .read(device_id, |record| record.scenario)
            .ok_or_else(|| Error::UnknownDevice(device_id.to_owned()))
    }

    /// Known device ids, sorted.
    pub fn devices(&self) -> Vec<String> {
        self.shadows.device_ids()
    }
}

// ───────────────────────────────────────────────────────────────
// Tool plumbing
// ───────────────────────────────────────────────────────────────

/// Drive one tool call to completion under a deadline.  One attempt, no retry.
fn call_tool<T>(
    fut: impl Future<Output = Result<T, ToolError>>,
    timeout_ms: u64,
) -> Result<T, ToolError> {
    match block_on(with_timeout(Duration::from_millis(timeout_ms), fut)) {
        Ok(result) => result,
        Err(TimeoutError) => Err(ToolError::Timeout),
    }
}

/// An absent tool is not a degradation; anything else is, and is reported
/// through the event sink.
fn note_tool_failure(
    device_id: &str,
    tool: &'static str,
    error: &ToolError,
    degraded: &mut Vec<(&'static str, ToolError)>,
) {
    match error {
        ToolError::Unavailable(_) => debug!("[{}] {} tool not configured", device_id, tool),
        ToolError::Timeout | ToolError::Failed(_) => degraded.push((tool, error.clone())),
    }
}

fn log_tool_degraded(log: &mut DiagnosticLog, now: DateTime<Utc>, tool: &str, error: &ToolError) {
    log.push(DiagnosticEntry {
        timestamp: now,
        kind: DiagnosticKind::ToolDegraded,
        message: format!("{tool} tool {error}"),
    });
}
