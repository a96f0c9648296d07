//! Integration tests for the ingest pipeline:
//! payload → engine → diagnostics → orchestrator → shadow → metrics.

use crate::mock_tools::{
    FixedForecast, HangingForecast, RecordingInsight, RecordingSink, at, payload, t0,
};

use agrosense::adapters::tools::NoTool;
use agrosense::app::events::AppEvent;
use agrosense::app::service::AppService;
use agrosense::config::AgentConfig;
use agrosense::diagnostics::DiagnosticKind;
use agrosense::engine::types::Decision;
use agrosense::orchestrator::OverrideSource;
use agrosense::views::PumpState;
use agrosense::{Error, IngestError, SafetyFault, ToolError};

fn make_app() -> (AppService<NoTool, NoTool>, RecordingSink) {
    (
        AppService::new(AgentConfig::default(), NoTool, NoTool),
        RecordingSink::new(),
    )
}

// ── Scoring and hysteresis ────────────────────────────────────

#[test]
fn critically_dry_soil_irrigates_with_distance_confidence() {
    let (app, mut sink) = make_app();
    let resp = app
        .ingest(&payload("d1", 10.0, 25.0, 2500, None), t0(), &mut sink)
        .unwrap();

    assert_eq!(resp.decision, Decision::Irrigate);
    assert!((resp.utility - 66.67).abs() < 1e-9);
    assert!((resp.confidence - 0.5).abs() < 1e-9);
    assert_eq!(resp.agents.field_agent.pump_state, PumpState::On);
    assert!(resp.explanation.iter().any(|r| r == "Soil critically dry (10%)"));
}

#[test]
fn mild_deficit_holds() {
    let (app, mut sink) = make_app();
    let resp = app
        .ingest(&payload("d1", 20.0, 25.0, 2500, None), t0(), &mut sink)
        .unwrap();
    assert_eq!(resp.decision, Decision::Hold);
    assert!((resp.utility - 33.33).abs() < 1e-9);
}

#[test]
fn cooldown_echoes_last_decision_and_ignores_sensors() {
    let (app, mut sink) = make_app();
    app.ingest(&payload("d1", 10.0, 25.0, 2500, None), t0(), &mut sink)
        .unwrap();

    let resp = app
        .ingest(&payload("d1", 90.0, 40.0, 100, None), at(60), &mut sink)
        .unwrap();
    assert_eq!(resp.decision, Decision::Irrigate);
    assert!((resp.confidence - 1.0).abs() < f64::EPSILON);
    assert!(resp.utility.abs() < f64::EPSILON);
    assert_eq!(resp.explanation, vec!["Cooldown active (60s since last action)".to_owned()]);

    // The echo did not re-arm the window: it still expires 300 s after t0.
    let resp = app
        .ingest(&payload("d1", 90.0, 25.0, 2500, None), at(300), &mut sink)
        .unwrap();
    assert_eq!(resp.decision, Decision::Hold);
    assert_eq!(
        app.state("d1").unwrap().memory.last_action_time,
        Some(t0())
    );
}

#[test]
fn out_of_bounds_sensor_is_an_emergency_stop_not_an_error() {
    let (app, mut sink) = make_app();
    let resp = app
        .ingest(&payload("d1", 150.0, 25.0, 2500, None), t0(), &mut sink)
        .unwrap();
    assert_eq!(resp.decision, Decision::EmergencyStop);
    assert!((resp.confidence - 1.0).abs() < f64::EPSILON);
    assert!(resp.utility.abs() < f64::EPSILON);
    assert_eq!(resp.explanation.len(), 1);

    let state = app.state("d1").unwrap();
    assert_eq!(state.diagnostics[0].kind, DiagnosticKind::SensorBounds);
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::FaultDetected { faults, .. } if *faults == SafetyFault::SoilOutOfBounds.mask())),
        1
    );
}

#[test]
fn rain_hold_applies_over_a_sensor_stop() {
    let (app, mut sink) = make_app();
    let resp = app
        .ingest(&payload("d1", 20.0, 70.0, 2500, Some(30)), t0(), &mut sink)
        .unwrap();
    assert_eq!(resp.decision, Decision::Hold);
    assert_eq!(
        resp.agents.decision_agent.override_source,
        Some(OverrideSource::RainExpected)
    );
    assert!(resp.explanation[0].starts_with("Temperature sensor out of physical bounds"));
    assert!(resp.explanation.last().unwrap().contains("Rain expected in 30 minutes"));
    assert_eq!(resp.fault_flags, SafetyFault::TemperatureOutOfBounds.mask());
    assert_eq!(resp.metrics.pump_cycles_avoided, 1);
}

// ── Diagnostics ───────────────────────────────────────────────

#[test]
fn irrigation_without_effect_trips_emergency_stop_once() {
    let (app, mut sink) = make_app();
    let send = |soil: f64, secs: i64, sink: &mut RecordingSink| {
        app.ingest(&payload("d1", soil, 25.0, 2500, None), at(secs), sink)
            .unwrap()
    };

    assert_eq!(send(10.0, 0, &mut sink).decision, Decision::Irrigate);
    assert_eq!(send(10.0, 60, &mut sink).decision, Decision::Irrigate);

    let tripped = send(9.0, 120, &mut sink);
    assert_eq!(tripped.decision, Decision::EmergencyStop);
    assert_eq!(
        tripped.agents.decision_agent.override_source,
        Some(OverrideSource::DiagnosticFault)
    );
    assert!(tripped.explanation.last().unwrap().starts_with("Pump fault suspected"));
    assert_eq!(tripped.fault_flags, SafetyFault::ActuationNoEffect.mask());

    // The stop is not latched: the next call sees EMERGENCY_STOP as the last
    // command, so diagnostics stay silent and the cooldown echoes HOLD.
    let after = send(9.0, 180, &mut sink);
    assert_eq!(after.decision, Decision::Hold);
    assert_eq!(after.fault_flags, 0);
}

#[test]
fn rising_soil_after_irrigation_is_healthy() {
    let (app, mut sink) = make_app();
    for (soil, secs) in [(10.0, 0), (14.0, 60), (19.0, 120)] {
        let resp = app
            .ingest(&payload("d1", soil, 25.0, 2500, None), at(secs), &mut sink)
            .unwrap();
        assert_eq!(resp.decision, Decision::Irrigate);
    }
    assert_eq!(app.state("d1").unwrap().fault_flags, 0);
}

// ── Rain ──────────────────────────────────────────────────────

#[test]
fn rain_hint_holds_dry_soil_and_keeps_both_reasons() {
    let (app, mut sink) = make_app();
    let resp = app
        .ingest(&payload("d1", 10.0, 25.0, 2500, Some(45)), t0(), &mut sink)
        .unwrap();

    assert_eq!(resp.decision, Decision::Hold);
    assert!((resp.utility - 66.67).abs() < 1e-9, "utility is not recomputed");
    assert!((resp.confidence - 0.5).abs() < 1e-9, "confidence is not recomputed");
    assert!(resp.explanation.iter().any(|r| r.starts_with("Soil critically dry")));
    assert!(resp.explanation.last().unwrap().contains("Rain expected in 45 minutes"));

    assert_eq!(resp.metrics.pump_cycles_avoided, 1);
    assert!((resp.metrics.water_saved_liters - 24.0).abs() < 1e-9);
    assert_eq!(app.state("d1").unwrap().memory.last_action_time, None);
}

#[test]
fn recent_rain_is_not_a_forecast() {
    let (app, mut sink) = make_app();
    let resp = app
        .ingest(&payload("d1", 10.0, 25.0, 2500, Some(-10)), t0(), &mut sink)
        .unwrap();
    assert_eq!(resp.decision, Decision::Irrigate);
    assert!(!resp.agents.climate_agent.rain_expected);
}

#[test]
fn forecast_provider_alone_can_hold() {
    let app = AppService::new(AgentConfig::default(), FixedForecast::rain_in(30), NoTool);
    let mut sink = RecordingSink::new();
    let resp = app
        .ingest(&payload("d1", 20.0, 25.0, 2500, None), t0(), &mut sink)
        .unwrap();
    assert_eq!(resp.decision, Decision::Hold);
    assert_eq!(resp.agents.climate_agent.rain_eta_minutes, Some(30));
    assert_eq!(
        resp.agents.decision_agent.override_source,
        Some(OverrideSource::RainExpected)
    );
}

// ── Tool degradation ──────────────────────────────────────────

#[test]
fn hanging_forecast_times_out_and_degrades() {
    let mut config = AgentConfig::default();
    config.tools.forecast_timeout_ms = 50;
    let app = AppService::new(config, HangingForecast, NoTool);
    let mut sink = RecordingSink::new();

    let resp = app
        .ingest(&payload("d1", 10.0, 25.0, 2500, None), t0(), &mut sink)
        .unwrap();
    assert_eq!(resp.decision, Decision::Irrigate, "core decision unaffected");

    assert!(sink.events.iter().any(|e| matches!(
        e,
        AppEvent::ToolDegraded { error: ToolError::Timeout, .. }
    )));
    let diagnostics = app.state("d1").unwrap().diagnostics;
    assert!(diagnostics.iter().any(|d| d.kind == DiagnosticKind::ToolDegraded));
}

#[test]
fn insight_decorates_the_assistant_view() {
    let app = AppService::new(
        AgentConfig::default(),
        NoTool,
        RecordingInsight::replying("Mulch the beds to slow evaporation."),
    );
    let mut sink = RecordingSink::new();
    let resp = app
        .ingest(&payload("d1", 20.0, 34.0, 2500, Some(30)), t0(), &mut sink)
        .unwrap();
    assert_eq!(
        resp.agents.farmer_assistant.insight.as_deref(),
        Some("Mulch the beds to slow evaporation.")
    );
}

#[test]
fn insight_sees_the_final_decision() {
    let insight = RecordingInsight::replying("ok");
    let app = AppService::new(AgentConfig::default(), NoTool, &insight);
    let mut sink = RecordingSink::new();
    app.ingest(&payload("d1", 10.0, 25.0, 2500, Some(20)), t0(), &mut sink)
        .unwrap();

    let requests = insight.requests.borrow();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].decision, Decision::Hold, "post-override label, not the engine's");
    assert!(requests[0].rain_expected);
    assert!(requests[0].reasons.len() >= 2);
}

#[test]
fn failing_insight_is_dropped() {
    let app = AppService::new(
        AgentConfig::default(),
        NoTool,
        RecordingInsight::failing("quota exceeded"),
    );
    let mut sink = RecordingSink::new();
    let resp = app
        .ingest(&payload("d1", 50.0, 25.0, 2500, None), t0(), &mut sink)
        .unwrap();
    assert_eq!(resp.decision, Decision::Hold);
    assert!(resp.agents.farmer_assistant.insight.is_none());
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::ToolDegraded { tool: "insight", .. })),
        1
    );
}

// ── Boundary and bounds ───────────────────────────────────────

#[test]
fn malformed_payload_leaves_shadow_untouched() {
    let (app, mut sink) = make_app();
    app.ingest(&payload("d1", 50.0, 25.0, 2500, None), t0(), &mut sink)
        .unwrap();
    let before = app.state("d1").unwrap();

    let err = app
        .ingest(br#"{"device_id":"d1","sensors":{"soil":"wet"}}"#, at(10), &mut sink)
        .unwrap_err();
    assert!(matches!(err, IngestError::Malformed(_)));
    assert_eq!(app.state("d1").unwrap(), before);
}

#[test]
fn histories_stay_bounded() {
    let (app, mut sink) = make_app();
    for i in 0..40 {
        app.ingest(
            &payload("d1", 50.0 + f64::from(i % 5), 25.0, 2500, None),
            at(i64::from(i) * 400),
            &mut sink,
        )
        .unwrap();
    }
    let state = app.state("d1").unwrap();
    assert_eq!(state.memory.soil_history.len(), 20);
    assert_eq!(app.timeline("d1").unwrap().len(), 30);
}

#[test]
fn queries_do_not_mutate() {
    let (app, mut sink) = make_app();
    app.ingest(&payload("d1", 20.0, 25.0, 2500, Some(30)), t0(), &mut sink)
        .unwrap();
    let a = app.state("d1").unwrap();
    let _ = app.timeline("d1").unwrap();
    let _ = app.metrics("d1").unwrap();
    assert_eq!(app.state("d1").unwrap(), a);
    assert_eq!(app.metrics("ghost"), Err(Error::UnknownDevice("ghost".to_owned())));
}
