//! Integration tests for operator scenario control.

use crate::mock_tools::{RecordingSink, at, payload, t0};

use agrosense::adapters::tools::NoTool;
use agrosense::app::commands::AppCommand;
use agrosense::app::events::AppEvent;
use agrosense::app::service::AppService;
use agrosense::config::AgentConfig;
use agrosense::engine::types::Decision;
use agrosense::metrics::ImpactMetrics;
use agrosense::orchestrator::OverrideSource;
use agrosense::scenario::ScenarioMode;
use agrosense::{Error, IngestError, SafetyFault};

fn make_app() -> (AppService<NoTool, NoTool>, RecordingSink) {
    (
        AppService::new(AgentConfig::default(), NoTool, NoTool),
        RecordingSink::new(),
    )
}

fn set(app: &AppService<NoTool, NoTool>, sink: &mut RecordingSink, mode: ScenarioMode) {
    app.handle_command(
        AppCommand::SetScenario {
            device_id: "d1".to_owned(),
            mode,
        },
        sink,
    )
    .unwrap();
}

#[test]
fn rain_scenario_arms_eta_and_counts_down_per_ingest() {
    let (app, mut sink) = make_app();
    set(&app, &mut sink, ScenarioMode::Rain);
    assert_eq!(app.scenario("d1").unwrap().rain_eta_minutes, Some(90));

    let resp = app
        .ingest(&payload("d1", 20.0, 25.0, 2500, None), t0(), &mut sink)
        .unwrap();
    assert_eq!(resp.decision, Decision::Hold);
    assert_eq!(resp.agents.climate_agent.rain_eta_minutes, Some(87));
    assert!(resp.explanation.last().unwrap().contains("Rain expected in 87 minutes"));

    app.ingest(&payload("d1", 20.0, 25.0, 2500, None), at(10), &mut sink)
        .unwrap();
    assert_eq!(app.scenario("d1").unwrap().rain_eta_minutes, Some(84));
}

#[test]
fn rain_scenario_outranks_device_hint() {
    let (app, mut sink) = make_app();
    set(&app, &mut sink, ScenarioMode::Rain);
    let resp = app
        .ingest(&payload("d1", 20.0, 25.0, 2500, Some(20)), t0(), &mut sink)
        .unwrap();
    assert_eq!(resp.agents.climate_agent.rain_eta_minutes, Some(87));
}

#[test]
fn pump_fail_stops_regardless_of_sensors() {
    let (app, mut sink) = make_app();
    set(&app, &mut sink, ScenarioMode::PumpFail);

    for (soil, secs) in [(5.0, 0), (50.0, 10), (95.0, 20)] {
        let resp = app
            .ingest(&payload("d1", soil, 25.0, 2500, None), at(secs), &mut sink)
            .unwrap();
        assert_eq!(resp.decision, Decision::EmergencyStop);
        assert_eq!(
            resp.agents.decision_agent.override_source,
            Some(OverrideSource::PumpFailScenario)
        );
        assert_eq!(resp.fault_flags, SafetyFault::PumpFailure.mask());
        assert!(resp.agents.farmer_assistant.message.starts_with("Pump failure detected"));
    }
    // Raised once, not on every ingest.
    assert_eq!(sink.count(|e| matches!(e, AppEvent::FaultDetected { .. })), 1);
}

#[test]
fn back_to_normal_resets_metrics_but_keeps_timeline() {
    let (app, mut sink) = make_app();
    set(&app, &mut sink, ScenarioMode::Rain);
    for secs in [0, 10] {
        app.ingest(&payload("d1", 20.0, 25.0, 2500, None), at(secs), &mut sink)
            .unwrap();
    }
    let metrics = app.metrics("d1").unwrap();
    assert_eq!(metrics.pump_cycles_avoided, 2);
    assert!((metrics.water_saved_liters - 48.0).abs() < 1e-9);

    set(&app, &mut sink, ScenarioMode::Normal);
    assert_eq!(app.metrics("d1").unwrap(), ImpactMetrics::default());
    assert_eq!(app.timeline("d1").unwrap().len(), 2);
    assert_eq!(app.scenario("d1").unwrap().rain_eta_minutes, None);
    assert!(matches!(sink.events.last(), Some(AppEvent::MetricsReset { .. })));
}

#[test]
fn pump_fail_does_not_reset_metrics() {
    let (app, mut sink) = make_app();
    set(&app, &mut sink, ScenarioMode::Rain);
    app.ingest(&payload("d1", 20.0, 25.0, 2500, None), t0(), &mut sink)
        .unwrap();
    set(&app, &mut sink, ScenarioMode::PumpFail);
    assert_eq!(app.metrics("d1").unwrap().pump_cycles_avoided, 1);
}

#[test]
fn control_payload_rejects_unknown_mode() {
    let (app, mut sink) = make_app();
    let err = app
        .control(br#"{"device_id":"d1","mode":"FLOOD"}"#, &mut sink)
        .unwrap_err();
    assert!(matches!(err, Error::Ingest(IngestError::Malformed(_))));
    assert!(app.devices().is_empty());

    app.control(br#"{"device_id":"d1","mode":"RAIN"}"#, &mut sink)
        .unwrap();
    assert_eq!(app.scenario("d1").unwrap().mode, ScenarioMode::Rain);
}

#[test]
fn reset_device_forgets_everything() {
    let (app, mut sink) = make_app();
    app.ingest(&payload("d1", 10.0, 25.0, 2500, None), t0(), &mut sink)
        .unwrap();
    app.handle_command(
        AppCommand::ResetDevice {
            device_id: "d1".to_owned(),
        },
        &mut sink,
    )
    .unwrap();
    assert!(app.state("d1").is_err());

    // Fresh shadow: no cooldown carried over.
    let resp = app
        .ingest(&payload("d1", 10.0, 25.0, 2500, None), at(5), &mut sink)
        .unwrap();
    assert_eq!(resp.decision, Decision::Irrigate);
    assert!((resp.confidence - 0.5).abs() < 1e-9);
}
