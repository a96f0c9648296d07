//! Concurrent ingests against one shared service.

use std::sync::Arc;
use std::thread;

use crate::mock_tools::{RecordingSink, at, payload};

use agrosense::adapters::tools::NoTool;
use agrosense::app::commands::AppCommand;
use agrosense::app::service::AppService;
use agrosense::config::AgentConfig;
use agrosense::scenario::ScenarioMode;

const THREADS: u32 = 8;
const PER_THREAD: u32 = 25;

#[test]
fn concurrent_ingests_for_one_device_lose_no_updates() {
    let app = Arc::new(AppService::new(AgentConfig::default(), NoTool, NoTool));
    app.handle_command(
        AppCommand::SetScenario {
            device_id: "shared".to_owned(),
            mode: ScenarioMode::Rain,
        },
        &mut RecordingSink::new(),
    )
    .unwrap();

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let app = Arc::clone(&app);
            thread::spawn(move || {
                let mut sink = RecordingSink::new();
                for i in 0..PER_THREAD {
                    // Every sample is dry soil under a rain forecast: one avoided cycle each.
                    app.ingest(
                        &payload("shared", 20.0, 25.0, 2500, None),
                        at(i64::from(t * PER_THREAD + i)),
                        &mut sink,
                    )
                    .unwrap();
                }
                sink.events.len()
            })
        })
        .collect();

    for h in handles {
        assert!(h.join().unwrap() >= PER_THREAD as usize);
    }

    let metrics = app.metrics("shared").unwrap();
    assert_eq!(metrics.pump_cycles_avoided, THREADS * PER_THREAD);
    assert!((metrics.water_saved_liters - 24.0 * f64::from(THREADS * PER_THREAD)).abs() < 1e-6);

    let state = app.state("shared").unwrap();
    assert_eq!(state.memory.soil_history.len(), 20);
    assert_eq!(app.timeline("shared").unwrap().len(), 30);
    // 200 countdown steps of 3 minutes from 90 floors at zero.
    assert_eq!(app.scenario("shared").unwrap().rain_eta_minutes, Some(0));
}

#[test]
fn devices_do_not_share_memory() {
    let app = Arc::new(AppService::new(AgentConfig::default(), NoTool, NoTool));
    let handles: Vec<_> = ["north", "south"]
        .into_iter()
        .map(|id| {
            let app = Arc::clone(&app);
            thread::spawn(move || {
                let soil = if id == "north" { 10.0 } else { 60.0 };
                app.ingest(&payload(id, soil, 25.0, 2500, None), at(0), &mut RecordingSink::new())
                    .unwrap()
                    .decision
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    assert!(app.state("north").unwrap().memory.last_action_time.is_some());
    assert!(app.state("south").unwrap().memory.last_action_time.is_none());
    assert_eq!(app.devices(), vec!["north".to_owned(), "south".to_owned()]);
}
