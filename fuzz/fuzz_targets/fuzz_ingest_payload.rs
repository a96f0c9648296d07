//! Fuzz target: `AppService::ingest`
//!
//! Drives arbitrary bytes through the telemetry parser and, when they
//! parse, the full decision pipeline.  Asserts that nothing panics, that
//! rejected payloads leave no device shadow behind, and that accepted
//! payloads produce in-range confidence and utility.
//!
//! cargo fuzz run fuzz_ingest_payload

#![no_main]

use agrosense::adapters::tools::NoTool;
use agrosense::app::events::AppEvent;
use agrosense::app::ports::EventSink;
use agrosense::app::service::AppService;
use agrosense::config::AgentConfig;
use chrono::{TimeZone, Utc};
use libfuzzer_sys::fuzz_target;

struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _event: &AppEvent) {}
}

fuzz_target!(|data: &[u8]| {
    let app = AppService::new(AgentConfig::default(), NoTool, NoTool);
    let Some(now) = Utc.with_ymd_and_hms(2025, 6, 1, 6, 0, 0).single() else {
        return;
    };

    match app.ingest(data, now, &mut NullSink) {
        Ok(resp) => {
            // NaN cannot come out of JSON, so every accepted number is finite
            // or rejected by the bounds guardrail.
            assert!((0.0..=1.0).contains(&resp.confidence));
            assert!(resp.utility >= 0.0);
            assert_eq!(app.devices().len(), 1);
        }
        Err(_) => assert!(app.devices().is_empty(), "rejected payload touched state"),
    }
});
