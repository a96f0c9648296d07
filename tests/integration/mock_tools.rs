//! Mock tool adapters and helpers for integration tests.
//!
//! Records every event and insight request so tests can assert on the
//! full interaction history without a real forecast provider.

use std::cell::RefCell;

use agrosense::ToolError;
use agrosense::app::events::AppEvent;
use agrosense::app::ports::{EventSink, ForecastPort, InsightPort, InsightRequest, RainForecast};
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::json;

// ── Event sink ────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Forecast mocks ────────────────────────────────────────────

/// Always answers with the same result.
pub struct FixedForecast(pub Result<RainForecast, ToolError>);

impl FixedForecast {
    #[allow(dead_code)]
    pub fn rain_in(minutes: u32) -> Self {
        Self(Ok(RainForecast {
            rain_expected: true,
            eta_minutes: Some(minutes),
        }))
    }
}

impl ForecastPort for FixedForecast {
    async fn rain_forecast(&self, _device_id: &str) -> Result<RainForecast, ToolError> {
        self.0.clone()
    }
}

/// Never answers; only a timeout gets the caller out.
pub struct HangingForecast;

impl ForecastPort for HangingForecast {
    async fn rain_forecast(&self, _device_id: &str) -> Result<RainForecast, ToolError> {
        futures_lite::future::pending().await
    }
}

// ── Insight mock ──────────────────────────────────────────────

/// Replies with a canned result and keeps every request it saw.
pub struct RecordingInsight {
    reply: Result<String, ToolError>,
    pub requests: RefCell<Vec<InsightRequest>>,
}

#[allow(dead_code)]
impl RecordingInsight {
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Ok(text.to_owned()),
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn failing(msg: &str) -> Self {
        Self {
            reply: Err(ToolError::Failed(msg.to_owned())),
            requests: RefCell::new(Vec::new()),
        }
    }
}

impl InsightPort for RecordingInsight {
    async fn insight(&self, request: &InsightRequest) -> Result<String, ToolError> {
        self.requests.borrow_mut().push(request.clone());
        self.reply.clone()
    }
}

// ── Helpers ───────────────────────────────────────────────────

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 6, 0, 0).unwrap()
}

#[allow(dead_code)]
pub fn at(secs: i64) -> DateTime<Utc> {
    t0() + Duration::seconds(secs)
}

/// Telemetry payload in the device wire format.
pub fn payload(device_id: &str, soil: f64, temp: f64, light: u32, rain_minutes: Option<i32>) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "device_id": device_id,
        "sensors": { "soil": soil, "temp": temp, "light": light },
        "rain_minutes": rain_minutes,
    }))
    .unwrap()
}
