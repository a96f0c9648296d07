//! AgroSense demo replay.
//!
//! Drives the agent through the scripted "rain prevents irrigation"
//! scenario on a simulated clock and logs every decision plus the final
//! impact metrics.
//!
//! ```text
//! agrosense [config.json]        RUST_LOG=debug for tool/diagnostic detail
//! ```

use anyhow::{Context, Result};
use chrono::{TimeZone, Utc};
use log::info;
use serde_json::json;

use agrosense::adapters::json_config::JsonConfigAdapter;
use agrosense::adapters::log_sink::LogEventSink;
use agrosense::adapters::time::SimulatedClock;
use agrosense::adapters::tools::NoTool;
use agrosense::app::ports::{ClockPort, ConfigPort};
use agrosense::app::service::AppService;
use agrosense::config::AgentConfig;
use agrosense::telemetry::RainHint;

const DEVICE_ID: &str = "esp32_demo";

/// One scripted telemetry sample.
struct Phase {
    soil: f64,
    temp: f64,
    light: u32,
    rain_minutes: Option<i32>,
    /// Seconds until the next sample.
    duration_secs: i64,
}

const fn phase(soil: f64, temp: f64, light: u32, rain_minutes: Option<i32>, duration_secs: i64) -> Phase {
    Phase {
        soil,
        temp,
        light,
        rain_minutes,
        duration_secs,
    }
}

const SCENARIO: [Phase; 14] = [
    // Normal irrigation
    phase(32.0, 28.0, 2800, None, 6),
    phase(28.0, 29.0, 2900, None, 6),
    // Rain forecast appears
    phase(24.0, 30.0, 2700, Some(88), 9),
    phase(22.0, 31.0, 2500, Some(75), 9),
    phase(20.0, 32.0, 2300, Some(60), 9),
    phase(18.0, 33.0, 2100, Some(45), 9),
    phase(16.0, 33.0, 1800, Some(30), 9),
    phase(15.0, 32.0, 1500, Some(15), 9),
    // Rain arrives, soil recovers
    phase(18.0, 28.0, 800, Some(0), 9),
    phase(28.0, 26.0, 600, Some(-10), 9),
    phase(38.0, 25.0, 900, Some(-20), 9),
    phase(45.0, 26.0, 1200, Some(-30), 9),
    // Post-rain
    phase(42.0, 27.0, 2000, None, 12),
    phase(40.0, 28.0, 2200, None, 12),
];

fn load_config() -> Result<AgentConfig> {
    match std::env::args().nth(1) {
        Some(path) => JsonConfigAdapter::new(&path)
            .load()
            .map_err(anyhow::Error::new)
            .with_context(|| format!("loading config from {path}")),
        None => Ok(AgentConfig::default()),
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("AgroSense v{} demo replay", env!("CARGO_PKG_VERSION"));

    let config = load_config()?;
    config
        .validate()
        .map_err(anyhow::Error::new)
        .context("invalid configuration")?;

    let app = AppService::new(config, NoTool, NoTool);
    let clock = SimulatedClock::starting_at(Utc.with_ymd_and_hms(2025, 6, 1, 6, 0, 0).single().context("start time")?);
    let mut sink = LogEventSink::new();

    for (i, p) in SCENARIO.iter().enumerate() {
        let payload = json!({
            "device_id": DEVICE_ID,
            "sensors": { "soil": p.soil, "temp": p.temp, "light": p.light },
            "rain_minutes": p.rain_minutes,
        });
        let weather = p
            .rain_minutes
            .map_or_else(|| "no forecast".to_owned(), |m| RainHint::from_minutes(m).describe());
        info!(
            "Phase {:>2}: soil={}% temp={}°C light={} weather={}",
            i + 1,
            p.soil,
            p.temp,
            p.light,
            weather
        );

        let response = app
            .ingest(&serde_json::to_vec(&payload)?, clock.now(), &mut sink)
            .map_err(anyhow::Error::new)
            .with_context(|| format!("phase {}", i + 1))?;
        for line in response.explain().lines() {
            info!("  {}", line);
        }
        info!("  Assistant: {}", response.agents.farmer_assistant.message);

        clock.advance_secs(p.duration_secs);
    }

    let metrics = app.metrics(DEVICE_ID).map_err(anyhow::Error::new)?;
    info!(
        "Replay complete: {} pump cycles avoided, {:.1} L water saved",
        metrics.pump_cycles_avoided, metrics.water_saved_liters
    );
    Ok(())
}
