//! Device shadow store.
//!
//! One [`DeviceRecord`] per device id holds everything the agent remembers
//! about that device between ingests: decision memory, scenario override,
//! impact metrics, the timeline, latched faults and the diagnostic log.
//!
//! All records sit behind a single blocking mutex.  Every read-modify-write
//! of a record happens inside one [`ShadowStore::update`] closure, so two
//! concurrent ingests for the same device are serialised and neither update
//! is lost.  Closures must not block or call external tools.

use core::cell::RefCell;
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use serde::Serialize;

use crate::diagnostics::DiagnosticLog;
use crate::engine::types::{Decision, SensorReading};
use crate::history::BoundedHistory;
use crate::metrics::{ImpactMetrics, Timeline};
use crate::orchestrator::OrchestratedDecision;
use crate::safety::FaultLatch;
use crate::scenario::ScenarioOverride;
use crate::views::AgentViews;

pub const SOIL_HISTORY_CAPACITY: usize = 20;

pub type SoilHistory = BoundedHistory<f64, SOIL_HISTORY_CAPACITY>;

/// Decision memory consulted by the engine and the diagnostic evaluator.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AgentMemory {
    /// Time of the last fresh IRRIGATE actuation.
    pub last_action_time: Option<DateTime<Utc>>,
    /// Final label of the previous decision.
    pub last_decision: Option<Decision>,
    pub soil_history: SoilHistory,
}

impl AgentMemory {
    /// Append the reading to the soil history ahead of evaluation.
    pub fn observe(&mut self, soil: f64) {
        self.soil_history.push(soil);
    }

    /// Commit the final decision.  Only a fresh actuation re-arms the
    /// cooldown window.
    pub fn commit(&mut self, decision: &OrchestratedDecision, now: DateTime<Utc>) {
        self.last_decision = Some(decision.decision());
        if decision.actuated() {
            self.last_action_time = Some(now);
        }
    }
}

/// What the dashboard shows for the most recent ingest.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatestSnapshot {
    pub timestamp: DateTime<Utc>,
    pub sensors: SensorReading,
    pub decision: OrchestratedDecision,
    pub agents: AgentViews,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DeviceRecord {
    pub memory: AgentMemory,
    pub scenario: ScenarioOverride,
    pub metrics: ImpactMetrics,
    pub timeline: Timeline,
    pub faults: FaultLatch,
    pub diagnostics: DiagnosticLog,
    pub latest: Option<LatestSnapshot>,
}

type Records = HashMap<String, DeviceRecord>;

/// Lock-guarded map of device shadows.
pub struct ShadowStore {
    records: Mutex<CriticalSectionRawMutex, RefCell<Records>>,
}

impl Default for ShadowStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ShadowStore {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(RefCell::new(HashMap::new())),
        }
    }

    /// Run `f` against the record for `device_id`, creating it if needed.
    pub fn update<R>(&self, device_id: &str, f: impl FnOnce(&mut DeviceRecord) -> R) -> R {
        self.records.lock(|cell| {
            let mut records = cell.borrow_mut();
            let record = records.entry(device_id.to_owned()).or_default();
            f(record)
        })
    }

    /// Like [`update`](Self::update) but never creates a record.
    pub fn update_existing<R>(
        &self,
        device_id: &str,
        f: impl FnOnce(&mut DeviceRecord) -> R,
    ) -> Option<R> {
        self.records
            .lock(|cell| cell.borrow_mut().get_mut(device_id).map(f))
    }

    pub fn read<R>(&self, device_id: &str, f: impl FnOnce(&DeviceRecord) -> R) -> Option<R> {
        self.records.lock(|cell| cell.borrow().get(device_id).map(f))
    }

    /// Known device ids, sorted.
    pub fn device_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.records.lock(|cell| cell.borrow().keys().cloned().collect());
        ids.sort();
        ids
    }

    pub fn remove(&self, device_id: &str) -> Option<DeviceRecord> {
        self.records.lock(|cell| cell.borrow_mut().remove(device_id))
    }

    pub fn len(&self) -> usize {
        self.records.lock(|cell| cell.borrow().len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
