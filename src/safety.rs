//! Safety guardrails and per-device fault tracking.
//!
//! Two concerns live here:
//!
//! 1. [`check_bounds`]: the physical-plausibility guardrail run by the
//!    decision engine before anything else.  A violation is a decision
//!    outcome (`EMERGENCY_STOP`), never an error.
//! 2. [`FaultLatch`]: a bitmask of the faults observed on the most recent
//!    ingest.  Unlike a hardware latch it is re-evaluated from scratch on
//!    every call, so a fault only persists while its condition repeats.
//!    Set/clear transitions are logged and reported to the event sink.

use core::ops::RangeInclusive;

use log::{error, info};
use serde::{Deserialize, Serialize};

use crate::engine::types::SensorReading;
use crate::error::SafetyFault;

/// Physically plausible soil moisture (%).
pub const SOIL_RANGE: RangeInclusive<f64> = 0.0..=100.0;

/// Physically plausible air temperature (°C).
pub const TEMPERATURE_RANGE: RangeInclusive<f64> = -10.0..=60.0;

/// Return the first bound violated by `reading`, soil before temperature.
/// NaN readings fail both ranges.
pub fn check_bounds(reading: &SensorReading) -> Option<SafetyFault> {
    if !SOIL_RANGE.contains(&reading.soil) {
        return Some(SafetyFault::SoilOutOfBounds);
    }
    if !TEMPERATURE_RANGE.contains(&reading.temperature) {
        return Some(SafetyFault::TemperatureOutOfBounds);
    }
    None
}

/// Human-readable reason for a bounds violation.
pub fn bounds_reason(fault: SafetyFault, reading: &SensorReading) -> String {
    match fault {
        SafetyFault::SoilOutOfBounds => {
            format!("Soil sensor out of physical bounds ({}%)", reading.soil)
        }
        SafetyFault::TemperatureOutOfBounds => format!(
            "Temperature sensor out of physical bounds ({}°C)",
            reading.temperature
        ),
        other => format!("{other}"),
    }
}

// ---------------------------------------------------------------------------
// Fault latch
// ---------------------------------------------------------------------------

/// What changed in the latch during one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FaultTransition {
    /// Bits that became set.
    pub raised: u8,
    /// Bits that became clear.
    pub cleared: u8,
}

impl FaultTransition {
    pub fn is_empty(&self) -> bool {
        self.raised == 0 && self.cleared == 0
    }
}

/// Bitmask of the faults seen on the latest ingest of one device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FaultLatch {
    faults: u8,
}

impl FaultLatch {
    pub const fn new() -> Self {
        Self { faults: 0 }
    }

    /// Replace the latch with the faults `active` on this ingest.
    pub fn evaluate(&mut self, active: &[SafetyFault]) -> FaultTransition {
        let before = self.faults;
        for fault in SafetyFault::ALL {
            self.eval_fault(fault, active.contains(&fault));
        }
        FaultTransition {
            raised: self.faults & !before,
            cleared: before & !self.faults,
        }
    }

    pub fn faults(&self) -> u8 {
        self.faults
    }

    /// Set or clear a fault bit based on a boolean condition.
    fn eval_fault(&mut self, fault: SafetyFault, condition: bool) {
        if condition {
            if self.faults & fault.mask() == 0 {
                error!("SAFETY FAULT SET: {fault}");
            }
            self.faults |= fault.mask();
        } else {
            if self.faults & fault.mask() != 0 {
                info!("SAFETY FAULT CLEARED: {fault}");
            }
            self.faults &= !fault.mask();
        }
    }
}
