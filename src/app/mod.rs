//! Application core: the irrigation agent behind port traits.
//!
//! The service combines the decision engine, diagnostics, tool
//! orchestrator and metrics recorder over the device shadow store.  All
//! interaction with the outside world (forecast provider, insight
//! generator, event sinks, config storage) happens through the **port
//! traits** in [`ports`], keeping this layer testable with mock adapters.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
